use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use serde_json::Value;

use crate::{
    core::{
        KikuConfig,
        KikuError,
    },
    engine::SharedQuery,
    notes::NoteQuery,
};

/// The closed set of functions a worker answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkerFn {
    Init,
    Manifest,
    Query,
    QueryNotes,
    GetSimilarKanji,
    QuerySharedAndSimilar,
    QueryShared,
    Lookup,
}

/// Wire envelope: `{id, fn, args}` with positional `args`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRequest {
    pub id: String,
    #[serde(rename = "fn")]
    pub function: WorkerFn,
    #[serde(default)]
    pub args: Vec<Value>,
}

/// Wire envelope: `{id, result}` or `{id, error}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerResponse {
    pub fn ok(id: String, result: Value) -> Self {
        Self { id, result: Some(result), error: None }
    }

    pub fn err(id: String, error: impl ToString) -> Self {
        Self { id, result: None, error: Some(error.to_string()) }
    }

    pub fn into_result(self) -> Result<Value, KikuError> {
        match (self.result, self.error) {
            (_, Some(error)) => Err(KikuError::Worker(error)),
            (Some(result), None) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    pub assets_path: String,
    #[serde(default)]
    pub config: KikuConfig,
    #[serde(default)]
    pub prefer_anki_connect: Option<bool>,
}

impl InitPayload {
    /// Config with the payload's overrides applied.
    pub fn into_config(self) -> KikuConfig {
        let mut config = self.config;
        config.assets_path = self.assets_path;
        if let Some(prefer) = self.prefer_anki_connect {
            config.prefer_anki_connect = prefer;
        }
        config
    }
}

/// A decoded, typed request.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerCall {
    Init(InitPayload),
    Manifest,
    Query(Vec<String>),
    QueryNotes(NoteQuery),
    GetSimilarKanji(String),
    QuerySharedAndSimilar(Vec<String>),
    QueryShared(SharedQuery),
    Lookup(String),
}

impl WorkerCall {
    pub fn function(&self) -> WorkerFn {
        match self {
            WorkerCall::Init(_) => WorkerFn::Init,
            WorkerCall::Manifest => WorkerFn::Manifest,
            WorkerCall::Query(_) => WorkerFn::Query,
            WorkerCall::QueryNotes(_) => WorkerFn::QueryNotes,
            WorkerCall::GetSimilarKanji(_) => WorkerFn::GetSimilarKanji,
            WorkerCall::QuerySharedAndSimilar(_) => WorkerFn::QuerySharedAndSimilar,
            WorkerCall::QueryShared(_) => WorkerFn::QueryShared,
            WorkerCall::Lookup(_) => WorkerFn::Lookup,
        }
    }

    pub fn decode(function: WorkerFn, args: Vec<Value>) -> Result<Self, KikuError> {
        let mut args = args.into_iter();
        Ok(match function {
            WorkerFn::Init => WorkerCall::Init(first_arg(function, &mut args)?),
            WorkerFn::Manifest => WorkerCall::Manifest,
            WorkerFn::Query => WorkerCall::Query(first_arg(function, &mut args)?),
            WorkerFn::QueryNotes => WorkerCall::QueryNotes(first_arg(function, &mut args)?),
            WorkerFn::GetSimilarKanji => {
                WorkerCall::GetSimilarKanji(first_arg(function, &mut args)?)
            }
            WorkerFn::QuerySharedAndSimilar => {
                WorkerCall::QuerySharedAndSimilar(first_arg(function, &mut args)?)
            }
            WorkerFn::QueryShared => WorkerCall::QueryShared(first_arg(function, &mut args)?),
            WorkerFn::Lookup => WorkerCall::Lookup(first_arg(function, &mut args)?),
        })
    }

    pub fn into_request(self, id: String) -> Result<WorkerRequest, KikuError> {
        let function = self.function();
        let args = match self {
            WorkerCall::Init(payload) => vec![serde_json::to_value(payload)?],
            WorkerCall::Manifest => Vec::new(),
            WorkerCall::Query(kanji) => vec![serde_json::to_value(kanji)?],
            WorkerCall::QueryNotes(query) => vec![serde_json::to_value(query)?],
            WorkerCall::GetSimilarKanji(kanji) => vec![Value::String(kanji)],
            WorkerCall::QuerySharedAndSimilar(kanji) => vec![serde_json::to_value(kanji)?],
            WorkerCall::QueryShared(query) => vec![serde_json::to_value(query)?],
            WorkerCall::Lookup(kanji) => vec![Value::String(kanji)],
        };
        Ok(WorkerRequest { id, function, args })
    }
}

impl TryFrom<WorkerRequest> for WorkerCall {
    type Error = KikuError;

    fn try_from(request: WorkerRequest) -> Result<Self, Self::Error> {
        WorkerCall::decode(request.function, request.args)
    }
}

fn first_arg<T: DeserializeOwned>(
    function: WorkerFn,
    args: &mut impl Iterator<Item = Value>,
) -> Result<T, KikuError> {
    let value = args
        .next()
        .ok_or_else(|| KikuError::Worker(format!("{:?} expects an argument", function)))?;
    serde_json::from_value(value)
        .map_err(|e| KikuError::Worker(format!("invalid argument for {:?}: {}", function, e)))
}
