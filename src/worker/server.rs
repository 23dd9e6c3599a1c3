use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::{
    io::{
        AsyncBufRead,
        AsyncBufReadExt,
        AsyncWrite,
        AsyncWriteExt,
    },
    sync::{
        mpsc,
        RwLock,
    },
};

use super::protocol::{
    InitPayload,
    WorkerCall,
    WorkerRequest,
    WorkerResponse,
};
use crate::{
    core::{
        KikuError,
        SessionContext,
    },
    engine::KanjiEngine,
};

const CHANNEL_CAPACITY: usize = 64;

/// Answers [`WorkerRequest`]s against a [`KanjiEngine`]. Every request runs on
/// its own task, so responses may come back out of order.
#[derive(Default)]
pub struct Worker {
    engine: RwLock<Option<Arc<KanjiEngine>>>,
}

impl Worker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A worker that is ready without an `init` call.
    pub fn with_engine(engine: KanjiEngine) -> Self {
        Self { engine: RwLock::new(Some(Arc::new(engine))) }
    }

    async fn engine(&self) -> Result<Arc<KanjiEngine>, KikuError> {
        self.engine
            .read()
            .await
            .clone()
            .ok_or_else(|| KikuError::Worker("worker is not initialised".to_string()))
    }

    async fn init(&self, payload: InitPayload) -> Result<Value, KikuError> {
        let ctx = SessionContext::from_config(payload.into_config())?;
        tracing::info!(assets = %ctx.assets.describe(), "worker initialised");
        *self.engine.write().await = Some(Arc::new(KanjiEngine::new(ctx)));
        Ok(Value::Bool(true))
    }

    pub async fn call(&self, call: WorkerCall) -> Result<Value, KikuError> {
        match call {
            WorkerCall::Init(payload) => self.init(payload).await,
            WorkerCall::Manifest => to_json(&*self.engine().await?.notes_manifest().await?),
            WorkerCall::Query(kanji) => to_json(&self.engine().await?.query(&kanji).await?),
            WorkerCall::QueryNotes(query) => {
                to_json(&self.engine().await?.query_notes(&query).await?)
            }
            WorkerCall::GetSimilarKanji(kanji) => {
                to_json(&self.engine().await?.get_similar_kanji(&kanji).await?)
            }
            WorkerCall::QuerySharedAndSimilar(kanji) => {
                to_json(&self.engine().await?.query_shared_and_similar(&kanji).await?)
            }
            WorkerCall::QueryShared(query) => {
                to_json(&self.engine().await?.query_shared(&query).await?)
            }
            WorkerCall::Lookup(kanji) => to_json(&self.engine().await?.lookup(&kanji).await?),
        }
    }

    pub async fn handle(&self, request: WorkerRequest) -> WorkerResponse {
        let id = request.id.clone();
        let function = request.function;
        let result = match WorkerCall::try_from(request) {
            Ok(call) => self.call(call).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(value) => WorkerResponse::ok(id, value),
            Err(err) => {
                tracing::warn!(id = %id, function = ?function, error = %err, "worker request failed");
                WorkerResponse::err(id, err)
            }
        }
    }

    /// Serves requests until the request channel closes.
    pub async fn run(
        self: Arc<Self>,
        mut requests: mpsc::Receiver<WorkerRequest>,
        responses: mpsc::Sender<WorkerResponse>,
    ) {
        while let Some(request) = requests.recv().await {
            let worker = self.clone();
            let responses = responses.clone();
            tokio::spawn(async move {
                let response = worker.handle(request).await;
                if responses.send(response).await.is_err() {
                    tracing::debug!("response dropped, receiver closed");
                }
            });
        }
    }

    /// Starts [`Worker::run`] on a background task and returns its channels.
    pub fn spawn(
        self: Arc<Self>,
    ) -> (mpsc::Sender<WorkerRequest>, mpsc::Receiver<WorkerResponse>) {
        let (request_tx, request_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(self.run(request_rx, response_tx));
        (request_tx, response_rx)
    }

    /// Serves newline-delimited JSON requests from `reader`, writing one JSON
    /// response per line to `writer`. Returns once the input is exhausted and
    /// every in-flight request has been answered.
    pub async fn serve_lines<R, W>(self: Arc<Self>, reader: R, mut writer: W) -> Result<(), KikuError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (response_tx, mut response_rx) = mpsc::channel::<WorkerResponse>(CHANNEL_CAPACITY);

        let writer_task = tokio::spawn(async move {
            while let Some(response) = response_rx.recv().await {
                let mut line = serde_json::to_vec(&response)?;
                line.push(b'\n');
                writer.write_all(&line).await?;
                writer.flush().await?;
            }
            Ok::<(), KikuError>(())
        });

        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let request: WorkerRequest = match serde_json::from_str(&line) {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(error = %err, "malformed worker request");
                    response_tx.send(WorkerResponse::err(request_id(&line), err)).await?;
                    continue;
                }
            };

            let worker = self.clone();
            let response_tx = response_tx.clone();
            tokio::spawn(async move {
                let response = worker.handle(request).await;
                if response_tx.send(response).await.is_err() {
                    tracing::debug!("response dropped, writer closed");
                }
            });
        }

        drop(response_tx);
        writer_task.await.map_err(|e| KikuError::Worker(e.to_string()))?
    }

    pub async fn serve_stdio(self: Arc<Self>) -> Result<(), KikuError> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.serve_lines(stdin, tokio::io::stdout()).await
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value, KikuError> {
    Ok(serde_json::to_value(value)?)
}

/// Best-effort id of a request that failed to parse.
fn request_id(line: &str) -> String {
    serde_json::from_str::<Value>(line)
        .ok()
        .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}
