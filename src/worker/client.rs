use std::{
    collections::{
        BTreeMap,
        HashMap,
    },
    sync::{
        Arc,
        Mutex,
    },
};

use serde::de::DeserializeOwned;
use tokio::sync::{
    mpsc,
    oneshot,
};
use uuid::Uuid;

use super::{
    protocol::{
        InitPayload,
        WorkerCall,
        WorkerRequest,
        WorkerResponse,
    },
    server::Worker,
};
use crate::{
    core::KikuError,
    engine::{
        SharedAndSimilar,
        SharedQuery,
        SharedResult,
    },
    kanji::KanjiInfo,
    notes::{
        NoteMatches,
        NoteQuery,
        NotesByKey,
        NotesManifest,
    },
};

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<WorkerResponse>>>>;

/// Caller side of the worker protocol. Each call gets a fresh id and is
/// matched to its response by that id, whatever order responses arrive in.
#[derive(Clone)]
pub struct WorkerClient {
    requests: mpsc::Sender<WorkerRequest>,
    pending: Pending,
}

impl WorkerClient {
    pub fn new(
        requests: mpsc::Sender<WorkerRequest>,
        responses: mpsc::Receiver<WorkerResponse>,
    ) -> Self {
        let pending: Pending = Arc::default();
        tokio::spawn(dispatch(responses, pending.clone()));
        Self { requests, pending }
    }

    /// Spawns `worker` in-process and connects to it.
    pub fn connect(worker: Arc<Worker>) -> Self {
        let (requests, responses) = worker.spawn();
        Self::new(requests, responses)
    }

    pub async fn call(&self, call: WorkerCall) -> Result<serde_json::Value, KikuError> {
        let id = Uuid::new_v4().to_string();
        let request = call.into_request(id.clone())?;
        let (tx, rx) = oneshot::channel();
        self.pending_map()?.insert(id.clone(), tx);

        if let Err(err) = self.requests.send(request).await {
            self.pending_map()?.remove(&id);
            return Err(err.into());
        }

        rx.await
            .map_err(|_| KikuError::Worker("worker closed before responding".to_string()))?
            .into_result()
    }

    pub async fn call_as<T: DeserializeOwned>(&self, call: WorkerCall) -> Result<T, KikuError> {
        Ok(serde_json::from_value(self.call(call).await?)?)
    }

    fn pending_map(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, oneshot::Sender<WorkerResponse>>>, KikuError>
    {
        self.pending.lock().map_err(|e| KikuError::Worker(e.to_string()))
    }

    pub async fn init(&self, payload: InitPayload) -> Result<(), KikuError> {
        self.call(WorkerCall::Init(payload)).await.map(|_| ())
    }

    pub async fn manifest(&self) -> Result<NotesManifest, KikuError> {
        self.call_as(WorkerCall::Manifest).await
    }

    pub async fn query(&self, kanji: Vec<String>) -> Result<NotesByKey, KikuError> {
        self.call_as(WorkerCall::Query(kanji)).await
    }

    pub async fn query_notes(&self, query: NoteQuery) -> Result<NoteMatches, KikuError> {
        self.call_as(WorkerCall::QueryNotes(query)).await
    }

    pub async fn get_similar_kanji(&self, kanji: &str) -> Result<Vec<String>, KikuError> {
        self.call_as(WorkerCall::GetSimilarKanji(kanji.to_string())).await
    }

    pub async fn query_shared_and_similar(
        &self,
        kanji: Vec<String>,
    ) -> Result<BTreeMap<String, SharedAndSimilar>, KikuError> {
        self.call_as(WorkerCall::QuerySharedAndSimilar(kanji)).await
    }

    pub async fn query_shared(&self, query: SharedQuery) -> Result<SharedResult, KikuError> {
        self.call_as(WorkerCall::QueryShared(query)).await
    }

    pub async fn lookup(&self, kanji: &str) -> Result<Option<KanjiInfo>, KikuError> {
        self.call_as(WorkerCall::Lookup(kanji.to_string())).await
    }
}

async fn dispatch(mut responses: mpsc::Receiver<WorkerResponse>, pending: Pending) {
    while let Some(response) = responses.recv().await {
        let waiter = match pending.lock() {
            Ok(mut pending) => pending.remove(&response.id),
            Err(_) => None,
        };
        match waiter {
            Some(waiter) => {
                let _ = waiter.send(response);
            }
            None => tracing::warn!(id = %response.id, "response for unknown request"),
        }
    }

    // Wake anyone still waiting; their senders are dropped here.
    if let Ok(mut pending) = pending.lock() {
        pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        core::{
            KikuConfig,
            SessionContext,
        },
        engine::KanjiEngine,
        notes::scanner::tests::corpus,
    };

    fn client() -> WorkerClient {
        let ctx = SessionContext::new(KikuConfig::default(), corpus());
        WorkerClient::connect(Arc::new(Worker::with_engine(KanjiEngine::new(ctx))))
    }

    #[tokio::test]
    async fn test_concurrent_calls_get_their_own_answers() {
        let client = client();
        let (a, b, manifest) = tokio::join!(
            client.query(vec!["未".to_string()]),
            client.query(vec!["毎".to_string()]),
            client.manifest(),
        );
        assert_eq!(a.unwrap()["未"][0].note_id, 13);
        assert_eq!(b.unwrap()["毎"][0].note_id, 11);
        assert_eq!(manifest.unwrap().total_notes, 6);
    }

    #[tokio::test]
    async fn test_out_of_order_responses_are_matched_by_id() {
        let (request_tx, mut request_rx) = mpsc::channel::<WorkerRequest>(8);
        let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>(8);
        let client = WorkerClient::new(request_tx, response_rx);

        // Answers both requests in reverse, echoing the kanji back.
        tokio::spawn(async move {
            let first = request_rx.recv().await.unwrap();
            let second = request_rx.recv().await.unwrap();
            for request in [second, first] {
                let echo = request.args[0].clone();
                response_tx.send(WorkerResponse::ok(request.id, echo)).await.unwrap();
            }
        });

        let c1 = client.clone();
        let first = tokio::spawn(async move {
            c1.call(WorkerCall::Lookup("一".to_string())).await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = client.call(WorkerCall::Lookup("二".to_string())).await.unwrap();

        assert_eq!(first.await.unwrap().unwrap(), serde_json::json!("一"));
        assert_eq!(second, serde_json::json!("二"));
    }

    #[tokio::test]
    async fn test_error_response_surfaces_as_worker_error() {
        let client = client();
        let err = client.get_similar_kanji("日").await.unwrap_err();
        assert!(matches!(err, KikuError::Worker(_)));
    }

    #[tokio::test]
    async fn test_closed_worker() {
        let (request_tx, request_rx) = mpsc::channel::<WorkerRequest>(1);
        let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>(1);
        drop(request_rx);
        drop(response_tx);
        let client = WorkerClient::new(request_tx, response_rx);
        assert!(client.manifest().await.is_err());
    }
}
