//! Shared helpers for harvest integration tests

use async_trait::async_trait;
use snapshot_harvester::fetcher::{ApiResponse, EndpointFetcher, FetcherError, FetcherResult};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One recorded fetcher invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    One(String),
    Batch(Vec<String>),
}

/// Fetcher that replays a scripted list of responses and records every call
#[derive(Clone)]
pub struct ScriptedFetcher {
    responses: Arc<Mutex<VecDeque<ApiResponse>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    items_key: String,
}

impl ScriptedFetcher {
    pub fn new(items_key: &str, responses: Vec<ApiResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
            items_key: items_key.to_string(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_response(&self) -> FetcherResult<ApiResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| FetcherError::Network("script exhausted".to_string()))
    }
}

#[async_trait]
impl EndpointFetcher for ScriptedFetcher {
    async fn fetch_one(&self, id: &str) -> FetcherResult<ApiResponse> {
        self.calls.lock().unwrap().push(Call::One(id.to_string()));
        self.next_response()
    }

    async fn fetch_batch(&self, ids: &[String]) -> FetcherResult<ApiResponse> {
        if ids.is_empty() {
            return Err(FetcherError::EmptyBatch);
        }
        self.calls.lock().unwrap().push(Call::Batch(ids.to_vec()));
        self.next_response()
    }

    fn items_key(&self) -> &str {
        &self.items_key
    }
}

/// 2xx response carrying a JSON body
pub fn ok(body: serde_json::Value) -> ApiResponse {
    ApiResponse {
        status: 200,
        retry_after: None,
        body: body.to_string(),
    }
}

/// Non-2xx response with an empty body
pub fn status(code: u16) -> ApiResponse {
    ApiResponse {
        status: code,
        retry_after: None,
        body: String::new(),
    }
}

/// Rate-limit response with a `Retry-After` hint
pub fn rate_limited(retry_after: u64) -> ApiResponse {
    ApiResponse {
        status: 429,
        retry_after: Some(retry_after),
        body: String::new(),
    }
}

/// Seed `ids.csv` with (id, cached) rows
pub fn seed_ledger(path: &Path, rows: &[(&str, bool)]) {
    let mut contents = String::from("ID,CACHED\n");
    for (id, cached) in rows {
        contents.push_str(&format!("{id},{cached}\n"));
    }
    std::fs::write(path, contents).unwrap();
}

/// Read the (id, cached) rows back from `ids.csv`, skipping the header
pub fn read_ledger(path: &Path) -> Vec<(String, bool)> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(1)
        .map(|line| {
            let (id, flag) = line.split_once(',').unwrap();
            (id.to_string(), flag == "true")
        })
        .collect()
}
