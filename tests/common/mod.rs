//! Shared test utilities: a transport and a store that record what they see.
#![allow(dead_code)]

use async_trait::async_trait;
use resourceful::error::Error;
use resourceful::{Client, OutgoingRequest, Response, ResponseStore, Transport};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Cached binary path for the resourceful CLI to avoid repeated lookups
#[allow(deprecated)]
pub static RESOURCEFUL_BIN: std::sync::LazyLock<PathBuf> =
    std::sync::LazyLock::new(|| assert_cmd::cargo::cargo_bin("resourceful"));

/// Test helper to create a command with the cached binary
pub fn resourceful_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(&*RESOURCEFUL_BIN);
    // Keep the user's config and log settings out of the tests
    cmd.env_remove("RESOURCEFUL_CONFIG")
        .env_remove("RESOURCEFUL_LOG")
        .env_remove("RESOURCEFUL_LOG_FILE");
    cmd
}

type Responder = Box<dyn Fn(&OutgoingRequest) -> Result<Response, Error> + Send + Sync>;

/// Transport that records every request and answers from a closure.
pub struct RecordingTransport {
    requests: Mutex<Vec<OutgoingRequest>>,
    responder: Responder,
}

impl RecordingTransport {
    pub fn with_responder<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&OutgoingRequest) -> Result<Response, Error> + Send + Sync + 'static,
    {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        })
    }

    /// Answers every request with `200` and `body`.
    pub fn ok(body: Value) -> Arc<Self> {
        Self::with_responder(move |_| Ok(Response::new(200, body.clone())))
    }

    /// Answers every request with an HTTP status error.
    pub fn failing(status: u16, body: Value) -> Arc<Self> {
        Self::with_responder(move |_| {
            Err(Error::HttpStatus {
                status,
                body: body.clone(),
            })
        })
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> OutgoingRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: OutgoingRequest) -> Result<Response, Error> {
        let result = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        result
    }
}

/// Client over `transport` with built-in defaults.
pub fn client_with(transport: &Arc<RecordingTransport>) -> Arc<Client> {
    let transport: Arc<dyn Transport> = transport.clone();
    Arc::new(Client::new(transport))
}

/// Store that keeps responses in a map and records the keys it was asked for.
#[derive(Default)]
pub struct RecordingStore {
    entries: Mutex<HashMap<String, Response>>,
    gets: Mutex<Vec<String>>,
    sets: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seeded(key: &str, response: Response) -> Arc<Self> {
        let store = Self::default();
        store
            .entries
            .lock()
            .unwrap()
            .insert(key.to_string(), response);
        Arc::new(store)
    }

    pub fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }

    pub fn sets(&self) -> Vec<String> {
        self.sets.lock().unwrap().clone()
    }

    pub fn stored(&self, key: &str) -> Option<Response> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ResponseStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<Response>, Error> {
        self.gets.lock().unwrap().push(key.to_string());
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, response: Response) -> Result<(), Error> {
        self.sets.lock().unwrap().push(key.to_string());
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), response);
        Ok(())
    }
}
