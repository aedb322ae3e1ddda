//! Shared test doubles

use crate::transport::{Transport, TransportError, TransportResponse};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Transport that replays a scripted sequence of responses, then fails
pub(crate) struct ScriptedTransport {
    script: Mutex<Vec<Result<TransportResponse, TransportError>>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<TransportResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }

    pub(crate) fn ok(status: u16) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse { status, body: None })
    }

    pub(crate) fn refused() -> Result<TransportResponse, TransportError> {
        Err(TransportError("connection refused".to_string()))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        _url: &str,
        _headers: &HashMap<String, String>,
        _body: &[u8],
        _timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(TransportError("script exhausted".to_string()));
        }
        script.remove(0)
    }
}
