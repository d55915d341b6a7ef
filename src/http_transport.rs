//! Real HTTP transport: `reqwest` over the background runtime in
//! `crate::runtime`, split into a connect phase (headers available) and a
//! session phase (body fetched) to match [`crate::traits::HttpTransport`]'s
//! two-phase contract.
//!
//! Grounded on `horizon-lattice-net::http::async_client`'s
//! spawn-and-poll-a-shared-state pattern, without its signal machinery —
//! this engine already polls every tick, so there's nothing to emit to.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use reqwest::Client;
use url::Url;

use crate::runtime;
use crate::traits::{HttpConnection, HttpProgress, HttpSession, HttpTransport};

type ConnectResult = Result<reqwest::Response, String>;

struct RealConnection {
    state: Arc<Mutex<Option<ConnectResult>>>,
}

impl HttpConnection for RealConnection {
    fn poll(&mut self) -> bool {
        matches!(*self.state.lock(), Some(Ok(_)))
    }

    fn failed(&self) -> bool {
        matches!(*self.state.lock(), Some(Err(_)))
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

struct SessionState {
    buffer: Mutex<Vec<u8>>,
    bytes_so_far: AtomicU64,
    total_bytes: Option<u64>,
    finished: Mutex<Option<Result<(), String>>>,
}

struct RealSession {
    state: Arc<SessionState>,
}

impl HttpSession for RealSession {
    fn poll(&mut self) -> HttpProgress {
        let finished = self.state.finished.lock();
        HttpProgress {
            bytes_so_far: self.state.bytes_so_far.load(Ordering::Acquire),
            total_bytes: self.state.total_bytes,
            done: matches!(*finished, Some(Ok(()))),
        }
    }

    fn failed(&self) -> bool {
        matches!(*self.state.finished.lock(), Some(Err(_)))
    }

    fn take_data(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.state.buffer.lock())
    }
}

/// [`HttpTransport`] backed by a real `reqwest::Client`.
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for ReqwestTransport {
    fn connect(&self, url: &str) -> Option<Box<dyn HttpConnection>> {
        if Url::parse(url).is_err() {
            return None;
        }
        let state: Arc<Mutex<Option<ConnectResult>>> = Arc::new(Mutex::new(None));
        let state_for_task = state.clone();
        let client = self.client.clone();
        let url = url.to_string();
        runtime::spawn(async move {
            let result = client.get(&url).send().await.map_err(|err| err.to_string());
            *state_for_task.lock() = Some(result);
        });
        Some(Box::new(RealConnection { state }))
    }

    fn promote(&self, connection: Box<dyn HttpConnection>) -> Option<Box<dyn HttpSession>> {
        let real = connection.into_any().downcast::<RealConnection>().ok()?;
        let response = real.state.lock().take()?.ok()?;
        let total_bytes = response.content_length();

        let state = Arc::new(SessionState {
            buffer: Mutex::new(Vec::new()),
            bytes_so_far: AtomicU64::new(0),
            total_bytes,
            finished: Mutex::new(None),
        });
        let state_for_task = state.clone();
        runtime::spawn(async move {
            match response.bytes().await {
                Ok(bytes) => {
                    state_for_task.bytes_so_far.store(bytes.len() as u64, Ordering::Release);
                    *state_for_task.buffer.lock() = bytes.to_vec();
                    *state_for_task.finished.lock() = Some(Ok(()));
                }
                Err(err) => {
                    *state_for_task.finished.lock() = Some(Err(err.to_string()));
                }
            }
        });
        Some(Box::new(RealSession { state }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_url_is_rejected_before_any_network_work() {
        let transport = ReqwestTransport::new();
        assert!(transport.connect("not a url").is_none());
    }

    #[test]
    fn promoting_a_foreign_connection_type_fails_closed() {
        struct Foreign;
        impl HttpConnection for Foreign {
            fn poll(&mut self) -> bool {
                true
            }
            fn failed(&self) -> bool {
                false
            }
            fn into_any(self: Box<Self>) -> Box<dyn Any> {
                self
            }
        }
        let transport = ReqwestTransport::new();
        assert!(transport.promote(Box::new(Foreign)).is_none());
    }
}
