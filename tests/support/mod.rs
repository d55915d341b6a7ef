//! Fakes for the HTTP transport, used by integration tests that need
//! deterministic connect/transfer behavior without touching the network.
//! The file and PNG lanes are exercised against their real collaborators
//! instead (`StdFsOpener`, `ImagePngDecoderFactory`) with `tempfile`-backed
//! fixtures, since those need no network and are cheap to run for real.

use std::any::Any;
use std::sync::Arc;

use horizon_lattice_dataloop::traits::{HttpConnection, HttpProgress, HttpSession, HttpTransport};

pub struct FixedConnection {
    pub polls_to_connect: usize,
    pub polled: usize,
    pub fail: bool,
}

impl HttpConnection for FixedConnection {
    fn poll(&mut self) -> bool {
        self.polled += 1;
        self.polled >= self.polls_to_connect
    }

    fn failed(&self) -> bool {
        self.fail
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

pub struct FixedSession {
    pub polls_to_done: usize,
    pub polled: usize,
    pub body: Vec<u8>,
}

impl HttpSession for FixedSession {
    fn poll(&mut self) -> HttpProgress {
        self.polled += 1;
        let done = self.polled >= self.polls_to_done;
        HttpProgress {
            bytes_so_far: self.polled as u64,
            total_bytes: Some(self.polls_to_done as u64),
            done,
        }
    }

    fn failed(&self) -> bool {
        false
    }

    fn take_data(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body)
    }
}

/// An [`HttpTransport`] whose connect/transfer outcome is fixed at
/// construction time, for exercising the HTTP lane's success and failure
/// paths without a real socket.
pub struct ScriptedTransport {
    pub connection_fails: bool,
    pub polls_to_connect: usize,
    pub polls_to_transfer: usize,
    pub body: Vec<u8>,
}

impl ScriptedTransport {
    pub fn success(body: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            connection_fails: false,
            polls_to_connect: 2,
            polls_to_transfer: 2,
            body: body.into(),
        })
    }

    pub fn connection_failure() -> Arc<Self> {
        Arc::new(Self {
            connection_fails: true,
            polls_to_connect: 2,
            polls_to_transfer: 2,
            body: Vec::new(),
        })
    }
}

impl HttpTransport for ScriptedTransport {
    fn connect(&self, _url: &str) -> Option<Box<dyn HttpConnection>> {
        Some(Box::new(FixedConnection {
            polls_to_connect: self.polls_to_connect,
            polled: 0,
            fail: self.connection_fails,
        }))
    }

    fn promote(&self, _connection: Box<dyn HttpConnection>) -> Option<Box<dyn HttpSession>> {
        Some(Box::new(FixedSession {
            polls_to_done: self.polls_to_transfer,
            polled: 0,
            body: self.body.clone(),
        }))
    }
}
