//! The HTTP lane: one URL transfer at a time, two-phase (connect, then
//! transfer) per spec's CONNECTING/TRANSFERRING split.
//!
//! Unlike the file lane, there's no sub-lane to bridge into: the terminal
//! action is always "hand the body to a sink selected by the command's
//! tag, or drop it". The lane also clears its own queue on completion, to
//! shed stale re-posts of the same URL rather than replaying them.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::command::HttpCompletion;
use crate::queue::{split_tag, MessageQueue};
use crate::sinks::BodySink;
use crate::traits::{HttpConnection, HttpSession, HttpTransport};

enum HttpStage {
    Connecting(Box<dyn HttpConnection>),
    Transferring(Box<dyn HttpSession>),
}

struct HttpTask {
    stage: HttpStage,
    completion: HttpCompletion,
}

/// The HTTP transfer lane.
pub(crate) struct HttpLane {
    queue: MessageQueue,
    transport: Arc<dyn HttpTransport>,
    download_sink: Option<Arc<BodySink>>,
    list_sink: Option<Arc<BodySink>>,
    task: Option<HttpTask>,
}

impl HttpLane {
    pub(crate) fn new(
        queue_capacity: usize,
        transport: Arc<dyn HttpTransport>,
        download_sink: Option<Arc<BodySink>>,
        list_sink: Option<Arc<BodySink>>,
    ) -> Self {
        Self {
            queue: MessageQueue::new(queue_capacity),
            transport,
            download_sink,
            list_sink,
            task: None,
        }
    }

    /// Enqueue a `"url"` or `"url|tag"` command.
    pub(crate) fn post(&self, command: impl Into<String>, priority: i32, duration: Duration) -> bool {
        self.queue.push(command, priority, duration)
    }

    pub(crate) fn dropped_count(&self) -> u64 {
        self.queue.dropped_count()
    }

    pub(crate) fn clear(&mut self) {
        self.queue.clear();
        self.task = None;
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.task.is_some()
    }

    /// Advance by one tick. Returns `true` if the lane did any work.
    pub(crate) fn tick(&mut self) -> bool {
        if self.task.is_none() {
            let Some(command) = self.queue.pull() else {
                return false;
            };
            let (url, tag) = split_tag(&command);
            let completion = HttpCompletion::parse(tag);
            match self.transport.connect(url) {
                Some(connection) => {
                    debug!(url, "http lane: connecting");
                    self.task = Some(HttpTask {
                        stage: HttpStage::Connecting(connection),
                        completion,
                    });
                }
                None => warn!(url, "http lane: connect failed"),
            }
            return true;
        }

        let current = self.task.take().expect("checked above");
        match current.stage {
            HttpStage::Connecting(mut connection) => {
                if connection.failed() {
                    warn!("http lane: connection failed");
                    return true;
                }
                if connection.poll() {
                    match self.transport.promote(connection) {
                        Some(session) => {
                            self.task = Some(HttpTask {
                                stage: HttpStage::Transferring(session),
                                completion: current.completion,
                            });
                        }
                        None => warn!("http lane: session promotion failed"),
                    }
                } else {
                    self.task = Some(HttpTask {
                        stage: HttpStage::Connecting(connection),
                        completion: current.completion,
                    });
                }
            }
            HttpStage::Transferring(mut session) => {
                if session.failed() {
                    warn!("http lane: transfer failed");
                    return true;
                }
                let progress = session.poll();
                if progress.done {
                    let body = session.take_data();
                    self.dispatch(current.completion, body);
                    self.queue.clear();
                } else {
                    debug!(
                        bytes_so_far = progress.bytes_so_far,
                        total = ?progress.total_bytes,
                        "http lane: transferring"
                    );
                    self.task = Some(HttpTask {
                        stage: HttpStage::Transferring(session),
                        completion: current.completion,
                    });
                }
            }
        }
        true
    }

    fn dispatch(&self, completion: HttpCompletion, body: Vec<u8>) {
        let sink = match completion {
            HttpCompletion::Drop => None,
            HttpCompletion::CoreUpdaterDownload => self.download_sink.as_deref(),
            HttpCompletion::CoreUpdaterList => self.list_sink.as_deref(),
        };
        if let Some(sink) = sink {
            sink(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::HttpProgress;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct FakeConnection {
        polls_to_connect: usize,
        polled: usize,
        fail: bool,
    }
    impl HttpConnection for FakeConnection {
        fn poll(&mut self) -> bool {
            self.polled += 1;
            self.polled >= self.polls_to_connect
        }
        fn failed(&self) -> bool {
            self.fail
        }
        fn into_any(self: Box<Self>) -> Box<dyn std::any::Any> {
            self
        }
    }

    struct FakeSession {
        polls_to_done: usize,
        polled: usize,
        fail: bool,
        body: Vec<u8>,
    }
    impl HttpSession for FakeSession {
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
            self.fail
        }
        fn take_data(&mut self) -> Vec<u8> {
            std::mem::take(&mut self.body)
        }
    }

    struct FakeTransport {
        connect_fails: bool,
        connection_fails: bool,
        session_fails: bool,
        body: Vec<u8>,
    }
    impl HttpTransport for FakeTransport {
        fn connect(&self, _url: &str) -> Option<Box<dyn HttpConnection>> {
            if self.connect_fails {
                return None;
            }
            Some(Box::new(FakeConnection {
                polls_to_connect: 2,
                polled: 0,
                fail: self.connection_fails,
            }))
        }
        fn promote(&self, _connection: Box<dyn HttpConnection>) -> Option<Box<dyn HttpSession>> {
            if self.session_fails {
                return None;
            }
            Some(Box::new(FakeSession {
                polls_to_done: 2,
                polled: 0,
                fail: false,
                body: self.body.clone(),
            }))
        }
    }

    fn run_to_idle(lane: &mut HttpLane) {
        let mut ticks = 0;
        while lane.is_busy() || lane.tick() {
            ticks += 1;
            assert!(ticks < 10_000, "lane never went idle");
        }
    }

    #[test]
    fn download_tag_dispatches_to_sink_and_clears_queue() {
        let transport = Arc::new(FakeTransport {
            connect_fails: false,
            connection_fails: false,
            session_fails: false,
            body: b"payload".to_vec(),
        });
        let received: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));
        let received_clone = received.clone();
        let sink: Arc<BodySink> = Arc::new(move |body| *received_clone.lock().unwrap() = Some(body));
        let mut lane = HttpLane::new(8, transport, Some(sink), None);
        lane.post("http://h/d|cb_core_updater_download", 0, Duration::ZERO);
        lane.post("http://h/d|cb_core_updater_download", 0, Duration::ZERO);

        run_to_idle(&mut lane);
        assert_eq!(received.lock().unwrap().as_deref(), Some(b"payload".as_slice()));
        // the duplicate re-post was flushed by the completion-time clear
        assert!(!lane.is_busy());
        assert_eq!(lane.queue.len(), 0);
    }

    #[test]
    fn unknown_tag_drops_body_but_still_frees() {
        let transport = Arc::new(FakeTransport {
            connect_fails: false,
            connection_fails: false,
            session_fails: false,
            body: b"ignored".to_vec(),
        });
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();
        let sink: Arc<BodySink> = Arc::new(move |_| called_clone.store(true, Ordering::SeqCst));
        let mut lane = HttpLane::new(8, transport, Some(sink), None);
        lane.post("http://h/unrecognized", 0, Duration::ZERO);

        run_to_idle(&mut lane);
        assert!(!called.load(Ordering::SeqCst));
        assert!(!lane.is_busy());
    }

    #[test]
    fn connection_failure_aborts_without_dispatch() {
        let transport = Arc::new(FakeTransport {
            connect_fails: false,
            connection_fails: true,
            session_fails: false,
            body: vec![],
        });
        let mut lane = HttpLane::new(8, transport, None, None);
        lane.post("http://unreachable/x", 0, Duration::ZERO);

        run_to_idle(&mut lane);
        assert!(!lane.is_busy());
    }

    #[test]
    fn connect_returning_none_is_treated_as_immediate_abort() {
        let transport = Arc::new(FakeTransport {
            connect_fails: true,
            connection_fails: false,
            session_fails: false,
            body: vec![],
        });
        let mut lane = HttpLane::new(8, transport, None, None);
        lane.post("http://bad-url", 0, Duration::ZERO);

        assert!(lane.tick());
        assert!(!lane.is_busy());
    }
}
