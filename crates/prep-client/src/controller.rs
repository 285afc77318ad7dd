//! Streaming session controller.
//!
//! Owns the single [`AnalysisSession`] and runs the effects around the pure
//! reducer: opening the request, decoding the body, and applying events.
//!
//! # Supersession
//!
//! Every operation that replaces the session (`analyze`, `reset`,
//! `load_result`) bumps an epoch counter and cancels the previous
//! operation's token. A running `analyze` captured its epoch when it started
//! and applies an event only while that epoch is still current, so frames
//! that were already buffered when a newer session began are discarded even
//! if the transport has not stopped yet.

use std::sync::{Arc, Mutex, MutexGuard};

use futures::StreamExt;
use prep_models::AnalysisResult;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::event::StreamEvent;
use crate::session::AnalysisSession;
use crate::sse::decode_events;
use crate::transport::AnalysisTransport;

/// Message used when the body ends without a `result` or `error` event.
pub const INCOMPLETE_STREAM_MESSAGE: &str = "Analysis stream ended before a result was received";

/// Message used when the caller drops `analyze` before the session finished.
pub const INTERRUPTED_MESSAGE: &str = "Analysis was interrupted before it finished";

/// Whether the streaming loop keeps reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

struct Inner {
    session: AnalysisSession,
    epoch: u64,
    cancel: Option<CancellationToken>,
}

impl Inner {
    /// Invalidates whatever operation is running and returns the new epoch.
    fn supersede(&mut self) -> u64 {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.epoch += 1;
        self.epoch
    }
}

struct Shared {
    inner: Mutex<Inner>,
    updates: watch::Sender<AnalysisSession>,
}

/// Ends the session of `epoch` if its `analyze` future goes away while the
/// session is still streaming, so the re-entrancy guard cannot stay latched.
struct InterruptGuard<'a> {
    controller: &'a SessionController,
    epoch: u64,
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        self.controller.fail(self.epoch, INTERRUPTED_MESSAGE);
    }
}

/// Drives analysis sessions against an [`AnalysisTransport`].
///
/// Cheap to clone; clones control the same session. `analyze` runs until
/// the session finishes or is superseded, so callers that need to `reset`
/// concurrently spawn it on a task and keep a clone.
#[derive(Clone)]
pub struct SessionController {
    transport: Arc<dyn AnalysisTransport>,
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(transport: Arc<dyn AnalysisTransport>) -> Self {
        let (updates, _) = watch::channel(AnalysisSession::default());
        Self {
            transport,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session: AnalysisSession::default(),
                    epoch: 0,
                    cancel: None,
                }),
                updates,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The lock is never held across an await or a user callback, so a
        // poisoned mutex still holds a consistent session
        self.shared
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, inner: &Inner) {
        self.shared.updates.send_replace(inner.session.clone());
    }

    /// Returns a copy of the current session.
    pub fn snapshot(&self) -> AnalysisSession {
        self.lock().session.clone()
    }

    /// Subscribes to session changes.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisSession> {
        self.shared.updates.subscribe()
    }

    /// Runs an analysis of `job_description` to completion.
    ///
    /// Returns immediately without touching state if a session is already
    /// streaming. Transport failures end the session in the Error state;
    /// cancellation by a newer operation leaves state to that operation.
    /// Dropping the returned future mid-stream also ends the session in the
    /// Error state.
    pub async fn analyze(&self, job_description: &str) {
        let Some((epoch, token)) = self.begin() else {
            debug!("Analysis already streaming, ignoring request");
            return;
        };
        info!(epoch, chars = job_description.chars().count(), "Starting analysis");
        let _interrupt = InterruptGuard {
            controller: self,
            epoch,
        };

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Err(ClientError::Cancelled),
            result = self.stream(epoch, job_description) => result,
        };

        match outcome {
            Ok(()) => {}
            Err(ClientError::Cancelled) => debug!(epoch, "Analysis cancelled"),
            Err(e) => self.fail(epoch, e.to_string()),
        }
    }

    /// Cancels any running session and returns to Idle.
    pub fn reset(&self) {
        let mut inner = self.lock();
        let epoch = inner.supersede();
        inner.session = AnalysisSession::default();
        self.publish(&inner);
        debug!(epoch, "Session reset");
    }

    /// Cancels any running session and shows `result` as reopened from
    /// history.
    pub fn load_result(&self, result: AnalysisResult) {
        let mut inner = self.lock();
        let epoch = inner.supersede();
        inner.session = AnalysisSession::from_history(result);
        self.publish(&inner);
        debug!(epoch, "Loaded result from history");
    }

    /// Starts a new session unless one is streaming.
    fn begin(&self) -> Option<(u64, CancellationToken)> {
        let mut inner = self.lock();
        if inner.session.is_streaming() {
            return None;
        }

        let epoch = inner.supersede();
        let token = CancellationToken::new();
        inner.cancel = Some(token.clone());
        inner.session = AnalysisSession::streaming();
        self.publish(&inner);

        Some((epoch, token))
    }

    async fn stream(&self, epoch: u64, job_description: &str) -> Result<()> {
        let body = self.transport.open(job_description).await?;
        let mut events = Box::pin(decode_events(body));

        while let Some(event) = events.next().await {
            if self.dispatch(epoch, event?) == Flow::Stop {
                return Ok(());
            }
        }

        self.fail(epoch, INCOMPLETE_STREAM_MESSAGE);
        Ok(())
    }

    /// Applies `event` if `epoch` is still current.
    fn dispatch(&self, epoch: u64, event: StreamEvent) -> Flow {
        let mut inner = self.lock();
        if inner.epoch != epoch {
            debug!(epoch, current = inner.epoch, "Discarding event from superseded session");
            return Flow::Stop;
        }

        if inner.session.apply(event) {
            self.publish(&inner);
        }

        if inner.session.is_streaming() {
            Flow::Continue
        } else {
            Flow::Stop
        }
    }

    /// Moves the session to Error if `epoch` is current and still streaming.
    fn fail(&self, epoch: u64, message: impl Into<String>) {
        let mut inner = self.lock();
        if inner.epoch != epoch || !inner.session.is_streaming() {
            return;
        }

        let message = message.into();
        warn!(epoch, error = %message, "Analysis failed");
        inner.session.fail(message);
        self.publish(&inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ResultSource, SessionState};
    use crate::transport::ByteStream;
    use async_trait::async_trait;
    use bytes::Bytes;
    use prep_models::StepStatus;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;

    type ChunkSender = mpsc::UnboundedSender<Result<Bytes>>;

    /// Transport whose response bodies are fed by the test through channels.
    #[derive(Default)]
    struct ScriptedTransport {
        bodies: Mutex<VecDeque<Result<ByteStream>>>,
        opened: AtomicUsize,
    }

    impl ScriptedTransport {
        /// Queues a body and returns the sender that feeds it.
        fn push_body(&self) -> ChunkSender {
            let (tx, rx) = mpsc::unbounded_channel();
            let body = futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|chunk| (chunk, rx))
            });
            self.bodies.lock().unwrap().push_back(Ok(Box::pin(body)));
            tx
        }

        fn push_error(&self, error: ClientError) {
            self.bodies.lock().unwrap().push_back(Err(error));
        }

        fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisTransport for ScriptedTransport {
        async fn open(&self, _job_description: &str) -> Result<ByteStream> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ClientError::NoStream))
        }
    }

    fn setup() -> (SessionController, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::default());
        let controller = SessionController::new(transport.clone());
        (controller, transport)
    }

    fn send(tx: &ChunkSender, text: &str) {
        tx.send(Ok(Bytes::from(text.to_string()))).unwrap();
    }

    const STEPS: &str = "data: {\"type\":\"steps\",\"steps\":[{\"emoji\":\"⏳\",\"text\":\"a\"},{\"emoji\":\"🔍\",\"text\":\"b\"},{\"emoji\":\"📊\",\"text\":\"c\"}]}\n\n";
    const RESULT: &str = "data: {\"type\":\"result\",\"data\":{\"companyName\":\"Acme\"}}\n\n";

    async fn wait_until(
        controller: &SessionController,
        condition: impl FnMut(&AnalysisSession) -> bool,
    ) {
        let mut rx = controller.subscribe();
        rx.wait_for(condition).await.unwrap();
    }

    #[tokio::test]
    async fn test_full_session() {
        let (controller, transport) = setup();
        let tx = transport.push_body();

        send(&tx, STEPS);
        send(&tx, "data: {\"type\":\"progress\",\"stepIndex\":1,\"status\":\"active\",\"progress\":45}\n\n");
        send(&tx, RESULT);
        drop(tx);

        controller.analyze("Rust engineer at Acme").await;

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Complete);
        assert_eq!(session.progress, 100);
        assert_eq!(session.result_source, ResultSource::Streaming);
        assert_eq!(session.result.unwrap().company_name, "Acme");
        assert_eq!(session.steps[0].status, StepStatus::Done);
        assert_eq!(session.steps[1].status, StepStatus::Active);
    }

    #[tokio::test]
    async fn test_streaming_state_visible_to_subscribers() {
        let (controller, transport) = setup();
        let tx = transport.push_body();

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.analyze("jd").await })
        };

        send(&tx, STEPS);
        wait_until(&controller, |s| s.steps.len() == 3).await;

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Streaming);
        assert_eq!(session.progress, 0);
        assert!(session.steps.iter().all(|s| s.status == StepStatus::Pending));

        send(&tx, RESULT);
        task.await.unwrap();
        assert_eq!(controller.snapshot().state, SessionState::Complete);
    }

    #[tokio::test]
    async fn test_analyze_while_streaming_is_noop() {
        let (controller, transport) = setup();
        let tx = transport.push_body();

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.analyze("first").await })
        };
        send(&tx, STEPS);
        send(&tx, "data: {\"type\":\"progress\",\"stepIndex\":0,\"status\":\"active\",\"progress\":20}\n");
        wait_until(&controller, |s| s.progress == 20).await;
        let before = controller.snapshot();

        controller.analyze("second").await;

        assert_eq!(transport.opened(), 1);
        assert_eq!(controller.snapshot(), before);

        send(&tx, RESULT);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_backend_error_event() {
        let (controller, transport) = setup();
        let tx = transport.push_body();
        send(&tx, STEPS);
        send(&tx, "data: {\"type\":\"error\",\"message\":\"Company research failed\"}\n\n");
        drop(tx);

        controller.analyze("jd").await;

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Error);
        assert_eq!(session.error.as_deref(), Some("Company research failed"));
        assert!(session.result.is_none());
    }

    #[tokio::test]
    async fn test_http_status_becomes_error_state() {
        let (controller, transport) = setup();
        transport.push_error(ClientError::Http { status: 502 });

        controller.analyze("jd").await;

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Error);
        assert_eq!(session.error.as_deref(), Some("Server error: 502"));
    }

    #[tokio::test]
    async fn test_missing_body_becomes_error_state() {
        let (controller, transport) = setup();
        transport.push_error(ClientError::NoStream);

        controller.analyze("jd").await;

        assert_eq!(controller.snapshot().error.as_deref(), Some("No response stream"));
    }

    #[tokio::test]
    async fn test_read_error_mid_stream() {
        let (controller, transport) = setup();
        let tx = transport.push_body();
        send(&tx, STEPS);
        tx.send(Err(ClientError::Network("connection reset".into())))
            .unwrap();

        controller.analyze("jd").await;

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Error);
        assert_eq!(session.error.as_deref(), Some("Network error: connection reset"));
    }

    #[tokio::test]
    async fn test_stream_end_without_result_releases_guard() {
        let (controller, transport) = setup();
        let tx = transport.push_body();
        send(&tx, STEPS);
        drop(tx);

        controller.analyze("jd").await;

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Error);
        assert_eq!(session.error.as_deref(), Some(INCOMPLETE_STREAM_MESSAGE));

        // A retry starts a fresh session
        let tx = transport.push_body();
        send(&tx, RESULT);
        drop(tx);
        controller.analyze("jd").await;
        assert_eq!(controller.snapshot().state, SessionState::Complete);
        assert_eq!(transport.opened(), 2);
    }

    #[tokio::test]
    async fn test_reset_mid_stream() {
        let (controller, transport) = setup();
        let tx = transport.push_body();

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.analyze("jd").await })
        };
        send(&tx, STEPS);
        wait_until(&controller, |s| !s.steps.is_empty()).await;

        controller.reset();
        task.await.unwrap();

        // The old body is still open; nothing it delivers may land
        let _ = tx.send(Ok(Bytes::from_static(RESULT.as_bytes())));
        tokio::task::yield_now().await;

        assert_eq!(controller.snapshot(), AnalysisSession::default());
    }

    #[tokio::test]
    async fn test_stale_epoch_events_discarded() {
        let (controller, _transport) = setup();
        let (old_epoch, _token) = controller.begin().unwrap();

        controller.reset();
        let (new_epoch, _token) = controller.begin().unwrap();

        let stale = StreamEvent::Result {
            data: AnalysisResult::new("Stale"),
        };
        assert_eq!(controller.dispatch(old_epoch, stale), Flow::Stop);
        controller.fail(old_epoch, "stale failure");

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Streaming);
        assert!(session.result.is_none());
        assert!(session.error.is_none());

        let fresh = StreamEvent::Result {
            data: AnalysisResult::new("Fresh"),
        };
        assert_eq!(controller.dispatch(new_epoch, fresh), Flow::Stop);
        assert_eq!(controller.snapshot().result.unwrap().company_name, "Fresh");
    }

    #[tokio::test]
    async fn test_new_analyze_after_reset_supersedes_old_stream() {
        let (controller, transport) = setup();
        let old_tx = transport.push_body();

        let old_task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.analyze("old").await })
        };
        send(&old_tx, STEPS);
        wait_until(&controller, |s| !s.steps.is_empty()).await;

        controller.reset();
        let new_tx = transport.push_body();
        let new_task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.analyze("new").await })
        };
        wait_until(&controller, |s| s.is_streaming()).await;

        let _ = old_tx.send(Ok(Bytes::from_static(
            b"data: {\"type\":\"result\",\"data\":{\"companyName\":\"Old\"}}\n",
        )));
        send(&new_tx, RESULT);

        old_task.await.unwrap();
        new_task.await.unwrap();

        assert_eq!(controller.snapshot().result.unwrap().company_name, "Acme");
    }

    #[tokio::test]
    async fn test_load_result_cancels_stream() {
        let (controller, transport) = setup();
        let tx = transport.push_body();

        let task = {
            let controller = controller.clone();
            tokio::spawn(async move { controller.analyze("jd").await })
        };
        send(&tx, STEPS);
        wait_until(&controller, |s| !s.steps.is_empty()).await;

        controller.load_result(AnalysisResult::new("Saved Co"));
        task.await.unwrap();

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Complete);
        assert_eq!(session.result_source, ResultSource::History);
        assert_eq!(session.progress, 100);
        assert!(session.steps.is_empty());
        assert!(session.error.is_none());
        assert_eq!(session.result.unwrap().company_name, "Saved Co");
    }

    #[tokio::test]
    async fn test_dropped_analyze_releases_guard() {
        let (controller, transport) = setup();
        let tx = transport.push_body();
        send(&tx, STEPS);

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), controller.analyze("jd")).await;
        assert!(outcome.is_err());

        let session = controller.snapshot();
        assert_eq!(session.state, SessionState::Error);
        assert_eq!(session.error.as_deref(), Some(INTERRUPTED_MESSAGE));

        let retry = transport.push_body();
        send(&retry, RESULT);
        drop(retry);
        controller.analyze("jd").await;

        assert_eq!(transport.opened(), 2);
        assert_eq!(controller.snapshot().state, SessionState::Complete);
    }

    #[tokio::test]
    async fn test_reset_when_idle() {
        let (controller, _transport) = setup();
        controller.reset();
        assert_eq!(controller.snapshot(), AnalysisSession::default());
    }
}
