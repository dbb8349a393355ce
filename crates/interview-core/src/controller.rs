use crate::Input;
use crate::answer::AnswerBuffer;
use crate::call_state::{CallState, CallTrigger};
use crate::events::{AgentMessage, SessionEvent, SessionTarget};
use crate::question::{KeywordClassifier, QuestionClassifier, latest_question};
use crate::session_client::SessionClient;
use crate::submission::Submitter;
use crate::transcript::{Speaker, TranscriptLog, Utterance};
use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Wait between stopping the old session and starting the new one.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

const INPUT_CHANNEL_CAPACITY: usize = 128;

const STATUS_IDLE: &str = "Idle";
const STATUS_STARTING: &str = "Starting interview...";
const STATUS_STARTED: &str = "Interview started";
const STATUS_ENDING: &str = "Ending interview...";
const STATUS_ENDED: &str = "Interview ended";
const STATUS_RESTARTING: &str = "Restarting interview...";
const STATUS_CLOSED: &str = "Interview closed";

/// How the restart coordinator decides the old session is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Start again after a fixed delay.
    Fixed(Duration),
    /// Start again as soon as the old session's call-end arrives, or after
    /// `timeout` if it never does.
    TeardownAck { timeout: Duration },
}

impl SettleStrategy {
    fn delay(self) -> Duration {
        match self {
            SettleStrategy::Fixed(delay) => delay,
            SettleStrategy::TeardownAck { timeout } => timeout,
        }
    }
}

impl Default for SettleStrategy {
    fn default() -> Self {
        SettleStrategy::Fixed(DEFAULT_SETTLE_DELAY)
    }
}

#[derive(Clone)]
pub struct ControllerConfig {
    pub target: SessionTarget,
    pub settle: SettleStrategy,
    pub classifier: Arc<dyn QuestionClassifier>,
}

impl ControllerConfig {
    pub fn new(target: SessionTarget) -> Self {
        Self {
            target,
            settle: SettleStrategy::default(),
            classifier: Arc::new(KeywordClassifier::default()),
        }
    }

    pub fn with_settle(mut self, settle: SettleStrategy) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn QuestionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }
}

/// What the controller's queue carries: view inputs plus its own timer.
#[derive(Debug, Clone, PartialEq)]
enum Queued {
    Input(Input),
    /// The settle delay for the given restart epoch has passed.
    SettleElapsed(u64),
}

/// Everything a view needs to render the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: CallState,
    pub status: String,
    pub transcript: Vec<Utterance>,
    pub question: Option<String>,
    pub answer: String,
}

/// The view's end of a running session: send inputs, watch snapshots.
///
/// The session shuts down once every handle is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    inputs: mpsc::Sender<Queued>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    pub async fn send(&self, input: Input) -> Result<()> {
        self.inputs
            .send(Queued::Input(input))
            .await
            .map_err(|_| anyhow::anyhow!("interview session has shut down"))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Owns one voice-agent connection and all state derived from it.
///
/// Inputs are handled one at a time, each to completion, so no handler ever
/// observes another's partial update. The settle delay runs as a separate
/// timer task that feeds a settle signal back into the same queue. Only the
/// controller can produce that signal.
pub struct InterviewController<C, S> {
    client: C,
    submitter: S,
    config: ControllerConfig,
    state: CallState,
    transcript: TranscriptLog,
    question: Option<Utterance>,
    answer: AnswerBuffer,
    status: String,
    restart_epoch: u64,
    // The stopped session's call-end has not been seen yet.
    stale_call_end: bool,
    pending_settle: Option<JoinHandle<()>>,
    disposed: Arc<AtomicBool>,
    inputs: mpsc::Receiver<Queued>,
    loopback: mpsc::WeakSender<Queued>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<C, S> InterviewController<C, S>
where
    C: SessionClient + 'static,
    S: Submitter + 'static,
{
    pub fn new(client: C, submitter: S, config: ControllerConfig) -> (Self, SessionHandle) {
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot {
            status: STATUS_IDLE.to_string(),
            ..Default::default()
        });

        let controller = Self {
            client,
            submitter,
            config,
            state: CallState::Idle,
            transcript: TranscriptLog::new(),
            question: None,
            answer: AnswerBuffer::new(),
            status: STATUS_IDLE.to_string(),
            restart_epoch: 0,
            stale_call_end: false,
            pending_settle: None,
            disposed: Arc::new(AtomicBool::new(false)),
            inputs: input_rx,
            loopback: input_tx.downgrade(),
            snapshots: snapshot_tx,
        };
        let handle = SessionHandle {
            inputs: input_tx,
            snapshots: snapshot_rx,
        };
        (controller, handle)
    }

    /// Opens a session view: takes the client's event stream, forwards it into
    /// the input queue and runs the controller on its own task.
    pub fn spawn(
        mut client: C,
        submitter: S,
        config: ControllerConfig,
    ) -> Result<(SessionHandle, JoinHandle<()>)> {
        let mut events = client
            .subscribe()
            .context("Failed to subscribe to voice session events")?;
        let (controller, handle) = Self::new(client, submitter, config);

        let forward = controller.loopback.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inputs) = forward.upgrade() else {
                    break;
                };
                if inputs.send(Queued::Input(Input::Session(event))).await.is_err() {
                    break;
                }
            }
            tracing::debug!("voice session event stream closed");
        });

        let task = tokio::spawn(controller.run());
        Ok((handle, task))
    }

    /// Handles inputs until the view disposes the session or drops every handle.
    pub async fn run(mut self) {
        tracing::info!(assistant = %self.config.target, "interview session opened");
        while let Some(queued) = self.inputs.recv().await {
            let dispose = matches!(queued, Queued::Input(Input::Dispose));
            self.dispatch(queued).await;
            if dispose {
                break;
            }
        }
        self.dispose().await;
        tracing::info!("interview session closed");
    }

    pub async fn handle(&mut self, input: Input) {
        self.dispatch(Queued::Input(input)).await;
    }

    async fn dispatch(&mut self, queued: Queued) {
        if self.is_disposed() {
            tracing::debug!(?queued, "session disposed, ignoring input");
            return;
        }

        let result = match queued {
            Queued::Input(Input::Start) => self.start().await,
            Queued::Input(Input::End) => self.end().await,
            Queued::Input(Input::Restart) => self.restart().await,
            Queued::Input(Input::EditAnswer(text)) => {
                self.answer.set(text);
                Ok(())
            }
            Queued::Input(Input::Submit) => {
                self.submit().await;
                Ok(())
            }
            Queued::Input(Input::Session(event)) => self.on_session_event(event).await,
            Queued::SettleElapsed(epoch) => self.on_settle_elapsed(epoch).await,
            Queued::Input(Input::Dispose) => {
                self.dispose().await;
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::error!("Interview session error: {:?}", e);
            self.fail(format!("{e:#}"));
        }
        self.publish();
    }

    /// Tears the session down. Safe to call more than once.
    pub async fn dispose(&mut self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel_settle();

        // A restarting session was already stopped.
        if self.state.is_live() && self.state != CallState::Restarting {
            if let Err(e) = self.client.stop().await {
                tracing::warn!("Failed to stop voice session during teardown: {:?}", e);
            }
        }
        self.state = CallState::Idle;
        self.status = STATUS_CLOSED.to_string();
        self.publish();
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    pub fn question(&self) -> Option<&Utterance> {
        self.question.as_ref()
    }

    pub fn answer(&self) -> &AnswerBuffer {
        &self.answer
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            status: self.status.clone(),
            transcript: self.transcript.entries().to_vec(),
            question: self.question.as_ref().map(|q| q.text().to_string()),
            answer: self.answer.text().to_string(),
        }
    }

    async fn start(&mut self) -> Result<()> {
        let Some(next) = self.state.on(CallTrigger::StartRequested) else {
            tracing::debug!(state = ?self.state, "ignoring start request");
            return Ok(());
        };

        self.reset_conversation();
        self.state = next;
        // A fresh start owns every call-end that follows.
        self.stale_call_end = false;
        self.status = STATUS_STARTING.to_string();
        tracing::info!(assistant = %self.config.target, "starting interview");
        self.client
            .start(&self.config.target)
            .await
            .context("Failed to start interview")
    }

    async fn end(&mut self) -> Result<()> {
        let Some(next) = self.state.on(CallTrigger::EndRequested) else {
            tracing::debug!(state = ?self.state, "ignoring end request");
            return Ok(());
        };

        self.state = next;
        self.status = STATUS_ENDING.to_string();
        tracing::info!("ending interview");
        self.client.stop().await.context("Failed to end interview")
    }

    async fn restart(&mut self) -> Result<()> {
        let Some(next) = self.state.on(CallTrigger::RestartRequested) else {
            tracing::debug!(state = ?self.state, "ignoring restart request");
            return Ok(());
        };

        tracing::info!("restarting interview");
        self.client
            .stop()
            .await
            .context("Failed to stop interview for restart")?;

        self.state = next;
        self.reset_conversation();
        self.status = STATUS_RESTARTING.to_string();
        self.restart_epoch += 1;
        self.stale_call_end = true;
        self.schedule_settle(self.config.settle.delay());
        Ok(())
    }

    async fn on_settle_elapsed(&mut self, epoch: u64) -> Result<()> {
        if epoch != self.restart_epoch || self.state != CallState::Restarting {
            tracing::debug!(
                epoch,
                current = self.restart_epoch,
                state = ?self.state,
                "ignoring stale settle signal"
            );
            return Ok(());
        }
        self.begin_restarted_session().await
    }

    async fn begin_restarted_session(&mut self) -> Result<()> {
        // The timer may have fired just before the view went away.
        if self.is_disposed() {
            return Ok(());
        }
        self.cancel_settle();

        let Some(next) = self.state.on(CallTrigger::SettleElapsed) else {
            return Ok(());
        };
        self.state = next;
        self.status = STATUS_STARTING.to_string();
        tracing::info!(assistant = %self.config.target, epoch = self.restart_epoch, "starting restarted interview");
        self.client
            .start(&self.config.target)
            .await
            .context("Failed to restart interview")
    }

    async fn on_session_event(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::CallStart => match self.state.on(CallTrigger::CallStarted) {
                Some(next) => {
                    self.state = next;
                    self.stale_call_end = false;
                    self.status = STATUS_STARTED.to_string();
                    tracing::info!("interview started");
                }
                None => tracing::debug!(state = ?self.state, "ignoring call-start"),
            },
            SessionEvent::CallEnd => return self.on_call_end().await,
            SessionEvent::Message(message) => self.on_message(message),
            SessionEvent::Error(message) => {
                tracing::warn!(state = ?self.state, "voice agent reported an error: {}", message);
                let status = format!("Voice agent error: {message}");
                if self.state == CallState::Starting {
                    self.fail(status);
                } else {
                    self.status = status;
                }
            }
        }
        Ok(())
    }

    async fn on_call_end(&mut self) -> Result<()> {
        if self.stale_call_end
            && matches!(self.state, CallState::Restarting | CallState::Starting)
        {
            self.stale_call_end = false;
            tracing::debug!(state = ?self.state, "absorbed call-end of the stopped session");
            if self.state == CallState::Restarting
                && matches!(self.config.settle, SettleStrategy::TeardownAck { .. })
            {
                return self.begin_restarted_session().await;
            }
            return Ok(());
        }

        match self.state.on(CallTrigger::CallEnded) {
            Some(next) => {
                if self.state == CallState::Active {
                    tracing::info!("interview ended by the agent");
                }
                self.state = next;
                self.status = STATUS_ENDED.to_string();
            }
            None => tracing::debug!(state = ?self.state, "ignoring call-end"),
        }
        Ok(())
    }

    fn on_message(&mut self, message: AgentMessage) {
        if !message.is_transcript() {
            tracing::trace!(kind = %message.kind, "ignoring non-transcript message");
            return;
        }
        if self.state == CallState::Restarting {
            tracing::debug!("dropping transcript from the stopped session");
            return;
        }
        let Some(speaker) = Speaker::from_role(&message.role) else {
            tracing::warn!(role = %message.role, "dropping transcript with unknown role");
            return;
        };

        let utterance = self.transcript.append(speaker, message.transcript);
        tracing::debug!(sequence = utterance.sequence(), ?speaker, "transcript appended");
        self.refresh_question();
    }

    fn refresh_question(&mut self) {
        let latest = latest_question(&self.transcript, self.config.classifier.as_ref()).cloned();
        let changed = latest.as_ref().map(Utterance::sequence)
            != self.question.as_ref().map(Utterance::sequence);
        if changed {
            if let Some(question) = &latest {
                tracing::info!(sequence = question.sequence(), "coding question detected: {}", question.text());
            }
        }
        self.question = latest;
    }

    async fn submit(&mut self) {
        let question = self.question.as_ref().map(Utterance::text).unwrap_or_default();
        let result = self.submitter.submit(question, self.answer.text()).await;
        match result {
            Ok(receipt) => self.status = receipt.message,
            Err(e) => {
                tracing::error!("Failed to submit answer: {:?}", e);
                self.status = format!("Submission failed: {e:#}");
            }
        }
    }

    /// Clears the transcript and everything derived from it.
    fn reset_conversation(&mut self) {
        debug_assert_ne!(self.state, CallState::Active, "transcript cleared mid-conversation");
        self.transcript.clear();
        self.question = None;
        self.answer.clear();
    }

    fn schedule_settle(&mut self, delay: Duration) {
        self.cancel_settle();

        let epoch = self.restart_epoch;
        let disposed = Arc::clone(&self.disposed);
        let inputs = self.loopback.clone();
        self.pending_settle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if disposed.load(Ordering::Acquire) {
                tracing::debug!(epoch, "session disposed during settle delay");
                return;
            }
            if let Some(inputs) = inputs.upgrade() {
                let _ = inputs.send(Queued::SettleElapsed(epoch)).await;
            }
        }));
    }

    fn cancel_settle(&mut self) {
        if let Some(task) = self.pending_settle.take() {
            task.abort();
        }
    }

    fn fail(&mut self, message: String) {
        if let Some(next) = self.state.on(CallTrigger::Failed) {
            self.state = next;
        }
        self.cancel_settle();
        self.stale_call_end = false;
        self.status = message;
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}

impl<C, S> Drop for InterviewController<C, S> {
    fn drop(&mut self) {
        self.disposed.store(true, Ordering::Release);
        if let Some(task) = self.pending_settle.take() {
            task.abort();
        }
    }
}
