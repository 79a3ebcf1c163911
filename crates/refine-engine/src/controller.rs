//! Stream reconciliation controller
//!
//! Drives one refinement run end to end: splits the input to the token
//! budget, opens the model stream chunk by chunk, routes deltas and
//! foreign edits to the writer in channel order, and throttles document
//! writes so a fast stream cannot flood the host.
//!
//! One controller owns one document region for the duration of a run;
//! concurrent runs over the same region are the caller's bug.

use std::sync::Arc;
use std::time::Instant;

use regex::Regex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use refine_providers::{
    provider_for, ChatRequest, Provider, ProviderError, RetryingStreamClient,
};

use crate::config::RefineConfig;
use crate::document::EditEvent;
use crate::error::EngineError;
use crate::session::{Accumulator, StreamSession};
use crate::splitter::{split, TokenEstimator};
use crate::writer::{emit, HostEvent, HostEventSender, ResultWriter};

/// Characters of stream tail shown in progress status
pub const STATUS_TAIL: usize = 50;

/// Lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// Input split, stream being opened
    Requesting,
    /// Deltas arriving
    Streaming,
    /// Stream closed, last write in flight
    Finalizing,
    Done,
    Canceled,
}

/// Runs streaming refinement sessions against a writer
pub struct StreamController {
    config: RefineConfig,
    cancel: CancellationToken,
    state: SessionState,
    events: Option<HostEventSender>,
}

impl StreamController {
    pub fn new(config: RefineConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            state: SessionState::Idle,
            events: None,
        }
    }

    /// Attach a host event channel for progress and open requests
    pub fn with_events(mut self, events: HostEventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Token the host uses to cancel this run
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the run. Queued deltas are dropped, no further writes
    /// happen, text already written stays.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run `session` to completion against the provider named by its
    /// model.
    ///
    /// Deltas are applied in arrival order; `edits` events are routed to
    /// the writer in delivery order. The first delta of a chunk is
    /// written immediately, later ones at most once per throttle window,
    /// and the final write always carries the complete text. Returns the
    /// full accumulated output.
    pub async fn run<W: ResultWriter>(
        &mut self,
        session: &StreamSession,
        boundary: &Regex,
        tokens: &dyn TokenEstimator,
        writer: &mut W,
        edits: mpsc::UnboundedReceiver<EditEvent>,
    ) -> Result<String, EngineError> {
        self.state = SessionState::Requesting;

        let model = session.model();
        let api_key = match self.config.credential_for(&model.provider) {
            Ok(key) => key.to_string(),
            Err(err) => return self.fail(err.into()),
        };
        let provider = match provider_for(model, api_key) {
            Ok(provider) => provider,
            Err(err) => return self.fail(err.into()),
        };
        self.run_with(session, boundary, tokens, provider, writer, edits)
            .await
    }

    /// Like [`StreamController::run`] but with an explicit provider,
    /// bypassing the registry. The seam hosts and tests use to supply
    /// their own transports.
    pub async fn run_with<W: ResultWriter>(
        &mut self,
        session: &StreamSession,
        boundary: &Regex,
        tokens: &dyn TokenEstimator,
        provider: Arc<dyn Provider>,
        writer: &mut W,
        mut edits: mpsc::UnboundedReceiver<EditEvent>,
    ) -> Result<String, EngineError> {
        self.state = SessionState::Requesting;

        let chunks = match split(
            session.selected_text(),
            self.config.max_tokens_per_chunk,
            boundary,
            tokens,
        ) {
            Ok(chunks) => chunks,
            Err(err) => return self.fail(err),
        };
        debug!("session split into {} chunk(s)", chunks.len());

        let model = session.model();
        let client = Arc::new(RetryingStreamClient::new(
            provider,
            self.config.retry.clone(),
        ));

        let mut acc = Accumulator::new();
        let mut last_write: Option<Instant> = None;
        let mut edits_open = true;

        for chunk in chunks {
            acc.start_chunk();
            self.state = SessionState::Streaming;

            // Capacity 1: the provider task blocks on send until the
            // previous delta is taken, pushing backpressure upstream.
            let (delta_tx, mut delta_rx) = mpsc::channel::<String>(1);
            let request = ChatRequest {
                model: model.model.clone(),
                system: session.prompt().text.clone(),
                input: chunk,
                max_tokens: None,
            };
            let task_client = Arc::clone(&client);
            let task_cancel = self.cancel.clone();
            let handle = tokio::spawn(async move {
                task_client
                    .stream(request, &task_cancel, move |delta| {
                        let tx = delta_tx.clone();
                        async move {
                            let _ = tx.send(delta).await;
                        }
                    })
                    .await
            });

            let mut write_err: Option<EngineError> = None;
            loop {
                tokio::select! {
                    biased;
                    maybe_edit = edits.recv(), if edits_open => match maybe_edit {
                        Some(event) => writer.handle_edit(&event),
                        None => edits_open = false,
                    },
                    maybe_delta = delta_rx.recv() => {
                        let Some(delta) = maybe_delta else { break };
                        acc.push(&delta);
                        emit(&self.events, HostEvent::Status(acc.tail(STATUS_TAIL)));

                        if self.cancel.is_cancelled() {
                            continue;
                        }
                        let due = last_write
                            .map_or(true, |at| at.elapsed() >= self.config.throttle);
                        if due {
                            if let Err(err) = writer.write(acc.whole(), false).await {
                                write_err = Some(err);
                                break;
                            }
                            last_write = Some(Instant::now());
                        }
                    }
                }
            }

            if let Some(err) = write_err {
                handle.abort();
                return self.fail(err);
            }

            match handle.await {
                Ok(Ok(_)) => {}
                Ok(Err(err)) => return self.fail(err.into()),
                Err(join) => {
                    return self.fail(ProviderError::Internal(join.to_string()).into())
                }
            }
        }

        // Late edits that raced the stream close still move the region
        // before the final write.
        while let Ok(event) = edits.try_recv() {
            writer.handle_edit(&event);
        }

        if self.cancel.is_cancelled() {
            return self.fail(EngineError::Canceled);
        }

        self.state = SessionState::Finalizing;
        if let Err(err) = writer.write(acc.whole(), true).await {
            return self.fail(err);
        }

        self.state = SessionState::Done;
        emit(&self.events, HostEvent::Status("finished.".to_string()));
        info!("session done, {} bytes streamed", acc.whole().len());
        Ok(acc.whole().to_string())
    }

    fn fail(&mut self, err: EngineError) -> Result<String, EngineError> {
        self.state = if matches!(err, EngineError::Canceled) {
            SessionState::Canceled
        } else {
            SessionState::Idle
        };
        Err(err)
    }
}
