/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Core DirectiveSequencer implementation.
//!
//! The sequencer owns the intake channel, the background receiving loop and
//! the enable/disable/shutdown lifecycle. It validates directives at intake
//! and delegates everything else to the ordered processor and the router.

use crate::directive::{Directive, DirectiveHandler, ExceptionKind, ExceptionSender};
use crate::processor::DirectiveProcessor;
use crate::router::{DirectiveRouter, RegistrationError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Errors that can occur when interacting with the sequencer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SequencerError {
    /// The directive carries no message id and cannot be tracked.
    #[error("directive is malformed: missing message id")]
    MalformedDirective,

    /// The sequencer is disabled; the transport layer may retry after
    /// re-enabling.
    #[error("sequencer is disabled")]
    Disabled,

    /// The sequencer is shutting down or has shut down.
    #[error("sequencer is shutting down")]
    ShuttingDown,

    /// No tokio runtime was available to spawn the receiving loop.
    #[error("no tokio runtime available to spawn the receiving loop")]
    NoRuntime,
}

/// Thread-safe front door for server-issued directives.
///
/// Any number of threads may call [`on_directive`](Self::on_directive),
/// [`set_dialog_request_id`](Self::set_dialog_request_id),
/// [`enable`](Self::enable) / [`disable`](Self::disable) and the handler
/// registration methods concurrently; a single background task drains the
/// intake queue. Dropping the sequencer without calling
/// [`shutdown`](Self::shutdown) closes the intake channel and lets the
/// receiving loop drain and exit on its own.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use directive_rs::directive::{ExceptionKind, ExceptionSender};
/// use directive_rs::sequencer::DirectiveSequencer;
///
/// struct NullSender;
/// impl ExceptionSender for NullSender {
///     fn send_exception_encountered(&self, _: &str, _: ExceptionKind, _: &str) {}
/// }
///
/// # async fn example() {
/// let sequencer = DirectiveSequencer::new(Arc::new(NullSender)).unwrap();
/// sequencer.set_dialog_request_id(Some("dialog-1"));
/// # }
/// ```
pub struct DirectiveSequencer {
    /// Handler registry; dispatch target for session-exempt directives.
    router: Arc<DirectiveRouter>,

    /// Per-dialog ordering and medium bookkeeping.
    processor: Arc<DirectiveProcessor>,

    /// Producer side of the intake queue. Taken at shutdown so the
    /// receiving loop observes end-of-stream after draining.
    intake: RwLock<Option<mpsc::UnboundedSender<Arc<Directive>>>>,

    /// Accept/reject flag consulted by `on_directive`.
    enabled: AtomicBool,

    /// Set once by `shutdown`; never cleared.
    shutting_down: AtomicBool,

    /// Join handle of the receiving loop.
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl DirectiveSequencer {
    /// Creates a sequencer and spawns its receiving loop on the ambient
    /// tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SequencerError::NoRuntime`] when called outside a tokio
    /// runtime — failing to start the receiving loop is fatal to
    /// construction, not discovered later.
    pub fn new(exception_sender: Arc<dyn ExceptionSender>) -> Result<Self, SequencerError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SequencerError::NoRuntime)?;

        let router = Arc::new(DirectiveRouter::new());
        let processor = Arc::new(DirectiveProcessor::new(Arc::clone(&router)));
        let (intake_tx, intake_rx) = mpsc::unbounded_channel();

        let worker = runtime.spawn(Self::receiving_loop(
            Arc::clone(&router),
            Arc::clone(&processor),
            exception_sender,
            intake_rx,
        ));

        Ok(Self {
            router,
            processor,
            intake: RwLock::new(Some(intake_tx)),
            enabled: AtomicBool::new(true),
            shutting_down: AtomicBool::new(false),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Accepts a directive from the transport layer.
    ///
    /// Returns synchronously once the directive is on the intake queue —
    /// never the eventual handling outcome, and never blocking on handler
    /// execution.
    ///
    /// # Errors
    ///
    /// - [`SequencerError::MalformedDirective`] if the message id is empty;
    ///   the directive never enters the queue.
    /// - [`SequencerError::ShuttingDown`] after [`shutdown`](Self::shutdown)
    ///   has started.
    /// - [`SequencerError::Disabled`] while the sequencer is disabled.
    pub fn on_directive(&self, directive: Directive) -> Result<(), SequencerError> {
        if directive.message_id().is_empty() {
            error!("onDirectiveFailed: missing message id");
            return Err(SequencerError::MalformedDirective);
        }
        if self.shutting_down.load(Ordering::SeqCst) {
            warn!(directive = %directive, "onDirectiveFailed: shutting down");
            return Err(SequencerError::ShuttingDown);
        }
        if !self.enabled.load(Ordering::SeqCst) {
            warn!(directive = %directive, "onDirectiveFailed: disabled");
            return Err(SequencerError::Disabled);
        }

        info!(directive = %directive, "onDirective");
        let intake = self.intake.read().expect("intake lock poisoned");
        match intake.as_ref() {
            Some(sender) => sender
                .send(Arc::new(directive))
                .map_err(|_| SequencerError::ShuttingDown),
            None => Err(SequencerError::ShuttingDown),
        }
    }

    /// Sets the current dialog request id, cancelling directives still
    /// queued under the previous one. Safe to call concurrently with the
    /// receiving loop.
    pub fn set_dialog_request_id(&self, dialog_request_id: Option<&str>) {
        self.processor.set_dialog_request_id(dialog_request_id);
    }

    /// Returns the current dialog request id.
    #[must_use]
    pub fn dialog_request_id(&self) -> Option<String> {
        self.processor.dialog_request_id()
    }

    /// Resumes accepting directives at intake and admission downstream.
    pub fn enable(&self) {
        debug!("enable");
        self.enabled.store(true, Ordering::SeqCst);
        self.processor.enable();
    }

    /// Rejects new directives at intake and cancels everything still queued
    /// downstream. In-flight directives complete on their own terms.
    pub fn disable(&self) {
        debug!("disable");
        self.enabled.store(false, Ordering::SeqCst);
        self.processor.disable();
    }

    /// Registers a handler for every directive type in its configuration.
    /// Takes effect for directives not yet dispatched.
    ///
    /// # Errors
    ///
    /// See [`DirectiveRouter::add_handler`].
    pub fn add_handler(
        &self,
        handler: Arc<dyn DirectiveHandler>,
    ) -> Result<(), RegistrationError> {
        self.router.add_handler(handler)
    }

    /// Removes every registration owned by `handler`; returns `true` if any
    /// was removed.
    pub fn remove_handler(&self, handler: &Arc<dyn DirectiveHandler>) -> bool {
        self.router.remove_handler(handler)
    }

    /// Shuts the sequencer down.
    ///
    /// New directives are rejected immediately; directives already accepted
    /// are drained by the receiving loop before it exits (it stops at the
    /// next wait-wake boundary, never mid-dispatch). The processor then
    /// cancels its remaining backlog and the router releases its handlers.
    /// Idempotent.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            debug!("shutdown: already shutting down");
        }
        debug!("shutdown");

        // Dropping the producer side closes the channel once the loop has
        // drained everything already accepted.
        self.intake.write().expect("intake lock poisoned").take();

        let worker = self.worker.lock().expect("worker lock poisoned").take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!(error = %e, "receiving loop terminated abnormally");
            }
        }

        self.processor.shutdown();
        self.router.shutdown();
    }

    /// Drains the intake queue until it is closed.
    ///
    /// Exactly one instance of this loop runs per sequencer. Each directive
    /// is popped and forwarded with no intake lock held, so producers are
    /// never blocked by handler work.
    async fn receiving_loop(
        router: Arc<DirectiveRouter>,
        processor: Arc<DirectiveProcessor>,
        exception_sender: Arc<dyn ExceptionSender>,
        mut intake: mpsc::UnboundedReceiver<Arc<Directive>>,
    ) {
        debug!("receiving loop started");
        while let Some(directive) = intake.recv().await {
            // Directives with no dialog request id are exempt from session
            // ordering and bypass the processor entirely.
            let handled = if directive.dialog_request_id().is_none() {
                router.immediate_dispatch(Arc::clone(&directive))
            } else {
                processor.on_directive(Arc::clone(&directive))
            };

            if !handled {
                info!(
                    message_id = directive.message_id(),
                    "sendingExceptionEncountered"
                );
                exception_sender.send_exception_encountered(
                    directive.raw(),
                    ExceptionKind::UnsupportedOperation,
                    "Unsupported operation",
                );
            }
        }
        debug!("receiving loop exited");
    }
}
