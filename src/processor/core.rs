/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Core DirectiveProcessor implementation.
//!
//! The processor enforces per-session ordering and medium exclusivity before
//! delegating to the router. All bookkeeping lives behind a single mutex;
//! admission decisions are collected under the lock onto a FIFO dispatch
//! queue, and every handler callback (pre-handle, handle, cancel) runs after
//! it is released, so completion callbacks re-entering the processor can
//! never deadlock. The queue is drained by one thread at a time, keeping the
//! order of `handle` calls identical to the order admissions were decided.

use crate::directive::{
    BlockingPolicy, Directive, DirectiveHandlerResult, DirectiveInfo, Mediums,
};
use crate::router::DirectiveRouter;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, error, info, warn};

/// A directive accepted into the backlog, waiting for admission.
struct QueuedDirective {
    info: DirectiveInfo,
    policy: BlockingPolicy,
}

struct ProcessorState {
    /// Whether new directives are admitted at all.
    enabled: bool,

    /// Set once by [`DirectiveProcessor::shutdown`]; never cleared.
    shutting_down: bool,

    /// The current dialog session, or `None` when session filtering is off.
    dialog_request_id: Option<String>,

    /// QUEUED directives in arrival order.
    backlog: VecDeque<QueuedDirective>,

    /// DISPATCHED directives, keyed by message id, until completion/failure.
    in_flight: HashMap<String, BlockingPolicy>,

    /// Mediums held by blocking in-flight directives.
    occupied: Mediums,

    /// Admitted directives waiting for their `dispatch` call, in admission
    /// order.
    dispatch_queue: VecDeque<QueuedDirective>,

    /// Whether some thread is currently draining `dispatch_queue`.
    dispatching: bool,
}

/// Enforces per-dialog ordering and medium exclusivity.
///
/// Directives carrying a dialog request id are queued in arrival order and
/// admitted one medium-disjoint prefix at a time; directives without one are
/// exempt and dispatched immediately. Changing the dialog request id cancels
/// everything still queued under the previous one — directives already
/// dispatched run to completion.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use directive_rs::processor::DirectiveProcessor;
/// use directive_rs::router::DirectiveRouter;
///
/// let router = Arc::new(DirectiveRouter::new());
/// let processor = Arc::new(DirectiveProcessor::new(router));
/// processor.set_dialog_request_id(Some("dialog-1"));
/// ```
pub struct DirectiveProcessor {
    router: Arc<DirectiveRouter>,
    state: Mutex<ProcessorState>,
}

impl DirectiveProcessor {
    /// Creates a new, enabled processor with no current dialog session.
    #[must_use]
    pub fn new(router: Arc<DirectiveRouter>) -> Self {
        Self {
            router,
            state: Mutex::new(ProcessorState {
                enabled: true,
                shutting_down: false,
                dialog_request_id: None,
                backlog: VecDeque::new(),
                in_flight: HashMap::new(),
                occupied: Mediums::empty(),
                dispatch_queue: VecDeque::new(),
                dispatching: false,
            }),
        }
    }

    /// Accepts a directive for ordered handling.
    ///
    /// Session-exempt directives (no dialog request id) bypass the backlog
    /// and are dispatched immediately through the router. Directives tagged
    /// with a dialog request id other than the current one (when one is set)
    /// belong to a superseded dialog and are dropped without notification.
    ///
    /// Returns `false` when the directive cannot be handled — no registered
    /// handler, or the processor is disabled or shutting down. The caller
    /// owns reporting that outcome on the exception channel.
    pub fn on_directive(self: &Arc<Self>, directive: Arc<Directive>) -> bool {
        let Some(dialog_request_id) = directive.dialog_request_id() else {
            debug!(directive = %directive, "session-exempt directive");
            return self.router.immediate_dispatch(Arc::clone(&directive));
        };

        {
            let state = self.state.lock().expect("processor state lock poisoned");
            if state.shutting_down || !state.enabled {
                warn!(
                    directive = %directive,
                    reason = if state.shutting_down { "shuttingDown" } else { "disabled" },
                    "onDirectiveFailed"
                );
                return false;
            }
            if let Some(current) = state.dialog_request_id.as_deref() {
                if current != dialog_request_id {
                    info!(
                        directive = %directive,
                        current_dialog_request_id = current,
                        "dropping directive from superseded dialog"
                    );
                    return true;
                }
            }
        }

        let info = DirectiveInfo {
            directive: Arc::clone(&directive),
            result: Arc::new(ProcessorResult {
                processor: Arc::downgrade(self),
                directive: Arc::clone(&directive),
            }),
        };

        // Pre-handle runs without the state lock held; a dialog switch
        // racing it is detected when the directive is queued below.
        let Some(policy) = self.router.pre_handle(&info) else {
            return false;
        };

        {
            let mut state = self.state.lock().expect("processor state lock poisoned");
            let superseded = state.shutting_down
                || !state.enabled
                || state
                    .dialog_request_id
                    .as_deref()
                    .is_some_and(|current| current != dialog_request_id);
            if superseded {
                drop(state);
                info!(directive = %directive, "dialog superseded during pre-handle, cancelling");
                self.router.cancel(&info);
                return true;
            }
            state.backlog.push_back(QueuedDirective { info, policy });
            Self::collect_admissions(&mut state);
        }
        self.drain_dispatch_queue();
        true
    }

    /// Sets the current dialog request id.
    ///
    /// A change cancels every directive still queued under the previous id
    /// (cancel notification, never dispatched); directives already
    /// dispatched are unaffected. `None` (or an empty id) turns session
    /// filtering off: directives of any dialog become eligible, subject
    /// only to medium policy.
    pub fn set_dialog_request_id(&self, dialog_request_id: Option<&str>) {
        let new_id = dialog_request_id
            .filter(|id| !id.is_empty())
            .map(str::to_owned);

        let cancelled = {
            let mut state = self.state.lock().expect("processor state lock poisoned");
            if state.dialog_request_id == new_id {
                return;
            }
            info!(
                previous = ?state.dialog_request_id,
                new = ?new_id,
                queued = state.backlog.len(),
                "dialog request id changed"
            );
            state.dialog_request_id = new_id;
            state.backlog.drain(..).collect::<Vec<_>>()
        };
        self.cancel_all(cancelled);
    }

    /// Returns the current dialog request id.
    #[must_use]
    pub fn dialog_request_id(&self) -> Option<String> {
        self.state
            .lock()
            .expect("processor state lock poisoned")
            .dialog_request_id
            .clone()
    }

    /// Resumes admission. The backlog starts empty: directives cancelled
    /// while disabled are not replayed.
    pub fn enable(&self) {
        debug!("processor enabled");
        self.state
            .lock()
            .expect("processor state lock poisoned")
            .enabled = true;
    }

    /// Stops admission, clears the dialog request id and cancels every
    /// queued directive. In-flight directives complete on their own terms.
    pub fn disable(&self) {
        debug!("processor disabled");
        let cancelled = {
            let mut state = self.state.lock().expect("processor state lock poisoned");
            state.enabled = false;
            state.dialog_request_id = None;
            state.backlog.drain(..).collect::<Vec<_>>()
        };
        self.cancel_all(cancelled);
    }

    /// Permanently stops the processor, cancelling everything still queued.
    ///
    /// Completion callbacks from directives already dispatched are still
    /// honored so their mediums are released.
    pub fn shutdown(&self) {
        debug!("processor shutdown");
        let cancelled = {
            let mut state = self.state.lock().expect("processor state lock poisoned");
            state.shutting_down = true;
            if !state.in_flight.is_empty() {
                debug!(
                    in_flight = state.in_flight.len(),
                    "directives still in flight at shutdown"
                );
            }
            state.backlog.drain(..).collect::<Vec<_>>()
        };
        self.cancel_all(cancelled);
    }

    /// Admits every queued directive whose mediums are free and not claimed
    /// by an earlier queued directive, moving it onto the dispatch queue.
    ///
    /// Walking the backlog front to back while accumulating the mediums of
    /// entries left behind preserves arrival order per medium: a directive
    /// can never overtake an earlier one it shares a medium with. Admitted
    /// blocking directives occupy their mediums until completion.
    fn collect_admissions(state: &mut ProcessorState) {
        let mut claimed = state.occupied;
        let mut index = 0;

        while index < state.backlog.len() {
            let mediums = state.backlog[index].policy.mediums();
            if mediums.intersects(claimed) {
                claimed |= mediums;
                index += 1;
                continue;
            }
            let Some(entry) = state.backlog.remove(index) else {
                break;
            };
            if entry.policy.is_blocking() {
                state.occupied |= mediums;
                claimed |= mediums;
            }
            state
                .in_flight
                .insert(entry.info.directive.message_id().to_owned(), entry.policy);
            state.dispatch_queue.push_back(entry);
        }
    }

    /// Hands admitted directives to the router, in admission order, with no
    /// lock held.
    ///
    /// At most one thread drains at a time: a thread that finds another
    /// dispatch in progress leaves its admissions on the queue and returns,
    /// and the active drainer picks them up before exiting. The pop and the
    /// in-progress flag share the state lock, so `dispatch` calls are always
    /// issued in admission order even when a completion callback races a new
    /// arrival on the same medium.
    fn drain_dispatch_queue(&self) {
        loop {
            let entry = {
                let mut state = self.state.lock().expect("processor state lock poisoned");
                if state.dispatching {
                    return;
                }
                let Some(entry) = state.dispatch_queue.pop_front() else {
                    return;
                };
                state.dispatching = true;
                entry
            };

            let directive = Arc::clone(&entry.info.directive);
            let dispatched = self.router.dispatch(entry.info);

            self.state
                .lock()
                .expect("processor state lock poisoned")
                .dispatching = false;

            if !dispatched {
                // The handler was unregistered after pre-handle. Release the
                // bookkeeping so successors are not blocked forever.
                error!(directive = %directive, "handler unregistered before dispatch");
                self.release(&directive);
            }
        }
    }

    /// Delivers cancel notifications outside the state lock.
    fn cancel_all(&self, cancelled: Vec<QueuedDirective>) {
        for entry in cancelled {
            debug!(directive = %entry.info.directive, "cancelling queued directive");
            self.router.cancel(&entry.info);
        }
    }

    /// Frees the mediums held by a terminal directive and re-runs admission
    /// so successors waiting on them are dispatched.
    fn release(&self, directive: &Directive) {
        {
            let mut state = self.state.lock().expect("processor state lock poisoned");
            let Some(policy) = state.in_flight.remove(directive.message_id()) else {
                warn!(directive = %directive, "result for unknown directive ignored");
                return;
            };
            if policy.is_blocking() {
                state.occupied.remove(policy.mediums());
            }
            Self::collect_admissions(&mut state);
        }
        self.drain_dispatch_queue();
    }

    fn on_handling_completed(&self, directive: &Directive) {
        debug!(directive = %directive, "directive completed");
        self.release(directive);
    }

    fn on_handling_failed(&self, directive: &Directive, description: &str) {
        warn!(directive = %directive, description, "directive failed");
        self.release(directive);
    }
}

/// Routes a handler's completion report back into the processor's
/// bookkeeping. Holds the processor weakly so a result kept alive by a
/// handler does not keep the processor alive.
struct ProcessorResult {
    processor: Weak<DirectiveProcessor>,
    directive: Arc<Directive>,
}

impl DirectiveHandlerResult for ProcessorResult {
    fn set_completed(&self) {
        if let Some(processor) = self.processor.upgrade() {
            processor.on_handling_completed(&self.directive);
        }
    }

    fn set_failed(&self, description: &str) {
        if let Some(processor) = self.processor.upgrade() {
            processor.on_handling_failed(&self.directive, description);
        }
    }
}
