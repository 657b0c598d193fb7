/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Shared test doubles for the router, processor and sequencer suites.

use crate::directive::{
    BlockingPolicy, Directive, DirectiveHandler, DirectiveInfo, DirectiveKey, ExceptionKind,
    ExceptionSender,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Routes tracing output through the test harness so `--nocapture` shows the
/// component logs. Safe to call repeatedly; only the first call installs.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// One observed handler hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HandlerEvent {
    PreHandle(String),
    Handle(String),
    Cancel(String),
    Deregistered,
}

/// Handler double that records every hook invocation by message id.
///
/// In auto-complete mode `handle` reports completion synchronously; in
/// manual mode handled directives are parked until the test completes or
/// fails them, which is how blocking-medium scenarios are driven.
pub(crate) struct RecordingHandler {
    configuration: HashMap<DirectiveKey, BlockingPolicy>,
    auto_complete: bool,
    events: Mutex<Vec<HandlerEvent>>,
    pending: Mutex<Vec<DirectiveInfo>>,
}

impl RecordingHandler {
    /// Auto-completing handler for the given directive types.
    pub(crate) fn new(keys: &[(&str, &str)], policy: BlockingPolicy) -> Arc<Self> {
        Self::build(keys, policy, true)
    }

    /// Handler whose directives stay in flight until `complete`/`fail`.
    pub(crate) fn manual(keys: &[(&str, &str)], policy: BlockingPolicy) -> Arc<Self> {
        Self::build(keys, policy, false)
    }

    fn build(keys: &[(&str, &str)], policy: BlockingPolicy, auto_complete: bool) -> Arc<Self> {
        init_tracing();
        let configuration = keys
            .iter()
            .map(|(namespace, name)| (DirectiveKey::new(*namespace, *name), policy))
            .collect();
        Arc::new(Self {
            configuration,
            auto_complete,
            events: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn events(&self) -> Vec<HandlerEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Message ids that reached the handle phase, in dispatch order.
    pub(crate) fn handled(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HandlerEvent::Handle(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Message ids that received the cancel notification.
    pub(crate) fn cancelled(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                HandlerEvent::Cancel(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Message ids currently parked in flight (manual mode).
    pub(crate) fn pending(&self) -> Vec<String> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .map(|info| info.directive.message_id().to_owned())
            .collect()
    }

    /// Reports completion for a parked directive. Returns `false` when the
    /// message id is not in flight.
    pub(crate) fn complete(&self, message_id: &str) -> bool {
        let Some(info) = self.take_pending(message_id) else {
            return false;
        };
        info.result.set_completed();
        true
    }

    /// Reports failure for a parked directive.
    pub(crate) fn fail(&self, message_id: &str, description: &str) -> bool {
        let Some(info) = self.take_pending(message_id) else {
            return false;
        };
        info.result.set_failed(description);
        true
    }

    /// Clones a parked info without releasing it.
    pub(crate) fn pending_info(&self, message_id: &str) -> Option<DirectiveInfo> {
        self.pending
            .lock()
            .unwrap()
            .iter()
            .find(|info| info.directive.message_id() == message_id)
            .cloned()
    }

    /// Removes the parked info before invoking its result, so the dispatch
    /// chain triggered by completion can re-enter `handle`.
    fn take_pending(&self, message_id: &str) -> Option<DirectiveInfo> {
        let mut pending = self.pending.lock().unwrap();
        let index = pending
            .iter()
            .position(|info| info.directive.message_id() == message_id)?;
        Some(pending.remove(index))
    }

    fn record(&self, event: HandlerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl DirectiveHandler for RecordingHandler {
    fn configuration(&self) -> HashMap<DirectiveKey, BlockingPolicy> {
        self.configuration.clone()
    }

    fn pre_handle(&self, info: &DirectiveInfo) {
        self.record(HandlerEvent::PreHandle(
            info.directive.message_id().to_owned(),
        ));
    }

    fn handle(&self, info: DirectiveInfo) {
        self.record(HandlerEvent::Handle(info.directive.message_id().to_owned()));
        if self.auto_complete {
            info.result.set_completed();
        } else {
            self.pending.lock().unwrap().push(info);
        }
    }

    fn cancel(&self, info: &DirectiveInfo) {
        self.record(HandlerEvent::Cancel(info.directive.message_id().to_owned()));
    }

    fn on_deregistered(&self) {
        self.record(HandlerEvent::Deregistered);
    }
}

/// Exception-channel double recording every notification.
#[derive(Default)]
pub(crate) struct RecordingExceptionSender {
    notifications: Mutex<Vec<(String, ExceptionKind, String)>>,
}

impl RecordingExceptionSender {
    pub(crate) fn new() -> Arc<Self> {
        init_tracing();
        Arc::new(Self::default())
    }

    pub(crate) fn notifications(&self) -> Vec<(String, ExceptionKind, String)> {
        self.notifications.lock().unwrap().clone()
    }
}

impl ExceptionSender for RecordingExceptionSender {
    fn send_exception_encountered(&self, raw_directive: &str, kind: ExceptionKind, message: &str) {
        self.notifications.lock().unwrap().push((
            raw_directive.to_owned(),
            kind,
            message.to_owned(),
        ));
    }
}

/// Builds a directive with a fresh message id and a small raw form.
pub(crate) fn make_directive(
    namespace: &str,
    name: &str,
    dialog_request_id: Option<&str>,
) -> Directive {
    let directive = Directive::unique(namespace, name)
        .with_payload(serde_json::json!({}))
        .with_raw(format!("{{\"namespace\":\"{namespace}\",\"name\":\"{name}\"}}"));
    match dialog_request_id {
        Some(id) => directive.with_dialog_request_id(id),
        None => directive,
    }
}
