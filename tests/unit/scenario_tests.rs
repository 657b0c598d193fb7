/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

use directive_rs::{
    BlockingPolicy, Directive, DirectiveHandler, DirectiveInfo, DirectiveKey, ExceptionKind,
    ExceptionSender,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Capability handler exercising the public API only.
struct ScriptedHandler {
    configuration: HashMap<DirectiveKey, BlockingPolicy>,
    auto_complete: bool,
    handled: Mutex<Vec<String>>,
    cancelled: Mutex<Vec<String>>,
    pending: Mutex<Vec<DirectiveInfo>>,
}

impl ScriptedHandler {
    fn new(keys: &[(&str, &str)], policy: BlockingPolicy, auto_complete: bool) -> Arc<Self> {
        let configuration = keys
            .iter()
            .map(|(ns, name)| (DirectiveKey::new(*ns, *name), policy))
            .collect();
        Arc::new(Self {
            configuration,
            auto_complete,
            handled: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        })
    }

    fn handled(&self) -> Vec<String> {
        self.handled.lock().unwrap().clone()
    }

    fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }

    fn complete(&self, message_id: &str) -> bool {
        let info = {
            let mut pending = self.pending.lock().unwrap();
            let index = pending
                .iter()
                .position(|info| info.directive.message_id() == message_id);
            index.map(|i| pending.remove(i))
        };
        match info {
            Some(info) => {
                info.result.set_completed();
                true
            }
            None => false,
        }
    }
}

impl DirectiveHandler for ScriptedHandler {
    fn configuration(&self) -> HashMap<DirectiveKey, BlockingPolicy> {
        self.configuration.clone()
    }

    fn pre_handle(&self, _info: &DirectiveInfo) {}

    fn handle(&self, info: DirectiveInfo) {
        self.handled
            .lock()
            .unwrap()
            .push(info.directive.message_id().to_owned());
        if self.auto_complete {
            info.result.set_completed();
        } else {
            self.pending.lock().unwrap().push(info);
        }
    }

    fn cancel(&self, info: &DirectiveInfo) {
        self.cancelled
            .lock()
            .unwrap()
            .push(info.directive.message_id().to_owned());
    }
}

/// Exception sink collecting `(raw, kind)` pairs.
#[derive(Default)]
struct CollectingExceptionSender {
    notifications: Mutex<Vec<(String, ExceptionKind)>>,
}

impl CollectingExceptionSender {
    fn notifications(&self) -> Vec<(String, ExceptionKind)> {
        self.notifications.lock().unwrap().clone()
    }
}

impl ExceptionSender for CollectingExceptionSender {
    fn send_exception_encountered(&self, raw: &str, kind: ExceptionKind, _description: &str) {
        self.notifications
            .lock()
            .unwrap()
            .push((raw.to_owned(), kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use directive_rs::DirectiveSequencer;

    async fn settle() {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    // --- blocking pair with a session switch ---

    #[tokio::test]
    async fn test_blocking_pair_session_switch_end_to_end() {
        let exceptions = Arc::new(CollectingExceptionSender::default());
        let sequencer = DirectiveSequencer::new(Arc::clone(&exceptions) as Arc<dyn ExceptionSender>)
            .unwrap();
        let speaker =
            ScriptedHandler::new(&[("Speaker", "SetVolume")], BlockingPolicy::AUDIO_BLOCKING, false);
        sequencer
            .add_handler(Arc::clone(&speaker) as Arc<dyn DirectiveHandler>)
            .unwrap();

        sequencer.set_dialog_request_id(Some("dialog-1"));

        let d1 = Directive::unique("Speaker", "SetVolume").with_dialog_request_id("dialog-1");
        let d2 = Directive::unique("Speaker", "SetVolume").with_dialog_request_id("dialog-1");
        let d1_id = d1.message_id().to_owned();
        let d2_id = d2.message_id().to_owned();

        sequencer.on_directive(d1).unwrap();
        sequencer.on_directive(d2).unwrap();
        settle().await;

        assert_eq!(speaker.handled(), vec![d1_id.clone()]);

        sequencer.set_dialog_request_id(Some("dialog-2"));
        settle().await;

        assert_eq!(speaker.cancelled(), vec![d2_id]);
        assert!(speaker.complete(&d1_id));
        assert_eq!(speaker.handled(), vec![d1_id]);
        assert!(exceptions.notifications().is_empty());

        sequencer.shutdown().await;
    }

    // --- unhandled session-exempt directive ---

    #[tokio::test]
    async fn test_unhandled_exempt_directive_raises_exception() {
        let exceptions = Arc::new(CollectingExceptionSender::default());
        let sequencer = DirectiveSequencer::new(Arc::clone(&exceptions) as Arc<dyn ExceptionSender>)
            .unwrap();

        let raw = r#"{"namespace":"InteractionModel","name":"NewDialogRequest"}"#;
        let directive = Directive::unique("InteractionModel", "NewDialogRequest").with_raw(raw);
        sequencer.on_directive(directive).unwrap();

        sequencer.shutdown().await;

        let notifications = exceptions.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].0, raw);
        assert_eq!(notifications[0].1, ExceptionKind::UnsupportedOperation);
    }

    // --- mixed mediums across capabilities ---

    #[tokio::test]
    async fn test_mixed_medium_pipeline() {
        let exceptions = Arc::new(CollectingExceptionSender::default());
        let sequencer = DirectiveSequencer::new(Arc::clone(&exceptions) as Arc<dyn ExceptionSender>)
            .unwrap();

        let speech = ScriptedHandler::new(
            &[("SpeechSynthesizer", "Speak")],
            BlockingPolicy::AUDIO_BLOCKING,
            false,
        );
        let template = ScriptedHandler::new(
            &[("TemplateRuntime", "RenderTemplate")],
            BlockingPolicy::VISUAL_BLOCKING,
            true,
        );
        let notifications = ScriptedHandler::new(
            &[("Notifications", "SetIndicator")],
            BlockingPolicy::NON_BLOCKING,
            true,
        );
        sequencer
            .add_handler(Arc::clone(&speech) as Arc<dyn DirectiveHandler>)
            .unwrap();
        sequencer
            .add_handler(Arc::clone(&template) as Arc<dyn DirectiveHandler>)
            .unwrap();
        sequencer
            .add_handler(Arc::clone(&notifications) as Arc<dyn DirectiveHandler>)
            .unwrap();

        sequencer.set_dialog_request_id(Some("dialog-1"));

        let speak =
            Directive::unique("SpeechSynthesizer", "Speak").with_dialog_request_id("dialog-1");
        let render =
            Directive::unique("TemplateRuntime", "RenderTemplate").with_dialog_request_id("dialog-1");
        let indicator =
            Directive::unique("Notifications", "SetIndicator").with_dialog_request_id("dialog-1");
        let speak_id = speak.message_id().to_owned();

        sequencer.on_directive(speak).unwrap();
        sequencer.on_directive(render).unwrap();
        sequencer.on_directive(indicator).unwrap();
        settle().await;

        // Speak holds AUDIO only, so the visual and non-blocking directives
        // run alongside it.
        assert_eq!(speech.handled().len(), 1);
        assert_eq!(template.handled().len(), 1);
        assert_eq!(notifications.handled().len(), 1);

        assert!(speech.complete(&speak_id));
        assert!(exceptions.notifications().is_empty());

        sequencer.shutdown().await;
    }
}
