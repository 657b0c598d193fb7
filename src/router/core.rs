/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Core DirectiveRouter implementation.
//!
//! The router owns the `(namespace, name) → (handler, policy)` registry and
//! forwards single directives to their registered handler. It holds no
//! ordering state: admission control and medium bookkeeping live in the
//! ordered processor.

use crate::directive::{
    BlockingPolicy, Directive, DirectiveHandler, DirectiveHandlerResult, DirectiveInfo,
    DirectiveKey,
};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, error, warn};

/// Errors that can occur when registering a handler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// A directive type in the policy table is already owned by a different
    /// handler. The existing registration is untouched.
    #[error("directive type {key} is already registered to a different handler")]
    DuplicateRegistration {
        /// The conflicting directive type.
        key: DirectiveKey,
    },

    /// The handler declared no directive types at all.
    #[error("handler declared an empty configuration")]
    EmptyConfiguration,
}

#[derive(Clone)]
struct HandlerEntry {
    handler: Arc<dyn DirectiveHandler>,
    policy: BlockingPolicy,
}

/// Registry of directive handlers keyed by directive type.
///
/// Lookups run lock-free on the concurrent map; registrations and removals
/// are serialized so a failed registration never leaves the registry
/// half-updated. Handlers are compared by pointer identity: registering the
/// same handler instance for the same keys twice is idempotent.
///
/// # Examples
///
/// ```no_run
/// use directive_rs::router::DirectiveRouter;
/// use directive_rs::directive::DirectiveKey;
///
/// let router = DirectiveRouter::new();
/// assert!(!router.is_registered(&DirectiveKey::new("Speaker", "SetVolume")));
/// ```
#[derive(Default)]
pub struct DirectiveRouter {
    /// Directive type → (handler, policy).
    registry: DashMap<DirectiveKey, HandlerEntry>,

    /// Serializes multi-key register/unregister; lookups bypass it.
    registration: Mutex<()>,
}

impl DirectiveRouter {
    /// Creates a new router with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every directive type in its configuration.
    ///
    /// Registering the same handler instance again for keys it already owns
    /// is a no-op. New registrations take effect for directives not yet
    /// dispatched.
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::EmptyConfiguration`] if the handler declares
    ///   no directive types.
    /// - [`RegistrationError::DuplicateRegistration`] if any declared type
    ///   is owned by a different handler. The registry is left untouched.
    pub fn add_handler(&self, handler: Arc<dyn DirectiveHandler>) -> Result<(), RegistrationError> {
        let configuration = handler.configuration();
        if configuration.is_empty() {
            warn!("addHandlerFailed: empty configuration");
            return Err(RegistrationError::EmptyConfiguration);
        }

        let _guard = self.registration.lock().expect("registration lock poisoned");

        for key in configuration.keys() {
            if let Some(entry) = self.registry.get(key) {
                if !same_handler(&entry.handler, &handler) {
                    warn!(key = %key, "addHandlerFailed: duplicate registration");
                    return Err(RegistrationError::DuplicateRegistration { key: key.clone() });
                }
            }
        }

        for (key, policy) in configuration {
            debug!(key = %key, ?policy, "handler registered");
            self.registry.insert(
                key,
                HandlerEntry {
                    handler: Arc::clone(&handler),
                    policy,
                },
            );
        }

        Ok(())
    }

    /// Removes every registration owned by `handler`.
    ///
    /// Returns `true` if any registration was removed. In-flight directives
    /// already dispatched to the handler complete on their own terms; only
    /// future dispatch is affected. The handler receives a single
    /// `on_deregistered` notification.
    pub fn remove_handler(&self, handler: &Arc<dyn DirectiveHandler>) -> bool {
        let _guard = self.registration.lock().expect("registration lock poisoned");

        let before = self.registry.len();
        self.registry
            .retain(|_, entry| !same_handler(&entry.handler, handler));
        let removed = self.registry.len() < before;

        if removed {
            debug!("handler removed");
            handler.on_deregistered();
        }
        removed
    }

    /// Returns `true` if a handler is registered for `key`.
    #[must_use]
    pub fn is_registered(&self, key: &DirectiveKey) -> bool {
        self.registry.contains_key(key)
    }

    /// Delivers the pre-handle notification for `info` and returns the
    /// blocking policy registered for its type.
    ///
    /// Returns `None` when no handler is registered; the caller reports the
    /// directive as an unsupported operation.
    pub fn pre_handle(&self, info: &DirectiveInfo) -> Option<BlockingPolicy> {
        let entry = self.lookup(&info.directive)?;
        debug!(directive = %info.directive, "preHandle");
        entry.handler.pre_handle(info);
        Some(entry.policy)
    }

    /// Hands `info` to its registered handler (the handle phase).
    ///
    /// Returns `false` when the handler was unregistered between pre-handle
    /// and dispatch; a handler is never invoked twice for one directive.
    pub fn dispatch(&self, info: DirectiveInfo) -> bool {
        let Some(entry) = self.lookup(&info.directive) else {
            error!(directive = %info.directive, "dispatchFailed: no handler registered");
            return false;
        };
        debug!(directive = %info.directive, "dispatch");
        entry.handler.handle(info);
        true
    }

    /// Delivers the cancel notification for a directive that will never be
    /// dispatched.
    ///
    /// Returns `false` when no handler is registered for the type.
    pub fn cancel(&self, info: &DirectiveInfo) -> bool {
        let Some(entry) = self.lookup(&info.directive) else {
            warn!(directive = %info.directive, "cancelFailed: no handler registered");
            return false;
        };
        debug!(directive = %info.directive, "cancel");
        entry.handler.cancel(info);
        true
    }

    /// Dispatches a session-exempt directive, bypassing ordering and policy.
    ///
    /// Pre-handle and handle run back to back; the completion callback on
    /// this path only logs the outcome. Returns `false` when no handler is
    /// registered.
    pub fn immediate_dispatch(&self, directive: Arc<Directive>) -> bool {
        let Some(entry) = self.lookup(&directive) else {
            return false;
        };
        debug!(directive = %directive, "immediateDispatch");

        let info = DirectiveInfo {
            result: Arc::new(ImmediateResult {
                directive: Arc::clone(&directive),
            }),
            directive,
        };
        entry.handler.pre_handle(&info);
        entry.handler.handle(info);
        true
    }

    /// Clears the registry, notifying every distinct handler once.
    pub fn shutdown(&self) {
        debug!("router shutdown");
        let _guard = self.registration.lock().expect("registration lock poisoned");

        let mut handlers: Vec<Arc<dyn DirectiveHandler>> = Vec::new();
        for entry in self.registry.iter() {
            if !handlers.iter().any(|h| same_handler(h, &entry.handler)) {
                handlers.push(Arc::clone(&entry.handler));
            }
        }
        self.registry.clear();

        for handler in handlers {
            handler.on_deregistered();
        }
    }

    /// Clones the entry for the directive's type out of the registry, so no
    /// map guard is held while a handler hook runs.
    fn lookup(&self, directive: &Directive) -> Option<HandlerEntry> {
        self.registry
            .get(&directive.key())
            .map(|entry| entry.clone())
    }
}

/// Pointer-identity comparison for trait-object handlers.
fn same_handler(a: &Arc<dyn DirectiveHandler>, b: &Arc<dyn DirectiveHandler>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Result sink for the immediate-dispatch path: outcomes are logged only,
/// since no medium bookkeeping was performed.
struct ImmediateResult {
    directive: Arc<Directive>,
}

impl DirectiveHandlerResult for ImmediateResult {
    fn set_completed(&self) {
        debug!(directive = %self.directive, "immediate directive completed");
    }

    fn set_failed(&self, description: &str) {
        warn!(directive = %self.directive, description, "immediate directive failed");
    }
}
