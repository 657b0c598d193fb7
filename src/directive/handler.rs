/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Handler contract.
//!
//! Capability modules implement [`DirectiveHandler`] and register it with the
//! router, declaring a [`BlockingPolicy`] for each directive type they own.
//! Handling is a handoff: `handle` runs on the handler's own execution
//! context and reports the eventual outcome through the
//! [`DirectiveHandlerResult`] carried by the [`DirectiveInfo`].

use super::core::Directive;
use super::policy::BlockingPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry key identifying a directive type.
///
/// # Examples
///
/// ```
/// use directive_rs::directive::DirectiveKey;
///
/// let key = DirectiveKey::new("Speaker", "SetVolume");
/// assert_eq!(key.to_string(), "Speaker.SetVolume");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectiveKey {
    /// Capability namespace.
    pub namespace: String,

    /// Directive name within the namespace.
    pub name: String,
}

impl DirectiveKey {
    /// Creates a new key.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for DirectiveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Result-reporting capability handed to a handler together with a directive.
///
/// Exactly one of `set_completed` or `set_failed` must eventually be called
/// for every directive a handler receives through `handle`. Completion frees
/// the mediums the directive occupied and unblocks queued successors.
pub trait DirectiveHandlerResult: Send + Sync {
    /// Reports that the directive was handled successfully.
    fn set_completed(&self);

    /// Reports that handling failed. Failure is terminal and local to the
    /// directive; it does not affect the rest of the dialog.
    fn set_failed(&self, description: &str);
}

/// Pairing of a directive with its result-reporting capability.
///
/// Created when a directive is accepted for handling, released when the
/// handler reports completion or failure, or when the directive is cancelled
/// before dispatch.
#[derive(Clone)]
pub struct DirectiveInfo {
    /// The directive being handled.
    pub directive: Arc<Directive>,

    /// Channel back to the ordered processor's bookkeeping.
    pub result: Arc<dyn DirectiveHandlerResult>,
}

impl std::fmt::Debug for DirectiveInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectiveInfo")
            .field("directive", &self.directive)
            .finish_non_exhaustive()
    }
}

/// External capability-specific consumer of directives.
///
/// A handler may register for multiple directive types; a directive type has
/// at most one active handler at a time. All hooks may be called from the
/// sequencer's draining task or from another handler's completion context,
/// so implementations must not block for long.
pub trait DirectiveHandler: Send + Sync {
    /// Returns the policy table: one [`BlockingPolicy`] per directive type
    /// this handler wants to own. An empty table fails registration.
    fn configuration(&self) -> HashMap<DirectiveKey, BlockingPolicy>;

    /// Synchronous, side-effect-free notification that `info` has been
    /// accepted and will be handled or cancelled later. Handlers may start
    /// preparing resources here.
    fn pre_handle(&self, info: &DirectiveInfo);

    /// Asynchronous handle invocation. Implementations take ownership of
    /// `info`, perform the work on their own execution context, and must
    /// eventually call `info.result.set_completed()` or `set_failed(..)`.
    fn handle(&self, info: DirectiveInfo);

    /// Called instead of [`handle`](Self::handle) when the directive was
    /// cancelled before dispatch (its dialog session was superseded).
    fn cancel(&self, info: &DirectiveInfo);

    /// Notification that this handler is no longer registered. Called by the
    /// router on removal and at shutdown; in-flight work is unaffected.
    fn on_deregistered(&self) {}
}
