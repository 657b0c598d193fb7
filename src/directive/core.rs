/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! The directive value type.
//!
//! A [`Directive`] is an immutable command received from the protocol layer.
//! Its identity is the `message_id`; the optional `dialog_request_id`
//! correlates it with the user interaction that produced it. Directives are
//! shared by reference ([`std::sync::Arc`]) between the sequencer, the
//! processor and handlers, and are never mutated after creation.

use super::handler::DirectiveKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single server-issued command.
///
/// Directives whose `dialog_request_id` is absent are exempt from
/// session-based ordering and are dispatched immediately.
///
/// # Examples
///
/// ```
/// use directive_rs::directive::Directive;
///
/// let directive = Directive::new("Speaker", "SetVolume", "msg-1")
///     .with_dialog_request_id("dialog-1")
///     .with_payload(serde_json::json!({ "volume": 30 }));
///
/// assert_eq!(directive.message_id(), "msg-1");
/// assert_eq!(directive.dialog_request_id(), Some("dialog-1"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Directive {
    /// Capability namespace, e.g. `"Speaker"`.
    namespace: String,

    /// Directive name within the namespace, e.g. `"SetVolume"`.
    name: String,

    /// Unique identity of this directive.
    message_id: String,

    /// Dialog session correlation token. `None` exempts the directive from
    /// session-based ordering.
    dialog_request_id: Option<String>,

    /// Opaque capability payload; schema validation is external.
    payload: serde_json::Value,

    /// The unparsed wire form, carried to the exception channel on failure.
    raw: String,
}

impl Directive {
    /// Creates a new directive with the given type and identity.
    ///
    /// The payload defaults to `null` and the raw form to the empty string;
    /// use [`with_payload`](Self::with_payload) and [`with_raw`](Self::with_raw)
    /// to attach them.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            message_id: message_id.into(),
            dialog_request_id: None,
            payload: serde_json::Value::Null,
            raw: String::new(),
        }
    }

    /// Creates a new directive with a freshly minted v4 UUID message id.
    #[must_use]
    pub fn unique(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, Uuid::new_v4().to_string())
    }

    /// Attaches a dialog request id.
    ///
    /// An empty id is normalized to `None`: the wire protocol uses the empty
    /// string for session-exempt directives.
    #[must_use]
    pub fn with_dialog_request_id(mut self, dialog_request_id: impl Into<String>) -> Self {
        let id = dialog_request_id.into();
        self.dialog_request_id = if id.is_empty() { None } else { Some(id) };
        self
    }

    /// Attaches an opaque JSON payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attaches the unparsed wire form.
    #[must_use]
    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Returns the capability namespace.
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the directive name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the unique message id.
    #[inline]
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Returns the dialog request id, or `None` for session-exempt directives.
    #[inline]
    #[must_use]
    pub fn dialog_request_id(&self) -> Option<&str> {
        self.dialog_request_id.as_deref()
    }

    /// Returns the opaque payload.
    #[inline]
    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Returns the unparsed wire form.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Returns the registry key for this directive's type.
    #[must_use]
    pub fn key(&self) -> DirectiveKey {
        DirectiveKey::new(&self.namespace, &self.name)
    }
}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}[messageId={}]",
            self.namespace, self.name, self.message_id
        )
    }
}
