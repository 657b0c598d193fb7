/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Outbound exception channel.
//!
//! When a directive cannot be dispatched (most commonly because no handler
//! is registered for its type), the sequencer reports it once through an
//! [`ExceptionSender`] and drops it. The notification carries the unparsed
//! wire form so the transport layer can relay it upstream.

use serde::{Deserialize, Serialize};

/// Wire-level error classification for exception notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExceptionKind {
    /// The directive was valid but arrived in an unexpected context.
    UnexpectedInformationReceived,

    /// No handler is registered for the directive's type.
    UnsupportedOperation,

    /// The client failed internally while handling the directive.
    InternalError,
}

impl std::fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UnexpectedInformationReceived => "UNEXPECTED_INFORMATION_RECEIVED",
            Self::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            Self::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{name}")
    }
}

/// Collaborator that relays per-directive failures to the server.
///
/// Implementations are external to this core (typically the transport
/// layer). Notifications are terminal: the core never retries a directive
/// after reporting it here.
pub trait ExceptionSender: Send + Sync {
    /// Reports that `raw_directive` could not be handled.
    fn send_exception_encountered(&self, raw_directive: &str, kind: ExceptionKind, message: &str);
}
