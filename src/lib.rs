/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! # directive-rs
//!
//! A thread-safe directive sequencing core for voice-assistant clients.
//!
//! The library accepts a stream of server-issued directives (structured
//! commands correlated by a dialog request id) and guarantees they reach the
//! correct capability handler, in the correct order, with correct
//! concurrency and cancellation semantics — even though handlers run
//! asynchronously and the session id can change mid-flight.
//!
//! # Components
//!
//! - [`sequencer::DirectiveSequencer`] — the front door: thread-safe
//!   ingestion, a single background draining task, and the
//!   enable/disable/shutdown lifecycle.
//! - [`processor::DirectiveProcessor`] — per-dialog ordering, blocking-policy
//!   admission control, and cancellation when the dialog request id changes.
//! - [`router::DirectiveRouter`] — the registry of capability handlers keyed
//!   by directive type.
//!
//! Control flow: transport → `on_directive` (enqueue) → receiving loop →
//! ordered processor → router → registered handler → completion callback.
//! Undispatchable directives are reported once on the exception channel.
//!
//! # Guarantees
//!
//! - Directives are never dropped silently: every accepted directive ends
//!   handled, failed, cancelled, or reported as unsupported.
//! - At most one blocking directive per medium is in flight at any time.
//! - Directives of a superseded dialog session that have not yet been
//!   dispatched are never dispatched.
//! - Dispatch preserves arrival order per dialog session and medium.

pub mod directive;
pub mod processor;
pub mod router;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use directive::{
    BlockingPolicy, Directive, DirectiveHandler, DirectiveHandlerResult, DirectiveInfo,
    DirectiveKey, ExceptionKind, ExceptionSender, Mediums,
};
pub use processor::DirectiveProcessor;
pub use router::{DirectiveRouter, RegistrationError};
pub use sequencer::{DirectiveSequencer, SequencerError};
