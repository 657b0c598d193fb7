/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Sequencer module: the thread-safe front door for directive ingestion.
//!
//! This module provides the [`DirectiveSequencer`], the sole entry point for
//! directives arriving from the transport layer. Directives are appended to
//! an intake queue and drained by a single background task, so producers are
//! never blocked by handler work.
//!
//! # Architecture
//!
//! - Directives are submitted via [`DirectiveSequencer::on_directive`]
//! - A single background task drains the intake queue in arrival order
//! - Session-exempt directives (no dialog request id) are dispatched
//!   immediately through the router; the rest go through the ordered
//!   processor, which enforces per-dialog ordering and medium exclusivity
//! - Undispatchable directives are reported once on the exception channel
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use directive_rs::directive::{Directive, ExceptionKind, ExceptionSender};
//! use directive_rs::sequencer::DirectiveSequencer;
//!
//! struct LoggingSender;
//! impl ExceptionSender for LoggingSender {
//!     fn send_exception_encountered(&self, raw: &str, kind: ExceptionKind, message: &str) {
//!         eprintln!("{kind}: {message} ({raw})");
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let sequencer = DirectiveSequencer::new(Arc::new(LoggingSender))?;
//!
//! // Register handlers, then feed directives from the transport layer.
//! sequencer.on_directive(Directive::unique("Speaker", "SetVolume"))?;
//!
//! // Drains everything already accepted, then releases the components.
//! sequencer.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod core;

#[cfg(test)]
mod tests;

// Re-export main types
pub use core::{DirectiveSequencer, SequencerError};
