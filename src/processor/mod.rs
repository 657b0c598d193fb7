/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Ordered processor.
//!
//! This module provides the [`DirectiveProcessor`], which owns the notion of
//! the current dialog session. It holds a per-session ordered backlog of
//! directives, admits them for dispatch under their blocking policies, and
//! cancels not-yet-started work when the dialog request id changes.
//!
//! State machine per directive:
//!
//! ```text
//! QUEUED → ADMITTED → DISPATCHED → { COMPLETED | FAILED }
//!    └────────────────────────────→ CANCELLED   (only before dispatch)
//! ```

pub mod core;

#[cfg(test)]
mod tests;

// Re-export main types
pub use core::DirectiveProcessor;
