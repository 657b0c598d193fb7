/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Capability router.
//!
//! This module provides the [`DirectiveRouter`], the registry mapping
//! directive types to their handlers and blocking policies. The router
//! performs single-directive dispatch in the phases of the handler
//! contract: pre-handle at acceptance, handle at admission, and cancel
//! instead of handle when a directive's dialog session is superseded
//! before it starts.

pub mod core;


// Re-export main types
pub use core::{DirectiveRouter, RegistrationError};
