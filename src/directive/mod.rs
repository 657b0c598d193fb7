/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 14/3/26
******************************************************************************/

//! Directive data model.
//!
//! This module defines the immutable [`Directive`] value received from the
//! protocol layer, the [`BlockingPolicy`] attached to each registered
//! directive type, and the traits implemented by external collaborators:
//! capability handlers ([`DirectiveHandler`]) and the exception-reporting
//! channel ([`ExceptionSender`]).

pub mod core;
pub mod exception;
pub mod handler;
pub mod policy;

// Re-export main types
pub use core::Directive;
pub use exception::{ExceptionKind, ExceptionSender};
pub use handler::{DirectiveHandler, DirectiveHandlerResult, DirectiveInfo, DirectiveKey};
pub use policy::{BlockingPolicy, Mediums};
