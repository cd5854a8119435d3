#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Commit protocol flows: initiator, responder, sessions, progress.

pub mod initiator;
pub mod progress;
pub mod responder;
pub mod session;
