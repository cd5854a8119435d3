#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Core protocol primitives (types, ledger model, flows, services).

pub mod flow;
pub mod ledger;
pub mod services;
pub mod types;
