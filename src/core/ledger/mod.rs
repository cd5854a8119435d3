#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Ledger model: states, transactions, the validity engine, and the builder.

pub mod builder;
pub mod contract;
pub mod states;
pub mod transaction;
