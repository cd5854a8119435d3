// Copyright (c) 2026 Concordat
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! The validity engine: deterministic structural rules every party runs
//! independently before signing.
//!
//! `verify` is a pure function of the proposal. No I/O, no clock, no
//! randomness, so every evaluator of the same frozen transaction reaches
//! the same verdict. Only structural and participation rules live here;
//! per-party acceptance policy (for example an IOU value ceiling) belongs
//! to the responder and must never be promoted into this module.

use crate::core::ledger::states::{ContractState, LedgerState};
use crate::core::ledger::transaction::{Command, CommandKind, WireTransaction};
use crate::core::types::PublicKey;
use std::collections::BTreeSet;
use thiserror::Error;

/// Rejection reasons raised by the validity engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContractError {
    /// Wrong command cardinality: exactly one recognised command is required.
    #[error("transaction must carry exactly one command, found {0}")]
    CommandCardinality(usize),
    /// A per-action predicate failed, with a human-readable reason.
    #[error("{0}")]
    Requirement(&'static str),
}

fn require(cond: bool, reason: &'static str) -> Result<(), ContractError> {
    if cond {
        Ok(())
    } else {
        Err(ContractError::Requirement(reason))
    }
}

fn single_command(tx: &WireTransaction) -> Result<&Command, ContractError> {
    match tx.commands.as_slice() {
        [cmd] => Ok(cmd),
        other => Err(ContractError::CommandCardinality(other.len())),
    }
}

/// Verify a frozen proposal. Raises on the first failed predicate; nothing
/// is recorded on rejection.
pub fn verify(tx: &WireTransaction) -> Result<(), ContractError> {
    let command = single_command(tx)?;
    match command.kind {
        CommandKind::CreateAccount => verify_create_account(tx, &command.signers),
        CommandKind::CreateIou => verify_create_iou(tx, &command.signers),
    }
}

fn signers_cover(signers: &BTreeSet<PublicKey>, participants: &[PublicKey]) -> bool {
    participants.iter().all(|p| signers.contains(p))
}

fn verify_create_account(
    tx: &WireTransaction,
    signers: &BTreeSet<PublicKey>,
) -> Result<(), ContractError> {
    require(
        tx.inputs.is_empty(),
        "no inputs should be consumed when creating an account",
    )?;
    require(
        tx.outputs.len() == 1,
        "only one output state should be created",
    )?;
    let out = match &tx.outputs[0] {
        LedgerState::Account(s) => s,
        _ => return Err(ContractError::Requirement("output must be an account state")),
    };
    require(
        signers_cover(signers, &out.participants()),
        "all of the participants must be signers",
    )
}

fn verify_create_iou(
    tx: &WireTransaction,
    signers: &BTreeSet<PublicKey>,
) -> Result<(), ContractError> {
    require(
        tx.inputs.is_empty(),
        "no inputs should be consumed when issuing an IOU",
    )?;
    require(
        tx.outputs.len() == 1,
        "only one output state should be created",
    )?;
    let out = match &tx.outputs[0] {
        LedgerState::Iou(s) => s,
        _ => return Err(ContractError::Requirement("output must be an IOU state")),
    };
    require(out.value > 0, "the IOU value must be positive")?;
    require(
        out.lender != out.borrower,
        "the lender and the borrower cannot be the same party",
    )?;
    // Multi-party rule: the union of both participants' keys must sign.
    require(
        signers_cover(signers, &out.participants()),
        "both the lender and the borrower must be signers",
    )
}
