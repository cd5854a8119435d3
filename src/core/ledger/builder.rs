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

//! Transaction builder: accumulates a mutable proposal, freezes it only
//! after the validity engine has accepted it.
//!
//! The builder exclusively owns the proposal during construction. `build`
//! refuses to yield a signable transaction unless `verify` has passed since
//! the last mutation, so an unverified proposal can never reach a signer.

use crate::core::ledger::contract::{self, ContractError};
use crate::core::ledger::states::LedgerState;
use crate::core::ledger::transaction::{Command, StateRef, WireTransaction};
use crate::core::types::PublicKey;
use thiserror::Error;

/// Builder misuse errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuilderError {
    /// `build` was called before a successful `verify`.
    #[error("proposal has not passed verification")]
    NotVerified,
}

/// Accumulator for a transaction proposal.
#[derive(Debug)]
pub struct TransactionBuilder {
    notary: PublicKey,
    inputs: Vec<StateRef>,
    outputs: Vec<LedgerState>,
    commands: Vec<Command>,
    verified: bool,
}

impl TransactionBuilder {
    /// Start a proposal ordered by the given notary.
    pub fn new(notary: PublicKey) -> Self {
        Self {
            notary,
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
            verified: false,
        }
    }

    /// Add a consumed input reference.
    pub fn add_input(&mut self, input: StateRef) -> &mut Self {
        self.inputs.push(input);
        self.verified = false;
        self
    }

    /// Add a produced output state.
    pub fn add_output(&mut self, output: LedgerState) -> &mut Self {
        self.outputs.push(output);
        self.verified = false;
        self
    }

    /// Add a command.
    pub fn add_command(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self.verified = false;
        self
    }

    fn as_wire(&self) -> WireTransaction {
        WireTransaction {
            notary: self.notary.clone(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            commands: self.commands.clone(),
        }
    }

    /// Run the validity engine over the accumulated proposal. Must succeed
    /// before `build`; any later mutation clears the mark.
    pub fn verify(&mut self) -> Result<(), ContractError> {
        contract::verify(&self.as_wire())?;
        self.verified = true;
        Ok(())
    }

    /// Freeze the proposal. Fails unless `verify` has passed.
    pub fn build(self) -> Result<WireTransaction, BuilderError> {
        if !self.verified {
            return Err(BuilderError::NotVerified);
        }
        Ok(WireTransaction {
            notary: self.notary,
            inputs: self.inputs,
            outputs: self.outputs,
            commands: self.commands,
        })
    }
}
