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

//! Notary service: atomic accept-or-reject ordering of fully signed
//! transactions.
//!
//! The notary is the only source of mutual exclusion in the system. A
//! submission verifies signature coverage and each attached signature, then
//! checks and records input consumption inside one lock region, so two
//! transactions can never both consume the same input.

use crate::core::ledger::transaction::{tx_signing_bytes, SignedTransaction, StateRef};
use crate::core::services::keys::{self, SignerBackend};
use crate::core::types::{PublicKey, H256};
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

/// Notary rejection reasons.
#[derive(Debug, Error)]
pub enum NotaryError {
    /// Required signatures are missing; the transaction is not finalisable.
    #[error("transaction is not fully signed ({missing} signature(s) missing)")]
    MissingSignatures {
        /// Number of required keys that have not signed.
        missing: usize,
    },
    /// An attached signature failed verification.
    #[error("invalid signature on transaction")]
    BadSignature,
    /// An input was already consumed by an earlier transaction.
    #[error("input {input:?} already consumed by transaction {by}")]
    Conflict {
        /// The doubly consumed input.
        input: StateRef,
        /// Transaction that consumed it first.
        by: H256,
    },
    /// The transaction could not be canonically encoded.
    #[error("codec")]
    Codec,
    /// Internal lock failure.
    #[error("lock poisoned")]
    Lock,
}

/// In-process notary with an input-consumption ledger.
pub struct Notary {
    identity: PublicKey,
    consumed: Mutex<BTreeMap<StateRef, H256>>,
}

impl Notary {
    /// Create a notary from its signing backend identity.
    pub fn new(backend: &dyn SignerBackend) -> Self {
        Self {
            identity: backend.public_key(),
            consumed: Mutex::new(BTreeMap::new()),
        }
    }

    /// The notary's ordering identity, referenced by every proposal.
    pub fn identity(&self) -> PublicKey {
        self.identity.clone()
    }

    /// Submit a fully signed transaction for ordering.
    ///
    /// Accepts and records input consumption atomically, or rejects with a
    /// reason. Outcome is binary; there is no partial acceptance.
    pub async fn submit(&self, stx: &SignedTransaction) -> Result<H256, NotaryError> {
        let id = stx.id().map_err(|_| NotaryError::Codec)?;

        let missing = stx.missing_signers();
        if !missing.is_empty() {
            warn!(tx = %id, missing = missing.len(), "notary refusing unsigned transaction");
            return Err(NotaryError::MissingSignatures {
                missing: missing.len(),
            });
        }

        let msg = tx_signing_bytes(id);
        for (key, sig) in stx.signatures.iter() {
            keys::verify_pubkey_bytes(key, &msg, sig)
                .map_err(|_| NotaryError::BadSignature)?;
        }

        // Single lock region: conflict check and consumption recording are
        // atomic with respect to concurrent submissions.
        let mut guard = self.consumed.lock().map_err(|_| NotaryError::Lock)?;
        for input in &stx.tx.inputs {
            if let Some(by) = guard.get(input) {
                warn!(tx = %id, by = %by, "notary conflict: input already consumed");
                return Err(NotaryError::Conflict {
                    input: *input,
                    by: *by,
                });
            }
        }
        for input in &stx.tx.inputs {
            guard.insert(*input, id);
        }
        drop(guard);

        debug!(tx = %id, inputs = stx.tx.inputs.len(), "notary accepted transaction");
        Ok(id)
    }
}
