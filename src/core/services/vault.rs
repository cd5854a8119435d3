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

//! Vault: sled-backed write sink for committed transactions and states.
//!
//! Only finalized transactions reach the vault; an aborted flow leaves no
//! trace here. Committed output states are additionally indexed by linear
//! id together with their flat row projection.

use crate::core::ledger::states::{LedgerState, LinearState, QueryableState, StateRow};
use crate::core::ledger::transaction::{SignedTransaction, StateRef};
use crate::core::types::{decode_canonical_limited, encode_canonical, H256, UniqueId};
use sled::transaction::ConflictableTransactionError;
use thiserror::Error;

const TX_PREFIX: &[u8] = b"tx/";
const STATE_PREFIX: &[u8] = b"state/";
const ROW_PREFIX: &[u8] = b"row/";

// Hard cap on any single decoded record.
const MAX_RECORD_BYTES: usize = 1 << 20;

/// Vault errors.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The database directory could not be opened.
    #[error("db open")]
    DbOpen,
    /// A read or write against the database failed.
    #[error("db io")]
    DbIo,
    /// The atomic batch was aborted by a storage conflict.
    #[error("tx conflict")]
    TxConflict,
    /// A stored record could not be encoded or decoded.
    #[error("codec")]
    Codec,
}

fn prefixed(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + key.len());
    out.extend_from_slice(prefix);
    out.extend_from_slice(key);
    out
}

/// Persistent committed-state store.
#[derive(Clone)]
pub struct Vault {
    db: sled::Db,
}

impl Vault {
    /// Open the sled DB at path (directory).
    pub fn open(path: &str) -> Result<Self, VaultError> {
        let db = sled::open(path).map_err(|_| VaultError::DbOpen)?;
        Ok(Self { db })
    }

    /// Record a committed transaction and all of its output states in one
    /// atomic batch.
    pub fn record_committed(&self, stx: &SignedTransaction) -> Result<(), VaultError> {
        let id = stx.id().map_err(|_| VaultError::Codec)?;

        let mut puts: Vec<(Vec<u8>, Vec<u8>)> = Vec::new();
        puts.push((
            prefixed(TX_PREFIX, id.as_bytes()),
            encode_canonical(stx).map_err(|_| VaultError::Codec)?,
        ));

        for (index, state) in stx.tx.outputs.iter().enumerate() {
            let state_ref = StateRef {
                txid: id,
                index: index as u32,
            };
            let linear = state.linear_id();
            puts.push((
                prefixed(STATE_PREFIX, linear.as_bytes()),
                encode_canonical(&(state_ref, state.clone())).map_err(|_| VaultError::Codec)?,
            ));
            puts.push((
                prefixed(ROW_PREFIX, linear.as_bytes()),
                encode_canonical(&state.to_row()).map_err(|_| VaultError::Codec)?,
            ));
        }

        let res: Result<(), sled::transaction::TransactionError<VaultError>> =
            self.db.transaction(|t| {
                for (key, value) in puts.iter() {
                    t.insert(key.as_slice(), value.as_slice())
                        .map_err(|_| ConflictableTransactionError::Abort(VaultError::DbIo))?;
                }
                Ok(())
            });

        match res {
            Ok(()) => Ok(()),
            Err(sled::transaction::TransactionError::Abort(e)) => Err(e),
            Err(sled::transaction::TransactionError::Storage(_)) => Err(VaultError::DbIo),
        }
    }

    /// Fetch a committed transaction by id.
    pub fn transaction(&self, id: &H256) -> Result<Option<SignedTransaction>, VaultError> {
        let raw = self
            .db
            .get(prefixed(TX_PREFIX, id.as_bytes()))
            .map_err(|_| VaultError::DbIo)?;
        match raw {
            None => Ok(None),
            Some(bytes) => Ok(Some(
                decode_canonical_limited(&bytes, MAX_RECORD_BYTES)
                    .map_err(|_| VaultError::Codec)?,
            )),
        }
    }

    /// Fetch a committed state (and its producing reference) by linear id.
    pub fn state_by_linear_id(
        &self,
        linear_id: &UniqueId,
    ) -> Result<Option<(StateRef, LedgerState)>, VaultError> {
        let raw = self
            .db
            .get(prefixed(STATE_PREFIX, linear_id.as_bytes()))
            .map_err(|_| VaultError::DbIo)?;
        match raw {
            None => Ok(None),
            Some(bytes) => Ok(Some(
                decode_canonical_limited(&bytes, MAX_RECORD_BYTES)
                    .map_err(|_| VaultError::Codec)?,
            )),
        }
    }

    /// Fetch the flat row projection of a committed state by linear id.
    pub fn row_by_linear_id(&self, linear_id: &UniqueId) -> Result<Option<StateRow>, VaultError> {
        let raw = self
            .db
            .get(prefixed(ROW_PREFIX, linear_id.as_bytes()))
            .map_err(|_| VaultError::DbIo)?;
        match raw {
            None => Ok(None),
            Some(bytes) => Ok(Some(
                decode_canonical_limited(&bytes, MAX_RECORD_BYTES)
                    .map_err(|_| VaultError::Codec)?,
            )),
        }
    }

    /// Number of committed states currently stored.
    pub fn state_count(&self) -> usize {
        self.db.scan_prefix(STATE_PREFIX).count()
    }
}
