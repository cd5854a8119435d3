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

//! Transaction model: commands, the frozen wire transaction, and the
//! signature-carrying wrapper.
//!
//! Transaction ids and signing payloads are domain-separated:
//!
//! id            = SHA-256( "Concordat-Tx-v1" || canonical(tx) )
//! signing bytes = "Concordat-TxSig-v1" || id

use crate::core::ledger::states::LedgerState;
use crate::core::types::{encode_canonical, CanonicalMap, CodecError, PublicKey, Signature, H256};
use ring::digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const TX_ID_DOMAIN: &[u8] = b"Concordat-Tx-v1";
const TX_SIG_DOMAIN: &[u8] = b"Concordat-TxSig-v1";

/// Reference to a state produced by a committed (or proposed) transaction.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StateRef {
    /// Producing transaction id.
    pub txid: H256,
    /// Output index within that transaction.
    pub index: u32,
}

/// Closed set of recognised action kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommandKind {
    /// Issue a new account record.
    CreateAccount,
    /// Issue a new IOU obligation between two parties.
    CreateIou,
}

/// A typed action tag plus the keys whose signatures the action requires.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// The intended action.
    pub kind: CommandKind,
    /// Keys that must sign the transaction for this action.
    pub signers: BTreeSet<PublicKey>,
}

impl Command {
    /// Build a command over a signer set.
    pub fn new(kind: CommandKind, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            kind,
            signers: signers.into_iter().collect(),
        }
    }
}

/// A frozen transaction proposal: what is consumed, what is produced, under
/// which commands, ordered by which notary. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTransaction {
    /// Notary that will order this transaction.
    pub notary: PublicKey,
    /// Consumed state references (empty for creation).
    pub inputs: Vec<StateRef>,
    /// Produced states.
    pub outputs: Vec<LedgerState>,
    /// Attached commands.
    pub commands: Vec<Command>,
}

impl WireTransaction {
    /// Deterministic transaction id over the canonical encoding.
    pub fn id(&self) -> Result<H256, CodecError> {
        let body = encode_canonical(self)?;
        let mut buf = Vec::with_capacity(TX_ID_DOMAIN.len() + body.len());
        buf.extend_from_slice(TX_ID_DOMAIN);
        buf.extend_from_slice(&body);
        let d = digest::digest(&digest::SHA256, &buf);
        let mut out = [0u8; 32];
        out.copy_from_slice(d.as_ref());
        Ok(H256::from_bytes(out))
    }

    /// Union of every command's required signer keys.
    pub fn required_signers(&self) -> BTreeSet<PublicKey> {
        let mut keys = BTreeSet::new();
        for c in &self.commands {
            keys.extend(c.signers.iter().cloned());
        }
        keys
    }

    /// Reference to the output at `index`.
    pub fn out_ref(&self, index: u32) -> Result<StateRef, CodecError> {
        Ok(StateRef {
            txid: self.id()?,
            index,
        })
    }
}

/// Signing payload for a transaction id.
pub fn tx_signing_bytes(id: H256) -> Vec<u8> {
    let mut out = Vec::with_capacity(TX_SIG_DOMAIN.len() + 32);
    out.extend_from_slice(TX_SIG_DOMAIN);
    out.extend_from_slice(id.as_bytes());
    out
}

/// A proposal plus collected signatures. Partially signed until every key
/// required by every command has signed; a signature is attached by
/// replacement, never by in-place mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// The underlying frozen transaction.
    pub tx: WireTransaction,
    /// Collected signatures keyed by signer (canonical ordering).
    pub signatures: CanonicalMap<PublicKey, Signature>,
}

impl SignedTransaction {
    /// Wrap a frozen transaction with no signatures yet.
    pub fn unsigned(tx: WireTransaction) -> Self {
        Self {
            tx,
            signatures: CanonicalMap::new(),
        }
    }

    /// Transaction id.
    pub fn id(&self) -> Result<H256, CodecError> {
        self.tx.id()
    }

    /// Consume self and return a copy carrying one more signature.
    pub fn with_signature(mut self, key: PublicKey, sig: Signature) -> Self {
        self.signatures.insert(key, sig);
        self
    }

    /// Consume self and merge a batch of collected signatures.
    pub fn with_signatures(mut self, sigs: CanonicalMap<PublicKey, Signature>) -> Self {
        self.signatures.extend(sigs);
        self
    }

    /// Required keys that have not signed yet.
    pub fn missing_signers(&self) -> BTreeSet<PublicKey> {
        self.tx
            .required_signers()
            .into_iter()
            .filter(|k| !self.signatures.contains_key(k))
            .collect()
    }

    /// True when every required key has signed.
    pub fn is_fully_signed(&self) -> bool {
        self.missing_signers().is_empty()
    }
}
