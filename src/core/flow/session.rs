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

//! Point-to-point flow sessions.
//!
//! A session is one ordered, reliable duplex link between the two ends of a
//! single flow instance, built from a pair of bounded mpsc channels. Every
//! await on a session is a visible suspension point of the owning flow.

use crate::core::ledger::states::AccountInfo;
use crate::core::ledger::transaction::SignedTransaction;
use crate::core::types::{CanonicalMap, PublicKey, Signature};
use thiserror::Error;
use tokio::sync::mpsc;

const SESSION_DEPTH: usize = 16;

/// Session errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The peer end of the session was dropped.
    #[error("session closed by peer")]
    Closed,
}

/// Messages exchanged between the two ends of a flow instance.
#[derive(Clone, Debug)]
pub enum SessionMessage {
    /// Ask the peer to issue a signing key for an account it hosts.
    KeyRequest(AccountInfo),
    /// Freshly issued key for a previously requested account.
    KeyIssued(PublicKey),
    /// Request countersignatures over a partially signed transaction.
    SignRequest(SignedTransaction),
    /// Countersignatures produced by the peer.
    Signatures(CanonicalMap<PublicKey, Signature>),
    /// The peer refuses to sign, with its reason.
    Rejected(String),
    /// The finalized, notarised transaction.
    Finalized(SignedTransaction),
    /// The overall transaction aborted, with the reason.
    Aborted(String),
}

/// One end of a flow session. Each end carries the identity of the party
/// at the other end, so a flow can route per-account requests to the
/// hosting party.
pub struct Session {
    peer: PublicKey,
    tx: mpsc::Sender<SessionMessage>,
    rx: mpsc::Receiver<SessionMessage>,
}

impl Session {
    /// Create a connected pair of session ends between two identified
    /// parties. The first end belongs to `left` and names `right` as its
    /// peer; the second end is the mirror.
    pub fn pair(left: PublicKey, right: PublicKey) -> (Session, Session) {
        let (a_tx, a_rx) = mpsc::channel(SESSION_DEPTH);
        let (b_tx, b_rx) = mpsc::channel(SESSION_DEPTH);
        (
            Session {
                peer: right,
                tx: a_tx,
                rx: b_rx,
            },
            Session {
                peer: left,
                tx: b_tx,
                rx: a_rx,
            },
        )
    }

    /// Identity of the party at the other end of this session.
    pub fn peer(&self) -> &PublicKey {
        &self.peer
    }

    /// Send a message to the peer. Suspends if the channel is full.
    pub async fn send(&self, msg: SessionMessage) -> Result<(), SessionError> {
        self.tx.send(msg).await.map_err(|_| SessionError::Closed)
    }

    /// Await the next message from the peer.
    pub async fn receive(&mut self) -> Result<SessionMessage, SessionError> {
        self.rx.recv().await.ok_or(SessionError::Closed)
    }
}
