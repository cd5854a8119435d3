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

//! Responder-side commit flow.
//!
//! A responder independently re-runs the validity engine over a received
//! proposal, then applies its own private acceptance policy on top. The
//! policy is intentionally NOT part of the shared engine: each party may
//! enforce a different rule, and a single party's rejection aborts the
//! whole transaction for everyone.

use crate::core::flow::initiator::FlowError;
use crate::core::flow::progress::{ProgressTracker, ResponderStage};
use crate::core::flow::session::{Session, SessionMessage};
use crate::core::ledger::contract::{self, ContractError};
use crate::core::ledger::states::LedgerState;
use crate::core::ledger::transaction::{
    tx_signing_bytes, SignedTransaction, WireTransaction,
};
use crate::core::services::keys;
use crate::core::services::ServiceHub;
use crate::core::types::{CanonicalMap, PublicKey, Signature, H256};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Local acceptance rules a responder applies beyond the validity engine.
///
/// Returning an error rejects the transaction with a reason that is sent
/// back to the initiator; the rejection is binding, not advisory.
pub trait ResponderPolicy: Send + Sync {
    /// Accept or reject a structurally valid proposal.
    fn check(&self, tx: &WireTransaction) -> Result<(), String>;
}

/// Policy that accepts every structurally valid proposal.
pub struct AcceptAll;

impl ResponderPolicy for AcceptAll {
    fn check(&self, _tx: &WireTransaction) -> Result<(), String> {
        Ok(())
    }
}

/// Refuse to countersign IOUs above a value ceiling.
///
/// The ceiling is this party's private choice; other parties may carry a
/// different one or none at all.
pub struct IouValueCeiling {
    /// Highest IOU value this party will sign.
    pub max_value: u64,
}

impl Default for IouValueCeiling {
    fn default() -> Self {
        Self { max_value: 100 }
    }
}

impl ResponderPolicy for IouValueCeiling {
    fn check(&self, tx: &WireTransaction) -> Result<(), String> {
        for output in &tx.outputs {
            if let LedgerState::Iou(iou) = output {
                if iou.value > self.max_value {
                    return Err(format!(
                        "IOUs with a value over {} are not accepted",
                        self.max_value
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Responder flow for one session: serve key requests, countersign an
/// acceptable proposal, then await finality.
pub struct SignTransactionResponder<P: ResponderPolicy> {
    policy: P,
    progress: ProgressTracker<ResponderStage>,
}

impl<P: ResponderPolicy> SignTransactionResponder<P> {
    /// Prepare a responder applying `policy`.
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            progress: ProgressTracker::new(ResponderStage::Receiving),
        }
    }

    /// Observe this flow's current stage.
    pub fn progress(&self) -> watch::Receiver<ResponderStage> {
        self.progress.subscribe()
    }

    /// Run the flow to its terminal outcome.
    pub async fn call(
        self,
        hub: &ServiceHub,
        mut session: Session,
    ) -> Result<SignedTransaction, FlowError> {
        let mut countersigned: Option<H256> = None;
        loop {
            match session.receive().await? {
                SessionMessage::KeyRequest(info) => {
                    if info.host != hub.identity() {
                        let reason =
                            format!("account {} is not hosted by this party", info.name);
                        warn!(party = %hub.name, account = %info.name, "refusing key request for foreign account");
                        session.send(SessionMessage::Rejected(reason.clone())).await?;
                        return Err(FlowError::PolicyRejected(reason));
                    }
                    let key = hub.keys.request_key(&info)?;
                    debug!(party = %hub.name, account = %info.name, key = %key, "issued key for peer");
                    session.send(SessionMessage::KeyIssued(key)).await?;
                }
                SessionMessage::SignRequest(stx) => {
                    self.progress.advance(ResponderStage::Checking)?;
                    if let Err(e) = self.check_transaction(&stx) {
                        let reason = e.to_string();
                        warn!(party = %hub.name, reason = %reason, "refusing to sign");
                        hub.metrics.counterparty_rejections_total.inc();
                        session.send(SessionMessage::Rejected(reason)).await?;
                        return Err(e);
                    }

                    self.progress.advance(ResponderStage::Signing)?;
                    let sigs = self.countersign(hub, &stx)?;
                    countersigned = Some(stx.id()?);
                    session.send(SessionMessage::Signatures(sigs)).await?;
                    self.progress.advance(ResponderStage::AwaitingFinality)?;
                }
                SessionMessage::Finalized(stx) => {
                    // Finality is only accepted for the exact transaction
                    // countersigned on this session, fully signed.
                    let id = stx.id()?;
                    if countersigned != Some(id) || !stx.is_fully_signed() {
                        warn!(party = %hub.name, tx = %id, "refusing unsolicited finality");
                        return Err(FlowError::FinalityMismatch);
                    }
                    keys::verify_attached_signatures(&stx)?;
                    hub.vault.record_committed(&stx)?;
                    info!(party = %hub.name, tx = %id, "finalized transaction recorded");
                    self.progress.advance(ResponderStage::Done)?;
                    return Ok(stx);
                }
                SessionMessage::Aborted(reason) => {
                    warn!(party = %hub.name, reason = %reason, "transaction aborted by initiator");
                    return Err(FlowError::InitiatorAborted(reason));
                }
                _ => return Err(FlowError::UnexpectedMessage),
            }
        }
    }

    /// Re-verify the proposal and apply the local policy.
    fn check_transaction(&self, stx: &SignedTransaction) -> Result<(), FlowError> {
        // Same deterministic engine the initiator ran; trust nothing.
        contract::verify(&stx.tx).map_err(|e| match e {
            ContractError::CommandCardinality(_) => FlowError::Malformed(e),
            ContractError::Requirement(_) => FlowError::Structural(e),
        })?;
        keys::verify_attached_signatures(stx)?;
        self.policy
            .check(&stx.tx)
            .map_err(FlowError::PolicyRejected)?;
        Ok(())
    }

    /// Sign with every held key the proposal still requires.
    fn countersign(
        &self,
        hub: &ServiceHub,
        stx: &SignedTransaction,
    ) -> Result<CanonicalMap<PublicKey, Signature>, FlowError> {
        let id = stx.id()?;
        let msg = tx_signing_bytes(id);
        let held = hub.keys.held_keys()?;
        let mut sigs = CanonicalMap::new();
        for key in stx.missing_signers() {
            if held.contains(&key) {
                let sig = hub.keys.sign(&key, &msg)?;
                sigs.insert(key, sig);
            }
        }
        Ok(sigs)
    }
}

/// Respond on one session with the given policy; observable entry point.
pub async fn respond<P: ResponderPolicy>(
    hub: &ServiceHub,
    session: Session,
    policy: P,
) -> Result<SignedTransaction, FlowError> {
    SignTransactionResponder::new(policy).call(hub, session).await
}
