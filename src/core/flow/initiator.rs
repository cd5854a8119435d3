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

//! Initiator-side commit flows.
//!
//! A flow is one logically single-threaded async task driving a
//! transaction through acquire, build, verify, sign, collect, finalise.
//! Every await is a suspension point at an inter-party or service
//! boundary. Any failure aborts the whole transaction; nothing partial is
//! ever observable.

use crate::core::flow::progress::{InitiatorStage, ProgressError, ProgressTracker};
use crate::core::flow::session::{Session, SessionError, SessionMessage};
use crate::core::ledger::builder::{BuilderError, TransactionBuilder};
use crate::core::ledger::contract::ContractError;
use crate::core::ledger::states::{AccountInfo, AccountState, AccountType, IouState, LedgerState};
use crate::core::ledger::transaction::{
    tx_signing_bytes, Command, CommandKind, SignedTransaction, StateRef,
};
use crate::core::services::keys::KeyError;
use crate::core::services::notary::NotaryError;
use crate::core::services::registry::RegistryError;
use crate::core::services::vault::VaultError;
use crate::core::services::ServiceHub;
use crate::core::types::{CodecError, PublicKey};
use std::collections::BTreeSet;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Terminal abort reasons of a flow. Every variant means the whole
/// transaction aborted atomically for every party.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Wrong command shape or cardinality, caught before any signature.
    #[error("malformed proposal: {0}")]
    Malformed(ContractError),
    /// A validity-engine predicate failed, caught before any network traffic.
    #[error("structural policy violation: {0}")]
    Structural(ContractError),
    /// A counterparty's private acceptance rule rejected the proposal.
    #[error("counterparty rejected: {0}")]
    CounterpartyRejected(String),
    /// This party's own acceptance rule rejected the proposal (responder side).
    #[error("rejected by local policy: {0}")]
    PolicyRejected(String),
    /// The initiator reported the overall transaction aborted (responder side).
    #[error("transaction aborted by initiator: {0}")]
    InitiatorAborted(String),
    /// The notary detected conflicting input consumption.
    #[error("notary conflict: {0}")]
    NotaryConflict(NotaryError),
    /// The notary refused the transaction for another reason.
    #[error("notary rejected: {0}")]
    NotaryRejected(NotaryError),
    /// A session or service became unreachable; retry the whole flow.
    #[error("communication failure: {0}")]
    Communication(#[from] SessionError),
    /// A peer sent a message outside the protocol sequence.
    #[error("unexpected session message")]
    UnexpectedMessage,
    /// No session connects to the party hosting a required account.
    #[error("no session to the hosting party")]
    NoSessionToHost,
    /// A finalized transaction did not match the countersigned proposal
    /// (responder side).
    #[error("finalized transaction does not match the countersigned proposal")]
    FinalityMismatch,
    /// The builder refused to freeze an unverified proposal.
    #[error("builder: {0}")]
    Builder(#[from] BuilderError),
    /// The flow attempted a backwards stage transition.
    #[error("progress: {0}")]
    Progress(#[from] ProgressError),
    /// The key service failed.
    #[error("key service: {0}")]
    Key(#[from] KeyError),
    /// The account registry refused the request.
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
    /// The vault failed to record the committed transaction.
    #[error("vault: {0}")]
    Vault(#[from] VaultError),
    /// Canonical encoding failed.
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

/// Classify a validity-engine rejection into the flow taxonomy.
fn contract_abort(e: ContractError) -> FlowError {
    match e {
        ContractError::CommandCardinality(_) => FlowError::Malformed(e),
        ContractError::Requirement(_) => FlowError::Structural(e),
    }
}

fn notary_abort(e: NotaryError) -> FlowError {
    match e {
        NotaryError::Conflict { .. } => FlowError::NotaryConflict(e),
        _ => FlowError::NotaryRejected(e),
    }
}

/// Sign `stx` with every key in `keys` that this party actually holds.
fn sign_initial(
    hub: &ServiceHub,
    stx: SignedTransaction,
    keys: &BTreeSet<PublicKey>,
) -> Result<SignedTransaction, FlowError> {
    let id = stx.id()?;
    let msg = tx_signing_bytes(id);
    let held = hub.keys.held_keys()?;
    let mut out = stx;
    for key in keys {
        if held.contains(key) {
            let sig = hub.keys.sign(key, &msg)?;
            out = out.with_signature(key.clone(), sig);
        }
    }
    Ok(out)
}

/// Send a sign request to every counterparty session and wait for all of
/// them to answer. Responses arrive in no particular order; a single
/// rejection aborts the collection.
async fn collect_signatures(
    stx: SignedTransaction,
    sessions: &mut [Session],
) -> Result<SignedTransaction, FlowError> {
    let request = stx.clone();
    let request = &request;
    let responses =
        futures::future::try_join_all(sessions.iter_mut().map(|session| async move {
            session
                .send(SessionMessage::SignRequest(request.clone()))
                .await?;
            match session.receive().await? {
                SessionMessage::Signatures(sigs) => Ok(sigs),
                SessionMessage::Rejected(reason) => Err(FlowError::CounterpartyRejected(reason)),
                _ => Err(FlowError::UnexpectedMessage),
            }
        }))
        .await?;

    let mut out = stx;
    for sigs in responses {
        out = out.with_signatures(sigs);
    }
    Ok(out)
}

async fn notify_abort(sessions: &mut [Session], reason: &str) {
    for session in sessions.iter_mut() {
        // Best-effort: a rejecting counterparty has already hung up.
        let _ = session
            .send(SessionMessage::Aborted(reason.to_string()))
            .await;
    }
}

/// Flow creating a new account record on the ledger.
///
/// Single-party creation: the initiator holds every required key, so there
/// is no collection step.
pub struct CreateAccountFlow {
    name: String,
    account_type: AccountType,
    progress: ProgressTracker<InitiatorStage>,
}

impl CreateAccountFlow {
    /// Prepare a flow for an account `name` of the given type.
    pub fn new(name: &str, account_type: AccountType) -> Self {
        Self {
            name: name.to_string(),
            account_type,
            progress: ProgressTracker::new(InitiatorStage::Acquiring),
        }
    }

    /// Observe this flow's current stage.
    pub fn progress(&self) -> watch::Receiver<InitiatorStage> {
        self.progress.subscribe()
    }

    /// Run the flow to its terminal outcome.
    pub async fn call(self, hub: &ServiceHub) -> Result<(StateRef, AccountState), FlowError> {
        // Acquire: register the account and obtain its fresh key.
        let info = hub.registry.create(&self.name, hub.identity())?;
        let account_key = hub.keys.request_key(&info)?;
        debug!(party = %hub.name, account = %self.name, key = %account_key, "account key issued");

        self.progress.advance(InitiatorStage::Building)?;
        let output = AccountState::new(info, self.account_type);
        let keys_to_sign: BTreeSet<PublicKey> =
            [hub.identity(), account_key].into_iter().collect();
        let command = Command::new(CommandKind::CreateAccount, keys_to_sign.clone());

        let mut builder = TransactionBuilder::new(hub.notary.identity());
        builder
            .add_output(LedgerState::Account(output.clone()))
            .add_command(command);

        self.progress.advance(InitiatorStage::Verifying)?;
        builder.verify().map_err(contract_abort)?;

        self.progress.advance(InitiatorStage::Signing)?;
        let wire = builder.build()?;
        let stx = sign_initial(hub, SignedTransaction::unsigned(wire), &keys_to_sign)?;

        self.progress.advance(InitiatorStage::Finalising)?;
        let id = hub.notary.submit(&stx).await.map_err(notary_abort)?;
        hub.vault.record_committed(&stx)?;
        info!(party = %hub.name, tx = %id, account = %self.name, "account committed");

        self.progress.advance(InitiatorStage::Done)?;
        let out_ref = stx.tx.out_ref(0)?;
        Ok((out_ref, output))
    }
}

/// Flow issuing an IOU between two registered accounts.
///
/// Multi-party creation: the borrower's host must countersign, so the flow
/// suspends while collecting signatures over the counterparty sessions.
pub struct IouFlow {
    value: u64,
    lender: String,
    borrower: String,
    progress: ProgressTracker<InitiatorStage>,
}

impl IouFlow {
    /// Prepare a flow for an IOU of `value` owed by `borrower` to `lender`.
    pub fn new(value: u64, lender: &str, borrower: &str) -> Self {
        Self {
            value,
            lender: lender.to_string(),
            borrower: borrower.to_string(),
            progress: ProgressTracker::new(InitiatorStage::Acquiring),
        }
    }

    /// Observe this flow's current stage.
    pub fn progress(&self) -> watch::Receiver<InitiatorStage> {
        self.progress.subscribe()
    }

    /// Obtain the signing key for an account: locally when we host it,
    /// otherwise over the counterparty session that does.
    async fn acquire_key(
        &self,
        hub: &ServiceHub,
        info: &AccountInfo,
        sessions: &mut [Session],
    ) -> Result<PublicKey, FlowError> {
        if info.host == hub.identity() {
            return Ok(hub.keys.request_key(info)?);
        }
        // Only the hosting party can issue the account's key.
        let session = sessions
            .iter_mut()
            .find(|s| s.peer() == &info.host)
            .ok_or(FlowError::NoSessionToHost)?;
        session
            .send(SessionMessage::KeyRequest(info.clone()))
            .await?;
        match session.receive().await? {
            SessionMessage::KeyIssued(key) => Ok(key),
            SessionMessage::Rejected(reason) => Err(FlowError::CounterpartyRejected(reason)),
            _ => Err(FlowError::UnexpectedMessage),
        }
    }

    /// Run the flow to its terminal outcome.
    pub async fn call(
        self,
        hub: &ServiceHub,
        mut sessions: Vec<Session>,
    ) -> Result<SignedTransaction, FlowError> {
        // Acquire: look up both accounts and obtain their signing keys.
        let lender_info = hub.registry.lookup(&self.lender)?;
        let borrower_info = hub.registry.lookup(&self.borrower)?;
        let lender_key = self.acquire_key(hub, &lender_info, &mut sessions).await?;
        let borrower_key = self.acquire_key(hub, &borrower_info, &mut sessions).await?;

        self.progress.advance(InitiatorStage::Building)?;
        let output = IouState::new(self.value, lender_key.clone(), borrower_key.clone());
        let keys_to_sign: BTreeSet<PublicKey> =
            [lender_key, borrower_key].into_iter().collect();
        let command = Command::new(CommandKind::CreateIou, keys_to_sign.clone());

        let mut builder = TransactionBuilder::new(hub.notary.identity());
        builder
            .add_output(LedgerState::Iou(output))
            .add_command(command);

        // Verify before anything is signed or sent; a rejection here leaves
        // no trace anywhere.
        self.progress.advance(InitiatorStage::Verifying)?;
        builder.verify().map_err(contract_abort)?;

        self.progress.advance(InitiatorStage::Signing)?;
        let wire = builder.build()?;
        let stx = sign_initial(hub, SignedTransaction::unsigned(wire), &keys_to_sign)?;

        self.progress.advance(InitiatorStage::Collecting)?;
        let stx = match collect_signatures(stx, &mut sessions).await {
            Ok(stx) => stx,
            Err(e) => {
                notify_abort(&mut sessions, &e.to_string()).await;
                return Err(e);
            }
        };

        self.progress.advance(InitiatorStage::Finalising)?;
        let id = match hub.notary.submit(&stx).await {
            Ok(id) => id,
            Err(e) => {
                let abort = notary_abort(e);
                notify_abort(&mut sessions, &abort.to_string()).await;
                return Err(abort);
            }
        };
        hub.vault.record_committed(&stx)?;
        for session in sessions.iter_mut() {
            session.send(SessionMessage::Finalized(stx.clone())).await?;
        }
        info!(party = %hub.name, tx = %id, value = self.value, "IOU committed");

        self.progress.advance(InitiatorStage::Done)?;
        Ok(stx)
    }
}

/// Create an account record; observable entry point for the application.
pub async fn initiate_creation(
    hub: &ServiceHub,
    name: &str,
    account_type: AccountType,
) -> Result<(StateRef, AccountState), FlowError> {
    hub.metrics.flows_started_total.inc();
    match CreateAccountFlow::new(name, account_type).call(hub).await {
        Ok(v) => {
            hub.metrics.flows_committed_total.inc();
            Ok(v)
        }
        Err(e) => {
            warn!(party = %hub.name, account = name, error = %e, "creation flow aborted");
            hub.metrics.flows_aborted_total.inc();
            Err(e)
        }
    }
}

/// Issue an IOU across parties; observable entry point for the application.
pub async fn initiate_iou(
    hub: &ServiceHub,
    value: u64,
    lender: &str,
    borrower: &str,
    sessions: Vec<Session>,
) -> Result<SignedTransaction, FlowError> {
    hub.metrics.flows_started_total.inc();
    match IouFlow::new(value, lender, borrower).call(hub, sessions).await {
        Ok(stx) => {
            hub.metrics.flows_committed_total.inc();
            Ok(stx)
        }
        Err(e) => {
            warn!(party = %hub.name, value, error = %e, "IOU flow aborted");
            hub.metrics.flows_aborted_total.inc();
            match &e {
                FlowError::CounterpartyRejected(_) => {
                    hub.metrics.counterparty_rejections_total.inc()
                }
                FlowError::NotaryConflict(_) => hub.metrics.notary_conflicts_total.inc(),
                _ => {}
            }
            Err(e)
        }
    }
}
