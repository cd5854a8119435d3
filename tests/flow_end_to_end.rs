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

use concordat::core::flow::initiator::{initiate_creation, initiate_iou, FlowError};
use concordat::core::flow::responder::{respond, IouValueCeiling};
use concordat::core::flow::session::{Session, SessionMessage};
use concordat::core::ledger::states::{
    AccountInfo, AccountType, IouState, LedgerState, LinearState,
};
use concordat::core::ledger::transaction::{
    Command, CommandKind, SignedTransaction, WireTransaction,
};
use concordat::core::services::keys::{InMemoryEd25519, KeyError, SignerBackend};
use concordat::core::services::notary::Notary;
use concordat::core::services::registry::AccountRegistry;
use concordat::core::services::ServiceHub;
use concordat::core::types::UniqueId;
use concordat::monitoring::metrics::Metrics;
use std::sync::Arc;
use std::time::Duration;

struct TestNet {
    _dir: tempfile::TempDir,
    alice: Arc<ServiceHub>,
    bob: Arc<ServiceHub>,
}

fn two_party_net() -> TestNet {
    let dir = tempfile::tempdir().unwrap();
    let metrics = Arc::new(Metrics::new().unwrap());
    let registry = Arc::new(AccountRegistry::new());
    let notary_backend = InMemoryEd25519::generate().unwrap();
    let notary = Arc::new(Notary::new(&notary_backend));

    let alice = Arc::new(
        ServiceHub::open(
            "alice",
            dir.path().join("alice").to_str().unwrap(),
            registry.clone(),
            notary.clone(),
            metrics.clone(),
        )
        .unwrap(),
    );
    let bob = Arc::new(
        ServiceHub::open(
            "bob",
            dir.path().join("bob").to_str().unwrap(),
            registry,
            notary,
            metrics,
        )
        .unwrap(),
    );
    TestNet {
        _dir: dir,
        alice,
        bob,
    }
}

#[tokio::test]
async fn creation_flow_commits_and_is_retrievable() {
    let net = two_party_net();

    let (state_ref, account) = initiate_creation(&net.alice, "AliceCorp", AccountType::Bank)
        .await
        .unwrap();

    let stx = net.alice.vault.transaction(&state_ref.txid).unwrap().unwrap();
    assert_eq!(stx.tx.outputs.len(), 1);
    assert!(stx.is_fully_signed());

    let (stored_ref, stored) = net
        .alice
        .vault
        .state_by_linear_id(&account.linear_id)
        .unwrap()
        .unwrap();
    assert_eq!(stored_ref, state_ref);
    assert_eq!(stored, LedgerState::Account(account.clone()));

    let row = net
        .alice
        .vault
        .row_by_linear_id(&account.linear_id)
        .unwrap()
        .unwrap();
    assert_eq!(row.kind, "account");
    assert_eq!(row.columns.get("account_type").unwrap(), "BANK");
}

#[tokio::test]
async fn duplicate_account_name_aborts() {
    let net = two_party_net();
    initiate_creation(&net.alice, "AliceCorp", AccountType::Bank)
        .await
        .unwrap();
    let err = initiate_creation(&net.alice, "AliceCorp", AccountType::Agent)
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Registry(_)));
}

#[tokio::test]
async fn iou_within_ceiling_commits_on_both_vaults() {
    let net = two_party_net();
    initiate_creation(&net.alice, "AliceCorp", AccountType::Bank)
        .await
        .unwrap();
    initiate_creation(&net.bob, "BobCorp", AccountType::Agent)
        .await
        .unwrap();

    let (initiator_end, responder_end) = Session::pair(net.alice.identity(), net.bob.identity());
    let bob = net.bob.clone();
    let responder = tokio::spawn(async move {
        respond(&bob, responder_end, IouValueCeiling { max_value: 100 }).await
    });

    let stx = initiate_iou(&net.alice, 50, "AliceCorp", "BobCorp", vec![initiator_end])
        .await
        .unwrap();
    let responder_stx = responder.await.unwrap().unwrap();
    assert_eq!(stx, responder_stx);

    let id = stx.id().unwrap();
    assert!(net.alice.vault.transaction(&id).unwrap().is_some());
    assert!(net.bob.vault.transaction(&id).unwrap().is_some());

    let iou = match &stx.tx.outputs[0] {
        LedgerState::Iou(iou) => iou.clone(),
        other => panic!("unexpected output: {other:?}"),
    };
    assert_eq!(iou.value, 50);
    for hub in [&net.alice, &net.bob] {
        let (_, stored) = hub
            .vault
            .state_by_linear_id(&iou.linear_id())
            .unwrap()
            .unwrap();
        assert_eq!(stored, LedgerState::Iou(iou.clone()));
        let row = hub.vault.row_by_linear_id(&iou.linear_id()).unwrap().unwrap();
        assert_eq!(row.columns.get("value").unwrap(), "50");
    }
}

#[tokio::test]
async fn iou_over_ceiling_aborts_everywhere() {
    let net = two_party_net();
    initiate_creation(&net.alice, "AliceCorp", AccountType::Bank)
        .await
        .unwrap();
    initiate_creation(&net.bob, "BobCorp", AccountType::Agent)
        .await
        .unwrap();
    let alice_states = net.alice.vault.state_count();
    let bob_states = net.bob.vault.state_count();

    let (initiator_end, responder_end) = Session::pair(net.alice.identity(), net.bob.identity());
    let bob = net.bob.clone();
    let responder = tokio::spawn(async move {
        respond(&bob, responder_end, IouValueCeiling { max_value: 100 }).await
    });

    let err = initiate_iou(&net.alice, 150, "AliceCorp", "BobCorp", vec![initiator_end])
        .await
        .unwrap_err();
    match err {
        FlowError::CounterpartyRejected(reason) => {
            assert!(reason.contains("over 100"), "reason: {reason}");
        }
        other => panic!("unexpected abort: {other}"),
    }

    let responder_err = responder.await.unwrap().unwrap_err();
    assert!(matches!(responder_err, FlowError::PolicyRejected(_)));

    // No trace of the aborted transaction in either vault.
    assert_eq!(net.alice.vault.state_count(), alice_states);
    assert_eq!(net.bob.vault.state_count(), bob_states);
}

#[tokio::test]
async fn dropped_counterparty_aborts_with_communication_failure() {
    let net = two_party_net();
    initiate_creation(&net.alice, "AliceCorp", AccountType::Bank)
        .await
        .unwrap();
    initiate_creation(&net.bob, "BobCorp", AccountType::Agent)
        .await
        .unwrap();

    let (initiator_end, responder_end) = Session::pair(net.alice.identity(), net.bob.identity());
    drop(responder_end);

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        initiate_iou(&net.alice, 50, "AliceCorp", "BobCorp", vec![initiator_end]),
    )
    .await
    .unwrap();
    assert!(matches!(result, Err(FlowError::Communication(_))));
}

#[tokio::test]
async fn unsolicited_finality_is_refused() {
    let net = two_party_net();

    // Never countersigned, never notarized, zero signatures, far over any
    // sensible ceiling.
    let wire = WireTransaction {
        notary: net.alice.notary.identity(),
        inputs: vec![],
        outputs: vec![LedgerState::Iou(IouState::new(
            10_000,
            net.alice.identity(),
            net.bob.identity(),
        ))],
        commands: vec![Command::new(
            CommandKind::CreateIou,
            vec![net.alice.identity(), net.bob.identity()],
        )],
    };
    let stx = SignedTransaction::unsigned(wire);
    let id = stx.id().unwrap();

    let (initiator_end, responder_end) =
        Session::pair(net.alice.identity(), net.bob.identity());
    let bob = net.bob.clone();
    let responder = tokio::spawn(async move {
        respond(&bob, responder_end, IouValueCeiling { max_value: 100 }).await
    });

    initiator_end
        .send(SessionMessage::Finalized(stx))
        .await
        .unwrap();

    let err = responder.await.unwrap().unwrap_err();
    assert!(matches!(err, FlowError::FinalityMismatch));
    assert!(net.bob.vault.transaction(&id).unwrap().is_none());
    assert_eq!(net.bob.vault.state_count(), 0);
}

#[tokio::test]
async fn key_requests_for_foreign_accounts_are_refused() {
    let net = two_party_net();

    // An account hosted by alice, requested from bob.
    let info = AccountInfo {
        identifier: UniqueId::random(),
        name: "AliceCorp".to_string(),
        host: net.alice.identity(),
    };
    assert!(matches!(
        net.bob.keys.request_key(&info),
        Err(KeyError::ForeignHost)
    ));

    let (mut initiator_end, responder_end) =
        Session::pair(net.alice.identity(), net.bob.identity());
    let bob = net.bob.clone();
    let responder = tokio::spawn(async move {
        respond(&bob, responder_end, IouValueCeiling { max_value: 100 }).await
    });

    initiator_end
        .send(SessionMessage::KeyRequest(info))
        .await
        .unwrap();
    match initiator_end.receive().await.unwrap() {
        SessionMessage::Rejected(reason) => {
            assert!(reason.contains("not hosted"), "reason: {reason}");
        }
        other => panic!("unexpected message: {other:?}"),
    }
    let err = responder.await.unwrap().unwrap_err();
    assert!(matches!(err, FlowError::PolicyRejected(_)));
}

#[tokio::test]
async fn iou_without_session_to_borrower_host_aborts() {
    let net = two_party_net();
    initiate_creation(&net.alice, "AliceCorp", AccountType::Bank)
        .await
        .unwrap();
    initiate_creation(&net.bob, "BobCorp", AccountType::Agent)
        .await
        .unwrap();

    // The only session leads to a stranger, not to bob who hosts the
    // borrower account.
    let stranger = InMemoryEd25519::generate().unwrap().public_key();
    let (initiator_end, _stranger_end) = Session::pair(net.alice.identity(), stranger);

    let err = initiate_iou(&net.alice, 50, "AliceCorp", "BobCorp", vec![initiator_end])
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::NoSessionToHost));
}
