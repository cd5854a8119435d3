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

use concordat::core::ledger::states::{IouState, LedgerState};
use concordat::core::ledger::transaction::{
    tx_signing_bytes, Command, CommandKind, SignedTransaction, StateRef, WireTransaction,
};
use concordat::core::services::keys::{InMemoryEd25519, SignerBackend};
use concordat::core::services::notary::{Notary, NotaryError};
use concordat::core::types::{PublicKey, Signature, H256};

fn spend_tx(
    input: StateRef,
    value: u64,
    signer: &InMemoryEd25519,
    counterparty: PublicKey,
) -> SignedTransaction {
    let wire = WireTransaction {
        notary: PublicKey(vec![9u8; 32]),
        inputs: vec![input],
        outputs: vec![LedgerState::Iou(IouState::new(
            value,
            signer.public_key(),
            counterparty,
        ))],
        commands: vec![Command::new(CommandKind::CreateIou, vec![signer.public_key()])],
    };
    let id = wire.id().unwrap();
    let sig = signer.sign(&tx_signing_bytes(id)).unwrap();
    SignedTransaction::unsigned(wire).with_signature(signer.public_key(), sig)
}

fn contested_input() -> StateRef {
    StateRef {
        txid: H256::from_bytes([3u8; 32]),
        index: 0,
    }
}

#[tokio::test]
async fn exactly_one_of_two_conflicting_transactions_commits() {
    let backend = InMemoryEd25519::generate().unwrap();
    let notary = Notary::new(&backend);
    let other = PublicKey(vec![4u8; 32]);

    let input = contested_input();
    let a = spend_tx(input, 10, &backend, other.clone());
    let b = spend_tx(input, 20, &backend, other);
    assert_ne!(a.id().unwrap(), b.id().unwrap());

    let (ra, rb) = tokio::join!(notary.submit(&a), notary.submit(&b));
    let committed = [&ra, &rb].iter().filter(|r| r.is_ok()).count();
    assert_eq!(committed, 1, "exactly one transaction must commit");

    let (winner, loser) = if ra.is_ok() { (ra, rb) } else { (rb, ra) };
    match loser.unwrap_err() {
        NotaryError::Conflict { input: i, by } => {
            assert_eq!(i, input);
            assert_eq!(by, winner.unwrap());
        }
        other => panic!("unexpected notary error: {other}"),
    }
}

#[tokio::test]
async fn notary_refuses_partially_signed_transactions() {
    let backend = InMemoryEd25519::generate().unwrap();
    let notary = Notary::new(&backend);

    let wire = WireTransaction {
        notary: PublicKey(vec![9u8; 32]),
        inputs: vec![],
        outputs: vec![LedgerState::Iou(IouState::new(
            10,
            backend.public_key(),
            PublicKey(vec![4u8; 32]),
        ))],
        commands: vec![Command::new(
            CommandKind::CreateIou,
            vec![backend.public_key(), PublicKey(vec![4u8; 32])],
        )],
    };
    let id = wire.id().unwrap();
    let sig = backend.sign(&tx_signing_bytes(id)).unwrap();
    let stx = SignedTransaction::unsigned(wire).with_signature(backend.public_key(), sig);

    match notary.submit(&stx).await.unwrap_err() {
        NotaryError::MissingSignatures { missing } => assert_eq!(missing, 1),
        other => panic!("unexpected notary error: {other}"),
    }
}

#[tokio::test]
async fn notary_refuses_invalid_signatures() {
    let backend = InMemoryEd25519::generate().unwrap();
    let notary = Notary::new(&backend);

    let wire = WireTransaction {
        notary: PublicKey(vec![9u8; 32]),
        inputs: vec![],
        outputs: vec![LedgerState::Iou(IouState::new(
            10,
            backend.public_key(),
            PublicKey(vec![4u8; 32]),
        ))],
        commands: vec![Command::new(CommandKind::CreateIou, vec![backend.public_key()])],
    };
    // Signature over the wrong payload.
    let sig = backend.sign(b"unrelated bytes").unwrap();
    let stx = SignedTransaction::unsigned(wire).with_signature(backend.public_key(), sig);

    assert!(matches!(
        notary.submit(&stx).await.unwrap_err(),
        NotaryError::BadSignature
    ));

    // A malformed signature blob is refused the same way.
    let backend2 = InMemoryEd25519::generate().unwrap();
    let notary2 = Notary::new(&backend2);
    let wire = WireTransaction {
        notary: PublicKey(vec![9u8; 32]),
        inputs: vec![],
        outputs: vec![],
        commands: vec![Command::new(
            CommandKind::CreateAccount,
            vec![backend2.public_key()],
        )],
    };
    let stx =
        SignedTransaction::unsigned(wire).with_signature(backend2.public_key(), Signature(vec![0u8; 10]));
    assert!(matches!(
        notary2.submit(&stx).await.unwrap_err(),
        NotaryError::BadSignature
    ));
}
