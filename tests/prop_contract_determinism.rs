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

use concordat::core::ledger::contract;
use concordat::core::ledger::states::{IouState, LedgerState};
use concordat::core::ledger::transaction::{Command, CommandKind, WireTransaction};
use concordat::core::types::PublicKey;
use proptest::prelude::*;

fn arb_key() -> impl Strategy<Value = PublicKey> {
    any::<[u8; 32]>().prop_map(|b| PublicKey(b.to_vec()))
}

proptest! {
    /// The engine is a pure function: the same frozen proposal always
    /// yields the same verdict.
    #[test]
    fn prop_verdict_is_deterministic(
        value in 0u64..1_000u64,
        lender in arb_key(),
        borrower in arb_key(),
        sign_lender in any::<bool>(),
        sign_borrower in any::<bool>(),
    ) {
        let mut signers = Vec::new();
        if sign_lender {
            signers.push(lender.clone());
        }
        if sign_borrower {
            signers.push(borrower.clone());
        }
        let tx = WireTransaction {
            notary: PublicKey(vec![9u8; 32]),
            inputs: vec![],
            outputs: vec![LedgerState::Iou(IouState::new(value, lender, borrower))],
            commands: vec![Command::new(CommandKind::CreateIou, signers)],
        };

        prop_assert_eq!(contract::verify(&tx), contract::verify(&tx));
    }

    /// With the creation shape held fixed, acceptance is exactly signer
    /// coverage plus the structural IOU predicates.
    #[test]
    fn prop_signer_coverage_decides_acceptance(
        value in 1u64..1_000u64,
        lender in arb_key(),
        borrower in arb_key(),
        sign_lender in any::<bool>(),
        sign_borrower in any::<bool>(),
    ) {
        prop_assume!(lender != borrower);

        let mut signers = Vec::new();
        if sign_lender {
            signers.push(lender.clone());
        }
        if sign_borrower {
            signers.push(borrower.clone());
        }
        let tx = WireTransaction {
            notary: PublicKey(vec![9u8; 32]),
            inputs: vec![],
            outputs: vec![LedgerState::Iou(IouState::new(value, lender, borrower))],
            commands: vec![Command::new(CommandKind::CreateIou, signers)],
        };

        let accepted = contract::verify(&tx).is_ok();
        prop_assert_eq!(accepted, sign_lender && sign_borrower);
    }
}
