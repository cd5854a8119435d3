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

//! Ledger state model: capability traits and the concrete state types.
//!
//! States are immutable records of shared facts. A state never changes in
//! place; an update consumes the old state as a transaction input and
//! produces a replacement output carrying the same linear id.

use crate::core::types::{CanonicalMap, PublicKey, UniqueId};
use serde::{Deserialize, Serialize};

/// A state that can appear in a transaction: names the parties with a
/// standing interest in it. Their keys are candidates for required signers.
pub trait ContractState {
    /// Parties with a legitimate interest in this fact.
    fn participants(&self) -> Vec<PublicKey>;
}

/// A state with an updatable lineage, keyed by a stable linear id.
pub trait LinearState: ContractState {
    /// Stable identity across the state's lineage.
    fn linear_id(&self) -> UniqueId;
}

/// A state the vault can project into a flat queryable row.
pub trait QueryableState: ContractState {
    /// Persistence projection of this state.
    fn to_row(&self) -> StateRow;
}

/// Flat persistence projection of a state, keyed by linear id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRow {
    /// Linear id of the projected state.
    pub linear_id: UniqueId,
    /// State kind tag ("account" or "iou").
    pub kind: String,
    /// Flattened column values.
    pub columns: CanonicalMap<String, String>,
}

/// Categorical account type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountType {
    /// A bank-type account.
    Bank,
    /// An agent-type account.
    Agent,
}

impl AccountType {
    /// Parse from a case-insensitive name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "BANK" => Some(AccountType::Bank),
            "AGENT" => Some(AccountType::Agent),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            AccountType::Bank => "BANK",
            AccountType::Agent => "AGENT",
        }
    }
}

/// Registry descriptor for an account: who hosts it and under what name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Registry identifier of the account.
    pub identifier: UniqueId,
    /// Account name, unique within the registry.
    pub name: String,
    /// Key of the party hosting the account.
    pub host: PublicKey,
}

/// An account record with a categorical type tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// The linked account descriptor.
    pub account: AccountInfo,
    /// The type of account.
    pub account_type: AccountType,
    /// Stable lineage identity.
    pub linear_id: UniqueId,
}

impl AccountState {
    /// Create a new account state with a fresh linear id.
    pub fn new(account: AccountInfo, account_type: AccountType) -> Self {
        Self {
            account,
            account_type,
            linear_id: UniqueId::random(),
        }
    }
}

impl ContractState for AccountState {
    fn participants(&self) -> Vec<PublicKey> {
        vec![self.account.host.clone()]
    }
}

impl LinearState for AccountState {
    fn linear_id(&self) -> UniqueId {
        self.linear_id
    }
}

impl QueryableState for AccountState {
    fn to_row(&self) -> StateRow {
        let mut columns = CanonicalMap::new();
        columns.insert("account_id".to_string(), self.account.identifier.to_string());
        columns.insert("account_name".to_string(), self.account.name.clone());
        columns.insert("account_type".to_string(), self.account_type.name().to_string());
        StateRow {
            linear_id: self.linear_id,
            kind: "account".to_string(),
            columns,
        }
    }
}

/// A numeric obligation between two parties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IouState {
    /// Obligation amount.
    pub value: u64,
    /// Key of the party owed.
    pub lender: PublicKey,
    /// Key of the party owing.
    pub borrower: PublicKey,
    /// Stable lineage identity.
    pub linear_id: UniqueId,
}

impl IouState {
    /// Create a new obligation with a fresh linear id.
    pub fn new(value: u64, lender: PublicKey, borrower: PublicKey) -> Self {
        Self {
            value,
            lender,
            borrower,
            linear_id: UniqueId::random(),
        }
    }
}

impl ContractState for IouState {
    fn participants(&self) -> Vec<PublicKey> {
        vec![self.lender.clone(), self.borrower.clone()]
    }
}

impl LinearState for IouState {
    fn linear_id(&self) -> UniqueId {
        self.linear_id
    }
}

impl QueryableState for IouState {
    fn to_row(&self) -> StateRow {
        let mut columns = CanonicalMap::new();
        columns.insert("value".to_string(), self.value.to_string());
        columns.insert("lender".to_string(), self.lender.to_string());
        columns.insert("borrower".to_string(), self.borrower.to_string());
        StateRow {
            linear_id: self.linear_id,
            kind: "iou".to_string(),
            columns,
        }
    }
}

/// Closed set of state types recognised by the validity engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerState {
    /// An account record.
    Account(AccountState),
    /// An IOU obligation.
    Iou(IouState),
}

impl ContractState for LedgerState {
    fn participants(&self) -> Vec<PublicKey> {
        match self {
            LedgerState::Account(s) => s.participants(),
            LedgerState::Iou(s) => s.participants(),
        }
    }
}

impl LinearState for LedgerState {
    fn linear_id(&self) -> UniqueId {
        match self {
            LedgerState::Account(s) => s.linear_id(),
            LedgerState::Iou(s) => s.linear_id(),
        }
    }
}

impl QueryableState for LedgerState {
    fn to_row(&self) -> StateRow {
        match self {
            LedgerState::Account(s) => s.to_row(),
            LedgerState::Iou(s) => s.to_row(),
        }
    }
}
