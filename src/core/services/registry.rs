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

//! Account registry: name to account-descriptor lookups, shared between
//! the parties of a deployment.

use crate::core::ledger::states::AccountInfo;
use crate::core::types::{PublicKey, UniqueId};
use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An account with this name already exists.
    #[error("account name already registered: {0}")]
    DuplicateName(String),
    /// No account with this name is registered.
    #[error("unknown account: {0}")]
    UnknownAccount(String),
    /// Internal lock failure.
    #[error("lock poisoned")]
    Lock,
}

/// Shared name-keyed account registry.
#[derive(Default)]
pub struct AccountRegistry {
    accounts: Mutex<BTreeMap<String, AccountInfo>>,
}

impl AccountRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new account hosted by `host` under a fresh identifier.
    pub fn create(&self, name: &str, host: PublicKey) -> Result<AccountInfo, RegistryError> {
        let mut guard = self.accounts.lock().map_err(|_| RegistryError::Lock)?;
        if guard.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let info = AccountInfo {
            identifier: UniqueId::random(),
            name: name.to_string(),
            host,
        };
        guard.insert(name.to_string(), info.clone());
        Ok(info)
    }

    /// Look up an account descriptor by name.
    pub fn lookup(&self, name: &str) -> Result<AccountInfo, RegistryError> {
        let guard = self.accounts.lock().map_err(|_| RegistryError::Lock)?;
        guard
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownAccount(name.to_string()))
    }
}
