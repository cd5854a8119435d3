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

//! External service capabilities consumed by the flows, plus the per-party
//! hub that wires them together.

pub mod keys;
pub mod notary;
pub mod registry;
pub mod vault;

use crate::monitoring::metrics::Metrics;
use keys::{KeyError, KeyService};
use notary::Notary;
use registry::AccountRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use vault::{Vault, VaultError};

/// Hub construction errors.
#[derive(Debug, Error)]
pub enum HubError {
    /// The key service could not be opened.
    #[error("key service: {0}")]
    Key(#[from] KeyError),
    /// The vault could not be opened.
    #[error("vault: {0}")]
    Vault(#[from] VaultError),
}

/// One party's view of the world: its keys and vault, plus handles to the
/// shared registry, notary, and metrics.
pub struct ServiceHub {
    /// Human-readable party name (logging only).
    pub name: String,
    /// This party's key service.
    pub keys: KeyService,
    /// Shared account registry.
    pub registry: Arc<AccountRegistry>,
    /// Shared notary handle.
    pub notary: Arc<Notary>,
    /// This party's committed-state vault.
    pub vault: Vault,
    /// Shared metrics.
    pub metrics: Arc<Metrics>,
}

impl ServiceHub {
    /// Open a hub for one party. The vault lives at `data_dir/vault` and the
    /// identity key at `data_dir/party.key`.
    pub fn open(
        name: &str,
        data_dir: &str,
        registry: Arc<AccountRegistry>,
        notary: Arc<Notary>,
        metrics: Arc<Metrics>,
    ) -> Result<Self, HubError> {
        let keys = KeyService::open(data_dir)?;
        let mut vault_path = PathBuf::from(data_dir);
        vault_path.push("vault");
        let vault = Vault::open(&vault_path.to_string_lossy())?;
        Ok(Self {
            name: name.to_string(),
            keys,
            registry,
            notary,
            vault,
            metrics,
        })
    }

    /// This party's identity key.
    pub fn identity(&self) -> crate::core::types::PublicKey {
        self.keys.node_identity()
    }
}
