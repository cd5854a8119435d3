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

//! Provision a party identity key (`party.key`) for a data directory and
//! print its hex public key. Refuses to overwrite an existing key.

use anyhow::{bail, Context, Result};
use concordat::core::services::keys::{FileEd25519Backend, SignerBackend};
use std::path::PathBuf;

fn main() -> Result<()> {
    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let mut key_path = PathBuf::from(&data_dir);
    key_path.push("party.key");

    if key_path.exists() {
        bail!("refusing to overwrite existing key at {}", key_path.display());
    }

    let backend = FileEd25519Backend::load_or_create(&key_path)
        .with_context(|| format!("generating key at {}", key_path.display()))?;
    println!("{}", backend.public_key());
    Ok(())
}
