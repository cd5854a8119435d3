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
#![warn(missing_docs)]

//! Deterministic core types, canonical encoding helpers, and node configuration.

use bincode::Options;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Canonical serialization error.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialization")]
    Serialize,
    #[error("deserialization")]
    Deserialize,
    #[error("size limit exceeded")]
    TooLarge,
}

/// Canonical bincode options (deterministic).
fn bincode_opts() -> impl Options {
    // Fixint encoding provides a stable integer representation.
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode with deterministic rules. Requires deterministic container ordering (use BTreeMap/BTreeSet).
pub fn encode_canonical<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    bincode_opts()
        .serialize(v)
        .map_err(|_| CodecError::Serialize)
}

/// Decode with a hard size cap.
pub fn decode_canonical_limited<T: DeserializeOwned>(
    bytes: &[u8],
    max: usize,
) -> Result<T, CodecError> {
    // Fast-path cap on the raw wire payload.
    if bytes.len() > max {
        return Err(CodecError::TooLarge);
    }
    // Defensive cap inside the deserializer to prevent memory/CPU bombs via large container lengths.
    bincode_opts()
        .with_limit(max as u64)
        .deserialize(bytes)
        .map_err(|_| CodecError::Deserialize)
}

/// 256-bit hash type (32 bytes). Used as the transaction identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct H256([u8; 32]);

impl H256 {
    /// Construct from raw bytes.
    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }
    /// Return bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for H256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Ed25519 signature bytes (expected 64).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature(pub Vec<u8>);

/// Party public key (Ed25519 public key bytes, expected 32).
///
/// Keys identify parties and accounts throughout the ledger model: state
/// participants, command signers, and the notary are all named by key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub Vec<u8>);

impl PublicKey {
    /// Interpret as Ed25519 public key bytes if length is 32.
    pub fn as_ed25519_bytes(&self) -> Option<[u8; 32]> {
        if self.0.len() != 32 {
            return None;
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&self.0);
        Some(out)
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

/// Stable unique identifier for a state lineage (16 random bytes).
///
/// Assigned once at creation and carried unchanged across every update of
/// the same fact.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct UniqueId([u8; 16]);

impl UniqueId {
    /// Construct from raw bytes.
    pub fn from_bytes(b: [u8; 16]) -> Self {
        Self(b)
    }
    /// Return bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        use ring::rand::{SecureRandom, SystemRandom};
        let mut b = [0u8; 16];
        // SystemRandom failure leaves the zero id; callers treat ids as opaque.
        let _ = SystemRandom::new().fill(&mut b);
        Self(b)
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Canonical map type alias.
pub type CanonicalMap<K, V> = BTreeMap<K, V>;

/// Node configuration root.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Node settings.
    pub node: NodeSettings,
    /// Local responder policy settings.
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Node settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Human-readable party name.
    pub name: String,
    /// Data directory (vault db + identity key).
    pub data_dir: String,
}

/// Responder policy settings. These are private to the node and may differ
/// between parties.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum IOU value this node will countersign.
    #[serde(default = "default_iou_ceiling")]
    pub iou_ceiling: u64,
}

fn default_iou_ceiling() -> u64 {
    100
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            iou_ceiling: default_iou_ceiling(),
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io")]
    Io,
    #[error("config parse")]
    Parse,
}

impl NodeConfig {
    /// Load a TOML configuration file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::Io)?;
        toml::from_str(&raw).map_err(|_| ConfigError::Parse)
    }
}
