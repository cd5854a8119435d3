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

//! Key service: Ed25519 signing and verification for a party.
//!
//! Each party holds one file-backed identity key (`party.key`, PKCS#8,
//! written atomically with 0600 permissions) plus fresh in-memory keys
//! issued per account. Signing and verification are consumed as opaque
//! capabilities by the flows; key material never leaves this module.

use crate::core::ledger::states::AccountInfo;
use crate::core::ledger::transaction::{tx_signing_bytes, SignedTransaction};
use crate::core::types::{PublicKey, Signature, UniqueId};
use ring::{
    rand::SystemRandom,
    signature::{Ed25519KeyPair, KeyPair, UnparsedPublicKey, ED25519},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};
use thiserror::Error;
use zeroize::Zeroize;

/// Key service errors.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Filesystem failure while reading or writing key material.
    #[error("io")]
    Io,
    /// The key file is not a valid Ed25519 PKCS#8 document.
    #[error("invalid key encoding")]
    InvalidKey,
    /// No identity key on disk and generation is disabled.
    #[error("identity key missing (production refuses to generate one)")]
    MissingKey,
    /// Key generation or signing failed inside ring.
    #[error("crypto")]
    Crypto,
    /// This party does not hold the private key for the requested public key.
    #[error("no private key held for the requested public key")]
    UnknownKey,
    /// The account is hosted by another party; its key cannot be issued here.
    #[error("account is hosted by another party")]
    ForeignHost,
    /// Signature verification failed.
    #[error("bad signature")]
    BadSignature,
    /// The transaction could not be canonically encoded.
    #[error("codec")]
    Codec,
    /// Internal lock failure.
    #[error("lock poisoned")]
    Lock,
}

/// Signer backend abstraction (HSM compatible).
pub trait SignerBackend: Send + Sync {
    /// Public key of this backend.
    fn public_key(&self) -> PublicKey;
    /// Sign message bytes.
    fn sign(&self, msg: &[u8]) -> Result<Signature, KeyError>;
}

fn set_private_perms_best_effort(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
}

/// Atomic write to disk (best-effort fsync, then rename).
fn atomic_write_private(path: &Path, bytes: &[u8]) -> Result<(), KeyError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|_| KeyError::Io)?;
    }

    let mut tmp = path.to_path_buf();
    tmp.set_extension("tmp");

    {
        let mut f = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .map_err(|_| KeyError::Io)?;
        f.write_all(bytes).map_err(|_| KeyError::Io)?;
        let _ = f.sync_all();
    }

    set_private_perms_best_effort(&tmp);
    fs::rename(&tmp, path).map_err(|_| KeyError::Io)?;
    set_private_perms_best_effort(path);
    Ok(())
}

fn public_of(kp: &Ed25519KeyPair) -> PublicKey {
    PublicKey(kp.public_key().as_ref().to_vec())
}

/// File-backed Ed25519 identity backend.
pub struct FileEd25519Backend {
    keypair: Ed25519KeyPair,
}

impl FileEd25519Backend {
    /// Load an Ed25519 PKCS#8 key file, generating one if absent.
    ///
    /// Production builds refuse to generate: the identity key must be
    /// provisioned out of band (see `bin/keygen`).
    pub fn load_or_create(path: &Path) -> Result<Self, KeyError> {
        if path.exists() {
            let bytes = fs::read(path).map_err(|_| KeyError::Io)?;
            let kp = Ed25519KeyPair::from_pkcs8(&bytes).map_err(|_| KeyError::InvalidKey)?;
            return Ok(Self { keypair: kp });
        }

        if cfg!(feature = "production") {
            return Err(KeyError::MissingKey);
        }

        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| KeyError::InvalidKey)?;

        let mut buf = pkcs8.as_ref().to_vec();
        atomic_write_private(path, &buf)?;
        buf.zeroize();

        let kp = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).map_err(|_| KeyError::InvalidKey)?;
        Ok(Self { keypair: kp })
    }
}

impl SignerBackend for FileEd25519Backend {
    fn public_key(&self) -> PublicKey {
        public_of(&self.keypair)
    }

    fn sign(&self, msg: &[u8]) -> Result<Signature, KeyError> {
        Ok(Signature(self.keypair.sign(msg).as_ref().to_vec()))
    }
}

/// In-memory Ed25519 backend for per-account keys.
pub struct InMemoryEd25519 {
    keypair: Ed25519KeyPair,
}

impl InMemoryEd25519 {
    /// Generate a fresh keypair.
    pub fn generate() -> Result<Self, KeyError> {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| KeyError::Crypto)?;
        let kp = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).map_err(|_| KeyError::Crypto)?;
        Ok(Self { keypair: kp })
    }
}

impl SignerBackend for InMemoryEd25519 {
    fn public_key(&self) -> PublicKey {
        public_of(&self.keypair)
    }

    fn sign(&self, msg: &[u8]) -> Result<Signature, KeyError> {
        Ok(Signature(self.keypair.sign(msg).as_ref().to_vec()))
    }
}

/// Per-party key service.
pub struct KeyService {
    node: FileEd25519Backend,
    accounts: Mutex<BTreeMap<UniqueId, InMemoryEd25519>>,
}

impl KeyService {
    /// Open the service, loading (or creating) `data_dir/party.key`.
    pub fn open(data_dir: &str) -> Result<Self, KeyError> {
        let mut key_path = PathBuf::from(data_dir);
        key_path.push("party.key");
        let node = FileEd25519Backend::load_or_create(&key_path)?;
        Ok(Self {
            node,
            accounts: Mutex::new(BTreeMap::new()),
        })
    }

    /// The party's identity key.
    pub fn node_identity(&self) -> PublicKey {
        self.node.public_key()
    }

    /// Issue (or return the already issued) key for an account hosted here.
    /// Refuses accounts hosted by another party.
    pub fn request_key(&self, account: &AccountInfo) -> Result<PublicKey, KeyError> {
        if account.host != self.node.public_key() {
            return Err(KeyError::ForeignHost);
        }
        let mut guard = self.accounts.lock().map_err(|_| KeyError::Lock)?;
        if let Some(backend) = guard.get(&account.identifier) {
            return Ok(backend.public_key());
        }
        let backend = InMemoryEd25519::generate()?;
        let pk = backend.public_key();
        guard.insert(account.identifier, backend);
        Ok(pk)
    }

    /// Sign with the private key behind `key`, if this party holds it.
    pub fn sign(&self, key: &PublicKey, msg: &[u8]) -> Result<Signature, KeyError> {
        if &self.node.public_key() == key {
            return self.node.sign(msg);
        }
        let guard = self.accounts.lock().map_err(|_| KeyError::Lock)?;
        for backend in guard.values() {
            if &backend.public_key() == key {
                return backend.sign(msg);
            }
        }
        Err(KeyError::UnknownKey)
    }

    /// Every public key this party can sign for.
    pub fn held_keys(&self) -> Result<BTreeSet<PublicKey>, KeyError> {
        let guard = self.accounts.lock().map_err(|_| KeyError::Lock)?;
        let mut keys: BTreeSet<PublicKey> =
            guard.values().map(|b| b.public_key()).collect();
        keys.insert(self.node.public_key());
        Ok(keys)
    }
}

/// Verify an Ed25519 signature given raw public key bytes.
pub fn verify_pubkey_bytes(pk: &PublicKey, msg: &[u8], sig: &Signature) -> Result<(), KeyError> {
    let bytes = pk.as_ed25519_bytes().ok_or(KeyError::BadSignature)?;
    // ring requires signature length 64 for Ed25519.
    if sig.0.len() != 64 {
        return Err(KeyError::BadSignature);
    }
    let pk = UnparsedPublicKey::new(&ED25519, bytes);
    pk.verify(msg, &sig.0).map_err(|_| KeyError::BadSignature)
}

/// Verify every signature attached to a transaction against its id.
pub fn verify_attached_signatures(stx: &SignedTransaction) -> Result<(), KeyError> {
    let id = stx.id().map_err(|_| KeyError::Codec)?;
    let msg = tx_signing_bytes(id);
    for (key, sig) in stx.signatures.iter() {
        verify_pubkey_bytes(key, &msg, sig)?;
    }
    Ok(())
}
