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

//! Concordat - multi-party ledger commit framework.
//!
//! This repository provides:
//! - Deterministic types & canonical encoding
//! - A pure validity engine re-run independently by every signer
//! - A transaction builder gated on verification
//! - Initiator/responder commit flows with explicit async suspension points
//! - In-process notary, key service, registry, and sled-backed vault
//! - Monitoring via Prometheus metrics and structured logging

/// Core protocol primitives (types, ledger model, flows, services).
pub mod core;
/// Observability (metrics, structured logging helpers).
pub mod monitoring;
