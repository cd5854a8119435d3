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

//! Flow progress checkpoints.
//!
//! Each flow advances through a fixed, linear sequence of stages. The
//! tracker publishes the current stage on a watch channel for observers;
//! control flow never reads it back.

use std::fmt::Debug;
use thiserror::Error;
use tokio::sync::watch;

/// Progress errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgressError {
    /// Attempted to move to an earlier or equal stage.
    #[error("out-of-order stage transition")]
    OutOfOrder,
}

/// Ordered checkpoints of an initiating flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum InitiatorStage {
    /// Obtaining accounts and fresh keys for new participants.
    Acquiring,
    /// Building a new transaction.
    Building,
    /// Verifying the proposal against the validity engine.
    Verifying,
    /// Signing the transaction with locally held keys.
    Signing,
    /// Collecting counterparty signatures.
    Collecting,
    /// Obtaining notary acceptance and recording the transaction.
    Finalising,
    /// Terminal.
    Done,
}

/// Ordered checkpoints of a responding flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResponderStage {
    /// Awaiting the proposed transaction.
    Receiving,
    /// Re-verifying and applying local acceptance policy.
    Checking,
    /// Countersigning.
    Signing,
    /// Awaiting the finalized transaction.
    AwaitingFinality,
    /// Terminal.
    Done,
}

/// Publishes a flow's current stage. Transitions must move strictly
/// forward; stages may be skipped (a single-party flow never collects).
pub struct ProgressTracker<S: Copy + Ord + Debug> {
    tx: watch::Sender<S>,
}

impl<S: Copy + Ord + Debug> ProgressTracker<S> {
    /// Create a tracker starting at `initial`.
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Receiver for observers of the current stage.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Current stage.
    pub fn current(&self) -> S {
        *self.tx.borrow()
    }

    /// Advance to a strictly later stage.
    pub fn advance(&self, next: S) -> Result<(), ProgressError> {
        if next <= self.current() {
            return Err(ProgressError::OutOfOrder);
        }
        // Receivers may all be dropped; progress is observability only.
        let _ = self.tx.send(next);
        Ok(())
    }
}
