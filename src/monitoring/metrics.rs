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

use prometheus::{IntCounter, IntGauge, Registry};
use thiserror::Error;

/// Metrics errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus")]
    Prom,
}

/// Metrics container.
#[derive(Clone)]
pub struct Metrics {
    /// Registry.
    pub registry: Registry,

    /// Flows started (initiating side).
    pub flows_started_total: IntCounter,
    /// Flows that reached a committed outcome.
    pub flows_committed_total: IntCounter,
    /// Flows that aborted, for any reason.
    pub flows_aborted_total: IntCounter,
    /// Aborts caused by a notary input-consumption conflict.
    pub notary_conflicts_total: IntCounter,
    /// Proposals refused by a counterparty's private policy.
    pub counterparty_rejections_total: IntCounter,
    /// Committed states currently recorded (optional wiring).
    pub states_recorded: IntGauge,
}

impl Metrics {
    /// Create and register metrics.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let flows_started_total =
            IntCounter::new("concordat_flows_started_total", "Flows started")
                .map_err(|_| MetricsError::Prom)?;
        let flows_committed_total =
            IntCounter::new("concordat_flows_committed_total", "Flows committed")
                .map_err(|_| MetricsError::Prom)?;
        let flows_aborted_total =
            IntCounter::new("concordat_flows_aborted_total", "Flows aborted")
                .map_err(|_| MetricsError::Prom)?;
        let notary_conflicts_total = IntCounter::new(
            "concordat_notary_conflicts_total",
            "Aborts due to notary input conflicts",
        )
        .map_err(|_| MetricsError::Prom)?;
        let counterparty_rejections_total = IntCounter::new(
            "concordat_counterparty_rejections_total",
            "Proposals refused by counterparty policy",
        )
        .map_err(|_| MetricsError::Prom)?;
        let states_recorded =
            IntGauge::new("concordat_states_recorded", "Committed states recorded")
                .map_err(|_| MetricsError::Prom)?;

        registry
            .register(Box::new(flows_started_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(flows_committed_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(flows_aborted_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(notary_conflicts_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(counterparty_rejections_total.clone()))
            .map_err(|_| MetricsError::Prom)?;
        registry
            .register(Box::new(states_recorded.clone()))
            .map_err(|_| MetricsError::Prom)?;

        Ok(Self {
            registry,
            flows_started_total,
            flows_committed_total,
            flows_aborted_total,
            notary_conflicts_total,
            counterparty_rejections_total,
            states_recorded,
        })
    }
}
