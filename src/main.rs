#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Concordat demo entrypoint.
//! Wires an in-process notary and two parties, creates their accounts, and
//! runs one committed and one policy-rejected IOU flow.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use concordat::core::flow::initiator::{initiate_creation, initiate_iou};
use concordat::core::flow::responder::{respond, IouValueCeiling};
use concordat::core::flow::session::Session;
use concordat::core::ledger::states::AccountType;
use concordat::core::services::keys::{FileEd25519Backend, SignerBackend};
use concordat::core::services::notary::Notary;
use concordat::core::services::registry::AccountRegistry;
use concordat::core::services::ServiceHub;
use concordat::core::types::{NodeConfig, PolicyConfig};
use concordat::monitoring::metrics::Metrics;
use tracing::{info, warn};

fn env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn open_notary(data_dir: &str) -> anyhow::Result<Arc<Notary>> {
    let mut key_path = PathBuf::from(data_dir);
    key_path.push("notary");
    key_path.push("party.key");
    let backend =
        FileEd25519Backend::load_or_create(&key_path).context("notary identity key")?;
    info!(notary = %backend.public_key(), "notary ready");
    Ok(Arc::new(Notary::new(&backend)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .compact()
        .try_init();

    let data_dir = env("CONCORDAT_DATA_DIR", "./data");

    // Policy is per-party; the demo reads bob's ceiling from config if given.
    let policy: PolicyConfig = match std::env::var("CONCORDAT_CONFIG") {
        Ok(path) => {
            let cfg = NodeConfig::load(&path).context("loading config")?;
            cfg.policy
        }
        Err(_) => PolicyConfig::default(),
    };

    let metrics = Arc::new(Metrics::new().context("metrics init")?);
    let registry = Arc::new(AccountRegistry::new());
    let notary = open_notary(&data_dir)?;

    let alice = Arc::new(ServiceHub::open(
        "alice",
        &format!("{data_dir}/alice"),
        registry.clone(),
        notary.clone(),
        metrics.clone(),
    )?);
    let bob = Arc::new(ServiceHub::open(
        "bob",
        &format!("{data_dir}/bob"),
        registry.clone(),
        notary.clone(),
        metrics.clone(),
    )?);

    info!(alice = %alice.identity(), bob = %bob.identity(), "parties ready");

    // Each party creates its own account on the ledger.
    let (alice_ref, _) = initiate_creation(&alice, "AliceCorp", AccountType::Bank).await?;
    let (bob_ref, _) = initiate_creation(&bob, "BobCorp", AccountType::Agent).await?;
    info!(alice_account = %alice_ref.txid, bob_account = %bob_ref.txid, "accounts committed");

    // A two-party IOU inside bob's ceiling commits on both vaults.
    let value: u64 = env("CONCORDAT_IOU_VALUE", "50").parse().unwrap_or(50);
    let (initiator_end, responder_end) = Session::pair(alice.identity(), bob.identity());
    let bob_task = {
        let bob = bob.clone();
        let ceiling = policy.iou_ceiling;
        tokio::spawn(async move {
            respond(&bob, responder_end, IouValueCeiling { max_value: ceiling }).await
        })
    };
    match initiate_iou(&alice, value, "AliceCorp", "BobCorp", vec![initiator_end]).await {
        Ok(stx) => info!(tx = %stx.id()?, value, "IOU committed"),
        Err(e) => warn!(error = %e, value, "IOU aborted"),
    }
    let _ = bob_task.await;

    // One above the ceiling aborts for everyone.
    let over = policy.iou_ceiling + 50;
    let (initiator_end, responder_end) = Session::pair(alice.identity(), bob.identity());
    let bob_task = {
        let bob = bob.clone();
        let ceiling = policy.iou_ceiling;
        tokio::spawn(async move {
            respond(&bob, responder_end, IouValueCeiling { max_value: ceiling }).await
        })
    };
    match initiate_iou(&alice, over, "AliceCorp", "BobCorp", vec![initiator_end]).await {
        Ok(stx) => info!(tx = %stx.id()?, value = over, "IOU committed"),
        Err(e) => warn!(error = %e, value = over, "IOU aborted"),
    }
    let _ = bob_task.await;

    metrics
        .states_recorded
        .set(alice.vault.state_count() as i64);
    info!(
        started = metrics.flows_started_total.get(),
        committed = metrics.flows_committed_total.get(),
        aborted = metrics.flows_aborted_total.get(),
        rejections = metrics.counterparty_rejections_total.get(),
        "demo finished"
    );
    Ok(())
}
