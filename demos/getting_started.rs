//! Getting Started Example - Your First Load Manager
//!
//! Demonstrates the complete workflow: wire a `LoadManager` with an
//! in-memory coordination store and trivial collaborator stubs, start it,
//! and place one bundle.
//!
//! Run with: cargo run --example getting_started

use std::collections::HashMap;

use async_trait::async_trait;
use broker_loadmgr::prelude::*;
use broker_loadmgr::reporter::ReporterError;

/// A host probe reporting fixed, light resource usage.
struct FixedProbe;

#[async_trait]
impl HostResourceProbe for FixedProbe {
    async fn sample(&self) -> Result<SystemResourceUsage, ReporterError> {
        Ok(SystemResourceUsage {
            cpu: 0.15,
            memory: 0.10,
            direct_memory: 0.0,
            bandwidth_in: 0.05,
            bandwidth_out: 0.05,
        })
    }
}

/// A bundle-stats source with nothing hosted yet.
struct EmptyBundles;

#[async_trait]
impl LocalBundleStatsSource for EmptyBundles {
    async fn snapshot(&self) -> Result<HashMap<BundleId, broker_loadmgr::model::NamespaceBundleStats>, ReporterError> {
        Ok(HashMap::new())
    }
}

/// A namespace policy admitting every broker in the fleet.
struct AllowAll;

#[async_trait]
impl NamespacePolicy for AllowAll {
    async fn candidate_brokers(
        &self,
        _bundle: &BundleId,
        all_brokers: &[BrokerId],
    ) -> Result<Vec<BrokerId>, broker_loadmgr::placement::PlacementError> {
        Ok(all_brokers.to_vec())
    }
}

/// An admin client that pretends every unload RPC succeeds.
struct NoopAdmin;

#[async_trait]
impl AdminClient for NoopAdmin {
    async fn unload_namespace_bundle(
        &self,
        _bundle: &BundleId,
        _broker: &BrokerId,
    ) -> Result<(), broker_loadmgr::shedding::SheddingError> {
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Getting Started Example ===\n");

    let broker_id = BrokerId::advertised("broker-1.example.com", 8080);
    let manager = LoadManager::new(
        broker_id.clone(),
        "http://broker-1.example.com:8080",
        "1.0.0",
        MemoryCoordinationStore::new(),
        FixedProbe,
        EmptyBundles,
        AllowAll,
        vec![Box::new(VersionFilter)],
        LeastResourceUsageStrategy,
        vec![Box::new(OverloadedBrokerStrategy)],
        NoopAdmin,
        NoopMonitor::new(),
        LoadManagerConfig::default(),
    );

    println!("1. Starting load manager for {broker_id}...");
    manager.start().await?;
    println!("   Registered and aggregation loop running\n");

    let namespace = NamespaceName::new("tenant1/ns1");
    let bundle = BundleId::new(&namespace, "0x00000000_0x80000000");

    println!("2. Placing bundle {bundle}...");
    let chosen = manager.select_broker_for_assignment(&bundle).await?;
    println!("   Assigned to {chosen}\n");

    println!("3. Repeating the same placement is idempotent...");
    let again = manager.select_broker_for_assignment(&bundle).await?;
    println!("   Still assigned to {again}\n");

    println!("4. Shutting down...");
    manager.stop().await;

    println!("\n=== Example Complete ===");
    Ok(())
}
