//! # broker-loadmgr - Modular Load Manager for a Pub/Sub Broker Fleet
//!
//! Fleet-wide load aggregation, bundle placement, and load shedding for a
//! distributed pub/sub broker cluster, modeled on a modular load-manager
//! architecture: pluggable namespace policies, broker filters, a placement
//! strategy, and shedding strategies around one shared, watchable
//! coordination-store view.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use broker_loadmgr::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker_id = BrokerId::advertised("broker-1.example.com", 8080);
//!     let manager = LoadManager::new(
//!         broker_id,
//!         "http://broker-1.example.com:8080",
//!         "1.0.0",
//!         MemoryCoordinationStore::new(),
//!         my_host_probe,
//!         my_bundle_stats_source,
//!         my_namespace_policy,
//!         vec![Box::new(VersionFilter)],
//!         LeastResourceUsageStrategy,
//!         vec![Box::new(OverloadedBrokerStrategy)],
//!         my_admin_client,
//!         NoopMonitor::new(),
//!         LoadManagerConfig::default(),
//!     );
//!
//!     manager.start().await?;
//!     let broker = manager.select_broker_for_assignment(&bundle_id).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Core Concepts
//!
//! ## Reporting and Aggregation
//! - Each broker samples its own resource usage and bundle traffic and
//!   publishes it conditionally, gated by a publish predicate that mixes an
//!   absolute percentage-point gap with relative percent-change thresholds.
//! - A single-worker scheduler drains membership and broker-data change
//!   notifications serially, so the fleet-wide view is never torn by
//!   interleaved mutation.
//!
//! ## Placement
//! - `selectBrokerForAssignment` composes a namespace/tenant policy,
//!   anti-affinity shaping, an ordered filter pipeline, and a scoring
//!   strategy, with an overload guard that re-scores once over the full
//!   policy-compliant set if the chosen broker is already overloaded.
//! - Placement decisions are idempotent: a bundle already preallocated
//!   returns its existing owner without re-running the pipeline.
//!
//! ## Shedding
//! - A pluggable ordered list of shedding strategies proposes
//!   `bundle → broker` unload pairs for overloaded brokers, respecting a
//!   grace period so a just-unloaded bundle isn't immediately re-proposed.
//!
//! # Module Organization
//!
//! ## Core
//! - [`manager`] - `LoadManager`: wires every component and exposes the
//!   broker-facing lifecycle and query operations
//! - [`ids`] - Typed identifiers (`BrokerId`, `NamespaceName`, `BundleId`)
//! - [`model`] - Rolling windows, per-bundle and per-broker state, the
//!   fleet-wide `LoadView`
//! - [`config`] - `LoadManagerConfig` with validated defaults
//!
//! ## Reporting and Aggregation
//! - [`reporter`] - Samples and conditionally publishes this broker's report
//! - [`aggregator`] - Builds and maintains the fleet-wide `LoadView`
//! - [`scheduler`] - Single-worker task queue serializing aggregator reactions
//! - [`watch`] - Long-lived coordination-store subscriptions feeding the
//!   scheduler
//! - [`hydrate`] - Shared bundle-stats hydration used by both the aggregator
//!   and the placement pipeline
//!
//! ## Placement and Shedding
//! - [`placement`] - `selectBrokerForAssignment` and its pluggable policies,
//!   filters, and strategy
//! - [`shedding`] - The shedding loop and its pluggable strategies
//!
//! ## Infrastructure
//! - [`store`] - Typed coordination-store adapter and in-memory
//!   implementation
//! - [`observability`] - `Monitor<E>` event-recording abstraction and the
//!   load manager's own event vocabulary
//! - [`error`] - Crate-level error type unioning every component's error
//! - [`util`] - Small serde helpers shared across modules
//!
//! # Architecture Principles
//!
//! ## Single Writer, Shared Read
//! - The aggregator, placement pipeline, and shedder all share one
//!   `Arc<Mutex<LoadView>>` (the "placement mutex"); the aggregator holds it
//!   only per-operation, placement holds it for the whole of
//!   `selectBrokerForAssignment`, and the shedder releases it before making
//!   any admin RPC.
//!
//! ## Pluggable, Not `dyn`-Happy
//! - Generic type parameters are used wherever exactly one strategy is
//!   configured per component (`NamespacePolicy`, `PlacementStrategy`);
//!   `Box<dyn _>` is reserved for genuinely open, ordered plugin lists
//!   (`BrokerFilter`, `LoadSheddingStrategy`).
//!
//! ## No Second Logging Channel
//! - Every observable decision point is recorded through the single
//!   `Monitor<LoadManagerEvent>` abstraction; there is no separate tracing
//!   layer to keep in sync with it.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod hydrate;
pub mod ids;
pub mod manager;
pub mod model;
pub mod observability;
pub mod placement;
pub mod prelude;
pub mod reporter;
pub mod scheduler;
pub mod shedding;
pub mod store;
pub mod util;
pub mod watch;

pub use config::{ConfigError, LoadManagerConfig};
pub use error::LoadManagerError;
pub use ids::{BrokerId, BundleId, NamespaceName};
pub use manager::LoadManager;
pub use model::LoadView;
pub use observability::{InMemoryMonitor, LoadManagerEvent, Monitor, MonitoringSnapshot, NoopMonitor};
pub use store::{CoordinationStore, CreateMode, MemoryCoordinationStore, StoreError};
