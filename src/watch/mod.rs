//! Membership and broker-data watchers (§4.2): long-lived coordination-store
//! subscriptions that enqueue work onto the scheduler and never mutate
//! shared state from the delivery thread.

mod broker_data;
mod membership;

pub use broker_data::BrokerDataWatcherPool;
pub use membership::spawn_membership_watcher;
