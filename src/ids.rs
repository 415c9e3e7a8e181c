//! Typed identifiers for brokers, namespaces, and bundles.
//!
//! The coordination-store layout keys everything off plain strings, but the
//! core never manipulates those strings directly: mixing up a broker's
//! advertised name and a bundle path at a call site is exactly the kind of
//! bug a newtype should make impossible.

// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// A broker's advertised name, `<host>:<webServicePort>`.
///
/// This is the key used under `/loadbalance/brokers/<advertised>` and
/// `/loadbalance/broker-time-average/<advertised>` (§6).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BrokerId(String);

impl BrokerId {
    /// Build the advertised name from a host and web service port.
    pub fn advertised(host: impl AsRef<str>, web_service_port: u16) -> Self {
        Self(format!("{}:{}", host.as_ref(), web_service_port))
    }

    /// Wrap an already-formatted advertised name (e.g. read back from the store).
    pub fn from_advertised(advertised: impl Into<String>) -> Self {
        Self(advertised.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BrokerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `<tenant>/<namespace>` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NamespaceName(String);

impl NamespaceName {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self(namespace.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bundle identifier, `<namespace>/<bundleRange>` (§6).
///
/// `bundleRange` is defined as the substring after the *last* `/`, so a
/// namespace name containing no slashes beyond `tenant/namespace` splits
/// cleanly.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BundleId(String);

impl BundleId {
    /// Build a bundle id from its namespace and hash-range string, e.g.
    /// `0x00000000_0x80000000`.
    pub fn new(namespace: &NamespaceName, bundle_range: impl AsRef<str>) -> Self {
        Self(format!("{}/{}", namespace.as_str(), bundle_range.as_ref()))
    }

    /// Wrap an already-formatted `<namespace>/<bundleRange>` key.
    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace portion, i.e. everything before the last `/`.
    pub fn namespace(&self) -> NamespaceName {
        match self.0.rfind('/') {
            Some(idx) => NamespaceName::new(&self.0[..idx]),
            None => NamespaceName::new(self.0.clone()),
        }
    }

    /// The bundle-range portion, i.e. the substring after the last `/`.
    pub fn range(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[idx + 1..],
            None => &self.0,
        }
    }
}

impl Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
