//! Connectivity gate.
//!
//! Two states, online and offline. While offline every mutating store
//! operation is refused up front with [`Error::Offline`]; nothing is queued
//! and nothing is replayed when the network comes back. The gate only
//! reflects the last network-status signal and persists nothing.

use std::fmt;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Online,
    Offline,
}

/// Result of feeding a network-status signal into the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    WentOffline,
    Restored,
}

/// Every store entry point that the gate guards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Create(EntityKind),
    Edit(EntityKind),
    Delete(EntityKind),
    Restore,
    Purge,
    Import,
    FactoryReset,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Create(kind) => write!(f, "creating a {}", kind.tag()),
            Mutation::Edit(kind) => write!(f, "editing a {}", kind.tag()),
            Mutation::Delete(kind) => write!(f, "deleting a {}", kind.tag()),
            Mutation::Restore => f.write_str("restoring from the trash"),
            Mutation::Purge => f.write_str("permanently deleting"),
            Mutation::Import => f.write_str("importing a backup"),
            Mutation::FactoryReset => f.write_str("resetting the database"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectivityGate {
    state: Connectivity,
}

impl ConnectivityGate {
    pub fn new(online: bool) -> Self {
        Self {
            state: if online {
                Connectivity::Online
            } else {
                Connectivity::Offline
            },
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn state(&self) -> Connectivity {
        self.state
    }

    pub fn is_online(&self) -> bool {
        self.state == Connectivity::Online
    }

    /// Apply a network-status signal
    pub fn set_online(&mut self, online: bool) -> Transition {
        let next = if online {
            Connectivity::Online
        } else {
            Connectivity::Offline
        };
        if next == self.state {
            return Transition::Unchanged;
        }
        self.state = next;
        match next {
            Connectivity::Offline => {
                tracing::warn!("network lost; modifications disabled");
                Transition::WentOffline
            }
            Connectivity::Online => {
                tracing::info!("network restored");
                Transition::Restored
            }
        }
    }

    /// Precondition for every mutating operation
    pub fn ensure_online(&self, mutation: Mutation) -> Result<()> {
        if self.is_online() {
            Ok(())
        } else {
            tracing::debug!(action = %mutation, "mutation refused while offline");
            Err(Error::Offline(mutation))
        }
    }
}

impl Default for ConnectivityGate {
    fn default() -> Self {
        Self::online()
    }
}

/// Source of the network-status signal
pub trait NetworkProbe {
    fn is_online(&self) -> bool;
}

/// Fixed answer, for flags and tests
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl NetworkProbe for StaticProbe {
    fn is_online(&self) -> bool {
        self.0
    }
}

/// Online when a TCP connection to `addr` opens within `timeout`
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    fn resolve(&self) -> Option<SocketAddr> {
        self.addr.to_socket_addrs().ok()?.next()
    }
}

impl NetworkProbe for TcpProbe {
    fn is_online(&self) -> bool {
        match self.resolve() {
            Some(addr) => TcpStream::connect_timeout(&addr, self.timeout).is_ok(),
            None => false,
        }
    }
}
