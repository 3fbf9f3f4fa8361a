//! Peer entry ("elastic address"): identity plus network endpoint.

use crate::PeerDirectoryError;
use eg_01_elastic_grid::{define_coordinates, Elastic3D, ElasticLayout};
use shared_types::Address;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Scheme prefix of the textual peer form.
pub const ENODE_PREFIX: &str = "enode://";

/// A known peer: account address and the TCP endpoint it listens on.
///
/// Textual form: `enode://<address>@<host>:<port>`.
#[derive(Clone, Debug)]
pub struct PeerEntry {
    pub address: Address,
    pub host: String,
    pub port: u16,
}

impl PeerEntry {
    pub fn new(address: Address, host: impl Into<String>, port: u16) -> Self {
        Self {
            address,
            host: host.into(),
            port,
        }
    }

    /// Parse `enode://<address>@<host>:<port>`. The prefix is optional.
    pub fn from_enode(enode: &str) -> Result<Self, PeerDirectoryError> {
        let trimmed = enode.trim();
        let body = trimmed.strip_prefix(ENODE_PREFIX).unwrap_or(trimmed);

        let (address, endpoint) = body
            .split_once('@')
            .ok_or_else(|| PeerDirectoryError::InvalidEnode(enode.to_string()))?;
        let (host, port) = endpoint
            .rsplit_once(':')
            .ok_or_else(|| PeerDirectoryError::InvalidEnode(enode.to_string()))?;

        if host.is_empty() {
            return Err(PeerDirectoryError::InvalidEnode(enode.to_string()));
        }

        let address = Address::from_hex(address)
            .map_err(|_| PeerDirectoryError::InvalidAddress(address.to_string()))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| PeerDirectoryError::InvalidPort(port.to_string()))?;

        Ok(Self::new(address, host, port))
    }

    /// Render the enode form.
    pub fn to_enode(&self) -> String {
        self.to_string()
    }

    /// `host:port`, suitable for a socket connect.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when this peer listens on `host:port` (host compared case-insensitively).
    pub fn has_endpoint(&self, host: &str, port: u16) -> bool {
        self.port == port && self.host.eq_ignore_ascii_case(host)
    }

    /// Grid cell of this peer under `layout`.
    pub fn coordinates(&self, layout: &ElasticLayout) -> Elastic3D {
        define_coordinates(layout, &self.address)
    }
}

impl PartialEq for PeerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address && self.has_endpoint(&other.host, other.port)
    }
}

impl Eq for PeerEntry {}

impl Hash for PeerEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state);
        self.host.to_ascii_lowercase().hash(state);
        self.port.hash(state);
    }
}

impl FromStr for PeerEntry {
    type Err = PeerDirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_enode(s)
    }
}

impl fmt::Display for PeerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ENODE_PREFIX}{}@{}:{}", self.address, self.host, self.port)
    }
}
