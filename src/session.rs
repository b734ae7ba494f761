//! Opaque caller identity for write gating.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one logical client connection.
///
/// Stable for the life of the connection; every call into the gated store and
/// the transaction coordinator carries one. The transport layer decides what
/// goes inside (an MCP session id, an HTTP connection token) — the core only
/// compares them for equality.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        SessionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        SessionId(s.to_string())
    }
}
