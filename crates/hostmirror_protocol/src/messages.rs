//! JSON wire messages exchanged over HTTP.

use crate::error::ProtocolResult;
use crate::host::HostId;
use crate::version_map::VersionMap;
use serde::{Deserialize, Serialize};

/// Body of a `check_updates` request.
///
/// The client reports its host id and, optionally, its own version map. The
/// server replies with the entries the client lacks or holds older copies
/// of. Reporting an empty map yields the host's full map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckUpdatesRequest {
    /// Reporting host.
    pub hostname: HostId,
    /// The client's current view of its files.
    #[serde(default)]
    pub files: VersionMap,
}

impl CheckUpdatesRequest {
    /// Creates a new request.
    pub fn new(hostname: HostId, files: VersionMap) -> Self {
        Self { hostname, files }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Error body returned by the server alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable message.
    pub error: String,
}

impl ErrorBody {
    /// Creates a new error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_updates_wire_format() {
        let request = CheckUpdatesRequest::new(
            HostId::new("alpha").unwrap(),
            [("a.txt", 10.0)].into_iter().collect(),
        );
        let json = String::from_utf8(request.encode().unwrap()).unwrap();
        assert_eq!(json, r#"{"hostname":"alpha","files":{"a.txt":10.0}}"#);
        assert_eq!(CheckUpdatesRequest::decode(json.as_bytes()).unwrap(), request);
    }

    #[test]
    fn files_default_to_empty() {
        let request = CheckUpdatesRequest::decode(br#"{"hostname":"alpha"}"#).unwrap();
        assert!(request.files.is_empty());
    }

    #[test]
    fn bad_hostname_is_rejected() {
        assert!(CheckUpdatesRequest::decode(br#"{"hostname":"..","files":{}}"#).is_err());
    }
}
