//! Host identifiers and filename validation.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Returns true if `name` can be used as a single path component.
fn is_single_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

/// Checks that a filename names an entry directly inside a host directory.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidFilename`] for empty names, `.`/`..`, or
/// names containing a path separator.
pub fn validate_filename(name: &str) -> ProtocolResult<()> {
    if is_single_component(name) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidFilename(name.to_string()))
    }
}

/// Identifier under which one client's file set is tracked.
///
/// On the server this is the name of a subdirectory of the storage root; on
/// the client it defaults to the machine hostname. Both sides must agree on
/// the format for reconciliation to find the right row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HostId(String);

impl HostId {
    /// Creates a host id, rejecting values that are not a single path component.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidHostId`] if the value is empty, `.`,
    /// `..`, or contains a path separator.
    pub fn new(id: impl Into<String>) -> ProtocolResult<Self> {
        let id = id.into();
        if is_single_component(&id) {
            Ok(Self(id))
        } else {
            Err(ProtocolError::InvalidHostId(id))
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for HostId {
    type Error = ProtocolError;

    fn try_from(value: String) -> ProtocolResult<Self> {
        Self::new(value)
    }
}

impl From<HostId> for String {
    fn from(id: HostId) -> Self {
        id.0
    }
}

impl AsRef<str> for HostId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
