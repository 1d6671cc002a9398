//! Identifier types shared by the E2AP codec, the RMR transport and the xApp core

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Maximum length of an E2 node name carried in the RMR MEID field.
pub const MAX_MEID_LEN: usize = 32;

/// E2 node identifier (the RMR managed entity id, e.g. `gnb_734_733_b5c67788`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct E2NodeId(String);

impl E2NodeId {
    /// Creates a node id, rejecting empty names and names longer than [`MAX_MEID_LEN`] bytes.
    pub fn new(name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Validation("E2 node id must not be empty".to_string()));
        }
        if name.len() > MAX_MEID_LEN {
            return Err(Error::Validation(format!(
                "E2 node id '{name}' is {} bytes, maximum is {MAX_MEID_LEN}",
                name.len()
            )));
        }
        Ok(Self(name))
    }

    /// Returns the node name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for E2NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for E2NodeId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for E2NodeId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<E2NodeId> for String {
    fn from(id: E2NodeId) -> Self {
        id.0
    }
}

/// RIC request id: requestor id chosen by the xApp plus a per-request instance id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RicRequestId {
    /// RIC requestor id (identifies the xApp)
    pub requestor_id: u16,
    /// RIC instance id (identifies the request within the requestor)
    pub instance_id: u16,
}

impl RicRequestId {
    /// Creates a new RIC request id.
    pub const fn new(requestor_id: u16, instance_id: u16) -> Self {
        Self {
            requestor_id,
            instance_id,
        }
    }
}

impl fmt::Display for RicRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.requestor_id, self.instance_id)
    }
}
