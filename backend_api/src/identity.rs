//! Platform identity database
//!
//! Numeric owner/group ids map to names and back through this trait.
//! `Ok(None)` is the recognized "no such identity" answer; `Err` is a
//! fatal database failure. The bridge decides per call site whether a
//! missing answer is absorbed (stat) or fatal (ownership change).

use std::collections::BTreeMap;

use crate::error::BackendError;

/// Identity lookup capability
pub trait IdentityDatabase {
    /// Resolves a numeric owner id to a name
    fn user_name(&self, uid: u32) -> Result<Option<String>, BackendError>;

    /// Resolves a numeric group id to a name
    fn group_name(&self, gid: u32) -> Result<Option<String>, BackendError>;

    /// Resolves an owner name to its numeric id
    fn user_id(&self, name: &str) -> Result<Option<u32>, BackendError>;

    /// Resolves a group name to its numeric id
    fn group_id(&self, name: &str) -> Result<Option<u32>, BackendError>;
}

/// In-memory identity database
///
/// Resolved once at startup and threaded through the bridge explicitly;
/// there is no process-wide cached lookup state.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityTable {
    users: BTreeMap<u32, String>,
    groups: BTreeMap<u32, String>,
}

impl StaticIdentityTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user entry
    pub fn with_user(mut self, uid: u32, name: impl Into<String>) -> Self {
        self.users.insert(uid, name.into());
        self
    }

    /// Adds a group entry
    pub fn with_group(mut self, gid: u32, name: impl Into<String>) -> Self {
        self.groups.insert(gid, name.into());
        self
    }
}

impl IdentityDatabase for StaticIdentityTable {
    fn user_name(&self, uid: u32) -> Result<Option<String>, BackendError> {
        Ok(self.users.get(&uid).cloned())
    }

    fn group_name(&self, gid: u32) -> Result<Option<String>, BackendError> {
        Ok(self.groups.get(&gid).cloned())
    }

    fn user_id(&self, name: &str) -> Result<Option<u32>, BackendError> {
        Ok(self
            .users
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(uid, _)| *uid))
    }

    fn group_id(&self, name: &str) -> Result<Option<u32>, BackendError> {
        Ok(self
            .groups
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(gid, _)| *gid))
    }
}
