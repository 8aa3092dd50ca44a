//! Identity resolution
//!
//! Two policies share one database. Status building absorbs a missing
//! answer into the literal name `"unknown"`, because a stat must always
//! be producible even when identity metadata is inconsistent. Ownership
//! changes are strict: a name with no id is a reported failure, since
//! there is no sensible "unknown id" to write back.

use backend_api::IdentityDatabase;

use crate::error::BridgeError;

/// Name reported when the identity database has no answer for an id
pub const UNKNOWN_NAME: &str = "unknown";

/// Resolves an owner id to a name, falling back to `"unknown"`
pub fn owner_name<I: IdentityDatabase>(db: &I, uid: u32) -> Result<String, BridgeError> {
    match db.user_name(uid) {
        Ok(Some(name)) => Ok(name),
        Ok(None) => Ok(UNKNOWN_NAME.to_string()),
        Err(e) => Err(BridgeError::io("user_name", &e)),
    }
}

/// Resolves a group id to a name, falling back to `"unknown"`
pub fn group_name<I: IdentityDatabase>(db: &I, gid: u32) -> Result<String, BridgeError> {
    match db.group_name(gid) {
        Ok(Some(name)) => Ok(name),
        Ok(None) => Ok(UNKNOWN_NAME.to_string()),
        Err(e) => Err(BridgeError::io("group_name", &e)),
    }
}

/// Resolves an owner name to its id; unresolvable names are failures
pub fn user_id<I: IdentityDatabase>(db: &I, name: &str) -> Result<u32, BridgeError> {
    match db.user_id(name) {
        Ok(Some(uid)) => Ok(uid),
        Ok(None) => Err(BridgeError::Identity(format!("unknown username: {}", name))),
        Err(e) => Err(BridgeError::io("user_id", &e)),
    }
}

/// Resolves a group name to its id; unresolvable names are failures
pub fn group_id<I: IdentityDatabase>(db: &I, name: &str) -> Result<u32, BridgeError> {
    match db.group_id(name) {
        Ok(Some(gid)) => Ok(gid),
        Ok(None) => Err(BridgeError::Identity(format!(
            "unknown groupname: {}",
            name
        ))),
        Err(e) => Err(BridgeError::io("group_id", &e)),
    }
}
