//! Caller identity and group-based visibility.
//!
//! A bearer token resolves to a userid, the userid resolves to its groups, and
//! the groups decide whose tasks the caller may list. Nothing here rejects a
//! caller: unknown tokens and userids fall back to the guest identity.

pub mod directory;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub use directory::{AuthDirectory, Credential, DirectoryError, GroupMembership};

/// Userid assigned to callers without a recognized token
pub const GUEST_USERID: &str = "guest";

/// Group assigned to userids without any membership
pub const GUEST_GROUP: &str = "Guests";

/// Per-request identity, derived from the bearer token and never persisted.
/// `userid` is never empty and `groups` always holds at least one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub userid: String,
    pub groups: BTreeSet<String>,
}

impl AuthContext {
    /// Resolve a full context from an optional bearer token
    pub fn resolve(directory: &AuthDirectory, token: Option<&str>) -> Self {
        let userid = directory.resolve_userid(token);
        let groups = directory.resolve_groups(Some(&userid));
        Self { userid, groups }
    }

    pub fn guest() -> Self {
        Self {
            userid: GUEST_USERID.to_string(),
            groups: BTreeSet::from([GUEST_GROUP.to_string()]),
        }
    }

    /// Owners whose tasks this caller may list: every member of every group
    /// the caller belongs to, plus the caller itself.
    pub fn visible_owners(&self, directory: &AuthDirectory) -> BTreeSet<String> {
        let mut owners = directory.visible_owners(&self.groups);
        owners.insert(self.userid.clone());
        owners
    }
}
