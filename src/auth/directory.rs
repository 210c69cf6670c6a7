use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use super::{GUEST_GROUP, GUEST_USERID};

/// Errors while reading a credential or membership source
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One entry of the credential list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub userid: String,
    pub auth_token: String,
}

impl Credential {
    pub fn new(userid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            userid: userid.into(),
            auth_token: auth_token.into(),
        }
    }
}

/// One entry of the membership list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_name: String,
    #[serde(rename = "userids")]
    pub member_userids: Vec<String>,
}

impl GroupMembership {
    pub fn new<I, S>(group_name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_name: group_name.into(),
            member_userids: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Immutable lookup tables built once at startup.
///
/// Holds token -> userid, userid -> groups and the membership-list group -> members
/// direction used for visibility.
#[derive(Debug, Clone, Default)]
pub struct AuthDirectory {
    token_to_userid: HashMap<String, String>,
    userid_to_groups: HashMap<String, BTreeSet<String>>,
    group_members: HashMap<String, Vec<String>>,
}

impl AuthDirectory {
    pub fn from_records(credentials: Vec<Credential>, memberships: Vec<GroupMembership>) -> Self {
        let mut token_to_userid = HashMap::with_capacity(credentials.len());
        for credential in credentials {
            // First occurrence of a duplicated token wins
            token_to_userid
                .entry(credential.auth_token)
                .or_insert(credential.userid);
        }

        let mut userid_to_groups: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut group_members: HashMap<String, Vec<String>> = HashMap::new();
        for membership in memberships {
            for userid in &membership.member_userids {
                userid_to_groups
                    .entry(userid.clone())
                    .or_default()
                    .insert(membership.group_name.clone());
            }
            group_members
                .entry(membership.group_name)
                .or_default()
                .extend(membership.member_userids);
        }

        Self {
            token_to_userid,
            userid_to_groups,
            group_members,
        }
    }

    /// Load both sources. A missing or malformed source is logged and leaves
    /// its half of the directory empty, so resolution degrades to guest.
    pub fn load(credentials_path: &Path, memberships_path: &Path) -> Self {
        let credentials = match read_json::<Vec<Credential>>(credentials_path) {
            Ok(list) => list,
            Err(e) => {
                warn!("{}. Authentication will not work.", e);
                Vec::new()
            }
        };

        let memberships = match read_json::<Vec<GroupMembership>>(memberships_path) {
            Ok(list) => list,
            Err(e) => {
                warn!("{}. Authorization will not work.", e);
                Vec::new()
            }
        };

        let directory = Self::from_records(credentials, memberships);
        info!(
            "Loaded {} authentication tokens and authorizations for {} users",
            directory.token_count(),
            directory.userid_to_groups.len()
        );
        directory
    }

    /// Exact, case-sensitive token lookup. Absent, empty or unknown tokens
    /// resolve to the guest userid.
    pub fn resolve_userid(&self, token: Option<&str>) -> String {
        token
            .filter(|t| !t.is_empty())
            .and_then(|t| self.token_to_userid.get(t))
            .cloned()
            .unwrap_or_else(|| GUEST_USERID.to_string())
    }

    /// Groups of a userid; absent, empty or unlisted userids get `{"Guests"}`.
    pub fn resolve_groups(&self, userid: Option<&str>) -> BTreeSet<String> {
        userid
            .filter(|u| !u.is_empty())
            .and_then(|u| self.userid_to_groups.get(u))
            .filter(|groups| !groups.is_empty())
            .cloned()
            .unwrap_or_else(|| BTreeSet::from([GUEST_GROUP.to_string()]))
    }

    /// Union of the members of every group in `groups`
    pub fn visible_owners(&self, groups: &BTreeSet<String>) -> BTreeSet<String> {
        groups
            .iter()
            .filter_map(|group| self.group_members.get(group))
            .flatten()
            .cloned()
            .collect()
    }

    pub fn token_count(&self) -> usize {
        self.token_to_userid.len()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DirectoryError> {
    let raw = fs::read_to_string(path).map_err(|source| DirectoryError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DirectoryError::Parse {
        path: path.display().to_string(),
        source,
    })
}
