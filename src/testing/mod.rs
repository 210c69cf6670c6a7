use std::path::PathBuf;
use uuid::Uuid;

use crate::auth::{AuthDirectory, Credential, GroupMembership};

/// Directory with two known users:
/// dana (Group A, Group B) and michelle (Group A)
pub fn sample_directory() -> AuthDirectory {
    AuthDirectory::from_records(
        vec![
            Credential::new("dana", "token_dana"),
            Credential::new("michelle", "token_michelle"),
        ],
        vec![
            GroupMembership::new("Group A", ["dana", "michelle"]),
            GroupMembership::new("Group B", ["dana"]),
            GroupMembership::new("Guests", ["guest"]),
        ],
    )
}

/// Write `contents` to a fresh file under the system temp dir
pub fn write_temp_file(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("tmtrack_test_{}.json", Uuid::new_v4().simple()));
    std::fs::write(&path, contents).expect("failed to write temp file");
    path
}
