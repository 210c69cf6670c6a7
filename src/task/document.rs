use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::schema::{CREATED_AT, TASK_ID, TIMESTAMP_FIELDS, UPDATED_AT};

/// A loosely-schematized task record keyed by field name
pub type TaskDocument = Map<String, Value>;

/// Internal storage identifier exposed on stored records
pub const STORAGE_ID: &str = "_id";

/// Fresh, globally unique task identifier
pub fn new_task_id() -> String {
    Uuid::new_v4().to_string()
}

/// Timestamp representation persisted in `created_at` / `updated_at`
pub fn timestamp(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
}

/// Drop fields a client may never set: the task id and the server timestamps.
/// Remaining keys keep the order the client sent them in.
pub fn strip_server_fields(document: &mut TaskDocument) {
    document.shift_remove(TASK_ID);
    document.shift_remove(STORAGE_ID);
    for field in TIMESTAMP_FIELDS {
        document.shift_remove(*field);
    }
}

/// Assign the identifier and both timestamps of a newly created task.
/// `created_at` and `updated_at` share the same instant.
pub fn stamp_new(document: &mut TaskDocument, now: DateTime<Utc>) -> String {
    let task_id = new_task_id();
    document.insert(TASK_ID.to_string(), Value::String(task_id.clone()));
    document.insert(CREATED_AT.to_string(), timestamp(now));
    document.insert(UPDATED_AT.to_string(), timestamp(now));
    task_id
}

/// Refresh `updated_at` on a partial update
pub fn stamp_update(document: &mut TaskDocument, now: DateTime<Utc>) {
    document.insert(UPDATED_AT.to_string(), timestamp(now));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_client_supplied_server_fields() {
        let mut doc = json!({
            "task_id": "mine",
            "_id": "1",
            "created_at": "x",
            "updated_at": "y",
            "task_name": "keep"
        })
        .as_object()
        .cloned()
        .unwrap();

        strip_server_fields(&mut doc);
        assert_eq!(doc.len(), 1);
        assert_eq!(doc["task_name"], "keep");
    }

    #[test]
    fn new_tasks_get_matching_timestamps() {
        let mut doc = TaskDocument::new();
        let now = Utc::now();
        let task_id = stamp_new(&mut doc, now);

        assert_eq!(doc["task_id"], Value::String(task_id.clone()));
        assert!(Uuid::parse_str(&task_id).is_ok());
        assert_eq!(doc["created_at"], doc["updated_at"]);
    }

    #[test]
    fn task_ids_are_unique() {
        assert_ne!(new_task_id(), new_task_id());
    }

    #[test]
    fn timestamps_are_utc_rfc3339() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T10:20:30.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(timestamp(now), json!("2024-05-01T10:20:30.123456Z"));
    }
}
