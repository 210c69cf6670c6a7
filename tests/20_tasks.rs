mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

async fn create(token: &str, body: &Value) -> Result<String> {
    let (status, body) = common::request(Method::POST, "/api/v1/tasks", Some(token), Some(body)).await?;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert_eq!(body["message"], "Task created successfully");
    Ok(body["task_id"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn create_and_fetch_task() -> Result<()> {
    let task_id = create("t1", &common::task_body("u1")).await?;
    assert!(!task_id.is_empty());

    let (status, body) = common::request(Method::GET, &format!("/api/v1/tasks/{task_id}"), Some("t1"), None).await?;
    assert_eq!(status, StatusCode::OK);
    let task = &body["task"];
    assert_eq!(task["task_id"], task_id);
    assert_eq!(task["task_name"], "Test Task");
    assert_eq!(task["arbitrary_field"], "some_value");
    assert!(task["_id"].is_string());
    assert!(task["created_at"].is_string());
    assert_eq!(task["created_at"], task["updated_at"]);
    Ok(())
}

#[tokio::test]
async fn create_reports_each_invalid_field() -> Result<()> {
    let body = json!({
        "userid": "u1",
        "date": "2023/01/01",
        "task_name": 7,
        "expected_hours": 2
    });
    let (status, body) = common::request(Method::POST, "/api/v1/tasks", Some("t1"), Some(&body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"]["date"], "'date' must be in YYYY-MM-DD format.");
    assert_eq!(body["errors"]["task_name"], "'task_name' must be of type string, but got integer.");
    assert_eq!(body["errors"]["expected_hours"], "'expected_hours' must be of type float, but got integer.");
    assert_eq!(body["errors"]["category"], "'category' is a required field.");
    assert!(body["errors"].get("userid").is_none());
    Ok(())
}

#[tokio::test]
async fn create_rejects_non_string_extension_fields() -> Result<()> {
    let mut body = common::task_body("u1");
    body["priority"] = json!(3);
    let (status, body) = common::request(Method::POST, "/api/v1/tasks", Some("t1"), Some(&body)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Arbitrary attribute 'priority' must be a string.");
    Ok(())
}

#[tokio::test]
async fn non_json_and_empty_bodies_are_rejected() -> Result<()> {
    for raw in ["not json", "{}", "[]"] {
        let (status, body) = common::request_raw(Method::POST, "/api/v1/tasks", raw).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Request must be JSON");
        assert_eq!(body["userid"], "guest");
    }
    Ok(())
}

#[tokio::test]
async fn modify_merges_partial_updates() -> Result<()> {
    let task_id = create("t1", &common::task_body("u1")).await?;
    let path = format!("/api/v1/tasks/{task_id}");
    let (_, before) = common::request(Method::GET, &path, None, None).await?;

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let update = json!({ "task_id": "ignored", "actual_hours": 1.5, "description": "half done" });
    let (status, body) = common::request(Method::PUT, &path, Some("t3"), Some(&update)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task updated successfully");
    assert_eq!(body["task_id"], task_id);

    let (_, after) = common::request(Method::GET, &path, None, None).await?;
    let (before, after) = (&before["task"], &after["task"]);
    assert_eq!(after["task_id"], task_id);
    assert_eq!(after["actual_hours"], 1.5);
    assert_eq!(after["description"], "half done");
    assert_eq!(after["task_name"], before["task_name"]);
    assert_eq!(after["created_at"], before["created_at"]);
    assert_ne!(after["updated_at"], before["updated_at"]);
    Ok(())
}

#[tokio::test]
async fn modify_validates_only_supplied_fields() -> Result<()> {
    let task_id = create("t1", &common::task_body("u1")).await?;
    let path = format!("/api/v1/tasks/{task_id}");

    let (status, body) = common::request(Method::PUT, &path, None, Some(&json!({ "date": "Jan 1" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["date"], "'date' must be in YYYY-MM-DD format.");
    assert_eq!(body["errors"].as_object().map(|e| e.len()), Some(1));
    Ok(())
}

#[tokio::test]
async fn modify_unknown_task_is_not_found() -> Result<()> {
    let (status, body) = common::request(
        Method::PUT,
        "/api/v1/tasks/no-such-task",
        None,
        Some(&json!({ "description": "x" })),
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task with task_id 'no-such-task' not found.");
    Ok(())
}

#[tokio::test]
async fn get_unknown_task_is_not_found() -> Result<()> {
    let (status, body) = common::request(Method::GET, "/api/v1/tasks/no-such-task", None, None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
    Ok(())
}
