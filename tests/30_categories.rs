mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

// The categories list is a singleton, so every scenario lives in one test
// to keep them from racing against each other on the shared server.
#[tokio::test]
async fn categories_lifecycle() -> Result<()> {
    let (status, body) = common::request(Method::GET, "/api/v1/categories", Some("t1"), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"], json!([]));
    assert_eq!(body["userid"], "u1");

    let payload = json!({ "categories": ["Work", "Personal", "Study"] });
    let (status, body) = common::request(Method::PUT, "/api/v1/categories", None, Some(&payload)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Categories updated successfully.");
    assert_eq!(body["matched_count"], 0);
    assert!(body["upserted_id"].is_string());

    // Replacing with the same list is idempotent
    let (status, body) = common::request(Method::PUT, "/api/v1/categories", None, Some(&payload)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["matched_count"], 1);
    assert_eq!(body["modified_count"], 0);
    assert!(body["upserted_id"].is_null());

    let (_, body) = common::request(Method::GET, "/api/v1/categories", None, None).await?;
    assert_eq!(body["categories"], json!(["Work", "Personal", "Study"]));

    let invalid = [
        (json!({ "names": ["Work"] }), "Request body must contain a 'categories' key."),
        (json!({ "categories": [], "other": true }), "Request body must contain only the 'categories' key."),
        (json!({ "categories": "Work" }), "The 'categories' value must be a list."),
        (json!({ "categories": ["Work", 1] }), "All items in the 'categories' list must be strings."),
    ];
    for (payload, message) in invalid {
        let (status, body) = common::request(Method::PUT, "/api/v1/categories", None, Some(&payload)).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], message);
    }

    // Failed replacements leave the stored list alone
    let (_, body) = common::request(Method::GET, "/api/v1/categories", None, None).await?;
    assert_eq!(body["categories"], json!(["Work", "Personal", "Study"]));

    let (_, body) = common::request(Method::PUT, "/api/v1/categories", None, Some(&json!({ "categories": [] }))).await?;
    assert_eq!(body["modified_count"], 1);
    let (_, body) = common::request(Method::GET, "/api/v1/categories", None, None).await?;
    assert_eq!(body["categories"], json!([]));
    Ok(())
}
