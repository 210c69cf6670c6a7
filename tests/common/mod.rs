#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::Value;

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// Credential fixture: u1..u4 with tokens t1..t4
const CREDENTIALS: &str = r#"[
    {"userid": "u1", "auth_token": "t1"},
    {"userid": "u2", "auth_token": "t2"},
    {"userid": "u3", "auth_token": "t3"},
    {"userid": "u4", "auth_token": "t4"}
]"#;

/// Membership fixture: G1 = {u1, u2}, G2 = {u2, u3}; u4 has no group.
/// "Guests" is unlisted, so guest visibility comes only from the caller's
/// own userid.
const MEMBERSHIPS: &str = r#"[
    {"group_name": "G1", "userids": ["u1", "u2"]},
    {"group_name": "G2", "userids": ["u2", "u3"]}
]"#;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let fixtures = fixture_dir(port)?;
        let credentials = fixtures.join("user_authentication.json");
        let memberships = fixtures.join("user_authorization.json");
        std::fs::write(&credentials, CREDENTIALS)?;
        std::fs::write(&memberships, MEMBERSHIPS)?;

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tmtrack-api"));
        cmd.env("HOST", "127.0.0.1")
            .env("PORT", port.to_string())
            .env("TMTRACK_STORE", "memory")
            .env("TMTRACK_CREDENTIALS_FILE", &credentials)
            .env("TMTRACK_MEMBERSHIPS_FILE", &memberships)
            .env("TMTRACK_ALLOWED_USERS", "dana,michelle")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

fn fixture_dir(port: u16) -> Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("tmtrack_it_{}_{}", std::process::id(), port));
    std::fs::create_dir_all(&dir).context("failed to create fixture dir")?;
    Ok(dir)
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Send a request to the test server, optionally authenticated and with a
/// JSON body; returns the status and the parsed response body
pub async fn request(method: Method, path: &str, token: Option<&str>, body: Option<&Value>) -> Result<(StatusCode, Value)> {
    let server = ensure_server().await?;
    let client = reqwest::Client::new();

    let mut req = client.request(method, format!("{}{}", server.base_url, path));
    if let Some(token) = token {
        req = req.bearer_auth(token);
    }
    if let Some(body) = body {
        req = req.json(body);
    }

    let res = req.send().await?;
    let status = res.status();
    let body = res.json::<Value>().await?;
    Ok((status, body))
}

/// Send a raw, non-JSON body
pub async fn request_raw(method: Method, path: &str, body: &'static str) -> Result<(StatusCode, Value)> {
    let server = ensure_server().await?;
    let res = reqwest::Client::new()
        .request(method, format!("{}{}", server.base_url, path))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await?;
    let status = res.status();
    Ok((status, res.json::<Value>().await?))
}

/// A complete, valid task body owned by `userid`
pub fn task_body(userid: &str) -> Value {
    serde_json::json!({
        "userid": userid,
        "date": "2023-01-01",
        "task_name": "Test Task",
        "category": "Testing",
        "expected_hours": 2.5,
        "arbitrary_field": "some_value"
    })
}
