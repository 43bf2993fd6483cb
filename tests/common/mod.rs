#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use reqwest::Client;
use serde_json::{json, Value};

pub const BASE_URL: &str = "http://localhost:8000";

static COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn client() -> Client {
    Client::new()
}

/// Timestamp plus a per-process counter, short enough for a 20-char username.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}{}", ts % 100_000_000, n % 100)
}

pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// A registered account and its bearer token.
pub struct Player {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Register a fresh account whose username starts with `prefix`.
pub async fn register_player(client: &Client, prefix: &str) -> Player {
    let suffix = unique_suffix();
    let username = format!("{prefix}_{suffix}");
    let resp = client
        .post(url("/api/auth/register"))
        .json(&json!({
            "username": username,
            "email": format!("{prefix}_{suffix}@duelchess.dev"),
            "password": "testpass123",
        }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(resp.status(), 200, "Register {username} should succeed");

    let body: Value = resp.json().await.unwrap();
    Player {
        id: body["user"]["id"].as_i64().unwrap(),
        username,
        token: body["token"].as_str().unwrap().to_string(),
    }
}

pub async fn get(client: &Client, player: &Player, path: &str) -> reqwest::Response {
    client
        .get(url(path))
        .bearer_auth(&player.token)
        .send()
        .await
        .expect("GET failed")
}

pub async fn post(client: &Client, player: &Player, path: &str, body: Value) -> reqwest::Response {
    client
        .post(url(path))
        .bearer_auth(&player.token)
        .json(&body)
        .send()
        .await
        .expect("POST failed")
}
