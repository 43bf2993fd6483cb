//! End-to-end game flow: matchmaking, moves, ratings and history.
//!
//! Requires the server to be running on localhost:8000. Everything that touches
//! the shared waiting queue lives in one test so pairings stay deterministic.

mod common;

use common::Player;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn request_match(client: &reqwest::Client, player: &Player) -> Value {
    let resp = common::post(client, player, "/api/match/request", json!({})).await;
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

async fn poll_match(client: &reqwest::Client, player: &Player) -> Value {
    let resp = common::get(client, player, "/api/match/poll").await;
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

/// Queue `white`, then have `black` pick them up. Returns the game id.
///
/// A leftover waiter from another run could grab `white` first; such a pairing
/// is abandoned and `white` queues again.
async fn pair(client: &reqwest::Client, white: &Player, black: &Player) -> i64 {
    for _ in 0..5 {
        let status = request_match(client, white).await;
        if status["status"] == "queued" {
            let status = request_match(client, black).await;
            assert_eq!(status["status"], "matched", "second request should pair");
            return status["sessionId"].as_i64().unwrap();
        }
        assert_eq!(status["status"], "matched");
        poll_match(client, white).await;
    }
    panic!("could not get {} into the waiting queue", white.username);
}

async fn play(client: &reqwest::Client, player: &Player, game_id: i64, uci: &str) -> reqwest::Response {
    common::post(
        client,
        player,
        &format!("/api/games/{game_id}/moves"),
        json!({ "uci": uci }),
    )
    .await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_game_flow() {
    let client = common::client();
    let white = common::register_player(&client, "white").await;
    let black = common::register_player(&client, "black").await;
    let outsider = common::register_player(&client, "outsider").await;

    // ── Cancel leaves the queue ─────────────────────────────────────
    let status = request_match(&client, &outsider).await;
    if status["status"] == "queued" {
        assert_eq!(poll_match(&client, &outsider).await["status"], "stillWaiting");
        let resp = common::post(&client, &outsider, "/api/match/cancel", json!({})).await;
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["cancelled"], true);
    } else {
        poll_match(&client, &outsider).await;
    }
    assert_eq!(poll_match(&client, &outsider).await["status"], "unknown");

    // ── Pairing: both sides learn the same session ──────────────────
    let game_id = pair(&client, &white, &black).await;
    assert_eq!(
        poll_match(&client, &white).await,
        json!({ "status": "matched", "sessionId": game_id })
    );
    assert_eq!(
        poll_match(&client, &black).await,
        json!({ "status": "matched", "sessionId": game_id })
    );
    assert_eq!(poll_match(&client, &white).await["status"], "unknown");

    // ── Game view ───────────────────────────────────────────────────
    let resp = common::get(&client, &white, &format!("/api/games/{game_id}")).await;
    assert_eq!(resp.status(), 200);
    let game: Value = resp.json().await.unwrap();
    assert_eq!(game["white"]["id"], white.id);
    assert_eq!(game["black"]["id"], black.id);
    assert_eq!(game["playerColor"], "white");
    assert_eq!(game["isMyTurn"], true);
    assert_eq!(game["currentPly"], 0);
    assert_eq!(game["status"], "IN_PROGRESS");
    assert_eq!(game["board"][7][4], "K");
    assert_eq!(game["board"][0][3], "q");

    let resp = common::get(&client, &outsider, &format!("/api/games/{game_id}")).await;
    assert_eq!(resp.status(), 403, "Non-players cannot view the game");

    // ── Move validation ─────────────────────────────────────────────
    assert_eq!(play(&client, &black, game_id, "e7e5").await.status(), 409, "Not black's turn");
    assert_eq!(play(&client, &white, game_id, "e2e5").await.status(), 422, "Pawn cannot jump three");
    assert_eq!(play(&client, &white, game_id, "zz").await.status(), 400, "Bad notation");
    assert_eq!(play(&client, &outsider, game_id, "e2e4").await.status(), 403);

    // ── Fool's mate ─────────────────────────────────────────────────
    let resp = play(&client, &white, game_id, "f2f3").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ply"], 1);
    assert_eq!(body["status"], "IN_PROGRESS");
    assert!(body.get("ratings").is_none());

    assert_eq!(play(&client, &black, game_id, "e7e5").await.status(), 200);
    assert_eq!(play(&client, &white, game_id, "g2g4").await.status(), 200);

    let resp = play(&client, &black, game_id, "d8h4").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["check"], true);
    assert_eq!(body["status"], "BLACK_WON");
    assert_eq!(body["ratings"]["white"], json!({ "before": 1200, "after": 1184 }));
    assert_eq!(body["ratings"]["black"], json!({ "before": 1200, "after": 1216 }));

    assert_eq!(play(&client, &white, game_id, "a2a3").await.status(), 409, "Game is over");
    let resp = common::post(&client, &white, &format!("/api/games/{game_id}/resign"), json!({})).await;
    assert_eq!(resp.status(), 409, "Cannot resign a finished game");

    // ── Ratings persisted exactly once ──────────────────────────────
    let me: Value = common::get(&client, &black, "/api/rating/me").await.json().await.unwrap();
    assert_eq!(me["rating"], 1216);
    let resp = client
        .get(common::url(&format!("/api/rating/user/{}", white.username)))
        .send()
        .await
        .unwrap();
    let other: Value = resp.json().await.unwrap();
    assert_eq!(other["rating"], 1184);

    // ── History ─────────────────────────────────────────────────────
    let resp = common::get(&client, &black, &format!("/api/history/match/{game_id}/moves")).await;
    let moves: Value = resp.json().await.unwrap();
    let moves = moves.as_array().unwrap();
    assert_eq!(moves.len(), 4);
    assert_eq!(moves[0]["uci"], "f2f3");
    assert_eq!(moves[0]["color"], "white");
    assert_eq!(moves[3]["san"], "Qh4");
    assert_eq!(moves[3]["moveNumber"], 2);
    assert_eq!(moves[1]["fenBefore"], moves[0]["fenAfter"]);

    let resp = common::get(&client, &white, &format!("/api/history/match/{game_id}/fen")).await;
    let fen: Value = resp.json().await.unwrap();
    assert_eq!(fen["currentPly"], 4);
    assert_eq!(fen["lastMoveUci"], "d8h4");
    assert_eq!(fen["fen"], moves[3]["fenAfter"]);

    let resp = common::get(&client, &white, "/api/history/my-games?limit=5").await;
    let games: Value = resp.json().await.unwrap();
    let latest = &games[0];
    assert_eq!(latest["matchId"], game_id);
    assert_eq!(latest["opponent"], black.username);
    assert_eq!(latest["result"], "Loss");

    let resp = common::get(&client, &white, "/api/history/match/999999999/moves").await;
    assert_eq!(resp.status(), 404);

    // ── Resignation ends a second game ──────────────────────────────
    let rematch = pair(&client, &white, &black).await;
    let resp = common::post(&client, &outsider, &format!("/api/games/{rematch}/resign"), json!({})).await;
    assert_eq!(resp.status(), 403);

    let resp = common::post(&client, &black, &format!("/api/games/{rematch}/resign"), json!({})).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "WHITE_WON");
    assert_eq!(body["ratings"]["white"]["before"], 1184);
    assert!(body["ratings"]["white"]["after"].as_i64().unwrap() > 1184);
}

#[tokio::test]
async fn leaderboard_is_sorted_and_ranked() {
    let client = common::client();
    let resp = client
        .get(common::url("/api/rating/leaderboard?page=0&size=10"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let page: Value = resp.json().await.unwrap();
    assert_eq!(page["size"], 10);

    let players = page["players"].as_array().unwrap();
    assert!(players.len() <= 10);
    for (i, pair) in players.windows(2).enumerate() {
        assert!(pair[0]["rating"].as_i64() >= pair[1]["rating"].as_i64());
        assert_eq!(pair[0]["rank"], i as i64 + 1);
    }
}

#[tokio::test]
async fn matchmaking_requires_auth() {
    let client = common::client();
    let resp = client
        .post(common::url("/api/match/request"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client.get(common::url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
}
