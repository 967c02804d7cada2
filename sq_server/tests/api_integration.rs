//! Integration tests for the HTTP request surface.
//!
//! Drives the router directly with `tower::ServiceExt::oneshot`; no
//! sockets involved.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use sequence_core::{Hub, HubConfig};
use serde_json::{Value, json};
use sq_server::api::{AppState, create_router};
use tower::ServiceExt;

fn test_server() -> Router {
    let hub = Hub::new(HubConfig::default());
    create_router(AppState { hub })
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn join(app: &Router, name: &str) -> String {
    let response = app
        .clone()
        .oneshot(post("/v1/join", None, json!({ "name": name })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    body["data"]["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_and_ping_respond() {
    let app = test_server();

    let response = app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");

    let response = app.oneshot(get("/v1/ping", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["ok"], true);
    assert_eq!(body["data"]["serverName"], "sequence-server");
    assert!(body["data"]["timestamp"].is_i64());
}

#[tokio::test]
async fn join_server_validates_and_reserves_names() {
    let app = test_server();

    let response = app
        .clone()
        .oneshot(post("/v1/join", None, json!({ "name": "Alice" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["sessionId"].as_str().unwrap().len(), 32);
    assert!(body["data"]["playerId"].is_string());

    // Case-insensitive duplicate.
    let response = app
        .clone()
        .oneshot(post("/v1/join", None, json!({ "name": "ALICE" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);

    // Too short and reserved names are bad requests.
    let response = app
        .clone()
        .oneshot(post("/v1/join", None, json!({ "name": "x" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let response = app
        .clone()
        .oneshot(post("/v1/join", None, json!({ "name": "admin" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post("/v1/check-name", None, json!({ "name": "alice" })))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["available"], false);
}

#[tokio::test]
async fn protected_routes_require_a_live_session() {
    let app = test_server();

    let response = app.clone().oneshot(get("/v1/rooms", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(get("/v1/rooms", Some("bogus-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = join(&app, "Alice").await;
    let response = app.oneshot(get("/v1/rooms", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn room_lifecycle_over_http() {
    let app = test_server();
    let alice = join(&app, "Alice").await;
    let bob = join(&app, "Bob").await;

    let response = app
        .clone()
        .oneshot(post(
            "/v1/rooms",
            Some(&alice),
            json!({ "name": "casual game", "mode": "1v1", "boardType": "classic" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let room_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["hasPassword"], false);
    assert_eq!(body["data"]["status"], "waiting");

    let response = app
        .clone()
        .oneshot(get("/v1/rooms", Some(&bob)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["hostName"], "Alice");
    assert_eq!(body["data"][0]["players"], 1);

    let response = app
        .clone()
        .oneshot(post(
            &format!("/v1/rooms/{room_id}/join"),
            Some(&bob),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["players"].as_array().unwrap().len(), 2);

    // Only the host may start.
    let response = app
        .clone()
        .oneshot(post(
            &format!("/v1/rooms/{room_id}/start"),
            Some(&bob),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(post(
            &format!("/v1/rooms/{room_id}/start"),
            Some(&alice),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["missingPlayersFilledWithAI"], false);
    assert!(body["data"]["gameId"].is_string());
}

#[tokio::test]
async fn wrong_room_password_is_a_conflict() {
    let app = test_server();
    let alice = join(&app, "Alice").await;
    let bob = join(&app, "Bob").await;

    let response = app
        .clone()
        .oneshot(post(
            "/v1/rooms",
            Some(&alice),
            json!({ "name": "secret", "mode": "2v2", "boardType": "advanced", "password": "sesame" }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let room_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["hasPassword"], true);

    let response = app
        .clone()
        .oneshot(post(
            &format!("/v1/rooms/{room_id}/join"),
            Some(&bob),
            json!({ "password": "open sesame" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(post(
            &format!("/v1/rooms/{room_id}/join"),
            Some(&bob),
            json!({ "password": "sesame" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn full_turn_round_trip_over_http() {
    let app = test_server();
    let alice = join(&app, "Alice").await;
    let bob = join(&app, "Bob").await;

    let response = app
        .clone()
        .oneshot(post(
            "/v1/rooms",
            Some(&alice),
            json!({ "name": "the table", "mode": "1v1", "boardType": "classic" }),
        ))
        .await
        .unwrap();
    let room_id = body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string();

    app.clone()
        .oneshot(post(
            &format!("/v1/rooms/{room_id}/join"),
            Some(&bob),
            json!({}),
        ))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(post(
            &format!("/v1/rooms/{room_id}/start"),
            Some(&alice),
            json!({}),
        ))
        .await
        .unwrap();
    let game_id = body_json(response).await["data"]["gameId"]
        .as_str()
        .unwrap()
        .to_string();

    // Reconnection snapshot carries the recipient's hand and the board.
    let response = app
        .clone()
        .oneshot(get("/v1/session", Some(&alice)))
        .await
        .unwrap();
    let body = body_json(response).await;
    let snapshot = &body["data"]["gameState"];
    assert_eq!(snapshot["id"].as_str().unwrap(), game_id);
    assert_eq!(snapshot["hand"].as_array().unwrap().len(), 7);
    assert_eq!(snapshot["deckCursor"], 14);

    // Bob cannot move first.
    let response = app
        .clone()
        .oneshot(post(
            &format!("/v1/games/{game_id}/turn"),
            Some(&bob),
            json!({ "cardIndex": 0, "row": 0, "col": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Find a legal opening move from the snapshot.
    let hand: Vec<String> = snapshot["hand"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap().to_string())
        .collect();
    let board = snapshot["board"]["cells"].as_array().unwrap();
    let mut chosen = None;
    'outer: for (card_index, card) in hand.iter().enumerate() {
        if card == "JS" || card == "JH" {
            continue; // nothing to remove on an empty board
        }
        for row in board {
            for cell in row.as_array().unwrap() {
                let open = cell["chip"].is_null() && !cell["card"].is_null();
                let matches =
                    card == "JD" || card == "JC" || cell["card"].as_str() == Some(card.as_str());
                if open && matches {
                    chosen = Some((card_index, cell["row"].as_u64().unwrap(), cell["col"].as_u64().unwrap()));
                    break 'outer;
                }
            }
        }
    }
    let (card_index, row, col) = chosen.expect("an opening move always exists");

    let response = app
        .clone()
        .oneshot(post(
            &format!("/v1/games/{game_id}/turn"),
            Some(&alice),
            json!({ "cardIndex": card_index, "row": row, "col": col }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // It is Bob's turn now; Alice playing again conflicts.
    let response = app
        .oneshot(post(
            &format!("/v1/games/{game_id}/turn"),
            Some(&alice),
            json!({ "cardIndex": 0, "row": 0, "col": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
