//! End-to-end session flows against a mock game server.

use std::sync::Arc;
use std::time::Duration;

use mines_core::{ErrorCode, EventKind, GameState, SessionEvent};
use mines_session::{EventBus, SessionManager};
use mines_transport::{HttpTransport, TransportConfig};
use parking_lot::Mutex;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Client {
    manager: SessionManager,
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

fn client_for(server: &MockServer, timeout: Duration) -> Client {
    let transport = HttpTransport::new(TransportConfig {
        base_url: server.uri(),
        auth_token: Some(SecretString::from("player-token")),
        timeout,
    })
    .unwrap();

    let bus = Arc::new(EventBus::new());
    let events = Arc::new(Mutex::new(Vec::new()));
    for kind in EventKind::ALL {
        let events = Arc::clone(&events);
        let _ = bus.subscribe(kind, move |e| events.lock().push(e.clone()));
    }

    Client {
        manager: SessionManager::new(Arc::new(transport), bus),
        events,
    }
}

fn kinds(events: &Mutex<Vec<SessionEvent>>) -> Vec<EventKind> {
    events.lock().iter().map(SessionEvent::kind).collect()
}

#[tokio::test]
async fn full_round_then_cash_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer player-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": "u-1",
            "balance": 100.0,
            "config": {"minBet": 0.1, "maxBet": 100.0},
            "firstBetMultipliers": [1.04, 1.09, 1.14]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/game/session"))
        .and(body_json(json!({"betAmount": 1.0, "mineCount": 3})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessionId": "abc",
            "betAmount": 1.0,
            "mines": 3,
            "cashOutAmount": 0.0,
            "currentMultiplier": 1.0,
            "nextMultiplier": 1.13,
            "nextWinAmount": 1.13,
            "numberOfTiles": 25,
            "status": "ACTIVE",
            "tiles": [],
            "remainingBalance": 99.0
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/game/session/abc/pick"))
        .and(body_json(json!({"sessionId": "abc", "tileIndex": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessionId": "abc",
            "hitMine": false,
            "tiles": [7],
            "status": "ACTIVE",
            "currentMultiplier": 1.13,
            "nextMultiplier": 1.29,
            "nextWinAmount": 1.29,
            "cashOutAmount": 1.13
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/game/session/abc/cash-out"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "multiplier": 1.13,
            "winAmount": 1.13,
            "balance": 100.13
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let manager = &client.manager;

    let profile = manager.request_user_information().await.unwrap();
    assert_eq!(profile.user_id.as_str(), "u-1");

    let session = manager.start_game(1.0, 3).await.unwrap();
    assert_eq!(session.session_id.as_str(), "abc");
    assert_eq!(manager.balance(), Some(99.0));

    let pick = manager.pick_tile(7).await.unwrap();
    assert_eq!(pick.session.tiles_revealed, vec![7]);
    assert!(manager.revealed_mines().is_empty());

    let cash_out = manager.cash_out().await.unwrap();
    assert!((cash_out.response.win_amount - 1.13).abs() < f64::EPSILON);
    assert_eq!(manager.game_state(), GameState::Win);
    assert_eq!(manager.balance(), Some(100.13));

    assert_eq!(
        kinds(&client.events),
        vec![
            EventKind::UserInfoUpdated,
            EventKind::GameSessionStarted,
            EventKind::PickTileResponseReceived,
            EventKind::CashOutReceived,
        ]
    );
}

#[tokio::test]
async fn mine_hit_discloses_positions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/game/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sessionId": "abc",
            "betAmount": 1.0,
            "mines": 3,
            "status": "ACTIVE",
            "tiles": []
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/game/session/abc/pick"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hitMine": true,
            "mineTileIndex": 12,
            "minePositions": [2, 12, 19],
            "status": "LOST"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let _ = client.manager.start_game(1.0, 3).await.unwrap();
    let pick = client.manager.pick_tile(12).await.unwrap();

    assert!(pick.hit_mine());
    assert_eq!(client.manager.game_state(), GameState::Lost);
    assert_eq!(client.manager.revealed_mines(), vec![2, 12, 19]);
    assert_eq!(client.manager.fatal_tile(), Some(12));
    assert!(pick.session.tiles_revealed.is_empty());
}

#[tokio::test]
async fn slow_start_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/game/session"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"sessionId": "late", "betAmount": 1.0, "mines": 3}))
                .set_delay(Duration::from_millis(2_000)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_millis(100));

    let started = std::time::Instant::now();
    let err = client.manager.start_game(1.0, 3).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_millis(1_500));
    assert_eq!(err.code, ErrorCode::Timeout);
    assert_eq!(err.message, "Request timed out");
    assert_eq!(client.manager.game_state(), GameState::None);
    assert!(client.manager.session().is_none());
    assert!(!client.manager.is_pending());

    let events = client.events.lock();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0], SessionEvent::RequestError(err));
}

#[tokio::test]
async fn server_error_code_passes_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/game/session"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": "INSUFFICIENT_BALANCE",
            "message": "Balance too low for this bet"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client.manager.start_game(500.0, 3).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::Server("INSUFFICIENT_BALANCE".into()));
    assert_eq!(err.message, "Balance too low for this bet");
    assert_eq!(kinds(&client.events), vec![EventKind::RequestError]);
}

#[tokio::test]
async fn pick_before_start_never_reaches_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, Duration::from_secs(5));
    let err = client.manager.pick_tile(0).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::NoActiveSession);
    assert!(client.events.lock().is_empty());
}
