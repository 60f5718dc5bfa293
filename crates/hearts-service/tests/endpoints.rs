use std::fs;

use hearts_bot::PolicyKind;
use hearts_service::config::ServiceConfig;
use hearts_service::handler::Handler;
use hearts_service::protocol::{ErrorCode, Response};
use serde_json::{Value, json};
use tempfile::tempdir;

fn handler() -> Handler {
    Handler::new(ServiceConfig {
        seed: Some(2024),
        ..ServiceConfig::default()
    })
}

fn quick_config(player_type: &str) -> Value {
    json!({"simulations": 60, "worlds": 6, "epsilon": 0.0, "player_type": player_type})
}

fn move_body(game_state: Value, ai_config: Value) -> String {
    json!({"game_state": game_state, "ai_config": ai_config}).to_string()
}

fn success_json(response: &Response) -> Value {
    assert!(response.is_success(), "expected success, got {response:?}");
    serde_json::from_str(&response.to_json()).expect("response is JSON")
}

fn error_code(response: &Response) -> ErrorCode {
    match response {
        Response::Error { error_code, .. } => *error_code,
        other => panic!("expected an error, got {other:?}"),
    }
}

fn chosen_token(response: &Response) -> String {
    success_json(response)["move"]["card"]
        .as_str()
        .expect("token card")
        .to_string()
}

#[test]
fn opening_hand_must_lead_the_two_of_clubs() {
    let state = json!({
        "player_hand": ["2C", "5C", "8D", "JH", "AS", "3S", "7D", "9H", "KC", "4D", "6S", "10H", "QS"],
        "current_player": 0,
        "current_trick": {"cards": [], "lead_player": 0},
        "hearts_broken": false
    });
    let response = handler().handle_move(&move_body(state, json!({})));
    let value = success_json(&response);
    assert_eq!(value["move"]["card"], "2C");
    assert_eq!(value["move"]["player"], 0);
    assert!(value["computation_time_ms"].as_f64().expect("time") >= 0.0);
}

#[test]
fn lone_card_is_returned_without_search() {
    let state = json!({"player_hand": ["AH"], "current_player": 2, "hearts_broken": true});
    let response = handler().handle_move(&move_body(state, json!({})));
    let value = success_json(&response);
    assert_eq!(value["move"]["card"], "AH");
    assert_eq!(value["move"]["player"], 2);
    assert!(value["computation_time_ms"].as_f64().expect("time") < 50.0);
}

#[test]
fn hearts_only_hand_leads_a_heart() {
    let state = json!({"player_hand": ["5H", "8H", "JH", "AH"], "current_player": 1, "hearts_broken": true});
    let response = handler().handle_move(&move_body(state, quick_config("safe_simple")));
    assert!(chosen_token(&response).ends_with('H'));

    let unbroken = json!({"player_hand": ["5H", "8H", "JH", "AH"], "current_player": 1, "hearts_broken": false});
    let response = handler().handle_move(&move_body(unbroken, quick_config("safe_simple")));
    assert!(chosen_token(&response).ends_with('H'));
}

#[test]
fn unbroken_hearts_are_not_led() {
    let state = json!({"player_hand": ["5H", "8H", "JH", "AS", "3S"], "current_player": 0, "hearts_broken": false});
    for player_type in PolicyKind::ALL.iter().map(|kind| kind.as_str()) {
        let response = handler().handle_move(&move_body(state.clone(), quick_config(player_type)));
        let card = chosen_token(&response);
        assert!(card.ends_with('S'), "{player_type} led {card}");
    }
}

#[test]
fn follows_the_led_suit_when_able() {
    let state = json!({
        "player_hand": ["2D", "9D", "AS", "3H"],
        "current_player": 0,
        "current_trick": {"cards": [{"player": 3, "card": "5D"}], "lead_player": 3},
        "hearts_broken": true
    });
    for player_type in PolicyKind::ALL.iter().map(|kind| kind.as_str()) {
        let response = handler().handle_move(&move_body(state.clone(), quick_config(player_type)));
        let card = chosen_token(&response);
        assert!(["2D", "9D"].contains(&card.as_str()), "{player_type} played {card}");
    }
}

#[test]
fn every_player_type_succeeds_mid_hand() {
    let state = json!({
        "player_hand": ["2S", "7S", "QS", "4C", "9C", "JD", "6H", "KH"],
        "current_player": 2,
        "current_trick": {
            "cards": [{"player": 0, "card": "KS"}, {"player": 1, "card": "3S"}],
            "lead_player": 0
        },
        "played_cards": [[], [], [], []],
        "scores": [12, 30, 4, 51],
        "hearts_broken": true
    });
    for player_type in PolicyKind::ALL.iter().map(|kind| kind.as_str()) {
        let response = handler().handle_move(&move_body(state.clone(), quick_config(player_type)));
        let card = chosen_token(&response);
        assert!(["2S", "7S", "QS"].contains(&card.as_str()), "{player_type} played {card}");
    }
}

#[test]
fn empty_hand_reports_no_legal_moves() {
    let state = json!({"player_hand": [], "current_player": 0});
    let response = handler().handle_move(&move_body(state, json!({})));
    assert_eq!(error_code(&response), ErrorCode::NoLegalMoves);
}

#[test]
fn malformed_token_is_a_validation_error() {
    let state = json!({"player_hand": ["2C", "ZZ"], "current_player": 0});
    let response = handler().handle_move(&move_body(state, json!({})));
    assert_eq!(error_code(&response), ErrorCode::ValidationError);
    let value: Value = serde_json::from_str(&response.to_json()).expect("json");
    assert_eq!(value["status"], "error");
    assert!(value["message"].as_str().expect("message").contains("ZZ"));
}

#[test]
fn config_problems_use_the_config_code() {
    let state = json!({"player_hand": ["2D", "9D"], "current_player": 0, "hearts_broken": true});
    for ai_config in [
        json!({"player_type": "oracle"}),
        json!({"simulations": 0}),
        json!({"simulations": -5}),
        json!({"worlds": 0}),
        json!({"epsilon": 1.5}),
    ] {
        let response = handler().handle_move(&move_body(state.clone(), ai_config.clone()));
        assert_eq!(error_code(&response), ErrorCode::AiConfigError, "{ai_config}");
    }
}

#[test]
fn contradictory_observation_is_inconsistent() {
    let spades: Vec<String> = ["A", "K", "Q", "J", "10", "9", "8", "7", "6", "5", "4", "3", "2"]
        .iter()
        .map(|rank| format!("{rank}S"))
        .collect();
    let diamonds: Vec<String> = ["A", "K", "Q", "J", "10", "9", "8", "7", "6", "5", "4", "3", "2"]
        .iter()
        .map(|rank| format!("{rank}D"))
        .collect();
    let state = json!({
        "player_hand": spades,
        "current_player": 0,
        "played_cards": [[], diamonds, [], []]
    });
    let response = handler().handle_move(&move_body(state, quick_config("simple")));
    assert_eq!(error_code(&response), ErrorCode::InconsistentState);
}

#[test]
fn multi_hand_indexed_request_answers_with_indexed_card() {
    let body = json!({
        "game_state": {
            "player_hands": [
                [{"suit": 2, "rank": 0}, {"suit": 3, "rank": 0}],
                [{"suit": 1, "rank": 0}],
                [{"suit": 0, "rank": 0}],
                [{"suit": 2, "rank": 1}]
            ],
            "current_player": 0,
            "current_trick": {"cards": [], "lead_player": 0},
            "played_cards": [[], [], [], []],
            "scores": [0, 0, 0, 0],
            "hearts_broken": false,
            "pass_direction": 0,
            "rules": 0
        },
        "ai_config": {"simulations": 20, "worlds": 2}
    })
    .to_string();
    let value = success_json(&handler().handle_move(&body));
    assert_eq!(value["move"]["card"], json!({"suit": 2, "rank": 0}));
    assert_eq!(value["move"]["player"], 0);
}

#[test]
fn empty_player_hands_entries_are_sampled_opponents() {
    let body = json!({
        "game_state": {
            "player_hands": [[], [], ["KC", "4C", "AH"], []],
            "current_player": 2,
            "current_trick": {
                "cards": [{"player": 0, "card": "5C"}, {"player": 1, "card": "QH"}],
                "lead_player": 0
            },
            "played_cards": [[], [], [], []],
            "hearts_broken": true,
            "rules": 0
        },
        "ai_config": quick_config("simple")
    })
    .to_string();
    assert_eq!(chosen_token(&handler().handle_move(&body)), "4C");
}

#[test]
fn bad_request_does_not_disturb_the_next() {
    let handler = handler();
    assert_eq!(error_code(&handler.handle_move("{\"game_state\": ")), ErrorCode::ParseError);
    assert_eq!(
        error_code(&handler.handle_move(r#"{"game_state": {"player_hand": ["QQ"]}}"#)),
        ErrorCode::ValidationError
    );
    let state = json!({"player_hand": ["AH"], "current_player": 0, "hearts_broken": true});
    assert_eq!(chosen_token(&handler.handle_move(&move_body(state, json!({})))), "AH");
}

#[test]
fn fixed_seed_replays_the_same_choice() {
    let state = json!({
        "player_hand": ["2S", "7S", "QS", "4C", "9C", "JD", "6H", "KH"],
        "current_player": 1,
        "hearts_broken": true
    });
    let body = move_body(state, json!({"simulations": 40, "worlds": 4, "epsilon": 0.5}));
    let first = chosen_token(&handler().handle_move(&body));
    let second = chosen_token(&handler().handle_move(&body));
    assert_eq!(first, second);
}

#[test]
fn play_one_applies_its_overrides() {
    let state = json!({
        "player_hand": ["2D", "9D", "AS", "3H"],
        "current_player": 0,
        "current_trick": {"cards": [{"player": 3, "card": "5D"}], "lead_player": 3},
        "hearts_broken": true
    });
    let body = json!({"game_state": state, "simulations": 40, "player_type": "global2"}).to_string();
    let card = chosen_token(&handler().handle_play_one(&body));
    assert!(card.ends_with('D'));

    let bad = json!({"game_state": state, "player_type": "nonsense"}).to_string();
    assert_eq!(
        error_code(&handler().handle_play_one(&bad)),
        ErrorCode::AiConfigError
    );
}

#[test]
fn health_reports_ok() {
    assert_eq!(handler().health().to_json(), r#"{"status":"ok"}"#);
}

#[test]
fn service_config_file_drives_the_handler() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("service.yaml");
    fs::write(
        &path,
        r#"
defaults:
  simulations: 30
  worlds: 3
  epsilon: 0.0
  player_type: "global"
play_one:
  simulations: 25
  worlds: 5
seed: 7
logging:
  tracing_level: "warn"
"#,
    )
    .expect("write config");

    let config = ServiceConfig::from_path(&path).expect("config loads");
    assert_eq!(config.defaults.player_type, "global");
    assert_eq!(config.play_one.worlds, 5);

    let handler = Handler::new(config);
    let state = json!({"player_hand": ["2S", "7S", "9C"], "current_player": 3, "hearts_broken": false});
    let response = handler.handle_move(&json!({"game_state": state}).to_string());
    assert!(response.is_success());

    fs::write(&path, "defaults:\n  worlds: 0\n").expect("rewrite config");
    let err = ServiceConfig::from_path(&path).expect_err("zero worlds rejected");
    assert_eq!(err.path(), path.as_path());
}
