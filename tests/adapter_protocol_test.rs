use match3::adapter::protocol::{
    create_event, create_hint, create_swap, create_welcome, parse_message, AssignedRole,
    EventMessage, EventPayload, ParsedMessage, WirePos,
};
use match3::adapter::server::build_observation;
use match3::adapter::PROTOCOL_VERSION;
use match3::core::{Engine, EngineConfig, Grid, SequenceTiles};
use match3::types::{GridPos, TileKind, TileKind::*};

fn sample_engine() -> Engine {
    let grid = Grid::from_kinds(&[
        [Chicken, Chicken, Burger, Fries],
        [Burger, Fries, Chicken, Burger],
        [Fries, Burger, Fries, Chicken],
        [Burger, Fries, Burger, Fries],
    ])
    .unwrap();
    let config = EngineConfig {
        grid_size: 4,
        kinds: TileKind::ALL.to_vec(),
        ..EngineConfig::default()
    };
    Engine::from_grid(config, grid, Box::new(SequenceTiles::new([Cola, Bucket, Donut]))).unwrap()
}

#[test]
fn turn_events_survive_the_wire() {
    let mut engine = sample_engine();
    engine
        .request_swap(GridPos::new(0, 2), GridPos::new(1, 2))
        .unwrap();
    let turn_id = engine.turn_id();
    let events = engine.drain_events();
    assert!(!events.is_empty());

    for (i, event) in events.iter().enumerate() {
        let msg = create_event(i as u64 + 1, turn_id, event);
        let line = serde_json::to_string(&msg).unwrap();
        assert!(!line.contains('\n'));

        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["type"], "event");
        assert_eq!(v["event"]["name"], event.name());

        let back: EventMessage = serde_json::from_str(&line).unwrap();
        assert_eq!(back.turn_id, turn_id);
        assert_eq!(back.event, msg.event);
    }
}

#[test]
fn swap_event_carries_both_ends() {
    let mut engine = sample_engine();
    engine
        .request_swap(GridPos::new(0, 2), GridPos::new(1, 2))
        .unwrap();
    let first = engine.next_event().unwrap();
    match create_event(1, engine.turn_id(), &first).event {
        EventPayload::Swapped { from, to } => {
            assert_eq!(from, WirePos { row: 0, col: 2 });
            assert_eq!(to, WirePos { row: 1, col: 2 });
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn observation_reports_the_settled_board() {
    let mut engine = sample_engine();
    engine
        .request_swap(GridPos::new(0, 2), GridPos::new(1, 2))
        .unwrap();
    engine.drain_events();

    let obs = build_observation(&engine.snapshot(), 9);
    let v = serde_json::to_value(&obs).unwrap();
    assert_eq!(v["type"], "observation");
    assert_eq!(v["seq"], 9);
    assert_eq!(v["board"]["size"], 4);
    assert_eq!(v["board"]["cells"].as_array().map(Vec::len), Some(4));
    assert_eq!(v["score"], 30);
    assert_eq!(v["moves_remaining"], 29);
    assert_eq!(v["state_hash"].as_str().map(str::len), Some(16));
    assert_eq!(v["playable"], true);
}

#[test]
fn client_messages_parse_back() {
    let line = serde_json::to_string(&create_swap(4, GridPos::new(2, 1), GridPos::new(2, 2))).unwrap();
    let ParsedMessage::Command(cmd) = parse_message(&line).unwrap() else {
        panic!("expected command");
    };
    assert_eq!(cmd.seq, 4);
    assert_eq!(cmd.from, Some(WirePos { row: 2, col: 1 }));
    assert_eq!(cmd.to, Some(WirePos { row: 2, col: 2 }));

    let hello = r#"{"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0"},"protocol_version":"1.0.0"}"#;
    let ParsedMessage::Hello(hello) = parse_message(hello).unwrap() else {
        panic!("expected hello");
    };
    assert!(hello.requested.stream_observations);
    assert!(hello.requested.stream_events);

    let unknown = r#"{"type":"teleport","seq":12}"#;
    assert!(matches!(
        parse_message(unknown).unwrap(),
        ParsedMessage::Unknown(u) if u.seq == 12
    ));
    assert!(parse_message("{not json").is_err());
}

#[test]
fn server_messages_are_flat_json() {
    let welcome = create_welcome(1, PROTOCOL_VERSION, 3, AssignedRole::Observer, Some(1), 4000);
    let v = serde_json::to_value(&welcome).unwrap();
    assert_eq!(v["type"], "welcome");
    assert_eq!(v["role"], "observer");
    assert_eq!(v["client_id"], 3);
    assert_eq!(v["controller_id"], 1);
    assert_eq!(v["game_id"], "match3");
    assert_eq!(v["capabilities"]["hint_delay_ms"], 4000);

    let none = serde_json::to_value(create_hint(2, None)).unwrap();
    assert_eq!(none["available"], false);
    assert!(none.get("from").is_none());
}
