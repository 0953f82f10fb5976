use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use match3::adapter::protocol::{create_command, create_hello, create_swap, CommandName};
use match3::adapter::server::{run_server, ServerConfig};
use match3::adapter::{InboundCommand, OutboundMessage, Session};
use match3::core::{Engine, EngineConfig, Grid, SequenceTiles};
use match3::types::{GridPos, TileKind, TileKind::*};

type Reader = Lines<BufReader<OwnedReadHalf>>;

fn test_config(max_pending: usize) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_pending_commands: max_pending,
        ..ServerConfig::default()
    }
}

async fn start(
    max_pending: usize,
) -> (
    SocketAddr,
    mpsc::Receiver<InboundCommand>,
    mpsc::UnboundedSender<OutboundMessage>,
    JoinHandle<()>,
) {
    let config = test_config(max_pending);
    let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
    let (ready_tx, ready_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let _ = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await;
    });

    let addr = tokio::time::timeout(Duration::from_secs(2), ready_rx)
        .await
        .expect("server did not signal ready")
        .expect("ready channel dropped");
    (addr, cmd_rx, out_tx, handle)
}

/// Engine loop driven by a [`Session`] over the 4x4 sample board.
fn spawn_session(
    mut cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
) -> JoinHandle<()> {
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
    let source = SequenceTiles::new([Cola, Bucket, Donut]);
    let engine = Engine::from_grid(config, grid, Box::new(source)).unwrap();

    tokio::spawn(async move {
        let mut session = Session::new(engine);
        while let Some(cmd) = cmd_rx.recv().await {
            for msg in session.handle(cmd) {
                let _ = out_tx.send(msg);
            }
        }
    })
}

async fn connect(addr: SocketAddr) -> (Reader, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.expect("connect failed");
    let (read_half, write_half) = stream.into_split();
    (BufReader::new(read_half).lines(), write_half)
}

async fn send_line(w: &mut OwnedWriteHalf, line: &str) {
    w.write_all(line.as_bytes()).await.unwrap();
    w.write_all(b"\n").await.unwrap();
    w.flush().await.unwrap();
}

async fn send_json<T: serde::Serialize>(w: &mut OwnedWriteHalf, msg: &T) {
    send_line(w, &serde_json::to_string(msg).unwrap()).await;
}

async fn read_json(lines: &mut Reader) -> serde_json::Value {
    let line = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for line")
        .expect("io error")
        .expect("expected line");
    serde_json::from_str(&line).unwrap()
}

/// Read until a message of `msg_type` arrives, skipping streamed events and observations.
async fn read_until(lines: &mut Reader, msg_type: &str) -> serde_json::Value {
    for _ in 0..64 {
        let v = read_json(lines).await;
        if v["type"] == msg_type {
            return v;
        }
    }
    panic!("no {} message", msg_type);
}

#[tokio::test]
async fn hello_swap_ack_events_and_observation() {
    let (addr, cmd_rx, out_tx, server) = start(8).await;
    let engine = spawn_session(cmd_rx, out_tx);
    let (mut lines, mut w) = connect(addr).await;

    send_json(&mut w, &create_hello(1, "e2e-test", "1.0.0")).await;
    let welcome = read_json(&mut lines).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["seq"], 1);
    assert_eq!(welcome["role"], "controller");
    assert_eq!(welcome["game_id"], "match3");
    assert_eq!(welcome["capabilities"]["hint_delay_ms"], 5000);

    // Hello with streaming on triggers an immediate observation.
    let obs = read_json(&mut lines).await;
    assert_eq!(obs["type"], "observation");
    assert_eq!(obs["board"]["size"], 4);
    assert_eq!(obs["board"]["cells"][0][0], 1);
    assert_eq!(obs["moves_remaining"], 30);

    send_json(&mut w, &create_swap(2, GridPos::new(0, 2), GridPos::new(1, 2))).await;
    let ack = read_json(&mut lines).await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["seq"], 2);
    assert_eq!(ack["swap"]["outcome"], "committed");
    assert_eq!(ack["swap"]["score_delta"], 30);
    assert_eq!(ack["swap"]["wings_delta"], 3);

    let first_event = read_json(&mut lines).await;
    assert_eq!(first_event["type"], "event");
    assert_eq!(first_event["event"]["name"], "swapped");
    assert_eq!(first_event["turn_id"], 1);

    let obs = read_until(&mut lines, "observation").await;
    assert_eq!(obs["score"], 30);
    assert_eq!(obs["wings_collected"], 3);
    assert_eq!(obs["moves_remaining"], 29);
    assert_eq!(obs["playable"], true);
    assert_eq!(obs["state_hash"].as_str().map(str::len), Some(16));

    send_json(&mut w, &create_command(3, CommandName::Hint)).await;
    let hint = read_until(&mut lines, "hint").await;
    assert_eq!(hint["seq"], 3);
    assert!(hint["available"].is_boolean());

    engine.abort();
    server.abort();
}

#[tokio::test]
async fn engine_errors_come_back_with_codes() {
    let (addr, cmd_rx, out_tx, server) = start(8).await;
    let engine = spawn_session(cmd_rx, out_tx);
    let (mut lines, mut w) = connect(addr).await;

    send_json(&mut w, &create_hello(1, "e2e-test", "1.0.0")).await;
    read_until(&mut lines, "observation").await;

    send_line(
        &mut w,
        r#"{"type":"command","seq":2,"ts":1,"command":"swap","from":{"row":0,"col":0},"to":{"row":2,"col":0}}"#,
    )
    .await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["seq"], 2);
    assert_eq!(err["code"], "illegal_move");

    send_json(&mut w, &create_swap(3, GridPos::new(3, 3), GridPos::new(3, 4))).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_position");

    // Non-matching swap is acknowledged as reverted, not rejected.
    send_json(&mut w, &create_swap(4, GridPos::new(3, 0), GridPos::new(3, 1))).await;
    let ack = read_json(&mut lines).await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["swap"]["outcome"], "reverted");

    engine.abort();
    server.abort();
}

#[tokio::test]
async fn protocol_rules_are_enforced() {
    let (addr, _cmd_rx, _out_tx, server) = start(8).await;
    let (mut lines, mut w) = connect(addr).await;

    send_json(&mut w, &create_command(1, CommandName::Reset)).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "handshake_required");

    let mut hello = create_hello(2, "e2e-test", "1.0.0");
    hello.requested.stream_observations = false;
    send_json(&mut w, &hello).await;
    assert_eq!(read_json(&mut lines).await["type"], "welcome");

    send_json(&mut w, &create_command(2, CommandName::Hint)).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 2);

    send_line(&mut w, r#"{"type":"command","seq":5,"ts":1,"command":"swap"}"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");

    send_line(&mut w, r#"{"type":"teleport","seq":6}"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 6);

    send_line(&mut w, r#"{"type":"command","seq":7,"#).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "invalid_command");
    assert_eq!(err["seq"], 7);

    server.abort();
}

#[tokio::test]
async fn protocol_mismatch_closes_connection() {
    let (addr, _cmd_rx, _out_tx, server) = start(8).await;
    let (mut lines, mut w) = connect(addr).await;

    send_json(&mut w, &create_hello(1, "old-client", "2.0.0")).await;
    let err = read_json(&mut lines).await;
    assert_eq!(err["code"], "protocol_mismatch");

    let next = tokio::time::timeout(Duration::from_secs(2), lines.next_line())
        .await
        .expect("timeout waiting for close")
        .unwrap();
    assert!(next.is_none());

    server.abort();
}

#[tokio::test]
async fn backpressure_returns_error() {
    let (addr, mut cmd_rx, _out_tx, server) = start(1).await;
    let (mut lines, mut w) = connect(addr).await;

    let mut hello = create_hello(1, "e2e-test", "1.0.0");
    hello.requested.stream_observations = false;
    send_json(&mut w, &hello).await;
    assert_eq!(read_json(&mut lines).await["type"], "welcome");

    // Two commands without draining the queue; the second one is refused.
    send_json(&mut w, &create_command(2, CommandName::Hint)).await;
    send_json(&mut w, &create_command(3, CommandName::Hint)).await;

    let first = tokio::time::timeout(Duration::from_secs(2), cmd_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.seq, 2);

    let err = read_until(&mut lines, "error").await;
    assert_eq!(err["seq"], 3);
    assert_eq!(err["code"], "backpressure");

    server.abort();
}

#[tokio::test]
async fn observers_cannot_command_until_promoted() {
    let (addr, mut cmd_rx, _out_tx, server) = start(8).await;

    let (mut lines1, mut w1) = connect(addr).await;
    let mut hello = create_hello(1, "first", "1.0.0");
    hello.requested.stream_observations = false;
    send_json(&mut w1, &hello).await;
    assert_eq!(read_json(&mut lines1).await["role"], "controller");

    let (mut lines2, mut w2) = connect(addr).await;
    let mut hello = create_hello(1, "second", "1.0.0");
    hello.requested.stream_observations = false;
    send_json(&mut w2, &hello).await;
    let welcome = read_json(&mut lines2).await;
    assert_eq!(welcome["role"], "observer");
    assert_eq!(welcome["controller_id"], 1);

    send_json(&mut w2, &create_command(2, CommandName::Hint)).await;
    assert_eq!(read_json(&mut lines2).await["code"], "not_controller");

    send_line(&mut w2, r#"{"type":"control","seq":3,"ts":1,"action":"claim"}"#).await;
    assert_eq!(read_json(&mut lines2).await["code"], "controller_active");

    // Controller leaves; the observer is promoted and its commands go through.
    drop(w1);
    drop(lines1);

    let mut accepted = None;
    for seq in 10..40u64 {
        send_json(&mut w2, &create_command(seq, CommandName::Hint)).await;
        tokio::select! {
            cmd = cmd_rx.recv() => {
                accepted = cmd;
                break;
            }
            v = read_json(&mut lines2) => {
                assert_eq!(v["code"], "not_controller");
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
    }
    let cmd = accepted.expect("promoted observer never got through");
    assert_eq!(cmd.client_id, 2);

    server.abort();
}
