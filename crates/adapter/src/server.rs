//! TCP server for the AI adapter
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::core::GameSnapshot;
use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::types::HINT_DELAY_MS;

/// Stable 64-bit FNV-1a hasher for `state_hash`.
#[derive(Debug, Clone)]
struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl std::hash::Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
    pub log_path: Option<String>,
    /// Idle time a client should wait before showing a hint, advertised in `welcome`
    pub hint_delay_ms: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 10,
            log_path: None,
            hint_delay_ms: HINT_DELAY_MS,
        }
    }
}

impl ServerConfig {
    /// Create from `MATCH3_AI_*` environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        let host = env::var("MATCH3_AI_HOST").unwrap_or(defaults.host);
        let port = env::var("MATCH3_AI_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let max_pending_commands = env::var("MATCH3_AI_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        let log_path = env::var("MATCH3_AI_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let hint_delay_ms = env::var("MATCH3_AI_HINT_DELAY_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.hint_delay_ms);

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
            log_path,
            hint_delay_ms,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid socket address {}:{}", self.host, self.port))
    }

    /// Whether a client's requested version shares our major version
    pub fn accepts_version(&self, requested: &str) -> bool {
        let major = |v: &str| v.split('.').next().map(str::trim).unwrap_or("").to_string();
        !requested.is_empty() && major(requested) == major(&self.protocol_version)
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: Arc<RwLock<Vec<ClientHandle>>>,
    controller: Arc<RwLock<Option<usize>>>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: Arc::new(RwLock::new(Vec::new())),
            controller: Arc::new(RwLock::new(None)),
        }
    }

    /// Check if AI is disabled via environment
    pub fn is_disabled() -> bool {
        std::env::var("MATCH3_AI_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

async fn is_handshaken(state: &ServerState, client_id: usize) -> bool {
    let clients = state.clients.read().await;
    clients
        .iter()
        .find(|c| c.id == client_id)
        .map(|c| c.handshaken)
        .unwrap_or(false)
}

async fn check_and_update_seq(state: &ServerState, client_id: usize, seq: u64) -> bool {
    let mut clients = state.clients.write().await;
    let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
        return true;
    };

    match client.last_seq {
        Some(prev) if seq <= prev => false,
        _ => {
            client.last_seq = Some(seq);
            true
        }
    }
}

async fn is_controller(state: &ServerState, client_id: usize) -> bool {
    *state.controller.read().await == Some(client_id)
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub is_controller: bool,
    pub stream_observations: bool,
    pub stream_events: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
pub enum ClientOutbound {
    Line(String),
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Observation(ObservationMessage),
    Event(EventMessage),
    Hint(HintMessage),
}

impl ClientOutbound {
    /// Serialize into `buf` without the trailing newline
    fn encode(&self, buf: &mut Vec<u8>) -> serde_json::Result<()> {
        fn json<T: Serialize>(buf: &mut Vec<u8>, v: &T) -> serde_json::Result<()> {
            serde_json::to_writer(buf, v)
        }

        buf.clear();
        match self {
            ClientOutbound::Line(line) => {
                buf.extend_from_slice(line.trim_end_matches('\n').as_bytes());
                Ok(())
            }
            ClientOutbound::Welcome(v) => json(buf, v),
            ClientOutbound::Ack(v) => json(buf, v),
            ClientOutbound::Error(v) => json(buf, v),
            ClientOutbound::Observation(v) => json(buf, v),
            ClientOutbound::Event(v) => json(buf, v),
            ClientOutbound::Hint(v) => json(buf, v),
        }
    }
}

type WireLog = mpsc::UnboundedSender<Vec<u8>>;

/// Append every line read or written to `path`
fn spawn_wire_log(path: String) -> WireLog {
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        use tokio::fs::OpenOptions;

        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => f,
            Err(e) => {
                warn!("[Adapter] cannot open wire log {}: {}", path, e);
                return;
            }
        };

        while let Some(mut line) = rx.recv().await {
            line.push(b'\n');
            if file.write_all(&line).await.is_err() {
                break;
            }
        }

        let _ = file.flush().await;
    });
    tx
}

/// Start the TCP server
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log = config.log_path.clone().map(spawn_wire_log);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    info!("[Adapter] TCP server listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0usize;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                dispatch(&state, msg).await;
            }
        });
    }

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!("[Adapter] Client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        let wire_log = wire_log.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state, command_tx, wire_log).await {
                warn!("[Adapter] Client {} error: {}", client_id, e);
            }
            info!("[Adapter] Client {} disconnected", client_id);
        });
    }
}

async fn dispatch(state: &ServerState, msg: OutboundMessage) {
    let clients = state.clients.read().await;
    let to_one = |client_id: usize, out: ClientOutbound| {
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(out);
        }
    };

    match msg {
        OutboundMessage::ToClient { client_id, line } => to_one(client_id, ClientOutbound::Line(line)),
        OutboundMessage::ToClientObservation { client_id, obs } => {
            to_one(client_id, ClientOutbound::Observation(obs))
        }
        OutboundMessage::ToClientAck { client_id, ack } => to_one(client_id, ClientOutbound::Ack(ack)),
        OutboundMessage::ToClientError { client_id, err } => {
            to_one(client_id, ClientOutbound::Error(err))
        }
        OutboundMessage::ToClientHint { client_id, hint } => {
            to_one(client_id, ClientOutbound::Hint(hint))
        }
        OutboundMessage::Broadcast { line } => {
            for c in clients.iter().filter(|c| c.handshaken) {
                let _ = c.tx.send(ClientOutbound::Line(line.clone()));
            }
        }
        OutboundMessage::BroadcastObservation { obs } => {
            for c in clients.iter().filter(|c| c.handshaken && c.stream_observations) {
                let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
            }
        }
        OutboundMessage::BroadcastEvent { event } => {
            for c in clients.iter().filter(|c| c.handshaken && c.stream_events) {
                let _ = c.tx.send(ClientOutbound::Event(event.clone()));
            }
        }
    }
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
    wire_log: Option<WireLog>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            addr,
            is_controller: false,
            stream_observations: false,
            stream_events: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let wire_log_out = wire_log.clone();
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            if let Err(e) = msg.encode(&mut buf) {
                warn!("[Adapter] dropping unserializable message: {}", e);
                continue;
            }
            if let Some(log_tx) = wire_log_out.as_ref() {
                let _ = log_tx.send(buf.clone());
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let send_error = |seq: u64, code: ErrorCode, message: &str| {
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break;
        }

        let raw_line = line.trim_end_matches(['\n', '\r']);
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(log_tx) = wire_log.as_ref() {
            let _ = log_tx.send(raw_line.as_bytes().to_vec());
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if is_handshaken(&state, client_id).await
                    && !check_and_update_seq(&state, client_id, hello.seq).await
                {
                    send_error(hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                if !state.config.accepts_version(&hello.protocol_version) {
                    send_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    break;
                }

                // First client to hello becomes controller.
                let (role, controller_id) = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    let became_controller = controller.is_none();
                    if became_controller {
                        *controller = Some(client_id);
                        info!("[Adapter] Client {} is now controller", client_id);
                    }
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.is_controller |= became_controller;
                        client.stream_observations = hello.requested.stream_observations;
                        client.stream_events = hello.requested.stream_events;
                    }
                    let role = if *controller == Some(client_id) {
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    };
                    (role, controller.map(|id| id as u64))
                };

                debug!(
                    "[Adapter] Client {} hello from {} {}",
                    client_id, hello.client.name, hello.client.version
                );
                let welcome = create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id as u64,
                    role,
                    controller_id,
                    state.config.hint_delay_ms,
                );
                let _ = tx.send(ClientOutbound::Welcome(welcome));

                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !is_handshaken(&state, client_id).await {
                    send_error(cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command");
                    continue;
                }
                if !check_and_update_seq(&state, client_id, cmd.seq).await {
                    send_error(cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                if !is_controller(&state, client_id).await {
                    send_error(cmd.seq, ErrorCode::NotController, "Only controller may send commands");
                    continue;
                }

                let mapped = match map_command(&cmd) {
                    Ok(c) => c,
                    Err((code, message)) => {
                        send_error(cmd.seq, code, &message);
                        continue;
                    }
                };

                // Ack is sent by the game loop once the command is applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(mapped),
                    })
                    .is_err()
                {
                    send_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                }
            }

            Ok(ParsedMessage::Control(ctrl)) => {
                if !is_handshaken(&state, client_id).await {
                    send_error(ctrl.seq, ErrorCode::HandshakeRequired, "Send hello before control");
                    continue;
                }
                if !check_and_update_seq(&state, client_id, ctrl.seq).await {
                    send_error(ctrl.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                let mut controller = state.controller.write().await;
                let mut clients = state.clients.write().await;
                match ctrl.action {
                    ControlAction::Claim if controller.is_none() => {
                        *controller = Some(client_id);
                        if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                            client.is_controller = true;
                        }
                        info!("[Adapter] Client {} claimed control", client_id);
                        let _ = tx.send(ClientOutbound::Ack(create_ack(ctrl.seq, None)));
                    }
                    ControlAction::Claim => {
                        send_error(ctrl.seq, ErrorCode::ControllerActive, "Controller already assigned");
                    }
                    ControlAction::Release if *controller == Some(client_id) => {
                        *controller = None;
                        if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                            client.is_controller = false;
                        }
                        info!("[Adapter] Client {} released control", client_id);
                        let _ = tx.send(ClientOutbound::Ack(create_ack(ctrl.seq, None)));
                    }
                    ControlAction::Release => {
                        send_error(ctrl.seq, ErrorCode::NotController, "Only controller may release");
                    }
                }
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                if is_handshaken(&state, client_id).await
                    && !check_and_update_seq(&state, client_id, unknown.seq).await
                {
                    send_error(unknown.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                send_error(unknown.seq, ErrorCode::InvalidCommand, "Unknown message type");
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                send_error(seq, ErrorCode::InvalidCommand, &format!("JSON parse error: {}", e));
            }
        }
    }

    // Remove client and promote the lowest remaining id if it held control.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;

        let was_controller = *controller == Some(client_id);
        clients.retain(|c| c.id != client_id);

        if was_controller {
            let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            *controller = next_id;
            match next_id {
                Some(new_id) => {
                    if let Some(c) = clients.iter_mut().find(|c| c.id == new_id) {
                        c.is_controller = true;
                    }
                    info!("[Adapter] Client {} promoted to controller", new_id);
                }
                None => info!("[Adapter] Controller {} released", client_id),
            }
        }
    }

    drop(tx);
    let _ = write_task.await;

    Ok(())
}

/// Map a protocol command into a game-loop command.
fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, (ErrorCode, String)> {
    match cmd.command {
        CommandName::Swap => match (cmd.from, cmd.to) {
            (Some(from), Some(to)) => Ok(ClientCommand::Swap {
                from: from.into(),
                to: to.into(),
            }),
            _ => Err((
                ErrorCode::InvalidCommand,
                "swap needs both `from` and `to`".to_string(),
            )),
        },
        CommandName::Reset => Ok(ClientCommand::Reset),
        CommandName::Hint => Ok(ClientCommand::Hint),
    }
}

/// Build an observation message from an engine snapshot
pub fn build_observation(snap: &GameSnapshot, seq: u64) -> ObservationMessage {
    use std::hash::{Hash, Hasher};

    let mut hasher = Fnv1aHasher::new();
    snap.board_hash.hash(&mut hasher);
    snap.stats.hash(&mut hasher);
    snap.phase.hash(&mut hasher);
    snap.game_over.hash(&mut hasher);
    snap.turn_id.hash(&mut hasher);
    snap.seed.hash(&mut hasher);
    let state_hash = StateHash(hasher.finish());

    let size = snap.size.max(1);
    let cells = snap.board.chunks(size).map(|row| row.to_vec()).collect();

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        playable: snap.playable(),
        phase: snap.phase.as_str().to_string(),
        game_over: snap.game_over,
        turn_id: snap.turn_id,
        seed: snap.seed,
        board: BoardSnapshot {
            size: snap.size as u8,
            cells,
        },
        score: snap.stats.score,
        moves_remaining: snap.stats.moves_remaining,
        wings_collected: snap.stats.wings_collected,
        state_hash,
    }
}
