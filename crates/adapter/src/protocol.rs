//! Protocol module - JSON message types for the match-3 adapter
//!
//! Line-delimited JSON. Every message carries `type`, `seq` (sequence number) and `ts`
//! (timestamp in ms).

use serde::{Deserialize, Serialize};

use crate::core::{EngineEvent, MoveError, TileDrop, TileSpawn, TurnOutcome};
use crate::types::{GameStats, GridPos};

pub const PROTOCOL_VERSION: &str = "1.0.0";
pub const GAME_ID: &str = "match3";

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HelloType {
    #[serde(rename = "hello")]
    #[default]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CommandType {
    #[serde(rename = "command")]
    #[default]
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ControlType {
    #[serde(rename = "control")]
    #[default]
    Control,
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default = "default_true")]
    pub stream_observations: bool,
    #[serde(default = "default_true")]
    pub stream_events: bool,
}

impl Default for RequestedCapabilities {
    fn default() -> Self {
        Self {
            stream_observations: true,
            stream_events: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Board position on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WirePos {
    pub row: i8,
    pub col: i8,
}

impl From<GridPos> for WirePos {
    fn from(value: GridPos) -> Self {
        Self {
            row: value.row,
            col: value.col,
        }
    }
}

impl From<WirePos> for GridPos {
    fn from(value: WirePos) -> Self {
        GridPos::new(value.row, value.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Swap,
    Reset,
    Hint,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::Swap => "swap",
            CommandName::Reset => "reset",
            CommandName::Hint => "hint",
        }
    }
}

impl<'de> Deserialize<'de> for CommandName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("swap") {
            Ok(Self::Swap)
        } else if s.eq_ignore_ascii_case("reset") {
            Ok(Self::Reset)
        } else if s.eq_ignore_ascii_case("hint") {
            Ok(Self::Hint)
        } else {
            Err(serde::de::Error::custom("unknown command"))
        }
    }
}

impl Serialize for CommandName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Command message (controller only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub command: CommandName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<WirePos>, // For swap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<WirePos>, // For swap
}

/// Control message (claim/release controller status)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ControlType,
    pub seq: u64,
    pub ts: u64,
    pub action: ControlAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Claim,
    Release,
}

impl<'de> Deserialize<'de> for ControlAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        if s.eq_ignore_ascii_case("claim") {
            Ok(Self::Claim)
        } else if s.eq_ignore_ascii_case("release") {
            Ok(Self::Release)
        } else {
            Err(serde::de::Error::custom("invalid control action"))
        }
    }
}

impl Serialize for ControlAction {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            ControlAction::Claim => serializer.serialize_str("claim"),
            ControlAction::Release => serializer.serialize_str("release"),
        }
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    #[serde(rename = "ok")]
    Ok,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    HandshakeRequired,
    ProtocolMismatch,
    NotController,
    ControllerActive,
    InvalidCommand,
    InvalidPosition,
    IllegalMove,
    Busy,
    GameOver,
    Backpressure,
    Internal,
}

impl From<&MoveError> for ErrorCode {
    fn from(value: &MoveError) -> Self {
        match value {
            MoveError::InvalidPosition { .. } => ErrorCode::InvalidPosition,
            MoveError::IllegalMove { .. } => ErrorCode::IllegalMove,
            MoveError::ConcurrentMoveRejected => ErrorCode::Busy,
            MoveError::GameOver => ErrorCode::GameOver,
            MoveError::Grid(_) => ErrorCode::Internal,
        }
    }
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub formats: Vec<String>,
    pub commands: Vec<CommandName>,
    pub features: Vec<String>,
    pub hint_delay_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Committed,
    Reverted,
}

/// Result of a swap, attached to its ack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub outcome: OutcomeKind,
    pub rounds: u32,
    pub score_delta: u32,
    pub wings_delta: u32,
}

impl From<TurnOutcome> for SwapOutcome {
    fn from(value: TurnOutcome) -> Self {
        match value {
            TurnOutcome::Committed {
                rounds,
                score_delta,
                wings_delta,
            } => Self {
                outcome: OutcomeKind::Committed,
                rounds,
                score_delta,
                wings_delta,
            },
            TurnOutcome::Reverted => Self {
                outcome: OutcomeKind::Reverted,
                rounds: 0,
                score_delta: 0,
                wings_delta: 0,
            },
        }
    }
}

/// Acknowledgment, sent once a command has been applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap: Option<SwapOutcome>,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

/// Game state observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub playable: bool,
    pub phase: String,
    pub game_over: bool,
    pub turn_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    pub board: BoardSnapshot,
    pub score: u32,
    pub moves_remaining: u32,
    pub wings_collected: u32,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub size: u8,
    /// Rows of kind codes: 0 = empty, 1-8 = tile kind
    pub cells: Vec<Vec<u8>>,
}

/// Deterministic state hash serialized as lowercase hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{:016x}", self.0))
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "event")]
    Event,
}

/// One engine step, in the order the engine produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type")]
    pub msg_type: EventType,
    pub seq: u64,
    pub ts: u64,
    pub turn_id: u32,
    pub event: EventPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsPayload {
    pub score: u32,
    pub moves_remaining: u32,
    pub wings_collected: u32,
}

impl From<GameStats> for StatsPayload {
    fn from(value: GameStats) -> Self {
        Self {
            score: value.score,
            moves_remaining: value.moves_remaining,
            wings_collected: value.wings_collected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropPayload {
    pub tile: u32,
    pub col: i8,
    pub from_row: i8,
    pub to_row: i8,
}

impl From<&TileDrop> for DropPayload {
    fn from(value: &TileDrop) -> Self {
        Self {
            tile: value.tile.0,
            col: value.col,
            from_row: value.from_row,
            to_row: value.to_row,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPayload {
    pub tile: u32,
    pub row: i8,
    pub col: i8,
    pub kind: String,
}

impl From<&TileSpawn> for SpawnPayload {
    fn from(value: &TileSpawn) -> Self {
        Self {
            tile: value.tile.0,
            row: value.row,
            col: value.col,
            kind: value.kind.as_str().to_string(),
        }
    }
}

/// Wire form of [`EngineEvent`], tagged by `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum EventPayload {
    Swapped {
        from: WirePos,
        to: WirePos,
    },
    SwapReverted {
        from: WirePos,
        to: WirePos,
    },
    MoveCommitted {
        moves_remaining: u32,
    },
    Combo {
        round: u32,
        anchor: WirePos,
    },
    MultiMatch {
        round: u32,
        runs: u32,
    },
    BigRun {
        length: u8,
        orientation: String,
        kind: String,
        anchor: WirePos,
    },
    CollectibleReached {
        pos: WirePos,
        delta: u32,
    },
    CellsCleared {
        positions: Vec<WirePos>,
        round: u32,
    },
    TilesDropped {
        drops: Vec<DropPayload>,
    },
    TilesIntroduced {
        tiles: Vec<SpawnPayload>,
    },
    StatsUpdated(StatsPayload),
    BoardStuck,
    BoardReshuffled {
        tiles: Vec<SpawnPayload>,
    },
    GameOver(StatsPayload),
}

impl From<&EngineEvent> for EventPayload {
    fn from(value: &EngineEvent) -> Self {
        match value {
            EngineEvent::Swapped { from, to } => EventPayload::Swapped {
                from: (*from).into(),
                to: (*to).into(),
            },
            EngineEvent::SwapReverted { from, to } => EventPayload::SwapReverted {
                from: (*from).into(),
                to: (*to).into(),
            },
            EngineEvent::MoveCommitted { moves_remaining } => EventPayload::MoveCommitted {
                moves_remaining: *moves_remaining,
            },
            EngineEvent::Combo { round, anchor } => EventPayload::Combo {
                round: *round,
                anchor: (*anchor).into(),
            },
            EngineEvent::MultiMatch { round, runs } => EventPayload::MultiMatch {
                round: *round,
                runs: *runs,
            },
            EngineEvent::BigRun {
                length,
                orientation,
                kind,
                anchor,
            } => EventPayload::BigRun {
                length: *length,
                orientation: orientation.as_str().to_string(),
                kind: kind.as_str().to_string(),
                anchor: (*anchor).into(),
            },
            EngineEvent::CollectibleReached { pos, delta } => EventPayload::CollectibleReached {
                pos: (*pos).into(),
                delta: *delta,
            },
            EngineEvent::CellsCleared { positions, round } => EventPayload::CellsCleared {
                positions: positions.iter().map(|p| WirePos::from(*p)).collect(),
                round: *round,
            },
            EngineEvent::TilesDropped { drops } => EventPayload::TilesDropped {
                drops: drops.iter().map(DropPayload::from).collect(),
            },
            EngineEvent::TilesIntroduced { tiles } => EventPayload::TilesIntroduced {
                tiles: tiles.iter().map(SpawnPayload::from).collect(),
            },
            EngineEvent::StatsUpdated(stats) => EventPayload::StatsUpdated((*stats).into()),
            EngineEvent::BoardStuck => EventPayload::BoardStuck,
            EngineEvent::BoardReshuffled { tiles } => EventPayload::BoardReshuffled {
                tiles: tiles.iter().map(SpawnPayload::from).collect(),
            },
            EngineEvent::GameOver(stats) => EventPayload::GameOver((*stats).into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HintType {
    #[serde(rename = "hint")]
    Hint,
}

/// Answer to a `hint` command; `from`/`to` are absent on a deadlocked board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintMessage {
    #[serde(rename = "type")]
    pub msg_type: HintType,
    pub seq: u64,
    pub ts: u64,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<WirePos>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<WirePos>,
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
        #[serde(rename = "control")]
        Control(ControlMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Ok(InboundMessage::Control(m)) => Ok(ParsedMessage::Control(m)),
        Err(e) => {
            // An unknown message type is reported, not treated as a parse failure.
            #[derive(Debug, Deserialize)]
            struct Envelope<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let envelope = serde_json::from_str::<Envelope>(json)?;
            let msg_type = envelope.msg_type.unwrap_or("unknown");
            if !matches!(msg_type, "hello" | "command" | "control") {
                return Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: envelope.seq.unwrap_or(0),
                }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Control(ControlMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities::default(),
    }
}

/// Create a swap command
pub fn create_swap(seq: u64, from: GridPos, to: GridPos) -> CommandMessage {
    CommandMessage {
        msg_type: CommandType::Command,
        seq,
        ts: current_timestamp_ms(),
        command: CommandName::Swap,
        from: Some(from.into()),
        to: Some(to.into()),
    }
}

/// Create a command without arguments (`reset`, `hint`)
pub fn create_command(seq: u64, command: CommandName) -> CommandMessage {
    CommandMessage {
        msg_type: CommandType::Command,
        seq,
        ts: current_timestamp_ms(),
        command,
        from: None,
        to: None,
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
    hint_delay_ms: u32,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: GAME_ID.to_string(),
        capabilities: ServerCapabilities {
            formats: vec!["json".to_string()],
            commands: vec![CommandName::Swap, CommandName::Reset, CommandName::Hint],
            features: ["events", "state_hash", "wings", "hint"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hint_delay_ms,
        },
    }
}

/// Create an acknowledgment
pub fn create_ack(seq: u64, swap: Option<SwapOutcome>) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: AckStatus::Ok,
        swap,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Create an event message
pub fn create_event(seq: u64, turn_id: u32, event: &EngineEvent) -> EventMessage {
    EventMessage {
        msg_type: EventType::Event,
        seq,
        ts: current_timestamp_ms(),
        turn_id,
        event: EventPayload::from(event),
    }
}

/// Create a hint message
pub fn create_hint(seq: u64, hint: Option<(GridPos, GridPos)>) -> HintMessage {
    HintMessage {
        msg_type: HintType::Hint,
        seq,
        ts: current_timestamp_ms(),
        available: hint.is_some(),
        from: hint.map(|(f, _)| f.into()),
        to: hint.map(|(_, t)| t.into()),
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
