//! Adapter module - AI control via TCP socket with JSON protocol
//!
//! This crate lets external agents play the match-3 engine over a TCP socket. The engine
//! stays synchronous; a tokio runtime owns the sockets and hands commands to the game loop
//! through a bounded channel.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:7777)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome`
//! 3. **Controller Assignment**: First client to hello becomes the controller
//! 4. **Commanding**: Controller sends `swap`, `hint`, or `reset` commands
//! 5. **Streaming**: Every applied command is followed by the engine's events and an
//!    observation of the settled board
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: Initial handshake with client info and requested streams
//! - **command**: `swap` two adjacent cells, ask for a `hint`, or `reset` the game
//! - **control**: Claim or release controller status
//!
//! ## Server → Client
//!
//! - **welcome**: Response to hello with the assigned role and server capabilities
//! - **ack**: Command applied; swaps carry their outcome (committed or reverted)
//! - **error**: Error response with code and message
//! - **event**: One engine step (swap, clear, drop, refill, game over, ...)
//! - **observation**: Full board snapshot with score, moves, wings, and `state_hash`
//! - **hint**: A match-producing swap, or `available: false` on a stuck board
//!
//! # Environment Variables
//!
//! - `MATCH3_AI_HOST`: Bind address (default: "127.0.0.1")
//! - `MATCH3_AI_PORT`: Port number (default: 7777)
//! - `MATCH3_AI_MAX_PENDING`: Command queue depth before `backpressure` errors (default: 10)
//! - `MATCH3_AI_LOG_PATH`: Append every wire line to this file
//! - `MATCH3_AI_HINT_DELAY_MS`: Idle time before clients should show a hint, sent in `welcome` (default: 5000)
//! - `MATCH3_AI_DISABLED`: Set to "1" or "true" to disable adapter entirely
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":2,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Server -> Client: {"type":"observation","seq":1,"ts":2,"playable":true,"board":{"size":8,"cells":[[1,3,...],...]},...}
//! Client -> Server: {"type":"command","seq":2,"ts":3,"command":"swap","from":{"row":0,"col":2},"to":{"row":1,"col":2}}
//! Server -> Client: {"type":"ack","seq":2,"ts":3,"status":"ok","swap":{"outcome":"committed","rounds":1,...}}
//! Server -> Client: {"type":"event","seq":2,"ts":3,"turn_id":1,"event":{"name":"swapped",...}}
//! ```
//!
//! # Testing
//!
//! ```bash
//! nc 127.0.0.1 7777
//! {"type":"hello","seq":1,"ts":0,"client":{"name":"nc","version":"0"},"protocol_version":"1.0.0"}
//! ```

pub mod protocol;
pub mod runtime;
pub mod server;
pub mod session;

pub use match3_core as core;
pub use match3_types as types;

// Re-export protocol types for convenience
pub use protocol::*;
pub use runtime::{Adapter, ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
pub use server::*;
pub use session::Session;
