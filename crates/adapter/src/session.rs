//! Game-loop side of the adapter.
//!
//! A [`Session`] owns the engine and turns each [`InboundCommand`] into the outbound
//! messages the server should deliver: an ack or error for the sender, then the turn's
//! events and a fresh observation for every streaming client.

use log::{debug, info, warn};

use crate::core::{Engine, GameSnapshot};
use crate::protocol::{
    create_ack, create_error, create_event, create_hint, ErrorCode, SwapOutcome,
};
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use crate::server::build_observation;

pub struct Session {
    engine: Engine,
    snapshot: GameSnapshot,
    out_seq: u64,
}

impl Session {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            snapshot: GameSnapshot::default(),
            out_seq: 0,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn next_seq(&mut self) -> u64 {
        self.out_seq += 1;
        self.out_seq
    }

    fn observation(&mut self) -> crate::protocol::ObservationMessage {
        self.engine.snapshot_into(&mut self.snapshot);
        let seq = self.next_seq();
        build_observation(&self.snapshot, seq)
    }

    /// Queued engine events, in order, followed by an observation of the settled board
    fn flush_turn(&mut self, out: &mut Vec<OutboundMessage>) {
        let turn_id = self.engine.turn_id();
        while let Some(event) = self.engine.next_event() {
            let seq = self.next_seq();
            out.push(OutboundMessage::BroadcastEvent {
                event: create_event(seq, turn_id, &event),
            });
        }
        let obs = self.observation();
        out.push(OutboundMessage::BroadcastObservation { obs });
    }

    /// Apply one inbound command
    pub fn handle(&mut self, cmd: InboundCommand) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        let client_id = cmd.client_id;

        let command = match cmd.payload {
            InboundPayload::SnapshotRequest => {
                let obs = self.observation();
                out.push(OutboundMessage::ToClientObservation { client_id, obs });
                return out;
            }
            InboundPayload::Command(command) => command,
        };

        match command {
            ClientCommand::Swap { from, to } => match self.engine.request_swap(from, to) {
                Ok(outcome) => {
                    debug!("[Adapter] swap {} -> {}: {:?}", from, to, outcome);
                    out.push(OutboundMessage::ToClientAck {
                        client_id,
                        ack: create_ack(cmd.seq, Some(SwapOutcome::from(outcome))),
                    });
                    self.flush_turn(&mut out);
                }
                Err(e) => {
                    out.push(OutboundMessage::ToClientError {
                        client_id,
                        err: create_error(cmd.seq, ErrorCode::from(&e), &e.to_string()),
                    });
                }
            },
            ClientCommand::Reset => match self.engine.reset() {
                Ok(()) => {
                    info!("[Adapter] client {} reset the game", client_id);
                    out.push(OutboundMessage::ToClientAck {
                        client_id,
                        ack: create_ack(cmd.seq, None),
                    });
                    self.flush_turn(&mut out);
                }
                Err(e) => {
                    warn!("[Adapter] reset failed: {}", e);
                    out.push(OutboundMessage::ToClientError {
                        client_id,
                        err: create_error(cmd.seq, ErrorCode::Internal, &e.to_string()),
                    });
                }
            },
            ClientCommand::Hint => {
                let hint = self.engine.hint().map(|h| (h.from, h.to));
                out.push(OutboundMessage::ToClientHint {
                    client_id,
                    hint: create_hint(cmd.seq, hint),
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EngineConfig, Grid, SequenceTiles};
    use crate::types::{GridPos, TileKind};

    fn sample_session() -> Session {
        use TileKind::*;
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
        Session::new(Engine::from_grid(config, grid, Box::new(source)).unwrap())
    }

    fn swap(seq: u64, from: GridPos, to: GridPos) -> InboundCommand {
        InboundCommand {
            client_id: 1,
            seq,
            payload: InboundPayload::Command(ClientCommand::Swap { from, to }),
        }
    }

    #[test]
    fn test_committed_swap_acks_then_streams_events() {
        let mut session = sample_session();
        let out = session.handle(swap(5, GridPos::new(0, 2), GridPos::new(1, 2)));

        let OutboundMessage::ToClientAck { client_id, ack } = &out[0] else {
            panic!("expected ack first, got {:?}", out[0]);
        };
        assert_eq!(*client_id, 1);
        assert_eq!(ack.seq, 5);
        assert_eq!(ack.swap.map(|s| s.score_delta), Some(30));

        let names: Vec<String> = out
            .iter()
            .filter_map(|m| match m {
                OutboundMessage::BroadcastEvent { event } => serde_json::to_value(&event.event)
                    .ok()
                    .and_then(|v| v["name"].as_str().map(str::to_string)),
                _ => None,
            })
            .collect();
        assert_eq!(names.first().map(String::as_str), Some("swapped"));
        assert!(names.iter().any(|n| n == "cells_cleared"));

        let Some(OutboundMessage::BroadcastObservation { obs }) = out.last() else {
            panic!("expected observation last");
        };
        assert_eq!(obs.score, 30);
        assert_eq!(obs.phase, "idle");
        assert!(!session.engine().is_processing());
    }

    #[test]
    fn test_illegal_swap_reports_error_code() {
        let mut session = sample_session();
        let out = session.handle(swap(2, GridPos::new(0, 0), GridPos::new(2, 2)));
        assert_eq!(out.len(), 1);
        let OutboundMessage::ToClientError { err, .. } = &out[0] else {
            panic!("expected error");
        };
        assert_eq!(err.code, ErrorCode::IllegalMove);

        let out = session.handle(swap(3, GridPos::new(0, 0), GridPos::new(-1, 0)));
        let OutboundMessage::ToClientError { err, .. } = &out[0] else {
            panic!("expected error");
        };
        assert_eq!(err.code, ErrorCode::InvalidPosition);
    }

    #[test]
    fn test_hint_and_snapshot_go_to_the_sender_only() {
        let mut session = sample_session();
        let out = session.handle(InboundCommand {
            client_id: 4,
            seq: 1,
            payload: InboundPayload::Command(ClientCommand::Hint),
        });
        let [OutboundMessage::ToClientHint { client_id: 4, hint }] = out.as_slice() else {
            panic!("expected one hint, got {:?}", out);
        };
        assert!(hint.available);

        let out = session.handle(InboundCommand {
            client_id: 4,
            seq: 2,
            payload: InboundPayload::SnapshotRequest,
        });
        assert!(matches!(
            out.as_slice(),
            [OutboundMessage::ToClientObservation { client_id: 4, .. }]
        ));
    }

    #[test]
    fn test_observation_seq_increases() {
        let mut session = sample_session();
        let a = session.observation().seq;
        let b = session.observation().seq;
        assert!(b > a);
    }
}
