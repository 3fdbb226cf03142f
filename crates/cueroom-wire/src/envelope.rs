use serde::{Deserialize, Serialize};

use cueroom_state::{Intent, SessionState};

use crate::error::Result;

/// An ephemeral reaction event: fire-and-forget, no durability.
///
/// The id is a millisecond timestamp used only as a client-side
/// animation key; it carries no delivery or dedup semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub token: String,
    pub id: u64,
}

impl Reaction {
    pub fn new(token: impl Into<String>, id: u64) -> Self {
        Self {
            token: token.into(),
            id,
        }
    }
}

/// The wire unit exchanged between host and viewers.
///
/// STATE only ever flows host to viewer and carries a complete
/// document; COMMAND only ever flows viewer to host; REACTION flows
/// both ways and is relayed by the host in star fashion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum Envelope {
    #[serde(rename = "STATE")]
    State(SessionState),
    #[serde(rename = "REACTION")]
    Reaction(Reaction),
    #[serde(rename = "COMMAND")]
    Command(Intent),
}

impl Envelope {
    /// Serialize to the JSON payload carried inside a frame.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserialize from a frame payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Wire name of the envelope kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Envelope::State(_) => "STATE",
            Envelope::Reaction(_) => "REACTION",
            Envelope::Command(_) => "COMMAND",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cueroom_state::GameMode;

    #[test]
    fn state_envelope_wire_shape() {
        let envelope = Envelope::State(SessionState::template());
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["kind"], "STATE");
        assert!(json["payload"].get("players1vs1").is_some());
    }

    #[test]
    fn command_envelope_wire_shape() {
        let envelope = Envelope::Command(Intent::Score {
            mode: GameMode::HeadsUp,
            id: 1,
            delta: 1,
        });
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["kind"], "COMMAND");
        assert_eq!(json["payload"]["action"], "SCORE");
    }

    #[test]
    fn reaction_envelope_roundtrip() {
        let envelope = Envelope::Reaction(Reaction::new("🎉", 1234));
        let payload = envelope.to_payload().unwrap();
        let back = Envelope::from_payload(&payload).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn malformed_payload_rejected() {
        let err = Envelope::from_payload(b"{\"kind\":\"NOPE\"}").unwrap_err();
        assert!(err.is_recoverable());
    }
}
