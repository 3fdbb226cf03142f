//! Envelope framing for cueroom sessions.
//!
//! Frames are length-prefixed JSON: a 2-byte magic, a 4-byte LE payload
//! length, and an adjacently tagged envelope payload (STATE, REACTION
//! or COMMAND). The transport preserves per-connection order, so frame
//! order on a stream is causal order.

pub mod codec;
pub mod envelope;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, encode_frame, DEFAULT_MAX_PAYLOAD, HEADER_SIZE, MAGIC};
pub use envelope::{Envelope, Reaction};
pub use error::{Result, WireError};
pub use reader::EnvelopeReader;
pub use writer::EnvelopeWriter;
