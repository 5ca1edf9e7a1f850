//! Envelope decoding: JSON envelope → Avro container → normalized records.

pub mod envelope;
pub mod value;

pub use envelope::EnvelopeDecoder;
pub use value::{FieldValue, Record};
