//! BER (Basic Encoding Rules) codec for the subset of X.690 SNMP needs.
//!
//! Encoding builds messages back to front into an [`EncodeBuf`] so that
//! lengths are always known before their headers are written. Decoding is
//! zero-copy over [`bytes::Bytes`].

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::Decoder;
pub use encode::EncodeBuf;
pub use length::{MAX_LENGTH, decode_length, encode_length};
