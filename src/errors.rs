use thiserror::Error;

use crate::types::BaseType;

/// Everything that can go wrong while decoding, encoding, or dispatching.
///
/// Unknown message and field numbers are never errors; they surface as raw
/// field bags through the generic listener instead.
#[derive(Debug, Error)]
pub enum Error {
    /// The input ended mid-header or mid-record.
    #[error("input ended early at byte {position}")]
    ShortRead { position: usize },

    /// The file header carries the wrong magic, an unsupported size, or is
    /// otherwise malformed.
    #[error("invalid file header at byte {position}: {reason}")]
    BadHeader { position: usize, reason: &'static str },

    /// The header protocol version is newer than this crate supports.
    #[error("unsupported protocol version {found:#04x} (supported major: {supported})")]
    UnsupportedProtocolVersion { found: u8, supported: u8 },

    /// A header or trailer CRC check failed. Records dispatched before the
    /// check are not retracted.
    #[error("CRC mismatch at byte {position}: found {found:#06x}, computed {computed:#06x}")]
    CrcMismatch { position: usize, found: u16, computed: u16 },

    /// A data record referenced a local message type with no installed
    /// definition.
    #[error("data record at byte {position} references undefined local type {local_type}")]
    UndefinedLocalType { position: usize, local_type: u8 },

    /// A definition declared a field size inconsistent with its base type.
    #[error(
        "field {field_num} of message {mesg_num} declares {size} bytes, \
         smaller than one {base_type:?} element"
    )]
    FieldSizeMismatch { mesg_num: u16, field_num: u8, base_type: BaseType, size: u8 },

    /// A field bag accessor was asked to read with an incompatible physical
    /// type (for example, a string field read as a number).
    #[error("field {field_num}: cannot read {stored} as {requested}")]
    TypeMismatch { field_num: u8, stored: &'static str, requested: &'static str },

    /// A field's encoded form does not fit the one-byte size of a
    /// definition record.
    #[error("field {field_num} of message {mesg_num} encodes to {size} bytes, over the 255 limit")]
    OversizedField { mesg_num: u16, field_num: u8, size: usize },

    /// A field's stored values do not lay out to the size its definition
    /// would declare, so the record cannot be encoded.
    #[error(
        "field {field_num} of message {mesg_num}: values occupy {actual} bytes, \
         definition declares {declared}"
    )]
    InconsistentField { mesg_num: u16, field_num: u8, declared: usize, actual: usize },

    /// A listener callback propagated a failure. The underlying cause is
    /// attached as the source.
    #[error("listener for message {mesg_num} failed")]
    ListenerFailure {
        mesg_num: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("write failed")]
    Io(#[from] std::io::Error),
}
