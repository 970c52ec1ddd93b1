//! A codec for the FIT binary activity-file format.
//!
//! The crate decodes FIT streams into dynamically-typed field bags
//! ([`Mesg`]), encodes field bags back into complete files, and routes
//! decoded records to registered listeners. A built-in profile registry
//! supplies field names, base types and scale/offset transforms; messages
//! and fields missing from the registry still decode, as raw values.
//!
//! Decoding is incremental: [`Decoder`] accepts byte chunks of any size
//! and never blocks or spawns. For in-memory data the [`Fit`] wrapper and
//! the [`Decoder::decode`] / [`Encoder::encode`] helpers cover the common
//! cases.
//!
//! # Examples
//!
//! Encode a `file_id` message and decode it back:
//!
//! ```
//! use fitcodec::{Decoder, EncodeOptions, Encoder, Mesg, Selector};
//!
//! let mut file_id = Mesg::new(0);
//! file_id.set_u8(0, 4, 0, Selector::Main)?; // type: activity
//! file_id.set_u16(1, 1, 0, Selector::Main)?; // manufacturer: garmin
//! let bytes = Encoder::encode(&[file_id], EncodeOptions::default())?;
//!
//! let mesgs = Decoder::decode(&bytes)?;
//! assert_eq!(mesgs.len(), 1);
//! assert_eq!(mesgs[0].get_u16(1, 0, Selector::Main)?, Some(1));
//! # Ok::<(), fitcodec::Error>(())
//! ```

pub mod crc;
pub mod decoder;
pub mod dispatch;
pub mod encoder;
pub mod errors;
pub mod mesg;
pub mod messages;
pub mod parser;
pub mod profile;
pub mod timestamp;
pub mod types;

pub use crate::crc::crc;
pub use crate::decoder::{Decoder, SUPPORTED_PROTOCOL_MAJOR};
pub use crate::dispatch::{MesgBroadcaster, MesgListener};
pub use crate::encoder::{EncodeOptions, Encoder, PROFILE_VERSION, PROTOCOL_VERSION};
pub use crate::errors::Error;
pub use crate::mesg::{DeveloperField, Field, Mesg, Selector};
pub use crate::types::{
    BaseType, FileHeader, MessageDefinition, Record, RecordHeader, Value,
};

/// A complete FIT byte slice with a validated header.
///
/// Borrows the underlying data; construction checks the envelope (magic,
/// header size, header CRC where present and non-zero) but decodes no
/// records. Iteration decodes on demand and simply stops at the first
/// malformed record, which suits scanning; use [`Decoder`] directly when
/// errors matter.
pub struct Fit<'a> {
    pub header: FileHeader,
    pub data: &'a [u8],
}

pub struct RecordIterator {
    decoder: Decoder,
}

pub struct MesgIterator {
    decoder: Decoder,
}

impl<'a> Fit<'a> {
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Fit<'a>, Error> {
        let (_, header) = parser::file_header(bytes).map_err(|error| match error {
            nom::Err::Incomplete(_) => Error::ShortRead { position: bytes.len() },
            _ => Error::BadHeader { position: 0, reason: "bad magic tag or unsupported header size" },
        })?;
        if let Some(checksum) = header.checksum {
            let computed = bytes[..12].iter().fold(0, crc);
            if checksum != 0 && checksum != computed {
                return Err(Error::CrcMismatch { position: 12, found: checksum, computed });
            }
        }
        Ok(Fit { header, data: bytes })
    }

    /// Iterates every record: definitions, data records, and the trailing
    /// checksum of each chained file.
    pub fn records(&self) -> RecordIterator {
        let mut decoder = Decoder::new();
        let _ = decoder.feed(self.data);
        RecordIterator { decoder }
    }

    /// Iterates the data records only.
    pub fn mesgs(&self) -> MesgIterator {
        let mut decoder = Decoder::new();
        let _ = decoder.feed(self.data);
        MesgIterator { decoder }
    }

    /// Computes the end-of-file checksum over everything but the trailer.
    pub fn checksum(&self) -> u16 {
        match self.data.len() {
            0 | 1 => 0,
            len => self.data[..len - 2].iter().fold(0, crc),
        }
    }

    /// Whether the stored end-of-file checksum matches the computed one.
    pub fn verify(&self) -> bool {
        match self.data.len() {
            0 | 1 => false,
            len => {
                let stored = u16::from_le_bytes([self.data[len - 2], self.data[len - 1]]);
                stored == self.checksum()
            }
        }
    }
}

impl Iterator for RecordIterator {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.decoder.poll_record()
    }
}

impl Iterator for MesgIterator {
    type Item = Mesg;

    fn next(&mut self) -> Option<Mesg> {
        self.decoder.poll_mesg()
    }
}
