//! The streaming decoder: a byte-in, events-out automaton.
//!
//! The caller feeds byte chunks of any size; the decoder buffers a partial
//! tail between calls and emits decoded records in stream order. It holds
//! the local-message-type table, the running CRC, the rolling timestamp
//! reference, and the developer-field registry for the file currently being
//! decoded. All state is owned by a single caller; nothing here suspends or
//! spawns.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use log::{debug, warn};

use crate::crc::Crc;
use crate::dispatch::MesgBroadcaster;
use crate::errors::Error;
use crate::mesg::{DeveloperField, Field, Mesg};
use crate::parser;
use crate::profile::{self, mesg_num};
use crate::timestamp::{RollingTimestamp, TIMESTAMP_FIELD};
use crate::types::{
    BaseType, FileHeader, MessageDefinition, Record, RecordHeader, RecordType, Value,
};

/// Highest protocol major version this decoder understands.
pub const SUPPORTED_PROTOCOL_MAJOR: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FileHeader,
    RecordHeader,
    DefinitionBody(u8),
    DataBody(u8),
    CrcTrailer,
    /// Between files: either the stream ends here, or another header
    /// follows and decoding restarts with a fresh local-type table.
    ChainedHeader,
    Failed,
}

enum Step {
    Continue,
    NeedMore,
}

pub struct Decoder {
    state: State,
    buffer: Vec<u8>,
    /// Absolute stream offset of `buffer[0]`.
    position: usize,
    crc: Crc,
    header: Option<FileHeader>,
    data_remaining: usize,
    definitions: [Option<Rc<MessageDefinition>>; 16],
    /// `(developer_data_index, field_number)` -> base type, registered by
    /// field-description records.
    developer_types: HashMap<(u8, u8), BaseType>,
    /// Rolling counters for accumulating components, keyed by
    /// `(message_number, destination_field)`.
    accumulators: HashMap<(u16, u8), u64>,
    rolling: RollingTimestamp,
    records: VecDeque<Record>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Decoder {
        Decoder {
            state: State::FileHeader,
            buffer: Vec::new(),
            position: 0,
            crc: Crc::new(),
            header: None,
            data_remaining: 0,
            definitions: Default::default(),
            developer_types: HashMap::new(),
            accumulators: HashMap::new(),
            rolling: RollingTimestamp::new(),
            records: VecDeque::new(),
        }
    }

    /// The most recently decoded file header.
    pub fn header(&self) -> Option<FileHeader> {
        self.header
    }

    /// Feeds a chunk of bytes, decoding as many complete items as possible.
    /// Decoded records queue up for [`poll_record`](Self::poll_record) /
    /// [`poll_mesg`](Self::poll_mesg); records decoded before an error stay
    /// queued.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.buffer.extend_from_slice(bytes);
        loop {
            match self.step() {
                Ok(Step::Continue) => continue,
                Ok(Step::NeedMore) => return Ok(()),
                Err(error) => {
                    self.state = State::Failed;
                    return Err(error);
                }
            }
        }
    }

    /// Feeds a chunk and dispatches every decoded data record through the
    /// broadcaster in stream order. Records decoded before a failure are
    /// dispatched before the failure is returned.
    pub fn feed_into(
        &mut self,
        bytes: &[u8],
        broadcaster: &mut MesgBroadcaster,
    ) -> Result<(), Error> {
        let result = self.feed(bytes);
        while let Some(record) = self.records.pop_front() {
            if let Record::Mesg(mesg) = record {
                broadcaster.dispatch(&mesg)?;
            }
        }
        result
    }

    /// Next decoded record, in stream order.
    pub fn poll_record(&mut self) -> Option<Record> {
        self.records.pop_front()
    }

    /// Next decoded data record, skipping definitions and checksums.
    pub fn poll_mesg(&mut self) -> Option<Mesg> {
        loop {
            match self.records.pop_front()? {
                Record::Mesg(mesg) => return Some(mesg),
                _ => continue,
            }
        }
    }

    /// Declares the end of input. Fails with `ShortRead` if the stream
    /// stopped mid-file.
    pub fn finish(&self) -> Result<(), Error> {
        match self.state {
            State::ChainedHeader if self.buffer.is_empty() => Ok(()),
            State::Failed => Ok(()), // the error was already reported
            _ => Err(Error::ShortRead { position: self.position }),
        }
    }

    /// Decodes a complete in-memory stream into field bags.
    pub fn decode(bytes: &[u8]) -> Result<Vec<Mesg>, Error> {
        let mut decoder = Decoder::new();
        decoder.feed(bytes)?;
        decoder.finish()?;
        let mut mesgs = Vec::new();
        while let Some(mesg) = decoder.poll_mesg() {
            mesgs.push(mesg);
        }
        Ok(mesgs)
    }

    /// Decodes a complete in-memory stream, dispatching records as they
    /// appear.
    pub fn decode_into(bytes: &[u8], broadcaster: &mut MesgBroadcaster) -> Result<(), Error> {
        let mut decoder = Decoder::new();
        decoder.feed_into(bytes, broadcaster)?;
        decoder.finish()
    }

    fn step(&mut self) -> Result<Step, Error> {
        match self.state {
            State::FileHeader => self.step_header(),
            State::ChainedHeader => {
                if self.buffer.is_empty() {
                    return Ok(Step::NeedMore);
                }
                debug!("chained file at byte {}", self.position);
                self.reset_file_state();
                self.step_header()
            }
            State::RecordHeader => self.step_record_header(),
            State::DefinitionBody(header) => self.step_definition(header),
            State::DataBody(header) => self.step_data(header),
            State::CrcTrailer => self.step_trailer(),
            State::Failed => Ok(Step::NeedMore),
        }
    }

    /// Clears everything scoped to one file of a chained stream.
    fn reset_file_state(&mut self) {
        self.definitions = Default::default();
        self.developer_types.clear();
        self.accumulators.clear();
        self.rolling.reset();
        self.crc.reset();
    }

    fn step_header(&mut self) -> Result<Step, Error> {
        let (consumed, header) = match parser::file_header(&self.buffer) {
            Ok((rest, header)) => (self.buffer.len() - rest.len(), header),
            Err(nom::Err::Incomplete(_)) => return Ok(Step::NeedMore),
            Err(_) => {
                return Err(Error::BadHeader {
                    position: self.position,
                    reason: "bad magic tag or unsupported header size",
                })
            }
        };
        if header.protocol >> 4 > SUPPORTED_PROTOCOL_MAJOR {
            return Err(Error::UnsupportedProtocolVersion {
                found: header.protocol,
                supported: SUPPORTED_PROTOCOL_MAJOR,
            });
        }
        if let Some(expected) = header.checksum {
            // A zero header CRC means "unchecked".
            let computed = self.buffer[..12].iter().fold(0, crate::crc::crc);
            if expected != 0 && expected != computed {
                return Err(Error::CrcMismatch {
                    position: self.position + 12,
                    found: expected,
                    computed,
                });
            }
        }
        debug!(
            "file header: protocol {:#04x}, profile {}, {} data bytes",
            header.protocol, header.profile, header.data_size
        );
        self.data_remaining = header.data_size as usize;
        self.header = Some(header);
        self.advance(consumed);
        self.state = if self.data_remaining == 0 {
            State::CrcTrailer
        } else {
            State::RecordHeader
        };
        Ok(Step::Continue)
    }

    fn step_record_header(&mut self) -> Result<Step, Error> {
        if self.data_remaining == 0 {
            self.state = State::CrcTrailer;
            return Ok(Step::Continue);
        }
        let Some(&header) = self.buffer.first() else {
            return Ok(Step::NeedMore);
        };
        self.advance(1);
        self.data_remaining = self.data_remaining.saturating_sub(1);
        self.state = match header.record_type() {
            RecordType::Definition => State::DefinitionBody(header),
            RecordType::Data => State::DataBody(header),
        };
        Ok(Step::Continue)
    }

    fn step_definition(&mut self, header: u8) -> Result<Step, Error> {
        let (consumed, definition) = match parser::message_definition(header)(&self.buffer) {
            Ok((rest, definition)) => (self.buffer.len() - rest.len(), definition),
            Err(nom::Err::Incomplete(_)) => return Ok(Step::NeedMore),
            Err(_) => {
                return Err(Error::BadHeader {
                    position: self.position,
                    reason: "malformed definition record",
                })
            }
        };
        for field in &definition.fields {
            if (field.size as usize) < field.base_type.size() {
                return Err(Error::FieldSizeMismatch {
                    mesg_num: definition.number,
                    field_num: field.number,
                    base_type: field.base_type,
                    size: field.size,
                });
            }
        }
        let local = header.local_type();
        debug!(
            "definition: local {} -> global {} ({}), {} bytes",
            local,
            definition.number,
            profile::mesg_name(definition.number).unwrap_or("unknown"),
            definition.length
        );
        let definition = Rc::new(definition);
        self.definitions[local as usize] = Some(Rc::clone(&definition));
        self.records.push_back(Record::Definition(local, definition));
        self.advance(consumed);
        self.data_remaining = self.data_remaining.saturating_sub(consumed);
        self.state = State::RecordHeader;
        Ok(Step::Continue)
    }

    fn step_data(&mut self, header: u8) -> Result<Step, Error> {
        let local = header.local_type();
        let Some(definition) = self.definitions[local as usize].clone() else {
            return Err(Error::UndefinedLocalType {
                position: self.position.saturating_sub(1),
                local_type: local,
            });
        };
        if self.buffer.len() < definition.length {
            return Ok(Step::NeedMore);
        }

        let body = &self.buffer[..definition.length];
        let mut mesg = Mesg::new(definition.number);
        for field in &definition.fields {
            let bytes = &body[field.offset..field.offset + field.size as usize];
            let (values, tail) = parser::field_values(bytes, field.base_type, definition.byte_order);
            mesg.push_field(Field {
                num: field.number,
                base_type: field.base_type,
                values,
                tail,
            });
        }
        for field in &definition.developer_fields {
            let bytes = &body[field.offset..field.offset + field.size as usize];
            let key = (field.developer_data_index, field.number);
            let base_type = self.developer_types.get(&key).copied().unwrap_or(BaseType::Byte);
            let (values, tail) = parser::field_values(bytes, base_type, definition.byte_order);
            mesg.push_developer_field(DeveloperField {
                num: field.number,
                developer_data_index: field.developer_data_index,
                base_type,
                values,
                tail,
            });
        }

        if header.compressed() {
            match self.rolling.resolve(header.time_offset()) {
                Some(timestamp) => {
                    mesg.set_raw(TIMESTAMP_FIELD, BaseType::UInt32, 0, Value::U32(timestamp));
                }
                None => warn!(
                    "compressed timestamp at byte {} with no reference; dropped",
                    self.position
                ),
            }
        } else if let Some(Value::U32(timestamp)) = mesg.raw(TIMESTAMP_FIELD, 0) {
            if *timestamp != 0xffff_ffff {
                self.rolling.update(*timestamp);
            }
        }

        self.expand_components(&mut mesg);
        if mesg.num() == mesg_num::FIELD_DESCRIPTION {
            self.register_developer_field(&mesg);
        }

        self.advance(definition.length);
        self.data_remaining = self.data_remaining.saturating_sub(definition.length);
        self.records.push_back(Record::Mesg(mesg));
        self.state = State::RecordHeader;
        Ok(Step::Continue)
    }

    fn step_trailer(&mut self) -> Result<Step, Error> {
        if self.buffer.len() < 2 {
            return Ok(Step::NeedMore);
        }
        let computed = self.crc.sum();
        let found = u16::from_le_bytes([self.buffer[0], self.buffer[1]]);
        // The trailer itself is not part of the checksum.
        self.buffer.drain(..2);
        self.position += 2;
        self.records.push_back(Record::Checksum(found));
        self.state = State::ChainedHeader;
        if found != computed {
            return Err(Error::CrcMismatch {
                position: self.position - 2,
                found,
                computed,
            });
        }
        debug!("trailer CRC verified: {computed:#06x}");
        Ok(Step::Continue)
    }

    /// Consumes `count` buffered bytes into the running CRC.
    fn advance(&mut self, count: usize) {
        self.crc.update(&self.buffer[..count]);
        self.buffer.drain(..count);
        self.position += count;
    }

    /// Decomposes bit-packed fields into their destination fields.
    /// Components expand before subfield selection applies, and
    /// accumulating components extend a rolling counter that survives
    /// across records of the same message.
    fn expand_components(&mut self, mesg: &mut Mesg) {
        let nums: Vec<u8> = mesg.fields().iter().map(|f| f.num).collect();
        for num in nums {
            let Some(info) = profile::field(mesg.num(), num) else { continue };
            if info.components.is_empty() {
                continue;
            }
            let Some(source) = mesg.field(num) else { continue };
            let Some(mut raw) = combined_bits(source) else { continue };
            for component in info.components {
                let mask = (1u64 << component.bits) - 1;
                let bits = raw & mask;
                raw >>= component.bits;
                let value = if component.accumulate {
                    let counter = self
                        .accumulators
                        .entry((mesg.num(), component.field_num))
                        .or_insert(0);
                    let delta = bits.wrapping_sub(*counter & mask) & mask;
                    *counter = counter.wrapping_add(delta);
                    *counter
                } else {
                    bits
                };
                let physical = value as f64 / component.scale - component.offset;
                // set_f64 applies the destination field's own scale/offset
                // and stores into its declared base type.
                let _ = mesg.set_f64(component.field_num, physical, 0, Default::default());
            }
        }
    }

    /// Registers the developer field described by a field-description
    /// record so later data records decode it typed.
    fn register_developer_field(&mut self, mesg: &Mesg) {
        let index = mesg.get_u8(0, 0, Default::default()).ok().flatten();
        let field_num = mesg.get_u8(1, 0, Default::default()).ok().flatten();
        let type_id = mesg.get_u8(2, 0, Default::default()).ok().flatten();
        if let (Some(index), Some(field_num), Some(type_id)) = (index, field_num, type_id) {
            let base_type = BaseType::from_wire(type_id);
            debug!("developer field {index}/{field_num} registered as {base_type:?}");
            self.developer_types.insert((index, field_num), base_type);
        }
    }
}

/// Combines a field's elements into one little-endian bit string for
/// component extraction. Returns `None` for sentinel or non-integer
/// values.
fn combined_bits(field: &Field) -> Option<u64> {
    if field.values.is_empty() || field.values.iter().all(|v| v.is_invalid(field.base_type)) {
        return None;
    }
    let mut raw: u64 = 0;
    let mut shift = 0u32;
    for value in &field.values {
        let (bits, width) = match value {
            Value::U8(v) => (u64::from(*v), 8),
            Value::U16(v) => (u64::from(*v), 16),
            Value::U32(v) => (u64::from(*v), 32),
            Value::U64(v) => (*v, 64),
            _ => return None,
        };
        raw |= bits << shift;
        shift += width;
        if shift >= 64 {
            break;
        }
    }
    Some(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_short_read() {
        let decoder = Decoder::new();
        assert!(matches!(decoder.finish(), Err(Error::ShortRead { .. })));
    }

    #[test]
    fn bad_magic_is_bad_header() {
        let mut decoder = Decoder::new();
        let bytes = [12u8, 0x20, 0, 0, 0, 0, 0, 0, b'J', b'U', b'N', b'K'];
        assert!(matches!(
            decoder.feed(&bytes),
            Err(Error::BadHeader { .. })
        ));
    }

    #[test]
    fn future_protocol_version_is_rejected() {
        let mut decoder = Decoder::new();
        let bytes = [12u8, 0x30, 0, 0, 0, 0, 0, 0, 0x2e, 0x46, 0x49, 0x54];
        assert!(matches!(
            decoder.feed(&bytes),
            Err(Error::UnsupportedProtocolVersion { found: 0x30, .. })
        ));
    }

    #[test]
    fn undefined_local_type_is_reported() {
        let mut decoder = Decoder::new();
        let mut bytes = vec![12u8, 0x20, 0, 0, 3, 0, 0, 0, 0x2e, 0x46, 0x49, 0x54];
        bytes.push(0x02); // data record, local type 2, never defined
        bytes.extend_from_slice(&[0, 0]); // would-be body
        assert!(matches!(
            decoder.feed(&bytes),
            Err(Error::UndefinedLocalType { local_type: 2, .. })
        ));
    }

    #[test]
    fn byte_array_combines_little_endian() {
        let mut field = Field::new(8, BaseType::Byte);
        field.values = vec![Value::U8(0x34), Value::U8(0x12), Value::U8(0x00)];
        assert_eq!(combined_bits(&field), Some(0x001234));
    }
}
