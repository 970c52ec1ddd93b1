//! The streaming encoder: field bags in, a complete FIT byte stream out.
//!
//! Definitions are emitted lazily. Each written record is keyed by its
//! global message number and field shape; a record whose key matches a
//! live local slot reuses it, anything else claims a free slot or evicts
//! the least recently used one. The file header is written up front with a
//! zero data size and patched on [`Encoder::finish`], which also appends
//! the trailing CRC.

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};
use log::debug;
use nom::number::Endianness;

use crate::errors::Error;
use crate::mesg::Mesg;
use crate::types::Value;

/// Profile version stamped into encoded headers.
pub const PROFILE_VERSION: u16 = 21_158;

/// Protocol version stamped into encoded headers (2.0).
pub const PROTOCOL_VERSION: u8 = 0x20;

#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Byte order of multi-byte values in definition and data records.
    /// Header fields are always little-endian regardless.
    pub byte_order: Endianness,
    pub protocol_version: u8,
    pub profile_version: u16,
    /// Whether to write the 14-byte header with its own CRC. The 12-byte
    /// legacy header omits it.
    pub long_header: bool,
}

impl Default for EncodeOptions {
    fn default() -> EncodeOptions {
        EncodeOptions {
            byte_order: Endianness::Little,
            protocol_version: PROTOCOL_VERSION,
            profile_version: PROFILE_VERSION,
            long_header: true,
        }
    }
}

/// `(field_number, declared_size, base_type_wire_code)` triples, in
/// emission order. Two records with equal keys share a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DefinitionKey {
    num: u16,
    fields: Vec<(u8, u8, u8)>,
    developer_fields: Vec<(u8, u8, u8)>,
}

#[derive(Debug)]
struct Slot {
    key: DefinitionKey,
    last_used: u64,
}

pub struct Encoder {
    options: EncodeOptions,
    out: Vec<u8>,
    header_len: usize,
    slots: [Option<Slot>; 16],
    clock: u64,
}

impl Encoder {
    pub fn new(options: EncodeOptions) -> Encoder {
        let header_len = if options.long_header { 14 } else { 12 };
        let mut out = Vec::with_capacity(256);
        out.push(header_len as u8);
        out.push(options.protocol_version);
        out.extend_from_slice(&options.profile_version.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // data size, patched at finish
        out.extend_from_slice(b".FIT");
        if options.long_header {
            out.extend_from_slice(&[0, 0]); // header CRC, patched at finish
        }
        Encoder { options, out, header_len, slots: Default::default(), clock: 0 }
    }

    /// Appends one data record, emitting a definition record first if the
    /// message's shape is not bound to a live local slot.
    pub fn write_mesg(&mut self, mesg: &Mesg) -> Result<(), Error> {
        let key = definition_key(mesg)?;
        self.clock += 1;
        let local = match self.find_slot(&key) {
            Some(local) => local,
            None => {
                let local = self.claim_slot();
                self.emit_definition(local, &key)?;
                self.slots[local as usize] = Some(Slot { key: key.clone(), last_used: 0 });
                local
            }
        };
        if let Some(slot) = self.slots[local as usize].as_mut() {
            slot.last_used = self.clock;
        }
        self.emit_data(local, mesg, &key)
    }

    /// Patches the header's data size (and CRC, for the 14-byte form),
    /// appends the trailing CRC, and returns the finished byte stream.
    pub fn finish(mut self) -> Result<Vec<u8>, Error> {
        let data_size = (self.out.len() - self.header_len) as u32;
        self.out[4..8].copy_from_slice(&data_size.to_le_bytes());
        if self.options.long_header {
            let header_crc = self.out[..12].iter().fold(0, crate::crc::crc);
            self.out[12..14].copy_from_slice(&header_crc.to_le_bytes());
        }
        let trailer = self.out.iter().fold(0, crate::crc::crc);
        self.out.write_u16::<LittleEndian>(trailer)?;
        debug!("finished stream: {} data bytes, CRC {trailer:#06x}", data_size);
        Ok(self.out)
    }

    /// Encodes a batch of records into one complete stream.
    pub fn encode(mesgs: &[Mesg], options: EncodeOptions) -> Result<Vec<u8>, Error> {
        let mut encoder = Encoder::new(options);
        for mesg in mesgs {
            encoder.write_mesg(mesg)?;
        }
        encoder.finish()
    }

    fn find_slot(&self, key: &DefinitionKey) -> Option<u8> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|s| s.key == *key))
            .map(|index| index as u8)
    }

    /// The first free slot, or the least recently used one.
    fn claim_slot(&self) -> u8 {
        if let Some(free) = self.slots.iter().position(Option::is_none) {
            return free as u8;
        }
        self.slots
            .iter()
            .enumerate()
            .min_by_key(|(_, slot)| slot.as_ref().map_or(0, |s| s.last_used))
            .map_or(0, |(index, _)| index as u8)
    }

    fn emit_definition(&mut self, local: u8, key: &DefinitionKey) -> Result<(), Error> {
        let mut header = 0x40 | local;
        if !key.developer_fields.is_empty() {
            header |= 0x20;
        }
        self.out.write_u8(header)?;
        self.out.write_u8(0)?; // reserved
        let arch: u8 = match self.options.byte_order {
            Endianness::Big => 1,
            _ => 0,
        };
        self.out.write_u8(arch)?;
        match self.options.byte_order {
            Endianness::Big => self.out.write_u16::<BigEndian>(key.num)?,
            _ => self.out.write_u16::<LittleEndian>(key.num)?,
        }
        self.out.write_u8(key.fields.len() as u8)?;
        for &(number, size, base_type) in &key.fields {
            self.out.write_u8(number)?;
            self.out.write_u8(size)?;
            self.out.write_u8(base_type)?;
        }
        if !key.developer_fields.is_empty() {
            self.out.write_u8(key.developer_fields.len() as u8)?;
            for &(number, size, index) in &key.developer_fields {
                self.out.write_u8(number)?;
                self.out.write_u8(size)?;
                self.out.write_u8(index)?;
            }
        }
        debug!("definition: local {local} -> global {}", key.num);
        Ok(())
    }

    fn emit_data(&mut self, local: u8, mesg: &Mesg, key: &DefinitionKey) -> Result<(), Error> {
        self.out.write_u8(local)?;
        let mut keyed = key.fields.iter();
        for field in mesg.fields() {
            if field.wire_size() == 0 {
                continue;
            }
            let &(_, declared, _) = keyed.next().ok_or_else(|| Error::OversizedField {
                mesg_num: mesg.num(),
                field_num: field.num,
                size: field.wire_size(),
            })?;
            let start = self.out.len();
            write_payload(&mut self.out, &field.values, &field.tail, self.options.byte_order)?;
            // Holds because definition_key rejected inconsistent layouts.
            debug_assert_eq!(self.out.len() - start, declared as usize);
        }
        for field in mesg.developer_fields() {
            if field.wire_size() == 0 {
                continue;
            }
            write_payload(&mut self.out, &field.values, &field.tail, self.options.byte_order)?;
        }
        Ok(())
    }
}

fn definition_key(mesg: &Mesg) -> Result<DefinitionKey, Error> {
    let mut fields = Vec::with_capacity(mesg.fields().len());
    for field in mesg.fields() {
        let size = checked_size(mesg.num(), field.num, field.wire_size(), &field.values, &field.tail)?;
        if let Some(declared) = size {
            fields.push((field.num, declared, field.base_type.to_wire()));
        }
    }
    let mut developer_fields = Vec::with_capacity(mesg.developer_fields().len());
    for field in mesg.developer_fields() {
        let size = checked_size(mesg.num(), field.num, field.wire_size(), &field.values, &field.tail)?;
        if let Some(declared) = size {
            developer_fields.push((field.num, declared, field.developer_data_index));
        }
    }
    Ok(DefinitionKey { num: mesg.num(), fields, developer_fields })
}

/// Validates one field's declared size against the bytes its values will
/// actually occupy, and against the one-byte size limit. Empty fields
/// return `None` and are skipped.
fn checked_size(
    mesg_num: u16,
    field_num: u8,
    size: usize,
    values: &[Value],
    tail: &[u8],
) -> Result<Option<u8>, Error> {
    if size == 0 {
        return Ok(None);
    }
    let actual = payload_width(values, tail);
    if actual != size {
        return Err(Error::InconsistentField { mesg_num, field_num, declared: size, actual });
    }
    let declared = u8::try_from(size)
        .map_err(|_| Error::OversizedField { mesg_num, field_num, size })?;
    Ok(Some(declared))
}

/// Bytes `write_payload` will emit for these values: each value's own
/// width, the tail, and a synthesized string terminator when no tail
/// carries one.
fn payload_width(values: &[Value], tail: &[u8]) -> usize {
    let values_width: usize = values.iter().map(value_width).sum();
    let terminator = tail.is_empty() && matches!(values.first(), Some(Value::String(_)));
    values_width + tail.len() + usize::from(terminator)
}

fn value_width(value: &Value) -> usize {
    match value {
        Value::U8(_) | Value::I8(_) => 1,
        Value::U16(_) | Value::I16(_) => 2,
        Value::U32(_) | Value::I32(_) | Value::F32(_) => 4,
        Value::U64(_) | Value::I64(_) | Value::F64(_) => 8,
        Value::String(text) => text.len(),
    }
}

/// Writes one field's values followed by its tail bytes. A decoded string
/// field carries its terminator and padding in the tail; a string with no
/// tail gets a single terminator.
fn write_payload(
    out: &mut Vec<u8>,
    values: &[Value],
    tail: &[u8],
    byte_order: Endianness,
) -> Result<(), Error> {
    for value in values {
        write_value(out, value, byte_order)?;
    }
    if tail.is_empty() && matches!(values.first(), Some(Value::String(_))) {
        out.push(0);
    } else {
        out.extend_from_slice(tail);
    }
    Ok(())
}

/// Writes one stored value in the stream's byte order. Floats are written
/// by bit pattern so sentinel NaNs survive a round trip.
fn write_value(out: &mut Vec<u8>, value: &Value, byte_order: Endianness) -> Result<(), Error> {
    match byte_order {
        Endianness::Big => write_ordered::<BigEndian>(out, value),
        _ => write_ordered::<LittleEndian>(out, value),
    }
}

fn write_ordered<B: ByteOrder>(out: &mut Vec<u8>, value: &Value) -> Result<(), Error> {
    match value {
        Value::U8(v) => out.write_u8(*v)?,
        Value::I8(v) => out.write_i8(*v)?,
        Value::U16(v) => out.write_u16::<B>(*v)?,
        Value::I16(v) => out.write_i16::<B>(*v)?,
        Value::U32(v) => out.write_u32::<B>(*v)?,
        Value::I32(v) => out.write_i32::<B>(*v)?,
        Value::U64(v) => out.write_u64::<B>(*v)?,
        Value::I64(v) => out.write_i64::<B>(*v)?,
        Value::F32(v) => out.write_u32::<B>(v.to_bits())?,
        Value::F64(v) => out.write_u64::<B>(v.to_bits())?,
        Value::String(text) => out.extend_from_slice(text.as_bytes()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesg::Selector;
    use crate::profile::mesg_num;

    fn file_id() -> Mesg {
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_u8(0, 4, 0, Selector::Main).unwrap();
        mesg.set_u16(1, 1, 0, Selector::Main).unwrap();
        mesg
    }

    #[test]
    fn header_is_patched_at_finish() {
        let mut encoder = Encoder::new(EncodeOptions::default());
        encoder.write_mesg(&file_id()).unwrap();
        let bytes = encoder.finish().unwrap();
        assert_eq!(bytes[0], 14);
        assert_eq!(&bytes[8..12], b".FIT");
        let data_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        assert_eq!(data_size as usize, bytes.len() - 14 - 2);
        let header_crc = u16::from_le_bytes([bytes[12], bytes[13]]);
        assert_eq!(header_crc, bytes[..12].iter().fold(0, crate::crc::crc));
    }

    #[test]
    fn short_header_has_no_crc_bytes() {
        let options = EncodeOptions { long_header: false, ..Default::default() };
        let bytes = Encoder::encode(&[file_id()], options).unwrap();
        assert_eq!(bytes[0], 12);
        assert_eq!(&bytes[8..12], b".FIT");
    }

    #[test]
    fn matching_shape_reuses_definition() {
        let mut encoder = Encoder::new(EncodeOptions::default());
        encoder.write_mesg(&file_id()).unwrap();
        let first = encoder.out.len();
        encoder.write_mesg(&file_id()).unwrap();
        let second = encoder.out.len() - first;
        // Second record is header byte + data only.
        assert_eq!(second, 1 + 1 + 2);
    }

    #[test]
    fn changed_shape_gets_new_definition() {
        let mut encoder = Encoder::new(EncodeOptions::default());
        encoder.write_mesg(&file_id()).unwrap();
        let mut wider = file_id();
        wider.set_u32(4, 1000, 0, Selector::Main).unwrap(); // time_created
        let before = encoder.out.len();
        encoder.write_mesg(&wider).unwrap();
        // 6 byte preamble + 3 triples, then header + 7 data bytes.
        assert_eq!(encoder.out.len() - before, (6 + 9) + (1 + 7));
    }

    #[test]
    fn inconsistent_raw_values_are_rejected() {
        use crate::types::BaseType;
        // A bag patched through set_raw with a value wider than the field's
        // base type must fail, not emit a corrupt record.
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_raw(1, BaseType::UInt8, 0, Value::U16(500));
        let mut encoder = Encoder::new(EncodeOptions::default());
        assert!(matches!(
            encoder.write_mesg(&mesg),
            Err(Error::InconsistentField { declared: 1, actual: 2, .. })
        ));
        // Nothing was written past the header.
        assert_eq!(encoder.out.len(), 14);
    }

    #[test]
    fn trailing_crc_verifies() {
        let bytes = Encoder::encode(&[file_id()], EncodeOptions::default()).unwrap();
        let body_crc = bytes[..bytes.len() - 2].iter().fold(0, crate::crc::crc);
        let stored = u16::from_le_bytes([bytes[bytes.len() - 2], bytes[bytes.len() - 1]]);
        assert_eq!(stored, body_crc);
    }
}
