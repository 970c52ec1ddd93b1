//! Wire-level parsers for the FIT framing structures.
//!
//! Framing parsers use `nom`'s streaming combinators so a truncated input
//! surfaces as `Incomplete` and the decoder can wait for more bytes. Field
//! values are extracted from a fully-buffered record body, so they never
//! run short.

use nom::bytes::streaming::tag;
use nom::combinator::{cond, verify};
use nom::multi::length_count;
use nom::number::streaming::{le_u16, le_u32, le_u8, u16 as any_u16};
use nom::number::Endianness;
use nom::sequence::tuple;
use nom::IResult;

use crate::types::{
    BaseType, DeveloperFieldDefinition, FieldDefinition, FileHeader, MessageDefinition,
    RecordHeader, Value,
};

/// Consumes a file header.
///
/// Rejects when the header length is neither 12 nor 14 bytes, or the tag
/// does not equal `.FIT`. Neither the header checksum nor the protocol
/// version is verified here; the decoder owns both policies.
pub fn file_header(input: &[u8]) -> IResult<&[u8], FileHeader> {
    let (input, length) = verify(le_u8, |&val: &u8| val == 12 || val == 14)(input)?;
    let (input, protocol) = le_u8(input)?;
    let (input, profile) = le_u16(input)?;
    let (input, data_size) = le_u32(input)?;
    let (input, fit_tag) = tag(".FIT")(input)?;
    let (input, checksum) = cond(length == 14, le_u16)(input)?;
    Ok((
        input,
        FileHeader {
            length,
            protocol,
            profile,
            tag: [fit_tag[0], fit_tag[1], fit_tag[2], fit_tag[3]],
            data_size,
            checksum,
        },
    ))
}

#[inline(always)]
pub fn record_header(input: &[u8]) -> IResult<&[u8], u8> {
    le_u8(input)
}

#[inline(always)]
pub fn checksum(input: &[u8]) -> IResult<&[u8], u16> {
    le_u16(input)
}

/// One `(field_number, size, base_type)` triple of a definition body.
/// Field number 255 is invalid on the wire.
#[inline]
fn field_definition(input: &[u8]) -> IResult<&[u8], (u8, u8, u8)> {
    tuple((verify(le_u8, |&num: &u8| num != 255), le_u8, le_u8))(input)
}

/// One `(field_number, size, developer_data_index)` triple.
#[inline]
fn developer_field_definition(input: &[u8]) -> IResult<&[u8], (u8, u8, u8)> {
    tuple((le_u8, le_u8, le_u8))(input)
}

fn byte_order(input: &[u8]) -> IResult<&[u8], Endianness> {
    match verify(le_u8, |&val: &u8| val == 0 || val == 1)(input)? {
        (i, 0) => Ok((i, Endianness::Little)),
        (i, _) => Ok((i, Endianness::Big)),
    }
}

/// Consumes a definition body (everything after the record header byte) and
/// computes the byte offset at which each field will occur in corresponding
/// data records.
pub fn message_definition(header: u8) -> impl FnMut(&[u8]) -> IResult<&[u8], MessageDefinition> {
    move |input: &[u8]| {
        let (input, reserved) = le_u8(input)?;
        let (input, byte_order) = byte_order(input)?;
        let (input, number) = any_u16(byte_order)(input)?;
        let (input, raw_fields) = length_count(le_u8, field_definition)(input)?;
        let (input, raw_developer) = cond(
            header.developer(),
            length_count(le_u8, developer_field_definition),
        )(input)?;

        let mut offset = 0usize;
        let fields = raw_fields
            .iter()
            .map(|&(number, size, base_type)| {
                let field = FieldDefinition {
                    number,
                    size,
                    base_type: BaseType::from_wire(base_type),
                    offset,
                };
                offset += size as usize;
                field
            })
            .collect::<Vec<_>>();

        let developer_fields = raw_developer
            .unwrap_or_default()
            .iter()
            .map(|&(number, size, developer_data_index)| {
                let field = DeveloperFieldDefinition {
                    number,
                    size,
                    developer_data_index,
                    offset,
                };
                offset += size as usize;
                field
            })
            .collect::<Vec<_>>();

        Ok((
            input,
            MessageDefinition {
                reserved,
                number,
                length: offset,
                byte_order,
                fields,
                developer_fields,
            },
        ))
    }
}

/// Extracts the raw values of one field from a fully-buffered record body.
///
/// `bytes` is exactly the field's declared extent. Returns the decoded
/// elements plus any remainder bytes that do not fill a whole element (the
/// unknown tail, preserved for re-encoding). Sentinel values are returned
/// verbatim.
pub fn field_values(
    bytes: &[u8],
    base_type: BaseType,
    byte_order: Endianness,
) -> (Vec<Value>, Vec<u8>) {
    if base_type == BaseType::String {
        // Null-terminated, padded to the declared size. The terminator and
        // padding go into the tail so the declared extent survives
        // re-encoding. Content that is not UTF-8 is kept as raw bytes.
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let tail = bytes[end..].to_vec();
        return match std::str::from_utf8(&bytes[..end]) {
            Ok(text) => (vec![Value::String(text.to_owned())], tail),
            Err(_) => (bytes[..end].iter().copied().map(Value::U8).collect(), tail),
        };
    }

    let element = base_type.size();
    let tail = bytes[bytes.len() - bytes.len() % element..].to_vec();
    let values = bytes
        .chunks_exact(element)
        .map(|chunk| decode_element(chunk, base_type, byte_order))
        .collect();
    (values, tail)
}

fn decode_element(chunk: &[u8], base_type: BaseType, byte_order: Endianness) -> Value {
    macro_rules! int {
        ($ty:ty, $len:literal) => {{
            let raw: [u8; $len] = chunk.try_into().unwrap_or([0; $len]);
            match byte_order {
                Endianness::Big => <$ty>::from_be_bytes(raw),
                _ => <$ty>::from_le_bytes(raw),
            }
        }};
    }
    match base_type {
        BaseType::Enum | BaseType::UInt8 | BaseType::UInt8z | BaseType::Byte => {
            Value::U8(chunk[0])
        }
        BaseType::SInt8 => Value::I8(chunk[0] as i8),
        BaseType::SInt16 => Value::I16(int!(i16, 2)),
        BaseType::UInt16 | BaseType::UInt16z => Value::U16(int!(u16, 2)),
        BaseType::SInt32 => Value::I32(int!(i32, 4)),
        BaseType::UInt32 | BaseType::UInt32z => Value::U32(int!(u32, 4)),
        BaseType::SInt64 => Value::I64(int!(i64, 8)),
        BaseType::UInt64 | BaseType::UInt64z => Value::U64(int!(u64, 8)),
        BaseType::Float32 => Value::F32(f32::from_bits(int!(u32, 4))),
        BaseType::Float64 => Value::F64(f64::from_bits(int!(u64, 8))),
        BaseType::String => unreachable!("strings handled by field_values"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_twelve_byte_header() {
        let bytes = [12u8, 0x10, 0xeb, 0x07, 0x00, 0x01, 0x00, 0x00, 0x2e, 0x46, 0x49, 0x54];
        let (rest, header) = file_header(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(header.length, 12);
        assert_eq!(header.protocol, 0x10);
        assert_eq!(header.profile, 0x07eb);
        assert_eq!(header.data_size, 0x100);
        assert_eq!(header.checksum, None);
    }

    #[test]
    fn parses_fourteen_byte_header() {
        let bytes = [
            14u8, 0x20, 0xb2, 0x52, 0x88, 0x42, 0x00, 0x00, 0x2e, 0x46, 0x49, 0x54, 0x4b, 0xf9,
        ];
        let (_, header) = file_header(&bytes).unwrap();
        assert_eq!(header.checksum, Some(0xf94b));
    }

    #[test]
    fn rejects_bad_tag() {
        let bytes = [12u8, 0x10, 0xeb, 0x07, 0x00, 0x01, 0x00, 0x00, b'J', b'U', b'N', b'K'];
        assert!(file_header(&bytes).is_err());
    }

    #[test]
    fn truncated_header_is_incomplete() {
        let bytes = [14u8, 0x20, 0xb2];
        assert!(matches!(file_header(&bytes), Err(nom::Err::Incomplete(_))));
    }

    #[test]
    fn parses_definition_body() {
        // reserved, little-endian, global 0, three fields.
        let bytes = [
            0x00, 0x00, 0x00, 0x00, 0x03, // preamble + count
            0x00, 0x01, 0x00, // type: enum, 1 byte
            0x01, 0x02, 0x84, // manufacturer: uint16, 2 bytes
            0x04, 0x04, 0x86, // time_created: uint32, 4 bytes
        ];
        let (rest, definition) = message_definition(0x40)(&bytes).unwrap();
        assert!(rest.is_empty());
        assert_eq!(definition.number, 0);
        assert_eq!(definition.length, 7);
        assert_eq!(definition.fields.len(), 3);
        assert_eq!(definition.fields[1].base_type, BaseType::UInt16);
        assert_eq!(definition.fields[2].offset, 3);
        assert!(definition.developer_fields.is_empty());
    }

    #[test]
    fn parses_developer_triples() {
        let bytes = [
            0x00, 0x00, 0x14, 0x00, 0x01, // global 20, one field
            0x03, 0x01, 0x02, // heart_rate: uint8
            0x01, // one developer field
            0x00, 0x04, 0x00, // field 0, 4 bytes, index 0
        ];
        let (_, definition) = message_definition(0x60)(&bytes).unwrap();
        assert_eq!(definition.developer_fields.len(), 1);
        assert_eq!(definition.developer_fields[0].offset, 1);
        assert_eq!(definition.length, 5);
    }

    #[test]
    fn big_endian_values() {
        let (values, tail) = field_values(&[0x12, 0x34], BaseType::UInt16, Endianness::Big);
        assert_eq!(values, vec![Value::U16(0x1234)]);
        assert!(tail.is_empty());
    }

    #[test]
    fn arrays_and_tails() {
        let (values, tail) =
            field_values(&[0x01, 0x00, 0x02, 0x00, 0xaa], BaseType::UInt16, Endianness::Little);
        assert_eq!(values, vec![Value::U16(1), Value::U16(2)]);
        assert_eq!(tail, vec![0xaa]);
    }

    #[test]
    fn string_keeps_padding_in_tail() {
        let (values, tail) = field_values(b"abc\0\0\0", BaseType::String, Endianness::Little);
        assert_eq!(values, vec![Value::String("abc".into())]);
        assert_eq!(tail, vec![0, 0, 0]);
    }

    #[test]
    fn non_utf8_string_keeps_raw_bytes() {
        let (values, tail) =
            field_values(&[0x61, 0xe9, 0x62, 0x00], BaseType::String, Endianness::Little);
        assert_eq!(values, vec![Value::U8(0x61), Value::U8(0xe9), Value::U8(0x62)]);
        assert_eq!(tail, vec![0]);
    }
}
