use std::rc::Rc;

use nom::number::Endianness;

/// The closed set of FIT base types.
///
/// Each base type knows its wire code, element size, and invalid sentinel.
/// `Z`-suffixed types are the non-zero variants whose sentinel is 0 rather
/// than all-ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Enum,
    SInt8,
    UInt8,
    SInt16,
    UInt16,
    SInt32,
    UInt32,
    String,
    Float32,
    Float64,
    UInt8z,
    UInt16z,
    UInt32z,
    Byte,
    SInt64,
    UInt64,
    UInt64z,
}

impl BaseType {
    /// Decodes a base type from its wire byte. Only the low five bits carry
    /// the type number; bit 7 flags endianness applicability, which is
    /// redundant with the size. Unknown numbers decode as `Byte` so their
    /// raw content is preserved.
    pub fn from_wire(code: u8) -> BaseType {
        match code & 0x1f {
            0 => BaseType::Enum,
            1 => BaseType::SInt8,
            2 => BaseType::UInt8,
            3 => BaseType::SInt16,
            4 => BaseType::UInt16,
            5 => BaseType::SInt32,
            6 => BaseType::UInt32,
            7 => BaseType::String,
            8 => BaseType::Float32,
            9 => BaseType::Float64,
            10 => BaseType::UInt8z,
            11 => BaseType::UInt16z,
            12 => BaseType::UInt32z,
            13 => BaseType::Byte,
            14 => BaseType::SInt64,
            15 => BaseType::UInt64,
            16 => BaseType::UInt64z,
            _ => BaseType::Byte,
        }
    }

    /// Encodes the wire byte, setting the endianness-applicability bit for
    /// multi-byte types as reference encoders do.
    pub fn to_wire(self) -> u8 {
        let number = match self {
            BaseType::Enum => 0,
            BaseType::SInt8 => 1,
            BaseType::UInt8 => 2,
            BaseType::SInt16 => 3,
            BaseType::UInt16 => 4,
            BaseType::SInt32 => 5,
            BaseType::UInt32 => 6,
            BaseType::String => 7,
            BaseType::Float32 => 8,
            BaseType::Float64 => 9,
            BaseType::UInt8z => 10,
            BaseType::UInt16z => 11,
            BaseType::UInt32z => 12,
            BaseType::Byte => 13,
            BaseType::SInt64 => 14,
            BaseType::UInt64 => 15,
            BaseType::UInt64z => 16,
        };
        if self.size() > 1 { number | 0x80 } else { number }
    }

    /// Size of one element in bytes. Strings are byte-oriented.
    pub fn size(self) -> usize {
        match self {
            BaseType::Enum
            | BaseType::SInt8
            | BaseType::UInt8
            | BaseType::UInt8z
            | BaseType::Byte
            | BaseType::String => 1,
            BaseType::SInt16 | BaseType::UInt16 | BaseType::UInt16z => 2,
            BaseType::SInt32 | BaseType::UInt32 | BaseType::UInt32z | BaseType::Float32 => 4,
            BaseType::SInt64 | BaseType::UInt64 | BaseType::UInt64z | BaseType::Float64 => 8,
        }
    }

    /// Whether the invalid sentinel is 0 (`Z`-variants) rather than
    /// all-ones / min-int / NaN.
    pub fn zero_is_invalid(self) -> bool {
        matches!(
            self,
            BaseType::UInt8z | BaseType::UInt16z | BaseType::UInt32z | BaseType::UInt64z
        )
    }

    /// The sentinel meaning "field not set" for this base type.
    pub fn invalid_value(self) -> Value {
        match self {
            BaseType::Enum | BaseType::UInt8 | BaseType::Byte => Value::U8(0xff),
            BaseType::UInt8z => Value::U8(0),
            BaseType::SInt8 => Value::I8(0x7f),
            BaseType::UInt16 => Value::U16(0xffff),
            BaseType::UInt16z => Value::U16(0),
            BaseType::SInt16 => Value::I16(0x7fff),
            BaseType::UInt32 => Value::U32(0xffff_ffff),
            BaseType::UInt32z => Value::U32(0),
            BaseType::SInt32 => Value::I32(0x7fff_ffff),
            BaseType::UInt64 => Value::U64(u64::MAX),
            BaseType::UInt64z => Value::U64(0),
            BaseType::SInt64 => Value::I64(i64::MAX),
            BaseType::Float32 => Value::F32(f32::from_bits(0xffff_ffff)),
            BaseType::Float64 => Value::F64(f64::from_bits(u64::MAX)),
            BaseType::String => Value::String(String::new()),
        }
    }
}

/// One decoded element. Array fields hold a sequence of these; string
/// fields hold a single `String` covering the whole declared size.
///
/// Values are stored raw: sentinels are kept verbatim so the encoder can
/// round-trip them, and scale/offset is applied only at the accessor
/// boundary.
#[derive(Debug, Clone)]
pub enum Value {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
}

impl Value {
    /// Sentinel-preserving equality: floats compare by bit pattern so that
    /// the NaN sentinel is equal to itself.
    pub fn bits_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    /// Whether this value is the invalid sentinel of `base_type`.
    pub fn is_invalid(&self, base_type: BaseType) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            _ => self.bits_eq(&base_type.invalid_value()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::I8(_) => "sint8",
            Value::U8(_) => "uint8",
            Value::I16(_) => "sint16",
            Value::U16(_) => "uint16",
            Value::I32(_) => "sint32",
            Value::U32(_) => "uint32",
            Value::I64(_) => "sint64",
            Value::U64(_) => "uint64",
            Value::F32(_) => "float32",
            Value::F64(_) => "float64",
            Value::String(_) => "string",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.bits_eq(other)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RecordType {
    Definition,
    Data,
}

/// Bit-level view over the one-byte record header.
///
/// Normal headers (bit 7 clear) carry the record type in bit 6, the
/// developer-data flag in bit 5, and the local message type in bits 0-3.
/// Compressed-timestamp headers (bit 7 set) carry the local type in bits
/// 5-6 and a five-bit time offset in bits 0-4.
pub trait RecordHeader {
    fn compressed(&self) -> bool;
    fn local_type(&self) -> u8;
    fn record_type(&self) -> RecordType;
    fn time_offset(&self) -> u8;
    fn developer(&self) -> bool;
}

impl RecordHeader for u8 {
    #[inline(always)]
    fn compressed(&self) -> bool {
        (self & 0x80) == 0x80
    }
    #[inline(always)]
    fn local_type(&self) -> u8 {
        match self.compressed() {
            true => (self & 0x60) >> 5,
            false => self & 0x0f,
        }
    }
    #[inline(always)]
    fn record_type(&self) -> RecordType {
        match (self & 0xc0) == 0x40 {
            true => RecordType::Definition,
            false => RecordType::Data,
        }
    }
    #[inline(always)]
    fn time_offset(&self) -> u8 {
        match self.compressed() {
            true => self & 0x1f,
            false => 0,
        }
    }
    #[inline(always)]
    fn developer(&self) -> bool {
        (self & 0xe0) == 0x60
    }
}

/// The 12- or 14-byte file envelope header.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub length: u8,
    pub protocol: u8,
    pub profile: u16,
    pub tag: [u8; 4],
    /// Size of the record stream, excluding this header and the trailing CRC.
    pub data_size: u32,
    /// Present only in 14-byte headers. A value of zero means "unchecked".
    pub checksum: Option<u16>,
}

/// One field of a local message definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Field number; identifies the field within its message.
    pub number: u8,
    /// Declared size in bytes. A whole multiple of the base type's element
    /// size makes the field an array; a remainder is carried as an unknown
    /// tail.
    pub size: u8,
    pub base_type: BaseType,
    /// Byte offset of the field within the data record, computed when the
    /// definition is installed.
    pub offset: usize,
}

/// One developer field of a local message definition. The base type is not
/// declared here; it comes from a previously decoded field-description
/// record keyed by `(developer_data_index, number)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperFieldDefinition {
    pub number: u8,
    pub size: u8,
    pub developer_data_index: u8,
    pub offset: usize,
}

/// A definition record: the layout bound to a local message type slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageDefinition {
    /// Reserved byte, read directly from the file. Should be zero, not
    /// enforced.
    pub reserved: u8,
    /// Global message number.
    pub number: u16,
    /// Total length of corresponding data records in bytes.
    pub length: usize,
    /// Byte order of multi-byte fields in corresponding data records.
    pub byte_order: Endianness,
    pub fields: Vec<FieldDefinition>,
    pub developer_fields: Vec<DeveloperFieldDefinition>,
}

/// A decoded item of the record stream.
#[derive(Debug)]
pub enum Record {
    /// A definition record and the local slot it was installed at.
    Definition(u8, Rc<MessageDefinition>),
    /// A data record, reconstructed into a field bag.
    Mesg(crate::mesg::Mesg),
    /// The trailing CRC value as encoded in the file.
    Checksum(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_header_bits() {
        let normal_data: u8 = 0x03;
        assert!(!normal_data.compressed());
        assert_eq!(normal_data.record_type(), RecordType::Data);
        assert_eq!(normal_data.local_type(), 3);

        let definition: u8 = 0x42;
        assert_eq!(definition.record_type(), RecordType::Definition);
        assert_eq!(definition.local_type(), 2);
        assert!(!definition.developer());

        let dev_definition: u8 = 0x61;
        assert!(dev_definition.developer());

        let compressed: u8 = 0x80 | (0x02 << 5) | 0x15;
        assert!(compressed.compressed());
        assert_eq!(compressed.local_type(), 2);
        assert_eq!(compressed.time_offset(), 0x15);
        assert_eq!(compressed.record_type(), RecordType::Data);
    }

    #[test]
    fn base_type_wire_round_trip() {
        for code in 0u8..=16 {
            let base_type = BaseType::from_wire(code);
            assert_eq!(BaseType::from_wire(base_type.to_wire()), base_type);
        }
        // Bit 7 on the wire is ignored on input.
        assert_eq!(BaseType::from_wire(0x84), BaseType::UInt16);
    }

    #[test]
    fn sentinels() {
        assert!(Value::U8(0xff).is_invalid(BaseType::UInt8));
        assert!(Value::U8(0).is_invalid(BaseType::UInt8z));
        assert!(!Value::U8(0).is_invalid(BaseType::UInt8));
        assert!(BaseType::Float32.invalid_value().is_invalid(BaseType::Float32));
        assert!(Value::I16(0x7fff).is_invalid(BaseType::SInt16));
    }
}
