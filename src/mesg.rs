//! The field bag: a dynamically-typed record holding a global message
//! number plus a set of fields.
//!
//! Values are stored raw, exactly as they appear on the wire after byte
//! swapping: sentinels included, scale and offset not applied. The typed
//! accessors are the single place where the `physical = raw / scale -
//! offset` transform (and its inverse, with rounding) happens, so the
//! decoder, encoder and field bag can never disagree about it.

use crate::errors::Error;
use crate::profile;
use crate::types::{BaseType, Value};

/// One field of a message: field number, base type, and one or more raw
/// values. `tail` carries declared bytes that did not fill a whole element;
/// they are preserved so re-encoding is faithful.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub num: u8,
    pub base_type: BaseType,
    pub values: Vec<Value>,
    pub tail: Vec<u8>,
}

impl Field {
    pub fn new(num: u8, base_type: BaseType) -> Field {
        Field { num, base_type, values: Vec::new(), tail: Vec::new() }
    }

    /// The field's wire size in bytes, as the encoder will declare it.
    ///
    /// A decoded string carries its terminator and padding in `tail`, so
    /// the declared extent is reproduced; a string built through the
    /// setters gets a single terminator.
    pub fn wire_size(&self) -> usize {
        wire_size(&self.values, &self.tail, self.base_type)
    }
}

fn wire_size(values: &[Value], tail: &[u8], base_type: BaseType) -> usize {
    match values.first() {
        Some(Value::String(text)) => {
            text.len() + if tail.is_empty() { 1 } else { tail.len() }
        }
        _ => values.len() * base_type.size() + tail.len(),
    }
}

/// A developer field, typed by an earlier field-description record. Fields
/// with no matching description are kept as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeveloperField {
    pub num: u8,
    pub developer_data_index: u8,
    pub base_type: BaseType,
    pub values: Vec<Value>,
    pub tail: Vec<u8>,
}

impl DeveloperField {
    pub fn wire_size(&self) -> usize {
        wire_size(&self.values, &self.tail, self.base_type)
    }
}

/// Selects which interpretation of a field an accessor applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Selector {
    /// The base definition from the profile.
    #[default]
    Main,
    /// A specific subfield's overriding scale/offset/type.
    Subfield(usize),
}

/// A generic, dynamically-typed record: the unit of exchange between
/// decoder, encoder and dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesg {
    num: u16,
    fields: Vec<Field>,
    developer_fields: Vec<DeveloperField>,
}

/// Scale/offset/storage-type resolution for one accessor call.
#[derive(Debug, Clone, Copy)]
struct Transform {
    scale: f64,
    offset: f64,
    /// Base type used when the accessor has to create the field.
    store_type: BaseType,
}

impl Transform {
    fn identity(store_type: BaseType) -> Transform {
        Transform { scale: 1.0, offset: 0.0, store_type }
    }

    fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }
}

/// Raw numeric view of a value, before scale/offset.
#[derive(Debug, Clone, Copy)]
enum Num {
    U(u64),
    I(i64),
    F(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::U(v) => v as f64,
            Num::I(v) => v as f64,
            Num::F(v) => v,
        }
    }
}

fn numeric(value: &Value, field_num: u8, requested: &'static str) -> Result<Num, Error> {
    match value {
        Value::U8(v) => Ok(Num::U(u64::from(*v))),
        Value::U16(v) => Ok(Num::U(u64::from(*v))),
        Value::U32(v) => Ok(Num::U(u64::from(*v))),
        Value::U64(v) => Ok(Num::U(*v)),
        Value::I8(v) => Ok(Num::I(i64::from(*v))),
        Value::I16(v) => Ok(Num::I(i64::from(*v))),
        Value::I32(v) => Ok(Num::I(i64::from(*v))),
        Value::I64(v) => Ok(Num::I(*v)),
        Value::F32(v) => Ok(Num::F(f64::from(*v))),
        Value::F64(v) => Ok(Num::F(*v)),
        Value::String(_) => Err(Error::TypeMismatch { field_num, stored: "string", requested }),
    }
}

/// Encodes a raw numeric into a stored value of `base_type`, saturating at
/// the type's bounds.
fn store(num: Num, base_type: BaseType) -> Value {
    macro_rules! clamp {
        ($variant:ident, $ty:ty) => {
            Value::$variant(match num {
                Num::U(v) => <$ty>::try_from(v).unwrap_or(<$ty>::MAX),
                Num::I(v) => <$ty>::try_from(v).unwrap_or(if v < 0 { <$ty>::MIN } else { <$ty>::MAX }),
                Num::F(v) => {
                    let rounded = v.round();
                    if rounded <= <$ty>::MIN as f64 {
                        <$ty>::MIN
                    } else if rounded >= <$ty>::MAX as f64 {
                        <$ty>::MAX
                    } else {
                        rounded as $ty
                    }
                }
            })
        };
    }
    match base_type {
        BaseType::Enum | BaseType::UInt8 | BaseType::UInt8z | BaseType::Byte => clamp!(U8, u8),
        BaseType::SInt8 => clamp!(I8, i8),
        BaseType::UInt16 | BaseType::UInt16z => clamp!(U16, u16),
        BaseType::SInt16 => clamp!(I16, i16),
        BaseType::UInt32 | BaseType::UInt32z => clamp!(U32, u32),
        BaseType::SInt32 => clamp!(I32, i32),
        BaseType::UInt64 | BaseType::UInt64z => clamp!(U64, u64),
        BaseType::SInt64 => clamp!(I64, i64),
        BaseType::Float32 => Value::F32(num.as_f64() as f32),
        BaseType::Float64 => Value::F64(num.as_f64()),
        BaseType::String => unreachable!("string stores rejected by store_raw"),
    }
}

macro_rules! int_from_num {
    ($ty:ty, $num:expr) => {
        match $num {
            Num::U(v) => <$ty>::try_from(v).ok(),
            Num::I(v) => <$ty>::try_from(v).ok(),
            Num::F(v) => {
                let rounded = v.round();
                (rounded.is_finite()
                    && rounded >= <$ty>::MIN as f64
                    && rounded <= <$ty>::MAX as f64)
                    .then(|| rounded as $ty)
            }
        }
    };
}

macro_rules! int_accessors {
    ($(($get:ident, $set:ident, $ty:ty, $natural:expr, $name:literal)),* $(,)?) => {$(
        /// Reads the field coerced to this physical type. Absent fields,
        /// out-of-range indices and invalid sentinels read as `None`.
        pub fn $get(&self, num: u8, index: usize, selector: Selector) -> Result<Option<$ty>, Error> {
            let transform = self.transform(num, selector, $natural);
            let Some((value, stored_type)) = self.raw_at(num, index) else {
                return Ok(None);
            };
            if value.is_invalid(stored_type) {
                return Ok(None);
            }
            let raw = numeric(value, num, $name)?;
            if transform.is_identity() {
                Ok(int_from_num!($ty, raw))
            } else {
                let physical = raw.as_f64() / transform.scale - transform.offset;
                Ok(int_from_num!($ty, Num::F(physical)))
            }
        }

        /// Writes the field, applying the inverse scale/offset transform
        /// with rounding. Indices beyond the current length extend the
        /// array, padding the gap with the base type's sentinel.
        pub fn $set(&mut self, num: u8, value: $ty, index: usize, selector: Selector) -> Result<(), Error> {
            let transform = self.transform(num, selector, $natural);
            let raw = if transform.is_identity() {
                let wide = value as i128;
                if wide >= 0 { Num::U(wide as u64) } else { Num::I(wide as i64) }
            } else {
                Num::F(((value as f64) + transform.offset) * transform.scale)
            };
            self.store_raw(num, transform.store_type, index, raw, $name)
        }
    )*};
}

impl Mesg {
    pub fn new(num: u16) -> Mesg {
        Mesg { num, fields: Vec::new(), developer_fields: Vec::new() }
    }

    /// The global message number.
    pub fn num(&self) -> u16 {
        self.num
    }

    /// The profile name of this message, when known.
    pub fn name(&self) -> Option<&'static str> {
        profile::mesg_name(self.num)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn developer_fields(&self) -> &[DeveloperField] {
        &self.developer_fields
    }

    pub fn field(&self, num: u8) -> Option<&Field> {
        self.fields.iter().find(|f| f.num == num)
    }

    pub fn has_field(&self, num: u8) -> bool {
        self.field(num).is_some()
    }

    /// Appends a fully-formed field; used by the decoder, which sees fields
    /// in declaration order. Replaces any previous field with the same
    /// number.
    pub fn push_field(&mut self, field: Field) {
        if let Some(existing) = self.fields.iter_mut().find(|f| f.num == field.num) {
            *existing = field;
        } else {
            self.fields.push(field);
        }
    }

    pub fn push_developer_field(&mut self, field: DeveloperField) {
        self.developer_fields.push(field);
    }

    /// The number of values currently held by a field.
    pub fn field_len(&self, num: u8) -> usize {
        self.field(num).map_or(0, |f| f.values.len())
    }

    /// Raw (unscaled, sentinel-inclusive) access to one element.
    pub fn raw(&self, num: u8, index: usize) -> Option<&Value> {
        self.field(num)?.values.get(index)
    }

    fn raw_at(&self, num: u8, index: usize) -> Option<(&Value, BaseType)> {
        let field = self.field(num)?;
        Some((field.values.get(index)?, field.base_type))
    }

    /// Stores a raw value, creating the field and padding any gap with the
    /// base type's sentinel.
    pub fn set_raw(&mut self, num: u8, base_type: BaseType, index: usize, value: Value) {
        let position = match self.fields.iter().position(|f| f.num == num) {
            Some(position) => position,
            None => {
                self.fields.push(Field::new(num, base_type));
                self.fields.len() - 1
            }
        };
        let field = &mut self.fields[position];
        while field.values.len() <= index {
            field.values.push(field.base_type.invalid_value());
        }
        field.values[index] = value;
    }

    /// Stores a numeric, resolving the base type from the existing field.
    /// Writing a numeric into a string field is a type mismatch, symmetric
    /// with the read direction.
    fn store_raw(
        &mut self,
        num: u8,
        store_type: BaseType,
        index: usize,
        raw: Num,
        requested: &'static str,
    ) -> Result<(), Error> {
        let base_type = self.field(num).map(|f| f.base_type).unwrap_or(store_type);
        if base_type == BaseType::String {
            return Err(Error::TypeMismatch { field_num: num, stored: "string", requested });
        }
        self.set_raw(num, base_type, index, store(raw, base_type));
        Ok(())
    }

    /// Resolves the scale/offset/storage type for an accessor call.
    /// Unknown messages or fields fall back to the identity transform with
    /// the accessor's natural base type.
    fn transform(&self, num: u8, selector: Selector, natural: BaseType) -> Transform {
        let stored = self.field(num).map(|f| f.base_type);
        let Some(info) = profile::field(self.num, num) else {
            return Transform::identity(stored.unwrap_or(natural));
        };
        let store_type = stored.unwrap_or(info.base_type);
        match selector {
            Selector::Main => {
                Transform { scale: info.scale, offset: info.offset, store_type }
            }
            Selector::Subfield(index) => match info.subfields.get(index) {
                Some(sub) => Transform { scale: sub.scale, offset: sub.offset, store_type },
                None => Transform { scale: info.scale, offset: info.offset, store_type },
            },
        }
    }

    /// The subfield interpretation currently selected by this bag's sibling
    /// reference values, if any.
    pub fn active_subfield(&self, num: u8) -> Option<(usize, &'static profile::SubfieldInfo)> {
        let info = profile::field(self.num, num)?;
        for (index, sub) in info.subfields.iter().enumerate() {
            for reference in sub.refs {
                let sibling = self.raw(reference.field_num, 0)?;
                if let Ok(Num::U(v)) = numeric(sibling, reference.field_num, "subfield ref") {
                    if v == u64::from(reference.value) {
                        return Some((index, sub));
                    }
                }
            }
        }
        None
    }

    int_accessors!(
        (get_u8, set_u8, u8, BaseType::UInt8, "uint8"),
        (get_i8, set_i8, i8, BaseType::SInt8, "sint8"),
        (get_u16, set_u16, u16, BaseType::UInt16, "uint16"),
        (get_i16, set_i16, i16, BaseType::SInt16, "sint16"),
        (get_u32, set_u32, u32, BaseType::UInt32, "uint32"),
        (get_i32, set_i32, i32, BaseType::SInt32, "sint32"),
        (get_u64, set_u64, u64, BaseType::UInt64, "uint64"),
        (get_i64, set_i64, i64, BaseType::SInt64, "sint64"),
    );

    /// Reads the field as a physical `f64` with scale/offset applied.
    pub fn get_f64(&self, num: u8, index: usize, selector: Selector) -> Result<Option<f64>, Error> {
        let transform = self.transform(num, selector, BaseType::Float64);
        let Some((value, stored_type)) = self.raw_at(num, index) else {
            return Ok(None);
        };
        if value.is_invalid(stored_type) {
            return Ok(None);
        }
        let raw = numeric(value, num, "float64")?;
        Ok(Some(raw.as_f64() / transform.scale - transform.offset))
    }

    pub fn get_f32(&self, num: u8, index: usize, selector: Selector) -> Result<Option<f32>, Error> {
        Ok(self.get_f64(num, index, selector)?.map(|v| v as f32))
    }

    /// Writes a physical float, applying the inverse transform with
    /// rounding into the field's integer base type where applicable.
    pub fn set_f64(&mut self, num: u8, value: f64, index: usize, selector: Selector) -> Result<(), Error> {
        let transform = self.transform(num, selector, BaseType::Float64);
        let raw = (value + transform.offset) * transform.scale;
        self.store_raw(num, transform.store_type, index, Num::F(raw), "float64")
    }

    pub fn set_f32(&mut self, num: u8, value: f32, index: usize, selector: Selector) -> Result<(), Error> {
        self.set_f64(num, f64::from(value), index, selector)
    }

    /// Reads an enum-backed boolean (the profile's `bool` type is an enum
    /// with 0 = false, 1 = true).
    pub fn get_bool(&self, num: u8, index: usize, selector: Selector) -> Result<Option<bool>, Error> {
        Ok(self.get_u8(num, index, selector)?.map(|v| v != 0))
    }

    pub fn set_bool(&mut self, num: u8, value: bool, index: usize, selector: Selector) -> Result<(), Error> {
        self.set_u8(num, u8::from(value), index, selector)
    }

    /// Reads a string field. Reading a numeric field as a string is a type
    /// mismatch; absent or empty strings read as `None`.
    pub fn get_string(&self, num: u8, index: usize) -> Result<Option<String>, Error> {
        match self.raw(num, index) {
            None => Ok(None),
            Some(Value::String(text)) if text.is_empty() => Ok(None),
            Some(Value::String(text)) => Ok(Some(text.clone())),
            Some(other) => Err(Error::TypeMismatch {
                field_num: num,
                stored: other.type_name(),
                requested: "string",
            }),
        }
    }

    pub fn set_string(&mut self, num: u8, value: &str, index: usize) -> Result<(), Error> {
        self.set_raw(num, BaseType::String, index, Value::String(value.to_owned()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::mesg_num;

    #[test]
    fn absent_field_reads_none() {
        let mesg = Mesg::new(mesg_num::RECORD);
        assert_eq!(mesg.get_u8(3, 0, Selector::Main).unwrap(), None);
    }

    #[test]
    fn sentinel_reads_none() {
        let mut mesg = Mesg::new(mesg_num::RECORD);
        mesg.set_raw(3, BaseType::UInt8, 0, Value::U8(0xff));
        assert_eq!(mesg.get_u8(3, 0, Selector::Main).unwrap(), None);
    }

    #[test]
    fn scale_offset_round_trip() {
        // record.altitude: scale 5, offset 500.
        let mut mesg = Mesg::new(mesg_num::RECORD);
        mesg.set_f64(2, 123.4, 0, Selector::Main).unwrap();
        let physical = mesg.get_f64(2, 0, Selector::Main).unwrap().unwrap();
        assert!((physical - 123.4).abs() <= 1.0 / 5.0);
        // The raw value is an integer of the declared base type.
        assert_eq!(mesg.raw(2, 0), Some(&Value::U16(3117)));
    }

    #[test]
    fn array_extension_pads_with_sentinels() {
        let mut mesg = Mesg::new(mesg_num::HRV);
        // hrv.time is a uint16 array scaled by 1000: one physical second
        // stores as raw 1000.
        mesg.set_f64(0, 1.0, 2, Selector::Main).unwrap();
        assert_eq!(mesg.field_len(0), 3);
        assert_eq!(mesg.get_f64(0, 0, Selector::Main).unwrap(), None);
        assert_eq!(mesg.get_f64(0, 1, Selector::Main).unwrap(), None);
        assert_eq!(mesg.raw(0, 2), Some(&Value::U16(1000)));
    }

    #[test]
    fn out_of_range_index_reads_none() {
        let mut mesg = Mesg::new(mesg_num::RECORD);
        mesg.set_u8(3, 120, 0, Selector::Main).unwrap();
        assert_eq!(mesg.get_u8(3, 5, Selector::Main).unwrap(), None);
    }

    #[test]
    fn string_as_number_is_mismatch() {
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_string(8, "device", 0).unwrap();
        assert!(matches!(
            mesg.get_u16(8, 0, Selector::Main),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn number_into_string_field_is_mismatch() {
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_string(8, "device", 0).unwrap();
        assert!(matches!(
            mesg.set_u16(8, 7, 0, Selector::Main),
            Err(Error::TypeMismatch { .. })
        ));
        // The stored text is untouched.
        assert_eq!(mesg.get_string(8, 0).unwrap().as_deref(), Some("device"));
        // The profile types product_name as a string, so a numeric write
        // cannot create the field either.
        let mut fresh = Mesg::new(mesg_num::FILE_ID);
        assert!(fresh.set_u16(8, 7, 0, Selector::Main).is_err());
        assert!(!fresh.has_field(8));
    }

    #[test]
    fn decoded_string_padding_counts_toward_wire_size() {
        let field = Field {
            num: 8,
            base_type: BaseType::String,
            values: vec![Value::String("abc".into())],
            tail: vec![0, 0, 0, 0, 0],
        };
        assert_eq!(field.wire_size(), 8);
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_string(8, "abc", 0).unwrap();
        assert_eq!(mesg.field(8).unwrap().wire_size(), 4);
    }

    #[test]
    fn number_as_string_is_mismatch() {
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_u16(1, 1, 0, Selector::Main).unwrap();
        assert!(matches!(mesg.get_string(1, 0), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn enum_reads_as_ordinal() {
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_u8(0, 4, 0, Selector::Main).unwrap();
        assert_eq!(mesg.get_u16(0, 0, Selector::Main).unwrap(), Some(4));
    }

    #[test]
    fn widening_and_narrowing_coercion() {
        let mut mesg = Mesg::new(mesg_num::RECORD);
        mesg.set_u8(3, 150, 0, Selector::Main).unwrap();
        assert_eq!(mesg.get_u32(3, 0, Selector::Main).unwrap(), Some(150));
        mesg.set_u16(7, 400, 0, Selector::Main).unwrap();
        // 400 does not fit a u8.
        assert_eq!(mesg.get_u8(7, 0, Selector::Main).unwrap(), None);
    }

    #[test]
    fn active_subfield_selection() {
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_u16(2, 2697, 0, Selector::Main).unwrap();
        assert!(mesg.active_subfield(2).is_none());
        mesg.set_u16(1, 1, 0, Selector::Main).unwrap(); // manufacturer = garmin
        let (index, sub) = mesg.active_subfield(2).unwrap();
        assert_eq!(index, 0);
        assert_eq!(sub.name, "garmin_product");
    }

    #[test]
    fn unknown_message_uses_natural_types() {
        let mut mesg = Mesg::new(0xff00);
        mesg.set_u16(10, 42, 0, Selector::Main).unwrap();
        assert_eq!(mesg.get_u16(10, 0, Selector::Main).unwrap(), Some(42));
        assert_eq!(mesg.raw(10, 0), Some(&Value::U16(42)));
    }
}
