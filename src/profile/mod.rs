//! The static profile registry.
//!
//! A read-only catalog of message types, field definitions and
//! enumerations, populated from the profile description at build time and
//! immutable afterwards. Lookups never fail hard: unknown message or field
//! numbers return `None`, and the decoder surfaces such data as raw field
//! bags rather than errors.

pub mod messages;
pub mod types;

pub use types::*;

use crate::types::BaseType;

/// A profile-defined message type.
#[derive(Debug)]
pub struct MesgInfo {
    pub num: u16,
    pub name: &'static str,
    pub fields: &'static [FieldInfo],
}

/// The canonical definition of one field of a message.
#[derive(Debug)]
pub struct FieldInfo {
    pub num: u8,
    pub name: &'static str,
    pub base_type: BaseType,
    /// Linear transform: `physical = raw / scale - offset`.
    pub scale: f64,
    pub offset: f64,
    pub units: &'static str,
    /// Bit-packed decomposition into other fields of the same message,
    /// declared LSB-first.
    pub components: &'static [Component],
    /// Alternative interpretations selected by a sibling field's value.
    pub subfields: &'static [SubfieldInfo],
}

/// One component of a bit-packed field. The component's own scale maps the
/// extracted bits to physical units; the destination field's declared
/// scale/offset then produce the stored raw value.
#[derive(Debug)]
pub struct Component {
    pub field_num: u8,
    pub bits: u8,
    pub scale: f64,
    pub offset: f64,
    /// Accumulating components extend a rolling counter rather than
    /// replacing the destination value.
    pub accumulate: bool,
}

/// An alternative interpretation of a field, active when a sibling field
/// holds one of the reference values.
#[derive(Debug)]
pub struct SubfieldInfo {
    pub name: &'static str,
    pub base_type: BaseType,
    pub scale: f64,
    pub offset: f64,
    pub units: &'static str,
    pub refs: &'static [SubfieldRef],
}

#[derive(Debug)]
pub struct SubfieldRef {
    pub field_num: u8,
    pub value: u32,
}

impl MesgInfo {
    pub fn field(&self, field_num: u8) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.num == field_num)
    }
}

/// Looks up a message type by global message number.
pub fn mesg(num: u16) -> Option<&'static MesgInfo> {
    messages::MESGS
        .binary_search_by_key(&num, |m| m.num)
        .ok()
        .map(|index| &messages::MESGS[index])
}

/// Looks up a field definition by `(message_number, field_number)`.
pub fn field(mesg_num: u16, field_num: u8) -> Option<&'static FieldInfo> {
    mesg(mesg_num)?.field(field_num)
}

pub fn mesg_name(num: u16) -> Option<&'static str> {
    mesg(num).map(|m| m.name)
}

/// Resolves a profile enumeration variant to its numeric value, e.g.
/// `enum_value("file", "activity") == Some(4)`.
pub fn enum_value(enum_name: &str, variant: &str) -> Option<u32> {
    let (_, variants) = types::ENUMS.iter().find(|(name, _)| *name == enum_name)?;
    variants
        .iter()
        .find(|(name, _)| *name == variant)
        .map(|&(_, value)| value)
}

/// Global message numbers of the profile messages this crate knows about.
pub mod mesg_num {
    pub const FILE_ID: u16 = 0;
    pub const CAPABILITIES: u16 = 1;
    pub const DEVICE_SETTINGS: u16 = 2;
    pub const USER_PROFILE: u16 = 3;
    pub const HRM_PROFILE: u16 = 4;
    pub const ZONES_TARGET: u16 = 7;
    pub const HR_ZONE: u16 = 8;
    pub const POWER_ZONE: u16 = 9;
    pub const MET_ZONE: u16 = 10;
    pub const SPORT: u16 = 12;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
    pub const DEVICE_INFO: u16 = 23;
    pub const WORKOUT: u16 = 26;
    pub const ACTIVITY: u16 = 34;
    pub const FILE_CREATOR: u16 = 49;
    pub const HRV: u16 = 78;
    pub const FIELD_DESCRIPTION: u16 = 206;
    pub const DEVELOPER_DATA_ID: u16 = 207;
    pub const DIVE_GAS: u16 = 259;
    pub const DIVE_ALARM: u16 = 262;
    pub const DIVE_SUMMARY: u16 = 268;
}
