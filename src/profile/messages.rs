//! The message catalog: field tables transcribed from the profile
//! description. Sorted by global message number for binary search.

use crate::types::BaseType;

use super::{Component, FieldInfo, MesgInfo, SubfieldInfo, SubfieldRef};

const fn field(num: u8, name: &'static str, base_type: BaseType) -> FieldInfo {
    FieldInfo {
        num,
        name,
        base_type,
        scale: 1.0,
        offset: 0.0,
        units: "",
        components: &[],
        subfields: &[],
    }
}

const fn scaled(
    num: u8,
    name: &'static str,
    base_type: BaseType,
    scale: f64,
    offset: f64,
    units: &'static str,
) -> FieldInfo {
    FieldInfo {
        num,
        name,
        base_type,
        scale,
        offset,
        units,
        components: &[],
        subfields: &[],
    }
}

const fn with_units(
    num: u8,
    name: &'static str,
    base_type: BaseType,
    units: &'static str,
) -> FieldInfo {
    scaled(num, name, base_type, 1.0, 0.0, units)
}

const MESSAGE_INDEX: FieldInfo = field(254, "message_index", BaseType::UInt16);
const TIMESTAMP: FieldInfo = with_units(253, "timestamp", BaseType::UInt32, "s");

/// References selecting the `garmin_product` interpretation of a `product`
/// field, keyed on the sibling `manufacturer` value.
const GARMIN_PRODUCT_REFS: &[SubfieldRef] = &[
    SubfieldRef { field_num: 1, value: 1 },   // garmin
    SubfieldRef { field_num: 1, value: 2 },   // garmin_fr405_antfs
    SubfieldRef { field_num: 1, value: 13 },  // dynastream_oem
    SubfieldRef { field_num: 1, value: 15 },  // dynastream
    SubfieldRef { field_num: 1, value: 89 },  // tacx
];

const GARMIN_PRODUCT_SUBFIELD: SubfieldInfo = SubfieldInfo {
    name: "garmin_product",
    base_type: BaseType::UInt16,
    scale: 1.0,
    offset: 0.0,
    units: "",
    refs: GARMIN_PRODUCT_REFS,
};

/// `device_info.product` keys its subfield on field 2 (manufacturer)
/// rather than field 1.
const DEVICE_INFO_GARMIN_PRODUCT_REFS: &[SubfieldRef] = &[
    SubfieldRef { field_num: 2, value: 1 },
    SubfieldRef { field_num: 2, value: 2 },
    SubfieldRef { field_num: 2, value: 13 },
    SubfieldRef { field_num: 2, value: 15 },
    SubfieldRef { field_num: 2, value: 89 },
];

const FILE_ID: &[FieldInfo] = &[
    field(0, "type", BaseType::Enum),
    field(1, "manufacturer", BaseType::UInt16),
    FieldInfo {
        num: 2,
        name: "product",
        base_type: BaseType::UInt16,
        scale: 1.0,
        offset: 0.0,
        units: "",
        components: &[],
        subfields: &[GARMIN_PRODUCT_SUBFIELD],
    },
    field(3, "serial_number", BaseType::UInt32z),
    with_units(4, "time_created", BaseType::UInt32, "s"),
    field(5, "number", BaseType::UInt16),
    field(8, "product_name", BaseType::String),
];

const CAPABILITIES: &[FieldInfo] = &[
    field(0, "languages", BaseType::UInt8z),
    field(1, "sports", BaseType::UInt8z),
    field(21, "workouts_supported", BaseType::UInt32z),
    field(23, "connectivity_supported", BaseType::UInt32z),
];

const DEVICE_SETTINGS: &[FieldInfo] = &[
    field(0, "active_time_zone", BaseType::UInt8),
    with_units(1, "utc_offset", BaseType::UInt32, "s"),
    with_units(2, "time_offset", BaseType::UInt32, "s"),
    field(4, "time_mode", BaseType::Enum),
    scaled(5, "time_zone_offset", BaseType::SInt8, 4.0, 0.0, "hr"),
    field(55, "display_orientation", BaseType::Enum),
    field(94, "number_of_screens", BaseType::UInt8),
];

const USER_PROFILE: &[FieldInfo] = &[
    MESSAGE_INDEX,
    field(0, "friendly_name", BaseType::String),
    field(1, "gender", BaseType::Enum),
    with_units(2, "age", BaseType::UInt8, "years"),
    scaled(3, "height", BaseType::UInt8, 100.0, 0.0, "m"),
    scaled(4, "weight", BaseType::UInt16, 10.0, 0.0, "kg"),
    field(5, "language", BaseType::Enum),
    field(6, "elev_setting", BaseType::Enum),
    field(7, "weight_setting", BaseType::Enum),
    with_units(8, "resting_heart_rate", BaseType::UInt8, "bpm"),
    with_units(9, "default_max_running_heart_rate", BaseType::UInt8, "bpm"),
    with_units(10, "default_max_biking_heart_rate", BaseType::UInt8, "bpm"),
    with_units(11, "default_max_heart_rate", BaseType::UInt8, "bpm"),
];

const HRM_PROFILE: &[FieldInfo] = &[
    MESSAGE_INDEX,
    field(0, "enabled", BaseType::Enum),
    field(1, "hrm_ant_id", BaseType::UInt16z),
    field(2, "log_hrv", BaseType::Enum),
    field(3, "hrm_ant_id_trans_type", BaseType::UInt8z),
];

const ZONES_TARGET: &[FieldInfo] = &[
    with_units(1, "max_heart_rate", BaseType::UInt8, "bpm"),
    with_units(2, "threshold_heart_rate", BaseType::UInt8, "bpm"),
    with_units(3, "functional_threshold_power", BaseType::UInt16, "watts"),
    field(5, "hr_calc_type", BaseType::Enum),
    field(7, "pwr_calc_type", BaseType::Enum),
];

const HR_ZONE: &[FieldInfo] = &[
    MESSAGE_INDEX,
    with_units(1, "high_bpm", BaseType::UInt8, "bpm"),
    field(2, "name", BaseType::String),
];

const POWER_ZONE: &[FieldInfo] = &[
    MESSAGE_INDEX,
    with_units(1, "high_value", BaseType::UInt16, "watts"),
    field(2, "name", BaseType::String),
];

const MET_ZONE: &[FieldInfo] = &[
    MESSAGE_INDEX,
    with_units(1, "high_bpm", BaseType::UInt8, "bpm"),
    scaled(2, "calories", BaseType::UInt16, 10.0, 0.0, "kcal/min"),
    scaled(3, "fat_calories", BaseType::UInt8, 10.0, 0.0, "kcal/min"),
];

const SPORT: &[FieldInfo] = &[
    field(0, "sport", BaseType::Enum),
    field(1, "sub_sport", BaseType::Enum),
    field(3, "name", BaseType::String),
];

const SESSION: &[FieldInfo] = &[
    TIMESTAMP,
    MESSAGE_INDEX,
    field(0, "event", BaseType::Enum),
    field(1, "event_type", BaseType::Enum),
    with_units(2, "start_time", BaseType::UInt32, "s"),
    field(5, "sport", BaseType::Enum),
    field(6, "sub_sport", BaseType::Enum),
    scaled(7, "total_elapsed_time", BaseType::UInt32, 1000.0, 0.0, "s"),
    scaled(8, "total_timer_time", BaseType::UInt32, 1000.0, 0.0, "s"),
    scaled(9, "total_distance", BaseType::UInt32, 100.0, 0.0, "m"),
    with_units(11, "total_calories", BaseType::UInt16, "kcal"),
    scaled(14, "avg_speed", BaseType::UInt16, 1000.0, 0.0, "m/s"),
    scaled(15, "max_speed", BaseType::UInt16, 1000.0, 0.0, "m/s"),
    with_units(16, "avg_heart_rate", BaseType::UInt8, "bpm"),
    with_units(17, "max_heart_rate", BaseType::UInt8, "bpm"),
    with_units(18, "avg_cadence", BaseType::UInt8, "rpm"),
    with_units(20, "avg_power", BaseType::UInt16, "watts"),
    with_units(21, "max_power", BaseType::UInt16, "watts"),
    field(26, "num_laps", BaseType::UInt16),
];

const LAP: &[FieldInfo] = &[
    TIMESTAMP,
    MESSAGE_INDEX,
    field(0, "event", BaseType::Enum),
    field(1, "event_type", BaseType::Enum),
    with_units(2, "start_time", BaseType::UInt32, "s"),
    scaled(7, "total_elapsed_time", BaseType::UInt32, 1000.0, 0.0, "s"),
    scaled(8, "total_timer_time", BaseType::UInt32, 1000.0, 0.0, "s"),
    scaled(9, "total_distance", BaseType::UInt32, 100.0, 0.0, "m"),
    with_units(11, "total_calories", BaseType::UInt16, "kcal"),
    scaled(13, "avg_speed", BaseType::UInt16, 1000.0, 0.0, "m/s"),
    scaled(14, "max_speed", BaseType::UInt16, 1000.0, 0.0, "m/s"),
    with_units(15, "avg_heart_rate", BaseType::UInt8, "bpm"),
    with_units(16, "max_heart_rate", BaseType::UInt8, "bpm"),
];

/// Bit-packed speed (12 bits, 1/100 m/s) and accumulated distance (12 bits,
/// 1/16 m) carried in `record.compressed_speed_distance`.
const COMPRESSED_SPEED_DISTANCE: &[Component] = &[
    Component { field_num: 6, bits: 12, scale: 100.0, offset: 0.0, accumulate: false },
    Component { field_num: 5, bits: 12, scale: 16.0, offset: 0.0, accumulate: true },
];

const RECORD: &[FieldInfo] = &[
    TIMESTAMP,
    with_units(0, "position_lat", BaseType::SInt32, "semicircles"),
    with_units(1, "position_long", BaseType::SInt32, "semicircles"),
    scaled(2, "altitude", BaseType::UInt16, 5.0, 500.0, "m"),
    with_units(3, "heart_rate", BaseType::UInt8, "bpm"),
    with_units(4, "cadence", BaseType::UInt8, "rpm"),
    scaled(5, "distance", BaseType::UInt32, 100.0, 0.0, "m"),
    scaled(6, "speed", BaseType::UInt16, 1000.0, 0.0, "m/s"),
    with_units(7, "power", BaseType::UInt16, "watts"),
    FieldInfo {
        num: 8,
        name: "compressed_speed_distance",
        base_type: BaseType::Byte,
        scale: 1.0,
        offset: 0.0,
        units: "",
        components: COMPRESSED_SPEED_DISTANCE,
        subfields: &[],
    },
    with_units(13, "temperature", BaseType::SInt8, "C"),
    scaled(53, "fractional_cadence", BaseType::UInt8, 128.0, 0.0, "rpm"),
];

/// `event.data` reinterpreted as gear-change data when the sibling `event`
/// field reports a gear change.
const GEAR_CHANGE_REFS: &[SubfieldRef] = &[
    SubfieldRef { field_num: 0, value: 42 }, // front_gear_change
    SubfieldRef { field_num: 0, value: 43 }, // rear_gear_change
];

const EVENT: &[FieldInfo] = &[
    TIMESTAMP,
    field(0, "event", BaseType::Enum),
    field(1, "event_type", BaseType::Enum),
    FieldInfo {
        num: 2,
        name: "data16",
        base_type: BaseType::UInt16,
        scale: 1.0,
        offset: 0.0,
        units: "",
        components: &[Component { field_num: 3, bits: 16, scale: 1.0, offset: 0.0, accumulate: false }],
        subfields: &[],
    },
    FieldInfo {
        num: 3,
        name: "data",
        base_type: BaseType::UInt32,
        scale: 1.0,
        offset: 0.0,
        units: "",
        components: &[],
        subfields: &[SubfieldInfo {
            name: "gear_change_data",
            base_type: BaseType::UInt32z,
            scale: 1.0,
            offset: 0.0,
            units: "",
            refs: GEAR_CHANGE_REFS,
        }],
    },
    field(4, "event_group", BaseType::UInt8),
];

const DEVICE_INFO: &[FieldInfo] = &[
    TIMESTAMP,
    field(0, "device_index", BaseType::UInt8),
    field(1, "device_type", BaseType::UInt8),
    field(2, "manufacturer", BaseType::UInt16),
    field(3, "serial_number", BaseType::UInt32z),
    FieldInfo {
        num: 4,
        name: "product",
        base_type: BaseType::UInt16,
        scale: 1.0,
        offset: 0.0,
        units: "",
        components: &[],
        subfields: &[SubfieldInfo {
            name: "garmin_product",
            base_type: BaseType::UInt16,
            scale: 1.0,
            offset: 0.0,
            units: "",
            refs: DEVICE_INFO_GARMIN_PRODUCT_REFS,
        }],
    },
    scaled(5, "software_version", BaseType::UInt16, 100.0, 0.0, ""),
    field(6, "hardware_version", BaseType::UInt8),
    with_units(7, "cum_operating_time", BaseType::UInt32, "s"),
    scaled(10, "battery_voltage", BaseType::UInt16, 256.0, 0.0, "V"),
    field(11, "battery_status", BaseType::UInt8),
    field(27, "product_name", BaseType::String),
];

const WORKOUT: &[FieldInfo] = &[
    field(4, "sport", BaseType::Enum),
    field(5, "capabilities", BaseType::UInt32z),
    field(6, "num_valid_steps", BaseType::UInt16),
    field(8, "wkt_name", BaseType::String),
];

const ACTIVITY: &[FieldInfo] = &[
    TIMESTAMP,
    scaled(0, "total_timer_time", BaseType::UInt32, 1000.0, 0.0, "s"),
    field(1, "num_sessions", BaseType::UInt16),
    field(2, "type", BaseType::Enum),
    field(3, "event", BaseType::Enum),
    field(4, "event_type", BaseType::Enum),
    with_units(5, "local_timestamp", BaseType::UInt32, "s"),
    field(6, "event_group", BaseType::UInt8),
];

const FILE_CREATOR: &[FieldInfo] = &[
    field(0, "software_version", BaseType::UInt16),
    field(1, "hardware_version", BaseType::UInt8),
];

const HRV: &[FieldInfo] = &[scaled(0, "time", BaseType::UInt16, 1000.0, 0.0, "s")];

const FIELD_DESCRIPTION: &[FieldInfo] = &[
    field(0, "developer_data_index", BaseType::UInt8),
    field(1, "field_definition_number", BaseType::UInt8),
    field(2, "fit_base_type_id", BaseType::UInt8),
    field(3, "field_name", BaseType::String),
    field(8, "units", BaseType::String),
    field(14, "native_mesg_num", BaseType::UInt16),
    field(15, "native_field_num", BaseType::UInt8),
];

const DEVELOPER_DATA_ID: &[FieldInfo] = &[
    field(0, "developer_id", BaseType::Byte),
    field(1, "application_id", BaseType::Byte),
    field(2, "manufacturer_id", BaseType::UInt16),
    field(3, "developer_data_index", BaseType::UInt8),
    field(4, "application_version", BaseType::UInt32),
];

const DIVE_GAS: &[FieldInfo] = &[
    MESSAGE_INDEX,
    with_units(0, "helium_content", BaseType::UInt8, "percent"),
    with_units(1, "oxygen_content", BaseType::UInt8, "percent"),
    field(2, "status", BaseType::Enum),
];

const DIVE_ALARM: &[FieldInfo] = &[
    MESSAGE_INDEX,
    scaled(0, "depth", BaseType::UInt32, 1000.0, 0.0, "m"),
    with_units(1, "time", BaseType::SInt32, "s"),
    field(2, "enabled", BaseType::Enum),
    field(3, "alarm_type", BaseType::Enum),
    field(4, "sound", BaseType::Enum),
    field(5, "dive_types", BaseType::Enum),
    field(6, "id", BaseType::UInt32),
    field(7, "popup_enabled", BaseType::Enum),
    field(8, "trigger_on_descent", BaseType::Enum),
    field(9, "trigger_on_deco", BaseType::Enum),
    field(10, "repeating", BaseType::Enum),
    scaled(11, "speed", BaseType::SInt32, 1000.0, 0.0, "mps"),
];

const DIVE_SUMMARY: &[FieldInfo] = &[
    TIMESTAMP,
    field(0, "reference_mesg", BaseType::UInt16),
    field(1, "reference_index", BaseType::UInt16),
    scaled(2, "avg_depth", BaseType::UInt32, 1000.0, 0.0, "m"),
    scaled(3, "max_depth", BaseType::UInt32, 1000.0, 0.0, "m"),
    with_units(4, "surface_interval", BaseType::UInt32, "s"),
    with_units(5, "start_cns", BaseType::UInt8, "percent"),
    with_units(6, "end_cns", BaseType::UInt8, "percent"),
    scaled(9, "bottom_time", BaseType::UInt32, 1000.0, 0.0, "s"),
];

/// Sorted by global message number.
pub static MESGS: &[MesgInfo] = &[
    MesgInfo { num: 0, name: "file_id", fields: FILE_ID },
    MesgInfo { num: 1, name: "capabilities", fields: CAPABILITIES },
    MesgInfo { num: 2, name: "device_settings", fields: DEVICE_SETTINGS },
    MesgInfo { num: 3, name: "user_profile", fields: USER_PROFILE },
    MesgInfo { num: 4, name: "hrm_profile", fields: HRM_PROFILE },
    MesgInfo { num: 7, name: "zones_target", fields: ZONES_TARGET },
    MesgInfo { num: 8, name: "hr_zone", fields: HR_ZONE },
    MesgInfo { num: 9, name: "power_zone", fields: POWER_ZONE },
    MesgInfo { num: 10, name: "met_zone", fields: MET_ZONE },
    MesgInfo { num: 12, name: "sport", fields: SPORT },
    MesgInfo { num: 18, name: "session", fields: SESSION },
    MesgInfo { num: 19, name: "lap", fields: LAP },
    MesgInfo { num: 20, name: "record", fields: RECORD },
    MesgInfo { num: 21, name: "event", fields: EVENT },
    MesgInfo { num: 23, name: "device_info", fields: DEVICE_INFO },
    MesgInfo { num: 26, name: "workout", fields: WORKOUT },
    MesgInfo { num: 34, name: "activity", fields: ACTIVITY },
    MesgInfo { num: 49, name: "file_creator", fields: FILE_CREATOR },
    MesgInfo { num: 78, name: "hrv", fields: HRV },
    MesgInfo { num: 206, name: "field_description", fields: FIELD_DESCRIPTION },
    MesgInfo { num: 207, name: "developer_data_id", fields: DEVELOPER_DATA_ID },
    MesgInfo { num: 259, name: "dive_gas", fields: DIVE_GAS },
    MesgInfo { num: 262, name: "dive_alarm", fields: DIVE_ALARM },
    MesgInfo { num: 268, name: "dive_summary", fields: DIVE_SUMMARY },
];
