//! Profile enumerations.
//!
//! Only the variants exercised by the message catalog are listed; the full
//! profile defines many more. Unknown ordinals are preserved as raw values
//! by the field bag, so an incomplete listing never loses data.

/// The `file` enumeration: what kind of data a FIT file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum File {
    Device,
    Settings,
    Sport,
    Activity,
    Workout,
    Course,
    Schedules,
    Weight,
    Totals,
    Goals,
    BloodPressure,
    MonitoringA,
    ActivitySummary,
    MonitoringDaily,
    MonitoringB,
    Segment,
    SegmentList,
    ExdConfiguration,
}

impl File {
    pub fn from_u8(value: u8) -> Option<File> {
        Some(match value {
            1 => File::Device,
            2 => File::Settings,
            3 => File::Sport,
            4 => File::Activity,
            5 => File::Workout,
            6 => File::Course,
            7 => File::Schedules,
            9 => File::Weight,
            10 => File::Totals,
            11 => File::Goals,
            14 => File::BloodPressure,
            15 => File::MonitoringA,
            20 => File::ActivitySummary,
            28 => File::MonitoringDaily,
            32 => File::MonitoringB,
            34 => File::Segment,
            35 => File::SegmentList,
            40 => File::ExdConfiguration,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        match self {
            File::Device => 1,
            File::Settings => 2,
            File::Sport => 3,
            File::Activity => 4,
            File::Workout => 5,
            File::Course => 6,
            File::Schedules => 7,
            File::Weight => 9,
            File::Totals => 10,
            File::Goals => 11,
            File::BloodPressure => 14,
            File::MonitoringA => 15,
            File::ActivitySummary => 20,
            File::MonitoringDaily => 28,
            File::MonitoringB => 32,
            File::Segment => 34,
            File::SegmentList => 35,
            File::ExdConfiguration => 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sport {
    Generic,
    Running,
    Cycling,
    Transition,
    FitnessEquipment,
    Swimming,
    Basketball,
    Soccer,
    Tennis,
    Training,
    Walking,
    Hiking,
    Multisport,
    Paddling,
    Diving,
}

impl Sport {
    pub fn from_u8(value: u8) -> Option<Sport> {
        Some(match value {
            0 => Sport::Generic,
            1 => Sport::Running,
            2 => Sport::Cycling,
            3 => Sport::Transition,
            4 => Sport::FitnessEquipment,
            5 => Sport::Swimming,
            6 => Sport::Basketball,
            7 => Sport::Soccer,
            8 => Sport::Tennis,
            10 => Sport::Training,
            11 => Sport::Walking,
            17 => Sport::Hiking,
            18 => Sport::Multisport,
            19 => Sport::Paddling,
            53 => Sport::Diving,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Sport::Generic => 0,
            Sport::Running => 1,
            Sport::Cycling => 2,
            Sport::Transition => 3,
            Sport::FitnessEquipment => 4,
            Sport::Swimming => 5,
            Sport::Basketball => 6,
            Sport::Soccer => 7,
            Sport::Tennis => 8,
            Sport::Training => 10,
            Sport::Walking => 11,
            Sport::Hiking => 17,
            Sport::Multisport => 18,
            Sport::Paddling => 19,
            Sport::Diving => 53,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Timer,
    Workout,
    Session,
    Lap,
    Activity,
    FrontGearChange,
    RearGearChange,
}

impl Event {
    pub fn from_u8(value: u8) -> Option<Event> {
        Some(match value {
            0 => Event::Timer,
            3 => Event::Workout,
            8 => Event::Session,
            9 => Event::Lap,
            26 => Event::Activity,
            42 => Event::FrontGearChange,
            43 => Event::RearGearChange,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Event::Timer => 0,
            Event::Workout => 3,
            Event::Session => 8,
            Event::Lap => 9,
            Event::Activity => 26,
            Event::FrontGearChange => 42,
            Event::RearGearChange => 43,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Start,
    Stop,
    ConsecutiveDepreciated,
    Marker,
    StopAll,
    BeginDepreciated,
    EndDepreciated,
    EndAllDepreciated,
    StopDisable,
    StopDisableAll,
}

impl EventType {
    pub fn from_u8(value: u8) -> Option<EventType> {
        Some(match value {
            0 => EventType::Start,
            1 => EventType::Stop,
            2 => EventType::ConsecutiveDepreciated,
            3 => EventType::Marker,
            4 => EventType::StopAll,
            5 => EventType::BeginDepreciated,
            6 => EventType::EndDepreciated,
            7 => EventType::EndAllDepreciated,
            8 => EventType::StopDisable,
            9 => EventType::StopDisableAll,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        match self {
            EventType::Start => 0,
            EventType::Stop => 1,
            EventType::ConsecutiveDepreciated => 2,
            EventType::Marker => 3,
            EventType::StopAll => 4,
            EventType::BeginDepreciated => 5,
            EventType::EndDepreciated => 6,
            EventType::EndAllDepreciated => 7,
            EventType::StopDisable => 8,
            EventType::StopDisableAll => 9,
        }
    }
}

/// The `dive_alarm_type` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiveAlarmType {
    Depth,
    Time,
    Speed,
}

impl DiveAlarmType {
    pub fn from_u8(value: u8) -> Option<DiveAlarmType> {
        Some(match value {
            0 => DiveAlarmType::Depth,
            1 => DiveAlarmType::Time,
            2 => DiveAlarmType::Speed,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        match self {
            DiveAlarmType::Depth => 0,
            DiveAlarmType::Time => 1,
            DiveAlarmType::Speed => 2,
        }
    }
}

/// The `tone` enumeration, used by dive alarm sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Off,
    Tone,
    Vibrate,
    ToneAndVibrate,
}

impl Tone {
    pub fn from_u8(value: u8) -> Option<Tone> {
        Some(match value {
            0 => Tone::Off,
            1 => Tone::Tone,
            2 => Tone::Vibrate,
            3 => Tone::ToneAndVibrate,
            _ => return None,
        })
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Tone::Off => 0,
            Tone::Tone => 1,
            Tone::Vibrate => 2,
            Tone::ToneAndVibrate => 3,
        }
    }
}

/// Manufacturer ordinals referenced by the catalog's subfield selectors.
pub mod manufacturer {
    pub const GARMIN: u16 = 1;
    pub const GARMIN_FR405_ANTFS: u16 = 2;
    pub const DYNASTREAM_OEM: u16 = 13;
    pub const DYNASTREAM: u16 = 15;
    pub const WAHOO_FITNESS: u16 = 32;
    pub const TACX: u16 = 89;
    pub const DEVELOPMENT: u16 = 255;
    pub const FAVERO_ELECTRONICS: u16 = 263;
}

/// Name table backing [`super::enum_value`].
pub static ENUMS: &[(&str, &[(&str, u32)])] = &[
    (
        "file",
        &[
            ("device", 1),
            ("settings", 2),
            ("sport", 3),
            ("activity", 4),
            ("workout", 5),
            ("course", 6),
            ("schedules", 7),
            ("weight", 9),
            ("totals", 10),
            ("goals", 11),
            ("blood_pressure", 14),
            ("monitoring_a", 15),
            ("activity_summary", 20),
            ("monitoring_daily", 28),
            ("monitoring_b", 32),
            ("segment", 34),
            ("segment_list", 35),
            ("exd_configuration", 40),
        ],
    ),
    (
        "manufacturer",
        &[
            ("garmin", 1),
            ("garmin_fr405_antfs", 2),
            ("dynastream_oem", 13),
            ("dynastream", 15),
            ("wahoo_fitness", 32),
            ("tacx", 89),
            ("development", 255),
            ("favero_electronics", 263),
        ],
    ),
    (
        "sport",
        &[
            ("generic", 0),
            ("running", 1),
            ("cycling", 2),
            ("transition", 3),
            ("fitness_equipment", 4),
            ("swimming", 5),
            ("basketball", 6),
            ("soccer", 7),
            ("tennis", 8),
            ("training", 10),
            ("walking", 11),
            ("hiking", 17),
            ("multisport", 18),
            ("paddling", 19),
            ("diving", 53),
        ],
    ),
    (
        "event",
        &[
            ("timer", 0),
            ("workout", 3),
            ("session", 8),
            ("lap", 9),
            ("activity", 26),
            ("front_gear_change", 42),
            ("rear_gear_change", 43),
        ],
    ),
    (
        "event_type",
        &[
            ("start", 0),
            ("stop", 1),
            ("marker", 3),
            ("stop_all", 4),
            ("stop_disable", 8),
            ("stop_disable_all", 9),
        ],
    ),
    ("dive_alarm_type", &[("depth", 0), ("time", 1), ("speed", 2)]),
    (
        "tone",
        &[("off", 0), ("tone", 1), ("vibrate", 2), ("tone_and_vibrate", 3)],
    ),
];
