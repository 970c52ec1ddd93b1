//! Typed, zero-copy views over field bags.
//!
//! A view wraps a borrowed [`Mesg`] and exposes the profile's fields as
//! typed getters. Getters return `None` for absent fields, invalid
//! sentinels and type mismatches alike; callers who need to distinguish
//! those cases use the field bag accessors directly. Writes go through the
//! field bag with the per-message field number constants below.

use crate::dispatch::MesgBroadcaster;
use crate::mesg::{Mesg, Selector};
use crate::profile::types::{DiveAlarmType, Event, EventType, File, Tone};
use crate::profile::mesg_num;
use crate::types::BaseType;

/// Field numbers of the `file_id` message.
pub mod file_id {
    pub const TYPE: u8 = 0;
    pub const MANUFACTURER: u8 = 1;
    pub const PRODUCT: u8 = 2;
    pub const SERIAL_NUMBER: u8 = 3;
    pub const TIME_CREATED: u8 = 4;
    pub const NUMBER: u8 = 5;
    pub const PRODUCT_NAME: u8 = 8;
}

/// Field numbers of the `file_creator` message.
pub mod file_creator {
    pub const SOFTWARE_VERSION: u8 = 0;
    pub const HARDWARE_VERSION: u8 = 1;
}

/// Field numbers of the `hrm_profile` message.
pub mod hrm_profile {
    pub const MESSAGE_INDEX: u8 = 254;
    pub const ENABLED: u8 = 0;
    pub const HRM_ANT_ID: u8 = 1;
    pub const LOG_HRV: u8 = 2;
    pub const HRM_ANT_ID_TRANS_TYPE: u8 = 3;
}

/// Field numbers of the `met_zone` message.
pub mod met_zone {
    pub const MESSAGE_INDEX: u8 = 254;
    pub const HIGH_BPM: u8 = 1;
    pub const CALORIES: u8 = 2;
    pub const FAT_CALORIES: u8 = 3;
}

/// Field numbers of the `record` message.
pub mod record {
    pub const TIMESTAMP: u8 = 253;
    pub const POSITION_LAT: u8 = 0;
    pub const POSITION_LONG: u8 = 1;
    pub const ALTITUDE: u8 = 2;
    pub const HEART_RATE: u8 = 3;
    pub const CADENCE: u8 = 4;
    pub const DISTANCE: u8 = 5;
    pub const SPEED: u8 = 6;
    pub const POWER: u8 = 7;
    pub const COMPRESSED_SPEED_DISTANCE: u8 = 8;
    pub const TEMPERATURE: u8 = 13;
}

/// Field numbers of the `event` message.
pub mod event {
    pub const TIMESTAMP: u8 = 253;
    pub const EVENT: u8 = 0;
    pub const EVENT_TYPE: u8 = 1;
    pub const DATA16: u8 = 2;
    pub const DATA: u8 = 3;
    pub const EVENT_GROUP: u8 = 4;
}

/// Field numbers of the `device_info` message.
pub mod device_info {
    pub const TIMESTAMP: u8 = 253;
    pub const DEVICE_INDEX: u8 = 0;
    pub const DEVICE_TYPE: u8 = 1;
    pub const MANUFACTURER: u8 = 2;
    pub const SERIAL_NUMBER: u8 = 3;
    pub const PRODUCT: u8 = 4;
    pub const SOFTWARE_VERSION: u8 = 5;
    pub const BATTERY_VOLTAGE: u8 = 10;
    pub const PRODUCT_NAME: u8 = 27;
}

/// Field numbers of the `activity` message.
pub mod activity {
    pub const TIMESTAMP: u8 = 253;
    pub const TOTAL_TIMER_TIME: u8 = 0;
    pub const NUM_SESSIONS: u8 = 1;
    pub const TYPE: u8 = 2;
    pub const EVENT: u8 = 3;
    pub const EVENT_TYPE: u8 = 4;
    pub const LOCAL_TIMESTAMP: u8 = 5;
}

/// Field numbers of the `field_description` message.
pub mod field_description {
    pub const DEVELOPER_DATA_INDEX: u8 = 0;
    pub const FIELD_DEFINITION_NUMBER: u8 = 1;
    pub const FIT_BASE_TYPE_ID: u8 = 2;
    pub const FIELD_NAME: u8 = 3;
    pub const UNITS: u8 = 8;
    pub const NATIVE_MESG_NUM: u8 = 14;
    pub const NATIVE_FIELD_NUM: u8 = 15;
}

/// Field numbers of the `developer_data_id` message.
pub mod developer_data_id {
    pub const DEVELOPER_ID: u8 = 0;
    pub const APPLICATION_ID: u8 = 1;
    pub const MANUFACTURER_ID: u8 = 2;
    pub const DEVELOPER_DATA_INDEX: u8 = 3;
    pub const APPLICATION_VERSION: u8 = 4;
}

/// Field numbers of the `dive_alarm` message.
pub mod dive_alarm {
    pub const MESSAGE_INDEX: u8 = 254;
    pub const DEPTH: u8 = 0;
    pub const TIME: u8 = 1;
    pub const ENABLED: u8 = 2;
    pub const ALARM_TYPE: u8 = 3;
    pub const SOUND: u8 = 4;
    pub const ID: u8 = 6;
    pub const SPEED: u8 = 11;
}

macro_rules! views {
    ($(($view:ident, $num:expr, $helper:ident)),* $(,)?) => {$(
        #[derive(Debug, Clone, Copy)]
        pub struct $view<'a>(&'a Mesg);

        impl<'a> $view<'a> {
            pub const NUM: u16 = $num;

            /// Wraps a field bag carrying this view's message number.
            pub fn wrap(mesg: &'a Mesg) -> Option<$view<'a>> {
                (mesg.num() == Self::NUM).then_some($view(mesg))
            }

            /// The underlying field bag.
            pub fn mesg(&self) -> &'a Mesg {
                self.0
            }
        }

        impl MesgBroadcaster {
            /// Registers a callback receiving this view for every matching
            /// record.
            pub fn $helper<F>(&mut self, mut callback: F)
            where
                F: FnMut($view<'_>) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
                    + 'static,
            {
                self.add_listener_for_num($view::NUM, move |mesg: &Mesg| {
                    match $view::wrap(mesg) {
                        Some(view) => callback(view),
                        None => Ok(()),
                    }
                });
            }
        }
    )*};
}

views!(
    (FileIdMesg, mesg_num::FILE_ID, add_file_id_listener),
    (FileCreatorMesg, mesg_num::FILE_CREATOR, add_file_creator_listener),
    (HrmProfileMesg, mesg_num::HRM_PROFILE, add_hrm_profile_listener),
    (MetZoneMesg, mesg_num::MET_ZONE, add_met_zone_listener),
    (RecordMesg, mesg_num::RECORD, add_record_listener),
    (EventMesg, mesg_num::EVENT, add_event_listener),
    (DeviceInfoMesg, mesg_num::DEVICE_INFO, add_device_info_listener),
    (ActivityMesg, mesg_num::ACTIVITY, add_activity_listener),
    (FieldDescriptionMesg, mesg_num::FIELD_DESCRIPTION, add_field_description_listener),
    (DeveloperDataIdMesg, mesg_num::DEVELOPER_DATA_ID, add_developer_data_id_listener),
    (DiveAlarmMesg, mesg_num::DIVE_ALARM, add_dive_alarm_listener),
);

impl FileIdMesg<'_> {
    pub fn file_type(&self) -> Option<File> {
        let raw = self.0.get_u8(file_id::TYPE, 0, Selector::Main).ok().flatten()?;
        File::from_u8(raw)
    }

    pub fn manufacturer(&self) -> Option<u16> {
        self.0.get_u16(file_id::MANUFACTURER, 0, Selector::Main).ok().flatten()
    }

    pub fn product(&self) -> Option<u16> {
        self.0.get_u16(file_id::PRODUCT, 0, Selector::Main).ok().flatten()
    }

    /// The `product` field under its `garmin_product` interpretation, when
    /// the manufacturer selects it.
    pub fn garmin_product(&self) -> Option<u16> {
        let (index, _) = self.0.active_subfield(file_id::PRODUCT)?;
        self.0.get_u16(file_id::PRODUCT, 0, Selector::Subfield(index)).ok().flatten()
    }

    pub fn serial_number(&self) -> Option<u32> {
        self.0.get_u32(file_id::SERIAL_NUMBER, 0, Selector::Main).ok().flatten()
    }

    /// Seconds since the FIT epoch.
    pub fn time_created(&self) -> Option<u32> {
        self.0.get_u32(file_id::TIME_CREATED, 0, Selector::Main).ok().flatten()
    }

    pub fn number(&self) -> Option<u16> {
        self.0.get_u16(file_id::NUMBER, 0, Selector::Main).ok().flatten()
    }

    pub fn product_name(&self) -> Option<String> {
        self.0.get_string(file_id::PRODUCT_NAME, 0).ok().flatten()
    }
}

impl FileCreatorMesg<'_> {
    pub fn software_version(&self) -> Option<u16> {
        self.0.get_u16(file_creator::SOFTWARE_VERSION, 0, Selector::Main).ok().flatten()
    }

    pub fn hardware_version(&self) -> Option<u8> {
        self.0.get_u8(file_creator::HARDWARE_VERSION, 0, Selector::Main).ok().flatten()
    }
}

impl HrmProfileMesg<'_> {
    pub fn message_index(&self) -> Option<u16> {
        self.0.get_u16(hrm_profile::MESSAGE_INDEX, 0, Selector::Main).ok().flatten()
    }

    pub fn enabled(&self) -> Option<bool> {
        self.0.get_bool(hrm_profile::ENABLED, 0, Selector::Main).ok().flatten()
    }

    pub fn hrm_ant_id(&self) -> Option<u16> {
        self.0.get_u16(hrm_profile::HRM_ANT_ID, 0, Selector::Main).ok().flatten()
    }

    pub fn log_hrv(&self) -> Option<bool> {
        self.0.get_bool(hrm_profile::LOG_HRV, 0, Selector::Main).ok().flatten()
    }

    pub fn hrm_ant_id_trans_type(&self) -> Option<u8> {
        self.0.get_u8(hrm_profile::HRM_ANT_ID_TRANS_TYPE, 0, Selector::Main).ok().flatten()
    }
}

impl MetZoneMesg<'_> {
    pub fn message_index(&self) -> Option<u16> {
        self.0.get_u16(met_zone::MESSAGE_INDEX, 0, Selector::Main).ok().flatten()
    }

    pub fn high_bpm(&self) -> Option<u8> {
        self.0.get_u8(met_zone::HIGH_BPM, 0, Selector::Main).ok().flatten()
    }

    /// kcal/min.
    pub fn calories(&self) -> Option<f64> {
        self.0.get_f64(met_zone::CALORIES, 0, Selector::Main).ok().flatten()
    }

    /// kcal/min.
    pub fn fat_calories(&self) -> Option<f64> {
        self.0.get_f64(met_zone::FAT_CALORIES, 0, Selector::Main).ok().flatten()
    }
}

impl RecordMesg<'_> {
    /// Seconds since the FIT epoch.
    pub fn timestamp(&self) -> Option<u32> {
        self.0.get_u32(record::TIMESTAMP, 0, Selector::Main).ok().flatten()
    }

    /// Semicircles.
    pub fn position_lat(&self) -> Option<i32> {
        self.0.get_i32(record::POSITION_LAT, 0, Selector::Main).ok().flatten()
    }

    /// Semicircles.
    pub fn position_long(&self) -> Option<i32> {
        self.0.get_i32(record::POSITION_LONG, 0, Selector::Main).ok().flatten()
    }

    /// Metres.
    pub fn altitude(&self) -> Option<f64> {
        self.0.get_f64(record::ALTITUDE, 0, Selector::Main).ok().flatten()
    }

    /// Beats per minute.
    pub fn heart_rate(&self) -> Option<u8> {
        self.0.get_u8(record::HEART_RATE, 0, Selector::Main).ok().flatten()
    }

    pub fn cadence(&self) -> Option<u8> {
        self.0.get_u8(record::CADENCE, 0, Selector::Main).ok().flatten()
    }

    /// Metres.
    pub fn distance(&self) -> Option<f64> {
        self.0.get_f64(record::DISTANCE, 0, Selector::Main).ok().flatten()
    }

    /// Metres per second.
    pub fn speed(&self) -> Option<f64> {
        self.0.get_f64(record::SPEED, 0, Selector::Main).ok().flatten()
    }

    /// Watts.
    pub fn power(&self) -> Option<u16> {
        self.0.get_u16(record::POWER, 0, Selector::Main).ok().flatten()
    }

    /// Degrees Celsius.
    pub fn temperature(&self) -> Option<i8> {
        self.0.get_i8(record::TEMPERATURE, 0, Selector::Main).ok().flatten()
    }
}

impl EventMesg<'_> {
    pub fn timestamp(&self) -> Option<u32> {
        self.0.get_u32(event::TIMESTAMP, 0, Selector::Main).ok().flatten()
    }

    pub fn event(&self) -> Option<Event> {
        let raw = self.0.get_u8(event::EVENT, 0, Selector::Main).ok().flatten()?;
        Event::from_u8(raw)
    }

    pub fn event_type(&self) -> Option<EventType> {
        let raw = self.0.get_u8(event::EVENT_TYPE, 0, Selector::Main).ok().flatten()?;
        EventType::from_u8(raw)
    }

    pub fn data(&self) -> Option<u32> {
        self.0.get_u32(event::DATA, 0, Selector::Main).ok().flatten()
    }

    /// The `data` field under its gear-change interpretation, when the
    /// `event` field selects it.
    pub fn gear_change_data(&self) -> Option<u32> {
        let (index, _) = self.0.active_subfield(event::DATA)?;
        self.0.get_u32(event::DATA, 0, Selector::Subfield(index)).ok().flatten()
    }

    pub fn event_group(&self) -> Option<u8> {
        self.0.get_u8(event::EVENT_GROUP, 0, Selector::Main).ok().flatten()
    }
}

impl DeviceInfoMesg<'_> {
    pub fn timestamp(&self) -> Option<u32> {
        self.0.get_u32(device_info::TIMESTAMP, 0, Selector::Main).ok().flatten()
    }

    pub fn device_index(&self) -> Option<u8> {
        self.0.get_u8(device_info::DEVICE_INDEX, 0, Selector::Main).ok().flatten()
    }

    pub fn manufacturer(&self) -> Option<u16> {
        self.0.get_u16(device_info::MANUFACTURER, 0, Selector::Main).ok().flatten()
    }

    pub fn serial_number(&self) -> Option<u32> {
        self.0.get_u32(device_info::SERIAL_NUMBER, 0, Selector::Main).ok().flatten()
    }

    pub fn product(&self) -> Option<u16> {
        self.0.get_u16(device_info::PRODUCT, 0, Selector::Main).ok().flatten()
    }

    pub fn garmin_product(&self) -> Option<u16> {
        let (index, _) = self.0.active_subfield(device_info::PRODUCT)?;
        self.0.get_u16(device_info::PRODUCT, 0, Selector::Subfield(index)).ok().flatten()
    }

    pub fn software_version(&self) -> Option<f64> {
        self.0.get_f64(device_info::SOFTWARE_VERSION, 0, Selector::Main).ok().flatten()
    }

    /// Volts.
    pub fn battery_voltage(&self) -> Option<f64> {
        self.0.get_f64(device_info::BATTERY_VOLTAGE, 0, Selector::Main).ok().flatten()
    }

    pub fn product_name(&self) -> Option<String> {
        self.0.get_string(device_info::PRODUCT_NAME, 0).ok().flatten()
    }
}

impl ActivityMesg<'_> {
    pub fn timestamp(&self) -> Option<u32> {
        self.0.get_u32(activity::TIMESTAMP, 0, Selector::Main).ok().flatten()
    }

    /// Seconds.
    pub fn total_timer_time(&self) -> Option<f64> {
        self.0.get_f64(activity::TOTAL_TIMER_TIME, 0, Selector::Main).ok().flatten()
    }

    pub fn num_sessions(&self) -> Option<u16> {
        self.0.get_u16(activity::NUM_SESSIONS, 0, Selector::Main).ok().flatten()
    }

    pub fn local_timestamp(&self) -> Option<u32> {
        self.0.get_u32(activity::LOCAL_TIMESTAMP, 0, Selector::Main).ok().flatten()
    }
}

impl FieldDescriptionMesg<'_> {
    pub fn developer_data_index(&self) -> Option<u8> {
        self.0.get_u8(field_description::DEVELOPER_DATA_INDEX, 0, Selector::Main).ok().flatten()
    }

    pub fn field_definition_number(&self) -> Option<u8> {
        self.0
            .get_u8(field_description::FIELD_DEFINITION_NUMBER, 0, Selector::Main)
            .ok()
            .flatten()
    }

    pub fn fit_base_type(&self) -> Option<BaseType> {
        let raw = self
            .0
            .get_u8(field_description::FIT_BASE_TYPE_ID, 0, Selector::Main)
            .ok()
            .flatten()?;
        Some(BaseType::from_wire(raw))
    }

    pub fn field_name(&self) -> Option<String> {
        self.0.get_string(field_description::FIELD_NAME, 0).ok().flatten()
    }

    pub fn units(&self) -> Option<String> {
        self.0.get_string(field_description::UNITS, 0).ok().flatten()
    }

    pub fn native_mesg_num(&self) -> Option<u16> {
        self.0.get_u16(field_description::NATIVE_MESG_NUM, 0, Selector::Main).ok().flatten()
    }
}

impl DeveloperDataIdMesg<'_> {
    pub fn developer_data_index(&self) -> Option<u8> {
        self.0.get_u8(developer_data_id::DEVELOPER_DATA_INDEX, 0, Selector::Main).ok().flatten()
    }

    pub fn manufacturer_id(&self) -> Option<u16> {
        self.0.get_u16(developer_data_id::MANUFACTURER_ID, 0, Selector::Main).ok().flatten()
    }

    pub fn application_version(&self) -> Option<u32> {
        self.0.get_u32(developer_data_id::APPLICATION_VERSION, 0, Selector::Main).ok().flatten()
    }
}

impl DiveAlarmMesg<'_> {
    pub fn message_index(&self) -> Option<u16> {
        self.0.get_u16(dive_alarm::MESSAGE_INDEX, 0, Selector::Main).ok().flatten()
    }

    /// Metres.
    pub fn depth(&self) -> Option<f64> {
        self.0.get_f64(dive_alarm::DEPTH, 0, Selector::Main).ok().flatten()
    }

    /// Seconds.
    pub fn time(&self) -> Option<i32> {
        self.0.get_i32(dive_alarm::TIME, 0, Selector::Main).ok().flatten()
    }

    pub fn enabled(&self) -> Option<bool> {
        self.0.get_bool(dive_alarm::ENABLED, 0, Selector::Main).ok().flatten()
    }

    pub fn alarm_type(&self) -> Option<DiveAlarmType> {
        let raw = self.0.get_u8(dive_alarm::ALARM_TYPE, 0, Selector::Main).ok().flatten()?;
        DiveAlarmType::from_u8(raw)
    }

    pub fn sound(&self) -> Option<Tone> {
        let raw = self.0.get_u8(dive_alarm::SOUND, 0, Selector::Main).ok().flatten()?;
        Tone::from_u8(raw)
    }

    pub fn id(&self) -> Option<u32> {
        self.0.get_u32(dive_alarm::ID, 0, Selector::Main).ok().flatten()
    }

    /// Metres per second.
    pub fn speed(&self) -> Option<f64> {
        self.0.get_f64(dive_alarm::SPEED, 0, Selector::Main).ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_checks_message_number() {
        let mesg = Mesg::new(mesg_num::RECORD);
        assert!(FileIdMesg::wrap(&mesg).is_none());
        assert!(RecordMesg::wrap(&mesg).is_some());
    }

    #[test]
    fn file_id_round_trip_through_view() {
        let mut mesg = Mesg::new(mesg_num::FILE_ID);
        mesg.set_u8(file_id::TYPE, File::Activity.as_u8(), 0, Selector::Main).unwrap();
        mesg.set_u16(file_id::MANUFACTURER, 1, 0, Selector::Main).unwrap();
        mesg.set_u16(file_id::PRODUCT, 2697, 0, Selector::Main).unwrap();
        let view = FileIdMesg::wrap(&mesg).unwrap();
        assert_eq!(view.file_type(), Some(File::Activity));
        assert_eq!(view.manufacturer(), Some(1));
        assert_eq!(view.garmin_product(), Some(2697));
    }

    #[test]
    fn gear_change_subfield_via_view() {
        let mut mesg = Mesg::new(mesg_num::EVENT);
        mesg.set_u32(event::DATA, 0x0203_0405, 0, Selector::Main).unwrap();
        let view = EventMesg::wrap(&mesg).unwrap();
        assert_eq!(view.gear_change_data(), None);
        mesg.set_u8(event::EVENT, Event::RearGearChange.as_u8(), 0, Selector::Main).unwrap();
        let view = EventMesg::wrap(&mesg).unwrap();
        assert_eq!(view.gear_change_data(), Some(0x0203_0405));
    }

    #[test]
    fn scaled_getter_applies_transform() {
        let mut mesg = Mesg::new(mesg_num::MET_ZONE);
        mesg.set_f64(met_zone::CALORIES, 12.5, 0, Selector::Main).unwrap();
        let view = MetZoneMesg::wrap(&mesg).unwrap();
        assert_eq!(view.calories(), Some(12.5));
    }

    #[test]
    fn typed_listener_receives_view() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let mut broadcaster = MesgBroadcaster::new();
        broadcaster.add_record_listener(move |view: RecordMesg<'_>| {
            *sink.borrow_mut() = view.heart_rate();
            Ok(())
        });
        let mut mesg = Mesg::new(mesg_num::RECORD);
        mesg.set_u8(record::HEART_RATE, 150, 0, Selector::Main).unwrap();
        broadcaster.dispatch(&mesg).unwrap();
        assert_eq!(*seen.borrow(), Some(150));
    }
}
