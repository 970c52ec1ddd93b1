use fitcodec::mesg::{DeveloperField, Selector};
use fitcodec::messages::{activity, device_info, event, file_id, record};
use fitcodec::profile::mesg_num;
use fitcodec::{BaseType, Decoder, EncodeOptions, Encoder, Mesg, Value};
use nom::number::Endianness;

fn activity_file() -> Vec<Mesg> {
    let mut id = Mesg::new(mesg_num::FILE_ID);
    id.set_u8(file_id::TYPE, 4, 0, Selector::Main).unwrap();
    id.set_u16(file_id::MANUFACTURER, 1, 0, Selector::Main).unwrap();
    id.set_u16(file_id::PRODUCT, 2697, 0, Selector::Main).unwrap();
    id.set_u32(file_id::TIME_CREATED, 1_000_000_000, 0, Selector::Main).unwrap();

    let mut info = Mesg::new(mesg_num::DEVICE_INFO);
    info.set_u16(device_info::MANUFACTURER, 1, 0, Selector::Main).unwrap();
    info.set_f64(device_info::SOFTWARE_VERSION, 9.5, 0, Selector::Main).unwrap();
    info.set_string(device_info::PRODUCT_NAME, "Edge 530", 0).unwrap();

    let mut mesgs = vec![id, info];
    for i in 0..5u32 {
        let mut rec = Mesg::new(mesg_num::RECORD);
        rec.set_u32(record::TIMESTAMP, 1_000_000_000 + i, 0, Selector::Main).unwrap();
        rec.set_u8(record::HEART_RATE, 140 + i as u8, 0, Selector::Main).unwrap();
        rec.set_f64(record::SPEED, 8.25 + f64::from(i), 0, Selector::Main).unwrap();
        rec.set_f64(record::ALTITUDE, 123.4, 0, Selector::Main).unwrap();
        rec.set_f64(record::DISTANCE, 10.0 * f64::from(i), 0, Selector::Main).unwrap();
        mesgs.push(rec);
    }

    let mut stop = Mesg::new(mesg_num::EVENT);
    stop.set_u32(event::TIMESTAMP, 1_000_000_004, 0, Selector::Main).unwrap();
    stop.set_u8(event::EVENT, 0, 0, Selector::Main).unwrap();
    stop.set_u8(event::EVENT_TYPE, 4, 0, Selector::Main).unwrap();
    mesgs.push(stop);

    let mut act = Mesg::new(mesg_num::ACTIVITY);
    act.set_u32(activity::TIMESTAMP, 1_000_000_004, 0, Selector::Main).unwrap();
    act.set_f64(activity::TOTAL_TIMER_TIME, 4.0, 0, Selector::Main).unwrap();
    act.set_u16(activity::NUM_SESSIONS, 1, 0, Selector::Main).unwrap();
    mesgs.push(act);

    mesgs
}

#[test]
fn activity_round_trip_preserves_physical_values() {
    let original = activity_file();
    let bytes = Encoder::encode(&original, EncodeOptions::default()).unwrap();
    let decoded = Decoder::decode(&bytes).unwrap();
    assert_eq!(decoded.len(), original.len());

    let id = &decoded[0];
    assert_eq!(id.get_u16(file_id::PRODUCT, 0, Selector::Main).unwrap(), Some(2697));

    let info = &decoded[1];
    let version = info.get_f64(device_info::SOFTWARE_VERSION, 0, Selector::Main).unwrap().unwrap();
    assert!((version - 9.5).abs() < 1.0 / 100.0);
    assert_eq!(
        info.get_string(device_info::PRODUCT_NAME, 0).unwrap().as_deref(),
        Some("Edge 530")
    );

    for (i, rec) in decoded[2..7].iter().enumerate() {
        let speed = rec.get_f64(record::SPEED, 0, Selector::Main).unwrap().unwrap();
        assert!((speed - (8.25 + i as f64)).abs() < 1.0 / 1000.0);
        let altitude = rec.get_f64(record::ALTITUDE, 0, Selector::Main).unwrap().unwrap();
        assert!((altitude - 123.4).abs() < 1.0 / 5.0);
    }

    let act = decoded.last().unwrap();
    let timer = act.get_f64(activity::TOTAL_TIMER_TIME, 0, Selector::Main).unwrap().unwrap();
    assert!((timer - 4.0).abs() < 1.0 / 1000.0);
}

#[test]
fn raw_values_identical_after_reencoding() {
    let bytes = Encoder::encode(&activity_file(), EncodeOptions::default()).unwrap();
    let decoded = Decoder::decode(&bytes).unwrap();
    let bytes_again = Encoder::encode(&decoded, EncodeOptions::default()).unwrap();
    let decoded_again = Decoder::decode(&bytes_again).unwrap();
    for (a, b) in decoded.iter().zip(&decoded_again) {
        assert_eq!(a, b);
    }
}

#[test]
fn big_endian_round_trip() {
    let options = EncodeOptions { byte_order: Endianness::Big, ..Default::default() };
    let bytes = Encoder::encode(&activity_file(), options).unwrap();
    let decoded = Decoder::decode(&bytes).unwrap();
    let rec = &decoded[2];
    assert_eq!(rec.get_u8(record::HEART_RATE, 0, Selector::Main).unwrap(), Some(140));
    let speed = rec.get_f64(record::SPEED, 0, Selector::Main).unwrap().unwrap();
    assert!((speed - 8.25).abs() < 1.0 / 1000.0);
}

#[test]
fn chained_files_round_trip() {
    let options = EncodeOptions::default();
    let mut bytes = Encoder::encode(&activity_file(), options).unwrap();
    bytes.extend_from_slice(&Encoder::encode(&activity_file(), options).unwrap());
    let decoded = Decoder::decode(&bytes).unwrap();
    assert_eq!(decoded.len(), activity_file().len() * 2);
}

#[test]
fn developer_fields_round_trip() {
    use fitcodec::messages::field_description;

    let mut description = Mesg::new(mesg_num::FIELD_DESCRIPTION);
    description
        .set_u8(field_description::DEVELOPER_DATA_INDEX, 0, 0, Selector::Main)
        .unwrap();
    description
        .set_u8(field_description::FIELD_DEFINITION_NUMBER, 5, 0, Selector::Main)
        .unwrap();
    description
        .set_u8(field_description::FIT_BASE_TYPE_ID, 0x84, 0, Selector::Main)
        .unwrap();
    description.set_string(field_description::FIELD_NAME, "stride_len", 0).unwrap();

    let mut rec = Mesg::new(mesg_num::RECORD);
    rec.set_u8(record::HEART_RATE, 150, 0, Selector::Main).unwrap();
    rec.push_developer_field(DeveloperField {
        num: 5,
        developer_data_index: 0,
        base_type: BaseType::UInt16,
        values: vec![Value::U16(300)],
        tail: Vec::new(),
    });

    let bytes = Encoder::encode(&[description, rec], EncodeOptions::default()).unwrap();
    let decoded = Decoder::decode(&bytes).unwrap();
    let dev = &decoded[1].developer_fields()[0];
    assert_eq!(dev.base_type, BaseType::UInt16);
    assert_eq!(dev.values, vec![Value::U16(300)]);
}

/// Wraps a handcrafted record stream in a valid 14-byte header and CRCs.
fn envelope(records: &[u8]) -> Vec<u8> {
    let mut bytes = vec![14, 0x20, 0x00, 0x00];
    bytes.extend_from_slice(&(records.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b".FIT");
    let header_crc = bytes.iter().fold(0, fitcodec::crc::crc);
    bytes.extend_from_slice(&header_crc.to_le_bytes());
    bytes.extend_from_slice(records);
    let trailer = bytes.iter().fold(0, fitcodec::crc::crc);
    bytes.extend_from_slice(&trailer.to_le_bytes());
    bytes
}

#[test]
fn declared_string_size_survives_reencoding() {
    // product_name declared as 8 bytes but holding only "abc": the
    // terminator and padding must come back out.
    let records: Vec<u8> = vec![
        0x40, 0x00, 0x00, 0x00, 0x00, 0x01, // definition: file_id, one field
        8, 8, 0x07, // product_name, 8 bytes, string
        0x00, b'a', b'b', b'c', 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let decoded = Decoder::decode(&envelope(&records)).unwrap();
    assert_eq!(
        decoded[0].get_string(file_id::PRODUCT_NAME, 0).unwrap().as_deref(),
        Some("abc")
    );
    let again = Encoder::encode(&decoded, EncodeOptions::default()).unwrap();
    assert_eq!(&again[14..again.len() - 2], &records[..]);
}

#[test]
fn non_utf8_string_bytes_survive_reencoding() {
    let records: Vec<u8> = vec![
        0x40, 0x00, 0x00, 0x00, 0x00, 0x01, // definition: file_id, one field
        8, 4, 0x07, // product_name, 4 bytes, string
        0x00, 0x61, 0xe9, 0x62, 0x00,
    ];
    let decoded = Decoder::decode(&envelope(&records)).unwrap();
    // Latin-1 content is not text to us, but its bytes are kept.
    assert!(decoded[0].get_string(file_id::PRODUCT_NAME, 0).is_err());
    let again = Encoder::encode(&decoded, EncodeOptions::default()).unwrap();
    assert_eq!(&again[14..again.len() - 2], &records[..]);
}

#[test]
fn sentinel_floats_survive_by_bit_pattern() {
    let mut mesg = Mesg::new(0x2000);
    mesg.set_raw(0, BaseType::Float32, 0, BaseType::Float32.invalid_value());
    mesg.set_raw(0, BaseType::Float32, 1, Value::F32(1.5));
    let bytes = Encoder::encode(&[mesg], EncodeOptions::default()).unwrap();
    let decoded = Decoder::decode(&bytes).unwrap();
    let field = decoded[0].field(0).unwrap();
    assert!(field.values[0].is_invalid(BaseType::Float32));
    assert_eq!(field.values[1], Value::F32(1.5));
    // The sentinel element reads as absent through the accessors.
    assert_eq!(decoded[0].get_f64(0, 0, Selector::Main).unwrap(), None);
    assert_eq!(decoded[0].get_f64(0, 1, Selector::Main).unwrap(), Some(1.5));
}
