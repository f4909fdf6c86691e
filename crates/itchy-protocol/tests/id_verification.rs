//! Verifies the ITCHy identifiers against the values the firmware uses.

use itchy_protocol::{
    DeviceIdentifier, ITCHY_PRODUCT_ID, ITCHY_USAGE, ITCHY_USAGE_PAGE, ITCHY_VENDOR_ID, REPORT_LEN,
};

#[test]
fn vendor_id_is_pjrc() {
    assert_eq!(ITCHY_VENDOR_ID, 0x16C0);
}

#[test]
fn product_id_is_teensy_raw_hid() {
    assert_eq!(ITCHY_PRODUCT_ID, 0x0486);
}

#[test]
fn usage_is_vendor_defined() {
    assert_eq!(ITCHY_USAGE_PAGE, 0xFFAB);
    assert_eq!(ITCHY_USAGE, 0x0200);
    assert!(ITCHY_USAGE_PAGE >= 0xFF00, "usage page must be vendor-defined");
}

#[test]
fn reports_are_full_speed_packets() {
    assert_eq!(REPORT_LEN, 64);
}

#[test]
fn identifier_serializes_as_plain_integers() -> Result<(), serde_json::Error> {
    let json = serde_json::to_string(&DeviceIdentifier::default())?;
    assert_eq!(
        json,
        r#"{"vendor_id":5824,"product_id":1158,"usage_page":65451,"usage":512}"#
    );
    Ok(())
}
