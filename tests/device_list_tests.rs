#![cfg(feature = "test-mock")]

use tickseq::midi::list_output_devices;

#[test]
fn test_device_list() {
    let devices = list_output_devices();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0], "Mock Device 1");
    assert_eq!(devices[1], "Mock Device 2");
}
