//! Black-box checks of the wire formats that cross the USB bus: the Bulk-Only
//! Transport CBW/CSW (§4.5) and the control-transfer SETUP packet builders
//! (§4.2). These exercise the same public encode/decode surface the mass
//! storage end-to-end read path drives internally, since `Hcd::transfer`
//! itself needs a live DWC-OTG core and can't be driven from a host-side test.

use dwcotg_uspi::{feature, request, scsi_op, Cbw, Csw, SetupPacket};

#[test]
fn cbw_encodes_read10_block_request() {
    // A single 512-byte block at LBA 0, matching the mass-storage read
    // scenario: READ(10), LBA 0x00000000, transfer length 512 bytes.
    let mut cdb = [0u8; 10];
    cdb[0] = scsi_op::READ_10;
    cdb[2..6].copy_from_slice(&0u32.to_be_bytes());
    cdb[7..9].copy_from_slice(&1u16.to_be_bytes());

    let cbw = Cbw::new(1, 512, true, 0, &cdb);

    assert_eq!({ cbw.signature }, Cbw::SIGNATURE);
    assert_eq!({ cbw.data_transfer_length }, 512);
    assert_eq!(cbw.flags, 0x80); // direction: IN
    assert_eq!(cbw.lun, 0);
    assert_eq!(cbw.cb_length, 10);
    assert_eq!(cbw.cb[0], scsi_op::READ_10);
    assert_eq!(&cbw.cb[2..6], &[0, 0, 0, 0]);
    assert_eq!(&cbw.cb[7..9], &[0x00, 0x01]);
}

#[test]
fn cbw_truncates_oversized_cdb_and_masks_lun() {
    let cdb = [0xAAu8; 20];
    let cbw = Cbw::new(7, 0, false, 0xFF, &cdb);
    assert_eq!(cbw.cb_length, 16);
    assert_eq!(cbw.lun, 0x0F); // only the low nibble is a valid LUN
    assert_eq!(cbw.flags, 0x00); // direction: OUT
}

#[test]
fn csw_is_ok_requires_signature_tag_residue_and_passed_status() {
    let ok = Csw { signature: Csw::SIGNATURE, tag: 1, data_residue: 0, status: Csw::STATUS_PASSED };
    assert!(ok.is_ok(1));

    let wrong_signature = Csw { signature: 0, ..ok };
    assert!(!wrong_signature.is_ok(1));

    let failed = Csw { status: Csw::STATUS_FAILED, ..ok };
    assert!(!failed.is_ok(1));

    let stale_tag = ok;
    assert!(!stale_tag.is_ok(2));

    let nonzero_residue = Csw { data_residue: 4, ..ok };
    assert!(!nonzero_residue.is_ok(1));
}

#[test]
fn clear_endpoint_feature_targets_generic_feature_table() {
    // CLEAR_FEATURE(ENDPOINT_HALT) is the recovery step after a stalled bulk
    // endpoint; it must use the generic feature selectors, not the hub
    // port-feature ones, or the device will reject the request.
    let setup = SetupPacket::clear_endpoint_feature(feature::ENDPOINT_HALT, 0x81);
    assert_eq!(setup.request, request::CLEAR_FEATURE);
    assert_eq!({ setup.value }, feature::ENDPOINT_HALT);
    assert_eq!({ setup.index }, 0x81);
    assert_eq!({ setup.length }, 0);
}

#[test]
fn get_descriptor_request_direction_is_device_to_host() {
    let setup = SetupPacket::get_descriptor(1, 0, 8);
    // Bit 7 of bmRequestType set means device-to-host.
    assert_eq!(setup.request_type & 0x80, 0x80);
    assert_eq!(setup.request, request::GET_DESCRIPTOR);
    assert_eq!({ setup.value }, (1u16 << 8));
    assert_eq!({ setup.length }, 8);
}
