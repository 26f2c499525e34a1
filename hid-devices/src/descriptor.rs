//! USB descriptor byte assembly: the composite configuration descriptor
//! for both manager modes, plus the vendor-specific XInput interface block.
//!
//! Every descriptor here is built into a caller-supplied bounded buffer
//! rather than returned as an owned allocation, since the USB stack asks
//! for these bytes from an interrupt-adjacent callback context.

use heapless::Vec;

pub mod usb {
    pub const DESC_CONFIGURATION: u8 = 0x02;
    pub const DESC_INTERFACE: u8 = 0x04;
    pub const DESC_ENDPOINT: u8 = 0x05;
    pub const HID_DESC_TYPE_HID: u8 = 0x21;
    pub const HID_DESC_TYPE_REPORT: u8 = 0x22;
    pub const CLASS_HID: u8 = 0x03;
    pub const CLASS_VENDOR_SPECIFIC: u8 = 0xFF;
    pub const XFER_INTERRUPT: u8 = 0x03;
    pub const HID_ITF_PROTOCOL_NONE: u8 = 0x00;
    pub const HID_ITF_PROTOCOL_KEYBOARD: u8 = 0x01;
    pub const HID_ITF_PROTOCOL_MOUSE: u8 = 0x02;
    /// bit 7 reserved (must be 1), bit 5 remote wakeup.
    pub const CONFIG_ATT_REMOTE_WAKEUP: u8 = 0xA0;
    pub const CONFIG_HEADER_LEN: usize = 9;
    /// Interface (9) + HID class (9) + IN endpoint (7).
    pub const HID_INTERFACE_BLOCK_LEN: usize = 9 + 9 + 7;

    pub const XINPUT_SUBCLASS: u8 = 0x5D;
    pub const XINPUT_PROTOCOL: u8 = 0x01;
    pub const XINPUT_EP_SIZE: u16 = 32;
    /// Interface (9) + vendor-specific block (17) + IN endpoint (7) + OUT endpoint (7).
    pub const XINPUT_INTERFACE_BLOCK_LEN: usize = 9 + 17 + 7 + 7;
}

/// The kind of device occupying a HID-mode socket; drives the interface
/// subclass/protocol bytes and which fixed report descriptor it points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidDeviceKind {
    Keyboard,
    Mouse,
    Gamepad,
}

/// The USB-facing identity of one occupied HID-mode socket, as derived by
/// the socket table from its index.
#[derive(Debug, Clone, Copy)]
pub struct HidInterfaceInfo {
    pub interface_num: u8,
    pub endpoint_num: u8,
    pub kind: HidDeviceKind,
    pub report_descriptor_len: u16,
}

/// Maximum simultaneous HID-mode interfaces (matches the eight-slot
/// device socket table).
pub const MAX_HID_INTERFACES: usize = 8;

/// Upper bound on the assembled configuration descriptor: header plus
/// eight interface blocks.
pub const MAX_CONFIG_DESCRIPTOR_LEN: usize =
    usb::CONFIG_HEADER_LEN + MAX_HID_INTERFACES * usb::HID_INTERFACE_BLOCK_LEN;

pub type ConfigDescriptor = Vec<u8, MAX_CONFIG_DESCRIPTOR_LEN>;

/// Builds the composite configuration descriptor for the HID manager mode
/// from a set of occupied interfaces. `interfaces` need not be sorted;
/// this sorts a local copy by `interface_num` ascending, since the USB
/// spec requires interfaces to appear in increasing order.
pub fn build_hid_configuration_descriptor(
    interfaces: &[HidInterfaceInfo],
) -> ConfigDescriptor {
    let mut sorted: Vec<HidInterfaceInfo, MAX_HID_INTERFACES> = Vec::new();
    for info in interfaces {
        let _ = sorted.push(*info);
    }
    sorted.sort_unstable_by_key(|i| i.interface_num);

    let num_interfaces = sorted.len() as u8;
    let total_length =
        (usb::CONFIG_HEADER_LEN + sorted.len() * usb::HID_INTERFACE_BLOCK_LEN) as u16;

    let mut out: ConfigDescriptor = Vec::new();
    let _ = out.extend_from_slice(&[
        9,
        usb::DESC_CONFIGURATION,
        (total_length & 0xFF) as u8,
        ((total_length >> 8) & 0xFF) as u8,
        num_interfaces,
        1,
        0,
        usb::CONFIG_ATT_REMOTE_WAKEUP,
        250,
    ]);

    for info in &sorted {
        let protocol = match info.kind {
            HidDeviceKind::Keyboard => usb::HID_ITF_PROTOCOL_KEYBOARD,
            HidDeviceKind::Mouse => usb::HID_ITF_PROTOCOL_MOUSE,
            HidDeviceKind::Gamepad => usb::HID_ITF_PROTOCOL_NONE,
        };
        let subclass: u8 = matches!(info.kind, HidDeviceKind::Keyboard | HidDeviceKind::Mouse) as u8;
        let len = info.report_descriptor_len;

        let _ = out.extend_from_slice(&[
            // Interface
            9,
            usb::DESC_INTERFACE,
            info.interface_num,
            0,
            1,
            usb::CLASS_HID,
            subclass,
            protocol,
            0, // string index filled in by the socket table
            // HID class
            9,
            usb::HID_DESC_TYPE_HID,
            0x11,
            0x01,
            0,
            1,
            usb::HID_DESC_TYPE_REPORT,
            (len & 0xFF) as u8,
            ((len >> 8) & 0xFF) as u8,
            // Endpoint
            7,
            usb::DESC_ENDPOINT,
            info.endpoint_num,
            usb::XFER_INTERRUPT,
            0x40,
            0x00,
            10,
        ]);
    }

    out
}

/// Maximum simultaneous XInput sockets.
pub const MAX_XINPUT_INTERFACES: usize = 4;

pub const MAX_XINPUT_CONFIG_DESCRIPTOR_LEN: usize =
    usb::CONFIG_HEADER_LEN + MAX_XINPUT_INTERFACES * usb::XINPUT_INTERFACE_BLOCK_LEN;

pub type XinputConfigDescriptor = Vec<u8, MAX_XINPUT_CONFIG_DESCRIPTOR_LEN>;

/// One occupied XInput-mode socket's interface/endpoint allocation.
#[derive(Debug, Clone, Copy)]
pub struct XinputInterfaceInfo {
    pub interface_num: u8,
    pub endpoint_in: u8,
    pub endpoint_out: u8,
}

/// Builds the XInput manager mode's configuration descriptor. Structurally
/// distinct from the HID assembly above: vendor-specific class, a 17-byte
/// "unknown" block Windows needs for enumeration, and both an IN and an
/// OUT interrupt endpoint per interface.
pub fn build_xinput_configuration_descriptor(
    interfaces: &[XinputInterfaceInfo],
) -> XinputConfigDescriptor {
    let mut sorted: Vec<XinputInterfaceInfo, MAX_XINPUT_INTERFACES> = Vec::new();
    for info in interfaces {
        let _ = sorted.push(*info);
    }
    sorted.sort_unstable_by_key(|i| i.interface_num);

    let num_interfaces = sorted.len() as u8;
    let total_length =
        (usb::CONFIG_HEADER_LEN + sorted.len() * usb::XINPUT_INTERFACE_BLOCK_LEN) as u16;

    let mut out: XinputConfigDescriptor = Vec::new();
    let _ = out.extend_from_slice(&[
        9,
        usb::DESC_CONFIGURATION,
        (total_length & 0xFF) as u8,
        ((total_length >> 8) & 0xFF) as u8,
        num_interfaces,
        1,
        0,
        usb::CONFIG_ATT_REMOTE_WAKEUP,
        250,
    ]);

    for info in &sorted {
        let ep_size = usb::XINPUT_EP_SIZE.to_le_bytes();
        let _ = out.extend_from_slice(&[
            // Interface
            9,
            usb::DESC_INTERFACE,
            info.interface_num,
            0,
            2,
            usb::CLASS_VENDOR_SPECIFIC,
            usb::XINPUT_SUBCLASS,
            usb::XINPUT_PROTOCOL,
            0,
            // XInput vendor-specific unknown descriptor
            17,
            0x21,
            0x00,
            0x01,
            0x01,
            0x25,
            info.endpoint_in,
            0x14,
            0x00,
            0x00,
            0x00,
            0x00,
            0x13,
            info.endpoint_out,
            0x08,
            0x00,
            0x00,
            // Endpoint In
            7,
            usb::DESC_ENDPOINT,
            info.endpoint_in,
            usb::XFER_INTERRUPT,
            ep_size[0],
            ep_size[1],
            4,
            // Endpoint Out
            7,
            usb::DESC_ENDPOINT,
            info.endpoint_out,
            usb::XFER_INTERRUPT,
            ep_size[0],
            ep_size[1],
            8,
        ]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hid_descriptor_header_reflects_interface_count_and_length() {
        let interfaces = [
            HidInterfaceInfo {
                interface_num: 0,
                endpoint_num: 0x81,
                kind: HidDeviceKind::Keyboard,
                report_descriptor_len: 123,
            },
            HidInterfaceInfo {
                interface_num: 1,
                endpoint_num: 0x82,
                kind: HidDeviceKind::Mouse,
                report_descriptor_len: 55,
            },
        ];
        let desc = build_hid_configuration_descriptor(&interfaces);
        assert_eq!(desc[4], 2); // bNumInterfaces
        let total = u16::from_le_bytes([desc[2], desc[3]]);
        assert_eq!(total as usize, 9 + 2 * usb::HID_INTERFACE_BLOCK_LEN);
        assert_eq!(desc.len(), total as usize);
    }

    #[test]
    fn hid_descriptor_sorts_by_interface_number() {
        let interfaces = [
            HidInterfaceInfo {
                interface_num: 2,
                endpoint_num: 0x83,
                kind: HidDeviceKind::Gamepad,
                report_descriptor_len: 10,
            },
            HidInterfaceInfo {
                interface_num: 0,
                endpoint_num: 0x81,
                kind: HidDeviceKind::Keyboard,
                report_descriptor_len: 10,
            },
        ];
        let desc = build_hid_configuration_descriptor(&interfaces);
        // First interface block starts right after the 9-byte header.
        assert_eq!(desc[9 + 2], 0); // bInterfaceNumber of the first block
    }

    #[test]
    fn xinput_descriptor_uses_vendor_class_and_both_endpoints() {
        let interfaces = [XinputInterfaceInfo {
            interface_num: 0,
            endpoint_in: 0x81,
            endpoint_out: 0x01,
        }];
        let desc = build_xinput_configuration_descriptor(&interfaces);
        assert_eq!(desc[4], 1);
        assert_eq!(desc[9 + 5], usb::CLASS_VENDOR_SPECIFIC);
        assert_eq!(desc[9 + 6], usb::XINPUT_SUBCLASS);
        let total = u16::from_le_bytes([desc[2], desc[3]]);
        assert_eq!(total as usize, 9 + usb::XINPUT_INTERFACE_BLOCK_LEN);
    }
}
