//! The process-wide device manager: whichever socket table is live for the
//! current boot's mode, plus the `(socket, DeviceConfiguration)` wire shape
//! `plugDevice` decodes into. Mirrors `AbstractDeviceManager`/`DeviceManager`
//! switching between a `HidDeviceManager` and an `XinputDeviceManager`
//! instance depending on the persisted mode byte.

use device_sockets::{HidSocketTable, XinputSocketTable};

/// Device mode, persisted as `"HID"` / `"XINPUT"` in `persistent-kv`.
/// Switching requires a reboot since the composite descriptor's class
/// bytes and default VID/PID differ between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Hid,
    Xinput,
}

impl Mode {
    pub fn as_kv_str(self) -> &'static str {
        match self {
            Mode::Hid => "HID",
            Mode::Xinput => "XINPUT",
        }
    }

    pub fn from_kv_str(s: &str) -> Self {
        match s {
            "XINPUT" => Mode::Xinput,
            _ => Mode::Hid,
        }
    }

    pub fn as_wire_byte(self) -> u8 {
        match self {
            Mode::Hid => 0,
            Mode::Xinput => 1,
        }
    }
}

/// `deviceType` discriminant from `DeviceConfiguration`: 0=Keyboard,
/// 1=Mouse, 2=HID Gamepad, 3=Xbox 360 Gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
    HidGamepad,
    Xbox360Gamepad,
}

impl DeviceKind {
    pub fn from_wire(value: i32) -> Option<Self> {
        match value {
            0 => Some(DeviceKind::Keyboard),
            1 => Some(DeviceKind::Mouse),
            2 => Some(DeviceKind::HidGamepad),
            3 => Some(DeviceKind::Xbox360Gamepad),
            _ => None,
        }
    }
}

/// The decoded `DeviceConfiguration` argument of `plugDevice`: a device
/// kind plus the HID gamepad union fields (ignored for every other kind,
/// same as the donor's unused union members).
#[derive(Debug, Clone, Copy)]
pub struct DeviceConfiguration {
    pub kind: DeviceKind,
    pub hat: u8,
    pub axes_mask: u16,
    pub buttons: u8,
}

/// Whichever socket table is live for the current mode. Exactly one exists
/// at a time; switching modes means persisting the new mode and rebooting
/// into the other variant, never holding both at once.
pub enum DeviceManager {
    Hid(HidSocketTable),
    Xinput(XinputSocketTable),
}

impl DeviceManager {
    pub fn new(mode: Mode) -> Self {
        match mode {
            Mode::Hid => DeviceManager::Hid(HidSocketTable::new()),
            Mode::Xinput => DeviceManager::Xinput(XinputSocketTable::new()),
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            DeviceManager::Hid(_) => Mode::Hid,
            DeviceManager::Xinput(_) => Mode::Xinput,
        }
    }

    /// `plugDevice`'s compatibility check: HID devices only plug into the
    /// HID-mode manager, the Xbox pad only into the XInput-mode manager.
    pub fn plug(&mut self, socket_index: u8, name: &str, config: DeviceConfiguration) -> bool {
        match (self, config.kind) {
            (DeviceManager::Hid(table), DeviceKind::Keyboard) => {
                table.plug(socket_index, name, device_sockets::AnyHidDevice::Keyboard(hid_devices::Keyboard::new()))
            }
            (DeviceManager::Hid(table), DeviceKind::Mouse) => {
                table.plug(socket_index, name, device_sockets::AnyHidDevice::Mouse(hid_devices::Mouse::new()))
            }
            (DeviceManager::Hid(table), DeviceKind::HidGamepad) => {
                table.plug_gamepad(socket_index, name, config.buttons, config.axes_mask as u8, config.hat != 0)
            }
            (DeviceManager::Xinput(table), DeviceKind::Xbox360Gamepad) => table.plug(socket_index, name),
            _ => false,
        }
    }

    pub fn unplug(&mut self, socket_index: u8) -> bool {
        match self {
            DeviceManager::Hid(table) => table.unplug(socket_index),
            DeviceManager::Xinput(table) => table.unplug(socket_index),
        }
    }

    pub fn set_axis(&mut self, socket_index: u8, axis: u16, value: u16) {
        match self {
            DeviceManager::Hid(table) => table.set_axis(socket_index, axis, value),
            DeviceManager::Xinput(table) => table.set_axis(socket_index, axis, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_its_kv_string() {
        assert_eq!(Mode::from_kv_str(Mode::Hid.as_kv_str()), Mode::Hid);
        assert_eq!(Mode::from_kv_str(Mode::Xinput.as_kv_str()), Mode::Xinput);
        // Anything unrecognised falls back to HID, matching first-boot
        // behaviour with no persisted mode yet.
        assert_eq!(Mode::from_kv_str("garbage"), Mode::Hid);
    }

    #[test]
    fn plugging_a_gamepad_into_an_xinput_manager_is_refused() {
        let mut manager = DeviceManager::new(Mode::Xinput);
        let refused = manager.plug(
            0,
            "Pad",
            DeviceConfiguration { kind: DeviceKind::HidGamepad, hat: 1, axes_mask: 0x3, buttons: 10 },
        );
        assert!(!refused);
    }

    #[test]
    fn plugging_a_pad_into_a_hid_manager_is_refused() {
        let mut manager = DeviceManager::new(Mode::Hid);
        let refused = manager.plug(1, "Pad", DeviceConfiguration { kind: DeviceKind::Xbox360Gamepad, hat: 0, axes_mask: 0, buttons: 0 });
        assert!(!refused);
    }

    #[test]
    fn hid_gamepad_plugs_into_a_hid_manager() {
        let mut manager = DeviceManager::new(Mode::Hid);
        let ok = manager.plug(
            1,
            "Pad A",
            DeviceConfiguration { kind: DeviceKind::HidGamepad, hat: 1, axes_mask: 0x3, buttons: 10 },
        );
        assert!(ok);
    }
}
