//! The eight-socket HID composite device table: mixed keyboard/mouse/
//! gamepad occupants, one USB interface each, a configuration descriptor
//! rebuilt whenever the occupancy changes.

use heapless::String;
use heapless::Vec;

use hid_devices::{
    build_hid_configuration_descriptor, EventSink, HidDeviceKind, HidGamepad, HidInterfaceInfo,
    Keyboard, VirtualDevice,
};

use crate::any_device::AnyHidDevice;

pub const MAX_DEVICE_SOCKETS: usize = 8;
pub const FIRST_INTERFACE_STRING_INDEX: u8 = 4;
pub const MAX_NAME_LEN: usize = 32;

/// Generous upper bound covering the keyboard's three-collection descriptor
/// (the largest fixed one) and any runtime-built gamepad descriptor.
pub const MAX_REPORT_DESCRIPTOR_LEN: usize = 160;
pub type ReportDescriptorBuf = Vec<u8, MAX_REPORT_DESCRIPTOR_LEN>;

struct HidSocket {
    device: Option<AnyHidDevice>,
    name: String<MAX_NAME_LEN>,
    kind: HidDeviceKind,
    interface_num: u8,
    endpoint_num: u8,
    string_index: u8,
    report_descriptor: ReportDescriptorBuf,
}

impl HidSocket {
    const fn empty() -> Self {
        Self {
            device: None,
            name: String::new(),
            kind: HidDeviceKind::Gamepad,
            interface_num: 0,
            endpoint_num: 0,
            string_index: 0,
            report_descriptor: ReportDescriptorBuf::new(),
        }
    }

    fn occupied(&self) -> bool {
        self.device.is_some()
    }
}

/// The eight-socket HID-mode device table, mirroring `HidDeviceManager`'s
/// `deviceSockets[8]`.
pub struct HidSocketTable {
    sockets: [HidSocket; MAX_DEVICE_SOCKETS],
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String<32>,
    pub product_name: String<48>,
    pub serial_number: String<16>,
}

impl HidSocketTable {
    /// Starts with socket 0 already holding a keyboard, matching the
    /// firmware's own boot sequence for HID mode (XInput mode, by
    /// contrast, boots with every socket empty: see `XinputSocketTable`).
    pub fn new() -> Self {
        let mut table = Self {
            sockets: core::array::from_fn(|_| HidSocket::empty()),
            vendor_id: 0x1209,
            product_id: 0x0003,
            manufacturer: String::try_from("InputProxy").unwrap_or_default(),
            product_name: String::try_from("InputProxy Keyboard, Mouse & 4 Gamepads")
                .unwrap_or_default(),
            serial_number: String::try_from("20260118").unwrap_or_default(),
        };
        table.plug(0, "", AnyHidDevice::Keyboard(Keyboard::new()));
        table
    }

    fn kind_of(device: &AnyHidDevice) -> HidDeviceKind {
        match device {
            AnyHidDevice::Keyboard(_) => HidDeviceKind::Keyboard,
            AnyHidDevice::Mouse(_) => HidDeviceKind::Mouse,
            AnyHidDevice::Gamepad(_) => HidDeviceKind::Gamepad,
        }
    }

    fn fixed_report_descriptor(kind: HidDeviceKind) -> Option<&'static [u8]> {
        match kind {
            HidDeviceKind::Keyboard => Some(hid_devices::keyboard::HID_REPORT_DESCRIPTOR),
            HidDeviceKind::Mouse => Some(hid_devices::mouse::HID_REPORT_DESCRIPTOR),
            HidDeviceKind::Gamepad => None,
        }
    }

    /// Socket 0 → interface 0, socket 1 → interface 1, etc.; endpoint
    /// `0x81 + socket`; string index starts after the four reserved USB
    /// string indices (language, manufacturer, product, serial).
    fn allocate(socket_index: u8) -> (u8, u8, u8) {
        (
            socket_index,
            0x81 + socket_index,
            FIRST_INTERFACE_STRING_INDEX + socket_index,
        )
    }

    /// Plugs a device into `socket_index`. Returns `false` if the index is
    /// out of range or already occupied, matching `plugDevice`'s refusal
    /// to silently overwrite an existing device.
    pub fn plug(&mut self, socket_index: u8, name: &str, mut device: AnyHidDevice) -> bool {
        let Some(socket) = self.sockets.get_mut(usize::from(socket_index)) else {
            return false;
        };
        if socket.occupied() {
            return false;
        }

        device.init();
        let kind = Self::kind_of(&device);
        let (interface_num, endpoint_num, string_index) = Self::allocate(socket_index);

        let mut report_descriptor = ReportDescriptorBuf::new();
        match (&device, Self::fixed_report_descriptor(kind)) {
            (_, Some(fixed)) => {
                let _ = report_descriptor.extend_from_slice(fixed);
            }
            (AnyHidDevice::Gamepad(gamepad), None) => {
                let built = gamepad.build_hid_descriptor();
                let _ = report_descriptor.extend_from_slice(&built);
            }
            _ => {}
        }

        socket.device = Some(device);
        socket.name = String::try_from(name).unwrap_or_default();
        socket.kind = kind;
        socket.interface_num = interface_num;
        socket.endpoint_num = endpoint_num;
        socket.string_index = string_index;
        socket.report_descriptor = report_descriptor;

        true
    }

    pub fn plug_gamepad(
        &mut self,
        socket_index: u8,
        name: &str,
        num_buttons: u8,
        axes_bit_mask: u8,
        has_hat: bool,
    ) -> bool {
        self.plug(
            socket_index,
            name,
            AnyHidDevice::Gamepad(HidGamepad::new(num_buttons, axes_bit_mask, has_hat)),
        )
    }

    /// Unplugs `socket_index`. Returns `false` if the index is out of
    /// range or the socket was already empty; re-enumeration is left to
    /// the caller, same as the donor's own comment.
    pub fn unplug(&mut self, socket_index: u8) -> bool {
        let Some(socket) = self.sockets.get_mut(usize::from(socket_index)) else {
            return false;
        };
        if !socket.occupied() {
            return false;
        }
        *socket = HidSocket::empty();
        true
    }

    pub fn is_occupied(&self, socket_index: u8) -> bool {
        self.sockets
            .get(usize::from(socket_index))
            .is_some_and(HidSocket::occupied)
    }

    pub fn occupied_count(&self) -> usize {
        self.sockets.iter().filter(|s| s.occupied()).count()
    }

    pub fn set_axis(&mut self, socket_index: u8, axis: u16, value: u16) {
        if let Some(socket) = self.sockets.get_mut(usize::from(socket_index)) {
            if let Some(device) = socket.device.as_mut() {
                device.set_axis(axis, value);
            }
        }
    }

    pub fn handle_output_report(&mut self, socket_index: u8, bytes: &[u8], sink: &mut dyn EventSink) {
        if let Some(socket) = self.sockets.get_mut(usize::from(socket_index)) {
            if let Some(device) = socket.device.as_mut() {
                device.handle_output_report(bytes, sink);
            }
        }
    }

    /// Runs every occupied device's `update`, returning the socket indexes
    /// whose report is ready to send this tick. `endpoint_ready(interface)`
    /// lets the caller answer per-interface, matching `tud_hid_n_ready`.
    pub fn poll_all(&mut self, endpoint_ready: impl Fn(u8) -> bool) -> Vec<u8, MAX_DEVICE_SOCKETS> {
        let mut ready = Vec::new();
        for (index, socket) in self.sockets.iter_mut().enumerate() {
            if let Some(device) = socket.device.as_mut() {
                if device.update(endpoint_ready(socket.interface_num)) {
                    let _ = ready.push(index as u8);
                }
            }
        }
        ready
    }

    pub fn device(&self, socket_index: u8) -> Option<&AnyHidDevice> {
        self.sockets
            .get(usize::from(socket_index))?
            .device
            .as_ref()
    }

    pub fn device_mut(&mut self, socket_index: u8) -> Option<&mut AnyHidDevice> {
        self.sockets
            .get_mut(usize::from(socket_index))?
            .device
            .as_mut()
    }

    pub fn report_descriptor_for_interface(&self, interface_num: u8) -> Option<&[u8]> {
        self.sockets
            .iter()
            .find(|s| s.occupied() && s.interface_num == interface_num)
            .map(|s| s.report_descriptor.as_slice())
    }

    pub fn interface_string(&self, string_index: u8) -> Option<&str> {
        if string_index < FIRST_INTERFACE_STRING_INDEX {
            return None;
        }
        self.sockets
            .iter()
            .find(|s| s.occupied() && s.string_index == string_index)
            .map(|s| s.name.as_str())
    }

    /// Rebuilds the composite configuration descriptor from every occupied
    /// socket, sorted by interface number ascending (USB spec requirement).
    pub fn configuration_descriptor(&self) -> hid_devices::ConfigDescriptor {
        let mut interfaces: Vec<HidInterfaceInfo, MAX_DEVICE_SOCKETS> = Vec::new();
        for socket in &self.sockets {
            if socket.occupied() {
                let _ = interfaces.push(HidInterfaceInfo {
                    interface_num: socket.interface_num,
                    endpoint_num: socket.endpoint_num,
                    kind: socket.kind,
                    report_descriptor_len: socket.report_descriptor.len() as u16,
                });
            }
        }
        build_hid_configuration_descriptor(&interfaces)
    }
}

impl Default for HidSocketTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hid_devices::Mouse;

    #[test]
    fn boots_with_a_keyboard_already_in_socket_zero() {
        let table = HidSocketTable::new();
        assert!(table.is_occupied(0));
        assert_eq!(table.occupied_count(), 1);
        assert!(matches!(table.device(0), Some(AnyHidDevice::Keyboard(_))));
    }

    #[test]
    fn plugging_an_occupied_socket_fails() {
        let mut table = HidSocketTable::new();
        assert!(!table.plug(0, "dup", AnyHidDevice::Mouse(Mouse::new())));
    }

    #[test]
    fn allocation_derives_from_socket_index() {
        let mut table = HidSocketTable::new();
        assert!(table.plug_gamepad(2, "Pad A", 16, 0x3F, true));
        assert!(table.report_descriptor_for_interface(2).is_some());
        let desc = table.configuration_descriptor();
        assert_eq!(desc[4], 2); // two occupied interfaces (0, 2)
    }

    #[test]
    fn unplug_frees_the_socket_and_clears_its_descriptor() {
        let mut table = HidSocketTable::new();
        assert!(table.unplug(0));
        assert!(!table.is_occupied(0));
        assert_eq!(table.occupied_count(), 0);
    }

    #[test]
    fn interface_string_only_resolves_above_the_reserved_range() {
        let mut table = HidSocketTable::new();
        table.unplug(0);
        table.plug(0, "My Keyboard", AnyHidDevice::Keyboard(Keyboard::new()));
        assert_eq!(table.interface_string(4), Some("My Keyboard"));
        assert_eq!(table.interface_string(1), None);
    }
}
