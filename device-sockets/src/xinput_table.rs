//! The four-socket XInput device table. Every socket is the same device
//! kind (an Xbox 360-compatible pad), and unlike HID mode the composite
//! descriptor covers all four interfaces unconditionally — Windows'
//! XInput driver expects a fixed four-controller layout, not one that
//! grows and shrinks as pads are plugged in.

use heapless::String;
use heapless::Vec;

use hid_devices::{
    build_xinput_configuration_descriptor, EventSink, VirtualDevice, XboxGamepad,
    XinputConfigDescriptor, XinputInterfaceInfo,
};

pub const MAX_XINPUT_SOCKETS: usize = 4;
pub const MAX_NAME_LEN: usize = 32;

struct XinputSocket {
    device: Option<XboxGamepad>,
    name: String<MAX_NAME_LEN>,
}

impl XinputSocket {
    const fn empty() -> Self {
        Self {
            device: None,
            name: String::new(),
        }
    }

    fn occupied(&self) -> bool {
        self.device.is_some()
    }
}

pub struct XinputSocketTable {
    sockets: [XinputSocket; MAX_XINPUT_SOCKETS],
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer: String<32>,
    pub product_name: String<48>,
    pub serial_number: String<16>,
}

impl XinputSocketTable {
    /// Starts with every socket empty, unlike `HidSocketTable`'s
    /// auto-plugged boot keyboard: XInput mode only ever carries pads, and
    /// the firmware plugs them on request rather than assuming one exists.
    pub fn new() -> Self {
        Self {
            sockets: core::array::from_fn(|_| XinputSocket::empty()),
            vendor_id: 0x045E,
            product_id: 0x028E,
            manufacturer: String::try_from("Microsoft").unwrap_or_default(),
            product_name: String::try_from("Xbox 360 Controller").unwrap_or_default(),
            serial_number: String::try_from("000000").unwrap_or_default(),
        }
    }

    fn endpoints(socket_index: u8) -> (u8, u8) {
        (0x81 + socket_index, 0x01 + socket_index)
    }

    pub fn plug(&mut self, socket_index: u8, name: &str) -> bool {
        let Some(socket) = self.sockets.get_mut(usize::from(socket_index)) else {
            return false;
        };
        if socket.occupied() {
            return false;
        }
        let mut pad = XboxGamepad::new();
        pad.init();
        socket.device = Some(pad);
        socket.name = String::try_from(name).unwrap_or_default();
        true
    }

    pub fn unplug(&mut self, socket_index: u8) -> bool {
        let Some(socket) = self.sockets.get_mut(usize::from(socket_index)) else {
            return false;
        };
        if !socket.occupied() {
            return false;
        }
        *socket = XinputSocket::empty();
        true
    }

    pub fn is_occupied(&self, socket_index: u8) -> bool {
        self.sockets
            .get(usize::from(socket_index))
            .is_some_and(XinputSocket::occupied)
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

    pub fn poll_all(&mut self, endpoint_ready: impl Fn(u8) -> bool) -> Vec<u8, MAX_XINPUT_SOCKETS> {
        let mut ready = Vec::new();
        for (index, socket) in self.sockets.iter_mut().enumerate() {
            if let Some(device) = socket.device.as_mut() {
                if device.update(endpoint_ready(index as u8)) {
                    let _ = ready.push(index as u8);
                }
            }
        }
        ready
    }

    pub fn device(&self, socket_index: u8) -> Option<&XboxGamepad> {
        self.sockets
            .get(usize::from(socket_index))?
            .device
            .as_ref()
    }

    pub fn device_mut(&mut self, socket_index: u8) -> Option<&mut XboxGamepad> {
        self.sockets
            .get_mut(usize::from(socket_index))?
            .device
            .as_mut()
    }

    /// All four interfaces, occupied or not — mirrors
    /// `XinputDeviceManager::generateConfigurationDescriptor`, which always
    /// emits `ITF_NUM_XINPUT_0..3` regardless of which pads are plugged.
    pub fn configuration_descriptor(&self) -> XinputConfigDescriptor {
        let mut interfaces: Vec<XinputInterfaceInfo, MAX_XINPUT_SOCKETS> = Vec::new();
        for index in 0..MAX_XINPUT_SOCKETS as u8 {
            let (endpoint_in, endpoint_out) = Self::endpoints(index);
            let _ = interfaces.push(XinputInterfaceInfo {
                interface_num: index,
                endpoint_in,
                endpoint_out,
            });
        }
        build_xinput_configuration_descriptor(&interfaces)
    }
}

impl Default for XinputSocketTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boots_with_every_socket_empty() {
        let table = XinputSocketTable::new();
        assert_eq!(table.occupied_count(), 0);
    }

    #[test]
    fn configuration_descriptor_always_covers_all_four_interfaces() {
        let table = XinputSocketTable::new();
        let desc = table.configuration_descriptor();
        assert_eq!(desc[4], MAX_XINPUT_SOCKETS as u8);
    }

    #[test]
    fn plug_and_unplug_round_trip() {
        let mut table = XinputSocketTable::new();
        assert!(table.plug(1, "Pad 1"));
        assert!(table.is_occupied(1));
        assert!(!table.plug(1, "dup"));
        assert!(table.unplug(1));
        assert!(!table.is_occupied(1));
    }
}
