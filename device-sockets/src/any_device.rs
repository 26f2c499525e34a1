//! A closed enum over the three device kinds a HID-mode socket can hold,
//! so the socket table can store them inline without a `dyn` trait object
//! or heap allocation.

use hid_devices::{keyboard, AxesDescription, EventSink, HidGamepad, Keyboard, Mouse, VirtualDevice};

pub enum AnyHidDevice {
    Keyboard(Keyboard),
    Mouse(Mouse),
    Gamepad(HidGamepad),
}

/// Largest single wire report any occupied socket can produce: the
/// keyboard's 30-slot consumer array (60 bytes) plus a leading report ID.
pub const MAX_HID_REPORT_LEN: usize = 1 + keyboard::CONSUMER_REPORT_LEN;

impl VirtualDevice for AnyHidDevice {
    fn set_axis(&mut self, code: u16, value: u16) {
        match self {
            AnyHidDevice::Keyboard(d) => d.set_axis(code, value),
            AnyHidDevice::Mouse(d) => d.set_axis(code, value),
            AnyHidDevice::Gamepad(d) => d.set_axis(code, value),
        }
    }

    fn init(&mut self) -> bool {
        match self {
            AnyHidDevice::Keyboard(d) => d.init(),
            AnyHidDevice::Mouse(d) => d.init(),
            AnyHidDevice::Gamepad(d) => d.init(),
        }
    }

    fn update(&mut self, endpoint_ready: bool) -> bool {
        match self {
            AnyHidDevice::Keyboard(d) => d.update(endpoint_ready),
            AnyHidDevice::Mouse(d) => d.update(endpoint_ready),
            AnyHidDevice::Gamepad(d) => d.update(endpoint_ready),
        }
    }

    fn axes_description(&self) -> AxesDescription {
        match self {
            AnyHidDevice::Keyboard(d) => d.axes_description(),
            AnyHidDevice::Mouse(d) => d.axes_description(),
            AnyHidDevice::Gamepad(d) => d.axes_description(),
        }
    }

    fn report_dirty(&self) -> bool {
        match self {
            AnyHidDevice::Keyboard(d) => d.report_dirty(),
            AnyHidDevice::Mouse(d) => d.report_dirty(),
            AnyHidDevice::Gamepad(d) => d.report_dirty(),
        }
    }

    fn handle_output_report(&mut self, bytes: &[u8], sink: &mut dyn EventSink) {
        match self {
            AnyHidDevice::Keyboard(d) => d.handle_output_report(bytes, sink),
            AnyHidDevice::Mouse(d) => d.handle_output_report(bytes, sink),
            AnyHidDevice::Gamepad(d) => d.handle_output_report(bytes, sink),
        }
    }
}

impl AnyHidDevice {
    /// Ticks this device and, if a report is ready, packs it into `out`
    /// with its leading report ID byte and returns the total length.
    ///
    /// Each device kind's own `pack_*_report` leaves the report ID off,
    /// matching `tud_hid_n_report(itf, report_id, buf, len)`'s split
    /// between the two; this is the one place that reunites them for a
    /// transport that, unlike TinyUSB, wants one contiguous wire report.
    pub fn poll_report(&mut self, endpoint_ready: bool, out: &mut [u8; MAX_HID_REPORT_LEN]) -> Option<usize> {
        match self {
            AnyHidDevice::Keyboard(device) => {
                let pending = device.poll(endpoint_ready)?;
                match pending {
                    keyboard::PendingReport::Boot => {
                        let mut buf = [0u8; keyboard::BOOT_REPORT_LEN];
                        device.pack_boot_report(&mut buf);
                        out[0] = keyboard::REPORT_ID_BOOT;
                        out[1..1 + buf.len()].copy_from_slice(&buf);
                        Some(1 + buf.len())
                    }
                    keyboard::PendingReport::Consumer => {
                        let mut buf = [0u8; keyboard::CONSUMER_REPORT_LEN];
                        device.pack_consumer_report(&mut buf);
                        out[0] = keyboard::REPORT_ID_CONSUMER;
                        out[1..1 + buf.len()].copy_from_slice(&buf);
                        Some(1 + buf.len())
                    }
                }
            }
            AnyHidDevice::Mouse(device) => {
                if !device.update(endpoint_ready) {
                    return None;
                }
                let mut buf = [0u8; hid_devices::mouse::REPORT_LEN];
                device.pack_report(&mut buf);
                out[0] = hid_devices::mouse::REPORT_ID;
                out[1..1 + buf.len()].copy_from_slice(&buf);
                Some(1 + buf.len())
            }
            AnyHidDevice::Gamepad(device) => {
                if !device.update(endpoint_ready) {
                    return None;
                }
                let mut buf = [0u8; hid_devices::gamepad::MAX_REPORT_LEN];
                let len = device.pack_report(&mut buf);
                out[0] = hid_devices::gamepad::REPORT_ID;
                out[1..1 + len].copy_from_slice(&buf[..len]);
                Some(1 + len)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_report_is_prefixed_with_the_boot_report_id() {
        let mut device = AnyHidDevice::Keyboard(Keyboard::new());
        device.set_axis(5, 1000); // axis code 5 == HID keycode 0x04, 'A'
        let mut buf = [0u8; MAX_HID_REPORT_LEN];
        let len = device.poll_report(true, &mut buf).expect("boot report pending");
        assert_eq!(buf[0], keyboard::REPORT_ID_BOOT);
        assert_eq!(len, 1 + keyboard::BOOT_REPORT_LEN);
    }

    #[test]
    fn mouse_report_uses_its_fixed_report_id() {
        let mut device = AnyHidDevice::Mouse(Mouse::new());
        device.set_axis(hid_devices::axis::mouse::X_PLUS, 600);
        let mut buf = [0u8; MAX_HID_REPORT_LEN];
        let len = device.poll_report(true, &mut buf).expect("report pending after a nudge");
        assert_eq!(buf[0], hid_devices::mouse::REPORT_ID);
        assert_eq!(len, 1 + hid_devices::mouse::REPORT_LEN);
    }

    #[test]
    fn no_report_is_produced_when_the_endpoint_is_not_ready() {
        let mut device = AnyHidDevice::Mouse(Mouse::new());
        device.set_axis(hid_devices::axis::mouse::X_PLUS, 600);
        let mut buf = [0u8; MAX_HID_REPORT_LEN];
        assert_eq!(device.poll_report(false, &mut buf), None);
    }
}
