//! An Xbox 360-compatible XInput pad: 16 buttons, 2 triggers, 2 sticks,
//! and a rumble output report.

use crate::axis::{scale_stick_minus_i16, scale_stick_plus_i16, scale_trigger_byte, xbox360 as code};
use crate::device::{AxesDescription, AxisDescription, EventSink, VirtualDevice};

pub const REPORT_SIZE_BYTE: u8 = 0x14;
pub const INPUT_REPORT_LEN: usize = 20;
pub const OUTPUT_REPORT_LEN: usize = 8;

pub struct XboxGamepad {
    buttons: u16,
    trigger_l: u8,
    trigger_r: u8,
    joystick_lx: i16,
    joystick_ly: i16,
    joystick_rx: i16,
    joystick_ry: i16,
    report_changed: bool,
}

impl XboxGamepad {
    pub fn new() -> Self {
        Self {
            buttons: 0,
            trigger_l: 0,
            trigger_r: 0,
            joystick_lx: 0,
            joystick_ly: 0,
            joystick_rx: 0,
            joystick_ry: 0,
            report_changed: true, // force an initial report, as the donor does
        }
    }

    fn set_button(&mut self, button: u16, pressed: bool) {
        let mask = 1u16 << button;
        if pressed {
            self.buttons |= mask;
        } else {
            self.buttons &= !mask;
        }
        self.report_changed = true;
    }

    /// Packs the 20-byte wire report: id, size, buttons (LE u16), two
    /// trigger bytes, four signed stick halves (LE i16), 6 reserved bytes.
    pub fn pack_report(&self, out: &mut [u8; INPUT_REPORT_LEN]) {
        out[0] = 0x00;
        out[1] = REPORT_SIZE_BYTE;
        out[2..4].copy_from_slice(&self.buttons.to_le_bytes());
        out[4] = self.trigger_l;
        out[5] = self.trigger_r;
        out[6..8].copy_from_slice(&self.joystick_lx.to_le_bytes());
        out[8..10].copy_from_slice(&self.joystick_ly.to_le_bytes());
        out[10..12].copy_from_slice(&self.joystick_rx.to_le_bytes());
        out[12..14].copy_from_slice(&self.joystick_ry.to_le_bytes());
        out[14..20].fill(0);
    }
}

impl Default for XboxGamepad {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDevice for XboxGamepad {
    fn set_axis(&mut self, axis_code: u16, value: u16) {
        if axis_code <= code::BTN_CODE_MAX {
            self.set_button(axis_code, value > 0);
            return;
        }

        let value = value.min(1000);
        match axis_code {
            code::AXIS_LEFT_TRIGGER => {
                self.trigger_l = scale_trigger_byte(value);
                self.report_changed = true;
            }
            code::AXIS_RIGHT_TRIGGER => {
                self.trigger_r = scale_trigger_byte(value);
                self.report_changed = true;
            }
            code::AXIS_LX_MINUS => {
                self.joystick_lx = scale_stick_minus_i16(value);
                self.report_changed = true;
            }
            code::AXIS_LX_PLUS => {
                self.joystick_lx = scale_stick_plus_i16(value);
                self.report_changed = true;
            }
            code::AXIS_LY_MINUS => {
                self.joystick_ly = scale_stick_minus_i16(value);
                self.report_changed = true;
            }
            code::AXIS_LY_PLUS => {
                self.joystick_ly = scale_stick_plus_i16(value);
                self.report_changed = true;
            }
            code::AXIS_RX_MINUS => {
                self.joystick_rx = scale_stick_minus_i16(value);
                self.report_changed = true;
            }
            code::AXIS_RX_PLUS => {
                self.joystick_rx = scale_stick_plus_i16(value);
                self.report_changed = true;
            }
            code::AXIS_RY_MINUS => {
                self.joystick_ry = scale_stick_minus_i16(value);
                self.report_changed = true;
            }
            code::AXIS_RY_PLUS => {
                self.joystick_ry = scale_stick_plus_i16(value);
                self.report_changed = true;
            }
            _ => {}
        }
    }

    fn init(&mut self) -> bool {
        *self = XboxGamepad::new();
        true
    }

    fn update(&mut self, endpoint_ready: bool) -> bool {
        if endpoint_ready && self.report_changed {
            self.report_changed = false;
            true
        } else {
            false
        }
    }

    fn axes_description(&self) -> AxesDescription {
        let mut desc = AxesDescription::new();
        for axis_code in 0u16..=(code::AXIS_RY_PLUS) {
            if let Some(name) = code::NAMES.get(axis_code as usize).copied() {
                let _ = desc.push(AxisDescription {
                    name,
                    code: axis_code,
                });
            }
        }
        desc
    }

    fn report_dirty(&self) -> bool {
        self.report_changed
    }

    fn handle_output_report(&mut self, bytes: &[u8], sink: &mut dyn EventSink) {
        // Donor layout: report_id, report_size, led, rumble_l, rumble_r, reserved[3].
        if bytes.len() < 5 {
            return;
        }
        sink.on_event(code::RUMBLE_LEFT, u16::from(bytes[3]));
        sink.on_event(code::RUMBLE_RIGHT, u16::from(bytes[4]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NullSink;

    #[test]
    fn buttons_set_the_matching_bit() {
        let mut pad = XboxGamepad::new();
        pad.init();
        pad.set_axis(code::BTN_A, 1);
        let mut buf = [0u8; INPUT_REPORT_LEN];
        pad.pack_report(&mut buf);
        let buttons = u16::from_le_bytes([buf[2], buf[3]]);
        assert_eq!(buttons, 1 << code::BTN_A);
    }

    #[test]
    fn trigger_and_stick_scale_independently_per_direction() {
        let mut pad = XboxGamepad::new();
        pad.init();
        pad.set_axis(code::AXIS_LEFT_TRIGGER, 1000);
        pad.set_axis(code::AXIS_LX_MINUS, 1000);
        pad.set_axis(code::AXIS_RY_PLUS, 1000);

        let mut buf = [0u8; INPUT_REPORT_LEN];
        pad.pack_report(&mut buf);
        assert_eq!(buf[4], 255);
        assert_eq!(i16::from_le_bytes([buf[6], buf[7]]), -32768);
        assert_eq!(i16::from_le_bytes([buf[12], buf[13]]), 32767);
    }

    #[test]
    fn update_reports_the_forced_initial_state_once() {
        let mut pad = XboxGamepad::new();
        assert!(pad.update(true));
        assert!(!pad.update(true));
    }

    #[test]
    fn output_report_surfaces_rumble_motor_levels() {
        struct Recorder(heapless::Vec<(u16, u16), 4>);
        impl EventSink for Recorder {
            fn on_event(&mut self, code: u16, value: u16) {
                let _ = self.0.push((code, value));
            }
        }
        let mut pad = XboxGamepad::new();
        let mut sink = Recorder(heapless::Vec::new());
        pad.handle_output_report(&[0x00, 0x08, 0x01, 200, 90, 0, 0, 0], &mut sink);
        assert_eq!(
            sink.0.as_slice(),
            &[(code::RUMBLE_LEFT, 200), (code::RUMBLE_RIGHT, 90)]
        );
    }

    #[test]
    fn short_output_report_is_ignored() {
        let mut pad = XboxGamepad::new();
        let mut sink = NullSink;
        pad.handle_output_report(&[0x00, 0x08], &mut sink);
    }
}
