//! A composite keyboard device: a 6-key boot report, an n-key-rollover
//! bitmap that backs it, and a 30-slot consumer-control array, all three
//! report IDs advertised in one fixed HID descriptor.

use crate::axis::keyboard as code;
use crate::device::{AxesDescription, AxisDescription, EventSink, VirtualDevice};

pub const REPORT_ID_BOOT: u8 = 1;
pub const REPORT_ID_NKRO: u8 = 2;
pub const REPORT_ID_CONSUMER: u8 = 3;

const NKRO_BYTES: usize = 28; // 224 bits, keycodes 0..223
const CONSUMER_SLOTS: usize = 30;
const BOOT_KEYS: usize = 6;

pub const BOOT_REPORT_LEN: usize = 8; // modifiers + reserved + 6 keys
pub const NKRO_REPORT_LEN: usize = 1 + NKRO_BYTES; // modifiers + bitmap
pub const CONSUMER_REPORT_LEN: usize = CONSUMER_SLOTS * 2; // 30 u16 slots

/// Fixed HID report descriptor: boot keyboard (report 1), NKRO bitmap
/// (report 2), 30-slot consumer control array (report 3).
pub const HID_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, REPORT_ID_BOOT, //
    0x05, 0x07, // Usage Page (Keyboard/Keypad)
    0x19, 224, 0x29, 231, // Usage Min/Max (modifiers)
    0x15, 0x00, 0x25, 0x01, //
    0x95, 0x08, 0x75, 0x01, 0x81, 0x02, // modifiers, 8x1 bit, input
    0x95, 0x01, 0x75, 0x08, 0x81, 0x01, // reserved byte
    0x95, 0x05, 0x75, 0x01, //
    0x05, 0x08, // Usage Page (LEDs)
    0x19, 0x01, 0x29, 0x05, 0x91, 0x02, // 5 LED outputs
    0x95, 0x01, 0x75, 0x03, 0x91, 0x01, // LED padding (3 bits)
    0x95, 0x06, 0x75, 0x08, 0x15, 0x00, 0x25, 0xFF, //
    0x05, 0x07, 0x19, 0x00, 0x29, 0xFF, 0x81, 0x00, // 6 keycode slots, array
    0xC0, //
    0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, //
    0x85, REPORT_ID_NKRO, //
    0x05, 0x07, 0x19, 224, 0x29, 231, 0x15, 0x00, 0x25, 0x01, 0x95, 0x08, 0x75, 0x01, 0x81, 0x02,
    0x05, 0x07, 0x19, 0x00, 0x29, 223, 0x15, 0x00, 0x25, 0x01, 0x95, 224, 0x75, 0x01, 0x81, 0x02,
    0xC0, //
    0x05, 0x0C, // Usage Page (Consumer)
    0x09, 0x01, // Usage (Consumer Control)
    0xA1, 0x01, //
    0x85, REPORT_ID_CONSUMER, //
    0x15, 0x00, 0x26, 0xFF, 0x03, // Logical Min 0, Max 0x03FF (2-byte form)
    0x19, 0x00, 0x2A, 0xFF, 0x03, // Usage Min/Max
    0x95, 0x1E, 0x75, 0x10, 0x81, 0x00, // 30 x 16-bit array
    0xC0,
];

pub struct Keyboard {
    nkro_keymap: [u8; NKRO_BYTES],
    boot_modifiers: u8,
    boot_keys: [u8; BOOT_KEYS],
    consumer_keys: [u16; CONSUMER_SLOTS],
    leds: u8,
    boot_changed: bool,
    consumer_changed: bool,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            nkro_keymap: [0; NKRO_BYTES],
            boot_modifiers: 0,
            boot_keys: [0; BOOT_KEYS],
            consumer_keys: [0; CONSUMER_SLOTS],
            leds: 0,
            boot_changed: false,
            consumer_changed: false,
        }
    }

    fn is_key_pressed(&self, keycode: u8) -> bool {
        let byte = usize::from(keycode) / 8;
        let bit = keycode % 8;
        self.nkro_keymap[byte] & (1 << bit) != 0
    }

    fn press_key(&mut self, keycode: u8) {
        if self.is_key_pressed(keycode) {
            return;
        }
        let byte = usize::from(keycode) / 8;
        let bit = keycode % 8;
        self.nkro_keymap[byte] |= 1 << bit;
        self.update_boot_report();
    }

    fn release_key(&mut self, keycode: u8) {
        if !self.is_key_pressed(keycode) {
            return;
        }
        let byte = usize::from(keycode) / 8;
        let bit = keycode % 8;
        self.nkro_keymap[byte] &= !(1 << bit);
        self.update_boot_report();
    }

    fn update_boot_report(&mut self) {
        let mut modifiers = 0u8;
        for keycode in 224..=231u8 {
            if self.is_key_pressed(keycode) {
                modifiers |= 1 << (keycode - 224);
            }
        }
        self.boot_modifiers = modifiers;

        self.boot_keys = [0; BOOT_KEYS];
        let mut slot = 0;
        for keycode in 0..224u16 {
            if slot >= BOOT_KEYS {
                break;
            }
            if self.is_key_pressed(keycode as u8) {
                self.boot_keys[slot] = keycode as u8;
                slot += 1;
            }
        }
        self.boot_changed = true;
    }

    fn press_consumer_key(&mut self, usage: u16) {
        if usage == 0 {
            return;
        }
        if self.consumer_keys.contains(&usage) {
            return;
        }
        if let Some(slot) = self.consumer_keys.iter_mut().find(|k| **k == 0) {
            *slot = usage;
            self.consumer_changed = true;
        }
    }

    fn release_consumer_key(&mut self, usage: u16) {
        if usage == 0 {
            let had_keys = self.consumer_keys.iter().any(|k| *k != 0);
            if had_keys {
                self.consumer_keys = [0; CONSUMER_SLOTS];
                self.consumer_changed = true;
            }
            return;
        }
        if let Some(slot) = self.consumer_keys.iter_mut().find(|k| **k == usage) {
            *slot = 0;
            self.consumer_changed = true;
        }
    }

    pub fn pack_boot_report(&self, out: &mut [u8; BOOT_REPORT_LEN]) {
        out[0] = self.boot_modifiers;
        out[1] = 0;
        out[2..8].copy_from_slice(&self.boot_keys);
    }

    pub fn pack_consumer_report(&self, out: &mut [u8; CONSUMER_REPORT_LEN]) {
        for (i, usage) in self.consumer_keys.iter().enumerate() {
            let bytes = usage.to_le_bytes();
            out[i * 2] = bytes[0];
            out[i * 2 + 1] = bytes[1];
        }
    }

    /// Maintained so the bitmap's shape is visible even though the donor
    /// firmware never wires this report onto the wire (see `update`).
    pub fn pack_nkro_report(&self, out: &mut [u8; NKRO_REPORT_LEN]) {
        out[0] = self.boot_modifiers;
        out[1..].copy_from_slice(&self.nkro_keymap);
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Which report `update` wants sent this tick, and by extension which
/// `pack_*_report` the caller should call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReport {
    Boot,
    Consumer,
}

impl Keyboard {
    /// Boot report takes priority; at most one report goes out per tick,
    /// matching the donor's "send one and return" loop.
    pub fn poll(&mut self, endpoint_ready: bool) -> Option<PendingReport> {
        if !endpoint_ready {
            return None;
        }
        if self.boot_changed {
            self.boot_changed = false;
            return Some(PendingReport::Boot);
        }
        if self.consumer_changed {
            self.consumer_changed = false;
            return Some(PendingReport::Consumer);
        }
        None
    }
}

impl VirtualDevice for Keyboard {
    fn set_axis(&mut self, axis_code: u16, value: u16) {
        if axis_code == 0 {
            return;
        }
        if let Some(keycode) = code::hid_keycode(axis_code) {
            if value > 0 {
                self.press_key(keycode);
            } else {
                self.release_key(keycode);
            }
            return;
        }
        if let Some(usage) = code::consumer_usage(axis_code) {
            if value > 0 {
                self.press_consumer_key(usage);
            } else {
                self.release_consumer_key(usage);
            }
        }
    }

    fn init(&mut self) -> bool {
        *self = Keyboard::new();
        true
    }

    fn update(&mut self, endpoint_ready: bool) -> bool {
        self.poll(endpoint_ready).is_some()
    }

    fn axes_description(&self) -> AxesDescription {
        let mut desc = AxesDescription::new();
        for keycode in 0u16..=255 {
            let axis_code = keycode + 1;
            if let Some(name) = code::name(axis_code) {
                let _ = desc.push(AxisDescription {
                    name,
                    code: axis_code,
                });
            }
        }
        desc
    }

    fn report_dirty(&self) -> bool {
        self.boot_changed || self.consumer_changed
    }

    fn handle_output_report(&mut self, bytes: &[u8], sink: &mut dyn EventSink) {
        let Some(&new_leds) = bytes.first() else {
            return;
        };
        if new_leds == self.leds {
            return;
        }
        for bit in 0..5u16 {
            let old_state = self.leds & (1 << bit) != 0;
            let new_state = new_leds & (1 << bit) != 0;
            if old_state != new_state {
                sink.on_event(bit, u16::from(new_state));
            }
        }
        self.leds = new_leds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_report_tracks_modifier_and_up_to_six_keys() {
        let mut kb = Keyboard::new();
        kb.init();
        kb.set_axis(5, 1); // HID_KEY_A = keycode 4
        kb.set_axis(225, 1); // KEY_CONTROL_LEFT axis code -> keycode 224
        kb.set_axis(6, 1); // HID_KEY_B = keycode 5

        let mut buf = [0u8; BOOT_REPORT_LEN];
        kb.pack_boot_report(&mut buf);
        assert_eq!(buf[0], 0x01); // Left Ctrl modifier bit
        assert_eq!(buf[1], 0);
        assert_eq!(&buf[2..4], &[4, 5]);
        assert_eq!(&buf[4..8], &[0, 0, 0, 0]);

        kb.set_axis(5, 0); // release A
        kb.pack_boot_report(&mut buf);
        assert_eq!(&buf[2..3], &[5]);
    }

    #[test]
    fn consumer_keys_ignore_duplicates_and_clear_on_zero() {
        let mut kb = Keyboard::new();
        kb.init();
        kb.set_axis(257 + 5, 1); // consumer usage 6
        kb.set_axis(257 + 5, 1); // duplicate, ignored
        assert!(kb.consumer_keys.iter().filter(|k| **k != 0).count() == 1);
        kb.set_axis(257, 0); // usage 0 clears all
        assert!(kb.consumer_keys.iter().all(|k| *k == 0));
    }

    #[test]
    fn update_sends_boot_before_consumer() {
        let mut kb = Keyboard::new();
        kb.init();
        kb.set_axis(5, 1);
        kb.set_axis(257 + 1, 1);
        assert_eq!(kb.poll(true), Some(PendingReport::Boot));
        assert_eq!(kb.poll(true), Some(PendingReport::Consumer));
        assert_eq!(kb.poll(true), None);
    }

    #[test]
    fn led_output_report_raises_events_for_changed_bits() {
        struct Recorder(heapless::Vec<(u16, u16), 8>);
        impl EventSink for Recorder {
            fn on_event(&mut self, code: u16, value: u16) {
                let _ = self.0.push((code, value));
            }
        }
        let mut kb = Keyboard::new();
        let mut sink = Recorder(heapless::Vec::new());
        kb.handle_output_report(&[0b0000_0011], &mut sink);
        assert_eq!(sink.0.as_slice(), &[(0, 1), (1, 1)]);
    }
}
