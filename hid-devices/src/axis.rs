//! Axis/button code tables shared by every virtual device kind.
//!
//! Every device addresses its controls through a flat `u16` code space
//! rather than a struct of named fields, so a single `set_axis(code, value)`
//! entry point works for keyboards, mice, HID gamepads and XInput pads
//! alike. The numeric values below are part of the wire contract between
//! the external axis source and the device sockets and must not be
//! renumbered.

/// D-pad / hat directions, buttons 1-32, then paired minus/plus axes.
pub mod gamepad {
    pub const HAT_UP: u16 = 0;
    pub const HAT_DOWN: u16 = 1;
    pub const HAT_LEFT: u16 = 2;
    pub const HAT_RIGHT: u16 = 3;

    pub const BTN_FIRST: u16 = 4;
    pub const BTN_LAST: u16 = 35;

    pub const AXIS_LX_MINUS: u16 = 36;
    pub const AXIS_LX_PLUS: u16 = 37;
    pub const AXIS_LY_MINUS: u16 = 38;
    pub const AXIS_LY_PLUS: u16 = 39;
    pub const AXIS_LZ_MINUS: u16 = 40;
    pub const AXIS_LZ_PLUS: u16 = 41;
    pub const AXIS_RX_MINUS: u16 = 42;
    pub const AXIS_RX_PLUS: u16 = 43;
    pub const AXIS_RY_MINUS: u16 = 44;
    pub const AXIS_RY_PLUS: u16 = 45;
    pub const AXIS_RZ_MINUS: u16 = 46;
    pub const AXIS_RZ_PLUS: u16 = 47;
    pub const AXIS_DIAL_MINUS: u16 = 48;
    pub const AXIS_DIAL_PLUS: u16 = 49;
    pub const AXIS_SLIDER_MINUS: u16 = 50;
    pub const AXIS_SLIDER_PLUS: u16 = 51;

    /// Returns the button number (1-32) for a code in `BTN_FIRST..=BTN_LAST`.
    pub fn button_number(code: u16) -> Option<u8> {
        if (BTN_FIRST..=BTN_LAST).contains(&code) {
            Some((code - BTN_FIRST + 1) as u8)
        } else {
            None
        }
    }

    /// The eight logical axes in HID report order, each carried by one
    /// bit of an `axesMask`. Order matches the descriptor builder's usage
    /// sequence: X, Y, Z, Rx, Ry, Rz, Dial, Slider.
    pub const AXIS_BITS: [(u8, u16, u16); 8] = [
        (0, AXIS_LX_MINUS, AXIS_LX_PLUS),
        (1, AXIS_LY_MINUS, AXIS_LY_PLUS),
        (2, AXIS_LZ_MINUS, AXIS_LZ_PLUS),
        (3, AXIS_RX_MINUS, AXIS_RX_PLUS),
        (4, AXIS_RY_MINUS, AXIS_RY_PLUS),
        (5, AXIS_RZ_MINUS, AXIS_RZ_PLUS),
        (6, AXIS_DIAL_MINUS, AXIS_DIAL_PLUS),
        (7, AXIS_SLIDER_MINUS, AXIS_SLIDER_PLUS),
    ];

    /// Human-readable names indexed directly by axis code (0..=51).
    pub const NAMES: [&str; 52] = [
        "Hat Up", "Hat Down", "Hat Left", "Hat Right",
        "Button 1", "Button 2", "Button 3", "Button 4", "Button 5", "Button 6",
        "Button 7", "Button 8", "Button 9", "Button 10", "Button 11", "Button 12",
        "Button 13", "Button 14", "Button 15", "Button 16", "Button 17", "Button 18",
        "Button 19", "Button 20", "Button 21", "Button 22", "Button 23", "Button 24",
        "Button 25", "Button 26", "Button 27", "Button 28", "Button 29", "Button 30",
        "Button 31", "Button 32",
        "Left Stick X-", "Left Stick X+", "Left Stick Y-", "Left Stick Y+",
        "Left Stick Z-", "Left Stick Z+", "Right Stick X-", "Right Stick X+",
        "Right Stick Y-", "Right Stick Y+", "Right Stick Z-", "Right Stick Z+",
        "Dial-", "Dial+", "Slider-", "Slider+",
    ];
}

/// Mouse buttons and relative movement/scroll channels.
pub mod mouse {
    pub const BUTTON_LEFT: u16 = 1;
    pub const BUTTON_RIGHT: u16 = 2;
    pub const BUTTON_MIDDLE: u16 = 3;
    pub const BUTTON_BACK: u16 = 4;
    pub const BUTTON_FORWARD: u16 = 5;
    pub const X_MINUS: u16 = 6;
    pub const X_PLUS: u16 = 7;
    pub const Y_MINUS: u16 = 8;
    pub const Y_PLUS: u16 = 9;
    pub const WHEEL_MINUS: u16 = 10;
    pub const WHEEL_PLUS: u16 = 11;
    pub const H_WHEEL_MINUS: u16 = 12;
    pub const H_WHEEL_PLUS: u16 = 13;

    /// Names for codes 1..=13; index 0 is a placeholder (code 0 is unused).
    pub const NAMES: [&str; 14] = [
        "",
        "Left Button", "Right Button", "Middle Button", "Back Button", "Forward Button",
        "X-", "X+", "Y-", "Y+", "Wheel-", "Wheel+", "H-Wheel-", "H-Wheel+",
    ];

    pub fn name(code: u16) -> Option<&'static str> {
        NAMES.get(code as usize).copied()
    }

    /// Mouse axes take their magnitude directly (already 0..=127-ish),
    /// unlike gamepad axes which are scaled down from a 0..=1000 range.
    pub fn clamp_magnitude(value: u16) -> u8 {
        if value > 127 {
            127
        } else {
            value as u8
        }
    }
}

/// Keyboard axis codes. `1..=256` are HID keycode+1 (press/release by
/// non-zero/zero value); `257..=1280` are consumer-control usage+256.
pub mod keyboard {
    pub const KEY_CODE_BASE: u16 = 1;
    pub const KEY_CODE_MAX: u16 = 256;
    pub const CONSUMER_CODE_BASE: u16 = 257;
    pub const CONSUMER_CODE_MAX: u16 = 1280;

    pub fn hid_keycode(code: u16) -> Option<u8> {
        if (KEY_CODE_BASE..=KEY_CODE_MAX).contains(&code) {
            Some((code - KEY_CODE_BASE) as u8)
        } else {
            None
        }
    }

    pub fn consumer_usage(code: u16) -> Option<u16> {
        if (CONSUMER_CODE_BASE..=CONSUMER_CODE_MAX).contains(&code) {
            Some(code - 256)
        } else {
            None
        }
    }

    /// A friendly name for the common keys; codes outside this list still
    /// work through `set_axis`, they just have no name for a UI to show.
    pub fn name(code: u16) -> Option<&'static str> {
        let keycode = hid_keycode(code)?;
        Some(match keycode {
            0x04..=0x1D => {
                const LETTERS: [&str; 26] = [
                    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O",
                    "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
                ];
                LETTERS[(keycode - 0x04) as usize]
            }
            0x1E..=0x26 => {
                const DIGITS: [&str; 9] = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];
                DIGITS[(keycode - 0x1E) as usize]
            }
            0x27 => "0",
            0x28 => "Enter",
            0x29 => "Escape",
            0x2A => "Backspace",
            0x2B => "Tab",
            0x2C => "Space",
            0x3A..=0x45 => {
                const FKEYS: [&str; 12] = [
                    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12",
                ];
                FKEYS[(keycode - 0x3A) as usize]
            }
            0x4F => "Right Arrow",
            0x50 => "Left Arrow",
            0x51 => "Down Arrow",
            0x52 => "Up Arrow",
            0xE0 => "Left Ctrl",
            0xE1 => "Left Shift",
            0xE2 => "Left Alt",
            0xE3 => "Left GUI",
            0xE4 => "Right Ctrl",
            0xE5 => "Right Shift",
            0xE6 => "Right Alt",
            0xE7 => "Right GUI",
            _ => return None,
        })
    }
}

/// Xbox 360 (XInput) button and axis codes, plus the rumble event codes
/// surfaced through a device's output callback.
pub mod xbox360 {
    pub const BTN_DPAD_UP: u16 = 0;
    pub const BTN_DPAD_DOWN: u16 = 1;
    pub const BTN_DPAD_LEFT: u16 = 2;
    pub const BTN_DPAD_RIGHT: u16 = 3;
    pub const BTN_START: u16 = 4;
    pub const BTN_BACK: u16 = 5;
    pub const BTN_LEFT_STICK: u16 = 6;
    pub const BTN_RIGHT_STICK: u16 = 7;
    pub const BTN_LEFT_BUMPER: u16 = 8;
    pub const BTN_RIGHT_BUMPER: u16 = 9;
    pub const BTN_GUIDE: u16 = 10;
    pub const BTN_A: u16 = 12;
    pub const BTN_B: u16 = 13;
    pub const BTN_X: u16 = 14;
    pub const BTN_Y: u16 = 15;

    pub const AXIS_LEFT_TRIGGER: u16 = 16;
    pub const AXIS_RIGHT_TRIGGER: u16 = 17;

    pub const AXIS_LX_MINUS: u16 = 18;
    pub const AXIS_LX_PLUS: u16 = 19;
    pub const AXIS_LY_MINUS: u16 = 20;
    pub const AXIS_LY_PLUS: u16 = 21;
    pub const AXIS_RX_MINUS: u16 = 22;
    pub const AXIS_RX_PLUS: u16 = 23;
    pub const AXIS_RY_MINUS: u16 = 24;
    pub const AXIS_RY_PLUS: u16 = 25;

    pub const RUMBLE_LEFT: u16 = 100;
    pub const RUMBLE_RIGHT: u16 = 101;

    /// The four stick channels in report order, each a (minus, plus) pair.
    pub const STICK_AXES: [(u16, u16); 4] = [
        (AXIS_LX_MINUS, AXIS_LX_PLUS),
        (AXIS_LY_MINUS, AXIS_LY_PLUS),
        (AXIS_RX_MINUS, AXIS_RX_PLUS),
        (AXIS_RY_MINUS, AXIS_RY_PLUS),
    ];

    /// Button codes below this are bit positions directly into the 16-bit
    /// button field; bit 11 is unused (reserved in the Xbox 360 layout).
    pub const BTN_CODE_MAX: u16 = 15;

    /// Names indexed directly by code (0..=25); index 11 is the unused
    /// reserved button bit.
    pub const NAMES: [&str; 26] = [
        "D-Pad Up", "D-Pad Down", "D-Pad Left", "D-Pad Right",
        "Start", "Back", "Left Stick Click", "Right Stick Click",
        "Left Bumper", "Right Bumper", "Guide", "Reserved",
        "A", "B", "X", "Y",
        "Left Trigger", "Right Trigger",
        "Left Stick X-", "Left Stick X+", "Left Stick Y-", "Left Stick Y+",
        "Right Stick X-", "Right Stick X+", "Right Stick Y-", "Right Stick Y+",
    ];
}

/// Scales a minus-direction input in `0..=1000` to a HID gamepad axis
/// byte in `0..=127`. Each direction is its own code, set independently.
pub fn scale_minus_byte(value: u16) -> u8 {
    ((u32::from(value.min(1000)) * 127) / 1000) as u8
}

/// Scales a plus-direction input in `0..=1000` to a HID gamepad axis
/// byte in `127..=255`.
pub fn scale_plus_byte(value: u16) -> u8 {
    127 + ((u32::from(value.min(1000)) * 128) / 1000) as u8
}

/// Scales an input value in `0..=1000` to a full byte `0..=255`, as used
/// by trigger axes (HID and Xbox alike).
pub fn scale_trigger_byte(value: u16) -> u8 {
    ((u32::from(value.min(1000)) * 255) / 1000) as u8
}

/// Scales a minus-direction input in `0..=1000` to a signed stick value
/// in `0..=-32768`.
pub fn scale_stick_minus_i16(value: u16) -> i16 {
    -(((i32::from(value.min(1000))) * 32768) / 1000) as i16
}

/// Scales a plus-direction input in `0..=1000` to a signed stick value
/// in `0..=32767`.
pub fn scale_stick_plus_i16(value: u16) -> i16 {
    (((i32::from(value.min(1000))) * 32767) / 1000) as i16
}

/// Eight-way compass value from the four hat direction booleans.
/// `0x0F` marks centre or an opposed-axis conflict (both up & down, or
/// both left & right).
pub fn hat_value(up: bool, down: bool, left: bool, right: bool) -> u8 {
    if (up && down) || (left && right) {
        return 0x0F;
    }
    match (up, down, left, right) {
        (true, false, false, false) => 0,
        (true, false, false, true) => 1,
        (false, false, false, true) => 2,
        (false, true, false, true) => 3,
        (false, true, false, false) => 4,
        (false, true, true, false) => 5,
        (false, false, true, false) => 6,
        (true, false, true, false) => 7,
        _ => 0x0F,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_number_maps_the_full_range() {
        assert_eq!(gamepad::button_number(gamepad::BTN_FIRST), Some(1));
        assert_eq!(gamepad::button_number(gamepad::BTN_LAST), Some(32));
        assert_eq!(gamepad::button_number(gamepad::HAT_RIGHT), None);
        assert_eq!(gamepad::button_number(gamepad::AXIS_LX_MINUS), None);
    }

    #[test]
    fn keyboard_code_ranges() {
        assert_eq!(keyboard::hid_keycode(1), Some(0));
        assert_eq!(keyboard::hid_keycode(256), Some(255));
        assert_eq!(keyboard::hid_keycode(257), None);
        assert_eq!(keyboard::consumer_usage(257), Some(1));
        assert_eq!(keyboard::consumer_usage(1280), Some(1024));
        assert_eq!(keyboard::consumer_usage(256), None);
    }

    #[test]
    fn split_byte_rests_at_the_seam_and_spans_each_direction() {
        assert_eq!(scale_minus_byte(0), 0);
        assert_eq!(scale_minus_byte(1000), 127);
        assert_eq!(scale_plus_byte(0), 127);
        assert_eq!(scale_plus_byte(1000), 255);
    }

    #[test]
    fn trigger_byte_spans_full_range() {
        assert_eq!(scale_trigger_byte(0), 0);
        assert_eq!(scale_trigger_byte(1000), 255);
    }

    #[test]
    fn stick_scaling_hits_both_extremes() {
        assert_eq!(scale_stick_minus_i16(0), 0);
        assert_eq!(scale_stick_minus_i16(1000), -32768);
        assert_eq!(scale_stick_plus_i16(0), 0);
        assert_eq!(scale_stick_plus_i16(1000), 32767);
    }

    #[test]
    fn hat_value_covers_compass_and_conflicts() {
        assert_eq!(hat_value(false, false, false, false), 0x0F);
        assert_eq!(hat_value(true, false, false, false), 0);
        assert_eq!(hat_value(true, false, false, true), 1);
        assert_eq!(hat_value(false, false, false, true), 2);
        assert_eq!(hat_value(true, true, false, false), 0x0F);
        assert_eq!(hat_value(false, false, true, true), 0x0F);
    }
}
