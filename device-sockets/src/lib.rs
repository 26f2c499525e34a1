#![cfg_attr(not(feature = "std"), no_std)]
//! The two fixed-capacity device socket tables sitting between the
//! coroutine scheduler and the USB HID/XInput stack: an eight-slot mixed
//! keyboard/mouse/gamepad table for HID composite mode, and a four-slot
//! uniform pad table for XInput mode.
//!
//! Only one table is ever live at a time — switching modes means
//! re-enumerating the whole USB device, which the firmware binary drives.

mod any_device;
mod hid_table;
mod xinput_table;

pub use any_device::{AnyHidDevice, MAX_HID_REPORT_LEN};
pub use hid_table::{
    HidSocketTable, FIRST_INTERFACE_STRING_INDEX, MAX_DEVICE_SOCKETS, MAX_REPORT_DESCRIPTOR_LEN,
};
pub use xinput_table::{XinputSocketTable, MAX_XINPUT_SOCKETS};
