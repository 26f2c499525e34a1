#![cfg_attr(not(feature = "std"), no_std)]
//! USB HID/XInput descriptor synthesis and the virtual input devices that
//! sit behind a device socket: keyboard, mouse, HID gamepad, Xbox 360 pad.
//!
//! Layering, bottom to top:
//! - [`axis`] — the flat `u16` code space every device's `set_axis` reads,
//!   plus the shared minus/plus/trigger/hat scaling functions.
//! - [`device`] — the [`device::VirtualDevice`] trait every device kind
//!   implements, and the [`device::AxesDescription`] shape they describe
//!   themselves with.
//! - [`keyboard`], [`mouse`], [`gamepad`], [`xinput`] — one device kind
//!   each, with its fixed or runtime-built HID report descriptor alongside.
//! - [`descriptor`] — composite USB configuration descriptor assembly for
//!   both manager modes (HID composite, XInput vendor-specific).
//!
//! Nothing here allocates: report buffers are caller-supplied fixed-size
//! arrays, and descriptor assembly writes into bounded `heapless::Vec`s.

pub mod axis;
pub mod descriptor;
pub mod device;
pub mod gamepad;
pub mod keyboard;
pub mod mouse;
pub mod xinput;

pub use descriptor::{
    build_hid_configuration_descriptor, build_xinput_configuration_descriptor, ConfigDescriptor,
    HidDeviceKind, HidInterfaceInfo, XinputConfigDescriptor, XinputInterfaceInfo,
};
pub use device::{AxesDescription, AxisDescription, EventSink, NullSink, VirtualDevice};
pub use gamepad::HidGamepad;
pub use keyboard::Keyboard;
pub use mouse::Mouse;
pub use xinput::XboxGamepad;
