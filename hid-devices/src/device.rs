//! The common virtual-device contract every HID/XInput device kind
//! implements, mirroring a single `setAxis`/`update`/`axesDescription`
//! interface shared across keyboard, mouse and gamepad devices.

use heapless::Vec;

/// A human-readable name paired with the axis/button code that drives it.
#[derive(Debug, Clone, Copy)]
pub struct AxisDescription {
    pub name: &'static str,
    pub code: u16,
}

/// Upper bound on how many axes any single device instance describes.
/// The largest user is the keyboard's curated set of named keys; a HID
/// gamepad's 4 hat directions + 32 buttons + 16 split axes (52) fits
/// comfortably under the same cap.
pub const MAX_AXES_DESCRIPTION: usize = 80;

pub type AxesDescription = Vec<AxisDescription, MAX_AXES_DESCRIPTION>;

/// Events a device raises back toward the host: keyboard LED state,
/// XInput rumble motor levels. Carried as the same `(code, value)` shape
/// `set_axis` takes, just flowing the other direction.
pub trait EventSink {
    fn on_event(&mut self, code: u16, value: u16);
}

/// A no-op sink for devices nobody is listening to yet.
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&mut self, _code: u16, _value: u16) {}
}

/// One virtual input device occupying a socket: a keyboard, a mouse, a
/// HID gamepad or an Xbox 360 pad. `set_axis` and `update` are called from
/// scheduler context only; the USB stack's descriptor callbacks only ever
/// read the device's static descriptor bytes.
pub trait VirtualDevice {
    /// Applies an axis/button value in `0..=1000` (buttons: 0 release,
    /// non-zero press). Codes the device doesn't recognise are ignored.
    fn set_axis(&mut self, code: u16, value: u16);

    /// Resets the device to its power-on state (all axes centred/released).
    fn init(&mut self) -> bool;

    /// Called once per scheduler tick. Returns `true` exactly when the
    /// report is dirty and `endpoint_ready` is set, at which point the
    /// caller is expected to pack and send the report; as a side effect
    /// this clears the dirty flag, mirroring a send having gone out.
    fn update(&mut self, endpoint_ready: bool) -> bool;

    /// Describes every axis/button this device instance exposes.
    fn axes_description(&self) -> AxesDescription;

    /// `true` once `set_axis` has produced report bytes not yet sent.
    fn report_dirty(&self) -> bool;

    /// Applies an output report from the host (keyboard LEDs, XInput
    /// rumble); devices with no output path ignore it. Recognised fields
    /// are surfaced through `sink` using the same code/value shape as
    /// `set_axis`.
    fn handle_output_report(&mut self, _bytes: &[u8], _sink: &mut dyn EventSink) {}
}
