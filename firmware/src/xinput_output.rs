//! Wires the four-socket `XinputSocketTable` into `embassy_usb` as a
//! vendor-specific function, one interrupt IN/OUT endpoint pair per pad.
//!
//! `embassy_usb` has no built-in XInput class (it's Microsoft's
//! undocumented vendor protocol, not a USB-IF standard one), so this goes
//! through the builder's low-level `function`/`interface`/`alt_setting`
//! calls the way a custom HID-less vendor class normally does, rather
//! than through `embassy_usb::class::hid`.

use device_sockets::{XinputSocketTable, MAX_XINPUT_SOCKETS};
use embassy_usb::driver::{Driver as _, Endpoint, EndpointIn};
use embassy_usb::Builder;
use hid_devices::xinput::INPUT_REPORT_LEN;
use hid_devices::VirtualDevice;

use crate::usb_output::Usb;

const CLASS_VENDOR_SPECIFIC: u8 = 0xFF;
const XINPUT_SUBCLASS: u8 = 0x5D;
const XINPUT_PROTOCOL: u8 = 0x01;
const XINPUT_EP_MAX_PACKET_SIZE: u16 = 32;
const XINPUT_POLL_INTERVAL_MS: u8 = 4;

pub struct XinputEndpoint<'d> {
    pub socket_index: u8,
    ep_in: <Usb as embassy_usb::driver::Driver<'d>>::EndpointIn,
}

impl<'d> XinputEndpoint<'d> {
    pub async fn pump(&mut self, table: &mut XinputSocketTable, endpoint_ready: bool) {
        let Some(device) = table.device_mut(self.socket_index) else {
            return;
        };
        if !device.update(endpoint_ready) {
            return;
        }
        let mut report = [0u8; INPUT_REPORT_LEN];
        device.pack_report(&mut report);
        let _ = self.ep_in.write(&report).await;
    }
}

/// Builds one vendor-specific interface per XInput socket, regardless of
/// occupancy — matches `XinputSocketTable::configuration_descriptor`
/// always covering all four interfaces.
pub fn build_xinput_endpoints<'d>(builder: &mut Builder<'d, Usb>) -> heapless::Vec<XinputEndpoint<'d>, MAX_XINPUT_SOCKETS> {
    let mut endpoints = heapless::Vec::new();

    for socket_index in 0..MAX_XINPUT_SOCKETS as u8 {
        let mut function = builder.function(CLASS_VENDOR_SPECIFIC, XINPUT_SUBCLASS, XINPUT_PROTOCOL);
        let mut interface = function.interface();
        let mut alt = interface.alt_setting(CLASS_VENDOR_SPECIFIC, XINPUT_SUBCLASS, XINPUT_PROTOCOL);
        let ep_in = alt.endpoint_interrupt_in(XINPUT_EP_MAX_PACKET_SIZE, XINPUT_POLL_INTERVAL_MS);
        let _ep_out = alt.endpoint_interrupt_out(XINPUT_EP_MAX_PACKET_SIZE, XINPUT_POLL_INTERVAL_MS);
        let _ = endpoints.push(XinputEndpoint { socket_index, ep_in });
    }

    endpoints
}
