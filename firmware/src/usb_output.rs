//! Wires the current `HidSocketTable` snapshot into `embassy_usb`'s HID
//! class: one `HidWriter` per occupied HID-mode socket, built from that
//! socket's already-assembled report descriptor bytes
//! (`HidSocketTable::report_descriptor_for_interface`).
//!
//! `hid-devices::descriptor` independently assembles the full raw
//! composite *configuration* descriptor a bare TinyUSB-style stack would
//! need (and is unit-tested against that shape directly); `embassy_usb`'s
//! `Builder` generates its own composite descriptor from the interfaces
//! declared here, so only the per-interface HID *report* descriptors are
//! actually consumed on this target. Both paths share the same underlying
//! socket data, they just feed it to the USB stack differently.
//!
//! `Config.report_descriptor` needs `&'d [u8]` for the builder's whole
//! lifetime, which would otherwise tie every `HidWriter` to the exact
//! memory `HidSocketTable` happens to store its descriptor bytes in — and
//! that table is mutated afterward (`plug`/`unplug`/`set_axis`) for the
//! rest of the program. So each descriptor is copied once, at enumeration
//! time, into caller-owned `'d` storage (`descriptors`) the table never
//! touches again; only the socket index is kept to address the table
//! later when pumping reports.
//!
//! Output reports (keyboard LEDs) are not wired on this path: `HidWriter`
//! is the write-only half of the class, matching how the donor's own
//! gamepad output never needed one either. A future revision that needs
//! LED feedback would add a `HidReaderWriter` and a per-socket
//! `RequestHandler` routing `set_report` into `AnyHidDevice::handle_output_report`.

use device_sockets::{HidSocketTable, MAX_DEVICE_SOCKETS, MAX_HID_REPORT_LEN, MAX_REPORT_DESCRIPTOR_LEN};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::class::hid::{HidWriter, State};
use embassy_usb::Builder;

/// Matches `tud_hid_n_report`'s poll interval for this target (1 ms, full
/// speed's fastest interrupt period) and a packet size generous enough for
/// the keyboard's 60-byte consumer report.
const HID_POLL_MS: u8 = 1;
const HID_MAX_PACKET_SIZE: usize = 64;

pub type Usb = Driver<'static, USB>;

/// One caller-owned descriptor slot per possible socket; `build_hid_endpoints`
/// copies each occupied socket's descriptor bytes and length in here.
pub type DescriptorSlot = [u8; MAX_REPORT_DESCRIPTOR_LEN];

/// Per-socket embassy HID class state: one `HidWriter` plus the socket
/// index it was built for, so the poll loop can address the right
/// `HidSocketTable` slot when a report comes ready.
pub struct HidEndpoint<'d> {
    pub socket_index: u8,
    writer: HidWriter<'d, Usb, HID_MAX_PACKET_SIZE>,
}

impl<'d> HidEndpoint<'d> {
    /// Sends one socket's pending report, if `poll_report` produced one.
    /// `endpoint_ready` mirrors `tud_hid_n_ready(itf)`.
    pub async fn pump(&mut self, table: &mut HidSocketTable, endpoint_ready: bool) {
        let Some(device) = table.device_mut(self.socket_index) else {
            return;
        };
        let mut report = [0u8; MAX_HID_REPORT_LEN];
        if let Some(len) = device.poll_report(endpoint_ready, &mut report) {
            let _ = self.writer.write(&report[..len]).await;
        }
    }
}

/// Builds one `HidEndpoint` per occupied socket in `table` at the moment
/// this is called (enumeration time). `states` and `descriptors` must each
/// supply at least as many slots as there are occupied sockets — the
/// caller owns their storage since `HidWriter` borrows them for `'d`.
pub fn build_hid_endpoints<'d>(
    builder: &mut Builder<'d, Usb>,
    table: &HidSocketTable,
    states: &'d mut [State<'d>],
    descriptors: &'d mut [DescriptorSlot],
) -> heapless::Vec<HidEndpoint<'d>, MAX_DEVICE_SOCKETS> {
    let mut endpoints = heapless::Vec::new();
    let mut states = states.iter_mut();
    let mut descriptors = descriptors.iter_mut();

    for socket_index in 0..MAX_DEVICE_SOCKETS as u8 {
        if !table.is_occupied(socket_index) {
            continue;
        }
        let Some(report_descriptor) = table.report_descriptor_for_interface(socket_index) else {
            continue;
        };
        let Some(state) = states.next() else {
            break; // caller under-provisioned `states`; remaining sockets are silently skipped
        };
        let Some(slot) = descriptors.next() else {
            break; // caller under-provisioned `descriptors`; remaining sockets are silently skipped
        };

        let len = report_descriptor.len().min(slot.len());
        slot[..len].copy_from_slice(&report_descriptor[..len]);

        let config = embassy_usb::class::hid::Config {
            report_descriptor: &slot[..len],
            request_handler: None,
            poll_ms: HID_POLL_MS,
            max_packet_size: HID_MAX_PACKET_SIZE as u16,
            hid_subclass: embassy_usb::class::hid::HidSubclass::No,
            hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
        };
        let writer = HidWriter::new(builder, state, config);
        let _ = endpoints.push(HidEndpoint { socket_index, writer });
    }

    endpoints
}
