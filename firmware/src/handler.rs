//! `Main2Pico` server dispatch: the microcontroller's side of the methods
//! the mainboard calls over UART. Mirrors `mainPico.cpp`'s
//! `main2PicoRpcServer.*` lambda bodies, just routed through
//! [`rpc_fabric::RequestHandler`] instead of closures captured per method.

use coro_rt::Channel;
use rpc_fabric::manager::HandlerOutcome;
use rpc_fabric::payload::{decode, Value};
use rpc_fabric::providers::main2pico::{self, Main2Pico};
use rpc_fabric::provider::Provider;
use rpc_fabric::RequestHandler;

use crate::device_manager::{DeviceConfiguration, DeviceKind, DeviceManager, Mode};

/// A reboot request raised by `rebootFlashMode`/`reboot`/`setMode`. Carried
/// over a channel rather than acted on inline, the same way the donor's
/// `main2PicoRpcServer.reboot` only ever signals `rebootChannel` and lets
/// the main loop perform the actual reset once any in-flight reply has
/// gone out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootRequest {
    /// Plain reboot (`reboot`, or `setMode` with an unchanged mode... no —
    /// `setMode` only ever requests `Normal` once a mode change is
    /// persisted).
    Normal,
    /// `rebootFlashMode`: drop into the RP2040's USB mass-storage bootloader.
    FlashMode,
}

pub struct Main2PicoHandler<'a> {
    pub device_manager: &'a mut DeviceManager,
    pub led_on: &'a mut bool,
    pub pending_mode: &'a mut Option<Mode>,
    pub reboot_channel: &'a Channel<RebootRequest, 2>,
}

fn decode_device_configuration(bytes: &[u8]) -> Option<DeviceConfiguration> {
    // `{ deviceType: i32, hat: u8, axesMask: u16, buttons: u8 }`, the same
    // field order `HidGamepadConfig`/`DeviceConfiguration`'s union occupies
    // on the wire; fields unused by a given `deviceType` are still present
    // (zeroed) so the struct has one fixed size regardless of kind.
    if bytes.len() < 8 {
        return None;
    }
    let device_type = i32::from_le_bytes(bytes[0..4].try_into().ok()?);
    let hat = bytes[4];
    let axes_mask = u16::from_le_bytes(bytes[5..7].try_into().ok()?);
    let buttons = bytes[7];
    let kind = DeviceKind::from_wire(device_type)?;
    Some(DeviceConfiguration { kind, hat, axes_mask, buttons })
}

impl<'a> RequestHandler for Main2PicoHandler<'a> {
    fn handle_request(
        &mut self,
        provider_id: u16,
        method_id: u16,
        _call_id: u32,
        payload: &[u8],
        reply_out: &mut [u8],
    ) -> HandlerOutcome {
        if provider_id != Main2Pico::PROVIDER_ID {
            return HandlerOutcome::NoHandler;
        }

        match method_id {
            main2pico::PING => {
                let Ok(args) = decode::<1>(payload, 1) else { return HandlerOutcome::NoHandler };
                let Some(val) = args[0].try_into().ok().map(i32::from_le_bytes) else {
                    return HandlerOutcome::NoHandler;
                };
                reply_out[..4].copy_from_slice(&val.to_le_bytes());
                HandlerOutcome::Reply(4)
            }
            main2pico::SET_LED => {
                let Ok(args) = decode::<1>(payload, 1) else { return HandlerOutcome::NoHandler };
                *self.led_on = args[0].first().copied().unwrap_or(0) != 0;
                HandlerOutcome::NoReply
            }
            main2pico::GET_LED_STATUS => {
                reply_out[0] = u8::from(*self.led_on);
                HandlerOutcome::Reply(1)
            }
            main2pico::REBOOT_FLASH_MODE => {
                let _ = self.reboot_channel.try_send(RebootRequest::FlashMode);
                reply_out[0] = 1;
                HandlerOutcome::Reply(1)
            }
            main2pico::REBOOT => {
                let _ = self.reboot_channel.try_send(RebootRequest::Normal);
                HandlerOutcome::NoReply
            }
            main2pico::SET_AXIS => {
                let Ok(args) = decode::<3>(payload, 3) else { return HandlerOutcome::NoHandler };
                let socket = i32::from_le_bytes(args[0].try_into().unwrap_or_default());
                let axis = i32::from_le_bytes(args[1].try_into().unwrap_or_default());
                let value = i32::from_le_bytes(args[2].try_into().unwrap_or_default());
                if let (Ok(socket), Ok(axis), Ok(value)) =
                    (u8::try_from(socket), u16::try_from(axis), u16::try_from(value))
                {
                    self.device_manager.set_axis(socket, axis, value);
                }
                HandlerOutcome::NoReply
            }
            main2pico::SET_MODE => {
                let Ok(args) = decode::<1>(payload, 1) else { return HandlerOutcome::NoHandler };
                let mode = if args[0].first().copied().unwrap_or(0) == 1 { Mode::Xinput } else { Mode::Hid };
                if mode != self.device_manager.mode() {
                    *self.pending_mode = Some(mode);
                    let _ = self.reboot_channel.try_send(RebootRequest::Normal);
                }
                HandlerOutcome::NoReply
            }
            main2pico::GET_MODE => {
                reply_out[0] = self.device_manager.mode().as_wire_byte();
                HandlerOutcome::Reply(1)
            }
            main2pico::PLUG_DEVICE => {
                let Ok(args) = decode::<2>(payload, 2) else { return HandlerOutcome::NoHandler };
                let socket = i32::from_le_bytes(args[0].try_into().unwrap_or_default());
                let Some(config) = decode_device_configuration(args[1]) else {
                    reply_out[0] = 0;
                    return HandlerOutcome::Reply(1);
                };
                let ok = u8::try_from(socket)
                    .map(|socket| self.device_manager.plug(socket, "", config))
                    .unwrap_or(false);
                reply_out[0] = u8::from(ok);
                HandlerOutcome::Reply(1)
            }
            main2pico::UNPLUG_DEVICE => {
                let Ok(args) = decode::<1>(payload, 1) else { return HandlerOutcome::NoHandler };
                let socket = i32::from_le_bytes(args[0].try_into().unwrap_or_default());
                let ok = u8::try_from(socket).map(|socket| self.device_manager.unplug(socket)).unwrap_or(false);
                reply_out[0] = u8::from(ok);
                HandlerOutcome::Reply(1)
            }
            _ => HandlerOutcome::NoHandler,
        }
    }
}

/// Encodes the `onBoot(deviceId) -> bool` call `Pico2Main`'s client sends
/// once at startup, matching `pico2MainRpcClient.onBoot(deviceId)`.
pub fn on_boot_args(device_id: &str) -> [Value<'_>; 1] {
    [Value::Bytes(device_id.as_bytes())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_rt::TryRecvOutcome;

    fn fresh() -> (DeviceManager, bool, Option<Mode>, Channel<RebootRequest, 2>) {
        (DeviceManager::new(Mode::Hid), false, None, Channel::new())
    }

    #[test]
    fn set_axis_forwards_to_the_device_manager() {
        let (mut dm, mut led, mut pending, reboot) = fresh();
        let mut handler =
            Main2PicoHandler { device_manager: &mut dm, led_on: &mut led, pending_mode: &mut pending, reboot_channel: &reboot };

        let args = [Value::Fixed(&0i32.to_le_bytes()), Value::Fixed(&1i32.to_le_bytes()), Value::Fixed(&1000i32.to_le_bytes())];
        let mut payload = [0u8; 32];
        let len = rpc_fabric::payload::encode(&args, &mut payload).unwrap();

        let mut reply = [0u8; 8];
        let outcome = handler.handle_request(Main2Pico::PROVIDER_ID, main2pico::SET_AXIS, 1, &payload[..len], &mut reply);
        assert!(matches!(outcome, HandlerOutcome::NoReply));
    }

    #[test]
    fn reboot_flash_mode_signals_the_reboot_channel() {
        let (mut dm, mut led, mut pending, reboot) = fresh();
        let mut handler =
            Main2PicoHandler { device_manager: &mut dm, led_on: &mut led, pending_mode: &mut pending, reboot_channel: &reboot };

        let mut reply = [0u8; 8];
        handler.handle_request(Main2Pico::PROVIDER_ID, main2pico::REBOOT_FLASH_MODE, 1, &[], &mut reply);
        assert_eq!(reboot.try_receive(), TryRecvOutcome::Ready(RebootRequest::FlashMode));
    }

    #[test]
    fn set_mode_to_the_current_mode_is_a_no_op() {
        let (mut dm, mut led, mut pending, reboot) = fresh();
        let mut handler =
            Main2PicoHandler { device_manager: &mut dm, led_on: &mut led, pending_mode: &mut pending, reboot_channel: &reboot };

        let args = [Value::Fixed(&[0u8])]; // 0 == HID, already the current mode
        let mut payload = [0u8; 8];
        let len = rpc_fabric::payload::encode(&args, &mut payload).unwrap();
        let mut reply = [0u8; 8];
        handler.handle_request(Main2Pico::PROVIDER_ID, main2pico::SET_MODE, 1, &payload[..len], &mut reply);
        assert_eq!(*pending, None);
        assert_eq!(reboot.try_receive(), TryRecvOutcome::Empty);
    }

    #[test]
    fn plug_device_rejects_a_truncated_configuration() {
        let (mut dm, mut led, mut pending, reboot) = fresh();
        let mut handler =
            Main2PicoHandler { device_manager: &mut dm, led_on: &mut led, pending_mode: &mut pending, reboot_channel: &reboot };

        let args = [Value::Fixed(&2i32.to_le_bytes()), Value::Bytes(&[0u8; 2])];
        let mut payload = [0u8; 16];
        let len = rpc_fabric::payload::encode(&args, &mut payload).unwrap();
        let mut reply = [0u8; 8];
        let outcome = handler.handle_request(Main2Pico::PROVIDER_ID, main2pico::PLUG_DEVICE, 1, &payload[..len], &mut reply);
        assert!(matches!(outcome, HandlerOutcome::Reply(1)));
        assert_eq!(reply[0], 0);
    }
}
