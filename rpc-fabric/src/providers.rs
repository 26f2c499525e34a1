//! The four providers making up the proxy's bidirectional RPC surface: two
//! between the microcontroller and the mainboard, two between the
//! microcontroller and a desktop-side client.

use crate::provider;

/// Methods the mainboard implements; the microcontroller calls them.
pub mod pico2main {
    provider!(Pico2Main, id = 100, methods = ["ping", "debugPrint", "onBoot"]);

    pub const PING: u16 = 0;
    pub const DEBUG_PRINT: u16 = 1;
    /// Called by the microcontroller on boot, passing its device ID.
    pub const ON_BOOT: u16 = 2;
}

/// Methods the microcontroller implements; the mainboard calls them.
pub mod main2pico {
    provider!(
        Main2Pico,
        id = 200,
        methods = [
            "ping",
            "setLed",
            "getLedStatus",
            "rebootFlashMode",
            "reboot",
            "setAxis",
            "setMode",
            "getMode",
            "plugDevice",
            "unplugDevice",
        ]
    );

    pub const PING: u16 = 0;
    pub const SET_LED: u16 = 1;
    pub const GET_LED_STATUS: u16 = 2;
    pub const REBOOT_FLASH_MODE: u16 = 3;
    pub const REBOOT: u16 = 4;
    /// `(device, axis, value)`.
    pub const SET_AXIS: u16 = 5;
    /// Sets device mode (0 = HID, 1 = XInput); persisted and followed by a reboot.
    pub const SET_MODE: u16 = 6;
    pub const GET_MODE: u16 = 7;
    /// `(socket, DeviceConfiguration)`.
    pub const PLUG_DEVICE: u16 = 8;
    pub const UNPLUG_DEVICE: u16 = 9;
}

/// Methods the microcontroller provides to a desktop-side client.
pub mod pc2pico {
    provider!(Pc2Pico, id = 300, methods = ["ping"]);

    pub const PING: u16 = 0;
}

/// Methods a desktop-side client provides to the microcontroller.
pub mod pico2pc {
    provider!(Pico2Pc, id = 301, methods = ["ping", "debugPrint"]);

    pub const PING: u16 = 0;
    pub const DEBUG_PRINT: u16 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;

    #[test]
    fn provider_ids_match_the_wire_contract() {
        assert_eq!(pico2main::Pico2Main::PROVIDER_ID, 100);
        assert_eq!(main2pico::Main2Pico::PROVIDER_ID, 200);
        assert_eq!(pc2pico::Pc2Pico::PROVIDER_ID, 300);
        assert_eq!(pico2pc::Pico2Pc::PROVIDER_ID, 301);
    }

    #[test]
    fn method_ordinals_match_table_position() {
        assert_eq!(
            main2pico::Main2Pico::METHOD_NAMES[main2pico::SET_AXIS as usize],
            "setAxis"
        );
        assert_eq!(
            main2pico::Main2Pico::METHOD_NAMES[main2pico::PLUG_DEVICE as usize],
            "plugDevice"
        );
        assert_eq!(pico2pc::Pico2Pc::METHOD_NAMES[pico2pc::DEBUG_PRINT as usize], "debugPrint");
    }
}
