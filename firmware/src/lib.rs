//! RP2040 firmware binary's support modules: the process-wide device
//! manager, the `Main2Pico` server dispatch, boot-time persistence and the
//! `embassy_time`-backed clock `coro-rt`'s scheduler runs against.
//!
//! The actual task wiring (UART, USB, the scheduler loop) lives in
//! `src/bin/main.rs`; everything here is plain logic kept out of the binary
//! so it can be exercised by host-side unit tests (`cargo test -p
//! input-proxy-firmware --features std` with plain `std` doubles for the
//! hardware-specific pieces it otherwise depends on).

#![cfg_attr(not(feature = "std"), no_std)]

// `clock` links against `embassy_time`'s registered time driver, which only
// exists on the real target; host-side unit tests for everything else in
// this crate run under the `std` feature without it.
#[cfg(not(feature = "std"))]
pub mod clock;
pub mod device_manager;
pub mod handler;
pub mod persistence;
#[cfg(not(feature = "std"))]
pub mod usb_output;
#[cfg(not(feature = "std"))]
pub mod xinput_output;

#[cfg(not(feature = "std"))]
pub use clock::EmbassyClock;
pub use device_manager::{DeviceConfiguration, DeviceKind, DeviceManager, Mode};
pub use handler::{Main2PicoHandler, RebootRequest};
pub use persistence::{generate_device_id, load_boot_config, BootConfig};
