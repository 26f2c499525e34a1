#![no_std]
#![no_main]

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{FLASH, UART1, USB};
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_rp::usb::Driver;
use embassy_time::{Instant, Timer};
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use static_cell::StaticCell;

use coro_rt::{Channel, Clock, TryRecvOutcome};
use input_proxy_firmware::usb_output::{self, DescriptorSlot};
use input_proxy_firmware::xinput_output;
use input_proxy_firmware::{
    generate_device_id, load_boot_config, EmbassyClock, Main2PicoHandler, RebootRequest,
};
use input_proxy_firmware::{DeviceManager, Mode};

use rpc_fabric::filter::{FramingInputFilter, FramingOutputFilter};
use rpc_fabric::payload::Value;
use rpc_fabric::providers::pico2main;
use rpc_fabric::providers::pico2main::Pico2Main;
use rpc_fabric::provider::Provider;
use rpc_fabric::RpcManager;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Flash layout: the KV sector is the last sector of a 2 MiB RP2040 flash,
/// well clear of the XIP code region.
const FLASH_SIZE: usize = 2 * 1024 * 1024;
const KV_SECTOR_SIZE: usize = 4096;
const KV_BASE_OFFSET: u32 = (FLASH_SIZE - KV_SECTOR_SIZE) as u32;
const KV_DATA_CAP: usize = KV_SECTOR_SIZE - 8; // minus persistent_kv::record::HEADER_LEN
const KV_MAX_ENTRIES: usize = 8;
const KV_MAX_KEY_LEN: usize = 16;
const KV_MAX_VALUE_LEN: usize = 32;

/// Rebuilt every `RPC_PACKET_BUF` bytes at most; generous for the largest
/// reply this fabric ever sends (a `plugDevice`/`onBoot` ack).
const RPC_OUT_BUF: usize = 256;

/// How often the device tables are polled for a fresh HID/XInput report,
/// independent of whatever UART traffic is or isn't arriving.
const OUTPUT_POLL_MS: u64 = 1;
/// Keepalive interval for the `pico2main::ping` health check.
const PING_INTERVAL_MS: u64 = 5_000;

static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static HID_STATES: StaticCell<[State<'static>; device_sockets::MAX_DEVICE_SOCKETS]> = StaticCell::new();
static HID_DESCRIPTORS: StaticCell<[DescriptorSlot; device_sockets::MAX_DEVICE_SOCKETS]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("input-proxy-firmware starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Persistence: load the boot mode and device ID ---
    let flash = Flash::<FLASH, Blocking, FLASH_SIZE>::new_blocking(p.FLASH);
    let mut kv_store = persistent_kv::KvStore::<
        _,
        KV_SECTOR_SIZE,
        KV_DATA_CAP,
        KV_MAX_ENTRIES,
        KV_MAX_KEY_LEN,
        KV_MAX_VALUE_LEN,
    >::new(flash, KV_BASE_OFFSET)
    .expect("KV_DATA_CAP must fit KV_SECTOR_SIZE");

    let id_seed = Instant::now().as_micros() as u32;
    let boot_config = load_boot_config(&mut kv_store, id_seed);
    info!("boot mode={} device_id={}", boot_config.mode.as_kv_str(), boot_config.device_id.as_str());

    let mut device_manager = DeviceManager::new(boot_config.mode);

    // --- UART setup: RPC fabric transport to the mainboard ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = 115_200;
    let uart = Uart::new(p.UART1, p.PIN_8, p.PIN_9, Irqs, p.DMA_CH0, p.DMA_CH1, uart_config);
    let (mut uart_tx, mut uart_rx) = uart.split();

    // --- USB setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = match device_manager.mode() {
        Mode::Hid => {
            let mut c = UsbConfig::new(0x1209, 0x0003); // matches HidSocketTable::new()'s defaults
            c.manufacturer = Some("InputProxy");
            c.product = Some("InputProxy Keyboard, Mouse & 4 Gamepads");
            c.serial_number = Some("20260118");
            c
        }
        Mode::Xinput => {
            let mut c = UsbConfig::new(0x045E, 0x028E); // matches XinputSocketTable::new()'s defaults
            c.manufacturer = Some("Microsoft");
            c.product = Some("Xbox 360 Controller");
            c.serial_number = Some("000000");
            c
        }
    };
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder =
        Builder::new(usb_driver, usb_config, config_descriptor, bos_descriptor, msos_descriptor, control_buf);

    // LED: lit while SET_LED says so, mirroring `mainPico.cpp`'s on-board
    // status LED toggled by `main2PicoRpcServer.setLed`.
    let mut led = Output::new(p.PIN_25, Level::Low);
    let mut led_on = false;
    let mut pending_mode: Option<Mode> = None;
    let reboot_channel: Channel<RebootRequest, 2> = Channel::new();

    let clock = EmbassyClock;
    let mut last_ping_ms = clock.now_ms();

    let mut rpc_manager = RpcManager::<8, 8>::new();
    let mut in_filter = FramingInputFilter::<{ byte_framer::MAX_CONTENT_LEN }>::new();

    match &mut device_manager {
        DeviceManager::Hid(hid_table) => {
            let states = HID_STATES.init(core::array::from_fn(|_| State::new()));
            let descriptors =
                HID_DESCRIPTORS.init([[0u8; device_sockets::MAX_REPORT_DESCRIPTOR_LEN]; device_sockets::MAX_DEVICE_SOCKETS]);
            let mut endpoints = usb_output::build_hid_endpoints(&mut builder, hid_table, states, descriptors);

            let usb_device = builder.build();
            spawner.spawn(usb_task(usb_device)).unwrap();

            send_on_boot(&mut rpc_manager, &mut uart_tx, boot_config.device_id.as_str()).await;

            loop {
                let mut byte = [0u8; 1];
                match embassy_futures::select::select(uart_rx.read(&mut byte), Timer::after_millis(OUTPUT_POLL_MS)).await
                {
                    embassy_futures::select::Either::First(Ok(())) => {
                        process_inbound_byte(&mut rpc_manager, &mut in_filter, &mut device_manager, &mut led_on, &mut pending_mode, &reboot_channel, &mut uart_tx, byte[0]).await;
                    }
                    embassy_futures::select::Either::First(Err(e)) => {
                        warn!("UART read error: {:?}", e);
                    }
                    embassy_futures::select::Either::Second(()) => {}
                }

                for endpoint in endpoints.iter_mut() {
                    if let DeviceManager::Hid(table) = &mut device_manager {
                        endpoint.pump(table, true).await;
                    }
                }

                maybe_ping(&clock, &mut last_ping_ms, &mut rpc_manager, &mut uart_tx).await;

                if let Some(request) = drain_reboot(&reboot_channel) {
                    perform_reboot(request, pending_mode, &mut kv_store);
                }

                led.set_level(if led_on { Level::High } else { Level::Low });
            }
        }
        DeviceManager::Xinput(_) => {
            let mut endpoints = xinput_output::build_xinput_endpoints(&mut builder);

            let usb_device = builder.build();
            spawner.spawn(usb_task(usb_device)).unwrap();

            send_on_boot(&mut rpc_manager, &mut uart_tx, boot_config.device_id.as_str()).await;

            loop {
                let mut byte = [0u8; 1];
                match embassy_futures::select::select(uart_rx.read(&mut byte), Timer::after_millis(OUTPUT_POLL_MS)).await
                {
                    embassy_futures::select::Either::First(Ok(())) => {
                        process_inbound_byte(&mut rpc_manager, &mut in_filter, &mut device_manager, &mut led_on, &mut pending_mode, &reboot_channel, &mut uart_tx, byte[0]).await;
                    }
                    embassy_futures::select::Either::First(Err(e)) => {
                        warn!("UART read error: {:?}", e);
                    }
                    embassy_futures::select::Either::Second(()) => {}
                }

                for endpoint in endpoints.iter_mut() {
                    if let DeviceManager::Xinput(table) = &mut device_manager {
                        endpoint.pump(table, true).await;
                    }
                }

                maybe_ping(&clock, &mut last_ping_ms, &mut rpc_manager, &mut uart_tx).await;

                if let Some(request) = drain_reboot(&reboot_channel) {
                    perform_reboot(request, pending_mode, &mut kv_store);
                }

                led.set_level(if led_on { Level::High } else { Level::Low });
            }
        }
    }
}

/// USB device task — runs the USB stack's control and transfer machinery.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Sends `pico2main::onBoot(deviceId)` once at startup, matching
/// `pico2MainRpcClient.onBoot(deviceId)`. Fire-and-forget: the mainboard's
/// ack, if any, carries nothing the firmware needs to act on.
async fn send_on_boot<'d>(
    rpc_manager: &mut RpcManager<8, 8>,
    uart_tx: &mut embassy_rp::uart::UartTx<'d, embassy_rp::uart::Async>,
    device_id: &str,
) {
    let args = [Value::Bytes(device_id.as_bytes())];
    let mut out_filter = FramingOutputFilter;
    let mut out_buf: heapless::Vec<u8, RPC_OUT_BUF> = heapless::Vec::new();
    rpc_manager.call_void(
        Pico2Main::PROVIDER_ID,
        pico2main::ON_BOOT,
        &args,
        &mut [&mut out_filter],
        |b| {
            let _ = out_buf.extend_from_slice(b);
        },
        |e| warn!("onBoot send error: {:?}", e),
    );
    if !out_buf.is_empty() {
        let _ = uart_tx.write(&out_buf).await;
    }
}

/// Periodic `pico2main::ping` keepalive, gated on `EmbassyClock` so it fires
/// on a wall-clock interval rather than once per scheduler tick.
async fn maybe_ping<'d>(
    clock: &EmbassyClock,
    last_ping_ms: &mut u64,
    rpc_manager: &mut RpcManager<8, 8>,
    uart_tx: &mut embassy_rp::uart::UartTx<'d, embassy_rp::uart::Async>,
) {
    let now = clock.now_ms();
    if now.saturating_sub(*last_ping_ms) < PING_INTERVAL_MS {
        return;
    }
    *last_ping_ms = now;

    let marker = 0i32.to_le_bytes();
    let args = [Value::Fixed(&marker)];
    let mut out_filter = FramingOutputFilter;
    let mut out_buf: heapless::Vec<u8, RPC_OUT_BUF> = heapless::Vec::new();
    rpc_manager.call_void(
        Pico2Main::PROVIDER_ID,
        pico2main::PING,
        &args,
        &mut [&mut out_filter],
        |b| {
            let _ = out_buf.extend_from_slice(b);
        },
        |e| warn!("ping send error: {:?}", e),
    );
    if !out_buf.is_empty() {
        let _ = uart_tx.write(&out_buf).await;
    }
}

/// Runs one inbound UART byte through the RPC fabric: unwraps framing,
/// dispatches any complete request to [`Main2PicoHandler`], and writes any
/// reply back out over UART.
#[allow(clippy::too_many_arguments)]
async fn process_inbound_byte<'d, const N: usize>(
    rpc_manager: &mut RpcManager<8, 8>,
    in_filter: &mut FramingInputFilter<N>,
    device_manager: &mut DeviceManager,
    led_on: &mut bool,
    pending_mode: &mut Option<Mode>,
    reboot_channel: &Channel<RebootRequest, 2>,
    uart_tx: &mut embassy_rp::uart::UartTx<'d, embassy_rp::uart::Async>,
    byte: u8,
) {
    let mut handler =
        Main2PicoHandler { device_manager, led_on, pending_mode, reboot_channel };
    let mut out_filter = FramingOutputFilter;
    let mut out_buf: heapless::Vec<u8, RPC_OUT_BUF> = heapless::Vec::new();

    rpc_manager.process_input(
        &[byte],
        &mut [in_filter],
        &mut [&mut out_filter],
        &mut handler,
        |b| {
            let _ = out_buf.extend_from_slice(b);
        },
        |e| warn!("RPC error: {:?}", e),
    );

    if !out_buf.is_empty() {
        let _ = uart_tx.write(&out_buf).await;
    }
}

fn drain_reboot(reboot_channel: &Channel<RebootRequest, 2>) -> Option<RebootRequest> {
    match reboot_channel.try_receive() {
        TryRecvOutcome::Ready(request) => Some(request),
        _ => None,
    }
}

/// Persists a pending mode switch (if any) and resets. Never returns.
fn perform_reboot<S, const SECTOR_SIZE: usize, const DATA_CAP: usize, const MAX_ENTRIES: usize, const MAX_KEY_LEN: usize, const MAX_VALUE_LEN: usize>(
    request: RebootRequest,
    pending_mode: Option<Mode>,
    kv_store: &mut persistent_kv::KvStore<S, SECTOR_SIZE, DATA_CAP, MAX_ENTRIES, MAX_KEY_LEN, MAX_VALUE_LEN>,
) -> !
where
    S: embedded_storage::nor_flash::NorFlash,
{
    if let Some(mode) = pending_mode {
        let _ = kv_store.put("mode", mode.as_kv_str());
        let _ = kv_store.flush();
    }

    match request {
        RebootRequest::Normal => cortex_m::peripheral::SCB::sys_reset(),
        RebootRequest::FlashMode => embassy_rp::rom_data::reset_to_usb_boot(0, 0),
    }
}
