//! Boot-time configuration read from `persistent-kv`: the device mode and
//! a stable 5-character device ID, mirroring `PersistentStorage::get("mode")`
//! / `get("deviceId")` in `mainPico.cpp`'s boot sequence.

use embedded_storage::nor_flash::NorFlash;
use heapless::String;
use persistent_kv::KvStore;

use crate::device_manager::Mode;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generates a 5-character alphanumeric device ID from a caller-supplied
/// seed (the donor seeds `rand()` once at boot from `time(nullptr)`; this
/// target has no RTC, so the firmware seeds from a free-running timer tick
/// instead — see `bin/main.rs`). A small xorshift stands in for `rand()`;
/// it only needs to scatter five characters across a 36-symbol alphabet; it
/// is not used for anything security-sensitive.
pub fn generate_device_id(seed: u32) -> String<5> {
    let mut state = if seed == 0 { 0xA5A5_5A5A } else { seed };
    let mut out = String::new();
    for _ in 0..5 {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let idx = (state as usize) % CHARSET.len();
        let _ = out.push(CHARSET[idx] as char);
    }
    out
}

pub struct BootConfig {
    pub mode: Mode,
    pub device_id: String<5>,
}

/// Loads `mode`/`deviceId` from the store, falling back to HID mode and a
/// freshly generated device ID (persisted immediately) on first boot or a
/// corrupted sector — `KvStore::load` already treats those the same way.
pub fn load_boot_config<S, const SECTOR_SIZE: usize, const DATA_CAP: usize, const MAX_ENTRIES: usize, const MAX_KEY_LEN: usize, const MAX_VALUE_LEN: usize>(
    store: &mut KvStore<S, SECTOR_SIZE, DATA_CAP, MAX_ENTRIES, MAX_KEY_LEN, MAX_VALUE_LEN>,
    id_seed: u32,
) -> BootConfig
where
    S: NorFlash,
{
    let _ = store.load();

    let mode = Mode::from_kv_str(store.get("mode").unwrap_or("HID"));

    let device_id = match store.get("deviceId") {
        Some(id) if id.len() == 5 => String::try_from(id).unwrap_or_default(),
        _ => {
            let generated = generate_device_id(id_seed);
            let _ = store.put("deviceId", &generated);
            let _ = store.flush();
            generated
        }
    };

    BootConfig { mode, device_id }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_five_alphanumeric_characters() {
        let id = generate_device_id(42);
        assert_eq!(id.len(), 5);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn a_zero_seed_still_produces_a_valid_id() {
        let id = generate_device_id(0);
        assert_eq!(id.len(), 5);
    }
}
