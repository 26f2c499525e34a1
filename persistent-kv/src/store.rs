//! A bounded key-value map persisted to one NOR-flash sector: a whole-sector
//! erase-then-program on `flush`, tolerant reconstruction on `load`.

use embedded_storage::nor_flash::NorFlash;
use heapless::{String, Vec};

use crate::escape::{escape_into, unescape_into};
use crate::record::{RecordError, RecordHeader, HEADER_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvError<E> {
    KeyTooLong,
    ValueTooLong,
    TooManyEntries,
    DataTooLarge,
    InvalidRecord,
    SectorTooSmall,
    Storage(E),
}

impl<E> From<RecordError> for KvError<E> {
    fn from(_: RecordError) -> Self {
        KvError::InvalidRecord
    }
}

/// `SECTOR_SIZE` is the flash erase granularity this store claims exclusive
/// ownership of; `DATA_CAP` must equal `SECTOR_SIZE - record::HEADER_LEN`
/// (checked at construction, since const generic arithmetic between the two
/// can't be expressed in the type itself on stable). `MAX_ENTRIES`,
/// `MAX_KEY_LEN` and `MAX_VALUE_LEN` bound the in-memory map.
pub struct KvStore<
    S,
    const SECTOR_SIZE: usize,
    const DATA_CAP: usize,
    const MAX_ENTRIES: usize,
    const MAX_KEY_LEN: usize,
    const MAX_VALUE_LEN: usize,
> {
    storage: S,
    base_offset: u32,
    entries: Vec<(String<MAX_KEY_LEN>, String<MAX_VALUE_LEN>), MAX_ENTRIES>,
    dirty: bool,
}

impl<S, const SECTOR_SIZE: usize, const DATA_CAP: usize, const MAX_ENTRIES: usize, const MAX_KEY_LEN: usize, const MAX_VALUE_LEN: usize>
    KvStore<S, SECTOR_SIZE, DATA_CAP, MAX_ENTRIES, MAX_KEY_LEN, MAX_VALUE_LEN>
where
    S: NorFlash,
{
    pub fn new(storage: S, base_offset: u32) -> Result<Self, KvError<S::Error>> {
        if DATA_CAP + HEADER_LEN > SECTOR_SIZE {
            return Err(KvError::SectorTooSmall);
        }
        Ok(Self { storage, base_offset, entries: Vec::new(), dirty: false })
    }

    /// Loads the map from flash. Returns `Ok(false)` (not an error) for a
    /// blank or corrupted sector — the store is then just empty, matching
    /// first-boot behaviour.
    pub fn load(&mut self) -> Result<bool, KvError<S::Error>> {
        let mut buf = [0u8; SECTOR_SIZE];
        self.storage.read(self.base_offset, &mut buf).map_err(KvError::Storage)?;

        let header = match RecordHeader::parse(&buf, DATA_CAP) {
            Ok(h) => h,
            Err(_) => {
                self.entries.clear();
                self.dirty = false;
                return Ok(false);
            }
        };

        let data = &buf[HEADER_LEN..HEADER_LEN + header.length as usize];
        let text = match core::str::from_utf8(data) {
            Ok(t) => t,
            Err(_) => {
                self.entries.clear();
                self.dirty = false;
                return Ok(false);
            }
        };

        if self.deserialize_into(text).is_err() {
            self.entries.clear();
            self.dirty = false;
            return Ok(false);
        }

        self.dirty = false;
        Ok(true)
    }

    /// Writes the map to flash if it's been modified since the last
    /// successful `load`/`flush`. A no-op returning `Ok(())` otherwise.
    pub fn flush(&mut self) -> Result<(), KvError<S::Error>> {
        if !self.dirty {
            return Ok(());
        }

        let mut data: String<DATA_CAP> = String::new();
        self.serialize_into(&mut data)?;

        let mut buf = [0xFFu8; SECTOR_SIZE];
        RecordHeader::write(data.len() as u32, &mut buf)?;
        buf[HEADER_LEN..HEADER_LEN + data.len()].copy_from_slice(data.as_bytes());

        let end = self.base_offset + SECTOR_SIZE as u32;
        self.storage.erase(self.base_offset, end).map_err(KvError::Storage)?;
        self.storage.write(self.base_offset, &buf).map_err(KvError::Storage)?;

        self.dirty = false;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn put(&mut self, key: &str, value: &str) -> Result<(), KvError<S::Error>> {
        let mut key_buf: String<MAX_KEY_LEN> = String::new();
        key_buf.push_str(key).map_err(|_| KvError::KeyTooLong)?;
        let mut value_buf: String<MAX_VALUE_LEN> = String::new();
        value_buf.push_str(value).map_err(|_| KvError::ValueTooLong)?;

        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| k.as_str() == key) {
            slot.1 = value_buf;
        } else {
            self.entries.push((key_buf, value_buf)).map_err(|_| KvError::TooManyEntries)?;
        }
        self.dirty = true;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| k.as_str() != key);
        if self.entries.len() != before {
            self.dirty = true;
        }
    }

    pub fn get_int(&self, key: &str, default_value: i32) -> i32 {
        self.get(key).and_then(|v| v.parse::<i32>().ok()).unwrap_or(default_value)
    }

    pub fn put_int(&mut self, key: &str, value: i32) -> Result<(), KvError<S::Error>> {
        let mut buf: String<12> = String::new();
        // i32::MAX is 10 digits, plus an optional sign; 12 is headroom.
        core::fmt::write(&mut buf, format_args!("{value}")).map_err(|_| KvError::ValueTooLong)?;
        self.put(key, &buf)
    }

    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.dirty = true;
        }
    }

    fn serialize_into(&self, out: &mut String<DATA_CAP>) -> Result<(), KvError<S::Error>> {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push('|').map_err(|_| KvError::DataTooLarge)?;
            }
            escape_into(key, out).map_err(|_| KvError::DataTooLarge)?;
            out.push('|').map_err(|_| KvError::DataTooLarge)?;
            escape_into(value, out).map_err(|_| KvError::DataTooLarge)?;
        }
        Ok(())
    }

    fn deserialize_into(&mut self, data: &str) -> Result<(), KvError<S::Error>> {
        self.entries.clear();
        if data.is_empty() {
            return Ok(());
        }

        let mut raw: String<DATA_CAP> = String::new();
        let mut escape_next = false;
        let mut pending_key: Option<String<MAX_KEY_LEN>> = None;

        for c in data.chars() {
            if escape_next {
                raw.push(c).map_err(|_| KvError::InvalidRecord)?;
                escape_next = false;
            } else if c == '`' {
                escape_next = true;
                raw.push(c).map_err(|_| KvError::InvalidRecord)?;
            } else if c == '|' {
                self.consume_token(&raw, &mut pending_key)?;
                raw.clear();
            } else {
                raw.push(c).map_err(|_| KvError::InvalidRecord)?;
            }
        }
        self.consume_token(&raw, &mut pending_key)?;

        if pending_key.is_some() {
            return Err(KvError::InvalidRecord); // odd number of tokens
        }
        Ok(())
    }

    fn consume_token(
        &mut self,
        raw: &str,
        pending_key: &mut Option<String<MAX_KEY_LEN>>,
    ) -> Result<(), KvError<S::Error>> {
        match pending_key.take() {
            None => {
                let mut key: String<MAX_KEY_LEN> = String::new();
                unescape_into(raw, &mut key).map_err(|_| KvError::KeyTooLong)?;
                *pending_key = Some(key);
            }
            Some(key) => {
                let mut value: String<MAX_VALUE_LEN> = String::new();
                unescape_into(raw, &mut value).map_err(|_| KvError::ValueTooLong)?;
                self.entries.push((key, value)).map_err(|_| KvError::TooManyEntries)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_storage::nor_flash::{ErrorType, NorFlashError, NorFlashErrorKind, ReadNorFlash};

    const SECTOR: usize = 256;
    const DATA_CAP: usize = SECTOR - HEADER_LEN;

    struct MemFlash {
        bytes: [u8; SECTOR],
    }

    impl MemFlash {
        fn blank() -> Self {
            Self { bytes: [0xFF; SECTOR] }
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    struct MemFlashError;

    impl NorFlashError for MemFlashError {
        fn kind(&self) -> NorFlashErrorKind {
            NorFlashErrorKind::Other
        }
    }

    impl ErrorType for MemFlash {
        type Error = MemFlashError;
    }

    impl ReadNorFlash for MemFlash {
        const READ_SIZE: usize = 1;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            let offset = offset as usize;
            bytes.copy_from_slice(&self.bytes[offset..offset + bytes.len()]);
            Ok(())
        }

        fn capacity(&self) -> usize {
            SECTOR
        }
    }

    impl NorFlash for MemFlash {
        const WRITE_SIZE: usize = 1;
        const ERASE_SIZE: usize = SECTOR;

        fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
            for b in &mut self.bytes[from as usize..to as usize] {
                *b = 0xFF;
            }
            Ok(())
        }

        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            let offset = offset as usize;
            self.bytes[offset..offset + bytes.len()].copy_from_slice(bytes);
            Ok(())
        }
    }

    type TestStore = KvStore<MemFlash, SECTOR, DATA_CAP, 8, 16, 16>;

    #[test]
    fn load_on_blank_flash_reports_no_data() {
        let mut store = TestStore::new(MemFlash::blank(), 0).unwrap();
        assert_eq!(store.load(), Ok(false));
        assert!(!store.has("mode"));
    }

    #[test]
    fn put_flush_reload_round_trips() {
        let mut store = TestStore::new(MemFlash::blank(), 0).unwrap();
        store.load().unwrap();
        store.put("mode", "HID").unwrap();
        store.put("deviceId", "AB12C").unwrap();
        store.flush().unwrap();

        let flash = store.storage;
        let mut reloaded = TestStore::new(flash, 0).unwrap();
        assert_eq!(reloaded.load(), Ok(true));
        assert_eq!(reloaded.get("mode"), Some("HID"));
        assert_eq!(reloaded.get("deviceId"), Some("AB12C"));
    }

    #[test]
    fn value_with_delimiter_and_escape_char_round_trips() {
        let mut store = TestStore::new(MemFlash::blank(), 0).unwrap();
        store.load().unwrap();
        store.put("k", "a`b|c").unwrap();
        store.flush().unwrap();

        let flash = store.storage;
        let mut reloaded = TestStore::new(flash, 0).unwrap();
        reloaded.load().unwrap();
        assert_eq!(reloaded.get("k"), Some("a`b|c"));
    }

    #[test]
    fn flush_without_changes_does_not_touch_dirty_flag_path() {
        let mut store = TestStore::new(MemFlash::blank(), 0).unwrap();
        store.load().unwrap();
        assert_eq!(store.flush(), Ok(())); // nothing dirty, nothing written
        assert_eq!(store.storage.bytes, [0xFFu8; SECTOR]);
    }

    #[test]
    fn put_int_and_get_int_round_trip() {
        let mut store = TestStore::new(MemFlash::blank(), 0).unwrap();
        store.load().unwrap();
        store.put_int("count", -7).unwrap();
        assert_eq!(store.get_int("count", 0), -7);
        assert_eq!(store.get_int("missing", 42), 42);
    }

    #[test]
    fn remove_and_clear_set_dirty_only_when_something_changed() {
        let mut store = TestStore::new(MemFlash::blank(), 0).unwrap();
        store.load().unwrap();
        store.put("a", "1").unwrap();
        store.flush().unwrap();
        store.remove("a");
        assert!(!store.has("a"));
        store.clear();
    }
}
