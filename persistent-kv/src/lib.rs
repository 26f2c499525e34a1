#![cfg_attr(not(feature = "std"), no_std)]
//! A small key-value map persisted to a single flash sector, replacing a
//! `std::map<std::string,std::string>` serialised by hand into
//! `key1|value1|key2|value2…`. The wire format (magic, length, escaped
//! string) is unchanged; what changes is that every buffer here is
//! statically bounded instead of heap-grown, matching the rest of this
//! workspace's `no_std` crates.

mod escape;
mod record;
mod store;

pub use escape::EscapeError;
pub use record::{RecordError, MAGIC};
pub use store::{KvError, KvStore};
