#![cfg_attr(not(feature = "std"), no_std)]
//! Typed binary RPC over any byte stream.
//!
//! Layers, outside in: a transport feeds bytes to a [`filter::FramingInputFilter`]
//! (built on [`byte_framer`]), which hands complete packets to
//! [`manager::RpcManager`] for dispatch. Providers are declared with the
//! [`provider!`] macro and given fixed numeric IDs in [`providers`]; argument
//! and reply payloads are encoded with the length-table codec in [`payload`].

pub mod error;
pub mod filter;
pub mod packet;
pub mod payload;
pub mod pending;
pub mod provider;
pub mod providers;
pub mod timeout;

pub mod manager;

pub use error::RpcError;
pub use manager::{HandlerOutcome, RequestHandler, RpcManager};
pub use packet::PacketHeader;
pub use payload::Value;
pub use provider::Provider;
