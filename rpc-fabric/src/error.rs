//! Error taxonomy, mirroring the numeric `RPC_ERROR_*` codes this fabric is
//! modelled on. Kept as a closed `enum` rather than raw codes since every
//! call site in this crate already knows which variant applies.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RpcError {
    /// Serialized call arguments would not fit in the configured buffer.
    ArgumentsTooLarge,
    /// A fully-built packet (header + payload) exceeds the buffer.
    PayloadTooLarge,
    /// Declared packet length is inconsistent with what was received.
    InvalidPacketLength,
    /// No server handler registered for this provider/method pair.
    NoHandler,
    /// A synchronous call's timeout elapsed before a reply arrived.
    Timeout,
    /// A reply's call ID has no matching pending call.
    UnexpectedCallId,
}

impl core::fmt::Display for RpcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            RpcError::ArgumentsTooLarge => "arguments too large",
            RpcError::PayloadTooLarge => "payload too large",
            RpcError::InvalidPacketLength => "invalid packet length",
            RpcError::NoHandler => "no handler for provider/method",
            RpcError::Timeout => "rpc call timeout",
            RpcError::UnexpectedCallId => "unexpected call id in reply",
        };
        f.write_str(msg)
    }
}

/// Where [`RpcError`]s not surfaced through a `Result` get routed — the
/// out-of-band errors a fire-and-forget send or an unmatched reply produces.
/// A trait object rather than a fixed callback type so a caller on `std` can
/// plug in `log`/`env_logger` while a target build plugs in `defmt`.
pub trait ErrorSink {
    fn on_error(&mut self, error: RpcError);
}

/// An [`ErrorSink`] that discards everything. Useful in tests that only
/// care about return values.
pub struct NullSink;

impl ErrorSink for NullSink {
    fn on_error(&mut self, _error: RpcError) {}
}

#[cfg(feature = "std")]
pub struct LogSink;

#[cfg(feature = "std")]
impl ErrorSink for LogSink {
    fn on_error(&mut self, error: RpcError) {
        log::warn!("rpc error: {error}");
    }
}
