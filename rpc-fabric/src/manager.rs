//! Ties the packet header, payload codec, filter chain, timeout policy and
//! pending-call table together into the fabric's client/server surface.
//!
//! Transport I/O is never owned by the manager: callers pass a `send`
//! closure and a filter chain into each call, the same way the framing
//! filters in [`crate::filter`] are driven explicitly rather than wired in
//! once. This keeps the manager transport-agnostic (UART, USB, a TCP socket
//! in tests) without any dynamic dispatch over the transport itself.

use crate::error::{ErrorSink, RpcError};
use crate::filter::DataFilter;
use crate::packet::{PacketHeader, FLAG_REPLY, HEADER_LEN};
use crate::payload::Value;
use crate::pending::PendingCalls;
use crate::timeout::TimeoutPolicy;

/// Outcome of a server-side request handler.
pub enum HandlerOutcome {
    /// The method has no reply (void / fire-and-forget on the caller's side).
    NoReply,
    /// A reply payload was written into the handler's `reply_out` buffer;
    /// carries its length.
    Reply(usize),
    /// This provider/method pair is not implemented.
    NoHandler,
}

/// Server-side dispatch target. One implementation typically fans out to
/// every provider a node serves, matching on `provider_id` internally.
pub trait RequestHandler {
    fn handle_request(
        &mut self,
        provider_id: u16,
        method_id: u16,
        call_id: u32,
        payload: &[u8],
        reply_out: &mut [u8],
    ) -> HandlerOutcome;
}

/// Runs a buffer of args and a packet header through the output filter
/// chain and a `send` sink. Shared by every call-sending path below.
fn encode_and_send(
    provider_id: u16,
    method_id: u16,
    flags: u8,
    call_id: u32,
    payload: &[u8],
    filters: &mut [&mut dyn DataFilter],
    send: &mut dyn FnMut(&[u8]),
    on_error: &mut dyn FnMut(RpcError),
) {
    let mut packet_buf = [0u8; crate::packet::MAX_PACKET_LEN];
    let len = match PacketHeader::write(provider_id, method_id, flags, call_id, payload, &mut packet_buf) {
        Ok(len) => len,
        Err(_) => {
            on_error(RpcError::PayloadTooLarge);
            return;
        }
    };

    let mut scratch = [0u8; crate::packet::MAX_PACKET_LEN + byte_framer::HEADER_LEN];
    let mut current: &[u8] = &packet_buf[..len];
    for filter in filters.iter_mut() {
        match filter.on_data(current, &mut scratch) {
            Some(out) => current = out,
            None => return,
        }
    }
    send(current);
}

pub struct RpcManager<const MAX_PENDING: usize, const MAX_TIMEOUT_OVERRIDES: usize> {
    pending: PendingCalls<MAX_PENDING>,
    timeouts: TimeoutPolicy<MAX_TIMEOUT_OVERRIDES>,
}

impl<const MAX_PENDING: usize, const MAX_TIMEOUT_OVERRIDES: usize> Default
    for RpcManager<MAX_PENDING, MAX_TIMEOUT_OVERRIDES>
{
    fn default() -> Self {
        Self { pending: PendingCalls::new(), timeouts: TimeoutPolicy::new() }
    }
}

impl<const MAX_PENDING: usize, const MAX_TIMEOUT_OVERRIDES: usize>
    RpcManager<MAX_PENDING, MAX_TIMEOUT_OVERRIDES>
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default_timeout(&mut self, timeout_ms: u32) {
        self.timeouts.set_default(timeout_ms);
    }

    pub fn set_method_timeout(&mut self, provider_id: u16, method_id: u16, timeout_ms: u32) {
        self.timeouts.set_method_timeout(provider_id, method_id, timeout_ms);
    }

    /// Effective timeout (`None` = infinite) the caller should enforce while
    /// polling [`RpcManager::poll_reply`] for this method.
    pub fn effective_timeout(&self, provider_id: u16, method_id: u16) -> Option<u32> {
        self.timeouts.effective(provider_id, method_id)
    }

    /// Sends a fire-and-forget call: no pending entry is registered, since
    /// nothing will ever be waited on.
    pub fn call_void(
        &mut self,
        provider_id: u16,
        method_id: u16,
        args: &[Value<'_>],
        filters: &mut [&mut dyn DataFilter],
        mut send: impl FnMut(&[u8]),
        mut on_error: impl FnMut(RpcError),
    ) {
        let mut payload = [0u8; crate::packet::MAX_PACKET_LEN - HEADER_LEN];
        let len = match crate::payload::encode(args, &mut payload) {
            Ok(len) => len,
            Err(e) => return on_error(e),
        };
        // call id still allocated for wire parity, immediately forgotten
        let call_id = self.pending.begin().unwrap_or(0);
        self.pending.cancel(call_id);
        encode_and_send(provider_id, method_id, 0, call_id, &payload[..len], filters, &mut send, &mut on_error);
    }

    /// Sends a call expecting a reply and registers it in the pending table.
    /// Returns the call ID to later poll with [`RpcManager::poll_reply`], or
    /// an error if the table is full or arguments don't fit.
    pub fn call_begin(
        &mut self,
        provider_id: u16,
        method_id: u16,
        args: &[Value<'_>],
        filters: &mut [&mut dyn DataFilter],
        mut send: impl FnMut(&[u8]),
    ) -> Result<u32, RpcError> {
        let mut payload = [0u8; crate::packet::MAX_PACKET_LEN - HEADER_LEN];
        let len = crate::payload::encode(args, &mut payload)?;
        let call_id = self.pending.begin().ok_or(RpcError::ArgumentsTooLarge)?;
        let mut swallow_error = |_| {};
        encode_and_send(provider_id, method_id, 0, call_id, &payload[..len], filters, &mut send, &mut swallow_error);
        Ok(call_id)
    }

    /// Non-blocking poll for a call started with [`RpcManager::call_begin`].
    pub fn poll_reply<const N: usize>(
        &mut self,
        call_id: u32,
    ) -> Result<Option<heapless::Vec<u8, N>>, RpcError> {
        self.pending.take_if_ready(call_id)
    }

    /// Gives up on a pending call, e.g. after its timeout elapses.
    pub fn cancel(&mut self, call_id: u32) {
        self.pending.cancel(call_id);
    }

    /// Runs one inbound transport chunk through the input filter chain and,
    /// once a full packet is assembled, dispatches it: a reply resolves the
    /// matching pending call, a request is handed to `handler` and any reply
    /// it produces is sent back through the output filter chain.
    #[allow(clippy::too_many_arguments)]
    pub fn process_input(
        &mut self,
        data: &[u8],
        input_filters: &mut [&mut dyn DataFilter],
        output_filters: &mut [&mut dyn DataFilter],
        handler: &mut dyn RequestHandler,
        mut send_reply: impl FnMut(&[u8]),
        mut on_error: impl FnMut(RpcError),
    ) {
        let mut scratch = [0u8; crate::packet::MAX_PACKET_LEN + byte_framer::HEADER_LEN];
        let mut current: &[u8] = data;
        for filter in input_filters.iter_mut() {
            match filter.on_data(current, &mut scratch) {
                Some(out) => current = out,
                None => return,
            }
        }

        let header = match PacketHeader::parse(current) {
            Ok(h) => h,
            Err(_) => return on_error(RpcError::InvalidPacketLength),
        };
        if current.len() < header.length as usize {
            return on_error(RpcError::InvalidPacketLength);
        }
        let payload = &current[header.payload_range()];

        if header.is_reply() {
            if self.pending.resolve(header.call_id, payload).is_err() {
                on_error(RpcError::UnexpectedCallId);
            }
            return;
        }

        let mut reply_buf = [0u8; crate::packet::MAX_PACKET_LEN - HEADER_LEN];
        match handler.handle_request(header.provider_id, header.method_id, header.call_id, payload, &mut reply_buf) {
            HandlerOutcome::NoReply => {}
            HandlerOutcome::NoHandler => on_error(RpcError::NoHandler),
            HandlerOutcome::Reply(len) => encode_and_send(
                header.provider_id,
                header.method_id,
                FLAG_REPLY,
                header.call_id,
                &reply_buf[..len],
                output_filters,
                &mut send_reply,
                &mut on_error,
            ),
        }
    }
}

/// An [`ErrorSink`]-backed convenience wrapper, for callers that want the
/// `on_error` closures above to route through a shared sink object instead
/// of an ad hoc closure at each call site.
pub fn sink_fn(sink: &mut dyn ErrorSink) -> impl FnMut(RpcError) + '_ {
    move |e| sink.on_error(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FramingInputFilter, FramingOutputFilter};

    struct EchoHandler;
    impl RequestHandler for EchoHandler {
        fn handle_request(
            &mut self,
            _provider_id: u16,
            _method_id: u16,
            _call_id: u32,
            payload: &[u8],
            reply_out: &mut [u8],
        ) -> HandlerOutcome {
            reply_out[..payload.len()].copy_from_slice(payload);
            HandlerOutcome::Reply(payload.len())
        }
    }

    #[test]
    fn void_call_is_never_registered_as_pending() {
        let mut manager = RpcManager::<4, 4>::new();
        let mut sent = std::vec::Vec::new();
        manager.call_void(100, 0, &[], &mut [], |b| sent.extend_from_slice(b), |_| panic!("no error expected"));
        assert!(!sent.is_empty());
        // Nothing pending to resolve; a stray reply with call id 0 must be unknown.
        assert_eq!(manager.poll_reply::<16>(0), Err(RpcError::UnexpectedCallId));
    }

    #[test]
    fn sync_call_round_trips_through_request_handler() {
        let mut client = RpcManager::<4, 4>::new();
        let mut server = RpcManager::<4, 4>::new();

        let arg = 7i32.to_le_bytes();
        let mut transport = std::vec::Vec::new();
        let mut out_filter = FramingOutputFilter;
        let call_id = client
            .call_begin(300, 0, &[Value::Fixed(&arg)], &mut [&mut out_filter], |b| transport.extend_from_slice(b))
            .unwrap();

        let mut handler = EchoHandler;
        let mut reply_transport = std::vec::Vec::new();
        let mut in_filter = FramingInputFilter::<{ byte_framer::MAX_CONTENT_LEN }>::new();
        let mut reply_out_filter = FramingOutputFilter;
        server.process_input(
            &transport,
            &mut [&mut in_filter],
            &mut [&mut reply_out_filter],
            &mut handler,
            |b| reply_transport.extend_from_slice(b),
            |_| panic!("no error expected"),
        );

        let mut client_in_filter = FramingInputFilter::<{ byte_framer::MAX_CONTENT_LEN }>::new();
        client.process_input(
            &reply_transport,
            &mut [&mut client_in_filter],
            &mut [],
            &mut EchoHandler,
            |_| panic!("client never replies"),
            |_| panic!("no error expected"),
        );

        let reply = client.poll_reply::<16>(call_id).unwrap().unwrap();
        assert_eq!(&reply[..], &arg);
    }

    #[test]
    fn unhandled_request_reports_no_handler() {
        struct RejectAll;
        impl RequestHandler for RejectAll {
            fn handle_request(&mut self, _: u16, _: u16, _: u32, _: &[u8], _: &mut [u8]) -> HandlerOutcome {
                HandlerOutcome::NoHandler
            }
        }

        let mut server = RpcManager::<4, 4>::new();
        let mut packet = [0u8; HEADER_LEN];
        PacketHeader::write(999, 0, 0, 1, &[], &mut packet).unwrap();

        let mut seen_error = None;
        server.process_input(&packet, &mut [], &mut [], &mut RejectAll, |_| {}, |e| seen_error = Some(e));
        assert_eq!(seen_error, Some(RpcError::NoHandler));
    }
}
