use std::collections::BTreeMap;
use std::io;

use super::cursor::ByteCursor;
use super::hexdump::hexdump;
use super::message::{FRAME_HEADER_LEN, Message, MessageFlags};
use super::protocol::{MAX_PACKET_SIZE, SEQ_UNRELIABLE};
use super::stats::NetworkStats;
use super::transport::Transport;

/// How far past the expected sequence a reliable message may arrive and
/// still be held for in-order delivery.
pub const MAX_REORDER_WINDOW: u32 = 1024;

/// Per-connection sequencing over an unreliable transport.
///
/// Reliable messages reach the caller exactly once and in sequence order;
/// unreliable messages pass straight through. Lost reliable sends are not
/// retransmitted.
pub struct ReliableSession<T: Transport> {
    transport: T,
    client_id: u16,
    next_send_seq: u32,
    expected_seq: u32,
    queued: BTreeMap<u32, Message>,
    recv_buffer: Vec<u8>,
    stats: NetworkStats,
}

impl<T: Transport> ReliableSession<T> {
    pub fn new(transport: T, client_id: u16) -> Self {
        Self {
            transport,
            client_id,
            next_send_seq: 1,
            expected_seq: 1,
            queued: BTreeMap::new(),
            recv_buffer: vec![0u8; MAX_PACKET_SIZE],
            stats: NetworkStats::default(),
        }
    }

    pub fn client_id(&self) -> u16 {
        self.client_id
    }

    pub fn expected_seq(&self) -> u32 {
        self.expected_seq
    }

    pub fn next_send_seq(&self) -> u32 {
        self.next_send_seq
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Restarts sequencing under a new client id and drops anything buffered.
    pub fn reset(&mut self, client_id: u16) {
        self.client_id = client_id;
        self.next_send_seq = 1;
        self.expected_seq = 1;
        self.queued.clear();
    }

    fn frame(&self, sequence: u32, flags: MessageFlags, body: &[u8]) -> Vec<u8> {
        let mut frame = ByteCursor::with_capacity(FRAME_HEADER_LEN + body.len());
        frame.write_u32(sequence);
        frame.write_u8((MessageFlags::UNKNOWN | flags).bits());
        frame.write_u16(self.client_id);
        frame.write_bytes(body);
        frame.into_inner()
    }

    fn transmit(&mut self, frame: &[u8]) -> io::Result<usize> {
        if frame.len() > MAX_PACKET_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "frame exceeds maximum packet size",
            ));
        }
        let sent = self.transport.send(frame)?;
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += sent as u64;
        Ok(sent)
    }

    /// Sends one command. Reliable sends consume the next sequence number;
    /// unreliable sends all share [`SEQ_UNRELIABLE`].
    pub fn send(&mut self, reliable: bool, command: u8, payload: &[u8]) -> io::Result<usize> {
        let mut body = Vec::with_capacity(1 + payload.len());
        body.push(command);
        body.extend_from_slice(payload);

        let frame = if reliable {
            let sequence = self.next_send_seq;
            self.next_send_seq = self.next_send_seq.wrapping_add(1);
            self.frame(sequence, MessageFlags::RELIABLE, &body)
        } else {
            self.frame(SEQ_UNRELIABLE, MessageFlags::empty(), &body)
        };
        self.transmit(&frame)
    }

    pub fn send_ack(&mut self, sequence: u32) -> io::Result<usize> {
        let frame = self.frame(SEQ_UNRELIABLE, MessageFlags::ACK, &sequence.to_le_bytes());
        let sent = self.transmit(&frame)?;
        self.stats.acks_sent += 1;
        Ok(sent)
    }

    /// Returns the next message for the application, or `None` when nothing
    /// deliverable is available without blocking.
    pub fn receive(&mut self) -> io::Result<Option<Message>> {
        if let Some(entry) = self.queued.first_entry() {
            if *entry.key() == self.expected_seq {
                let message = entry.remove();
                log::debug!("Delivering queued seq {:#x}", message.sequence);
                self.expected_seq = self.expected_seq.wrapping_add(1);
                self.stats.reliable_delivered += 1;
                return Ok(Some(message));
            }
        }

        loop {
            let Some(size) = self.transport.recv(&mut self.recv_buffer)? else {
                return Ok(None);
            };
            self.stats.packets_received += 1;
            self.stats.bytes_received += size as u64;

            let message = match Message::parse(&self.recv_buffer[..size]) {
                Ok(message) => message,
                Err(e) => {
                    log::warn!(
                        "Dropping malformed frame: {}\n{}",
                        e,
                        hexdump(&self.recv_buffer[..size])
                    );
                    self.stats.malformed_dropped += 1;
                    continue;
                }
            };

            if message.is_reliable() {
                if let Err(e) = self.send_ack(message.sequence) {
                    log::warn!("Failed to ack seq {:#x}: {}", message.sequence, e);
                }

                if message.sequence == self.expected_seq {
                    self.expected_seq = self.expected_seq.wrapping_add(1);
                    self.stats.reliable_delivered += 1;
                    return Ok(Some(message));
                }
                if message.sequence > self.expected_seq
                    && message.sequence - self.expected_seq > MAX_REORDER_WINDOW
                {
                    log::debug!(
                        "Dropping seq {:#x}, too far ahead of {:#x}",
                        message.sequence,
                        self.expected_seq
                    );
                    self.stats.out_of_window_dropped += 1;
                } else if message.sequence > self.expected_seq {
                    log::debug!(
                        "Queueing seq {:#x} received out of order (expected {:#x})",
                        message.sequence,
                        self.expected_seq
                    );
                    if self.queued.insert(message.sequence, message).is_none() {
                        self.stats.reliable_queued += 1;
                    } else {
                        self.stats.duplicates_dropped += 1;
                    }
                } else {
                    log::debug!("Discarding previously seen seq {:#x}", message.sequence);
                    self.stats.duplicates_dropped += 1;
                }
                continue;
            }

            if message.is_ack() {
                self.stats.acks_received += 1;
                continue;
            }

            return Ok(Some(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::memory::MemoryTransport;

    fn reliable(seq: u32, body: u8) -> Message {
        Message::new(
            seq,
            MessageFlags::UNKNOWN | MessageFlags::RELIABLE,
            0,
            vec![body],
        )
    }

    fn drain(session: &mut ReliableSession<MemoryTransport>) -> Vec<u32> {
        let mut delivered = Vec::new();
        while let Some(message) = session.receive().unwrap() {
            delivered.push(message.sequence);
        }
        delivered
    }

    #[test]
    fn reordered_and_duplicated_reliables_delivered_once_in_order() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 7);
        for seq in [2, 1, 1, 3, 1] {
            session.transport_mut().push_message(&reliable(seq, seq as u8));
        }

        assert_eq!(drain(&mut session), vec![1, 2, 3]);
        assert_eq!(session.expected_seq(), 4);
        assert_eq!(session.queued_len(), 0);
        assert_eq!(session.stats().duplicates_dropped, 2);
    }

    #[test]
    fn every_reliable_is_acked_regardless_of_order() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 7);
        for seq in [3, 1, 1] {
            session.transport_mut().push_message(&reliable(seq, 0));
        }
        drain(&mut session);

        let acks: Vec<u32> = session
            .transport_mut()
            .take_outbound_messages()
            .into_iter()
            .map(|m| {
                assert!(m.is_ack());
                assert_eq!(m.sequence, SEQ_UNRELIABLE);
                assert_eq!(m.sender_id, 7);
                ByteCursor::from_vec(m.payload).read_u32().unwrap()
            })
            .collect();
        assert_eq!(acks, vec![3, 1, 1]);
    }

    #[test]
    fn gap_holds_back_later_messages() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 1);
        session.transport_mut().push_message(&reliable(2, 0));
        session.transport_mut().push_message(&reliable(3, 0));

        assert!(session.receive().unwrap().is_none());
        assert_eq!(session.queued_len(), 2);

        session.transport_mut().push_message(&reliable(1, 0));
        assert_eq!(drain(&mut session), vec![1, 2, 3]);
    }

    #[test]
    fn unreliable_passes_through_and_acks_are_swallowed() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 1);
        session.transport_mut().push_message(&Message::new(
            SEQ_UNRELIABLE,
            MessageFlags::UNKNOWN | MessageFlags::ACK,
            0,
            5u32.to_le_bytes().to_vec(),
        ));
        session.transport_mut().push_message(&Message::new(
            SEQ_UNRELIABLE,
            MessageFlags::UNKNOWN,
            0,
            vec![0x5B],
        ));

        let message = session.receive().unwrap().unwrap();
        assert_eq!(message.payload, vec![0x5B]);
        assert_eq!(session.expected_seq(), 1);
        assert_eq!(session.stats().acks_received, 1);
        assert!(session.transport().outbound().is_empty());
    }

    #[test]
    fn send_sequences() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 0x1234);
        session.send(true, 0xC4, &[]).unwrap();
        session.send(false, 0xC7, &[1, 2]).unwrap();
        session.send(true, 0xC5, &[]).unwrap();

        let sent = session.transport_mut().take_outbound_messages();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].sequence, 1);
        assert!(sent[0].is_reliable());
        assert_eq!(sent[0].payload, vec![0xC4]);
        assert_eq!(sent[1].sequence, SEQ_UNRELIABLE);
        assert!(!sent[1].is_reliable());
        assert_eq!(sent[1].payload, vec![0xC7, 1, 2]);
        assert_eq!(sent[2].sequence, 2);
        assert!(sent.iter().all(|m| m.sender_id == 0x1234));
        assert!(sent.iter().all(|m| m.flags.contains(MessageFlags::UNKNOWN)));
    }

    #[test]
    fn reset_restarts_sequencing() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 1);
        session.transport_mut().push_message(&reliable(1, 0));
        session.transport_mut().push_message(&reliable(3, 0));
        drain(&mut session);
        session.send(true, 0xC4, &[]).unwrap();

        session.reset(9);
        assert_eq!(session.client_id(), 9);
        assert_eq!(session.expected_seq(), 1);
        assert_eq!(session.next_send_seq(), 1);
        assert_eq!(session.queued_len(), 0);
    }

    #[test]
    fn failed_ack_still_delivers() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 1);
        session.transport_mut().fail_next_sends(1);
        session.transport_mut().push_message(&reliable(1, 0));
        session.transport_mut().push_message(&reliable(2, 0));

        assert_eq!(drain(&mut session), vec![1, 2]);
        assert_eq!(session.expected_seq(), 3);
        assert_eq!(session.stats().acks_sent, 1);
        assert_eq!(session.transport().outbound().len(), 1);
    }

    #[test]
    fn far_future_sequence_is_not_queued() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 1);
        session.transport_mut().push_message(&reliable(u32::MAX, 0));
        session.transport_mut().push_message(&reliable(1 + MAX_REORDER_WINDOW, 0));
        session.transport_mut().push_message(&reliable(2 + MAX_REORDER_WINDOW, 0));

        assert!(session.receive().unwrap().is_none());
        assert_eq!(session.queued_len(), 1);
        assert_eq!(session.stats().out_of_window_dropped, 2);
        assert_eq!(session.stats().acks_sent, 3);

        session.transport_mut().push_message(&reliable(1, 0));
        assert_eq!(drain(&mut session), vec![1]);
        assert_eq!(session.expected_seq(), 2);
    }

    #[test]
    fn malformed_frames_are_skipped() {
        let mut session = ReliableSession::new(MemoryTransport::new(), 1);
        session.transport_mut().push_inbound(vec![1, 2, 3]);
        session.transport_mut().push_message(&reliable(1, 0));

        assert_eq!(drain(&mut session), vec![1]);
        assert_eq!(session.stats().malformed_dropped, 1);
    }
}
