use std::collections::VecDeque;
use std::io;

use super::message::Message;
use super::transport::Transport;

/// In-process datagram queue pair. Inbound datagrams are delivered in push
/// order; everything sent is recorded for inspection.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    inbound: VecDeque<Vec<u8>>,
    outbound: Vec<Vec<u8>>,
    fail_sends: usize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_inbound(&mut self, datagram: Vec<u8>) {
        self.inbound.push_back(datagram);
    }

    pub fn push_message(&mut self, message: &Message) {
        self.push_inbound(message.encode());
    }

    /// Makes the next `count` sends fail without recording anything.
    pub fn fail_next_sends(&mut self, count: usize) {
        self.fail_sends = count;
    }

    pub fn pending_inbound(&self) -> usize {
        self.inbound.len()
    }

    pub fn outbound(&self) -> &[Vec<u8>] {
        &self.outbound
    }

    pub fn take_outbound(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.outbound)
    }

    /// Parses everything sent so far. Malformed frames are skipped.
    pub fn take_outbound_messages(&mut self) -> Vec<Message> {
        self.take_outbound()
            .iter()
            .filter_map(|d| Message::parse(d).ok())
            .collect()
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, datagram: &[u8]) -> io::Result<usize> {
        if self.fail_sends > 0 {
            self.fail_sends -= 1;
            return Err(io::Error::other("send failed"));
        }
        self.outbound.push(datagram.to_vec());
        Ok(datagram.len())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<Option<usize>> {
        let Some(datagram) = self.inbound.pop_front() else {
            return Ok(None);
        };
        let size = datagram.len().min(buf.len());
        buf[..size].copy_from_slice(&datagram[..size]);
        Ok(Some(size))
    }
}
