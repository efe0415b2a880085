use bitflags::bitflags;

use super::cursor::{ByteCursor, OutOfBounds};

pub const FRAME_HEADER_LEN: usize = 7;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MessageFlags: u8 {
        const UNKNOWN = 1 << 0;
        const RELIABLE = 1 << 1;
        const ACK = 1 << 2;
    }
}

/// One datagram: `{sequence u32, flags u8, sender u16}` followed by the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sequence: u32,
    pub flags: MessageFlags,
    pub sender_id: u16,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(sequence: u32, flags: MessageFlags, sender_id: u16, payload: Vec<u8>) -> Self {
        Self {
            sequence,
            flags,
            sender_id,
            payload,
        }
    }

    pub fn parse(datagram: &[u8]) -> Result<Self, OutOfBounds> {
        let mut cursor = ByteCursor::from_slice(datagram);
        let sequence = cursor.read_u32()?;
        let flags = MessageFlags::from_bits_retain(cursor.read_u8()?);
        let sender_id = cursor.read_u16()?;
        let payload = cursor.remaining_slice().to_vec();
        Ok(Self::new(sequence, flags, sender_id, payload))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut cursor = ByteCursor::with_capacity(FRAME_HEADER_LEN + self.payload.len());
        cursor.write_u32(self.sequence);
        cursor.write_u8(self.flags.bits());
        cursor.write_u16(self.sender_id);
        cursor.write_bytes(&self.payload);
        cursor.into_inner()
    }

    pub fn is_reliable(&self) -> bool {
        self.flags.contains(MessageFlags::RELIABLE)
    }

    pub fn is_ack(&self) -> bool {
        self.flags.contains(MessageFlags::ACK)
    }

    pub fn into_cursor(self) -> ByteCursor {
        ByteCursor::from_vec(self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_header_fields() {
        let datagram = [0x02, 0x00, 0x00, 0x00, 0x03, 0x34, 0x12, 0x5B, 0xAA];
        let message = Message::parse(&datagram).unwrap();

        assert_eq!(message.sequence, 2);
        assert!(message.is_reliable());
        assert!(!message.is_ack());
        assert!(message.flags.contains(MessageFlags::UNKNOWN));
        assert_eq!(message.sender_id, 0x1234);
        assert_eq!(message.payload, vec![0x5B, 0xAA]);
        assert_eq!(message.encode(), datagram);
    }

    #[test]
    fn truncated_header_is_rejected() {
        assert!(Message::parse(&[1, 0, 0, 0, 2, 0]).is_err());
        assert!(Message::parse(&[]).is_err());
    }

    #[test]
    fn unknown_flag_bits_are_kept() {
        let message = Message::parse(&[0, 0, 0, 0, 0xF4, 0, 0]).unwrap();
        assert!(message.is_ack());
        assert_eq!(message.flags.bits(), 0xF4);
    }
}
