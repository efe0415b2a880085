use bitflags::bitflags;
use glam::Vec3;

use crate::net::{ByteCursor, OutOfBounds};

bitflags! {
    /// Optional parts present in a game event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventFlags: u16 {
        const EXPIRE = 1 << 0;
        const ENTITY = 1 << 1;
        const POSITION = 1 << 2;
        const ANGLES = 1 << 3;
        const SCALE = 1 << 4;
        const ENTITY2 = 1 << 5;
        const POSITION2 = 1 << 6;
        const ANGLES2 = 1 << 7;
        const SCALE2 = 1 << 8;
        const EFFECT = 1 << 9;
        const SOUND = 1 << 10;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameEvent {
    pub flags: EventFlags,
    pub expire: Option<u32>,
    pub entity: Option<u16>,
    pub position: Option<Vec3>,
    /// Raw byte values, unscaled.
    pub angles: Option<Vec3>,
    pub scale: Option<f32>,
    pub entity2: Option<u16>,
    pub position2: Option<Vec3>,
    /// Degrees.
    pub angles2: Option<Vec3>,
    pub scale2: Option<f32>,
    pub effect: Option<u16>,
    pub sound: Option<u16>,
}

fn read_word_vec3(cursor: &mut ByteCursor) -> Result<Vec3, OutOfBounds> {
    let x = cursor.read_u16()?;
    let y = cursor.read_u16()?;
    let z = cursor.read_u16()?;
    Ok(Vec3::new(x as f32, y as f32, z as f32))
}

fn read_byte_vec3(cursor: &mut ByteCursor) -> Result<Vec3, OutOfBounds> {
    let x = cursor.read_u8()?;
    let y = cursor.read_u8()?;
    let z = cursor.read_u8()?;
    Ok(Vec3::new(x as f32, y as f32, z as f32))
}

impl GameEvent {
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, OutOfBounds> {
        let flags = EventFlags::from_bits_retain(cursor.read_u16()?);
        let mut event = Self {
            flags,
            ..Self::default()
        };

        if flags.contains(EventFlags::EXPIRE) {
            event.expire = Some(cursor.read_u32()?);
        }
        if flags.contains(EventFlags::ENTITY) {
            event.entity = Some(cursor.read_u16()?);
        }
        if flags.contains(EventFlags::POSITION) {
            event.position = Some(read_word_vec3(cursor)?);
        }
        if flags.contains(EventFlags::ANGLES) {
            event.angles = Some(read_byte_vec3(cursor)?);
        }
        if flags.contains(EventFlags::SCALE) {
            event.scale = Some(cursor.read_f32()?);
        }
        if flags.contains(EventFlags::ENTITY2) {
            event.entity2 = Some(cursor.read_u16()?);
        }
        if flags.contains(EventFlags::POSITION2) {
            event.position2 = Some(read_word_vec3(cursor)?);
        }
        if flags.contains(EventFlags::ANGLES2) {
            event.angles2 = Some(read_byte_vec3(cursor)? / 255.0 * 360.0);
        }
        if flags.contains(EventFlags::SCALE2) {
            event.scale2 = Some(cursor.read_f32()?);
        }
        if flags.contains(EventFlags::EFFECT) {
            event.effect = Some(cursor.read_u16()?);
        }
        if flags.contains(EventFlags::SOUND) {
            event.sound = Some(cursor.read_u16()?);
        }
        Ok(event)
    }
}

/// Fixed part of a server snapshot, followed on the wire by the game events
/// and then the entity records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotHeader {
    pub frame: u32,
    pub prev_frame: u32,
    pub timestamp: u32,
    pub last_client_timestamp: u32,
    pub state_sequence: u8,
    pub events: Vec<GameEvent>,
}

impl SnapshotHeader {
    pub const FIXED_LEN: usize = 17;

    /// Reads the fixed fields only. Events are read by [`SnapshotHeader::read_events`].
    pub fn read(cursor: &mut ByteCursor) -> Result<Self, OutOfBounds> {
        Ok(Self {
            frame: cursor.read_u32()?,
            prev_frame: cursor.read_u32()?,
            timestamp: cursor.read_u32()?,
            last_client_timestamp: cursor.read_u32()?,
            state_sequence: cursor.read_u8()?,
            events: Vec::new(),
        })
    }

    pub fn read_events(&mut self, cursor: &mut ByteCursor) -> Result<(), OutOfBounds> {
        let count = cursor.read_u8()?;
        self.events.reserve(count as usize);
        for _ in 0..count {
            self.events.push(GameEvent::read(cursor)?);
        }
        Ok(())
    }

    pub fn write(&self, cursor: &mut ByteCursor) {
        cursor.write_u32(self.frame);
        cursor.write_u32(self.prev_frame);
        cursor.write_u32(self.timestamp);
        cursor.write_u32(self.last_client_timestamp);
        cursor.write_u8(self.state_sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fields() {
        let header = SnapshotHeader {
            frame: 1200,
            prev_frame: 1199,
            timestamp: 60_000,
            last_client_timestamp: 59_950,
            state_sequence: 4,
            events: Vec::new(),
        };
        let mut cursor = ByteCursor::new();
        header.write(&mut cursor);
        assert_eq!(cursor.len(), SnapshotHeader::FIXED_LEN);

        cursor.seek(0);
        assert_eq!(SnapshotHeader::read(&mut cursor).unwrap(), header);
    }

    #[test]
    fn event_optional_parts() {
        let mut cursor = ByteCursor::new();
        cursor.write_u8(2);
        // Entity, position and sound.
        cursor.write_u16(0x0402 | 0x0004);
        cursor.write_u16(77);
        for v in [10u16, 20, 30] {
            cursor.write_u16(v);
        }
        cursor.write_u16(0x123);
        // Expire, raw angles, scaled angles, effect.
        cursor.write_u16(0x0001 | 0x0008 | 0x0080 | 0x0200);
        cursor.write_u32(5000);
        cursor.write_bytes(&[1, 2, 3]);
        cursor.write_bytes(&[0, 255, 51]);
        cursor.write_u16(9);
        cursor.seek(0);

        let mut header = SnapshotHeader::default();
        header.read_events(&mut cursor).unwrap();
        assert!(cursor.is_at_end());
        assert_eq!(header.events.len(), 2);

        let first = &header.events[0];
        assert_eq!(first.entity, Some(77));
        assert_eq!(first.position, Some(Vec3::new(10.0, 20.0, 30.0)));
        assert_eq!(first.sound, Some(0x123));
        assert_eq!(first.expire, None);

        let second = &header.events[1];
        assert_eq!(second.expire, Some(5000));
        assert_eq!(second.angles, Some(Vec3::new(1.0, 2.0, 3.0)));
        let angles2 = second.angles2.unwrap();
        assert_eq!(angles2.x, 0.0);
        assert!((angles2.y - 360.0).abs() < 1e-3);
        assert!((angles2.z - 72.0).abs() < 1e-3);
        assert_eq!(second.effect, Some(9));
    }

    #[test]
    fn truncated_event_fails() {
        let mut cursor = ByteCursor::from_vec(vec![1, 0x01, 0x00, 0xAA]);
        let mut header = SnapshotHeader::default();
        assert!(header.read_events(&mut cursor).is_err());
    }
}
