use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::{self, Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::error::DecodeError;
use crate::net::{ByteCursor, ServerCmd, hexdump};

use super::header::SnapshotHeader;
use super::world::World;

/// Accumulates payload fragments per stream id until a terminator arrives.
#[derive(Debug, Clone)]
pub struct FragmentAssembler<K> {
    pending: BTreeMap<K, Vec<u8>>,
}

impl<K> Default for FragmentAssembler<K> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy + Debug> FragmentAssembler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: K, data: &[u8]) {
        self.pending.entry(key).or_default().extend_from_slice(data);
    }

    /// Appends the final chunk and hands back the whole payload. An empty
    /// final chunk for a stream with no fragments yields `None`.
    pub fn finish(&mut self, key: K, data: &[u8]) -> Option<Vec<u8>> {
        match self.pending.remove(&key) {
            Some(mut buffer) => {
                buffer.extend_from_slice(data);
                Some(buffer)
            }
            None if data.is_empty() => None,
            None => Some(data.to_vec()),
        }
    }

    pub fn contains(&self, key: K) -> bool {
        self.pending.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Inflates a zlib stream. A length differing from `expected_len` is logged
/// but not rejected.
pub fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::with_capacity(expected_len);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(DecodeError::Decompress)?;
    if out.len() != expected_len {
        log::warn!(
            "Decompressed length {:#x} differs from declared {:#x}",
            out.len(),
            expected_len
        );
    }
    Ok(out)
}

pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Turns whole, compressed and fragmented snapshot commands into complete
/// snapshot buffers.
#[derive(Debug, Default)]
pub struct SnapshotAssembler {
    fragments: FragmentAssembler<u32>,
}

impl SnapshotAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_frames(&self) -> usize {
        self.fragments.len()
    }

    pub fn reset(&mut self) {
        self.fragments.clear();
    }

    /// Consumes the body of one snapshot command. Returns the complete
    /// snapshot once one is available.
    pub fn handle(&mut self, cmd: ServerCmd, payload: &mut ByteCursor) -> Result<Option<Vec<u8>>, DecodeError> {
        match cmd {
            ServerCmd::Snapshot => {
                let len = payload.read_u32()? as usize;
                Ok(Some(payload.read_bytes(len)?.to_vec()))
            }
            ServerCmd::CompressedSnapshot => {
                let len = payload.read_u32()? as usize;
                let decompressed_len = payload.read_u32()? as usize;
                let data = payload.read_bytes(len)?;
                decompress(data, decompressed_len).map(Some)
            }
            ServerCmd::SnapshotFragment => {
                let frame = payload.read_u32()?;
                let _snapshot_id = payload.read_u8()?;
                let data = payload.remaining_slice().to_vec();
                payload.skip_remaining();
                self.fragments.push(frame, &data);
                Ok(None)
            }
            ServerCmd::SnapshotTerminate => {
                let frame = payload.read_u32()?;
                let _snapshot_id = payload.read_u8()?;
                let len = payload.read_u16()? as usize;
                let data = payload.read_bytes(len)?.to_vec();
                match self.fragments.finish(frame, &data) {
                    Some(snapshot) => Ok(Some(snapshot)),
                    None => {
                        log::warn!("Empty snapshot terminator for unknown frame {}", frame);
                        Ok(None)
                    }
                }
            }
            ServerCmd::CompressedSnapshotTerminate => {
                let frame = payload.read_u32()?;
                let _snapshot_id = payload.read_u8()?;
                let len = payload.read_u16()? as usize;
                let decompressed_len = payload.read_u32()? as usize;
                let data = payload.read_bytes(len)?.to_vec();
                match self.fragments.finish(frame, &data) {
                    Some(compressed) => decompress(&compressed, decompressed_len).map(Some),
                    None => {
                        log::warn!("Empty compressed terminator for unknown frame {}", frame);
                        Ok(None)
                    }
                }
            }
            other => {
                log::warn!("{:?} is not a snapshot command", other);
                Ok(None)
            }
        }
    }
}

/// Result of parsing one complete snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub header: SnapshotHeader,
    /// False when the snapshot was dropped after its header.
    pub applied: bool,
    pub records: usize,
    pub errors: usize,
}

/// Parses a complete snapshot and applies its entity records to `world`.
///
/// The snapshot is dropped after the header when its state-string sequence
/// differs from `state_sequence`. A record that fails to decode ends the
/// record loop, since the next record boundary is unknown.
pub fn read_snapshot(data: &[u8], world: &mut World, state_sequence: u8) -> Result<SnapshotSummary, DecodeError> {
    let mut cursor = ByteCursor::from_slice(data);
    let mut header = SnapshotHeader::read(&mut cursor)?;
    let mut summary = SnapshotSummary {
        header: SnapshotHeader::default(),
        applied: false,
        records: 0,
        errors: 0,
    };

    if header.state_sequence != state_sequence {
        log::info!(
            "Dropping desynced snapshot {} (server seq {} != client seq {})",
            header.frame,
            header.state_sequence,
            state_sequence
        );
        summary.header = header;
        return Ok(summary);
    }

    header.read_events(&mut cursor)?;
    if !header.events.is_empty() {
        log::debug!("Snapshot {} carries {} game events", header.frame, header.events.len());
    }

    while !cursor.is_at_end() {
        let start = cursor.position();
        match world.apply_entity_record(&mut cursor) {
            Ok(_) => summary.records += 1,
            Err(e) => {
                log::warn!(
                    "Snapshot {}: {}, skipping {} bytes\n{}",
                    header.frame,
                    e,
                    data.len() - start,
                    hexdump(&data[start..])
                );
                summary.errors += 1;
                cursor.skip_remaining();
            }
        }
    }

    summary.header = header;
    summary.applied = true;
    Ok(summary)
}
