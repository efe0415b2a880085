use std::collections::BTreeMap;

use crate::error::DecodeError;
use crate::net::{ByteCursor, ServerCmd, VAR_SEPARATOR};
use crate::snapshot::{FragmentAssembler, decompress};

pub type VarSet = BTreeMap<String, String>;

/// Splits a `key 0xFF value 0xFF ...` blob into pairs. A trailing value
/// without its terminator is dropped.
pub fn parse_var_blob(data: &[u8]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut key = Vec::new();
    let mut value = Vec::new();
    let mut reading_value = false;

    for &byte in data {
        if byte == VAR_SEPARATOR {
            if reading_value {
                pairs.push((
                    String::from_utf8_lossy(&key).into_owned(),
                    String::from_utf8_lossy(&value).into_owned(),
                ));
                key.clear();
                value.clear();
            }
            reading_value = !reading_value;
        } else if reading_value {
            value.push(byte);
        } else {
            key.push(byte);
        }
    }
    pairs
}

pub fn encode_var_blob<'a>(vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> Vec<u8> {
    let mut blob = Vec::new();
    for (key, value) in vars {
        blob.extend_from_slice(key.as_bytes());
        blob.push(VAR_SEPARATOR);
        blob.extend_from_slice(value.as_bytes());
        blob.push(VAR_SEPARATOR);
    }
    blob
}

/// Server variable sets and the sequence counter that snapshots are checked
/// against.
#[derive(Debug, Default)]
pub struct StateStrings {
    sets: BTreeMap<u16, VarSet>,
    sequence: u8,
    fragments: FragmentAssembler<u16>,
}

impl StateStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of complete updates received, modulo 256.
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    pub fn set(&self, id: u16) -> Option<&VarSet> {
        self.sets.get(&id)
    }

    pub fn get(&self, id: u16, key: &str) -> Option<&str> {
        self.sets.get(&id)?.get(key).map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.sets.clear();
        self.sequence = 0;
        self.fragments.clear();
    }

    pub fn clear_fragments(&mut self) {
        self.fragments.clear();
    }

    fn apply(&mut self, id: u16, data: &[u8]) -> usize {
        let pairs = parse_var_blob(data);
        let count = pairs.len();
        self.sets.entry(id).or_default().extend(pairs);
        log::debug!("Updated {} state strings in set {}", count, id);
        count
    }

    fn complete(&mut self) {
        self.sequence = self.sequence.wrapping_add(1);
        log::debug!("State string sequence now {}", self.sequence);
    }

    /// Consumes the body of one state-string command. Returns whether a
    /// complete update was received. The sequence advances on every complete
    /// update, including ones that fail to decompress.
    pub fn handle(&mut self, cmd: ServerCmd, payload: &mut ByteCursor) -> Result<bool, DecodeError> {
        match cmd {
            ServerCmd::StateReset => {
                log::info!("Clearing server state strings");
                self.reset();
                Ok(false)
            }
            ServerCmd::StateUpdate => {
                let id = payload.read_u16()?;
                let len = payload.read_u32()? as usize;
                let data = payload.read_bytes(len)?.to_vec();
                self.apply(id, &data);
                self.complete();
                Ok(true)
            }
            ServerCmd::CompressedStateUpdate => {
                let id = payload.read_u16()?;
                let len = payload.read_u32()? as usize;
                let decompressed_len = payload.read_u32()? as usize;
                let data = payload.read_bytes(len)?.to_vec();
                let result = decompress(&data, decompressed_len);
                self.complete();
                self.apply(id, &result?);
                Ok(true)
            }
            ServerCmd::StateFragment => {
                let id = payload.read_u16()?;
                let len = payload.read_u16()? as usize;
                let data = payload.read_bytes(len)?.to_vec();
                self.fragments.push(id, &data);
                Ok(false)
            }
            ServerCmd::StateTerminate => {
                let id = payload.read_u16()?;
                let len = payload.read_u16()? as usize;
                let data = payload.read_bytes(len)?.to_vec();
                let whole = self.fragments.finish(id, &data).unwrap_or_default();
                self.apply(id, &whole);
                self.complete();
                Ok(true)
            }
            ServerCmd::CompressedStateTerminate => {
                let id = payload.read_u16()?;
                let len = payload.read_u16()? as usize;
                let decompressed_len = payload.read_u32()? as usize;
                let data = payload.read_bytes(len)?.to_vec();
                let whole = self.fragments.finish(id, &data).unwrap_or_default();
                let result = decompress(&whole, decompressed_len);
                self.complete();
                self.apply(id, &result?);
                Ok(true)
            }
            other => {
                log::warn!("{:?} is not a state string command", other);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::compress;

    fn blob(pairs: &[(&str, &str)]) -> Vec<u8> {
        encode_var_blob(pairs.iter().copied())
    }

    #[test]
    fn parse_pairs() {
        let data = blob(&[("svr_gameFPS", "20"), ("svr_name", "Newerth"), ("empty", "")]);
        assert_eq!(
            parse_var_blob(&data),
            vec![
                ("svr_gameFPS".to_string(), "20".to_string()),
                ("svr_name".to_string(), "Newerth".to_string()),
                ("empty".to_string(), String::new()),
            ]
        );

        let mut unterminated = blob(&[("a", "1")]);
        unterminated.extend_from_slice(b"b\xFF2");
        assert_eq!(parse_var_blob(&unterminated).len(), 1);
    }

    #[test]
    fn update_increments_sequence() {
        let mut strings = StateStrings::new();
        let data = blob(&[("svr_gameFPS", "20")]);
        let mut cmd = ByteCursor::new();
        cmd.write_u16(1);
        cmd.write_u32(data.len() as u32);
        cmd.write_bytes(&data);
        cmd.seek(0);

        assert!(strings.handle(ServerCmd::StateUpdate, &mut cmd).unwrap());
        assert_eq!(strings.sequence(), 1);
        assert_eq!(strings.get(1, "svr_gameFPS"), Some("20"));
        assert!(cmd.is_at_end());

        let mut reset = ByteCursor::new();
        assert!(!strings.handle(ServerCmd::StateReset, &mut reset).unwrap());
        assert_eq!(strings.sequence(), 0);
        assert!(strings.set(1).is_none());
    }

    #[test]
    fn fragments_then_terminate() {
        let mut strings = StateStrings::new();
        let data = blob(&[("svr_maxClients", "64"), ("svr_gameFPS", "25")]);
        let (first, last) = data.split_at(10);

        let mut fragment = ByteCursor::new();
        fragment.write_u16(2);
        fragment.write_u16(first.len() as u16);
        fragment.write_bytes(first);
        fragment.seek(0);
        assert!(!strings.handle(ServerCmd::StateFragment, &mut fragment).unwrap());
        assert_eq!(strings.sequence(), 0);

        let mut terminate = ByteCursor::new();
        terminate.write_u16(2);
        terminate.write_u16(last.len() as u16);
        terminate.write_bytes(last);
        terminate.seek(0);
        assert!(strings.handle(ServerCmd::StateTerminate, &mut terminate).unwrap());
        assert_eq!(strings.sequence(), 1);
        assert_eq!(strings.get(2, "svr_maxClients"), Some("64"));
        assert_eq!(strings.get(2, "svr_gameFPS"), Some("25"));
    }

    #[test]
    fn compressed_update_and_terminate() {
        let mut strings = StateStrings::new();
        let data = blob(&[("svr_gameFPS", "20")]);
        let packed = compress(&data).unwrap();

        let mut cmd = ByteCursor::new();
        cmd.write_u16(1);
        cmd.write_u32(packed.len() as u32);
        cmd.write_u32(data.len() as u32);
        cmd.write_bytes(&packed);
        cmd.seek(0);
        assert!(strings.handle(ServerCmd::CompressedStateUpdate, &mut cmd).unwrap());
        assert_eq!(strings.get(1, "svr_gameFPS"), Some("20"));

        let data = blob(&[("svr_name", "Lair")]);
        let packed = compress(&data).unwrap();
        let (first, last) = packed.split_at(3);
        let mut fragment = ByteCursor::new();
        fragment.write_u16(3);
        fragment.write_u16(first.len() as u16);
        fragment.write_bytes(first);
        fragment.seek(0);
        strings.handle(ServerCmd::StateFragment, &mut fragment).unwrap();

        let mut terminate = ByteCursor::new();
        terminate.write_u16(3);
        terminate.write_u16(last.len() as u16);
        terminate.write_u32(data.len() as u32);
        terminate.write_bytes(last);
        terminate.seek(0);
        assert!(strings.handle(ServerCmd::CompressedStateTerminate, &mut terminate).unwrap());
        assert_eq!(strings.get(3, "svr_name"), Some("Lair"));
        assert_eq!(strings.sequence(), 2);
    }

    #[test]
    fn failed_decompress_still_counts() {
        let mut strings = StateStrings::new();
        let mut cmd = ByteCursor::new();
        cmd.write_u16(1);
        cmd.write_u32(4);
        cmd.write_u32(16);
        cmd.write_bytes(&[9, 9, 9, 9]);
        cmd.seek(0);
        assert!(matches!(
            strings.handle(ServerCmd::CompressedStateUpdate, &mut cmd),
            Err(DecodeError::Decompress(_))
        ));
        assert_eq!(strings.sequence(), 1);
        assert!(cmd.is_at_end());
    }
}
