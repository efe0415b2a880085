//! Presence bits for a field list, packed as a pruned binary tree.
//!
//! With `P` the smallest power of two not below the field count, lists of up
//! to eight fields are sent as one raw byte. Longer lists walk a complete tree
//! of `P` leaves top-down: node 1 is the root, node `i` has children `2i` and
//! `2i + 1`, and leaf `k` is node `P + k`. A set node announces its children
//! with `0` for (1,0), `10` for (0,1) and `11` for (1,1). Unset nodes emit
//! nothing. Bits are packed least significant first.

use crate::net::{ByteCursor, OutOfBounds};

/// Which of `len` fields are present in an update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceBits {
    bits: Vec<bool>,
}

impl PresenceBits {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    pub fn from_bools(bits: &[bool]) -> Self {
        Self {
            bits: bits.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit = value;
        }
    }

    pub fn count_set(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}

fn leaf_span(len: usize) -> usize {
    len.max(1).next_power_of_two()
}

struct BitWriter {
    bytes: Vec<u8>,
    count: usize,
}

impl BitWriter {
    fn push(&mut self, bit: bool) {
        if self.count % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 1 << (self.count % 8);
            }
        }
        self.count += 1;
    }
}

struct BitReader<'a> {
    cursor: &'a mut ByteCursor,
    current: u8,
    count: usize,
}

impl BitReader<'_> {
    fn next(&mut self) -> Result<bool, OutOfBounds> {
        if self.count % 8 == 0 {
            self.current = self.cursor.read_u8()?;
        }
        let bit = self.current & (1 << (self.count % 8)) != 0;
        self.count += 1;
        Ok(bit)
    }
}

/// Encodes `bits` in the tree format. An empty list encodes to nothing.
pub fn encode(bits: &PresenceBits) -> Vec<u8> {
    let len = bits.len();
    if len == 0 {
        return Vec::new();
    }

    let span = leaf_span(len);
    if span <= 8 {
        let byte = bits
            .iter_set()
            .fold(0u8, |acc, i| acc | (1 << i));
        return vec![byte];
    }

    let mut tree = vec![false; 2 * span];
    for leaf in bits.iter_set() {
        let mut node = span + leaf;
        while node >= 1 && !tree[node] {
            tree[node] = true;
            node >>= 1;
        }
    }

    if !tree[1] {
        return vec![0];
    }

    let mut out = BitWriter {
        bytes: Vec::new(),
        count: 0,
    };
    out.push(true);
    for node in 1..span {
        if !tree[node] {
            continue;
        }
        match (tree[2 * node], tree[2 * node + 1]) {
            (true, false) => out.push(false),
            (false, true) => {
                out.push(true);
                out.push(false);
            }
            (true, true) => {
                out.push(true);
                out.push(true);
            }
            (false, false) => unreachable!("set node without set children"),
        }
    }
    out.bytes
}

pub fn encode_into(bits: &PresenceBits, cursor: &mut ByteCursor) {
    cursor.write_bytes(&encode(bits));
}

/// Decodes presence bits for `len` fields. Consumes nothing when `len` is zero.
pub fn decode(len: usize, cursor: &mut ByteCursor) -> Result<PresenceBits, OutOfBounds> {
    let mut bits = PresenceBits::new(len);
    if len == 0 {
        return Ok(bits);
    }

    let span = leaf_span(len);
    if span <= 8 {
        let byte = cursor.read_u8()?;
        for i in 0..len {
            bits.set(i, byte & (1 << i) != 0);
        }
        return Ok(bits);
    }

    let mut input = BitReader {
        cursor,
        current: 0,
        count: 0,
    };
    if !input.next()? {
        return Ok(bits);
    }

    let mut tree = vec![false; 2 * span];
    tree[1] = true;
    for node in 1..span {
        if !tree[node] {
            continue;
        }
        let (left, right) = if !input.next()? {
            (true, false)
        } else if input.next()? {
            (true, true)
        } else {
            (false, true)
        };
        tree[2 * node] = left;
        tree[2 * node + 1] = right;
    }

    for i in 0..len {
        bits.set(i, tree[span + i]);
    }
    Ok(bits)
}
