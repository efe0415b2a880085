use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("read of {requested} bytes at offset {offset} overruns buffer of {len} bytes")]
pub struct OutOfBounds {
    pub offset: usize,
    pub requested: usize,
    pub len: usize,
}

/// Fixed-width values with a little-endian wire representation.
pub trait WireValue: Sized + Copy {
    const SIZE: usize;

    fn from_le_slice(bytes: &[u8]) -> Self;
    fn from_be_slice(bytes: &[u8]) -> Self;
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_wire_value {
    ($($ty:ty),*) => {
        $(
            impl WireValue for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(raw)
                }

                #[inline]
                fn from_be_slice(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_be_bytes(raw)
                }

                #[inline]
                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_wire_value!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Sequential reader/writer over an owned, growable byte buffer.
///
/// Reads never move past the end of the buffer: a short read returns
/// [`OutOfBounds`] and leaves the position untouched. Writes always append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteCursor {
    data: Vec<u8>,
    pos: usize,
}

impl ByteCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            pos: 0,
        }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Skips everything left in the buffer and returns how many bytes were dropped.
    pub fn skip_remaining(&mut self) -> usize {
        let skipped = self.remaining();
        self.pos = self.data.len();
        skipped
    }

    pub fn advance(&mut self, count: usize) -> Result<(), OutOfBounds> {
        self.check(count)?;
        self.pos += count;
        Ok(())
    }

    fn check(&self, requested: usize) -> Result<(), OutOfBounds> {
        if requested > self.remaining() {
            return Err(OutOfBounds {
                offset: self.pos,
                requested,
                len: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&[u8], OutOfBounds> {
        self.check(count)?;
        let start = self.pos;
        self.pos += count;
        Ok(&self.data[start..self.pos])
    }

    pub fn read<T: WireValue>(&mut self) -> Result<T, OutOfBounds> {
        self.read_bytes(T::SIZE).map(T::from_le_slice)
    }

    /// Big-endian read, only used where the wire carries magic numbers.
    pub fn read_be<T: WireValue>(&mut self) -> Result<T, OutOfBounds> {
        self.read_bytes(T::SIZE).map(T::from_be_slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, OutOfBounds> {
        self.read()
    }

    pub fn read_u16(&mut self) -> Result<u16, OutOfBounds> {
        self.read()
    }

    pub fn read_u32(&mut self) -> Result<u32, OutOfBounds> {
        self.read()
    }

    pub fn read_u64(&mut self) -> Result<u64, OutOfBounds> {
        self.read()
    }

    pub fn read_i32(&mut self) -> Result<i32, OutOfBounds> {
        self.read()
    }

    pub fn read_f32(&mut self) -> Result<f32, OutOfBounds> {
        self.read()
    }

    pub fn read_u32_be(&mut self) -> Result<u32, OutOfBounds> {
        self.read_be()
    }

    pub fn read_vec3(&mut self) -> Result<Vec3, OutOfBounds> {
        let start = self.pos;
        let x = self.read_f32();
        let y = self.read_f32();
        match (x, y, self.read_f32()) {
            (Ok(x), Ok(y), Ok(z)) => Ok(Vec3::new(x, y, z)),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// Reads a zero-terminated string. The terminator is consumed but not returned.
    /// A string that runs to the end of the buffer without a terminator is an error.
    pub fn read_string(&mut self) -> Result<String, OutOfBounds> {
        let rest = self.remaining_slice();
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(OutOfBounds {
                offset: self.pos,
                requested: rest.len() + 1,
                len: self.data.len(),
            });
        };
        let text = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.pos += nul + 1;
        Ok(text)
    }

    /// Reads exactly `len` bytes and returns the text up to the first zero byte.
    pub fn read_fixed_string(&mut self, len: usize) -> Result<String, OutOfBounds> {
        let raw = self.read_bytes(len)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
    }

    pub fn write<T: WireValue>(&mut self, value: T) {
        value.write_le(&mut self.data);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write(value);
    }

    pub fn write_vec3(&mut self, value: Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn write_string(&mut self, text: &str) {
        self.data.extend_from_slice(text.as_bytes());
        self.data.push(0);
    }
}

impl From<Vec<u8>> for ByteCursor {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}
