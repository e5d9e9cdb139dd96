//! Little-endian byte cursor used by the save format.

/// Growable little-endian writer.
#[derive(Debug, Default)]
pub(crate) struct SaveWriter {
    buffer: Vec<u8>,
}

impl SaveWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    #[inline]
    pub(crate) fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Reserves `len` zeroed bytes and returns them for in-place writing.
    pub(crate) fn reserve_slice(&mut self, len: usize) -> &mut [u8] {
        let start = self.buffer.len();
        self.buffer.resize(start + len, 0);
        &mut self.buffer[start..]
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

/// Borrowing little-endian reader. Every read returns `None` once the
/// input runs out.
#[derive(Debug)]
pub(crate) struct SaveReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> SaveReader<'a> {
    pub(crate) const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    pub(crate) const fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            return None;
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Some(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.read_bytes(N)?.try_into().ok()
    }

    #[inline]
    pub(crate) fn read_u8(&mut self) -> Option<u8> {
        self.read_array::<1>().map(|b| b[0])
    }

    #[inline]
    pub(crate) fn read_u16(&mut self) -> Option<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    #[inline]
    pub(crate) fn read_u32(&mut self) -> Option<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    #[inline]
    pub(crate) fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    #[inline]
    pub(crate) fn read_f32(&mut self) -> Option<f32> {
        self.read_array().map(f32::from_le_bytes)
    }
}
