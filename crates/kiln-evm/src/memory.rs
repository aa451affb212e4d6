//! Byte-addressable machine memory

use kiln_primitives::Word;

/// Machine memory. Grows in 32-byte words, new bytes are zero.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create new empty memory
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes (always a multiple of 32)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been touched yet
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Grow to cover `offset..offset + len`, rounded up to a word boundary.
    /// A zero `len` never grows. Returns the resulting size.
    ///
    /// Callers charge expansion gas first; see [`crate::gas::memory_expansion_gas`].
    pub fn resize(&mut self, offset: usize, len: usize) -> usize {
        if len == 0 {
            return self.data.len();
        }

        let end = offset.saturating_add(len);
        if end > self.data.len() {
            let aligned = end.div_ceil(32) * 32;
            self.data.resize(aligned, 0);
        }
        self.data.len()
    }

    /// Read `len` bytes at `offset`, growing memory to cover them
    pub fn load(&mut self, offset: usize, len: usize) -> Vec<u8> {
        if len == 0 {
            return Vec::new();
        }
        self.resize(offset, len);
        self.data[offset..offset + len].to_vec()
    }

    /// Write `bytes` at `offset`, growing memory to cover them
    pub fn store(&mut self, offset: usize, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.resize(offset, bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// Read a 32-byte big-endian word
    pub fn load_word(&mut self, offset: usize) -> Word {
        self.resize(offset, Word::BYTES);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.data[offset..offset + Word::BYTES]);
        Word::from_be_bytes(bytes)
    }

    /// Write a 32-byte big-endian word
    pub fn store_word(&mut self, offset: usize, value: Word) {
        self.store(offset, &value.to_be_bytes());
    }

    /// Write a single byte
    pub fn store_byte(&mut self, offset: usize, value: u8) {
        self.store(offset, &[value]);
    }

    /// Raw contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
