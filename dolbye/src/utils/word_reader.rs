//! Container-word bitstream reader.
//!
//! Dolby E interface streams carry 16-, 20- or 24-bit payload words
//! left-justified in 32-bit container words. This reader owns the input
//! source, buffers one frame's worth of container words at a time, and
//! unpacks arbitrary-width fields across payload-word boundaries. It also
//! provides the two primitives the frame grammar depends on: in-buffer XOR
//! descrambling of keyed segments, and three "remaining bits" down-counters
//! that every consumption operation decrements.

use std::io::{self, Read, Seek, SeekFrom};

use crate::utils::errors::BitError;

/// Bytes per container word in the interface stream.
pub const CONTAINER_BYTES: usize = 4;

/// Bits per container word.
pub const CONTAINER_BITS: u32 = (CONTAINER_BYTES * 8) as u32;

/// Widest payload word size carried in a container word.
pub const MAX_PAYLOAD_BITS: u32 = 24;

/// Number of independent down-counters.
pub const DOWN_COUNTERS: usize = 3;

const DATA_BUF_WORDS: usize = 4096;

/// Left-justified mask covering the top `bits` bits of a container word.
#[inline]
fn lj_mask(bits: u32) -> u32 {
    if bits == 0 { 0 } else { u32::MAX << (CONTAINER_BITS - bits) }
}

pub struct WordReader<R> {
    src: R,
    payload_bits: Option<u32>,
    buf: Box<[u32; DATA_BUF_WORDS]>,
    word: usize,
    bit: u32,
    bits_left: u64,
    counters: [i64; DOWN_COUNTERS],
}

impl<R: Read> WordReader<R> {
    pub fn new(src: R) -> Self {
        Self {
            src,
            payload_bits: None,
            buf: Box::new([0; DATA_BUF_WORDS]),
            word: 0,
            bit: 0,
            bits_left: 0,
            counters: [0; DOWN_COUNTERS],
        }
    }

    /// Selects the payload word size for subsequent refills, discarding any
    /// buffered payload and disarming the down-counters.
    pub fn init_stream(&mut self, payload_bits: u32) -> Result<(), BitError> {
        debug_assert!(matches!(payload_bits, 16 | 20 | 24));

        self.payload_bits = Some(payload_bits);
        self.bits_left = 0;
        self.counters = [0; DOWN_COUNTERS];

        Ok(())
    }

    /// Reads `n_words` container words from the source into the buffer.
    ///
    /// The previous buffer contents must be fully consumed (or discarded via
    /// [`Self::init_stream`]) first.
    pub fn refill(&mut self, n_words: usize) -> Result<(), BitError> {
        let payload = self.payload_bits.ok_or(BitError::NotInitialized)?;

        if self.bits_left != 0 {
            return Err(BitError::Overwrite(self.bits_left));
        }
        if n_words > DATA_BUF_WORDS {
            return Err(BitError::FrameTooLarge(n_words));
        }

        let mut bytes = [0u8; CONTAINER_BYTES];
        for slot in self.buf.iter_mut().take(n_words) {
            self.src.read_exact(&mut bytes).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    BitError::Eof
                } else {
                    BitError::Read(e)
                }
            })?;
            *slot = u32::from_ne_bytes(bytes);
        }

        self.bits_left = n_words as u64 * payload as u64;
        self.word = 0;
        self.bit = 0;

        Ok(())
    }

    /// Unread payload bits remaining in the buffer.
    pub fn bits_left(&self) -> u64 {
        self.bits_left
    }

    /// Unpacks one right-justified field of `bits` bits.
    pub fn read(&mut self, bits: u32) -> Result<u32, BitError> {
        let payload = self.payload_bits.ok_or(BitError::NotInitialized)?;

        if self.bits_left < bits as u64 {
            return Err(BitError::Underflow {
                needed: bits as u64,
                available: self.bits_left,
            });
        }

        let value = self.unpack_one(bits, payload);
        self.consume(bits as u64)?;

        Ok(value)
    }

    /// Unpacks `out.len()` right-justified fields of `bits` bits each.
    pub fn read_into(&mut self, out: &mut [u32], bits: u32) -> Result<(), BitError> {
        let payload = self.payload_bits.ok_or(BitError::NotInitialized)?;

        let needed = out.len() as u64 * bits as u64;
        if self.bits_left < needed {
            return Err(BitError::Underflow {
                needed,
                available: self.bits_left,
            });
        }

        for slot in out.iter_mut() {
            *slot = self.unpack_one(bits, payload);
        }
        self.consume(needed)?;

        Ok(())
    }

    /// Advances the cursor past `n_bits` without unpacking them.
    pub fn skip(&mut self, n_bits: u32) -> Result<(), BitError> {
        let payload = self.payload_bits.ok_or(BitError::NotInitialized)?;

        if self.bits_left < n_bits as u64 {
            return Err(BitError::Underflow {
                needed: n_bits as u64,
                available: self.bits_left,
            });
        }

        self.bit += n_bits;
        while self.bit >= payload {
            self.bit -= payload;
            self.word += 1;
        }
        self.consume(n_bits as u64)?;

        Ok(())
    }

    /// XORs `key`, shifted up to the payload position, into the next
    /// `n_words` buffered container words.
    ///
    /// The region starts at the word under the cursor, or at the following
    /// word when the cursor sits partway into one. Descrambling mutates the
    /// buffer only; the cursor and the counters are unaffected.
    pub fn unkey(&mut self, key: u32, n_words: usize) -> Result<(), BitError> {
        let payload = self.payload_bits.ok_or(BitError::NotInitialized)?;

        if self.bits_left < n_words as u64 * payload as u64 {
            return Err(BitError::Underflow {
                needed: n_words as u64 * payload as u64,
                available: self.bits_left,
            });
        }

        let shifted = key << (CONTAINER_BITS - payload);
        let start = if self.bit != 0 { self.word + 1 } else { self.word };
        let region = self
            .buf
            .get_mut(start..start + n_words)
            .ok_or(BitError::FrameTooLarge(start + n_words))?;

        for word in region {
            *word ^= shifted;
        }

        Ok(())
    }

    /// Sets down-counter `k` to `bits`.
    pub fn set_counter(&mut self, k: usize, bits: i64) -> Result<(), BitError> {
        *self
            .counters
            .get_mut(k)
            .ok_or(BitError::InvalidCounter(k))? = bits;

        Ok(())
    }

    /// Current value of down-counter `k`.
    pub fn counter(&self, k: usize) -> Result<i64, BitError> {
        self.counters.get(k).copied().ok_or(BitError::InvalidCounter(k))
    }

    fn unpack_one(&mut self, bits: u32, payload: u32) -> u32 {
        let mut data = ((self.buf[self.word] & lj_mask(payload)) << self.bit) & lj_mask(bits);

        self.bit += bits;
        while self.bit >= payload {
            self.bit -= payload;
            self.word += 1;
            let next = self.buf.get(self.word).copied().unwrap_or(0);
            data |= (next >> (bits - self.bit)) & lj_mask(bits);
        }

        data >> (CONTAINER_BITS - bits)
    }

    /// Books `n_bits` consumed: the buffer level drops and every active
    /// down-counter drops with it. A counter pinned at zero is inactive.
    fn consume(&mut self, n_bits: u64) -> Result<(), BitError> {
        self.bits_left -= n_bits;

        for (k, counter) in self.counters.iter_mut().enumerate() {
            if *counter != 0 {
                *counter -= n_bits as i64;
                if *counter < 0 {
                    return Err(BitError::CounterUnderflow(k));
                }
            }
        }

        Ok(())
    }
}

impl<R: Read + Seek> WordReader<R> {
    /// Byte offset of the source, independent of buffered payload.
    pub fn stream_position(&mut self) -> Result<u64, BitError> {
        self.src.stream_position().map_err(BitError::Read)
    }

    /// Repositions the source and discards any buffered payload.
    pub fn seek_to(&mut self, pos: u64) -> Result<(), BitError> {
        self.src
            .seek(SeekFrom::Start(pos))
            .map_err(BitError::Read)?;
        self.bits_left = 0;

        Ok(())
    }

    pub fn rewind(&mut self) -> Result<(), BitError> {
        self.seek_to(0)
    }
}
