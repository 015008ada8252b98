//! SMPTE-337-style preamble scan.
//!
//! Frames are delimited on the interface by a two-word sync pair, a
//! burst-info word and a payload-length word. The scan slides over the
//! stream one container word at a time, testing the window against all
//! three payload word sizes until a credible preamble lines up, then loads
//! the whole frame payload at the discovered word size.

use std::io::Read;

use anyhow::{Result, bail};

use crate::structs::config::BitDepth;
use crate::utils::errors::PreambleError;
use crate::utils::word_reader::{MAX_PAYLOAD_BITS, WordReader};

const PREAMBLE_WORDS: usize = 4;

/// Burst-info fields in 24-bit right-justified container space.
const STREAM_NUMBER_MASK: u32 = 0x0E0_0000;
const ERROR_FLAG_MASK: u32 = 0x000_8000;
const DATA_MODE_MASK: u32 = 0x000_6000;
const DATA_TYPE_MASK: u32 = 0x000_1F00;
const DATA_TYPE_DOLBY_E: u32 = 0x000_1C00;

/// A located frame preamble.
///
/// On success the reader holds the complete frame payload, re-aligned to
/// the discovered payload word size, ready for the frame parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    pub bit_depth: BitDepth,
    /// Frame payload length in payload words.
    pub frame_words: usize,
}

impl Preamble {
    pub fn locate<R: Read>(reader: &mut WordReader<R>) -> Result<Self> {
        reader.init_stream(MAX_PAYLOAD_BITS)?;
        reader.refill(PREAMBLE_WORDS)?;

        let mut window = [0u32; PREAMBLE_WORDS];
        reader.read_into(&mut window, MAX_PAYLOAD_BITS)?;

        loop {
            for depth in BitDepth::ALL {
                if window[0] & depth.sync_mask() != depth.preamble_sync_a()
                    || window[1] & depth.sync_mask() != depth.preamble_sync_b()
                {
                    continue;
                }

                if window[2] & DATA_TYPE_MASK != DATA_TYPE_DOLBY_E {
                    log::warn!("Preamble data type is not Dolby E");
                } else if window[2] & DATA_MODE_MASK != depth.preamble_mode() {
                    log::warn!("Inconsistent preamble data mode");
                } else if window[2] & ERROR_FLAG_MASK != 0 {
                    log::warn!("Preamble error flag is set");
                } else if window[2] & STREAM_NUMBER_MASK != 0 {
                    log::warn!("Only stream #0 is supported");
                } else {
                    let payload_bits = window[3] >> (MAX_PAYLOAD_BITS - depth.bits());
                    if payload_bits % depth.bits() != 0 {
                        bail!(PreambleError::InconsistentPayloadSize {
                            bits: payload_bits,
                            depth: depth.bits(),
                        });
                    }

                    let frame_words = (payload_bits / depth.bits()) as usize;
                    reader.init_stream(depth.bits())?;
                    reader.refill(frame_words)?;

                    return Ok(Self {
                        bit_depth: depth,
                        frame_words,
                    });
                }
            }

            window.rotate_left(1);
            reader.refill(1)?;
            window[PREAMBLE_WORDS - 1] = reader.read(MAX_PAYLOAD_BITS)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::testkit::FrameBuilder;
    use crate::utils::errors::BitError;

    fn locate(bytes: &[u8]) -> Result<Preamble> {
        let mut reader = WordReader::new(Cursor::new(bytes.to_vec()));
        Preamble::locate(&mut reader)
    }

    #[test]
    fn finds_preamble_at_stream_start() {
        for depth in BitDepth::ALL {
            let bytes = FrameBuilder::new(depth, 11, 5).build();
            let preamble = locate(&bytes).unwrap();
            assert_eq!(preamble.bit_depth, depth);
            assert!(preamble.frame_words > 0);
        }
    }

    #[test]
    fn resynchronizes_past_leading_garbage() {
        // Deterministic junk that cannot contain a sync pair, followed by
        // a valid frame at container-word offset 17.
        let mut bytes = Vec::new();
        for i in 0..17u32 {
            bytes.extend_from_slice(&(0x0101_0100u32.wrapping_mul(i + 1)).to_ne_bytes());
        }
        let frame = FrameBuilder::new(BitDepth::Bits16, 11, 5).build();
        bytes.extend_from_slice(&frame);

        let direct = locate(&frame).unwrap();
        let resynced = locate(&bytes).unwrap();
        assert_eq!(direct, resynced);
    }

    #[test]
    fn truncated_preamble_reports_eof() {
        // A sync pair with no room left for burst info and length.
        let bytes = FrameBuilder::new(BitDepth::Bits16, 11, 5).build();
        let err = locate(&bytes[..12]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BitError>(),
            Some(BitError::Eof)
        ));
    }

    #[test]
    fn junk_only_stream_reports_eof() {
        let bytes: Vec<u8> = (0..64u32)
            .flat_map(|i| (i.wrapping_mul(0x01010101)).to_ne_bytes())
            .collect();
        let err = locate(&bytes).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BitError>(),
            Some(BitError::Eof)
        ));
    }

    #[test]
    fn rejects_payload_length_not_divisible_by_word_size() {
        let mut bytes = FrameBuilder::new(BitDepth::Bits16, 11, 5).build();
        // Corrupt the length word (fourth container word): 100 bits is not
        // a multiple of 16.
        let length = (100u32 << 16).to_ne_bytes();
        bytes[12..16].copy_from_slice(&length);

        let err = locate(&bytes).unwrap_err();
        assert!(
            err.downcast_ref::<PreambleError>()
                .is_some_and(|e| matches!(e, PreambleError::InconsistentPayloadSize { .. }))
        );
    }
}
