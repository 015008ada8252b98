//! Frame sync segment.

use std::io::Read;

use anyhow::{Result, bail};

use crate::structs::config::BitDepth;
use crate::utils::errors::SyncError;
use crate::utils::word_reader::WordReader;

/// Sync segment: the frame sync word with its key-present bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSegment {
    /// Full sync word as stored in the stream, key bit included.
    pub sync_word: u32,
    /// When set, every following segment opens with a key word and is
    /// XOR-scrambled with it.
    pub key_present: bool,
}

impl SyncSegment {
    pub(crate) fn read<R: Read>(reader: &mut WordReader<R>, depth: BitDepth) -> Result<Self> {
        let sync_word = reader.read(depth.bits() - 1)? << 1;
        if sync_word != depth.frame_sync_word() {
            bail!(SyncError::BadSync {
                read: sync_word,
                expected: depth.frame_sync_word(),
            });
        }

        let key_present = reader.read(1)? != 0;

        Ok(Self {
            sync_word: sync_word | key_present as u32,
            key_present,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::stream_from_payload_words;

    #[test]
    fn accepts_each_depth_and_reports_key() {
        for (depth, word) in [
            (BitDepth::Bits16, 0x078E),
            (BitDepth::Bits20, 0x0788E),
            (BitDepth::Bits24, 0x07888E),
        ] {
            let mut reader = stream_from_payload_words(depth, &[word]);
            let sync = SyncSegment::read(&mut reader, depth).unwrap();
            assert!(!sync.key_present);
            assert_eq!(sync.sync_word, word);

            let mut reader = stream_from_payload_words(depth, &[word | 1]);
            let sync = SyncSegment::read(&mut reader, depth).unwrap();
            assert!(sync.key_present);
            assert_eq!(sync.sync_word, word | 1);
        }
    }

    #[test]
    fn rejects_wrong_sync_word() {
        let mut reader = stream_from_payload_words(BitDepth::Bits16, &[0x1234]);
        assert!(SyncSegment::read(&mut reader, BitDepth::Bits16).is_err());
    }
}
