//! Synthesis of byte-exact Dolby E streams for tests.
//!
//! Builds frames bottom-up through the same grammar the parser walks:
//! payload words are assembled bit by bit, padded the way a real encoder
//! pads announced segment lengths, scrambled when a key is requested, and
//! finally wrapped in container words behind a burst preamble.

use std::io::Cursor;

use crate::structs::MAX_PROGRAMS;
use crate::structs::config::{BitDepth, ProgramConfig};
use crate::utils::word_reader::{CONTAINER_BITS, MAX_PAYLOAD_BITS, WordReader};

/// Accumulates fields MSB-first into payload words of a fixed size.
pub(crate) struct BitSink {
    depth: BitDepth,
    bits: Vec<bool>,
}

impl BitSink {
    pub fn new(depth: BitDepth) -> Self {
        Self {
            depth,
            bits: Vec::new(),
        }
    }

    pub fn push(&mut self, value: u32, bits: u32) {
        for i in (0..bits).rev() {
            self.bits.push(i < 32 && (value >> i) & 1 == 1);
        }
    }

    pub fn append(&mut self, other: &BitSink) {
        self.bits.extend_from_slice(&other.bits);
    }

    pub fn bit_len(&self) -> usize {
        self.bits.len()
    }

    pub fn pad_to_word(&mut self) {
        let payload = self.depth.bits() as usize;
        while self.bits.len() % payload != 0 {
            self.bits.push(false);
        }
    }

    pub fn into_words(mut self) -> Vec<u32> {
        self.pad_to_word();
        let payload = self.depth.bits() as usize;

        self.bits
            .chunks(payload)
            .map(|chunk| chunk.iter().fold(0u32, |w, &b| (w << 1) | b as u32))
            .collect()
    }
}

/// Serializes payload words into container bytes and hands back a reader
/// aligned at the given depth with everything buffered.
pub(crate) fn stream_from_payload_words(
    depth: BitDepth,
    words: &[u32],
) -> WordReader<Cursor<Vec<u8>>> {
    let bytes = container_bytes(depth, words);
    let mut reader = WordReader::new(Cursor::new(bytes));
    reader.init_stream(depth.bits()).unwrap();
    reader.refill(words.len()).unwrap();
    reader
}

fn container_bytes(depth: BitDepth, words: &[u32]) -> Vec<u8> {
    words
        .iter()
        .flat_map(|w| (w << (CONTAINER_BITS - depth.bits())).to_ne_bytes())
        .collect()
}

/// Builds one complete frame: preamble, sync segment, metadata segment
/// with a single extended-BSI AC-3 subsegment, the audio segments, the
/// extension segments at low frame rates, and the meter segment.
pub(crate) struct FrameBuilder {
    depth: BitDepth,
    config: ProgramConfig,
    frame_rate: u8,
    key: Option<u32>,
    frame_count: u16,
    timecode: [u8; 8],
    description: [u8; MAX_PROGRAMS],
    reserved_subsegment_id: Option<u8>,
}

impl FrameBuilder {
    pub fn new(depth: BitDepth, program_config: u8, frame_rate: u8) -> Self {
        // Timecode byte 1 at 0x3F marks the timecode invalid, keeping
        // multi-frame streams free of succession warnings by default.
        let mut timecode = [0u8; 8];
        timecode[1] = 0x3F;

        Self {
            depth,
            config: ProgramConfig::new(program_config).unwrap(),
            frame_rate,
            key: None,
            frame_count: 0,
            timecode,
            description: [0x02; MAX_PROGRAMS],
            reserved_subsegment_id: None,
        }
    }

    pub fn key(mut self, key: u32) -> Self {
        self.key = Some(key);
        self
    }

    pub fn frame_count(mut self, count: u16) -> Self {
        self.frame_count = count;
        self
    }

    pub fn description_char(mut self, pgm: usize, byte: u8) -> Self {
        self.description[pgm] = byte;
        self
    }

    pub fn reserved_subsegment_id(mut self, id: u8) -> Self {
        self.reserved_subsegment_id = Some(id);
        self
    }

    pub fn build(self) -> Vec<u8> {
        let payload = self.depth.bits();
        let low = self.frame_rate <= 5;
        let n_channels = self.config.n_channels();
        let n_programs = self.config.n_programs();
        let lfe = self.config.lfe_channel();

        let mut words: Vec<u32> = Vec::new();

        // Sync segment.
        let mut sync = BitSink::new(self.depth);
        sync.push(self.depth.frame_sync_word() >> 1, payload - 1);
        sync.push(self.key.is_some() as u32, 1);
        words.extend(sync.into_words());

        // Channel subsegments, generated once per channel and reused by
        // the extension segment (the layouts coincide for long groups).
        let channel_words: Vec<Vec<u32>> = (0..n_channels)
            .map(|ch| self.channel_subsegment(lfe == Some(ch), low).into_words())
            .collect();
        let subseg_sizes: Vec<usize> = channel_words.iter().map(Vec::len).collect();

        let meter_size = (n_channels * 20).div_ceil(payload as usize);
        let (ext_content, meta_ext_size) = if low {
            let content = self.metadata_ext_content(n_programs);
            let size = content.bit_len().div_ceil(payload as usize);
            (Some(content), size)
        } else {
            (None, 0)
        };

        // Metadata segment.
        let content = self.metadata_content(&subseg_sizes, meta_ext_size, meter_size);
        let segment_size = (content.bit_len() + 14).div_ceil(payload as usize);

        let mut metadata = BitSink::new(self.depth);
        metadata.push(0, 4); // metadata_revision_id
        metadata.push(segment_size as u32, 10);
        metadata.append(&content);
        metadata.pad_to_word();
        metadata.push(0x0ACE, payload); // metadata_crc

        self.emit_keyed(&mut words, metadata.into_words());

        if self.reserved_subsegment_id.is_some() {
            // The parser aborts inside the metadata segment; nothing after
            // it will be read.
            return self.wrap(words);
        }

        // Audio segment, two halves of channels, each closed by a CRC.
        for half in [0..n_channels / 2, n_channels / 2..n_channels] {
            let mut segment = Vec::new();
            for ch in half {
                segment.extend_from_slice(&channel_words[ch]);
            }
            segment.push(0x0BED); // subsegment CRC
            self.emit_keyed(&mut words, segment);
        }

        if low {
            // Metadata extension segment.
            let mut ext = ext_content.unwrap();
            ext.pad_to_word();
            ext.push(0x0ACE, payload);
            self.emit_keyed(&mut words, ext.into_words());

            // Audio extension segment.
            for half in [0..n_channels / 2, n_channels / 2..n_channels] {
                let mut segment = Vec::new();
                for ch in half {
                    segment.extend_from_slice(&channel_words[ch]);
                }
                segment.push(0x0BED);
                self.emit_keyed(&mut words, segment);
            }
        }

        // Meter segment.
        let mut meter = BitSink::new(self.depth);
        for _ in 0..n_channels {
            meter.push(0x3C0, 10); // peak_meter
        }
        for _ in 0..n_channels {
            meter.push(0x300, 10); // rms_meter
        }
        meter.pad_to_word();
        meter.push(0x0ACE, payload);
        self.emit_keyed(&mut words, meter.into_words());

        self.wrap(words)
    }

    /// Appends a segment, inserting a key word and scrambling the segment
    /// body when a key is configured.
    fn emit_keyed(&self, words: &mut Vec<u32>, segment: Vec<u32>) {
        match self.key {
            Some(key) => {
                words.push(key);
                words.extend(segment.into_iter().map(|w| w ^ key));
            }
            None => words.extend(segment),
        }
    }

    fn metadata_content(
        &self,
        subseg_sizes: &[usize],
        meta_ext_size: usize,
        meter_size: usize,
    ) -> BitSink {
        let n_programs = self.config.n_programs();
        let mut sink = BitSink::new(self.depth);

        sink.push(self.config.code() as u32, 6);
        sink.push(self.frame_rate as u32, 4);
        sink.push(self.frame_rate as u32, 4); // original_frame_rate_code
        sink.push(self.frame_count as u32, 16);
        for byte in self.timecode {
            sink.push(byte as u32, 8);
        }
        sink.push(0, 8); // metadata_reserved_bits

        for &size in subseg_sizes {
            sink.push(size as u32, 10);
        }
        if self.frame_rate <= 5 {
            sink.push(meta_ext_size as u32, 8);
        }
        sink.push(meter_size as u32, 8);

        for pgm in 0..n_programs {
            sink.push(self.description[pgm] as u32, 8);
            sink.push(0, 2); // bandwidth_id
        }
        for _ in 0..self.config.n_channels() {
            sink.push(0, 4); // revision_id
            sink.push(0, 1); // bitpool_type
            sink.push(0x3C0, 10); // begin_gain
            sink.push(0x3C0, 10); // end_gain
        }

        if let Some(id) = self.reserved_subsegment_id {
            assert!(id >= 3, "ids below 3 are not reserved");
            sink.push(id as u32, 4);
            return sink;
        }

        // One AC-3 metadata subsegment, extended-BSI variant.
        let ac3 = self.ac3_content(n_programs);
        sink.push(1, 4); // metadata_subsegment_id
        sink.push(ac3.bit_len() as u32, 12);
        sink.append(&ac3);
        sink.push(0, 4); // terminator

        sink
    }

    fn ac3_content(&self, n_programs: usize) -> BitSink {
        let mut sink = BitSink::new(self.depth);

        for _ in 0..n_programs {
            sink.push(18, 5); // datarate: 640 kbps
            sink.push(0, 3); // bsmod: complete main
            sink.push(2, 3); // acmod: 2/0
            sink.push(0, 2); // cmixlev
            sink.push(0, 2); // surmixlev
            sink.push(0, 2); // dsurmod
            sink.push(0, 1); // lfeon
            sink.push(27, 5); // dialnorm
            sink.push(0, 1); // langcode
            sink.push(0, 8); // langcod
            sink.push(0, 1); // audprodie
            sink.push(0, 5); // mixlevel
            sink.push(0, 2); // roomtyp
            sink.push(1, 1); // copyrightb
            sink.push(1, 1); // origbs

            sink.push(1, 1); // xbsi1e
            sink.push(1, 2); // dmixmod
            sink.push(4, 3); // ltrtcmixlev
            sink.push(4, 3); // ltrtsurmixlev
            sink.push(4, 3); // lorocmixlev
            sink.push(4, 3); // lorosurmixlev
            sink.push(0, 1); // xbsi2e
            sink.push(0, 2); // dsurexmod
            sink.push(0, 2); // dheadphonmod
            sink.push(0, 1); // adconvtyp
            sink.push(0, 8); // xbsi2
            sink.push(0, 1); // encinfo

            sink.push(1, 1); // hpfon
            sink.push(1, 1); // bwlpfon
            sink.push(1, 1); // lfelpfon
            sink.push(0, 1); // sur90on
            sink.push(0, 1); // suratton
            sink.push(0, 1); // rfpremphon
            sink.push(1, 1); // compre
            sink.push(0x42, 8); // compr1
            sink.push(1, 1); // dynrnge
            sink.push(0x11, 8); // dynrng1
            sink.push(0x22, 8); // dynrng2
            sink.push(0x33, 8); // dynrng3
            sink.push(0x44, 8); // dynrng4
        }

        for _ in 0..n_programs {
            sink.push(0, 1); // addbsie
        }

        sink
    }

    fn metadata_ext_content(&self, n_programs: usize) -> BitSink {
        let mut sink = BitSink::new(self.depth);

        sink.push(1, 4); // subsegment id
        sink.push(n_programs as u32 * 40, 12);
        for _ in 0..n_programs {
            sink.push(0x21, 8); // compr2
            sink.push(0x55, 8); // dynrng5
            sink.push(0x66, 8); // dynrng6
            sink.push(0x77, 8); // dynrng7
            sink.push(0x88, 8); // dynrng8
        }
        sink.push(0, 4); // terminator

        sink
    }

    /// One channel subsegment carrying a long transform group (or the LFE
    /// layout), zero bandwidth code, no gain-adaptive quantization.
    fn channel_subsegment(&self, lfe: bool, low: bool) -> BitSink {
        let mut sink = BitSink::new(self.depth);

        let (regions, bands) = if lfe {
            (1u32, 21u32)
        } else {
            sink.push(0, if low { 2 } else { 1 }); // group_type_code: long
            sink.push(0, 3); // bandwidth_code
            (2, 50)
        };

        sink.push(0, regions * 2); // master exponents
        sink.push(0, bands * 5); // biased exponents
        sink.push(0, 2 + 3 + 1); // masking model, block 0
        sink.push(0, 1 + 8); // bit allocation
        sink.push(0, 1); // gaq_info_exists

        sink
    }

    /// Wraps the payload words in a burst preamble and container bytes.
    fn wrap(&self, payload_words: Vec<u32>) -> Vec<u8> {
        let depth = self.depth;
        let payload = depth.bits();

        let shift = CONTAINER_BITS - MAX_PAYLOAD_BITS;
        let mut bytes = Vec::new();
        for v24 in [
            depth.preamble_sync_a(),
            depth.preamble_sync_b(),
            0x000_1C00 | depth.preamble_mode(),
            (payload_words.len() as u32 * payload) << (MAX_PAYLOAD_BITS - payload),
        ] {
            bytes.extend_from_slice(&(v24 << shift).to_ne_bytes());
        }

        bytes.extend(container_bytes(depth, &payload_words));
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_packs_msb_first() {
        let mut sink = BitSink::new(BitDepth::Bits16);
        sink.push(0xF, 4);
        sink.push(0x0, 4);
        sink.push(0xAB, 8);
        sink.push(0x5, 3); // 0b101, spills into the second word
        assert_eq!(sink.into_words(), vec![0xF0AB, 0xA000]);
    }

    #[test]
    fn sink_round_trips_through_reader() {
        for depth in BitDepth::ALL {
            let mut sink = BitSink::new(depth);
            sink.push(0x12345, 20);
            sink.push(1, 1);
            sink.push(0x7F, 7);

            let words = sink.into_words();
            let mut reader = stream_from_payload_words(depth, &words);
            assert_eq!(reader.read(20).unwrap(), 0x12345);
            assert_eq!(reader.read(1).unwrap(), 1);
            assert_eq!(reader.read(7).unwrap(), 0x7F);
        }
    }
}
