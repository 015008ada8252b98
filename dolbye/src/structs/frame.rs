//! Frame-level record and the ordered segment traversal.

use std::io::Read;

use anyhow::Result;

use crate::process::parse::ParserState;
use crate::structs::ac3::{Ac3MetadataExtSegment, Ac3MetadataSegment};
use crate::structs::audio::{self, GroupType};
use crate::structs::config::{BitDepth, FrameRate, ProgramConfig};
use crate::structs::metadata::{MetadataExtSegment, MetadataSegment};
use crate::structs::meter::MeterSegment;
use crate::structs::sync::SyncSegment;
use crate::structs::timecode::Timecode;
use crate::structs::{MAX_CHANNELS, MAX_PROGRAMS};
use crate::utils::word_reader::WordReader;

/// Everything decoded from one Dolby E frame.
///
/// Built fresh for every frame: frame-global configuration at the top
/// level, the raw per-segment fields in the segment sub-records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameInfo {
    /// Total payload length in payload words.
    pub frame_length: usize,
    /// Payload word size.
    pub bit_depth: BitDepth,
    /// Whether segments are scrambled with per-segment keys.
    pub key_present: bool,

    pub program_config: ProgramConfig,
    pub n_programs: usize,
    pub n_channels: usize,
    pub lfe_channel: Option<usize>,

    pub frame_rate: FrameRate,
    pub original_frame_rate: FrameRate,

    /// Rolling 16-bit frame counter.
    pub frame_count: u16,
    pub timecode: Timecode,

    /// Per-channel subsegment length in payload words.
    pub channel_subseg_size: [u16; MAX_CHANNELS],
    /// Metadata extension segment size in payload words (low frame rates).
    pub meta_ext_size: u16,
    /// Meter segment size in payload words.
    pub meter_size: u16,

    /// Description text character transmitted for each program this frame.
    pub description_text: [u8; MAX_PROGRAMS],

    /// Group type of each channel's primary subsegment, carried into the
    /// extension subsegment for the continuity check. `None` for LFE.
    pub prev_group_type_code: [Option<GroupType>; MAX_CHANNELS],

    pub metadata_key: u32,
    pub metadata_crc: u32,
    pub metadata_extension_crc: u32,

    pub sync: SyncSegment,
    pub metadata: MetadataSegment,
    pub ac3_metadata: Ac3MetadataSegment,
    pub metadata_ext: MetadataExtSegment,
    pub ac3_metadata_ext: Ac3MetadataExtSegment,
    pub meter: MeterSegment,
}

impl FrameInfo {
    /// Parses one frame from a payload already located and buffered by the
    /// preamble scan.
    pub fn read<R: Read>(
        state: &mut ParserState,
        reader: &mut WordReader<R>,
        bit_depth: BitDepth,
        frame_length: usize,
    ) -> Result<Self> {
        let mut frame = FrameInfo {
            frame_length,
            bit_depth,
            ..Default::default()
        };

        frame.sync = SyncSegment::read(reader, bit_depth)?;
        frame.key_present = frame.sync.key_present;

        MetadataSegment::read(state, reader, &mut frame)?;
        audio::read_audio_segment(reader, &mut frame, false)?;

        if frame.frame_rate.is_low() {
            MetadataExtSegment::read(reader, &mut frame)?;
            audio::read_audio_segment(reader, &mut frame, true)?;
        }

        MeterSegment::read(reader, &mut frame)?;

        Ok(frame)
    }
}
