//! Metadata segment and metadata extension segment.

use std::io::Read;

use anyhow::{Result, anyhow, bail};

use crate::process::parse::ParserState;
use crate::structs::config::{FrameRate, ProgramConfig};
use crate::structs::frame::FrameInfo;
use crate::structs::timecode::Timecode;
use crate::structs::{MAX_CHANNELS, MAX_PROGRAMS, MAX_SUBSEGMENTS};
use crate::utils::errors::MetadataError;
use crate::utils::word_reader::WordReader;

/// Metadata segment: frame-global configuration, per-program and
/// per-channel parameters, and the nested AC-3 metadata subsegments.
///
/// Fields mirrored at the [`FrameInfo`] level (program configuration,
/// frame rates, frame count, timecode, sizes) are stored there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataSegment {
    pub revision_id: u8,
    /// Segment size in payload words, covering everything from the
    /// revision id up to but excluding the CRC word.
    pub segment_size: u16,
    pub reserved_bits: u8,
    pub bandwidth_id: [u8; MAX_PROGRAMS],
    pub channel_revision_id: [u8; MAX_CHANNELS],
    pub bitpool_type: [u8; MAX_CHANNELS],
    pub begin_gain: [u16; MAX_CHANNELS],
    pub end_gain: [u16; MAX_CHANNELS],
    pub subsegment_id: [u8; MAX_SUBSEGMENTS],
    pub subsegment_length: [u16; MAX_SUBSEGMENTS],
    pub unused_subsegment_bits: [u16; MAX_SUBSEGMENTS],
    pub unused_metadata_bits: u32,
}

impl MetadataSegment {
    pub(crate) fn read<R: Read>(
        state: &mut ParserState,
        reader: &mut WordReader<R>,
        frame: &mut FrameInfo,
    ) -> Result<()> {
        let word_bits = frame.bit_depth.bits();

        if frame.key_present {
            frame.metadata_key = reader.read(word_bits)?;
            reader.unkey(frame.metadata_key, 1)?;
        }

        frame.metadata.revision_id = reader.read(4)? as u8;
        frame.metadata.segment_size = reader.read(10)? as u16;
        reader.set_counter(
            0,
            i64::from(word_bits) * i64::from(frame.metadata.segment_size) - 14,
        )?;

        if frame.key_present {
            reader.unkey(frame.metadata_key, frame.metadata.segment_size as usize)?;
        }

        frame.program_config = ProgramConfig::new(reader.read(6)? as u8)?;
        frame.n_programs = frame.program_config.n_programs();
        frame.n_channels = frame.program_config.n_channels();
        frame.lfe_channel = frame.program_config.lfe_channel();

        frame.frame_rate = FrameRate::new(reader.read(4)? as u8)?;

        let original_code = reader.read(4)? as u8;
        frame.original_frame_rate = FrameRate::new(original_code)
            .map_err(|_| anyhow!(MetadataError::InvalidOriginalFrameRate(original_code)))?;

        frame.frame_count = reader.read(16)? as u16;

        let mut timecode = [0u32; 8];
        reader.read_into(&mut timecode, 8)?;
        frame.timecode = Timecode(timecode.map(|b| b as u8));

        frame.metadata.reserved_bits = reader.read(8)? as u8;

        let mut sizes = [0u32; MAX_CHANNELS];
        reader.read_into(&mut sizes[..frame.n_channels], 10)?;
        for (dst, src) in frame.channel_subseg_size.iter_mut().zip(sizes) {
            *dst = src as u16;
        }

        if frame.frame_rate.is_low() {
            frame.meta_ext_size = reader.read(8)? as u16;
        }
        frame.meter_size = reader.read(8)? as u16;

        for pgm in 0..frame.n_programs {
            let byte = reader.read(8)? as u8;
            frame.description_text[pgm] = byte;
            state.push_description_char(pgm, byte)?;

            frame.metadata.bandwidth_id[pgm] = reader.read(2)? as u8;
        }

        for ch in 0..frame.n_channels {
            frame.metadata.channel_revision_id[ch] = reader.read(4)? as u8;
            frame.metadata.bitpool_type[ch] = reader.read(1)? as u8;
            frame.metadata.begin_gain[ch] = reader.read(10)? as u16;
            frame.metadata.end_gain[ch] = reader.read(10)? as u16;
        }

        let mut seg = 0;
        loop {
            let id = reader.read(4)? as u8;
            if id == 0 {
                break;
            }
            if id >= 3 {
                bail!(MetadataError::ReservedSubsegment(id));
            }
            if seg >= MAX_SUBSEGMENTS {
                bail!(MetadataError::TooManySubsegments(MAX_SUBSEGMENTS));
            }

            frame.metadata.subsegment_id[seg] = id;
            frame.metadata.subsegment_length[seg] = reader.read(12)? as u16;

            reader.set_counter(1, i64::from(frame.metadata.subsegment_length[seg]))?;
            frame
                .ac3_metadata
                .read(reader, frame.n_programs, id == 1)?;

            frame.metadata.unused_subsegment_bits[seg] = reader.counter(1)? as u16;
            reader.skip(u32::from(frame.metadata.unused_subsegment_bits[seg]))?;

            seg += 1;
        }

        frame.metadata.unused_metadata_bits = reader.counter(0)? as u32;
        reader.skip(frame.metadata.unused_metadata_bits)?;

        frame.metadata_crc = reader.read(word_bits)?;

        Ok(())
    }
}

/// Metadata extension segment, present at low frame rates only. Same
/// subsegment grammar as the metadata segment, carrying the AC-3
/// extension fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataExtSegment {
    pub key: u32,
    pub subsegment_id: [u8; MAX_SUBSEGMENTS],
    pub subsegment_length: [u16; MAX_SUBSEGMENTS],
    pub unused_subsegment_bits: [u16; MAX_SUBSEGMENTS],
    pub unused_bits: u32,
}

impl MetadataExtSegment {
    pub(crate) fn read<R: Read>(reader: &mut WordReader<R>, frame: &mut FrameInfo) -> Result<()> {
        let word_bits = frame.bit_depth.bits();

        if frame.key_present {
            frame.metadata_ext.key = reader.read(word_bits)?;
            reader.unkey(frame.metadata_ext.key, frame.meta_ext_size as usize + 1)?;
        }

        reader.set_counter(0, i64::from(frame.meta_ext_size) * i64::from(word_bits))?;

        let mut seg = 0;
        loop {
            let id = reader.read(4)? as u8;
            if id == 0 {
                break;
            }
            if id >= 3 {
                bail!(MetadataError::ReservedSubsegment(id));
            }
            if seg >= MAX_SUBSEGMENTS {
                bail!(MetadataError::TooManySubsegments(MAX_SUBSEGMENTS));
            }

            frame.metadata_ext.subsegment_id[seg] = id;
            frame.metadata_ext.subsegment_length[seg] = reader.read(12)? as u16;

            reader.set_counter(1, i64::from(frame.metadata_ext.subsegment_length[seg]))?;
            frame.ac3_metadata_ext.read(reader, frame.n_programs)?;

            frame.metadata_ext.unused_subsegment_bits[seg] = reader.counter(1)? as u16;
            reader.skip(u32::from(frame.metadata_ext.unused_subsegment_bits[seg]))?;

            seg += 1;
        }

        frame.metadata_ext.unused_bits = reader.counter(0)? as u32;
        reader.skip(frame.metadata_ext.unused_bits)?;

        frame.metadata_extension_crc = reader.read(word_bits)?;

        Ok(())
    }
}
