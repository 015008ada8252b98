//! Audio segment traversal.
//!
//! The audio segments are walked for structure only: every field is
//! consumed at its exact width so the bit cursor tracks the stream, but no
//! sample data is reconstructed. Each segment covers the channels in two
//! halves, each half optionally opened by a scrambling key and closed by a
//! CRC word.

use std::io::Read;

use anyhow::{Result, bail};

use crate::structs::MAX_BLOCKS;
use crate::structs::frame::FrameInfo;
use crate::utils::errors::AudioError;
use crate::utils::word_reader::WordReader;

/// Transform group type of a non-LFE channel subsegment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupType {
    Long,
    Short,
    Bridge,
}

impl GroupType {
    fn from_code(code: u32) -> Result<Self> {
        match code {
            0 => Ok(GroupType::Long),
            1 => Ok(GroupType::Short),
            2 => Ok(GroupType::Bridge),
            _ => bail!(AudioError::ReservedGroupType(code as u8)),
        }
    }
}

/// Block/region/band layout of one channel subsegment.
///
/// Determined by frame-rate class, primary-vs-extension, LFE and group
/// type; the bandwidth code then narrows every block's band count.
#[derive(Debug, Clone, Copy)]
struct BlockLayout {
    blocks: usize,
    region_count: [u8; MAX_BLOCKS],
    band_count: [u8; MAX_BLOCKS],
}

impl BlockLayout {
    fn new(
        low_frame_rate: bool,
        extension: bool,
        group_type: Option<GroupType>,
        bandwidth_code: u32,
    ) -> Self {
        let mut layout = match (low_frame_rate, group_type) {
            // LFE channels use one block of a single region regardless of
            // frame rate.
            (_, None) => Self::uniform(1, 1, 21),
            (false, Some(GroupType::Long)) => Self::uniform(1, 2, 50),
            (false, Some(GroupType::Short)) => Self::uniform(9, 2, 38),
            // A bridge group cannot occur at high frame rates; the group
            // type field is a single bit there.
            (false, Some(GroupType::Bridge)) => unreachable!(),
            (true, Some(GroupType::Long)) => Self::uniform(1, 2, 50),
            (true, Some(GroupType::Short)) => Self::uniform(8, 2, 38),
            (true, Some(GroupType::Bridge)) => {
                let mut layout = Self::uniform(7, 2, 38);
                // The wide bridge block sits last in the primary
                // subsegment and first in the extension.
                layout.band_count[if extension { 0 } else { 6 }] = 44;
                layout
            }
        };

        if group_type.is_some() {
            for bands in layout.band_count.iter_mut().take(layout.blocks) {
                *bands -= bandwidth_code as u8;
            }
        }

        layout
    }

    fn uniform(blocks: usize, regions: u8, bands: u8) -> Self {
        Self {
            blocks,
            region_count: [regions; MAX_BLOCKS],
            band_count: [bands; MAX_BLOCKS],
        }
    }
}

/// Walks one channel subsegment and returns its group type (`None` for the
/// LFE channel).
fn read_channel_subsegment<R: Read>(
    reader: &mut WordReader<R>,
    low_frame_rate: bool,
    extension: bool,
    lfe: bool,
    prev_group_type: Option<GroupType>,
) -> Result<Option<GroupType>> {
    let (group_type, bandwidth_code) = if lfe {
        (None, 0)
    } else {
        let code = reader.read(if low_frame_rate { 2 } else { 1 })?;
        let group_type = GroupType::from_code(code)?;
        let bandwidth_code = reader.read(3)?;
        (Some(group_type), bandwidth_code)
    };

    // A short transform cannot start or stop between the primary
    // subsegment and its extension.
    if extension {
        let prev_short = prev_group_type == Some(GroupType::Short);
        let short = group_type == Some(GroupType::Short);
        if prev_short != short {
            bail!(AudioError::IllegalGroupTransition {
                prev: prev_group_type.unwrap_or(GroupType::Long),
                read: group_type.unwrap_or(GroupType::Long),
            });
        }
    }

    let layout = BlockLayout::new(low_frame_rate, extension, group_type, bandwidth_code);

    // Exponents. The strategy bit is implied for block 0 and whenever the
    // band count changes between blocks.
    let mut prev_bands = 0;
    for blk in 0..layout.blocks {
        let strategy = if blk == 0 || layout.band_count[blk] != prev_bands {
            1
        } else {
            reader.read(1)?
        };
        prev_bands = layout.band_count[blk];

        if strategy != 0 {
            reader.skip(u32::from(layout.region_count[blk]) * 2)?;
            reader.skip(u32::from(layout.band_count[blk]) * 5)?;
        }
    }

    // Masking model parameters, implied present for block 0.
    for blk in 0..layout.blocks {
        let exists = if blk == 0 { 1 } else { reader.read(1)? };
        if exists != 0 {
            reader.skip(2 + 3 + 1)?;
        }
    }

    // Bit allocation.
    reader.skip(1)?; // delta_bit_info_exists
    reader.skip(8)?; // snr_offset

    // Gain-adaptive quantization.
    for blk in 0..layout.blocks {
        if reader.read(1)? != 0 {
            let first_gaband = reader.read(6)?;
            if first_gaband != 63 {
                let bands = u32::from(layout.band_count[blk]);
                for _ in first_gaband.min(bands)..bands {
                    reader.skip(2)?;
                }
            }
        }
    }

    Ok(group_type)
}

/// Reads an audio segment (or, with `extension` set, an audio extension
/// segment) covering all channels in two halves.
pub(crate) fn read_audio_segment<R: Read>(
    reader: &mut WordReader<R>,
    frame: &mut FrameInfo,
    extension: bool,
) -> Result<()> {
    let half = frame.n_channels / 2;
    let word_bits = frame.bit_depth.bits();

    for channels in [0..half, half..frame.n_channels] {
        if frame.key_present {
            let key = reader.read(word_bits)?;
            let keyed_words = 1 + channels
                .clone()
                .map(|ch| frame.channel_subseg_size[ch] as usize)
                .sum::<usize>();
            reader.unkey(key, keyed_words)?;
        }

        for ch in channels {
            reader.set_counter(
                0,
                i64::from(frame.channel_subseg_size[ch]) * i64::from(word_bits),
            )?;

            let group_type = read_channel_subsegment(
                reader,
                frame.frame_rate.is_low(),
                extension,
                frame.lfe_channel == Some(ch),
                frame.prev_group_type_code[ch],
            )?;
            if !extension {
                frame.prev_group_type_code[ch] = group_type;
            }

            let unused = reader.counter(0)?;
            reader.skip(unused as u32)?;
        }

        // Subsegment CRC, read and discarded.
        reader.read(word_bits)?;
    }

    Ok(())
}
