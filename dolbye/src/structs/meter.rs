//! Meter segment.

use std::io::Read;

use anyhow::Result;

use crate::structs::MAX_CHANNELS;
use crate::structs::frame::FrameInfo;
use crate::utils::word_reader::WordReader;

/// Per-channel peak and RMS meter readings, 10 bits each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeterSegment {
    pub peak_meter: [u16; MAX_CHANNELS],
    pub rms_meter: [u16; MAX_CHANNELS],
}

impl MeterSegment {
    pub(crate) fn read<R: Read>(reader: &mut WordReader<R>, frame: &mut FrameInfo) -> Result<()> {
        let word_bits = frame.bit_depth.bits();

        if frame.key_present {
            let key = reader.read(word_bits)?;
            reader.unkey(key, frame.meter_size as usize + 1)?;
        }

        reader.set_counter(0, i64::from(frame.meter_size) * i64::from(word_bits))?;

        for ch in 0..frame.n_channels {
            frame.meter.peak_meter[ch] = reader.read(10)? as u16;
        }
        for ch in 0..frame.n_channels {
            frame.meter.rms_meter[ch] = reader.read(10)? as u16;
        }

        let unused = reader.counter(0)?;
        reader.skip(unused as u32)?;

        // Meter CRC, read and discarded.
        reader.read(word_bits)?;

        Ok(())
    }
}
