//! Stream configuration codes and their fixed tables.

use anyhow::{Result, bail};

use crate::structs::MAX_PROGRAM_CONFIGS;
use crate::utils::errors::MetadataError;

/// Payload word size of the elementary stream.
///
/// Payload words are left-justified within the 32-bit container words of
/// the interface; the three sizes have distinct preamble and frame sync
/// patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    #[default]
    Bits16,
    Bits20,
    Bits24,
}

impl BitDepth {
    pub const ALL: [BitDepth; 3] = [BitDepth::Bits16, BitDepth::Bits20, BitDepth::Bits24];

    pub fn bits(self) -> u32 {
        match self {
            BitDepth::Bits16 => 16,
            BitDepth::Bits20 => 20,
            BitDepth::Bits24 => 24,
        }
    }

    /// Mask selecting the payload bits of a 24-bit right-justified
    /// container sample.
    pub(crate) fn sync_mask(self) -> u32 {
        match self {
            BitDepth::Bits16 => 0x0FF_FF00,
            BitDepth::Bits20 => 0x0FF_FFF0,
            BitDepth::Bits24 => 0x0FF_FFFF,
        }
    }

    pub(crate) fn preamble_sync_a(self) -> u32 {
        match self {
            BitDepth::Bits16 => 0x0F8_7200,
            BitDepth::Bits20 => 0x06F_8720,
            BitDepth::Bits24 => 0x096_F872,
        }
    }

    pub(crate) fn preamble_sync_b(self) -> u32 {
        match self {
            BitDepth::Bits16 => 0x04E_1F00,
            BitDepth::Bits20 => 0x054_E1F0,
            BitDepth::Bits24 => 0x0A5_4E1F,
        }
    }

    /// Expected data-mode field of the burst-info word.
    pub(crate) fn preamble_mode(self) -> u32 {
        match self {
            BitDepth::Bits16 => 0x000_0000,
            BitDepth::Bits20 => 0x000_2000,
            BitDepth::Bits24 => 0x000_4000,
        }
    }

    /// Frame sync word carried in the sync segment, key bit clear.
    pub fn frame_sync_word(self) -> u32 {
        match self {
            BitDepth::Bits16 => 0x00_078E,
            BitDepth::Bits20 => 0x00_788E,
            BitDepth::Bits24 => 0x07_888E,
        }
    }
}

const N_PROGRAMS_TAB: [u8; MAX_PROGRAM_CONFIGS] = [
    2, 3, 2, 3, 4, 5, 4, 5, 6, 7, 8, 1, 2, 3, 3, 4, 5, 6, 1, 2, 3, 4, 1, 1,
];

const N_CHANNELS_TAB: [u8; MAX_PROGRAM_CONFIGS] = [
    8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 8, 6, 6, 6, 6, 6, 6, 6, 4, 4, 4, 4, 8, 8,
];

const LFE_CHANNEL_TAB: [i8; MAX_PROGRAM_CONFIGS] = [
    5, 5, -1, -1, -1, -1, -1, -1, -1, -1, -1, 4, -1, -1, -1, -1, -1, -1, -1, -1, -1, -1, 5, 5,
];

const PROGRAM_CONFIG_LABELS: [&str; MAX_PROGRAM_CONFIGS] = [
    "5.1+2",
    "5.1+1+1",
    "4+4",
    "4+2+2",
    "4+2+1+1",
    "4+1+1+1+1",
    "2+2+2+2",
    "2+2+2+1+1",
    "2+2+1+1+1+1",
    "2+1+1+1+1+1+1",
    "1+1+1+1+1+1+1+1",
    "5.1",
    "4+2",
    "4+1+1",
    "2+2+2",
    "2+2+1+1",
    "2+1+1+1+1",
    "1+1+1+1+1+1",
    "4",
    "2+2",
    "2+1+1",
    "1+1+1+1",
    "7.1",
    "7.1 Screen",
];

/// Program configuration code, 0..=23.
///
/// Determines the number of programs, the number of channels, and which
/// channel (if any) is the LFE channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgramConfig(u8);

impl ProgramConfig {
    pub fn new(code: u8) -> Result<Self> {
        if code as usize >= MAX_PROGRAM_CONFIGS {
            bail!(MetadataError::InvalidProgramConfig(code));
        }
        Ok(Self(code))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn n_programs(self) -> usize {
        N_PROGRAMS_TAB[self.0 as usize] as usize
    }

    pub fn n_channels(self) -> usize {
        N_CHANNELS_TAB[self.0 as usize] as usize
    }

    /// Index of the LFE channel, or `None` when the configuration has no
    /// LFE channel.
    pub fn lfe_channel(self) -> Option<usize> {
        match LFE_CHANNEL_TAB[self.0 as usize] {
            ch if ch >= 0 => Some(ch as usize),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        PROGRAM_CONFIG_LABELS[self.0 as usize]
    }
}

const FRAME_RATE_LABELS: [&str; 8] = [
    "23.98 fps", "24 fps", "25 fps", "29.97 fps", "30 fps", "50 fps", "59.94 fps", "60 fps",
];

/// Samples per frame at 48 kHz for the low frame rates (codes 1..=5).
const SAMPLES_PER_FRAME_TAB: [u32; 5] = [2002, 2000, 1920, 1602, 1600];

/// Frame count at which the SMPTE timecode frame field rolls over, for the
/// low frame rates.
const LAST_FRAME_TAB: [u8; 5] = [24, 24, 25, 30, 30];

/// Whether the frame rate uses drop-frame timecode (23.98 and 29.97 fps).
const DROP_FRAME_TAB: [bool; 5] = [true, false, false, true, false];

/// Frame rate code, 1..=8.
///
/// Codes 1..=5 (23.98 through 30 fps) are the low frame rates; frames at
/// those rates additionally carry the metadata-extension and
/// audio-extension segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate(u8);

impl Default for FrameRate {
    fn default() -> Self {
        Self(1)
    }
}

impl FrameRate {
    pub fn new(code: u8) -> Result<Self> {
        if !(1..=8).contains(&code) {
            bail!(MetadataError::InvalidFrameRate(code));
        }
        Ok(Self(code))
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn is_low(self) -> bool {
        self.0 <= 5
    }

    pub fn label(self) -> &'static str {
        FRAME_RATE_LABELS[self.0 as usize - 1]
    }

    /// Samples per frame at 48 kHz. Defined for the low frame rates only.
    pub fn samples_per_frame(self) -> Option<u32> {
        SAMPLES_PER_FRAME_TAB.get(self.0 as usize - 1).copied()
    }

    /// SMPTE timecode frame-field modulus. Defined for the low frame rates
    /// only.
    pub(crate) fn last_frame(self) -> Option<u8> {
        LAST_FRAME_TAB.get(self.0 as usize - 1).copied()
    }

    pub(crate) fn drop_frame(self) -> bool {
        DROP_FRAME_TAB
            .get(self.0 as usize - 1)
            .copied()
            .unwrap_or(false)
    }
}
