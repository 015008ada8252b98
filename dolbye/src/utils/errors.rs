use std::io;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum BitError {
    #[error("Container or payload word size not initialized before read")]
    NotInitialized,

    #[error("Refill attempted with {0} bits still unread in the buffer")]
    Overwrite(u64),

    #[error("Bitstream underflow: need {needed} bits, {available} available")]
    Underflow { needed: u64, available: u64 },

    #[error("End of input stream")]
    Eof,

    #[error("Input read failed: {0}")]
    Read(io::Error),

    #[error("Frame of {0} container words exceeds the word buffer")]
    FrameTooLarge(usize),

    #[error("Down-counter {0} went negative, bitstream is inconsistent")]
    CounterUnderflow(usize),

    #[error("Invalid down-counter index {0}")]
    InvalidCounter(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum PreambleError {
    #[error("Preamble payload length of {bits} bits is not a multiple of the {depth}-bit word size")]
    InconsistentPayloadSize { bits: u32, depth: u32 },
}

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("Invalid frame sync word. Read {read:#07x}, expected {expected:#07x}")]
    BadSync { read: u32, expected: u32 },
}

#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("Invalid program config {0}, must be < 24")]
    InvalidProgramConfig(u8),

    #[error("Invalid frame rate code {0}, must be in 1..=8")]
    InvalidFrameRate(u8),

    #[error("Invalid original frame rate code {0}, must be in 1..=8")]
    InvalidOriginalFrameRate(u8),

    #[error("Reserved metadata subsegment id {0}")]
    ReservedSubsegment(u8),

    #[error("More than {0} metadata subsegments before the terminator")]
    TooManySubsegments(usize),

    #[error("Null character in program {0} description text")]
    NullDescriptionChar(usize),

    #[error("Invalid character {byte:#04x} in program {program} description text")]
    InvalidDescriptionChar { program: usize, byte: u8 },

    #[error("Program {0} description text too long, truncating")]
    DescriptionTooLong(usize),
}

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("Reserved group type code {0}")]
    ReservedGroupType(u8),

    #[error("Illegal group type in extension subsegment: primary was {prev:?}, extension read {read:?}")]
    IllegalGroupTransition {
        prev: crate::structs::audio::GroupType,
        read: crate::structs::audio::GroupType,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum SequenceError {
    #[error("Non-sequential frame count: transition from {prev} to {read}")]
    NonSequentialFrameCount { prev: u16, read: u16 },

    #[error("Non-sequential time code: transition from {prev} to {read}")]
    NonSequentialTimecode { prev: String, read: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SadmError {
    #[error("Invalid AC-3 channel configuration acmod {0}")]
    InvalidAcmod(u8),

    #[error("No frame duration defined for frame rate code {0}")]
    UnsupportedFrameRate(u8),
}
