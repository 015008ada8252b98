//! Data structures for the Dolby E frame grammar.

/// Program-configuration, frame-rate and word-size code tables.
pub mod config;

/// Frame-level record and segment traversal.
pub mod frame;

/// Sync segment.
pub mod sync;

/// Metadata and metadata extension segments.
pub mod metadata;

/// AC-3 re-encoding metadata subsegments.
pub mod ac3;

/// Audio segment structure walk.
pub mod audio;

/// Meter segment.
pub mod meter;

/// SMPTE timecode handling.
pub mod timecode;

/// Maximum channels per frame.
pub const MAX_CHANNELS: usize = 8;

/// Maximum programs per frame.
pub const MAX_PROGRAMS: usize = 8;

/// Maximum blocks per channel subsegment.
pub const MAX_BLOCKS: usize = 9;

/// Maximum metadata subsegments per segment.
pub const MAX_SUBSEGMENTS: usize = 3;

/// Maximum additional-BSI bytes per program.
pub const MAX_ADDBSI_BYTES: usize = 64;

/// Program description text capacity, terminator included.
pub const MAX_DESC_TEXT_LEN: usize = 34;

/// Number of program configuration codes.
pub const MAX_PROGRAM_CONFIGS: usize = 24;
