//! Parser for Dolby E elementary bitstreams.
//!
//! Reads the raw bitstream as carried over a professional digital audio
//! interface (16-, 20- or 24-bit payload words in 32-bit container words,
//! frames delimited by SMPTE-337-style preambles) and produces a
//! structured, byte-exact view of each frame's control information:
//! program configuration, channel metadata, AC-3 re-encoding parameters,
//! meters and timecodes. Audio subsegments are walked to validate their
//! bit budgets; samples are not reconstructed.
//!
//! The parsed frame can be projected into a Serial ADM (S-ADM) XML
//! document per ITU-R BS.2076/BS.2125 for downstream encoders that
//! transcode Dolby E to AC-3 while preserving the authored metadata.
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use dolbye::process::sequence::Sequencer;
//!
//! let input = BufReader::new(File::open("input.dde")?);
//! let mut sequencer = Sequencer::new(input)?;
//!
//! println!("{} frames", sequencer.frames());
//!
//! let frame = sequencer.next_frame()?;
//! let xml = dolbye::sadm::document(&frame, sequencer.descriptions())?;
//! print!("{xml}");
//! # Ok::<(), anyhow::Error>(())
//! ```

/// Stream processing: preamble location, parser state, frame sequencing.
pub mod process;

/// S-ADM document generation from a parsed frame.
pub mod sadm;

/// Frame data structures and segment grammar.
pub mod structs;

/// Bitstream I/O and error types.
pub mod utils;

#[cfg(test)]
pub(crate) mod testkit;
