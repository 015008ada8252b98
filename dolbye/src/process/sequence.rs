//! Frame sequencing over a seekable input.
//!
//! The sequencer owns the word reader and the parser state and exposes the
//! stream as a sequence of frames: opening a stream counts its frames and
//! sweeps the leading frames for program description text, after which
//! frames can be delivered in order or sought by index.

use std::io::{Read, Seek};

use anyhow::{Result, anyhow};

use crate::log_or_err;
use crate::process::locate::Preamble;
use crate::process::parse::{DescriptionText, ParserState};
use crate::structs::MAX_PROGRAMS;
use crate::structs::frame::FrameInfo;
use crate::structs::timecode::Timecode;
use crate::utils::errors::{BitError, SequenceError};
use crate::utils::word_reader::WordReader;

/// Frames scanned for description text when a stream is opened. The text
/// protocol repeats well within this window, so the sweep finds every
/// transmitted message regardless of where the sequence starts.
const DESCRIPTION_SCAN_FRAMES: u64 = 70;

pub struct Sequencer<R: Read + Seek> {
    reader: WordReader<R>,
    state: ParserState,
    total_frames: u64,
    /// Index of the next frame to be delivered.
    position: u64,
    /// Frame counter and timecode of the last delivered frame, for the
    /// continuity checks.
    previous: Option<(u16, Timecode)>,
}

impl<R: Read + Seek> Sequencer<R> {
    /// Opens a stream: counts its frames and collects the program
    /// description texts from the leading frames, leaving the sequencer
    /// positioned at frame zero.
    pub fn new(src: R) -> Result<Self> {
        let mut sequencer = Self {
            reader: WordReader::new(src),
            state: ParserState::default(),
            total_frames: 0,
            position: 0,
            previous: None,
        };

        sequencer.total_frames = sequencer.count_frames()?;
        sequencer.collect_descriptions()?;
        sequencer.reader.rewind()?;

        Ok(sequencer)
    }

    /// Total number of frames found in the stream.
    pub fn frames(&self) -> u64 {
        self.total_frames
    }

    /// Index of the next frame [`Self::next_frame`] will deliver.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn descriptions(&self) -> &[DescriptionText; MAX_PROGRAMS] {
        &self.state.descriptions
    }

    /// Raises (or lowers) the level at which diagnostics become hard
    /// errors. `log::Level::Warn` makes warnings fatal.
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.state.fail_level = level;
    }

    /// Locates and parses the next frame.
    pub fn next_frame(&mut self) -> Result<FrameInfo> {
        let preamble = Preamble::locate(&mut self.reader)?;
        let frame = FrameInfo::read(
            &mut self.state,
            &mut self.reader,
            preamble.bit_depth,
            preamble.frame_words,
        )?;
        self.position += 1;

        if let Some((prev_count, prev_timecode)) = self.previous {
            if frame.frame_count != prev_count.wrapping_add(1) {
                log_or_err!(
                    self.state,
                    log::Level::Warn,
                    anyhow!(SequenceError::NonSequentialFrameCount {
                        prev: prev_count,
                        read: frame.frame_count,
                    })
                );
            }
            if !frame.timecode.is_successor_of(&prev_timecode, frame.frame_rate) {
                log_or_err!(
                    self.state,
                    log::Level::Warn,
                    anyhow!(SequenceError::NonSequentialTimecode {
                        prev: prev_timecode.to_string(),
                        read: frame.timecode.to_string(),
                    })
                );
            }
        }
        self.previous = Some((frame.frame_count, frame.timecode));

        Ok(frame)
    }

    /// Advances past the next frame without parsing its body.
    pub fn skip_frame(&mut self) -> Result<()> {
        Preamble::locate(&mut self.reader)?;
        self.position += 1;

        Ok(())
    }

    /// Positions the sequencer so the next delivered frame is
    /// `frame_no`, rewinding first when seeking backwards.
    pub fn seek(&mut self, frame_no: u64) -> Result<()> {
        if frame_no < self.position {
            self.reader.rewind()?;
            self.position = 0;
            self.previous = None;
        }

        while self.position < frame_no {
            self.skip_frame()?;
        }

        Ok(())
    }

    /// Counts the frames in the stream by scanning preambles, restoring
    /// the read position afterwards.
    pub fn count_frames(&mut self) -> Result<u64> {
        let saved = self.reader.stream_position()?;
        self.reader.rewind()?;

        let mut count = 0;
        loop {
            match Preamble::locate(&mut self.reader) {
                Ok(_) => count += 1,
                Err(e) if is_eof(&e) => break,
                Err(e) => return Err(e),
            }
        }

        self.reader.seek_to(saved)?;

        Ok(count)
    }

    /// Parses the leading frames so every program's description text has
    /// been seen, restoring the read position afterwards.
    fn collect_descriptions(&mut self) -> Result<()> {
        let saved = self.reader.stream_position()?;
        self.reader.rewind()?;

        for _ in 0..self.total_frames.min(DESCRIPTION_SCAN_FRAMES) {
            let preamble = Preamble::locate(&mut self.reader)?;
            FrameInfo::read(
                &mut self.state,
                &mut self.reader,
                preamble.bit_depth,
                preamble.frame_words,
            )?;
        }

        self.reader.seek_to(saved)?;

        Ok(())
    }
}

fn is_eof(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<BitError>(), Some(BitError::Eof))
}
