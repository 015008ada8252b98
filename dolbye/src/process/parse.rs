//! Parser-wide state.
//!
//! Holds the failure level for escalating warnings and the per-program
//! description text collectors, which live across frames: each frame
//! transmits a single character per program and the full text is assembled
//! over a rolling window of frames.

use std::str;

use anyhow::{Result, anyhow};

use crate::log_or_err;
use crate::structs::{MAX_DESC_TEXT_LEN, MAX_PROGRAMS};
use crate::utils::errors::MetadataError;

/// One program's description text being assembled across frames.
///
/// STX resets the cursor, ETX terminates the text and marks it received
/// when non-empty, printable characters append at the cursor. A program
/// whose text has been received ignores further characters.
#[derive(Debug, Clone, Copy)]
pub struct DescriptionText {
    buf: [u8; MAX_DESC_TEXT_LEN],
    cursor: usize,
    received: bool,
    overflowed: bool,
    null_warned: bool,
}

impl Default for DescriptionText {
    fn default() -> Self {
        Self {
            buf: [0; MAX_DESC_TEXT_LEN],
            cursor: 0,
            received: false,
            overflowed: false,
            null_warned: false,
        }
    }
}

impl DescriptionText {
    /// The completed text, once an ETX has marked it received.
    pub fn text(&self) -> Option<&str> {
        if !self.received {
            return None;
        }
        str::from_utf8(&self.buf[..self.cursor]).ok()
    }

    pub fn is_received(&self) -> bool {
        self.received
    }
}

pub struct ParserState {
    /// Diagnostics at or below this level become hard errors.
    pub fail_level: log::Level,
    pub descriptions: [DescriptionText; MAX_PROGRAMS],
}

impl Default for ParserState {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,
            descriptions: [DescriptionText::default(); MAX_PROGRAMS],
        }
    }
}

impl ParserState {
    /// Applies one transmitted description character to program `pgm`.
    pub(crate) fn push_description_char(&mut self, pgm: usize, byte: u8) -> Result<()> {
        if self.descriptions[pgm].received {
            return Ok(());
        }

        match byte {
            0x00 => {
                let desc = &mut self.descriptions[pgm];
                if !desc.null_warned {
                    desc.null_warned = true;
                    log::warn!("{}", MetadataError::NullDescriptionChar(pgm));
                }
            }
            0x02 => self.descriptions[pgm].cursor = 0,
            0x03 => {
                let desc = &mut self.descriptions[pgm];
                if desc.cursor > 0 {
                    desc.received = true;
                }
            }
            0x20..=0x7E => {
                let desc = &mut self.descriptions[pgm];
                if desc.cursor < MAX_DESC_TEXT_LEN - 1 {
                    desc.buf[desc.cursor] = byte;
                    desc.cursor += 1;
                } else {
                    desc.overflowed = true;
                    log_or_err!(
                        self,
                        log::Level::Warn,
                        anyhow!(MetadataError::DescriptionTooLong(pgm))
                    );
                }
            }
            _ => {
                log_or_err!(
                    self,
                    log::Level::Warn,
                    anyhow!(MetadataError::InvalidDescriptionChar { program: pgm, byte })
                );
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(state: &mut ParserState, pgm: usize, bytes: &[u8]) {
        for &b in bytes {
            state.push_description_char(pgm, b).unwrap();
        }
    }

    #[test]
    fn stx_text_etx_marks_received() {
        let mut state = ParserState::default();
        push_all(&mut state, 0, &[0x02, b'H', b'i', 0x03]);
        assert_eq!(state.descriptions[0].text(), Some("Hi"));
    }

    #[test]
    fn received_program_ignores_later_characters() {
        let mut state = ParserState::default();
        push_all(&mut state, 0, &[0x02, b'H', b'i', 0x03]);
        push_all(&mut state, 0, &[0x02, b'X', b'Y', 0x03]);
        assert_eq!(state.descriptions[0].text(), Some("Hi"));
    }

    #[test]
    fn etx_on_empty_buffer_is_not_received() {
        let mut state = ParserState::default();
        push_all(&mut state, 0, &[0x02, 0x03]);
        assert_eq!(state.descriptions[0].text(), None);
    }

    #[test]
    fn overlong_text_truncates_to_capacity() {
        let mut state = ParserState::default();
        state.push_description_char(0, 0x02).unwrap();
        for _ in 0..MAX_DESC_TEXT_LEN {
            state.push_description_char(0, b'a').unwrap();
        }
        state.push_description_char(0, 0x03).unwrap();

        let text = state.descriptions[0].text().unwrap();
        assert_eq!(text.len(), MAX_DESC_TEXT_LEN - 1);
        assert!(state.descriptions[0].overflowed);
    }

    #[test]
    fn control_bytes_do_not_abort_at_default_fail_level() {
        let mut state = ParserState::default();
        assert!(state.push_description_char(0, 0x1B).is_ok());
        assert!(state.push_description_char(0, 0x00).is_ok());
    }

    #[test]
    fn strict_fail_level_escalates_invalid_characters() {
        let mut state = ParserState {
            fail_level: log::Level::Warn,
            ..Default::default()
        };
        assert!(state.push_description_char(0, 0x1B).is_err());
    }

    #[test]
    fn programs_are_independent() {
        let mut state = ParserState::default();
        push_all(&mut state, 0, &[0x02, b'A', 0x03]);
        push_all(&mut state, 1, &[0x02, b'B', 0x03]);
        assert_eq!(state.descriptions[0].text(), Some("A"));
        assert_eq!(state.descriptions[1].text(), Some("B"));
    }
}
