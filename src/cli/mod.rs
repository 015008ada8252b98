pub mod command;
pub mod info;
pub mod sadm;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use dolbye::process::sequence::Sequencer;

/// Opens a Dolby E stream and scans it, showing a spinner while the
/// opening frame count and description sweep run.
pub fn open_sequencer(
    input: &Path,
    multi: Option<&MultiProgress>,
) -> Result<Sequencer<BufReader<File>>> {
    let file = File::open(input)
        .with_context(|| format!("Unable to open input file {}", input.display()))?;

    let pb = match multi {
        Some(multi) => {
            let pb = multi.add(ProgressBar::new_spinner());
            pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message("Scanning frames...");
            Some(pb)
        }
        None => None,
    };

    let sequencer = Sequencer::new(BufReader::new(file));

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    sequencer.with_context(|| format!("Unable to read Dolby E stream {}", input.display()))
}
