use std::fs;

use anyhow::{Context, Result};
use indicatif::MultiProgress;
use log::Level;

use super::command::{Cli, SadmArgs};
use super::open_sequencer;

pub fn cmd_sadm(args: &SadmArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let mut sequencer = open_sequencer(&args.input, multi)?;
    if cli.strict {
        sequencer.set_fail_level(Level::Warn);
    }

    let frame = sequencer.next_frame().context("Error parsing Dolby E frame")?;
    let xml = dolbye::sadm::document(&frame, sequencer.descriptions())?;

    match &args.output {
        Some(path) => {
            fs::write(path, &xml)
                .with_context(|| format!("Unable to write XML to {}", path.display()))?;
            log::info!("Wrote S-ADM document to {}", path.display());
        }
        None => print!("{xml}"),
    }

    Ok(())
}
