use anyhow::Result;
use indicatif::MultiProgress;
use log::Level;

use super::command::{Cli, InfoArgs};
use super::open_sequencer;

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing Dolby E stream: {}", args.input.display());

    let mut sequencer = open_sequencer(&args.input, multi)?;
    if cli.strict {
        sequencer.set_fail_level(Level::Warn);
    }

    if sequencer.frames() == 0 {
        println!("No Dolby E frame preamble found in the file.");
        println!("This doesn't appear to be a valid Dolby E stream.");
        return Ok(());
    }

    let frame = sequencer.next_frame()?;

    println!();
    println!("Dolby E Stream Information");
    println!("==========================");
    println!();
    println!("  Frames                    {}", sequencer.frames());
    println!("  Bit depth                 {} bits", frame.bit_depth.bits());
    println!("  Frame length              {} words", frame.frame_length);
    println!("  Frame rate                {}", frame.frame_rate.label());
    println!(
        "  Original frame rate       {}",
        frame.original_frame_rate.label()
    );
    println!(
        "  Program config            {} ({})",
        frame.program_config.label(),
        frame.program_config.code()
    );
    println!("  Programs                  {}", frame.n_programs);
    println!("  Channels                  {}", frame.n_channels);
    match frame.lfe_channel {
        Some(ch) => println!("  LFE channel               {ch}"),
        None => println!("  LFE channel               none"),
    }
    println!("  Key present               {}", frame.key_present);
    println!("  Frame count               {:#06x}", frame.frame_count);
    println!("  SMPTE time code           {}", frame.timecode);
    println!();

    for pgm in 0..frame.n_programs {
        let ac3 = &frame.ac3_metadata.programs[pgm];

        println!("  Program {}", pgm + 1);
        if let Some(text) = sequencer.descriptions()[pgm].text() {
            println!("    Description             {text}");
        }
        println!("    AC-3 acmod              {}", ac3.acmod);
        println!("    AC-3 bsmod              {}", ac3.bsmod);
        println!("    AC-3 data rate code     {}", ac3.datarate);
        println!("    Dialogue level          -{} dBFS", ac3.dialnorm);
        println!("    LFE on                  {}", ac3.lfeon != 0);
    }
    println!();

    Ok(())
}
