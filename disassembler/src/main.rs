use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser as ClapParser, Subcommand};
use rdt_script::config::EngineConfig;

mod listing;
mod runner;

use listing::Disassembler;

/// List or run room scripts
#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Engine configuration (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write every entry point's instructions as YAML
    Disasm {
        #[arg(short, long, required = true)]
        input: PathBuf,

        /// Defaults to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run a room script headless and print the resulting state as YAML
    Run {
        #[arg(short, long, required = true)]
        input: PathBuf,

        /// Init script to run once before the room script
        #[arg(long)]
        init: Option<PathBuf>,

        #[arg(short, long, default_value_t = 30)]
        ticks: usize,
    },
}

fn output_writer(output: Option<PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::read_json(path)?,
        None => EngineConfig::default(),
    };

    env_logger::Builder::new()
        .filter_level(config.logger.level_filter)
        .parse_default_env()
        .init();

    match args.command {
        Command::Disasm { input, output } => {
            let mut disassembler = Disassembler::new(&input)?;
            disassembler.disassemble();
            log::info!(
                "{}: {} entries, {} bytes",
                input.display(),
                disassembler.entries().len(),
                disassembler.stream().len()
            );
            let mut writer = output_writer(output)?;
            disassembler.write_insts(&mut writer)?;
            writer.flush()?;
        }
        Command::Run { input, init, ticks } => {
            let room = runner::load_stream(&input)?;
            let init = init.map(runner::load_stream).transpose()?;
            let report = runner::run(&config, init.as_ref(), &room, ticks)?;
            let mut writer = output_writer(None)?;
            serde_yaml::to_writer(&mut writer, &report)?;
            writer.flush()?;
        }
    }

    Ok(())
}
