//! `sail` — a small command-line front end over the `sail` crate's facades.
//!
//! Exists mainly to exercise the registry and pipeline end to end; format
//! support depends entirely on which codecs the running binary was linked
//! or configured to load.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use sail::facade::DeepDiverSave;
use sail::{CodecRegistry, Error};
use sail_common::compression::Compression;
use sail_common::io::FileIo;

#[derive(Parser)]
#[command(name = "sail", version, about = "Load, convert, and inspect images through the sail codec registry", disable_version_flag = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print version information and exit.
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: (),

    /// Increase log verbosity (repeatable: -l info, -ll debug, -lll trace).
    #[arg(short = 'l', long = "log-level", global = true, action = clap::ArgAction::Count)]
    log_level: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Decode `input` and re-encode it as `output`, converting pixel format
    /// and/or compression along the way.
    Convert {
        input: PathBuf,
        output: PathBuf,

        /// Output compression, by name (e.g. NONE, DEFLATE, JPEG).
        #[arg(short = 'c', long = "compression")]
        compression: Option<String>,
    },

    /// List every codec the registry currently knows about.
    List {
        /// Print each codec's load/save feature flags too.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Identify a file's codec and print its header, without converting it.
    Probe { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.log_level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::new(filter)).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sail: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Convert { input, output, compression } => convert(&input, &output, compression.as_deref()),
        Command::List { verbose } => list(verbose),
        Command::Probe { path } => probe(&path),
    }
}

fn convert(input: &std::path::Path, output: &std::path::Path, compression: Option<&str>) -> Result<(), Error> {
    let image = sail::load_from_file(input)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::BrokenImage("input stream contained no frames"))?;

    let info = CodecRegistry::global().from_path(output)?;

    let target_format = *info
        .save_features
        .pixel_formats
        .iter()
        .find(|f| **f == image.pixel_format)
        .unwrap_or_else(|| info.save_features.pixel_formats.first().unwrap_or(&image.pixel_format));

    let converted = if target_format == image.pixel_format {
        image
    } else {
        sail::convert_image(&image, target_format, &Default::default())?
    };

    let mut save_options = sail_common::options::SaveOptions::from_save_features(&info.save_features);
    if let Some(name) = compression {
        save_options.compression = Compression::from_str_strict(&name.to_uppercase())?;
    }

    let mut io = FileIo::open_for_writing(output)?;
    let mut session = DeepDiverSave::begin(&mut io, &info.name, &save_options)?;
    session.write_frame(&converted, 1)?;
    session.finish()?;
    println!("wrote {}", output.display());
    Ok(())
}

fn list(verbose: bool) -> Result<(), Error> {
    for info in CodecRegistry::global().infos() {
        println!("{:<16} priority={:<5} extensions={}", info.name, info.priority, info.extensions.join(","));
        if verbose {
            println!("  mime-types: {}", info.mime_types.join(","));
            println!("  load: {:?}", info.load_features.features);
            println!("  save: {:?} formats={}", info.save_features.features, info.save_features.pixel_formats.len());
        }
    }
    Ok(())
}

fn probe(path: &std::path::Path) -> Result<(), Error> {
    let (image, info) = sail::probe_file(path)?;
    println!("codec: {}", info.name);
    println!("dimensions: {}x{}", image.width, image.height);
    println!("pixel format: {}", image.pixel_format.as_str());
    println!("orientation: {:?}", image.orientation);
    Ok(())
}
