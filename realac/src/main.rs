use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use realac::EncodeOptions;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "realac")]
#[command(author = "NellowTCS")]
#[command(version)]
#[command(about = "Apple Lossless (ALAC) audio converter", long_about = None)]
struct Cli {
    /// Log codec decisions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode audio file to ALAC
    Encode {
        /// Input audio file (wav, flac, mp3, ogg, etc.)
        input: PathBuf,
        /// Output ALAC stream
        output: PathBuf,
        /// PCM frames per frameset
        #[arg(long, default_value = "4096")]
        block_size: u32,
        /// Starting value of the Rice history
        #[arg(long, default_value = "10")]
        initial_history: u32,
        /// Rice history adaptation rate (0-255)
        #[arg(long, default_value = "40")]
        history_multiplier: u32,
        /// Largest Rice parameter (1-24)
        #[arg(long, default_value = "14")]
        maximum_k: u32,
        /// Output bit depth (16 or 24, default follows the source)
        #[arg(short, long)]
        bits: Option<u32>,
    },
    /// Decode ALAC stream to WAV
    Decode {
        /// Input ALAC stream
        input: PathBuf,
        /// Output WAV file
        output: PathBuf,
    },
    /// Show information about an ALAC stream
    Info {
        /// Input ALAC stream
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Decode an ALAC stream fully to check it
    Validate {
        /// Input ALAC stream
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Encode {
            input,
            output,
            block_size,
            initial_history,
            history_multiplier,
            maximum_k,
            bits,
        } => {
            let options = EncodeOptions {
                bits,
                block_size,
                initial_history,
                history_multiplier,
                maximum_k,
            };
            encode(&input, &output, &options)?;
        }
        Commands::Decode { input, output } => {
            decode(&input, &output)?;
        }
        Commands::Info { input, json } => {
            info(&input, json)?;
        }
        Commands::Validate { input } => {
            validate(&input)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "realac=debug,libalac_audio=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn encode(input: &PathBuf, output: &PathBuf, options: &EncodeOptions) -> Result<()> {
    println!("Reading {}...", input.display());

    let audio =
        realac::audio::read_audio_file(input, options.bits).context("Failed to read audio file")?;

    if let Some(ref format) = audio.source_format {
        println!("  Format: {}", format);
    }
    println!("  Sample rate: {} Hz", audio.sample_rate);
    println!("  Channels: {}", audio.channels);
    println!("  Bit depth: {}", audio.bits_per_sample);
    println!("  Duration: {:.2}s", audio.duration_secs());

    println!("Encoding to ALAC...");

    let alac_data = realac::encode_samples(&audio, options)?;

    fs::write(output, &alac_data).context("Failed to write output file")?;

    let original_size = audio.samples.len() * audio.bits_per_sample as usize / 8;
    let ratio = original_size as f64 / alac_data.len() as f64;

    println!("Done!");
    println!("  Output: {}", output.display());
    println!(
        "  Size: {} bytes ({:.2}x compression)",
        alac_data.len(),
        ratio
    );

    Ok(())
}

fn decode(input: &PathBuf, output: &PathBuf) -> Result<()> {
    println!("Reading {}...", input.display());

    let alac_data = fs::read(input).context("Failed to read ALAC stream")?;

    let file_info = realac::get_alac_info(&alac_data)?;

    println!("  Sample rate: {} Hz", file_info.sample_rate);
    println!("  Channels: {}", file_info.channels);
    println!("  Bit depth: {}", file_info.bits_per_sample);
    println!("  Duration: {:.2}s", file_info.duration_secs);

    println!("Decoding...");

    let audio = realac::decode_file(&alac_data)?;

    println!("Writing WAV...");

    realac::audio::write_wav(output, &audio)?;

    println!("Done!");
    println!("  Output: {}", output.display());

    Ok(())
}

fn info(input: &PathBuf, json: bool) -> Result<()> {
    let alac_data = fs::read(input).context("Failed to read ALAC stream")?;

    let file_info = realac::get_alac_info(&alac_data)?;

    if json {
        let json_str =
            serde_json::to_string_pretty(&file_info).context("Failed to serialize info")?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("ALAC Stream");
    println!("───────────────────────────────");
    println!("  Version:     {}", file_info.version);
    println!("  Sample rate: {} Hz", file_info.sample_rate);
    println!("  Channels:    {}", file_info.channels);
    println!("  Bit depth:   {}", file_info.bits_per_sample);
    println!("  Duration:    {:.2}s", file_info.duration_secs);
    println!("  PCM frames:  {}", file_info.total_pcm_frames);
    println!("  Block size:  {}", file_info.block_size);
    println!("  Framesets:   {}", file_info.framesets);
    println!("  Largest:     {} bytes", file_info.max_frame_bytes);
    println!("  Bit rate:    {} bps", file_info.avg_bit_rate);
    println!("  File size:   {} bytes", file_info.file_size);
    println!("  Compression: {:.2}x", file_info.compression_ratio);
    println!(
        "  Rice:        history {} x{} max k {}",
        file_info.initial_history, file_info.history_multiplier, file_info.maximum_k
    );

    Ok(())
}

fn validate(input: &PathBuf) -> Result<()> {
    let alac_data = fs::read(input).context("Failed to read ALAC stream")?;

    if realac::validate_alac(&alac_data) {
        println!("✓ {} is a valid ALAC stream", input.display());
        Ok(())
    } else {
        bail!("✗ {} is not a valid ALAC stream", input.display())
    }
}
