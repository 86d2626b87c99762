//! Convert a WAV file from one speaker's voice to another's
//!
//! Usage:
//!     cargo run --release --features cli,onnx --bin voice_convert -- \
//!         --model G_latest.onnx --input input.wav --target taffy

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vits_vc::models::OnnxVoiceConversion;
use vits_vc::{parse_device, ConversionEngine, ConversionStatus, RawAudio, VcConfig};

/// Convert recorded speech to a fine-tuned speaker's voice
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Exported voice conversion model
    #[arg(short, long, default_value = "./G_latest.onnx")]
    model: PathBuf,

    /// Model hyperparameter file
    #[arg(short, long, default_value = "./configs/finetune_speaker.json")]
    config: PathBuf,

    /// Input WAV file
    #[arg(short, long, required_unless_present = "list_speakers")]
    input: Option<PathBuf>,

    /// Output WAV file
    #[arg(short, long, default_value = "converted.wav")]
    output: PathBuf,

    /// Speaker of the input recording
    #[arg(short = 'S', long, default_value = "User")]
    source: String,

    /// Speaker to convert to (defaults to the first configured speaker)
    #[arg(short = 'T', long)]
    target: Option<String>,

    /// Device: auto, cpu, cuda, cuda:N, metal
    #[arg(long, default_value = "auto")]
    device: String,

    /// Print the configured speakers and exit
    #[arg(long)]
    list_speakers: bool,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let config = VcConfig::from_file(&args.config)?;

    if args.list_speakers {
        for (name, id) in &config.speakers {
            println!("{id}\t{name}");
        }
        return Ok(());
    }

    let device = parse_device(&args.device)?;
    let model = OnnxVoiceConversion::from_file(&args.model)?;
    let engine = ConversionEngine::from_config(&config, model, device)?;

    let target = match args.target {
        Some(target) => target,
        None => engine
            .registry()
            .names()
            .first()
            .cloned()
            .context("Config lists no speakers")?,
    };

    let input = args
        .input
        .as_ref()
        .context("--input is required for conversion")?;
    let audio = RawAudio::load(input)?;

    println!("Source: {}", args.source);
    println!("Target: {}", target);
    println!(
        "Input: {} ({} Hz, {} ch, {:.2}s)",
        input.display(),
        audio.sample_rate,
        audio.channels,
        audio.frames() as f64 / audio.sample_rate.max(1) as f64
    );

    let result = engine.convert_inputs(&args.source, &target, None, Some(audio));
    match result.status {
        ConversionStatus::Success => {
            let clip = result
                .output_audio
                .context("Successful conversion returned no audio")?;
            clip.save(&args.output)?;
            println!(
                "Saved {:.2}s at {} Hz to {}",
                clip.duration(),
                clip.sample_rate,
                args.output.display()
            );
            Ok(())
        }
        ConversionStatus::InputMissing | ConversionStatus::Failure => {
            anyhow::bail!("{}", result.message)
        }
    }
}
