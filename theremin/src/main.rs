//! visual_theremin — command-line entry point.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hand_signal::ResolverConfig;
use theremin::app::{run, AppConfig, SourceKind};
use theremin::tone::AudioBackend;
use tone_map::{MappingConfig, Span};

#[derive(Parser)]
#[command(name = "visual_theremin")]
#[command(about = "Play a theremin with two hands in front of a camera")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    opts: GlobalOpts,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulated hands, driven by the mouse (default).
    Sim,

    /// Play back a recorded JSON-lines detection file.
    Replay {
        file: PathBuf,

        /// Playback rate in frames per second.
        #[arg(long, default_value = "30")]
        fps: f32,
    },

    /// Run an external hand estimator and read JSON lines from its stdout.
    Exec {
        program: String,

        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Read hands from a LeapMotion controller.
    #[cfg(feature = "leap")]
    Leap,
}

#[derive(Debug, Clone, Args)]
struct GlobalOpts {
    /// Run without the overlay window.
    #[arg(long, global = true)]
    headless: bool,

    /// Do not open an audio device.
    #[arg(long, global = true)]
    mute: bool,

    /// Minimum handedness score; detections at or below it are ignored.
    #[arg(long, global = true, default_value_t = ResolverConfig::default().min_confidence)]
    min_confidence: f32,

    /// Finger height (normalized y) giving full volume.
    #[arg(long, global = true, default_value_t = tone_map::HEIGHT_MIN)]
    height_min: f32,

    /// Finger height (normalized y) giving the volume floor.
    #[arg(long, global = true, default_value_t = tone_map::HEIGHT_MAX)]
    height_max: f32,

    /// Leftmost reach (normalized x) giving the top frequency.
    #[arg(long, global = true, default_value_t = tone_map::WIDTH_MIN)]
    width_min: f32,

    /// Leftmost reach (normalized x) giving the bottom frequency.
    #[arg(long, global = true, default_value_t = tone_map::WIDTH_MAX)]
    width_max: f32,

    #[arg(long, global = true, default_value_t = tone_map::AMPLITUDE_MIN)]
    amp_min: f32,

    #[arg(long, global = true, default_value_t = tone_map::AMPLITUDE_MAX)]
    amp_max: f32,

    /// Lowest frequency in Hz.
    #[arg(long, global = true, default_value_t = tone_map::FREQUENCY_MIN_HZ)]
    freq_min: f32,

    /// Highest frequency in Hz.
    #[arg(long, global = true, default_value_t = tone_map::FREQUENCY_MAX_HZ)]
    freq_max: f32,

    /// Fade to the volume floor after this many frames without hands.
    #[arg(long, global = true, value_name = "FRAMES")]
    release_after: Option<u32>,

    /// Stop after this many frames.
    #[arg(long, global = true, value_name = "N")]
    frames: Option<u64>,
}

fn build_config(opts: &GlobalOpts, command: Option<Commands>) -> AppConfig {
    let source = match command.unwrap_or(Commands::Sim) {
        Commands::Sim                      => SourceKind::Sim,
        Commands::Replay { file, fps }     => SourceKind::Replay { path: file, fps },
        Commands::Exec { program, args }   => SourceKind::Exec { program, args },
        #[cfg(feature = "leap")]
        Commands::Leap                     => SourceKind::Leap,
    };

    AppConfig {
        resolver: ResolverConfig { min_confidence: opts.min_confidence },
        mapping: MappingConfig {
            height:    Span::new(opts.height_min, opts.height_max),
            width:     Span::new(opts.width_min, opts.width_max),
            amplitude: Span::new(opts.amp_min, opts.amp_max),
            frequency: Span::new(opts.freq_min, opts.freq_max),
        },
        source,
        audio: if opts.mute { AudioBackend::Null } else { AudioBackend::Device },
        window: !opts.headless,
        release_after: opts.release_after,
        max_frames: opts.frames,
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = build_config(&cli.opts, cli.command);

    println!();
    println!("╔══════════════════════════════════════════════╗");
    println!("║        Visual Theremin: two-hand tone        ║");
    println!("╚══════════════════════════════════════════════╝");
    println!();
    println!("  Source: {}", cfg.source.describe());
    println!("  Height {:.2}..{:.2} → volume {:.3}..{:.3}",
        cfg.mapping.height.min, cfg.mapping.height.max,
        cfg.mapping.amplitude.max, cfg.mapping.amplitude.min);
    println!("  Reach  {:.2}..{:.2} → pitch  {:.1}..{:.1} Hz",
        cfg.mapping.width.min, cfg.mapping.width.max,
        cfg.mapping.frequency.max, cfg.mapping.frequency.min);
    println!();

    match run(cfg) {
        Ok(stats) => {
            println!("  {} frames processed.", stats.frames);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
