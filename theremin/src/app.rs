//! Application wiring: configuration → source, overlay, tone driver, loop.

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Context;
use hand_signal::{HandResolver, ResolverConfig};
use tone_map::{MappingConfig, ParameterMapper};

use crate::pipeline::{ControlLoop, ControlPipeline, LoopStats, ReleasePolicy, StopSignal};
use crate::source::{self, DetectionSource, Paced, SimInput, SimSource, SubprocessSource};
use crate::tone::{open_audio_output, AudioBackend, ToneDriver};
use crate::visualizer::Overlay;

/// Frame rate for the window-less simulator.
const HEADLESS_SIM_FPS: f32 = 60.0;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where detections come from.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceKind {
    /// Mouse/keyboard simulation (sweeps on its own without a window).
    Sim,
    /// A recorded JSON-lines file, played back at `fps`.
    Replay { path: PathBuf, fps: f32 },
    /// An external estimator writing JSON lines to stdout.
    Exec { program: String, args: Vec<String> },
    #[cfg(feature = "leap")]
    Leap,
}

impl SourceKind {
    pub fn describe(&self) -> String {
        match self {
            SourceKind::Sim                      => "simulator".to_string(),
            SourceKind::Replay { path, fps }     => format!("replay of {} at {} fps", path.display(), fps),
            SourceKind::Exec { program, .. }     => format!("estimator `{}`", program),
            #[cfg(feature = "leap")]
            SourceKind::Leap                     => "LeapMotion".to_string(),
        }
    }
}

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub resolver:      ResolverConfig,
    pub mapping:       MappingConfig,
    pub source:        SourceKind,
    pub audio:         AudioBackend,
    /// Open the overlay window.
    pub window:        bool,
    /// Silence after this many consecutive held frames.
    pub release_after: Option<u32>,
    /// Stop after this many processed frames.
    pub max_frames:    Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            resolver:      ResolverConfig::default(),
            mapping:       MappingConfig::default(),
            source:        SourceKind::Sim,
            audio:         AudioBackend::Device,
            window:        true,
            release_after: None,
            max_frames:    None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

fn open_source(
    kind:   &SourceKind,
    sim_rx: Option<mpsc::Receiver<SimInput>>,
) -> anyhow::Result<Box<dyn DetectionSource>> {
    let src: Box<dyn DetectionSource> = match kind {
        SourceKind::Sim => match sim_rx {
            Some(rx) => Box::new(SimSource::new(rx)),
            None     => Box::new(Paced::new(SimSource::sweeping(), HEADLESS_SIM_FPS)),
        },
        SourceKind::Replay { path, fps } => {
            let replay = source::open_replay(path)
                .with_context(|| format!("could not open replay {}", path.display()))?;
            Box::new(Paced::new(replay, *fps))
        }
        SourceKind::Exec { program, args } => Box::new(
            SubprocessSource::spawn(program, args)
                .with_context(|| format!("could not start estimator `{}`", program))?,
        ),
        #[cfg(feature = "leap")]
        SourceKind::Leap => Box::new(
            source::LeapSource::open().context("could not open LeapMotion controller")?,
        ),
    };
    Ok(src)
}

/// Run the full application until the window closes, the source ends, or
/// the frame limit is reached.
///
/// Configuration is validated before any device is opened.  On exit the tone
/// is stopped before the detection source is released.
pub fn run(cfg: AppConfig) -> anyhow::Result<LoopStats> {
    let resolver = HandResolver::new(cfg.resolver).context("invalid resolver configuration")?;
    let mapper   = ParameterMapper::new(cfg.mapping).context("invalid mapping configuration")?;

    let stop = StopSignal::new();

    // ── Overlay (owns the sim input sender when simulating) ──────────────
    let (sim_tx, sim_rx) = if cfg.window && cfg.source == SourceKind::Sim {
        let (tx, rx) = mpsc::channel::<SimInput>();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };
    let mut overlay = if cfg.window {
        Some(Overlay::new(sim_tx, stop.clone(), cfg.mapping).context("could not open overlay window")?)
    } else {
        None
    };

    let source = open_source(&cfg.source, sim_rx)?;
    tracing::info!("detections from {}", cfg.source.describe());

    let pipeline = ControlPipeline::new(resolver, mapper)
        .with_release(cfg.release_after.map(|after_frames| ReleasePolicy { after_frames }));
    let driver = ToneDriver::new(open_audio_output(cfg.audio));

    let mut control = ControlLoop::new(source, driver, pipeline).with_frame_limit(cfg.max_frames);
    control.start().context("could not start oscillator")?;

    let stats = control.run(&stop, |tick, driver| match overlay.as_mut() {
        Some(o) => {
            o.render(Some(tick), driver.state());
            o.poll_input()
        }
        None => true,
    });

    tracing::info!(
        "{} frames: {} tracking, {} holding, {} waiting, {} skipped, {} released",
        stats.frames, stats.fresh, stats.held, stats.cold, stats.skipped, stats.released,
    );
    Ok(stats)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tone_map::Span;

    fn headless(source: SourceKind) -> AppConfig {
        AppConfig {
            source,
            audio: AudioBackend::Null,
            window: false,
            ..AppConfig::default()
        }
    }

    #[test]
    fn degenerate_mapping_fails_before_opening_anything() {
        let mut cfg = headless(SourceKind::Replay { path: "/nonexistent/frames.jsonl".into(), fps: 30.0 });
        cfg.mapping.height = Span::new(0.5, 0.5);
        let err = run(cfg).unwrap_err();
        assert!(err.to_string().contains("mapping"), "{}", err);
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let mut cfg = headless(SourceKind::Sim);
        cfg.resolver.min_confidence = 1.5;
        assert!(run(cfg).is_err());
    }

    #[test]
    fn missing_replay_is_an_error() {
        let cfg = headless(SourceKind::Replay { path: "/nonexistent/frames.jsonl".into(), fps: 30.0 });
        assert!(run(cfg).is_err());
    }

    #[test]
    fn headless_sim_honours_frame_limit() {
        let mut cfg = headless(SourceKind::Sim);
        cfg.max_frames = Some(5);
        let stats = run(cfg).unwrap();
        assert_eq!(stats.frames, 5);
        assert_eq!(stats.fresh, 5);
    }

    #[test]
    fn replay_runs_to_end_of_file() {
        let path = std::env::temp_dir().join(format!("theremin-replay-{}.jsonl", std::process::id()));
        fs::write(&path, "{\"hands\":[]}\nnot json\n{\"hands\":[]}\n").unwrap();

        let stats = run(headless(SourceKind::Replay { path: path.clone(), fps: 1000.0 })).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(stats.frames, 2);
        assert_eq!(stats.cold, 2);
        assert_eq!(stats.skipped, 1);
    }
}
