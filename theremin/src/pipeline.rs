//! The per-frame control path and the loop that drives it.
//!
//! `ControlPipeline` is pure per tick: detections in, a [`TickReport`] out.
//! `ControlLoop` adds the side effects: it pulls frames from a
//! [`DetectionSource`], pushes set-points into the [`ToneDriver`], and tears
//! both down in the right order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hand_signal::{Activity, Detection, HandResolver, IdentifiedPair, ResolveFailure, SignalTracker};
use tone_map::{ParameterMapper, SynthesisParameters};

use crate::source::{DetectionSource, SourceError};
use crate::tone::{Oscillator, ToneDriver, ToneError};

// ════════════════════════════════════════════════════════════════════════════
// ReleasePolicy
// ════════════════════════════════════════════════════════════════════════════

/// Fade to the amplitude floor after too many held ticks in a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleasePolicy {
    pub after_frames: u32,
}

// ════════════════════════════════════════════════════════════════════════════
// ControlPipeline
// ════════════════════════════════════════════════════════════════════════════

/// Outcome of one frame.
#[derive(Clone, Debug)]
pub struct TickReport {
    /// Resolved from this frame.
    pub pair:     Option<IdentifiedPair>,
    /// The pair the current parameters came from; kept while holding.
    pub active:   Option<IdentifiedPair>,
    pub failure:  Option<ResolveFailure>,
    pub activity: Activity,
    /// `None` only on a cold tick.
    pub params:   Option<SynthesisParameters>,
    /// The release policy silenced this tick.
    pub released: bool,
}

pub struct ControlPipeline {
    tracker:  SignalTracker,
    mapper:   ParameterMapper,
    release:  Option<ReleasePolicy>,
    held_run: u32,
}

impl ControlPipeline {
    pub fn new(resolver: HandResolver, mapper: ParameterMapper) -> Self {
        ControlPipeline {
            tracker:  SignalTracker::new(resolver),
            mapper,
            release:  None,
            held_run: 0,
        }
    }

    pub fn with_release(mut self, policy: Option<ReleasePolicy>) -> Self {
        self.release = policy;
        self
    }

    pub fn mapper(&self) -> &ParameterMapper { &self.mapper }
    pub fn tracker(&self) -> &SignalTracker { &self.tracker }

    pub fn process(&mut self, detections: &[Detection]) -> TickReport {
        let obs = self.tracker.observe(detections);

        self.held_run = if obs.activity.is_held() { self.held_run.saturating_add(1) } else { 0 };

        let mut params = obs.activity.signal().map(|s| self.mapper.map(&s));
        let mut released = false;
        if let (Some(policy), Some(p)) = (self.release, params.as_mut()) {
            if self.held_run > 0 && self.held_run >= policy.after_frames {
                if self.held_run == policy.after_frames {
                    tracing::debug!("released after {} held frames", self.held_run);
                }
                p.amplitude = self.mapper.config().amplitude.min;
                released = true;
            }
        }

        TickReport {
            pair:     obs.pair,
            active:   obs.active,
            failure:  obs.failure,
            activity: obs.activity,
            params,
            released,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// StopSignal
// ════════════════════════════════════════════════════════════════════════════

/// Shared quit flag.  Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self { Self::default() }

    pub fn stop(&self) { self.0.store(true, Ordering::Release); }

    pub fn is_stopped(&self) -> bool { self.0.load(Ordering::Acquire) }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlLoop
// ════════════════════════════════════════════════════════════════════════════

/// One processed frame, as shown to observers such as the overlay.
#[derive(Clone, Debug)]
pub struct Tick {
    pub index:      u64,
    pub detections: Vec<Detection>,
    pub report:     TickReport,
    /// Whether the driver accepted the set-point.
    pub applied:    bool,
}

pub enum Step {
    Tick(Tick),
    Skipped(SourceError),
    Ended,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub frames:   u64,
    pub fresh:    u64,
    pub held:     u64,
    pub cold:     u64,
    pub skipped:  u64,
    pub released: u64,
}

pub struct ControlLoop<S: DetectionSource, O: Oscillator> {
    source:     Option<S>,
    driver:     ToneDriver<O>,
    pipeline:   ControlPipeline,
    stats:      LoopStats,
    max_frames: Option<u64>,
}

impl<S: DetectionSource, O: Oscillator> ControlLoop<S, O> {
    pub fn new(source: S, driver: ToneDriver<O>, pipeline: ControlPipeline) -> Self {
        ControlLoop { source: Some(source), driver, pipeline, stats: LoopStats::default(), max_frames: None }
    }

    /// Stop after this many processed frames.
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.max_frames = limit;
        self
    }

    pub fn start(&mut self) -> Result<(), ToneError> {
        self.driver.start()
    }

    /// Pull and process one frame.  Cold ticks issue no parameters; source
    /// errors leave the cache and the driver untouched.
    pub fn step(&mut self) -> Step {
        let Some(source) = self.source.as_mut() else { return Step::Ended };

        let detections = match source.next_frame() {
            Ok(Some(d)) => d,
            Ok(None)    => return Step::Ended,
            Err(e) => {
                self.stats.skipped += 1;
                return Step::Skipped(e);
            }
        };

        let report = self.pipeline.process(&detections);
        let applied = match &report.params {
            Some(p) => self.driver.apply(p),
            None    => false,
        };

        match report.activity {
            Activity::Fresh(_) => self.stats.fresh += 1,
            Activity::Held(_)  => self.stats.held  += 1,
            Activity::Cold     => self.stats.cold  += 1,
        }
        if report.released {
            self.stats.released += 1;
        }
        let index = self.stats.frames;
        self.stats.frames += 1;

        if let Some(p) = &report.params {
            tracing::trace!(frame = index, amp = p.amplitude, freq = p.frequency, "{}", report.activity.label());
        }
        Step::Tick(Tick { index, detections, report, applied })
    }

    /// Run until `stop` is raised, the source ends, the frame limit is hit,
    /// or `on_tick` returns `false`.  Always finishes the loop.
    pub fn run<F>(&mut self, stop: &StopSignal, mut on_tick: F) -> LoopStats
    where
        F: FnMut(&Tick, &ToneDriver<O>) -> bool,
    {
        let name = self.source.as_ref().map(|s| s.name().to_string()).unwrap_or_default();
        tracing::info!("control loop running on {}", name);

        while !stop.is_stopped() {
            if self.max_frames.is_some_and(|m| self.stats.frames >= m) {
                tracing::info!("frame limit reached");
                break;
            }
            match self.step() {
                Step::Tick(tick) => {
                    if !on_tick(&tick, &self.driver) {
                        break;
                    }
                }
                Step::Skipped(e) => tracing::warn!("frame skipped: {}", e),
                Step::Ended => {
                    tracing::info!("{} ended", name);
                    break;
                }
            }
        }
        self.finish();
        self.stats
    }

    /// Stop the tone first, then release the source.
    pub fn finish(&mut self) {
        self.driver.stop();
        if self.source.take().is_some() {
            tracing::debug!("detection source released");
        }
    }

    pub fn stats(&self) -> LoopStats { self.stats }
    pub fn driver(&self) -> &ToneDriver<O> { &self.driver }
    pub fn pipeline(&self) -> &ControlPipeline { &self.pipeline }
}

impl<S: DetectionSource, O: Oscillator> Drop for ControlLoop<S, O> {
    fn drop(&mut self) {
        self.finish();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
