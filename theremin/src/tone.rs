//! Tone Driver: owns the one continuously playing oscillator.
//!
//! The oscillator is started once, receives amplitude/frequency set-points
//! every tick that has a signal, and is stopped once at shutdown.  There is
//! no per-note triggering and no resume after stop.

use std::fmt;
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use tone_map::SynthesisParameters;

use crate::voice::{Channel, SharedControls, SineLoopVoice};

// ════════════════════════════════════════════════════════════════════════════
// ToneError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum ToneError {
    NoDevice,
    Device(String),
    UnsupportedFormat(String),
    AlreadyStarted,
    AlreadyStopped,
}

impl fmt::Display for ToneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDevice               => f.write_str("no audio output device"),
            Self::Device(msg)            => write!(f, "audio device error: {}", msg),
            Self::UnsupportedFormat(name) => write!(f, "unsupported sample format {}", name),
            Self::AlreadyStarted         => f.write_str("oscillator already started"),
            Self::AlreadyStopped         => f.write_str("oscillator was stopped and cannot restart"),
        }
    }
}

impl std::error::Error for ToneError {}

// ════════════════════════════════════════════════════════════════════════════
// Oscillator — abstraction over cpal / null (for testing)
// ════════════════════════════════════════════════════════════════════════════

/// The audio engine boundary.  Implementations apply set-points without
/// blocking and without audible discontinuity.
pub trait Oscillator {
    fn start(&mut self) -> Result<(), ToneError>;
    fn stop(&mut self);
    fn set_amplitude(&mut self, amplitude: f32);
    fn set_frequency(&mut self, hz: f32);
    fn route_output(&mut self, channel: Channel);
}

impl<O: Oscillator + ?Sized> Oscillator for Box<O> {
    fn start(&mut self) -> Result<(), ToneError> { (**self).start() }
    fn stop(&mut self)                           { (**self).stop() }
    fn set_amplitude(&mut self, amplitude: f32)  { (**self).set_amplitude(amplitude) }
    fn set_frequency(&mut self, hz: f32)         { (**self).set_frequency(hz) }
    fn route_output(&mut self, channel: Channel) { (**self).route_output(channel) }
}

// ── null backend (used when no audio device is available) ─────────────────

/// Keeps set-points in [`SharedControls`] but renders nothing.
#[derive(Debug, Default)]
pub struct NullOscillator {
    controls: Arc<SharedControls>,
}

impl NullOscillator {
    pub fn new() -> Self { Self::default() }

    pub fn controls(&self) -> Arc<SharedControls> { Arc::clone(&self.controls) }
}

impl Oscillator for NullOscillator {
    fn start(&mut self) -> Result<(), ToneError> {
        self.controls.set_running(true);
        Ok(())
    }
    fn stop(&mut self)                           { self.controls.set_running(false); }
    fn set_amplitude(&mut self, amplitude: f32)  { self.controls.amplitude.store(amplitude); }
    fn set_frequency(&mut self, hz: f32)         { self.controls.frequency.store(hz); }
    fn route_output(&mut self, channel: Channel) { self.controls.route(channel); }
}

// ── cpal backend ──────────────────────────────────────────────────────────

/// Renders a [`SineLoopVoice`] on the default output device.
pub struct CpalOscillator {
    stream:   Option<cpal::Stream>,
    controls: Arc<SharedControls>,
    name:     String,
}

impl CpalOscillator {
    /// Open the default output device and build (but do not play) its stream.
    pub fn open() -> Result<Self, ToneError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(ToneError::NoDevice)?;
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_output_config()
            .map_err(|e| ToneError::Device(e.to_string()))?;
        let format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let controls = Arc::new(SharedControls::default());
        let stream = match format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, &controls)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, &controls)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, &controls)?,
            other => return Err(ToneError::UnsupportedFormat(format!("{:?}", other))),
        };

        tracing::info!(
            "audio output: {} ({} Hz, {} ch, {:?})",
            name, config.sample_rate.0, config.channels, format
        );
        Ok(CpalOscillator { stream: Some(stream), controls, name })
    }

    pub fn device_name(&self) -> &str { &self.name }

    pub fn controls(&self) -> Arc<SharedControls> { Arc::clone(&self.controls) }
}

fn build_stream<T>(
    device:   &cpal::Device,
    config:   &cpal::StreamConfig,
    controls: &Arc<SharedControls>,
) -> Result<cpal::Stream, ToneError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut voice = SineLoopVoice::new(config.sample_rate.0 as f32);
    let controls = Arc::clone(controls);

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                voice.render_into(data, channels, &controls, |s| T::from_sample(s));
            },
            |err| tracing::warn!("audio stream error: {}", err),
            None,
        )
        .map_err(|e| ToneError::Device(e.to_string()))
}

impl Oscillator for CpalOscillator {
    fn start(&mut self) -> Result<(), ToneError> {
        let stream = self.stream.as_ref().ok_or(ToneError::AlreadyStopped)?;
        self.controls.set_running(true);
        stream.play().map_err(|e| ToneError::Device(e.to_string()))
    }

    fn stop(&mut self) {
        self.controls.set_running(false);
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                tracing::debug!("pause on stop failed: {}", e);
            }
        }
    }

    fn set_amplitude(&mut self, amplitude: f32)  { self.controls.amplitude.store(amplitude); }
    fn set_frequency(&mut self, hz: f32)         { self.controls.frequency.store(hz); }
    fn route_output(&mut self, channel: Channel) { self.controls.route(channel); }
}

// ════════════════════════════════════════════════════════════════════════════
// open_audio_output — pick the device or fall back
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioBackend {
    /// Default output device, falling back to null if it cannot be opened.
    Device,
    /// No sound; set-points are still tracked.
    Null,
}

/// Open the requested backend.  A missing or broken device degrades to
/// [`NullOscillator`] with a warning rather than aborting.
pub fn open_audio_output(backend: AudioBackend) -> Box<dyn Oscillator> {
    match backend {
        AudioBackend::Null => Box::new(NullOscillator::new()),
        AudioBackend::Device => match CpalOscillator::open() {
            Ok(osc) => Box::new(osc),
            Err(e) => {
                tracing::warn!("{}; using null output", e);
                Box::new(NullOscillator::new())
            }
        },
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ToneDriver
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverState { Idle, Running, Stopped }

impl DriverState {
    pub fn name(self) -> &'static str {
        match self {
            DriverState::Idle    => "idle",
            DriverState::Running => "playing",
            DriverState::Stopped => "stopped",
        }
    }
}

/// Sole owner of the oscillator handle.
pub struct ToneDriver<O: Oscillator> {
    osc:     O,
    state:   DriverState,
    last:    Option<SynthesisParameters>,
    updates: u64,
}

impl<O: Oscillator> ToneDriver<O> {
    pub fn new(osc: O) -> Self {
        ToneDriver { osc, state: DriverState::Idle, last: None, updates: 0 }
    }

    pub fn start(&mut self) -> Result<(), ToneError> {
        match self.state {
            DriverState::Running => return Err(ToneError::AlreadyStarted),
            DriverState::Stopped => return Err(ToneError::AlreadyStopped),
            DriverState::Idle    => {}
        }
        self.osc.start()?;
        self.state = DriverState::Running;
        tracing::info!("oscillator started");
        Ok(())
    }

    /// Push one set-point.  Returns `false`, touching nothing, unless running.
    pub fn apply(&mut self, params: &SynthesisParameters) -> bool {
        if self.state != DriverState::Running {
            return false;
        }
        self.osc.set_amplitude(params.amplitude);
        self.osc.set_frequency(params.frequency);
        self.osc.route_output(Channel::Left);
        self.osc.route_output(Channel::Right);
        self.last = Some(*params);
        self.updates += 1;
        true
    }

    /// Stop for good.  Later calls are no-ops.
    pub fn stop(&mut self) {
        if self.state == DriverState::Stopped {
            return;
        }
        self.osc.stop();
        self.state = DriverState::Stopped;
        tracing::info!("oscillator stopped after {} updates", self.updates);
    }

    pub fn state(&self) -> DriverState { self.state }
    pub fn last_applied(&self) -> Option<SynthesisParameters> { self.last }
    pub fn updates(&self) -> u64 { self.updates }
    pub fn oscillator(&self) -> &O { &self.osc }
}

impl<O: Oscillator> Drop for ToneDriver<O> {
    fn drop(&mut self) {
        if self.state == DriverState::Running {
            self.stop();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
