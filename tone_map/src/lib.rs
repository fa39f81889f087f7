//! # tone_map
//!
//! Maps a [`ControlSignal`] onto oscillator [`SynthesisParameters`]:
//!
//! * **Left metric** (finger height) → **amplitude**
//! * **Right metric** (leftmost reach) → **frequency**
//!
//! Each axis goes through the same transfer function: clamp into the input
//! span, rescale to [0, 1], invert, then map affinely into the output span.
//! Inversion means a hand held higher (smaller y) is louder and a hand
//! reaching further left (smaller x) is higher in pitch.
//!
//! ## Quick start
//!
//! ```rust
//! use tone_map::{MappingConfig, ParameterMapper};
//! use hand_signal::ControlSignal;
//!
//! let mapper = ParameterMapper::new(MappingConfig::default()).unwrap();
//! let p = mapper.map(&ControlSignal::new(0.65, 0.25));
//!
//! assert!((p.amplitude - 0.051).abs() < 1e-6);
//! assert!((p.frequency - 570.813).abs() < 1e-3);
//! ```

use std::fmt;
use hand_signal::ControlSignal;

// ════════════════════════════════════════════════════════════════════════════
// Defaults
// ════════════════════════════════════════════════════════════════════════════

/// Finger height that maps to full amplitude (and anything above it).
pub const HEIGHT_MIN: f32 = 0.5;
/// Finger height that maps to the amplitude floor (and anything below it).
pub const HEIGHT_MAX: f32 = 0.8;
pub const WIDTH_MIN:  f32 = 0.0;
pub const WIDTH_MAX:  f32 = 0.5;

/// Amplitude floor. Never zero: a zero-gain oscillator clicks on re-entry.
pub const AMPLITUDE_MIN: f32 = 0.001;
pub const AMPLITUDE_MAX: f32 = 0.101;

/// C, 261.626 Hz.
pub const FREQUENCY_MIN_HZ: f32 = 261.626;
/// A, 880 Hz.
pub const FREQUENCY_MAX_HZ: f32 = 880.0;

// ════════════════════════════════════════════════════════════════════════════
// MappingError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum MappingError {
    /// An input span has `min == max`, so rescaling would divide by zero.
    DegenerateSpan { axis: &'static str, value: f32 },
    InvertedSpan { axis: &'static str, min: f32, max: f32 },
    NonFinite { axis: &'static str },
    AmplitudeOutOfRange { min: f32, max: f32 },
    NonPositiveFrequency { min: f32 },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateSpan { axis, value } => {
                write!(f, "{} span is empty (min = max = {})", axis, value)
            }
            Self::InvertedSpan { axis, min, max } => {
                write!(f, "{} span is reversed: min {} > max {}", axis, min, max)
            }
            Self::NonFinite { axis } => write!(f, "{} span has a non-finite bound", axis),
            Self::AmplitudeOutOfRange { min, max } => {
                write!(f, "amplitude span [{}, {}] must lie within [0, 1]", min, max)
            }
            Self::NonPositiveFrequency { min } => {
                write!(f, "frequency span must be positive, min is {} Hz", min)
            }
        }
    }
}

impl std::error::Error for MappingError {}

// ════════════════════════════════════════════════════════════════════════════
// Span
// ════════════════════════════════════════════════════════════════════════════

/// A closed interval `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self { Span { min, max } }

    pub fn width(&self) -> f32 { self.max - self.min }

    /// Clamp into the span, then rescale to [0, 1]. Exactly 0 at `min` and
    /// exactly 1 at `max`. Only meaningful on a validated input span.
    pub fn normalize(&self, v: f32) -> f32 {
        let clamped = v.clamp(self.min, self.max);
        (clamped - self.min) / (self.max - self.min)
    }

    /// Affine map of `t ∈ [0, 1]` into the span. Written as a weighted sum
    /// so that `t = 0` and `t = 1` land on the bounds without rounding.
    pub fn lerp(&self, t: f32) -> f32 {
        self.min * (1.0 - t) + self.max * t
    }

    fn check_finite(&self, axis: &'static str) -> Result<(), MappingError> {
        if self.min.is_finite() && self.max.is_finite() {
            Ok(())
        } else {
            Err(MappingError::NonFinite { axis })
        }
    }

    fn check_ordered(&self, axis: &'static str) -> Result<(), MappingError> {
        if self.min > self.max {
            Err(MappingError::InvertedSpan { axis, min: self.min, max: self.max })
        } else {
            Ok(())
        }
    }

    /// Input spans are divided by their width and must be strictly ordered.
    fn check_input(&self, axis: &'static str) -> Result<(), MappingError> {
        self.check_finite(axis)?;
        if self.min == self.max {
            return Err(MappingError::DegenerateSpan { axis, value: self.min });
        }
        self.check_ordered(axis)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MappingConfig
// ════════════════════════════════════════════════════════════════════════════

/// Every constant of the transfer function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MappingConfig {
    /// Input span for the left metric (normalized y).
    pub height:    Span,
    /// Input span for the right metric (normalized x).
    pub width:     Span,
    pub amplitude: Span,
    /// Output span in Hz.
    pub frequency: Span,
}

impl Default for MappingConfig {
    fn default() -> Self {
        MappingConfig {
            height:    Span::new(HEIGHT_MIN, HEIGHT_MAX),
            width:     Span::new(WIDTH_MIN, WIDTH_MAX),
            amplitude: Span::new(AMPLITUDE_MIN, AMPLITUDE_MAX),
            frequency: Span::new(FREQUENCY_MIN_HZ, FREQUENCY_MAX_HZ),
        }
    }
}

impl MappingConfig {
    pub fn validate(&self) -> Result<(), MappingError> {
        self.height.check_input("height")?;
        self.width.check_input("width")?;

        self.amplitude.check_finite("amplitude")?;
        self.amplitude.check_ordered("amplitude")?;
        if self.amplitude.min < 0.0 || self.amplitude.max > 1.0 {
            return Err(MappingError::AmplitudeOutOfRange {
                min: self.amplitude.min,
                max: self.amplitude.max,
            });
        }

        self.frequency.check_finite("frequency")?;
        self.frequency.check_ordered("frequency")?;
        if self.frequency.min <= 0.0 {
            return Err(MappingError::NonPositiveFrequency { min: self.frequency.min });
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SynthesisParameters / ParameterMapper
// ════════════════════════════════════════════════════════════════════════════

/// The oscillator's live set-point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthesisParameters {
    /// Linear gain in [0, 1].
    pub amplitude: f32,
    /// Hz.
    pub frequency: f32,
}

/// Stateless transfer function over a validated [`MappingConfig`].
///
/// Construction is the only fallible step, so a bad configuration is caught
/// at startup rather than on the first tick.
#[derive(Clone, Debug)]
pub struct ParameterMapper {
    config: MappingConfig,
}

impl ParameterMapper {
    pub fn new(config: MappingConfig) -> Result<Self, MappingError> {
        config.validate()?;
        Ok(ParameterMapper { config })
    }

    pub fn config(&self) -> &MappingConfig { &self.config }

    /// Amplitude for a finger height. Strictly decreasing across the height
    /// span, saturating at the amplitude bounds outside it.
    pub fn amplitude_for(&self, left_metric: f32) -> f32 {
        let inv = 1.0 - self.config.height.normalize(left_metric);
        self.config.amplitude.lerp(inv)
    }

    /// Frequency for a leftmost reach. Strictly decreasing across the width
    /// span, saturating at the frequency bounds outside it.
    pub fn frequency_for(&self, right_metric: f32) -> f32 {
        let inv = 1.0 - self.config.width.normalize(right_metric);
        self.config.frequency.lerp(inv)
    }

    pub fn map(&self, signal: &ControlSignal) -> SynthesisParameters {
        SynthesisParameters {
            amplitude: self.amplitude_for(signal.left),
            frequency: self.frequency_for(signal.right),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
