//! Audio-thread side of the tone generator.
//!
//! The control thread and the audio callback share exactly one
//! [`SharedControls`]: one lock-free [`SetPoint`] per parameter plus a few
//! flags.  The control thread only ever stores; the audio thread only ever
//! loads.  Neither side blocks on the other.
//!
//! [`SineLoopVoice`] is the sound itself: a sine with self-feedback whose
//! feedback amount drifts with a slow LFO, giving a reedy, theremin-like
//! tone.  Set-point jumps are smoothed per sample so they never click.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

// ════════════════════════════════════════════════════════════════════════════
// SetPoint — single-writer / single-reader f32 slot
// ════════════════════════════════════════════════════════════════════════════

/// An `f32` stored as its bit pattern in an `AtomicU32`.  A load always sees
/// one complete earlier store, never a torn value.
#[derive(Debug)]
pub struct SetPoint(AtomicU32);

impl SetPoint {
    pub fn new(value: f32) -> Self { SetPoint(AtomicU32::new(value.to_bits())) }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SharedControls
// ════════════════════════════════════════════════════════════════════════════

/// Output channel of a stereo pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel { Left, Right }

/// Everything the control thread can tell the audio thread.
#[derive(Debug)]
pub struct SharedControls {
    pub amplitude: SetPoint,
    pub frequency: SetPoint,
    left_on:  AtomicBool,
    right_on: AtomicBool,
    running:  AtomicBool,
}

impl SharedControls {
    /// Silent, unrouted, not running.
    pub fn new(amplitude: f32, frequency: f32) -> Self {
        SharedControls {
            amplitude: SetPoint::new(amplitude),
            frequency: SetPoint::new(frequency),
            left_on:   AtomicBool::new(false),
            right_on:  AtomicBool::new(false),
            running:   AtomicBool::new(false),
        }
    }

    pub fn route(&self, channel: Channel) {
        match channel {
            Channel::Left  => self.left_on.store(true, Ordering::Release),
            Channel::Right => self.right_on.store(true, Ordering::Release),
        }
    }

    pub fn is_routed(&self, channel: Channel) -> bool {
        match channel {
            Channel::Left  => self.left_on.load(Ordering::Acquire),
            Channel::Right => self.right_on.load(Ordering::Acquire),
        }
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }

    pub fn is_running(&self) -> bool { self.running.load(Ordering::Acquire) }
}

impl Default for SharedControls {
    fn default() -> Self {
        SharedControls::new(0.0, tone_map::FREQUENCY_MIN_HZ)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SineLoopVoice
// ════════════════════════════════════════════════════════════════════════════

/// LFO rate driving the feedback amount.
const LFO_HZ:        f32 = 0.1;
/// Feedback swings between 0 and this.
const FEEDBACK_MAX:  f32 = 0.18;
/// Set-point smoothing time constant.
const SMOOTHING_SEC: f32 = 0.005;

/// Feedback-sine oscillator rendered one stereo frame at a time.
#[derive(Clone, Debug)]
pub struct SineLoopVoice {
    sample_rate: f32,
    phase:       f32,   // cycles, [0, 1)
    lfo_phase:   f32,
    last:        f32,   // previous raw sample, fed back into the phase
    amp:         f32,   // smoothed
    freq:        f32,   // smoothed
    coeff:       f32,   // one-pole smoothing factor
    primed:      bool,
}

impl SineLoopVoice {
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        SineLoopVoice {
            sample_rate,
            phase:     0.0,
            lfo_phase: 0.0,
            last:      0.0,
            amp:       0.0,
            freq:      0.0,
            coeff:     1.0 - (-1.0 / (SMOOTHING_SEC * sample_rate)).exp(),
            primed:    false,
        }
    }

    pub fn sample_rate(&self) -> f32 { self.sample_rate }

    /// Next `(left, right)` output frame.
    pub fn next_frame(&mut self, controls: &SharedControls) -> (f32, f32) {
        if !controls.is_running() {
            return (0.0, 0.0);
        }

        let target_amp  = controls.amplitude.load().clamp(0.0, 1.0);
        let target_freq = controls.frequency.load().max(0.0);
        if !self.primed {
            // Jump straight to the first frequency; amplitude still fades in.
            self.freq   = target_freq;
            self.primed = true;
        }
        self.amp  += (target_amp  - self.amp)  * self.coeff;
        self.freq += (target_freq - self.freq) * self.coeff;

        let feedback = 0.5 * (1.0 - (self.lfo_phase * TAU).cos()) * FEEDBACK_MAX;
        let raw = ((self.phase + feedback * self.last) * TAU).sin();
        self.last = raw;

        self.phase = (self.phase + self.freq / self.sample_rate).fract();
        self.lfo_phase = (self.lfo_phase + LFO_HZ / self.sample_rate).fract();

        let s = raw * self.amp;
        let l = if controls.is_routed(Channel::Left)  { s } else { 0.0 };
        let r = if controls.is_routed(Channel::Right) { s } else { 0.0 };
        (l, r)
    }

    /// Fill an interleaved buffer of `channels`-wide frames.  Channel 0 is
    /// left, channel 1 right; any further channels get the left signal.
    pub fn render(&mut self, out: &mut [f32], channels: usize, controls: &SharedControls) {
        self.render_into(out, channels, controls, |s| s);
    }

    /// [`render`](Self::render) into any sample type, converting in place.
    /// Never allocates, so it is safe inside a real-time callback.
    pub fn render_into<S, F>(&mut self, out: &mut [S], channels: usize, controls: &SharedControls, convert: F)
    where
        F: Fn(f32) -> S,
    {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let (l, r) = self.next_frame(controls);
            for (i, s) in frame.iter_mut().enumerate() {
                *s = convert(if i == 1 { r } else { l });
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn running(amp: f32, freq: f32) -> SharedControls {
        let c = SharedControls::new(amp, freq);
        c.route(Channel::Left);
        c.route(Channel::Right);
        c.set_running(true);
        c
    }

    #[test]
    fn set_point_round_trips_bits() {
        let sp = SetPoint::new(0.0);
        for v in [0.001_f32, 0.101, 261.626, 880.0, -0.0] {
            sp.store(v);
            assert_eq!(sp.load().to_bits(), v.to_bits());
        }
    }

    #[test]
    fn set_point_never_tears_across_threads() {
        // Writer alternates two values; a torn read would be a third one.
        let a = f32::from_bits(0x3F80_0000); // 1.0
        let b = f32::from_bits(0x4411_8000); // 582.0
        let sp = Arc::new(SetPoint::new(a));

        let writer = {
            let sp = Arc::clone(&sp);
            thread::spawn(move || {
                for i in 0..200_000 {
                    sp.store(if i % 2 == 0 { b } else { a });
                }
            })
        };
        for _ in 0..200_000 {
            let v = sp.load();
            assert!(v == a || v == b, "torn read {:#x}", v.to_bits());
        }
        writer.join().unwrap();
    }

    #[test]
    fn stopped_voice_is_silent() {
        let c = SharedControls::new(0.1, 440.0);
        c.route(Channel::Left);
        c.route(Channel::Right);
        let mut v = SineLoopVoice::new(48_000.0);
        for _ in 0..1000 {
            assert_eq!(v.next_frame(&c), (0.0, 0.0));
        }
    }

    #[test]
    fn output_bounded_by_amplitude() {
        let c = running(0.101, 440.0);
        let mut v = SineLoopVoice::new(48_000.0);
        let mut peak = 0.0_f32;
        for _ in 0..48_000 {
            let (l, _) = v.next_frame(&c);
            peak = peak.max(l.abs());
        }
        assert!(peak <= 0.101 + 1e-6);
        assert!(peak > 0.09, "smoothing should settle near the set-point, got {}", peak);
    }

    #[test]
    fn unrouted_channel_stays_silent() {
        let c = SharedControls::new(0.1, 440.0);
        c.route(Channel::Left);
        c.set_running(true);
        let mut v = SineLoopVoice::new(44_100.0);
        let mut buf = vec![0.0_f32; 2 * 4410];
        v.render(&mut buf, 2, &c);
        assert!(buf.iter().skip(1).step_by(2).all(|&s| s == 0.0));
        assert!(buf.iter().step_by(2).any(|&s| s != 0.0));
    }

    #[test]
    fn render_into_matches_float_render() {
        let c = running(0.1, 330.0);
        let mut a = SineLoopVoice::new(48_000.0);
        let mut b = a.clone();

        let mut floats = vec![0.0_f32; 2 * 512];
        let mut ints   = vec![0_i16; 2 * 512];
        a.render(&mut floats, 2, &c);
        b.render_into(&mut ints, 2, &c, |s| (s * i16::MAX as f32) as i16);

        for (f, i) in floats.iter().zip(&ints) {
            assert_eq!((f * i16::MAX as f32) as i16, *i);
        }
    }

    #[test]
    fn amplitude_change_is_ramped() {
        let c = running(0.0, 440.0);
        let mut v = SineLoopVoice::new(48_000.0);
        for _ in 0..100 { v.next_frame(&c); }
        c.amplitude.store(0.1);
        // First frame after the jump can move at most one smoothing step.
        let (l, _) = v.next_frame(&c);
        assert!(l.abs() < 0.1 * v.coeff + 1e-6);
    }
}
