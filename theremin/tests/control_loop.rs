//! End-to-end control loop: scripted detections in, oscillator calls out.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use hand_signal::{label_for, Detection, HandResolver, LandmarkSet, Point3, Role};
use theremin::pipeline::{ControlLoop, ControlPipeline, ReleasePolicy, StopSignal};
use theremin::source::{DetectionSource, SourceError};
use theremin::tone::{DriverState, Oscillator, ToneDriver, ToneError};
use theremin::voice::Channel;
use tone_map::{MappingConfig, ParameterMapper};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Start,
    Stop,
    Amp(f32),
    Freq(f32),
    Route(Channel),
    SourceDropped,
}

type Log = Arc<Mutex<Vec<Event>>>;

struct Recorder(Log);

impl Oscillator for Recorder {
    fn start(&mut self) -> Result<(), ToneError> {
        self.0.lock().unwrap().push(Event::Start);
        Ok(())
    }
    fn stop(&mut self) { self.0.lock().unwrap().push(Event::Stop); }
    fn set_amplitude(&mut self, a: f32) { self.0.lock().unwrap().push(Event::Amp(a)); }
    fn set_frequency(&mut self, f: f32) { self.0.lock().unwrap().push(Event::Freq(f)); }
    fn route_output(&mut self, c: Channel) { self.0.lock().unwrap().push(Event::Route(c)); }
}

type Scripted = Result<Option<Vec<Detection>>, SourceError>;

struct Script {
    frames: VecDeque<Scripted>,
    log:    Log,
}

impl DetectionSource for Script {
    fn next_frame(&mut self) -> Scripted {
        self.frames.pop_front().unwrap_or(Ok(None))
    }
}

impl Drop for Script {
    fn drop(&mut self) {
        self.log.lock().unwrap().push(Event::SourceDropped);
    }
}

fn hand(role: Role, low_y: f32, min_x: f32) -> Detection {
    let mut pts = [Point3::new(min_x + 0.05, low_y - 0.05, 0.0); 21];
    pts[12].y = low_y;
    pts[4].x = min_x;
    Detection { landmarks: LandmarkSet::new(pts), handedness: label_for(role), confidence: 0.9 }
}

fn both(height: f32, reach: f32) -> Scripted {
    Ok(Some(vec![hand(Role::Right, 0.0, reach), hand(Role::Left, height, 0.9)]))
}

fn nothing() -> Scripted { Ok(Some(Vec::new())) }

fn build(frames: Vec<Scripted>, release: Option<ReleasePolicy>) -> (ControlLoop<Script, Recorder>, Log) {
    let log: Log = Arc::default();
    let source = Script { frames: frames.into(), log: Arc::clone(&log) };
    let pipeline = ControlPipeline::new(
        HandResolver::default(),
        ParameterMapper::new(MappingConfig::default()).unwrap(),
    )
    .with_release(release);
    let driver = ToneDriver::new(Recorder(Arc::clone(&log)));
    (ControlLoop::new(source, driver, pipeline), log)
}

fn amps(log: &Log) -> Vec<f32> {
    log.lock().unwrap().iter().filter_map(|e| match e { Event::Amp(a) => Some(*a), _ => None }).collect()
}

#[test]
fn cold_frames_issue_nothing_then_hold_keeps_playing() {
    let frames = vec![
        nothing(),
        nothing(),
        both(0.65, 0.25),
        nothing(),
        Err(SourceError::Estimator("camera read failed".into())),
        nothing(),
    ];
    let (mut control, log) = build(frames, None);
    control.start().unwrap();
    let stats = control.run(&StopSignal::new(), |_, _| true);

    assert_eq!(stats.frames, 5);
    assert_eq!(stats.cold, 2);
    assert_eq!(stats.fresh, 1);
    assert_eq!(stats.held, 2);
    assert_eq!(stats.skipped, 1);

    let a = amps(&log);
    assert_eq!(a.len(), 3);
    assert!(a.iter().all(|&x| (x - 0.051).abs() < 1e-4));
}

#[test]
fn every_update_routes_both_channels() {
    let (mut control, log) = build(vec![both(0.6, 0.1)], None);
    control.start().unwrap();
    control.run(&StopSignal::new(), |_, _| true);

    let log = log.lock().unwrap();
    let routes: Vec<_> = log.iter().filter(|e| matches!(e, Event::Route(_))).cloned().collect();
    assert_eq!(routes, vec![Event::Route(Channel::Left), Event::Route(Channel::Right)]);
    assert!(log.iter().any(|e| matches!(e, Event::Freq(_))));
}

#[test]
fn tone_stops_before_source_is_released() {
    let (mut control, log) = build(vec![both(0.6, 0.1), both(0.7, 0.2)], None);
    control.start().unwrap();
    control.run(&StopSignal::new(), |_, _| true);

    assert_eq!(control.driver().state(), DriverState::Stopped);
    let log = log.lock().unwrap();
    let stop = log.iter().position(|e| *e == Event::Stop).unwrap();
    let dropped = log.iter().position(|e| *e == Event::SourceDropped).unwrap();
    assert!(stop < dropped);
    assert_eq!(log.last(), Some(&Event::SourceDropped));
    assert_eq!(log.iter().filter(|e| **e == Event::Stop).count(), 1);
}

#[test]
fn stop_signal_ends_loop_and_no_updates_follow() {
    let frames = (0..100).map(|_| both(0.6, 0.3)).collect();
    let (mut control, log) = build(frames, None);
    control.start().unwrap();

    let stop = StopSignal::new();
    let trigger = stop.clone();
    let stats = control.run(&stop, |tick, _| {
        if tick.index == 9 { trigger.stop(); }
        true
    });
    assert_eq!(stats.frames, 10);

    let log = log.lock().unwrap();
    let stop_at = log.iter().position(|e| *e == Event::Stop).unwrap();
    assert!(log[stop_at..].iter().all(|e| matches!(e, Event::Stop | Event::SourceDropped)));
}

#[test]
fn observer_can_end_loop() {
    let frames = (0..10).map(|_| nothing()).collect();
    let (mut control, _log) = build(frames, None);
    control.start().unwrap();
    let stats = control.run(&StopSignal::new(), |tick, _| tick.index < 2);
    assert_eq!(stats.frames, 3);
}

#[test]
fn frame_limit_caps_the_run() {
    let frames = (0..10).map(|_| both(0.6, 0.3)).collect();
    let (control, _log) = build(frames, None);
    let mut control = control.with_frame_limit(Some(4));
    control.start().unwrap();
    assert_eq!(control.run(&StopSignal::new(), |_, _| true).frames, 4);
}

#[test]
fn release_policy_floors_amplitude_during_long_holds() {
    let mut frames = vec![both(0.5, 0.0)];
    frames.extend((0..4).map(|_| nothing()));
    let (mut control, log) = build(frames, Some(ReleasePolicy { after_frames: 2 }));
    control.start().unwrap();
    let stats = control.run(&StopSignal::new(), |_, _| true);

    assert_eq!(stats.released, 3);
    assert_eq!(amps(&log), vec![0.101, 0.101, 0.001, 0.001, 0.001]);
}

#[test]
fn dropping_the_loop_stops_the_tone() {
    let (mut control, log) = build(vec![both(0.6, 0.1)], None);
    control.start().unwrap();
    drop(control);
    let log = log.lock().unwrap();
    assert_eq!(log.first(), Some(&Event::Start));
    assert!(log.contains(&Event::Stop));
}
