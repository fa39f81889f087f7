//! Detection sources: where a frame's hands come from.
//!
//! The control loop only sees [`DetectionSource`]; it does not care whether
//! detections come from the simulator, an external estimator process, a
//! recording, or LeapMotion hardware.
//!
//! ## JSON-lines protocol
//!
//! External estimators write one JSON object per frame to stdout:
//!
//! ```text
//! {"hands":[{"handedness":"Left","score":0.97,"landmarks":[{"x":0.41,"y":0.62,"z":-0.01}, …]}]}
//! {"hands":[]}
//! {"hands":[],"error":"camera read failed"}
//! ```
//!
//! `landmarks` must hold exactly 21 points in hand-model order; `z` may be
//! omitted.  A line that fails to parse, or carries an `error`, skips that
//! frame only.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;
use hand_signal::{
    label_for, left_metric, right_metric, Detection, Handedness, LandmarkSet, Point3, Role,
};

// ════════════════════════════════════════════════════════════════════════════
// SourceError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
pub enum SourceError {
    Io(io::Error),
    /// A frame that could not be decoded.
    Malformed { line: usize, reason: String },
    /// The estimator reported a failure for this frame.
    Estimator(String),
    /// Device or process could not be opened.
    Unavailable(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e)                     => write!(f, "read failed: {}", e),
            Self::Malformed { line, reason } => write!(f, "malformed frame on line {}: {}", line, reason),
            Self::Estimator(msg)            => write!(f, "estimator error: {}", msg),
            Self::Unavailable(msg)          => write!(f, "source unavailable: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SourceError {
    fn from(e: io::Error) -> Self { SourceError::Io(e) }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectionSource trait — unified interface for every input
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver one frame's detections at a time.
pub trait DetectionSource {
    /// Block until the next frame.  `Ok(None)` means the stream has ended;
    /// `Err` means this frame is lost but later frames may arrive.
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>, SourceError>;

    fn name(&self) -> &str { "source" }
}

impl<S: DetectionSource + ?Sized> DetectionSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>, SourceError> {
        (**self).next_frame()
    }
    fn name(&self) -> &str { (**self).name() }
}

// ════════════════════════════════════════════════════════════════════════════
// JSON-lines decoding
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    handedness: String,
    score:      f32,
    landmarks:  Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct FrameJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one protocol line into detections.  `line_no` is for messages.
pub fn parse_frame(text: &str, line_no: usize) -> Result<Vec<Detection>, SourceError> {
    let malformed = |reason: String| SourceError::Malformed { line: line_no, reason };

    let frame: FrameJson = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
    if let Some(msg) = frame.error {
        return Err(SourceError::Estimator(msg));
    }

    frame.hands
        .into_iter()
        .map(|hand| {
            let handedness: Handedness = hand.handedness.parse()
                .map_err(|e: hand_signal::SignalError| malformed(e.to_string()))?;
            let points: Vec<Point3> = hand.landmarks.iter()
                .map(|lm| Point3::new(lm.x, lm.y, lm.z))
                .collect();
            let landmarks = LandmarkSet::from_slice(&points)
                .map_err(|e| malformed(e.to_string()))?;
            Ok(Detection { landmarks, handedness, confidence: hand.score })
        })
        .collect()
}

/// Reads protocol lines from any buffered reader.
pub struct JsonLinesSource<R: BufRead> {
    reader:  R,
    line_no: usize,
    buf:     String,
    name:    String,
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn new(reader: R, name: impl Into<String>) -> Self {
        JsonLinesSource { reader, line_no: 0, buf: String::new(), name: name.into() }
    }

    pub fn lines_read(&self) -> usize { self.line_no }
}

impl<R: BufRead> DetectionSource for JsonLinesSource<R> {
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>, SourceError> {
        loop {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return Ok(None),
                Ok(_) => self.line_no += 1,
                Err(e) => {
                    // the bad line is consumed; keep later line numbers honest
                    self.line_no += 1;
                    return Err(e.into());
                }
            }
            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return parse_frame(text, self.line_no).map(Some);
        }
    }

    fn name(&self) -> &str { &self.name }
}

/// Replay a recorded JSON-lines file.
pub fn open_replay(path: &Path) -> Result<JsonLinesSource<BufReader<File>>, SourceError> {
    let file = File::open(path)
        .map_err(|e| SourceError::Unavailable(format!("{}: {}", path.display(), e)))?;
    Ok(JsonLinesSource::new(BufReader::new(file), path.display().to_string()))
}

// ════════════════════════════════════════════════════════════════════════════
// SubprocessSource — external estimator owning the camera
// ════════════════════════════════════════════════════════════════════════════

/// Runs an estimator command and reads its stdout as JSON lines.  The child
/// is killed when the source is dropped.
pub struct SubprocessSource {
    child: Child,
    lines: JsonLinesSource<BufReader<ChildStdout>>,
}

impl SubprocessSource {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self, SourceError> {
        tracing::info!("starting estimator: {} {}", program, args.join(" "));

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| SourceError::Unavailable(format!("{}: {}", program, e)))?;

        let stdout = child.stdout.take()
            .ok_or_else(|| SourceError::Unavailable("estimator stdout not captured".into()))?;

        Ok(SubprocessSource {
            child,
            lines: JsonLinesSource::new(BufReader::new(stdout), program),
        })
    }

    /// OS process id of the estimator.
    pub fn id(&self) -> u32 { self.child.id() }
}

impl DetectionSource for SubprocessSource {
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>, SourceError> {
        self.lines.next_frame()
    }
    fn name(&self) -> &str { self.lines.name() }
}

impl Drop for SubprocessSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        tracing::debug!("estimator process released");
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Paced — hold a source to a frame rate
// ════════════════════════════════════════════════════════════════════════════

/// Sleeps so frames are delivered no faster than `fps`.  Used for replays,
/// which would otherwise be read as fast as the disk allows.
pub struct Paced<S> {
    inner:    S,
    interval: Duration,
    next_due: Option<Instant>,
}

impl<S: DetectionSource> Paced<S> {
    pub fn new(inner: S, fps: f32) -> Self {
        let interval = Duration::from_secs_f32(1.0 / fps.max(1.0));
        Paced { inner, interval, next_due: None }
    }
}

impl<S: DetectionSource> DetectionSource for Paced<S> {
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>, SourceError> {
        if let Some(due) = self.next_due {
            let now = Instant::now();
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.next_due = Some(Instant::now() + self.interval);
        self.inner.next_frame()
    }
    fn name(&self) -> &str { self.inner.name() }
}

// ════════════════════════════════════════════════════════════════════════════
// SimSource — keyboard/mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the overlay window.  Pointer coordinates are in display
/// space, which is the camera image mirrored horizontally.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    Pointer { x: f32, y: f32 },
    /// Show/hide the hand that fills this role.
    ToggleHand(Role),
    /// Drop the horizontal hand's score below any sane threshold.
    ToggleLowConfidence,
    /// Give both hands the same raw label.
    ToggleSameLabel,
}

const SIM_HIGH_SCORE:  f32 = 0.95;
const SIM_LOW_SCORE:   f32 = 0.30;
/// Image x of the vertical-axis hand's wrist.
const SIM_HEIGHT_HAND_X: f32 = 0.72;
/// Image y of the horizontal-axis hand's wrist.
const SIM_WIDTH_HAND_Y:  f32 = 0.55;

/// An open hand, fingers up, wrist at the origin.
fn template_hand() -> LandmarkSet {
    const OFFSETS: [(f32, f32); 21] = [
        ( 0.000,  0.000),                                                     // wrist
        (-0.040, -0.020), (-0.070, -0.050), (-0.090, -0.080), (-0.110, -0.100), // thumb
        (-0.030, -0.090), (-0.035, -0.130), (-0.040, -0.160), (-0.045, -0.190), // index
        ( 0.000, -0.095), ( 0.000, -0.140), ( 0.000, -0.175), ( 0.000, -0.205), // middle
        ( 0.025, -0.090), ( 0.030, -0.130), ( 0.033, -0.160), ( 0.036, -0.185), // ring
        ( 0.050, -0.075), ( 0.058, -0.105), ( 0.063, -0.130), ( 0.067, -0.150), // pinky
    ];
    LandmarkSet::new(OFFSETS.map(|(x, y)| Point3::new(x, y, 0.0)))
}

/// Synthesises two hands from pointer position and toggles.
///
/// Pointer y sets how low the vertical-axis hand's fingers reach; pointer x
/// (mirrored back into image space) sets the horizontal-axis hand's leftmost
/// point.  Output order alternates every frame, as a real estimator's may.
pub struct SimSource {
    rx:             Option<Receiver<SimInput>>,
    pointer:        (f32, f32),
    show_left:      bool,
    show_right:     bool,
    low_confidence: bool,
    same_label:     bool,
    sweep:          bool,
    frame:          u64,
    template:       LandmarkSet,
}

impl SimSource {
    /// Driven by the overlay window.
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimSource { rx: Some(rx), ..Self::sweeping() }
    }

    /// No window: both axes sweep slowly on their own.
    pub fn sweeping() -> Self {
        SimSource {
            rx:             None,
            pointer:        (0.5, 0.65),
            show_left:      true,
            show_right:     true,
            low_confidence: false,
            same_label:     false,
            sweep:          true,
            frame:          0,
            template:       template_hand(),
        }
    }

    /// Apply one input immediately.
    pub fn handle(&mut self, input: SimInput) {
        match input {
            SimInput::Pointer { x, y } => {
                self.pointer = (x.clamp(0.0, 1.0), y.clamp(0.0, 1.0));
                self.sweep = false;
            }
            SimInput::ToggleHand(Role::Left)  => self.show_left  = !self.show_left,
            SimInput::ToggleHand(Role::Right) => self.show_right = !self.show_right,
            SimInput::ToggleLowConfidence     => self.low_confidence = !self.low_confidence,
            SimInput::ToggleSameLabel         => self.same_label = !self.same_label,
        }
    }

    fn drain_inputs(&mut self) -> Result<(), SourceError> {
        let mut pending = Vec::new();
        if let Some(rx) = &self.rx {
            loop {
                match rx.try_recv() {
                    Ok(input) => pending.push(input),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        return Err(SourceError::Unavailable("simulator input closed".into()));
                    }
                }
            }
        }
        for input in pending {
            self.handle(input);
        }
        Ok(())
    }

    fn advance_sweep(&mut self) {
        let t = self.frame as f32;
        self.pointer = (
            0.5  + 0.45 * (t * 0.013).sin(),
            0.65 + 0.20 * (t * 0.021).sin(),
        );
    }

    /// The frame for the current state, without reading inputs.
    pub fn synthesize(&self) -> Vec<Detection> {
        let (px, py) = self.pointer;
        let t = &self.template;

        let height_hand = t.translated(SIM_HEIGHT_HAND_X, py - left_metric(t));
        let width_hand  = t.translated((1.0 - px) - right_metric(t), SIM_WIDTH_HAND_Y);

        let height_label = label_for(Role::Left);
        let width_label  = if self.same_label { height_label } else { label_for(Role::Right) };

        let mut out = Vec::with_capacity(2);
        if self.show_left {
            out.push(Detection {
                landmarks:  height_hand,
                handedness: height_label,
                confidence: SIM_HIGH_SCORE,
            });
        }
        if self.show_right {
            out.push(Detection {
                landmarks:  width_hand,
                handedness: width_label,
                confidence: if self.low_confidence { SIM_LOW_SCORE } else { SIM_HIGH_SCORE },
            });
        }
        if self.frame % 2 == 1 {
            out.reverse();
        }
        out
    }
}

impl DetectionSource for SimSource {
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>, SourceError> {
        self.drain_inputs()?;
        if self.sweep {
            self.advance_sweep();
        }
        let frame = self.synthesize();
        self.frame += 1;
        Ok(Some(frame))
    }

    fn name(&self) -> &str { "simulator" }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Detections from a LeapMotion controller, reshaped into the 21-point
/// camera layout.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Leap reports millimetres above the device with true anatomical
/// handedness.  Positions inside `X_RANGE`/`Y_RANGE` are normalized to
/// [0, 1], with y flipped (image y grows downward) and x mirrored, and the
/// label is swapped, so the frames look like an unmirrored webcam's.
#[cfg(feature = "leap")]
pub struct LeapSource {
    connection: leaprs::Connection,
}

#[cfg(feature = "leap")]
impl LeapSource {
    const X_RANGE: (f32, f32) = (-200.0, 200.0);
    const Y_RANGE: (f32, f32) = (50.0, 450.0);
    const POLL_MS: u32 = 100;

    pub fn open() -> Result<Self, SourceError> {
        use leaprs::*;
        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| SourceError::Unavailable(format!("LeapC connection: {:?}", e)))?;
        connection.open()
            .map_err(|e| SourceError::Unavailable(format!("LeapMotion device: {:?}", e)))?;
        Ok(LeapSource { connection })
    }

    fn normalize(x: f32, y: f32, z: f32) -> Point3 {
        let (x0, x1) = Self::X_RANGE;
        let (y0, y1) = Self::Y_RANGE;
        Point3::new(
            1.0 - (x - x0) / (x1 - x0),
            1.0 - (y - y0) / (y1 - y0),
            z / (x1 - x0),
        )
    }

    fn convert(hand: &leaprs::Hand) -> Option<Detection> {
        let digits: Vec<_> = hand.digits().collect();
        if digits.len() < 5 { return None; }

        let mut pts = Vec::with_capacity(21);
        let wrist = digits[2].metacarpal().prev_joint();
        pts.push(Self::normalize(wrist.x, wrist.y, wrist.z));
        for d in &digits {
            for j in [
                d.proximal().prev_joint(),
                d.intermediate().prev_joint(),
                d.distal().prev_joint(),
                d.distal().next_joint(),
            ] {
                pts.push(Self::normalize(j.x, j.y, j.z));
            }
        }
        let landmarks = LandmarkSet::from_slice(&pts).ok()?;

        let anatomical = if hand.hand_type() == leaprs::HandType::Left {
            Handedness::Left
        } else {
            Handedness::Right
        };
        // LeapC classifies handedness itself; no per-hand score is exposed here.
        Some(Detection { landmarks, handedness: anatomical.opposite(), confidence: 1.0 })
    }
}

#[cfg(feature = "leap")]
impl DetectionSource for LeapSource {
    fn next_frame(&mut self) -> Result<Option<Vec<Detection>>, SourceError> {
        use leaprs::Event;
        loop {
            // Timeouts are routine between tracking events.
            let msg = match self.connection.poll(Self::POLL_MS) {
                Ok(m)  => m,
                Err(_) => continue,
            };
            if let Event::Tracking(frame) = msg.event() {
                return Ok(Some(frame.hands().filter_map(|h| Self::convert(&h)).collect()));
            }
        }
    }

    fn name(&self) -> &str { "leapmotion" }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;
    use std::time::{Duration, Instant};
    use hand_signal::{ControlSignal, HandResolver};

    fn hand_json(label: &str, score: f32, n: usize) -> String {
        let pts: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"x":{},"y":{}}}"#, 0.3 + i as f32 * 0.01, 0.4))
            .collect();
        format!(r#"{{"handedness":"{}","score":{},"landmarks":[{}]}}"#, label, score, pts.join(","))
    }

    fn frame_json(hands: &[String]) -> String {
        format!(r#"{{"hands":[{}]}}"#, hands.join(","))
    }

    #[test]
    fn parse_two_hand_frame() {
        let line = frame_json(&[hand_json("Left", 0.9, 21), hand_json("Right", 0.8, 21)]);
        let dets = parse_frame(&line, 1).unwrap();
        assert_eq!(dets.len(), 2);
        assert_eq!(dets[0].handedness, Handedness::Left);
        assert_eq!(dets[1].confidence, 0.8);
        assert!((dets[0].landmarks.points()[20].x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn parse_rejects_wrong_landmark_count() {
        let line = frame_json(&[hand_json("Left", 0.9, 20)]);
        assert!(matches!(parse_frame(&line, 7), Err(SourceError::Malformed { line: 7, .. })));
    }

    #[test]
    fn parse_rejects_unknown_label() {
        let line = frame_json(&[hand_json("Middle", 0.9, 21)]);
        assert!(matches!(parse_frame(&line, 1), Err(SourceError::Malformed { .. })));
    }

    #[test]
    fn parse_surfaces_estimator_error() {
        let line = r#"{"hands":[],"error":"camera read failed"}"#;
        assert!(matches!(parse_frame(line, 1), Err(SourceError::Estimator(m)) if m == "camera read failed"));
    }

    #[test]
    fn json_lines_skip_bad_frames_and_end_at_eof() {
        let text = format!(
            "{}\nnot json\n\n{}\n",
            frame_json(&[]),
            frame_json(&[hand_json("Right", 0.7, 21)]),
        );
        let mut src = JsonLinesSource::new(Cursor::new(text), "test");
        assert_eq!(src.next_frame().unwrap().unwrap().len(), 0);
        assert!(src.next_frame().is_err());
        assert_eq!(src.next_frame().unwrap().unwrap().len(), 1);
        assert!(src.next_frame().unwrap().is_none());
        assert_eq!(src.lines_read(), 4);
    }

    #[test]
    fn sim_frames_resolve_to_pointer_targets() {
        let (tx, rx) = mpsc::channel();
        let mut sim = SimSource::new(rx);
        tx.send(SimInput::Pointer { x: 0.8, y: 0.7 }).unwrap();

        let resolver = HandResolver::default();
        for _ in 0..4 {
            let dets = sim.next_frame().unwrap().unwrap();
            let pair = resolver.resolve(&dets).unwrap();
            let s = ControlSignal::from_pair(&pair);
            assert!((s.left  - 0.7).abs() < 1e-5);
            assert!((s.right - 0.2).abs() < 1e-5); // mirrored: 1 − 0.8
        }
    }

    #[test]
    fn sim_order_alternates() {
        let mut sim = SimSource::sweeping();
        let a = sim.next_frame().unwrap().unwrap();
        let b = sim.next_frame().unwrap().unwrap();
        assert_ne!(a[0].handedness, b[0].handedness);
    }

    #[test]
    fn sim_toggles_break_resolution() {
        let resolver = HandResolver::default();
        let (tx, rx) = mpsc::channel();
        let mut sim = SimSource::new(rx);

        tx.send(SimInput::ToggleHand(Role::Right)).unwrap();
        assert!(resolver.resolve(&sim.next_frame().unwrap().unwrap()).is_err());
        tx.send(SimInput::ToggleHand(Role::Right)).unwrap();
        tx.send(SimInput::ToggleLowConfidence).unwrap();
        assert!(resolver.resolve(&sim.next_frame().unwrap().unwrap()).is_err());
        tx.send(SimInput::ToggleLowConfidence).unwrap();
        tx.send(SimInput::ToggleSameLabel).unwrap();
        assert!(resolver.resolve(&sim.next_frame().unwrap().unwrap()).is_err());
        tx.send(SimInput::ToggleSameLabel).unwrap();
        assert!(resolver.resolve(&sim.next_frame().unwrap().unwrap()).is_ok());
    }

    #[test]
    fn sim_reports_closed_input() {
        let (tx, rx) = mpsc::channel::<SimInput>();
        drop(tx);
        let mut sim = SimSource::new(rx);
        assert!(matches!(sim.next_frame(), Err(SourceError::Unavailable(_))));
    }

    #[test]
    fn json_lines_count_unreadable_lines() {
        let mut bytes = b"{\"hands\":[]}\n".to_vec();
        bytes.extend_from_slice(b"\xff\xfe\n");
        bytes.extend_from_slice(b"not json\n");
        let mut src = JsonLinesSource::new(Cursor::new(bytes), "test");

        assert!(src.next_frame().unwrap().is_some());
        assert!(matches!(src.next_frame(), Err(SourceError::Io(_))));
        assert!(matches!(src.next_frame(), Err(SourceError::Malformed { line: 3, .. })));
        assert!(src.next_frame().unwrap().is_none());
        assert_eq!(src.lines_read(), 3);
    }

    #[test]
    fn paced_source_holds_frame_rate() {
        let fps = 50.0;
        let frames = 6;
        let mut src = Paced::new(SimSource::sweeping(), fps);

        let started = Instant::now();
        for _ in 0..frames {
            assert!(src.next_frame().unwrap().is_some());
        }
        let min = Duration::from_secs_f32(1.0 / fps) * (frames - 1);
        assert!(started.elapsed() >= min, "{:?} < {:?}", started.elapsed(), min);
    }

    #[test]
    fn missing_estimator_is_unavailable() {
        let result = SubprocessSource::spawn("visual-theremin-no-such-estimator", &[]);
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[cfg(unix)]
    #[test]
    fn estimator_is_killed_and_reaped_on_drop() {
        let script = r#"printf '{"hands":[]}\n'; sleep 30"#;
        let mut src = SubprocessSource::spawn("sh", &["-c".to_string(), script.to_string()]).unwrap();
        assert_eq!(src.next_frame().unwrap().unwrap().len(), 0);
        let pid = src.id();

        let started = Instant::now();
        drop(src);
        assert!(started.elapsed() < Duration::from_secs(5));

        // a reaped child leaves no /proc entry behind
        #[cfg(target_os = "linux")]
        assert!(!std::path::Path::new(&format!("/proc/{}", pid)).exists());
        let _ = pid;
    }
}
