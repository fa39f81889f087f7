//! # hand_signal
//!
//! Turns a frame's raw hand detections into the two scalar control values of
//! a visual theremin, and keeps the last good pair alive across frames where
//! detection fails.
//!
//! * [`HandResolver`]: decides whether a frame holds exactly one confident
//!   hand per role, independent of the estimator's output order.
//! * [`ControlSignal`]: one scalar per identified hand, i.e. how far down the
//!   vertical-axis hand's fingers reach, and how far left the horizontal-axis
//!   hand reaches.
//! * [`ContinuityCache`]: hold-last policy for frames that fail.
//! * [`SignalTracker`]: the three of the above, frame by frame.
//!
//! ## Role table
//!
//! The estimator labels hands as if the image were mirrored, so each raw
//! label drives the *opposite* role:
//!
//! | Raw label | Role | Axis | Drives |
//! |---|---|---|---|
//! | `Right` | [`Role::Left`]  | vertical   | amplitude |
//! | `Left`  | [`Role::Right`] | horizontal | frequency |
//!
//! ```rust
//! use hand_signal::{Handedness, Role, role_for};
//!
//! assert_eq!(role_for(Handedness::Right), Role::Left);
//! assert_eq!(role_for(Handedness::Left),  Role::Right);
//! ```

use std::fmt;
use std::str::FromStr;

// ════════════════════════════════════════════════════════════════════════════
// Landmark indices (21-point hand model)
// ════════════════════════════════════════════════════════════════════════════

/// Number of landmarks in one hand.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices of the 21-point hand model.
pub mod landmark {
    pub const WRIST:      usize = 0;
    pub const THUMB_CMC:  usize = 1;
    pub const THUMB_MCP:  usize = 2;
    pub const THUMB_IP:   usize = 3;
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_MCP:  usize = 5;
    pub const INDEX_PIP:  usize = 6;
    pub const INDEX_DIP:  usize = 7;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP:   usize = 13;
    pub const RING_PIP:   usize = 14;
    pub const RING_DIP:   usize = 15;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_MCP:  usize = 17;
    pub const PINKY_PIP:  usize = 18;
    pub const PINKY_DIP:  usize = 19;
    pub const PINKY_TIP:  usize = 20;

    /// First landmark of the four non-thumb fingers.
    pub const FIRST_FINGER: usize = INDEX_MCP;

    /// Bone list for skeleton overlays (parent, child).
    pub const BONES: [(usize, usize); 21] = [
        (WRIST, THUMB_CMC),   (THUMB_CMC, THUMB_MCP),   (THUMB_MCP, THUMB_IP),   (THUMB_IP, THUMB_TIP),
        (WRIST, INDEX_MCP),   (INDEX_MCP, INDEX_PIP),   (INDEX_PIP, INDEX_DIP),  (INDEX_DIP, INDEX_TIP),
        (MIDDLE_MCP, MIDDLE_PIP), (MIDDLE_PIP, MIDDLE_DIP), (MIDDLE_DIP, MIDDLE_TIP),
        (RING_MCP, RING_PIP), (RING_PIP, RING_DIP),     (RING_DIP, RING_TIP),
        (WRIST, PINKY_MCP),   (PINKY_MCP, PINKY_PIP),   (PINKY_PIP, PINKY_DIP),  (PINKY_DIP, PINKY_TIP),
        (INDEX_MCP, MIDDLE_MCP), (MIDDLE_MCP, RING_MCP), (RING_MCP, PINKY_MCP),
    ];
}

// ════════════════════════════════════════════════════════════════════════════
// SignalError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum SignalError {
    WrongLandmarkCount { expected: usize, got: usize },
    UnknownHandedness(String),
    InvalidConfidence(f32),
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLandmarkCount { expected, got } => {
                write!(f, "expected {} landmarks, got {}", expected, got)
            }
            Self::UnknownHandedness(label) => write!(f, "unknown handedness label {:?}", label),
            Self::InvalidConfidence(c) => {
                write!(f, "confidence threshold {} outside [0, 1)", c)
            }
        }
    }
}

impl std::error::Error for SignalError {}

// ════════════════════════════════════════════════════════════════════════════
// Point3 / LandmarkSet
// ════════════════════════════════════════════════════════════════════════════

/// One landmark. `x`/`y` are normalized image coordinates (origin top-left,
/// x right, y down); `z` is relative depth and unused here.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self { Point3 { x, y, z } }
}

/// Exactly 21 landmarks of one hand, in model index order.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [Point3; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Point3; LANDMARK_COUNT]) -> Self {
        LandmarkSet { points }
    }

    /// Build from a slice; fails unless it holds exactly 21 points.
    pub fn from_slice(points: &[Point3]) -> Result<Self, SignalError> {
        let points: [Point3; LANDMARK_COUNT] = points.try_into().map_err(|_| {
            SignalError::WrongLandmarkCount { expected: LANDMARK_COUNT, got: points.len() }
        })?;
        Ok(LandmarkSet { points })
    }

    pub fn points(&self) -> &[Point3; LANDMARK_COUNT] { &self.points }

    pub fn point(&self, index: usize) -> Option<&Point3> { self.points.get(index) }

    /// Flat `(x, y, z)` triples, index 0 = wrist, 1–4 thumb, 5–20 fingers.
    pub fn coords(&self) -> [[f32; 3]; LANDMARK_COUNT] {
        self.points.map(|p| [p.x, p.y, p.z])
    }

    /// The same hand shifted by `(dx, dy)` in normalized image space.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        LandmarkSet {
            points: self.points.map(|p| Point3::new(p.x + dx, p.y + dy, p.z)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Handedness / Role
// ════════════════════════════════════════════════════════════════════════════

/// The estimator's raw hand label, before role crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn name(self) -> &'static str {
        match self {
            Handedness::Left  => "Left",
            Handedness::Right => "Right",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Handedness::Left  => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

impl FromStr for Handedness {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("left") {
            Ok(Handedness::Left)
        } else if s.eq_ignore_ascii_case("right") {
            Ok(Handedness::Right)
        } else {
            Err(SignalError::UnknownHandedness(s.to_string()))
        }
    }
}

impl fmt::Display for Handedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The control axis a resolved hand drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Vertical axis: finger height → amplitude.
    Left,
    /// Horizontal axis: leftmost reach → frequency.
    Right,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Left  => f.write_str("left (vertical)"),
            Role::Right => f.write_str("right (horizontal)"),
        }
    }
}

/// Raw label → role. Deliberately crossed; see the crate docs.
pub const ROLE_TABLE: [(Handedness, Role); 2] = [
    (Handedness::Right, Role::Left),
    (Handedness::Left,  Role::Right),
];

/// Look up the role for a raw label in [`ROLE_TABLE`].
pub fn role_for(handedness: Handedness) -> Role {
    ROLE_TABLE
        .iter()
        .find(|(h, _)| *h == handedness)
        .map(|&(_, role)| role)
        .unwrap_or(Role::Left) // table covers both variants
}

/// Inverse lookup: which raw label fills `role`.
pub fn label_for(role: Role) -> Handedness {
    ROLE_TABLE
        .iter()
        .find(|(_, r)| *r == role)
        .map(|&(h, _)| h)
        .unwrap_or(Handedness::Right)
}

// ════════════════════════════════════════════════════════════════════════════
// Detection / IdentifiedPair
// ════════════════════════════════════════════════════════════════════════════

/// One raw hand observation for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub landmarks:  LandmarkSet,
    pub handedness: Handedness,
    /// Handedness score in [0, 1].
    pub confidence: f32,
}

/// One hand per role. Only [`HandResolver::resolve`] builds these.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentifiedPair {
    /// Drives the vertical axis.
    pub left:  LandmarkSet,
    /// Drives the horizontal axis.
    pub right: LandmarkSet,
}

impl IdentifiedPair {
    pub fn hand(&self, role: Role) -> &LandmarkSet {
        match role {
            Role::Left  => &self.left,
            Role::Right => &self.right,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandResolver
// ════════════════════════════════════════════════════════════════════════════

/// Why a frame produced no [`IdentifiedPair`]. Not an error: the continuity
/// cache covers these frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveFailure {
    /// Fewer than two detections before filtering.
    TooFewDetections { found: usize },
    /// More than two detections before filtering.
    TooManyDetections { found: usize },
    /// Nothing confident enough claimed this role.
    MissingRole(Role),
    /// Two confident detections claimed the same role.
    DuplicateRole(Role),
}

impl fmt::Display for ResolveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewDetections { found } => write!(f, "{} hand(s) detected, need 2", found),
            Self::TooManyDetections { found } => write!(f, "{} hands detected, need exactly 2", found),
            Self::MissingRole(role)   => write!(f, "no confident hand for {} role", role),
            Self::DuplicateRole(role) => write!(f, "two hands claim the {} role", role),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolverConfig {
    /// Detections at or below this handedness score are ignored.
    pub min_confidence: f32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig { min_confidence: 0.5 }
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        let c = self.min_confidence;
        if c.is_finite() && (0.0..1.0).contains(&c) {
            Ok(())
        } else {
            Err(SignalError::InvalidConfidence(c))
        }
    }
}

/// Assigns a frame's detections to roles by label, never by position.
#[derive(Clone, Debug)]
pub struct HandResolver {
    config: ResolverConfig,
}

impl HandResolver {
    pub fn new(config: ResolverConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(HandResolver { config })
    }

    pub fn config(&self) -> &ResolverConfig { &self.config }

    /// Succeeds iff the frame holds exactly two detections, both above the
    /// confidence threshold, with different labels.
    pub fn resolve(&self, detections: &[Detection]) -> Result<IdentifiedPair, ResolveFailure> {
        match detections.len() {
            found @ 0..=1 => return Err(ResolveFailure::TooFewDetections { found }),
            2 => {}
            found => return Err(ResolveFailure::TooManyDetections { found }),
        }

        let mut left:  Option<&LandmarkSet> = None;
        let mut right: Option<&LandmarkSet> = None;

        // `>` also rejects NaN scores
        for det in detections.iter().filter(|d| d.confidence > self.config.min_confidence) {
            let role = role_for(det.handedness);
            let slot = match role {
                Role::Left  => &mut left,
                Role::Right => &mut right,
            };
            if slot.is_some() {
                return Err(ResolveFailure::DuplicateRole(role));
            }
            *slot = Some(&det.landmarks);
        }

        match (left, right) {
            (Some(l), Some(r)) => Ok(IdentifiedPair { left: l.clone(), right: r.clone() }),
            (None, _)          => Err(ResolveFailure::MissingRole(Role::Left)),
            (_, None)          => Err(ResolveFailure::MissingRole(Role::Right)),
        }
    }
}

impl Default for HandResolver {
    fn default() -> Self {
        HandResolver { config: ResolverConfig::default() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlSignal
// ════════════════════════════════════════════════════════════════════════════

/// Lowest point (max y) reached by the four non-thumb fingers.
pub fn left_metric(hand: &LandmarkSet) -> f32 {
    hand.points()[landmark::FIRST_FINGER..]
        .iter()
        .map(|p| p.y)
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Leftmost point (min x) over the whole hand.
pub fn right_metric(hand: &LandmarkSet) -> f32 {
    hand.points()
        .iter()
        .map(|p| p.x)
        .fold(f32::INFINITY, f32::min)
}

/// The two normalized control values, both in [0, 1] as delivered by the
/// estimator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlSignal {
    /// How far down the vertical-axis hand's fingers reach.
    pub left:  f32,
    /// How far left the horizontal-axis hand reaches.
    pub right: f32,
}

impl ControlSignal {
    pub fn new(left: f32, right: f32) -> Self { ControlSignal { left, right } }

    pub fn from_pair(pair: &IdentifiedPair) -> Self {
        ControlSignal {
            left:  left_metric(&pair.left),
            right: right_metric(&pair.right),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ContinuityCache
// ════════════════════════════════════════════════════════════════════════════

/// The signal a tick should act on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Activity {
    /// Computed this frame.
    Fresh(ControlSignal),
    /// Detection failed; last good signal reused.
    Held(ControlSignal),
    /// Detection failed and nothing has ever been cached.
    Cold,
}

impl Activity {
    pub fn signal(&self) -> Option<ControlSignal> {
        match *self {
            Activity::Fresh(s) | Activity::Held(s) => Some(s),
            Activity::Cold => None,
        }
    }

    pub fn is_fresh(&self) -> bool { matches!(self, Activity::Fresh(_)) }
    pub fn is_held(&self)  -> bool { matches!(self, Activity::Held(_)) }

    pub fn label(&self) -> &'static str {
        match self {
            Activity::Fresh(_) => "tracking",
            Activity::Held(_)  => "holding",
            Activity::Cold     => "waiting for hands",
        }
    }
}

/// Hold-last store. Written only by successful frames and never expires.
#[derive(Clone, Debug, Default)]
pub struct ContinuityCache {
    last: Option<ControlSignal>,
}

impl ContinuityCache {
    pub fn new() -> Self { Self::default() }

    pub fn update(&mut self, fresh: Option<ControlSignal>) -> Activity {
        match (fresh, self.last) {
            (Some(s), _)    => { self.last = Some(s); Activity::Fresh(s) }
            (None, Some(s)) => Activity::Held(s),
            (None, None)    => Activity::Cold,
        }
    }

    pub fn last(&self) -> Option<ControlSignal> { self.last }
}

// ════════════════════════════════════════════════════════════════════════════
// SignalTracker — resolver + extractor + cache
// ════════════════════════════════════════════════════════════════════════════

/// Everything learned from one frame.
#[derive(Clone, Debug)]
pub struct Observation {
    /// Resolved from this frame.
    pub pair:     Option<IdentifiedPair>,
    /// The pair behind `activity`: this frame's on success, the last
    /// resolved one while holding, `None` when cold.
    pub active:   Option<IdentifiedPair>,
    pub failure:  Option<ResolveFailure>,
    pub activity: Activity,
}

pub struct SignalTracker {
    resolver: HandResolver,
    cache:    ContinuityCache,
    last_pair: Option<IdentifiedPair>,
    was_fresh: bool,
}

impl SignalTracker {
    pub fn new(resolver: HandResolver) -> Self {
        SignalTracker { resolver, cache: ContinuityCache::new(), last_pair: None, was_fresh: false }
    }

    pub fn observe(&mut self, detections: &[Detection]) -> Observation {
        let (pair, failure) = match self.resolver.resolve(detections) {
            Ok(pair) => (Some(pair), None),
            Err(f)   => (None, Some(f)),
        };
        let had_signal = self.cache.last().is_some();
        let activity = self.cache.update(pair.as_ref().map(ControlSignal::from_pair));

        match (&activity, self.was_fresh) {
            (Activity::Fresh(s), false) if !had_signal => {
                tracing::debug!("first signal acquired: left={:.3} right={:.3}", s.left, s.right);
            }
            (Activity::Fresh(_), false) => tracing::debug!("tracking resumed"),
            (Activity::Held(_), true) => {
                if let Some(f) = failure {
                    tracing::debug!("holding last signal ({})", f);
                }
            }
            _ => {}
        }
        self.was_fresh = activity.is_fresh();
        if pair.is_some() {
            self.last_pair = pair.clone();
        }
        let active = if activity.signal().is_some() { self.last_pair.clone() } else { None };

        Observation { pair, active, failure, activity }
    }

    pub fn cache(&self) -> &ContinuityCache { &self.cache }
    pub fn resolver(&self) -> &HandResolver { &self.resolver }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// A hand whose landmark `i` sits at `(x0 + i*dx, y0 + i*dy)`.
    fn ramp_hand(x0: f32, dx: f32, y0: f32, dy: f32) -> LandmarkSet {
        let mut pts = [Point3::default(); LANDMARK_COUNT];
        for (i, p) in pts.iter_mut().enumerate() {
            *p = Point3::new(x0 + i as f32 * dx, y0 + i as f32 * dy, 0.0);
        }
        LandmarkSet::new(pts)
    }

    fn det(h: Handedness, confidence: f32, x: f32) -> Detection {
        Detection { landmarks: ramp_hand(x, 0.0, 0.5, 0.0), handedness: h, confidence }
    }

    fn resolver() -> HandResolver { HandResolver::default() }

    // ── landmarks ────────────────────────────────────────────────────────

    #[test]
    fn coords_preserve_index_order() {
        let hand = ramp_hand(0.0, 0.01, 0.2, 0.02);
        let c = hand.coords();
        assert_eq!(c.len(), 21);
        assert_eq!(c[0], [0.0, 0.2, 0.0]);
        assert!((c[20][0] - 0.20).abs() < 1e-6);
        assert!((c[20][1] - 0.60).abs() < 1e-6);
    }

    #[test]
    fn from_slice_rejects_wrong_count() {
        let err = LandmarkSet::from_slice(&[Point3::default(); 20]).unwrap_err();
        assert_eq!(err, SignalError::WrongLandmarkCount { expected: 21, got: 20 });
        assert!(LandmarkSet::from_slice(&[Point3::default(); 21]).is_ok());
    }

    #[test]
    fn handedness_parses_labels() {
        assert_eq!("Left".parse::<Handedness>().unwrap(), Handedness::Left);
        assert_eq!(" right ".parse::<Handedness>().unwrap(), Handedness::Right);
        assert!("both".parse::<Handedness>().is_err());
    }

    // ── role table ───────────────────────────────────────────────────────

    #[test]
    fn role_table_is_crossed() {
        assert_eq!(role_for(Handedness::Right), Role::Left);
        assert_eq!(role_for(Handedness::Left),  Role::Right);
        assert_eq!(label_for(Role::Left),  Handedness::Right);
        assert_eq!(label_for(Role::Right), Handedness::Left);
    }

    #[test]
    fn resolved_pair_follows_role_table() {
        let dets = [det(Handedness::Left, 0.9, 0.1), det(Handedness::Right, 0.9, 0.7)];
        let pair = resolver().resolve(&dets).unwrap();
        // "Right" label → Role::Left slot
        assert_eq!(pair.left,  dets[1].landmarks);
        assert_eq!(pair.right, dets[0].landmarks);
    }

    // ── resolver enumeration ─────────────────────────────────────────────

    #[test]
    fn resolve_zero_and_one_detection_fail() {
        assert_eq!(resolver().resolve(&[]), Err(ResolveFailure::TooFewDetections { found: 0 }));
        let one = [det(Handedness::Left, 0.99, 0.1)];
        assert_eq!(resolver().resolve(&one), Err(ResolveFailure::TooFewDetections { found: 1 }));
    }

    #[test]
    fn resolve_enumerates_two_detection_cases() {
        use Handedness::*;
        let confs = [0.3_f32, 0.5, 0.51, 0.99];
        for &la in &[Left, Right] {
            for &lb in &[Left, Right] {
                for &ca in &confs {
                    for &cb in &confs {
                        let dets = [det(la, ca, 0.1), det(lb, cb, 0.6)];
                        let ok = la != lb && ca > 0.5 && cb > 0.5;
                        assert_eq!(
                            resolver().resolve(&dets).is_ok(), ok,
                            "labels=({:?},{:?}) conf=({},{})", la, lb, ca, cb
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn resolve_same_label_is_duplicate() {
        let dets = [det(Handedness::Left, 0.9, 0.1), det(Handedness::Left, 0.8, 0.6)];
        assert_eq!(resolver().resolve(&dets), Err(ResolveFailure::DuplicateRole(Role::Right)));
    }

    #[test]
    fn resolve_threshold_is_exclusive() {
        let dets = [det(Handedness::Left, 0.5, 0.1), det(Handedness::Right, 0.9, 0.6)];
        assert_eq!(resolver().resolve(&dets), Err(ResolveFailure::MissingRole(Role::Right)));
    }

    #[test]
    fn resolve_ignores_nan_confidence() {
        let dets = [det(Handedness::Left, f32::NAN, 0.1), det(Handedness::Right, 0.9, 0.6)];
        assert!(resolver().resolve(&dets).is_err());
    }

    #[test]
    fn resolve_is_order_independent() {
        let a = [det(Handedness::Left, 0.9, 0.1), det(Handedness::Right, 0.9, 0.6)];
        let b = [a[1].clone(), a[0].clone()];
        assert_eq!(resolver().resolve(&a), resolver().resolve(&b));
    }

    #[test]
    fn resolve_rejects_more_than_two_detections() {
        use Handedness::*;
        // a low-confidence extra still counts against the frame
        let weak_extra = [det(Left, 0.9, 0.1), det(Right, 0.9, 0.6), det(Right, 0.2, 0.3)];
        assert_eq!(
            resolver().resolve(&weak_extra),
            Err(ResolveFailure::TooManyDetections { found: 3 })
        );
        let confident = [det(Left, 0.9, 0.1), det(Right, 0.9, 0.6), det(Right, 0.8, 0.3)];
        assert_eq!(
            resolver().resolve(&confident),
            Err(ResolveFailure::TooManyDetections { found: 3 })
        );
        let four = [
            det(Left, 0.9, 0.1), det(Right, 0.9, 0.6),
            det(Left, 0.9, 0.2), det(Right, 0.9, 0.7),
        ];
        assert_eq!(resolver().resolve(&four), Err(ResolveFailure::TooManyDetections { found: 4 }));
    }

    #[test]
    fn resolver_config_validation() {
        assert!(HandResolver::new(ResolverConfig { min_confidence: 0.5 }).is_ok());
        assert!(HandResolver::new(ResolverConfig { min_confidence: 1.0 }).is_err());
        assert!(HandResolver::new(ResolverConfig { min_confidence: -0.1 }).is_err());
        assert!(HandResolver::new(ResolverConfig { min_confidence: f32::NAN }).is_err());
    }

    // ── control signal ───────────────────────────────────────────────────

    #[test]
    fn left_metric_ignores_wrist_and_thumb() {
        let mut pts = [Point3::new(0.5, 0.3, 0.0); LANDMARK_COUNT];
        pts[landmark::WRIST]     = Point3::new(0.5, 0.95, 0.0);
        pts[landmark::THUMB_TIP] = Point3::new(0.5, 0.90, 0.0);
        pts[landmark::RING_TIP]  = Point3::new(0.5, 0.62, 0.0);
        assert!((left_metric(&LandmarkSet::new(pts)) - 0.62).abs() < 1e-6);
    }

    #[test]
    fn right_metric_uses_all_landmarks() {
        let mut pts = [Point3::new(0.6, 0.3, 0.0); LANDMARK_COUNT];
        pts[landmark::WRIST] = Point3::new(0.21, 0.3, 0.0);
        assert!((right_metric(&LandmarkSet::new(pts)) - 0.21).abs() < 1e-6);
    }

    #[test]
    fn control_signal_from_pair_is_idempotent() {
        let pair = IdentifiedPair {
            left:  ramp_hand(0.6, 0.0, 0.4, 0.01),
            right: ramp_hand(0.15, 0.01, 0.4, 0.0),
        };
        let a = ControlSignal::from_pair(&pair);
        let b = ControlSignal::from_pair(&pair);
        assert_eq!(a, b);
        assert!((a.left  - 0.60).abs() < 1e-6);
        assert!((a.right - 0.15).abs() < 1e-6);
    }

    // ── continuity ───────────────────────────────────────────────────────

    #[test]
    fn cache_cold_start_reports_no_signal() {
        let mut cache = ContinuityCache::new();
        assert_eq!(cache.update(None), Activity::Cold);
        assert_eq!(cache.update(None).signal(), None);
    }

    #[test]
    fn cache_holds_last_signal_indefinitely() {
        let mut cache = ContinuityCache::new();
        let s = ControlSignal::new(0.6, 0.2);
        assert_eq!(cache.update(Some(s)), Activity::Fresh(s));
        for _ in 0..1000 {
            assert_eq!(cache.update(None), Activity::Held(s));
        }
    }

    #[test]
    fn cache_success_overwrites() {
        let mut cache = ContinuityCache::new();
        let a = ControlSignal::new(0.6, 0.2);
        let b = ControlSignal::new(0.7, 0.4);
        cache.update(Some(a));
        cache.update(None);
        assert_eq!(cache.update(Some(b)), Activity::Fresh(b));
        assert_eq!(cache.update(None), Activity::Held(b));
    }

    #[test]
    fn tracker_reports_pair_only_on_success() {
        let mut tracker = SignalTracker::new(HandResolver::default());
        let first = tracker.observe(&[det(Handedness::Left, 0.9, 0.1)]);
        assert_eq!(first.activity, Activity::Cold);
        assert!(first.pair.is_none() && first.active.is_none());
        assert_eq!(first.failure, Some(ResolveFailure::TooFewDetections { found: 1 }));

        let good = [det(Handedness::Left, 0.9, 0.1), det(Handedness::Right, 0.9, 0.6)];
        let ok = tracker.observe(&good);
        assert!(ok.pair.is_some() && ok.activity.is_fresh());

        let held = tracker.observe(&[]);
        assert!(held.pair.is_none());
        assert_eq!(held.active, ok.pair);
        assert_eq!(held.activity.signal(), ok.activity.signal());
    }
}
