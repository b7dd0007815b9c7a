//! Keyframe path interpolation.
//!
//! [`KeyFrameInterpolator`] fits a curve through an ordered list of
//! keyframes and drives a frame along it:
//! - positions and magnitudes follow a cubic Hermite spline with Catmull-Rom
//!   tangents
//! - orientations follow a SQUAD curve (3D) or a linear angle blend (2D)
//!
//! # Caching
//!
//! Three caches are kept and rebuilt lazily:
//! - keyframe poses and tangents, rebuilt when a keyframe is added or
//!   removed, or when a referenced frame (or one of its ancestors) changed
//!   since the last rebuild
//! - the bracket of four keyframes around the current time, with the
//!   Hermite coefficients of the middle segment
//! - the sampled path returned by [`KeyFrameInterpolator::path`]
//!
//! # Playback
//!
//! The interpolator never owns a thread. A [`Scheduler`] decides when ticks
//! are due; the caller feeds it elapsed time with
//! [`KeyFrameInterpolator::tick`], or calls [`KeyFrameInterpolator::update`]
//! directly.
//!
//! ```rust,ignore
//! let mut interpolator = KeyFrameInterpolator::new();
//! interpolator.set_frame(Some(camera));
//! interpolator.add_key_frame(&graph, a)?;
//! interpolator.add_key_frame(&graph, b)?;
//! interpolator.start_interpolation(&mut graph, None);
//! loop {
//!     interpolator.tick(&mut graph, frame_time);
//! }
//! ```

use std::time::Duration;

use crate::animation::keyframe::{KeyFrame, KeyFrameSource};
use crate::animation::spline::SplineSegment;
use crate::errors::{FrameError, Result};
use crate::scene::{FrameGraph, FrameKey, Pose};
use crate::utils::scheduler::{IntervalScheduler, Scheduler};

/// Default time between two playback updates.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(40);

/// Default number of path samples per segment.
pub const DEFAULT_PATH_STEPS: usize = 30;

/// How many segments the bracket cursor scans forward before falling back
/// to a binary search.
const MAX_SCAN_OFFSET: usize = 3;

/// Spline interpolator over a list of keyframes.
#[derive(Debug)]
pub struct KeyFrameInterpolator {
    key_frames: Vec<KeyFrame>,
    frame: Option<FrameKey>,

    // === Cache state ===
    values_valid: bool,
    values_stamp: u64,
    /// Indices of the keyframes before, at, after and past the current time.
    bracket: Option<[usize; 4]>,
    segment: Option<SplineSegment>,
    path: Vec<Pose>,
    path_valid: bool,
    path_stamp: u64,
    path_steps: usize,

    // === Playback state ===
    time: f32,
    speed: f32,
    period: Duration,
    looping: bool,
    started: bool,
    scheduler: Box<dyn Scheduler>,
}

impl Default for KeyFrameInterpolator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyFrameInterpolator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_scheduler(Box::new(IntervalScheduler::new()))
    }

    #[must_use]
    pub fn with_scheduler(scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            key_frames: Vec::new(),
            frame: None,

            values_valid: false,
            values_stamp: 0,
            bracket: None,
            segment: None,
            path: Vec::new(),
            path_valid: false,
            path_stamp: 0,
            path_steps: DEFAULT_PATH_STEPS,

            time: 0.0,
            speed: 1.0,
            period: DEFAULT_PERIOD,
            looping: false,
            started: false,
            scheduler,
        }
    }

    /// Interpolator driving `frame`.
    #[must_use]
    pub fn for_frame(frame: FrameKey) -> Self {
        let mut interpolator = Self::new();
        interpolator.frame = Some(frame);
        interpolator
    }

    /// Frame written by playback, if any.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> Option<FrameKey> {
        self.frame
    }

    pub fn set_frame(&mut self, frame: Option<FrameKey>) {
        self.frame = frame;
    }

    // ========================================================================
    // Keyframes
    // ========================================================================

    /// Appends a keyframe tracking `frame`, one time unit after the last one
    /// (or at 0 for the first).
    pub fn add_key_frame(&mut self, graph: &FrameGraph, frame: FrameKey) -> Result<()> {
        let time = self.next_default_time();
        self.add_key_frame_at(graph, frame, time)
    }

    /// Appends a keyframe tracking `frame` at `time`.
    ///
    /// Later edits to `frame` (or its ancestors) reshape the path.
    pub fn add_key_frame_at(&mut self, graph: &FrameGraph, frame: FrameKey, time: f32) -> Result<()> {
        let Some(view) = graph.frame(frame) else {
            log::warn!("Cannot add key frame for missing frame {frame:?}");
            return Err(FrameError::UnknownFrame(frame));
        };
        let pose = view.pose();
        self.push_key_frame(KeyFrame::new(time, KeyFrameSource::Frame(frame), pose))
    }

    /// Appends a snapshot keyframe one time unit after the last one.
    pub fn add_key_frame_snapshot(&mut self, pose: Pose) -> Result<()> {
        let time = self.next_default_time();
        self.add_key_frame_snapshot_at(pose, time)
    }

    /// Appends a snapshot keyframe at `time`. The pose is copied and never
    /// changes afterwards.
    pub fn add_key_frame_snapshot_at(&mut self, pose: Pose, time: f32) -> Result<()> {
        self.push_key_frame(KeyFrame::new(time, KeyFrameSource::Snapshot, pose))
    }

    fn next_default_time(&self) -> f32 {
        self.last_time().map_or(0.0, |last| last + 1.0)
    }

    fn push_key_frame(&mut self, key_frame: KeyFrame) -> Result<()> {
        let time = key_frame.time();
        let last = self.last_time();
        let monotonic = time.is_finite() && last.is_none_or(|last| time > last);
        if !monotonic {
            let last = last.unwrap_or(f32::NEG_INFINITY);
            log::warn!("Rejected key frame at {time}: last key frame is at {last}");
            return Err(FrameError::NonMonotonicKeyFrame { time, last });
        }

        self.key_frames.push(key_frame);
        self.invalidate();
        self.time = self.first_time().unwrap_or(0.0);
        Ok(())
    }

    /// Removes and returns the keyframe at `index`. Playback is stopped.
    pub fn remove_key_frame(&mut self, index: usize) -> Result<KeyFrame> {
        let len = self.key_frames.len();
        if index >= len {
            log::warn!("Cannot remove key frame {index}: only {len} key frames");
            return Err(FrameError::KeyFrameIndexOutOfBounds { index, len });
        }
        self.stop_interpolation();
        let removed = self.key_frames.remove(index);
        self.invalidate();
        Ok(removed)
    }

    /// Removes every keyframe. Playback is stopped.
    pub fn delete_path(&mut self) {
        self.stop_interpolation();
        self.key_frames.clear();
        self.path.clear();
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.values_valid = false;
        self.path_valid = false;
        self.bracket = None;
        self.segment = None;
    }

    #[must_use]
    pub fn key_frame(&self, index: usize) -> Option<&KeyFrame> {
        self.key_frames.get(index)
    }

    #[must_use]
    pub fn key_frames(&self) -> &[KeyFrame] {
        &self.key_frames
    }

    #[must_use]
    pub fn key_frame_time(&self, index: usize) -> Option<f32> {
        self.key_frames.get(index).map(KeyFrame::time)
    }

    #[inline]
    #[must_use]
    pub fn number_of_key_frames(&self) -> usize {
        self.key_frames.len()
    }

    #[must_use]
    pub fn first_time(&self) -> Option<f32> {
        self.key_frames.first().map(KeyFrame::time)
    }

    #[must_use]
    pub fn last_time(&self) -> Option<f32> {
        self.key_frames.last().map(KeyFrame::time)
    }

    /// `last_time - first_time`, or 0 with fewer than two keyframes.
    #[must_use]
    pub fn duration(&self) -> f32 {
        match (self.first_time(), self.last_time()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    // ========================================================================
    // Playback parameters
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn interpolation_time(&self) -> f32 {
        self.time
    }

    pub fn set_interpolation_time(&mut self, time: f32) {
        self.time = time;
    }

    #[inline]
    #[must_use]
    pub fn interpolation_speed(&self) -> f32 {
        self.speed
    }

    /// Time units advanced per second of playback. Negative values play
    /// backwards.
    pub fn set_interpolation_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    #[inline]
    #[must_use]
    pub fn interpolation_period(&self) -> Duration {
        self.period
    }

    /// Changes the update period. A running playback is re-armed.
    pub fn set_interpolation_period(&mut self, period: Duration) {
        self.period = period;
        if self.started {
            self.scheduler.stop();
            self.scheduler.run(period);
        }
    }

    #[inline]
    #[must_use]
    pub fn loop_interpolation(&self) -> bool {
        self.looping
    }

    pub fn set_loop_interpolation(&mut self, looping: bool) {
        self.looping = looping;
    }

    #[inline]
    #[must_use]
    pub fn is_interpolation_started(&self) -> bool {
        self.started
    }

    #[inline]
    #[must_use]
    pub fn path_steps(&self) -> usize {
        self.path_steps
    }

    /// Samples per segment in [`path`](Self::path). Clamped to at least 1.
    pub fn set_path_steps(&mut self, steps: usize) {
        let steps = steps.max(1);
        if steps != self.path_steps {
            self.path_steps = steps;
            self.path_valid = false;
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> &dyn Scheduler {
        self.scheduler.as_ref()
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Starts playback, optionally with a new period.
    ///
    /// Playback restarts from the beginning (or the end, for a negative
    /// speed) when the current time is already past the path. Does nothing
    /// without keyframes.
    pub fn start_interpolation(&mut self, graph: &mut FrameGraph, period: Option<Duration>) {
        if let Some(period) = period {
            self.period = period;
        }
        let (Some(first), Some(last)) = (self.first_time(), self.last_time()) else {
            log::debug!("Interpolation not started: no key frames");
            return;
        };

        if self.speed > 0.0 && self.time >= last {
            self.time = first;
        }
        if self.speed < 0.0 && self.time <= first {
            self.time = last;
        }

        self.scheduler.stop();
        self.scheduler.run(self.period);
        self.started = true;
        log::debug!("Interpolation started at t = {}", self.time);
        self.update(graph);
    }

    pub fn stop_interpolation(&mut self) {
        if self.started {
            log::debug!("Interpolation stopped at t = {}", self.time);
        }
        self.scheduler.stop();
        self.started = false;
    }

    pub fn toggle_interpolation(&mut self, graph: &mut FrameGraph) {
        if self.started {
            self.stop_interpolation();
        } else {
            self.start_interpolation(graph, None);
        }
    }

    /// Stops playback and rewinds to the first keyframe.
    pub fn reset_interpolation(&mut self) {
        self.stop_interpolation();
        self.time = self.first_time().unwrap_or(0.0);
    }

    /// Feeds `dt` of elapsed time to the scheduler and runs one
    /// [`update`](Self::update) per due tick. Returns the number of updates.
    pub fn tick(&mut self, graph: &mut FrameGraph, dt: Duration) -> u32 {
        if !self.started {
            return 0;
        }
        let due = self.scheduler.advance(dt);
        let mut ran = 0;
        for _ in 0..due {
            if !self.started {
                break;
            }
            self.update(graph);
            ran += 1;
        }
        ran
    }

    /// One playback step: applies the pose at the current time, then moves
    /// the time by `speed × period`.
    ///
    /// Past either end the time wraps around when looping; otherwise the
    /// boundary pose is applied and playback stops.
    pub fn update(&mut self, graph: &mut FrameGraph) {
        self.interpolate_at_time(graph, self.time);

        let (Some(first), Some(last)) = (self.first_time(), self.last_time()) else {
            return;
        };

        self.time += self.speed * self.period.as_secs_f32();

        if self.time > last || self.time < first {
            if self.looping {
                self.time = wrap_time(self.time, first, last);
            } else {
                let boundary = if self.time > last { last } else { first };
                self.interpolate_at_time(graph, boundary);
                self.stop_interpolation();
            }
        }
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Sets the current time, evaluates the path there and writes the result
    /// to the driven frame.
    ///
    /// With fewer than two keyframes nothing is evaluated and `None` is
    /// returned.
    pub fn interpolate_at_time(&mut self, graph: &mut FrameGraph, time: f32) -> Option<Pose> {
        self.time = time;
        let pose = self.evaluate(graph, time)?;

        if let Some(key) = self.frame {
            match graph.frame_mut(key) {
                Some(mut frame) => {
                    frame.set_position(pose.position);
                    frame.set_orientation(pose.orientation);
                    if let Err(err) = frame.set_magnitude(pose.magnitude) {
                        log::debug!("Interpolated magnitude not applied: {err}");
                    }
                }
                None => log::warn!("Interpolated frame {key:?} no longer exists"),
            }
        }

        log::trace!("Interpolated pose at t = {time}");
        Some(pose)
    }

    /// Pose of the path at `time`, without touching the driven frame or the
    /// current time. Times outside the path clamp to its ends.
    pub fn evaluate(&mut self, graph: &FrameGraph, time: f32) -> Option<Pose> {
        if self.key_frames.len() < 2 {
            return None;
        }

        let newest = self.check_validity(graph);
        if !self.values_valid {
            self.update_values(graph, newest);
        }
        let [_, k1, k2, _] = self.update_bracket(time);

        let segment = match self.segment {
            Some(segment) => segment,
            None => {
                let segment = SplineSegment::new(&self.key_frames[k1], &self.key_frames[k2]);
                self.segment = Some(segment);
                segment
            }
        };

        let t1 = self.key_frames[k1].time();
        let dt = self.key_frames[k2].time() - t1;
        let alpha = if dt == 0.0 { 0.0 } else { (time - t1) / dt };
        Some(segment.sample(alpha))
    }

    /// Poses sampled along the path, `path_steps` per segment plus the last
    /// keyframe. A single keyframe yields its pose; none yields nothing.
    pub fn path(&mut self, graph: &FrameGraph) -> &[Pose] {
        let newest = self.check_validity(graph);
        if !self.path_valid {
            if !self.values_valid {
                self.update_values(graph, newest);
            }
            self.rebuild_path();
            self.path_valid = true;
            self.path_stamp = newest;
        }
        &self.path
    }

    fn rebuild_path(&mut self) {
        self.path.clear();
        match self.key_frames.as_slice() {
            [] => {}
            [only] => self.path.push(*only.pose()),
            key_frames => {
                let steps = self.path_steps;
                for pair in key_frames.windows(2) {
                    let segment = SplineSegment::new(&pair[0], &pair[1]);
                    for step in 0..steps {
                        self.path.push(segment.sample(step as f32 / steps as f32));
                    }
                }
                if let Some(last) = key_frames.last() {
                    self.path.push(*last.pose());
                }
            }
        }
        log::debug!("Rebuilt interpolation path: {} samples", self.path.len());
    }

    // ========================================================================
    // Cache maintenance
    // ========================================================================

    /// Invalidates caches older than the newest referenced-frame stamp and
    /// returns that stamp.
    fn check_validity(&mut self, graph: &FrameGraph) -> u64 {
        let newest = self
            .key_frames
            .iter()
            .filter_map(KeyFrame::frame)
            .filter_map(|key| graph.frame(key))
            .map(|frame| frame.last_update())
            .max()
            .unwrap_or(0);

        if newest > self.values_stamp {
            self.values_valid = false;
        }
        if newest > self.path_stamp {
            self.path_valid = false;
        }
        newest
    }

    fn update_values(&mut self, graph: &FrameGraph, stamp: u64) {
        for key_frame in &mut self.key_frames {
            key_frame.refresh(graph);
        }

        if let Some(first) = self.key_frames.first() {
            let mut previous = first.orientation();
            for key_frame in &mut self.key_frames {
                key_frame.flip_orientation_if_needed(&previous);
                previous = key_frame.orientation();
            }
        }

        let n = self.key_frames.len();
        for i in 0..n {
            let prev = *self.key_frames[i.saturating_sub(1)].pose();
            let next = *self.key_frames[(i + 1).min(n - 1)].pose();
            self.key_frames[i].compute_tangents(&prev, &next);
        }

        self.values_valid = true;
        self.values_stamp = stamp;
        self.segment = None;
        log::debug!("Rebuilt tangents for {n} key frames");
    }

    /// Finds the keyframes around `time`, reusing the cached bracket when it
    /// still applies.
    fn update_bracket(&mut self, time: f32) -> [usize; 4] {
        let n = self.key_frames.len();

        if let Some(bracket) = self.bracket
            && self.bracket_holds(bracket, time)
        {
            return bracket;
        }

        // Forward scan from the cached segment covers regular playback.
        let start = self.bracket.map_or(0, |[_, k1, _, _]| k1);
        let scanned = (start..n.saturating_sub(1))
            .take(MAX_SCAN_OFFSET + 1)
            .find(|&i| self.key_frames[i].time() <= time && time < self.key_frames[i + 1].time());

        let (k1, k2) = match scanned {
            Some(i) => (i, i + 1),
            None => {
                // Index of the first keyframe strictly after `time`.
                let next = self.key_frames.partition_point(|kf| kf.time() <= time);
                if next == 0 {
                    (0, 0)
                } else if next == n {
                    (n - 1, n - 1)
                } else {
                    (next - 1, next)
                }
            }
        };

        let bracket = [k1.saturating_sub(1), k1, k2, (k2 + 1).min(n - 1)];
        if self.bracket != Some(bracket) {
            self.segment = None;
        }
        self.bracket = Some(bracket);
        bracket
    }

    fn bracket_holds(&self, [_, k1, k2, _]: [usize; 4], time: f32) -> bool {
        let n = self.key_frames.len();
        if k1 >= n || k2 >= n {
            return false;
        }
        let t1 = self.key_frames[k1].time();
        let t2 = self.key_frames[k2].time();
        if k1 == k2 {
            (k1 == 0 && time < t1) || (k1 == n - 1 && time >= t1)
        } else {
            t1 <= time && time < t2
        }
    }
}

/// Wraps `time` into `[first, last)`.
fn wrap_time(time: f32, first: f32, last: f32) -> f32 {
    let duration = last - first;
    if duration <= 0.0 {
        first
    } else {
        first + (time - first).rem_euclid(duration)
    }
}
