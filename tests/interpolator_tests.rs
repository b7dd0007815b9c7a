//! Keyframe interpolator tests
//!
//! Tests for:
//! - Keyframe insertion, default times and the monotonic time guard
//! - Pass-through at keyframe times, clamping outside the path
//! - Referenced keyframes following frame (and ancestor) edits
//! - Orientation hemisphere handling, planar angle unwrapping
//! - Playback: update steps, looping, stopping, reverse speed
//! - Scheduler-driven ticks and custom schedulers
//! - Removing keyframes during playback
//! - Path sampling

use std::cell::RefCell;
use std::f32::consts::PI;
use std::rc::Rc;
use std::time::Duration;

use glam::Vec3;
use myth_frames::animation::{DEFAULT_PERIOD, KeyFrameInterpolator};
use myth_frames::{FrameError, FrameGraph, FrameKey, KeyFrameSource, Pose, Rotation, Scheduler};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-4;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

fn rot_approx(a: Rotation, b: Rotation) -> bool {
    a.dot(&b).abs() > 1.0 - 1e-5
}

fn at(x: f32, y: f32, z: f32) -> Pose {
    Pose::new(Vec3::new(x, y, z), Rotation::IDENTITY, Vec3::ONE)
}

fn frame_at(graph: &mut FrameGraph, position: Vec3) -> FrameKey {
    graph.create_with(position, Rotation::IDENTITY, Vec3::ONE).unwrap()
}

/// Snapshot keyframes at x = 0, 1, 2, ... and times 0, 1, 2, ...
fn straight_line(count: usize) -> KeyFrameInterpolator {
    let mut interpolator = KeyFrameInterpolator::new();
    for i in 0..count {
        interpolator.add_key_frame_snapshot(at(i as f32, 0.0, 0.0)).unwrap();
    }
    interpolator
}

// ============================================================================
// Keyframes
// ============================================================================

#[test]
fn default_times_count_up_from_zero() -> anyhow::Result<()> {
    let mut graph = FrameGraph::new();
    let a = graph.create();
    let mut interpolator = KeyFrameInterpolator::new();
    interpolator.add_key_frame(&graph, a)?;
    interpolator.add_key_frame(&graph, a)?;
    interpolator.add_key_frame_snapshot(Pose::default())?;

    assert_eq!(interpolator.number_of_key_frames(), 3);
    assert_eq!(interpolator.key_frame_time(0), Some(0.0));
    assert_eq!(interpolator.key_frame_time(2), Some(2.0));
    assert_eq!(interpolator.first_time(), Some(0.0));
    assert_eq!(interpolator.last_time(), Some(2.0));
    assert_eq!(interpolator.duration(), 2.0);
    assert_eq!(interpolator.key_frame(0).unwrap().source(), KeyFrameSource::Frame(a));
    assert_eq!(interpolator.key_frame(2).unwrap().source(), KeyFrameSource::Snapshot);
    Ok(())
}

#[test]
fn non_monotonic_times_are_rejected() -> anyhow::Result<()> {
    init_logger();
    let mut interpolator = KeyFrameInterpolator::new();
    interpolator.add_key_frame_snapshot_at(at(0.0, 0.0, 0.0), 1.0)?;

    assert_eq!(
        interpolator.add_key_frame_snapshot_at(at(1.0, 0.0, 0.0), 1.0),
        Err(FrameError::NonMonotonicKeyFrame { time: 1.0, last: 1.0 })
    );
    assert!(interpolator.add_key_frame_snapshot_at(at(1.0, 0.0, 0.0), 0.5).is_err());
    assert!(interpolator.add_key_frame_snapshot_at(at(1.0, 0.0, 0.0), f32::NAN).is_err());
    assert_eq!(interpolator.number_of_key_frames(), 1);

    interpolator.add_key_frame_snapshot_at(at(1.0, 0.0, 0.0), 1.5)?;
    assert_eq!(interpolator.number_of_key_frames(), 2);
    Ok(())
}

#[test]
fn missing_frame_cannot_be_a_key_frame() {
    let mut graph = FrameGraph::new();
    let gone = graph.create();
    graph.remove(gone);

    let mut interpolator = KeyFrameInterpolator::new();
    assert_eq!(interpolator.add_key_frame(&graph, gone), Err(FrameError::UnknownFrame(gone)));
}

#[test]
fn fewer_than_two_key_frames_is_a_no_op() {
    let mut graph = FrameGraph::new();
    let driven = frame_at(&mut graph, Vec3::new(7.0, 0.0, 0.0));
    let mut interpolator = KeyFrameInterpolator::for_frame(driven);

    assert!(interpolator.interpolate_at_time(&mut graph, 0.0).is_none());

    interpolator.add_key_frame_snapshot(at(1.0, 1.0, 1.0)).unwrap();
    assert!(interpolator.interpolate_at_time(&mut graph, 0.0).is_none());
    assert_eq!(graph.frame(driven).unwrap().position(), Vec3::new(7.0, 0.0, 0.0));
}

#[test]
fn remove_key_frame_out_of_bounds() {
    let mut interpolator = straight_line(2);
    assert_eq!(
        interpolator.remove_key_frame(5).err(),
        Some(FrameError::KeyFrameIndexOutOfBounds { index: 5, len: 2 })
    );
    let removed = interpolator.remove_key_frame(0).unwrap();
    assert_eq!(removed.time(), 0.0);
    assert_eq!(interpolator.first_time(), Some(1.0));
}

#[test]
fn delete_path_clears_everything() {
    let mut graph = FrameGraph::new();
    let mut interpolator = straight_line(3);
    interpolator.start_interpolation(&mut graph, None);
    interpolator.delete_path();

    assert_eq!(interpolator.number_of_key_frames(), 0);
    assert!(!interpolator.is_interpolation_started());
    assert!(interpolator.path(&graph).is_empty());
}

// ============================================================================
// Evaluation
// ============================================================================

#[test]
fn passes_through_key_frame_positions() -> anyhow::Result<()> {
    let mut graph = FrameGraph::new();
    let a = frame_at(&mut graph, Vec3::new(0.0, 0.0, 0.0));
    let b = frame_at(&mut graph, Vec3::new(1.0, 0.0, 0.0));
    let c = frame_at(&mut graph, Vec3::new(2.0, 1.0, 0.0));
    let driven = graph.create();

    let mut interpolator = KeyFrameInterpolator::for_frame(driven);
    interpolator.add_key_frame_at(&graph, a, 0.0)?;
    interpolator.add_key_frame_at(&graph, b, 1.0)?;
    interpolator.add_key_frame_at(&graph, c, 2.0)?;

    let pose = interpolator.interpolate_at_time(&mut graph, 1.0).unwrap();
    assert_eq!(pose.position, Vec3::new(1.0, 0.0, 0.0));
    assert!(vec3_approx(graph.frame(driven).unwrap().position(), Vec3::new(1.0, 0.0, 0.0)));

    let pose = interpolator.interpolate_at_time(&mut graph, 0.5).unwrap();
    assert!(pose.position.x > 0.0 && pose.position.x < 1.0);
    assert!(approx_eq(interpolator.interpolation_time(), 0.5));

    let pose = interpolator.interpolate_at_time(&mut graph, 2.0).unwrap();
    assert!(vec3_approx(pose.position, Vec3::new(2.0, 1.0, 0.0)));
    Ok(())
}

#[test]
fn passes_through_orientation_and_magnitude() -> anyhow::Result<()> {
    let poses = [
        Pose::new(Vec3::ZERO, Rotation::IDENTITY, Vec3::ONE),
        Pose::new(Vec3::X, Rotation::from_axis_angle(Vec3::Y, 1.0), Vec3::splat(2.0)),
        Pose::new(Vec3::Y, Rotation::from_axis_angle(Vec3::new(1.0, 0.0, 1.0), 2.0), Vec3::new(1.0, 3.0, 1.0)),
        Pose::new(Vec3::Z, Rotation::from_axis_angle(Vec3::X, -0.5), Vec3::splat(0.5)),
    ];
    let mut graph = FrameGraph::new();
    let mut interpolator = KeyFrameInterpolator::new();
    for (i, pose) in poses.iter().enumerate() {
        interpolator.add_key_frame_snapshot_at(*pose, i as f32 * 0.5)?;
    }

    for (i, expected) in poses.iter().enumerate() {
        let pose = interpolator.interpolate_at_time(&mut graph, i as f32 * 0.5).unwrap();
        assert!(vec3_approx(pose.position, expected.position));
        assert!(rot_approx(pose.orientation, expected.orientation));
        assert!(vec3_approx(pose.magnitude, expected.magnitude));
    }
    Ok(())
}

#[test]
fn times_outside_path_clamp_to_ends() {
    let mut graph = FrameGraph::new();
    let mut interpolator = straight_line(3);

    let before = interpolator.interpolate_at_time(&mut graph, -4.0).unwrap();
    assert_eq!(before.position, Vec3::ZERO);
    let after = interpolator.interpolate_at_time(&mut graph, 10.0).unwrap();
    assert_eq!(after.position, Vec3::new(2.0, 0.0, 0.0));
}

#[test]
fn evaluate_leaves_time_and_frame_alone() {
    let mut graph = FrameGraph::new();
    let driven = graph.create();
    let mut interpolator = straight_line(3);
    interpolator.set_frame(Some(driven));
    interpolator.set_interpolation_time(0.25);

    let pose = interpolator.evaluate(&graph, 1.0).unwrap();
    assert_eq!(pose.position, Vec3::X);
    assert_eq!(interpolator.interpolation_time(), 0.25);
    assert_eq!(graph.frame(driven).unwrap().position(), Vec3::ZERO);
}

#[test]
fn referenced_key_frames_follow_edits() -> anyhow::Result<()> {
    let mut graph = FrameGraph::new();
    let parent = graph.create();
    let a = frame_at(&mut graph, Vec3::ZERO);
    let b = graph.create_child(parent)?;
    graph.frame_mut(b).unwrap().set_translation(Vec3::new(2.0, 0.0, 0.0));

    let mut interpolator = KeyFrameInterpolator::new();
    interpolator.add_key_frame(&graph, a)?;
    interpolator.add_key_frame(&graph, b)?;
    interpolator.add_key_frame_snapshot(at(5.0, 0.0, 0.0))?;
    assert!(vec3_approx(interpolator.evaluate(&graph, 1.0).unwrap().position, Vec3::new(2.0, 0.0, 0.0)));

    // Editing the frame itself
    graph.frame_mut(b).unwrap().set_translation(Vec3::new(3.0, 0.0, 0.0));
    assert!(vec3_approx(interpolator.evaluate(&graph, 1.0).unwrap().position, Vec3::new(3.0, 0.0, 0.0)));

    // Editing an ancestor
    graph.frame_mut(parent).unwrap().set_translation(Vec3::new(0.0, 1.0, 0.0));
    assert!(vec3_approx(interpolator.evaluate(&graph, 1.0).unwrap().position, Vec3::new(3.0, 1.0, 0.0)));
    assert!(vec3_approx(interpolator.key_frame(1).unwrap().position(), Vec3::new(3.0, 1.0, 0.0)));
    Ok(())
}

#[test]
fn snapshot_key_frames_ignore_edits() -> anyhow::Result<()> {
    let mut graph = FrameGraph::new();
    let a = frame_at(&mut graph, Vec3::ZERO);
    let b = frame_at(&mut graph, Vec3::new(2.0, 0.0, 0.0));

    let mut interpolator = KeyFrameInterpolator::new();
    interpolator.add_key_frame_snapshot(graph.frame(a).unwrap().pose())?;
    interpolator.add_key_frame_snapshot(graph.frame(b).unwrap().pose())?;

    graph.frame_mut(b).unwrap().set_translation(Vec3::new(9.0, 0.0, 0.0));
    assert!(vec3_approx(interpolator.evaluate(&graph, 1.0).unwrap().position, Vec3::new(2.0, 0.0, 0.0)));
    Ok(())
}

#[test]
fn removed_reference_keeps_last_pose() -> anyhow::Result<()> {
    init_logger();
    let mut graph = FrameGraph::new();
    let a = frame_at(&mut graph, Vec3::ZERO);
    let b = frame_at(&mut graph, Vec3::new(2.0, 0.0, 0.0));
    let mut interpolator = KeyFrameInterpolator::new();
    interpolator.add_key_frame(&graph, a)?;
    interpolator.add_key_frame(&graph, b)?;
    interpolator.evaluate(&graph, 0.5);

    graph.remove(b);
    // Force a rebuild through a third keyframe
    interpolator.add_key_frame_snapshot(at(4.0, 0.0, 0.0))?;
    assert!(vec3_approx(interpolator.evaluate(&graph, 1.0).unwrap().position, Vec3::new(2.0, 0.0, 0.0)));
    Ok(())
}

#[test]
fn opposite_hemisphere_quaternions_take_short_path() -> anyhow::Result<()> {
    let mut graph = FrameGraph::new();
    let target = Rotation::from_axis_angle(Vec3::Y, 0.5);
    let mut interpolator = KeyFrameInterpolator::new();
    interpolator.add_key_frame_snapshot(Pose::new(Vec3::ZERO, Rotation::IDENTITY, Vec3::ONE))?;
    interpolator.add_key_frame_snapshot(Pose::new(Vec3::ZERO, target.negate(), Vec3::ONE))?;

    let mid = interpolator.interpolate_at_time(&mut graph, 0.5).unwrap();
    // Halfway along the short arc the rotation is about 0.25 rad, far from the
    // long way round.
    let angle = 2.0 * mid.orientation.dot(&Rotation::IDENTITY).abs().min(1.0).acos();
    assert!(angle > 0.1 && angle < 0.4, "angle = {angle}");
    Ok(())
}

#[test]
fn planar_angles_interpolate_across_the_seam() -> anyhow::Result<()> {
    let mut graph = FrameGraph::planar();
    let driven = graph.create();
    let mut interpolator = KeyFrameInterpolator::for_frame(driven);
    interpolator.add_key_frame_snapshot(Pose::new(Vec3::ZERO, Rotation::Planar(0.9 * PI), Vec3::ONE))?;
    interpolator.add_key_frame_snapshot(Pose::new(Vec3::X, Rotation::Planar(-0.9 * PI), Vec3::ONE))?;

    let mid = interpolator.interpolate_at_time(&mut graph, 0.5).unwrap();
    // Shortest way goes through PI, not through 0
    assert!(approx_eq(mid.orientation.angle().cos(), -1.0));
    let driven_angle = graph.frame(driven).unwrap().rotation().angle();
    assert!(approx_eq(driven_angle.cos(), -1.0));
    assert!(vec3_approx(graph.frame(driven).unwrap().position(), Vec3::new(0.5, 0.0, 0.0)));
    Ok(())
}

#[test]
fn driven_frame_under_parent_reaches_world_pose() -> anyhow::Result<()> {
    let mut graph = FrameGraph::new();
    let parent = graph.create_with(Vec3::new(0.0, 0.0, 3.0), Rotation::from_axis_angle(Vec3::Z, 1.0), Vec3::splat(2.0))?;
    let driven = graph.create_child(parent)?;
    let mut interpolator = KeyFrameInterpolator::for_frame(driven);
    let target = Pose::new(Vec3::new(1.0, 2.0, 3.0), Rotation::from_axis_angle(Vec3::X, 0.3), Vec3::splat(4.0));
    interpolator.add_key_frame_snapshot(Pose::default())?;
    interpolator.add_key_frame_snapshot(target)?;

    interpolator.interpolate_at_time(&mut graph, 1.0);
    let frame = graph.frame(driven).unwrap();
    assert!(vec3_approx(frame.position(), target.position));
    assert!(rot_approx(frame.orientation(), target.orientation));
    assert!(vec3_approx(frame.magnitude(), target.magnitude));
    Ok(())
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn update_advances_by_speed_times_period() {
    let mut graph = FrameGraph::new();
    let mut interpolator = straight_line(3);
    assert_eq!(interpolator.interpolation_period(), DEFAULT_PERIOD);

    interpolator.set_interpolation_speed(2.0);
    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(100)));
    assert!(interpolator.is_interpolation_started());
    assert!(approx_eq(interpolator.interpolation_time(), 0.2));

    interpolator.update(&mut graph);
    assert!(approx_eq(interpolator.interpolation_time(), 0.4));
}

#[test]
fn looping_wraps_around() {
    let mut graph = FrameGraph::new();
    let mut interpolator = straight_line(2);
    interpolator.set_loop_interpolation(true);
    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(500)));
    // start ran the first update at t = 0
    assert!(approx_eq(interpolator.interpolation_time(), 0.5));

    interpolator.update(&mut graph); // evaluates 0.5
    assert!(approx_eq(interpolator.interpolation_time(), 1.0));
    interpolator.update(&mut graph); // evaluates 1.0, overshoots to 1.5
    assert!(approx_eq(interpolator.interpolation_time(), 0.5));
    assert!(interpolator.is_interpolation_started());
}

#[test]
fn playback_stops_at_the_end() {
    let mut graph = FrameGraph::new();
    let driven = graph.create();
    let mut interpolator = straight_line(2);
    interpolator.set_frame(Some(driven));
    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(400)));

    for _ in 0..4 {
        interpolator.update(&mut graph);
    }
    assert!(!interpolator.is_interpolation_started());
    assert_eq!(interpolator.interpolation_time(), 1.0);
    assert!(vec3_approx(graph.frame(driven).unwrap().position(), Vec3::X));
}

#[test]
fn reverse_playback_restarts_from_the_end() {
    let mut graph = FrameGraph::new();
    let driven = graph.create();
    let mut interpolator = straight_line(3);
    interpolator.set_frame(Some(driven));
    interpolator.set_interpolation_speed(-1.0);

    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(500)));
    assert!(vec3_approx(graph.frame(driven).unwrap().position(), Vec3::new(2.0, 0.0, 0.0)));
    assert!(approx_eq(interpolator.interpolation_time(), 1.5));

    for _ in 0..5 {
        interpolator.update(&mut graph);
    }
    assert!(!interpolator.is_interpolation_started());
    assert_eq!(interpolator.interpolation_time(), 0.0);
    assert!(vec3_approx(graph.frame(driven).unwrap().position(), Vec3::ZERO));
}

#[test]
fn start_without_key_frames_does_nothing() {
    let mut graph = FrameGraph::new();
    let mut interpolator = KeyFrameInterpolator::new();
    interpolator.start_interpolation(&mut graph, None);
    assert!(!interpolator.is_interpolation_started());
    assert!(!interpolator.scheduler().is_active());
}

#[test]
fn toggle_and_reset() {
    let mut graph = FrameGraph::new();
    let mut interpolator = straight_line(3);

    interpolator.toggle_interpolation(&mut graph);
    assert!(interpolator.is_interpolation_started());
    assert!(interpolator.scheduler().is_active());

    interpolator.toggle_interpolation(&mut graph);
    assert!(!interpolator.is_interpolation_started());
    assert!(!interpolator.scheduler().is_active());

    interpolator.set_interpolation_time(1.7);
    interpolator.reset_interpolation();
    assert_eq!(interpolator.interpolation_time(), 0.0);
}

#[test]
fn adding_a_key_frame_rewinds_time() {
    let mut interpolator = straight_line(3);
    interpolator.set_interpolation_time(1.5);
    interpolator.add_key_frame_snapshot(at(3.0, 0.0, 0.0)).unwrap();
    assert_eq!(interpolator.interpolation_time(), 0.0);
}

#[test]
fn removing_in_flight_key_frame_keeps_playback_sane() {
    init_logger();
    let mut graph = FrameGraph::new();
    let driven = graph.create();
    let mut interpolator = straight_line(4);
    interpolator.set_frame(Some(driven));
    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(500)));
    interpolator.update(&mut graph);
    interpolator.update(&mut graph);
    // Last evaluation was at t = 1.0, in the [1, 2] segment
    assert!(approx_eq(interpolator.interpolation_time(), 1.5));

    interpolator.remove_key_frame(1).unwrap();
    assert!(!interpolator.is_interpolation_started());

    // Remaining keyframes: t = 0 (x = 0), t = 2 (x = 2), t = 3 (x = 3)
    interpolator.update(&mut graph);
    let x = graph.frame(driven).unwrap().position().x;
    assert!(x > 0.0 && x < 2.0, "x = {x}");

    let pose = interpolator.interpolate_at_time(&mut graph, 2.0).unwrap();
    assert_eq!(pose.position, Vec3::new(2.0, 0.0, 0.0));
}

// ============================================================================
// Scheduler Integration
// ============================================================================

#[test]
fn tick_runs_due_updates() {
    let mut graph = FrameGraph::new();
    let mut interpolator = straight_line(3);
    assert_eq!(interpolator.tick(&mut graph, Duration::from_secs(1)), 0);

    interpolator.start_interpolation(&mut graph, None);
    let start = interpolator.interpolation_time();

    assert_eq!(interpolator.tick(&mut graph, Duration::from_millis(100)), 2);
    assert!(approx_eq(interpolator.interpolation_time(), start + 0.08));

    assert_eq!(interpolator.tick(&mut graph, Duration::from_millis(20)), 1);
    assert!(approx_eq(interpolator.interpolation_time(), start + 0.12));
}

#[test]
fn tick_stops_when_playback_ends() {
    let mut graph = FrameGraph::new();
    let mut interpolator = straight_line(2);
    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(250)));

    // Plenty of due ticks, but playback ends after reaching t = 1
    let ran = interpolator.tick(&mut graph, Duration::from_secs(2));
    assert!(ran < 8, "ran = {ran}");
    assert!(!interpolator.is_interpolation_started());
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SchedulerCall {
    Run(Duration),
    Stop,
}

/// Scheduler that fires once per `advance` call and records every call.
#[derive(Debug)]
struct ManualScheduler {
    calls: Rc<RefCell<Vec<SchedulerCall>>>,
    active: bool,
}

impl ManualScheduler {
    fn new(calls: &Rc<RefCell<Vec<SchedulerCall>>>) -> Box<Self> {
        Box::new(Self {
            calls: Rc::clone(calls),
            active: false,
        })
    }
}

impl Scheduler for ManualScheduler {
    fn run(&mut self, period: Duration) {
        // A second live handle would fire twice per period
        assert!(!self.active, "scheduler armed while already running");
        self.calls.borrow_mut().push(SchedulerCall::Run(period));
        self.active = true;
    }

    fn run_once(&mut self, delay: Duration) {
        self.run(delay);
    }

    fn stop(&mut self) {
        self.calls.borrow_mut().push(SchedulerCall::Stop);
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn advance(&mut self, _dt: Duration) -> u32 {
        u32::from(self.active)
    }
}

fn run_periods(calls: &Rc<RefCell<Vec<SchedulerCall>>>) -> Vec<Duration> {
    calls
        .borrow()
        .iter()
        .filter_map(|call| match call {
            SchedulerCall::Run(period) => Some(*period),
            SchedulerCall::Stop => None,
        })
        .collect()
}

#[test]
fn custom_scheduler_is_driven_by_the_interpolator() {
    let mut graph = FrameGraph::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut interpolator = KeyFrameInterpolator::with_scheduler(ManualScheduler::new(&calls));
    for i in 0..3 {
        interpolator.add_key_frame_snapshot(at(i as f32, 0.0, 0.0)).unwrap();
    }

    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(10)));
    interpolator.set_interpolation_period(Duration::from_millis(20));
    assert_eq!(
        run_periods(&calls),
        vec![Duration::from_millis(10), Duration::from_millis(20)]
    );

    let before = interpolator.interpolation_time();
    assert_eq!(interpolator.tick(&mut graph, Duration::ZERO), 1);
    assert!(approx_eq(interpolator.interpolation_time(), before + 0.02));

    interpolator.stop_interpolation();
    assert!(!interpolator.scheduler().is_active());
}

#[test]
fn restarting_cancels_the_running_schedule() {
    let mut graph = FrameGraph::new();
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut interpolator = KeyFrameInterpolator::with_scheduler(ManualScheduler::new(&calls));
    for i in 0..3 {
        interpolator.add_key_frame_snapshot(at(i as f32, 0.0, 0.0)).unwrap();
    }

    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(10)));
    interpolator.start_interpolation(&mut graph, Some(Duration::from_millis(30)));

    // Each arm is preceded by a cancel, so only the latest schedule is live
    assert_eq!(
        *calls.borrow(),
        vec![
            SchedulerCall::Stop,
            SchedulerCall::Run(Duration::from_millis(10)),
            SchedulerCall::Stop,
            SchedulerCall::Run(Duration::from_millis(30)),
        ]
    );
    assert!(interpolator.is_interpolation_started());
    assert!(interpolator.scheduler().is_active());
    assert_eq!(interpolator.interpolation_period(), Duration::from_millis(30));

    // One tick per advance, not one per start call
    let before = interpolator.interpolation_time();
    assert_eq!(interpolator.tick(&mut graph, Duration::ZERO), 1);
    assert!(approx_eq(interpolator.interpolation_time(), before + 0.03));
}

// ============================================================================
// Path
// ============================================================================

#[test]
fn path_samples_every_segment() {
    let graph = FrameGraph::new();
    let mut interpolator = straight_line(3);
    interpolator.set_path_steps(10);

    let path = interpolator.path(&graph);
    assert_eq!(path.len(), 21);
    assert_eq!(path[0].position, Vec3::ZERO);
    assert_eq!(path[10].position, Vec3::X);
    assert!(vec3_approx(path[20].position, Vec3::new(2.0, 0.0, 0.0)));
    assert!(path.windows(2).all(|w| w[1].position.x >= w[0].position.x));
}

#[test]
fn path_of_single_key_frame() {
    let graph = FrameGraph::new();
    let mut interpolator = straight_line(1);
    assert_eq!(interpolator.path(&graph).len(), 1);

    interpolator.set_path_steps(0);
    assert_eq!(interpolator.path_steps(), 1);
}

#[test]
fn path_follows_referenced_frames() -> anyhow::Result<()> {
    let mut graph = FrameGraph::new();
    let a = frame_at(&mut graph, Vec3::ZERO);
    let b = frame_at(&mut graph, Vec3::X);
    let mut interpolator = KeyFrameInterpolator::new();
    interpolator.add_key_frame(&graph, a)?;
    interpolator.add_key_frame(&graph, b)?;

    let end = interpolator.path(&graph).last().map(|pose| pose.position);
    assert_eq!(end, Some(Vec3::X));

    graph.frame_mut(b).unwrap().set_translation(Vec3::Y);
    let end = interpolator.path(&graph).last().map(|pose| pose.position);
    assert_eq!(end, Some(Vec3::Y));
    Ok(())
}
