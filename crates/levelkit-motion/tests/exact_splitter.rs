use levelkit_core::{
    BedEnvelope, BedMesh, FadeLeveling, MeshGeometry, MotionPlanner, MoveOutcome, MoveRequest, Position, Segment,
    SegmentQueue,
};
use levelkit_motion::{ExactCartesianSplitter, LevelingStrategy, MotionContext};

const EPS: f32 = 1e-4;

/// 3x3 grid, 50mm spacing; cell (0,0) rises from 0 on the left to 2 on the right
fn scenario_mesh() -> BedMesh {
    BedMesh::from_fn(MeshGeometry::with_spacing(0.0, 0.0, 50.0, 50.0, 3, 3), |ix, iy| {
        Some(match (ix, iy) {
            (1, 0) | (1, 1) => 2.0,
            _ => 0.0,
        })
    })
    .unwrap()
}

/// 5x5 grid, 10mm spacing, constant 0.5mm offset
fn flat_mesh() -> BedMesh {
    BedMesh::from_fn(MeshGeometry::with_spacing(0.0, 0.0, 10.0, 10.0, 5, 5), |_, _| Some(0.5)).unwrap()
}

/// 5x5 grid, 10mm spacing, twisted surface
fn sloped_mesh() -> BedMesh {
    BedMesh::from_fn(MeshGeometry::with_spacing(0.0, 0.0, 10.0, 10.0, 5, 5), |ix, iy| {
        Some(0.1 * ix as f32 - 0.05 * iy as f32 + 0.03 * (ix * iy) as f32)
    })
    .unwrap()
}

fn run_with(
    splitter: &ExactCartesianSplitter,
    mesh: &BedMesh,
    leveling: &FadeLeveling,
    planner: &mut dyn MotionPlanner,
    request: MoveRequest,
) -> MoveOutcome {
    let envelope = BedEnvelope::unbounded();
    let mut ctx = MotionContext::new(mesh, leveling, &envelope, planner);
    splitter.line_to(&request, &mut ctx)
}

fn run(mesh: &BedMesh, request: MoveRequest) -> (MoveOutcome, Vec<Segment>) {
    let mut queue = SegmentQueue::new();
    let outcome = run_with(
        &ExactCartesianSplitter::new(),
        mesh,
        &FadeLeveling::new(),
        &mut queue,
        request,
    );
    (outcome, queue.drain())
}

fn xy_targets(segments: &[Segment]) -> Vec<(f32, f32)> {
    segments.iter().map(|s| (s.target.x, s.target.y)).collect()
}

fn assert_xy(actual: (f32, f32), expected: (f32, f32)) {
    assert!(
        (actual.0 - expected.0).abs() < EPS && (actual.1 - expected.1).abs() < EPS,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[test]
fn test_single_cell_move() {
    let mesh = scenario_mesh();
    let start = Position::new(0.0, 0.0, 0.2, 0.0);
    let end = Position::new(25.0, 25.0, 0.2, 1.5);
    let (outcome, segments) = run(&mesh, MoveRequest::new(start, end, 1000.0));

    assert_eq!(outcome, MoveOutcome::Moved(end));
    assert_eq!(segments.len(), 1);
    let seg = segments[0];
    assert_xy((seg.target.x, seg.target.y), (25.0, 25.0));
    assert!((seg.target.z - 1.2).abs() < EPS);
    assert_eq!(seg.target.e, 1.5);
    assert_eq!(seg.feed_rate, 1000.0);
    assert_eq!(seg.length, None);
}

#[test]
fn test_single_cell_near_far_corner() {
    let mesh = scenario_mesh();
    let end = Position::new(49.0, 49.0, 0.0, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(Position::default(), end, 50.0));
    assert_eq!(segments.len(), 1);
    assert!((segments[0].target.z - 1.96).abs() < EPS);
}

#[test]
fn test_vertical_move_crosses_each_row() {
    let mesh = flat_mesh();
    let start = Position::new(5.0, 5.0, 0.2, 0.0);
    let end = Position::new(5.0, 35.0, 0.2, 3.0);
    let (outcome, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    assert_eq!(outcome, MoveOutcome::Moved(end));
    let targets = xy_targets(&segments);
    assert_eq!(targets.len(), 4);
    for (actual, y) in targets.iter().zip([10.0, 20.0, 30.0, 35.0]) {
        assert_xy(*actual, (5.0, y));
    }
    for seg in &segments {
        assert!((seg.target.z - 0.7).abs() < EPS);
    }
    // Extrusion advances with Y
    assert!((segments[0].target.e - 0.5).abs() < EPS);
    assert!((segments[2].target.e - 2.5).abs() < EPS);
    assert_eq!(segments[3].target.e, 3.0);
}

#[test]
fn test_vertical_move_downwards() {
    let mesh = flat_mesh();
    let start = Position::new(5.0, 35.0, 0.0, 0.0);
    let end = Position::new(5.0, 5.0, 0.0, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    let targets = xy_targets(&segments);
    assert_eq!(targets.len(), 4);
    for (actual, y) in targets.iter().zip([30.0, 20.0, 10.0, 5.0]) {
        assert_xy(*actual, (5.0, y));
    }
}

#[test]
fn test_move_ending_on_mesh_line_has_no_final_segment() {
    let mesh = flat_mesh();
    let start = Position::new(5.0, 5.0, 0.0, 0.0);
    let end = Position::new(5.0, 30.0, 0.0, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));
    assert_eq!(segments.len(), 3);
    assert_xy((segments[2].target.x, segments[2].target.y), (5.0, 30.0));
}

#[test]
fn test_start_on_mesh_line_skips_zero_length_segment() {
    let mesh = flat_mesh();
    let start = Position::new(20.0, 5.0, 0.0, 0.0);
    let end = Position::new(5.0, 5.0, 0.0, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    let targets = xy_targets(&segments);
    assert_eq!(targets.len(), 2);
    assert_xy(targets[0], (10.0, 5.0));
    assert_xy(targets[1], (5.0, 5.0));
}

#[test]
fn test_horizontal_move_crosses_each_column() {
    let mesh = sloped_mesh();
    let start = Position::new(2.0, 15.0, 0.0, 0.0);
    let end = Position::new(38.0, 15.0, 0.0, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    let targets = xy_targets(&segments);
    assert_eq!(targets.len(), 4);
    for (actual, x) in targets.iter().zip([10.0, 20.0, 30.0, 38.0]) {
        assert_xy(*actual, (x, 15.0));
    }
    for seg in &segments {
        let expected = mesh.correction_at(seg.target.x, seg.target.y);
        assert!((seg.target.z - expected).abs() < EPS);
    }
}

#[test]
fn test_diagonal_move_visits_crossings_in_order() {
    let mesh = sloped_mesh();
    let start = Position::new(5.0, 5.0, 0.0, 0.0);
    let end = Position::new(35.0, 25.0, 0.0, 0.0);
    let (outcome, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    assert_eq!(outcome, MoveOutcome::Moved(end));
    let expected = [
        (10.0, 8.333_333),
        (12.5, 10.0),
        (20.0, 15.0),
        (27.5, 20.0),
        (30.0, 21.666_666),
        (35.0, 25.0),
    ];
    let targets = xy_targets(&segments);
    assert_eq!(targets.len(), expected.len());
    for (actual, wanted) in targets.iter().zip(expected) {
        assert_xy(*actual, wanted);
    }
    for seg in &segments {
        let wanted = mesh.correction_at(seg.target.x, seg.target.y);
        assert!((seg.target.z - wanted).abs() < EPS, "{} vs {}", seg.target.z, wanted);
    }
}

#[test]
fn test_diagonal_move_backwards() {
    let mesh = sloped_mesh();
    let start = Position::new(35.0, 25.0, 0.0, 0.0);
    let end = Position::new(5.0, 5.0, 0.0, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    let expected = [(30.0, 21.666_666), (27.5, 20.0), (20.0, 15.0), (12.5, 10.0), (10.0, 8.333_333), (5.0, 5.0)];
    let targets = xy_targets(&segments);
    assert_eq!(targets.len(), expected.len());
    for (actual, wanted) in targets.iter().zip(expected) {
        assert_xy(*actual, wanted);
    }
}

#[test]
fn test_diagonal_through_grid_corners_emits_each_corner_once() {
    let mesh = sloped_mesh();
    let start = Position::new(5.0, 5.0, 0.2, 0.0);
    let end = Position::new(35.0, 35.0, 0.2, 3.0);
    let (outcome, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    assert_eq!(outcome, MoveOutcome::Moved(end));
    let expected = [(10.0, 10.0), (20.0, 20.0), (30.0, 30.0), (35.0, 35.0)];
    let targets = xy_targets(&segments);
    assert_eq!(targets.len(), expected.len(), "{:?}", targets);
    for (actual, wanted) in targets.iter().zip(expected) {
        assert_xy(*actual, wanted);
    }
    for pair in segments.windows(2) {
        assert!(!pair[0].target.xy_eq(&pair[1].target));
    }

    // Corners carry the probed value exactly
    let corner = segments[1].target;
    let wanted = 0.2 + mesh.correction_at(20.0, 20.0);
    assert!((corner.z - wanted).abs() < EPS, "{} vs {}", corner.z, wanted);
}

#[test]
fn test_diagonal_backwards_through_grid_corners() {
    let mesh = flat_mesh();
    let start = Position::new(35.0, 35.0, 0.0, 0.0);
    let end = Position::new(5.0, 5.0, 0.0, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    let expected = [(30.0, 30.0), (20.0, 20.0), (10.0, 10.0), (5.0, 5.0)];
    let targets = xy_targets(&segments);
    assert_eq!(targets.len(), expected.len(), "{:?}", targets);
    for (actual, wanted) in targets.iter().zip(expected) {
        assert_xy(*actual, wanted);
    }
}

#[test]
fn test_resplitting_sub_moves_reproduces_heights() {
    let mesh = sloped_mesh();
    let start = Position::new(3.0, 2.0, 0.3, 0.0);
    let end = Position::new(37.0, 31.0, 0.3, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    let mut from = start;
    for seg in &segments {
        let to = Position::new(seg.target.x, seg.target.y, 0.3, 0.0);
        let (_, again) = run(&mesh, MoveRequest::new(from, to, 40.0));
        let last = again.last().unwrap();
        assert!((last.target.z - seg.target.z).abs() < EPS);
        from = to;
    }
}

#[test]
fn test_off_mesh_raise() {
    let mesh = scenario_mesh();
    let start = Position::new(120.0, 10.0, 0.2, 0.0);
    let end = Position::new(150.0, 10.0, 0.2, 0.0);
    let splitter = ExactCartesianSplitter::new().with_raise_when_off_mesh(Some(5.0));

    let mut queue = SegmentQueue::new();
    run_with(&splitter, &mesh, &FadeLeveling::new(), &mut queue, MoveRequest::new(start, end, 40.0));
    assert_eq!(queue.len(), 1);
    assert!((queue.segments()[0].target.z - 5.2).abs() < EPS);

    // Without the raise the edge cell is extrapolated
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));
    let extrapolated = mesh.correction_at(150.0, 10.0);
    assert!((segments[0].target.z - (0.2 + extrapolated)).abs() < EPS);
}

#[test]
fn test_pure_z_lift() {
    let mesh = scenario_mesh();
    let start = Position::new(25.0, 25.0, 0.2, 4.0);
    let end = Position::new(25.0, 25.0, 10.2, 4.0);
    let (outcome, segments) = run(&mesh, MoveRequest::new(start, end, 10.0));

    assert_eq!(outcome, MoveOutcome::Moved(end));
    assert_eq!(segments.len(), 1);
    assert!((segments[0].target.z - 11.2).abs() < EPS);
    assert!(segments[0].target.e.is_finite());
}

#[test]
fn test_fade_scales_correction() {
    let mesh = scenario_mesh();
    let leveling = FadeLeveling::with_fade_height(10.0).unwrap();
    let start = Position::new(10.0, 10.0, 5.0, 0.0);
    let end = Position::new(25.0, 25.0, 5.0, 0.0);

    let mut queue = SegmentQueue::new();
    run_with(&ExactCartesianSplitter::new(), &mesh, &leveling, &mut queue, MoveRequest::new(start, end, 40.0));
    assert!((queue.segments()[0].target.z - 5.5).abs() < EPS);
}

#[test]
fn test_leveling_inactive_passes_move_through() {
    let mesh = sloped_mesh();
    let start = Position::new(5.0, 5.0, 0.2, 0.0);
    let end = Position::new(35.0, 25.0, 0.2, 2.0);

    let mut queue = SegmentQueue::new();
    let outcome = run_with(
        &ExactCartesianSplitter::new(),
        &mesh,
        &FadeLeveling::disabled(),
        &mut queue,
        MoveRequest::new(start, end, 40.0),
    );
    assert_eq!(outcome, MoveOutcome::Moved(end));
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.segments()[0].target, end);
}

#[test]
fn test_all_undefined_mesh_gives_no_correction() {
    let mesh = BedMesh::new(MeshGeometry::with_spacing(0.0, 0.0, 10.0, 10.0, 5, 5)).unwrap();
    let start = Position::new(1.0, 2.0, 0.4, 0.0);
    let end = Position::new(39.0, 33.0, 0.4, 0.0);
    let (_, segments) = run(&mesh, MoveRequest::new(start, end, 40.0));

    assert!(segments.len() > 1);
    for seg in &segments {
        assert!((seg.target.z - 0.4).abs() < EPS);
    }
}

#[test]
fn test_backpressure_stops_move() {
    let mesh = flat_mesh();
    let start = Position::new(5.0, 5.0, 0.0, 0.0);
    let end = Position::new(5.0, 35.0, 0.0, 0.0);

    let mut queue = SegmentQueue::bounded(2);
    let outcome = run_with(
        &ExactCartesianSplitter::new(),
        &mesh,
        &FadeLeveling::new(),
        &mut queue,
        MoveRequest::new(start, end, 40.0),
    );

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.rejected(), 1);
    match outcome {
        MoveOutcome::Interrupted { reached } => assert_xy((reached.x, reached.y), (5.0, 20.0)),
        other => panic!("expected interruption, got {:?}", other),
    }
}

#[test]
fn test_rejected_first_segment_reports_start() {
    let mesh = scenario_mesh();
    let start = Position::new(10.0, 10.0, 0.0, 0.0);
    let end = Position::new(20.0, 20.0, 0.0, 0.0);

    let mut queue = SegmentQueue::bounded(0);
    let outcome = run_with(
        &ExactCartesianSplitter::new(),
        &mesh,
        &FadeLeveling::new(),
        &mut queue,
        MoveRequest::new(start, end, 40.0),
    );
    assert_eq!(outcome, MoveOutcome::Interrupted { reached: start });
    assert!(queue.is_empty());
}

#[test]
fn test_closure_planner_and_extruder() {
    let mesh = flat_mesh();
    let start = Position::new(5.0, 5.0, 0.0, 0.0);
    let end = Position::new(25.0, 5.0, 0.0, 0.0);
    let mut extruders = Vec::new();
    let mut planner = |segment: &Segment| {
        extruders.push(segment.extruder);
        true
    };

    let outcome = run_with(
        &ExactCartesianSplitter::new(),
        &mesh,
        &FadeLeveling::new(),
        &mut planner,
        MoveRequest::new(start, end, 40.0).with_extruder(1),
    );
    assert_eq!(outcome, MoveOutcome::Moved(end));
    assert_eq!(extruders, vec![1, 1, 1]);
}

/// Planner that shifts every move 10mm along X before splitting
struct ShiftingPlanner {
    queue: SegmentQueue,
}

impl MotionPlanner for ShiftingPlanner {
    fn buffer_segment(&mut self, segment: &Segment) -> bool {
        self.queue.buffer_segment(segment)
    }

    fn apply_modifiers(&self, position: &mut Position) {
        position.x += 10.0;
    }
}

#[test]
fn test_modifiers_apply_before_splitting() {
    let mesh = flat_mesh();
    let start = Position::new(1.0, 5.0, 0.0, 0.0);
    let end = Position::new(5.0, 5.0, 0.0, 0.0);
    let mut planner = ShiftingPlanner {
        queue: SegmentQueue::new(),
    };

    run_with(
        &ExactCartesianSplitter::new(),
        &mesh,
        &FadeLeveling::new(),
        &mut planner,
        MoveRequest::new(start, end, 40.0),
    );
    // 11 -> 15 stays in one cell
    assert_eq!(planner.queue.len(), 1);
    assert_xy(
        (planner.queue.segments()[0].target.x, planner.queue.segments()[0].target.y),
        (15.0, 5.0),
    );
}
