use std::path::Path;

use nxdraw::config::SessionSettings;
use nxdraw::drawing::{CapacityPolicy, PointerEvent, ShapeKind, ShapeStore, ToolKind};
use nxdraw::geometry::{CanvasPoint, CanvasSize, Color, ShapeBounds};
use nxdraw::render::DrawOp;
use nxdraw::storage::{DecodeError, StorageError};
use nxdraw::{AppError, DrawingSession};

const CANVAS: CanvasSize = CanvasSize::new(200, 150);

fn point(x: i32, y: i32) -> CanvasPoint {
    CanvasPoint::new(x, y)
}

fn drag(session: &mut DrawingSession, path: &[(i32, i32)]) {
    let (first, rest) = path.split_first().expect("gesture needs a start point");
    session.handle_pointer(PointerEvent::Press(point(first.0, first.1)));
    for (x, y) in rest {
        session.handle_pointer(PointerEvent::Drag(point(*x, *y)));
    }
    let last = rest.last().unwrap_or(first);
    session.handle_pointer(PointerEvent::Release(point(last.0, last.1)));
}

fn populated_session() -> DrawingSession {
    let mut session = DrawingSession::default();

    session.select_tool(ToolKind::Freehand);
    for i in 0..500 {
        session.set_color(Color::new((i % 256) as u8, 0, 255));
        session.handle_pointer(PointerEvent::Click(point(i % 200, i / 200)));
    }

    session.select_tool(ToolKind::Line);
    session.set_color(Color::new(0, 128, 0));
    for i in 0..3 {
        drag(&mut session, &[(i, 0), (i + 20, 40)]);
    }

    session.select_tool(ToolKind::Rectangle);
    drag(&mut session, &[(50, 50), (10, 10)]);
    drag(&mut session, &[(60, 60), (90, 80)]);

    session.select_tool(ToolKind::Oval);
    drag(&mut session, &[(100, 100), (140, 120)]);
    session
}

#[test]
fn saved_drawing_reloads_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.nxd");
    let mut original = populated_session();
    let counts = original.store().counts();
    assert_eq!(counts.freehand, 500);
    assert_eq!(counts.lines, 3);
    assert_eq!(counts.rectangles, 2);
    assert_eq!(counts.ovals, 1);

    original.save_to(&path).expect("save should succeed");
    assert!(!dir.path().join("scene.nxd.pending").exists());

    let mut reloaded = DrawingSession::default();
    reloaded.load_from(&path).expect("load should succeed");

    assert_eq!(reloaded.store().snapshot(), original.store().snapshot());
    assert_eq!(reloaded.render(CANVAS), original.render(CANVAS));
    assert_eq!(
        reloaded.log().last().map(str::to_owned),
        Some(format!("Open file {}", path.display()))
    );
}

#[test]
fn pending_shape_is_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pending.nxd");
    let mut session = DrawingSession::default();
    session.handle_pointer(PointerEvent::Press(point(0, 0)));
    session.handle_pointer(PointerEvent::Drag(point(10, 10)));

    session.save_to(&path).expect("save should succeed");

    let mut reloaded = DrawingSession::default();
    reloaded.load_from(&path).expect("load should succeed");
    assert!(reloaded.store().is_empty());
}

#[test]
fn eleventh_line_is_rejected_with_notice() {
    let mut session = DrawingSession::default();
    for i in 0..10 {
        drag(&mut session, &[(i, 0), (i, 10)]);
    }
    assert_eq!(session.store().counts().lines, 10);

    drag(&mut session, &[(50, 0), (50, 10)]);

    assert_eq!(session.store().counts().lines, 10);
    assert_eq!(
        session.log().last(),
        Some("No lines left! You must clear the canvas!")
    );
}

#[test]
fn exhausted_ink_reports_and_keeps_existing_dabs() {
    let mut settings = SessionSettings::default();
    settings.capacities.freehand = CapacityPolicy::bounded(2);
    let mut session = DrawingSession::new(settings);
    session.select_tool(ToolKind::Freehand);

    for x in 0..3 {
        session.handle_pointer(PointerEvent::Click(point(x, 0)));
    }

    assert_eq!(session.store().counts().freehand, 2);
    let lines: Vec<&str> = session.log().lines().collect();
    assert_eq!(
        lines,
        vec![
            "You have 1 inks left.",
            "There are no inks left! You must clear the canvas!",
        ]
    );
}

#[test]
fn dabs_render_as_filled_circles_in_insertion_order() {
    let mut session = DrawingSession::default();
    session.select_tool(ToolKind::Freehand);
    let dabs = [
        (point(12, 7), 4, Color::new(255, 0, 0)),
        (point(-3, 40), 0, Color::new(0, 0, 255)),
        (point(12, 7), 20, Color::new(10, 200, 30)),
        (point(199, 149), 1, Color::BLACK),
    ];
    for (at, size, color) in dabs {
        session.set_thickness(size);
        session.set_color(color);
        session.handle_pointer(PointerEvent::Click(at));
    }

    let expected: Vec<DrawOp> = dabs
        .iter()
        .map(|&(center, size, color)| DrawOp::FillCircle {
            center,
            diameter: u32::from(size),
            color,
        })
        .collect();
    assert_eq!(session.render(CANVAS), expected);
}

#[test]
fn rectangle_dragged_backwards_renders_normalized() {
    let mut session = DrawingSession::default();
    session.select_tool(ToolKind::Rectangle);
    drag(&mut session, &[(50, 50), (10, 10)]);

    let ops = session.render(CANVAS);
    assert_eq!(
        ops,
        vec![DrawOp::StrokeRect {
            bounds: ShapeBounds::new(10, 10, 40, 40),
            color: Color::BLACK,
        }]
    );
}

#[test]
fn cleared_canvas_renders_only_grid() {
    let mut session = populated_session();
    session.set_fine_grid(true);
    session.set_coarse_grid(true);

    session.clear();

    let ops = session.render(CANVAS);
    assert!(!ops.is_empty());
    assert!(ops.iter().all(DrawOp::is_grid));
    assert_eq!(session.log().text(), "Canvas has been cleared");
}

#[test]
fn rendering_twice_yields_identical_ops() {
    let mut session = populated_session();
    session.set_fine_grid(true);
    assert_eq!(session.render(CANVAS), session.render(CANVAS));
}

#[test]
fn red_line_drag_commits_one_line() {
    let mut session = DrawingSession::default();
    session.select_tool(ToolKind::Line);
    session.set_color(Color::new(255, 0, 0));

    drag(&mut session, &[(10, 10), (20, 20), (30, 30)]);

    let lines = session.store().shapes(ShapeKind::Line);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].start, point(10, 10));
    assert_eq!(lines[0].end, point(30, 30));
    assert_eq!(lines[0].color, Color::new(255, 0, 0));
    assert_eq!(
        session.render(CANVAS),
        vec![DrawOp::StrokeLine {
            from: point(10, 10),
            to: point(30, 30),
            color: Color::new(255, 0, 0),
        }]
    );
}

#[test]
fn corrupt_file_leaves_current_drawing_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.nxd");
    std::fs::write(&path, b"not a drawing at all").unwrap();
    let mut session = populated_session();
    let before = session.store().snapshot();

    let err = session.load_from(&path).unwrap_err();

    assert!(matches!(
        err,
        AppError::Storage(StorageError::Decode {
            source: DecodeError::BadMagic,
            ..
        })
    ));
    assert_eq!(session.store().snapshot(), before);
}

#[test]
fn missing_file_reports_io_failure() {
    let mut session = DrawingSession::default();
    let err = session
        .load_from(Path::new("/nonexistent/dir/drawing.nxd"))
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(StorageError::Io { .. })));
}

#[test]
fn unbounded_store_accepts_more_than_default_capacity() {
    let mut store = ShapeStore::with_capacities(nxdraw::drawing::StoreCapacities::unbounded());
    for i in 0..25 {
        store
            .begin_pending(ShapeKind::Oval, point(i, i), Color::BLACK)
            .unwrap();
        store.commit_pending(ShapeKind::Oval);
    }
    assert_eq!(store.counts().ovals, 25);
}
