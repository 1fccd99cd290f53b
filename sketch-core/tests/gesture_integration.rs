//! Integration tests for the gesture pipeline (sketch-core).
//!
//! Feeds synthetic pointer streams through a session backed by a recording
//! surface and checks the resulting strokes and draw calls.

use sketch_core::{
    Color, Dispatch, InkSample, InputState, PenConfig, PointerEvent, PointerEventKind,
    PointerType, RecordingSurface, Rect, SessionEvent, SketchConfig, SketchSession, StrokeStore,
    SurfaceOp,
};

fn session(width: f32, height: f32) -> SketchSession<RecordingSurface> {
    SketchSession::new(RecordingSurface::new(width, height), SketchConfig::default())
        .expect("session")
}

fn event(kind: PointerEventKind, x: f32, y: f32, t: f64) -> SessionEvent {
    SessionEvent::Pointer(PointerEvent::new(kind, x, y, t))
}

fn draw_line(session: &mut SketchSession<RecordingSurface>, points: &[(f32, f32)]) {
    let (first, rest) = points.split_first().expect("at least one point");
    session
        .dispatch(&event(PointerEventKind::Down, first.0, first.1, 0.0))
        .expect("down");
    for (i, &(x, y)) in rest.iter().enumerate() {
        let t = f64::from(u32::try_from(i).expect("small index") + 1) * 8.0;
        session
            .dispatch(&event(PointerEventKind::Move, x, y, t))
            .expect("move");
    }
    session
        .dispatch(&event(PointerEventKind::Up, 0.0, 0.0, 999.0))
        .expect("up");
}

// ==========================================================================
// Store scenarios
// ==========================================================================

#[test]
fn test_three_point_stroke_then_undo() {
    let mut store = StrokeStore::new();
    let pen = PenConfig::new(4.0, "#111".parse::<Color>().expect("color")).expect("pen");

    store.begin_stroke(pen.style()).expect("begin");
    store.append_sample(InkSample::at(10.0, 10.0));
    store.append_sample(InkSample::at(20.0, 10.0));
    store.append_sample(InkSample::at(30.0, 10.0));
    store.end_stroke();

    assert_eq!(store.len(), 1);
    assert_eq!(store.strokes()[0].len(), 3);
    assert_eq!(store.total_points(), 3);

    store.undo();
    assert!(store.is_empty());
    assert_eq!(store.total_points(), 0);
}

#[test]
fn test_clear_after_many_strokes() {
    let mut session = session(400.0, 400.0);
    for i in 0..10u8 {
        let offset = f32::from(i) * 10.0;
        draw_line(&mut session, &[(offset, 0.0), (offset, 20.0), (offset, 40.0)]);
    }
    assert_eq!(session.store().len(), 10);
    assert_eq!(session.store().total_points(), 30);

    session.dispatch(&SessionEvent::Clear).expect("clear");
    assert!(session.store().is_empty());
    assert_eq!(session.diagnostics().total_points, 0);
    assert!(session.surface().last_frame_paths().is_empty());
}

// ==========================================================================
// Gesture robustness
// ==========================================================================

#[test]
fn test_stray_events_do_not_touch_store() {
    let mut session = session(100.0, 100.0);
    for kind in [
        PointerEventKind::Move,
        PointerEventKind::Up,
        PointerEventKind::Cancel,
        PointerEventKind::Leave,
    ] {
        let outcome = session.dispatch(&event(kind, 5.0, 5.0, 1.0)).expect("no error");
        assert_eq!(outcome, Dispatch::Ignored);
    }
    assert!(session.store().is_empty());
    assert_eq!(session.state(), InputState::Idle);
}

#[test]
fn test_samples_follow_surface_position() {
    let mut session = session(200.0, 200.0);
    session.surface_mut().set_rect(Rect {
        left: 50.0,
        top: 30.0,
        width: 200.0,
        height: 200.0,
    });
    session
        .dispatch(&event(PointerEventKind::Down, 60.0, 40.0, 0.0))
        .expect("down");

    // Page scrolled by 10px between events.
    session.surface_mut().set_rect(Rect {
        left: 50.0,
        top: 20.0,
        width: 200.0,
        height: 200.0,
    });
    session
        .dispatch(&event(PointerEventKind::Move, 60.0, 40.0, 5.0))
        .expect("move");

    let points = session.store().strokes()[0].points();
    assert!((points[0].y - 10.0).abs() < f32::EPSILON);
    assert!((points[1].y - 20.0).abs() < f32::EPSILON);
}

#[test]
fn test_pen_pressure_is_recorded() {
    let mut session = session(100.0, 100.0);
    let pen_event = |kind, pressure| {
        SessionEvent::Pointer(
            PointerEvent::new(kind, 10.0, 10.0, 0.0)
                .with_pointer(11, PointerType::Pen)
                .with_pressure(pressure),
        )
    };
    session.dispatch(&pen_event(PointerEventKind::Down, 0.2)).expect("down");
    session.dispatch(&pen_event(PointerEventKind::Move, 0.9)).expect("move");
    session.dispatch(&pen_event(PointerEventKind::Up, 0.0)).expect("up");

    let pressures: Vec<f32> = session.store().strokes()[0]
        .points()
        .iter()
        .map(|p| p.pressure)
        .collect();
    assert_eq!(pressures, vec![0.2, 0.9]);
}

// ==========================================================================
// Rendering through the session
// ==========================================================================

#[test]
fn test_segment_counts_per_stroke() {
    let mut session = session(300.0, 300.0);
    draw_line(&mut session, &[(1.0, 1.0)]);
    draw_line(&mut session, &[(0.0, 0.0), (10.0, 10.0)]);
    draw_line(
        &mut session,
        &[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0), (30.0, 10.0), (40.0, 0.0)],
    );
    session.redraw();

    let paths = session.surface().last_frame_paths();
    assert_eq!(paths.len(), 3);
    assert!(paths[0].as_dot().is_some());
    assert_eq!((paths[1].quad_count(), paths[1].line_count()), (0, 1));
    assert_eq!((paths[2].quad_count(), paths[2].line_count()), (3, 1));
}

#[test]
fn test_redraw_twice_is_identical() {
    let mut session = session(300.0, 300.0);
    draw_line(&mut session, &[(3.0, 3.0), (9.0, 14.0), (30.0, 2.0)]);
    session.redraw();
    let first = session.surface().last_frame().to_vec();
    session.redraw();
    assert_eq!(session.surface().last_frame(), first.as_slice());
}

#[test]
fn test_resize_recomputes_backing_size() {
    let mut session = session(100.0, 50.0);
    session.surface_mut().set_rect(Rect::from_size(200.0, 100.0));
    session.surface_mut().set_device_ratio(2.0);
    session.surface_mut().reset();

    session.dispatch(&SessionEvent::Resize).expect("resize");

    assert_eq!(session.controller().backing_size(), (400, 200));
    let ops = session.surface().ops();
    assert_eq!(ops[0], SurfaceOp::SetBackingSize(400, 200));
    assert_eq!(ops[1], SurfaceOp::SetScale(2.0));
    assert_eq!(ops[2], SurfaceOp::Clear);
}

#[test]
fn test_degenerate_surface_gets_one_pixel() {
    let session = session(0.0, 0.0);
    assert_eq!(session.controller().backing_size(), (1, 1));
}

#[test]
fn test_event_log_replays_identically() {
    let log = r##"[
        {"type":"pointer","data":{"kind":"down","client_x":10.0,"client_y":10.0,"timestamp":0.0}},
        {"type":"pointer","data":{"kind":"move","client_x":20.0,"client_y":15.0,"timestamp":8.0}},
        {"type":"pointer","data":{"kind":"move","client_x":30.0,"client_y":10.0,"timestamp":16.0}},
        {"type":"pointer","data":{"kind":"up","client_x":30.0,"client_y":10.0,"timestamp":24.0}},
        {"type":"set_pen","data":{"width":8.0,"color":"#3366ff"}},
        {"type":"pointer","data":{"kind":"down","client_x":50.0,"client_y":50.0,"timestamp":40.0}},
        {"type":"pointer","data":{"kind":"leave","client_x":90.0,"client_y":90.0,"timestamp":48.0}}
    ]"##;
    let events: Vec<SessionEvent> = serde_json::from_str(log).expect("log");

    let mut a = session(100.0, 100.0);
    let mut b = session(100.0, 100.0);
    for e in &events {
        a.dispatch(e).expect("dispatch a");
        b.dispatch(e).expect("dispatch b");
    }

    assert_eq!(a.store().strokes(), b.store().strokes());
    assert_eq!(a.store().len(), 2);
    assert_eq!(a.store().strokes()[1].color, Color::rgb(0x33, 0x66, 0xff));
    assert_eq!(a.surface().last_frame(), b.surface().last_frame());
    assert_eq!(
        a.diagnostics().to_string(),
        "pointerleave | mouse | p:-- | points: 4"
    );
}
