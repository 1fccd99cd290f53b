//! Drawing session: the gesture state machine and everything it owns.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostics, EventSummary};
use crate::surface::{DrawingSurface, SurfaceController};
use crate::{
    PenConfig, PointSampler, PointerEvent, PointerEventKind, SketchConfig, SketchResult,
    StrokeStore,
};

/// Gesture state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A stroke is being drawn by `pointer_id`.
    Drawing {
        /// Pointer that owns the gesture.
        pointer_id: i32,
    },
}

/// Anything the host can feed into a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Pointer input on the surface.
    Pointer(PointerEvent),
    /// The surface's layout size or device ratio may have changed.
    Resize,
    /// Remove the last stroke.
    Undo,
    /// Remove every stroke.
    Clear,
    /// Change the pen used for subsequent strokes.
    SetPen(PenConfig),
}

/// Whether the host should suppress the event's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The session consumed the event; call `preventDefault`.
    Handled,
    /// The event did not apply to the current state.
    Ignored,
}

impl Dispatch {
    /// Whether the event was consumed.
    #[must_use]
    pub fn is_handled(self) -> bool {
        self == Self::Handled
    }
}

/// Callback receiving the diagnostics of every redraw.
pub type DiagnosticsSink = Box<dyn FnMut(&Diagnostics)>;

/// One authoring session: strokes, pen, gesture state and surface.
pub struct SketchSession<S> {
    store: StrokeStore,
    pen: PenConfig,
    sampler: PointSampler,
    state: InputState,
    controller: SurfaceController<S>,
    last_event: Option<EventSummary>,
    diagnostics: Diagnostics,
    sink: Option<DiagnosticsSink>,
}

impl<S: DrawingSurface> SketchSession<S> {
    /// Create a session on `surface` and size it to the current layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the pen is invalid or the initial resize fails.
    pub fn new(surface: S, config: SketchConfig) -> SketchResult<Self> {
        config.pen.validate()?;
        let mut session = Self {
            store: StrokeStore::new(),
            pen: config.pen,
            sampler: PointSampler::new(config.sampler),
            state: InputState::Idle,
            controller: SurfaceController::new(surface),
            last_event: None,
            diagnostics: Diagnostics::default(),
            sink: None,
        };
        session.resize()?;
        Ok(session)
    }

    /// Install a callback invoked with the diagnostics of every redraw.
    pub fn set_diagnostics_sink(&mut self, sink: impl FnMut(&Diagnostics) + 'static) {
        self.sink = Some(Box::new(sink));
    }

    /// Feed one event into the session.
    ///
    /// # Errors
    ///
    /// Returns an error if pointer capture, a resize, or a pen change fails.
    pub fn dispatch(&mut self, event: &SessionEvent) -> SketchResult<Dispatch> {
        match event {
            SessionEvent::Pointer(pointer) => self.handle_pointer(pointer),
            SessionEvent::Resize => self.resize().map(|()| Dispatch::Handled),
            SessionEvent::Undo => {
                self.undo();
                Ok(Dispatch::Handled)
            }
            SessionEvent::Clear => {
                self.clear();
                Ok(Dispatch::Handled)
            }
            SessionEvent::SetPen(pen) => self.set_pen(*pen).map(|()| Dispatch::Handled),
        }
    }

    /// Advance the gesture state machine with a pointer event.
    ///
    /// # Errors
    ///
    /// Returns an error if pointer capture fails on pointer-down. The store
    /// is left untouched in that case.
    pub fn handle_pointer(&mut self, event: &PointerEvent) -> SketchResult<Dispatch> {
        match self.state {
            InputState::Idle => {
                if event.kind != PointerEventKind::Down {
                    tracing::trace!("{} while idle ignored", event.kind);
                    return Ok(Dispatch::Ignored);
                }
                self.begin_gesture(event)?;
            }
            InputState::Drawing { pointer_id } if pointer_id != event.pointer_id => {
                tracing::debug!(
                    "{} from pointer {} ignored during gesture of pointer {pointer_id}",
                    event.kind,
                    event.pointer_id
                );
                return Ok(Dispatch::Ignored);
            }
            InputState::Drawing { pointer_id } => match event.kind {
                PointerEventKind::Down => {
                    tracing::debug!("pointerdown during gesture of pointer {pointer_id} ignored");
                    return Ok(Dispatch::Ignored);
                }
                PointerEventKind::Move => {
                    let sample = self.sample(event);
                    if !self.store.append_sample(sample) {
                        return Ok(Dispatch::Ignored);
                    }
                }
                PointerEventKind::Up | PointerEventKind::Cancel | PointerEventKind::Leave => {
                    self.end_gesture(pointer_id);
                }
            },
        }

        self.last_event = Some(EventSummary::from(event));
        self.redraw();
        Ok(Dispatch::Handled)
    }

    fn begin_gesture(&mut self, event: &PointerEvent) -> SketchResult<()> {
        self.controller
            .surface_mut()
            .capture_pointer(event.pointer_id)?;

        let sample = self.sample(event);
        if let Err(e) = self.store.begin_stroke(self.pen.style()) {
            self.controller.surface_mut().release_pointer(event.pointer_id);
            return Err(e);
        }
        self.store.append_sample(sample);
        self.state = InputState::Drawing {
            pointer_id: event.pointer_id,
        };
        tracing::debug!(
            pointer_id = event.pointer_id,
            pointer_type = %event.pointer_type,
            "Gesture started at ({}, {})",
            sample.x,
            sample.y
        );
        Ok(())
    }

    fn end_gesture(&mut self, pointer_id: i32) {
        self.store.end_stroke();
        self.controller.surface_mut().release_pointer(pointer_id);
        self.state = InputState::Idle;
        tracing::debug!(pointer_id, strokes = self.store.len(), "Gesture ended");
    }

    /// Abandon any open gesture without touching the store.
    fn reset_gesture(&mut self) {
        if let InputState::Drawing { pointer_id } = self.state {
            self.controller.surface_mut().release_pointer(pointer_id);
            self.state = InputState::Idle;
        }
    }

    fn sample(&self, event: &PointerEvent) -> crate::InkSample {
        let rect = self.controller.surface().bounding_rect();
        self.sampler.sample(event, rect)
    }

    /// Remove the most recent stroke and repaint.
    ///
    /// An open gesture is abandoned first.
    pub fn undo(&mut self) {
        self.reset_gesture();
        self.store.undo();
        self.redraw();
    }

    /// Remove every stroke and repaint.
    pub fn clear(&mut self) {
        self.reset_gesture();
        self.store.clear();
        self.redraw();
    }

    /// Change the pen for subsequent strokes.
    ///
    /// # Errors
    ///
    /// Returns an error if the pen width is not finite and positive.
    pub fn set_pen(&mut self, pen: PenConfig) -> SketchResult<()> {
        pen.validate()?;
        self.pen = pen;
        tracing::debug!(width = pen.width, color = %pen.color, "Pen changed");
        Ok(())
    }

    /// Re-read the surface layout and device ratio, then repaint.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot be reallocated.
    pub fn resize(&mut self) -> SketchResult<()> {
        let diagnostics = self.controller.resize(&self.store, self.last_event.as_ref())?;
        self.publish(diagnostics);
        Ok(())
    }

    /// Repaint every stroke and publish diagnostics.
    pub fn redraw(&mut self) {
        let diagnostics = self.controller.redraw(&self.store, self.last_event.as_ref());
        self.publish(diagnostics);
    }

    fn publish(&mut self, diagnostics: Diagnostics) {
        self.diagnostics = diagnostics;
        if let Some(sink) = self.sink.as_mut() {
            sink(&diagnostics);
        }
    }

    /// Encode the rendered surface as an image data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the surface cannot export its pixels.
    pub fn export_data_url(&self) -> SketchResult<String> {
        self.controller.surface().to_data_url()
    }

    /// Strokes drawn so far.
    #[must_use]
    pub fn store(&self) -> &StrokeStore {
        &self.store
    }

    /// Pen used for the next stroke.
    #[must_use]
    pub fn pen(&self) -> PenConfig {
        self.pen
    }

    /// Gesture state.
    #[must_use]
    pub fn state(&self) -> InputState {
        self.state
    }

    /// Diagnostics of the most recent redraw.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    /// Surface controller.
    #[must_use]
    pub fn controller(&self) -> &SurfaceController<S> {
        &self.controller
    }

    /// The drawing surface.
    #[must_use]
    pub fn surface(&self) -> &S {
        self.controller.surface()
    }

    /// Mutable access to the drawing surface, e.g. to update its layout
    /// before a [`SessionEvent::Resize`].
    pub fn surface_mut(&mut self) -> &mut S {
        self.controller.surface_mut()
    }

    /// End the session and return the surface.
    #[must_use]
    pub fn into_surface(self) -> S {
        self.controller.into_surface()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{RecordingSurface, SurfaceOp};
    use crate::{PointerType, SketchError};

    fn session() -> SketchSession<RecordingSurface> {
        SketchSession::new(RecordingSurface::new(300.0, 200.0), SketchConfig::default())
            .expect("session")
    }

    fn pointer(kind: PointerEventKind, x: f32, y: f32) -> PointerEvent {
        PointerEvent::new(kind, x, y, 0.0)
    }

    #[test]
    fn test_initial_state_is_idle_and_sized() {
        let session = session();
        assert_eq!(session.state(), InputState::Idle);
        assert_eq!(session.controller().backing_size(), (300, 200));
        assert_eq!(session.diagnostics().pointer_status(), "-");
    }

    #[test]
    fn test_down_move_up_draws_a_stroke() {
        let mut session = session();
        let down = session
            .handle_pointer(&pointer(PointerEventKind::Down, 10.0, 10.0))
            .expect("down");
        assert!(down.is_handled());
        assert_eq!(session.state(), InputState::Drawing { pointer_id: 1 });

        session
            .handle_pointer(&pointer(PointerEventKind::Move, 20.0, 10.0))
            .expect("move");
        session
            .handle_pointer(&pointer(PointerEventKind::Up, 30.0, 10.0))
            .expect("up");

        assert_eq!(session.state(), InputState::Idle);
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().total_points(), 2);
        assert!(session.surface().ops().contains(&SurfaceOp::Capture(1)));
        assert!(session.surface().ops().contains(&SurfaceOp::Release(1)));
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let mut session = session();
        let outcome = session
            .handle_pointer(&pointer(PointerEventKind::Move, 5.0, 5.0))
            .expect("no error");
        assert_eq!(outcome, Dispatch::Ignored);
        assert!(session.store().is_empty());
        assert!(session.diagnostics().last_event.is_none());
    }

    #[test]
    fn test_end_events_close_the_gesture() {
        for kind in [
            PointerEventKind::Up,
            PointerEventKind::Cancel,
            PointerEventKind::Leave,
        ] {
            let mut session = session();
            session
                .handle_pointer(&pointer(PointerEventKind::Down, 1.0, 1.0))
                .expect("down");
            let outcome = session.handle_pointer(&pointer(kind, 2.0, 2.0)).expect("end");
            assert!(outcome.is_handled());
            assert_eq!(session.state(), InputState::Idle);
            assert!(!session.store().is_drawing());

            let late = session
                .handle_pointer(&pointer(PointerEventKind::Move, 3.0, 3.0))
                .expect("late move");
            assert_eq!(late, Dispatch::Ignored);
            assert_eq!(session.store().total_points(), 1);
        }
    }

    #[test]
    fn test_second_pointer_is_ignored_during_gesture() {
        let mut session = session();
        session
            .handle_pointer(&pointer(PointerEventKind::Down, 1.0, 1.0))
            .expect("down");
        let finger =
            pointer(PointerEventKind::Down, 50.0, 50.0).with_pointer(9, PointerType::Touch);
        assert_eq!(
            session.handle_pointer(&finger).expect("ignored"),
            Dispatch::Ignored
        );
        let finger_up =
            pointer(PointerEventKind::Up, 50.0, 50.0).with_pointer(9, PointerType::Touch);
        assert_eq!(
            session.handle_pointer(&finger_up).expect("ignored"),
            Dispatch::Ignored
        );
        assert_eq!(session.state(), InputState::Drawing { pointer_id: 1 });
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_capture_failure_propagates_and_leaves_store_untouched() {
        let surface = RecordingSurface::new(100.0, 100.0).refusing_capture();
        let mut session = SketchSession::new(surface, SketchConfig::default()).expect("session");
        let result = session.handle_pointer(&pointer(PointerEventKind::Down, 1.0, 1.0));
        assert!(matches!(result, Err(SketchError::PointerCapture { pointer_id: 1, .. })));
        assert!(session.store().is_empty());
        assert_eq!(session.state(), InputState::Idle);
    }

    #[test]
    fn test_pen_changes_apply_to_new_strokes_only() {
        let mut session = session();
        session
            .handle_pointer(&pointer(PointerEventKind::Down, 1.0, 1.0))
            .expect("down");
        session
            .handle_pointer(&pointer(PointerEventKind::Up, 1.0, 1.0))
            .expect("up");

        let marker = PenConfig::new(12.0, "#ff0000".parse().expect("color")).expect("pen");
        session.set_pen(marker).expect("set pen");
        session
            .handle_pointer(&pointer(PointerEventKind::Down, 5.0, 5.0))
            .expect("down");
        session
            .handle_pointer(&pointer(PointerEventKind::Up, 5.0, 5.0))
            .expect("up");

        let strokes = session.store().strokes();
        assert!((strokes[0].width - 4.0).abs() < f32::EPSILON);
        assert!((strokes[1].width - 12.0).abs() < f32::EPSILON);
        assert_eq!(strokes[1].color.to_hex(), "#ff0000");
    }

    #[test]
    fn test_invalid_pen_is_rejected() {
        let mut session = session();
        let bad = PenConfig {
            width: 0.0,
            ..PenConfig::default()
        };
        assert!(session.set_pen(bad).is_err());
        assert!((session.pen().width - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_undo_and_clear_return_to_idle_and_redraw() {
        let mut session = session();
        session
            .handle_pointer(&pointer(PointerEventKind::Down, 1.0, 1.0))
            .expect("down");
        session.undo();
        assert_eq!(session.state(), InputState::Idle);
        assert!(session.store().is_empty());
        assert!(session.surface().last_frame().is_empty());

        session
            .handle_pointer(&pointer(PointerEventKind::Down, 1.0, 1.0))
            .expect("down");
        session.clear();
        assert_eq!(session.state(), InputState::Idle);
        assert_eq!(session.diagnostics().total_points, 0);
    }

    #[test]
    fn test_diagnostics_reach_the_sink() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut session = session();
        let sink = Rc::clone(&seen);
        session.set_diagnostics_sink(move |d| sink.borrow_mut().push(d.to_string()));

        let down = pointer(PointerEventKind::Down, 1.0, 1.0)
            .with_pointer(4, PointerType::Pen)
            .with_pressure(0.25);
        session.handle_pointer(&down).expect("down");

        let seen = seen.borrow();
        assert_eq!(seen.last().map(String::as_str), Some("pointerdown | pen | p:0.25 | points: 1"));
    }

    #[test]
    fn test_dispatch_routes_every_event_kind() {
        let mut session = session();
        let events = [
            SessionEvent::Pointer(pointer(PointerEventKind::Down, 10.0, 10.0)),
            SessionEvent::Pointer(pointer(PointerEventKind::Move, 20.0, 10.0)),
            SessionEvent::Pointer(pointer(PointerEventKind::Up, 20.0, 10.0)),
            SessionEvent::SetPen(PenConfig::new(2.0, crate::Color::BLACK).expect("pen")),
            SessionEvent::Resize,
            SessionEvent::Undo,
            SessionEvent::Clear,
        ];
        for event in &events {
            assert!(session.dispatch(event).expect("dispatch").is_handled());
        }
        assert!(session.store().is_empty());
        assert!((session.pen().width - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_session_events_serialize_as_tagged_json() {
        let json = serde_json::to_string(&SessionEvent::Undo).expect("serialize");
        assert_eq!(json, r#"{"type":"undo"}"#);
        let parsed: SessionEvent = serde_json::from_str(
            r#"{"type":"pointer","data":{"kind":"down","client_x":1.0,"client_y":2.0}}"#,
        )
        .expect("parse");
        assert!(matches!(
            parsed,
            SessionEvent::Pointer(PointerEvent {
                kind: PointerEventKind::Down,
                ..
            })
        ));
    }
}
