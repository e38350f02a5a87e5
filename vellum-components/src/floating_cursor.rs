//! Floating cursor tracking.
//!
//! During a precision drag (trackpad-style cursor movement) the caret
//! detaches visually and follows the pointer without mutating the selection.
//! Only when the drag ends does the resolved text position become the real
//! collapsed selection, after a short snap-back animation from the last
//! floating position to that position's caret rectangle.
//!
//! The tracker is a state machine over the pointer stream's Start, Update
//! and End phases. It owns no selection; committing goes through the
//! `on_commit` callback so the owner can apply the selection change with a
//! forced cause and its usual overlay handling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use derive_setters::Setters;
use vellum_core::px::{Px, PxPosition, PxRect};

/// Pointer phases driving the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatingCursorPhase {
    Start,
    Update,
    End,
}

/// Caret and viewport geometry supplied by the host's layout.
pub trait CaretGeometry {
    /// Local caret rectangle for a text position.
    fn caret_rect(&self, offset: usize) -> PxRect;
    /// Text position nearest a local point.
    fn offset_for_point(&self, point: PxPosition) -> usize;
    /// Bounding viewport the floating cursor is clamped into.
    fn viewport(&self) -> PxRect;
    fn line_height(&self) -> Px;
}

#[derive(Clone, Setters)]
pub struct FloatingCursorConfig {
    /// Length of the snap-back animation on release.
    pub snap_duration: Duration,
    /// Receives the resolved text position when a drag commits.
    #[setters(skip)]
    pub on_commit: Option<Arc<dyn Fn(usize) + Send + Sync>>,
}

impl FloatingCursorConfig {
    pub fn on_commit<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on_commit = Some(Arc::new(f));
        self
    }
}

impl Default for FloatingCursorConfig {
    fn default() -> Self {
        Self {
            snap_duration: Duration::from_millis(125),
            on_commit: None,
        }
    }
}

struct DragState {
    /// Caret rectangle at the selection base when the drag started.
    origin_caret: PxRect,
    /// Raw pointer offset of the first Update; later offsets are relative.
    pointer_origin: Option<PxPosition>,
    last_point: Option<PxPosition>,
    last_offset: Option<usize>,
}

struct SnapBack {
    from: PxPosition,
    to: PxPosition,
    offset: usize,
    started: Instant,
}

pub struct FloatingCursorTracker {
    config: FloatingCursorConfig,
    drag: Option<DragState>,
    snap: Option<SnapBack>,
}

impl FloatingCursorTracker {
    pub fn new(config: FloatingCursorConfig) -> Self {
        Self {
            config,
            drag: None,
            snap: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.snap.is_some()
    }

    /// Routes one inbound pointer event.
    ///
    /// `base_offset` is the current selection's base position, sampled by
    /// the caller; it is only read for the Start phase.
    pub fn handle(
        &mut self,
        phase: FloatingCursorPhase,
        pointer: PxPosition,
        now: Instant,
        base_offset: usize,
        geometry: &dyn CaretGeometry,
    ) {
        match phase {
            FloatingCursorPhase::Start => self.start(base_offset, geometry),
            FloatingCursorPhase::Update => self.update(pointer, geometry),
            FloatingCursorPhase::End => self.end(now, geometry),
        }
    }

    /// Begins a drag, superseding any snap-back still in flight.
    pub fn start(&mut self, base_offset: usize, geometry: &dyn CaretGeometry) {
        self.cancel_snap_back();
        self.drag = Some(DragState {
            origin_caret: geometry.caret_rect(base_offset),
            pointer_origin: None,
            last_point: None,
            last_offset: None,
        });
    }

    /// Moves the floating cursor. Ignored without a preceding Start.
    pub fn update(&mut self, pointer: PxPosition, geometry: &dyn CaretGeometry) {
        let Some(drag) = &mut self.drag else {
            return;
        };
        let origin = *drag.pointer_origin.get_or_insert(pointer);
        let center = drag.origin_caret.center();
        let half_line = geometry.line_height() / 2;
        let raw = PxPosition::new(
            center.x + (pointer.x - origin.x),
            center.y + (pointer.y - origin.y) - half_line,
        );
        let clamped = geometry.viewport().clamp_position(raw);
        drag.last_point = Some(clamped);
        drag.last_offset = Some(geometry.offset_for_point(clamped));
    }

    /// Ends the drag. With at least one Update this starts the snap-back;
    /// a bare tap changes nothing and animates nothing.
    pub fn end(&mut self, now: Instant, geometry: &dyn CaretGeometry) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        let (Some(from), Some(offset)) = (drag.last_point, drag.last_offset) else {
            return;
        };
        let target = geometry.caret_rect(offset);
        self.snap = Some(SnapBack {
            from,
            to: target.origin(),
            offset,
            started: now,
        });
    }

    /// Completes a due snap-back, committing the resolved position.
    pub fn poll(&mut self, now: Instant) {
        let Some(snap) = &self.snap else {
            return;
        };
        if now.duration_since(snap.started) < self.config.snap_duration {
            return;
        }
        let offset = snap.offset;
        self.snap = None;
        if let Some(commit) = &self.config.on_commit {
            commit(offset);
        }
    }

    /// Cancels a pending snap-back without committing. A no-op when none is
    /// running.
    pub fn cancel_snap_back(&mut self) {
        self.snap = None;
    }

    /// Where to paint the floating caret right now, if anywhere.
    pub fn floating_position(&self, now: Instant) -> Option<PxPosition> {
        if let Some(drag) = &self.drag {
            return drag.last_point;
        }
        let snap = self.snap.as_ref()?;
        let t = if self.config.snap_duration.is_zero() {
            1.0
        } else {
            (now.duration_since(snap.started).as_secs_f32()
                / self.config.snap_duration.as_secs_f32())
            .clamp(0.0, 1.0)
        };
        let eased = decelerate(t);
        Some(PxPosition::new(
            lerp(snap.from.x, snap.to.x, eased),
            lerp(snap.from.y, snap.to.y, eased),
        ))
    }
}

fn decelerate(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

fn lerp(from: Px, to: Px, t: f32) -> Px {
    Px::saturating_from_f32(from.to_f32() + (to - from).to_f32() * t)
}
