//! The text editor session.
//!
//! [`TextEditor`] owns one editing controller and wires the synchronization
//! engine, focus, cursor blinking, the selection overlay and the floating
//! cursor into a single inbound surface the host drives: channel updates,
//! action keys, pointer phases and a `tick` for time-based animation. The
//! host supplies the outbound connection, the caret geometry and an
//! optional overlay provider; everything else is internal.

use std::sync::Arc;
use std::time::Instant;

use derive_setters::Setters;
use vellum_core::controller::EditingController;
use vellum_core::error::EditError;
use vellum_core::highlight::{AlternatingHighlighter, Highlighter};
use vellum_core::px::PxPosition;
use vellum_core::reconciler::{
    InputAction, InputConnection, Reconciler, ReconcilerCallbacks, RemoteEditPhase,
};
use vellum_core::selection::{SelectionChangeCause, TextRange, TextSelection};
use vellum_core::shared::Shared;
use vellum_core::span::{SpanStyle, skip_decoration};
use vellum_core::value::EditingValue;

use crate::blink::{BlinkPhase, CursorBlinkConfig, CursorBlinkScheduler};
use crate::floating_cursor::{
    CaretGeometry, FloatingCursorConfig, FloatingCursorPhase, FloatingCursorTracker,
};
use crate::focus::{Focus, FocusScope};
use crate::selection_overlay::{OverlayProvider, SelectionOverlayCoordinator};

/// Configuration for a [`TextEditor`].
#[derive(Clone, Setters)]
pub struct TextEditorOptions {
    pub read_only: bool,
    pub multiline: bool,
    /// Base style handed to the highlighter for unstyled runs.
    pub base_style: SpanStyle,
    pub blink: CursorBlinkConfig,
    pub floating: FloatingCursorConfig,
    #[setters(skip)]
    pub highlighter: Arc<dyn Highlighter>,
    #[setters(skip)]
    pub overlay_provider: Option<OverlayProvider>,
    #[setters(skip)]
    pub on_changed: Option<Arc<dyn Fn(&str) + Send + Sync>>,
    #[setters(skip)]
    pub on_error: Option<Arc<dyn Fn(&EditError) + Send + Sync>>,
    #[setters(skip)]
    pub on_editing_complete: Option<Arc<dyn Fn(InputAction) + Send + Sync>>,
    #[setters(skip)]
    pub ensure_caret_visible: Option<Arc<dyn Fn() + Send + Sync>>,
}

impl TextEditorOptions {
    pub fn highlighter(mut self, highlighter: Arc<dyn Highlighter>) -> Self {
        self.highlighter = highlighter;
        self
    }

    pub fn overlay_provider(mut self, provider: OverlayProvider) -> Self {
        self.overlay_provider = Some(provider);
        self
    }

    /// Called with the new plain text after each substantive edit.
    pub fn on_changed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_changed = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&EditError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Called when an action key finalizes editing; focus is released right
    /// after.
    pub fn on_editing_complete<F>(mut self, f: F) -> Self
    where
        F: Fn(InputAction) + Send + Sync + 'static,
    {
        self.on_editing_complete = Some(Arc::new(f));
        self
    }

    /// Called when inbound text changed and the caret should be brought
    /// into view.
    pub fn ensure_caret_visible<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.ensure_caret_visible = Some(Arc::new(f));
        self
    }
}

impl Default for TextEditorOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            multiline: true,
            base_style: SpanStyle::PLAIN,
            blink: CursorBlinkConfig::default(),
            floating: FloatingCursorConfig::default(),
            highlighter: Arc::new(AlternatingHighlighter::new()),
            overlay_provider: None,
            on_changed: None,
            on_error: None,
            on_editing_complete: None,
            ensure_caret_visible: None,
        }
    }
}

pub struct TextEditor {
    controller: Shared<EditingController>,
    reconciler: Reconciler,
    overlay: Shared<SelectionOverlayCoordinator>,
    blink: CursorBlinkScheduler,
    floating: FloatingCursorTracker,
    focus: Arc<Focus>,
    was_focused: bool,
    last_value: EditingValue,
}

impl TextEditor {
    pub fn new(
        options: TextEditorOptions,
        scope: &FocusScope,
        connection: Box<dyn InputConnection>,
    ) -> Self {
        let controller = Shared::new(EditingController::new(EditingValue::empty()));
        let overlay = Shared::new(SelectionOverlayCoordinator::new(
            options.overlay_provider.clone(),
        ));
        let focus = Arc::new(scope.handle());

        let mut reconciler =
            Reconciler::new(controller.clone(), options.highlighter.clone(), connection);
        reconciler.set_base_style(options.base_style);
        reconciler.set_multiline(options.multiline);
        reconciler.set_read_only(options.read_only);

        let mut callbacks = ReconcilerCallbacks::new();
        {
            let overlay = overlay.clone();
            callbacks = callbacks.hide_overlay(move || overlay.with_mut(|o| o.hide()));
        }
        if let Some(on_changed) = options.on_changed.clone() {
            callbacks = callbacks.on_changed(move |text| on_changed(text));
        }
        if let Some(on_error) = options.on_error.clone() {
            callbacks = callbacks.on_error(move |err| on_error(err));
        }
        if let Some(complete) = options.on_editing_complete.clone() {
            callbacks = callbacks.on_editing_complete(move |action| complete(action));
        }
        if let Some(reveal) = options.ensure_caret_visible.clone() {
            callbacks = callbacks.ensure_caret_visible(move || reveal());
        }
        reconciler.set_callbacks(callbacks);

        // A floating-cursor commit is a full selection change: tear the
        // overlay down, apply the caret with a forced cause (skipping
        // decoration spans), then rebuild.
        let mut floating_config = options.floating.clone();
        let user_commit = floating_config.on_commit.take();
        {
            let controller = controller.clone();
            let overlay = overlay.clone();
            let focus = focus.clone();
            floating_config.on_commit = Some(Arc::new(move |offset| {
                overlay.with_mut(|o| o.begin_selection_change());
                let adjusted = controller.with(|c| {
                    let value = c.value();
                    skip_decoration(value.spans(), value.text(), TextSelection::collapsed(offset))
                });
                if let Err(err) = controller
                    .with_mut(|c| c.set_selection(adjusted, SelectionChangeCause::Forced))
                {
                    tracing::warn!(error = %err, "floating cursor commit rejected");
                }
                let value = controller.with(|c| c.value().clone());
                overlay.with_mut(|o| o.finish_selection_change(focus.is_focused(), &value));
                if let Some(user) = &user_commit {
                    user(offset);
                }
            }));
        }

        let blink = CursorBlinkScheduler::new(options.blink);
        let floating = FloatingCursorTracker::new(floating_config);
        let last_value = controller.with(|c| c.value().clone());

        Self {
            controller,
            reconciler,
            overlay,
            blink,
            floating,
            focus,
            was_focused: false,
            last_value,
        }
    }

    pub fn controller(&self) -> Shared<EditingController> {
        self.controller.clone()
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn is_focused(&self) -> bool {
        self.focus.is_focused()
    }

    pub fn blink_phase(&self) -> BlinkPhase {
        self.blink.phase()
    }

    pub fn cursor_opacity(&self, now: Instant) -> f32 {
        self.blink.opacity(now)
    }

    pub fn floating_position(&self, now: Instant) -> Option<PxPosition> {
        self.floating.floating_position(now)
    }

    pub fn remote_edit_phase(&self) -> RemoteEditPhase {
        self.reconciler.phase()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.with(|o| o.has_overlay())
    }

    /// Inbound value report from the input channel.
    pub fn update_editing_value(
        &mut self,
        now: Instant,
        text: &str,
        selection: TextSelection,
        composing: TextRange,
    ) {
        self.reconciler.update_editing_value(text, selection, composing);
        self.after_event(now);
    }

    /// Inbound action key from the input channel.
    pub fn perform_action(&mut self, now: Instant, action: InputAction) {
        self.reconciler.perform_action(action);
        if action.finalizes_editing(self.reconciler.multiline()) {
            self.focus.unfocus();
            self.sync_focus(now);
        }
        self.after_event(now);
    }

    /// Programmatic insertion at the current selection (paste path).
    pub fn insert_text(&mut self, now: Instant, text: &str) {
        self.reconciler.insert_remotely(text);
        self.after_event(now);
    }

    /// Inbound floating-cursor pointer event.
    pub fn update_floating_cursor(
        &mut self,
        now: Instant,
        phase: FloatingCursorPhase,
        pointer: PxPosition,
        geometry: &dyn CaretGeometry,
    ) {
        let base_offset = self
            .controller
            .with(|c| c.value().selection().base_offset().max(0) as usize);
        self.floating.handle(phase, pointer, now, base_offset, geometry);
        self.after_event(now);
    }

    /// Applies a selection change with full overlay handling: dispose,
    /// adjust past decoration spans, apply, recreate.
    pub fn set_selection(
        &mut self,
        now: Instant,
        selection: TextSelection,
        cause: SelectionChangeCause,
    ) -> Result<(), EditError> {
        self.overlay.with_mut(|o| o.begin_selection_change());
        let adjusted = self.controller.with(|c| {
            let value = c.value();
            skip_decoration(value.spans(), value.text(), selection)
        });
        let result = self
            .controller
            .with_mut(|c| c.set_selection(adjusted, cause));
        let value = self.controller.with(|c| c.value().clone());
        self.overlay
            .with_mut(|o| o.finish_selection_change(self.focus.is_focused(), &value));
        self.after_event(now);
        result
    }

    pub fn request_focus(&mut self, now: Instant) {
        self.focus.request_focus();
        self.sync_focus(now);
    }

    pub fn release_focus(&mut self, now: Instant) {
        self.focus.unfocus();
        self.sync_focus(now);
    }

    /// Re-evaluates everything gated on focus. Call after focus moved
    /// anywhere in the scope.
    pub fn sync_focus(&mut self, now: Instant) {
        let focused = self.focus.is_focused();
        if focused != self.was_focused {
            if focused {
                self.reconciler.open_connection();
            } else {
                self.reconciler.close_connection();
                self.floating.cancel_snap_back();
            }
            self.was_focused = focused;
        }
        let value = self.controller.with(|c| c.value().clone());
        self.overlay.with_mut(|o| o.sync_focus(focused, &value));
        self.blink.sync(now, focused, caret_collapsed(&value));
    }

    /// Advances time-based machinery: blink flips and the floating
    /// cursor's snap-back.
    pub fn tick(&mut self, now: Instant) {
        self.blink.poll(now);
        self.floating.poll(now);
        self.after_event(now);
    }

    pub fn set_toolbar_visible(&mut self, visible: bool) {
        self.overlay.with_mut(|o| o.set_toolbar_visible(visible));
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.reconciler.set_read_only(read_only);
    }

    fn after_event(&mut self, now: Instant) {
        let value = self.controller.with(|c| c.value().clone());
        let focused = self.focus.is_focused();
        if value != self.last_value {
            self.overlay.with_mut(|o| o.value_changed(focused, &value));
            if self.blink.is_running() {
                // An edit keeps the caret solid instead of mid-blink.
                self.blink.restart(now);
            }
            self.last_value = value.clone();
        }
        self.blink.sync(now, focused, caret_collapsed(&value));
    }
}

/// Blink gate: a real caret, not a range and not the never-selected state.
fn caret_collapsed(value: &EditingValue) -> bool {
    let selection = value.selection();
    selection.is_valid() && selection.is_collapsed()
}
