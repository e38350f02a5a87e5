//! Selection overlay lifecycle.
//!
//! The overlay (selection handles plus the context toolbar) is a host
//! presentation object; this module only decides when one exists. The rule:
//! an overlay is alive exactly while the buffer has focus and a provider is
//! configured. Value changes update it in place, focus loss disposes it, and
//! a selection change rebuilds it around the adjusted selection.

use std::sync::Arc;

use vellum_core::value::EditingValue;

/// Host-supplied presentation object for handles and toolbar.
///
/// `Send + Sync` because the coordinator holding it is shared with the
/// synchronization engine's callbacks.
pub trait SelectionOverlay: Send + Sync {
    /// The value changed while the overlay is showing.
    fn update(&mut self, value: &EditingValue);
    /// Hide without tearing down, e.g. while remote text is in flight.
    fn hide(&mut self);
    fn show_toolbar(&mut self);
    fn hide_toolbar(&mut self);
    /// Tear down; the object is dropped right after.
    fn dispose(&mut self);
}

/// Factory for overlay instances, called with the value being presented.
pub type OverlayProvider =
    Arc<dyn Fn(&EditingValue) -> Box<dyn SelectionOverlay> + Send + Sync>;

pub struct SelectionOverlayCoordinator {
    provider: Option<OverlayProvider>,
    active: Option<Box<dyn SelectionOverlay>>,
    toolbar_visible: bool,
}

impl SelectionOverlayCoordinator {
    pub fn new(provider: Option<OverlayProvider>) -> Self {
        Self {
            provider,
            active: None,
            toolbar_visible: false,
        }
    }

    pub fn has_overlay(&self) -> bool {
        self.active.is_some()
    }

    /// Creates or disposes the overlay to match the focus state.
    pub fn sync_focus(&mut self, focused: bool, value: &EditingValue) {
        if focused {
            self.ensure(value);
        } else {
            self.dispose();
        }
    }

    /// The value changed. Updates an existing overlay in place; never
    /// creates one.
    pub fn value_changed(&mut self, focused: bool, value: &EditingValue) {
        if !focused {
            self.dispose();
            return;
        }
        if let Some(overlay) = &mut self.active {
            overlay.update(value);
        }
    }

    /// First half of a selection change: the current overlay goes away
    /// before the new selection is applied.
    pub fn begin_selection_change(&mut self) {
        self.dispose();
    }

    /// Second half: recreate around the applied selection if focus and
    /// provider still hold.
    pub fn finish_selection_change(&mut self, focused: bool, value: &EditingValue) {
        if focused {
            self.ensure(value);
        }
    }

    /// Hides the overlay without disposing it.
    pub fn hide(&mut self) {
        if let Some(overlay) = &mut self.active {
            overlay.hide();
        }
    }

    /// Toggles toolbar visibility on a live overlay. Must never resurrect a
    /// disposed one.
    pub fn set_toolbar_visible(&mut self, visible: bool) {
        self.toolbar_visible = visible;
        if let Some(overlay) = &mut self.active {
            if visible {
                overlay.show_toolbar();
            } else {
                overlay.hide_toolbar();
            }
        }
    }

    pub fn toolbar_visible(&self) -> bool {
        self.toolbar_visible
    }

    /// Tears the overlay down. A no-op when none exists.
    pub fn dispose(&mut self) {
        if let Some(mut overlay) = self.active.take() {
            overlay.dispose();
        }
    }

    fn ensure(&mut self, value: &EditingValue) {
        if self.active.is_some() {
            return;
        }
        let Some(provider) = &self.provider else {
            return;
        };
        let mut overlay = provider(value);
        if self.toolbar_visible {
            overlay.show_toolbar();
        }
        self.active = Some(overlay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_core::shared::Shared;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum OverlayEvent {
        Created,
        Updated(String),
        Hidden,
        ToolbarShown,
        ToolbarHidden,
        Disposed,
    }

    struct RecordingOverlay {
        log: Shared<Vec<OverlayEvent>>,
    }

    impl SelectionOverlay for RecordingOverlay {
        fn update(&mut self, value: &EditingValue) {
            self.log
                .with_mut(|log| log.push(OverlayEvent::Updated(value.text().to_string())));
        }
        fn hide(&mut self) {
            self.log.with_mut(|log| log.push(OverlayEvent::Hidden));
        }
        fn show_toolbar(&mut self) {
            self.log.with_mut(|log| log.push(OverlayEvent::ToolbarShown));
        }
        fn hide_toolbar(&mut self) {
            self.log.with_mut(|log| log.push(OverlayEvent::ToolbarHidden));
        }
        fn dispose(&mut self) {
            self.log.with_mut(|log| log.push(OverlayEvent::Disposed));
        }
    }

    fn coordinator_with_log() -> (SelectionOverlayCoordinator, Shared<Vec<OverlayEvent>>) {
        let log = Shared::new(Vec::new());
        let sink = log.clone();
        let provider: OverlayProvider = Arc::new(move |_value| {
            sink.with_mut(|log| log.push(OverlayEvent::Created));
            Box::new(RecordingOverlay { log: sink.clone() }) as Box<dyn SelectionOverlay>
        });
        (SelectionOverlayCoordinator::new(Some(provider)), log)
    }

    #[test]
    fn test_overlay_exists_iff_focused_with_provider() {
        let (mut coordinator, log) = coordinator_with_log();
        let value = EditingValue::from_text("ab");

        coordinator.sync_focus(false, &value);
        assert!(!coordinator.has_overlay());

        coordinator.sync_focus(true, &value);
        assert!(coordinator.has_overlay());
        coordinator.sync_focus(true, &value);
        assert_eq!(
            log.get(),
            vec![OverlayEvent::Created],
            "refocusing reuses the live overlay"
        );

        coordinator.sync_focus(false, &value);
        assert!(!coordinator.has_overlay());
        assert_eq!(log.get(), vec![OverlayEvent::Created, OverlayEvent::Disposed]);
    }

    #[test]
    fn test_no_provider_means_no_overlay() {
        let mut coordinator = SelectionOverlayCoordinator::new(None);
        coordinator.sync_focus(true, &EditingValue::from_text("ab"));
        assert!(!coordinator.has_overlay());
    }

    #[test]
    fn test_value_change_updates_in_place() {
        let (mut coordinator, log) = coordinator_with_log();
        coordinator.sync_focus(true, &EditingValue::from_text("a"));

        coordinator.value_changed(true, &EditingValue::from_text("ab"));
        assert_eq!(
            log.get(),
            vec![
                OverlayEvent::Created,
                OverlayEvent::Updated("ab".to_string())
            ]
        );
    }

    #[test]
    fn test_value_change_does_not_create() {
        let (mut coordinator, log) = coordinator_with_log();
        coordinator.value_changed(true, &EditingValue::from_text("ab"));
        assert!(!coordinator.has_overlay());
        assert!(log.get().is_empty());
    }

    #[test]
    fn test_selection_change_disposes_then_recreates() {
        let (mut coordinator, log) = coordinator_with_log();
        let value = EditingValue::from_text("ab");
        coordinator.sync_focus(true, &value);

        coordinator.begin_selection_change();
        assert!(!coordinator.has_overlay());
        coordinator.finish_selection_change(true, &value);
        assert!(coordinator.has_overlay());
        assert_eq!(
            log.get(),
            vec![
                OverlayEvent::Created,
                OverlayEvent::Disposed,
                OverlayEvent::Created
            ]
        );
    }

    #[test]
    fn test_selection_change_respects_lost_focus() {
        let (mut coordinator, _) = coordinator_with_log();
        coordinator.sync_focus(true, &EditingValue::from_text("ab"));
        coordinator.begin_selection_change();
        coordinator.finish_selection_change(false, &EditingValue::from_text("ab"));
        assert!(!coordinator.has_overlay());
    }

    #[test]
    fn test_toolbar_toggle_does_not_resurrect() {
        let (mut coordinator, log) = coordinator_with_log();
        let value = EditingValue::from_text("ab");
        coordinator.sync_focus(true, &value);
        coordinator.dispose();

        coordinator.set_toolbar_visible(true);
        assert!(!coordinator.has_overlay());
        assert_eq!(log.get(), vec![OverlayEvent::Created, OverlayEvent::Disposed]);

        // A later recreation picks the sticky toolbar state up.
        coordinator.sync_focus(true, &value);
        assert_eq!(
            log.get(),
            vec![
                OverlayEvent::Created,
                OverlayEvent::Disposed,
                OverlayEvent::Created,
                OverlayEvent::ToolbarShown
            ]
        );
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (mut coordinator, log) = coordinator_with_log();
        coordinator.sync_focus(true, &EditingValue::from_text("ab"));
        coordinator.dispose();
        coordinator.dispose();
        assert_eq!(log.get(), vec![OverlayEvent::Created, OverlayEvent::Disposed]);
    }

    #[test]
    fn test_hide_keeps_overlay_alive() {
        let (mut coordinator, log) = coordinator_with_log();
        coordinator.sync_focus(true, &EditingValue::from_text("ab"));
        coordinator.hide();
        assert!(coordinator.has_overlay());
        assert_eq!(log.get(), vec![OverlayEvent::Created, OverlayEvent::Hidden]);
    }
}
