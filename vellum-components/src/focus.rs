//! Focus state management.
//!
//! Focus is treated as independent shared state rather than a property of a
//! component tree: each focusable participant holds a [`Focus`] handle with
//! a unique identity, and a [`FocusScope`] records which identity currently
//! has focus. Only one handle per scope can be focused at a time.
//!
//! A scope is typically one window or one test; keeping the registry
//! per-scope rather than process-global means independent editors (and
//! parallel tests) never contend for the same focus slot.
//!
//! Focus is automatically cleared when a handle is dropped, so a component
//! that goes away never leaves a dangling focused identity behind.

use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

/// A focus domain: which identity, if any, currently has focus.
#[derive(Clone, Default)]
pub struct FocusScope {
    focused: Arc<RwLock<Option<Uuid>>>,
}

impl FocusScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a focus handle registered to this scope.
    pub fn handle(&self) -> Focus {
        Focus {
            id: Uuid::new_v4(),
            scope: self.clone(),
        }
    }

    /// Whether any handle in this scope has focus.
    pub fn has_focus(&self) -> bool {
        self.focused.read().is_some()
    }

    /// Clears focus regardless of which handle holds it.
    pub fn clear(&self) {
        *self.focused.write() = None;
    }
}

/// A focus handle for one focusable participant.
///
/// # Examples
///
/// ```
/// use vellum_components::focus::FocusScope;
///
/// let scope = FocusScope::new();
/// let first = scope.handle();
/// let second = scope.handle();
///
/// first.request_focus();
/// assert!(first.is_focused());
/// assert!(!second.is_focused());
///
/// // Requesting focus elsewhere takes it away.
/// second.request_focus();
/// assert!(!first.is_focused());
/// assert!(second.is_focused());
/// ```
pub struct Focus {
    id: Uuid,
    scope: FocusScope,
}

impl Focus {
    pub fn is_focused(&self) -> bool {
        *self.scope.focused.read() == Some(self.id)
    }

    pub fn request_focus(&self) {
        *self.scope.focused.write() = Some(self.id);
    }

    /// Clears focus if this handle currently has it; no effect otherwise.
    pub fn unfocus(&self) {
        let mut focused = self.scope.focused.write();
        if *focused == Some(self.id) {
            *focused = None;
        }
    }
}

impl Drop for Focus {
    fn drop(&mut self) {
        self.unfocus();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_is_exclusive_within_scope() {
        let scope = FocusScope::new();
        let a = scope.handle();
        let b = scope.handle();

        assert!(!a.is_focused());
        a.request_focus();
        assert!(a.is_focused());
        assert!(!b.is_focused());

        b.request_focus();
        assert!(!a.is_focused());
        assert!(b.is_focused());
    }

    #[test]
    fn test_unfocus_only_clears_own_focus() {
        let scope = FocusScope::new();
        let a = scope.handle();
        let b = scope.handle();

        b.request_focus();
        a.unfocus();
        assert!(b.is_focused());

        b.unfocus();
        assert!(!scope.has_focus());
        b.unfocus();
        assert!(!scope.has_focus());
    }

    #[test]
    fn test_drop_clears_focus() {
        let scope = FocusScope::new();
        {
            let focus = scope.handle();
            focus.request_focus();
            assert!(scope.has_focus());
        }
        assert!(!scope.has_focus());
    }

    #[test]
    fn test_scopes_are_independent() {
        let left = FocusScope::new();
        let right = FocusScope::new();
        let a = left.handle();
        let b = right.handle();

        a.request_focus();
        b.request_focus();
        assert!(a.is_focused());
        assert!(b.is_focused());
    }
}
