use dhakaclean_schema::AppView;

/// Which top-level view is in front. Switching never touches other components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewCoordinator {
    current: AppView,
}

impl ViewCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> AppView {
        self.current
    }

    pub fn select(&mut self, view: AppView) -> AppView {
        if view != self.current {
            tracing::debug!(from = ?self.current, to = ?view, "view switched");
        }
        self.current = view;
        self.current
    }

    pub fn is_visible(&self, view: AppView) -> bool {
        self.current == view
    }
}
