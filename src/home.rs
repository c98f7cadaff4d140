use once_cell::unsync::OnceCell;

use crate::scene::Transform;

/// One-shot snapshot of the asset transform taken when loading completes.
#[derive(Debug, Default)]
pub struct HomeMemory {
    state: OnceCell<Transform>,
}

impl HomeMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `transform` as the home state. Later captures are ignored and
    /// return `false`.
    pub fn capture(&self, transform: Transform) -> bool {
        self.state.set(transform).is_ok()
    }

    /// Returns a copy of the captured transform.
    pub fn get(&self) -> Option<Transform> {
        self.state.get().copied()
    }
}
