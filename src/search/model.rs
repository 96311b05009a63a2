use crate::model::{Category, Recipe};

/// Where the currently displayed list is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchPhase {
    #[default]
    Idle,
    /// Waiting out the quiet period after a query change
    Debouncing,
    Loading,
    Loaded,
    Failed,
}

/// Snapshot of the search screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub recipes: Vec<Recipe>,
    pub categories: Vec<Category>,
    pub selected_category: Option<Category>,
    pub phase: SearchPhase,
    /// User-facing message from the last failed load
    pub error: Option<String>,
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        self.phase == SearchPhase::Loading
    }

    /// True once a load has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self.phase, SearchPhase::Loaded | SearchPhase::Failed)
    }
}
