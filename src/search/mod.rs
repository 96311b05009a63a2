//! Debounced text search and category browsing for one result list.

use crate::client::{ApiError, RecipeApi};
use crate::config::CoordinatorConfig;
use crate::model::{Category, Recipe};
use crate::task::{commit, until_cancelled, TaskSlot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

mod model;

pub use model::{SearchPhase, SearchState};

/// Owns the displayed recipe list and the work that fills it.
///
/// Text searches wait out a debounce window before hitting the network;
/// category loads go straight out. Either kind supersedes whatever was
/// pending or in flight, and a superseded unit never touches the state
/// again. Must be driven from within a tokio runtime.
pub struct SearchCoordinator {
    api: Arc<dyn RecipeApi>,
    debounce: Duration,
    state: Arc<watch::Sender<SearchState>>,
    active: TaskSlot,
}

impl SearchCoordinator {
    pub fn new(api: Arc<dyn RecipeApi>, config: &CoordinatorConfig) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        SearchCoordinator {
            api,
            debounce: config.debounce(),
            state: Arc::new(state),
            active: TaskSlot::default(),
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.subscribe()
    }

    /// Handles a change to the search text.
    ///
    /// A non-empty query schedules a debounced search; clearing the text
    /// drops any pending search and returns to idle, keeping the results.
    pub fn set_query(&self, query: impl Into<String>) {
        let query = query.into();
        if query.is_empty() {
            self.active.cancel();
            self.state.send_modify(|s| {
                s.query.clear();
                if matches!(s.phase, SearchPhase::Debouncing | SearchPhase::Loading) {
                    s.phase = SearchPhase::Idle;
                }
            });
            return;
        }
        self.schedule_search(query);
    }

    /// Searches for the current query, as when the user presses return.
    pub fn submit(&self) {
        let query = self.state.borrow().query.clone();
        if query.is_empty() {
            return;
        }
        self.schedule_search(query);
    }

    /// Shows the recipes in `category`, clearing the text query.
    pub fn select_category(&self, category: Category) {
        self.active.cancel();
        let name = category.name().to_string();
        self.state.send_modify(|s| {
            s.query.clear();
            s.selected_category = Some(category);
            s.phase = SearchPhase::Loading;
            s.error = None;
        });

        let api = self.api.clone();
        let state = self.state.clone();
        self.active.spawn(move |token| async move {
            debug!(category = %name, "loading category");
            let outcome = until_cancelled(&token, api.list_by_category(&name)).await;
            finish(&state, &token, outcome);
        });
    }

    /// Fetches the category list if it hasn't been loaded yet.
    ///
    /// Failures are logged and otherwise ignored; categories are secondary
    /// and never set the shared error.
    pub async fn load_categories(&self) {
        if !self.state.borrow().categories.is_empty() {
            return;
        }
        match self.api.list_categories().await {
            Ok(categories) => self.state.send_modify(|s| s.categories = categories),
            Err(e) => warn!(error = %e, "failed to load categories"),
        }
    }

    /// Drops any pending or in-flight load.
    pub fn cancel(&self) {
        self.active.cancel();
        self.state.send_if_modified(|s| {
            if matches!(s.phase, SearchPhase::Debouncing | SearchPhase::Loading) {
                s.phase = SearchPhase::Idle;
                true
            } else {
                false
            }
        });
    }

    fn schedule_search(&self, query: String) {
        // The old unit must be cancelled before the new state is visible
        self.active.cancel();
        self.state.send_modify(|s| {
            s.query = query.clone();
            s.selected_category = None;
            s.phase = SearchPhase::Debouncing;
        });

        let api = self.api.clone();
        let state = self.state.clone();
        let debounce = self.debounce;
        self.active.spawn(move |token| async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    trace!(%query, "search superseded while debouncing");
                    return;
                }
                _ = tokio::time::sleep(debounce) => {}
            }

            let started = commit(&state, &token, |s| {
                s.phase = SearchPhase::Loading;
                s.error = None;
            });
            if !started {
                return;
            }

            debug!(%query, "searching");
            let outcome = until_cancelled(&token, api.search_by_text(&query)).await;
            finish(&state, &token, outcome);
        });
    }
}

fn finish(
    state: &watch::Sender<SearchState>,
    token: &CancellationToken,
    outcome: Result<Vec<Recipe>, ApiError>,
) {
    match outcome {
        Ok(recipes) => {
            commit(state, token, |s| {
                s.recipes = recipes;
                s.phase = SearchPhase::Loaded;
                s.error = None;
            });
        }
        Err(e) if e.is_cancelled() => trace!("load superseded"),
        Err(e) => {
            warn!(error = %e, "search failed");
            let message = e.user_message().unwrap_or_default().to_string();
            commit(state, token, |s| {
                s.phase = SearchPhase::Failed;
                s.error = Some(message);
            });
        }
    }
}
