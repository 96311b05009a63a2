//! On-demand loading of a full recipe record.

use crate::client::RecipeApi;
use crate::model::Recipe;
use crate::task::{commit, until_cancelled, TaskSlot};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Shown for any failed detail load, including a missing record.
pub const DETAIL_ERROR: &str = "Failed to load details";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub recipe: Option<Recipe>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Fetches full records for the detail screen.
///
/// Listing endpoints only return summaries, so the detail screen asks for
/// the complete record by id. A screen always expects a specific record,
/// which is why an absent result is reported as an error rather than an
/// empty state.
pub struct DetailLoader {
    api: Arc<dyn RecipeApi>,
    state: watch::Sender<DetailState>,
    active: TaskSlot,
}

impl DetailLoader {
    pub fn new(api: Arc<dyn RecipeApi>) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        DetailLoader {
            api,
            state,
            active: TaskSlot::default(),
        }
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    /// Loads the record for `id`, superseding any load in progress.
    ///
    /// Returns `None` on failure or when superseded; only the former is
    /// reflected in the state.
    pub async fn load(&self, id: &str) -> Option<Recipe> {
        let token = self.active.begin();
        self.state.send_modify(|s| {
            if s.recipe.as_ref().is_some_and(|r| r.id() != id) {
                s.recipe = None;
            }
            s.is_loading = true;
            s.error = None;
        });

        let outcome = until_cancelled(&token, self.api.fetch_by_id(id)).await;
        let recipe = match outcome {
            Ok(Some(recipe)) => recipe,
            Err(e) if e.is_cancelled() => {
                debug!(id, "detail load superseded");
                return None;
            }
            Ok(None) => {
                warn!(id, "no recipe with this id");
                self.fail(&token);
                return None;
            }
            Err(e) => {
                warn!(id, error = %e, "failed to load recipe details");
                self.fail(&token);
                return None;
            }
        };

        let committed = commit(&self.state, &token, |s| {
            s.recipe = Some(recipe.clone());
            s.is_loading = false;
        });
        committed.then_some(recipe)
    }

    fn fail(&self, token: &tokio_util::sync::CancellationToken) {
        commit(&self.state, token, |s| {
            s.recipe = None;
            s.is_loading = false;
            s.error = Some(DETAIL_ERROR.to_string());
        });
    }
}
