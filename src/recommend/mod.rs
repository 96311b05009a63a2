//! Random recipe recommendations.
//!
//! A batch fans out one `fetch_random` per wanted recipe, collapses repeated
//! picks by id, and tops the batch up with replacement fetches until it has
//! enough distinct recipes. Replacements are bounded by an attempt budget and
//! the whole batch by a wall-clock limit; hitting either returns what was
//! collected so far.

use crate::client::{ApiError, RecipeApi};
use crate::config::CoordinatorConfig;
use crate::model::Recipe;
use crate::task::{commit, TaskSlot};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Snapshot of the recommendations shelf.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationState {
    pub recipes: Vec<Recipe>,
    pub is_loading: bool,
}

/// Limits for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimits {
    /// Total `fetch_random` calls the batch may issue
    pub max_attempts: usize,
    pub timeout: Duration,
}

pub struct RecommendationCoordinator {
    api: Arc<dyn RecipeApi>,
    config: CoordinatorConfig,
    state: watch::Sender<RecommendationState>,
    active: TaskSlot,
}

impl RecommendationCoordinator {
    pub fn new(api: Arc<dyn RecipeApi>, config: &CoordinatorConfig) -> Self {
        let (state, _) = watch::channel(RecommendationState::default());
        RecommendationCoordinator {
            api,
            config: config.clone(),
            state,
            active: TaskSlot::default(),
        }
    }

    pub fn state(&self) -> RecommendationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RecommendationState> {
        self.state.subscribe()
    }

    /// Collects up to `target` distinct random recipes.
    ///
    /// Starting a new batch cancels the one in progress; a cancelled batch
    /// returns what it had and leaves the published state alone. Order of
    /// the result is arrival order, which is not meaningful.
    pub async fn load_recommendations(&self, target: usize) -> Vec<Recipe> {
        let token = self.active.begin();
        let limits = BatchLimits {
            max_attempts: self.config.attempt_budget(target),
            timeout: self.config.recommendation_timeout(),
        };

        self.state.send_modify(|s| s.is_loading = true);
        let recipes = collect_unique(self.api.clone(), target, limits, token.clone()).await;

        let published = commit(&self.state, &token, |s| {
            s.recipes = recipes.clone();
            s.is_loading = false;
        });
        if !published {
            debug!("recommendation batch superseded");
        } else if recipes.len() < target {
            warn!(
                wanted = target,
                got = recipes.len(),
                "returning a partial recommendation batch"
            );
        }
        recipes
    }

    /// Loads the configured default number of recommendations.
    pub async fn load_default(&self) -> Vec<Recipe> {
        self.load_recommendations(self.config.recommendation_count)
            .await
    }

    /// One random recipe; failures are logged and reported as `None`.
    pub async fn load_single_random(&self) -> Option<Recipe> {
        match self.api.fetch_random().await {
            Ok(recipe) => recipe,
            Err(e) => {
                warn!(error = %e, "failed to fetch a random recipe");
                None
            }
        }
    }

    /// Cancels the batch in progress, if any.
    pub fn cancel(&self) {
        self.active.cancel();
        self.state.send_if_modified(|s| std::mem::replace(&mut s.is_loading, false));
    }
}

/// Runs one batch: `target` concurrent fetches, one replacement per
/// non-contributing completion while the budget lasts.
///
/// Results are gathered by this function alone, so the de-duplication set
/// needs no lock. Outstanding fetches are aborted and awaited before
/// returning.
pub async fn collect_unique(
    api: Arc<dyn RecipeApi>,
    target: usize,
    limits: BatchLimits,
    token: CancellationToken,
) -> Vec<Recipe> {
    let mut seen = HashSet::new();
    let mut recipes = Vec::with_capacity(target);
    if target == 0 {
        return recipes;
    }

    let mut fetches = JoinSet::new();
    let mut attempts = 0;
    while attempts < target.min(limits.max_attempts) {
        launch(&mut fetches, &api, &mut attempts);
    }

    let deadline = tokio::time::sleep(limits.timeout);
    tokio::pin!(deadline);

    while recipes.len() < target {
        let completed = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = &mut deadline => {
                warn!(timeout = ?limits.timeout, "recommendation batch timed out");
                break;
            }
            next = fetches.join_next() => match next {
                Some(completed) => completed,
                None => break,
            },
        };

        let contributed = match completed {
            Ok(Ok(Some(recipe))) => {
                if seen.insert(recipe.id().to_string()) {
                    recipes.push(recipe);
                    true
                } else {
                    debug!(id = recipe.id(), "duplicate random pick");
                    false
                }
            }
            Ok(Ok(None)) => false,
            Ok(Err(e)) => {
                warn!(error = %e, "random fetch failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "random fetch task failed");
                false
            }
        };

        if !contributed && recipes.len() + fetches.len() < target && attempts < limits.max_attempts {
            launch(&mut fetches, &api, &mut attempts);
        }
    }

    fetches.shutdown().await;
    recipes
}

type RandomFetch = Result<Option<Recipe>, ApiError>;

fn launch(fetches: &mut JoinSet<RandomFetch>, api: &Arc<dyn RecipeApi>, attempts: &mut usize) {
    let api = api.clone();
    *attempts += 1;
    fetches.spawn(async move { api.fetch_random().await });
}
