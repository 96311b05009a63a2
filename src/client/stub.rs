//! Scriptable in-memory `RecipeApi` for coordinator tests.

use super::{ApiError, RecipeApi};
use crate::model::{Category, Recipe};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub(crate) enum StubFailure {
    Server(u16),
    Decoding,
}

impl StubFailure {
    fn into_error(self) -> ApiError {
        match self {
            StubFailure::Server(status) => ApiError::Server {
                status,
                body: String::new(),
            },
            StubFailure::Decoding => {
                ApiError::Decoding(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Reply<T> {
    delay: Duration,
    result: Result<T, StubFailure>,
}

impl<T: Clone> Reply<T> {
    pub(crate) fn ok(value: T) -> Self {
        Reply {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub(crate) fn fail(failure: StubFailure) -> Self {
        Reply {
            delay: Duration::ZERO,
            result: Err(failure),
        }
    }

    pub(crate) fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn resolve(&self) -> Result<T, ApiError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone().map_err(StubFailure::into_error)
    }
}

/// One scripted `fetch_random` outcome.
#[derive(Debug, Clone)]
pub(crate) enum RandomReply {
    Meal(Reply<Option<Recipe>>),
    /// Never resolves; counts a drop when the future is abandoned
    Hang,
}

/// Increments the shared counter when the owning future is dropped.
struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) fn meal(id: &str) -> Recipe {
    Recipe::new(id, format!("Meal {id}"))
}

#[derive(Default)]
pub(crate) struct StubApi {
    calls: Mutex<Vec<String>>,
    searches: Mutex<HashMap<String, Reply<Vec<Recipe>>>>,
    by_category: Mutex<HashMap<String, Reply<Vec<Recipe>>>>,
    categories: Mutex<Option<Reply<Vec<Category>>>>,
    lookups: Mutex<HashMap<String, Reply<Option<Recipe>>>>,
    randoms: Mutex<VecDeque<RandomReply>>,
    dropped: Arc<AtomicUsize>,
}

impl StubApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_search(self, query: &str, reply: Reply<Vec<Recipe>>) -> Self {
        self.searches.lock().unwrap().insert(query.to_string(), reply);
        self
    }

    pub(crate) fn on_category(self, category: &str, reply: Reply<Vec<Recipe>>) -> Self {
        self.by_category
            .lock()
            .unwrap()
            .insert(category.to_string(), reply);
        self
    }

    pub(crate) fn on_categories(self, reply: Reply<Vec<Category>>) -> Self {
        *self.categories.lock().unwrap() = Some(reply);
        self
    }

    pub(crate) fn on_lookup(self, id: &str, reply: Reply<Option<Recipe>>) -> Self {
        self.lookups.lock().unwrap().insert(id.to_string(), reply);
        self
    }

    pub(crate) fn on_random(self, reply: RandomReply) -> Self {
        self.randoms.lock().unwrap().push_back(reply);
        self
    }

    /// Queues one immediate random reply per id, in order.
    pub(crate) fn with_random_ids(self, ids: &[&str]) -> Self {
        ids.iter().fold(self, |stub, id| {
            stub.on_random(RandomReply::Meal(Reply::ok(Some(meal(id)))))
        })
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Number of hanging random fetches that were abandoned.
    pub(crate) fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RecipeApi for StubApi {
    async fn search_by_text(&self, query: &str) -> Result<Vec<Recipe>, ApiError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.record(format!("search:{query}"));
        let reply = self.searches.lock().unwrap().get(query).cloned();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(Vec::new()),
        }
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record("categories".to_string());
        let reply = self.categories.lock().unwrap().clone();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(Vec::new()),
        }
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Recipe>, ApiError> {
        self.record(format!("category:{category}"));
        let reply = self.by_category.lock().unwrap().get(category).cloned();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_by_id(&self, id: &str) -> Result<Option<Recipe>, ApiError> {
        self.record(format!("lookup:{id}"));
        let reply = self.lookups.lock().unwrap().get(id).cloned();
        match reply {
            Some(reply) => reply.resolve().await,
            None => Ok(None),
        }
    }

    async fn fetch_random(&self) -> Result<Option<Recipe>, ApiError> {
        self.record("random".to_string());
        let reply = self.randoms.lock().unwrap().pop_front();
        match reply {
            Some(RandomReply::Meal(reply)) => reply.resolve().await,
            Some(RandomReply::Hang) => {
                let _guard = DropCounter(self.dropped.clone());
                std::future::pending::<()>().await;
                Ok(None)
            }
            None => Ok(None),
        }
    }
}
