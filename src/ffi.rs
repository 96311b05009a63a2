//! UniFFI bindings for iOS and Android hosts.
//!
//! The host constructs one [`MealKit`] per session, hands it a storage
//! callback for favorites, and registers a [`StateListener`] to receive
//! state snapshots. Methods documented as blocking wait on the network and
//! must be called off the UI thread; the rest return immediately and report
//! through the listener. Listener callbacks arrive on a dedicated thread and
//! may call blocking methods.

use crate::client::{MealDbClient, RecipeApi};
use crate::config::{Config, ConfigError};
use crate::detail::{DetailLoader, DetailState};
use crate::favorites::{BlobStore, FavoritesError, FavoritesStore, StoreError};
use crate::model::{Category, Ingredient, Recipe};
use crate::recommend::{RecommendationCoordinator, RecommendationState};
use crate::search::{SearchCoordinator, SearchPhase, SearchState};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// FFI-safe error type that wraps all possible errors.
#[derive(Debug, uniffi::Error, thiserror::Error)]
pub enum MealKitError {
    /// Raised by the host's [`FavoritesStorage`] or when saving favorites
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to start thread: {message}")]
    Thread { message: String },
}

impl From<uniffi::UnexpectedUniFFICallbackError> for MealKitError {
    fn from(e: uniffi::UnexpectedUniFFICallbackError) -> Self {
        MealKitError::Storage { message: e.reason }
    }
}

impl From<FavoritesError> for MealKitError {
    fn from(e: FavoritesError) -> Self {
        MealKitError::Storage {
            message: e.to_string(),
        }
    }
}

impl From<ConfigError> for MealKitError {
    fn from(e: ConfigError) -> Self {
        MealKitError::Config {
            message: e.to_string(),
        }
    }
}

/// An ingredient line with its measure.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiIngredient {
    pub name: String,
    pub measure: String,
}

impl From<Ingredient> for FfiIngredient {
    fn from(i: Ingredient) -> Self {
        FfiIngredient {
            name: i.name,
            measure: i.measure,
        }
    }
}

/// FFI-safe representation of a recipe.
#[derive(Debug, uniffi::Object)]
pub struct FfiRecipe {
    inner: Recipe,
}

#[uniffi::export]
impl FfiRecipe {
    pub fn id(&self) -> String {
        self.inner.id().to_string()
    }

    pub fn name(&self) -> String {
        self.inner.name().to_string()
    }

    /// Returns the thumbnail image URL, if the record has one.
    pub fn thumbnail_url(&self) -> Option<String> {
        self.inner.thumbnail().map(str::to_string)
    }

    pub fn instructions(&self) -> Option<String> {
        self.inner.instructions().map(str::to_string)
    }

    /// Returns the non-empty ingredient lines in order.
    pub fn ingredients(&self) -> Vec<FfiIngredient> {
        self.inner
            .ingredients()
            .into_iter()
            .map(FfiIngredient::from)
            .collect()
    }

    /// Returns the instructions split into steps.
    pub fn instruction_steps(&self) -> Vec<String> {
        self.inner.instruction_steps()
    }
}

fn wrap(recipe: Recipe) -> Arc<FfiRecipe> {
    Arc::new(FfiRecipe { inner: recipe })
}

fn wrap_all(recipes: Vec<Recipe>) -> Vec<Arc<FfiRecipe>> {
    recipes.into_iter().map(wrap).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiCategory {
    pub name: String,
}

impl From<Category> for FfiCategory {
    fn from(c: Category) -> Self {
        FfiCategory {
            name: c.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSearchPhase {
    Idle,
    Debouncing,
    Loading,
    Loaded,
    Failed,
}

impl From<SearchPhase> for FfiSearchPhase {
    fn from(phase: SearchPhase) -> Self {
        match phase {
            SearchPhase::Idle => FfiSearchPhase::Idle,
            SearchPhase::Debouncing => FfiSearchPhase::Debouncing,
            SearchPhase::Loading => FfiSearchPhase::Loading,
            SearchPhase::Loaded => FfiSearchPhase::Loaded,
            SearchPhase::Failed => FfiSearchPhase::Failed,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSearchState {
    pub query: String,
    pub recipes: Vec<Arc<FfiRecipe>>,
    pub categories: Vec<FfiCategory>,
    pub selected_category: Option<FfiCategory>,
    pub phase: FfiSearchPhase,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl From<SearchState> for FfiSearchState {
    fn from(s: SearchState) -> Self {
        FfiSearchState {
            is_loading: s.is_loading(),
            query: s.query,
            recipes: wrap_all(s.recipes),
            categories: s.categories.into_iter().map(FfiCategory::from).collect(),
            selected_category: s.selected_category.map(FfiCategory::from),
            phase: s.phase.into(),
            error: s.error,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecommendationState {
    pub recipes: Vec<Arc<FfiRecipe>>,
    pub is_loading: bool,
}

impl From<RecommendationState> for FfiRecommendationState {
    fn from(s: RecommendationState) -> Self {
        FfiRecommendationState {
            recipes: wrap_all(s.recipes),
            is_loading: s.is_loading,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDetailState {
    pub recipe: Option<Arc<FfiRecipe>>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl From<DetailState> for FfiDetailState {
    fn from(s: DetailState) -> Self {
        FfiDetailState {
            recipe: s.recipe.map(wrap),
            is_loading: s.is_loading,
            error: s.error,
        }
    }
}

/// Host-provided persistence for the favorites blob, e.g. `UserDefaults`
/// or `SharedPreferences`.
#[uniffi::export(callback_interface)]
pub trait FavoritesStorage: Send + Sync {
    fn read(&self, key: String) -> Result<Option<Vec<u8>>, MealKitError>;

    /// A failed write leaves the favorites list unchanged.
    fn write(&self, key: String, data: Vec<u8>) -> Result<(), MealKitError>;
}

struct ForeignBlobStore(Box<dyn FavoritesStorage>);

impl BlobStore for ForeignBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.0
            .read(key.to_string())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn write(&self, key: &str, data: &[u8]) -> Result<(), StoreError> {
        self.0
            .write(key.to_string(), data.to_vec())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

/// Receives a snapshot whenever any piece of state changes.
#[uniffi::export(callback_interface)]
pub trait StateListener: Send + Sync {
    fn on_search(&self, state: FfiSearchState);
    fn on_recommendations(&self, state: FfiRecommendationState);
    fn on_detail(&self, state: FfiDetailState);
    fn on_favorites(&self, favorites: Vec<Arc<FfiRecipe>>);
}

/// A snapshot queued for the listener thread.
enum StateEvent {
    Search(SearchState),
    Recommendations(RecommendationState),
    Detail(DetailState),
    Favorites(Vec<Recipe>),
}

impl StateEvent {
    fn deliver(self, listener: &dyn StateListener) {
        match self {
            StateEvent::Search(s) => listener.on_search(s.into()),
            StateEvent::Recommendations(s) => listener.on_recommendations(s.into()),
            StateEvent::Detail(s) => listener.on_detail(s.into()),
            StateEvent::Favorites(f) => listener.on_favorites(wrap_all(f)),
        }
    }
}

/// One app session: API client, coordinators and favorites.
#[derive(uniffi::Object)]
pub struct MealKit {
    runtime: Runtime,
    search: Arc<SearchCoordinator>,
    recommendations: RecommendationCoordinator,
    detail: DetailLoader,
    favorites: FavoritesStore,
    forwarders: Mutex<Vec<JoinHandle<()>>>,
}

#[uniffi::export]
impl MealKit {
    /// Creates a session from optional YAML configuration.
    #[uniffi::constructor]
    pub fn new(
        config_yaml: Option<String>,
        storage: Box<dyn FavoritesStorage>,
    ) -> Result<Arc<Self>, MealKitError> {
        let config = Config::from_yaml_str(config_yaml.as_deref().unwrap_or(""))?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("mealdb-kit")
            .enable_all()
            .build()
            .map_err(|e| MealKitError::Thread {
                message: e.to_string(),
            })?;
        let api: Arc<dyn RecipeApi> = Arc::new(MealDbClient::new(&config.client)?);

        Ok(Arc::new(MealKit {
            runtime,
            search: Arc::new(SearchCoordinator::new(api.clone(), &config.coordinators)),
            recommendations: RecommendationCoordinator::new(api.clone(), &config.coordinators),
            detail: DetailLoader::new(api),
            favorites: FavoritesStore::load(Arc::new(ForeignBlobStore(storage))),
            forwarders: Mutex::new(Vec::new()),
        }))
    }

    // ---- search ----

    /// Updates the search text; the search fires after the debounce window.
    pub fn set_query(&self, query: String) {
        let _guard = self.runtime.enter();
        self.search.set_query(query);
    }

    pub fn submit_search(&self) {
        let _guard = self.runtime.enter();
        self.search.submit();
    }

    pub fn select_category(&self, category: FfiCategory) {
        let _guard = self.runtime.enter();
        self.search.select_category(Category::new(category.name));
    }

    pub fn cancel_search(&self) {
        self.search.cancel();
    }

    /// Loads the category list in the background.
    pub fn load_categories(&self) {
        let search = self.search.clone();
        self.runtime.spawn(async move { search.load_categories().await });
    }

    pub fn search_state(&self) -> FfiSearchState {
        self.search.state().into()
    }

    // ---- recommendations ----

    /// Blocking. Loads `count` distinct random recipes, or the configured
    /// default when `count` is `None`.
    pub fn load_recommendations(&self, count: Option<u32>) -> Vec<Arc<FfiRecipe>> {
        let recipes = match count {
            Some(count) => self
                .runtime
                .block_on(self.recommendations.load_recommendations(count as usize)),
            None => self.runtime.block_on(self.recommendations.load_default()),
        };
        wrap_all(recipes)
    }

    /// Blocking. One random recipe, or `None` if the request failed.
    pub fn load_random(&self) -> Option<Arc<FfiRecipe>> {
        self.runtime
            .block_on(self.recommendations.load_single_random())
            .map(wrap)
    }

    pub fn cancel_recommendations(&self) {
        self.recommendations.cancel();
    }

    pub fn recommendation_state(&self) -> FfiRecommendationState {
        self.recommendations.state().into()
    }

    // ---- details ----

    /// Blocking. Loads the full record for `id`.
    pub fn load_details(&self, id: String) -> Option<Arc<FfiRecipe>> {
        self.runtime.block_on(self.detail.load(&id)).map(wrap)
    }

    pub fn detail_state(&self) -> FfiDetailState {
        self.detail.state().into()
    }

    // ---- favorites ----

    pub fn favorites(&self) -> Vec<Arc<FfiRecipe>> {
        wrap_all(self.favorites.favorites())
    }

    pub fn is_favorite(&self, id: String) -> bool {
        self.favorites.is_favorite(&id)
    }

    /// Returns whether the recipe is a favorite afterwards.
    pub fn toggle_favorite(&self, recipe: Arc<FfiRecipe>) -> Result<bool, MealKitError> {
        Ok(self.favorites.toggle(recipe.inner.clone())?)
    }

    pub fn add_favorite(&self, recipe: Arc<FfiRecipe>) -> Result<(), MealKitError> {
        Ok(self.favorites.add(recipe.inner.clone())?)
    }

    pub fn remove_favorite(&self, id: String) -> Result<(), MealKitError> {
        Ok(self.favorites.remove(&id)?)
    }

    // ---- observation ----

    /// Replaces the state listener. The listener immediately receives the
    /// current state, then every change, in order, on its own thread.
    pub fn set_listener(&self, listener: Box<dyn StateListener>) -> Result<(), MealKitError> {
        let mut forwarders = self.lock_forwarders();
        forwarders.drain(..).for_each(|handle| handle.abort());

        let (events, queue) = mpsc::channel::<StateEvent>();
        // Exits once every forwarder is gone and the queue drains
        std::thread::Builder::new()
            .name("mealdb-kit-listener".to_string())
            .spawn(move || {
                for event in queue {
                    event.deliver(listener.as_ref());
                }
            })
            .map_err(|e| MealKitError::Thread {
                message: e.to_string(),
            })?;

        forwarders.push(self.forward(self.search.subscribe(), events.clone(), StateEvent::Search));
        forwarders.push(self.forward(
            self.recommendations.subscribe(),
            events.clone(),
            StateEvent::Recommendations,
        ));
        forwarders.push(self.forward(self.detail.subscribe(), events.clone(), StateEvent::Detail));
        forwarders.push(self.forward(self.favorites.subscribe(), events, StateEvent::Favorites));
        Ok(())
    }

    pub fn clear_listener(&self) {
        self.lock_forwarders()
            .drain(..)
            .for_each(|handle| handle.abort());
    }
}

impl MealKit {
    /// Queues every snapshot of `rx` for the listener thread.
    fn forward<S>(
        &self,
        mut rx: watch::Receiver<S>,
        events: mpsc::Sender<StateEvent>,
        event: fn(S) -> StateEvent,
    ) -> JoinHandle<()>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.runtime.spawn(async move {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                if events.send(event(snapshot)).is_err() {
                    break;
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }

    fn lock_forwarders(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.forwarders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ============================================================================
// Exported FFI Functions
// ============================================================================

/// Sends the library's log output to stderr, filtered by `filter`.
///
/// Returns `false` if logging was already initialized.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    crate::logging::init_logging(&filter)
}

/// Returns the library version.
#[uniffi::export]
pub fn library_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct SharedStorage(Arc<Mutex<HashMap<String, Vec<u8>>>>);

    impl FavoritesStorage for SharedStorage {
        fn read(&self, key: String) -> Result<Option<Vec<u8>>, MealKitError> {
            Ok(self.0.lock().unwrap().get(&key).cloned())
        }

        fn write(&self, key: String, data: Vec<u8>) -> Result<(), MealKitError> {
            self.0.lock().unwrap().insert(key, data);
            Ok(())
        }
    }

    /// Reads nothing and refuses every write.
    struct FullStorage;

    impl FavoritesStorage for FullStorage {
        fn read(&self, _key: String) -> Result<Option<Vec<u8>>, MealKitError> {
            Ok(None)
        }

        fn write(&self, _key: String, _data: Vec<u8>) -> Result<(), MealKitError> {
            Err(MealKitError::Storage {
                message: "quota exceeded".to_string(),
            })
        }
    }

    struct ChannelListener(Mutex<mpsc::Sender<usize>>);

    impl StateListener for ChannelListener {
        fn on_search(&self, _state: FfiSearchState) {}
        fn on_recommendations(&self, _state: FfiRecommendationState) {}
        fn on_detail(&self, _state: FfiDetailState) {}
        fn on_favorites(&self, favorites: Vec<Arc<FfiRecipe>>) {
            let _ = self.0.lock().unwrap().send(favorites.len());
        }
    }

    /// Fetches a random recipe from inside the favorites callback.
    struct FetchingListener {
        kit: Arc<MealKit>,
        results: Mutex<mpsc::Sender<bool>>,
    }

    impl StateListener for FetchingListener {
        fn on_search(&self, _state: FfiSearchState) {}
        fn on_recommendations(&self, _state: FfiRecommendationState) {}
        fn on_detail(&self, _state: FfiDetailState) {}
        fn on_favorites(&self, favorites: Vec<Arc<FfiRecipe>>) {
            if favorites.is_empty() {
                return;
            }
            let found = self.kit.load_random().is_some();
            let _ = self.results.lock().unwrap().send(found);
        }
    }

    fn offline_config() -> Option<String> {
        Some(
            "client:\n  base_url: \"http://127.0.0.1:9/api/json/v1/1/\"\n  timeout_ms: 2000\n"
                .to_string(),
        )
    }

    #[test]
    fn test_recipe_accessors() {
        let recipe = wrap(
            Recipe::new("52977", "Corba")
                .with_thumbnail("https://img/corba.jpg")
                .with_instructions("Rinse lentils.\r\nSimmer.")
                .with_slot(0, Some("Lentils"), Some("1 cup"))
                .with_slot(1, Some(""), Some("ignored")),
        );

        assert_eq!(recipe.id(), "52977");
        assert_eq!(recipe.thumbnail_url().as_deref(), Some("https://img/corba.jpg"));
        assert_eq!(
            recipe.ingredients(),
            vec![FfiIngredient {
                name: "Lentils".to_string(),
                measure: "1 cup".to_string()
            }]
        );
        assert_eq!(recipe.instruction_steps(), vec!["Rinse lentils.", "Simmer."]);
    }

    #[test]
    fn test_favorites_through_session() {
        let storage = SharedStorage::default();
        let kit = MealKit::new(offline_config(), Box::new(storage.clone())).unwrap();
        let recipe = wrap(Recipe::new("1", "Pancakes"));

        assert!(kit.toggle_favorite(recipe.clone()).unwrap());
        assert!(kit.is_favorite("1".to_string()));
        assert_eq!(kit.favorites().len(), 1);
        assert!(storage
            .read(crate::FAVORITES_KEY.to_string())
            .unwrap()
            .is_some());

        // A new session sees what the first one saved
        let reopened = MealKit::new(offline_config(), Box::new(storage)).unwrap();
        assert!(reopened.is_favorite("1".to_string()));
        reopened.remove_favorite("1".to_string()).unwrap();
        assert!(reopened.favorites().is_empty());
    }

    #[test]
    fn test_listener_receives_favorites() {
        let kit = MealKit::new(offline_config(), Box::new(SharedStorage::default())).unwrap();
        let (tx, rx) = mpsc::channel();
        kit.set_listener(Box::new(ChannelListener(Mutex::new(tx))))
            .unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 0);

        kit.add_favorite(wrap(Recipe::new("1", "Soup"))).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);

        kit.clear_listener();
    }

    #[test]
    fn test_invalid_config() {
        let result = MealKit::new(
            Some("client:\n  base_url: \"not a url\"\n".to_string()),
            Box::new(SharedStorage::default()),
        );
        assert!(matches!(result, Err(MealKitError::Config { .. })));
    }

    #[test]
    fn test_listener_may_call_blocking_methods() {
        let kit = MealKit::new(offline_config(), Box::new(SharedStorage::default())).unwrap();
        let (tx, rx) = mpsc::channel();
        kit.set_listener(Box::new(FetchingListener {
            kit: kit.clone(),
            results: Mutex::new(tx),
        }))
        .unwrap();

        kit.add_favorite(wrap(Recipe::new("1", "Soup"))).unwrap();

        // Nothing listens on the configured port, so the fetch fails
        let found = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(!found);
        kit.clear_listener();
    }

    #[test]
    fn test_failed_host_write_keeps_favorites_unchanged() {
        let kit = MealKit::new(offline_config(), Box::new(FullStorage)).unwrap();

        let result = kit.toggle_favorite(wrap(Recipe::new("1", "Soup")));

        assert!(matches!(result, Err(MealKitError::Storage { .. })));
        assert!(!kit.is_favorite("1".to_string()));
        assert!(kit.favorites().is_empty());
    }

    #[test]
    fn test_search_state_conversion() {
        let state = SearchState {
            query: String::new(),
            recipes: vec![Recipe::new("1", "Pie")],
            categories: vec![Category::new("Dessert")],
            selected_category: Some(Category::new("Dessert")),
            phase: SearchPhase::Loading,
            error: None,
        };

        let ffi = FfiSearchState::from(state);
        assert!(ffi.is_loading);
        assert_eq!(ffi.phase, FfiSearchPhase::Loading);
        assert_eq!(ffi.selected_category.unwrap().name, "Dessert");
        assert_eq!(ffi.categories.len(), 1);
        assert_eq!(ffi.recipes[0].name(), "Pie");
    }

    #[test]
    fn test_library_version() {
        let version = library_version();
        assert!(!version.is_empty());
        assert_eq!(version, env!("CARGO_PKG_VERSION"));
    }
}
