//! Data-fetch and state-sync layer for a TheMealDB recipe app.
//!
//! [`MealDbClient`] talks to the API; the coordinators turn user intents
//! into requests and publish observable state through `tokio::sync::watch`.
//! Mobile hosts use the [`ffi`] module instead.

uniffi::setup_scaffolding!();

pub mod client;
pub mod config;
pub mod detail;
pub mod favorites;
pub mod ffi;
pub mod logging;
pub mod model;
pub mod recommend;
pub mod search;
pub(crate) mod task;

pub use client::{ApiError, MealDbClient, RecipeApi, TransportError};
pub use config::{ClientConfig, Config, ConfigError, CoordinatorConfig};
pub use detail::{DetailLoader, DetailState};
pub use favorites::{
    BlobStore, FavoritesError, FavoritesStore, FileBlobStore, MemoryBlobStore, StoreError,
    FAVORITES_KEY,
};
pub use logging::init_logging;
pub use model::*;
pub use recommend::{RecommendationCoordinator, RecommendationState};
pub use search::{SearchCoordinator, SearchPhase, SearchState};
