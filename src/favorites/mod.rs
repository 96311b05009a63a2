//! The user's favorite recipes, persisted as one JSON blob.

mod store;

pub use store::{BlobStore, FileBlobStore, MemoryBlobStore, StoreError};

use crate::model::Recipe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Key of the slot holding the serialized favorites list.
pub const FAVORITES_KEY: &str = "favoriteMeals";

/// Errors that can occur when saving favorites.
#[derive(Error, Debug)]
pub enum FavoritesError {
    #[error("Failed to encode favorites: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to persist favorites: {0}")]
    Store(#[from] StoreError),
}

/// Ordered favorites list, unique by recipe id.
///
/// Records are kept exactly as given: a summary from a category listing is
/// stored as a summary. Every mutation writes the whole list before the
/// in-memory copy changes, so a failed write leaves both untouched.
pub struct FavoritesStore {
    store: Arc<dyn BlobStore>,
    favorites: watch::Sender<Vec<Recipe>>,
}

impl FavoritesStore {
    /// Loads favorites from `store`.
    ///
    /// Missing, unreadable or corrupt data yields an empty list.
    pub fn load(store: Arc<dyn BlobStore>) -> Self {
        let favorites = match store.read(FAVORITES_KEY) {
            Ok(Some(data)) => serde_json::from_slice(&data).unwrap_or_else(|e| {
                warn!(error = %e, "stored favorites are corrupt, starting empty");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "failed to read favorites, starting empty");
                Vec::new()
            }
        };
        debug!(count = favorites.len(), "loaded favorites");

        let (favorites, _) = watch::channel(favorites);
        FavoritesStore { store, favorites }
    }

    pub fn favorites(&self) -> Vec<Recipe> {
        self.favorites.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<Recipe>> {
        self.favorites.subscribe()
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.borrow().iter().any(|r| r.id() == id)
    }

    /// Appends `recipe` unless a recipe with the same id is already saved.
    pub fn add(&self, recipe: Recipe) -> Result<(), FavoritesError> {
        self.mutate(|list| {
            if list.iter().any(|r| r.same_recipe(&recipe)) {
                return false;
            }
            list.push(recipe);
            true
        })
    }

    pub fn remove(&self, id: &str) -> Result<(), FavoritesError> {
        self.mutate(|list| {
            let before = list.len();
            list.retain(|r| r.id() != id);
            list.len() != before
        })
    }

    /// Removes `recipe` if saved, otherwise appends it.
    ///
    /// Returns whether the recipe is a favorite afterwards.
    pub fn toggle(&self, recipe: Recipe) -> Result<bool, FavoritesError> {
        let mut now_favorite = false;
        self.mutate(|list| {
            match list.iter().position(|r| r.same_recipe(&recipe)) {
                Some(index) => {
                    list.remove(index);
                }
                None => {
                    list.push(recipe);
                    now_favorite = true;
                }
            }
            true
        })?;
        Ok(now_favorite)
    }

    /// Applies `change` to a copy of the list and, if it reports a change,
    /// persists the copy and publishes it.
    fn mutate(&self, change: impl FnOnce(&mut Vec<Recipe>) -> bool) -> Result<(), FavoritesError> {
        let mut result = Ok(());
        self.favorites.send_if_modified(|current| {
            let mut next = current.clone();
            if !change(&mut next) {
                return false;
            }
            match self.persist(&next) {
                Ok(()) => {
                    *current = next;
                    true
                }
                Err(e) => {
                    warn!(error = %e, "failed to save favorites");
                    result = Err(e);
                    false
                }
            }
        });
        result
    }

    fn persist(&self, favorites: &[Recipe]) -> Result<(), FavoritesError> {
        let data = serde_json::to_vec(favorites)?;
        self.store.write(FAVORITES_KEY, &data)?;
        Ok(())
    }
}
