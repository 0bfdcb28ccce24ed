use chrono::Utc;
use std::sync::Arc;

use crate::{error::FavoriteStoreError, model::FavoriteCity, storage::KeyValueStore};

/// Storage key holding the JSON-encoded favorite.
pub const FAVORITE_CITY_KEY: &str = "weather_favorite_city";

/// Single-slot persistence for the favorite city. The only writer of that slot.
#[derive(Debug, Clone)]
pub struct FavoriteCityStore {
    storage: Arc<dyn KeyValueStore>,
}

impl FavoriteCityStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Overwrite the slot with `city`, stamped with the current time.
    pub fn save(&self, city: &str, country: &str) -> Result<FavoriteCity, FavoriteStoreError> {
        let favorite = FavoriteCity {
            name: city.to_string(),
            country: country.to_string(),
            saved_at: Utc::now(),
        };

        let json = serde_json::to_string(&favorite)?;
        self.storage.set(FAVORITE_CITY_KEY, &json)?;
        tracing::debug!("Saved favorite city {}, {}", favorite.name, favorite.country);

        Ok(favorite)
    }

    /// The stored favorite. Unreadable or corrupt slots read as empty.
    pub fn get(&self) -> Option<FavoriteCity> {
        match self.load() {
            Ok(favorite) => favorite,
            Err(e) => {
                tracing::warn!("Ignoring stored favorite: {}", e);
                None
            }
        }
    }

    pub fn remove(&self) -> Result<(), FavoriteStoreError> {
        self.storage.remove(FAVORITE_CITY_KEY)?;
        Ok(())
    }

    /// Case-insensitive name match against the stored favorite. Country is
    /// not compared.
    pub fn is_favorite(&self, city: &str) -> bool {
        self.get()
            .is_some_and(|fav| fav.name.to_lowercase() == city.to_lowercase())
    }

    fn load(&self) -> Result<Option<FavoriteCity>, FavoriteStoreError> {
        let Some(raw) = self.storage.get(FAVORITE_CITY_KEY)? else {
            return Ok(None);
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&raw)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStore, MemoryStore};

    fn memory_store() -> (Arc<MemoryStore>, FavoriteCityStore) {
        let storage = Arc::new(MemoryStore::new());
        let store = FavoriteCityStore::new(storage.clone());
        (storage, store)
    }

    #[test]
    fn save_then_get() {
        let (_, store) = memory_store();
        store.save("Paris", "FR").unwrap();

        let fav = store.get().expect("favorite must exist");
        assert_eq!(fav.name, "Paris");
        assert_eq!(fav.country, "FR");
        assert!(store.is_favorite("paris"));
        assert!(store.is_favorite("PARIS"));
        assert!(!store.is_favorite("Berlin"));
    }

    #[test]
    fn save_overwrites_previous_favorite() {
        let (_, store) = memory_store();
        store.save("Paris", "FR").unwrap();
        store.save("Berlin", "DE").unwrap();

        assert_eq!(store.get().map(|f| f.name), Some("Berlin".to_string()));
        assert!(!store.is_favorite("Paris"));
    }

    #[test]
    fn remove_clears_slot_and_is_idempotent() {
        let (_, store) = memory_store();
        store.save("Paris", "FR").unwrap();

        store.remove().unwrap();
        store.remove().unwrap();

        assert!(store.get().is_none());
        assert!(!store.is_favorite("Paris"));
        assert!(!store.is_favorite(""));
    }

    #[test]
    fn corrupt_payload_reads_as_empty() {
        let (storage, store) = memory_store();
        storage.set(FAVORITE_CITY_KEY, "{not json").unwrap();

        assert!(store.get().is_none());
        assert!(!store.is_favorite("Paris"));

        storage.set(FAVORITE_CITY_KEY, r#"{"name": 5}"#).unwrap();
        assert!(store.get().is_none());
    }

    #[test]
    fn country_is_not_compared() {
        let (_, store) = memory_store();
        store.save("Paris", "FR").unwrap();
        assert!(store.is_favorite("Paris"));
        assert_eq!(store.get().map(|f| f.country), Some("FR".to_string()));
    }

    #[test]
    fn reads_legacy_payload_written_by_other_clients() {
        let (storage, store) = memory_store();
        storage
            .set(
                FAVORITE_CITY_KEY,
                r#"{"name":"Lyon","country":"FR","savedAt":"2024-03-01T10:00:00.000Z"}"#,
            )
            .unwrap();

        assert_eq!(store.get().map(|f| f.name), Some("Lyon".to_string()));
    }

    #[test]
    fn file_backed_favorite_survives_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        FavoriteCityStore::new(Arc::new(FileStore::new(dir.path())))
            .save("Oslo", "NO")
            .unwrap();

        let reopened = FavoriteCityStore::new(Arc::new(FileStore::new(dir.path())));
        assert!(reopened.is_favorite("oslo"));
    }
}
