//! Per-user favorites, watchlist and ratings.
//!
//! Access goes through the [`UserStore`] trait so a durable backend can
//! replace [`InMemoryUserStore`]. The in-memory store keeps one mutex per user
//! record: mutations on the same user are serialised, different users never
//! contend beyond the directory read lock.
//!
//! Each store instance draws a random epoch when it is created. Session
//! tokens carry it, so ids handed out by a previous instance (which restart
//! from 1) cannot be replayed against a new one.
use crate::tmdb::MovieId;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub type UserId = u64;
pub type Ratings = BTreeMap<MovieId, u8>;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("User not found")]
    UserNotFound,
    #[error("Rating must be between 1 and 10")]
    InvalidRating(i64),
    #[error("Email already registered")]
    EmailTaken,
}

/// A rating in `MIN_RATING..=MAX_RATING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(u8);

impl Rating {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = StoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Rating(value as u8))
        } else {
            Err(StoreError::InvalidRating(value))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub favorites: Vec<MovieId>,
    #[serde(rename = "watchlists")]
    pub watchlist: Vec<MovieId>,
    pub ratings: Ratings,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub id: UserId,
    pub password_hash: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Identifies this store instance; never shared with an earlier one.
    fn epoch(&self) -> u64;
    async fn create_user(
        &self,
        email: &str,
        password_hash: String,
    ) -> Result<UserProfile, StoreError>;
    async fn credentials(&self, email: &str) -> Option<Credentials>;
    async fn profile(&self, user: UserId) -> Result<UserProfile, StoreError>;
    async fn add_favorite(&self, user: UserId, movie: MovieId) -> Result<Vec<MovieId>, StoreError>;
    async fn remove_favorite(
        &self,
        user: UserId,
        movie: MovieId,
    ) -> Result<Vec<MovieId>, StoreError>;
    async fn add_watchlist(&self, user: UserId, movie: MovieId)
        -> Result<Vec<MovieId>, StoreError>;
    async fn remove_watchlist(
        &self,
        user: UserId,
        movie: MovieId,
    ) -> Result<Vec<MovieId>, StoreError>;
    /// The user is looked up before the rating is validated.
    async fn rate(&self, user: UserId, movie: MovieId, rating: i64) -> Result<Ratings, StoreError>;
}

#[derive(Debug)]
struct UserRecord {
    id: UserId,
    email: String,
    password_hash: String,
    favorites: Vec<MovieId>,
    watchlist: Vec<MovieId>,
    ratings: Ratings,
}

impl UserRecord {
    fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            favorites: self.favorites.clone(),
            watchlist: self.watchlist.clone(),
            ratings: self.ratings.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Directory {
    last_id: UserId,
    records: HashMap<UserId, Arc<Mutex<UserRecord>>>,
    // lowercased email -> id
    by_email: HashMap<String, UserId>,
}

#[derive(Debug)]
pub struct InMemoryUserStore {
    epoch: u64,
    directory: RwLock<Directory>,
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            epoch: rand::random(),
            directory: RwLock::new(Directory::default()),
        }
    }

    async fn record(&self, user: UserId) -> Result<Arc<Mutex<UserRecord>>, StoreError> {
        self.directory
            .read()
            .await
            .records
            .get(&user)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }

    async fn update_list<F>(&self, user: UserId, f: F) -> Result<Vec<MovieId>, StoreError>
    where
        F: FnOnce(&mut UserRecord) -> &mut Vec<MovieId> + Send,
    {
        let record = self.record(user).await?;
        let mut guard = record.lock().await;
        Ok(f(&mut *guard).clone())
    }
}

fn insert_unique(list: &mut Vec<MovieId>, movie: MovieId) -> &mut Vec<MovieId> {
    if !list.contains(&movie) {
        list.push(movie);
    }
    list
}

fn remove_all(list: &mut Vec<MovieId>, movie: MovieId) -> &mut Vec<MovieId> {
    list.retain(|&m| m != movie);
    list
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    fn epoch(&self) -> u64 {
        self.epoch
    }

    async fn create_user(
        &self,
        email: &str,
        password_hash: String,
    ) -> Result<UserProfile, StoreError> {
        let key = email.to_lowercase();
        let mut dir = self.directory.write().await;
        if dir.by_email.contains_key(&key) {
            return Err(StoreError::EmailTaken);
        }
        dir.last_id += 1;
        let id = dir.last_id;
        let record = UserRecord {
            id,
            email: email.to_string(),
            password_hash,
            favorites: Vec::new(),
            watchlist: Vec::new(),
            ratings: Ratings::new(),
        };
        let profile = record.profile();
        dir.records.insert(id, Arc::new(Mutex::new(record)));
        dir.by_email.insert(key, id);
        Ok(profile)
    }

    async fn credentials(&self, email: &str) -> Option<Credentials> {
        let record = {
            let dir = self.directory.read().await;
            let id = dir.by_email.get(&email.to_lowercase())?;
            dir.records.get(id).cloned()?
        };
        let guard = record.lock().await;
        Some(Credentials {
            id: guard.id,
            password_hash: guard.password_hash.clone(),
        })
    }

    async fn profile(&self, user: UserId) -> Result<UserProfile, StoreError> {
        let record = self.record(user).await?;
        let guard = record.lock().await;
        Ok(guard.profile())
    }

    async fn add_favorite(&self, user: UserId, movie: MovieId) -> Result<Vec<MovieId>, StoreError> {
        self.update_list(user, |r| insert_unique(&mut r.favorites, movie))
            .await
    }

    async fn remove_favorite(
        &self,
        user: UserId,
        movie: MovieId,
    ) -> Result<Vec<MovieId>, StoreError> {
        self.update_list(user, |r| remove_all(&mut r.favorites, movie))
            .await
    }

    async fn add_watchlist(
        &self,
        user: UserId,
        movie: MovieId,
    ) -> Result<Vec<MovieId>, StoreError> {
        self.update_list(user, |r| insert_unique(&mut r.watchlist, movie))
            .await
    }

    async fn remove_watchlist(
        &self,
        user: UserId,
        movie: MovieId,
    ) -> Result<Vec<MovieId>, StoreError> {
        self.update_list(user, |r| remove_all(&mut r.watchlist, movie))
            .await
    }

    async fn rate(&self, user: UserId, movie: MovieId, rating: i64) -> Result<Ratings, StoreError> {
        let record = self.record(user).await?;
        let rating = Rating::try_from(rating)?;
        let mut guard = record.lock().await;
        guard.ratings.insert(movie, rating.value());
        Ok(guard.ratings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_user() -> (InMemoryUserStore, UserId) {
        let store = InMemoryUserStore::new();
        let user = store
            .create_user("ana@example.com", "hash".to_string())
            .await
            .expect("create user");
        (store, user.id)
    }

    #[tokio::test]
    async fn add_favorite_is_idempotent() {
        let (store, user) = store_with_user().await;
        assert_eq!(store.add_favorite(user, 42).await.unwrap(), vec![42]);
        assert_eq!(store.add_favorite(user, 42).await.unwrap(), vec![42]);
        assert_eq!(store.add_favorite(user, 7).await.unwrap(), vec![42, 7]);
    }

    #[tokio::test]
    async fn removing_absent_entry_is_a_no_op() {
        let (store, user) = store_with_user().await;
        store.add_watchlist(user, 1).await.unwrap();
        store.add_watchlist(user, 2).await.unwrap();
        assert_eq!(store.remove_watchlist(user, 99).await.unwrap(), vec![1, 2]);
        assert_eq!(store.remove_watchlist(user, 1).await.unwrap(), vec![2]);
    }

    #[tokio::test]
    async fn favorites_and_watchlist_are_independent() {
        let (store, user) = store_with_user().await;
        store.add_favorite(user, 5).await.unwrap();
        store.add_watchlist(user, 6).await.unwrap();
        let profile = store.profile(user).await.unwrap();
        assert_eq!(profile.favorites, vec![5]);
        assert_eq!(profile.watchlist, vec![6]);
    }

    #[tokio::test]
    async fn out_of_range_ratings_are_rejected_without_mutation() {
        let (store, user) = store_with_user().await;
        store.rate(user, 42, 5).await.unwrap();
        assert_eq!(
            store.rate(user, 42, 0).await,
            Err(StoreError::InvalidRating(0))
        );
        assert_eq!(
            store.rate(user, 42, 11).await,
            Err(StoreError::InvalidRating(11))
        );
        assert_eq!(store.profile(user).await.unwrap().ratings, Ratings::from([(42, 5)]));
    }

    #[tokio::test]
    async fn rerating_overwrites() {
        let (store, user) = store_with_user().await;
        assert_eq!(store.rate(user, 42, 7).await.unwrap()[&42], 7);
        assert_eq!(store.rate(user, 42, 3).await.unwrap()[&42], 3);
        assert_eq!(store.rate(user, 42, 1).await.unwrap()[&42], 1);
        assert_eq!(store.rate(user, 42, 10).await.unwrap()[&42], 10);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found_and_checked_before_rating() {
        let (store, user) = store_with_user().await;
        let ghost = user + 100;
        assert_eq!(store.add_favorite(ghost, 1).await, Err(StoreError::UserNotFound));
        assert_eq!(store.remove_favorite(ghost, 1).await, Err(StoreError::UserNotFound));
        assert_eq!(store.add_watchlist(ghost, 1).await, Err(StoreError::UserNotFound));
        assert_eq!(store.remove_watchlist(ghost, 1).await, Err(StoreError::UserNotFound));
        assert_eq!(store.rate(ghost, 1, 50).await, Err(StoreError::UserNotFound));
        assert_eq!(store.profile(ghost).await, Err(StoreError::UserNotFound));

        let profile = store.profile(user).await.unwrap();
        assert!(profile.favorites.is_empty());
        assert!(profile.ratings.is_empty());
    }

    #[tokio::test]
    async fn emails_are_unique_case_insensitively() {
        let (store, _) = store_with_user().await;
        assert_eq!(
            store.create_user("ANA@Example.com", "x".to_string()).await,
            Err(StoreError::EmailTaken)
        );
        let creds = store.credentials("Ana@example.COM").await.expect("credentials");
        assert_eq!(creds.password_hash, "hash");
        assert!(store.credentials("bob@example.com").await.is_none());
    }

    #[tokio::test]
    async fn fresh_stores_reuse_ids_but_not_epochs() {
        let (first, first_user) = store_with_user().await;
        let (second, second_user) = store_with_user().await;
        assert_eq!(first_user, second_user);
        assert_ne!(first.epoch(), second.epoch());
    }

    #[test]
    fn profile_serializes_watchlists_key() {
        let profile = UserProfile {
            id: 1,
            email: "ana@example.com".to_string(),
            favorites: vec![1],
            watchlist: vec![2],
            ratings: Ratings::from([(3, 9)]),
        };
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["watchlists"], serde_json::json!([2]));
        assert_eq!(value["email"], "ana@example.com");
        assert!(value.get("watchlist").is_none());
    }

    #[tokio::test]
    async fn favorites_lifecycle() {
        let (store, user) = store_with_user().await;
        assert_eq!(store.add_favorite(user, 42).await.unwrap(), vec![42]);
        assert_eq!(store.add_favorite(user, 42).await.unwrap(), vec![42]);
        assert!(store.remove_favorite(user, 42).await.unwrap().is_empty());
        assert_eq!(store.rate(user, 42, 8).await.unwrap(), Ratings::from([(42, 8)]));
    }

    #[tokio::test]
    async fn concurrent_adds_on_one_user_lose_nothing() {
        let store = Arc::new(InMemoryUserStore::new());
        let user = store.create_user("ana@example.com", "h".to_string()).await.unwrap().id;
        let mut handles = Vec::new();
        for movie in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.add_favorite(user, movie).await.unwrap();
                store.add_favorite(user, movie).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let mut favorites = store.profile(user).await.unwrap().favorites;
        favorites.sort();
        assert_eq!(favorites, (0..50).collect::<Vec<_>>());
    }
}
