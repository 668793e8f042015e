use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{Result, Store};
use crate::schema::{FollowEdge, UserSummary};
use crate::types::id::{
    marker::{BlogMarker, FollowMarker, UserMarker},
    Id,
};

/// [`Store`] that keeps everything in process memory. Data is lost once
/// the process exits; it exists for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    last_user_id: u64,
    last_follow_id: u64,
    users: HashMap<Id<UserMarker>, UserSummary>,
    // kept in insertion order so newest edges are at the end
    follows: Vec<FollowEdge>,
    views: HashMap<Id<BlogMarker>, u64>,
}

/// A user to register before the in-memory store starts serving
/// requests, usually read from a TOML file:
///
/// ```toml
/// [[users]]
/// name = "Asha"
/// username = "asha"
/// email = "asha@example.com"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedUser {
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every seed user in order and returns their ids.
    pub async fn seed_users(&self, users: &[SeedUser]) -> Vec<Id<UserMarker>> {
        let mut ids = Vec::with_capacity(users.len());
        for user in users {
            let id = self
                .create_user(&user.name, user.username.as_deref(), user.email.as_deref())
                .await;
            ids.push(id);
        }
        ids
    }

    /// Registers a user and returns its newly assigned id.
    pub async fn create_user(
        &self,
        name: &str,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Id<UserMarker> {
        let mut state = self.state.lock().await;
        state.last_user_id += 1;

        let id = Id::new(state.last_user_id);
        state.users.insert(
            id,
            UserSummary {
                id,
                name: name.to_string(),
                username: username.map(str::to_string),
                email: email.map(str::to_string),
                avatar: None,
            },
        );
        id
    }
}

impl State {
    fn position(&self, follower: Id<UserMarker>, following: Id<UserMarker>) -> Option<usize> {
        self.follows
            .iter()
            .position(|v| v.follower_id == follower && v.following_id == following)
    }

    fn summaries<'a>(&self, ids: impl Iterator<Item = &'a Id<UserMarker>>) -> Vec<UserSummary> {
        ids.filter_map(|id| self.users.get(id).cloned()).collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, id: Id<UserMarker>) -> Result<Option<UserSummary>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<Option<FollowEdge>> {
        let state = self.state.lock().await;
        Ok(state
            .position(follower, following)
            .map(|idx| state.follows[idx].clone()))
    }

    async fn insert_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<FollowEdge> {
        let mut state = self.state.lock().await;
        if let Some(idx) = state.position(follower, following) {
            return Ok(state.follows[idx].clone());
        }

        state.last_follow_id += 1;
        let edge = FollowEdge {
            id: Id::<FollowMarker>::new(state.last_follow_id),
            follower_id: follower,
            following_id: following,
            created_at: Utc::now().naive_utc(),
        };
        state.follows.push(edge.clone());
        Ok(edge)
    }

    async fn delete_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<Option<FollowEdge>> {
        let mut state = self.state.lock().await;
        Ok(state
            .position(follower, following)
            .map(|idx| state.follows.remove(idx)))
    }

    async fn list_followers(&self, user: Id<UserMarker>) -> Result<Vec<UserSummary>> {
        let state = self.state.lock().await;
        let ids = state
            .follows
            .iter()
            .rev()
            .filter(|v| v.following_id == user)
            .map(|v| &v.follower_id);

        Ok(state.summaries(ids))
    }

    async fn list_following(&self, user: Id<UserMarker>) -> Result<Vec<UserSummary>> {
        let state = self.state.lock().await;
        let ids = state
            .follows
            .iter()
            .rev()
            .filter(|v| v.follower_id == user)
            .map(|v| &v.following_id);

        Ok(state.summaries(ids))
    }

    async fn count_followers(&self, user: Id<UserMarker>) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.follows.iter().filter(|v| v.following_id == user).count() as u64)
    }

    async fn count_following(&self, user: Id<UserMarker>) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.follows.iter().filter(|v| v.follower_id == user).count() as u64)
    }

    async fn add_view(&self, blog: Id<BlogMarker>) -> Result<u64> {
        let mut state = self.state.lock().await;
        let count = state.views.entry(blog).or_default();
        *count += 1;
        Ok(*count)
    }

    async fn view_count(&self, blog: Id<BlogMarker>) -> Result<u64> {
        Ok(self.state.lock().await.views.get(&blog).copied().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn should_not_duplicate_edges() {
        let store = MemoryStore::new();
        let alice = store.create_user("Alice", Some("alice"), None).await;
        let bob = store.create_user("Bob", Some("bob"), None).await;

        let first = store.insert_follow(alice, bob).await.unwrap();
        let second = store.insert_follow(alice, bob).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.count_followers(bob).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_list_newest_edges_first() {
        let store = MemoryStore::new();
        let alice = store.create_user("Alice", None, None).await;
        let bob = store.create_user("Bob", None, None).await;
        let carol = store.create_user("Carol", None, None).await;

        store.insert_follow(bob, alice).await.unwrap();
        store.insert_follow(carol, alice).await.unwrap();

        let names = store
            .list_followers(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect::<Vec<_>>();

        assert_eq!(names, vec!["Carol", "Bob"]);
    }

    #[tokio::test]
    async fn should_seed_users_in_order() {
        let store = MemoryStore::new();
        let users = vec![
            SeedUser {
                name: "Asha".into(),
                username: Some("asha".into()),
                email: Some("asha@example.com".into()),
            },
            SeedUser {
                name: "Ravi".into(),
                username: None,
                email: None,
            },
        ];

        let ids = store.seed_users(&users).await;
        assert_eq!(ids, vec![Id::new(1), Id::new(2)]);

        let asha = store.find_user(ids[0]).await.unwrap().unwrap();
        assert_eq!(asha.username.as_deref(), Some("asha"));
        assert_eq!(asha.email.as_deref(), Some("asha@example.com"));

        store.insert_follow(ids[1], ids[0]).await.unwrap();
        assert_eq!(store.count_followers(ids[0]).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn should_count_views_per_blog() {
        let store = MemoryStore::new();
        let first = Id::<BlogMarker>::new(1);
        let second = Id::<BlogMarker>::new(2);

        assert_eq!(store.view_count(first).await.unwrap(), 0);
        assert_eq!(store.add_view(first).await.unwrap(), 1);
        assert_eq!(store.add_view(first).await.unwrap(), 2);
        assert_eq!(store.view_count(first).await.unwrap(), 2);
        assert_eq!(store.view_count(second).await.unwrap(), 0);
    }
}
