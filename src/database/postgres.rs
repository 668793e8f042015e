use async_trait::async_trait;
use error_stack::{Report, ResultExt};
use thiserror::Error;

use super::{Error, ErrorExt, ErrorExt2, Pool, PoolConnection, Result, Store};
use crate::config;
use crate::schema::{BlogViews, FollowEdge, UserSummary};
use crate::types::id::{
    marker::{BlogMarker, UserMarker},
    Id,
};

const USER_SUMMARY_COLUMNS: &str = "u.id, u.name, u.username, u.email, u.avatar";

/// [`Store`] backed by a writable primary Postgres database and an
/// optional read-only replica.
#[derive(Debug, Clone)]
pub struct PgStore {
    primary: Pool,
    replica: Option<Pool>,
}

#[derive(Debug, Error)]
#[error("Failed to connect to the database")]
pub struct ConnectError;

impl PgStore {
    #[tracing::instrument(skip_all, name = "db.connect_store")]
    pub async fn connect(cfg: &config::Database) -> error_stack::Result<Self, ConnectError> {
        let primary = Pool::new(cfg, &cfg.primary)
            .await
            .change_context(ConnectError)
            .attach_printable("could not connect to the primary database")?;

        let replica = if let Some(replica) = cfg.replica.as_ref() {
            Some(
                Pool::new(cfg, replica)
                    .await
                    .change_context(ConnectError)
                    .attach_printable("could not connect to the replica database")?,
            )
        } else {
            None
        };

        Ok(Self { primary, replica })
    }

    pub async fn migrate(&self) -> Result<()> {
        self.primary.migrate().await
    }

    #[tracing::instrument(skip_all)]
    async fn db_write(&self) -> Result<PoolConnection> {
        if self.primary.is_readonly() {
            return Err(Report::new(Error::Readonly));
        }
        self.primary.get().await
    }

    #[tracing::instrument(skip_all)]
    async fn db_read(&self) -> Result<PoolConnection> {
        if let Some(replica) = self.replica.as_ref() {
            match replica.get().await {
                Ok(conn) => return Ok(conn),
                // fallback
                Err(err) if err.is_unhealthy() => {}
                Err(err) => return Err(err),
            }
        }
        self.primary.get().await
    }

    /// Used when the caller is about to write based on what it reads,
    /// so replication lag must not hide the latest rows.
    #[tracing::instrument(skip_all)]
    async fn db_read_prefer_primary(&self) -> Result<PoolConnection> {
        match (self.primary.get().await, self.replica.as_ref()) {
            (Ok(conn), ..) => Ok(conn),
            (Err(e), Some(readonly_replica)) if e.is_unhealthy() => readonly_replica.get().await,
            (Err(e), ..) => Err(e),
        }
    }
}

fn into_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(skip(self), name = "db.users.find")]
    async fn find_user(&self, id: Id<UserMarker>) -> Result<Option<UserSummary>> {
        let mut conn = self.db_read_prefer_primary().await?;
        sqlx::query_as::<_, UserSummary>(&format!(
            r#"SELECT {USER_SUMMARY_COLUMNS} FROM "users" u WHERE u.id = $1"#
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.follows.find")]
    async fn find_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<Option<FollowEdge>> {
        let mut conn = self.db_read_prefer_primary().await?;
        sqlx::query_as::<_, FollowEdge>(
            r#"SELECT * FROM "follows" WHERE follower_id = $1 AND following_id = $2"#,
        )
        .bind(follower)
        .bind(following)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.follows.insert")]
    async fn insert_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<FollowEdge> {
        let mut conn = self.db_write().await?;
        let inserted = sqlx::query_as::<_, FollowEdge>(
            r#"INSERT INTO "follows" (follower_id, following_id)
               VALUES ($1, $2)
               ON CONFLICT (follower_id, following_id) DO NOTHING
               RETURNING *"#,
        )
        .bind(follower)
        .bind(following)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()?;

        if let Some(edge) = inserted {
            return Ok(edge);
        }

        // Another request created the same edge before us.
        sqlx::query_as::<_, FollowEdge>(
            r#"SELECT * FROM "follows" WHERE follower_id = $1 AND following_id = $2"#,
        )
        .bind(follower)
        .bind(following)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
        .attach_printable("follow edge disappeared right after a conflicting insert")
    }

    #[tracing::instrument(skip(self), name = "db.follows.delete")]
    async fn delete_follow(
        &self,
        follower: Id<UserMarker>,
        following: Id<UserMarker>,
    ) -> Result<Option<FollowEdge>> {
        let mut conn = self.db_write().await?;
        sqlx::query_as::<_, FollowEdge>(
            r#"DELETE FROM "follows" WHERE follower_id = $1 AND following_id = $2 RETURNING *"#,
        )
        .bind(follower)
        .bind(following)
        .fetch_optional(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.follows.list_followers")]
    async fn list_followers(&self, user: Id<UserMarker>) -> Result<Vec<UserSummary>> {
        let mut conn = self.db_read().await?;
        sqlx::query_as::<_, UserSummary>(&format!(
            r#"SELECT {USER_SUMMARY_COLUMNS} FROM "follows" f
               INNER JOIN "users" u ON u.id = f.follower_id
               WHERE f.following_id = $1
               ORDER BY f.created_at DESC, f.id DESC"#
        ))
        .bind(user)
        .fetch_all(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.follows.list_following")]
    async fn list_following(&self, user: Id<UserMarker>) -> Result<Vec<UserSummary>> {
        let mut conn = self.db_read().await?;
        sqlx::query_as::<_, UserSummary>(&format!(
            r#"SELECT {USER_SUMMARY_COLUMNS} FROM "follows" f
               INNER JOIN "users" u ON u.id = f.following_id
               WHERE f.follower_id = $1
               ORDER BY f.created_at DESC, f.id DESC"#
        ))
        .bind(user)
        .fetch_all(&mut *conn)
        .await
        .into_db_error()
    }

    #[tracing::instrument(skip(self), name = "db.follows.count_followers")]
    async fn count_followers(&self, user: Id<UserMarker>) -> Result<u64> {
        let mut conn = self.db_read().await?;
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "follows" WHERE following_id = $1"#)
            .bind(user)
            .fetch_one(&mut *conn)
            .await
            .into_db_error()
            .map(into_count)
    }

    #[tracing::instrument(skip(self), name = "db.follows.count_following")]
    async fn count_following(&self, user: Id<UserMarker>) -> Result<u64> {
        let mut conn = self.db_read().await?;
        sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "follows" WHERE follower_id = $1"#)
            .bind(user)
            .fetch_one(&mut *conn)
            .await
            .into_db_error()
            .map(into_count)
    }

    #[tracing::instrument(skip(self), name = "db.views.add")]
    async fn add_view(&self, blog: Id<BlogMarker>) -> Result<u64> {
        let mut conn = self.db_write().await?;
        sqlx::query_as::<_, BlogViews>(
            r#"INSERT INTO "blog_views" (blog_id, view_count)
               VALUES ($1, 1)
               ON CONFLICT (blog_id)
               DO UPDATE SET view_count = "blog_views".view_count + 1, updated_at = now()
               RETURNING *"#,
        )
        .bind(blog)
        .fetch_one(&mut *conn)
        .await
        .into_db_error()
        .map(|views| into_count(views.view_count))
    }

    #[tracing::instrument(skip(self), name = "db.views.count")]
    async fn view_count(&self, blog: Id<BlogMarker>) -> Result<u64> {
        let mut conn = self.db_read().await?;
        sqlx::query_scalar::<_, i64>(r#"SELECT view_count FROM "blog_views" WHERE blog_id = $1"#)
            .bind(blog)
            .fetch_optional(&mut *conn)
            .await
            .into_db_error()
            .map(|count| count.map(into_count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;
    use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

    // Tests share one database, so every test works on freshly
    // inserted users and never assumes the tables are empty.
    async fn connect() -> Option<PgStore> {
        let Some(cfg) = test_utils::database_config() else {
            eprintln!("DATABASE_URL is not set, skipping");
            return None;
        };

        let store = PgStore::connect(&cfg).await.unwrap();
        store.migrate().await.unwrap();
        Some(store)
    }

    async fn create_user(store: &PgStore, name: &str) -> Id<UserMarker> {
        let mut conn = store.primary.get().await.unwrap();
        sqlx::query_scalar::<_, Id<UserMarker>>(
            r#"INSERT INTO "users" (name) VALUES ($1) RETURNING id"#,
        )
        .bind(name)
        .fetch_one(&mut *conn)
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn should_reject_writes_on_readonly_primary() {
        let pool = sqlx::PgPool::connect_lazy_with(PgConnectOptions::new());
        let store = PgStore {
            primary: Pool {
                pool,
                readonly: true,
            },
            replica: None,
        };

        let alice = Id::<UserMarker>::new(1);
        let bob = Id::<UserMarker>::new(2);

        assert!(store.insert_follow(alice, bob).await.unwrap_err().is_readonly());
        assert!(store.delete_follow(alice, bob).await.unwrap_err().is_readonly());
        assert!(store.add_view(Id::new(1)).await.unwrap_err().is_readonly());
    }

    #[tokio::test]
    async fn should_not_duplicate_follow_edges() {
        let Some(store) = connect().await else { return };
        let alice = create_user(&store, "Alice").await;
        let bob = create_user(&store, "Bob").await;

        let first = store.insert_follow(alice, bob).await.unwrap();
        let second = store.insert_follow(alice, bob).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.count_followers(bob).await.unwrap(), 1);
        assert_eq!(store.find_follow(alice, bob).await.unwrap(), Some(first.clone()));

        assert_eq!(store.delete_follow(alice, bob).await.unwrap(), Some(first));
        assert_eq!(store.delete_follow(alice, bob).await.unwrap(), None);
        assert_eq!(store.find_follow(alice, bob).await.unwrap(), None);
    }

    #[tokio::test]
    async fn should_reject_self_follow() {
        let Some(store) = connect().await else { return };
        let alice = create_user(&store, "Alice").await;

        let error = store.insert_follow(alice, alice).await.unwrap_err();
        assert!(matches!(error.current_context(), Error::Internal(..)));
        assert_eq!(store.count_following(alice).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn should_list_newest_edges_first() {
        let Some(store) = connect().await else { return };
        let alice = create_user(&store, "Alice").await;
        let bob = create_user(&store, "Bob").await;
        let carol = create_user(&store, "Carol").await;

        store.insert_follow(bob, alice).await.unwrap();
        store.insert_follow(carol, alice).await.unwrap();
        store.insert_follow(alice, carol).await.unwrap();

        let followers = store.list_followers(alice).await.unwrap();
        let ids = followers.iter().map(|v| v.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![carol, bob]);
        assert_eq!(followers[0].name, "Carol");
        assert_eq!(
            u64::try_from(followers.len()).unwrap(),
            store.count_followers(alice).await.unwrap()
        );

        let following = store.list_following(alice).await.unwrap();
        assert_eq!(following.iter().map(|v| v.id).collect::<Vec<_>>(), vec![carol]);
        assert_eq!(
            u64::try_from(following.len()).unwrap(),
            store.count_following(alice).await.unwrap()
        );

        let user = store.find_user(carol).await.unwrap().unwrap();
        assert_eq!(user.name, "Carol");
        assert_eq!(user.email, None);
    }

    #[tokio::test]
    async fn should_count_views_with_upsert() {
        let Some(store) = connect().await else { return };
        // blog views outlive a test run, so borrow a fresh serial id
        let blog = create_user(&store, "Blog owner").await.cast::<BlogMarker>();

        assert_eq!(store.view_count(blog).await.unwrap(), 0);
        assert_eq!(store.add_view(blog).await.unwrap(), 1);
        assert_eq!(store.add_view(blog).await.unwrap(), 2);
        assert_eq!(store.view_count(blog).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn should_fall_back_to_primary_when_replica_is_down() {
        let Some(cfg) = test_utils::database_config() else {
            eprintln!("DATABASE_URL is not set, skipping");
            return;
        };

        let replica = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(1))
            .connect_lazy_with(PgConnectOptions::new().host("127.0.0.1").port(1));

        let store = PgStore::connect(&cfg).await.unwrap();
        store.migrate().await.unwrap();
        let alice = create_user(&store, "Alice").await;
        let bob = create_user(&store, "Bob").await;
        store.insert_follow(bob, alice).await.unwrap();

        let store = PgStore {
            primary: store.primary,
            replica: Some(Pool {
                pool: replica,
                readonly: true,
            }),
        };
        assert_eq!(store.count_followers(alice).await.unwrap(), 1);
    }
}
