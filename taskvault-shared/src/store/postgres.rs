//! PostgreSQL store
//!
//! Schema lives in `taskvault-shared/migrations/`. Uniqueness of username
//! and email is enforced by constraints; a violation surfaces as
//! [`StoreError::Duplicate`].
//!
//! Full-text search uses the `simple` configuration over
//! `title || ' ' || description`, backed by a GIN index on the same
//! expression, with `ts_rank` as the relevance score.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{CredentialStore, StoreError, TaskStore};
use crate::models::user::normalize_identifier;
use crate::models::{CreateUser, Task, TaskId, UpdateUser, User, UserId};
use crate::tasks::query::{ScoredTask, TaskQueryPlan};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, refresh_token_hash, created_at, updated_at";

const TASK_COLUMNS: &str =
    "id, owner_id, title, description, status, due_date, version, created_at, updated_at";

/// Must match the expression of `idx_tasks_search`
const SEARCH_VECTOR: &str = "to_tsvector('simple', title || ' ' || coalesce(description, ''))";

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn create(&self, user: CreateUser) -> Result<User, StoreError> {
        let query = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(UserId::new())
            .bind(normalize_identifier(&user.username))
            .bind(normalize_identifier(&user.email))
            .bind(user.password_hash)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        // NULL never equals anything, so an absent identifier drops out
        let query = format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE username = $1 OR email = $2
            ORDER BY created_at
            LIMIT 1
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(username.map(normalize_identifier))
            .bind(email.map(normalize_identifier))
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        id: UserId,
        update: UpdateUser,
    ) -> Result<Option<User>, StoreError> {
        let query = format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(update.username.as_deref().map(normalize_identifier))
            .bind(update.email.as_deref().map(normalize_identifier))
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn set_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_refresh_token(
        &self,
        id: UserId,
        refresh_token_hash: Option<String>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE users SET refresh_token_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(refresh_token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::db::pool::health_check(&self.pool).await?;
        Ok(())
    }
}

/// Appends the WHERE clause shared by the count and the page query
fn push_filters<'a>(
    builder: &mut QueryBuilder<'a, Postgres>,
    plan: &TaskQueryPlan,
    tsquery: Option<&str>,
) {
    builder.push(" WHERE owner_id = ").push_bind(plan.owner);

    if let Some(status) = plan.status {
        builder.push(" AND status = ").push_bind(status);
    }

    if let Some(tsquery) = tsquery {
        builder
            .push(" AND ")
            .push(SEARCH_VECTOR)
            .push(" @@ to_tsquery('simple', ")
            .push_bind(tsquery.to_string())
            .push(")");
    }
}

#[async_trait]
impl TaskStore for PostgresStore {
    async fn insert(&self, task: Task) -> Result<Task, StoreError> {
        let query = format!(
            r#"
            INSERT INTO tasks ({TASK_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(task.owner_id)
            .bind(task.title)
            .bind(task.description)
            .bind(task.status)
            .bind(task.due_date)
            .bind(task.version)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, StoreError> {
        let query = format!(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                status = $4,
                due_date = $5,
                version = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.due_date)
            .bind(task.version)
            .bind(task.updated_at)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn delete(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let query = format!("DELETE FROM tasks WHERE id = $1 RETURNING {TASK_COLUMNS}");

        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    async fn find_page(&self, plan: &TaskQueryPlan) -> Result<(Vec<ScoredTask>, u64), StoreError> {
        if plan.matches_nothing() {
            return Ok((Vec::new(), 0));
        }

        // terms are alphanumeric words, so joining them is a valid tsquery
        let tsquery = plan.terms.as_ref().map(|terms| terms.join(" | "));

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_filters(&mut count, plan, tsquery.as_deref());
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT ");
        select.push(TASK_COLUMNS);
        match &tsquery {
            Some(tsquery) => {
                select
                    .push(", ts_rank(")
                    .push(SEARCH_VECTOR)
                    .push(", to_tsquery('simple', ")
                    .push_bind(tsquery.clone())
                    .push("))::float8 AS score");
            }
            None => {
                select.push(", NULL::float8 AS score");
            }
        }
        select.push(" FROM tasks");
        push_filters(&mut select, plan, tsquery.as_deref());

        select.push(" ORDER BY ");
        if tsquery.is_some() {
            select.push("score DESC, ");
        }
        select
            .push(plan.sort_by.column())
            .push(" ")
            .push(plan.sort_type.as_sql())
            .push(", id ASC");

        // bounded by TaskQueryPlan::build
        let limit = i64::try_from(plan.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(plan.offset).unwrap_or(i64::MAX);
        select
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = select
            .build_query_as::<ScoredTask>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows, u64::try_from(total).unwrap_or_default()))
    }
}
