//! Repository for users and their roles.

use sqlx::PgPool;
use uuid::Uuid;

use crate::metrics::QueryTimer;

/// Repository for `users` and `user_roles`.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Highest-privilege role held by a user, if any.
    pub async fn find_role(&self, user_id: Uuid) -> Result<Option<String>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_role", "user_roles");
        let result = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            ORDER BY CASE role WHEN 'admin' THEN 0 WHEN 'manager' THEN 1 ELSE 2 END
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Whether any admin exists. Used for first-time setup detection.
    pub async fn admin_exists(&self) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("admin_exists", "user_roles");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM user_roles WHERE role = 'admin')
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Deletes a user. Role rows cascade. Returns rows deleted.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("delete_user", "users");
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.rows_affected())
    }
}
