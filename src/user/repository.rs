use crate::db::Db;

use super::Sub;
use super::model::User;

pub struct UserRepository {
    pool: Db,
}

impl UserRepository {
    pub fn new(pool: &Db) -> Self {
        Self { pool: pool.clone() }
    }
}

impl UserRepository {
    pub async fn upsert(&self, user: &User) -> super::Result<()> {
        sqlx::query(
            r#"
INSERT INTO users (sub, name, avatar) VALUES (?, ?, ?)
ON CONFLICT (sub) DO UPDATE SET name = excluded.name, avatar = excluded.avatar
            "#,
        )
        .bind(&user.sub)
        .bind(&user.name)
        .bind(&user.avatar)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_sub(&self, sub: &Sub) -> super::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT sub, name, avatar FROM users WHERE sub = ?")
            .bind(&sub.0)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
