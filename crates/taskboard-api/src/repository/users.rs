//! 사용자 Repository
//!
//! 사용자 레코드와 역할 연결(`user_roles`)을 함께 다룹니다.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use taskboard_core::{Role, UserRecord};
use uuid::Uuid;

/// users 테이블 행.
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: Uuid,
    external_id: String,
    email: String,
    display_name: Option<String>,
    avatar_url: Option<String>,
    salt: Option<String>,
    first_login: bool,
    device_tokens: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_record(self, roles: Vec<Role>) -> UserRecord {
        UserRecord {
            id: self.id,
            external_id: self.external_id,
            email: self.email,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            roles,
            salt: self.salt,
            first_login: self.first_login,
            device_tokens: self.device_tokens,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    user_id: Uuid,
    id: Uuid,
    name: String,
}

const USER_COLUMNS: &str = "id, external_id, email, display_name, avatar_url, salt, \
                            first_login, device_tokens, created_at, updated_at";

/// 사용자 Repository
pub struct UserRepository;

impl UserRepository {
    /// subject id로 조회 (정상이면 0개 또는 1개)
    pub async fn find_by_external_id(
        pool: &PgPool,
        external_id: &str,
    ) -> Result<Vec<UserRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1 ORDER BY created_at"
        ))
        .bind(external_id)
        .fetch_all(pool)
        .await?;

        Self::attach_roles(pool, rows).await
    }

    /// 전체 사용자 조회
    pub async fn list(pool: &PgPool) -> Result<Vec<UserRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(pool)
        .await?;

        Self::attach_roles(pool, rows).await
    }

    /// 사용자 생성 (역할 연결 포함)
    pub async fn create(pool: &PgPool, user: &UserRecord) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, external_id, email, display_name, avatar_url, salt,
                               first_login, device_tokens, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.id)
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.salt)
        .bind(user.first_login)
        .bind(&user.device_tokens)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        Self::replace_roles(&mut tx, user).await?;

        tx.commit().await
    }

    /// 사용자 전체 덮어쓰기. 대상이 없으면 false.
    pub async fn update(pool: &PgPool, user: &UserRecord) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, display_name = $3, avatar_url = $4, salt = $5,
                first_login = $6, device_tokens = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(&user.salt)
        .bind(user.first_login)
        .bind(&user.device_tokens)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        Self::replace_roles(&mut tx, user).await?;
        tx.commit().await?;
        Ok(true)
    }

    /// 사용자 삭제 (태스크와 역할 연결은 FK cascade)
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn replace_roles(
        tx: &mut Transaction<'_, Postgres>,
        user: &UserRecord,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user.id)
            .execute(&mut **tx)
            .await?;

        let role_ids: Vec<Uuid> = user.roles.iter().map(|role| role.id).collect();
        if !role_ids.is_empty() {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) SELECT $1, UNNEST($2::uuid[])",
            )
            .bind(user.id)
            .bind(&role_ids)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    async fn attach_roles(
        pool: &PgPool,
        rows: Vec<UserRow>,
    ) -> Result<Vec<UserRecord>, sqlx::Error> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let role_rows = sqlx::query_as::<_, UserRoleRow>(
            r#"
            SELECT ur.user_id, r.id, r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            ORDER BY r.name
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut roles_by_user: HashMap<Uuid, Vec<Role>> = HashMap::new();
        for row in role_rows {
            roles_by_user.entry(row.user_id).or_default().push(Role {
                id: row.id,
                name: row.name,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let roles = roles_by_user.remove(&row.id).unwrap_or_default();
                row.into_record(roles)
            })
            .collect())
    }
}
