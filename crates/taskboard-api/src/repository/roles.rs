//! 역할 Repository

use sqlx::PgPool;
use taskboard_core::Role;
use uuid::Uuid;

/// 역할 Repository
pub struct RoleRepository;

impl RoleRepository {
    pub async fn list(pool: &PgPool) -> Result<Vec<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Role>, sqlx::Error> {
        sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// 역할 생성. 이름 중복은 유일성 제약 위반으로 실패합니다.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Role, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (id, name)
            VALUES ($1, $2)
            RETURNING id, name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(pool)
        .await
    }
}
