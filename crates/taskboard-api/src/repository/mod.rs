//! PostgreSQL 저장소.
//!
//! 데이터베이스 접근 로직을 라우트 핸들러에서 분리하여 관리합니다.
//! 각 Repository는 static methods 패턴을 사용하고,
//! [`PgStore`]가 이를 묶어 코어 저장소 trait을 구현합니다.

pub mod roles;
pub mod tasks;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use taskboard_core::{
    Role, RoleStore, StoreError, StoreHealth, StoreResult, Task, TaskInput, TaskStore,
    UserDirectory, UserRecord, UserStore,
};
use tracing::info;
use uuid::Uuid;

pub use roles::RoleRepository;
pub use tasks::TaskRepository;
pub use users::UserRepository;

/// PostgreSQL 유일성 제약 위반 코드
const UNIQUE_VIOLATION: &str = "23505";

/// sqlx 에러 → 저장소 에러.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
        }
        _ => StoreError::backend(&err),
    }
}

/// PostgreSQL 저장소.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// 연결 풀을 만들고 마이그레이션을 실행합니다.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;
        info!("Database connection established");

        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 데이터베이스 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        info!("Running database migrations...");
        sqlx::migrate!().run(&self.pool).await?;
        info!("Migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_by_external_id(&self, external_id: &str) -> StoreResult<Vec<UserRecord>> {
        UserRepository::find_by_external_id(&self.pool, external_id)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        UserRepository::list(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_user(&self, user: UserRecord) -> StoreResult<UserRecord> {
        UserRepository::create(&self.pool, &user)
            .await
            .map_err(map_sqlx_error)?;
        Ok(user)
    }

    async fn update_user(&self, user: &UserRecord) -> StoreResult<()> {
        match UserRepository::update(&self.pool, user).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        match UserRepository::delete(&self.pool, id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound),
            Err(e) => Err(map_sqlx_error(e)),
        }
    }
}

#[async_trait]
impl RoleStore for PgStore {
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        RoleRepository::list(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        RoleRepository::find_by_name(&self.pool, name)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_role(&self, name: &str) -> StoreResult<Role> {
        RoleRepository::create(&self.pool, name)
            .await
            .map_err(|e| match map_sqlx_error(e) {
                StoreError::Conflict(_) => StoreError::Conflict(format!("role {name}")),
                other => other,
            })
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(&self, owner_id: Uuid) -> StoreResult<Vec<Task>> {
        TaskRepository::list_for_owner(&self.pool, owner_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_task(&self, task: Task) -> StoreResult<Task> {
        TaskRepository::create(&self.pool, &task)
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        input: TaskInput,
    ) -> StoreResult<Option<Task>> {
        TaskRepository::update(&self.pool, id, owner_id, &input)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool> {
        TaskRepository::delete(&self.pool, id, owner_id)
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_tasks_for_owner(&self, owner_id: Uuid) -> StoreResult<u64> {
        TaskRepository::delete_for_owner(&self.pool, owner_id)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
