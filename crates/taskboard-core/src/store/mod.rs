//! 저장소 계약.
//!
//! 접근 제어 계층은 [`UserDirectory`]의 읽기 계약에만 의존합니다.
//! 나머지 trait은 라우트 핸들러가 사용하는 단순 CRUD 계약입니다.
//!
//! - [`UserDirectory`]: subject id → 사용자 레코드 조회
//! - [`UserStore`]: 사용자 생성/수정/삭제
//! - [`RoleStore`]: 역할 조회/생성
//! - [`TaskStore`]: 소유자 단위 태스크 CRUD

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{Role, StoreResult, Task, TaskInput, UserRecord};

pub use memory::InMemoryStore;

/// 사용자 디렉터리 읽기 계약.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// 외부 subject id에 매핑된 사용자 레코드를 모두 반환합니다.
    ///
    /// 정상 데이터라면 0개 또는 1개입니다. 2개 이상은 무결성 문제이며
    /// 판단은 호출자가 합니다.
    async fn find_by_external_id(&self, external_id: &str) -> StoreResult<Vec<UserRecord>>;
}

/// 사용자 저장소.
#[async_trait]
pub trait UserStore: UserDirectory {
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>>;

    async fn create_user(&self, user: UserRecord) -> StoreResult<UserRecord>;

    /// 레코드 전체를 덮어씁니다. 없으면 `StoreError::NotFound`.
    async fn update_user(&self, user: &UserRecord) -> StoreResult<()>;

    /// 없으면 `StoreError::NotFound`.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;
}

/// 역할 저장소.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;

    /// 같은 이름이 있으면 `StoreError::Conflict`.
    async fn create_role(&self, name: &str) -> StoreResult<Role>;
}

/// 태스크 저장소.
///
/// 모든 수정/삭제는 (id, 소유자) 쌍으로 필터링됩니다.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self, owner_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn create_task(&self, task: Task) -> StoreResult<Task>;

    /// 소유자가 다르거나 없으면 `Ok(None)`.
    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        input: TaskInput,
    ) -> StoreResult<Option<Task>>;

    /// 삭제되었으면 true.
    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool>;

    /// 소유자의 태스크를 모두 삭제하고 삭제 개수를 반환합니다.
    async fn delete_tasks_for_owner(&self, owner_id: Uuid) -> StoreResult<u64>;
}

/// 저장소 헬스 체크.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    /// 헬스 응답에 표시할 백엔드 이름.
    fn backend_name(&self) -> &'static str;
}

/// 핸들러에서 공유하는 저장소 묶음.
///
/// 같은 구현체를 trait별 핸들로 나눠 보관합니다.
#[derive(Clone)]
pub struct Stores {
    pub directory: Arc<dyn UserDirectory>,
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl Stores {
    /// 하나의 구현체로 모든 핸들을 구성합니다.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + RoleStore + TaskStore + StoreHealth + 'static,
    {
        Self {
            directory: backend.clone(),
            users: backend.clone(),
            roles: backend.clone(),
            tasks: backend.clone(),
            health: backend,
        }
    }

    /// 기본 역할이 등록된 인메모리 저장소.
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryStore::with_default_roles()))
    }
}
