//! 인메모리 저장소.
//!
//! 테스트와 `DATABASE_URL` 없이 실행하는 개발 환경용입니다.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{RoleStore, StoreHealth, TaskStore, UserDirectory, UserStore};
use crate::{Role, StoreError, StoreResult, Task, TaskInput, UserRecord, ADMIN_ROLE, DEFAULT_USER_ROLE};

/// 인메모리 저장소.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
    roles: RwLock<Vec<Role>>,
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// `user`, `admin` 역할이 미리 등록된 저장소.
    pub fn with_default_roles() -> Self {
        Self {
            roles: RwLock::new(vec![Role::new(DEFAULT_USER_ROLE), Role::new(ADMIN_ROLE)]),
            ..Default::default()
        }
    }

    /// 검증 없이 사용자 레코드를 삽입합니다. 중복 레코드 상황 재현에 사용합니다.
    pub async fn insert_user(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_by_external_id(&self, external_id: &str) -> StoreResult<Vec<UserRecord>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|user| user.external_id == external_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let mut users: Vec<_> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|user| user.created_at);
        Ok(users)
    }

    async fn create_user(&self, user: UserRecord) -> StoreResult<UserRecord> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(StoreError::Conflict(format!("user {}", user.id)));
        }
        if users.values().any(|u| u.external_id == user.external_id) {
            return Err(StoreError::Conflict(format!(
                "external id {}",
                user.external_id
            )));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &UserRecord) -> StoreResult<()> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl RoleStore for InMemoryStore {
    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(self.roles.read().await.clone())
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .iter()
            .find(|role| role.name == name)
            .cloned())
    }

    async fn create_role(&self, name: &str) -> StoreResult<Role> {
        let mut roles = self.roles.write().await;
        if roles.iter().any(|role| role.name == name) {
            return Err(StoreError::Conflict(format!("role {}", name)));
        }
        let role = Role::new(name);
        roles.push(role.clone());
        Ok(role)
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn list_tasks(&self, owner_id: Uuid) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<_> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|task| task.owner_id == owner_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|task| task.created_at);
        Ok(tasks)
    }

    async fn create_task(&self, task: Task) -> StoreResult<Task> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        id: Uuid,
        owner_id: Uuid,
        input: TaskInput,
    ) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;
        match tasks.get_mut(&id) {
            Some(task) if task.owner_id == owner_id => {
                task.apply(input);
                Ok(Some(task.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_task(&self, id: Uuid, owner_id: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().await;
        let owned = tasks.get(&id).is_some_and(|task| task.owner_id == owner_id);
        if owned {
            tasks.remove(&id);
        }
        Ok(owned)
    }

    async fn delete_tasks_for_owner(&self, owner_id: Uuid) -> StoreResult<u64> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, task| task.owner_id != owner_id);
        Ok((before - tasks.len()) as u64)
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VerifiedIdentity;

    fn user(subject: &str) -> UserRecord {
        UserRecord::from_identity(&VerifiedIdentity::new(subject, "x@example.com"), vec![])
    }

    #[tokio::test]
    async fn test_find_by_external_id_returns_all_matches() {
        let store = InMemoryStore::new();
        store.insert_user(user("uid-1")).await;
        store.insert_user(user("uid-1")).await;
        store.insert_user(user("uid-2")).await;

        assert_eq!(store.find_by_external_id("uid-1").await.unwrap().len(), 2);
        assert_eq!(store.find_by_external_id("uid-2").await.unwrap().len(), 1);
        assert!(store.find_by_external_id("uid-3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_external_id() {
        let store = InMemoryStore::new();
        store.create_user(user("uid-1")).await.unwrap();

        assert!(matches!(
            store.create_user(user("uid-1")).await,
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.find_by_external_id("uid-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_role_conflict() {
        let store = InMemoryStore::with_default_roles();
        assert!(matches!(
            store.create_role(ADMIN_ROLE).await,
            Err(StoreError::Conflict(_))
        ));
        let role = store.create_role("auditor").await.unwrap();
        assert_eq!(store.find_role_by_name("auditor").await.unwrap(), Some(role));
    }

    #[tokio::test]
    async fn test_task_mutations_are_owner_scoped() {
        let store = InMemoryStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let task = store
            .create_task(Task::new(
                owner,
                TaskInput {
                    title: "pay rent".to_string(),
                    ..Default::default()
                },
            ))
            .await
            .unwrap();

        let input = TaskInput {
            title: "hijacked".to_string(),
            ..Default::default()
        };
        assert!(store
            .update_task(task.id, stranger, input)
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_task(task.id, stranger).await.unwrap());
        assert!(store.list_tasks(stranger).await.unwrap().is_empty());

        assert!(store.delete_task(task.id, owner).await.unwrap());
        assert!(store.list_tasks(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let store = InMemoryStore::new();
        assert!(matches!(
            store.update_user(&user("ghost")).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete_user(Uuid::new_v4()).await,
            Err(StoreError::NotFound)
        ));
    }
}
