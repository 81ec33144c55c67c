//! 태스크 Repository
//!
//! 모든 조회/수정/삭제는 owner_id 조건을 포함합니다.

use sqlx::PgPool;
use taskboard_core::{Task, TaskInput};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, owner_id, title, description, start_date, end_date, \
                            completed, priority, created_at, updated_at";

/// 태스크 Repository
pub struct TaskRepository;

impl TaskRepository {
    pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 ORDER BY created_at"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(pool: &PgPool, task: &Task) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks ({TASK_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(task.owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.start_date)
        .bind(task.end_date)
        .bind(task.completed)
        .bind(task.priority)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(pool)
        .await
    }

    /// 소유자의 태스크만 수정. 없으면 None.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner_id: Uuid,
        input: &TaskInput,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET title = $3, description = $4, start_date = $5, end_date = $6,
                completed = $7, priority = $8, updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(input.completed)
        .bind(input.priority)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid, owner_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE owner_id = $1")
            .bind(owner_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
