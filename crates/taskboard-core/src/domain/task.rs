//! 사용자 소유 태스크.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 태스크.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct Task {
    pub id: Uuid,
    /// 소유자 (UserRecord.id)
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub completed: bool,
    /// 우선순위 (0~5)
    pub priority: Option<i16>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 태스크 생성/전체 수정 입력.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub priority: Option<i16>,
}

impl Task {
    /// 소유자와 입력으로 새 태스크를 만듭니다.
    pub fn new(owner_id: Uuid, input: TaskInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: input.title,
            description: input.description,
            start_date: input.start_date,
            end_date: input.end_date,
            completed: input.completed,
            priority: input.priority,
            created_at: now,
            updated_at: now,
        }
    }

    /// 입력 값으로 덮어씁니다. id, 소유자, 생성 시각은 유지됩니다.
    pub fn apply(&mut self, input: TaskInput) {
        self.title = input.title;
        self.description = input.description;
        self.start_date = input.start_date;
        self.end_date = input.end_date;
        self.completed = input.completed;
        self.priority = input.priority;
        self.updated_at = Utc::now();
    }
}
