//! 答题会话实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_assessments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_id: i64,
    pub assessment_id: i64,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub submit_time: Option<i64>,
    pub status: String,
    pub total_marks: i32,
    pub obtained_marks: i32,
    pub percentage: f64,
    pub pass_status: Option<String>,
    pub pass_percentage: f64,
    pub duration_minutes: i32,
    pub time_taken: Option<i32>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assessments::Entity",
        from = "Column::AssessmentId",
        to = "super::assessments::Column::Id"
    )]
    Assessment,
    #[sea_orm(has_many = "super::student_answers::Entity")]
    StudentAnswers,
}

impl Related<super::assessments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assessment.def()
    }
}

impl Related<super::student_answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentAnswers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_session(self) -> crate::models::attempts::entities::Session {
        use crate::models::attempts::entities::{PassStatus, Session, SessionStatus};
        use chrono::{DateTime, Utc};

        Session {
            id: self.id,
            student_id: self.student_id,
            assessment_id: self.assessment_id,
            start_time: DateTime::<Utc>::from_timestamp(self.start_time, 0).unwrap_or_default(),
            end_time: self
                .end_time
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            submit_time: self
                .submit_time
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            status: self
                .status
                .parse::<SessionStatus>()
                .unwrap_or(SessionStatus::InProgress),
            total_marks: self.total_marks,
            obtained_marks: self.obtained_marks,
            percentage: self.percentage,
            pass_status: self
                .pass_status
                .and_then(|s| s.parse::<PassStatus>().ok()),
            pass_percentage: self.pass_percentage,
            duration_minutes: self.duration_minutes,
            time_taken: self.time_taken,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
