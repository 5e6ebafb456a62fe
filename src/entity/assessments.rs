//! 测评实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assessments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub pass_percentage: f64,
    pub start_at: Option<i64>,
    pub end_at: Option<i64>,
    pub is_active: bool,
    pub allow_multiple_attempts: bool,
    pub show_results_immediately: bool,
    pub show_correct_answers: bool,
    pub deleted_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::assessment_questions::Entity")]
    AssessmentQuestions,
    #[sea_orm(has_many = "super::student_assessments::Entity")]
    StudentAssessments,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::assessment_questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssessmentQuestions.def()
    }
}

impl Related<super::student_assessments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentAssessments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_assessment(self) -> crate::models::catalog::entities::Assessment {
        use crate::models::catalog::entities::Assessment;
        use chrono::{DateTime, Utc};

        Assessment {
            id: self.id,
            category_id: self.category_id,
            title: self.title,
            description: self.description,
            duration_minutes: self.duration_minutes,
            total_marks: self.total_marks,
            pass_percentage: self.pass_percentage,
            start_at: self
                .start_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            end_at: self
                .end_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            is_active: self.is_active,
            allow_multiple_attempts: self.allow_multiple_attempts,
            show_results_immediately: self.show_results_immediately,
            show_correct_answers: self.show_correct_answers,
            deleted_at: self
                .deleted_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
