//! 作答记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "student_answers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub student_assessment_id: i64,
    pub question_id: i64,
    pub student_answer: Option<String>,
    pub is_correct: bool,
    pub marks_obtained: i32,
    pub time_spent: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student_assessments::Entity",
        from = "Column::StudentAssessmentId",
        to = "super::student_assessments::Column::Id"
    )]
    StudentAssessment,
    #[sea_orm(
        belongs_to = "super::questions::Entity",
        from = "Column::QuestionId",
        to = "super::questions::Column::Id"
    )]
    Question,
}

impl Related<super::student_assessments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentAssessment.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Question.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_answer(self) -> crate::models::attempts::entities::StudentAnswer {
        use crate::models::attempts::entities::StudentAnswer;
        use chrono::{DateTime, Utc};

        StudentAnswer {
            id: self.id,
            session_id: self.student_assessment_id,
            question_id: self.question_id,
            student_answer: self.student_answer,
            is_correct: self.is_correct,
            marks_obtained: self.marks_obtained,
            time_spent: self.time_spent,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
