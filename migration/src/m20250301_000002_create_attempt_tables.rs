use sea_orm_migration::prelude::*;

use crate::m20250301_000001_create_catalog_tables::{Assessments, Questions};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建答题会话表
        manager
            .create_table(
                Table::create()
                    .table(StudentAssessments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentAssessments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentAssessments::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentAssessments::AssessmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentAssessments::StartTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentAssessments::EndTime).big_integer().null())
                    .col(
                        ColumnDef::new(StudentAssessments::SubmitTime)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(StudentAssessments::Status).string().not_null())
                    .col(
                        ColumnDef::new(StudentAssessments::TotalMarks)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentAssessments::ObtainedMarks)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentAssessments::Percentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(StudentAssessments::PassStatus).string().null())
                    .col(
                        ColumnDef::new(StudentAssessments::PassPercentage)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentAssessments::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentAssessments::TimeTaken).integer().null())
                    .col(
                        ColumnDef::new(StudentAssessments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentAssessments::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentAssessments::Table, StudentAssessments::AssessmentId)
                            .to(Assessments::Table, Assessments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建作答记录表
        manager
            .create_table(
                Table::create()
                    .table(StudentAnswers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentAnswers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentAnswers::StudentAssessmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentAnswers::QuestionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentAnswers::StudentAnswer).string().null())
                    .col(
                        ColumnDef::new(StudentAnswers::IsCorrect)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(StudentAnswers::MarksObtained)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentAnswers::TimeSpent)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentAnswers::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentAnswers::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentAnswers::Table, StudentAnswers::StudentAssessmentId)
                            .to(StudentAssessments::Table, StudentAssessments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudentAnswers::Table, StudentAnswers::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建学习表现统计表
        manager
            .create_table(
                Table::create()
                    .table(StudentPerformanceAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::AssessmentId)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::Category)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::DifficultyLevel)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::TotalQuestions)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::CorrectAnswers)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::IncorrectAnswers)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::AccuracyPercentage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::AvgTimePerQuestion)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::QuestionsTooSlow)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::QuestionsTooFast)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::QuestionsSkipped)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::CommonMistakes)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::WeakTopics)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::StrongTopics)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::ImprovementRate)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::ConsistencyScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::StreakCorrect)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::MaxStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::StudyTimeMinutes)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::LastActivityDate)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudentPerformanceAnalytics::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_assessments_pair")
                    .table(StudentAssessments::Table)
                    .col(StudentAssessments::StudentId)
                    .col(StudentAssessments::AssessmentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_assessments_status")
                    .table(StudentAssessments::Table)
                    .col(StudentAssessments::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_student_answers_pair")
                    .table(StudentAnswers::Table)
                    .col(StudentAnswers::StudentAssessmentId)
                    .col(StudentAnswers::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_performance_analytics_bucket")
                    .table(StudentPerformanceAnalytics::Table)
                    .col(StudentPerformanceAnalytics::StudentId)
                    .col(StudentPerformanceAnalytics::AssessmentId)
                    .col(StudentPerformanceAnalytics::Category)
                    .col(StudentPerformanceAnalytics::DifficultyLevel)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(StudentPerformanceAnalytics::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(StudentAnswers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudentAssessments::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum StudentAssessments {
    #[sea_orm(iden = "student_assessments")]
    Table,
    Id,
    StudentId,
    AssessmentId,
    StartTime,
    EndTime,
    SubmitTime,
    Status,
    TotalMarks,
    ObtainedMarks,
    Percentage,
    PassStatus,
    PassPercentage,
    DurationMinutes,
    TimeTaken,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StudentAnswers {
    #[sea_orm(iden = "student_answers")]
    Table,
    Id,
    StudentAssessmentId,
    QuestionId,
    StudentAnswer,
    IsCorrect,
    MarksObtained,
    TimeSpent,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StudentPerformanceAnalytics {
    #[sea_orm(iden = "student_performance_analytics")]
    Table,
    Id,
    StudentId,
    AssessmentId,
    Category,
    DifficultyLevel,
    TotalQuestions,
    CorrectAnswers,
    IncorrectAnswers,
    AccuracyPercentage,
    AvgTimePerQuestion,
    QuestionsTooSlow,
    QuestionsTooFast,
    QuestionsSkipped,
    CommonMistakes,
    WeakTopics,
    StrongTopics,
    ImprovementRate,
    ConsistencyScore,
    StreakCorrect,
    MaxStreak,
    StudyTimeMinutes,
    LastActivityDate,
    CreatedAt,
    UpdatedAt,
}
