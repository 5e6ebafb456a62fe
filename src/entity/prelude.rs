//! 预导入模块，方便使用

pub use super::assessment_questions::{
    ActiveModel as AssessmentQuestionActiveModel, Entity as AssessmentQuestions,
    Model as AssessmentQuestionModel,
};
pub use super::assessments::{
    ActiveModel as AssessmentActiveModel, Entity as Assessments, Model as AssessmentModel,
};
pub use super::categories::{
    ActiveModel as CategoryActiveModel, Entity as Categories, Model as CategoryModel,
};
pub use super::questions::{
    ActiveModel as QuestionActiveModel, Entity as Questions, Model as QuestionModel,
};
pub use super::student_answers::{
    ActiveModel as StudentAnswerActiveModel, Entity as StudentAnswers, Model as StudentAnswerModel,
};
pub use super::student_assessments::{
    ActiveModel as StudentAssessmentActiveModel, Entity as StudentAssessments,
    Model as StudentAssessmentModel,
};
pub use super::student_performance_analytics::{
    ActiveModel as PerformanceAnalyticsActiveModel, Entity as StudentPerformanceAnalytics,
    Model as PerformanceAnalyticsModel,
};
