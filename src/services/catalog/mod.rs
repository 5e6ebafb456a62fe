pub mod list;
pub mod manage;
pub mod paper;
pub mod seed;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::errors::Result;
use crate::models::catalog::entities::{Assessment, AssessmentPaper, Category, Question};
use crate::models::catalog::requests::{
    AvailableAssessmentParams, CreateAssessmentRequest, CreateCategoryRequest,
    CreateQuestionRequest,
};
use crate::models::catalog::responses::{AssessmentPaperResponse, AvailableAssessmentListResponse};
use crate::models::catalog::seed::CatalogSeed;
use crate::storage::Storage;
use crate::utils::Clock;

pub use seed::SeedReport;

/// 题库服务
pub struct CatalogService {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn ObjectCache>,
    clock: Arc<dyn Clock>,
}

impl CatalogService {
    pub fn new(storage: Arc<dyn Storage>, cache: Arc<dyn ObjectCache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            cache,
            clock,
        }
    }

    pub(crate) fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub(crate) fn cache(&self) -> &(dyn ObjectCache + 'static) {
        self.cache.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub async fn create_category(&self, req: CreateCategoryRequest) -> Result<Category> {
        manage::create_category(self, req).await
    }

    pub async fn delete_category(&self, category_id: i64) -> Result<()> {
        manage::delete_category(self, category_id).await
    }

    pub async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question> {
        manage::create_question(self, req).await
    }

    pub async fn set_question_active(&self, question_id: i64, active: bool) -> Result<()> {
        manage::set_question_active(self, question_id, active).await
    }

    pub async fn create_assessment(&self, req: CreateAssessmentRequest) -> Result<Assessment> {
        manage::create_assessment(self, req).await
    }

    pub async fn attach_questions(&self, assessment_id: i64, question_ids: &[i64]) -> Result<()> {
        manage::attach_questions(self, assessment_id, question_ids).await
    }

    pub async fn delete_assessment(&self, assessment_id: i64) -> Result<()> {
        manage::delete_assessment(self, assessment_id).await
    }

    pub async fn list_available(
        &self,
        student_id: i64,
        params: AvailableAssessmentParams,
    ) -> Result<AvailableAssessmentListResponse> {
        list::list_available(self, student_id, params).await
    }

    /// 读取试卷（含已软删除的测评），走缓存
    pub async fn get_paper(&self, assessment_id: i64) -> Result<AssessmentPaper> {
        paper::get_paper(self, assessment_id).await
    }

    /// 学生作答视图
    pub async fn paper_for_student(&self, assessment_id: i64) -> Result<AssessmentPaperResponse> {
        paper::paper_for_student(self, assessment_id).await
    }

    pub async fn seed(&self, seed: CatalogSeed) -> Result<SeedReport> {
        seed::apply_seed(self, seed).await
    }
}
