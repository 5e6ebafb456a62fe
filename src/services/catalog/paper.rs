use tracing::debug;

use super::CatalogService;
use crate::errors::{PortalError, Result};
use crate::models::catalog::entities::AssessmentPaper;
use crate::models::catalog::responses::AssessmentPaperResponse;

pub(crate) fn paper_cache_key(assessment_id: i64) -> String {
    format!("assessment_paper:{assessment_id}")
}

pub(crate) async fn invalidate_paper(service: &CatalogService, assessment_id: i64) {
    service.cache().remove(&paper_cache_key(assessment_id)).await;
    debug!("Invalidated cached paper for assessment {}", assessment_id);
}

pub async fn get_paper(service: &CatalogService, assessment_id: i64) -> Result<AssessmentPaper> {
    let key = paper_cache_key(assessment_id);
    if let Some(paper) = service.cache().get_json::<AssessmentPaper>(&key).await {
        return Ok(paper);
    }

    let paper = service
        .storage()
        .get_assessment_paper(assessment_id)
        .await?
        .ok_or_else(|| PortalError::not_found(format!("测评 {assessment_id} 不存在")))?;

    service.cache().insert_json(key, &paper).await;
    Ok(paper)
}

/// 只对当前可作答的测评开放试卷
pub async fn paper_for_student(
    service: &CatalogService,
    assessment_id: i64,
) -> Result<AssessmentPaperResponse> {
    let paper = get_paper(service, assessment_id).await?;
    if paper.assessment.is_deleted() {
        return Err(PortalError::not_found(format!("测评 {assessment_id} 不存在")));
    }
    paper
        .readiness(service.clock().now())
        .map_err(PortalError::not_ready)?;

    Ok(AssessmentPaperResponse::from(&paper))
}
