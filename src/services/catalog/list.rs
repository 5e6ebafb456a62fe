use super::CatalogService;
use crate::errors::Result;
use crate::models::attempts::responses::AttemptSummary;
use crate::models::catalog::requests::AvailableAssessmentParams;
use crate::models::catalog::responses::{
    AvailableAssessmentItem, AvailableAssessmentListResponse,
};

pub async fn list_available(
    service: &CatalogService,
    student_id: i64,
    params: AvailableAssessmentParams,
) -> Result<AvailableAssessmentListResponse> {
    let storage = service.storage();
    let query = params.into_query(service.clock().now());

    let (assessments, pagination) = storage.list_available_assessments(query).await?;
    let ids: Vec<i64> = assessments.iter().map(|a| a.id).collect();

    let counts = storage.count_active_questions(&ids).await?;
    let latest = storage.latest_sessions(student_id, &ids).await?;

    let items = assessments
        .into_iter()
        .map(|assessment| {
            let summary = latest.get(&assessment.id).map(|session| {
                AttemptSummary::from_session(session, assessment.show_results_immediately)
            });
            let count = counts.get(&assessment.id).copied().unwrap_or(0);
            AvailableAssessmentItem::new(assessment, count, summary)
        })
        .collect();

    Ok(AvailableAssessmentListResponse { items, pagination })
}
