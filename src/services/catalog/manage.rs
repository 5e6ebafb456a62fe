use std::collections::HashSet;

use tracing::info;

use super::CatalogService;
use super::paper::invalidate_paper;
use crate::errors::{PortalError, Result};
use crate::models::catalog::entities::{Assessment, Category, Question};
use crate::models::catalog::requests::{
    CreateAssessmentRequest, CreateCategoryRequest, CreateQuestionRequest,
};
use crate::utils::validate::{validate_assessment, validate_category, validate_question};

pub async fn create_category(
    service: &CatalogService,
    req: CreateCategoryRequest,
) -> Result<Category> {
    validate_category(&req).map_err(PortalError::validation)?;
    let storage = service.storage();
    let name = req.name.trim();

    if storage.get_category_by_name(name).await?.is_some() {
        return Err(PortalError::validation(format!("分类 {name} 已存在")));
    }

    let category = storage.create_category(name).await?;
    info!("Category {} created (id {})", category.name, category.id);
    Ok(category)
}

/// 仍被题目或测评引用的分类不能删除
pub async fn delete_category(service: &CatalogService, category_id: i64) -> Result<()> {
    let storage = service.storage();
    if storage.get_category_by_id(category_id).await?.is_none() {
        return Err(PortalError::not_found(format!("分类 {category_id} 不存在")));
    }
    if storage.category_in_use(category_id).await? {
        return Err(PortalError::invalid_transition(format!(
            "分类 {category_id} 仍被题目或测评引用"
        )));
    }
    storage.delete_category(category_id).await?;
    info!("Category {} deleted", category_id);
    Ok(())
}

pub async fn create_question(
    service: &CatalogService,
    req: CreateQuestionRequest,
) -> Result<Question> {
    validate_question(&req).map_err(PortalError::validation)?;
    let storage = service.storage();

    if storage.get_category_by_id(req.category_id).await?.is_none() {
        return Err(PortalError::validation(format!(
            "分类 {} 不存在",
            req.category_id
        )));
    }

    storage.create_question(req).await
}

pub async fn set_question_active(
    service: &CatalogService,
    question_id: i64,
    active: bool,
) -> Result<()> {
    if !service
        .storage()
        .set_question_active(question_id, active)
        .await?
    {
        return Err(PortalError::not_found(format!("题目 {question_id} 不存在")));
    }
    // 题目可能出现在多份试卷中
    service.cache().invalidate_all().await;
    info!("Question {} active flag set to {}", question_id, active);
    Ok(())
}

pub async fn create_assessment(
    service: &CatalogService,
    req: CreateAssessmentRequest,
) -> Result<Assessment> {
    validate_assessment(&req).map_err(PortalError::validation)?;
    let storage = service.storage();

    if let Some(category_id) = req.category_id
        && storage.get_category_by_id(category_id).await?.is_none()
    {
        return Err(PortalError::validation(format!("分类 {category_id} 不存在")));
    }

    let assessment = storage.create_assessment(req).await?;
    info!(
        "Assessment {} created (id {})",
        assessment.title, assessment.id
    );
    Ok(assessment)
}

/// 按给定顺序追加题目，已在试卷中的题目或重复的题目会被拒绝
pub async fn attach_questions(
    service: &CatalogService,
    assessment_id: i64,
    question_ids: &[i64],
) -> Result<()> {
    let storage = service.storage();

    match storage.get_assessment_by_id(assessment_id).await? {
        Some(assessment) if !assessment.is_deleted() => {}
        _ => {
            return Err(PortalError::not_found(format!(
                "测评 {assessment_id} 不存在"
            )));
        }
    }

    if question_ids.is_empty() {
        return Err(PortalError::validation("至少需要一道题目"));
    }

    let mut seen: HashSet<i64> = storage
        .list_assessment_question_ids(assessment_id)
        .await?
        .into_iter()
        .collect();
    for id in question_ids {
        if !seen.insert(*id) {
            return Err(PortalError::validation(format!(
                "题目 {id} 重复加入测评 {assessment_id}"
            )));
        }
    }

    for id in question_ids {
        if storage.get_question_by_id(*id).await?.is_none() {
            return Err(PortalError::validation(format!("题目 {id} 不存在")));
        }
    }

    storage.attach_questions(assessment_id, question_ids).await?;
    invalidate_paper(service, assessment_id).await;
    Ok(())
}

pub async fn delete_assessment(service: &CatalogService, assessment_id: i64) -> Result<()> {
    if !service
        .storage()
        .soft_delete_assessment(assessment_id)
        .await?
    {
        return Err(PortalError::not_found(format!(
            "测评 {assessment_id} 不存在"
        )));
    }
    invalidate_paper(service, assessment_id).await;
    info!("Assessment {} soft-deleted", assessment_id);
    Ok(())
}
