//! 题库初始化
//!
//! 测评表为空时从 JSON 文件导入分类、题目和测评。

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use super::{CatalogService, manage};
use crate::errors::{PortalError, Result};
use crate::models::catalog::requests::{CreateAssessmentRequest, CreateQuestionRequest};
use crate::models::catalog::seed::CatalogSeed;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SeedReport {
    pub skipped: bool,
    pub categories: usize,
    pub questions: usize,
    pub assessments: usize,
}

pub fn load_seed_file(path: impl AsRef<Path>) -> Result<CatalogSeed> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        PortalError::file_operation(format!("读取题库文件 {} 失败: {e}", path.display()))
    })?;
    Ok(serde_json::from_str(&content)?)
}

async fn ensure_category(
    service: &CatalogService,
    ids: &mut HashMap<String, i64>,
    report: &mut SeedReport,
    name: &str,
) -> Result<i64> {
    let name = name.trim();
    if let Some(id) = ids.get(name) {
        return Ok(*id);
    }
    let id = match service.storage().get_category_by_name(name).await? {
        Some(existing) => existing.id,
        None => {
            let created = service.storage().create_category(name).await?;
            report.categories += 1;
            created.id
        }
    };
    ids.insert(name.to_string(), id);
    Ok(id)
}

pub async fn apply_seed(service: &CatalogService, seed: CatalogSeed) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let existing = service.storage().count_assessments().await?;
    if existing > 0 {
        info!(
            "Catalog already has {} assessment(s), skipping seed",
            existing
        );
        report.skipped = true;
        return Ok(report);
    }

    let mut category_ids: HashMap<String, i64> = HashMap::new();
    for name in &seed.categories {
        if name.trim().is_empty() {
            warn!("Skipping blank category name in seed file");
            continue;
        }
        ensure_category(service, &mut category_ids, &mut report, name).await?;
    }

    // 文件内的题目键 -> (题目ID, 分值)
    let mut questions: HashMap<String, (i64, i32)> = HashMap::new();
    for q in seed.questions {
        if questions.contains_key(&q.key) {
            return Err(PortalError::validation(format!(
                "题库文件中题目键 {} 重复",
                q.key
            )));
        }
        let category_id =
            ensure_category(service, &mut category_ids, &mut report, &q.category).await?;
        let created = manage::create_question(
            service,
            CreateQuestionRequest {
                category_id,
                prompt: q.prompt,
                options: q.options,
                correct_option: q.correct_option,
                difficulty: q.difficulty,
                time_allowance: q.time_allowance,
                marks: q.marks,
            },
        )
        .await?;
        questions.insert(q.key, (created.id, created.marks));
        report.questions += 1;
    }

    for a in seed.assessments {
        let mut question_ids = Vec::with_capacity(a.questions.len());
        let mut marks_sum = 0;
        for key in &a.questions {
            let (id, marks) = questions.get(key).copied().ok_or_else(|| {
                PortalError::validation(format!("测评 {} 引用了未知题目 {key}", a.title))
            })?;
            question_ids.push(id);
            marks_sum += marks;
        }

        let category_id = match a.category.as_deref() {
            Some(name) if !name.trim().is_empty() => {
                Some(ensure_category(service, &mut category_ids, &mut report, name).await?)
            }
            _ => None,
        };

        let assessment = manage::create_assessment(
            service,
            CreateAssessmentRequest {
                category_id,
                title: a.title,
                description: a.description,
                duration_minutes: a.duration_minutes,
                total_marks: a.total_marks.unwrap_or(marks_sum),
                pass_percentage: a.pass_percentage,
                start_at: None,
                end_at: None,
                allow_multiple_attempts: a.allow_multiple_attempts,
                show_results_immediately: true,
                show_correct_answers: a.show_correct_answers,
            },
        )
        .await?;

        if !question_ids.is_empty() {
            manage::attach_questions(service, assessment.id, &question_ids).await?;
        }
        report.assessments += 1;
    }

    info!(
        "Catalog seeded: {} categories, {} questions, {} assessments",
        report.categories, report.questions, report.assessments
    );
    Ok(report)
}
