//! 题库存储操作

use std::collections::{HashMap, HashSet};

use super::SeaOrmStorage;
use crate::entity::prelude::*;
use crate::entity::{assessment_questions, assessments, categories, questions};
use crate::errors::{PortalError, Result};
use crate::models::{
    PaginationInfo,
    catalog::{
        entities::{Assessment, AssessmentPaper, Category, PaperQuestion, Question},
        requests::{AvailableAssessmentQuery, CreateAssessmentRequest, CreateQuestionRequest},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建分类
    pub async fn create_category_impl(&self, name: &str) -> Result<Category> {
        let now = chrono::Utc::now().timestamp();

        let model = CategoryActiveModel {
            name: Set(name.to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("创建分类失败: {e}")))?;

        Ok(result.into_category())
    }

    /// 通过名称获取分类
    pub async fn get_category_by_name_impl(&self, name: &str) -> Result<Option<Category>> {
        let result = Categories::find()
            .filter(categories::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询分类失败: {e}")))?;

        Ok(result.map(|m| m.into_category()))
    }

    /// 通过ID获取分类
    pub async fn get_category_by_id_impl(&self, category_id: i64) -> Result<Option<Category>> {
        let result = Categories::find_by_id(category_id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询分类失败: {e}")))?;

        Ok(result.map(|m| m.into_category()))
    }

    /// 分类是否被题目或测评引用
    pub async fn category_in_use_impl(&self, category_id: i64) -> Result<bool> {
        let question_refs = Questions::find()
            .filter(questions::Column::CategoryId.eq(category_id))
            .count(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询分类引用失败: {e}")))?;

        if question_refs > 0 {
            return Ok(true);
        }

        let assessment_refs = Assessments::find()
            .filter(assessments::Column::CategoryId.eq(category_id))
            .count(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询分类引用失败: {e}")))?;

        Ok(assessment_refs > 0)
    }

    /// 删除分类
    pub async fn delete_category_impl(&self, category_id: i64) -> Result<bool> {
        let result = Categories::delete_by_id(category_id)
            .exec(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("删除分类失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 创建题目
    pub async fn create_question_impl(&self, req: CreateQuestionRequest) -> Result<Question> {
        let now = chrono::Utc::now().timestamp();
        let options = serde_json::to_string(&req.options)?;

        let model = QuestionActiveModel {
            category_id: Set(req.category_id),
            prompt: Set(req.prompt),
            options: Set(options),
            correct_option: Set(req.correct_option),
            difficulty: Set(req.difficulty.unwrap_or_default().to_string()),
            time_allowance: Set(req.time_allowance.unwrap_or(60)),
            marks: Set(req.marks.unwrap_or(1)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("创建题目失败: {e}")))?;

        Ok(result.into_question())
    }

    /// 通过 ID 获取题目
    pub async fn get_question_by_id_impl(&self, question_id: i64) -> Result<Option<Question>> {
        let result = Questions::find_by_id(question_id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询题目失败: {e}")))?;

        Ok(result.map(|m| m.into_question()))
    }

    /// 启用/停用题目
    pub async fn set_question_active_impl(&self, question_id: i64, active: bool) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = Questions::update_many()
            .col_expr(
                questions::Column::IsActive,
                sea_orm::sea_query::Expr::value(active),
            )
            .col_expr(
                questions::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(questions::Column::Id.eq(question_id))
            .exec(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("更新题目状态失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 创建测评
    pub async fn create_assessment_impl(&self, req: CreateAssessmentRequest) -> Result<Assessment> {
        let now = chrono::Utc::now().timestamp();

        let model = AssessmentActiveModel {
            category_id: Set(req.category_id),
            title: Set(req.title),
            description: Set(req.description),
            duration_minutes: Set(req.duration_minutes),
            total_marks: Set(req.total_marks),
            pass_percentage: Set(req.pass_percentage),
            start_at: Set(req.start_at.map(|dt| dt.timestamp())),
            end_at: Set(req.end_at.map(|dt| dt.timestamp())),
            is_active: Set(true),
            allow_multiple_attempts: Set(req.allow_multiple_attempts),
            show_results_immediately: Set(req.show_results_immediately),
            show_correct_answers: Set(req.show_correct_answers),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("创建测评失败: {e}")))?;

        Ok(result.into_assessment())
    }

    /// 通过 ID 获取测评
    pub async fn get_assessment_by_id_impl(&self, assessment_id: i64) -> Result<Option<Assessment>> {
        let result = Assessments::find_by_id(assessment_id)
            .one(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询测评失败: {e}")))?;

        Ok(result.map(|m| m.into_assessment()))
    }

    /// 按顺序追加题目，位置从当前最大位置之后开始
    pub async fn attach_questions_impl(
        &self,
        assessment_id: i64,
        question_ids: &[i64],
    ) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| PortalError::database_operation(format!("开启事务失败: {e}")))?;

        let max_position = AssessmentQuestions::find()
            .filter(assessment_questions::Column::AssessmentId.eq(assessment_id))
            .select_only()
            .column_as(assessment_questions::Column::Position.max(), "max_position")
            .into_tuple::<Option<i32>>()
            .one(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询题目位置失败: {e}")))?
            .flatten()
            .unwrap_or(0);

        for (offset, question_id) in question_ids.iter().enumerate() {
            let model = AssessmentQuestionActiveModel {
                assessment_id: Set(assessment_id),
                question_id: Set(*question_id),
                position: Set(max_position + offset as i32 + 1),
                ..Default::default()
            };
            model
                .insert(&txn)
                .await
                .map_err(|e| PortalError::database_operation(format!("关联题目失败: {e}")))?;
        }

        Assessments::update_many()
            .col_expr(
                assessments::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(chrono::Utc::now().timestamp()),
            )
            .filter(assessments::Column::Id.eq(assessment_id))
            .exec(&txn)
            .await
            .map_err(|e| PortalError::database_operation(format!("更新测评失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| PortalError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(())
    }

    /// 测评中已关联的题目 ID（按位置排序）
    pub async fn list_assessment_question_ids_impl(&self, assessment_id: i64) -> Result<Vec<i64>> {
        AssessmentQuestions::find()
            .filter(assessment_questions::Column::AssessmentId.eq(assessment_id))
            .order_by_asc(assessment_questions::Column::Position)
            .select_only()
            .column(assessment_questions::Column::QuestionId)
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询测评题目失败: {e}")))
    }

    /// 软删除测评
    pub async fn soft_delete_assessment_impl(&self, assessment_id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();
        let result = Assessments::update_many()
            .col_expr(
                assessments::Column::DeletedAt,
                sea_orm::sea_query::Expr::value(Some(now)),
            )
            .col_expr(
                assessments::Column::UpdatedAt,
                sea_orm::sea_query::Expr::value(now),
            )
            .filter(assessments::Column::Id.eq(assessment_id))
            .filter(assessments::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("删除测评失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 加载测评试卷：测评、分类名和按位置排序的题目
    pub async fn get_assessment_paper_impl(
        &self,
        assessment_id: i64,
    ) -> Result<Option<AssessmentPaper>> {
        let Some(assessment) = self.get_assessment_by_id_impl(assessment_id).await? else {
            return Ok(None);
        };

        let rows = AssessmentQuestions::find()
            .filter(assessment_questions::Column::AssessmentId.eq(assessment_id))
            .order_by_asc(assessment_questions::Column::Position)
            .find_also_related(Questions)
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询测评题目失败: {e}")))?;

        let mut category_ids: HashSet<i64> = rows
            .iter()
            .filter_map(|(_, q)| q.as_ref().map(|q| q.category_id))
            .collect();
        if let Some(category_id) = assessment.category_id {
            category_ids.insert(category_id);
        }

        let category_names: HashMap<i64, String> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            Categories::find()
                .filter(categories::Column::Id.is_in(category_ids))
                .all(&self.db)
                .await
                .map_err(|e| PortalError::database_operation(format!("查询分类失败: {e}")))?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect()
        };

        let questions = rows
            .into_iter()
            .filter_map(|(link, question)| {
                let question = question?;
                Some(PaperQuestion {
                    position: link.position,
                    category_name: category_names
                        .get(&question.category_id)
                        .cloned()
                        .unwrap_or_default(),
                    question: question.into_question(),
                })
            })
            .collect();

        let category_name = assessment
            .category_id
            .and_then(|id| category_names.get(&id).cloned());

        Ok(Some(AssessmentPaper {
            assessment,
            category_name,
            questions,
        }))
    }

    /// 分页列出启用、未删除且在开放时间内的测评
    pub async fn list_available_assessments_impl(
        &self,
        query: AvailableAssessmentQuery,
    ) -> Result<(Vec<Assessment>, PaginationInfo)> {
        let page = query.page.unwrap_or(1).max(1) as u64;
        let size = query.size.unwrap_or(10).clamp(1, 100) as u64;
        let now = query.now.timestamp();

        let mut select = Assessments::find()
            .filter(assessments::Column::IsActive.eq(true))
            .filter(assessments::Column::DeletedAt.is_null())
            .filter(
                Condition::any()
                    .add(assessments::Column::StartAt.is_null())
                    .add(assessments::Column::StartAt.lte(now)),
            )
            .filter(
                Condition::any()
                    .add(assessments::Column::EndAt.is_null())
                    .add(assessments::Column::EndAt.gte(now)),
            );

        // 分类筛选
        if let Some(category_id) = query.category_id {
            select = select.filter(assessments::Column::CategoryId.eq(category_id));
        }

        // 搜索条件
        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(assessments::Column::Title.contains(&escaped));
        }

        select = select
            .order_by_desc(assessments::Column::CreatedAt)
            .order_by_desc(assessments::Column::Id);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| PortalError::database_operation(format!("查询测评总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| PortalError::database_operation(format!("查询测评页数失败: {e}")))?;

        let items = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询测评列表失败: {e}")))?;

        Ok((
            items.into_iter().map(|m| m.into_assessment()).collect(),
            PaginationInfo::new(page, size, total, pages),
        ))
    }

    /// 各测评的启用题目数
    pub async fn count_active_questions_impl(
        &self,
        assessment_ids: &[i64],
    ) -> Result<HashMap<i64, i64>> {
        if assessment_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = AssessmentQuestions::find()
            .select_only()
            .column(assessment_questions::Column::AssessmentId)
            .column_as(assessment_questions::Column::Id.count(), "question_count")
            .join(
                sea_orm::JoinType::InnerJoin,
                assessment_questions::Relation::Question.def(),
            )
            .filter(assessment_questions::Column::AssessmentId.is_in(assessment_ids.to_vec()))
            .filter(questions::Column::IsActive.eq(true))
            .group_by(assessment_questions::Column::AssessmentId)
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("统计测评题目数失败: {e}")))?;

        Ok(rows.into_iter().collect())
    }

    /// 测评总数
    pub async fn count_assessments_impl(&self) -> Result<u64> {
        Assessments::find()
            .count(&self.db)
            .await
            .map_err(|e| PortalError::database_operation(format!("查询测评总数失败: {e}")))
    }
}

