//! 评分
//!
//! 单题判分和整卷汇总都是纯函数，会话状态由调用方负责。

use crate::models::attempts::entities::{GradeOutcome, StudentAnswer};
use crate::models::catalog::entities::Question;
use crate::utils::validate::parse_option_index;

/// 单题判分结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEvaluation {
    /// 规范化后的作答；None 表示未作答
    pub normalized: Option<String>,
    pub is_correct: bool,
    pub marks_obtained: i32,
}

impl AnswerEvaluation {
    fn skipped() -> Self {
        Self {
            normalized: None,
            is_correct: false,
            marks_obtained: 0,
        }
    }
}

/// 判定单题作答
///
/// 合法选项统一存为下标文本（"C" 存为 "2"）；无法识别或越界的作答原样保存并判错。
pub fn evaluate_answer(question: &Question, submitted: Option<&str>) -> AnswerEvaluation {
    let raw = match submitted.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return AnswerEvaluation::skipped(),
    };

    match parse_option_index(raw).filter(|index| *index < question.options.len()) {
        Some(index) => {
            let is_correct = question.is_correct_index(index);
            AnswerEvaluation {
                normalized: Some(index.to_string()),
                is_correct,
                marks_obtained: if is_correct { question.marks.max(0) } else { 0 },
            }
        }
        None => AnswerEvaluation {
            normalized: Some(raw.to_string()),
            is_correct: false,
            marks_obtained: 0,
        },
    }
}

/// 按已保存的作答汇总成绩
pub fn grade_answers(answers: &[StudentAnswer], total_marks: i32, pass_percentage: f64) -> GradeOutcome {
    let obtained: i32 = answers.iter().map(|a| a.marks_obtained).sum();
    GradeOutcome::compute(obtained, total_marks, pass_percentage)
}
