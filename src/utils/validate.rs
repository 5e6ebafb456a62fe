use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::catalog::requests::{
    CreateAssessmentRequest, CreateCategoryRequest, CreateQuestionRequest,
};

static OPTION_INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}$").expect("Invalid option index regex"));

static OPTION_LETTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]$").expect("Invalid option letter regex"));

/// 解析学生提交的选项
///
/// 接受从 0 开始的下标（"2"）或选项字母（"C"，不区分大小写），两端空白会被忽略。
/// 无法解析时返回 None。
pub fn parse_option_index(raw: &str) -> Option<usize> {
    let value = raw.trim();
    if OPTION_INDEX_RE.is_match(value) {
        return value.parse().ok();
    }
    if OPTION_LETTER_RE.is_match(value) {
        let letter = value.chars().next()?.to_ascii_uppercase();
        return Some((letter as u8 - b'A') as usize);
    }
    None
}

pub fn validate_category(req: &CreateCategoryRequest) -> Result<(), &'static str> {
    let name = req.name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err("Category name length must be between 1 and 100 characters");
    }
    Ok(())
}

pub fn validate_question(req: &CreateQuestionRequest) -> Result<(), &'static str> {
    if req.prompt.trim().is_empty() {
        return Err("Question prompt must not be empty");
    }
    // 选项字母最多到 Z
    if req.options.len() < 2 || req.options.len() > 26 {
        return Err("A question must have between 2 and 26 options");
    }
    if req.options.iter().any(|o| o.trim().is_empty()) {
        return Err("Question options must not be empty");
    }
    if req.correct_option < 0 || req.correct_option as usize >= req.options.len() {
        return Err("Correct option index is out of range");
    }
    if req.time_allowance.is_some_and(|t| t <= 0) {
        return Err("Time allowance must be positive");
    }
    if req.marks.is_some_and(|m| m <= 0) {
        return Err("Question marks must be positive");
    }
    Ok(())
}

pub fn validate_assessment(req: &CreateAssessmentRequest) -> Result<(), &'static str> {
    let title = req.title.trim();
    if title.is_empty() || title.chars().count() > 200 {
        return Err("Assessment title length must be between 1 and 200 characters");
    }
    if req.duration_minutes <= 0 {
        return Err("Assessment duration must be positive");
    }
    if req.total_marks < 0 {
        return Err("Total marks must not be negative");
    }
    if !(0.0..=100.0).contains(&req.pass_percentage) {
        return Err("Pass percentage must be between 0 and 100");
    }
    if let (Some(start), Some(end)) = (req.start_at, req.end_at)
        && start >= end
    {
        return Err("Assessment start time must be before its end time");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn assessment() -> CreateAssessmentRequest {
        CreateAssessmentRequest {
            category_id: None,
            title: "Quantitative Aptitude".into(),
            description: None,
            duration_minutes: 30,
            total_marks: 10,
            pass_percentage: 50.0,
            start_at: None,
            end_at: None,
            allow_multiple_attempts: false,
            show_results_immediately: true,
            show_correct_answers: false,
        }
    }

    fn question() -> CreateQuestionRequest {
        CreateQuestionRequest {
            category_id: 1,
            prompt: "2 + 2 = ?".into(),
            options: vec!["3".into(), "4".into(), "5".into()],
            correct_option: 1,
            difficulty: None,
            time_allowance: None,
            marks: Some(5),
        }
    }

    #[test]
    fn parses_indices_and_letters() {
        assert_eq!(parse_option_index("2"), Some(2));
        assert_eq!(parse_option_index(" 0 "), Some(0));
        assert_eq!(parse_option_index("C"), Some(2));
        assert_eq!(parse_option_index("c"), Some(2));
        assert_eq!(parse_option_index(""), None);
        assert_eq!(parse_option_index("AB"), None);
        assert_eq!(parse_option_index("-1"), None);
        assert_eq!(parse_option_index("1.5"), None);
    }

    #[test]
    fn question_bounds() {
        assert!(validate_question(&question()).is_ok());

        let mut q = question();
        q.correct_option = 3;
        assert!(validate_question(&q).is_err());

        let mut q = question();
        q.options.truncate(1);
        q.correct_option = 0;
        assert!(validate_question(&q).is_err());

        let mut q = question();
        q.marks = Some(0);
        assert!(validate_question(&q).is_err());
    }

    #[test]
    fn assessment_window_and_percentage() {
        assert!(validate_assessment(&assessment()).is_ok());

        let mut a = assessment();
        a.pass_percentage = 101.0;
        assert!(validate_assessment(&a).is_err());

        let mut a = assessment();
        let now = Utc::now();
        a.start_at = Some(now);
        a.end_at = Some(now - Duration::hours(1));
        assert!(validate_assessment(&a).is_err());

        let mut a = assessment();
        a.duration_minutes = 0;
        assert!(validate_assessment(&a).is_err());
    }

    #[test]
    fn category_name_required() {
        assert!(validate_category(&CreateCategoryRequest { name: "  ".into() }).is_err());
        assert!(validate_category(&CreateCategoryRequest { name: "Reasoning".into() }).is_ok());
    }
}
