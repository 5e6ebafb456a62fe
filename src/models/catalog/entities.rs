use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 未设置分类的测评在统计中归入该分类
pub const DEFAULT_CATEGORY_NAME: &str = "General";

// 题目难度
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const EASY: &'static str = "easy";
    pub const MEDIUM: &'static str = "medium";
    pub const HARD: &'static str = "hard";
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "{}", Difficulty::EASY),
            Difficulty::Medium => write!(f, "{}", Difficulty::MEDIUM),
            Difficulty::Hard => write!(f, "{}", Difficulty::HARD),
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    // 兼容历史数据中的大小写混用（"Medium"、"HARD"）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            Difficulty::EASY => Ok(Difficulty::Easy),
            Difficulty::MEDIUM => Ok(Difficulty::Medium),
            Difficulty::HARD => Ok(Difficulty::Hard),
            _ => Err(format!("Invalid difficulty: {s}")),
        }
    }
}

// 分类实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// 题目实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub category_id: i64,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: i32,
    pub difficulty: Difficulty,
    /// 建议作答时间（秒）
    pub time_allowance: i32,
    pub marks: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    /// 判断选项下标是否为正确答案
    pub fn is_correct_index(&self, index: usize) -> bool {
        self.correct_option >= 0 && index == self.correct_option as usize
    }

    pub fn has_valid_answer_key(&self) -> bool {
        self.options.len() >= 2
            && self.correct_option >= 0
            && (self.correct_option as usize) < self.options.len()
    }
}

// 测评实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    pub id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub total_marks: i32,
    pub pass_percentage: f64,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub allow_multiple_attempts: bool,
    pub show_results_immediately: bool,
    pub show_correct_answers: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assessment {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// 是否处于开放时间窗口内（未设置的一端视为不限）
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        let started = self.start_at.is_none_or(|start| start <= now);
        let not_ended = self.end_at.is_none_or(|end| end >= now);
        started && not_ended
    }

    /// 启用、未删除且在时间窗口内
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_deleted() && self.is_within_window(now)
    }
}

// 试卷中的一道题
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperQuestion {
    pub position: i32,
    pub category_name: String,
    pub question: Question,
}

/// 测评试卷：测评本身加上按顺序排列的题目
///
/// 只读快照，会被缓存；目录写操作会使对应缓存失效。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentPaper {
    pub assessment: Assessment,
    pub category_name: Option<String>,
    pub questions: Vec<PaperQuestion>,
}

impl AssessmentPaper {
    pub fn active_questions(&self) -> impl Iterator<Item = &PaperQuestion> {
        self.questions.iter().filter(|q| q.question.is_active)
    }

    pub fn find_question(&self, question_id: i64) -> Option<&PaperQuestion> {
        self.questions.iter().find(|q| q.question.id == question_id)
    }

    /// 统计分组使用的分类名
    pub fn analytics_category(&self) -> &str {
        self.category_name.as_deref().unwrap_or(DEFAULT_CATEGORY_NAME)
    }

    /// 检查测评是否可以开始作答，返回不可用原因
    pub fn readiness(&self, now: DateTime<Utc>) -> Result<(), String> {
        let assessment = &self.assessment;
        if !assessment.is_active || assessment.is_deleted() {
            return Err(format!("测评 {} 未启用", assessment.id));
        }
        if !assessment.is_within_window(now) {
            return Err(format!("测评 {} 不在开放时间内", assessment.id));
        }
        if self.active_questions().next().is_none() {
            return Err(format!("测评 {} 没有可用题目", assessment.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
    }

    fn assessment() -> Assessment {
        Assessment {
            id: 1,
            category_id: None,
            title: "Aptitude".into(),
            description: None,
            duration_minutes: 30,
            total_marks: 10,
            pass_percentage: 50.0,
            start_at: None,
            end_at: None,
            is_active: true,
            allow_multiple_attempts: false,
            show_results_immediately: true,
            show_correct_answers: false,
            deleted_at: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn question(id: i64, active: bool) -> PaperQuestion {
        PaperQuestion {
            position: id as i32,
            category_name: "Quant".into(),
            question: Question {
                id,
                category_id: 1,
                prompt: "2 + 2".into(),
                options: vec!["3".into(), "4".into()],
                correct_option: 1,
                difficulty: Difficulty::Easy,
                time_allowance: 60,
                marks: 5,
                is_active: active,
                created_at: now(),
                updated_at: now(),
            },
        }
    }

    #[test]
    fn difficulty_parses_mixed_case() {
        assert_eq!("Medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!(" HARD ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn window_is_inclusive_and_open_ended() {
        let mut a = assessment();
        assert!(a.is_within_window(now()));
        a.start_at = Some(now());
        a.end_at = Some(now());
        assert!(a.is_within_window(now()));
        a.start_at = Some(now() + Duration::minutes(1));
        assert!(!a.is_within_window(now()));
    }

    #[test]
    fn paper_without_active_questions_is_not_ready() {
        let paper = AssessmentPaper {
            assessment: assessment(),
            category_name: None,
            questions: vec![question(1, false)],
        };
        assert!(paper.readiness(now()).is_err());
        assert_eq!(paper.analytics_category(), DEFAULT_CATEGORY_NAME);
    }

    #[test]
    fn soft_deleted_assessment_is_not_ready() {
        let mut a = assessment();
        a.deleted_at = Some(now());
        let paper = AssessmentPaper {
            assessment: a,
            category_name: Some("Aptitude".into()),
            questions: vec![question(1, true)],
        };
        assert!(paper.readiness(now()).is_err());
    }

    #[test]
    fn answer_key_bounds() {
        let mut q = question(1, true).question;
        assert!(q.has_valid_answer_key());
        q.correct_option = 2;
        assert!(!q.has_valid_answer_key());
        assert!(!q.is_correct_index(1));
    }
}
