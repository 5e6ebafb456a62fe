use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// 答题会话状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    pub const IN_PROGRESS: &'static str = "in_progress";
    pub const COMPLETED: &'static str = "completed";
    pub const ABANDONED: &'static str = "abandoned";

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => SessionStatus::IN_PROGRESS,
            SessionStatus::Completed => SessionStatus::COMPLETED,
            SessionStatus::Abandoned => SessionStatus::ABANDONED,
        }
    }

    /// 状态流转，只允许从 in_progress 流转到终态
    pub fn transition(self, to: SessionStatus) -> Result<SessionStatus, String> {
        match (self, to) {
            (SessionStatus::InProgress, SessionStatus::Completed)
            | (SessionStatus::InProgress, SessionStatus::Abandoned) => Ok(to),
            _ => Err(format!("不允许的状态流转: {self} -> {to}")),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            SessionStatus::IN_PROGRESS => Ok(SessionStatus::InProgress),
            SessionStatus::COMPLETED => Ok(SessionStatus::Completed),
            SessionStatus::ABANDONED => Ok(SessionStatus::Abandoned),
            _ => Err(format!("Invalid session status: {s}")),
        }
    }
}

// 是否通过
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Pass,
    Fail,
}

impl PassStatus {
    pub const PASS: &'static str = "pass";
    pub const FAIL: &'static str = "fail";

    pub fn as_str(&self) -> &'static str {
        match self {
            PassStatus::Pass => PassStatus::PASS,
            PassStatus::Fail => PassStatus::FAIL,
        }
    }
}

impl std::fmt::Display for PassStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PassStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PassStatus::PASS => Ok(PassStatus::Pass),
            PassStatus::FAIL => Ok(PassStatus::Fail),
            _ => Err(format!("Invalid pass status: {s}")),
        }
    }
}

/// 答题会话（一次作答）
///
/// `total_marks`、`pass_percentage`、`duration_minutes` 在开始作答时从测评复制，
/// 之后评分和截止时间判断只使用这里的快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub student_id: i64,
    pub assessment_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub submit_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub total_marks: i32,
    pub obtained_marks: i32,
    pub percentage: f64,
    pub pass_status: Option<PassStatus>,
    pub pass_percentage: f64,
    pub duration_minutes: i32,
    /// 用时（秒）
    pub time_taken: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn duration_seconds(&self) -> i64 {
        i64::from(self.duration_minutes.max(0)) * 60
    }

    pub fn deadline(&self) -> DateTime<Utc> {
        self.start_time + Duration::seconds(self.duration_seconds())
    }

    /// 超过截止时间（含宽限秒数）
    pub fn is_expired(&self, now: DateTime<Utc>, grace_seconds: i64) -> bool {
        now > self.deadline() + Duration::seconds(grace_seconds.max(0))
    }

    pub fn is_owned_by(&self, student_id: i64) -> bool {
        self.student_id == student_id
    }

    /// 服务端计算的用时，截断到 [0, 时长]
    pub fn measured_seconds(&self, now: DateTime<Utc>) -> i32 {
        let elapsed = (now - self.start_time).num_seconds();
        elapsed.clamp(0, self.duration_seconds()) as i32
    }

    /// 格式化用时，如 "12 min 5 sec"
    pub fn formatted_time_taken(&self) -> Option<String> {
        self.time_taken.map(format_seconds)
    }
}

pub fn format_seconds(seconds: i32) -> String {
    let seconds = seconds.max(0);
    let minutes = seconds / 60;
    let rest = seconds % 60;
    if minutes > 0 {
        format!("{minutes} min {rest} sec")
    } else {
        format!("{rest} sec")
    }
}

// 作答记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAnswer {
    pub id: i64,
    pub session_id: i64,
    pub question_id: i64,
    /// 规范化后的选项下标；未作答为 None
    pub student_answer: Option<String>,
    pub is_correct: bool,
    pub marks_obtained: i32,
    pub time_spent: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentAnswer {
    pub fn is_skipped(&self) -> bool {
        self.student_answer.is_none()
    }
}

/// 评分结果
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct GradeOutcome {
    pub obtained_marks: i32,
    pub percentage: f64,
    pub pass_status: PassStatus,
}

impl GradeOutcome {
    /// 由得分计算百分比和是否通过
    ///
    /// 百分比保留两位小数，总分为 0 时记为 0，最高 100。
    pub fn compute(obtained_marks: i32, total_marks: i32, pass_percentage: f64) -> Self {
        let percentage = if total_marks <= 0 {
            0.0
        } else {
            let raw = f64::from(obtained_marks) / f64::from(total_marks) * 100.0;
            round2(raw).clamp(0.0, 100.0)
        };
        let pass_status = if percentage >= pass_percentage {
            PassStatus::Pass
        } else {
            PassStatus::Fail
        };
        Self {
            obtained_marks,
            percentage,
            pass_status,
        }
    }

    /// 从已评分会话中读取存储的结果
    pub fn from_session(session: &Session) -> Option<Self> {
        if session.status != SessionStatus::Completed {
            return None;
        }
        Some(Self {
            obtained_marks: session.obtained_marks,
            percentage: session.percentage,
            pass_status: session.pass_status?,
        })
    }
}

/// 新建会话参数
#[derive(Debug, Clone)]
pub struct NewSession {
    pub student_id: i64,
    pub assessment_id: i64,
    pub start_time: DateTime<Utc>,
    pub total_marks: i32,
    pub pass_percentage: f64,
    pub duration_minutes: i32,
}

/// 作答写入参数（已完成判分）
#[derive(Debug, Clone)]
pub struct AnswerWrite {
    pub session_id: i64,
    pub question_id: i64,
    pub student_answer: Option<String>,
    pub is_correct: bool,
    pub marks_obtained: i32,
    pub time_spent: i32,
}

/// 会话终结参数
#[derive(Debug, Clone)]
pub struct Finalization {
    pub session_id: i64,
    pub time_taken: i32,
    pub finished_at: DateTime<Utc>,
    /// 未作答题目，写入空答案
    pub unanswered_question_ids: Vec<i64>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session() -> Session {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Session {
            id: 1,
            student_id: 7,
            assessment_id: 3,
            start_time: start,
            end_time: None,
            submit_time: None,
            status: SessionStatus::InProgress,
            total_marks: 10,
            obtained_marks: 0,
            percentage: 0.0,
            pass_status: None,
            pass_percentage: 50.0,
            duration_minutes: 30,
            time_taken: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn only_in_progress_can_transition() {
        use SessionStatus::*;
        assert_eq!(InProgress.transition(Completed), Ok(Completed));
        assert_eq!(InProgress.transition(Abandoned), Ok(Abandoned));
        assert!(Completed.transition(InProgress).is_err());
        assert!(Completed.transition(Completed).is_err());
        assert!(Abandoned.transition(Completed).is_err());
        assert!(InProgress.transition(InProgress).is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            SessionStatus::InProgress,
            SessionStatus::Completed,
            SessionStatus::Abandoned,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>(), Ok(status));
        }
        assert!("pending".parse::<SessionStatus>().is_err());
    }

    #[test]
    fn deadline_and_grace() {
        let s = session();
        let deadline = s.deadline();
        assert_eq!(deadline, s.start_time + Duration::minutes(30));
        assert!(!s.is_expired(deadline, 0));
        assert!(s.is_expired(deadline + Duration::seconds(1), 0));
        assert!(!s.is_expired(deadline + Duration::seconds(1), 5));
    }

    #[test]
    fn measured_time_is_clamped_to_duration() {
        let s = session();
        assert_eq!(s.measured_seconds(s.start_time + Duration::seconds(95)), 95);
        assert_eq!(s.measured_seconds(s.start_time + Duration::hours(2)), 1800);
        assert_eq!(s.measured_seconds(s.start_time - Duration::seconds(5)), 0);
    }

    #[test]
    fn formats_time_taken() {
        assert_eq!(format_seconds(725), "12 min 5 sec");
        assert_eq!(format_seconds(42), "42 sec");
        assert_eq!(format_seconds(0), "0 sec");
    }
}
