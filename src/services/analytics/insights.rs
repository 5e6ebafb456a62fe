//! 学习情况分析

use std::collections::{BTreeMap, HashMap};

use crate::models::analytics::entities::PerformanceAnalytics;
use crate::models::analytics::responses::{
    CategoryPerformance, PerformanceDashboard, TimeManagementInsights, TopicSummaryItem,
};
use crate::models::attempts::entities::{PassStatus, Session, SessionStatus, round2};
use crate::models::attempts::responses::AttemptSummary;

const WEAKNESS_BELOW: f64 = 60.0;
const STRENGTH_ABOVE: f64 = 80.0;
const SUMMARY_LIMIT: usize = 5;
const RECENT_ATTEMPTS: usize = 5;
const SKIPPED_WARNING: i32 = 10;

fn summary_item(row: &PerformanceAnalytics) -> TopicSummaryItem {
    TopicSummaryItem {
        category: row.category.clone(),
        difficulty: row.difficulty,
        accuracy_percentage: row.accuracy_percentage,
        total_questions: row.total_questions,
        weak_topics: row.weak_topics.clone(),
        strong_topics: row.strong_topics.clone(),
    }
}

/// 正确率低于 60% 的统计行，由低到高
pub fn weakness_summary(rows: &[PerformanceAnalytics]) -> Vec<TopicSummaryItem> {
    let mut weak: Vec<&PerformanceAnalytics> = rows
        .iter()
        .filter(|r| r.accuracy_percentage < WEAKNESS_BELOW)
        .collect();
    weak.sort_by(|a, b| a.accuracy_percentage.total_cmp(&b.accuracy_percentage));
    weak.into_iter().take(SUMMARY_LIMIT).map(summary_item).collect()
}

/// 正确率高于 80% 的统计行，由高到低
pub fn strength_summary(rows: &[PerformanceAnalytics]) -> Vec<TopicSummaryItem> {
    let mut strong: Vec<&PerformanceAnalytics> = rows
        .iter()
        .filter(|r| r.accuracy_percentage > STRENGTH_ABOVE)
        .collect();
    strong.sort_by(|a, b| b.accuracy_percentage.total_cmp(&a.accuracy_percentage));
    strong.into_iter().take(SUMMARY_LIMIT).map(summary_item).collect()
}

pub fn time_management(rows: &[PerformanceAnalytics]) -> TimeManagementInsights {
    if rows.is_empty() {
        return TimeManagementInsights {
            avg_time_per_question: 0.0,
            questions_too_slow: 0,
            questions_too_fast: 0,
            questions_skipped: 0,
            recommendation: "Start taking assessments to get personalized recommendations."
                .to_string(),
        };
    }

    let avg = rows.iter().map(|r| r.avg_time_per_question).sum::<f64>() / rows.len() as f64;
    let slow: i32 = rows.iter().map(|r| r.questions_too_slow).sum();
    let fast: i32 = rows.iter().map(|r| r.questions_too_fast).sum();
    let skipped: i32 = rows.iter().map(|r| r.questions_skipped).sum();

    let recommendation = if slow > fast * 2 {
        "You tend to spend too much time on difficult questions. Consider moving on and returning to them later."
    } else if fast > slow * 2 {
        "You're answering questions very quickly. Take more time to read and understand each question."
    } else if skipped > SKIPPED_WARNING {
        "You're skipping many questions. Try to attempt all questions as there's no negative marking."
    } else {
        "Your time management is good. Keep practicing to maintain consistency."
    };

    TimeManagementInsights {
        avg_time_per_question: round2(avg),
        questions_too_slow: slow,
        questions_too_fast: fast,
        questions_skipped: skipped,
        recommendation: recommendation.to_string(),
    }
}

/// 测评的展示信息: (分类名, 是否公布成绩)
#[derive(Debug, Clone)]
pub struct AssessmentLabel {
    pub category: String,
    pub show_results: bool,
}

/// 成绩总览
///
/// `completed` 为按时间倒序的已完成会话。未公布成绩的会话只计入完成次数和待公布次数。
pub fn performance_dashboard(
    completed: &[Session],
    labels: &HashMap<i64, AssessmentLabel>,
) -> PerformanceDashboard {
    let show_results = |s: &Session| {
        labels
            .get(&s.assessment_id)
            .map(|l| l.show_results)
            .unwrap_or(true)
    };

    let graded: Vec<&Session> = completed
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .collect();
    let visible: Vec<&Session> = graded
        .iter()
        .copied()
        .filter(|s| show_results(*s))
        .collect();

    let count = visible.len() as i64;
    let passed = visible
        .iter()
        .filter(|s| s.pass_status == Some(PassStatus::Pass))
        .count() as i64;
    let average = if count > 0 {
        round2(visible.iter().map(|s| s.percentage).sum::<f64>() / count as f64)
    } else {
        0.0
    };
    let pass_rate = if count > 0 {
        round2(passed as f64 / count as f64 * 100.0)
    } else {
        0.0
    };

    // 分类名 -> (次数, 通过, 百分比之和)
    let mut by_category: BTreeMap<String, (i64, i64, f64)> = BTreeMap::new();
    for session in &visible {
        let category = labels
            .get(&session.assessment_id)
            .map(|l| l.category.clone())
            .unwrap_or_default();
        let entry = by_category.entry(category).or_insert((0, 0, 0.0));
        entry.0 += 1;
        if session.pass_status == Some(PassStatus::Pass) {
            entry.1 += 1;
        }
        entry.2 += session.percentage;
    }

    let categories = by_category
        .into_iter()
        .map(|(category, (attempts, passed, sum))| CategoryPerformance {
            category,
            attempts,
            passed,
            average_percentage: round2(sum / attempts as f64),
        })
        .collect();

    let recent_attempts = graded
        .iter()
        .take(RECENT_ATTEMPTS)
        .map(|s| AttemptSummary::from_session(s, show_results(*s)))
        .collect();

    PerformanceDashboard {
        completed_assessments: graded.len() as i64,
        pending_results: graded.len() as i64 - count,
        passed,
        failed: count - passed,
        average_percentage: average,
        pass_rate,
        categories,
        recent_attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::entities::Difficulty;
    use chrono::{Duration, TimeZone, Utc};

    fn row(category: &str, accuracy: f64) -> PerformanceAnalytics {
        PerformanceAnalytics {
            id: 1,
            student_id: 1,
            assessment_id: Some(1),
            category: category.to_string(),
            difficulty: Difficulty::Medium,
            total_questions: 10,
            correct_answers: 0,
            incorrect_answers: 0,
            accuracy_percentage: accuracy,
            avg_time_per_question: 30.0,
            questions_too_slow: 0,
            questions_too_fast: 0,
            questions_skipped: 0,
            common_mistakes: vec![],
            weak_topics: vec![],
            strong_topics: vec![],
            improvement_rate: 0.0,
            consistency_score: 0.0,
            streak_correct: 0,
            max_streak: 0,
            study_time_minutes: 0,
            last_activity_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn completed(id: i64, assessment_id: i64, percentage: f64, pass: bool) -> Session {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap() + Duration::hours(id);
        Session {
            id,
            student_id: 7,
            assessment_id,
            start_time: start,
            end_time: Some(start),
            submit_time: Some(start),
            status: SessionStatus::Completed,
            total_marks: 10,
            obtained_marks: (percentage / 10.0) as i32,
            percentage,
            pass_status: Some(if pass { PassStatus::Pass } else { PassStatus::Fail }),
            pass_percentage: 50.0,
            duration_minutes: 30,
            time_taken: Some(600),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn weakness_is_sorted_ascending_and_limited() {
        let rows: Vec<_> = [55.0, 20.0, 90.0, 59.99, 10.0, 40.0, 30.0, 60.0]
            .iter()
            .enumerate()
            .map(|(i, acc)| row(&format!("C{i}"), *acc))
            .collect();
        let weak = weakness_summary(&rows);
        let accs: Vec<f64> = weak.iter().map(|w| w.accuracy_percentage).collect();
        assert_eq!(accs, vec![10.0, 20.0, 30.0, 40.0, 55.0]);
    }

    #[test]
    fn strength_is_sorted_descending() {
        let rows = vec![row("A", 85.0), row("B", 80.0), row("C", 99.5)];
        let strong = strength_summary(&rows);
        let names: Vec<&str> = strong.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["C", "A"]);
    }

    #[test]
    fn time_recommendations() {
        assert!(time_management(&[]).recommendation.starts_with("Start taking"));

        let mut slow = row("A", 50.0);
        slow.questions_too_slow = 5;
        slow.questions_too_fast = 2;
        assert!(time_management(&[slow]).recommendation.contains("too much time"));

        let mut fast = row("A", 50.0);
        fast.questions_too_fast = 5;
        fast.questions_too_slow = 2;
        assert!(time_management(&[fast]).recommendation.contains("very quickly"));

        let mut skipping = row("A", 50.0);
        skipping.questions_skipped = 11;
        assert!(time_management(&[skipping]).recommendation.contains("skipping"));

        let balanced = row("A", 50.0);
        let insights = time_management(&[balanced.clone(), balanced]);
        assert!(insights.recommendation.contains("good"));
        assert_eq!(insights.avg_time_per_question, 30.0);
    }

    #[test]
    fn dashboard_aggregates_by_category() {
        let sessions = vec![
            completed(3, 2, 40.0, false),
            completed(2, 1, 80.0, true),
            completed(1, 1, 60.0, true),
        ];
        let mut labels = HashMap::new();
        labels.insert(
            1,
            AssessmentLabel {
                category: "Aptitude".into(),
                show_results: true,
            },
        );
        labels.insert(
            2,
            AssessmentLabel {
                category: "Reasoning".into(),
                show_results: true,
            },
        );

        let dashboard = performance_dashboard(&sessions, &labels);
        assert_eq!(dashboard.completed_assessments, 3);
        assert_eq!(dashboard.pending_results, 0);
        assert_eq!(dashboard.passed, 2);
        assert_eq!(dashboard.failed, 1);
        assert_eq!(dashboard.average_percentage, 60.0);
        assert_eq!(dashboard.pass_rate, 66.67);

        let aptitude = &dashboard.categories[0];
        assert_eq!(aptitude.category, "Aptitude");
        assert_eq!(aptitude.attempts, 2);
        assert_eq!(aptitude.average_percentage, 70.0);
        assert_eq!(dashboard.categories[1].category, "Reasoning");
    }

    #[test]
    fn dashboard_keeps_unpublished_scores_out_of_totals() {
        let sessions = vec![
            completed(3, 2, 100.0, true),
            completed(2, 1, 80.0, true),
            completed(1, 1, 40.0, false),
        ];
        let mut labels = HashMap::new();
        labels.insert(
            1,
            AssessmentLabel {
                category: "Aptitude".into(),
                show_results: true,
            },
        );
        labels.insert(
            2,
            AssessmentLabel {
                category: "Reasoning".into(),
                show_results: false,
            },
        );

        let dashboard = performance_dashboard(&sessions, &labels);
        assert_eq!(dashboard.completed_assessments, 3);
        assert_eq!(dashboard.pending_results, 1);
        assert_eq!(dashboard.passed, 1);
        assert_eq!(dashboard.failed, 1);
        assert_eq!(dashboard.average_percentage, 60.0);
        assert_eq!(dashboard.pass_rate, 50.0);
        assert_eq!(dashboard.categories.len(), 1);
        assert_eq!(dashboard.categories[0].category, "Aptitude");

        assert_eq!(dashboard.recent_attempts[0].percentage, None);
        assert_eq!(dashboard.recent_attempts[1].percentage, Some(80.0));
    }

    #[test]
    fn empty_dashboard() {
        let dashboard = performance_dashboard(&[], &HashMap::new());
        assert_eq!(dashboard.completed_assessments, 0);
        assert_eq!(dashboard.pass_rate, 0.0);
        assert!(dashboard.categories.is_empty());
    }
}
