//! 学习统计聚合
//!
//! 一次评分后，按难度把作答分组，再与已有统计行合并。这里只做计算，读写由服务层完成。

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::models::analytics::entities::{AnalyticsKey, AnalyticsUpsert, PerformanceAnalytics};
use crate::models::attempts::entities::{StudentAnswer, round2};
use crate::models::catalog::entities::{AssessmentPaper, Difficulty, PaperQuestion};

/// 进步率使用的最近记录数
pub const IMPROVEMENT_WINDOW: usize = 5;
/// 稳定度使用的最近记录数
pub const CONSISTENCY_WINDOW: usize = 10;
/// 错题列表保留条数
pub const MISTAKES_LIMIT: usize = 50;

const SLOW_FACTOR: f64 = 1.5;
const FAST_FACTOR: f64 = 0.3;
const WEAK_BELOW: f64 = 50.0;
const STRONG_ABOVE: f64 = 80.0;

/// 带题目信息的作答
#[derive(Debug, Clone, Copy)]
pub struct GradedAnswer<'a> {
    pub question: &'a PaperQuestion,
    pub answer: &'a StudentAnswer,
}

/// 按试卷顺序配对作答与题目，找不到题目的作答被丢弃
pub fn pair_with_paper<'a>(
    paper: &'a AssessmentPaper,
    answers: &'a [StudentAnswer],
) -> Vec<GradedAnswer<'a>> {
    paper
        .questions
        .iter()
        .filter_map(|question| {
            answers
                .iter()
                .find(|a| a.question_id == question.question.id)
                .map(|answer| GradedAnswer { question, answer })
        })
        .collect()
}

/// 按难度分组，组内保持原顺序
pub fn group_by_difficulty<'a>(
    graded: &[GradedAnswer<'a>],
) -> BTreeMap<Difficulty, Vec<GradedAnswer<'a>>> {
    let mut groups: BTreeMap<Difficulty, Vec<GradedAnswer<'a>>> = BTreeMap::new();
    for item in graded {
        groups
            .entry(item.question.question.difficulty)
            .or_default()
            .push(*item);
    }
    groups
}

/// 单次提交中一个难度分组的统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupStats {
    pub total: i32,
    pub correct: i32,
    pub skipped: i32,
    pub time_spent: i64,
    pub too_slow: i32,
    pub too_fast: i32,
    pub ending_streak: i32,
    pub max_streak: i32,
    pub mistakes: Vec<i64>,
    pub weak_topics: Vec<String>,
    pub strong_topics: Vec<String>,
}

impl GroupStats {
    pub fn incorrect(&self) -> i32 {
        self.total - self.correct
    }
}

pub fn summarize_group(answers: &[GradedAnswer<'_>]) -> GroupStats {
    let mut stats = GroupStats {
        total: answers.len() as i32,
        ..Default::default()
    };
    if answers.is_empty() {
        return stats;
    }

    stats.time_spent = answers.iter().map(|a| i64::from(a.answer.time_spent)).sum();
    let mean = stats.time_spent as f64 / answers.len() as f64;

    // 子题型: (答对, 总数)
    let mut topics: BTreeMap<&str, (i32, i32)> = BTreeMap::new();
    let mut streak = 0;

    for item in answers {
        let answer = item.answer;
        if answer.is_correct {
            stats.correct += 1;
            streak += 1;
            stats.max_streak = stats.max_streak.max(streak);
        } else {
            streak = 0;
            if !answer.is_skipped() {
                stats.mistakes.push(answer.question_id);
            }
        }

        if answer.is_skipped() {
            stats.skipped += 1;
        } else {
            // 快慢阈值取本组平均用时
            let spent = f64::from(answer.time_spent);
            if spent > mean * SLOW_FACTOR {
                stats.too_slow += 1;
            } else if spent < mean * FAST_FACTOR {
                stats.too_fast += 1;
            }
        }

        let topic = item.question.category_name.trim();
        if !topic.is_empty() {
            let entry = topics.entry(topic).or_insert((0, 0));
            entry.1 += 1;
            if answer.is_correct {
                entry.0 += 1;
            }
        }
    }
    stats.ending_streak = streak;

    for (topic, (correct, total)) in topics {
        let accuracy = f64::from(correct) / f64::from(total) * 100.0;
        if accuracy < WEAK_BELOW {
            stats.weak_topics.push(topic.to_string());
        } else if accuracy > STRONG_ABOVE {
            stats.strong_topics.push(topic.to_string());
        }
    }

    stats
}

/// 进步率：较新一半的平均正确率减去较早一半的平均正确率
///
/// `newest_first` 按时间倒序，少于 2 条时为 0。
pub fn improvement_rate(newest_first: &[f64]) -> f64 {
    let window = &newest_first[..newest_first.len().min(IMPROVEMENT_WINDOW)];
    if window.len() < 2 {
        return 0.0;
    }
    // 较新一半取 ⌊n/2⌋ 条，奇数时多出的一条归入较早一半
    let (newer, older) = window.split_at(window.len() / 2);
    round2(mean(newer) - mean(older))
}

/// 稳定度：`max(0, 100 - 2 * 标准差)`，少于 3 条时为 0
pub fn consistency_score(newest_first: &[f64]) -> f64 {
    let window = &newest_first[..newest_first.len().min(CONSISTENCY_WINDOW)];
    if window.len() < 3 {
        return 0.0;
    }
    let avg = mean(window);
    let variance = window.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / window.len() as f64;
    round2((100.0 - 2.0 * variance.sqrt()).max(0.0))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn merge_unique<T: PartialEq + Clone>(existing: &[T], incoming: &[T]) -> Vec<T> {
    let mut merged = existing.to_vec();
    for item in incoming {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}

/// 合并错题，重复出现的题目移到最新位置，只保留最近的若干条
fn merge_mistakes(existing: &[i64], incoming: &[i64]) -> Vec<i64> {
    let mut merged: Vec<i64> = existing.to_vec();
    for id in incoming {
        merged.retain(|m| m != id);
        merged.push(*id);
    }
    let overflow = merged.len().saturating_sub(MISTAKES_LIMIT);
    merged.drain(..overflow);
    merged
}

/// 本次提交的上下文
#[derive(Debug, Clone, Copy)]
pub struct SubmissionContext {
    pub time_taken: i32,
    pub today: NaiveDate,
}

/// 将本次分组统计合并进统计行
///
/// `history` 是同一 (学生, 分类, 难度) 其他统计行的正确率，按更新时间倒序。
pub fn merge_group(
    key: AnalyticsKey,
    existing: Option<&PerformanceAnalytics>,
    stats: &GroupStats,
    history: &[f64],
    ctx: SubmissionContext,
) -> AnalyticsUpsert {
    let prev_total = existing.map(|e| e.total_questions).unwrap_or(0);
    let total = prev_total + stats.total;
    let correct = existing.map(|e| e.correct_answers).unwrap_or(0) + stats.correct;
    let incorrect = existing.map(|e| e.incorrect_answers).unwrap_or(0) + stats.incorrect();

    let accuracy = if total > 0 {
        round2(f64::from(correct) / f64::from(total) * 100.0)
    } else {
        0.0
    };

    // 按题数加权的累计平均用时
    let prev_time = existing
        .map(|e| e.avg_time_per_question * f64::from(e.total_questions))
        .unwrap_or(0.0);
    let avg_time = if total > 0 {
        round2((prev_time + stats.time_spent as f64) / f64::from(total))
    } else {
        0.0
    };

    let mut accuracies = Vec::with_capacity(history.len() + 1);
    accuracies.push(accuracy);
    accuracies.extend_from_slice(history);

    let empty: (&[i64], &[String], &[String]) = (&[], &[], &[]);
    let (prev_mistakes, prev_weak, prev_strong) = existing
        .map(|e| {
            (
                e.common_mistakes.as_slice(),
                e.weak_topics.as_slice(),
                e.strong_topics.as_slice(),
            )
        })
        .unwrap_or(empty);

    let study_minutes = (f64::from(ctx.time_taken.max(0)) / 60.0).round() as i32;

    AnalyticsUpsert {
        existing_id: existing.map(|e| e.id),
        total_questions: total,
        correct_answers: correct,
        incorrect_answers: incorrect,
        accuracy_percentage: accuracy,
        avg_time_per_question: avg_time,
        questions_too_slow: existing.map(|e| e.questions_too_slow).unwrap_or(0) + stats.too_slow,
        questions_too_fast: existing.map(|e| e.questions_too_fast).unwrap_or(0) + stats.too_fast,
        questions_skipped: existing.map(|e| e.questions_skipped).unwrap_or(0) + stats.skipped,
        common_mistakes: merge_mistakes(prev_mistakes, &stats.mistakes),
        weak_topics: merge_unique(prev_weak, &stats.weak_topics),
        strong_topics: merge_unique(prev_strong, &stats.strong_topics),
        improvement_rate: improvement_rate(&accuracies),
        consistency_score: consistency_score(&accuracies),
        streak_correct: stats.ending_streak,
        max_streak: existing
            .map(|e| e.max_streak)
            .unwrap_or(0)
            .max(stats.max_streak),
        study_time_minutes: existing.map(|e| e.study_time_minutes).unwrap_or(0) + study_minutes,
        last_activity_date: ctx.today,
        key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::entities::{Assessment, Question};
    use chrono::Utc;

    fn paper_question(id: i64, difficulty: Difficulty, topic: &str) -> PaperQuestion {
        PaperQuestion {
            position: id as i32,
            category_name: topic.to_string(),
            question: Question {
                id,
                category_id: 1,
                prompt: format!("Q{id}"),
                options: vec!["a".into(), "b".into()],
                correct_option: 0,
                difficulty,
                time_allowance: 60,
                marks: 1,
                is_active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        }
    }

    fn answer(question_id: i64, value: Option<&str>, correct: bool, time: i32) -> StudentAnswer {
        StudentAnswer {
            id: question_id,
            session_id: 1,
            question_id,
            student_answer: value.map(str::to_string),
            is_correct: correct,
            marks_obtained: i32::from(correct),
            time_spent: time,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn key() -> AnalyticsKey {
        AnalyticsKey {
            student_id: 1,
            assessment_id: 1,
            category: "Aptitude".into(),
            difficulty: Difficulty::Easy,
        }
    }

    fn ctx() -> SubmissionContext {
        SubmissionContext {
            time_taken: 150,
            today: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        }
    }

    fn existing_row() -> PerformanceAnalytics {
        PerformanceAnalytics {
            id: 42,
            student_id: 1,
            assessment_id: Some(1),
            category: "Aptitude".into(),
            difficulty: Difficulty::Easy,
            total_questions: 4,
            correct_answers: 2,
            incorrect_answers: 2,
            accuracy_percentage: 50.0,
            avg_time_per_question: 30.0,
            questions_too_slow: 1,
            questions_too_fast: 0,
            questions_skipped: 1,
            common_mistakes: vec![5, 6],
            weak_topics: vec!["Ratios".into()],
            strong_topics: vec![],
            improvement_rate: 0.0,
            consistency_score: 0.0,
            streak_correct: 1,
            max_streak: 3,
            study_time_minutes: 10,
            last_activity_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn streak_tracks_max_and_ending_value() {
        let questions: Vec<_> = (1..=4)
            .map(|id| paper_question(id, Difficulty::Easy, "Quant"))
            .collect();
        let answers = [
            answer(1, Some("0"), true, 10),
            answer(2, Some("0"), true, 10),
            answer(3, Some("1"), false, 10),
            answer(4, Some("0"), true, 10),
        ];
        let graded: Vec<_> = questions
            .iter()
            .zip(answers.iter())
            .map(|(question, answer)| GradedAnswer { question, answer })
            .collect();

        let stats = summarize_group(&graded);
        assert_eq!(stats.max_streak, 2);
        assert_eq!(stats.ending_streak, 1);
        assert_eq!(stats.correct, 3);
        assert_eq!(stats.incorrect(), 1);
        assert_eq!(stats.mistakes, vec![3]);
    }

    #[test]
    fn skipped_answers_break_streak_but_are_not_mistakes() {
        let questions: Vec<_> = (1..=3)
            .map(|id| paper_question(id, Difficulty::Easy, "Quant"))
            .collect();
        let answers = [
            answer(1, Some("0"), true, 20),
            answer(2, None, false, 0),
            answer(3, Some("0"), true, 20),
        ];
        let graded: Vec<_> = questions
            .iter()
            .zip(answers.iter())
            .map(|(question, answer)| GradedAnswer { question, answer })
            .collect();

        let stats = summarize_group(&graded);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.max_streak, 1);
        assert!(stats.mistakes.is_empty());
        assert_eq!(stats.total, 3);
    }

    #[test]
    fn slow_and_fast_use_group_mean() {
        let questions: Vec<_> = (1..=4)
            .map(|id| paper_question(id, Difficulty::Easy, "Quant"))
            .collect();
        // 平均 40 秒：> 60 算慢，< 12 算快
        let answers = [
            answer(1, Some("0"), true, 100),
            answer(2, Some("0"), true, 10),
            answer(3, Some("0"), true, 25),
            answer(4, Some("0"), true, 25),
        ];
        let graded: Vec<_> = questions
            .iter()
            .zip(answers.iter())
            .map(|(question, answer)| GradedAnswer { question, answer })
            .collect();

        let stats = summarize_group(&graded);
        assert_eq!(stats.too_slow, 1);
        assert_eq!(stats.too_fast, 1);
        assert_eq!(stats.time_spent, 160);
    }

    #[test]
    fn topics_are_classified_by_local_accuracy() {
        let questions = [
            paper_question(1, Difficulty::Easy, "Ratios"),
            paper_question(2, Difficulty::Easy, "Ratios"),
            paper_question(3, Difficulty::Easy, "Series"),
            paper_question(4, Difficulty::Easy, "Percentages"),
            paper_question(5, Difficulty::Easy, "Percentages"),
        ];
        let answers = [
            answer(1, Some("1"), false, 10),
            answer(2, Some("0"), true, 10),
            answer(3, Some("0"), true, 10),
            answer(4, Some("1"), false, 10),
            answer(5, Some("1"), false, 10),
        ];
        let graded: Vec<_> = questions
            .iter()
            .zip(answers.iter())
            .map(|(question, answer)| GradedAnswer { question, answer })
            .collect();

        let stats = summarize_group(&graded);
        // Ratios 恰好 50%，既不弱也不强
        assert_eq!(stats.weak_topics, vec!["Percentages".to_string()]);
        assert_eq!(stats.strong_topics, vec!["Series".to_string()]);
    }

    #[test]
    fn pairing_follows_paper_order_and_groups_by_difficulty() {
        let paper = AssessmentPaper {
            assessment: Assessment {
                id: 1,
                category_id: None,
                title: "Mixed".into(),
                description: None,
                duration_minutes: 10,
                total_marks: 3,
                pass_percentage: 50.0,
                start_at: None,
                end_at: None,
                is_active: true,
                allow_multiple_attempts: false,
                show_results_immediately: true,
                show_correct_answers: false,
                deleted_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            category_name: None,
            questions: vec![
                paper_question(1, Difficulty::Hard, "Logic"),
                paper_question(2, Difficulty::Easy, "Logic"),
                paper_question(3, Difficulty::Hard, "Logic"),
            ],
        };
        // 作答记录顺序与试卷不同，且包含一条试卷外的记录
        let answers = vec![
            answer(3, Some("0"), true, 5),
            answer(99, Some("0"), true, 5),
            answer(1, Some("1"), false, 5),
            answer(2, Some("0"), true, 5),
        ];

        let graded = pair_with_paper(&paper, &answers);
        assert_eq!(graded.len(), 3);
        let groups = group_by_difficulty(&graded);
        let hard: Vec<i64> = groups[&Difficulty::Hard]
            .iter()
            .map(|g| g.answer.question_id)
            .collect();
        assert_eq!(hard, vec![1, 3]);
        assert_eq!(groups[&Difficulty::Easy].len(), 1);
    }

    #[test]
    fn improvement_compares_newer_half_with_older_half() {
        // 只取最近 5 条: 80, 70, 60, 50, 40
        let newest_first = [80.0, 70.0, 60.0, 50.0, 40.0, 10.0];
        // 较新 [80, 70] = 75，较早 [60, 50, 40] = 50
        assert_eq!(improvement_rate(&newest_first), 25.0);
        // 较新 [90] = 90，较早 [50, 40] = 45
        assert_eq!(improvement_rate(&[90.0, 50.0, 40.0]), 45.0);
        assert_eq!(improvement_rate(&[90.0, 60.0]), 30.0);
        assert_eq!(improvement_rate(&[90.0]), 0.0);
        assert_eq!(improvement_rate(&[]), 0.0);
    }

    #[test]
    fn consistency_needs_three_values() {
        assert_eq!(consistency_score(&[80.0, 80.0]), 0.0);
        assert_eq!(consistency_score(&[80.0, 80.0, 80.0]), 100.0);
        // 标准差 40 → 100 - 80 = 20
        assert_eq!(consistency_score(&[100.0, 20.0, 100.0, 20.0]), 20.0);
        // 波动过大时不低于 0
        assert_eq!(consistency_score(&[100.0, 0.0, 100.0, 0.0]), 0.0);
    }

    #[test]
    fn first_submission_creates_fresh_row() {
        let stats = GroupStats {
            total: 2,
            correct: 1,
            skipped: 0,
            time_spent: 50,
            ending_streak: 0,
            max_streak: 1,
            mistakes: vec![9],
            weak_topics: vec![],
            strong_topics: vec![],
            ..Default::default()
        };
        let row = merge_group(key(), None, &stats, &[], ctx());
        assert_eq!(row.existing_id, None);
        assert_eq!(row.total_questions, 2);
        assert_eq!(row.accuracy_percentage, 50.0);
        assert_eq!(row.avg_time_per_question, 25.0);
        assert_eq!(row.improvement_rate, 0.0);
        assert_eq!(row.consistency_score, 0.0);
        // 150 秒 → 3 分钟（四舍五入）
        assert_eq!(row.study_time_minutes, 3);
        assert_eq!(row.common_mistakes, vec![9]);
    }

    #[test]
    fn merge_accumulates_existing_row() {
        let existing = existing_row();
        let stats = GroupStats {
            total: 4,
            correct: 4,
            skipped: 0,
            time_spent: 40,
            too_slow: 0,
            too_fast: 2,
            ending_streak: 4,
            max_streak: 4,
            mistakes: vec![5, 7],
            weak_topics: vec!["Ratios".into()],
            strong_topics: vec!["Series".into()],
        };
        let row = merge_group(key(), Some(&existing), &stats, &[60.0, 70.0], ctx());

        assert_eq!(row.existing_id, Some(42));
        assert_eq!(row.total_questions, 8);
        assert_eq!(row.correct_answers, 6);
        assert_eq!(row.incorrect_answers, 2);
        assert_eq!(row.accuracy_percentage, 75.0);
        // (30 * 4 + 40) / 8
        assert_eq!(row.avg_time_per_question, 20.0);
        assert_eq!(row.questions_too_fast, 2);
        assert_eq!(row.questions_skipped, 1);
        assert_eq!(row.common_mistakes, vec![6, 5, 7]);
        assert_eq!(row.weak_topics, vec!["Ratios".to_string()]);
        assert_eq!(row.strong_topics, vec!["Series".to_string()]);
        assert_eq!(row.max_streak, 4);
        assert_eq!(row.streak_correct, 4);
        assert_eq!(row.study_time_minutes, 13);
        // 倒序 75, 60, 70：较新 [75]，较早 [60, 70]
        assert_eq!(row.improvement_rate, 10.0);
        assert!(row.consistency_score > 0.0);
    }

    #[test]
    fn mistakes_keep_only_newest() {
        let existing: Vec<i64> = (0..MISTAKES_LIMIT as i64).collect();
        let merged = merge_mistakes(&existing, &[1000, 1001]);
        assert_eq!(merged.len(), MISTAKES_LIMIT);
        assert_eq!(merged.first(), Some(&2));
        assert_eq!(merged.last(), Some(&1001));
    }
}
