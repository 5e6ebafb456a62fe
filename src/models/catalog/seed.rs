//! 题库初始化数据格式
//!
//! ```json
//! {
//!   "categories": ["Aptitude", "Reasoning"],
//!   "questions": [
//!     { "key": "q1", "category": "Aptitude", "prompt": "2 + 2 = ?",
//!       "options": ["3", "4", "5", "6"], "correct_option": 1,
//!       "difficulty": "easy", "marks": 5 }
//!   ],
//!   "assessments": [
//!     { "title": "Aptitude Round 1", "category": "Aptitude",
//!       "duration_minutes": 30, "total_marks": 10, "pass_percentage": 50,
//!       "questions": ["q1"] }
//!   ]
//! }
//! ```

use serde::Deserialize;

use crate::models::catalog::entities::Difficulty;

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub questions: Vec<SeedQuestion>,
    #[serde(default)]
    pub assessments: Vec<SeedAssessment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedQuestion {
    /// 仅在初始化文件内部引用
    pub key: String,
    pub category: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: i32,
    pub difficulty: Option<Difficulty>,
    pub time_allowance: Option<i32>,
    pub marks: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAssessment {
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub duration_minutes: i32,
    pub total_marks: Option<i32>,
    pub pass_percentage: f64,
    #[serde(default)]
    pub allow_multiple_attempts: bool,
    #[serde(default)]
    pub show_correct_answers: bool,
    pub questions: Vec<String>,
}
