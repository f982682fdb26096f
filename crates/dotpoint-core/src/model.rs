//! Question bank data model.
//!
//! A [`Question`] is one row of a question bank CSV. The column order is fixed
//! by [`QUESTION_COLUMNS`] and shared by the importer and the spreadsheet tabs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Column names of a question bank, in sheet order.
pub const QUESTION_COLUMNS: [&str; 14] = [
    "subject",
    "moduleId",
    "dotPointId",
    "tabName",
    "question",
    "options",
    "correctAnswer",
    "explanation",
    "difficulty",
    "time_limit",
    "points",
    "syllabus_outcome",
    "keywords",
    "status",
];

const OPTION_SEPARATOR: char = '|';
const KEYWORD_SEPARATOR: char = ',';

const DEFAULT_TIME_LIMIT_SECS: u32 = 60;
const DEFAULT_POINTS: u32 = 10;

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Subject name (e.g. "Biology").
    pub subject: String,
    /// Syllabus module identifier (e.g. "module-5").
    pub module_id: String,
    /// Dotpoint identifier the question belongs to.
    pub dot_point_id: String,
    /// Spreadsheet tab the question lives in.
    pub tab_name: String,
    /// Question text.
    pub question: String,
    /// Answer options. Empty for short-answer questions.
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Seconds allowed to answer.
    #[serde(rename = "time_limit")]
    pub time_limit: u32,
    pub points: u32,
    #[serde(rename = "syllabus_outcome", default)]
    pub syllabus_outcome: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub status: Status,
}

impl Question {
    /// Build a multiple-choice question with default difficulty, timing and points.
    pub fn multiple_choice(
        location: &QuestionLocation,
        question: &str,
        options: &[&str],
        correct_answer: &str,
        explanation: &str,
    ) -> Self {
        Self {
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Self::base(location, question, correct_answer, explanation)
        }
    }

    /// Build a short-answer question (no options).
    pub fn short_answer(
        location: &QuestionLocation,
        question: &str,
        model_answer: &str,
        explanation: &str,
    ) -> Self {
        Self::base(location, question, model_answer, explanation)
    }

    fn base(
        location: &QuestionLocation,
        question: &str,
        correct_answer: &str,
        explanation: &str,
    ) -> Self {
        Self {
            subject: location.subject.clone(),
            module_id: location.module_id.clone(),
            dot_point_id: location.dot_point_id.clone(),
            tab_name: location.tab_name.clone(),
            question: question.to_string(),
            options: Vec::new(),
            correct_answer: correct_answer.to_string(),
            explanation: explanation.to_string(),
            difficulty: Difficulty::default(),
            time_limit: DEFAULT_TIME_LIMIT_SECS,
            points: DEFAULT_POINTS,
            syllabus_outcome: String::new(),
            keywords: Vec::new(),
            status: Status::default(),
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit = secs;
        self
    }

    pub fn with_outcome(mut self, outcome: &str) -> Self {
        self.syllabus_outcome = outcome.to_string();
        self
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Whether this question offers a fixed set of options.
    pub fn is_multiple_choice(&self) -> bool {
        !self.options.is_empty()
    }

    /// Render as a sheet row in [`QUESTION_COLUMNS`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.subject.clone(),
            self.module_id.clone(),
            self.dot_point_id.clone(),
            self.tab_name.clone(),
            self.question.clone(),
            self.options.join(&OPTION_SEPARATOR.to_string()),
            self.correct_answer.clone(),
            self.explanation.clone(),
            self.difficulty.to_string(),
            self.time_limit.to_string(),
            self.points.to_string(),
            self.syllabus_outcome.clone(),
            self.keywords.join(&KEYWORD_SEPARATOR.to_string()),
            self.status.to_string(),
        ]
    }

    /// Build a question from a tokenized row, keyed by the header.
    ///
    /// Missing columns fall back to empty strings or defaults. Unparsable
    /// numbers fall back to defaults as well.
    pub fn from_row(header: &[String], row: &[String]) -> Self {
        let fields: HashMap<&str, &str> = header
            .iter()
            .map(|h| h.trim())
            .zip(row.iter().map(String::as_str))
            .collect();
        let get = |name: &str| fields.get(name).copied().unwrap_or("").to_string();

        Self {
            subject: get("subject"),
            module_id: get("moduleId"),
            dot_point_id: get("dotPointId"),
            tab_name: get("tabName"),
            question: get("question"),
            options: split_list(&get("options"), OPTION_SEPARATOR),
            correct_answer: get("correctAnswer"),
            explanation: get("explanation"),
            difficulty: get("difficulty").parse().unwrap_or_default(),
            time_limit: get("time_limit")
                .trim()
                .parse()
                .unwrap_or(DEFAULT_TIME_LIMIT_SECS),
            points: get("points").trim().parse().unwrap_or(DEFAULT_POINTS),
            syllabus_outcome: get("syllabus_outcome"),
            keywords: split_list(&get("keywords"), KEYWORD_SEPARATOR),
            status: get("status").parse().unwrap_or_default(),
        }
    }
}

fn split_list(value: &str, sep: char) -> Vec<String> {
    value
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Where a question sits in the syllabus and the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionLocation {
    pub subject: String,
    pub module_id: String,
    pub dot_point_id: String,
    pub tab_name: String,
}

impl QuestionLocation {
    pub fn new(subject: &str, module_id: &str, dot_point_id: &str, tab_name: &str) -> Self {
        Self {
            subject: subject.to_string(),
            module_id: module_id.to_string(),
            dot_point_id: dot_point_id.to_string(),
            tab_name: tab_name.to_string(),
        }
    }
}

/// Question difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Publication status of a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Draft,
    Retired,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => write!(f, "active"),
            Status::Draft => write!(f, "draft"),
            Status::Retired => write!(f, "retired"),
        }
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "draft" => Ok(Status::Draft),
            "retired" => Ok(Status::Retired),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> QuestionLocation {
        QuestionLocation::new("Biology", "module-5", "bio-5-1", "Heredity")
    }

    fn header() -> Vec<String> {
        QUESTION_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn multiple_choice_defaults() {
        let q = Question::multiple_choice(
            &location(),
            "What carries genetic information?",
            &["DNA", "ATP", "Glucose"],
            "DNA",
            "DNA encodes genes.",
        );
        assert!(q.is_multiple_choice());
        assert_eq!(q.difficulty, Difficulty::Medium);
        assert_eq!(q.time_limit, 60);
        assert_eq!(q.points, 10);
        assert_eq!(q.status, Status::Active);
        assert_eq!(q.tab_name, "Heredity");
    }

    #[test]
    fn short_answer_has_no_options() {
        let q = Question::short_answer(&location(), "Define meiosis.", "Cell division", "")
            .with_difficulty(Difficulty::Hard)
            .with_points(20);
        assert!(!q.is_multiple_choice());
        assert_eq!(q.difficulty, Difficulty::Hard);
        assert_eq!(q.points, 20);
    }

    #[test]
    fn row_follows_column_order() {
        let q = Question::multiple_choice(&location(), "Q?", &["A", "B"], "A", "because")
            .with_keywords(&["dna", "genes"])
            .with_outcome("BIO12-12");
        let row = q.to_row();
        assert_eq!(row.len(), QUESTION_COLUMNS.len());
        assert_eq!(row[0], "Biology");
        assert_eq!(row[5], "A|B");
        assert_eq!(row[8], "medium");
        assert_eq!(row[11], "BIO12-12");
        assert_eq!(row[12], "dna,genes");
        assert_eq!(row[13], "active");
    }

    #[test]
    fn from_row_reads_by_header_name() {
        let q = Question::multiple_choice(&location(), "Q?", &["A", "B"], "B", "")
            .with_difficulty(Difficulty::Easy)
            .with_time_limit(90);
        let parsed = Question::from_row(&header(), &q.to_row());
        assert_eq!(parsed, q);
    }

    #[test]
    fn from_row_tolerates_missing_and_bad_columns() {
        let header = vec!["question".to_string(), "points".to_string()];
        let row = vec!["Why?".to_string(), "lots".to_string()];
        let q = Question::from_row(&header, &row);
        assert_eq!(q.question, "Why?");
        assert_eq!(q.points, 10);
        assert!(q.subject.is_empty());
        assert!(q.options.is_empty());
    }

    #[test]
    fn enum_parse_is_case_insensitive() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" Draft ".parse::<Status>().unwrap(), Status::Draft);
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}
