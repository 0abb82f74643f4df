//! Core data models used throughout the assistant.
//!
//! These types represent the knowledge chunks that flow through ingestion
//! and retrieval, the static FAQ entries, and the marks and summaries handled
//! by the grade calculator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A contiguous slice of the source corpus.
///
/// Created once at ingestion time and never edited; re-ingestion replaces
/// the whole store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeChunk {
    /// Position of the chunk in the corpus, contiguous from 0.
    pub index: i64,
    /// Character offset of the first character of `text` in the corpus.
    pub source_offset: i64,
    pub text: String,
    /// SHA-256 hex digest of `text`.
    pub hash: String,
}

/// A hand-authored question/answer pair shipped with the binary.
#[derive(Debug, Clone, Copy)]
pub struct FaqEntry {
    pub question: &'static str,
    pub answer: &'static str,
}

/// One subject's marks as entered on the grade form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectMark {
    pub name: String,
    pub score: i64,
}

/// Letter grade derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    Fail,
}

impl LetterGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            LetterGrade::APlus => "A+",
            LetterGrade::A => "A",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::Fail => "Fail",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one grade calculation. Recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeSummary {
    pub total: i64,
    pub possible: i64,
    /// Percentage rounded to two decimals.
    pub percentage: f64,
    /// CGPA estimate (percentage / 9.5) rounded to two decimals.
    pub cgpa: f64,
    pub letter: LetterGrade,
}

/// Subject-wise breakdown plus the summary, as shown on the grade tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub subjects: Vec<SubjectMark>,
    pub summary: GradeSummary,
}

impl GradeReport {
    /// Plain-text rendering used for PDF export and the CLI.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        if !self.subjects.is_empty() {
            out.push_str("Subject-wise:\n");
            for s in &self.subjects {
                out.push_str(&format!("  {}: {}\n", s.name, s.score));
            }
        }
        out.push_str(&self.summary.to_text());
        out
    }
}

impl GradeSummary {
    pub fn to_text(&self) -> String {
        format!(
            "Total: {}/{}\nPercentage: {:.2}%\nCGPA (est.): {:.2}\nGrade: {}\n",
            self.total, self.possible, self.percentage, self.cgpa, self.letter
        )
    }
}
