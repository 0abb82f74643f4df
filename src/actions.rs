//! UI actions over a [`Session`].
//!
//! Each handler performs at most one downstream call and records the
//! outcome in the session. Failures become inline messages on the relevant
//! panel; nothing else in the session changes.

use std::fmt;
use std::str::FromStr;

use crate::answer::{AnswerGenerator, Assistant, QUICK_STUDY_TIPS};
use crate::error::{AssistError, AssistResult};
use crate::grade::{self, MAX_SUBJECTS};
use crate::models::SubjectMark;
use crate::session::{
    AnsweredQuestion, FlashLevel, Panel, Session, StudyOutput, SubjectRow,
};

pub async fn ask(session: &mut Session, assistant: &Assistant, question: &str) {
    session.question = question.trim().to_string();
    session.answer = match assistant.ask(question).await {
        Ok(answer) => Panel::Ready(AnsweredQuestion {
            question: session.question.clone(),
            answer,
        }),
        Err(e) => failed(&session.id, "ask", e),
    };
}

pub fn clear_question(session: &mut Session) {
    session.question.clear();
    session.answer = Panel::Empty;
}

/// Resize the grade form. Existing rows keep their values.
pub fn set_subject_count(session: &mut Session, count: &str) {
    match count.trim().parse::<usize>() {
        Ok(n) if (1..=MAX_SUBJECTS).contains(&n) => {
            session.subjects.resize(n, SubjectRow::default());
        }
        _ => session.flash(
            FlashLevel::Warning,
            format!("Number of subjects must be between 1 and {}.", MAX_SUBJECTS),
        ),
    }
}

/// Calculate grades from the submitted form rows.
pub fn calculate_grades(session: &mut Session, rows: Vec<SubjectRow>) {
    session.grades = match parse_rows(&rows).and_then(|marks| grade::calculate_subjects(&marks)) {
        Ok(report) => Panel::Ready(report),
        Err(e) => failed(&session.id, "grades", e),
    };
    if (1..=MAX_SUBJECTS).contains(&rows.len()) {
        session.subjects = rows;
    }
}

/// Turn raw form rows into marks. Score parsing is the only check here;
/// range and name rules belong to the calculator.
pub fn parse_rows(rows: &[SubjectRow]) -> AssistResult<Vec<SubjectMark>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let score = row.score.trim().parse::<i64>().map_err(|_| {
                AssistError::invalid(format!(
                    "marks for subject {} must be a whole number between 0 and 100",
                    i + 1
                ))
            })?;
            Ok(SubjectMark {
                name: row.name.clone(),
                score,
            })
        })
        .collect()
}

pub fn add_todo(session: &mut Session, item: &str) {
    let item = item.trim();
    if item.is_empty() {
        session.flash(FlashLevel::Warning, "Please type a task.");
        return;
    }
    session.todo.push(item.to_string());
    session.flash(FlashLevel::Success, "Task added.");
}

pub fn clear_todo(session: &mut Session) {
    session.todo.clear();
    session.flash(FlashLevel::Info, "Tasks cleared.");
}

pub fn save_notes(session: &mut Session, notes: &str) {
    session.notes = notes.to_string();
    session.flash(FlashLevel::Success, "Notes saved.");
}

pub async fn study_plan(session: &mut Session, generator: &AnswerGenerator, topic: &str) {
    session.study_topic = topic.trim().to_string();
    session.study = match generator.suggest_study_plan(topic).await {
        Ok(text) => Panel::Ready(StudyOutput::Plan {
            topic: session.study_topic.clone(),
            text,
        }),
        Err(e) => failed(&session.id, "study", e),
    };
}

pub fn quick_tips(session: &mut Session) {
    session.study = Panel::Ready(StudyOutput::Tips);
}

fn failed<T>(session_id: &str, action: &str, error: AssistError) -> Panel<T> {
    tracing::warn!(session = %session_id, action, code = error.code(), "{}", error);
    Panel::Failed(error.to_string())
}

/// Which tab's result to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPanel {
    Answer,
    Grades,
    Study,
}

impl FromStr for ExportPanel {
    type Err = AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "answer" => Ok(Self::Answer),
            "grades" => Ok(Self::Grades),
            "study" => Ok(Self::Study),
            other => Err(AssistError::invalid(format!(
                "unknown export panel '{}' (expected answer, grades, or study)",
                other
            ))),
        }
    }
}

impl fmt::Display for ExportPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Answer => "answer",
            Self::Grades => "grades",
            Self::Study => "study",
        })
    }
}

/// Title and body of an exportable panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub title: String,
    pub body: String,
}

/// The last successful result of `panel`, ready for export.
pub fn export_document(session: &Session, panel: ExportPanel) -> AssistResult<ExportDocument> {
    let nothing = || AssistError::invalid(format!("nothing to export on the {} panel yet", panel));
    match panel {
        ExportPanel::Answer => {
            let a = session.answer.ready().ok_or_else(nothing)?;
            Ok(ExportDocument {
                title: "College Assistant Answer".to_string(),
                body: format!("Q: {}\n\n{}", a.question, a.answer.text()),
            })
        }
        ExportPanel::Grades => {
            let report = session.grades.ready().ok_or_else(nothing)?;
            Ok(ExportDocument {
                title: "Grade Report".to_string(),
                body: report.to_text(),
            })
        }
        ExportPanel::Study => match session.study.ready().ok_or_else(nothing)? {
            StudyOutput::Plan { topic, text } => Ok(ExportDocument {
                title: format!("Study Plan: {}", topic),
                body: text.clone(),
            }),
            StudyOutput::Tips => Ok(ExportDocument {
                title: "Quick Study Tips".to_string(),
                body: QUICK_STUDY_TIPS.to_string(),
            }),
        },
    }
}
