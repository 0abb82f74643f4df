//! Grade and CGPA calculator.
//!
//! A pure function from per-subject marks to a [`GradeSummary`]:
//!
//! ```text
//! total      = Σ marks
//! possible   = 100 × N
//! percentage = 100 × total / possible
//! cgpa       = percentage / 9.5            (2 decimals)
//! letter     = ≥90 A+ | ≥80 A | ≥70 B+ | ≥60 B | ≥50 C | Fail
//! ```
//!
//! Every call recomputes from scratch; nothing is cached.
//!
//! # Example
//!
//! ```rust
//! use campus_assist::grade::calculate;
//! use campus_assist::models::LetterGrade;
//!
//! let summary = calculate(&[90, 85, 78]).unwrap();
//! assert_eq!(summary.total, 253);
//! assert_eq!(summary.percentage, 84.33);
//! assert_eq!(summary.cgpa, 8.88);
//! assert_eq!(summary.letter, LetterGrade::A);
//! ```

use crate::error::{AssistError, AssistResult};
use crate::models::{GradeReport, GradeSummary, LetterGrade, SubjectMark};

/// Maximum marks per subject.
pub const MAX_MARK: i64 = 100;
/// Largest number of subjects accepted in one calculation.
pub const MAX_SUBJECTS: usize = 20;
/// Divisor converting a percentage into a CGPA estimate.
pub const CGPA_DIVISOR: f64 = 9.5;

/// Compute the grade summary for `marks`.
///
/// # Errors
///
/// [`AssistError::InvalidInput`] when `marks` is empty, longer than
/// [`MAX_SUBJECTS`], or contains a mark outside `0..=100`.
pub fn calculate(marks: &[i64]) -> AssistResult<GradeSummary> {
    if marks.is_empty() {
        return Err(AssistError::invalid("at least one subject is required"));
    }
    if marks.len() > MAX_SUBJECTS {
        return Err(AssistError::invalid(format!(
            "at most {} subjects are supported, got {}",
            MAX_SUBJECTS,
            marks.len()
        )));
    }
    if let Some((i, m)) = marks
        .iter()
        .enumerate()
        .find(|(_, m)| !(0..=MAX_MARK).contains(*m))
    {
        return Err(AssistError::invalid(format!(
            "marks for subject {} must be between 0 and {}, got {}",
            i + 1,
            MAX_MARK,
            m
        )));
    }

    let total: i64 = marks.iter().sum();
    let possible = MAX_MARK * marks.len() as i64;
    let percentage = 100.0 * total as f64 / possible as f64;

    Ok(GradeSummary {
        total,
        possible,
        percentage: round2(percentage),
        cgpa: round2(percentage / CGPA_DIVISOR),
        letter: letter_for(percentage),
    })
}

/// Subject-wise calculation: validates names, then delegates to [`calculate`].
pub fn calculate_subjects(subjects: &[SubjectMark]) -> AssistResult<GradeReport> {
    if let Some(pos) = subjects.iter().position(|s| s.name.trim().is_empty()) {
        return Err(AssistError::invalid(format!(
            "please fill all subject names (subject {} is empty)",
            pos + 1
        )));
    }
    let marks: Vec<i64> = subjects.iter().map(|s| s.score).collect();
    let summary = calculate(&marks)?;
    Ok(GradeReport {
        subjects: subjects
            .iter()
            .map(|s| SubjectMark {
                name: s.name.trim().to_string(),
                score: s.score,
            })
            .collect(),
        summary,
    })
}

/// Map a percentage onto the fixed letter-grade thresholds.
pub fn letter_for(percentage: f64) -> LetterGrade {
    if percentage >= 90.0 {
        LetterGrade::APlus
    } else if percentage >= 80.0 {
        LetterGrade::A
    } else if percentage >= 70.0 {
        LetterGrade::BPlus
    } else if percentage >= 60.0 {
        LetterGrade::B
    } else if percentage >= 50.0 {
        LetterGrade::C
    } else {
        LetterGrade::Fail
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_a_grade() {
        let s = calculate(&[90, 85, 78]).unwrap();
        assert_eq!(s.total, 253);
        assert_eq!(s.possible, 300);
        assert_eq!(s.percentage, 84.33);
        assert_eq!(s.cgpa, 8.88);
        assert_eq!(s.letter, LetterGrade::A);
    }

    #[test]
    fn test_scenario_fail() {
        let s = calculate(&[40, 30, 20]).unwrap();
        assert_eq!(s.total, 90);
        assert_eq!(s.percentage, 30.0);
        assert_eq!(s.cgpa, 3.16);
        assert_eq!(s.letter, LetterGrade::Fail);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(calculate(&[]), Err(AssistError::InvalidInput(_))));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            calculate(&[50, 101]),
            Err(AssistError::InvalidInput(_))
        ));
        assert!(matches!(
            calculate(&[-1, 50]),
            Err(AssistError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_too_many_subjects_rejected() {
        let marks = vec![70; MAX_SUBJECTS + 1];
        assert!(matches!(
            calculate(&marks),
            Err(AssistError::InvalidInput(_))
        ));
        assert!(calculate(&marks[..MAX_SUBJECTS]).is_ok());
    }

    #[test]
    fn test_threshold_boundaries() {
        assert_eq!(letter_for(90.0), LetterGrade::APlus);
        assert_eq!(letter_for(89.99), LetterGrade::A);
        assert_eq!(letter_for(80.0), LetterGrade::A);
        assert_eq!(letter_for(79.99), LetterGrade::BPlus);
        assert_eq!(letter_for(70.0), LetterGrade::BPlus);
        assert_eq!(letter_for(69.99), LetterGrade::B);
        assert_eq!(letter_for(60.0), LetterGrade::B);
        assert_eq!(letter_for(59.99), LetterGrade::C);
        assert_eq!(letter_for(50.0), LetterGrade::C);
        assert_eq!(letter_for(49.99), LetterGrade::Fail);
    }

    #[test]
    fn test_exact_boundaries_through_calculate() {
        assert_eq!(calculate(&[90]).unwrap().letter, LetterGrade::APlus);
        assert_eq!(calculate(&[89]).unwrap().letter, LetterGrade::A);
        assert_eq!(calculate(&[100, 80]).unwrap().letter, LetterGrade::APlus);
        assert_eq!(calculate(&[51, 49]).unwrap().letter, LetterGrade::C);
        assert_eq!(calculate(&[0]).unwrap().letter, LetterGrade::Fail);
    }

    #[test]
    fn test_properties_over_all_sizes() {
        for n in 1..=MAX_SUBJECTS {
            for seed in 0..25i64 {
                let marks: Vec<i64> = (0..n as i64).map(|i| (seed * 37 + i * 13) % 101).collect();
                let s = calculate(&marks).unwrap();
                assert_eq!(s.total, marks.iter().sum::<i64>());
                assert!((0.0..=100.0).contains(&s.percentage));
                let exact = 100.0 * s.total as f64 / (100 * n) as f64;
                assert_eq!(s.cgpa, round2(exact / CGPA_DIVISOR));
                assert_eq!(s.letter, letter_for(exact));
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let marks = [67, 88, 91, 45];
        assert_eq!(calculate(&marks).unwrap(), calculate(&marks).unwrap());
    }

    #[test]
    fn test_subjects_require_names() {
        let subjects = vec![
            SubjectMark {
                name: "Maths".into(),
                score: 80,
            },
            SubjectMark {
                name: "   ".into(),
                score: 70,
            },
        ];
        let err = calculate_subjects(&subjects).unwrap_err();
        assert!(err.to_string().contains("subject 2"));
    }

    #[test]
    fn test_subjects_report() {
        let subjects = vec![
            SubjectMark {
                name: " DBMS ".into(),
                score: 90,
            },
            SubjectMark {
                name: "Java".into(),
                score: 85,
            },
            SubjectMark {
                name: "Web".into(),
                score: 78,
            },
        ];
        let report = calculate_subjects(&subjects).unwrap();
        assert_eq!(report.subjects[0].name, "DBMS");
        assert_eq!(report.summary.total, 253);
        let text = report.to_text();
        assert!(text.contains("DBMS: 90"));
        assert!(text.contains("Grade: A"));
        assert!(text.contains("Percentage: 84.33%"));
    }
}
