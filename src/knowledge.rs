//! Built-in college knowledge.
//!
//! The static corpus shipped with the binary: the official fact sheet, the
//! brochure summary, and the hand-authored FAQ. Static retrieval hands all of
//! it to the model on every question; `campus ingest` chunks the same text
//! (or `knowledge.corpus_path`, when configured) into the vector store.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::FaqEntry;

pub const OFFICIAL_INFO: &str = "\
RNS First Grade College (RNSFGC) - Official Information
- Established: 2012.
- Founder: Industrialist-philanthropist Dr. R. N. Shetty.
- Status: Autonomous (recently converted to autonomous status).
- Accreditation: NAAC accredited with an 'A' grade.
- Educational focus: Value-driven education, experiential learning, skill development, discipline, and holistic student growth.
- Mission highlights: Maintain academic excellence with integrity; promote holistic personal development; bridge theory & practice via labs, projects, and industry-relevant curriculum; prepare students for careers with training and placements; nurture socially aware, value-based, culturally rooted individuals.
- Courses / Programs:
  * UG: Bachelor of Computer Applications (BCA), Bachelor of Commerce (B.Com), Bachelor of Business Administration (BBA)
  * PG: Master of Business Administration (MBA)
- Departments: Computer Applications (BCA), Commerce (B.Com), Management (BBA), MBA department.
- Facilities: Well-equipped computer labs & IT infrastructure, library & digital library, hostel accommodation, auditorium/seminar halls, sports & recreation facilities (outdoor & indoor), canteen/food court, ICT-enabled classrooms / smart classrooms, fitness & wellness facilities.
- Contact & Location:
  RNS First Grade College, Dr. Vishnuvardhan Road, Channasandra, RR Nagar, Bengaluru - 560098
  Phone: 080-28611110 / 9141095892
  Emails: enquiryrnsfgc@gmail.com, principal_rnsfgc@rnsgi.com, vp_rnsfgc@rnsgi.com, rnsfgccollege2012@gmail.com
";

pub const BROCHURE: &str = "\
RNS First Grade College - Professional Brochure Summary
RNSFGC is a modern, autonomous institution committed to shaping well-rounded professionals through a blend of rigorous academics and practical exposure. The college emphasizes:
* Academic excellence and ethical conduct
* Industry-relevant training and hands-on learning
* Leadership, communication, and personal growth
Programs include BCA, B.Com, BBA at the undergraduate level and MBA at the postgraduate level. Campus life supports learning through advanced computer labs, a comprehensive library (digital + physical), sports and cultural activities, smart classrooms, auditoriums for seminars, and residential facilities for outstation students. RNSFGC prepares students for contemporary careers with placement-oriented programs, value-based education, and opportunities for experiential projects.
";

pub const FAQ: &[FaqEntry] = &[
    FaqEntry {
        question: "About the College",
        answer: "RNS First Grade College (RNSFGC) was established in 2012 by industrialist-philanthropist Dr. R. N. Shetty.\n\
                 It is an autonomous institution accredited by NAAC with an 'A' grade.\n\
                 The college focuses on value-driven education, experiential learning, skill development, discipline, and holistic growth.",
    },
    FaqEntry {
        question: "Vision and Mission",
        answer: "* Uphold academic excellence with integrity.\n\
                 * Promote discipline, ethics, responsibility & holistic development.\n\
                 * Bridge theory and practice through labs, projects & industry learning.\n\
                 * Prepare students for careers via training & placements.",
    },
    FaqEntry {
        question: "Courses Offered",
        answer: "UG Programs: BCA, B.Com, BBA\nPG Program: MBA",
    },
    FaqEntry {
        question: "Departments",
        answer: "* BCA\n* B.Com\n* BBA\n* MBA",
    },
    FaqEntry {
        question: "Facilities",
        answer: "* Computer labs\n* Library & Digital Library\n* Hostel\n* Auditorium\n\
                 * Sports (Indoor & Outdoor)\n* ICT-enabled classrooms\n* Canteen\n* Gym",
    },
    FaqEntry {
        question: "Contact Details",
        answer: "Address: RNS First Grade College, Dr. Vishnuvardhan Road, RR Nagar, Bengaluru - 560098\n\
                 Phone: 080-28611110, 9141095892\n\
                 Emails: enquiryrnsfgc@gmail.com, principal_rnsfgc@rnsgi.com, vp_rnsfgc@rnsgi.com, rnsfgccollege2012@gmail.com",
    },
];

/// Questions offered as one-click buttons on the chat tab.
pub const QUICK_QUESTIONS: &[&str] = &["About the College", "Facilities", "Courses Offered"];

/// Render FAQ entries as `Q: ...\nA: ...` blocks separated by blank lines.
pub fn faq_text(entries: &[FaqEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("Q: {}\nA: {}", e.question, e.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The complete built-in corpus: official info, brochure, then the FAQ.
pub fn builtin_corpus() -> String {
    format!(
        "--- OFFICIAL INFO ---\n{}\n--- BROCHURE SUMMARY ---\n{}\n--- FAQ ---\n{}\n",
        OFFICIAL_INFO,
        BROCHURE,
        faq_text(FAQ)
    )
}

/// Load the configured corpus, falling back to [`builtin_corpus`].
pub fn load_corpus(config: &Config) -> Result<String> {
    match &config.knowledge.corpus_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file: {}", path.display())),
        None => Ok(builtin_corpus()),
    }
}

/// Print the FAQ for `campus faq`.
pub fn print_faq() {
    for (i, entry) in FAQ.iter().enumerate() {
        println!("{}. {}", i + 1, entry.question);
        for line in entry.answer.lines() {
            println!("   {}", line);
        }
        println!();
    }
}
