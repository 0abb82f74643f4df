//! HTML rendering of a session.
//!
//! One page with three sections (chat, grades, productivity). Every value
//! that came from a user or a model goes through [`escape`].

use std::fmt::Write;

use crate::answer::{Answer, QUICK_STUDY_TIPS};
use crate::grade::MAX_SUBJECTS;
use crate::knowledge::QUICK_QUESTIONS;
use crate::session::{Flash, FlashLevel, Panel, Session, StudyOutput};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#0f1724;color:#e6edf3;margin:0}\
main{max-width:900px;margin:0 auto;padding:24px}\
nav a{color:#7dd3fc;margin-right:16px}\
section{background:#111827;border-radius:12px;padding:20px;margin:20px 0}\
input,textarea{background:#1f2937;color:#e6edf3;border:1px solid #374151;border-radius:6px;padding:6px}\
button{background:#2563eb;color:#fff;border:0;border-radius:6px;padding:6px 12px;cursor:pointer}\
.output{background:#0b1220;border-left:4px solid #2563eb;padding:12px;white-space:pre-wrap}\
.error{border-left-color:#dc2626}\
.flash{padding:10px;border-radius:6px;margin:12px 0}\
.success{background:#14532d}.info{background:#1e3a8a}.warning{background:#78350f}\
table{border-collapse:collapse}td,th{padding:4px 12px;text-align:left}";

/// Escape text for HTML element and attribute content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the full page. `flash` is the one-shot message taken from the session.
pub fn page(session: &Session, flash: Option<&Flash>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    let _ = write!(
        html,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>AI Student Assistant</title><style>{}</style></head><body><main>\
         <h1>AI Student Assistant</h1>\
         <nav><a href=\"#chat\">Chat Assistant</a><a href=\"#grades\">Grade Calculator</a>\
         <a href=\"#productivity\">Productivity Dashboard</a></nav>",
        STYLE
    );
    if let Some(flash) = flash {
        let class = match flash.level {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
        };
        let _ = write!(
            html,
            "<div class=\"flash {}\">{}</div>",
            class,
            escape(&flash.message)
        );
    }
    chat_section(&mut html, session);
    grade_section(&mut html, session);
    productivity_section(&mut html, session);
    let _ = write!(
        html,
        "<form method=\"post\" action=\"/session/end\"><button>End session</button></form>\
         <p><small>Session started {}</small></p></main></body></html>",
        session.started_at.format("%Y-%m-%d %H:%M UTC")
    );
    html
}

fn chat_section(html: &mut String, session: &Session) {
    let _ = write!(
        html,
        "<section id=\"chat\"><h2>Chat Assistant</h2>\
         <form method=\"post\" action=\"/ask\">\
         <label>Ask a question about the college, courses, facilities, contacts, or student life<br>\
         <input name=\"question\" size=\"70\" value=\"{}\"></label> <button>Ask</button></form>\
         <p>",
        escape(&session.question)
    );
    for q in QUICK_QUESTIONS {
        let _ = write!(
            html,
            "<form method=\"post\" action=\"/ask\" style=\"display:inline\">\
             <input type=\"hidden\" name=\"question\" value=\"{0}\"><button>{0}</button></form> ",
            escape(q)
        );
    }
    html.push_str(
        "<form method=\"post\" action=\"/ask/clear\" style=\"display:inline\">\
         <button>Clear</button></form></p>",
    );

    match &session.answer {
        Panel::Empty => {}
        Panel::Ready(a) => {
            let class = match a.answer {
                Answer::Generated(_) => "output",
                Answer::NoAnswer => "output info",
            };
            let _ = write!(
                html,
                "<div class=\"{}\">{}</div><p><a href=\"/export/answer.pdf\">Download PDF</a></p>",
                class,
                escape(a.answer.text())
            );
        }
        Panel::Failed(msg) => output_error(html, msg),
    }
    html.push_str("</section>");
}

fn grade_section(html: &mut String, session: &Session) {
    let _ = write!(
        html,
        "<section id=\"grades\"><h2>Grade Calculator</h2>\
         <form method=\"post\" action=\"/grades/rows\">\
         <label>How many subjects? <input type=\"number\" name=\"count\" min=\"1\" max=\"{}\" value=\"{}\"></label> \
         <button>Update</button></form>\
         <form method=\"post\" action=\"/grades\"><table>\
         <tr><th>Subject</th><th>Marks</th></tr>",
        MAX_SUBJECTS,
        session.subjects.len()
    );
    for (i, row) in session.subjects.iter().enumerate() {
        let _ = write!(
            html,
            "<tr><td><input name=\"name\" placeholder=\"Subject {} name\" value=\"{}\"></td>\
             <td><input type=\"number\" name=\"score\" min=\"0\" max=\"100\" value=\"{}\"></td></tr>",
            i + 1,
            escape(&row.name),
            escape(&row.score)
        );
    }
    html.push_str("</table><button>Calculate Grades</button></form>");

    match &session.grades {
        Panel::Empty => {}
        Panel::Ready(report) => {
            html.push_str("<div class=\"output\"><b>Subject-wise:</b><ul>");
            for s in &report.subjects {
                let _ = write!(html, "<li><b>{}</b>: {}</li>", escape(&s.name), s.score);
            }
            let summary = &report.summary;
            let _ = write!(
                html,
                "</ul><b>Total:</b> {}/{}<br><b>Percentage:</b> {:.2}%<br>\
                 <b>CGPA (est.):</b> {:.2}<br><b>Grade:</b> {}</div>\
                 <p><a href=\"/export/grades.pdf\">Download PDF</a></p>",
                summary.total, summary.possible, summary.percentage, summary.cgpa, summary.letter
            );
        }
        Panel::Failed(msg) => output_error(html, msg),
    }
    html.push_str("</section>");
}

fn productivity_section(html: &mut String, session: &Session) {
    let _ = write!(
        html,
        "<section id=\"productivity\"><h2>Student Productivity Dashboard</h2>\
         <h3>Notes / To-Do List</h3>\
         <form method=\"post\" action=\"/notes\">\
         <textarea name=\"notes\" rows=\"8\" cols=\"80\" placeholder=\"Write your notes here...\">{}</textarea><br>\
         <button>Save notes</button></form>\
         <form method=\"post\" action=\"/todo\">\
         <input name=\"item\" placeholder=\"Add a To-Do item\"> <button>Add Task</button></form>\
         <form method=\"post\" action=\"/todo/clear\"><button>Clear Tasks</button></form>",
        escape(&session.notes)
    );
    if !session.todo.is_empty() {
        html.push_str("<p><b>Your To-Do:</b></p><ol>");
        for item in &session.todo {
            let _ = write!(html, "<li>{}</li>", escape(item));
        }
        html.push_str("</ol>");
    }

    let _ = write!(
        html,
        "<h3>Study Suggestions</h3>\
         <form method=\"post\" action=\"/study\">\
         <input name=\"topic\" size=\"50\" placeholder=\"Study topic\" value=\"{}\"> \
         <button>Get AI Study Suggestions</button></form>\
         <form method=\"post\" action=\"/study/tips\"><button>Quick Tips (Local)</button></form>",
        escape(&session.study_topic)
    );
    match &session.study {
        Panel::Empty => {}
        Panel::Ready(StudyOutput::Plan { text, .. }) => {
            let _ = write!(
                html,
                "<div class=\"output\">{}</div><p><a href=\"/export/study.pdf\">Download PDF</a></p>",
                escape(text)
            );
        }
        Panel::Ready(StudyOutput::Tips) => {
            let _ = write!(
                html,
                "<div class=\"flash info\">{}</div>",
                escape(QUICK_STUDY_TIPS)
            );
        }
        Panel::Failed(msg) => output_error(html, msg),
    }
    html.push_str("</section>");
}

fn output_error(html: &mut String, msg: &str) {
    let _ = write!(html, "<div class=\"output error\">{}</div>", escape(msg));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions;
    use crate::session::AnsweredQuestion;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_page_has_three_sections() {
        let html = page(&Session::new(), None);
        assert!(html.contains("id=\"chat\""));
        assert!(html.contains("id=\"grades\""));
        assert!(html.contains("id=\"productivity\""));
        for q in QUICK_QUESTIONS {
            assert!(html.contains(q));
        }
    }

    #[test]
    fn test_todo_items_are_escaped() {
        let mut s = Session::new();
        actions::add_todo(&mut s, "<b>bold</b>");
        let html = page(&s, None);
        assert!(html.contains("<li>&lt;b&gt;bold&lt;/b&gt;</li>"));
    }

    #[test]
    fn test_answer_and_export_link() {
        let mut s = Session::new();
        s.answer = Panel::Ready(AnsweredQuestion {
            question: "Courses?".into(),
            answer: Answer::Generated("BCA, B.Com, BBA".into()),
        });
        let html = page(&s, None);
        assert!(html.contains("BCA, B.Com, BBA"));
        assert!(html.contains("/export/answer.pdf"));
    }

    #[test]
    fn test_grade_report_rendered() {
        let mut s = Session::new();
        actions::calculate_grades(
            &mut s,
            vec![
                crate::session::SubjectRow { name: "A".into(), score: "40".into() },
                crate::session::SubjectRow { name: "B".into(), score: "30".into() },
                crate::session::SubjectRow { name: "C".into(), score: "20".into() },
            ],
        );
        let html = page(&s, None);
        assert!(html.contains("90/300"));
        assert!(html.contains("30.00%"));
        assert!(html.contains("Fail"));
    }

    #[test]
    fn test_flash_rendered() {
        let flash = Flash {
            level: FlashLevel::Warning,
            message: "Please type a task.".into(),
        };
        let html = page(&Session::new(), Some(&flash));
        assert!(html.contains("flash warning"));
    }
}
