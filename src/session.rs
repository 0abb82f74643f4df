//! Per-browser session state.
//!
//! A [`Session`] holds everything one student sees across requests: the
//! to-do list, notes, cached form values, and the last result of each tab.
//! Sessions live in a [`SessionStore`] keyed by the `campus_session`
//! cookie. Each one sits behind its own async mutex, so actions within a
//! session run one at a time while different sessions proceed in parallel.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::answer::Answer;
use crate::models::GradeReport;

pub const COOKIE_NAME: &str = "campus_session";
pub const DEFAULT_SUBJECT_COUNT: usize = 3;

/// Last outcome of a tab's action.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Panel<T> {
    #[default]
    Empty,
    Ready(T),
    /// Inline error message; the rest of the session is untouched.
    Failed(String),
}

impl<T> Panel<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Panel::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: Answer,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudyOutput {
    Plan { topic: String, text: String },
    Tips,
}

/// One row of the grade form, kept as typed so the form re-renders verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRow {
    pub name: String,
    pub score: String,
}

impl Default for SubjectRow {
    fn default() -> Self {
        Self {
            name: String::new(),
            score: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
}

/// One-shot message shown on the next render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub question: String,
    pub answer: Panel<AnsweredQuestion>,
    pub subjects: Vec<SubjectRow>,
    pub grades: Panel<GradeReport>,
    pub todo: Vec<String>,
    pub notes: String,
    pub study_topic: String,
    pub study: Panel<StudyOutput>,
    pub flash: Option<Flash>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    fn with_id(id: String) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            question: String::new(),
            answer: Panel::Empty,
            subjects: vec![SubjectRow::default(); DEFAULT_SUBJECT_COUNT],
            grades: Panel::Empty,
            todo: Vec::new(),
            notes: String::new(),
            study_topic: String::new(),
            study: Panel::Empty,
            flash: None,
        }
    }

    pub fn flash(&mut self, level: FlashLevel, message: impl Into<String>) {
        self.flash = Some(Flash {
            level,
            message: message.into(),
        });
    }

    pub fn take_flash(&mut self) -> Option<Flash> {
        self.flash.take()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

struct Entry {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

/// All live sessions.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Look up the session for `id`, creating one when `id` is absent,
    /// unknown, or expired. Returns the session and whether it is new.
    ///
    /// Expired sessions are swept on every call.
    pub async fn get_or_create(&self, id: Option<&str>) -> (Arc<Mutex<Session>>, bool) {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let ttl = self.ttl;
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            tracing::debug!(expired, "swept idle sessions");
        }

        if let Some(entry) = id.and_then(|id| sessions.get_mut(id)) {
            entry.last_seen = now;
            return (entry.session.clone(), false);
        }

        let session = Session::new();
        let id = session.id.clone();
        let handle = Arc::new(Mutex::new(session));
        sessions.insert(
            id.clone(),
            Entry {
                session: handle.clone(),
                last_seen: now,
            },
        );
        tracing::info!(session = %id, "session started");
        (handle, true)
    }

    /// Discard a session. Returns whether it existed.
    pub async fn end(&self, id: &str) -> bool {
        let removed = self.sessions.lock().await.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Extract the session id from a `Cookie` header value.
pub fn session_id_from_cookie(header: &str) -> Option<&str> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == COOKIE_NAME && !value.is_empty()).then_some(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let s = Session::new();
        assert_eq!(s.subjects.len(), DEFAULT_SUBJECT_COUNT);
        assert!(s.todo.is_empty());
        assert_eq!(s.answer, Panel::Empty);
        assert!(Uuid::parse_str(&s.id).is_ok());
    }

    #[test]
    fn test_flash_is_one_shot() {
        let mut s = Session::new();
        s.flash(FlashLevel::Success, "Task added.");
        assert_eq!(s.take_flash().unwrap().message, "Task added.");
        assert!(s.take_flash().is_none());
    }

    #[tokio::test]
    async fn test_store_reuses_known_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (first, created) = store.get_or_create(None).await;
        assert!(created);
        let id = first.lock().await.id.clone();

        let (again, created) = store.get_or_create(Some(&id)).await;
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_creates_new_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (s, created) = store.get_or_create(Some("not-a-session")).await;
        assert!(created);
        assert_ne!(s.lock().await.id, "not-a-session");
    }

    #[tokio::test]
    async fn test_sessions_expire() {
        let store = SessionStore::new(Duration::ZERO);
        let (s, _) = store.get_or_create(None).await;
        let id = s.lock().await.id.clone();
        let (_, created) = store.get_or_create(Some(&id)).await;
        assert!(created);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_end_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (s, _) = store.get_or_create(None).await;
        let id = s.lock().await.id.clone();
        assert!(store.end(&id).await);
        assert!(!store.end(&id).await);
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_cookie_parsing() {
        assert_eq!(
            session_id_from_cookie("theme=dark; campus_session=abc-123"),
            Some("abc-123")
        );
        assert_eq!(session_id_from_cookie("campus_session="), None);
        assert_eq!(session_id_from_cookie("other=1"), None);
    }
}
