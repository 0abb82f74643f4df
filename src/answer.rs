//! Answer generation.
//!
//! Builds the grounding prompt, calls the [`ChatModel`], and classifies the
//! reply. A model that cannot answer from the context is instructed to reply
//! with [`FALLBACK_ANSWER`]; such replies become [`Answer::NoAnswer`], a
//! successful outcome rather than an error.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{AssistError, AssistResult};
use crate::llm::{create_chat_model, ChatMessage, ChatModel, GenerateParams};
use crate::retrieve::Retriever;

/// Exact sentence the model must reply with when the context lacks the answer.
pub const FALLBACK_ANSWER: &str =
    "I could not find this information in the college data I was given.";

/// Shown on the productivity tab without a model call.
pub const QUICK_STUDY_TIPS: &str = "Use Pomodoro (25/5), active recall, spaced repetition, \
solve previous-year questions, teach back topics.";

const SYSTEM_PROMPT: &str = "You are an AI assistant for RNS First Grade College (RNSFGC), Bengaluru. \
Answer student questions using only the college information given in the context.

Guidelines:
- Prefer the official information for facts (courses, contact, accreditation, departments, facilities, year, founder).
- Use brochure text for descriptive answers.
- Keep answers concise and structured; use bullet lists where helpful.
- If the answer is not present in the context, reply exactly: \"I could not find this information in the college data I was given.\"
- Never invent facts. Be professional and student-friendly.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Generated(String),
    NoAnswer,
}

impl Answer {
    /// Text shown to the student.
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::NoAnswer => FALLBACK_ANSWER,
        }
    }

    /// Classify a raw model reply.
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.trim();
        if reply.is_empty() || reply.contains(FALLBACK_ANSWER) {
            Answer::NoAnswer
        } else {
            Answer::Generated(reply.to_string())
        }
    }
}

pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    params: GenerateParams,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn ChatModel>, params: GenerateParams) -> Self {
        Self { model, params }
    }

    /// The two messages sent for a question.
    pub fn build_messages(context: &str, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!("Context:\n{}\n\nQuestion: {}", context, question)),
        ]
    }

    /// Answer `question` from `context`.
    pub async fn answer(&self, context: &str, question: &str) -> AssistResult<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistError::invalid("question is empty"));
        }
        let messages = Self::build_messages(context, question);
        let reply = self.model.complete(&messages, &self.params).await?;
        let answer = Answer::from_reply(&reply);
        if answer == Answer::NoAnswer {
            tracing::info!(question, "model found no answer in context");
        }
        Ok(answer)
    }

    /// Ask the model for a study plan on `topic`.
    pub async fn suggest_study_plan(&self, topic: &str) -> AssistResult<String> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(AssistError::invalid("please enter a study topic"));
        }
        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(study_plan_prompt(topic)),
        ];
        self.model.complete(&messages, &self.params).await
    }
}

fn study_plan_prompt(topic: &str) -> String {
    format!(
        "Create a focused study plan for a student on the topic: {}. \
         Include: (1) a 2-hour plan broken into Pomodoro cycles, (2) a 7-day weekly plan, \
         (3) memory & practice tips, and (4) one sample practice question.",
        topic
    )
}

/// Retrieval plus generation: the full question-answering path.
pub struct Assistant {
    retriever: Retriever,
    generator: AnswerGenerator,
}

impl Assistant {
    pub fn new(retriever: Retriever, generator: AnswerGenerator) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    /// Wire the configured retriever and chat model together.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let retriever = Retriever::from_config(config)?;
        let model = create_chat_model(&config.llm)?;
        tracing::info!(
            mode = ?retriever.mode(),
            provider = %config.llm.provider,
            model = model.model_name(),
            "assistant ready"
        );
        let generator = AnswerGenerator::new(model, GenerateParams::from_config(&config.llm));
        Ok(Self::new(retriever, generator))
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    pub async fn ask(&self, question: &str) -> AssistResult<Answer> {
        let context = self.retriever.retrieve(question).await?;
        self.generator.answer(&context.text, question).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replies with a canned string and records the last messages.
    struct Canned {
        reply: AssistResult<String>,
        seen: Mutex<Vec<ChatMessage>>,
    }

    impl Canned {
        fn new(reply: AssistResult<String>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatModel for Canned {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            messages: &[ChatMessage],
            _params: &GenerateParams,
        ) -> AssistResult<String> {
            *self.seen.lock().unwrap() = messages.to_vec();
            self.reply.clone()
        }
    }

    fn params() -> GenerateParams {
        GenerateParams {
            max_tokens: 450,
            temperature: 0.12,
        }
    }

    #[test]
    fn test_from_reply_detects_fallback() {
        assert_eq!(Answer::from_reply(FALLBACK_ANSWER), Answer::NoAnswer);
        assert_eq!(
            Answer::from_reply(&format!("  Sorry. {}\n", FALLBACK_ANSWER)),
            Answer::NoAnswer
        );
        assert_eq!(Answer::from_reply("   "), Answer::NoAnswer);
        assert_eq!(
            Answer::from_reply(" BCA, B.Com, BBA "),
            Answer::Generated("BCA, B.Com, BBA".into())
        );
    }

    #[test]
    fn test_no_answer_text_is_fallback() {
        assert_eq!(Answer::NoAnswer.text(), FALLBACK_ANSWER);
    }

    #[test]
    fn test_build_messages_layout() {
        let msgs = AnswerGenerator::build_messages("CTX", "Q?");
        assert_eq!(msgs.len(), 2);
        assert!(msgs[0].content.contains(FALLBACK_ANSWER));
        assert_eq!(msgs[1].content, "Context:\nCTX\n\nQuestion: Q?");
    }

    #[tokio::test]
    async fn test_answer_passes_context() {
        let model = Canned::new(Ok("The college offers BCA.".into()));
        let gen = AnswerGenerator::new(model.clone(), params());
        let answer = gen.answer("UG Programs: BCA", "Courses?").await.unwrap();
        assert_eq!(answer, Answer::Generated("The college offers BCA.".into()));
        let seen = model.seen.lock().unwrap();
        assert!(seen[1].content.contains("UG Programs: BCA"));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let model = Canned::new(Err(AssistError::transport("rate limited")));
        let gen = AnswerGenerator::new(model, params());
        let err = gen.answer("ctx", "q").await.unwrap_err();
        assert!(matches!(err, AssistError::TransportFailure(_)));
    }

    #[tokio::test]
    async fn test_study_plan_requires_topic() {
        let gen = AnswerGenerator::new(Canned::new(Ok("plan".into())), params());
        let err = gen.suggest_study_plan("  ").await.unwrap_err();
        assert!(matches!(err, AssistError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_study_plan_prompt_names_topic() {
        let model = Canned::new(Ok("plan".into()));
        let gen = AnswerGenerator::new(model.clone(), params());
        assert_eq!(gen.suggest_study_plan("Data Structures").await.unwrap(), "plan");
        let seen = model.seen.lock().unwrap();
        assert!(seen[1].content.contains("Data Structures"));
        assert!(seen[1].content.contains("Pomodoro"));
    }
}
