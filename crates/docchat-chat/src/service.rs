use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use docchat_core::error::{Error, Result};
use docchat_core::traits::{AnswerGenerator, HistoryStore, Retriever};
use docchat_core::types::{ContextItem, Turn};

use crate::intent::{detect_intent, Intent};
use crate::prompts::{doc_qa_prompt, small_talk_prompt, source_label};

pub const NO_ANSWER: &str = "I don't know.";

fn default_top_k() -> usize { 4 }

fn default_alpha() -> f32 { 0.6 }

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub namespace: String,
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Dense weight for fusion, in [0, 1].
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

impl AskRequest {
    pub fn new(namespace: impl Into<String>, question: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), question: question.into(), top_k: default_top_k(), alpha: default_alpha() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub label: String,
}

impl From<&ContextItem> for Citation {
    fn from(c: &ContextItem) -> Self { Self { label: source_label(&c.filename, c.page) } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    pub mode: Intent,
    pub answer: String,
    pub citations: Vec<Citation>,
}

/// Routes a question to small talk or grounded QA and keeps the namespace
/// conversation log.
pub struct ChatService {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn AnswerGenerator>,
    history: Arc<dyn HistoryStore>,
    recent_turns: usize,
}

impl ChatService {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn AnswerGenerator>, history: Arc<dyn HistoryStore>) -> Self {
        Self { retriever, generator, history, recent_turns: 5 }
    }

    pub fn with_recent_turns(mut self, recent_turns: usize) -> Self { self.recent_turns = recent_turns; self }

    pub async fn ask(&self, req: &AskRequest) -> Result<AskResponse> {
        let ns = req.namespace.trim();
        let question = req.question.trim();
        if ns.is_empty() || question.is_empty() {
            return Err(Error::InvalidRequest("namespace and question are required.".into()));
        }

        self.history.append(ns, Turn::user(question));
        let mode = detect_intent(question);
        debug!("ask ns='{}' mode={:?}", ns, mode);

        let (answer, citations) = match mode {
            Intent::SmallTalk => {
                let prompt = small_talk_prompt(&self.history.recent(ns, self.recent_turns), question);
                (self.generator.generate(&prompt).await?, vec![])
            }
            Intent::DocQa => {
                let contexts = self.retriever.retrieve(question, ns, req.top_k, req.alpha).await?;
                if contexts.is_empty() {
                    info!("No context found in namespace '{}'", ns);
                    (NO_ANSWER.to_string(), vec![])
                } else {
                    let prompt = doc_qa_prompt(&self.history.recent(ns, self.recent_turns), question, &contexts);
                    let answer = self.generator.generate(&prompt).await?;
                    (answer, contexts.iter().map(Citation::from).collect())
                }
            }
        };

        self.history.append(ns, Turn::assistant(answer.clone()));
        Ok(AskResponse { mode, answer, citations })
    }
}
