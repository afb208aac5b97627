use serde::{Deserialize, Serialize};

const SMALL_TALK_TRIGGERS: &[&str] = &[
    "hi", "hello", "hey", "how are you", "thanks", "thank you", "good morning", "good evening", "yo", "sup", "what's up",
];

const META_WORDS: &[&str] = &["upload", "document", "file"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    SmallTalk,
    DocQa,
}

/// Rule-based router. Triggers match as substrings of the lowercased text,
/// so "this" counts as containing "hi".
pub fn detect_intent(text: &str) -> Intent {
    let t = text.trim().to_lowercase();
    if t.is_empty() { return Intent::DocQa; }
    if SMALL_TALK_TRIGGERS.iter().chain(META_WORDS).any(|w| t.contains(w)) {
        return Intent::SmallTalk;
    }
    Intent::DocQa
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greetings_and_meta_questions_are_small_talk() {
        assert_eq!(detect_intent("Hello there"), Intent::SmallTalk);
        assert_eq!(detect_intent("  THANK YOU  "), Intent::SmallTalk);
        assert_eq!(detect_intent("can I upload a pdf?"), Intent::SmallTalk);
        assert_eq!(detect_intent("which file did you read"), Intent::SmallTalk);
    }

    #[test]
    fn everything_else_is_doc_qa() {
        assert_eq!(detect_intent(""), Intent::DocQa);
        assert_eq!(detect_intent("   "), Intent::DocQa);
        assert_eq!(detect_intent("what is the warranty period"), Intent::DocQa);
    }

    #[test]
    fn triggers_match_inside_words() {
        assert_eq!(detect_intent("summarize this"), Intent::SmallTalk);
    }

    #[test]
    fn serializes_as_mode_label() {
        assert_eq!(serde_json::to_string(&Intent::DocQa).unwrap(), "\"DOC_QA\"");
        assert_eq!(serde_json::to_string(&Intent::SmallTalk).unwrap(), "\"SMALL_TALK\"");
    }
}
