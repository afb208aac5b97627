//! Prompt templates for small talk and grounded document QA.
use docchat_core::types::{ContextItem, Turn};

/// History turns included in a prompt.
pub const PROMPT_HISTORY_TURNS: usize = 4;
/// Characters of each context snippet included in a prompt.
pub const SNIPPET_CHARS: usize = 1200;

const GROUNDING_INSTRUCTION: &str = "You are a helpful assistant. Use ONLY the provided Context Snippets to answer the user. \
If the answer is not clearly contained in the snippets, say: \"I don't know.\" \
Always include a 'Citations' section listing the sources you used. \
Citations should be in the form: [filename (and page if available)].";

const ANSWER_FORMAT: &str = "Format your response as:\nAnswer:\n<your concise grounded answer>\n\nCitations:\n- <filename (page X)>\n- <filename>\n";

/// `filename (page p)`, or just the filename when there is no page.
pub fn source_label(filename: &str, page: Option<u32>) -> String {
    match page {
        Some(p) => format!("{filename} (page {p})"),
        None => filename.to_string(),
    }
}

fn push_history(lines: &mut Vec<String>, heading: &str, history: &[Turn]) {
    if history.is_empty() { return; }
    lines.push(heading.to_string());
    let start = history.len().saturating_sub(PROMPT_HISTORY_TURNS);
    lines.extend(history[start..].iter().map(|t| format!("{}: {}", t.role, t.text)));
    lines.push("---".to_string());
}

pub fn small_talk_prompt(history: &[Turn], user_text: &str) -> String {
    let mut lines = Vec::new();
    push_history(&mut lines, "Recent chat:", history);
    lines.push("Instruction: Reply naturally and briefly.".to_string());
    lines.push(format!("User: {user_text}"));
    lines.join("\n")
}

pub fn doc_qa_prompt(history: &[Turn], user_text: &str, contexts: &[ContextItem]) -> String {
    let mut lines = Vec::new();
    push_history(&mut lines, "Recent chat (for context only; do NOT cite these):", history);
    lines.push(GROUNDING_INSTRUCTION.to_string());
    lines.push(format!("User question: {user_text}\n"));
    lines.push("Context Snippets:".to_string());
    for (i, c) in contexts.iter().enumerate() {
        lines.push(format!("[{}] {}", i + 1, source_label(&c.filename, c.page)));
        lines.push(c.text.chars().take(SNIPPET_CHARS).collect());
        lines.push("---".to_string());
    }
    lines.push(ANSWER_FORMAT.to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(n: usize) -> Vec<Turn> {
        (0..n).map(|i| if i % 2 == 0 { Turn::user(format!("q{i}")) } else { Turn::assistant(format!("a{i}")) }).collect()
    }

    #[test]
    fn small_talk_without_history() {
        assert_eq!(small_talk_prompt(&[], "hi"), "Instruction: Reply naturally and briefly.\nUser: hi");
    }

    #[test]
    fn small_talk_keeps_last_four_turns() {
        let p = small_talk_prompt(&history(6), "thanks");
        assert!(p.starts_with("Recent chat:\nUser: q2\nAssistant: a3\nUser: q4\nAssistant: a5\n---\n"));
        assert!(!p.contains("q0"));
        assert!(p.ends_with("User: thanks"));
    }

    #[test]
    fn doc_qa_numbers_and_truncates_snippets() {
        let long = "x".repeat(1500);
        let contexts = vec![
            ContextItem { text: long, filename: "manual.pdf".into(), page: Some(3) },
            ContextItem { text: "short".into(), filename: "notes.txt".into(), page: None },
        ];
        let p = doc_qa_prompt(&history(1), "how long?", &contexts);
        assert!(p.contains("Recent chat (for context only; do NOT cite these):\nUser: q0\n---"));
        assert!(p.contains("User question: how long?\n"));
        assert!(p.contains(&format!("[1] manual.pdf (page 3)\n{}\n---", "x".repeat(1200))));
        assert!(!p.contains(&"x".repeat(1201)));
        assert!(p.contains("[2] notes.txt\nshort\n---"));
        assert!(p.contains("I don't know."));
        assert!(p.trim_end().ends_with("- <filename>"));
    }

    #[test]
    fn labels() {
        assert_eq!(source_label("a.pdf", Some(2)), "a.pdf (page 2)");
        assert_eq!(source_label("b.md", None), "b.md");
    }
}
