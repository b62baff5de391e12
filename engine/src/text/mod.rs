//! Pure text helpers used by the pipeline stages.

use regex::Regex;
use sdk::errors::EngineError;

pub mod code_blocks;
pub mod naming;

pub use code_blocks::{extract_code_blocks, named_files, CodeBlock};
pub use naming::{sanitize_project_name, unique_dir_name, DEFAULT_PROJECT_NAME};

/// Removes `<tag>...</tag>` reasoning spans from model output.
#[derive(Debug, Clone)]
pub struct ReasoningFilter {
    pattern: Regex,
}

impl ReasoningFilter {
    /// Build a filter for `<tag>` / `</tag>` pairs
    pub fn new(tag: &str) -> Result<Self, EngineError> {
        if tag.is_empty() {
            return Err(EngineError::Config("reasoning tag must not be empty".into()));
        }
        let tag = regex::escape(tag);
        let pattern = Regex::new(&format!("(?s)<{tag}>.*?</{tag}>"))
            .map_err(|e| EngineError::Config(format!("invalid reasoning tag: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Remove every paired span, non-greedily and across newlines.
    ///
    /// Text without a complete pair comes back unchanged.
    pub fn strip(&self, text: &str) -> String {
        self.pattern.replace_all(text, "").into_owned()
    }
}

/// One-shot form of [`ReasoningFilter::strip`].
pub fn strip_reasoning(text: &str, tag: &str) -> Result<String, EngineError> {
    Ok(ReasoningFilter::new(tag)?.strip(text))
}

/// Classify a yes/no answer by the first verdict it contains.
///
/// Verdict words are `yes` / `true` / `是` for yes and `no` / `false` / `否` /
/// `不是` for no; a leading `y` or `n` also counts. Whichever comes first
/// wins, so "The answer is yes." is yes and "否，这是闲聊" is no. An answer
/// without any verdict counts as no.
pub fn parse_intent(answer: &str) -> bool {
    let lowered = answer.to_lowercase();
    let mut chars = lowered.chars().peekable();
    let mut leading = true;

    while let Some(c) = chars.next() {
        if c.is_ascii_alphanumeric() {
            let mut word = String::from(c);
            while let Some(&next) = chars.peek() {
                if !next.is_ascii_alphanumeric() {
                    break;
                }
                word.push(next);
                chars.next();
            }
            let first = std::mem::replace(&mut leading, false);
            match word.as_str() {
                "yes" | "true" => return true,
                "no" | "false" => return false,
                "y" if first => return true,
                "n" if first => return false,
                _ => continue,
            }
        }

        match c {
            '否' => return false,
            '不' if chars.peek() == Some(&'是') => return false,
            '是' => return true,
            _ if c.is_alphanumeric() => leading = false,
            _ => {}
        }
    }

    false
}

/// First `max_chars` characters of `text`, on a char boundary.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
