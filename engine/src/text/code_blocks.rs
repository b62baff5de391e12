//! Fenced code block lexer.
//!
//! Splits a model answer into its ```` ``` ```` blocks with a two-state
//! machine. An opening fence may carry a language and a `filename=` attribute:
//!
//! ````text
//! ```python filename="app/main.py"
//! print("hi")
//! ```
//! ````
//!
//! A block still open at end of input is kept.

/// One fenced block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub language: Option<String>,
    pub filename: Option<String>,
    pub code: String,
}

enum LexState {
    Outside,
    Inside(CodeBlock),
}

const FENCE: &str = "```";

/// Extract every fenced block, in order.
pub fn extract_code_blocks(text: &str) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut state = LexState::Outside;

    for line in text.lines() {
        let fence_info = line.trim_start().strip_prefix(FENCE);

        state = match (state, fence_info) {
            (LexState::Outside, Some(info)) => LexState::Inside(open_block(info)),
            (LexState::Outside, None) => LexState::Outside,
            (LexState::Inside(block), Some(_)) => {
                blocks.push(block);
                LexState::Outside
            }
            (LexState::Inside(mut block), None) => {
                block.code.push_str(line);
                block.code.push('\n');
                LexState::Inside(block)
            }
        };
    }

    if let LexState::Inside(block) = state {
        blocks.push(block);
    }

    blocks
}

/// Blocks that name a file and have content, as `(filename, code)`.
pub fn named_files(blocks: &[CodeBlock]) -> Vec<(&str, &str)> {
    blocks
        .iter()
        .filter(|b| !b.code.is_empty())
        .filter_map(|b| b.filename.as_deref().map(|f| (f, b.code.as_str())))
        .collect()
}

fn open_block(info: &str) -> CodeBlock {
    let mut language = None;
    let mut filename = None;

    for (i, part) in info.split_whitespace().enumerate() {
        if let Some(value) = part.strip_prefix("filename=") {
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            if !value.is_empty() {
                filename = Some(value.to_string());
            }
        } else if i == 0 {
            language = Some(part.to_string());
        }
    }

    CodeBlock {
        language,
        filename,
        code: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_blocks() {
        let text = "Here you go:\n```python filename=\"main.py\"\nprint('a')\n```\ntext\n```js filename='web/app.js'\nlet x = 1;\n\nx++;\n```\n";
        let blocks = extract_code_blocks(text);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language.as_deref(), Some("python"));
        assert_eq!(blocks[0].filename.as_deref(), Some("main.py"));
        assert_eq!(blocks[0].code, "print('a')\n");
        assert_eq!(blocks[1].filename.as_deref(), Some("web/app.js"));
        assert_eq!(blocks[1].code, "let x = 1;\n\nx++;\n");
    }

    #[test]
    fn test_filename_without_language() {
        let blocks = extract_code_blocks("```filename=run.sh\necho hi\n```");
        assert_eq!(blocks[0].language, None);
        assert_eq!(blocks[0].filename.as_deref(), Some("run.sh"));
    }

    #[test]
    fn test_filename_after_other_attributes() {
        let blocks = extract_code_blocks("```rust title=x filename=src/lib.rs\nfn a() {}\n```");
        assert_eq!(blocks[0].filename.as_deref(), Some("src/lib.rs"));
    }

    #[test]
    fn test_unterminated_block_is_flushed() {
        let blocks = extract_code_blocks("```py filename=a.py\nx = 1\ny = 2");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].code, "x = 1\ny = 2\n");
    }

    #[test]
    fn test_unnamed_and_empty_blocks_are_not_files() {
        let text = "```python\nprint()\n```\n```py filename=empty.py\n```\n```py filename=ok.py\npass\n```";
        let blocks = extract_code_blocks(text);
        assert_eq!(blocks.len(), 3);
        assert_eq!(named_files(&blocks), vec![("ok.py", "pass\n")]);
    }

    #[test]
    fn test_no_fences() {
        assert!(extract_code_blocks("just prose\nno code").is_empty());
    }
}
