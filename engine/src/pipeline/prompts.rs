//! Prompt builders for the pipeline stages.

use crate::llm::Message;
use crate::text::excerpt;

const SAME_LANGUAGE: &str = "Write in the same language as the user's request.";

/// Render tool results as a research notes section, or nothing
pub fn research_notes(results: &[Message]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut notes = String::from("\n\nResearch notes gathered with tools:\n");
    for result in results {
        let source = result
            .tool_call
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("tool");
        notes.push_str(&format!("- [{}] {}\n", source, result.content.trim()));
    }
    notes
}

pub fn intent(request: &str) -> String {
    format!(
        "Decide whether the following request is about software development \
         (requirements analysis, system design, task planning, writing code).\n\n\
         Request: {request}\n\n\
         Answer with \"yes\" or \"no\" as the first word, then one sentence of reasoning."
    )
}

pub fn project_name(request: &str) -> String {
    format!(
        "Propose a short English CamelCase folder name for a project implementing the \
         request below. Reply with the name only, nothing else.\n\n{request}"
    )
}

pub fn requirements(request: &str, notes: &str) -> String {
    format!(
        "Write a requirements document in Markdown for the following request.\n\n\
         Request: {request}{notes}\n\n\
         Include an introduction, user stories, and numbered acceptance criteria for each \
         requirement. Clarify unfamiliar concepts instead of guessing. {SAME_LANGUAGE}"
    )
}

pub fn design(requirements: &str, notes: &str) -> String {
    format!(
        "Write a technical design document in Markdown based on these requirements.\n\n\
         Requirements:\n{requirements}{notes}\n\n\
         Cover architecture, components and interfaces, data models, error handling and \
         testing strategy. {SAME_LANGUAGE}"
    )
}

pub fn tasks(design: &str, notes: &str) -> String {
    format!(
        "Turn this design into an implementation plan in Markdown.\n\n\
         Design:\n{design}{notes}\n\n\
         Produce a numbered checklist of small, incremental coding tasks. Each task names the \
         requirement it serves. {SAME_LANGUAGE}"
    )
}

pub fn code(tasks: &str, notes: &str) -> String {
    format!(
        "Implement the following task list.\n\n\
         Tasks:\n{tasks}{notes}\n\n\
         Put every file in its own fenced code block whose opening line names the file, \
         for example:\n\
         ```python filename=app/main.py\n\
         ...\n\
         ```\n\
         Use paths relative to the source directory. Include imports, error handling \
         and a short usage example."
    )
}

pub fn response(request: &str, notes: &str) -> String {
    format!("Answer the user's question directly and concisely.\n\nQuestion: {request}{notes}")
}

pub fn work_report(request: &str, kind: &str, content: &str, excerpt_chars: usize) -> String {
    format!(
        "Write a brief work report about the {kind} that was just produced.\n\n\
         User request: {request}\n\n\
         {kind} excerpt: {}...\n\n\
         Structure: what was completed, the main points, and what comes next. \
         Keep it under 300 words. {SAME_LANGUAGE}",
        excerpt(content, excerpt_chars)
    )
}
