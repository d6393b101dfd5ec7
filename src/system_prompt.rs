//! System prompt construction per document type
//!
//! The prompt is identical for every request of a given type, so it is
//! sent as a cacheable block.

use crate::conversation::ContentType;
use crate::editor::TOOL_NAME;
use crate::llm::SystemContent;

/// Role and editing discipline shared by every document type
const BASE_PROMPT: &str = r"You are an editing assistant working on a single document together with the user. The document lives in an editor; you change it only through the {tool} tool.

How to work:
- Start with the view command if you are unsure of the current content or line numbers.
- Make the smallest edit that accomplishes the instruction. Prefer str_replace for changes inside a line and insert or delete_range for whole lines.
- When creating a document from nothing, insert it at line 0.
- If an edit fails, read the error, fix the arguments, and try again. Do not repeat a failing call unchanged.
- When the document is finished, stop calling tools and reply with a short summary of what you changed.";

const CSV_RULES: &str = r"The document is CSV.
- The first line is the header row. Keep the number of columns consistent on every row.
- Quote fields that contain commas, quotes or line breaks, doubling any embedded quotes.
- Do not add commentary, code fences or blank lines to the document itself.";

const MARKDOWN_RULES: &str = r"The document is Markdown.
- Keep the heading hierarchy consistent and do not skip levels.
- Leave one blank line between block elements such as paragraphs, lists and tables.
- Do not wrap the document in a code fence.";

/// Build the system prompt for a document type
pub fn build_system_prompt(content_type: ContentType) -> Vec<SystemContent> {
    let rules = match content_type {
        ContentType::Csv => CSV_RULES,
        ContentType::Markdown => MARKDOWN_RULES,
    };
    let base = BASE_PROMPT.replace("{tool}", TOOL_NAME);
    vec![SystemContent::cached(format!("{base}\n\n{rules}"))]
}
