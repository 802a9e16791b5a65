//! LLM prompts for page extraction.

/// System prompt: describes the record schema and the classification rule.
pub const SYSTEM_PROMPT: &str = r#"You are an analyst who catalogues newly launched software products.

Given the raw HTML of a single web page, decide whether the page presents a
specific AI-powered product, tool, app or platform (not a news roundup, a
directory listing, a job post, or a general article) and describe it.

Respond with a single JSON object and nothing else:
{
    "Title": "product name",
    "Website": "canonical product website, if stated",
    "Source URL": "the page URL you were given",
    "Core Functionality": "2-4 sentence description of what the product does",
    "Key Features": ["short feature", "..."],
    "Pricing": "pricing summary, or null if not stated",
    "Target Audience": "who the product is for, or null",
    "Tags": ["lowercase topic tag", "..."],
    "ai_tool_annotation": "ai_tool" or "not_ai_tool",
    "Publish Date": "YYYY-MM-DD launch or publication date if stated, else null"
}

Use "not_ai_tool" whenever you are unsure. Never invent pricing or dates."#;

/// User prompt template. `{url}` and `{content}` are substituted.
pub const USER_PROMPT: &str = r#"Page URL: {url}

Page HTML (may be truncated):
{content}"#;

/// Fill the user prompt for one page.
pub fn user_prompt(url: &str, content: &str) -> String {
    USER_PROMPT
        .replace("{url}", url)
        .replace("{content}", content)
}
