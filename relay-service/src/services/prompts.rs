//! System and user message templates for each relay operation.

pub const RECT_TEXT_SYSTEM: &str =
    "You generate concise text to place inside a diagram rectangle.";

const TEXT_GENERATE_SYSTEM: &str =
    "You generate text based on the user's request. Return only the text without explanations.";

pub const CONSISTENCY_SYSTEM: &str = "You are a strict consistency checker. \
Given two short texts from a diagram canvas, determine whether they talk about the same real-world entity/person/thing, \
and if so whether their factual claims are inconsistent. \
Reply ONLY in compact JSON with fields: same_entity (boolean), inconsistent (boolean), reason (short string). \
Keep reason one sentence.";

/// System prompt variant for the free-text endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPrompt<'a> {
    Generate,
    Edit { current_text: &'a str },
}

/// True when `current_text` holds anything besides whitespace.
pub fn has_current_text(current_text: &str) -> bool {
    !current_text.trim().is_empty()
}

impl<'a> TextPrompt<'a> {
    pub fn for_current_text(current_text: &'a str) -> Self {
        if has_current_text(current_text) {
            TextPrompt::Edit { current_text }
        } else {
            TextPrompt::Generate
        }
    }

    pub fn system_message(&self) -> String {
        match self {
            TextPrompt::Generate => TEXT_GENERATE_SYSTEM.to_string(),
            // The existing text is quoted verbatim, untrimmed.
            TextPrompt::Edit { current_text } => format!(
                "You are an AI text editor. The user has existing text: '{}'. \
                 Based on their request, edit, improve, or rewrite this text. \
                 Return only the final text without explanations.",
                current_text
            ),
        }
    }
}

pub fn consistency_user_message(left: &str, right: &str) -> String {
    format!(
        "Left:\n{}\n\nRight:\n{}\n\nReturn JSON only.",
        left.trim(),
        right.trim()
    )
}
