use tracing::debug;

/// Delimiter placed on both sides of the payload
pub const PAYLOAD_FENCE: &str = "```";

/// Cue appended to every chunk before it is sent for summarization
const TLDR_CUE: &str = "\n tl;dr:";

/// Bullet and word ceilings requested for each chunk summary
const MAP_MAX_BULLETS: usize = 5;
const MAP_MAX_WORDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Summarize one chunk
    Map,
    /// Merge and deduplicate the chunk summaries
    Reduce,
}

/// Parameters substituted into both templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub language: String,
    pub detail_level: String,
    pub max_words: usize,
}

impl Default for PromptContext {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            detail_level: "analytical".to_string(),
            max_words: 200,
        }
    }
}

pub fn build(kind: PromptKind, payload: &str, context: &PromptContext) -> String {
    let payload = fence_safe(payload);
    match kind {
        PromptKind::Map => format!(
            r#"You will be provided with text from a webpage delimited by triple backticks.
Your task is to summarize the text in an executive summary style with a {detail} level of detail.
Provide the answer in at most {bullets} bullet point sentences and at most {words} words.
Respond "Unsure about answer" if not sure about the answer.
Reply in {language}.

{fence}{payload}{cue}{fence}
"#,
            detail = context.detail_level,
            bullets = MAP_MAX_BULLETS,
            words = MAP_MAX_WORDS,
            language = context.language,
            fence = PAYLOAD_FENCE,
            payload = payload,
            cue = TLDR_CUE,
        ),
        PromptKind::Reduce => format!(
            r#"Your task is to remove duplicate or similar information in the text delimited by triple backticks.
Keep the bullet point sentence format and create smooth transitions between the bullet points.
Keep a consistent, {detail} tone and use at most {words} words.
Reply in {language}.

{fence}{payload}{fence}
"#,
            detail = context.detail_level,
            words = context.max_words,
            language = context.language,
            fence = PAYLOAD_FENCE,
            payload = payload,
        ),
    }
}

/// Turn every backtick run of fence length or more into quotes, plus any run touching
/// either end of the payload since it would merge with the fence.
fn fence_safe(payload: &str) -> std::borrow::Cow<'_, str> {
    if !payload.contains(PAYLOAD_FENCE) && !payload.starts_with('`') && !payload.ends_with('`') {
        return payload.into();
    }
    debug!("payload could close the fence, neutralizing backtick runs");

    let mut out = String::with_capacity(payload.len());
    let mut rest = payload;
    while let Some(pos) = rest.find('`') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let run = tail.len() - tail.trim_start_matches('`').len();
        let start = payload.len() - rest.len() + pos;
        let touches_fence = start == 0 || start + run == payload.len();
        let mark = if run >= PAYLOAD_FENCE.len() || touches_fence { "'" } else { "`" };
        out.push_str(&mark.repeat(run));
        rest = &tail[run..];
    }
    out.push_str(rest);
    out.into()
}
