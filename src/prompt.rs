use crate::core::models::TimelineEvent;

/// System instructions for the timeline summarizer.
pub const SYSTEM_PROMPT: &str = "You are a summarizing bot. Given a list of timeline data, summarize the most recent changes in one sentence. \
Keep your description brief and succinct. This will be read as part of a tabled summary of other issues, so \
we just need the relevant details about what changed and by whom. No need to give specific dates or timestamps. \
If mentioning username/login, always format as `@username`, with the backticks. No need to mention the name \
or number of the issue, because that will already be known.";

/// Upper bound on the serialized timeline handed to the model.
pub const MAX_TIMELINE_CHARS: usize = 60_000;

/// Serializes a timeline as JSON, dropping the oldest events until it fits
/// within `MAX_TIMELINE_CHARS`.
///
/// # Errors
///
/// Returns an error if an event cannot be serialized.
pub fn serialize_timeline(events: &[TimelineEvent]) -> Result<String, serde_json::Error> {
    let mut start = 0;
    loop {
        let serialized = serde_json::to_string(&events[start..])?;
        if serialized.chars().count() <= MAX_TIMELINE_CHARS || start + 1 >= events.len() {
            return Ok(serialized);
        }
        start += 1;
    }
}

/// Builds the user message: the timeline, plus the search query as a hint
/// about which changes matter.
#[must_use]
pub fn build_user_prompt(serialized_timeline: &str, context_query: &str) -> String {
    let query = sanitize_query(context_query);
    if query.is_empty() {
        serialized_timeline.to_string()
    } else {
        format!(
            "{serialized_timeline}\n\nThese issues were selected by the search query: {query}"
        )
    }
}

/// Remove control characters and surrounding whitespace from a query.
#[must_use]
pub fn sanitize_query(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
