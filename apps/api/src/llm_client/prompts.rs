// Shared prompt fragments. Each stage that calls the model keeps its own prompts.rs;
// this file holds the cross-cutting pieces.

/// Instruction appended to every system prompt that expects an `AgentReply`.
pub const REPLY_ENVELOPE_INSTRUCTION: &str = "\
    IMPORTANT: Your response MUST be valid JSON matching this structure: \
    {\"status\": \"success\" or \"error\", \"message\": \"...\"}. \
    On success, `message` holds the requested content. \
    On failure, `message` holds a clear reason for the failure. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Builds a system prompt from a role description plus the reply envelope rules.
pub fn with_reply_envelope(role: &str) -> String {
    format!("{role}\n\n{REPLY_ENVELOPE_INSTRUCTION}")
}

/// Substitutes `{name}` placeholders in one pass over `template`. Inserted values are
/// never rescanned, so fetched text that happens to contain `{...}` stays literal.
/// Unknown placeholders are kept as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let hit = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match hit {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
