/// Tokens Telegram treats specially, paired with their neutralized form.
const NEUTRALIZED_TOKENS: [(&str, &str); 3] = [
    ("@here", "@.here"),
    ("@everyone", "@.everyone"),
    ("/start", "/.start"),
];

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '[' | ']' | ' ')
}

/// Strip everything outside `[A-Za-z0-9._@[] ]`.
pub fn filter_characters(text: &str) -> String {
    text.chars().filter(|&c| is_allowed(c)).collect()
}

/// Break up `@here`, `@everyone` and `/start` wherever they occur.
pub fn neutralize_tokens(text: &str) -> String {
    NEUTRALIZED_TOKENS
        .iter()
        .fold(text.to_string(), |acc, (token, replacement)| {
            acc.replace(token, replacement)
        })
}

/// Clean untrusted chat text so it can be embedded in an HTML template.
///
/// The character filter runs first, then the special-token substitutions.
/// Lossy and one-way; an input that filters down to nothing yields `""`.
pub fn sanitize_message(text: &str) -> String {
    neutralize_tokens(&filter_characters(text))
}
