//! Small string helpers shared by the client and the protocol layer.

const MAX_API_ERROR_CHARS: usize = 200;
const REDACTED: &str = "[REDACTED]";

/// Replace every occurrence of each secret with `[REDACTED]`.
///
/// Empty secrets are ignored so callers can pass optional credential parts
/// without filtering them first.
pub fn scrub_secrets(input: &str, secrets: &[&str]) -> String {
    let mut scrubbed = input.to_string();
    for secret in secrets {
        let secret = secret.trim();
        if secret.is_empty() {
            continue;
        }
        scrubbed = scrubbed.replace(secret, REDACTED);
    }
    scrubbed
}

/// Truncate to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_with_ellipsis(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }

    let end = input
        .char_indices()
        .nth(max_chars)
        .map_or(input.len(), |(idx, _)| idx);

    format!("{}...", &input[..end])
}

/// Sanitize upstream error text by scrubbing secrets and truncating length.
pub fn sanitize_api_error(input: &str, secrets: &[&str]) -> String {
    let scrubbed = scrub_secrets(input.trim(), secrets);
    truncate_with_ellipsis(&scrubbed, MAX_API_ERROR_CHARS)
}

/// Mask a secret for display, keeping only the last four characters.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("****{tail}")
}
