/// Truncate a string to at most `max_chars` characters, appending an
/// ellipsis marker when anything was cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}

/// Truncate a string slice to at most `max_bytes` bytes at a char boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Locate a fenced ```json block inside a longer model response and return
/// its inner text. Falls back to a bare ``` fence.
pub fn fenced_json(response: &str) -> Option<&str> {
    let start = match response.find("```json") {
        Some(i) => i + "```json".len(),
        None => response.find("```")? + "```".len(),
    };
    let rest = &response[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Strip a whole-response markdown code fence.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_appends_marker() {
        let out = truncate_chars("abcdef", 3);
        assert_eq!(out, "abc…");
    }

    #[test]
    fn truncate_chars_within_bounds() {
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn truncate_to_char_boundary_multibyte() {
        let text = "Hello 世界";
        let truncated = truncate_to_char_boundary(text, 8);
        assert!(truncated.len() <= 8);
        assert!(text.starts_with(truncated));
    }

    #[test]
    fn fenced_json_with_language_tag() {
        let response = "Here is your recipe:\n```json\n{\"title\": \"Stew\"}\n```\nEnjoy!";
        assert_eq!(fenced_json(response), Some("{\"title\": \"Stew\"}"));
    }

    #[test]
    fn fenced_json_bare_fence() {
        let response = "```\n{}\n```";
        assert_eq!(fenced_json(response), Some("{}"));
    }

    #[test]
    fn fenced_json_absent() {
        assert_eq!(fenced_json("just prose, no fences"), None);
    }

    #[test]
    fn strip_code_blocks_variants() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }
}
