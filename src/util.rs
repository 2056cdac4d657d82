// src/util.rs — Shared utility functions

/// Truncate a string to at most `max_len` bytes on a UTF-8 boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// Shorten a display string to `max_len` bytes, marking the cut with `…`.
pub fn ellipsize(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let marker = '…';
    let keep = max_len.saturating_sub(marker.len_utf8());
    format!("{}{}", truncate_str(s, keep), marker)
}
