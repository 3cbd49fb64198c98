//! Dependency extraction from expression text.
//!
//! Scans raw expression text for every receiver-prefixed member chain
//! (`this.a.b`) and returns the dotted paths the expression reads. This is a
//! syntactic approximation, not a semantic one: it cannot see paths built
//! dynamically, and such expressions silently fail to re-bind on change.
//! Known limitation, by contract.
//!
//! Duplicate chains within one expression are preserved: each occurrence
//! becomes its own registration.

/// Extract every dotted view-model path referenced via the `this.` receiver
/// prefix in `text`, left to right, longest chain first, non-overlapping.
///
/// `this` inside string literals or as part of a longer identifier does not
/// match. A bare `this` with no member chain contributes nothing.
pub fn extract_paths(text: &str) -> Vec<String> {
    const RECEIVER: &str = "this";

    let chars: Vec<char> = text.chars().collect();
    let mut paths = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        // Skip string literals so quoted text never registers a path.
        if chars[i] == '\'' || chars[i] == '"' {
            let quote = chars[i];
            i += 1;
            while i < chars.len() && chars[i] != quote {
                i += 1;
            }
            i += 1;
            continue;
        }

        if !matches_receiver(&chars, i) {
            i += 1;
            continue;
        }

        // Longest contiguous `.<identifier>` chain after the receiver.
        let mut end = i + RECEIVER.len();
        let mut segments: Vec<String> = Vec::new();
        while end < chars.len() && chars[end] == '.' {
            let seg_start = end + 1;
            let mut seg_end = seg_start;
            while seg_end < chars.len() && is_word(chars[seg_end]) {
                seg_end += 1;
            }
            if seg_end == seg_start {
                break;
            }
            segments.push(chars[seg_start..seg_end].iter().collect());
            end = seg_end;
        }

        if segments.is_empty() {
            i += RECEIVER.len();
            continue;
        }

        paths.push(segments.join("."));
        i = end;
    }

    paths
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when `this` starts at `i` and is its own word.
fn matches_receiver(chars: &[char], i: usize) -> bool {
    const RECEIVER: [char; 4] = ['t', 'h', 'i', 's'];

    if i + RECEIVER.len() > chars.len() || chars[i..i + RECEIVER.len()] != RECEIVER {
        return false;
    }
    if i > 0 && is_word(chars[i - 1]) {
        return false;
    }
    match chars.get(i + RECEIVER.len()) {
        Some(c) if is_word(*c) => false,
        _ => true,
    }
}
