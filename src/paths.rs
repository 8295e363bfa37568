//! Lexical, `/`-separated path manipulation.
//!
//! Remote paths never touch the local filesystem, so they are handled as
//! plain strings with POSIX semantics regardless of the host platform.

/// Collapses redundant separators and `.` segments and resolves `..`
/// lexically. Exactly two leading slashes are preserved, any other number
/// collapses to one. An empty result becomes `"."`.
pub fn normpath(path: &str) -> String {
    if path.is_empty() {
        return String::from(".");
    }

    let initial_slashes = if path.starts_with("//") && !path.starts_with("///") {
        2
    } else if path.starts_with('/') {
        1
    } else {
        0
    };

    let mut components: Vec<&str> = Vec::new();
    for component in path.split('/') {
        if component.is_empty() || component == "." {
            continue;
        }
        let keep = component != ".."
            || (initial_slashes == 0 && components.is_empty())
            || components.last() == Some(&"..");
        if keep {
            components.push(component);
        } else {
            components.pop();
        }
    }

    let normalized = format!("{}{}", "/".repeat(initial_slashes), components.join("/"));
    if normalized.is_empty() {
        String::from(".")
    } else {
        normalized
    }
}

/// Joins two paths; an absolute `tail` discards `head`.
pub fn join(head: &str, tail: &str) -> String {
    if tail.starts_with('/') || head.is_empty() {
        tail.to_owned()
    } else if head.ends_with('/') {
        format!("{}{}", head, tail)
    } else {
        format!("{}/{}", head, tail)
    }
}

/// Everything after the last `/`.
pub fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}
