//! File system utilities

use std::path::PathBuf;

/// Expands a leading `~` and `$VAR` / `${VAR}` references
///
/// Unknown variables expand to an empty string, matching shell behavior.
pub fn expand_path(raw: &str) -> PathBuf {
    expand_path_with(raw, dirs::home_dir(), |key| std::env::var(key).ok())
}

fn expand_path_with(
    raw: &str,
    home: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> PathBuf {
    let mut expanded = String::with_capacity(raw.len());
    let rest = match (raw.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            expanded.push_str(&home.to_string_lossy());
            rest
        }
        _ => raw,
    };

    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            expanded.push(c);
            continue;
        }
        let mut name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                name.push(c);
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    name.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
        }
        if name.is_empty() {
            expanded.push('$');
        } else {
            expanded.push_str(&env(&name).unwrap_or_default());
        }
    }
    PathBuf::from(expanded)
}
