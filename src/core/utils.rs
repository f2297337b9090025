//! Path and naming utilities shared by the HTTP and interactive surfaces.

use std::env;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Strips a title down to filesystem-safe characters.
///
/// Keeps alphanumerics, spaces, underscores and hyphens; everything else is
/// removed. Surrounding whitespace is trimmed. An empty result falls back to
/// a default name so callers never build a bare extension.
///
/// # Example
///
/// ```
/// use ytbridge::core::utils::safe_filename;
///
/// assert_eq!(safe_filename("My Video: Part 1/2!"), "My Video Part 12");
/// ```
pub fn safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_' || *c == '-')
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Resolves a destination directory: expands `~`, absolutizes relative
/// paths, and creates the directory if it does not exist. An empty input
/// resolves to the current working directory.
pub fn safe_path(p: &str) -> io::Result<PathBuf> {
    if p.trim().is_empty() {
        return env::current_dir();
    }

    let expanded = shellexpand::tilde(p.trim()).into_owned();
    let mut target = PathBuf::from(expanded);
    if target.is_relative() {
        target = env::current_dir()?.join(target);
    }

    fs::create_dir_all(&target)?;
    // canonicalize only after creation so symlinked parents resolve
    target.canonicalize()
}

/// Converts a byte count into a human-readable string.
///
/// `0` becomes `"0 B"`; otherwise the value is clamped to the largest unit
/// not exceeding its magnitude and rounded to at most two decimals.
pub fn human_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if n == 0 {
        return "0 B".to_string();
    }

    let exp = ((n as f64).log2() / 10.0).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = n as f64 / 1024f64.powi(exp as i32);

    if exp == 0 {
        return format!("{} B", n);
    }

    let mut s = format!("{:.2}", value);
    if s.ends_with('0') {
        s.pop();
    }
    format!("{} {}", s, UNITS[exp])
}
