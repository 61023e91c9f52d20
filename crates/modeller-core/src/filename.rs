//! Portable file-name validation.
//!
//! Every node title doubles as a file name (`<title>.txt`), so titles must be
//! usable on both Windows and Unix file systems.

/// Characters Windows refuses in file names.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Windows device names, matched case-insensitively against the part of the
/// name before its first dot (`CON.txt` is still reserved).
const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Whether `name` can be used as a file name on every supported platform.
pub fn is_valid_filename(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }

    if name.chars().any(|c| (c as u32) < 32 || FORBIDDEN.contains(&c)) {
        return false;
    }

    if name.ends_with(' ') || name.ends_with('.') {
        return false;
    }

    let base = name.split('.').next().unwrap_or(name);
    !RESERVED.iter().any(|reserved| reserved.eq_ignore_ascii_case(base))
}
