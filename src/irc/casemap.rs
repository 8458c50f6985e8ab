//! Nickname comparison under the `rfc1459` case mapping.
//!
//! Besides ASCII letters, `[]\~` are the uppercase forms of `{}|^`, so
//! `Guest[1]` and `guest{1}` name the same user.

/// Lowercase one character under `rfc1459`.
#[inline]
pub const fn fold_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c.to_ascii_lowercase(),
    }
}

/// Canonical form of `name`, suitable as a map key.
pub fn fold(name: &str) -> String {
    name.chars().map(fold_char).collect()
}

/// Whether `a` and `b` name the same nick.
pub fn eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .zip(b.chars())
            .all(|(x, y)| fold_char(x) == fold_char(y))
}
