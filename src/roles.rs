//! Role tag normalization.
//!
//! The backend hands out Spring-style tags (`ROLE_ADMIN`), older pages stored
//! lowercase tags (`parent`). Role checks in [`crate::session`] use exact
//! matching, so tags are normalized once at the boundary where they enter
//! the crate: the login response, stored user records, and page role
//! declarations.

const ROLE_PREFIX: &str = "ROLE_";

/// Canonical form of a role tag: trimmed, uppercase, without `ROLE_`.
#[must_use]
pub fn normalize(tag: &str) -> String {
    let upper = tag.trim().to_ascii_uppercase();
    match upper.strip_prefix(ROLE_PREFIX) {
        Some(rest) => rest.to_owned(),
        None => upper,
    }
}

/// Normalize a list of tags, dropping empties and duplicates while keeping
/// the first occurrence's position (the primary role stays first).
#[must_use]
pub fn normalize_all<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let role = normalize(tag.as_ref());
        if !role.is_empty() && !out.contains(&role) {
            out.push(role);
        }
    }
    out
}

/// Parse a comma- or whitespace-separated role declaration such as
/// `"ENSEIGNANT, ADMIN"`.
#[must_use]
pub fn parse_declaration(raw: &str) -> Vec<String> {
    let tags: Vec<&str> = raw.split(|c: char| c == ',' || c.is_whitespace()).collect();
    normalize_all(&tags)
}

#[cfg(test)]
#[path = "roles_test.rs"]
mod tests;
