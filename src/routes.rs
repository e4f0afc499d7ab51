//! Route classification: public allow-list vs protected pages.
//!
//! Matching is on the final path segment only, so `/login.html` and
//! `/pages/login.html` classify the same way. Query strings and fragments are
//! ignored. Anything not on the allow-list is protected.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Public,
    Protected,
}

#[derive(Debug, Clone, Default)]
pub struct RouteClassifier {
    public_pages: Vec<String>,
}

impl RouteClassifier {
    #[must_use]
    pub fn new(public_pages: &[String]) -> Self {
        Self { public_pages: public_pages.to_vec() }
    }

    #[must_use]
    pub fn classify(&self, path: &str) -> RouteKind {
        let segment = final_segment(path);
        if !segment.is_empty() && self.public_pages.iter().any(|p| p == segment) {
            RouteKind::Public
        } else {
            RouteKind::Protected
        }
    }
}

/// Path without its query string or fragment.
#[must_use]
pub fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Last `/`-separated segment of the path, query and fragment removed.
/// `/` and `""` yield an empty segment.
#[must_use]
pub fn final_segment(path: &str) -> &str {
    let path = strip_query(path);
    path.rsplit('/').next().unwrap_or(path)
}

/// True when both paths name the same page. Query and fragment are ignored and
/// an empty path is the site root.
#[must_use]
pub fn same_page(a: &str, b: &str) -> bool {
    fn canonical(path: &str) -> &str {
        let path = strip_query(path);
        if path.is_empty() { "/" } else { path }
    }
    canonical(a) == canonical(b)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
