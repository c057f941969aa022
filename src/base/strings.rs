//! String helpers for URL-ish paths.

/// Join two path components with exactly one `/` at the seam.
///
/// Leading slashes on `a` and trailing slashes on `b` are preserved.
pub fn path_join(a: &str, b: &str) -> String {
    match (a.ends_with('/'), b.starts_with('/')) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (true, false) | (false, true) => format!("{}{}", a, b),
        (false, false) => format!("{}/{}", a, b),
    }
}

/// `s` without `prefix`, or `s` unchanged if it does not start with it.
pub fn remove_prefix<'a>(s: &'a str, prefix: &str) -> &'a str {
    s.strip_prefix(prefix).unwrap_or(s)
}

/// `s` without `suffix`, or `s` unchanged if it does not end with it.
pub fn remove_suffix<'a>(s: &'a str, suffix: &str) -> &'a str {
    s.strip_suffix(suffix).unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_inserts_single_slash() {
        assert_eq!(path_join("/a", "b"), "/a/b");
        assert_eq!(path_join("/a/", "b"), "/a/b");
        assert_eq!(path_join("/a", "/b"), "/a/b");
        assert_eq!(path_join("/a/", "/b/"), "/a/b/");
    }

    #[test]
    fn join_with_empty_sides() {
        assert_eq!(path_join("", "b"), "/b");
        assert_eq!(path_join("a", ""), "a/");
    }

    #[test]
    fn prefix_and_suffix() {
        assert_eq!(remove_prefix("/api/users", "/api"), "/users");
        assert_eq!(remove_prefix("/users", "/api"), "/users");
        assert_eq!(remove_suffix("index.html", ".html"), "index");
        assert_eq!(remove_suffix("index", ".html"), "index");
        assert_eq!(remove_suffix("", ""), "");
    }
}
