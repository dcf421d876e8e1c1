//! Route matching module
//!
//! Matches request paths against patterns such as `/college/:id`. A `:name`
//! segment captures exactly one non-empty path segment. A single trailing
//! slash on the request path is ignored.

/// Values captured from `:name` segments, in pattern order
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PathParams<'a> {
    values: Vec<(&'static str, &'a str)>,
}

impl<'a> PathParams<'a> {
    /// Raw (still percent-encoded) value of a captured segment
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

/// Match `path` against `pattern`, capturing parameters
pub fn match_path<'a>(pattern: &'static str, path: &'a str) -> Option<PathParams<'a>> {
    let path = normalize(path);
    let mut pattern_segments = pattern.split('/');
    let mut path_segments = path.split('/');
    let mut params = PathParams::default();

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (None, None) => return Some(params),
            (Some(expected), Some(actual)) => {
                if let Some(name) = expected.strip_prefix(':') {
                    if actual.is_empty() {
                        return None;
                    }
                    params.values.push((name, actual));
                } else if expected != actual {
                    return None;
                }
            }
            _ => return None,
        }
    }
}

/// Drop one trailing slash, keeping the root path intact
fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_static_path() {
        assert!(match_path("/all-college", "/all-college").is_some());
        assert!(match_path("/all-college", "/all-college/").is_some());
        assert!(match_path("/all-college", "/all-colleges").is_none());
        assert!(match_path("/all-college", "/all-college/extra").is_none());
    }

    #[test]
    fn test_match_root() {
        assert_eq!(match_path("/", "/"), Some(PathParams::default()));
        assert!(match_path("/", "/users").is_none());
    }

    #[test]
    fn test_match_param() {
        let params = match_path("/college/:id", "/college/65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        assert_eq!(params.get("id"), Some("65a1f0c2e4b0a1b2c3d4e5f6"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_param_requires_segment() {
        assert!(match_path("/college/:id", "/college/").is_none());
        assert!(match_path("/college/:id", "/college").is_none());
        assert!(match_path("/college/:id", "/college//x").is_none());
    }

    #[test]
    fn test_nested_param() {
        let params = match_path("/admin/admission/:id", "/admin/admission/abc").unwrap();
        assert_eq!(params.get("id"), Some("abc"));
        assert!(match_path("/admin/admission/:id", "/admin/admissions").is_none());
    }
}
