//! Query string and path segment decoding

/// Decode one `application/x-www-form-urlencoded` component (`+` is a space)
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced).map_or_else(|_| spaced.clone(), |decoded| decoded.into_owned())
}

/// First value of `name` in a raw query string
///
/// Returns `None` when the parameter is absent; a present but empty
/// parameter (`?name=`) yields `Some("")`.
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| decode_component(key) == name)
        .map(|(_, value)| decode_component(value))
}

/// Decode a path segment captured by the router (`+` stays literal)
pub fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |decoded| decoded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param_present() {
        assert_eq!(
            query_param(Some("userEmail=ada%40example.com"), "userEmail"),
            Some("ada@example.com".to_string())
        );
    }

    #[test]
    fn test_query_param_plus_is_space() {
        assert_eq!(
            query_param(Some("page=2&name=new+york"), "name"),
            Some("new york".to_string())
        );
    }

    #[test]
    fn test_query_param_absent_or_empty() {
        assert_eq!(query_param(None, "name"), None);
        assert_eq!(query_param(Some("other=1"), "name"), None);
        assert_eq!(query_param(Some("name="), "name"), Some(String::new()));
        assert_eq!(query_param(Some("name"), "name"), Some(String::new()));
    }

    #[test]
    fn test_first_value_wins() {
        assert_eq!(
            query_param(Some("name=a&name=b"), "name"),
            Some("a".to_string())
        );
    }

    #[test]
    fn test_decode_segment() {
        assert_eq!(decode_segment("ada%40example.com"), "ada@example.com");
        assert_eq!(decode_segment("a+b"), "a+b");
        // Invalid UTF-8 escapes are passed through untouched
        assert_eq!(decode_segment("%FF"), "%FF");
    }
}
