use serde_json;

/// Quote a string as a C++ string literal, escaping as JSON does.
pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote() {
        assert_eq!(quote("value"), "\"value\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
