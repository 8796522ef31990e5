//! Environment variable parsing with warn-level logging for invalid values.

/// Parse an environment variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns
///   `default`, so a typo in deployment config degrades loudly instead of
///   silently.
pub fn env_parse_with_default<T: std::str::FromStr + std::fmt::Display>(
    var: &str,
    default: T,
) -> T {
    match std::env::var(var) {
        Ok(v) => match v.parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        Err(_) => default,
    }
}

/// Read a string environment variable with a default fallback.
#[must_use]
pub fn env_string_with_default(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Safety: each test owns a unique var name, so no other thread reads
    // or writes it concurrently.
    fn set_var(name: &str, value: &str) {
        unsafe { std::env::set_var(name, value) };
    }

    fn remove_var(name: &str) {
        unsafe { std::env::remove_var(name) };
    }

    #[test]
    fn test_env_parse_valid_value() {
        let var_name = "SQLAGENT_TEST_PARSE_VALID_41923";
        set_var(var_name, "7");
        let result: u32 = env_parse_with_default(var_name, 3);
        assert_eq!(result, 7);
        remove_var(var_name);
    }

    #[test]
    fn test_env_parse_invalid_value() {
        let var_name = "SQLAGENT_TEST_PARSE_INVALID_41924";
        set_var(var_name, "not-a-number");
        let result: u32 = env_parse_with_default(var_name, 3);
        assert_eq!(result, 3);
        remove_var(var_name);
    }

    #[test]
    fn test_env_parse_missing_var() {
        let var_name = "SQLAGENT_TEST_PARSE_MISSING_41925";
        remove_var(var_name);
        let result: u64 = env_parse_with_default(var_name, 30);
        assert_eq!(result, 30);
    }

    #[test]
    fn test_env_string_default() {
        let var_name = "SQLAGENT_TEST_STRING_41926";
        remove_var(var_name);
        assert_eq!(env_string_with_default(var_name, "fallback"), "fallback");
    }
}
