use thiserror::Error;

/// An environment variable required by the application is not set.
///
/// A variable that is set to an empty or whitespace-only value counts as unset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads a required environment variable.
///
/// Surrounding whitespace is trimmed, which protects tokens pasted into `.env`
/// files with a trailing newline.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MissingEnvVarError(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn missing_and_blank_are_errors() {
        // SAFETY: serialized; no other thread reads these variables.
        unsafe {
            std::env::remove_var("SHARED_UTILS_TEST_VAR");
        }
        assert_eq!(
            get_env_var("SHARED_UTILS_TEST_VAR"),
            Err(MissingEnvVarError("SHARED_UTILS_TEST_VAR".into()))
        );
        unsafe {
            std::env::set_var("SHARED_UTILS_TEST_VAR", "   ");
        }
        assert!(get_env_var("SHARED_UTILS_TEST_VAR").is_err());
    }

    #[test]
    #[serial]
    fn value_is_trimmed() {
        unsafe {
            std::env::set_var("SHARED_UTILS_TEST_VAR", " ghp_token\n");
        }
        assert_eq!(get_env_var("SHARED_UTILS_TEST_VAR").unwrap(), "ghp_token");
        unsafe {
            std::env::remove_var("SHARED_UTILS_TEST_VAR");
        }
    }
}
