//! Where the tutor's API key comes from
//!
//! The `ANTHROPIC_API_KEY` environment variable wins. Otherwise the key is
//! read from the system keyring, where `:tutor-key` puts it.

use keyring::Entry;

use super::error::TutorError;

/// Environment variable checked before the keyring
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const SERVICE_NAME: &str = "trailhead";
const API_KEY_ENTRY: &str = "anthropic-api-key";

/// Find the API key, environment first
pub fn resolve_api_key() -> Result<String, TutorError> {
    match key_from_env(std::env::var(API_KEY_ENV).ok()) {
        Some(key) => Ok(key),
        None => keyring_key(),
    }
}

/// A usable key from an environment value (blank counts as unset)
fn key_from_env(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn entry() -> Result<Entry, TutorError> {
    Entry::new(SERVICE_NAME, API_KEY_ENTRY).map_err(|e| TutorError::Keyring(e.to_string()))
}

fn keyring_key() -> Result<String, TutorError> {
    entry()?.get_password().map_err(|e| match e {
        keyring::Error::NoEntry => TutorError::NoApiKey,
        _ => TutorError::Keyring(e.to_string()),
    })
}

/// Validate and store a key in the keyring
pub fn store_api_key(key: &str) -> Result<(), TutorError> {
    let key = key.trim();
    if !is_valid_key_format(key) {
        return Err(TutorError::InvalidApiKey);
    }
    entry()?.set_password(key).map_err(|e| TutorError::Keyring(e.to_string()))?;
    tracing::info!("Stored tutor API key {}", mask_key(key));
    Ok(())
}

pub fn forget_api_key() -> Result<(), TutorError> {
    entry()?.delete_credential().map_err(|e| TutorError::Keyring(e.to_string()))
}

/// Anthropic keys start with "sk-ant-"
pub fn is_valid_key_format(key: &str) -> bool {
    key.starts_with("sk-ant-") && key.len() > 20
}

/// Key with everything but its ends hidden
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let prefix: String = chars[..8].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format() {
        assert!(is_valid_key_format("sk-ant-REDACTED"));
        assert!(!is_valid_key_format("invalid-key"));
        assert!(!is_valid_key_format("sk-ant-short"));
    }

    #[test]
    fn masking() {
        assert_eq!(mask_key("sk-ant-REDACTED"), "sk-ant-a...wxyz");
        assert_eq!(mask_key("short"), "*****");
    }

    #[test]
    fn blank_env_value_is_unset() {
        assert_eq!(key_from_env(None), None);
        assert_eq!(key_from_env(Some("   ".into())), None);
        assert_eq!(key_from_env(Some(" sk-ant-x ".into())), Some("sk-ant-x".into()));
    }

    #[test]
    fn store_rejects_malformed_key() {
        assert!(matches!(store_api_key("nope"), Err(TutorError::InvalidApiKey)));
    }
}
