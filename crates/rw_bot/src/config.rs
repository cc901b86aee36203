use std::fmt;

use rw_core::{ChatId, Error, Result};

pub const TOKEN_VAR: &str = "TELEGRAM_BOT_TOKEN";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
pub const ADMIN_ID_VAR: &str = "ADMIN_ID";

/// Secrets read from the environment. Each is checked only by the commands that need it.
#[derive(Clone, Default)]
pub struct Settings {
    pub telegram_token: Option<String>,
    pub openai_api_key: Option<String>,
    pub admin_id: Option<String>,
}

impl Settings {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            telegram_token: read(TOKEN_VAR),
            openai_api_key: read(OPENAI_KEY_VAR),
            admin_id: read(ADMIN_ID_VAR),
        }
    }

    pub fn require_token(&self) -> Result<&str> {
        self.telegram_token
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} is not set", TOKEN_VAR)))
    }

    pub fn require_admin_id(&self) -> Result<ChatId> {
        let raw = self
            .admin_id
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{} is not set", ADMIN_ID_VAR)))?;
        raw.parse::<ChatId>()
            .map_err(|_| Error::Config(format!("{} must be an integer, got {:?}", ADMIN_ID_VAR, raw)))
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Settings")
            .field("telegram_token", &redact(&self.telegram_token))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("admin_id", &self.admin_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_complete_settings() {
        let settings = settings(&[(TOKEN_VAR, "123:abc"), (OPENAI_KEY_VAR, "sk-x"), (ADMIN_ID_VAR, " 987654 ")]);
        assert_eq!(settings.require_token().unwrap(), "123:abc");
        assert_eq!(settings.require_admin_id().unwrap(), 987654);
        assert_eq!(settings.openai_api_key.as_deref(), Some("sk-x"));
    }

    #[test]
    fn test_missing_values_are_config_errors() {
        let settings = settings(&[(TOKEN_VAR, "   ")]);
        assert!(matches!(settings.require_token(), Err(Error::Config(_))));
        assert!(matches!(settings.require_admin_id(), Err(Error::Config(_))));
        assert!(settings.openai_api_key.is_none());
    }

    #[test]
    fn test_malformed_admin_id() {
        let settings = settings(&[(ADMIN_ID_VAR, "@operator")]);
        assert!(matches!(settings.require_admin_id(), Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = settings(&[(TOKEN_VAR, "123:abc"), (OPENAI_KEY_VAR, "sk-x")]);
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("123:abc"));
        assert!(!debug.contains("sk-x"));
    }
}
