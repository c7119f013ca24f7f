// AI configuration and secrets management
//
// API keys are looked up in:
// 1. System keychain (preferred)
// 2. Environment variables (fallback for CI/headless)
//
// Keys are NEVER stored in kardex.toml

use std::env;

use crate::settings::{AIProvider, AISettings};

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "kardex";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Keychain,
    Environment,
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Get the environment variable name for a provider
pub fn env_var_name(provider: &str) -> String {
    format!("KARDEX_{}_KEY", provider.to_uppercase())
}

fn keychain_account(provider: &str) -> String {
    format!("ai/{}", provider.to_lowercase())
}

/// Where [`get_api_key`] looks for a provider's key, as a one-line hint.
pub fn missing_key_hint(provider: &str) -> String {
    let mut vars = env_var_name(provider);
    if provider.eq_ignore_ascii_case("openai") {
        vars.push_str(" or OPENAI_API_KEY");
    }
    if cfg!(feature = "keychain") {
        format!(
            "set {}, or add a keychain entry (service \"{}\", account \"{}\")",
            vars,
            KEYCHAIN_SERVICE,
            keychain_account(provider)
        )
    } else {
        format!("set {}", vars)
    }
}

/// Get an API key for the specified provider
///
/// Checks in order:
/// 1. System keychain
/// 2. KARDEX_<PROVIDER>_KEY
/// 3. OPENAI_API_KEY (openai only)
pub fn get_api_key(provider: &str) -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider)) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    let mut candidates = vec![env_var_name(provider)];
    if provider.eq_ignore_ascii_case("openai") {
        candidates.push("OPENAI_API_KEY".to_string());
    }

    for name in candidates {
        if let Ok(key) = env::var(&name) {
            if !key.is_empty() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Environment,
                };
            }
        }
    }

    KeyLookup {
        key: None,
        source: KeySource::None,
    }
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "test").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    /// provider = "none"
    Disabled,
    Ready,
    /// Provider needs a key and none was found
    MissingKey,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }
}

/// The effective AI configuration, fully resolved from settings and secrets.
#[derive(Debug, Clone)]
pub struct ResolvedAIConfig {
    pub provider: AIProvider,
    pub model: String,
    pub endpoint: String,
    pub max_rows: usize,
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

impl ResolvedAIConfig {
    pub fn from_settings(settings: &AISettings) -> Self {
        Self::resolve(settings, get_api_key)
    }

    /// Resolution with an injectable key lookup.
    pub fn resolve<F>(settings: &AISettings, lookup: F) -> Self
    where
        F: Fn(&str) -> KeyLookup,
    {
        let provider = settings.provider;

        if !provider.is_enabled() {
            return Self {
                provider,
                model: String::new(),
                endpoint: String::new(),
                max_rows: settings.max_rows,
                api_key: None,
                key_source: KeySource::None,
                status: AIConfigStatus::Disabled,
                blocking_reason: Some("AI is disabled (ai.provider = \"none\")".to_string()),
            };
        }

        let (api_key, key_source) = if provider.needs_api_key() {
            let found = lookup(provider.name());
            (found.key, found.source)
        } else {
            (None, KeySource::None)
        };

        let (status, blocking_reason) = if provider.needs_api_key() && api_key.is_none() {
            (
                AIConfigStatus::MissingKey,
                Some(format!("No API key found; {}", missing_key_hint(provider.name()))),
            )
        } else {
            (AIConfigStatus::Ready, None)
        };

        Self {
            provider,
            model: settings.effective_model().to_string(),
            endpoint: settings.effective_endpoint().trim_end_matches('/').to_string(),
            max_rows: settings.max_rows,
            api_key,
            key_source,
            status,
            blocking_reason,
        }
    }

    /// Chat-completions URL for the configured provider.
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.endpoint)
    }
}

impl std::fmt::Display for ResolvedAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AI Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Provider:          {}", self.provider.name())?;
        writeln!(f, "Status:            {}", self.status.as_str())?;
        if self.provider.is_enabled() {
            writeln!(f, "Model:             {}", self.model)?;
            writeln!(f, "Endpoint:          {}", self.endpoint)?;
            writeln!(f, "Max rows:          {}", self.max_rows)?;
        }
        writeln!(f, "Key present:       {}", if self.api_key.is_some() { "yes" } else { "no" })?;
        writeln!(f, "Key source:        {}", self.key_source.as_str())?;
        writeln!(f, "Keychain available: {}", if keychain_available() { "yes" } else { "no" })?;
        if let Some(reason) = &self.blocking_reason {
            writeln!(f, "Note:              {}", reason)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_key(_: &str) -> KeyLookup {
        KeyLookup { key: None, source: KeySource::None }
    }

    fn env_key(_: &str) -> KeyLookup {
        KeyLookup { key: Some("sk-test".into()), source: KeySource::Environment }
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("openai"), "KARDEX_OPENAI_KEY");
        assert_eq!(env_var_name("OpenAI"), "KARDEX_OPENAI_KEY");
    }

    #[test]
    fn test_keychain_account() {
        assert_eq!(keychain_account("OpenAI"), "ai/openai");
    }

    #[test]
    fn hint_names_every_lookup_location() {
        let hint = missing_key_hint("openai");
        assert!(hint.contains("KARDEX_OPENAI_KEY"));
        assert!(hint.contains("OPENAI_API_KEY"));
        if cfg!(feature = "keychain") {
            assert!(hint.contains("service \"kardex\""));
            assert!(hint.contains("account \"ai/openai\""));
        }

        let other = missing_key_hint("local");
        assert!(other.contains("KARDEX_LOCAL_KEY"));
        assert!(!other.contains("OPENAI_API_KEY"));
    }

    #[test]
    fn display_lines_are_labelled() {
        let resolved = ResolvedAIConfig::resolve(&AISettings::default(), no_key);
        let text = resolved.to_string();
        assert!(text.lines().any(|l| l.starts_with("Keychain available: ")));
        assert!(text.lines().any(|l| l.starts_with("Status:            disabled")));
    }

    #[test]
    fn test_key_lookup_from_env() {
        env::set_var("KARDEX_TESTPROVIDER_KEY", "test-key-123");
        let lookup = get_api_key("testprovider");
        assert_eq!(lookup.source, KeySource::Environment);
        assert_eq!(lookup.key, Some("test-key-123".to_string()));
        env::remove_var("KARDEX_TESTPROVIDER_KEY");
    }

    #[test]
    fn test_key_lookup_missing() {
        let lookup = get_api_key("nonexistent_provider_xyz");
        assert_eq!(lookup.source, KeySource::None);
        assert!(lookup.key.is_none());
    }

    #[test]
    fn disabled_by_default() {
        let resolved = ResolvedAIConfig::resolve(&AISettings::default(), env_key);
        assert_eq!(resolved.status, AIConfigStatus::Disabled);
        assert!(resolved.api_key.is_none());
    }

    #[test]
    fn openai_without_key() {
        let settings = AISettings { provider: AIProvider::OpenAI, ..AISettings::default() };
        let resolved = ResolvedAIConfig::resolve(&settings, no_key);
        assert_eq!(resolved.status, AIConfigStatus::MissingKey);
        assert!(resolved.blocking_reason.unwrap().contains("KARDEX_OPENAI_KEY"));
    }

    #[test]
    fn openai_ready() {
        let settings = AISettings { provider: AIProvider::OpenAI, ..AISettings::default() };
        let resolved = ResolvedAIConfig::resolve(&settings, env_key);
        assert_eq!(resolved.status, AIConfigStatus::Ready);
        assert_eq!(resolved.model, "gpt-4o-mini");
        assert_eq!(resolved.completions_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn local_needs_no_key() {
        let settings = AISettings {
            provider: AIProvider::Local,
            endpoint: Some("http://gpu-box:11434/".into()),
            ..AISettings::default()
        };
        let resolved = ResolvedAIConfig::resolve(&settings, no_key);
        assert_eq!(resolved.status, AIConfigStatus::Ready);
        assert_eq!(resolved.completions_url(), "http://gpu-box:11434/v1/chat/completions");
    }
}
