// Agent settings
//
// Loaded from MAOTO_* environment variables. Derived URLs follow the hosted
// layout: marketplace under /mp/, assistant under /assistant/.

use std::time::Duration;

use url::Url;

use crate::error::SettingsError;

const ENV_PREFIX: &str = "MAOTO_";

/// A string that never shows up in Debug output or logs
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the secret value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Connection settings for the marketplace and the assistant
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub debug: bool,
    pub domain_mp: String,
    pub domain_pa: String,
    pub use_ssl: bool,
    pub port_mp: u16,
    pub port_pa: u16,
    pub apikey: SecretString,
    /// Public URL of this agent, used as the default webhook
    pub agent_url: Option<String>,
    /// Longest silence tolerated on the event stream before reconnecting
    pub event_idle_timeout: Duration,
}

impl AgentSettings {
    /// Settings with hosted defaults and the given API key
    pub fn new(apikey: impl Into<SecretString>) -> Self {
        Self {
            debug: false,
            domain_mp: "mp.maoto.world".to_string(),
            domain_pa: "assistant.maoto.world".to_string(),
            use_ssl: true,
            port_mp: 443,
            port_pa: 443,
            apikey: apikey.into(),
            agent_url: None,
            event_idle_timeout: Duration::from_secs(90),
        }
    }

    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through a variable lookup (keys include the MAOTO_ prefix)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        let apikey = get("APIKEY")
            .filter(|v| !v.is_empty())
            .ok_or(SettingsError::Missing("MAOTO_APIKEY"))?;
        let mut settings = Self::new(apikey);

        if let Some(v) = get("DEBUG") {
            settings.debug = parse_bool("MAOTO_DEBUG", &v)?;
        }
        if let Some(v) = get("DOMAIN_MP") {
            settings.domain_mp = v;
        }
        if let Some(v) = get("DOMAIN_PA") {
            settings.domain_pa = v;
        }
        if let Some(v) = get("USE_SSL") {
            settings.use_ssl = parse_bool("MAOTO_USE_SSL", &v)?;
        }
        if let Some(v) = get("PORT_MP") {
            settings.port_mp = parse_port("MAOTO_PORT_MP", &v)?;
        }
        if let Some(v) = get("PORT_PA") {
            settings.port_pa = parse_port("MAOTO_PORT_PA", &v)?;
        }
        settings.agent_url = get("AGENT_URL").filter(|v| !v.is_empty());
        if let Some(v) = get("EVENT_IDLE_TIMEOUT_SECS") {
            settings.event_idle_timeout = parse_secs("MAOTO_EVENT_IDLE_TIMEOUT_SECS", &v)?;
        }

        Ok(settings)
    }

    pub fn protocol(&self) -> &'static str {
        if self.use_ssl {
            "https"
        } else {
            "http"
        }
    }

    /// Base URL of the marketplace API (ends with `/`)
    pub fn url_mp(&self) -> Result<Url, SettingsError> {
        self.base_url("MAOTO_DOMAIN_MP", &self.domain_mp, self.port_mp, "mp")
    }

    /// Base URL of the assistant API (ends with `/`)
    pub fn url_pa(&self) -> Result<Url, SettingsError> {
        self.base_url("MAOTO_DOMAIN_PA", &self.domain_pa, self.port_pa, "assistant")
    }

    fn base_url(
        &self,
        name: &'static str,
        domain: &str,
        port: u16,
        path: &str,
    ) -> Result<Url, SettingsError> {
        let raw = format!("{}://{}:{}/{}/", self.protocol(), domain, port, path);
        Url::parse(&raw).map_err(|e| SettingsError::Invalid {
            name,
            message: e.to_string(),
        })
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SettingsError::Invalid {
            name,
            message: format!("expected a boolean, got {:?}", other),
        }),
    }
}

fn parse_port(name: &'static str, value: &str) -> Result<u16, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::Invalid {
        name,
        message: format!("expected a port number, got {:?}", value),
    })
}

fn parse_secs(name: &'static str, value: &str) -> Result<Duration, SettingsError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(SettingsError::Invalid {
            name,
            message: format!("expected a positive number of seconds, got {:?}", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = AgentSettings::from_lookup(lookup(&[("MAOTO_APIKEY", "key")])).unwrap();

        assert_eq!(settings.apikey.expose(), "key");
        assert_eq!(
            settings.url_mp().unwrap().as_str(),
            "https://mp.maoto.world/mp/"
        );
        assert_eq!(
            settings.url_pa().unwrap().as_str(),
            "https://assistant.maoto.world/assistant/"
        );
        assert!(settings.agent_url.is_none());
        assert_eq!(settings.event_idle_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_overrides() {
        let settings = AgentSettings::from_lookup(lookup(&[
            ("MAOTO_APIKEY", "key"),
            ("MAOTO_DOMAIN_MP", "localhost"),
            ("MAOTO_USE_SSL", "false"),
            ("MAOTO_PORT_MP", "8080"),
            ("MAOTO_AGENT_URL", "https://agent.example.com"),
        ]))
        .unwrap();

        assert_eq!(
            settings.url_mp().unwrap().as_str(),
            "http://localhost:8080/mp/"
        );
        assert_eq!(
            settings.agent_url.as_deref(),
            Some("https://agent.example.com")
        );
    }

    #[test]
    fn test_missing_apikey() {
        let err = AgentSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, SettingsError::Missing("MAOTO_APIKEY")));
    }

    #[test]
    fn test_invalid_port() {
        let err = AgentSettings::from_lookup(lookup(&[
            ("MAOTO_APIKEY", "key"),
            ("MAOTO_PORT_PA", "-1"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { name: "MAOTO_PORT_PA", .. }));
    }

    #[test]
    fn test_event_idle_timeout() {
        let settings = AgentSettings::from_lookup(lookup(&[
            ("MAOTO_APIKEY", "key"),
            ("MAOTO_EVENT_IDLE_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(settings.event_idle_timeout, Duration::from_secs(15));

        let err = AgentSettings::from_lookup(lookup(&[
            ("MAOTO_APIKEY", "key"),
            ("MAOTO_EVENT_IDLE_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Invalid { name: "MAOTO_EVENT_IDLE_TIMEOUT_SECS", .. }
        ));
    }

    #[test]
    fn test_secret_is_redacted() {
        let settings = AgentSettings::new("super-secret");
        assert!(!format!("{:?}", settings).contains("super-secret"));
    }
}
