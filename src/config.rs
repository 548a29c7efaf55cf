use std::env;
use std::fmt;
use std::str::FromStr;

const DEFAULT_PREFIX: &str = "!";
const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_NODE_NAME: &str = "main";
const DEFAULT_NODE_HOST: &str = "localhost";
const DEFAULT_NODE_PORT: u16 = 2333;
const DEFAULT_NODE_PASSWORD: &str = "youshallnotpass";

#[derive(Clone)]
pub struct Config {
    pub configured_prefix: String,
    pub token: String,
    pub http_port: u16,
    pub lavalink: LavalinkNodeConfig,
}

#[derive(Clone)]
pub struct LavalinkNodeConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub secure: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("configured_prefix", &self.configured_prefix)
            .field("token", &"<redacted>")
            .field("http_port", &self.http_port)
            .field("lavalink", &self.lavalink)
            .finish()
    }
}

impl fmt::Debug for LavalinkNodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LavalinkNodeConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .field("secure", &self.secure)
            .finish()
    }
}

impl LavalinkNodeConfig {
    /// `host:port`, the form lavalink-rs expects as a node hostname.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let token = lookup("DISCORD_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("DISCORD_TOKEN not found in environment variables"))?;

        let configured_prefix = lookup("BOT_PREFIX")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let http_port = parse_or_default(&lookup, "PORT", DEFAULT_HTTP_PORT);

        let lavalink = LavalinkNodeConfig {
            name: lookup("LAVALINK_NAME").unwrap_or_else(|| DEFAULT_NODE_NAME.to_string()),
            host: lookup("LAVALINK_HOST").unwrap_or_else(|| DEFAULT_NODE_HOST.to_string()),
            port: parse_or_default(&lookup, "LAVALINK_PORT", DEFAULT_NODE_PORT),
            password: lookup("LAVALINK_PASSWORD")
                .unwrap_or_else(|| DEFAULT_NODE_PASSWORD.to_string()),
            secure: lookup("LAVALINK_SECURE").is_some_and(|v| v.trim() == "true"),
        };

        Ok(Self {
            configured_prefix,
            token,
            http_port,
            lavalink,
        })
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + fmt::Display + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, %default, "Invalid numeric value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_only_token() {
        let config = Config::from_lookup(lookup_from(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(config.token, "abc");
        assert_eq!(config.configured_prefix, "!");
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.lavalink.name, "main");
        assert_eq!(config.lavalink.address(), "localhost:2333");
        assert_eq!(config.lavalink.password, "youshallnotpass");
        assert!(!config.lavalink.secure);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("BOT_PREFIX", "?"),
            ("PORT", "8080"),
            ("LAVALINK_NAME", "eu-1"),
            ("LAVALINK_HOST", "lava.example.org"),
            ("LAVALINK_PORT", "443"),
            ("LAVALINK_PASSWORD", "hunter2"),
            ("LAVALINK_SECURE", "true"),
        ]))
        .unwrap();
        assert_eq!(config.configured_prefix, "?");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.lavalink.name, "eu-1");
        assert_eq!(config.lavalink.address(), "lava.example.org:443");
        assert_eq!(config.lavalink.password, "hunter2");
        assert!(config.lavalink.secure);
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn test_blank_token_is_an_error() {
        assert!(Config::from_lookup(lookup_from(&[("DISCORD_TOKEN", "   ")])).is_err());
    }

    #[test]
    fn test_invalid_ports_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("PORT", "eighty"),
            ("LAVALINK_PORT", "99999"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.lavalink.port, 2333);
    }

    #[test]
    fn test_secure_flag_requires_literal_true() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("LAVALINK_SECURE", "yes"),
        ]))
        .unwrap();
        assert!(!config.lavalink.secure);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_lookup(lookup_from(&[
            ("DISCORD_TOKEN", "super-secret-token"),
            ("LAVALINK_PASSWORD", "node-secret"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-token"));
        assert!(!rendered.contains("node-secret"));
    }
}
