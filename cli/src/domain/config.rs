//! Provisioning configuration: recognized keys, defaults, and the resolver.
//!
//! Pure functions only — no I/O, no async, no filesystem access. Persisting
//! the resolved record is the caller's job (it becomes the generated `.env`
//! resource, see `domain::resource`).

use std::collections::BTreeMap;

use crate::domain::error::ConfigError;

// ── Constants ────────────────────────────────────────────────────────────────

/// Recognized configuration keys, in the order they are persisted.
pub const CONFIG_KEYS: &[&str] = &[
    "LICENSE_KEY",
    "MT5_LOGIN",
    "MT5_PASSWORD",
    "MT5_SERVER",
    "MT5_HOST",
    "MT5_PORT",
    "SECRET_KEY",
];

/// Built-in default for a recognized key.
#[must_use]
pub fn default_for(key: &str) -> &'static str {
    match key {
        "LICENSE_KEY" => "your_license_key_here",
        "MT5_LOGIN" => "your_mt5_login",
        "MT5_PASSWORD" => "your_mt5_password",
        "MT5_SERVER" => "Exness-MT5Trial",
        "MT5_HOST" => "localhost",
        "MT5_PORT" => "8002",
        "SECRET_KEY" => "your_secret_key_here",
        _ => "",
    }
}

// ── Config record ────────────────────────────────────────────────────────────

/// Operator-supplied overrides, typically parsed from the command line.
///
/// `None` and empty strings both mean "not supplied" — an empty flag value
/// falls through to the persisted file and then to the default.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub license_key: Option<String>,
    pub login: Option<String>,
    pub password: Option<String>,
    pub server: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub secret_key: Option<String>,
}

impl Overrides {
    fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "LICENSE_KEY" => &self.license_key,
            "MT5_LOGIN" => &self.login,
            "MT5_PASSWORD" => &self.password,
            "MT5_SERVER" => &self.server,
            "MT5_HOST" => &self.host,
            "MT5_PORT" => &self.port,
            "SECRET_KEY" => &self.secret_key,
            _ => &None,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }
}

/// The fully resolved configuration for one provisioning run.
///
/// Immutable after resolution; every recognized key carries a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningConfig {
    pub license_key: String,
    pub mt5_login: String,
    pub mt5_password: String,
    pub mt5_server: String,
    pub mt5_host: String,
    pub mt5_port: u16,
    pub secret_key: String,
}

impl ProvisioningConfig {
    /// Value for a recognized key, as it is persisted.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "LICENSE_KEY" => Some(self.license_key.clone()),
            "MT5_LOGIN" => Some(self.mt5_login.clone()),
            "MT5_PASSWORD" => Some(self.mt5_password.clone()),
            "MT5_SERVER" => Some(self.mt5_server.clone()),
            "MT5_HOST" => Some(self.mt5_host.clone()),
            "MT5_PORT" => Some(self.mt5_port.to_string()),
            "SECRET_KEY" => Some(self.secret_key.clone()),
            _ => None,
        }
    }

    /// Render the `.env` file body: one `KEY=value` line per recognized key,
    /// in declaration order. The file is regenerated in full on every run —
    /// unrecognized keys from a previous file are intentionally dropped.
    #[must_use]
    pub fn render_env(&self) -> String {
        let mut out = String::from("# Generated by termdock. Regenerated in full on every run.\n");
        for key in CONFIG_KEYS {
            // get() covers every key in CONFIG_KEYS.
            if let Some(value) = self.get(key) {
                out.push_str(key);
                out.push('=');
                out.push_str(&value);
                out.push('\n');
            }
        }
        out
    }
}

// ── Resolver ─────────────────────────────────────────────────────────────────

/// Resolve the final configuration from overrides, a previously persisted
/// file, and built-in defaults.
///
/// Per-key precedence: override (present and non-empty) > existing file
/// (present and non-empty) > default. Repeated non-interactive invocations
/// with the same flags are therefore fully deterministic.
///
/// # Errors
///
/// Returns `ConfigError` if a resolved value is malformed (port that does
/// not parse as a non-zero `u16`), regardless of where it came from.
pub fn resolve(
    overrides: &Overrides,
    existing: Option<&BTreeMap<String, String>>,
) -> Result<ProvisioningConfig, ConfigError> {
    let pick = |key: &str| -> String {
        if let Some(v) = overrides.get(key) {
            return v.to_string();
        }
        if let Some(file) = existing
            && let Some(v) = file.get(key)
            && !v.trim().is_empty()
        {
            return v.clone();
        }
        default_for(key).to_string()
    };

    let port_raw = pick("MT5_PORT");
    let mt5_port = parse_port("MT5_PORT", &port_raw)?;

    Ok(ProvisioningConfig {
        license_key: pick("LICENSE_KEY"),
        mt5_login: pick("MT5_LOGIN"),
        mt5_password: pick("MT5_PASSWORD"),
        mt5_server: pick("MT5_SERVER"),
        mt5_host: pick("MT5_HOST"),
        mt5_port,
        secret_key: pick("SECRET_KEY"),
    })
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    match value.parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

// ── Env file parsing ─────────────────────────────────────────────────────────

/// Parse `KEY=value` lines from a previously persisted `.env` file.
///
/// Blank lines and `#` comments are skipped; lines without `=` are ignored.
/// Unrecognized keys are kept in the returned map (the resolver ignores
/// them and they are dropped on the next regeneration).
#[must_use]
pub fn parse_env_file(content: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

// ── Unit tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn file(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // ── resolve precedence ───────────────────────────────────────────────────

    #[test]
    fn resolve_defaults_only() {
        let cfg = resolve(&Overrides::default(), None).expect("resolve");
        assert_eq!(cfg.mt5_port, 8002);
        assert_eq!(cfg.mt5_server, "Exness-MT5Trial");
        assert_eq!(cfg.license_key, "your_license_key_here");
        assert_eq!(cfg.mt5_host, "localhost");
    }

    #[test]
    fn resolve_override_beats_file_and_default() {
        let overrides = Overrides {
            license_key: Some("ABC".to_string()),
            ..Overrides::default()
        };
        let existing = file(&[("LICENSE_KEY", "from-file")]);
        let cfg = resolve(&overrides, Some(&existing)).expect("resolve");
        assert_eq!(cfg.license_key, "ABC");
    }

    #[test]
    fn resolve_file_beats_default() {
        let existing = file(&[("MT5_SERVER", "Broker-Live")]);
        let cfg = resolve(&Overrides::default(), Some(&existing)).expect("resolve");
        assert_eq!(cfg.mt5_server, "Broker-Live");
    }

    #[test]
    fn resolve_empty_override_falls_through() {
        let overrides = Overrides {
            server: Some(String::new()),
            ..Overrides::default()
        };
        let existing = file(&[("MT5_SERVER", "Broker-Live")]);
        let cfg = resolve(&overrides, Some(&existing)).expect("resolve");
        assert_eq!(cfg.mt5_server, "Broker-Live");
    }

    #[test]
    fn resolve_empty_file_value_falls_through_to_default() {
        let existing = file(&[("MT5_SERVER", "  ")]);
        let cfg = resolve(&Overrides::default(), Some(&existing)).expect("resolve");
        assert_eq!(cfg.mt5_server, "Exness-MT5Trial");
    }

    #[test]
    fn resolve_unrecognized_file_keys_are_ignored() {
        let existing = file(&[("LOG_LEVEL", "debug")]);
        let cfg = resolve(&Overrides::default(), Some(&existing)).expect("resolve");
        assert!(cfg.get("LOG_LEVEL").is_none());
    }

    // ── port validation ──────────────────────────────────────────────────────

    #[test]
    fn resolve_rejects_non_numeric_port_from_overrides() {
        let overrides = Overrides {
            port: Some("eight-thousand".to_string()),
            ..Overrides::default()
        };
        let err = resolve(&overrides, None).expect_err("expected Err");
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                key: "MT5_PORT".to_string(),
                value: "eight-thousand".to_string(),
            }
        );
    }

    #[test]
    fn resolve_rejects_non_numeric_port_from_file() {
        let existing = file(&[("MT5_PORT", "80o2")]);
        let err = resolve(&Overrides::default(), Some(&existing)).expect_err("expected Err");
        assert!(err.to_string().contains("80o2"), "got: {err}");
    }

    #[test]
    fn resolve_rejects_zero_port() {
        let overrides = Overrides {
            port: Some("0".to_string()),
            ..Overrides::default()
        };
        assert!(resolve(&overrides, None).is_err());
    }

    #[test]
    fn resolve_accepts_numeric_port_override() {
        let overrides = Overrides {
            port: Some("9000".to_string()),
            ..Overrides::default()
        };
        let cfg = resolve(&overrides, None).expect("resolve");
        assert_eq!(cfg.mt5_port, 9000);
    }

    // ── render/parse ─────────────────────────────────────────────────────────

    #[test]
    fn render_env_contains_every_recognized_key_in_order() {
        let cfg = resolve(&Overrides::default(), None).expect("resolve");
        let body = cfg.render_env();
        let mut last = 0;
        for key in CONFIG_KEYS {
            let pos = body
                .find(&format!("{key}="))
                .unwrap_or_else(|| panic!("{key} missing from rendered env"));
            assert!(pos > last, "{key} out of order");
            last = pos;
        }
    }

    #[test]
    fn render_env_defaults_match_documented_values() {
        let cfg = resolve(&Overrides::default(), None).expect("resolve");
        let body = cfg.render_env();
        assert!(body.contains("MT5_PORT=8002"));
        assert!(body.contains("MT5_SERVER=Exness-MT5Trial"));
        assert!(body.contains("LICENSE_KEY=your_license_key_here"));
    }

    #[test]
    fn parse_env_file_skips_comments_and_blanks() {
        let map = parse_env_file("# header\n\nMT5_PORT=9000\nnot a pair\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("MT5_PORT").map(String::as_str), Some("9000"));
    }

    #[test]
    fn parse_then_resolve_roundtrips_rendered_env() {
        let overrides = Overrides {
            login: Some("12345".to_string()),
            port: Some("9000".to_string()),
            ..Overrides::default()
        };
        let cfg = resolve(&overrides, None).expect("resolve");
        let reparsed = parse_env_file(&cfg.render_env());
        let cfg2 = resolve(&Overrides::default(), Some(&reparsed)).expect("resolve");
        assert_eq!(cfg, cfg2);
    }
}
