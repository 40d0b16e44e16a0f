/*
 *  config.rs
 *  (c) 2025 Teodor Potancok
 *
 *  This Source Code Form is subject to the terms of the Mozilla Public
 *  License, v. 2.0. If a copy of the MPL was not distributed with this
 *  file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! Production settings, read once at startup from an optional TOML base file
//! and the process environment.

use crate::secrets::SECRET_KEY_LENGTH;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

pub const DEBUG: &str = "DEBUG";
pub const SECURE_SSL_REDIRECT: &str = "SECURE_SSL_REDIRECT";
pub const SECURE_HSTS_SECONDS: &str = "SECURE_HSTS_SECONDS";
pub const SECURE_HSTS_INCLUDE_SUBDOMAINS: &str = "SECURE_HSTS_INCLUDE_SUBDOMAINS";
pub const SECURE_HSTS_PRELOAD: &str = "SECURE_HSTS_PRELOAD";
pub const SESSION_COOKIE_SECURE: &str = "SESSION_COOKIE_SECURE";
pub const CSRF_COOKIE_SECURE: &str = "CSRF_COOKIE_SECURE";
pub const ALLOWED_HOSTS: &str = "ALLOWED_HOSTS";
pub const MONGODB_URL: &str = "MONGODB_URL";
pub const MONGODB_NAME: &str = "MONGODB_NAME";
pub const GOOGLE_CLIENT_ID: &str = "GOOGLE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET: &str = "GOOGLE_CLIENT_SECRET";
pub const REDIS_URL: &str = "REDIS_URL";
pub const SECRET_KEY: &str = "SECRET_KEY";

pub const SECURE_PROXY_SSL_HEADER: (&str, &str) = ("HTTP_X_FORWARDED_PROTO", "https");
pub const USE_X_FORWARDED_HOST: bool = true;
pub const USE_X_FORWARDED_PORT: bool = true;

pub const STATIC_URL: &str = "/static/";
pub const MEDIA_URL: &str = "/media/";
/// Relative to the backend's base directory.
pub const STATIC_ROOT: &str = "static";
pub const MEDIA_ROOT: &str = "media";

pub const CORS_ALLOW_ALL_ORIGINS: bool = false;

pub const OAUTH_LOGIN_REDIRECT_URL: &str = "https://hireiq.ddns.net/";
pub const OAUTH_LOGIN_URL: &str = "/auth/login/google-oauth2/";
pub const OAUTH_REDIRECT_URI: &str = "https://hireiq.ddns.net/api/auth/google/callback/";

pub const CACHE_BACKEND: &str = "django_redis.cache.RedisCache";
pub const CACHE_CLIENT_CLASS: &str = "django_redis.client.DefaultClient";
pub const SESSION_ENGINE: &str = "cache";
pub const SESSION_CACHE_ALIAS: &str = "default";

/// Hosts that never get an `https://` origin.
pub const LOCAL_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "0.0.0.0"];

/// Frontend dev server origins, always trusted.
pub const DEV_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Error reading file: {0}")]
    ReadFile(std::io::Error),
    #[error("Error deserializing file: {}", .0.message())]
    Deserialize(toml::de::Error),
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// A credential that never shows up in `Debug` output.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub debug: bool,
    pub secure_ssl_redirect: bool,
    pub secure_hsts_seconds: u64,
    pub secure_hsts_include_subdomains: bool,
    pub secure_hsts_preload: bool,
    pub session_cookie_secure: bool,
    pub csrf_cookie_secure: bool,
    pub allowed_hosts: Vec<String>,
    pub mongodb_url: Option<String>,
    pub mongodb_name: String,
    pub google_client_id: Option<Secret>,
    pub google_client_secret: Option<Secret>,
    pub redis_url: String,
    pub secret_key: Option<Secret>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            secure_ssl_redirect: false,
            secure_hsts_seconds: 31_536_000,
            secure_hsts_include_subdomains: true,
            secure_hsts_preload: true,
            session_cookie_secure: false,
            csrf_cookie_secure: true,
            allowed_hosts: split_hosts("localhost,127.0.0.1"),
            mongodb_url: None,
            mongodb_name: "hireiq_db".to_string(),
            google_client_id: None,
            google_client_secret: None,
            redis_url: "redis://redis:6379/0".to_string(),
            secret_key: None,
        }
    }
}

/// Parses a boolean flag. Only `true` and `false` are accepted, in any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Splits a comma-separated host list, dropping blank entries.
pub fn split_hosts(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(str::to_string)
        .collect()
}

fn set_bool(target: &mut bool, key: &'static str, value: &str) {
    match parse_bool(value) {
        Some(b) => *target = b,
        None => log::warn!(
            "Ignoring {key}='{value}': expected true or false, keeping {}",
            target
        ),
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        settings.apply_lookup(lookup)?;
        Ok(settings)
    }

    /// Reads base values from a TOML file, then applies the environment on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    pub fn load_with<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let file = match std::fs::read_to_string(path) {
            Ok(f) => f,
            Err(e) => return Err(ConfigError::ReadFile(e)),
        };
        let mut settings = Self::from_toml(&file)?;
        log::debug!("Loaded base settings from {}", path.display());

        settings.apply_lookup(lookup)?;
        Ok(settings)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let mut settings = match toml::from_str::<Settings>(contents) {
            Ok(s) => s,
            Err(e) => return Err(ConfigError::Deserialize(e)),
        };
        settings.normalize();
        Ok(settings)
    }

    /// Applies the environment's blank and list rules to file values.
    fn normalize(&mut self) {
        self.allowed_hosts = self
            .allowed_hosts
            .iter()
            .map(|host| host.trim())
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .collect();

        let defaults = Self::default();
        if self.mongodb_name.trim().is_empty() {
            self.mongodb_name = defaults.mongodb_name;
        }
        if self.redis_url.trim().is_empty() {
            self.redis_url = defaults.redis_url;
        }

        self.mongodb_url = self.mongodb_url.take().filter(|v| !v.trim().is_empty());
        for secret in [
            &mut self.google_client_id,
            &mut self.google_client_secret,
            &mut self.secret_key,
        ] {
            *secret = secret.take().filter(|s| !s.expose().trim().is_empty());
        }
    }

    /// Overrides fields with every non-empty value `lookup` returns.
    pub fn apply_lookup<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        for (key, target) in [
            (DEBUG, &mut self.debug),
            (SECURE_SSL_REDIRECT, &mut self.secure_ssl_redirect),
            (
                SECURE_HSTS_INCLUDE_SUBDOMAINS,
                &mut self.secure_hsts_include_subdomains,
            ),
            (SECURE_HSTS_PRELOAD, &mut self.secure_hsts_preload),
            (SESSION_COOKIE_SECURE, &mut self.session_cookie_secure),
            (CSRF_COOKIE_SECURE, &mut self.csrf_cookie_secure),
        ] {
            if let Some(value) = get(key) {
                set_bool(target, key, &value);
            }
        }

        if let Some(value) = get(SECURE_HSTS_SECONDS) {
            self.secure_hsts_seconds = match value.trim().parse() {
                Ok(seconds) => seconds,
                Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: SECURE_HSTS_SECONDS,
                        value,
                    });
                }
            };
        }

        if let Some(value) = get(ALLOWED_HOSTS) {
            self.allowed_hosts = split_hosts(&value);
        }

        if let Some(value) = get(MONGODB_URL) {
            self.mongodb_url = Some(value);
        }
        if let Some(value) = get(MONGODB_NAME) {
            self.mongodb_name = value;
        }
        if let Some(value) = get(REDIS_URL) {
            self.redis_url = value;
        }

        if let Some(value) = get(GOOGLE_CLIENT_ID) {
            self.google_client_id = Some(Secret::new(value));
        }
        if let Some(value) = get(GOOGLE_CLIENT_SECRET) {
            self.google_client_secret = Some(Secret::new(value));
        }
        if let Some(value) = get(SECRET_KEY) {
            self.secret_key = Some(Secret::new(value));
        }

        Ok(())
    }

    /// Allowed hosts that are reachable from outside the machine.
    pub fn public_hosts(&self) -> impl Iterator<Item = &str> {
        self.allowed_hosts
            .iter()
            .map(String::as_str)
            .filter(|host| !LOCAL_HOSTS.contains(host))
    }

    pub fn cors_allowed_origins(&self) -> Vec<String> {
        self.trusted_origins()
    }

    pub fn csrf_trusted_origins(&self) -> Vec<String> {
        self.trusted_origins()
    }

    fn trusted_origins(&self) -> Vec<String> {
        self.public_hosts()
            .map(|host| format!("https://{host}"))
            .chain(DEV_ORIGINS.iter().map(|o| o.to_string()))
            .collect()
    }

    /// Problems that should be fixed before the settings go to production.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.debug {
            warnings.push(format!("{DEBUG} is enabled"));
        }

        match &self.secret_key {
            None => warnings.push(format!("{SECRET_KEY} is not set")),
            Some(key) if key.expose().chars().count() < SECRET_KEY_LENGTH => warnings.push(
                format!("{SECRET_KEY} is shorter than {SECRET_KEY_LENGTH} characters"),
            ),
            Some(_) => {}
        }

        if self.mongodb_url.is_none() {
            warnings.push(format!("{MONGODB_URL} is not set"));
        }
        if self.google_client_id.is_none() {
            warnings.push(format!("{GOOGLE_CLIENT_ID} is not set"));
        }
        if self.google_client_secret.is_none() {
            warnings.push(format!("{GOOGLE_CLIENT_SECRET} is not set"));
        }
        if self.public_hosts().next().is_none() {
            warnings.push(format!("{ALLOWED_HOSTS} contains only local hosts"));
        }
        if self.secure_hsts_seconds == 0 {
            warnings.push(format!("{SECURE_HSTS_SECONDS} is 0, HSTS is disabled"));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn parse_bool_accepts_any_case() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" False "), Some(false));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("1"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn split_hosts_trims_and_drops_blanks() {
        assert_eq!(
            split_hosts(" example.com , ,api.example.com,"),
            vec!["example.com", "api.example.com"]
        );
        assert!(split_hosts("").is_empty());
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.debug);
        assert_eq!(settings.secure_hsts_seconds, 31_536_000);
        assert!(settings.secure_hsts_include_subdomains);
        assert!(settings.csrf_cookie_secure);
        assert!(!settings.session_cookie_secure);
        assert_eq!(settings.allowed_hosts, vec!["localhost", "127.0.0.1"]);
        assert_eq!(settings.mongodb_name, "hireiq_db");
        assert_eq!(settings.redis_url, "redis://redis:6379/0");
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_lookup(lookup(&[
            (DEBUG, "True"),
            (SECURE_SSL_REDIRECT, "true"),
            (SECURE_HSTS_SECONDS, "3600"),
            (SECURE_HSTS_PRELOAD, "false"),
            (CSRF_COOKIE_SECURE, "FALSE"),
            (ALLOWED_HOSTS, "hireiq.ddns.net, localhost"),
            (MONGODB_URL, "mongodb+srv://cluster"),
            (GOOGLE_CLIENT_ID, "client"),
            (SECRET_KEY, "k"),
        ]))
        .unwrap();

        assert!(settings.debug);
        assert!(settings.secure_ssl_redirect);
        assert_eq!(settings.secure_hsts_seconds, 3600);
        assert!(!settings.secure_hsts_preload);
        assert!(!settings.csrf_cookie_secure);
        assert_eq!(settings.allowed_hosts, vec!["hireiq.ddns.net", "localhost"]);
        assert_eq!(settings.mongodb_url.as_deref(), Some("mongodb+srv://cluster"));
        assert_eq!(settings.google_client_id, Some(Secret::new("client")));
        assert_eq!(settings.secret_key.as_ref().map(Secret::expose), Some("k"));
    }

    #[test]
    fn unrecognized_bool_keeps_default() {
        let settings =
            Settings::from_lookup(lookup(&[(SECURE_HSTS_PRELOAD, "yes"), (DEBUG, "1")])).unwrap();
        assert!(settings.secure_hsts_preload);
        assert!(!settings.debug);
    }

    #[test]
    fn blank_value_falls_back_to_default() {
        let settings =
            Settings::from_lookup(lookup(&[(ALLOWED_HOSTS, "  "), (MONGODB_NAME, "")])).unwrap();
        assert_eq!(settings.allowed_hosts, vec!["localhost", "127.0.0.1"]);
        assert_eq!(settings.mongodb_name, "hireiq_db");
    }

    #[test]
    fn invalid_hsts_seconds_is_an_error() {
        let err = Settings::from_lookup(lookup(&[(SECURE_HSTS_SECONDS, "a year")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, SECURE_HSTS_SECONDS);
                assert_eq!(value, "a year");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn origins_skip_local_hosts() {
        let settings = Settings::from_lookup(lookup(&[(
            ALLOWED_HOSTS,
            "hireiq.ddns.net,localhost,0.0.0.0,api.hireiq.io,127.0.0.1",
        )]))
        .unwrap();

        let expected = vec![
            "https://hireiq.ddns.net",
            "https://api.hireiq.io",
            "http://localhost:3000",
            "http://127.0.0.1:3000",
        ];
        assert_eq!(settings.cors_allowed_origins(), expected);
        assert_eq!(settings.csrf_trusted_origins(), expected);
    }

    #[test]
    fn default_origins_are_dev_only() {
        assert_eq!(
            Settings::default().cors_allowed_origins(),
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
    }

    #[test]
    fn toml_base_then_env_override() {
        let mut settings = Settings::from_toml(
            r#"
            debug = true
            allowed_hosts = ["base.example.com"]
            mongodb_name = "from_file"
            secret_key = "file-secret"
            "#,
        )
        .unwrap();
        assert!(settings.debug);
        assert_eq!(settings.redis_url, "redis://redis:6379/0");

        settings
            .apply_lookup(lookup(&[(DEBUG, "false"), (MONGODB_NAME, "from_env")]))
            .unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.mongodb_name, "from_env");
        assert_eq!(settings.allowed_hosts, vec!["base.example.com"]);
        assert_eq!(
            settings.secret_key.as_ref().map(Secret::expose),
            Some("file-secret")
        );
    }

    #[test]
    fn blank_file_values_count_as_unset() {
        let key = "x".repeat(SECRET_KEY_LENGTH);
        let settings = Settings::from_toml(&format!(
            "mongodb_url = \"\"\n\
             google_client_id = \"\"\n\
             google_client_secret = \" \"\n\
             mongodb_name = \"\"\n\
             secret_key = \"{key}\"\n\
             allowed_hosts = [\"\", \" hireiq.ddns.net \"]\n"
        ))
        .unwrap();

        assert_eq!(settings.mongodb_url, None);
        assert_eq!(settings.google_client_id, None);
        assert_eq!(settings.google_client_secret, None);
        assert_eq!(settings.mongodb_name, "hireiq_db");
        assert_eq!(settings.allowed_hosts, vec!["hireiq.ddns.net"]);
        assert_eq!(
            settings.cors_allowed_origins(),
            vec![
                "https://hireiq.ddns.net",
                "http://localhost:3000",
                "http://127.0.0.1:3000"
            ]
        );

        let warnings = settings.warnings();
        assert!(warnings.iter().any(|w| w.contains(MONGODB_URL)));
        assert!(warnings.iter().any(|w| w.contains(GOOGLE_CLIENT_ID)));
        assert!(warnings.iter().any(|w| w.contains(GOOGLE_CLIENT_SECRET)));
    }

    #[test]
    fn load_reads_file_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(
            &path,
            r#"
            debug = true
            allowed_hosts = ["file.example.com"]
            mongodb_url = "mongodb+srv://from-file"
            redis_url = "redis://cache:6379/1"
            "#,
        )
        .unwrap();

        let settings = Settings::load_with(
            &path,
            lookup(&[(DEBUG, "false"), (MONGODB_URL, "mongodb+srv://from-env")]),
        )
        .unwrap();

        assert!(!settings.debug);
        assert_eq!(settings.mongodb_url.as_deref(), Some("mongodb+srv://from-env"));
        assert_eq!(settings.allowed_hosts, vec!["file.example.com"]);
        assert_eq!(settings.redis_url, "redis://cache:6379/1");
        assert_eq!(settings.mongodb_name, "hireiq_db");
    }

    #[test]
    fn bad_toml_is_a_deserialize_error() {
        assert!(matches!(
            Settings::from_toml("secure_hsts_seconds = \"soon\""),
            Err(ConfigError::Deserialize(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            Settings::load("/nonexistent/hireiq/settings.toml"),
            Err(ConfigError::ReadFile(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let settings =
            Settings::from_lookup(lookup(&[(GOOGLE_CLIENT_SECRET, "hunter2"), (SECRET_KEY, "s3cr3t")]))
                .unwrap();
        let printed = format!("{settings:?}");
        assert!(!printed.contains("hunter2"));
        assert!(!printed.contains("s3cr3t"));
        assert!(printed.contains("[REDACTED]"));
    }

    #[test]
    fn defaults_are_not_production_ready() {
        let warnings = Settings::default().warnings();
        assert!(warnings.iter().any(|w| w.contains(SECRET_KEY)));
        assert!(warnings.iter().any(|w| w.contains(MONGODB_URL)));
        assert!(warnings.iter().any(|w| w.contains(GOOGLE_CLIENT_ID)));
        assert!(warnings.iter().any(|w| w.contains(GOOGLE_CLIENT_SECRET)));
        assert!(warnings.iter().any(|w| w.contains("only local hosts")));
        assert!(!warnings.iter().any(|w| w.contains(DEBUG)));
    }

    #[test]
    fn complete_settings_have_no_warnings() {
        let key = "x".repeat(SECRET_KEY_LENGTH);
        let settings = Settings::from_lookup(lookup(&[
            (ALLOWED_HOSTS, "hireiq.ddns.net"),
            (MONGODB_URL, "mongodb+srv://cluster"),
            (GOOGLE_CLIENT_ID, "id"),
            (GOOGLE_CLIENT_SECRET, "secret"),
            (SECRET_KEY, key.as_str()),
        ]))
        .unwrap();
        assert!(settings.warnings().is_empty(), "{:?}", settings.warnings());
    }

    #[test]
    fn short_key_and_zero_hsts_are_flagged() {
        let settings = Settings::from_lookup(lookup(&[
            (SECRET_KEY, "short"),
            (SECURE_HSTS_SECONDS, "0"),
            (DEBUG, "true"),
        ]))
        .unwrap();
        let warnings = settings.warnings();
        assert!(warnings.iter().any(|w| w.contains("shorter than 50")));
        assert!(warnings.iter().any(|w| w.contains("HSTS is disabled")));
        assert!(warnings.iter().any(|w| w.contains("DEBUG is enabled")));
    }
}
