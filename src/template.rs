/*
 *  template.rs
 *  (c) 2025 Teodor Potancok
 *
 *  This Source Code Form is subject to the terms of the Mozilla Public
 *  License, v. 2.0. If a copy of the MPL was not distributed with this
 *  file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::config::{self, Secret, Settings};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Z][A-Z0-9_]*)").expect("placeholder pattern is valid"));

/// Backend `.env` skeleton.
pub const ENV_TEMPLATE: &str = "\
# HireIQ backend production environment
SECRET_KEY=$SECRET_KEY
DEBUG=$DEBUG
ALLOWED_HOSTS=$ALLOWED_HOSTS

# Security
SECURE_SSL_REDIRECT=$SECURE_SSL_REDIRECT
SECURE_HSTS_SECONDS=$SECURE_HSTS_SECONDS
SECURE_HSTS_INCLUDE_SUBDOMAINS=$SECURE_HSTS_INCLUDE_SUBDOMAINS
SECURE_HSTS_PRELOAD=$SECURE_HSTS_PRELOAD
SESSION_COOKIE_SECURE=$SESSION_COOKIE_SECURE
CSRF_COOKIE_SECURE=$CSRF_COOKIE_SECURE

# MongoDB Atlas
MONGODB_URL=$MONGODB_URL
MONGODB_NAME=$MONGODB_NAME

# Google OAuth
GOOGLE_CLIENT_ID=$GOOGLE_CLIENT_ID
GOOGLE_CLIENT_SECRET=$GOOGLE_CLIENT_SECRET

# Cache
REDIS_URL=$REDIS_URL
";

/// Replaces each `$NAME` found in `vars`. Unknown placeholders are kept as is.
pub fn render(template: &str, vars: &[(&str, String)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            match vars.iter().find(|(name, _)| *name == &caps[1]) {
                Some((_, value)) => value.clone(),
                None => caps[0].to_string(),
            }
        })
        .to_string()
}

fn exposed_or(secret: &Option<Secret>, fallback: &str) -> String {
    quote(secret.as_ref().map_or(fallback, |s| s.expose()))
}

/// Quotes a value so env-file loaders and shells keep it literal.
///
/// Single quotes when possible. Values containing `'` fall back to double
/// quotes with `\`, `"` escaped and `$` doubled.
pub fn quote(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '$' => quoted.push_str("$$"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// Fills [`ENV_TEMPLATE`] from `settings`, with `secret_key` as the signing key.
pub fn env_file(settings: &Settings, secret_key: &str) -> String {
    let vars = [
        (config::SECRET_KEY, quote(secret_key)),
        (config::DEBUG, settings.debug.to_string()),
        (config::ALLOWED_HOSTS, settings.allowed_hosts.join(",")),
        (
            config::SECURE_SSL_REDIRECT,
            settings.secure_ssl_redirect.to_string(),
        ),
        (
            config::SECURE_HSTS_SECONDS,
            settings.secure_hsts_seconds.to_string(),
        ),
        (
            config::SECURE_HSTS_INCLUDE_SUBDOMAINS,
            settings.secure_hsts_include_subdomains.to_string(),
        ),
        (
            config::SECURE_HSTS_PRELOAD,
            settings.secure_hsts_preload.to_string(),
        ),
        (
            config::SESSION_COOKIE_SECURE,
            settings.session_cookie_secure.to_string(),
        ),
        (
            config::CSRF_COOKIE_SECURE,
            settings.csrf_cookie_secure.to_string(),
        ),
        (
            config::MONGODB_URL,
            quote(
                settings
                    .mongodb_url
                    .as_deref()
                    .unwrap_or("mongodb+srv://<user>:<password>@<cluster>/"),
            ),
        ),
        (config::MONGODB_NAME, settings.mongodb_name.clone()),
        (
            config::GOOGLE_CLIENT_ID,
            exposed_or(&settings.google_client_id, "<google-client-id>"),
        ),
        (
            config::GOOGLE_CLIENT_SECRET,
            exposed_or(&settings.google_client_secret, "<google-client-secret>"),
        ),
        (config::REDIS_URL, settings.redis_url.clone()),
    ];

    render(ENV_TEMPLATE, &vars)
}
