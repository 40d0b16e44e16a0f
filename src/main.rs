use crate::config::{ConfigError, Secret, Settings};
use crate::secrets::{SECRET_KEY_LENGTH, SecretError};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use thiserror::Error;

mod config;
mod instructions;
mod secrets;
mod template;

/// Generates a Django secret key and prints the HireIQ deployment checklist.
#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    key: KeyArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct KeyArgs {
    /// Length of the generated secret key
    #[arg(long, default_value_t = SECRET_KEY_LENGTH)]
    length: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Print only the SECRET_KEY line
    Secret {
        #[command(flatten)]
        key: KeyArgs,
    },
    /// Print a backend .env file with a fresh secret key
    EnvTemplate {
        #[command(flatten)]
        key: KeyArgs,
        /// TOML file with base settings, overridden by the environment
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Show the effective production settings and what is missing
    Check {
        /// TOML file with base settings, overridden by the environment
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

fn main() -> ExitCode {
    // Setup logger
    let filter =
        LevelFilter::from_str(&std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_owned()))
            .unwrap_or(LevelFilter::Info);

    env_logger::Builder::new()
        .filter_level(filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                chrono::Local::now().format("%T%.3f"),
                record.level(),
                record.args()
            )
        })
        .init();

    let cli = Cli::parse();

    match run(cli, &mut io::stdout().lock()) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &mut impl Write) -> Result<ExitCode, AppError> {
    match cli.command {
        None => {
            let secret = secrets::generate_secret(cli.key.length)?;
            log::debug!("Generated {}-character secret key", cli.key.length);
            instructions::write_instructions(out, &secret)?;
        }
        Some(Command::Secret { key }) => {
            let secret = secrets::generate_secret(key.length)?;
            instructions::write_secret_line(out, &secret)?;
        }
        Some(Command::EnvTemplate { key, config }) => {
            let settings = load_settings(config.as_deref())?;
            let secret = secrets::generate_secret(key.length)?;
            out.write_all(template::env_file(&settings, &secret).as_bytes())?;
        }
        Some(Command::Check { config }) => {
            let settings = load_settings(config.as_deref())?;
            let warnings = settings.warnings();
            write_report(out, &settings, &warnings)?;

            if !warnings.is_empty() {
                for warning in &warnings {
                    log::warn!("{warning}");
                }
                return Ok(ExitCode::FAILURE);
            }
            log::info!("Settings are ready for production");
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    match path {
        Some(path) => Settings::load(path),
        None => Settings::from_env(),
    }
}

fn presence(secret: &Option<Secret>) -> &'static str {
    if secret.is_some() { "<set>" } else { "<not set>" }
}

fn write_report(out: &mut impl Write, settings: &Settings, warnings: &[String]) -> io::Result<()> {
    writeln!(out, "DEBUG = {}", settings.debug)?;
    writeln!(out, "SECRET_KEY = {}", presence(&settings.secret_key))?;
    writeln!(out, "ALLOWED_HOSTS = {}", settings.allowed_hosts.join(","))?;
    writeln!(out)?;

    writeln!(out, "SECURE_SSL_REDIRECT = {}", settings.secure_ssl_redirect)?;
    writeln!(
        out,
        "SECURE_PROXY_SSL_HEADER = {} {}",
        config::SECURE_PROXY_SSL_HEADER.0,
        config::SECURE_PROXY_SSL_HEADER.1
    )?;
    writeln!(out, "SECURE_HSTS_SECONDS = {}", settings.secure_hsts_seconds)?;
    writeln!(
        out,
        "SECURE_HSTS_INCLUDE_SUBDOMAINS = {}",
        settings.secure_hsts_include_subdomains
    )?;
    writeln!(out, "SECURE_HSTS_PRELOAD = {}", settings.secure_hsts_preload)?;
    writeln!(out, "USE_X_FORWARDED_HOST = {}", config::USE_X_FORWARDED_HOST)?;
    writeln!(out, "USE_X_FORWARDED_PORT = {}", config::USE_X_FORWARDED_PORT)?;
    writeln!(out, "SESSION_COOKIE_SECURE = {}", settings.session_cookie_secure)?;
    writeln!(out, "CSRF_COOKIE_SECURE = {}", settings.csrf_cookie_secure)?;
    writeln!(out, "CORS_ALLOW_ALL_ORIGINS = {}", config::CORS_ALLOW_ALL_ORIGINS)?;
    writeln!(
        out,
        "CORS_ALLOWED_ORIGINS = {}",
        settings.cors_allowed_origins().join(",")
    )?;
    writeln!(
        out,
        "CSRF_TRUSTED_ORIGINS = {}",
        settings.csrf_trusted_origins().join(",")
    )?;
    writeln!(out)?;

    writeln!(out, "STATIC_URL = {}", config::STATIC_URL)?;
    writeln!(out, "STATIC_ROOT = {}", config::STATIC_ROOT)?;
    writeln!(out, "MEDIA_URL = {}", config::MEDIA_URL)?;
    writeln!(out, "MEDIA_ROOT = {}", config::MEDIA_ROOT)?;
    writeln!(
        out,
        "MONGODB_URL = {}",
        settings.mongodb_url.as_deref().unwrap_or("<not set>")
    )?;
    writeln!(out, "MONGODB_NAME = {}", settings.mongodb_name)?;
    writeln!(out, "REDIS_URL = {}", settings.redis_url)?;
    writeln!(
        out,
        "CACHE_BACKEND = {} ({}) at {}",
        config::CACHE_BACKEND,
        config::CACHE_CLIENT_CLASS,
        settings.redis_url
    )?;
    writeln!(
        out,
        "SESSION_ENGINE = {} ({})",
        config::SESSION_ENGINE,
        config::SESSION_CACHE_ALIAS
    )?;
    writeln!(out)?;

    writeln!(out, "GOOGLE_CLIENT_ID = {}", presence(&settings.google_client_id))?;
    writeln!(
        out,
        "GOOGLE_CLIENT_SECRET = {}",
        presence(&settings.google_client_secret)
    )?;
    writeln!(out, "OAUTH_LOGIN_URL = {}", config::OAUTH_LOGIN_URL)?;
    writeln!(
        out,
        "OAUTH_LOGIN_REDIRECT_URL = {}",
        config::OAUTH_LOGIN_REDIRECT_URL
    )?;
    writeln!(out, "OAUTH_REDIRECT_URI = {}", config::OAUTH_REDIRECT_URI)?;

    if !warnings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Problems:")?;
        for warning in warnings {
            writeln!(out, "  - {warning}")?;
        }
    }

    out.flush()
}
