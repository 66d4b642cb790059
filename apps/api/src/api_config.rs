use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use shiftledger_application::DEFAULT_FREE_TIER_MAX_SHIFTS;
use shiftledger_core::AppError;
use tracing_subscriber::EnvFilter;

const MIN_INTERNAL_API_KEY_LENGTH: usize = 16;
const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone)]
pub struct CalDavRuntimeConfig {
    pub calendar_url: String,
    pub username: String,
    pub password: String,
    pub timezone: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum CalendarSyncProviderConfig {
    Disabled,
    CalDav(CalDavRuntimeConfig),
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub internal_api_key: String,
    pub jwt_secret: String,
    pub free_tier_max_shifts: u32,
    pub db_max_connections: u32,
    pub db_lock_timeout: Duration,
    pub sync_queue_capacity: usize,
    pub sync_workers: usize,
    pub calendar_sync_provider: CalendarSyncProviderConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parse_env_or("API_PORT", 3001_u16)?;

        let internal_api_key = required_env("INTERNAL_API_KEY")?;
        if internal_api_key.len() < MIN_INTERNAL_API_KEY_LENGTH {
            return Err(AppError::Validation(format!(
                "INTERNAL_API_KEY must be at least {MIN_INTERNAL_API_KEY_LENGTH} characters"
            )));
        }

        let jwt_secret = required_env("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::Validation(format!(
                "JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters"
            )));
        }

        let free_tier_max_shifts =
            parse_env_or("FREE_TIER_MAX_SHIFTS", DEFAULT_FREE_TIER_MAX_SHIFTS)?;
        if free_tier_max_shifts == 0 {
            return Err(AppError::Validation(
                "FREE_TIER_MAX_SHIFTS must be greater than zero".to_owned(),
            ));
        }

        let db_max_connections = parse_env_or("DB_MAX_CONNECTIONS", 10_u32)?.max(1);
        let db_lock_timeout = Duration::from_millis(parse_env_or("DB_LOCK_TIMEOUT_MS", 30_000_u64)?);
        let sync_queue_capacity = parse_env_or("SYNC_QUEUE_CAPACITY", 1024_usize)?.max(1);
        let sync_workers = parse_env_or("SYNC_WORKERS", 4_usize)?.max(1);

        let calendar_sync_provider = match env::var("CALENDAR_SYNC_PROVIDER")
            .unwrap_or_else(|_| "disabled".to_owned())
            .as_str()
        {
            "disabled" => CalendarSyncProviderConfig::Disabled,
            "caldav" => CalendarSyncProviderConfig::CalDav(CalDavRuntimeConfig {
                calendar_url: required_non_empty_env("CALDAV_URL")?,
                username: required_non_empty_env("CALDAV_USERNAME")?,
                password: required_non_empty_env("CALDAV_PASSWORD")?,
                timezone: env::var("CALDAV_TIMEZONE").unwrap_or_else(|_| "UTC".to_owned()),
                timeout: Duration::from_secs(parse_env_or("CALDAV_TIMEOUT_SECONDS", 15_u64)?),
            }),
            other => {
                return Err(AppError::Validation(format!(
                    "CALENDAR_SYNC_PROVIDER must be either 'disabled' or 'caldav', got '{other}'"
                )));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            api_host,
            api_port,
            internal_api_key,
            jwt_secret,
            free_tier_max_shifts,
            db_max_connections,
            db_lock_timeout,
            sync_queue_capacity,
            sync_workers,
            calendar_sync_provider,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn required_non_empty_env(name: &str) -> Result<String, AppError> {
    let value = required_env(name)?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

fn parse_env_or<T>(name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => parse_value(name, value.trim()),
        _ => Ok(default),
    }
}

fn parse_value<T>(name: &str, value: &str) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))
}
