use std::env;

use chrono::Duration;
use log::*;
use mo_common::{
    helpers::{env_var, parse_boolean_flag},
    Secret,
};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

const DEFAULT_MO_HOST: &str = "127.0.0.1";
const DEFAULT_MO_PORT: u16 = 6666;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/mini_order.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_JWT_LIFETIME_HOURS: i64 = 168;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    pub auth: AuthConfig,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// Capacity of each event hook's queue. Events published to a full queue are dropped.
    pub event_buffer_size: usize,
    /// The super admin to create on startup if there are no admins yet.
    pub super_admin: Option<SuperAdminConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MO_HOST.to_string(),
            port: DEFAULT_MO_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            auth: AuthConfig::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            super_admin: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env_var("MO_HOST").unwrap_or_else(|| DEFAULT_MO_HOST.into());
        let port = parse_or_default("MO_PORT", DEFAULT_MO_PORT);
        let database_url = env_var("MO_DATABASE_URL").unwrap_or_else(|| {
            warn!("🪛️ MO_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_or_default("MO_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let auth = AuthConfig::from_env_or_default();
        let use_x_forwarded_for = parse_boolean_flag(env::var("MO_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("MO_USE_FORWARDED").ok(), false);
        let event_buffer_size = parse_or_default("MO_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let super_admin = SuperAdminConfig::from_env();
        Self {
            host,
            port,
            database_url,
            max_connections,
            auth,
            use_x_forwarded_for,
            use_forwarded,
            event_buffer_size,
            super_admin,
        }
    }
}

/// The subset of the configuration that request handlers need to work out where a request came from.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyConfig {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ProxyConfig {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        None => default,
        Some(s) => s.parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {key}. {e} Using the default, {default}, instead.");
            default
        }),
    }
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: Secret::new(random_secret()), token_lifetime: Duration::hours(DEFAULT_JWT_LIFETIME_HOURS) }
    }
}

impl AuthConfig {
    pub fn new<S: Into<String>>(secret: S, token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.into()), token_lifetime }
    }

    pub fn from_env_or_default() -> Self {
        let jwt_secret = match env_var("MO_JWT_SECRET") {
            Some(s) => Secret::new(s),
            None => {
                warn!(
                    "🪛️ MO_JWT_SECRET is not set. A random secret has been generated for this session. All access \
                     tokens will become invalid when the server restarts. Set MO_JWT_SECRET in production."
                );
                Secret::new(random_secret())
            },
        };
        let hours = parse_or_default("MO_JWT_LIFETIME_HOURS", DEFAULT_JWT_LIFETIME_HOURS);
        let hours = if hours > 0 {
            hours
        } else {
            warn!("🪛️ MO_JWT_LIFETIME_HOURS must be positive. Using {DEFAULT_JWT_LIFETIME_HOURS} hours.");
            DEFAULT_JWT_LIFETIME_HOURS
        };
        Self { jwt_secret, token_lifetime: Duration::hours(hours) }
    }
}

fn random_secret() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect()
}

#[derive(Clone, Debug)]
pub struct SuperAdminConfig {
    pub email: String,
    pub password: Secret<String>,
}

impl SuperAdminConfig {
    /// Both `MO_SUPERADMIN_EMAIL` and `MO_SUPERADMIN_PASSWORD` must be set, otherwise there is nothing to bootstrap.
    pub fn from_env() -> Option<Self> {
        match (env_var("MO_SUPERADMIN_EMAIL"), env_var("MO_SUPERADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(Self { email, password: Secret::new(password) }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("🪛️ Only one of MO_SUPERADMIN_EMAIL and MO_SUPERADMIN_PASSWORD is set. Both are required.");
                None
            },
            (None, None) => {
                debug!("🪛️ No super admin configured");
                None
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 6666);
        assert_eq!(config.max_connections, 25);
        assert_eq!(config.auth.token_lifetime, Duration::hours(168));
        assert_eq!(config.auth.jwt_secret.reveal().len(), 48);
        assert!(config.super_admin.is_none());
    }

    #[test]
    fn random_secrets_differ() {
        assert_ne!(AuthConfig::default().jwt_secret.reveal(), AuthConfig::default().jwt_secret.reveal());
    }

    #[test]
    fn secrets_are_not_printed() {
        let config = AuthConfig::new("my-very-secret-key", Duration::hours(1));
        assert!(!format!("{config:?}").contains("my-very-secret-key"));
    }
}
