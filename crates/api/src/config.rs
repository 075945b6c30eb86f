use std::fmt;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Honor `X-Forwarded-For` / `X-Real-IP` when resolving the client IP.
    pub trust_proxy_headers: bool,
    /// JWT token configuration (secret, TTLs).
    pub jwt: JwtConfig,
    /// Login throttling, lockout and audit settings.
    pub security: SecurityConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `TRUST_PROXY_HEADERS`  | `false`                    |
    ///
    /// See [`JwtConfig::from_env`] and [`SecurityConfig::from_env`] for the
    /// remaining variables.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);
        let trust_proxy_headers: bool = env_or("TRUST_PROXY_HEADERS", false);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            trust_proxy_headers,
            jwt: JwtConfig::from_env(),
            security: SecurityConfig::from_env(),
        }
    }
}

/// Per-endpoint throttle window: at most `max_attempts` requests every
/// `decay_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointLimit {
    pub max_attempts: u32,
    pub decay_minutes: u64,
}

impl EndpointLimit {
    pub const fn new(max_attempts: u32, decay_minutes: u64) -> Self {
        Self {
            max_attempts,
            decay_minutes,
        }
    }

    pub fn window_secs(&self) -> u64 {
        self.decay_minutes * 60
    }
}

/// Error returned when an `EndpointLimit` string is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointLimitParseError(String);

impl fmt::Display for EndpointLimitParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected 'max_attempts,decay_minutes', got '{}'", self.0)
    }
}

impl std::error::Error for EndpointLimitParseError {}

impl FromStr for EndpointLimit {
    type Err = EndpointLimitParseError;

    /// Parse `"max_attempts,decay_minutes"`, e.g. `"3,10"`. Both values must
    /// be positive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || EndpointLimitParseError(s.to_string());
        let (max, decay) = s.split_once(',').ok_or_else(err)?;
        let max_attempts: u32 = max.trim().parse().map_err(|_| err())?;
        let decay_minutes: u64 = decay.trim().parse().map_err(|_| err())?;
        if max_attempts == 0 || decay_minutes == 0 {
            return Err(err());
        }
        Ok(Self::new(max_attempts, decay_minutes))
    }
}

/// Login security policy.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Failed attempts before an identifier is locked. Also the request
    /// budget of the login throttle.
    pub max_attempts: i32,
    /// Login throttle window in minutes.
    pub decay_minutes: u64,
    /// How long a lock lasts.
    pub lockout_minutes: i32,
    pub register_limit: EndpointLimit,
    pub refresh_limit: EndpointLimit,
    pub track_by_ip: bool,
    pub track_by_email: bool,
    /// Failed attempts per IP within the trailing hour before every login
    /// from that IP is refused.
    pub global_threshold: i64,
    /// Email failure count at which a security alert is raised.
    pub alert_threshold: i32,
    /// When set, registration does not issue a token and unverified users
    /// cannot log in.
    pub email_verification_required: bool,
    /// Login attempts older than this are purged.
    pub audit_retention_days: i64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            decay_minutes: 1,
            lockout_minutes: 15,
            register_limit: EndpointLimit::new(3, 10),
            refresh_limit: EndpointLimit::new(10, 1),
            track_by_ip: true,
            track_by_email: true,
            global_threshold: 20,
            alert_threshold: 10,
            email_verification_required: false,
            audit_retention_days: 90,
        }
    }
}

impl SecurityConfig {
    /// Load the security policy from environment variables.
    ///
    /// | Env Var                       | Default |
    /// |-------------------------------|---------|
    /// | `LOGIN_MAX_ATTEMPTS`          | `5`     |
    /// | `LOGIN_DECAY_MINUTES`         | `1`     |
    /// | `LOGIN_LOCKOUT_MINUTES`       | `15`    |
    /// | `RATE_LIMIT_REGISTER`         | `3,10`  |
    /// | `RATE_LIMIT_REFRESH`          | `10,1`  |
    /// | `TRACK_BY_IP`                 | `true`  |
    /// | `TRACK_BY_EMAIL`              | `true`  |
    /// | `GLOBAL_THRESHOLD`            | `20`    |
    /// | `ALERT_THRESHOLD`             | `10`    |
    /// | `EMAIL_VERIFICATION_REQUIRED` | `false` |
    /// | `AUDIT_RETENTION_DAYS`        | `90`    |
    ///
    /// # Panics
    ///
    /// Panics if any variable is set but cannot be parsed, or if a count or
    /// duration is not positive.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            max_attempts: env_or("LOGIN_MAX_ATTEMPTS", defaults.max_attempts),
            decay_minutes: env_or("LOGIN_DECAY_MINUTES", defaults.decay_minutes),
            lockout_minutes: env_or("LOGIN_LOCKOUT_MINUTES", defaults.lockout_minutes),
            register_limit: env_or("RATE_LIMIT_REGISTER", defaults.register_limit),
            refresh_limit: env_or("RATE_LIMIT_REFRESH", defaults.refresh_limit),
            track_by_ip: env_or("TRACK_BY_IP", defaults.track_by_ip),
            track_by_email: env_or("TRACK_BY_EMAIL", defaults.track_by_email),
            global_threshold: env_or("GLOBAL_THRESHOLD", defaults.global_threshold),
            alert_threshold: env_or("ALERT_THRESHOLD", defaults.alert_threshold),
            email_verification_required: env_or(
                "EMAIL_VERIFICATION_REQUIRED",
                defaults.email_verification_required,
            ),
            audit_retention_days: env_or("AUDIT_RETENTION_DAYS", defaults.audit_retention_days),
        };

        assert!(config.max_attempts > 0, "LOGIN_MAX_ATTEMPTS must be positive");
        assert!(config.decay_minutes > 0, "LOGIN_DECAY_MINUTES must be positive");
        assert!(config.lockout_minutes > 0, "LOGIN_LOCKOUT_MINUTES must be positive");
        assert!(config.global_threshold > 0, "GLOBAL_THRESHOLD must be positive");
        assert!(config.alert_threshold > 0, "ALERT_THRESHOLD must be positive");
        assert!(config.audit_retention_days > 0, "AUDIT_RETENTION_DAYS must be positive");

        config
    }

    /// Throttle window for `POST /login`.
    pub fn login_limit(&self) -> EndpointLimit {
        EndpointLimit::new(self.max_attempts.max(1) as u32, self.decay_minutes)
    }
}

/// Read and parse an environment variable, falling back to `default` when
/// it is unset.
///
/// # Panics
///
/// Panics if the variable is set but does not parse.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => default,
    }
}
