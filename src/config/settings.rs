use std::env;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Clone)]
pub struct Settings {
    pub port: u16,
    pub addr: SocketAddr,
    pub database_url: String,
    pub jwt_secret: String,
    /// Bounded wait for the identity store before the degraded-mode
    /// fallback is considered.
    pub auth_timeout: Duration,
    pub emergency: EmergencySettings,
    pub smtp: SmtpSettings,
}

/// Pre-shared operator credentials used only when the identity store
/// cannot be reached. Disabled unless explicitly turned on.
#[derive(Clone)]
pub struct EmergencySettings {
    pub enabled: bool,
    pub admin_emails: Vec<String>,
    pub passphrase: Option<String>,
}

#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
}

impl Settings {
    pub fn new() -> Self {
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let auth_timeout_secs: u64 = env::var("AUTH_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        let emergency = EmergencySettings {
            enabled: env::var("EMERGENCY_ACCESS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            admin_emails: env::var("EMERGENCY_ADMIN_EMAILS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            passphrase: env::var("EMERGENCY_PASSPHRASE").ok(),
        };

        let smtp = SmtpSettings {
            host: env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(587),
            username: env::var("SMTP_USERNAME").unwrap_or_default(),
            password: env::var("SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("SMTP_FROM_EMAIL")
                .unwrap_or_else(|_| "studio@chefcast.fm".to_string()),
            from_name: env::var("SMTP_FROM_NAME").unwrap_or_else(|_| "Chefcast".to_string()),
        };

        Self {
            port,
            addr,
            database_url,
            jwt_secret,
            auth_timeout: Duration::from_secs(auth_timeout_secs),
            emergency,
            smtp,
        }
    }
}
