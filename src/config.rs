use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret_key: String, // Ed25519 private key (PEM)
    pub jwt_public_key: String, // Ed25519 public key (PEM)
    pub auth_issuer: String,
    pub client_url: String,
    pub reminder_lead_hours: i64,
    pub reminder_poll_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret_key: env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set (Ed25519 Private Key)"),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://api.rehearsals.local".to_string()),
            client_url: env::var("CLIENT_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            reminder_lead_hours: env::var("REMINDER_LEAD_HOURS").unwrap_or_else(|_| "24".to_string()).parse().expect("REMINDER_LEAD_HOURS must be a number"),
            reminder_poll_secs: env::var("REMINDER_POLL_SECS").unwrap_or_else(|_| "60".to_string()).parse().expect("REMINDER_POLL_SECS must be a number"),
        }
    }
}
