use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub due_soon_days: i32,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        // JWT_EXPIRATION is given in hours, e.g. "1" or "1h".
        let jwt_expiration = env::var("JWT_EXPIRATION")
            .unwrap_or_else(|_| "1".into())
            .trim_end_matches('h')
            .parse::<u64>()
            .unwrap_or(1);

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            due_soon_days: env::var("DUE_SOON_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }
}
