use std::{env, time::Duration};

#[derive(Debug, Clone)]
pub struct Config {
	pub server_host: String,
	pub server_port: u16,
	pub database_url: String,
	pub jwt_secret: String,
	pub jwt_expiration_hours: i64,
	pub max_pool_size: u32,
	pub request_timeout_secs: u64,
}

impl Config {
	pub fn from_env() -> Result<Self, ConfigError> {
		// Load .env file if it exists
		let _ = dotenvy::dotenv();

		Ok(Self {
			server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
			server_port: env::var("SERVER_PORT")
				.unwrap_or_else(|_| "8080".to_string())
				.parse()
				.map_err(|_| ConfigError::InvalidNumber("SERVER_PORT"))?,
			database_url: env::var("DATABASE_URL")
				.unwrap_or_else(|_| "sqlite://shinomontaj.db".to_string()),
			jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
			jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
				.unwrap_or_else(|_| "24".to_string())
				.parse()
				.map_err(|_| ConfigError::InvalidNumber("JWT_EXPIRATION_HOURS"))?,
			max_pool_size: env::var("MAX_POOL_SIZE")
				.unwrap_or_else(|_| "5".to_string())
				.parse()
				.map_err(|_| ConfigError::InvalidNumber("MAX_POOL_SIZE"))?,
			request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
				.unwrap_or_else(|_| "30".to_string())
				.parse()
				.map_err(|_| ConfigError::InvalidNumber("REQUEST_TIMEOUT_SECS"))?,
		})
	}

	pub fn server_addr(&self) -> String {
		format!("{}:{}", self.server_host, self.server_port)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{0} must be set")]
	Missing(&'static str),
	#[error("{0} must be a number")]
	InvalidNumber(&'static str),
}
