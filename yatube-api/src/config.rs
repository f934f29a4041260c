use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
}

/// Process configuration, read from the environment (and `.env`).
#[derive(Clone, Eq, PartialEq, Hash, Deserialize)]
pub struct Env {
    pub server_address: IpAddr,
    pub server_port: u16,
    /// Without it the server keeps everything in memory.
    pub database_url: Option<String>,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
}

fn default_database_max_connections() -> u32 {
    DEFAULT_DATABASE_MAX_CONNECTIONS
}

impl Env {
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if e.not_found() {
                debug!("No .env file found");
            } else {
                return Err(e.into());
            }
        }

        Ok(envy::from_env()?)
    }

    #[must_use]
    pub fn socket_address(&self) -> SocketAddr {
        SocketAddr::new(self.server_address, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{DEFAULT_DATABASE_MAX_CONNECTIONS, Env};
    use std::net::{Ipv4Addr, SocketAddr};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn minimal_environment() {
        let env: Env =
            envy::from_iter(vars(&[("SERVER_ADDRESS", "127.0.0.1"), ("SERVER_PORT", "8000")]))
                .unwrap();

        assert_eq!(
            env.socket_address(),
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 8000)
        );
        assert_eq!(env.database_url, None);
        assert_eq!(env.database_max_connections, DEFAULT_DATABASE_MAX_CONNECTIONS);
    }

    #[test]
    fn database_settings() {
        let env: Env = envy::from_iter(vars(&[
            ("SERVER_ADDRESS", "0.0.0.0"),
            ("SERVER_PORT", "80"),
            ("DATABASE_URL", "postgres://yatube@localhost/yatube"),
            ("DATABASE_MAX_CONNECTIONS", "20"),
        ]))
        .unwrap();

        assert_eq!(
            env.database_url.as_deref(),
            Some("postgres://yatube@localhost/yatube")
        );
        assert_eq!(env.database_max_connections, 20);
    }

    #[test]
    fn bad_port_is_rejected() {
        let env = envy::from_iter::<_, Env>(vars(&[
            ("SERVER_ADDRESS", "127.0.0.1"),
            ("SERVER_PORT", "http"),
        ]));

        assert!(env.is_err());
    }
}
