//! Configuration for Procedure Hub
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Procedure Hub - procedure tracking service
#[derive(Parser, Debug, Clone)]
#[command(name = "procedure-hub")]
#[command(about = "Procedure tracking service with read acknowledgments")]
pub struct Args {
    /// Unique instance identifier for this service instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI (the storage service endpoint)
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "procedure_hub")]
    pub mongodb_db: String,

    /// JWT secret for session token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT session token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "3600")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (relaxes MongoDB and JWT requirements)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    ///
    /// The storage endpoint and the token-signing secret are both fatal
    /// startup conditions outside dev mode.
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.jwt_secret.is_none() {
                return Err("JWT_SECRET is required in production mode".to_string());
            }
            if self.mongodb_uri.trim().is_empty() {
                return Err("MONGODB_URI must not be empty".to_string());
            }
        }

        if let Some(secret) = &self.jwt_secret {
            if secret.len() < 32 {
                return Err("JWT_SECRET must be at least 32 characters".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            node_id: Uuid::new_v4(),
            listen: "127.0.0.1:8080".parse().unwrap(),
            mongodb_uri: "mongodb://localhost:27017".into(),
            mongodb_db: "procedure_hub".into(),
            jwt_secret: Some("a-test-secret-that-is-32-chars-long!".into()),
            jwt_expiry_seconds: 3600,
            dev_mode: false,
            log_level: "info".into(),
        }
    }

    #[test]
    fn test_valid_production_config() {
        assert!(base_args().validate().is_ok());
    }

    #[test]
    fn test_missing_jwt_secret_is_fatal() {
        let mut args = base_args();
        args.jwt_secret = None;
        assert!(args.validate().is_err());

        // Dev mode relaxes the requirement
        args.dev_mode = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut args = base_args();
        args.jwt_secret = Some("too-short".into());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_empty_storage_endpoint_is_fatal() {
        let mut args = base_args();
        args.mongodb_uri = "".into();
        assert!(args.validate().is_err());
    }
}
