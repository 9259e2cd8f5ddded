//! HTTP server command
//!
//! Opens the store once, then hands it to the server for the rest of the
//! process lifetime.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use toyland_server::http::server::DEFAULT_PORT;
use toyland_server::store::{MemoryToyStore, MongoToyStore, ToyStore};
use toyland_server::{run_server, ServerConfig, StoreConfig};

/// Store backend to serve from
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// MongoDB deployment built from the credentials or --mongodb-uri
    Mongo,
    /// Process memory; contents are lost on exit
    Memory,
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Store username
    #[arg(long, env = "DB_USER", default_value = "")]
    pub db_user: String,

    /// Store password
    #[arg(long, env = "DB_PASS", default_value = "", hide_env_values = true)]
    pub db_pass: String,

    /// Full MongoDB connection string (replaces the one built from DB_USER/DB_PASS)
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongodb_uri: Option<String>,

    /// Store backend
    #[arg(long, value_enum, default_value_t = StoreKind::Mongo)]
    pub store: StoreKind,
}

impl ServeArgs {
    fn store_config(&self) -> StoreConfig {
        StoreConfig {
            uri_override: self.mongodb_uri.clone(),
            ..StoreConfig::with_credentials(&self.db_user, &self.db_pass)
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::new(self.host, self.port),
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let store: Arc<dyn ToyStore> = match args.store {
        StoreKind::Mongo => {
            let store = MongoToyStore::connect(&args.store_config())
                .await
                .context("Failed to create store client")?;
            Arc::new(store)
        }
        StoreKind::Memory => {
            tracing::warn!("Serving from process memory; toys are lost on exit");
            Arc::new(MemoryToyStore::new())
        }
    };

    // Run server (blocks until shutdown)
    run_server(store, args.server_config())
        .await
        .context("Server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args =
            ServeArgs::try_parse_from(["serve", "--db-user", "toy", "--db-pass", "pw"]).unwrap();
        assert_eq!(args.store, StoreKind::Mongo);

        let config = args.store_config();
        assert_eq!(config.user, "toy");
        assert_eq!(config.password, "pw");
        assert_eq!(config.database, "toyLand");
    }

    #[test]
    fn uri_override_and_memory_store() {
        let args = ServeArgs::try_parse_from([
            "serve",
            "--port",
            "8080",
            "--store",
            "memory",
            "--mongodb-uri",
            "mongodb://localhost:27017",
        ])
        .unwrap();

        assert_eq!(args.store, StoreKind::Memory);
        assert_eq!(args.server_config().bind_addr.port(), 8080);
        assert_eq!(args.store_config().connection_uri(), "mongodb://localhost:27017");
    }
}
