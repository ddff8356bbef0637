use clap::{Args, Parser};

/// Database connection settings shared by every binary.
#[derive(Debug, Clone, Args)]
pub struct DatabaseArgs {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://commerce.db?mode=rwc")]
    pub database_url: String,

    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    pub db_max_connections: u32,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "server", about = "Commerce admin HTTP API")]
pub struct ServerConfig {
    #[command(flatten)]
    pub database: DatabaseArgs,

    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = ServerConfig::parse_from([
            "server",
            "--port",
            "8080",
            "--database-url",
            "sqlite::memory:",
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.database.database_url, "sqlite::memory:");
        assert_eq!(config.database.db_max_connections, 5);
    }
}
