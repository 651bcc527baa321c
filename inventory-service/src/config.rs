use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "inventory-service", about = "Inventory Management API")]
pub struct Config {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Full connection string. Takes precedence over the discrete `--db-*` fields.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Use TLS without verifying the server certificate. Only applies with `--database-url`.
    #[arg(long, env = "DATABASE_SSL_RELAXED")]
    pub database_ssl_relaxed: bool,

    #[arg(long, env = "PGUSER", default_value = "inventory_user")]
    pub db_user: String,

    #[arg(long, env = "PGHOST", default_value = "localhost")]
    pub db_host: String,

    #[arg(long, env = "PGDATABASE", default_value = "inventory_db")]
    pub db_name: String,

    #[arg(long, env = "PGPASSWORD", default_value = "admin", hide_env_values = true)]
    pub db_password: String,

    #[arg(long, env = "PGPORT", default_value = "5432")]
    pub db_port: u16,

    #[arg(long, env = "DATABASE_POOL_MAX_SIZE", default_value = "10")]
    pub pool_max_size: u32,

    #[arg(long, env = "DATABASE_POOL_TIMEOUT_SECS", default_value = "30")]
    pub pool_timeout_secs: u64,
}

impl Config {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection string handed to the Postgres driver: the URL as given, or
    /// the discrete fields rendered as libpq key/value pairs.
    pub fn connection_string(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "host={} port={} dbname={} user={} password={}",
                quote(&self.db_host),
                self.db_port,
                quote(&self.db_name),
                quote(&self.db_user),
                quote(&self.db_password),
            ),
        }
    }

    pub fn ssl_relaxed(&self) -> bool {
        self.database_url.is_some() && self.database_ssl_relaxed
    }

    /// Datastore target with the password removed, for logging.
    pub fn describe_database(&self) -> String {
        match &self.database_url {
            Some(url) => redact_url(url),
            None => format!(
                "host={} port={} dbname={} user={}",
                self.db_host, self.db_port, self.db_name, self.db_user
            ),
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://").map(|i| i + 3) else {
        return "<connection string>".to_string();
    };
    let rest = &url[scheme_end..];
    let Some(at) = rest.rfind('@') else {
        return url.to_string();
    };
    match rest[..at].find(':') {
        Some(colon) => format!(
            "{}{}:***{}",
            &url[..scheme_end],
            &rest[..colon],
            &rest[at..]
        ),
        None => url.to_string(),
    }
}
