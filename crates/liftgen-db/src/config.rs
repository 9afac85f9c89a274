use std::env;

/// Database configuration.
///
/// Reads from the `LIFTGEN_DATABASE_URL` environment variable, falling back
/// to `postgresql://localhost:5432/liftgen` when unset. The pool size comes
/// from `LIFTGEN_DB_MAX_CONNECTIONS`.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    /// Upper bound on pooled connections. Always at least 1.
    pub max_connections: u32,
}

impl DbConfig {
    /// The default connection URL used when no environment variable is set.
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/liftgen";

    /// Environment variable consulted by [`DbConfig::from_env`].
    pub const ENV_VAR: &str = "LIFTGEN_DATABASE_URL";

    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

    /// Environment variable holding the pool size.
    pub const MAX_CONNECTIONS_ENV_VAR: &str = "LIFTGEN_DB_MAX_CONNECTIONS";

    /// Build a config from the environment.
    ///
    /// An unparsable pool size falls back to the default.
    pub fn from_env() -> Self {
        let database_url =
            env::var(Self::ENV_VAR).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned());
        let config = Self::new(database_url);
        match env::var(Self::MAX_CONNECTIONS_ENV_VAR)
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            Some(n) => config.with_max_connections(n),
            None => config,
        }
    }

    /// Build a config from an explicit URL (tests and CLI flags).
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
        }
    }

    /// Override the pool size. Zero is raised to 1.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Extract the database name from the URL, ignoring any query string.
    ///
    /// Returns `None` if the URL has no path component.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self
            .database_url
            .split_once('?')
            .map_or(self.database_url.as_str(), |(base, _)| base);
        without_query
            .rsplit_once('/')
            .map(|(_, name)| name)
            .filter(|s| !s.is_empty() && !s.contains(':'))
    }

    /// Return a URL pointing at the `postgres` maintenance database on the
    /// same host. Used to issue `CREATE DATABASE` when the target DB does not
    /// yet exist.
    pub fn maintenance_url(&self) -> String {
        match self.database_url.rfind('/') {
            Some(pos) => {
                let mut url = self.database_url[..pos].to_owned();
                url.push_str("/postgres");
                url
            }
            None => self.database_url.clone(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
