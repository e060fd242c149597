use std::time::Duration;

pub trait DbConnectConfig: serde::de::DeserializeOwned {
    fn uri(&self) -> &str;
}

/// Configure database connection pool data
pub trait DbOptionsConfig {
    fn max_conn(&self) -> Option<u32> { None }
    /// Connections opened eagerly at startup
    fn min_conn(&self) -> Option<u32> { None }
    fn connect_timeout(&self) -> Duration { Duration::from_millis(2_000) }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PostgresDbConfig {
    pub uri: String,
    pub max_conn: Option<u32>,
    pub min_conn: Option<u32>,
    #[serde(default = "connect_timeout_ms_default")]
    pub connect_timeout_ms: u64,
}

impl PostgresDbConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            max_conn: None,
            min_conn: None,
            connect_timeout_ms: connect_timeout_ms_default(),
        }
    }
}

impl DbConnectConfig for PostgresDbConfig {
    fn uri(&self) -> &str { &self.uri }
}

impl DbOptionsConfig for PostgresDbConfig {
    fn max_conn(&self) -> Option<u32> { self.max_conn }

    fn min_conn(&self) -> Option<u32> { self.min_conn }

    fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn connect_timeout_ms_default() -> u64 { 2_000 }
