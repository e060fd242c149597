use std::time::Duration;

pub trait DbConnectConfig: serde::de::DeserializeOwned {
    fn password(&self) -> Option<&str> { None }
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn db(&self) -> u8;

    fn max_conn(&self) -> usize { max_conn_default() }

    /// Bound on pool wait, connection creation and recycling.
    fn connect_timeout(&self) -> Duration {
        Duration::from_millis(connect_timeout_ms_default())
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RedisDbConfig {
    #[serde(default = "host_default")]
    pub host: String,
    #[serde(default = "port_default")]
    pub port: u16,
    #[serde(default = "db_default")]
    pub db: u8,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "max_conn_default")]
    pub max_conn: usize,
    #[serde(default = "connect_timeout_ms_default")]
    pub connect_timeout_ms: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub capacity: u64,
}

impl DbConnectConfig for RedisDbConfig {
    fn password(&self) -> Option<&str> { self.password.as_deref() }

    fn host(&self) -> &str { &self.host }

    fn port(&self) -> u16 { self.port }

    fn db(&self) -> u8 { self.db }

    fn max_conn(&self) -> usize { self.max_conn }

    fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for RedisDbConfig {
    fn default() -> Self {
        Self {
            host: host_default(),
            port: port_default(),
            db: db_default(),
            password: None,
            max_conn: max_conn_default(),
            connect_timeout_ms: connect_timeout_ms_default(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_memory_capacity(),
        }
    }
}

fn host_default() -> String { "127.0.0.1".into() }
fn port_default() -> u16 { 6379 }
fn db_default() -> u8 { 0 }
fn max_conn_default() -> usize { 16 }
fn connect_timeout_ms_default() -> u64 { 2_000 }
fn default_memory_capacity() -> u64 { 10_000 }
