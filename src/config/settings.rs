use serde::Deserialize;

/// Top-level configuration settings for the relay.
///
/// Includes settings for both the listening server and the broker itself.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub broker: BrokerSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the broker will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the broker.
///
/// Capacity bounds are enforced at the registry boundary; the read buffer
/// size also caps the longest unterminated record a stream client may send.
#[derive(Debug, Deserialize, Clone)]
pub struct BrokerSettings {
    pub max_connections: usize,
    pub max_topics: usize,
    pub max_subscribers_per_topic: usize,
    pub max_topic_len: usize,
    pub read_buffer_bytes: usize,
    pub idle_timeout_secs: u64,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub broker: Option<PartialBrokerSettings>,
}

/// Partial server settings.
///
/// Used when loading server configuration from external sources with optional values.
#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Partial broker settings.
///
/// Used for broker configuration from external sources with optional values.
#[derive(Debug, Deserialize)]
pub struct PartialBrokerSettings {
    pub max_connections: Option<usize>,
    pub max_topics: Option<usize>,
    pub max_subscribers_per_topic: Option<usize>,
    pub max_topic_len: Option<usize>,
    pub read_buffer_bytes: Option<usize>,
    pub idle_timeout_secs: Option<u64>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            broker: BrokerSettings {
                max_connections: 50,
                max_topics: 50,
                max_subscribers_per_topic: 50,
                max_topic_len: 64,
                read_buffer_bytes: 1024,
                idle_timeout_secs: 300,
            },
        }
    }
}
