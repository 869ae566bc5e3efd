use crate::{
    config::{self, Config},
    logger,
};

#[must_use]
pub fn test_config() -> Config {
    Config {
        logger: config::Logger {
            enable: false,
            level: logger::LogLevel::Off,
            format: logger::Format::Json,
            override_filter: None,
        },
        server: config::Server {
            binding: "localhost".to_string(),
            port: 5555,
            host: "http://localhost".to_string(),
        },
        editor: config::EditorConfig::default(),
    }
}
