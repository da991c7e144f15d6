use log::LevelFilter;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: String,
    pub database_url: String,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn env() -> Self {
        let addr = std::env::var("GHARELU_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".into());
        let database_url =
            std::env::var("GHARELU_DATABASE_URL").unwrap_or_else(|_| "sqlite:gharelu.db".into());
        let log_level = std::env::var("GHARELU_LOG")
            .ok()
            .and_then(|level| level.parse().ok())
            .unwrap_or(LevelFilter::Info);

        Self {
            addr,
            database_url,
            log_level,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8000".into(),
            database_url: "sqlite::memory:".into(),
            log_level: LevelFilter::Info,
        }
    }
}
