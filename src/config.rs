use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        mongo_uri: env::var("MONGO_URI").ok(),
        mongo_db_name: get_env_or_default("MONGO_DB_NAME", "datacat"),
        datafold_url: env::var("DATAFOLD_URL").ok(),
        datafold_api_key: env::var("DATAFOLD_API_KEY").ok(),
        datafold_data_source_id: get_parsed_or_default("DATAFOLD_DATA_SOURCE_ID", 3),
        datafold_retries: get_parsed_or_default("DATAFOLD_RETRIES", 3),
        datafold_insecure: get_parsed_or_default("DATAFOLD_INSECURE", false),
    }
});

pub struct Config {
    pub mongo_uri: Option<String>,
    pub mongo_db_name: String,
    pub datafold_url: Option<String>,
    pub datafold_api_key: Option<String>,
    pub datafold_data_source_id: i64,
    pub datafold_retries: u32,
    pub datafold_insecure: bool,
}

impl Config {
    /// Panics if MONGO_URI is unset; only the database layer needs it.
    pub fn mongo_uri(&self) -> &str {
        self.mongo_uri
            .as_deref()
            .unwrap_or_else(|| panic!("Missing required environment variable: MONGO_URI"))
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_parsed_or_default<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring unparsable {key}={raw}");
            default
        }),
        Err(_) => default,
    }
}
