use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_file: String,
    pub host: String,
    pub port: u16,
    pub create_if_missing: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            db_file: env::var("BLOG_DB_FILE").unwrap_or_else(|_| "blog_posts.json".to_string()),
            host: env::var("BLOG_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BLOG_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5000),
            create_if_missing: env::var("BLOG_DB_CREATE_IF_MISSING")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
