//! Default values for configuration options, kept in one place so they can
//! be tuned without hunting through the `Config` struct definitions.

pub fn default_chunk_size() -> usize {
    8192
}

pub fn default_commit_interval() -> usize {
    10_000
}

pub fn default_max_attempts() -> u32 {
    50
}

pub fn default_max_redirects() -> u32 {
    5
}

pub fn default_backoff_factor_secs() -> f64 {
    1.0
}

pub fn default_database_url() -> String {
    "postgres://localhost/off_catalog".to_string()
}

pub fn default_max_connections() -> u32 {
    10
}

pub fn default_log_level() -> String {
    "info".to_string()
}
