use std::path::PathBuf;

const MONITOR_DB_PATH: &str = "MONITOR_DB_PATH";

pub fn get_db_path() -> Option<PathBuf> {
    std::env::var(MONITOR_DB_PATH).ok().map(PathBuf::from)
}

const MONITOR_WORKLOAD_URL: &str = "MONITOR_WORKLOAD_URL";

pub fn get_workload_url() -> Option<String> {
    std::env::var(MONITOR_WORKLOAD_URL)
        .ok()
        .filter(|url| !url.is_empty())
}

const MONITOR_WORKLOAD_TOKEN: &str = "MONITOR_WORKLOAD_TOKEN";

pub fn get_workload_token() -> Option<String> {
    let token_from_env = std::env::var(MONITOR_WORKLOAD_TOKEN);
    token_from_env.ok()
}
