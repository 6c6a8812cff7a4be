use std::env;

use chrono::Duration;
use log::*;

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;
const DEFAULT_STALE_ORDER_HOURS: i64 = 48;
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 25;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 50;

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// Seconds between reconciliation passes.
    pub check_interval_secs: u64,
    /// Hours a remote order may stay pending before it is flagged for manual review.
    pub stale_order_hours: i64,
    pub max_db_connections: u32,
    pub event_buffer_size: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: DEFAULT_CHECK_INTERVAL_SECS,
            stale_order_hours: DEFAULT_STALE_ORDER_HOURS,
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl BotConfig {
    pub fn from_env_or_default() -> Self {
        let check_interval_secs = parse_var("SFB_CHECK_INTERVAL_SECS", DEFAULT_CHECK_INTERVAL_SECS);
        let stale_order_hours = parse_var("SFB_STALE_ORDER_HOURS", DEFAULT_STALE_ORDER_HOURS);
        let max_db_connections = parse_var("SFB_MAX_DB_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS);
        let event_buffer_size = parse_var("SFB_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        Self { check_interval_secs, stale_order_hours, max_db_connections, event_buffer_size }
    }

    pub fn stale_after(&self) -> Duration {
        Duration::hours(self.stale_order_hours)
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}
