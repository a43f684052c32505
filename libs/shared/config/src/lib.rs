use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// How long a booking transaction may wait for a doctor's gate
    /// before giving up with a transient error.
    pub booking_lock_timeout_ms: u64,
    /// Bounded retries for transient booking failures.
    pub booking_max_retries: u32,
    /// Minimum lead time between "now" and a bookable slot start.
    pub min_booking_lead_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("PORT", 3000),
            booking_lock_timeout_ms: parse_var("BOOKING_LOCK_TIMEOUT_MS", 2000),
            booking_max_retries: parse_var("BOOKING_MAX_RETRIES", 3),
            min_booking_lead_minutes: parse_var("MIN_BOOKING_LEAD_MINUTES", 0),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            booking_lock_timeout_ms: 2000,
            booking_max_retries: 3,
            min_booking_lead_minutes: 0,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
