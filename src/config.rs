use crate::epoch::{ResetSchedule, DEFAULT_RESET_HOUR};
use chrono::FixedOffset;
use std::{collections::HashSet, env, path::PathBuf};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_PATH: &str = "data/bonus_points.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub schedule: ResetSchedule,
    /// Initial event flag, applied only when the ledger has never stored one.
    pub event_default: bool,
    pub admin_ids: HashSet<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = parse_or("PORT", lookup("PORT"), DEFAULT_PORT)?;
        let db_path = lookup("BONUS_DB_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let reset_hour: u32 = parse_or("RESET_HOUR", lookup("RESET_HOUR"), DEFAULT_RESET_HOUR)?;
        let offset_raw = lookup("RESET_UTC_OFFSET_MINUTES");
        let offset_minutes: i32 = parse_or("RESET_UTC_OFFSET_MINUTES", offset_raw.clone(), 0)?;
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| invalid("RESET_UTC_OFFSET_MINUTES", offset_raw.unwrap_or_default()))?;
        let schedule = ResetSchedule::new(reset_hour, offset)
            .ok_or_else(|| invalid("RESET_HOUR", reset_hour.to_string()))?;

        let event_default = match lookup("DOUBLE_BP_EVENT") {
            None => false,
            Some(value) => parse_flag(&value).ok_or_else(|| invalid("DOUBLE_BP_EVENT", value))?,
        };

        let admin_ids = lookup("ADMIN_USER_IDS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            port,
            db_path,
            schedule,
            event_default,
            admin_ids,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| invalid(name, raw)),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" | "" => Some(false),
        _ => None,
    }
}

fn invalid(name: &'static str, value: String) -> ConfigError {
    ConfigError::Invalid { name, value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.schedule, ResetSchedule::default());
        assert!(!config.event_default);
        assert!(config.admin_ids.is_empty());
    }

    #[test]
    fn reads_all_variables() {
        let config = config(&[
            ("PORT", "9001"),
            ("BONUS_DB_PATH", "/tmp/bp.db"),
            ("RESET_HOUR", "7"),
            ("RESET_UTC_OFFSET_MINUTES", "180"),
            ("DOUBLE_BP_EVENT", "True"),
            ("ADMIN_USER_IDS", " 42, 77 ,,"),
        ])
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.db_path, PathBuf::from("/tmp/bp.db"));
        assert_eq!(config.schedule.hour(), 7);
        assert_eq!(config.schedule.offset().local_minus_utc(), 3 * 3600);
        assert!(config.event_default);
        let mut admins: Vec<_> = config.admin_ids.iter().map(String::as_str).collect();
        admins.sort_unstable();
        assert_eq!(admins, ["42", "77"]);
    }

    #[test]
    fn rejects_bad_values() {
        for vars in [
            [("PORT", "http")],
            [("RESET_HOUR", "24")],
            [("RESET_UTC_OFFSET_MINUTES", "100000")],
            [("DOUBLE_BP_EVENT", "maybe")],
        ] {
            let err = config(&vars).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { name, .. } if name == vars[0].0));
        }
    }
}
