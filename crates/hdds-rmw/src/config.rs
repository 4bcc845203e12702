// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Environment variable configuration.
//!
//! ## Core
//! - `HDDS_DOMAIN_ID`: domain id (default 0, or `ROS_DOMAIN_ID` if set)
//! - `HDDS_ENCLAVE`: security enclave of created nodes (default `/`,
//!   or `ROS_SECURITY_ENCLAVE` if set)
//! - `HDDS_LOG_LEVEL`: logging level (default `info`)
//! - `HDDS_QOS_PROFILE_PATH`: YAML QoS profile file
//!
//! ## Discovery
//! - `HDDS_DISCOVERY_RANGE`: `off`, `localhost`, `subnet` or `system_default`
//! - `HDDS_LOCALHOST_ONLY`: `1` forces `localhost` (`ROS_LOCALHOST_ONLY` too)
//! - `HDDS_DISCOVERY_PEERS`: comma separated static peers
//! - `HDDS_INITIAL_PEERS`: alias for `HDDS_DISCOVERY_PEERS`
//!
//! ## Wait sets
//! - `HDDS_WAITSET_CAPACITY`: initial slot count of unbounded wait sets
//!
//! # Example
//!
//! ```bash
//! export HDDS_DOMAIN_ID=42
//! export HDDS_DISCOVERY_RANGE=localhost
//! export HDDS_DISCOVERY_PEERS="192.168.1.10,192.168.1.11"
//! export HDDS_LOG_LEVEL=debug
//! ```

use crate::error::{Error, Result};
use crate::rt::DEFAULT_SLOT_CAPACITY;
use std::env;

pub const ENV_DOMAIN_ID: &str = "HDDS_DOMAIN_ID";
pub const ENV_ENCLAVE: &str = "HDDS_ENCLAVE";
pub const ENV_LOG_LEVEL: &str = "HDDS_LOG_LEVEL";
pub const ENV_QOS_PROFILE_PATH: &str = "HDDS_QOS_PROFILE_PATH";
pub const ENV_DISCOVERY_RANGE: &str = "HDDS_DISCOVERY_RANGE";
pub const ENV_LOCALHOST_ONLY: &str = "HDDS_LOCALHOST_ONLY";
pub const ENV_DISCOVERY_PEERS: &str = "HDDS_DISCOVERY_PEERS";
pub const ENV_INITIAL_PEERS: &str = "HDDS_INITIAL_PEERS";
pub const ENV_WAITSET_CAPACITY: &str = "HDDS_WAITSET_CAPACITY";

/// ROS 2 fallbacks.
pub const ENV_ROS_DOMAIN_ID: &str = "ROS_DOMAIN_ID";
pub const ENV_ROS_SECURITY_ENCLAVE: &str = "ROS_SECURITY_ENCLAVE";
pub const ENV_ROS_LOCALHOST_ONLY: &str = "ROS_LOCALHOST_ONLY";

/// Highest domain id that maps onto valid RTPS ports.
pub const MAX_DOMAIN_ID: u32 = 232;

/// How far discovery reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryRange {
    #[default]
    SystemDefault,
    /// Discovery disabled; only static peers.
    Off,
    Localhost,
    Subnet,
}

impl DiscoveryRange {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "system_default" => Some(Self::SystemDefault),
            "off" => Some(Self::Off),
            "localhost" => Some(Self::Localhost),
            "subnet" => Some(Self::Subnet),
            _ => None,
        }
    }
}

/// Runtime configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub domain_id: u32,
    pub enclave: String,
    pub discovery_range: DiscoveryRange,
    pub discovery_peers: Vec<String>,
    /// Initial slot count of unbounded wait sets.
    pub waitset_capacity: usize,
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
    pub qos_profile_path: Option<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            domain_id: 0,
            enclave: "/".to_string(),
            discovery_range: DiscoveryRange::SystemDefault,
            discovery_peers: Vec::new(),
            waitset_capacity: DEFAULT_SLOT_CAPACITY,
            log_level: "info".to_string(),
            qos_profile_path: None,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl EnvConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values count as unset. Priority for the domain id:
    /// `HDDS_DOMAIN_ID`, then `ROS_DOMAIN_ID`, then 0.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some((key, raw)) = get(ENV_DOMAIN_ID)
            .map(|v| (ENV_DOMAIN_ID, v))
            .or_else(|| get(ENV_ROS_DOMAIN_ID).map(|v| (ENV_ROS_DOMAIN_ID, v)))
        {
            let domain_id = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::invalid(format!("{}: not a number: {}", key, raw)))?;
            if domain_id > MAX_DOMAIN_ID {
                return Err(Error::invalid(format!(
                    "{}: {} exceeds maximum domain id {}",
                    key, domain_id, MAX_DOMAIN_ID
                )));
            }
            config.domain_id = domain_id;
        }

        if let Some(enclave) = get(ENV_ENCLAVE).or_else(|| get(ENV_ROS_SECURITY_ENCLAVE)) {
            config.enclave = enclave;
        }

        if let Some(raw) = get(ENV_DISCOVERY_RANGE) {
            config.discovery_range = DiscoveryRange::parse(raw.trim()).ok_or_else(|| {
                Error::invalid(format!("{}: unknown range: {}", ENV_DISCOVERY_RANGE, raw))
            })?;
        }
        let localhost_only = get(ENV_LOCALHOST_ONLY)
            .or_else(|| get(ENV_ROS_LOCALHOST_ONLY))
            .is_some_and(|v| is_truthy(v.trim()));
        if localhost_only {
            config.discovery_range = DiscoveryRange::Localhost;
        }

        config.discovery_peers = get(ENV_DISCOVERY_PEERS)
            .or_else(|| get(ENV_INITIAL_PEERS))
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if let Some(raw) = get(ENV_WAITSET_CAPACITY) {
            config.waitset_capacity = match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(Error::invalid(format!(
                        "{}: expected a positive integer, got {}",
                        ENV_WAITSET_CAPACITY, raw
                    )))
                }
            };
        }

        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.qos_profile_path = get(ENV_QOS_PROFILE_PATH);

        Ok(config)
    }

    /// Check if any custom configuration was provided.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        *self != Self::default()
    }

    #[must_use]
    pub fn has_discovery_peers(&self) -> bool {
        !self.discovery_peers.is_empty()
    }

    /// Export the log level as `RUST_LOG` unless the latter is already set.
    pub fn apply_log_level(&self) {
        if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
            env::set_var("RUST_LOG", &self.log_level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EnvConfig::from_lookup(lookup(&[])).expect("empty env");
        assert_eq!(config, EnvConfig::default());
        assert_eq!(config.enclave, "/");
        assert_eq!(config.waitset_capacity, DEFAULT_SLOT_CAPACITY);
        assert!(!config.is_custom());
    }

    #[test]
    fn test_hdds_domain_id_wins_over_ros() {
        let config = EnvConfig::from_lookup(lookup(&[
            (ENV_DOMAIN_ID, "42"),
            (ENV_ROS_DOMAIN_ID, "99"),
        ]))
        .expect("config");
        assert_eq!(config.domain_id, 42);
    }

    #[test]
    fn test_fallback_to_ros_domain_id() {
        let config =
            EnvConfig::from_lookup(lookup(&[(ENV_ROS_DOMAIN_ID, "77")])).expect("config");
        assert_eq!(config.domain_id, 77);
        assert!(config.is_custom());
    }

    #[test]
    fn test_domain_id_out_of_range() {
        let err = EnvConfig::from_lookup(lookup(&[(ENV_DOMAIN_ID, "233")]));
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
        let err = EnvConfig::from_lookup(lookup(&[(ENV_DOMAIN_ID, "abc")]));
        assert!(matches!(err, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_discovery_settings() {
        let config = EnvConfig::from_lookup(lookup(&[
            (ENV_DISCOVERY_RANGE, "subnet"),
            (ENV_INITIAL_PEERS, " 10.0.0.1, ,10.0.0.2 "),
        ]))
        .expect("config");
        assert_eq!(config.discovery_range, DiscoveryRange::Subnet);
        assert_eq!(config.discovery_peers, vec!["10.0.0.1", "10.0.0.2"]);
        assert!(config.has_discovery_peers());

        let config = EnvConfig::from_lookup(lookup(&[
            (ENV_DISCOVERY_RANGE, "subnet"),
            (ENV_ROS_LOCALHOST_ONLY, "1"),
        ]))
        .expect("config");
        assert_eq!(config.discovery_range, DiscoveryRange::Localhost);

        assert!(EnvConfig::from_lookup(lookup(&[(ENV_DISCOVERY_RANGE, "galaxy")])).is_err());
    }

    #[test]
    fn test_enclave_and_paths() {
        let config = EnvConfig::from_lookup(lookup(&[
            (ENV_ROS_SECURITY_ENCLAVE, "/robot/arm"),
            (ENV_QOS_PROFILE_PATH, "/etc/hdds/qos.yaml"),
            (ENV_LOG_LEVEL, "debug"),
        ]))
        .expect("config");
        assert_eq!(config.enclave, "/robot/arm");
        assert_eq!(config.qos_profile_path.as_deref(), Some("/etc/hdds/qos.yaml"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_waitset_capacity() {
        let config =
            EnvConfig::from_lookup(lookup(&[(ENV_WAITSET_CAPACITY, "64")])).expect("config");
        assert_eq!(config.waitset_capacity, 64);
        assert!(EnvConfig::from_lookup(lookup(&[(ENV_WAITSET_CAPACITY, "0")])).is_err());
    }

    #[test]
    fn test_apply_log_level_keeps_existing_rust_log() {
        let prev = env::var("RUST_LOG").ok();
        env::remove_var("RUST_LOG");

        let debug = EnvConfig {
            log_level: "debug".to_string(),
            ..EnvConfig::default()
        };
        debug.apply_log_level();
        assert_eq!(env::var("RUST_LOG").as_deref(), Ok("debug"));

        let trace = EnvConfig {
            log_level: "trace".to_string(),
            ..EnvConfig::default()
        };
        trace.apply_log_level();
        assert_eq!(env::var("RUST_LOG").as_deref(), Ok("debug"));

        match prev {
            Some(v) => env::set_var("RUST_LOG", v),
            None => env::remove_var("RUST_LOG"),
        }
    }

    #[test]
    fn test_from_env_reads_process_environment() {
        let prev = env::var(ENV_WAITSET_CAPACITY).ok();
        env::set_var(ENV_WAITSET_CAPACITY, "128");

        let config = EnvConfig::from_env().expect("config");
        assert_eq!(config.waitset_capacity, 128);

        if let Some(v) = prev {
            env::set_var(ENV_WAITSET_CAPACITY, v);
        } else {
            env::remove_var(ENV_WAITSET_CAPACITY);
        }
    }
}
