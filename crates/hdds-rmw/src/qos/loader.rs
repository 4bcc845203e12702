// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML QoS profile loader.
//!
//! # Example YAML
//!
//! ```yaml
//! default_profile: telemetry
//! profiles:
//!   telemetry:
//!     reliability: best_effort
//!     history:
//!       kind: keep_last
//!       depth: 5
//!   latched:
//!     preset: default
//!     durability: transient_local
//!     deadline:
//!       period_ms: 100
//!     liveliness:
//!       kind: automatic
//!       lease_duration_ms: 2000
//! ```
//!
//! Value strings use the names from [`super::names`]; matching is case
//! insensitive. `infinite` and `best_available` are accepted wherever a
//! duration block is, including the liveliness `lease` block:
//!
//! ```yaml
//! liveliness:
//!   kind: best_available
//!   lease:
//!     special: best_available
//! ```

use super::names;
use super::{QosDuration, QosProfile};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// YAML QoS profile loader.
pub struct YamlLoader;

/// Root YAML document structure.
#[derive(Debug, Deserialize)]
pub struct YamlQosDocument {
    /// Named QoS profiles.
    #[serde(default)]
    pub profiles: HashMap<String, YamlQosProfile>,

    /// Default profile name (optional).
    #[serde(default)]
    pub default_profile: Option<String>,
}

/// A single QoS profile in YAML format.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct YamlQosProfile {
    /// Base preset (`default`, `sensor_data`, `parameters`, ...).
    pub preset: Option<String>,
    pub reliability: Option<String>,
    pub durability: Option<String>,
    pub history: Option<YamlHistory>,
    pub deadline: Option<YamlDuration>,
    pub lifespan: Option<YamlDuration>,
    pub liveliness: Option<YamlLiveliness>,
    pub avoid_ros_namespace_conventions: Option<bool>,
}

/// History QoS in YAML.
#[derive(Debug, Deserialize)]
pub struct YamlHistory {
    /// keep_last, keep_all or system_default
    pub kind: String,
    #[serde(default)]
    pub depth: Option<usize>,
}

/// Duration block: one of the fields, or a sentinel keyword.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct YamlDuration {
    pub period_ms: Option<u64>,
    pub period_secs: Option<u64>,
    /// `infinite`, `best_available` or `system_default`
    pub special: Option<String>,
}

/// Liveliness QoS in YAML.
#[derive(Debug, Deserialize)]
pub struct YamlLiveliness {
    pub kind: String,
    /// Full duration block; wins over the shorthand fields below.
    #[serde(default)]
    pub lease: Option<YamlDuration>,
    #[serde(default)]
    pub lease_duration_ms: Option<u64>,
    #[serde(default)]
    pub lease_duration_secs: Option<u64>,
}

impl YamlLoader {
    /// Load QoS profiles from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<YamlQosDocument> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Error(format!("failed to read QoS file {}: {}", path.display(), e))
        })?;
        log::debug!("[rmw-qos] loading profiles from {}", path.display());
        Self::parse_yaml(&content)
    }

    /// Parse YAML content.
    pub fn parse_yaml(content: &str) -> Result<YamlQosDocument> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::invalid(format!("failed to parse QoS YAML: {}", e)))
    }

    /// Get QoS by profile name.
    pub fn get_profile(doc: &YamlQosDocument, name: &str) -> Result<QosProfile> {
        let profile = doc
            .profiles
            .get(name)
            .ok_or_else(|| Error::invalid(format!("profile '{}' not found", name)))?;
        Self::profile_to_qos(profile)
    }

    /// Named default, else the only profile, else the built-in default.
    pub fn get_default_profile(doc: &YamlQosDocument) -> Result<QosProfile> {
        if let Some(ref name) = doc.default_profile {
            return Self::get_profile(doc, name);
        }
        match doc.profiles.len() {
            0 => Ok(QosProfile::default()),
            1 => match doc.profiles.values().next() {
                Some(profile) => Self::profile_to_qos(profile),
                None => Ok(QosProfile::default()),
            },
            _ => Err(Error::invalid(
                "several profiles and no default_profile set",
            )),
        }
    }

    /// Convert a YAML profile and validate the result.
    pub fn profile_to_qos(profile: &YamlQosProfile) -> Result<QosProfile> {
        let mut qos = match profile.preset.as_deref() {
            Some(name) => preset(name)?,
            None => QosProfile::default(),
        };

        if let Some(ref value) = profile.reliability {
            qos.reliability = names::reliability_from_str(&value.to_lowercase())
                .ok_or_else(|| Error::invalid(format!("invalid reliability: {}", value)))?;
        }

        if let Some(ref value) = profile.durability {
            qos.durability = names::durability_from_str(&value.to_lowercase())
                .ok_or_else(|| Error::invalid(format!("invalid durability: {}", value)))?;
        }

        if let Some(ref hist) = profile.history {
            qos.history = names::history_from_str(&hist.kind.to_lowercase())
                .ok_or_else(|| Error::invalid(format!("invalid history kind: {}", hist.kind)))?;
            if let Some(depth) = hist.depth {
                qos.depth = depth;
            }
        }

        if let Some(ref deadline) = profile.deadline {
            qos.deadline = duration(deadline)?;
        }

        if let Some(ref lifespan) = profile.lifespan {
            qos.lifespan = duration(lifespan)?;
        }

        if let Some(ref liv) = profile.liveliness {
            qos.liveliness = names::liveliness_from_str(&liv.kind.to_lowercase())
                .ok_or_else(|| Error::invalid(format!("invalid liveliness kind: {}", liv.kind)))?;
            if let Some(ref lease) = liv.lease {
                qos.liveliness_lease = duration(lease)?;
            } else if let Some(ms) = liv.lease_duration_ms {
                qos.liveliness_lease = QosDuration::from_millis(ms);
            } else if let Some(secs) = liv.lease_duration_secs {
                qos.liveliness_lease = QosDuration::from_duration(Duration::from_secs(secs));
            }
        }

        if let Some(avoid) = profile.avoid_ros_namespace_conventions {
            qos.avoid_ros_namespace_conventions = avoid;
        }

        qos.validate()?;
        Ok(qos)
    }
}

fn preset(name: &str) -> Result<QosProfile> {
    Ok(match name.to_lowercase().as_str() {
        "default" => QosProfile::default_profile(),
        "sensor_data" => QosProfile::sensor_data(),
        "parameters" => QosProfile::parameters(),
        "services_default" => QosProfile::services_default(),
        "parameter_events" => QosProfile::parameter_events(),
        "system_default" => QosProfile::system_default(),
        "best_available" => QosProfile::best_available(),
        other => return Err(Error::invalid(format!("unknown preset: {}", other))),
    })
}

fn duration(block: &YamlDuration) -> Result<QosDuration> {
    if let Some(ref special) = block.special {
        return match special.to_lowercase().as_str() {
            "infinite" => Ok(QosDuration::Infinite),
            "best_available" => Ok(QosDuration::BestAvailable),
            "system_default" => Ok(QosDuration::Unspecified),
            other => Err(Error::invalid(format!("invalid duration keyword: {}", other))),
        };
    }
    if let Some(ms) = block.period_ms {
        Ok(QosDuration::from_millis(ms))
    } else if let Some(secs) = block.period_secs {
        Ok(QosDuration::from_duration(Duration::from_secs(secs)))
    } else {
        Ok(QosDuration::Unspecified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qos::{Durability, History, Liveliness, Reliability};
    use std::io::Write;

    const DOC: &str = r#"
default_profile: telemetry
profiles:
  telemetry:
    reliability: BEST_EFFORT
    history:
      kind: keep_last
      depth: 5
  latched:
    preset: default
    durability: transient_local
    deadline:
      period_ms: 100
    liveliness:
      kind: automatic
      lease_duration_secs: 2
  negotiated:
    preset: best_available
  heartbeat:
    liveliness:
      kind: manual_by_topic
      lease:
        special: best_available
"#;

    #[test]
    fn parses_named_profiles() {
        let doc = YamlLoader::parse_yaml(DOC).expect("valid yaml");
        assert_eq!(doc.profiles.len(), 4);

        let latched = YamlLoader::get_profile(&doc, "latched").expect("latched profile");
        assert_eq!(latched.durability, Durability::TransientLocal);
        assert_eq!(latched.reliability, Reliability::Reliable);
        assert_eq!(latched.deadline, QosDuration::from_millis(100));
        assert_eq!(latched.liveliness, Liveliness::Automatic);
        assert_eq!(latched.liveliness_lease, QosDuration::from_millis(2000));

        let negotiated = YamlLoader::get_profile(&doc, "negotiated").expect("negotiated");
        assert!(negotiated.has_best_available());
    }

    #[test]
    fn lease_block_accepts_keywords() {
        let doc = YamlLoader::parse_yaml(DOC).expect("valid yaml");
        let heartbeat = YamlLoader::get_profile(&doc, "heartbeat").expect("heartbeat");
        assert_eq!(heartbeat.liveliness, Liveliness::ManualByTopic);
        assert_eq!(heartbeat.liveliness_lease, QosDuration::BestAvailable);

        let doc = YamlLoader::parse_yaml(
            "profiles:\n  p:\n    liveliness:\n      kind: automatic\n      lease:\n        special: infinite\n      lease_duration_ms: 10\n",
        )
        .expect("valid yaml");
        let qos = YamlLoader::get_profile(&doc, "p").expect("profile");
        assert_eq!(qos.liveliness_lease, QosDuration::Infinite);
    }

    #[test]
    fn default_profile_is_honored() {
        let doc = YamlLoader::parse_yaml(DOC).expect("valid yaml");
        let qos = YamlLoader::get_default_profile(&doc).expect("default profile");
        assert_eq!(qos.reliability, Reliability::BestEffort);
        assert_eq!(qos.history, History::KeepLast);
        assert_eq!(qos.depth, 5);
    }

    #[test]
    fn rejects_bad_values() {
        let doc = YamlLoader::parse_yaml(
            "profiles:\n  bad:\n    reliability: sometimes\n",
        )
        .expect("valid yaml");
        assert!(matches!(
            YamlLoader::get_profile(&doc, "bad"),
            Err(Error::InvalidArgument(_))
        ));
        assert!(YamlLoader::get_profile(&doc, "missing").is_err());
    }

    #[test]
    fn rejects_zero_depth_keep_last() {
        let doc = YamlLoader::parse_yaml(
            "profiles:\n  p:\n    history:\n      kind: keep_last\n      depth: 0\n",
        )
        .expect("valid yaml");
        assert!(YamlLoader::get_profile(&doc, "p").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(DOC.as_bytes()).expect("write yaml");

        let doc = YamlLoader::load_from_file(file.path()).expect("load file");
        assert_eq!(doc.default_profile.as_deref(), Some("telemetry"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = YamlLoader::load_from_file(dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(Error::Error(_))));
    }
}
