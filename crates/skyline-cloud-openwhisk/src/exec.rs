//! Action `exec` and `limits` blocks
//!
//! The declared form uses empty strings for unset fields and `log_size` for
//! the log limit; the API form uses absent fields and `logs`.

use crate::error::{Result, WhiskError};
use crate::types::{Exec, Limits};
use serde::{Deserialize, Serialize};
use skyline_cloud::QualifiedName;

pub const SEQUENCE_KIND: &str = "sequence";
pub const BLACKBOX_KIND: &str = "blackbox";

/// Declared exec block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub kind: String,
    pub code: String,
    pub image: String,
    pub init: String,
    pub main: String,
    pub components: Vec<String>,
}

/// Declared limits block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Milliseconds
    pub timeout: u64,
    /// Megabytes
    pub memory: u64,
    /// Megabytes
    pub log_size: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            timeout: 60_000,
            memory: 256,
            log_size: 10,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Build the API exec from its declared form
///
/// Sequence components are resolved to fully qualified names, using
/// `default_namespace` where a component names none.
pub fn expand_exec(config: &ExecConfig, default_namespace: &str) -> Result<Exec> {
    if config.kind.is_empty() {
        return Err(WhiskError::InvalidConfig("exec.kind is required".to_string()));
    }
    if !config.image.is_empty() && (!config.code.is_empty() || !config.components.is_empty()) {
        return Err(WhiskError::InvalidConfig(
            "exec.image conflicts with exec.code and exec.components".to_string(),
        ));
    }
    if !config.components.is_empty() && !config.code.is_empty() {
        return Err(WhiskError::InvalidConfig(
            "exec.components conflicts with exec.code".to_string(),
        ));
    }

    let components = match config.kind.as_str() {
        SEQUENCE_KIND => {
            if config.components.is_empty() {
                return Err(WhiskError::InvalidConfig(
                    "a sequence needs at least one component".to_string(),
                ));
            }
            let resolved = config
                .components
                .iter()
                .map(|c| {
                    QualifiedName::parse(c)
                        .map(|qn| qn.with_default_namespace(default_namespace).to_string())
                })
                .collect::<skyline_cloud::Result<Vec<_>>>()?;
            Some(resolved)
        }
        BLACKBOX_KIND if config.image.is_empty() => {
            return Err(WhiskError::InvalidConfig(
                "exec.image is required for blackbox actions".to_string(),
            ));
        }
        _ => None,
    };

    Ok(Exec {
        kind: config.kind.clone(),
        code: non_empty(&config.code),
        image: non_empty(&config.image),
        init: non_empty(&config.init),
        main: non_empty(&config.main),
        components,
        binary: None,
    })
}

pub fn flatten_exec(exec: &Exec) -> ExecConfig {
    ExecConfig {
        kind: exec.kind.clone(),
        code: exec.code.clone().unwrap_or_default(),
        image: exec.image.clone().unwrap_or_default(),
        init: exec.init.clone().unwrap_or_default(),
        main: exec.main.clone().unwrap_or_default(),
        components: exec.components.clone().unwrap_or_default(),
    }
}

pub fn expand_limits(config: &LimitsConfig) -> Limits {
    Limits {
        timeout: config.timeout,
        memory: config.memory,
        logs: config.log_size,
    }
}

pub fn flatten_limits(limits: &Limits) -> LimitsConfig {
    LimitsConfig {
        timeout: limits.timeout,
        memory: limits.memory,
        log_size: limits.logs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nodejs_exec() {
        let config = ExecConfig {
            kind: "nodejs:6".to_string(),
            code: "function main() { return {}; }".to_string(),
            ..Default::default()
        };
        let exec = expand_exec(&config, "_").unwrap();

        assert_eq!(exec.image, None);
        assert_eq!(exec.components, None);
        assert_eq!(flatten_exec(&exec), config);
    }

    #[test]
    fn test_sequence_components_are_qualified() {
        let config = ExecConfig {
            kind: SEQUENCE_KIND.to_string(),
            components: vec![
                "split".to_string(),
                "utils/sort".to_string(),
                "/whisk.system/utils/echo".to_string(),
            ],
            ..Default::default()
        };
        let exec = expand_exec(&config, "org_dev").unwrap();

        assert_eq!(
            exec.components.unwrap(),
            vec![
                "/org_dev/split".to_string(),
                "/utils/sort".to_string(),
                "/whisk.system/utils/echo".to_string(),
            ]
        );
    }

    #[test]
    fn test_exec_conflicts() {
        let image_and_code = ExecConfig {
            kind: BLACKBOX_KIND.to_string(),
            image: "openwhisk/example".to_string(),
            code: "x".to_string(),
            ..Default::default()
        };
        assert!(expand_exec(&image_and_code, "_").is_err());

        let blackbox_without_image = ExecConfig {
            kind: BLACKBOX_KIND.to_string(),
            ..Default::default()
        };
        assert!(expand_exec(&blackbox_without_image, "_").is_err());

        let empty_sequence = ExecConfig {
            kind: SEQUENCE_KIND.to_string(),
            ..Default::default()
        };
        assert!(expand_exec(&empty_sequence, "_").is_err());

        assert!(expand_exec(&ExecConfig::default(), "_").is_err());
    }

    #[test]
    fn test_malformed_component_is_reported() {
        let config = ExecConfig {
            kind: SEQUENCE_KIND.to_string(),
            components: vec!["a/b/c/d".to_string()],
            ..Default::default()
        };
        let err = expand_exec(&config, "_").unwrap_err();
        assert!(err.to_string().contains("a/b/c/d"));
    }

    #[test]
    fn test_limits_defaults_and_renaming() {
        let declared: LimitsConfig = serde_json::from_value(json!({"memory": 512})).unwrap();
        assert_eq!(declared.timeout, 60_000);
        assert_eq!(declared.log_size, 10);

        let limits = expand_limits(&declared);
        assert_eq!(serde_json::to_value(limits).unwrap(), json!({"timeout": 60000, "memory": 512, "logs": 10}));
        assert_eq!(flatten_limits(&limits), declared);
    }
}
