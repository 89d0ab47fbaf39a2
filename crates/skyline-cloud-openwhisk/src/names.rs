//! Mapping between declared names, resource ids and request paths

use crate::error::{Result, WhiskError};
use skyline_cloud::{CloudError, QualifiedName, ResourceConfig};

/// Entity addressed by one REST call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityName {
    pub namespace: String,
    /// `entity` or `package/entity`
    pub path: String,
}

impl EntityName {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    /// Bind a parsed name to a namespace
    pub fn from_qualified(name: &QualifiedName, default_namespace: &str) -> Self {
        Self::new(name.namespace_or(default_namespace), name.entity_path())
    }

    /// Resolve a resource id
    ///
    /// Ids starting with `/` are fully qualified; anything else is a
    /// `[package/]entity` path in the default namespace.
    pub fn from_id(id: &str, default_namespace: &str) -> skyline_cloud::Result<Self> {
        if id.starts_with('/') {
            let name = QualifiedName::parse(id)?;
            return Ok(Self::from_qualified(&name, default_namespace));
        }

        let segments: Vec<&str> = id.split('/').collect();
        if id.is_empty() || segments.len() > 2 || segments.iter().any(|s| s.is_empty()) {
            return Err(CloudError::malformed(id, "expected [package/]entity"));
        }
        Ok(Self::new(default_namespace, id))
    }

    /// Resource id: the bare path inside the default namespace, the
    /// qualified name elsewhere
    pub fn id(&self, default_namespace: &str) -> String {
        if self.namespace == default_namespace {
            self.path.clone()
        } else {
            self.qualified()
        }
    }

    /// `/namespace/path`
    pub fn qualified(&self) -> String {
        format!("/{}/{}", self.namespace, self.path)
    }

    /// Last path segment
    pub fn entity(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(self.path.as_str())
    }
}

/// Declared `name`, with an optional separate `package` field
pub fn declared_name(config: &ResourceConfig) -> skyline_cloud::Result<QualifiedName> {
    let raw: String = config.require("name")?;
    let name = QualifiedName::parse(&raw)?;
    let package = config.get_str("package");
    if package.is_empty() || !name.package().is_empty() {
        return Ok(name);
    }
    Ok(QualifiedName::new(name.namespace(), package, name.entity()))
}

/// Declared name of an entity that cannot live in a package
pub fn declared_top_level_name(config: &ResourceConfig, kind: &str) -> Result<QualifiedName> {
    let name = declared_name(config)?;
    if !name.package().is_empty() {
        return Err(WhiskError::InvalidConfig(format!(
            "{} names cannot include a package: {}",
            kind, name
        )));
    }
    Ok(name)
}

/// Canonical form of a qualified reference, binding a missing namespace
pub fn canonical(raw: &str, default_namespace: &str) -> skyline_cloud::Result<String> {
    Ok(QualifiedName::parse(raw)?
        .with_default_namespace(default_namespace)
        .to_string())
}
