//! Namespace-qualified entity names
//!
//! Serverless entities are addressed as `[/][namespace/][package/]entity`.
//! Parsing normalizes the leading slash away, so `/ns/pkg/act` and
//! `ns/pkg/act` resolve to the same name.

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace used by the platform when none is given
pub const DEFAULT_NAMESPACE: &str = "_";

/// Parsed entity name
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    namespace: String,
    package: String,
    entity: String,
}

impl QualifiedName {
    /// Parse a raw identifier
    pub fn parse(raw: &str) -> Result<Self> {
        let body = raw.strip_prefix('/').unwrap_or(raw);
        if body.is_empty() {
            return Err(CloudError::malformed(raw, "entity name is empty"));
        }

        let segments: Vec<&str> = body.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(CloudError::malformed(raw, "empty name segment"));
        }

        match segments.as_slice() {
            [entity] => Ok(Self::new("", "", *entity)),
            [namespace, entity] => Ok(Self::new(*namespace, "", *entity)),
            [namespace, package, entity] => Ok(Self::new(*namespace, *package, *entity)),
            _ => Err(CloudError::malformed(
                raw,
                format!("expected at most 3 segments, found {}", segments.len()),
            )),
        }
    }

    /// Build a name from its parts
    ///
    /// A package without a namespace is bound to [`DEFAULT_NAMESPACE`], since
    /// `package/entity` alone would read back as `namespace/entity`.
    pub fn new(
        namespace: impl Into<String>,
        package: impl Into<String>,
        entity: impl Into<String>,
    ) -> Self {
        let mut namespace = namespace.into();
        let package = package.into();
        if namespace.is_empty() && !package.is_empty() {
            namespace = DEFAULT_NAMESPACE.to_string();
        }
        Self {
            namespace,
            package,
            entity: entity.into(),
        }
    }

    /// Namespace, empty when the identifier did not name one
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// `package/entity`, or just `entity` outside a package
    pub fn entity_path(&self) -> String {
        if self.package.is_empty() {
            self.entity.clone()
        } else {
            format!("{}/{}", self.package, self.entity)
        }
    }

    /// Namespace to address, falling back to `default` when none was given
    /// or when the name uses the `_` placeholder
    pub fn namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.namespace.is_empty() || self.namespace == DEFAULT_NAMESPACE {
            default
        } else {
            &self.namespace
        }
    }

    /// Copy of this name bound to `namespace` when it has none
    pub fn with_default_namespace(&self, namespace: &str) -> Self {
        Self {
            namespace: self.namespace_or(namespace).to_string(),
            package: self.package.clone(),
            entity: self.entity.clone(),
        }
    }

    /// Canonical string form accepted back by [`QualifiedName::parse`]
    pub fn format(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            return write!(f, "{}", self.entity);
        }
        if self.package.is_empty() {
            write!(f, "/{}/{}", self.namespace, self.entity)
        } else {
            write!(f, "/{}/{}/{}", self.namespace, self.package, self.entity)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepted_forms() {
        let cases = [
            ("action", ("", "", "action")),
            ("ns/action", ("ns", "", "action")),
            ("/ns/action", ("ns", "", "action")),
            ("ns/pkg/action", ("ns", "pkg", "action")),
            ("/ns/pkg/action", ("ns", "pkg", "action")),
            ("/action", ("", "", "action")),
        ];

        for (raw, (ns, pkg, entity)) in cases {
            let name = QualifiedName::parse(raw).unwrap();
            assert_eq!(name.namespace(), ns, "namespace of {raw}");
            assert_eq!(name.package(), pkg, "package of {raw}");
            assert_eq!(name.entity(), entity, "entity of {raw}");
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for raw in ["", "/", "a/", "ns/", "/ns/pkg/", "a//b", "a/b/c/d", "/a/b/c/d"] {
            let err = QualifiedName::parse(raw).unwrap_err();
            match err {
                CloudError::MalformedIdentifier { raw: got, .. } => assert_eq!(got, raw),
                other => panic!("unexpected error for {raw:?}: {other}"),
            }
        }
    }

    #[test]
    fn test_format_round_trip() {
        for raw in [
            "action",
            "/action",
            "ns/action",
            "/ns/action",
            "ns/pkg/action",
            "/whisk.system/cloudant/delete-attachment",
        ] {
            let parsed = QualifiedName::parse(raw).unwrap();
            let reparsed = QualifiedName::parse(&parsed.format()).unwrap();
            assert_eq!(parsed, reparsed, "round trip of {raw}");
        }
    }

    #[test]
    fn test_canonical_form_has_leading_slash() {
        let name: QualifiedName = "ns/pkg/action".parse().unwrap();
        assert_eq!(name.to_string(), "/ns/pkg/action");
        assert_eq!(name.entity_path(), "pkg/action");
        assert_eq!(QualifiedName::parse("action").unwrap().to_string(), "action");
    }

    #[test]
    fn test_default_namespace() {
        let name = QualifiedName::parse("hello").unwrap();
        assert_eq!(name.namespace_or(DEFAULT_NAMESPACE), "_");

        let bound = name.with_default_namespace("team-a");
        assert_eq!(bound.to_string(), "/team-a/hello");

        let explicit = QualifiedName::parse("/other/hello").unwrap();
        assert_eq!(explicit.with_default_namespace("team-a").namespace(), "other");

        let placeholder = QualifiedName::parse("/_/utils/hello").unwrap();
        assert_eq!(placeholder.namespace_or("team-a"), "team-a");
        assert_eq!(
            placeholder.with_default_namespace("team-a").to_string(),
            "/team-a/utils/hello"
        );
    }

    #[test]
    fn test_package_without_namespace_keeps_package() {
        let name = QualifiedName::new("", "utils", "hello");
        assert_eq!(name.namespace(), DEFAULT_NAMESPACE);
        assert_eq!(name.format(), "/_/utils/hello");
        assert_eq!(QualifiedName::parse(&name.format()).unwrap(), name);

        let bare = QualifiedName::new("", "", "hello");
        assert_eq!(bare.namespace(), "");
        assert_eq!(QualifiedName::parse(&bare.format()).unwrap(), bare);
    }
}
