//! Package handler and data source

use crate::action::{key_value_changed, key_value_field};
use crate::client::{Collection, WhiskApi, fetch, probe, store};
use crate::error::{Result, WhiskError};
use crate::names::{EntityName, declared_top_level_name};
use crate::types::{BINDING_ANNOTATION, Binding, Package, user_defined};
use async_trait::async_trait;
use serde_json::{Value, json};
use skyline_cloud::keyvalue::{self, KeyValueList};
use skyline_cloud::{
    DataSource, QualifiedName, ResourceConfig, ResourceHandler, ResourceState, ResourceStatus,
};
use std::sync::Arc;

pub const PACKAGE_RESOURCE: &str = "ibm_openwhisk_package";

/// Package a binding refers to
///
/// Packages do not nest, so the reference is `[/namespace/]package`.
pub fn binding_for(raw: &str, default_namespace: &str) -> Result<Binding> {
    let name = QualifiedName::parse(raw)?;
    if !name.package().is_empty() {
        return Err(WhiskError::InvalidConfig(format!(
            "bind_package_name must name a package, not an entity inside one: {}",
            raw
        )));
    }
    Ok(Binding {
        namespace: name.namespace_or(default_namespace).to_string(),
        name: name.entity().to_string(),
    })
}

/// `ibm_openwhisk_package` lifecycle
pub struct PackageHandler {
    api: Arc<dyn WhiskApi>,
}

impl PackageHandler {
    pub fn new(api: Arc<dyn WhiskApi>) -> Self {
        Self { api }
    }

    fn build_package(
        &self,
        config: &ResourceConfig,
        target: &EntityName,
        binding: Option<Binding>,
    ) -> Result<Package> {
        let annotations = key_value_field(config, "user_defined_annotations");
        let parameters = key_value_field(config, "user_defined_parameters");
        keyvalue::validate(&annotations)?;
        keyvalue::validate(&parameters)?;

        Ok(Package {
            name: target.entity().to_string(),
            publish: Some(config.get_config("publish").unwrap_or(false)),
            annotations: KeyValueList::parse(&annotations)?,
            parameters: KeyValueList::parse(&parameters)?,
            binding,
            ..Default::default()
        })
    }

    pub async fn read_package(&self, id: &str) -> Result<ResourceState> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let package: Package =
            fetch(self.api.as_ref(), Collection::Packages, &target.namespace, &target.path)
                .await?;
        package_state(id, &package)
    }
}

fn package_state(id: &str, package: &Package) -> Result<ResourceState> {
    let annotations = user_defined(&package.annotations, BINDING_ANNOTATION);

    Ok(ResourceState::new(id, PACKAGE_RESOURCE)
        .with_status(ResourceStatus::Active)
        .with_attribute("name", json!(package.name))
        .with_attribute("namespace", json!(package.namespace))
        .with_attribute("publish", json!(package.publish.unwrap_or(false)))
        .with_attribute("version", json!(package.version))
        .with_attribute("user_defined_annotations", json!(annotations.to_json()?))
        .with_attribute("user_defined_parameters", json!(package.parameters.to_json()?))
        .with_attribute("annotations", json!(package.annotations.to_json()?))
        .with_attribute("parameters", json!(package.parameters.to_json()?))
        .with_attribute(
            "bind_package_name",
            json!(package.bound_to().unwrap_or_default()),
        ))
}

#[async_trait]
impl ResourceHandler for PackageHandler {
    fn resource_type(&self) -> &str {
        PACKAGE_RESOURCE
    }

    async fn create(&self, desired: &ResourceConfig) -> skyline_cloud::Result<ResourceState> {
        let name = declared_top_level_name(desired, "package")?;
        let default_namespace = self.api.default_namespace();
        let target = EntityName::from_qualified(&name, default_namespace);

        let bind = desired.get_str("bind_package_name");
        let binding = if bind.is_empty() {
            None
        } else {
            Some(binding_for(&bind, default_namespace)?)
        };
        let package = self.build_package(desired, &target, binding)?;

        tracing::info!(
            package = %target.qualified(),
            bound_to = ?package.bound_to(),
            "Creating package"
        );
        store(
            self.api.as_ref(),
            Collection::Packages,
            &target.namespace,
            &target.path,
            &package,
            false,
        )
        .await?;

        Ok(self.read_package(&target.id(default_namespace)).await?)
    }

    async fn read(&self, id: &str) -> skyline_cloud::Result<ResourceState> {
        Ok(self.read_package(id).await?)
    }

    async fn update(
        &self,
        id: &str,
        prior: &ResourceConfig,
        desired: &ResourceConfig,
    ) -> skyline_cloud::Result<ResourceState> {
        if desired.has_change(prior, "bind_package_name") {
            return Err(WhiskError::InvalidConfig(
                "the binding of an existing package cannot be changed".to_string(),
            )
            .into());
        }

        let changed = desired.has_change(prior, "publish")
            || key_value_changed(prior, desired, "user_defined_annotations")
            || key_value_changed(prior, desired, "user_defined_parameters");

        if changed {
            let target = EntityName::from_id(id, self.api.default_namespace())?;
            let current: Package = fetch(
                self.api.as_ref(),
                Collection::Packages,
                &target.namespace,
                &target.path,
            )
            .await?;
            let binding = current.binding.filter(|b| !b.is_empty());
            let package = self.build_package(desired, &target, binding)?;

            tracing::info!(package = %target.qualified(), "Updating package");
            store(
                self.api.as_ref(),
                Collection::Packages,
                &target.namespace,
                &target.path,
                &package,
                true,
            )
            .await?;
        }

        Ok(self.read_package(id).await?)
    }

    async fn delete(&self, id: &str) -> skyline_cloud::Result<()> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        self.api
            .delete(Collection::Packages, &target.namespace, &target.path)
            .await?;
        tracing::info!(package = %target.qualified(), "Deleted package");
        Ok(())
    }

    async fn exists(&self, id: &str) -> skyline_cloud::Result<bool> {
        let target = EntityName::from_id(id, self.api.default_namespace())?;
        let found = probe(self.api.as_ref(), Collection::Packages, &target.namespace, &target.path)
            .await?;
        Ok(found
            .as_ref()
            .and_then(|v| v.get("name"))
            .and_then(Value::as_str)
            .is_some_and(|name| name == target.entity()))
    }
}

/// Lookup of an existing package by qualified name
pub struct PackageDataSource {
    api: Arc<dyn WhiskApi>,
}

impl PackageDataSource {
    pub fn new(api: Arc<dyn WhiskApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DataSource for PackageDataSource {
    fn resource_type(&self) -> &str {
        PACKAGE_RESOURCE
    }

    async fn read(&self, query: &ResourceConfig) -> skyline_cloud::Result<ResourceState> {
        let name = declared_top_level_name(query, "package")?;
        let default_namespace = self.api.default_namespace();
        let target = EntityName::from_qualified(&name, default_namespace);

        tracing::debug!(package = %target.qualified(), "Looking up package");
        let package: Package =
            fetch(self.api.as_ref(), Collection::Packages, &target.namespace, &target.path)
                .await?;
        Ok(package_state(&target.id(default_namespace), &package)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeWhisk;
    use skyline_cloud::CloudError;

    const NS: &str = "org_dev";

    fn handler() -> (PackageHandler, Arc<FakeWhisk>) {
        let fake = Arc::new(FakeWhisk::new(NS));
        (PackageHandler::new(fake.clone()), fake)
    }

    fn package(config: Value) -> ResourceConfig {
        ResourceConfig::new(PACKAGE_RESOURCE, "package", config)
    }

    #[test]
    fn test_binding_for() {
        let binding = binding_for("/whisk.system/cloudant", NS).unwrap();
        assert_eq!(binding.namespace, "whisk.system");
        assert_eq!(binding.name, "cloudant");

        let local = binding_for("utils", NS).unwrap();
        assert_eq!(local.namespace, NS);

        assert!(binding_for("/whisk.system/cloudant/read", NS).is_err());
    }

    #[tokio::test]
    async fn test_create_plain_package() {
        let (handler, _fake) = handler();
        let state = handler
            .create(&package(json!({"name": "utils"})))
            .await
            .unwrap();

        assert_eq!(state.id, "utils");
        assert_eq!(state.get_attribute::<String>("version").as_deref(), Some("0.0.1"));
        assert_eq!(state.get_attribute::<bool>("publish"), Some(false));
        assert_eq!(state.get_attribute::<String>("parameters").as_deref(), Some("[]"));
        assert_eq!(state.get_attribute::<String>("bind_package_name").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_create_binding() {
        let (handler, fake) = handler();
        let state = handler
            .create(&package(json!({
                "name": "mycloudant",
                "bind_package_name": "/whisk.system/cloudant",
                "user_defined_parameters": r#"[{"key":"dbname","value":"orders"}]"#
            })))
            .await
            .unwrap();

        assert_eq!(
            state.get_attribute::<String>("bind_package_name").as_deref(),
            Some("/whisk.system/cloudant")
        );
        let stored = fake.entity(Collection::Packages, NS, "mycloudant").unwrap();
        assert_eq!(stored["binding"], json!({"namespace": "whisk.system", "name": "cloudant"}));
    }

    #[tokio::test]
    async fn test_binding_annotation_is_not_user_defined() {
        let (handler, fake) = handler();
        fake.seed(
            Collection::Packages,
            NS,
            "mycloudant",
            json!({
                "name": "mycloudant",
                "namespace": NS,
                "version": "0.0.1",
                "annotations": [
                    {"key": "binding", "value": {"namespace": "whisk.system", "name": "cloudant"}},
                    {"key": "owner", "value": "ops"}
                ],
                "parameters": [],
                "binding": {"namespace": "whisk.system", "name": "cloudant"}
            }),
        );

        let state = handler.read("mycloudant").await.unwrap();
        assert_eq!(
            state.get_attribute::<String>("user_defined_annotations").as_deref(),
            Some(r#"[{"key":"owner","value":"ops"}]"#)
        );
    }

    #[tokio::test]
    async fn test_update_keeps_binding_and_rejects_rebinding() {
        let (handler, fake) = handler();
        let prior = package(json!({"name": "mycloudant", "bind_package_name": "/whisk.system/cloudant"}));
        handler.create(&prior).await.unwrap();

        let desired = package(json!({
            "name": "mycloudant",
            "bind_package_name": "/whisk.system/cloudant",
            "publish": true
        }));
        let state = handler.update("mycloudant", &prior, &desired).await.unwrap();
        assert_eq!(state.get_attribute::<bool>("publish"), Some(true));
        let stored = fake.entity(Collection::Packages, NS, "mycloudant").unwrap();
        assert_eq!(stored["binding"]["name"], json!("cloudant"));

        let rebound = package(json!({"name": "mycloudant", "bind_package_name": "/whisk.system/alarms"}));
        let err = handler
            .update("mycloudant", &desired, &rebound)
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_data_source_reads_by_qualified_name() {
        let fake = Arc::new(FakeWhisk::new(NS));
        let handler = PackageHandler::new(fake.clone());
        handler
            .create(&package(json!({"name": "utils"})))
            .await
            .unwrap();

        let source = PackageDataSource::new(fake);
        let state = source
            .read(&package(json!({"name": "/org_dev/utils"})))
            .await
            .unwrap();
        assert_eq!(state.id, "utils");
        assert_eq!(state.get_attribute::<String>("name").as_deref(), Some("utils"));

        let missing = source
            .read(&package(json!({"name": "nothing-here"})))
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_and_exists() {
        let (handler, _fake) = handler();
        handler
            .create(&package(json!({"name": "utils"})))
            .await
            .unwrap();
        assert!(handler.exists("utils").await.unwrap());

        handler.delete("utils").await.unwrap();
        assert!(!handler.exists("utils").await.unwrap());
    }
}
