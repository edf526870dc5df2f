use crate::{
    k8s_api::{ConfigMap, ConfigMapWithMeta, Node, NodeWithMeta, ObjectMeta, OwnerReference, Time},
    k8s_etcd::{get_etcd_json, put_etcd_json, InMemoryK8sEtcd},
    locations::K8sResourceLocation,
};
use anyhow::{Context, Result};
use fn_error_context::context;

/// Creates the ConfigMap, or replaces it entirely if one with the same name already exists. A
/// replaced ConfigMap keeps its uid and creation time, like an update through the apiserver would.
#[context("creating or updating ConfigMap")]
pub(crate) async fn create_or_update_config_map(etcd_client: &InMemoryK8sEtcd, mut config_map: ConfigMap) -> Result<()> {
    let metadata = config_map.metadata.get_or_insert_with(ObjectMeta::default);
    let name = metadata.name.clone().context("ConfigMap has no name")?;
    let k8s_resource_location = K8sResourceLocation::new(metadata.namespace.as_deref(), "ConfigMap", &name, "v1");

    match get_etcd_json(etcd_client, &k8s_resource_location).await? {
        Some(existing) => {
            let existing: ConfigMapWithMeta = serde_json::from_value(existing).with_context(|| format!("parsing existing {}", k8s_resource_location))?;
            let existing_metadata = existing.inner.metadata.unwrap_or_default();

            log::debug!("{} already exists, replacing it", k8s_resource_location);

            metadata.uid = existing_metadata.uid;
            metadata.creation_timestamp = existing_metadata.creation_timestamp;
        }
        None => {
            log::debug!("{} does not exist, creating it", k8s_resource_location);
        }
    }

    if metadata.uid.is_none() {
        metadata.uid = Some(uuid::Uuid::new_v4().to_string());
    }

    if metadata.creation_timestamp.is_none() {
        metadata.creation_timestamp = Some(Time::now());
    }

    put_etcd_json(
        etcd_client,
        &k8s_resource_location,
        serde_json::to_value(ConfigMapWithMeta::new(config_map)).context("serializing ConfigMap")?,
    )
    .await
}

pub(crate) async fn get_node(etcd_client: &InMemoryK8sEtcd, name: &str) -> Result<Option<Node>> {
    let k8s_resource_location = K8sResourceLocation::new(None, "Node", name, "v1");

    Ok(match get_etcd_json(etcd_client, &k8s_resource_location).await? {
        Some(value) => Some(
            serde_json::from_value::<NodeWithMeta>(value)
                .with_context(|| format!("parsing {}", k8s_resource_location))?
                .inner,
        ),
        None => None,
    })
}

/// An owner reference marking the owner as the managing controller of the owned object, so the
/// garbage collector removes the owned object together with its owner
pub(crate) fn new_controller_ref(owner: &ObjectMeta, api_version: &str, kind: &str) -> OwnerReference {
    OwnerReference {
        api_version: Some(api_version.to_string()),
        kind: Some(kind.to_string()),
        name: owner.name.clone(),
        uid: owner.uid.clone(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config_map(value: &str) -> ConfigMap {
        ConfigMap {
            metadata: Some(ObjectMeta {
                name: Some("kubeadm-config".to_string()),
                namespace: Some("kube-system".to_string()),
                ..Default::default()
            }),
            data: BTreeMap::from([("key".to_string(), value.to_string())]),
            immutable: None,
        }
    }

    async fn stored_config_map(etcd_client: &InMemoryK8sEtcd) -> ConfigMap {
        let value = get_etcd_json(
            etcd_client,
            &K8sResourceLocation::new(Some("kube-system"), "ConfigMap", "kubeadm-config", "v1"),
        )
        .await
        .unwrap()
        .unwrap();

        serde_json::from_value::<ConfigMapWithMeta>(value).unwrap().inner
    }

    #[tokio::test]
    async fn test_create_then_update_keeps_identity() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);

        create_or_update_config_map(&etcd_client, config_map("first")).await.unwrap();
        let created = stored_config_map(&etcd_client).await;
        let created_metadata = created.metadata.unwrap();
        assert!(created_metadata.uid.is_some());
        assert!(created_metadata.creation_timestamp.is_some());
        assert_eq!(created.data["key"], "first");

        create_or_update_config_map(&etcd_client, config_map("second")).await.unwrap();
        let updated = stored_config_map(&etcd_client).await;
        let updated_metadata = updated.metadata.unwrap();
        assert_eq!(updated_metadata.uid, created_metadata.uid);
        assert_eq!(updated_metadata.creation_timestamp, created_metadata.creation_timestamp);
        assert_eq!(updated.data["key"], "second");

        assert_eq!(etcd_client.written_resources().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_config_map_without_name() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);

        assert!(create_or_update_config_map(&etcd_client, ConfigMap::default()).await.is_err());
        assert!(etcd_client.written_resources().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_node() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);
        assert!(get_node(&etcd_client, "node-1").await.unwrap().is_none());

        etcd_client
            .put(
                "minions/node-1",
                br#"{"apiVersion":"v1","kind":"Node","metadata":{"name":"node-1","uid":"abcd"},"spec":{}}"#.to_vec(),
            )
            .await
            .unwrap();

        let node = get_node(&etcd_client, "node-1").await.unwrap().unwrap();
        let owner_reference = new_controller_ref(node.metadata.as_ref().unwrap(), "v1", "Node");

        assert_eq!(owner_reference.name.as_deref(), Some("node-1"));
        assert_eq!(owner_reference.uid.as_deref(), Some("abcd"));
        assert_eq!(owner_reference.controller, Some(true));
        assert_eq!(owner_reference.block_owner_deletion, Some(true));
    }
}
