use crate::{
    apiclient,
    constants::{
        DNS1123_SUBDOMAIN_MAX_LENGTH, MASTER_CONFIGURATION_CONFIGMAP, MASTER_CONFIGURATION_CONFIGMAP_KEY,
        MASTER_NODE_CONFIGURATION_CONFIGMAP_KEY, NAMESPACE_SYSTEM,
    },
    k8s_api::{ConfigMap, ObjectMeta},
    k8s_etcd::InMemoryK8sEtcd,
    kubeadm_api::{conversion::ConversionError, internal::MasterConfiguration, v1alpha1},
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

lazy_static! {
    static ref DNS1123_SUBDOMAIN: Regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$").unwrap();
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum UploadConfigError {
    #[error("converting the configuration to {}", v1alpha1::GROUP_VERSION)]
    Conversion(#[from] ConversionError),

    #[error("serializing the configuration to YAML")]
    Serialization(#[from] serde_yaml::Error),

    #[error("writing ConfigMap {namespace}/{name}")]
    StoreWrite {
        namespace: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("reading {kind} {name}")]
    StoreRead {
        kind: String,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{kind} {name:?} not found")]
    NotFound { kind: String, name: String },

    #[error("{0:?} is not a valid ConfigMap name")]
    InvalidName(String),
}

/// Saves the MasterConfiguration and the MasterNodeConfiguration to the cluster, for later
/// reference (when upgrading for instance). The node configuration is only written once the
/// master configuration was written successfully. A failure to write the node configuration does
/// not undo the master configuration write.
pub(crate) async fn upload_configuration(cfg: &MasterConfiguration, etcd_client: &InMemoryK8sEtcd) -> Result<(), UploadConfigError> {
    upload_master_configuration(cfg, etcd_client).await?;

    upload_master_node_configuration(cfg, etcd_client).await
}

pub(crate) async fn upload_master_configuration(cfg: &MasterConfiguration, etcd_client: &InMemoryK8sEtcd) -> Result<(), UploadConfigError> {
    log::info!(
        "storing the configuration used in ConfigMap {:?} in the {:?} namespace",
        MASTER_CONFIGURATION_CONFIGMAP,
        NAMESPACE_SYSTEM
    );

    // The external version is the only one that can be deserialized later
    let mut external_cfg = v1alpha1::MasterConfiguration::try_from(cfg)?;

    // The bootstrap token must not end up in a ConfigMap
    external_cfg.token = String::new();

    let cfg_yaml = serde_yaml::to_string(&external_cfg)?;

    write_config_map(
        etcd_client,
        ConfigMap {
            metadata: Some(ObjectMeta {
                name: Some(MASTER_CONFIGURATION_CONFIGMAP.to_string()),
                namespace: Some(NAMESPACE_SYSTEM.to_string()),
                ..Default::default()
            }),
            data: BTreeMap::from([(MASTER_CONFIGURATION_CONFIGMAP_KEY.to_string(), cfg_yaml)]),
            immutable: None,
        },
    )
    .await
}

pub(crate) async fn upload_master_node_configuration(cfg: &MasterConfiguration, etcd_client: &InMemoryK8sEtcd) -> Result<(), UploadConfigError> {
    let master_node_config_map_name = master_node_config_map_name(&cfg.node_name)?;

    log::info!(
        "storing the master node configuration used in ConfigMap {:?} in the {:?} namespace",
        master_node_config_map_name,
        NAMESPACE_SYSTEM
    );

    let external_cfg = v1alpha1::MasterNodeConfiguration {
        node_name: cfg.node_name.clone(),
    };

    let cfg_yaml = serde_yaml::to_string(&external_cfg)?;

    let node = apiclient::get_node(etcd_client, &cfg.node_name)
        .await
        .map_err(|source| UploadConfigError::StoreRead {
            kind: "Node".to_string(),
            name: cfg.node_name.clone(),
            source,
        })?
        .ok_or_else(|| UploadConfigError::NotFound {
            kind: "Node".to_string(),
            name: cfg.node_name.clone(),
        })?;

    // The ownership link has to point at the node as it is stored, not at what we were told
    let node_metadata = node.metadata.unwrap_or_default();

    write_config_map(
        etcd_client,
        ConfigMap {
            metadata: Some(ObjectMeta {
                name: Some(master_node_config_map_name),
                namespace: Some(NAMESPACE_SYSTEM.to_string()),
                owner_references: vec![apiclient::new_controller_ref(&node_metadata, "v1", "Node")],
                ..Default::default()
            }),
            data: BTreeMap::from([(MASTER_NODE_CONFIGURATION_CONFIGMAP_KEY.to_string(), cfg_yaml)]),
            immutable: None,
        },
    )
    .await
}

/// The name of the ConfigMap holding the configuration of a particular master node
pub(crate) fn master_node_config_map_name(node_name: &str) -> Result<String, UploadConfigError> {
    let name = format!("{}-{}", MASTER_CONFIGURATION_CONFIGMAP, node_name);

    if name.len() > DNS1123_SUBDOMAIN_MAX_LENGTH || !DNS1123_SUBDOMAIN.is_match(&name) {
        return Err(UploadConfigError::InvalidName(name));
    }

    Ok(name)
}

async fn write_config_map(etcd_client: &InMemoryK8sEtcd, config_map: ConfigMap) -> Result<(), UploadConfigError> {
    let metadata = config_map.metadata.clone().unwrap_or_default();

    apiclient::create_or_update_config_map(etcd_client, config_map)
        .await
        .map_err(|source| UploadConfigError::StoreWrite {
            namespace: metadata.namespace.unwrap_or_default(),
            name: metadata.name.unwrap_or_default(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        k8s_api::ConfigMapWithMeta,
        k8s_etcd::get_etcd_json,
        kubeadm_api::internal::{Api, Networking},
        locations::K8sResourceLocation,
    };
    use std::time::Duration;

    fn master_configuration(node_name: &str, token: &str) -> MasterConfiguration {
        MasterConfiguration {
            api: Api {
                advertise_address: "10.0.0.1".to_string(),
                bind_port: 6443,
            },
            networking: Networking {
                service_subnet: "10.96.0.0/12".to_string(),
                pod_subnet: String::new(),
                dns_domain: "cluster.local".to_string(),
            },
            kubernetes_version: "v1.9.0".to_string(),
            node_name: node_name.to_string(),
            authorization_modes: vec!["Node".to_string(), "RBAC".to_string()],
            token: token.to_string(),
            token_ttl: Some(Duration::from_secs(24 * 3600)),
            certificates_dir: "/etc/kubernetes/pki".to_string(),
            image_repository: "gcr.io/google_containers".to_string(),
            ..Default::default()
        }
    }

    async fn add_node(etcd_client: &InMemoryK8sEtcd, name: &str, uid: &str) {
        etcd_client
            .put(
                &K8sResourceLocation::new(None, "Node", name, "v1").as_etcd_key(),
                serde_json::to_vec(&serde_json::json!({
                    "apiVersion": "v1",
                    "kind": "Node",
                    "metadata": {"name": name, "uid": uid},
                }))
                .unwrap(),
            )
            .await
            .unwrap();
    }

    async fn config_map(etcd_client: &InMemoryK8sEtcd, name: &str) -> Option<ConfigMap> {
        get_etcd_json(etcd_client, &K8sResourceLocation::new(Some(NAMESPACE_SYSTEM), "ConfigMap", name, "v1"))
            .await
            .unwrap()
            .map(|value| serde_json::from_value::<ConfigMapWithMeta>(value).unwrap().inner)
    }

    #[tokio::test]
    async fn test_upload_configuration() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);
        add_node(&etcd_client, "node-1", "5e1f2b1a-1111-2222-3333-444455556666").await;

        upload_configuration(&master_configuration("node-1", "abc123"), &etcd_client)
            .await
            .unwrap();

        let master = config_map(&etcd_client, "kubeadm-config").await.unwrap();
        let master_yaml = &master.data[MASTER_CONFIGURATION_CONFIGMAP_KEY];
        assert!(!master_yaml.contains("abc123"));
        assert!(master.metadata.unwrap().owner_references.is_empty());

        let uploaded: v1alpha1::MasterConfiguration = serde_yaml::from_str(master_yaml).unwrap();
        assert_eq!(uploaded.token, "");
        assert_eq!(uploaded.node_name, "node-1");
        assert_eq!(uploaded.token_ttl.as_deref(), Some("24h0m0s"));
        assert_eq!(uploaded.api.advertise_address, "10.0.0.1");

        let node = config_map(&etcd_client, "kubeadm-config-node-1").await.unwrap();
        assert_eq!(node.data[MASTER_NODE_CONFIGURATION_CONFIGMAP_KEY], "nodeName: node-1\n");

        let owner_references = node.metadata.unwrap().owner_references;
        assert_eq!(owner_references.len(), 1);
        assert_eq!(owner_references[0].kind.as_deref(), Some("Node"));
        assert_eq!(owner_references[0].api_version.as_deref(), Some("v1"));
        assert_eq!(owner_references[0].name.as_deref(), Some("node-1"));
        assert_eq!(
            owner_references[0].uid.as_deref(),
            Some("5e1f2b1a-1111-2222-3333-444455556666")
        );
        assert_eq!(owner_references[0].controller, Some(true));
    }

    #[tokio::test]
    async fn test_upload_twice_overwrites() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);
        add_node(&etcd_client, "node-1", "uid-1").await;

        let mut cfg = master_configuration("node-1", "abc123");
        upload_configuration(&cfg, &etcd_client).await.unwrap();
        let first_uid = config_map(&etcd_client, "kubeadm-config").await.unwrap().metadata.unwrap().uid;

        cfg.kubernetes_version = "v1.9.1".to_string();
        upload_configuration(&cfg, &etcd_client).await.unwrap();

        let master = config_map(&etcd_client, "kubeadm-config").await.unwrap();
        assert_eq!(master.metadata.unwrap().uid, first_uid);
        assert!(master.data[MASTER_CONFIGURATION_CONFIGMAP_KEY].contains("kubernetesVersion: v1.9.1"));

        // One master record and one node record, however many times we upload
        let config_maps = etcd_client
            .written_resources()
            .await
            .unwrap()
            .into_keys()
            .filter(|location| location.starts_with("ConfigMap/"))
            .collect::<Vec<_>>();
        assert_eq!(
            config_maps,
            vec!["ConfigMap/kube-system:kubeadm-config", "ConfigMap/kube-system:kubeadm-config-node-1"]
        );
    }

    #[tokio::test]
    async fn test_missing_node_keeps_master_record() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);

        let result = upload_configuration(&master_configuration("node-1", "abc123"), &etcd_client).await;

        match result {
            Err(UploadConfigError::NotFound { kind, name }) => {
                assert_eq!(kind, "Node");
                assert_eq!(name, "node-1");
            }
            other => panic!("unexpected result {:?}", other),
        }

        assert!(config_map(&etcd_client, "kubeadm-config").await.is_some());
        assert!(config_map(&etcd_client, "kubeadm-config-node-1").await.is_none());
    }

    #[tokio::test]
    async fn test_conversion_failure_writes_nothing() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);
        add_node(&etcd_client, "node-1", "uid-1").await;

        let cfg = MasterConfiguration {
            token_ttl: Some(Duration::from_secs(u64::MAX)),
            ..master_configuration("node-1", "abc123")
        };

        assert!(matches!(
            upload_configuration(&cfg, &etcd_client).await,
            Err(UploadConfigError::Conversion(_))
        ));
        assert!(config_map(&etcd_client, "kubeadm-config").await.is_none());
        assert!(config_map(&etcd_client, "kubeadm-config-node-1").await.is_none());
    }

    #[tokio::test]
    async fn test_unreadable_node_keeps_master_record() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);
        etcd_client.put("minions/node-1", b"not json".to_vec()).await.unwrap();

        let result = upload_configuration(&master_configuration("node-1", "abc123"), &etcd_client).await;

        match result {
            Err(UploadConfigError::StoreRead { kind, name, .. }) => {
                assert_eq!(kind, "Node");
                assert_eq!(name, "node-1");
            }
            other => panic!("unexpected result {:?}", other),
        }

        assert!(config_map(&etcd_client, "kubeadm-config").await.is_some());
        assert!(config_map(&etcd_client, "kubeadm-config-node-1").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_existing_master_record() {
        let etcd_client = InMemoryK8sEtcd::new(None, "/registry", false);
        add_node(&etcd_client, "node-1", "uid-1").await;
        etcd_client
            .put("configmaps/kube-system/kubeadm-config", br#"{"kind":3}"#.to_vec())
            .await
            .unwrap();

        let result = upload_configuration(&master_configuration("node-1", "abc123"), &etcd_client).await;

        match result {
            Err(err @ UploadConfigError::StoreWrite { .. }) => {
                assert_eq!(err.to_string(), "writing ConfigMap kube-system/kubeadm-config");
            }
            other => panic!("unexpected result {:?}", other),
        }

        assert!(config_map(&etcd_client, "kubeadm-config-node-1").await.is_none());
    }

    #[test]
    fn test_master_node_config_map_name() {
        assert_eq!(master_node_config_map_name("node-1").unwrap(), "kubeadm-config-node-1");
        assert_eq!(
            master_node_config_map_name("master.example.com").unwrap(),
            "kubeadm-config-master.example.com"
        );

        assert!(matches!(
            master_node_config_map_name("Node_1"),
            Err(UploadConfigError::InvalidName(_))
        ));
        assert!(matches!(
            master_node_config_map_name(&"a".repeat(250)),
            Err(UploadConfigError::InvalidName(_))
        ));
    }
}
