//! The kubeadm.k8s.io/v1alpha1 schema, the only version of the configuration that is ever
//! persisted and read back. Fields are declared in the sorted order of their serialized names so
//! the YAML we write matches what kubeadm itself writes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) const GROUP_VERSION: &str = "kubeadm.k8s.io/v1alpha1";
pub(crate) const MASTER_CONFIGURATION_KIND: &str = "MasterConfiguration";

pub(crate) const DEFAULT_KUBERNETES_VERSION: &str = "stable-1.9";
pub(crate) const DEFAULT_API_BIND_PORT: i32 = 6443;
pub(crate) const DEFAULT_SERVICES_SUBNET: &str = "10.96.0.0/12";
pub(crate) const DEFAULT_SERVICE_DNS_DOMAIN: &str = "cluster.local";
pub(crate) const DEFAULT_CERTIFICATES_DIR: &str = "/etc/kubernetes/pki";
pub(crate) const DEFAULT_IMAGE_REPOSITORY: &str = "gcr.io/google_containers";
pub(crate) const DEFAULT_ETCD_DATA_DIR: &str = "/var/lib/etcd";
pub(crate) const DEFAULT_AUTHORIZATION_MODES: [&str; 2] = ["Node", "RBAC"];
pub(crate) const DEFAULT_TOKEN_TTL: &str = "24h0m0s";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MasterConfiguration {
    #[serde(rename = "apiVersion", skip_serializing_if = "Option::is_none")]
    pub(crate) api_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) kind: Option<String>,

    pub(crate) api: Api,
    #[serde(rename = "apiServerCertSANs", skip_serializing_if = "Vec::is_empty")]
    pub(crate) api_server_cert_sans: Vec<String>,
    #[serde(rename = "apiServerExtraArgs", skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) api_server_extra_args: BTreeMap<String, String>,
    #[serde(rename = "authorizationModes", skip_serializing_if = "Vec::is_empty")]
    pub(crate) authorization_modes: Vec<String>,
    #[serde(rename = "certificatesDir")]
    pub(crate) certificates_dir: String,
    #[serde(rename = "cloudProvider")]
    pub(crate) cloud_provider: String,
    #[serde(rename = "controllerManagerExtraArgs", skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) controller_manager_extra_args: BTreeMap<String, String>,
    pub(crate) etcd: Etcd,
    #[serde(rename = "featureGates", skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) feature_gates: BTreeMap<String, bool>,
    #[serde(rename = "imageRepository")]
    pub(crate) image_repository: String,
    #[serde(rename = "kubernetesVersion")]
    pub(crate) kubernetes_version: String,
    pub(crate) networking: Networking,
    #[serde(rename = "nodeName")]
    pub(crate) node_name: String,
    #[serde(rename = "schedulerExtraArgs", skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) scheduler_extra_args: BTreeMap<String, String>,
    pub(crate) token: String,
    #[serde(rename = "tokenTTL", skip_serializing_if = "Option::is_none")]
    pub(crate) token_ttl: Option<String>,
    #[serde(rename = "unifiedControlPlaneImage")]
    pub(crate) unified_control_plane_image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Api {
    #[serde(rename = "advertiseAddress")]
    pub(crate) advertise_address: String,
    #[serde(rename = "bindPort")]
    pub(crate) bind_port: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Etcd {
    #[serde(rename = "caFile")]
    pub(crate) ca_file: String,
    #[serde(rename = "certFile")]
    pub(crate) cert_file: String,
    #[serde(rename = "dataDir")]
    pub(crate) data_dir: String,
    pub(crate) endpoints: Vec<String>,
    #[serde(rename = "extraArgs", skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) extra_args: BTreeMap<String, String>,
    pub(crate) image: String,
    #[serde(rename = "keyFile")]
    pub(crate) key_file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Networking {
    #[serde(rename = "dnsDomain")]
    pub(crate) dns_domain: String,
    #[serde(rename = "podSubnet")]
    pub(crate) pod_subnet: String,
    #[serde(rename = "serviceSubnet")]
    pub(crate) service_subnet: String,
}

/// The per-node part of the configuration, stored next to the main one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MasterNodeConfiguration {
    #[serde(rename = "nodeName")]
    pub(crate) node_name: String,
}

fn default_string(field: &mut String, default: &str) {
    if field.is_empty() {
        *field = default.to_string();
    }
}

pub(crate) fn set_defaults_master_configuration(cfg: &mut MasterConfiguration) {
    default_string(&mut cfg.kubernetes_version, DEFAULT_KUBERNETES_VERSION);

    if cfg.api.bind_port == 0 {
        cfg.api.bind_port = DEFAULT_API_BIND_PORT;
    }

    default_string(&mut cfg.networking.service_subnet, DEFAULT_SERVICES_SUBNET);
    default_string(&mut cfg.networking.dns_domain, DEFAULT_SERVICE_DNS_DOMAIN);

    if cfg.authorization_modes.is_empty() {
        cfg.authorization_modes = DEFAULT_AUTHORIZATION_MODES.iter().map(|mode| mode.to_string()).collect();
    }

    default_string(&mut cfg.certificates_dir, DEFAULT_CERTIFICATES_DIR);

    if cfg.token_ttl.is_none() {
        cfg.token_ttl = Some(DEFAULT_TOKEN_TTL.to_string());
    }

    default_string(&mut cfg.image_repository, DEFAULT_IMAGE_REPOSITORY);
    default_string(&mut cfg.etcd.data_dir, DEFAULT_ETCD_DATA_DIR);
}
