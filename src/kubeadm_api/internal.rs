use std::{collections::BTreeMap, time::Duration};

/// The in-memory representation of a master's bootstrap configuration. Never serialized
/// directly, it only reaches the cluster through a versioned projection (see v1alpha1).
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MasterConfiguration {
    pub(crate) api: Api,
    pub(crate) etcd: Etcd,
    pub(crate) networking: Networking,
    pub(crate) kubernetes_version: String,
    pub(crate) cloud_provider: String,
    pub(crate) node_name: String,
    pub(crate) authorization_modes: Vec<String>,

    pub(crate) token: String,
    pub(crate) token_ttl: Option<Duration>,

    pub(crate) api_server_extra_args: BTreeMap<String, String>,
    pub(crate) controller_manager_extra_args: BTreeMap<String, String>,
    pub(crate) scheduler_extra_args: BTreeMap<String, String>,

    pub(crate) api_server_cert_sans: Vec<String>,
    pub(crate) certificates_dir: String,

    pub(crate) image_repository: String,
    // Only used when deploying CI builds, has no external counterpart
    pub(crate) ci_image_repository: String,
    pub(crate) unified_control_plane_image: String,

    pub(crate) feature_gates: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Api {
    pub(crate) advertise_address: String,
    pub(crate) bind_port: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Etcd {
    pub(crate) endpoints: Vec<String>,
    pub(crate) ca_file: String,
    pub(crate) cert_file: String,
    pub(crate) key_file: String,
    pub(crate) data_dir: String,
    pub(crate) extra_args: BTreeMap<String, String>,
    pub(crate) image: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Networking {
    pub(crate) service_subnet: String,
    pub(crate) pod_subnet: String,
    pub(crate) dns_domain: String,
}
