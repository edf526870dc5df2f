/// Namespace of the cluster's own components
pub(crate) const NAMESPACE_SYSTEM: &str = "kube-system";

/// Name of the ConfigMap holding the MasterConfiguration the cluster was bootstrapped with
pub(crate) const MASTER_CONFIGURATION_CONFIGMAP: &str = "kubeadm-config";

pub(crate) const MASTER_CONFIGURATION_CONFIGMAP_KEY: &str = "MasterConfiguration";

pub(crate) const MASTER_NODE_CONFIGURATION_CONFIGMAP_KEY: &str = "MasterNodeConfiguration";

// Object names must be DNS-1123 subdomains
pub(crate) const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
