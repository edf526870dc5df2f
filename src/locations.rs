use crate::json_tools;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    // Resources whose etcd key doesn't follow the lowercase-plural convention
    static ref ETCD_RESOURCE_PREFIXES: HashMap<&'static str, &'static str> = {
        HashMap::from([
            ("node", "minions"),
            ("service", "services/specs"),
            ("endpoints", "services/endpoints"),
            ("ingress", "ingress"),
            ("podsecuritypolicy", "podsecuritypolicy"),
        ])
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct K8sResourceLocation {
    pub(crate) namespace: Option<String>,
    pub(crate) kind: String,
    pub(crate) apiversion: String,
    pub(crate) name: String,
}

impl K8sResourceLocation {
    pub(crate) fn new(namespace: Option<&str>, kind: &str, name: &str, apiversion: &str) -> Self {
        Self {
            namespace: namespace.map(|namespace| namespace.to_string()),
            kind: kind.to_string(),
            name: name.to_string(),
            apiversion: apiversion.to_string(),
        }
    }

    /// The key of the resource relative to the apiserver's etcd prefix, e.g.
    /// configmaps/kube-system/kubeadm-config
    pub(crate) fn as_etcd_key(&self) -> String {
        let kind = self.kind.to_lowercase();

        format!(
            "{}/{}{}",
            ETCD_RESOURCE_PREFIXES
                .get(kind.as_str())
                .map(|prefix| prefix.to_string())
                .unwrap_or_else(|| format!("{}s", kind)),
            match &self.namespace {
                Some(namespace) => format!("{}/", namespace),
                None => "".to_string(),
            },
            self.name,
        )
    }
}

impl TryFrom<&serde_json::Value> for K8sResourceLocation {
    type Error = anyhow::Error;
    fn try_from(value: &serde_json::Value) -> Result<Self> {
        let namespace = match json_tools::read_metadata_string_field(value, "namespace") {
            Some(namespace) => match namespace.as_str() {
                "" => None,
                _ => Some(namespace),
            },
            None => None,
        };

        Ok(Self {
            namespace,
            kind: json_tools::read_string_field(value, "kind").context("missing kind field")?,
            name: json_tools::read_metadata_string_field(value, "name").context("missing name field")?,
            apiversion: json_tools::read_string_field(value, "apiVersion").context("missing apiversion field")?,
        })
    }
}

impl std::fmt::Display for K8sResourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}:{}",
            self.kind,
            self.namespace.clone().unwrap_or("cluster-scoped".to_string()),
            self.name
        )
    }
}
