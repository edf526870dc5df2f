use anyhow::{ensure, Context, Result};

pub(crate) mod conversion;
mod go_duration;
pub(crate) mod internal;
pub(crate) mod v1alpha1;

/// Reads a kubeadm MasterConfiguration file, applies the v1alpha1 defaults and converts it to the
/// internal representation. The node name given on the command line, if any, wins over the one in
/// the file.
pub(crate) fn load_master_configuration(config_bytes: &[u8], node_name: Option<&str>) -> Result<internal::MasterConfiguration> {
    let mut external: v1alpha1::MasterConfiguration =
        serde_yaml::from_slice(config_bytes).context("parsing MasterConfiguration YAML")?;

    v1alpha1::set_defaults_master_configuration(&mut external);

    if let Some(node_name) = node_name {
        external.node_name = node_name.to_string();
    }

    external.node_name = external.node_name.trim().to_lowercase();
    ensure!(!external.node_name.is_empty(), "nodeName must be set, either in the file or with --node-name");

    internal::MasterConfiguration::try_from(external).context("converting MasterConfiguration to its internal version")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const MASTER_CONFIGURATION: &str = r#"
apiVersion: kubeadm.k8s.io/v1alpha1
kind: MasterConfiguration
api:
  advertiseAddress: 10.0.0.1
nodeName: Node-1
token: abcdef.0123456789abcdef
"#;

    #[test]
    fn test_load_applies_defaults() {
        let cfg = load_master_configuration(MASTER_CONFIGURATION.as_bytes(), None).unwrap();

        assert_eq!(cfg.node_name, "node-1");
        assert_eq!(cfg.api.bind_port, 6443);
        assert_eq!(cfg.token, "abcdef.0123456789abcdef");
        assert_eq!(cfg.token_ttl, Some(Duration::from_secs(24 * 3600)));
        assert_eq!(cfg.authorization_modes, vec!["Node", "RBAC"]);
    }

    #[test]
    fn test_load_node_name_override() {
        let cfg = load_master_configuration(MASTER_CONFIGURATION.as_bytes(), Some("master-0")).unwrap();

        assert_eq!(cfg.node_name, "master-0");
    }

    #[test]
    fn test_load_requires_node_name() {
        assert!(load_master_configuration(b"api:\n  advertiseAddress: 10.0.0.1\n", None).is_err());
    }

    #[test]
    fn test_load_rejects_other_versions() {
        assert!(load_master_configuration(b"apiVersion: kubeadm.k8s.io/v1beta1\nnodeName: a\n", None).is_err());
    }
}
