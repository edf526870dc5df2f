use super::{
    go_duration::{format_go_duration, parse_go_duration},
    internal, v1alpha1,
};

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConversionError {
    #[error("unsupported configuration {api_version}, {kind}, only {} {} is supported", v1alpha1::GROUP_VERSION, v1alpha1::MASTER_CONFIGURATION_KIND)]
    UnsupportedVersion { api_version: String, kind: String },

    #[error("invalid tokenTTL {value:?}")]
    InvalidTokenTtl {
        value: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("tokenTTL cannot be represented in {}", v1alpha1::GROUP_VERSION)]
    TokenTtlOutOfRange(#[source] anyhow::Error),
}

impl TryFrom<&internal::MasterConfiguration> for v1alpha1::MasterConfiguration {
    type Error = ConversionError;

    fn try_from(cfg: &internal::MasterConfiguration) -> Result<Self, Self::Error> {
        let token_ttl = cfg
            .token_ttl
            .map(format_go_duration)
            .transpose()
            .map_err(ConversionError::TokenTtlOutOfRange)?;

        Ok(Self {
            api_version: None,
            kind: None,
            api: v1alpha1::Api {
                advertise_address: cfg.api.advertise_address.clone(),
                bind_port: cfg.api.bind_port,
            },
            api_server_cert_sans: cfg.api_server_cert_sans.clone(),
            api_server_extra_args: cfg.api_server_extra_args.clone(),
            authorization_modes: cfg.authorization_modes.clone(),
            certificates_dir: cfg.certificates_dir.clone(),
            cloud_provider: cfg.cloud_provider.clone(),
            controller_manager_extra_args: cfg.controller_manager_extra_args.clone(),
            etcd: v1alpha1::Etcd {
                ca_file: cfg.etcd.ca_file.clone(),
                cert_file: cfg.etcd.cert_file.clone(),
                data_dir: cfg.etcd.data_dir.clone(),
                endpoints: cfg.etcd.endpoints.clone(),
                extra_args: cfg.etcd.extra_args.clone(),
                image: cfg.etcd.image.clone(),
                key_file: cfg.etcd.key_file.clone(),
            },
            feature_gates: cfg.feature_gates.clone(),
            image_repository: cfg.image_repository.clone(),
            kubernetes_version: cfg.kubernetes_version.clone(),
            networking: v1alpha1::Networking {
                dns_domain: cfg.networking.dns_domain.clone(),
                pod_subnet: cfg.networking.pod_subnet.clone(),
                service_subnet: cfg.networking.service_subnet.clone(),
            },
            node_name: cfg.node_name.clone(),
            scheduler_extra_args: cfg.scheduler_extra_args.clone(),
            token: cfg.token.clone(),
            token_ttl,
            unified_control_plane_image: cfg.unified_control_plane_image.clone(),
        })
    }
}

impl TryFrom<v1alpha1::MasterConfiguration> for internal::MasterConfiguration {
    type Error = ConversionError;

    fn try_from(cfg: v1alpha1::MasterConfiguration) -> Result<Self, Self::Error> {
        // Both are optional in a file, but if given they have to name this version
        let api_version = cfg.api_version.as_deref().unwrap_or(v1alpha1::GROUP_VERSION);
        let kind = cfg.kind.as_deref().unwrap_or(v1alpha1::MASTER_CONFIGURATION_KIND);
        if api_version != v1alpha1::GROUP_VERSION || kind != v1alpha1::MASTER_CONFIGURATION_KIND {
            return Err(ConversionError::UnsupportedVersion {
                api_version: api_version.to_string(),
                kind: kind.to_string(),
            });
        }

        let token_ttl = match cfg.token_ttl {
            Some(value) => Some(parse_go_duration(&value).map_err(|source| ConversionError::InvalidTokenTtl { value, source })?),
            None => None,
        };

        Ok(Self {
            api: internal::Api {
                advertise_address: cfg.api.advertise_address,
                bind_port: cfg.api.bind_port,
            },
            etcd: internal::Etcd {
                endpoints: cfg.etcd.endpoints,
                ca_file: cfg.etcd.ca_file,
                cert_file: cfg.etcd.cert_file,
                key_file: cfg.etcd.key_file,
                data_dir: cfg.etcd.data_dir,
                extra_args: cfg.etcd.extra_args,
                image: cfg.etcd.image,
            },
            networking: internal::Networking {
                service_subnet: cfg.networking.service_subnet,
                pod_subnet: cfg.networking.pod_subnet,
                dns_domain: cfg.networking.dns_domain,
            },
            kubernetes_version: cfg.kubernetes_version,
            cloud_provider: cfg.cloud_provider,
            node_name: cfg.node_name,
            authorization_modes: cfg.authorization_modes,
            token: cfg.token,
            token_ttl,
            api_server_extra_args: cfg.api_server_extra_args,
            controller_manager_extra_args: cfg.controller_manager_extra_args,
            scheduler_extra_args: cfg.scheduler_extra_args,
            api_server_cert_sans: cfg.api_server_cert_sans,
            certificates_dir: cfg.certificates_dir,
            image_repository: cfg.image_repository,
            ci_image_repository: String::new(),
            unified_control_plane_image: cfg.unified_control_plane_image,
            feature_gates: cfg.feature_gates,
        })
    }
}
