use crate::{config::UploaderConfig, k8s_etcd::InMemoryK8sEtcd, kubeadm_api, logging, uploadconfig};
use anyhow::{Context, Result};
use etcd_client::Client as EtcdClient;
use std::collections::BTreeMap;
use timing::RunTimes;

pub(crate) mod timing;

pub(crate) async fn connect(uploader_config: &UploaderConfig) -> Result<InMemoryK8sEtcd> {
    let etcd_client = EtcdClient::connect([uploader_config.etcd_endpoint.as_str()], None)
        .await
        .context("connecting to etcd")?;

    Ok(InMemoryK8sEtcd::new(
        Some(etcd_client),
        &uploader_config.etcd_prefix,
        uploader_config.dry_run,
    ))
}

pub(crate) async fn run(uploader_config: &UploaderConfig, in_memory_etcd_client: &InMemoryK8sEtcd) -> Result<()> {
    let master_configuration_bytes = tokio::fs::read(uploader_config.master_configuration.path())
        .await
        .with_context(|| format!("reading {}", uploader_config.master_configuration))?;

    let master_configuration =
        kubeadm_api::load_master_configuration(&master_configuration_bytes, uploader_config.node_name.as_deref())
            .with_context(|| format!("loading {}", uploader_config.master_configuration))?;

    if uploader_config.dry_run {
        log::info!("dry run, nothing will be written to etcd");
    }

    uploadconfig::upload_configuration(&master_configuration, in_memory_etcd_client)
        .await
        .context("uploading configuration")?;

    Ok(())
}

/// Writes the summary of a run, failed or not, and hands back the run's own result. Failing to
/// produce the summary is only logged so it never masks what went wrong during the run.
pub(crate) async fn finish(
    uploader_config: &UploaderConfig,
    in_memory_etcd_client: Option<&InMemoryK8sEtcd>,
    run_times: RunTimes,
    run_result: Result<()>,
) -> Result<()> {
    let written_resources = match in_memory_etcd_client {
        Some(in_memory_etcd_client) => match in_memory_etcd_client.written_resources().await {
            Ok(written_resources) => written_resources,
            Err(err) => {
                log::error!("collecting written resources for the summary: {:#}", err);
                BTreeMap::new()
            }
        },
        None => BTreeMap::new(),
    };

    if let Err(err) = logging::generate_summary(
        uploader_config,
        written_resources,
        Some(run_times),
        run_result.as_ref().err().map(|err| format!("{:#}", err)),
    ) {
        log::error!("generating summary: {:#}", err);
    }

    run_result
}
