use anyhow::{Context, Result};
use config::UploaderConfig;
use upload::timing::{self, RunTimes};

mod apiclient;
mod config;
mod constants;
mod etcd_encoding;
mod json_tools;
mod k8s_api;
mod k8s_etcd;
mod kubeadm_api;
mod locations;
mod logging;
mod runtime;
mod upload;
mod uploadconfig;

fn main() -> Result<()> {
    let uploader_config = UploaderConfig::new().context("parsing config")?;

    logging::init().context("initializing logging")?;

    runtime::prepare_tokio_runtime(uploader_config.threads)?.block_on(main_internal(uploader_config))
}

async fn main_internal(uploader_config: UploaderConfig) -> Result<()> {
    let (connect_result, connect_run_time) = timing::timed(upload::connect(&uploader_config)).await;

    let in_memory_etcd_client = match connect_result {
        Ok(in_memory_etcd_client) => in_memory_etcd_client,
        Err(err) => {
            let run_times = RunTimes {
                connect_run_time,
                upload_run_time: None,
            };

            return upload::finish(&uploader_config, None, run_times, Err(err)).await;
        }
    };

    let (run_result, upload_run_time) = timing::timed(upload::run(&uploader_config, &in_memory_etcd_client)).await;
    let run_times = RunTimes {
        connect_run_time,
        upload_run_time: Some(upload_run_time),
    };

    upload::finish(&uploader_config, Some(&in_memory_etcd_client), run_times, run_result).await
}
