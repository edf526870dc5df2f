use crate::{config::UploaderConfig, upload::timing::RunTimes};
use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use log::{Level, LevelFilter, Metadata, Record};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

struct UploadConfigLogger;

static LOGGER: UploadConfigLogger = UploadConfigLogger;

pub fn init() -> Result<()> {
    match log::set_logger(&LOGGER) {
        Ok(_) => log::set_max_level(LevelFilter::Info),
        Err(_) => bail!("Logger initalization failed"),
    };

    Ok(())
}

lazy_static! {
    pub(crate) static ref LOG_RECORDS: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
}

fn format_record(record: &Record) -> String {
    format!(
        "{} - {} - {}:{}: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        record.level(),
        record.file().unwrap_or("unknown"),
        record.line().unwrap_or(0),
        record.args()
    )
}

impl log::Log for UploadConfigLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_string = format_record(record);

            {
                let mut log_records = match LOG_RECORDS.lock() {
                    Ok(log_records) => log_records,
                    Err(err) => {
                        println!("Failed to lock log records: {}", err);
                        return;
                    }
                };
                log_records.push(log_string.clone());
            }

            println!("{}", log_string);
        }
    }

    fn flush(&self) {}
}

#[derive(serde::Serialize)]
struct Summary<'a> {
    uploader_config: &'a UploaderConfig,
    written_resources: BTreeMap<String, Value>,
    logs: Vec<String>,
    run_times: Option<RunTimes>,
    error: Option<String>,
}

pub(crate) fn generate_summary(
    uploader_config: &UploaderConfig,
    written_resources: BTreeMap<String, Value>,
    run_times: Option<RunTimes>,
    error: Option<String>,
) -> Result<()> {
    let summary_file = match &uploader_config.summary_file {
        Some(summary_file) => summary_file,
        None => return Ok(()),
    };

    let logs = match LOG_RECORDS.lock() {
        Ok(logs) => logs.clone(),
        Err(err) => {
            vec![format!("Failed to lock log records: {}", err)]
        }
    };

    let summary = Summary {
        uploader_config,
        written_resources,
        logs,
        run_times,
        error,
    };

    let summary_file = summary_file.create().context("opening summary file for writing")?;
    serde_yaml::to_writer(summary_file, &summary).context("serializing summary into summary file")?;

    Ok(())
}
