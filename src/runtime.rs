use anyhow::{ensure, Context, Result};

pub(crate) fn prepare_tokio_runtime(threads: Option<usize>) -> Result<tokio::runtime::Runtime> {
    Ok(if let Some(threads) = threads {
        ensure!(threads > 0, "threads must be a positive number");

        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(threads)
            .enable_all()
            .build()
            .context("building tokio runtime")?
    } else {
        tokio::runtime::Runtime::new()?
    })
}
