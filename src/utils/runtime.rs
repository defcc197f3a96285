use anyhow::Result;

/// Sampling, reporting and watching all run on one thread. Nothing in the crate needs a pool.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
