use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::{
    builder::{BuildOptions, MetadataBuilder, RebuildReport},
    cleanup,
    config::Config,
    runtime::Runtime,
    store::MappingStore,
};

/// Rebuild the newest `count` versions and commit them to the output file.
///
/// Nothing is written unless the rebuild succeeds and validates.
#[tracing::instrument(skip(runtime, config))]
pub async fn update<R: Runtime>(
    runtime: &R,
    config: Config,
    count: usize,
    options: BuildOptions,
) -> Result<RebuildReport> {
    let store = MappingStore::new(runtime, config.output);
    let builder = MetadataBuilder::new(config.github, config.http, config.naming, options);

    let cleanup_ctx = cleanup::new_shared();
    let cleanup_ctx_clone = Arc::clone(&cleanup_ctx);

    let ctrl_c_handler = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, cleaning up...");
            cleanup::run(&cleanup_ctx_clone);
            std::process::exit(130);
        }
    });

    let result = async {
        let report = builder.rebuild_mapping(count).await?;
        store.commit(&report.mapping, &cleanup_ctx)?;
        Ok::<_, anyhow::Error>(report)
    }
    .await;

    ctrl_c_handler.abort();

    let report = result?;
    for skipped in &report.skipped_assets {
        info!(
            "Skipped {} {}: {}",
            skipped.version, skipped.platform, skipped.reason
        );
    }
    println!("Updated {}: {}", store.path().display(), report.summary());

    Ok(report)
}
