use crate::context::AppContext;
use ledgerprep_pipeline::Scheduler;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn execute(context: &AppContext) -> eyre::Result<()> {
    let preparer = Arc::new(context.preparer()?);
    let scheduler = Scheduler::new(preparer, context.config.scheduler.interval);

    scheduler
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Interrupt received, stopping after the current sweep"),
                Err(e) => warn!(error = %e, "Cannot listen for Ctrl-C, stopping"),
            }
        })
        .await;

    Ok(())
}
