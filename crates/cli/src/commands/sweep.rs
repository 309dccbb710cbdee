use crate::context::AppContext;
use ledgerprep_pipeline::Phase;

pub async fn execute(context: &AppContext, phase: Phase) -> eyre::Result<()> {
    let report = context.preparer()?.sweep(phase).await?;

    for key in &report.prepared {
        println!("prepared {key}");
    }
    for (key, reason) in &report.failed {
        println!("failed   {key}: {reason}");
    }
    println!(
        "{} sweep: {} prepared, {} failed",
        report.phase,
        report.prepared.len(),
        report.failed.len()
    );
    Ok(())
}
