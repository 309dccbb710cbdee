use crate::context::AppContext;
use ledgerprep_registry::{DataRegistrar, TesttupleRegistrar};
use std::path::PathBuf;
use std::sync::Arc;

pub async fn register_data(
    context: &AppContext,
    paths: &[PathBuf],
    dataset_keys: &[String],
    test_only: bool,
) -> eyre::Result<()> {
    let registrar = DataRegistrar::new(
        &context.config,
        Arc::clone(&context.gateway),
        Arc::clone(&context.store),
    );
    let registration = registrar.register(paths, dataset_keys, test_only).await?;

    for key in &registration.keys {
        println!("{key}");
    }
    if !registration.is_validated() {
        eprintln!("{}", registration.message);
    }
    Ok(())
}

pub async fn create_testtuple(
    context: &AppContext,
    traintuple_key: &str,
    dataset_key: &str,
    data_keys: &[String],
) -> eyre::Result<()> {
    let registrar = TesttupleRegistrar::new(&context.config, Arc::clone(&context.gateway));
    let response = registrar
        .create(traintuple_key, dataset_key, data_keys)
        .await?;

    println!("{}", response.body);
    Ok(())
}
