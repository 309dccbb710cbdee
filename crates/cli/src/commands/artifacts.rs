use crate::context::AppContext;
use ledgerprep_core::{ArtifactKind, ContentHash, Error};
use ledgerprep_store::hash_file;
use std::path::Path;

pub fn hash(file: &Path) -> eyre::Result<()> {
    println!("{}", hash_file(file)?);
    Ok(())
}

pub async fn delete(context: &AppContext, kind: ArtifactKind, hash: &ContentHash) -> eyre::Result<()> {
    match context.store.delete(kind, hash).await? {
        Some(record) => {
            println!("deleted {} {}", kind, record.blob_path.display());
            Ok(())
        }
        None => Err(Error::not_found(kind.as_str(), hash.as_str()).into()),
    }
}
