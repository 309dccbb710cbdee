use crate::context::AppContext;
use clap::Subcommand;
use ledgerprep_config::Config;
use ledgerprep_core::{ArtifactKind, ContentHash};
use ledgerprep_pipeline::Phase;
use std::path::PathBuf;

pub mod artifacts;
pub mod register;
pub mod serve;
pub mod sweep;

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep training then testing tasks on a fixed interval until Ctrl-C
    Serve,

    /// Run a single sweep for one phase
    Sweep {
        /// Phase to sweep (train or test)
        #[arg(long)]
        phase: Phase,
    },

    /// Register data-sample archives on the ledger
    RegisterData {
        /// Dataset the samples belong to (repeatable)
        #[arg(long = "dataset-key", required = true)]
        dataset_keys: Vec<String>,

        /// Register the samples for testing only
        #[arg(long)]
        test_only: bool,

        /// Zip archives to register
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Create a test task for a trained train task
    CreateTesttuple {
        /// Key of the train task
        traintuple_key: String,

        /// Dataset holding the test data
        #[arg(long)]
        dataset_key: String,

        /// Test data-sample key (repeatable)
        #[arg(long = "data-key")]
        data_keys: Vec<String>,
    },

    /// Delete a local artifact record and its blob
    Delete {
        /// Artifact kind (dataset, data, algo, model, challenge)
        kind: ArtifactKind,

        /// Content hash of the artifact
        hash: ContentHash,
    },

    /// Print the content hash of a file
    Hash {
        file: PathBuf,
    },
}

impl Commands {
    pub async fn execute(self, config: Config) -> eyre::Result<()> {
        if let Commands::Hash { file } = &self {
            return artifacts::hash(file);
        }

        let context = AppContext::build(config).await?;
        let result = match self {
            Commands::Serve => serve::execute(&context).await,
            Commands::Sweep { phase } => sweep::execute(&context, phase).await,
            Commands::RegisterData {
                dataset_keys,
                test_only,
                paths,
            } => register::register_data(&context, &paths, &dataset_keys, test_only).await,
            Commands::CreateTesttuple {
                traintuple_key,
                dataset_key,
                data_keys,
            } => register::create_testtuple(&context, &traintuple_key, &dataset_key, &data_keys).await,
            Commands::Delete { kind, hash } => artifacts::delete(&context, kind, &hash).await,
            Commands::Hash { .. } => Ok(()),
        };

        context.shutdown().await;
        result
    }
}
