use clap::{Parser, Subcommand, ValueEnum};
use pgx_artifacts::cli;
use pgx_artifacts::types::FileType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgx-artifacts")]
#[command(about = "Move pharmacogenomic allele data between a database and curator spreadsheets")]
#[command(long_about = "pgx-artifacts - curated spreadsheet artifacts for a pharmacogenomics database

Exports allele definition tables, allele functionality references and
population frequency tables as .xlsx files, one per gene, and imports
curated directories of those files back, replacing the tables each
importer owns.

COMMANDS:
  init      - Create the database tables
  export    - Write one artifact per gene
  import    - Replace a table family from a directory of artifacts
  archive   - Write a dated snapshot of every gene artifact
  starter   - Create placeholder artifacts for new genes

EXAMPLES:
  pgx-artifacts export allele-definition -d out/
  pgx-artifacts import function-reference -d curated/ --atomic
  pgx-artifacts import frequency -d curated/frequency/
  pgx-artifacts starter -g ABCG2 -g CYP4F2 -d new/

Logging is controlled with RUST_LOG (default: pgx_artifacts=info).")]
#[command(version)]
struct Cli {
    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, env = "PGX_DB")]
    db: Option<PathBuf>,

    /// YAML config file
    #[arg(long, global = true, env = "PGX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ArtifactKind {
    /// Allele definition tables
    AlleleDefinition,
    /// Allele functionality references
    FunctionReference,
    /// Population allele frequency tables
    Frequency,
}

impl From<ArtifactKind> for FileType {
    fn from(kind: ArtifactKind) -> Self {
        match kind {
            ArtifactKind::AlleleDefinition => FileType::AlleleDefinition,
            ArtifactKind::FunctionReference => FileType::AlleleFunctionReference,
            ArtifactKind::Frequency => FileType::Frequency,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database tables if they don't exist
    Init,

    #[command(long_about = "Write one artifact per gene into an existing directory.

Every written file is recorded in the file history. With --publish each
file is also copied to the publish directory from the config; upload
failures are logged and do not stop the export.")]
    /// Export artifacts, one file per gene
    Export {
        /// Artifact family
        kind: ArtifactKind,

        /// Directory to write files to (must exist)
        #[arg(short, long)]
        directory: PathBuf,

        /// Publish each file after writing it
        #[arg(long)]
        publish: bool,
    },

    #[command(long_about = "Replace a table family from a directory of .xlsx artifacts.

All rows the importer owns are deleted first, then files are imported in
file name order. The first failing file stops the run and is reported with
the offending row; files imported before it stay imported unless --atomic
is given, in which case the whole run is rolled back.

Editor lock files (~$*, .~lock*) are ignored.")]
    /// Import a directory of artifacts
    Import {
        /// Artifact family
        kind: ArtifactKind,

        /// Directory containing .xlsx files
        #[arg(short, long)]
        directory: PathBuf,

        /// Run the whole import in one transaction
        #[arg(long)]
        atomic: bool,
    },

    /// Write every gene artifact under <DIR>/<prefix>_<date>/genes
    Archive {
        /// Base directory (must exist)
        #[arg(short, long)]
        directory: PathBuf,

        /// Publish each file after writing it
        #[arg(long)]
        publish: bool,
    },

    /// Create placeholder artifacts for new genes
    Starter {
        /// Gene symbol (repeatable)
        #[arg(short, long = "gene", required = true)]
        genes: Vec<String>,

        /// Directory to write files to (must exist)
        #[arg(short, long)]
        directory: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "pgx_artifacts=info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli::Settings::load(cli.config.as_deref(), cli.db)?;

    match cli.command {
        Commands::Init => cli::init(&settings)?,

        Commands::Export {
            kind,
            directory,
            publish,
        } => cli::export(&settings, kind.into(), directory, publish)?,

        Commands::Import {
            kind,
            directory,
            atomic,
        } => cli::import(&settings, kind.into(), directory, atomic)?,

        Commands::Archive { directory, publish } => cli::archive(&settings, directory, publish)?,

        Commands::Starter { genes, directory } => cli::starter(&settings, genes, directory)?,
    }
    Ok(())
}
