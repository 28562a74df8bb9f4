use crate::config::ArtifactConfig;
use crate::error::{ArtifactError, ArtifactResult};
use crate::exporter::{
    AlleleDefinitionExporter, ArtifactArchive, ArtifactExporter, ExportPipeline, ExportedFile,
    FrequencyExporter, FunctionReferenceExporter, StarterPack,
};
use crate::importer::{
    AlleleDefinitionImporter, BatchImportPipeline, DirectoryImporter, FrequencyImporter,
    FunctionReferenceImporter, ImportOptions, ImportReport,
};
use crate::publish::DirectoryPublisher;
use crate::store::Store;
use crate::types::FileType;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Config file merged with command line overrides
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: ArtifactConfig,
}

impl Settings {
    pub fn load(config_path: Option<&Path>, database: Option<PathBuf>) -> ArtifactResult<Self> {
        let mut config = match config_path {
            Some(path) => ArtifactConfig::load(path)?,
            None => ArtifactConfig::default(),
        };
        if let Some(db) = database {
            config.database = db;
        }
        Ok(Self { config })
    }

    fn open_store(&self) -> ArtifactResult<Store> {
        let store = Store::open(&self.config.database)?;
        store.init_schema()?;
        Ok(store)
    }

    fn publisher(&self, publish: bool) -> ArtifactResult<Option<DirectoryPublisher>> {
        if !publish {
            return Ok(None);
        }
        self.config.publisher().map(Some).ok_or_else(|| {
            ArtifactError::Export("--publish needs a 'publish' section in the config".to_string())
        })
    }
}

/// Execute the init command
pub fn init(settings: &Settings) -> ArtifactResult<()> {
    settings.open_store()?;
    println!("{}", "🗄️  Database ready".bold().green());
    println!("   {}", settings.config.database.display());
    Ok(())
}

/// Execute the export command
pub fn export(
    settings: &Settings,
    kind: FileType,
    directory: PathBuf,
    publish: bool,
) -> ArtifactResult<()> {
    println!("{}", format!("📤 Exporting {}", kind).bold().green());
    println!("   Directory: {}\n", directory.display());

    let store = settings.open_store()?;
    let publisher = settings.publisher(publish)?;
    let mut pipeline = ExportPipeline::new(&store);
    if let Some(p) = publisher.as_ref() {
        pipeline = pipeline.with_publisher(p);
    }

    let exported = pipeline.export(exporter_for(kind), &directory)?;
    print_exported(&exported);
    Ok(())
}

/// Execute the import command
pub fn import(
    settings: &Settings,
    kind: FileType,
    directory: PathBuf,
    atomic: bool,
) -> ArtifactResult<()> {
    println!("{}", format!("📥 Importing {}", kind).bold().green());
    println!("   Directory: {}", directory.display());
    if atomic {
        println!("   {}", "Atomic run: any failure rolls back every file".yellow());
    }
    println!();

    let store = settings.open_store()?;
    let options = ImportOptions { atomic };
    let report = match kind {
        FileType::AlleleDefinition => run_import(&store, AlleleDefinitionImporter, &directory, options),
        FileType::AlleleFunctionReference => {
            run_import(&store, FunctionReferenceImporter, &directory, options)
        }
        FileType::Frequency => run_import(&store, FrequencyImporter, &directory, options),
    };

    match report {
        Ok(report) => {
            print_import_report(&report);
            Ok(())
        }
        Err(e) => {
            if !atomic {
                println!(
                    "{}",
                    "⚠️  Files before the failing one remain imported".yellow()
                );
            }
            Err(e)
        }
    }
}

/// Execute the archive command
pub fn archive(settings: &Settings, directory: PathBuf, publish: bool) -> ArtifactResult<()> {
    let store = settings.open_store()?;
    let archive = ArtifactArchive::new(&directory, settings.config.archive_prefix.as_str());
    println!("{}", "🗃️  Writing archive".bold().green());
    println!("   Directory: {}\n", archive.gene_directory().display());

    let publisher = settings.publisher(publish)?;
    let mut pipeline = ExportPipeline::new(&store);
    if let Some(p) = publisher.as_ref() {
        pipeline = pipeline.with_publisher(p);
    }

    let exported = archive.write(&pipeline)?;
    print_exported(&exported);
    Ok(())
}

/// Execute the starter command
pub fn starter(settings: &Settings, genes: Vec<String>, directory: PathBuf) -> ArtifactResult<()> {
    println!("{}", "🌱 Creating starter files".bold().green());
    println!("   Genes: {}\n", genes.join("/"));

    let store = settings.open_store()?;
    let written = StarterPack::new(&store, genes).write(&directory)?;
    for path in &written {
        println!("   ✅ {}", path.display());
    }
    println!("\n{}", format!("{} file(s) created", written.len()).bold());
    Ok(())
}

fn exporter_for(kind: FileType) -> &'static dyn ArtifactExporter {
    match kind {
        FileType::AlleleDefinition => &AlleleDefinitionExporter,
        FileType::AlleleFunctionReference => &FunctionReferenceExporter,
        FileType::Frequency => &FrequencyExporter,
    }
}

fn run_import<I: DirectoryImporter>(
    store: &Store,
    importer: I,
    directory: &Path,
    options: ImportOptions,
) -> ArtifactResult<ImportReport> {
    BatchImportPipeline::new(store, importer)
        .with_options(options)
        .run(directory)
}

fn print_exported(exported: &[ExportedFile]) {
    if exported.is_empty() {
        println!("{}", "Nothing to export".yellow());
        return;
    }
    for file in exported {
        println!("   ✅ {}", file.path.display());
        if let Some(url) = &file.url {
            println!("      {}", url.bright_blue());
        }
    }
    println!("\n{}", format!("{} file(s) written", exported.len()).bold());
}

fn print_import_report(report: &ImportReport) {
    println!("   Cleared {} existing row(s)", report.deleted_rows);
    for file in &report.files {
        let keys = file.staged.entity_keys.join(", ");
        print!("   ✅ {} ({}, {} row(s)", file.file_name, keys.cyan(), file.staged.rows);
        if file.staged.skipped > 0 {
            print!(", {}", format!("{} skipped", file.staged.skipped).yellow());
        }
        println!(")");
    }
    println!(
        "\n{}",
        format!(
            "{} file(s) imported, {} row(s), {} skipped",
            report.files.len(),
            report.total_rows(),
            report.total_skipped()
        )
        .bold()
        .green()
    );
}
