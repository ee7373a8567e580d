//! genx CLI - generate entity, repository and service sources from table metadata
//!
//! Reads a `genx.yaml` project file and a table metadata snapshot, then
//! renders the configured templates into the output directory.

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use genx::codegen::{Generator, PlaceholderRenderer};
use genx::meta::{build_tables, load_tables, Table};
use genx::options::{FileMode, GeneratorOptions};
use genx::type_registry::{TargetType, TypeRegistry};

#[derive(Parser)]
#[command(name = "genx")]
#[command(version, about = "Generate JVM persistence sources from database table metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate source files for every table in the snapshot
    Generate {
        /// Path to the genx.yaml project file
        #[arg(short, long, default_value = "genx.yaml")]
        config: PathBuf,

        /// Table metadata snapshot (YAML)
        #[arg(short, long, default_value = "tables.yaml")]
        tables: PathBuf,

        /// Persisted custom type mappings (JSON)
        #[arg(long)]
        types: Option<PathBuf>,

        /// Author written into generated files - overrides GENX_AUTHOR and config
        #[arg(short, long)]
        author: Option<String>,

        /// Template root directory - overrides GENX_TEMPLATE_ROOT and config
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Replace existing files instead of skipping them
        #[arg(long)]
        overwrite: bool,
    },

    /// Show how the naming rules rename tables and columns
    Preview {
        /// Path to the genx.yaml project file
        #[arg(short, long, default_value = "genx.yaml")]
        config: PathBuf,

        /// Table metadata snapshot (YAML)
        #[arg(short, long, default_value = "tables.yaml")]
        tables: PathBuf,

        /// Persisted custom type mappings (JSON)
        #[arg(long)]
        types: Option<PathBuf>,
    },

    /// Inspect or edit the column type mappings
    Types {
        /// Persisted custom type mappings (JSON)
        #[arg(short, long, default_value = "genx-types.json")]
        store: PathBuf,

        #[command(subcommand)]
        action: TypesAction,
    },

    /// Fill parameters back into a logged SQL statement
    Sql {
        /// File holding the log excerpt (stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TypesAction {
    /// List effective mappings
    List,
    /// Map a source column type to a target type
    Add {
        /// Source column type, e.g. `jsonb`
        source: String,
        /// Fully qualified target type, e.g. `java.lang.String`
        target: String,
    },
    /// Remove a custom mapping
    Remove { source: String },
    /// Drop every custom mapping
    Reset,
}

/// Determine the author with precedence: CLI > ENV > config file > USER
fn resolve_author(cli_override: Option<String>, config_author: &str) -> String {
    // 1. CLI flag (highest priority)
    if let Some(author) = cli_override.filter(|a| !a.trim().is_empty()) {
        println!("  ℹ Using author from CLI flag: {}", author);
        return author;
    }

    // 2. Environment variable GENX_AUTHOR
    if let Ok(author) = std::env::var("GENX_AUTHOR") {
        if !author.trim().is_empty() {
            println!("  ℹ Using author from GENX_AUTHOR: {}", author);
            return author;
        }
    }

    // 3. Config file
    if !config_author.trim().is_empty() {
        return config_author.to_string();
    }

    // 4. Login name
    let author = std::env::var("USER").unwrap_or_default();
    if !author.is_empty() {
        println!("  ℹ Using author from USER: {}", author);
    }
    author
}

/// Determine the template root with precedence: CLI > ENV > config file (defaults to `templates`)
fn resolve_template_root(cli_override: Option<PathBuf>, config_root: PathBuf) -> PathBuf {
    if let Some(root) = cli_override {
        println!("  ℹ Using templates from CLI flag: {}", root.display());
        return root;
    }

    if let Ok(root) = std::env::var("GENX_TEMPLATE_ROOT") {
        if !root.trim().is_empty() {
            println!("  ℹ Using templates from GENX_TEMPLATE_ROOT: {}", root);
            return PathBuf::from(root);
        }
    }

    config_root
}

fn load_registry(types: Option<&Path>) -> Result<TypeRegistry, String> {
    match types {
        Some(path) => {
            let registry = TypeRegistry::load(path).map_err(|e| e.to_string())?;
            println!("  ✓ Loaded {} custom type mapping(s)", registry.custom_count());
            Ok(registry)
        }
        None => Ok(TypeRegistry::new()),
    }
}

fn load_project(
    config: &Path,
    tables_path: &Path,
    types: Option<&Path>,
) -> Result<(GeneratorOptions, Vec<Table>), String> {
    let options = GeneratorOptions::from_file(config).map_err(|e| e.to_string())?;
    println!("  ✓ Loaded options from {}", config.display());

    let registry = load_registry(types)?;
    let raws = load_tables(tables_path).map_err(|e| e.to_string())?;
    let tables = build_tables(&registry, &raws, &options.column_filter, options.language)
        .map_err(|e| e.to_string())?;
    println!("  ✓ Loaded {} table(s) from {}", tables.len(), tables_path.display());

    Ok((options, tables))
}

fn generate(
    config: PathBuf,
    tables: PathBuf,
    types: Option<PathBuf>,
    author: Option<String>,
    templates: Option<PathBuf>,
    overwrite: bool,
) -> Result<(), String> {
    println!("📋 Generating sources from {}...", config.display());

    let (mut options, tables) = load_project(&config, &tables, types.as_deref())?;
    options.author = resolve_author(author, &options.author);
    options.template_root = resolve_template_root(templates, options.template_root);
    if overwrite {
        options.file_mode = FileMode::Overwrite;
    }

    let renderer = PlaceholderRenderer::new();
    match Generator::new(&options, &renderer).run(tables) {
        Ok(log) => {
            print!("{}", log.text());
            println!("✨ Generated {} file(s) in {}", log.written.len(), options.output_dir.display());
            Ok(())
        }
        Err(run_error) => {
            print!("{}", run_error.log.text());
            Err(run_error.error.to_string())
        }
    }
}

fn preview(config: PathBuf, tables: PathBuf, types: Option<PathBuf>) -> Result<(), String> {
    let (options, tables) = load_project(&config, &tables, types.as_deref())?;
    for table in &tables {
        println!("{}\n", genx::naming::preview(table, &options.naming_rules));
    }
    Ok(())
}

fn edit_types(store: PathBuf, action: TypesAction) -> Result<(), String> {
    let mut registry = TypeRegistry::load(&store).map_err(|e| e.to_string())?;

    match action {
        TypesAction::List => {
            let mappings = registry.mappings();
            let width = mappings.iter().map(|m| m.source_type.len()).max().unwrap_or(0);
            for mapping in mappings {
                println!(
                    "{:<width$}  =>  {} ({})",
                    mapping.source_type,
                    mapping.target,
                    mapping.origin,
                    width = width
                );
            }
            return Ok(());
        }
        TypesAction::Add { source, target } => {
            registry.register(&source, TargetType::new(target));
            println!("  ✓ Mapped {} => {}", source, registry.resolve(&source));
        }
        TypesAction::Remove { source } => match registry.unregister(&source).map_err(|e| e.to_string())? {
            Some(previous) => println!("  ✓ Removed {} => {}", source, previous),
            None => println!("  ℹ No custom mapping for {}", source),
        },
        TypesAction::Reset => {
            registry.reset();
            println!("  ✓ Restored built-in mappings");
        }
    }

    registry.save(&store).map_err(|e| e.to_string())?;
    println!("  ✓ Saved {}", store.display());
    Ok(())
}

fn sql(file: Option<PathBuf>) -> Result<(), String> {
    let text = match file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| format!("Failed to read stdin: {}", e))?;
            buffer
        }
    };

    let statement = genx::sql_log::format_sql_log(&text).ok_or_else(|| "Bad SQL statement!!!".to_string())?;
    println!("{}", statement);
    Ok(())
}

fn main() {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "genx=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { config, tables, types, author, templates, overwrite } => {
            generate(config, tables, types, author, templates, overwrite)
        }
        Commands::Preview { config, tables, types } => preview(config, tables, types),
        Commands::Types { store, action } => edit_types(store, action),
        Commands::Sql { file } => sql(file),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
