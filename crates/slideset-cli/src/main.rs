use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use slideset_binding::global_snapshot;
use slideset_common::{ElementKind, Subtype};
use slideset_io::backends::csv::{read_table_path, write_table};
use slideset_io::{
    CsvReadOptions, CsvTypeInference, CsvWriteOptions, JsonAdapter, SaveDestination,
};
use slideset_table::{TableId, TableTree};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slideset", about = "Inspect, convert, and exchange SlideSet table documents")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the table tree with columns and row counts.
    Inspect {
        document: PathBuf,
    },
    /// Re-type a column through its text form.
    Convert(ConvertArgs),
    /// Read a CSV file into a new root table.
    ImportCsv(ImportArgs),
    /// Write one table of a document as CSV.
    ExportCsv(ExportArgs),
    /// List the registered readers and writers.
    Adapters,
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    document: PathBuf,
    /// `/`-separated table names from a root, e.g. `experiment/Measure`.
    #[arg(long)]
    table: String,
    #[arg(long)]
    column: String,
    #[arg(long)]
    kind: String,
    /// Defaults to the kind's own subtype.
    #[arg(long)]
    subtype: Option<String>,
    /// Write here instead of overwriting the document.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ImportArgs {
    csv: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
    /// Add the table to an existing document instead of replacing it.
    #[arg(long)]
    append: bool,
    /// Name columns C1, C2, ... and treat the first record as data.
    #[arg(long)]
    no_headers: bool,
    /// Read every column as text.
    #[arg(long)]
    no_infer: bool,
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    document: PathBuf,
    #[arg(long)]
    table: String,
    #[arg(short, long)]
    output: PathBuf,
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Inspect { document } => inspect(&document),
        Command::Convert(args) => convert(args),
        Command::ImportCsv(args) => import_csv(args),
        Command::ExportCsv(args) => export_csv(args),
        Command::Adapters => {
            list_adapters();
            Ok(())
        }
    }
}

fn load(path: &Path) -> Result<TableTree> {
    JsonAdapter::open_path(path)
        .and_then(JsonAdapter::into_tree)
        .with_context(|| format!("failed to load {}", path.display()))
}

fn save(tree: &TableTree, path: &Path) -> Result<()> {
    JsonAdapter::from_tree(tree)
        .and_then(|adapter| adapter.save_to_path(path))
        .with_context(|| format!("failed to save {}", path.display()))
}

fn find(tree: &TableTree, path: &str) -> Result<TableId> {
    tree.find_path(path)
        .ok_or_else(|| anyhow!("no table at path `{path}`"))
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow!("delimiter must be a single ASCII character"))
}

fn inspect(document: &Path) -> Result<()> {
    let tree = load(document)?;
    for id in tree.walk_all() {
        let depth = tree.depth(id)?;
        let table = tree.get(id)?;
        let indent = "  ".repeat(depth);
        println!(
            "{indent}{} ({} rows, {} columns)",
            table.name(),
            table.row_count(),
            table.column_count()
        );
        if let Some(creation) = table.creation() {
            println!("{indent}  created by {} at {}", creation.command, creation.created.to_rfc3339());
        }
        for column in table.columns() {
            let mut line = format!("{indent}  - {}: {} [{}]", column.name, column.kind, column.subtype);
            if let Some(dir) = &column.link.base_dir {
                let next = table.link_policy().compose(
                    dir,
                    column.link_prefix(),
                    column.link.counter,
                    column.link.extension.as_deref(),
                );
                line.push_str(&format!(" next link {}", next.display()));
            }
            println!("{line}");
        }
    }
    Ok(())
}

fn convert(args: ConvertArgs) -> Result<()> {
    let mut tree = load(&args.document)?;
    let id = find(&tree, &args.table)?;
    let kind = ElementKind::parse(&args.kind)?;
    let subtype = match &args.subtype {
        Some(s) => Subtype::parse(s)?,
        None => kind.default_subtype(),
    };
    let table = tree.get_mut(id)?;
    let column = table.require_column(&args.column)?;
    table
        .convert_column(column, kind, subtype)
        .with_context(|| format!("cannot convert column `{}` to {kind}", args.column))?;
    tracing::info!(table = %args.table, column = %args.column, %kind, "converted column");
    save(&tree, args.output.as_deref().unwrap_or(&args.document))
}

fn import_csv(args: ImportArgs) -> Result<()> {
    let opts = CsvReadOptions {
        delimiter: delimiter_byte(args.delimiter)?,
        has_headers: !args.no_headers,
        type_inference: if args.no_infer {
            CsvTypeInference::Off
        } else {
            CsvTypeInference::Basic
        },
        ..CsvReadOptions::default()
    };
    let table = read_table_path(&args.csv, &opts)
        .with_context(|| format!("failed to read {}", args.csv.display()))?;
    let mut tree = if args.append && args.output.exists() {
        load(&args.output)?
    } else {
        TableTree::new()
    };
    let name = table.name().to_string();
    let rows = table.row_count();
    tree.insert_root(table);
    save(&tree, &args.output)?;
    println!("imported `{name}` ({rows} rows) into {}", args.output.display());
    Ok(())
}

fn export_csv(args: ExportArgs) -> Result<()> {
    let tree = load(&args.document)?;
    let table = tree.get(find(&tree, &args.table)?)?;
    if table.column_count() == 0 {
        bail!("table `{}` has no columns", args.table);
    }
    let opts = CsvWriteOptions {
        delimiter: delimiter_byte(args.delimiter)?,
        ..CsvWriteOptions::default()
    };
    write_table(table, SaveDestination::Path(&args.output), &opts)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    Ok(())
}

fn list_adapters() {
    let registry = global_snapshot();
    println!("readers:");
    for reader in registry.readers() {
        let info = reader.info();
        println!(
            "  {:<14} {:<10} {:<12} -> {}{}",
            info.name,
            info.kind.name(),
            info.subtypes.to_string(),
            info.processed,
            if info.hidden { " (hidden)" } else { "" }
        );
    }
    println!("writers:");
    for writer in registry.writers() {
        let info = writer.info();
        println!(
            "  {:<14} {:<10} {:<12} <- {}",
            info.name,
            info.kind.name(),
            info.subtype.as_str(),
            info.processed
        );
    }
}
