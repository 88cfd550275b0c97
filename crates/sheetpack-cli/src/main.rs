//! sheetpack CLI - inspect and patch spreadsheet packages

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sheetpack::prelude::*;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetpack")]
#[command(
    author,
    version,
    about = "Spreadsheet package inspection and patching tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the parts of a package with their sizes
    Parts {
        /// Input package
        input: PathBuf,
    },

    /// Show application and core document properties
    Props {
        /// Input package
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change application properties and save
    SetApp {
        /// Input package
        input: PathBuf,

        /// Output package (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        application: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        app_version: Option<String>,

        #[arg(long)]
        doc_security: Option<i32>,
    },

    /// Stream the rows of a sheet as delimited text
    Rows {
        /// Input package
        input: PathBuf,

        /// Sheet name (default: first sheet)
        #[arg(short, long)]
        sheet: Option<String>,

        /// Stop after this many rows
        #[arg(short, long)]
        limit: Option<usize>,

        /// Field delimiter (default: tab)
        #[arg(short, long, default_value = "\t")]
        delimiter: char,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parts { input } => list_parts(&input),
        Commands::Props { input, json } => show_props(&input, json),
        Commands::SetApp {
            input,
            output,
            application,
            company,
            app_version,
            doc_security,
        } => set_app(&input, output.as_deref(), |props| {
            if let Some(v) = application {
                props.application = v;
            }
            if let Some(v) = company {
                props.company = v;
            }
            if let Some(v) = app_version {
                props.app_version = v;
            }
            if let Some(v) = doc_security {
                props.doc_security = v;
            }
        }),
        Commands::Rows {
            input,
            sheet,
            limit,
            delimiter,
        } => dump_rows(&input, sheet.as_deref(), limit, delimiter),
    }
}

fn open(input: &Path) -> Result<Package> {
    Package::open(input).with_context(|| format!("Failed to open '{}'", input.display()))
}

fn list_parts(input: &Path) -> Result<()> {
    let package = open(input)?;
    for path in package.paths() {
        let size = package.get(&path).map(|raw| raw.len()).unwrap_or_default();
        println!("{:>10}  {}", size, path);
    }
    Ok(())
}

fn show_props(input: &Path, json: bool) -> Result<()> {
    let package = open(input)?;
    let app = package.app_props().context("Failed to read application properties")?;
    let core = package.doc_props().context("Failed to read core properties")?;

    if json {
        let value = serde_json::json!({ "app": app, "core": core });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("File: {}", input.display());
    println!("Application: {}", app.application);
    println!("AppVersion: {}", app.app_version);
    println!("Company: {}", app.company);
    println!("DocSecurity: {}", app.doc_security);
    println!("Title: {}", core.title);
    println!("Creator: {}", core.creator);
    println!("LastModifiedBy: {}", core.last_modified_by);
    println!("Created: {}", core.created);
    println!("Modified: {}", core.modified);
    Ok(())
}

fn set_app(
    input: &Path,
    output: Option<&Path>,
    update: impl FnOnce(&mut AppProperties),
) -> Result<()> {
    let package = open(input)?;
    let mut props = package
        .app_props()
        .context("Failed to read application properties")?;
    update(&mut props);
    package.set_app_props(&props)?;

    match output {
        Some(out) => package
            .save_as(out)
            .with_context(|| format!("Failed to write '{}'", out.display()))?,
        None => package
            .save()
            .with_context(|| format!("Failed to write '{}'", input.display()))?,
    }
    eprintln!(
        "Updated application properties in '{}'",
        output.unwrap_or(input).display()
    );
    Ok(())
}

fn dump_rows(input: &Path, sheet: Option<&str>, limit: Option<usize>, delimiter: char) -> Result<()> {
    let package = open(input)?;
    let sheet = match sheet {
        Some(name) => name.to_string(),
        None => package
            .sheet_names()?
            .into_iter()
            .next()
            .context("Workbook has no sheets")?,
    };

    let reader = package
        .stream_reader(&sheet)
        .with_context(|| format!("Failed to read sheet '{}'", sheet))?;
    let mut out = BufWriter::new(io::stdout().lock());
    let mut count = 0usize;

    for row in reader.take(limit.unwrap_or(usize::MAX)) {
        let row = row.with_context(|| format!("Failed to read sheet '{}'", sheet))?;
        let mut line = String::new();
        let mut col = 1;
        for cell in &row.cells {
            // Pad gaps so columns line up
            while col < cell.col {
                line.push(delimiter);
                col += 1;
            }
            line.push_str(&field(&cell.value, delimiter));
            col = cell.col;
        }
        writeln!(out, "{}", line)?;
        count += 1;
    }
    out.flush()?;
    eprintln!("{} rows from '{}'", count, sheet);
    Ok(())
}

/// Render a cell value as a delimited field
fn field(value: &CellValue, delimiter: char) -> String {
    let text = match value {
        CellValue::Empty => String::new(),
        CellValue::Number(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        CellValue::SharedString(SharedString::Item(item)) => item.text.clone(),
        CellValue::SharedString(SharedString::Index(i)) => format!("#{}", i),
        CellValue::InlineString(s) => s.clone(),
        CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        CellValue::Error(e) => e.as_str().to_string(),
        CellValue::Formula(f) => {
            return match &f.cached {
                Some(v) => field(v, delimiter),
                None => format!("={}", f.expr),
            }
        }
    };

    if text.contains(delimiter) || text.contains('"') || text.contains('\n') || text.contains('\r')
    {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text
    }
}
