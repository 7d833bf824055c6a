//! # Takeoff CLI
//!
//! Command-line front end over `takeoff_core`: create a project file,
//! import a CSV takeoff into it, price it, and browse the shape catalog.
//!
//! Logging goes to stderr and is controlled by `TAKEOFF_LOG` (an
//! `EnvFilter` directive, default `warn`) or `--verbose`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use takeoff_core::calculations::Pricer;
use takeoff_core::catalog::{builtin, builtin_common_shapes, normalize_designation, ShapeCatalog, ShapeFamily};
use takeoff_core::errors::{EstimateError, EstimateResult};
use takeoff_core::estimate::Estimate;
use takeoff_core::file_io::{load_company_settings, load_project_with_lock_check, save_project, PROJECT_EXTENSION};
use takeoff_core::import::import_csv;
use takeoff_core::line::LineStatus;
use takeoff_core::project::Project;
use takeoff_core::store::ProjectFileStore;

#[derive(Parser)]
#[command(name = "takeoff", version, about = "Structural steel takeoff and estimating")]
struct Cli {
    /// Company settings file (rates and markup shared across projects)
    #[arg(long, global = true, default_value = "company.json")]
    company: PathBuf,

    /// Extra AISC-style shape CSV merged over the built-in catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Who is writing, recorded in the project lock
    #[arg(long, global = true, env = "USER", default_value = "takeoff")]
    user: String,

    /// Debug logging (overrides TAKEOFF_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty project file
    New {
        path: PathBuf,
        #[arg(long, default_value = "")]
        estimator: String,
        #[arg(long, default_value = "")]
        job: String,
        #[arg(long, default_value = "")]
        client: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Append the rows of a takeoff CSV to a project
    Import { project: PathBuf, csv: PathBuf },
    /// Price a project and print its lines and totals
    Price {
        project: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        /// Write the freshly priced lines back to the project
        #[arg(long)]
        save: bool,
    },
    /// Search the shape catalog by designation prefix
    Shapes {
        pattern: Option<String>,
        /// Only this family (W, C, L, HSS, PIPE, ...)
        #[arg(long)]
        family: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("TAKEOFF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if cli.verbose {
                if let Ok(json) = serde_json::to_string_pretty(&e) {
                    eprintln!("{}", json);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> EstimateResult<()> {
    match &cli.command {
        Command::New {
            path,
            estimator,
            job,
            client,
            force,
        } => create_project(path, estimator, job, client, *force),
        Command::Import { project, csv } => import(cli, project, csv),
        Command::Price { project, json, save } => price(cli, project, *json, *save),
        Command::Shapes { pattern, family } => shapes(cli, pattern.as_deref(), family.as_deref()),
    }
}

fn create_project(path: &Path, estimator: &str, job: &str, client: &str, force: bool) -> EstimateResult<()> {
    let path = if path.extension().is_none() {
        path.with_extension(PROJECT_EXTENSION)
    } else {
        path.to_path_buf()
    };
    if path.exists() && !force {
        return Err(EstimateError::file_error(
            "create",
            path.display().to_string(),
            "File already exists (use --force to overwrite)",
        ));
    }
    save_project(&Project::new(estimator, job, client), &path)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Pricing context for a project: company file, the project's own settings,
/// and the catalog with any extra shapes. Warns when someone else holds the
/// project lock, since writes will be refused until they release it.
fn pricer_for(cli: &Cli, project: &Path) -> EstimateResult<Pricer> {
    let company = load_company_settings(&cli.company)?;
    let (loaded, holder) = load_project_with_lock_check(project)?;
    if let Some(holder) = holder.filter(|info| info.user_id != cli.user) {
        tracing::warn!(user = %holder.user_id, machine = %holder.machine, "project is locked by another user");
        eprintln!(
            "Warning: {} is locked by {} on {} since {}",
            project.display(),
            holder.user_id,
            holder.machine,
            holder.locked_at.format("%Y-%m-%d %H:%M")
        );
    }
    let pricer = Pricer::new(&company, &loaded.settings);

    Ok(match extended_catalog(cli)? {
        Some(catalog) => pricer.with_catalog(Arc::new(catalog)),
        None => pricer,
    })
}

/// The built-in catalog plus `--catalog`, or `None` when no file was given.
fn extended_catalog(cli: &Cli) -> EstimateResult<Option<ShapeCatalog>> {
    let Some(path) = &cli.catalog else {
        return Ok(None);
    };
    let mut catalog = builtin_common_shapes();
    let file = File::open(path).map_err(|e| EstimateError::file_error("open", path.display().to_string(), e.to_string()))?;
    let added = catalog.load_csv(file)?;
    tracing::info!(added, path = %path.display(), "catalog extended");
    Ok(Some(catalog))
}

fn import(cli: &Cli, project: &Path, csv: &Path) -> EstimateResult<()> {
    let pricer = pricer_for(cli, project)?;
    let store = ProjectFileStore::new(project, cli.user.as_str());
    let mut estimate = Estimate::open(store, pricer)?;

    let file = File::open(csv).map_err(|e| EstimateError::file_error("open", csv.display().to_string(), e.to_string()))?;
    let first = estimate.view().next_sequence();
    let report = import_csv(file, estimate.pricer(), first)?;

    for skipped in &report.skipped {
        eprintln!("  row {}: skipped ({})", skipped.row, skipped.reason);
    }
    let added = estimate.import_lines(report.lines)?;
    println!(
        "Imported {} line(s) into {} ({} skipped)",
        added,
        project.display(),
        report.skipped.len()
    );
    Ok(())
}

fn price(cli: &Cli, project: &Path, json: bool, save: bool) -> EstimateResult<()> {
    let pricer = pricer_for(cli, project)?;
    let store = ProjectFileStore::new(project, cli.user.as_str());
    let mut estimate = Estimate::open(store, pricer)?;

    if save {
        let report = estimate.persist_current()?;
        tracing::info!(updated = report.updated.len(), "priced lines written");
    }

    let summary = estimate.summary();
    if json {
        let out = serde_json::to_string_pretty(&summary).map_err(EstimateError::serialization)?;
        println!("{}", out);
        return Ok(());
    }

    println!("{:<28} {:>6} {:>10} {:>8} {:>12}", "Line", "Qty", "Weight", "Hours", "Total");
    let view = estimate.view();
    for line in view.display_order() {
        let void = if line.status == LineStatus::Void { " (void)" } else { "" };
        let missing = if line.derived.size_not_found { " ?" } else { "" };
        println!(
            "{:<28} {:>6} {:>10.1} {:>8.2} {:>12.2}",
            format!("{}{}{}", line.label(), missing, void),
            line.qty,
            line.derived.total_weight,
            line.derived.total_labor_hours,
            line.derived.cost.total_cost
        );
    }
    println!();
    println!(
        "{} active / {} void line(s)",
        summary.active_count, summary.void_count
    );
    println!("Weight:   {:.1} lb ({:.2} tons)", summary.total_weight, summary.total_tons());
    println!("Surface:  {:.1} sf", summary.total_surface_area);
    println!("Labor:    {:.2} hr", summary.total_labor_hours);
    println!("Material: {:.2}", summary.cost.material_with_waste);
    println!("Labor:    {:.2}", summary.cost.labor_with_waste);
    println!("Coating:  {:.2}", summary.cost.coating);
    println!("Hardware: {:.2}", summary.cost.hardware);
    println!("Total:    {:.2}", summary.grand_total());
    Ok(())
}

fn shapes(cli: &Cli, pattern: Option<&str>, family: Option<&str>) -> EstimateResult<()> {
    let extended = extended_catalog(cli)?;
    let catalog = extended.as_ref().unwrap_or_else(|| builtin());

    let mut shapes = match family {
        Some(code) => {
            if !ShapeFamily::ALL.iter().any(|f| f.code().eq_ignore_ascii_case(code.trim())) {
                return Err(EstimateError::invalid_input("family", code, "Unknown shape family"));
            }
            catalog.shapes_of_code(code)
        }
        None => catalog.search(pattern.unwrap_or("")),
    };
    if let (Some(_), Some(pattern)) = (family, pattern) {
        let prefix = normalize_designation(pattern);
        shapes.retain(|s| s.designation.starts_with(&prefix));
    }

    for shape in &shapes {
        println!(
            "{:<20} {:>8.2} lb/ft {:>7.3} sf/ft",
            shape.designation, shape.weight_per_ft, shape.surface_area_per_ft
        );
    }
    println!("{} shape(s)", shapes.len());
    Ok(())
}
