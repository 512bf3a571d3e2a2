use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, error::ErrorKind};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{aggregate_by_space, year_extent};
use crate::config::SourceManifest;
use crate::data::{CanonicalRecord, SourceKind};
use crate::export::write_export;
use crate::filter::FilterState;
use crate::ingestion::{IngestionManager, Snapshot, SourceStatus};
use crate::types::Year;
use crate::views::{ExplorerView, FisheriesView, StormView, with_predicate};

#[derive(Debug, Parser)]
#[command(
    name = "oceansense",
    disable_help_subcommand = true,
    about = "Summarize, correlate, and export fisheries, cyclone, and ocean feeds",
    long_about = "Load the file sources listed in a JSON manifest, normalize them onto shared year and coordinate keys, then report aggregates, correlations, clusters, or a flat CSV export.",
    after_help = "Filter values are case-insensitive; 'All' (or an empty value) disables a filter. The year range defaults to the extent of the loaded data."
)]
struct OceansenseCli {
    #[arg(long, value_name = "PATH", help = "JSON manifest listing file sources")]
    manifest: PathBuf,
    #[arg(long, help = "Emit JSON instead of text")]
    json: bool,
    #[command(flatten)]
    filter: FilterArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long, default_value = "All", help = "Species label to keep")]
    species: String,
    #[arg(long, default_value = "All", help = "Species category to keep")]
    category: String,
    #[arg(long, default_value = "All", help = "Cyclone season to keep")]
    season: String,
    #[arg(long = "year-min", help = "Inclusive lower year bound")]
    year_min: Option<Year>,
    #[arg(long = "year-max", help = "Inclusive upper year bound")]
    year_max: Option<Year>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Per-source status plus fisheries and cyclone summaries.
    Summary,
    /// Cyclone totals against fisheries occurrences per year.
    Correlate,
    /// Fisheries map clusters.
    Clusters {
        #[arg(long, help = "Decimal digits kept when rounding coordinates")]
        precision: Option<u32>,
        #[arg(long, help = "Maximum number of clusters")]
        cap: Option<usize>,
    },
    /// Flat CSV of the filtered records with a filter summary.
    Export {
        #[arg(long, value_name = "PATH", help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    filter: IndexMap<&'static str, String>,
    fisheries: &'a FisheriesView,
    storms: &'a StormView,
}

impl FilterArgs {
    fn resolve(&self, snapshot: &Snapshot) -> FilterState {
        let (data_min, data_max) =
            year_extent(&snapshot.records).unwrap_or_else(|| FilterState::all().year_range());
        FilterState::new(
            &self.species,
            &self.category,
            &self.season,
            (
                self.year_min.unwrap_or(data_min),
                self.year_max.unwrap_or(data_max),
            ),
        )
    }
}

/// Run the `oceansense` CLI, writing to stdout.
pub fn run_oceansense<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_oceansense_to(args_iter, &mut out)
}

/// Run the `oceansense` CLI, writing results to `out`.
pub fn run_oceansense_to<I, W>(args_iter: I, out: &mut W) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
    W: Write,
{
    let Some(cli) =
        parse_cli::<OceansenseCli, _>(std::iter::once("oceansense".to_string()).chain(args_iter))?
    else {
        return Ok(());
    };

    let manifest = SourceManifest::load(&cli.manifest)?;
    let registry = manifest.load_registry()?;
    let mut manager = IngestionManager::new();
    for source in manifest.build_sources() {
        manager.register_source(source);
    }
    let snapshot = manager.refresh_all();
    info!(
        version = snapshot.version,
        records = snapshot.records.len(),
        sources = snapshot.sources.len(),
        "snapshot loaded"
    );
    for report in snapshot.unavailable() {
        warn!(source_id = %report.source_id, "source unavailable");
    }

    let filter = cli.filter.resolve(&snapshot);
    let config = &manifest.config;

    match cli.command {
        Command::Summary => {
            let fisheries = FisheriesView::build(&snapshot, &filter, registry.as_ref(), config);
            let storms = StormView::build(&snapshot, &filter, config);
            if cli.json {
                let report = SummaryReport {
                    filter: filter.resolved_parameters().into_iter().collect(),
                    fisheries: &fisheries,
                    storms: &storms,
                };
                serde_json::to_writer_pretty(&mut *out, &report)?;
                writeln!(out)?;
            } else {
                print_summary(out, &snapshot, &filter, &fisheries, &storms)?;
            }
        }
        Command::Correlate => {
            let view = ExplorerView::build(&snapshot, &filter, registry.as_ref(), config);
            if cli.json {
                serde_json::to_writer_pretty(&mut *out, &view)?;
                writeln!(out)?;
            } else {
                writeln!(out, "year,cyclones,fisheries")?;
                for sample in &view.scatter {
                    writeln!(out, "{},{},{}", sample.year, sample.x, sample.y)?;
                }
                writeln!(
                    out,
                    "samples: {}, pearson r: {}",
                    view.summary.count,
                    format_r(view.summary.r)
                )?;
            }
        }
        Command::Clusters { precision, cap } => {
            let mut options = config.cluster_options();
            if let Some(precision) = precision {
                options = options.with_precision(precision);
            }
            if let Some(cap) = cap {
                options = options.with_cap(cap);
            }
            let fisheries = snapshot.records_of(SourceKind::Fisheries);
            let clusters = with_predicate(&filter, registry.as_ref(), |predicate| {
                aggregate_by_space(fisheries.iter().copied(), predicate, options)
            });
            if cli.json {
                serde_json::to_writer_pretty(&mut *out, &clusters)?;
                writeln!(out)?;
            } else {
                writeln!(out, "latitude,longitude,count,labels")?;
                for cluster in &clusters {
                    let labels: Vec<&str> = cluster.labels.iter().map(String::as_str).collect();
                    writeln!(
                        out,
                        "{},{},{},{}",
                        cluster.lat,
                        cluster.lon,
                        cluster.count,
                        labels.join(";")
                    )?;
                }
            }
        }
        Command::Export { output } => {
            let records: Vec<&CanonicalRecord> =
                with_predicate(&filter, registry.as_ref(), |predicate| {
                    snapshot
                        .records
                        .iter()
                        .filter(|record| predicate.matches(record))
                        .collect()
                });
            match output {
                Some(path) => {
                    let file = fs::File::create(&path)?;
                    write_export(io::BufWriter::new(file), records, &filter)?;
                    info!(path = %path.display(), "export written");
                }
                None => write_export(&mut *out, records, &filter)?,
            }
        }
    }
    Ok(())
}

fn format_r(r: f64) -> String {
    if r.is_nan() {
        "n/a".to_string()
    } else {
        format!("{r:.4}")
    }
}

fn print_summary<W: Write>(
    out: &mut W,
    snapshot: &Snapshot,
    filter: &FilterState,
    fisheries: &FisheriesView,
    storms: &StormView,
) -> io::Result<()> {
    writeln!(out, "=== oceansense summary ===")?;
    for (name, value) in filter.resolved_parameters() {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;

    writeln!(out, "[SOURCES]")?;
    for report in &snapshot.sources {
        match &report.status {
            SourceStatus::Available => writeln!(
                out,
                "  {} ({}) => records: {}, dropped: {}, malformed: {}",
                report.source_id, report.kind, report.record_count, report.dropped, report.malformed
            )?,
            SourceStatus::Unavailable { reason } => writeln!(
                out,
                "  {} ({}) => unavailable: {reason}",
                report.source_id, report.kind
            )?,
            SourceStatus::Pending => {
                writeln!(out, "  {} ({}) => pending", report.source_id, report.kind)?
            }
        }
    }
    writeln!(out)?;

    writeln!(out, "[FISHERIES]")?;
    writeln!(out, "  records: {}", fisheries.record_count)?;
    writeln!(out, "  years: {}", fisheries.by_year.len())?;
    writeln!(out, "  clusters: {}", fisheries.clusters.len())?;
    for (label, count) in &fisheries.top_species {
        writeln!(out, "  {label}: {count}")?;
    }
    writeln!(out)?;

    writeln!(out, "[CYCLONES]")?;
    writeln!(out, "  seasons: {}", storms.seasons.join(", "))?;
    let total: f64 = storms.totals_by_year.iter().map(|point| point.total).sum();
    writeln!(out, "  years: {}", storms.totals_by_year.len())?;
    writeln!(out, "  total: {total}")?;
    Ok(())
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
