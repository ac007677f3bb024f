use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, eyre, WrapErr};
use color_eyre::Result;
use qol_core::{
    load_dashboard_config_from_env, render_choropleth_svg, render_drivers_svg, resolve_data_dir,
    Binning, ColorMode, Comparison, DashboardConfig, DataBundle, DriversDiagram,
    IndicatorCatalog, IndicatorDefinition, InterventionState, MapSize, MapView, Overlays,
    RenderCapabilities, ScenarioRun, SortOrder,
};
use tracing::{info, warn};

mod app;
mod report;
mod ui;

use app::SandboxApp;
use report::{render_catalog, render_comparison, render_scenario, ChartStyle};

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Ede-Veldhuizen quality-of-life dashboard", long_about = None)]
struct Cli {
    /// Directory holding the catalog CSV and GeoJSON layers.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Dashboard configuration JSON; overrides `QOL_DASHBOARD_CONFIG_PATH`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List dimensions and their variables.
    Catalog,
    /// Neighbourhood bar chart against the municipal reference.
    Dashboard {
        #[command(flatten)]
        selection: Selection,
        #[arg(long, default_value_t = SortOrder::Descending)]
        sort: SortOrder,
        /// Hide value labels next to the bars.
        #[arg(long)]
        no_labels: bool,
    },
    /// Write the choropleth map as SVG.
    Map {
        #[command(flatten)]
        selection: Selection,
        #[arg(long, value_enum, default_value_t = ModeArg::Continuous)]
        mode: ModeArg,
        #[arg(long, value_enum, default_value_t = BinningArg::EqualInterval)]
        binning: BinningArg,
        /// Number of classes in discrete mode; clamped to the configured range.
        #[arg(long)]
        classes: Option<usize>,
        #[arg(long, value_enum, default_value_t = SizeArg::Normal)]
        size: SizeArg,
        /// Leave out district and boundary outlines.
        #[arg(long)]
        no_overlays: bool,
        #[arg(long)]
        out: PathBuf,
    },
    /// Write the drivers diagram as SVG.
    Drivers {
        #[arg(long)]
        out: PathBuf,
    },
    /// Evaluate the bench intervention once.
    Scenario {
        /// Benches added (positive) or removed (negative).
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        benches: i32,
        #[arg(long)]
        json: bool,
    },
    /// Interactive scenario sandbox and dashboard browser.
    Sandbox,
}

#[derive(clap::Args, Debug)]
struct Selection {
    /// Catalog dimension; defaults to the first one.
    #[arg(long)]
    dimension: Option<String>,
    /// Variable label within the dimension; defaults to the first one.
    #[arg(long)]
    variable: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Continuous,
    Discrete,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BinningArg {
    EqualInterval,
    Quantile,
}

impl From<BinningArg> for Binning {
    fn from(value: BinningArg) -> Self {
        match value {
            BinningArg::EqualInterval => Binning::EqualInterval,
            BinningArg::Quantile => Binning::Quantile,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SizeArg {
    HalfPage,
    Normal,
    FullPage,
}

impl From<SizeArg> for MapSize {
    fn from(value: SizeArg) -> Self {
        match value {
            SizeArg::HalfPage => MapSize::HalfPage,
            SizeArg::Normal => MapSize::Normal,
            SizeArg::FullPage => MapSize::FullPage,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let (log_tx, log_rx) = mpsc::channel::<String>();
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    if matches!(cli.command, Command::Sandbox) {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_ansi(false)
            .with_writer(move || ChannelWriter {
                sender: log_tx.clone(),
            })
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }

    let config = load_config(cli.config.as_deref())?;
    let capabilities = RenderCapabilities::resolve(config.render(), std::io::stdout().is_terminal());
    let data_dir = resolve_data_dir(cli.data_dir);

    match cli.command {
        Command::Catalog => {
            let bundle = load_bundle(&data_dir, &config)?;
            print!("{}", render_catalog(&bundle.catalog));
        }
        Command::Dashboard {
            selection,
            sort,
            no_labels,
        } => {
            let bundle = load_bundle(&data_dir, &config)?;
            let definition = select_definition(&bundle.catalog, &selection)?;
            let comparison = Comparison::build(
                &bundle.neighbourhoods,
                bundle.municipal_reference(&definition.column_key),
                &definition,
                config.groups(),
                sort,
                config.chart().headroom(),
            )?;
            let style = ChartStyle {
                groups: config.groups(),
                reference_label: config.reference_label(),
                bar_width: config.chart().bar_width(),
                show_labels: !no_labels,
                color: capabilities.contains(RenderCapabilities::COLOR),
            };
            print!("{}", render_comparison(&comparison, &style));
        }
        Command::Map {
            selection,
            mode,
            binning,
            classes,
            size,
            no_overlays,
            out,
        } => {
            require(capabilities, RenderCapabilities::SVG_EXPORT, "svg export")?;
            let bundle = load_bundle(&data_dir, &config)?;
            let definition = select_definition(&bundle.catalog, &selection)?;
            let map = config.map();
            let mode = match mode {
                ModeArg::Continuous => ColorMode::Continuous,
                ModeArg::Discrete => ColorMode::Discrete {
                    classes: classes.unwrap_or_else(|| map.default_classes()),
                    binning: binning.into(),
                },
            };
            let overlays = if no_overlays {
                Overlays {
                    districts: false,
                    municipality_outline: true,
                    boundary: false,
                }
            } else {
                Overlays::default()
            };
            let view = MapView::build(&bundle, &definition, mode, map);
            let svg = render_choropleth_svg(&view, &bundle, map, size.into(), overlays);
            write_output(&out, &svg)?;
        }
        Command::Drivers { out } => {
            require(capabilities, RenderCapabilities::SVG_EXPORT, "svg export")?;
            write_output(&out, &render_drivers_svg(&DriversDiagram::builtin()))?;
        }
        Command::Scenario { benches, json } => {
            let run = ScenarioRun::evaluate(InterventionState::new(benches));
            if json {
                println!("{}", serde_json::to_string_pretty(&run)?);
            } else {
                print!("{}", render_scenario(&run));
            }
        }
        Command::Sandbox => {
            require(capabilities, RenderCapabilities::INTERACTIVE, "interactive terminal")?;
            let bundle = match load_bundle(&data_dir, &config) {
                Ok(bundle) => Some(bundle),
                Err(err) => {
                    warn!(target: "qol::data", error = %err, "sandbox.data_unavailable");
                    None
                }
            };
            SandboxApp::new(bundle, config, log_rx)?.run()?;
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Arc<DashboardConfig>> {
    match explicit {
        Some(path) => {
            let config = DashboardConfig::from_file(path)?;
            info!(target: "qol::config", path = %path.display(), "dashboard_config.loaded=flag");
            Ok(Arc::new(config))
        }
        None => Ok(load_dashboard_config_from_env().0),
    }
}

fn load_bundle(data_dir: &Path, config: &DashboardConfig) -> Result<DataBundle> {
    DataBundle::load(data_dir, config.data())
        .wrap_err_with(|| format!("loading dashboard data from {}", data_dir.display()))
}

fn select_definition(
    catalog: &IndicatorCatalog,
    selection: &Selection,
) -> Result<IndicatorDefinition> {
    let dimension = match selection.dimension.as_deref() {
        Some(dimension) => dimension.to_string(),
        None => catalog
            .first()
            .map(|definition| definition.dimension.clone())
            .ok_or_else(|| eyre!("indicator catalog is empty"))?,
    };
    let labels = catalog.labels_for(&dimension);
    if labels.is_empty() {
        bail!(
            "unknown dimension {dimension:?}; available: {}",
            catalog.dimensions().join(", ")
        );
    }
    let label = selection.variable.as_deref().unwrap_or(labels[0]);
    catalog
        .lookup(&dimension, label)
        .cloned()
        .ok_or_else(|| eyre!("unknown variable {label:?} in {dimension}; available: {}", labels.join(", ")))
}

fn require(capabilities: RenderCapabilities, needed: RenderCapabilities, what: &str) -> Result<()> {
    if capabilities.contains(needed) {
        Ok(())
    } else {
        Err(eyre!("{what} is not available (capabilities: {capabilities:?})"))
    }
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).wrap_err_with(|| format!("writing {}", path.display()))?;
    info!(target: "qol::data", path = %path.display(), bytes = contents.len(), "svg.written");
    Ok(())
}
