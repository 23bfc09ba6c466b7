use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use radial_snap::config::{
    DEFAULT_DOUBLE_TAP_MS, DEFAULT_INNER_RADIUS, DEFAULT_TRIGGER_DELAY_MS, GestureConfig,
    MenuSettings, SharedConfig,
};
use radial_snap::domain::{MenuStyle, SectorIndex, TriggerKey, WindowAction};
use radial_snap::logging;

/// Hold the middle mouse button for a radial window-layout menu; double-tap
/// the trigger key to toggle the informational panel.
#[derive(Debug, Parser)]
#[command(name = "radial-snap", version, about)]
struct Cli {
    /// Hold time before the radial menu opens
    #[arg(long, default_value_t = DEFAULT_TRIGGER_DELAY_MS)]
    trigger_delay_ms: u32,

    /// Longest gap between two taps of the trigger key (clamped to 120..=1200)
    #[arg(long, default_value_t = DEFAULT_DOUBLE_TAP_MS)]
    double_tap_ms: u32,

    /// Key whose double-tap toggles the panel, e.g. left-shift, ctrl, right-alt
    #[arg(long, default_value_t = TriggerKey::default())]
    target_key: TriggerKey,

    /// basic-radial, cs-headshot, spider-web or bagua
    #[arg(long, default_value_t = MenuStyle::default())]
    menu_style: MenuStyle,

    /// Outer radius in pixels; defaults to the style's own size
    #[arg(long)]
    outer_radius: Option<f64>,

    /// Inner dead-zone radius in pixels (basic-radial only)
    #[arg(long, default_value_t = DEFAULT_INNER_RADIUS)]
    inner_radius: f64,

    /// Override a sector, e.g. `--map 3=left-half` or `--map 4=none`
    #[arg(long = "map", value_name = "SECTOR=ACTION", value_parser = parse_slot)]
    mappings: Vec<(SectorIndex, Option<WindowAction>)>,

    /// Ignore the double-tap gesture
    #[arg(long)]
    no_panel: bool,

    /// Verbose logging; RUST_LOG is honoured
    #[arg(long)]
    debug: bool,

    /// Directory for the log file
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn parse_slot(value: &str) -> Result<(SectorIndex, Option<WindowAction>), String> {
    let (index, action) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SECTOR=ACTION, got `{value}`"))?;

    let sector = index
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(SectorIndex::new)
        .ok_or_else(|| format!("sector must be 0..=7, got `{index}`"))?;

    let action = match action.trim() {
        "none" => None,
        name => Some(name.parse::<WindowAction>().map_err(|err| err.to_string())?),
    };
    Ok((sector, action))
}

impl Cli {
    fn gesture_config(&self) -> GestureConfig {
        let mut menu = MenuSettings {
            style: self.menu_style,
            outer_radius: self
                .outer_radius
                .unwrap_or_else(|| self.menu_style.default_radius()),
            inner_radius: self.inner_radius,
            panel_enabled: !self.no_panel,
            ..MenuSettings::default()
        };
        for &(sector, action) in &self.mappings {
            menu.action_mapping.set(sector, action);
        }

        GestureConfig {
            trigger_delay_ms: self.trigger_delay_ms,
            double_tap_ms: self.double_tap_ms,
            target_key: self.target_key,
            menu,
        }
    }
}

#[cfg(windows)]
fn run(config: SharedConfig) -> ExitCode {
    match radial_snap::app::runtime::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "radial-snap stopped");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(windows))]
fn run(_config: SharedConfig) -> ExitCode {
    error!("radial-snap relies on Win32 global hooks and only runs on Windows");
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.clone().or_else(logging::default_log_dir);
    if let Some(path) = logging::init(cli.debug, log_dir.as_deref()) {
        info!(path = %path.display(), "Logging to file");
    }

    let config = cli.gesture_config();
    if let Err(err) = config.validate() {
        warn!(%err, "Menu radii adjusted");
    }
    let config = SharedConfig::new(config);
    info!(?config, "Starting radial-snap");

    run(config)
}
