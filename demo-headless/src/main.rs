//! Headless demo: run the firn model over an idealized glacier transect
//! with the built-in synthetic weather, printing seasonal summaries.

use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use tracing::info;

use firn_sim_core::forcing::synthetic::SyntheticWeather;
use firn_sim_core::{
    CompactionScheme, Grid, GridPoint, LayerScheme, Model, ModelConfig, PercolationScheme,
};

/// Firn model demo with configurable parameters
#[derive(Parser, Debug)]
#[command(name = "firn-sim-demo")]
#[command(about = "Glacier surface energy-balance and firn model demo", long_about = None)]
struct Args {
    /// Number of grid points along the transect
    #[arg(short, long, default_value_t = 16)]
    points: usize,

    /// Simulated duration in days
    #[arg(short, long, default_value_t = 365.0)]
    days: f64,

    /// Timestep in days
    #[arg(short, long, default_value_t = 0.125)]
    timestep: f64,

    /// Lowest transect elevation in m
    #[arg(long, default_value_t = 200.0)]
    elevation_min: f64,

    /// Highest transect elevation in m
    #[arg(long, default_value_t = 1400.0)]
    elevation_max: f64,

    /// Water percolation scheme (bucket, normal, linear, uniform)
    #[arg(long, default_value = "normal")]
    percolation: String,

    /// Compaction scheme (firn_only, firn+snow)
    #[arg(long, default_value = "firn+snow")]
    compaction: String,

    /// Seed of the synthetic weather generator
    #[arg(long, default_value_t = 1979)]
    seed: u64,

    /// Write a restart snapshot here at the end of the run
    #[arg(long)]
    snapshot: Option<std::path::PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let percolation: PercolationScheme = args.percolation.parse()?;
    let compaction: CompactionScheme = args.compaction.parse()?;

    let points: Vec<GridPoint> = (0..args.points)
        .map(|i| {
            let frac = i as f64 / (args.points.max(2) - 1) as f64;
            let elevation =
                args.elevation_min + frac * (args.elevation_max - args.elevation_min);
            GridPoint::flat(78.0, 16.0, elevation)
        })
        .collect();
    let layers = LayerScheme::new(50, 0.1, vec![15, 25, 35], true)?;
    let grid = Grid::new(points, layers, None)?;

    let config = ModelConfig {
        timestep_days: args.timestep,
        utc_offset_hours: 1.0,
        percolation,
        compaction,
        ..ModelConfig::default()
    };

    let start: DateTime<Utc> = Utc.with_ymd_and_hms(1979, 1, 1, 0, 0, 0).unwrap();
    let mut model = Model::cold_start(grid, config, start)?;
    let mut weather = SyntheticWeather::new(args.seed);

    let steps = (args.days / args.timestep).round() as usize;
    let step_seconds = (args.timestep * 86400.0) as i64;
    info!(points = args.points, steps, "starting run");

    let mut date = start;
    let mut melt_sum = 0.0;
    let mut runoff_sum = 0.0;
    let mut refreeze_sum = 0.0;
    let mut last_diags = Vec::new();
    for step in 0..steps {
        let mut forcing = weather.generate(model.grid(), date, args.timestep);
        let diags = model.step(&mut forcing, date)?;

        let n = diags.len() as f64;
        melt_sum += diags.iter().map(|d| d.melt).sum::<f64>() / n;
        runoff_sum += diags.iter().map(|d| d.runoff).sum::<f64>() / n;
        refreeze_sum += diags.iter().map(|d| d.refreeze).sum::<f64>() / n;

        // Report roughly monthly.
        let steps_per_month = ((30.0 / args.timestep) as usize).max(1);
        if step % steps_per_month == 0 {
            let smb_mean: f64 =
                diags.iter().map(|d| d.smb).sum::<f64>() / n;
            let tsurf_mean: f64 = diags.iter().map(|d| d.tsurf).sum::<f64>() / n;
            info!(
                %date,
                tsurf_mean = format!("{tsurf_mean:.2}"),
                smb_mwe = format!("{smb_mean:.5}"),
                "monthly state"
            );
        }

        last_diags = diags;
        date += Duration::seconds(step_seconds);
    }

    let coupling = model.coupling_fields(&last_diags);
    println!("Run complete: {} steps over {} points", steps, args.points);
    println!("  mean cumulative melt      {melt_sum:.4} m w.e.");
    println!("  mean cumulative runoff    {runoff_sum:.4} m w.e.");
    println!("  mean cumulative refreeze  {refreeze_sum:.4} m w.e.");
    println!(
        "  surface height change     {:+.4} .. {:+.4} m",
        coupling
            .surface_height
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min),
        coupling
            .surface_height
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max)
    );

    if let Some(path) = args.snapshot {
        firn_sim_core::snapshot::save(&path, model.state())?;
        info!(path = %path.display(), "snapshot written");
    }

    Ok(())
}
