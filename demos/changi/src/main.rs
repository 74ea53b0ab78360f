//! changi: policy comparison on the Changi mechanised carpark.
//!
//! Runs one morning of arrivals through every placement policy and prints
//! wait/service means and level occupancy for each.
//!
//! ```text
//! changi [layout.json] [arrivals.csv]
//! ```
//!
//! `layout.json` is a serialized `CarparkConfig` used for every policy; the
//! built-in presets are used without it (`changi_cache` for the Cache
//! policy).  `arrivals.csv` needs a `car_arrival_rate` column with one row per
//! minute; without it a constant rate is used.  Per-policy CSVs land in
//! `output/changi/<policy>/`.  Set `RUST_LOG=debug` for per-stage traces.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use mc_carpark::Policy;
use mc_core::CarparkConfig;
use mc_output::{CsvWriter, StatsCollector, write_stats};
use mc_sim::{ArrivalSchedule, Scenario, SimConfig, StaySampler, compare};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:             u64   = 12_345;
const ARRIVALS_PER_MIN: u32   = 1;
const ARRIVAL_MINUTES:  usize = 180; // 07:00 to 10:00
const MEAN_STAY_MIN:    f64   = 100.0;
const OUTPUT_DIR:       &str  = "output/changi";

fn load_layout(path: &Path) -> Result<CarparkConfig> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let layout: CarparkConfig = serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(layout)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let layout_path = args.next();
    let arrivals_path = args.next();

    // 1. Layouts.
    let (layout, cache_layout) = match &layout_path {
        Some(path) => (load_layout(path)?, None),
        None => (CarparkConfig::changi(), Some(CarparkConfig::changi_cache())),
    };

    // 2. Arrivals.
    let arrivals = match &arrivals_path {
        Some(path) => ArrivalSchedule::from_csv_path(path)
            .with_context(|| format!("loading arrivals from {}", path.display()))?,
        None => ArrivalSchedule::constant(ARRIVALS_PER_MIN, ARRIVAL_MINUTES),
    };

    let scenario = Scenario {
        sim: SimConfig { seed: SEED, ..SimConfig::default() },
        layout,
        cache_layout,
        arrivals,
        stay: StaySampler::Exponential { mean_min: MEAN_STAY_MIN },
    };

    println!("=== changi: mechanised carpark policy comparison ===");
    println!(
        "Levels: {}  |  Slots: {}  |  Lifts: {}  |  Vehicles: {}  |  Seed: {SEED}",
        scenario.layout.levels,
        scenario.layout.total_slots(),
        scenario.layout.lift_positions.len(),
        scenario.arrivals.total(),
    );
    println!();

    // 3. Run every policy.
    let t0 = Instant::now();
    let runs = compare(&scenario, &Policy::ALL, |_| StatsCollector::new());
    let elapsed = t0.elapsed();

    // 4. Report and write CSVs.
    for run in runs {
        println!("── {} ──", run.policy);
        let (summary, stats) = match run.result {
            Ok(done) => done,
            Err(e) => {
                tracing::error!(policy = %run.policy, error = %e, "run failed");
                println!();
                continue;
            }
        };
        println!("finished at {:.1} min", summary.finished_at.as_minutes());
        println!("{}", stats.report());

        let dir = Path::new(OUTPUT_DIR).join(run.policy.name());
        let mut writer = CsvWriter::new(&dir)?;
        if let Err(e) = write_stats(&mut writer, &stats) {
            tracing::warn!(dir = %dir.display(), error = %e, "output error");
        }
        println!();
    }

    println!("All policies complete in {:.3} s", elapsed.as_secs_f64());
    Ok(())
}
