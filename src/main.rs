//! Factory Twin entry point
//!
//! The browser build is driven from JavaScript through `platform::web`.
//! Natively this runs the line headless at a fixed frame rate and reports
//! counters, KPIs and telemetry through the log.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use anyhow::Context;
    use clap::Parser;

    use factory_twin::platform;
    use factory_twin::renderer::ConveyorView;
    use factory_twin::sim::{ConveyorStatus, FactoryState};
    use factory_twin::telemetry::{JsonLinesSink, LogSink, TelemetrySink, TelemetrySync};
    use factory_twin::Settings;

    /// Seconds of simulated time between progress reports
    const REPORT_INTERVAL_SECS: f64 = 10.0;

    #[derive(Parser)]
    #[command(name = "factory-twin")]
    #[command(about = "Run the tile factory line headless")]
    #[command(version)]
    struct Args {
        /// Settings JSON file (defaults used when omitted)
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Simulated seconds to run
        #[arg(long, default_value_t = 60.0)]
        seconds: f64,

        /// Frames per simulated second
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Override the starting speed multiplier
        #[arg(long)]
        speed: Option<f64>,

        /// Override the RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Jam the conveyor after this many seconds
        #[arg(long)]
        jam_at: Option<f64>,

        /// Emit telemetry as JSON lines on stdout instead of the log
        #[arg(long)]
        json: bool,

        /// Print the final snapshot as JSON
        #[arg(long)]
        snapshot: bool,

        /// Write the effective settings to this file and exit
        #[arg(long)]
        write_settings: Option<PathBuf>,
    }

    pub fn run() -> anyhow::Result<()> {
        platform::init_logging();
        let args = Args::parse();

        let mut settings = match &args.settings {
            Some(path) => Settings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };
        if let Some(speed) = args.speed {
            settings.speed_multiplier = speed;
        }
        if let Some(seed) = args.seed {
            settings.seed = seed;
        }
        settings.validate().context("invalid settings")?;

        if let Some(path) = &args.write_settings {
            settings.save(path)?;
            return Ok(());
        }

        anyhow::ensure!(args.fps > 0.0, "fps must be positive");
        anyhow::ensure!(args.seconds >= 0.0, "seconds must not be negative");

        log::info!("Factory twin (native) starting with seed: {}", settings.seed);

        let mut state = FactoryState::new(&settings)?;
        let mut view = ConveyorView::default();
        let mut telemetry = TelemetrySync::new(settings.telemetry_interval_secs)?;
        let mut sink: Box<dyn TelemetrySink> = if args.json {
            Box::new(JsonLinesSink::new(std::io::stdout()))
        } else {
            Box::new(LogSink)
        };

        let dt = 1.0 / args.fps;
        let frames = (args.seconds * args.fps).round() as u64;
        let jam_frame = args.jam_at.map(|s| (s * args.fps).round() as u64);
        let report_every = ((REPORT_INTERVAL_SECS * args.fps).round() as u64).max(1);

        state.start();
        let mut ticks = 0u64;
        for frame in 1..=frames {
            if jam_frame == Some(frame) {
                state.set_status(ConveyorStatus::Jammed);
            }

            ticks += state.frame(dt).ticks as u64;
            let render = view.frame(dt, &state);
            telemetry.poll(dt, &state, sink.as_mut());

            if frame % report_every == 0 {
                log::info!(
                    "t={:.0}s S_clk={} P_clk={} on belt={} shipped={} wasted={} status={}",
                    frame as f64 * dt,
                    state.clock().logical_tick_count(),
                    state.clock().production_tick_count(),
                    render.tiles.len(),
                    state.shipment_count(),
                    state.waste_count(),
                    state.status().as_str(),
                );
            }
        }

        let snapshot = state.snapshot();
        log::info!(
            "Finished {} frames ({} logical ticks): shipped={} wasted={} telemetry sent={} failed={}",
            frames,
            ticks,
            snapshot.shipment_count,
            snapshot.waste_count,
            telemetry.sent_batches(),
            telemetry.failed_batches(),
        );
        for kpi in &snapshot.kpis {
            let trend = kpi.trend.map(|t| t.label()).unwrap_or_default();
            log::info!("  {:<6} {:>7.1} {} {}", kpi.id.as_str(), kpi.value, kpi.unit, trend);
        }

        if args.snapshot {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    headless::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}
