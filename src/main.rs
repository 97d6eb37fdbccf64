use clap::{Parser, Subcommand};
use gridplot::{
    chart::{self, Chart, Screen, SvgRenderer},
    Error, HouseholdId, Mode, PolicyId, RunContext, RunId, Store,
};
use rand::{rngs::ThreadRng, Rng};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Interval between two simulation ticks
const TICK_MS: i64 = 15 * 60 * 1_000;

/// Policies of a seeded run: (name, version)
const SEED_POLICIES: [(&str, &str); 3] = [("greedy", "1"), ("thrifty", "2"), ("scheduled", "1")];

#[derive(Parser, Debug)]
#[command(name = "gridplot", version, about = "Charts for smart-grid simulation runs")]
struct Cli {
    /// Simulation results database
    #[arg(long, env = "GRIDPLOT_DB")]
    db: PathBuf,

    /// Directory the SVG charts are written to
    #[arg(long, default_value = "charts")]
    out: PathBuf,

    /// Screen the chart windows are laid out on, e.g. 1920x1080
    #[arg(long, default_value = "1920x1080")]
    screen: Screen,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Average demand and appliances of every policy of a run
    Average {
        /// Run to plot
        #[arg(long)]
        run: RunId,
    },

    /// Demand and appliances of a single policy
    Policy {
        /// Run to plot
        #[arg(long)]
        run: RunId,

        /// Policy to plot
        #[arg(long)]
        policy: PolicyId,

        /// Average all households of the policy, or pick one at random
        #[arg(long, default_value_t = Mode::Average)]
        mode: Mode,
    },

    /// Supply, demand and price of a run
    SupplyDemand {
        /// Run to plot
        #[arg(long)]
        run: RunId,
    },

    /// Writes a synthetic run into the database
    Seed {
        /// Id of the new run
        #[arg(long)]
        run: RunId,

        /// Number of households
        #[arg(long, default_value_t = 12)]
        households: u32,

        /// Number of ticks
        #[arg(long, default_value_t = 96)]
        ticks: u32,
    },
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn seed(store: &Store, run: RunId, households: u32, ticks: u32) -> gridplot::Result<()> {
    let mut rng = rand::thread_rng();
    let start = gridplot::timestamp();

    store.batch(|store| {
        store.insert_run(run, start)?;

        let mut policies = Vec::with_capacity(SEED_POLICIES.len());
        for (idx, (name, version)) in (1..).zip(SEED_POLICIES) {
            let id: PolicyId = run * 100 + idx;

            match store.policy_info(id) {
                Ok(_) => {}
                Err(Error::UnknownPolicy(_)) => store.insert_policy(id, name, version)?,
                Err(e) => return Err(e),
            }
            policies.push(id);
        }

        let household_ids = (0..households)
            .map(|idx| run * 10_000 + HouseholdId::from(idx))
            .collect::<Vec<_>>();

        for (idx, household) in household_ids.iter().enumerate() {
            let policy = policies
                .get(idx % policies.len())
                .copied()
                .unwrap_or_default();
            store.assign_household(run, *household, policy)?;
        }

        for t in 0..ticks {
            let tick = start + i64::from(t) * TICK_MS;

            // a rough day curve: low at night, peak in the evening
            let daytime = f64::from(t % 96) / 96.0;
            let load = 1.0 + (daytime * std::f64::consts::TAU).sin().abs() * 2.0;

            let mut overall = 0.0;

            for household in &household_ids {
                let appliances_on = rng.gen_range(0..=(load * 4.0) as u32);
                let demand = f64::from(appliances_on) * rng.gen_range(0.2..0.8);
                overall += demand;

                store.log_household(run, *household, tick, demand, appliances_on)?;
            }

            let supply = (overall * rng.gen_range(0.9..1.2)).max(1.0);
            let price = 0.1 + 0.2 * (overall / supply) + rng.gen_range(0.0..0.02);

            store.log_aggregator(run, tick, supply, overall, price)?;

            if t > 0 && t % 1_000 == 0 {
                log::debug!("seeded {t} ticks");
            }
        }

        Ok(())
    })?;

    log::info!(
        "Seeded run {run}: {households} households, {ticks} ticks, {} policies",
        SEED_POLICIES.len()
    );

    Ok(())
}

/// Opens the store read-only, builds the charts of one run and writes them.
fn render<F>(cli: &Cli, run: RunId, build: F) -> gridplot::Result<()>
where
    F: FnOnce(&Store, RunContext, &mut ThreadRng) -> gridplot::Result<Vec<Chart>>,
{
    let store = Store::builder().read_only(true).open(&cli.db)?;
    let ctx = RunContext::load(&store, run)?;

    let start = Instant::now();
    let charts = build(&store, ctx, &mut rand::thread_rng())?;
    log::debug!("built {} charts in {:?}", charts.len(), start.elapsed());

    let mut renderer = SvgRenderer::new(&cli.out);
    let rendered = chart::render_all(&mut renderer, &charts);

    log::info!(
        "Rendered {rendered}/{} charts into {}",
        charts.len(),
        cli.out.display()
    );

    Ok(())
}

fn run(cli: &Cli) -> gridplot::Result<()> {
    let screen = cli.screen;

    match cli.command {
        Command::Average { run } => render(cli, run, |store, ctx, rng| {
            chart::average_policies(store, &ctx, screen, rng)
        }),
        Command::Policy { run, policy, mode } => render(cli, run, |store, ctx, rng| {
            chart::individual_policy(store, &ctx.with_policy(policy, mode), screen, rng)
        }),
        Command::SupplyDemand { run } => {
            render(cli, run, |store, ctx, _| chart::supply_demand(store, &ctx, screen))
        }
        Command::Seed {
            run,
            households,
            ticks,
        } => {
            let store = Store::builder().create_schema(true).open(&cli.db)?;
            seed(&store, run, households, ticks)
        }
    }
}

fn main() -> ExitCode {
    env_logger::builder()
        .filter_module("gridplot", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
