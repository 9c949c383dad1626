#![deny(warnings)]

//! Headless driver: builds a market of bots, runs quarters and prints the
//! standings.

use anyhow::{Context, Result};
use chrono::Utc;
use sim_core::money::format_eur;
use sim_core::SimConfig;
use sim_runtime::{GameSession, QuarterReport, RankedEntry, SharedSession};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    quarters: Option<u32>,
    bots: Option<u32>,
    seed: Option<u64>,
    live: bool,
    demo: bool,
    json: bool,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--quarters" => args.quarters = it.next().and_then(|s| s.parse().ok()),
            "--bots" => args.bots = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            "--live" => args.live = true,
            "--demo" => args.demo = true,
            "--json" => args.json = true,
            "--version" => args.version = true,
            _ => {}
        }
    }
    args
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn print_report(report: &QuarterReport) {
    println!(
        "Q{} | firms: {} | sanctions: {} | bankrupt: {} | entrants: {}",
        report.quarter,
        report.results.len(),
        report.enforcement.iter().filter(|a| a.fine > 0.0).count(),
        report.bankruptcies.len(),
        report.new_entrants.len()
    );
    for b in &report.bankruptcies {
        println!(
            "  bankrupt: {} (creditors recover {:.0}%)",
            b.firm_name,
            b.recovery_rate * 100.0
        );
        for c in &b.creditors {
            println!("    {}: {} of {}", c.creditor, format_eur(c.payout), format_eur(c.claim));
        }
    }
}

fn print_overview(overview: &[RankedEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(overview)?);
        return Ok(());
    }
    println!(
        "{:>4}  {:<28} {:>7}  {:>16} {:>16} {:>16}",
        "rank", "firm", "share", "revenue", "profit", "cash"
    );
    for row in overview {
        let e = &row.entry;
        println!(
            "{:>4}  {:<28} {:>6.2}%  {:>16} {:>16} {:>16}",
            row.rank,
            e.name,
            e.market_share * 100.0,
            format_eur(e.revenue),
            format_eur(e.profit),
            format_eur(e.cash)
        );
    }
    Ok(())
}

fn run_batch(mut session: GameSession, quarters: u32, json: bool) -> Result<()> {
    for _ in 0..quarters {
        let report = session.advance_quarter();
        if !json {
            print_report(&report);
        }
    }
    print_overview(&session.get_market_overview(), json)
}

/// Polls the session once a second and lets it advance when its quarter
/// timer has run out.
fn run_live(session: GameSession, quarters: u32, json: bool) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .context("starting async runtime")?;
    let shared = SharedSession::new(session);
    shared.write(|s| s.start(Utc::now()))?;
    runtime.block_on(async {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        let mut done = 0;
        while done < quarters {
            ticker.tick().await;
            if let Some(report) = shared.tick(Utc::now())? {
                done += 1;
                print_report(&report);
                print_overview(&shared.read(|s| s.get_market_overview())?, json)?;
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args();
    if args.version {
        println!("bizsim {} ({})", env!("GIT_SHA"), env!("BUILD_DATE"));
        return Ok(());
    }
    let config = load_config(&args)?;
    let quarters = args.quarters.unwrap_or(8);
    info!(seed = config.rng_seed, quarters, live = args.live, "starting simulation");

    let mut session = GameSession::new(config)?;
    if args.demo {
        session.populate_demo_firms();
    }
    session.populate_bots(args.bots);
    info!(firms = session.firm_count(), "market populated");

    if args.live {
        run_live(session, quarters, args.json)
    } else {
        run_batch(session, quarters, args.json)
    }
}
