use tracing_subscriber::EnvFilter;

use shuriken_sim::config::SimConfig;
use shuriken_sim::run_match;

fn arg_value<T: std::str::FromStr>(name: &str) -> Option<T> {
    let prefix = format!("--{name}=");
    std::env::args()
        .skip(1)
        .find_map(|a| a.strip_prefix(&prefix).map(String::from))
        .and_then(|v| v.parse().ok())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut config = SimConfig::load();
    if let Some(bots) = arg_value("bots") {
        config.bots = bots;
    }
    if let Some(seed) = arg_value("seed") {
        config.seed = seed;
    }

    let report = run_match(config).await;
    for line in report.summary_lines() {
        println!("{line}");
    }
    if !report.converged() {
        tracing::error!("Peers disagree on the final session");
        std::process::exit(1);
    }
}
