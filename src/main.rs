use chrono::Local;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;

mod cli;
mod config;
mod models;
mod pipeline;
mod scheduler;
mod services;

use cli::CommandArgs;
use config::AppConfig;
use models::report::ctime;
use pipeline::Pipeline;
use scheduler::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // A missing .env is fine, secrets may come from the real environment
    if let Err(e) = dotenvy::dotenv() {
        log::debug!("No .env file loaded: {}", e);
    }

    let args = CommandArgs::parse();

    let config = match AppConfig::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_usage_error() {
                eprintln!("Usage: proc-mailer <interval_minutes>");
            }
            std::process::exit(1);
        }
    };

    let scheduler = Scheduler::new(config.interval, config.immediate_run)?;
    let pipeline = Arc::new(Pipeline::from_config(&config)?);

    print_banner(&config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                log::info!("🛑 Interrupt received, finishing current cycle");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                log::error!("❌ Failed to listen for Ctrl-C: {}", e);
            }
        }
    });

    scheduler
        .run(move || pipeline.run_cycle(), shutdown_rx)
        .await;

    println!();
    println!("Monitoring stopped by user");
    Ok(())
}

fn print_banner(config: &AppConfig) {
    println!("{:=^60}", " Auto Process Monitor ");
    println!("Started: {}", ctime(&Local::now()));
    println!();
    println!("⏱️  Interval:      every {} minute(s)", config.interval.as_secs() / 60);
    println!("▶️  Immediate run: {}", if config.immediate_run { "yes" } else { "no" });
    println!("📊 Sort mode:     {:?}", config.sort);
    println!("📁 Report dir:    {}", config.report_dir.display());
    println!("🌐 Probe URL:     {}", config.probe_url);
    println!(
        "📧 Mail:          {} -> {} via {}:{}",
        config.mail.sender.email,
        config.mail.recipient.email,
        config.mail.smtp_host,
        config.mail.smtp_port
    );
    println!("{}", "=".repeat(60));
}
