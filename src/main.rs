mod config;
mod error;
mod exec;
mod models;
mod progress;
mod settings;
mod system;
mod ui;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use relm4::RelmApp;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::models::Section;
use crate::ui::{AppInit, AppModel};

const APP_ID: &str = "org.tearsofmandrake.controlcenter";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Page to open at startup
    #[arg(long, value_enum)]
    page: Option<Section>,

    /// Log commands and their output at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::new()?;
    let rt = Arc::new(Runtime::new().context("Could not start the async runtime")?);

    // GTK gets no arguments of its own; clap already consumed them
    let app = RelmApp::new(APP_ID).with_args(Vec::new());
    app.run::<AppModel>(AppInit {
        rt,
        config,
        start_page: args.page.unwrap_or(Section::Home),
    });

    Ok(())
}
