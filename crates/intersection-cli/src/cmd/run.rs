use crate::render;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use intersection_core::config::Config;
use intersection_core::controller::Controller;
use intersection_core::density::DensityProvider;
use intersection_core::evidence::Evidence;
use intersection_core::lane::Lane;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Image of the North approach
    #[arg(long)]
    pub north: Option<PathBuf>,
    /// Image of the East approach
    #[arg(long)]
    pub east: Option<PathBuf>,
    /// Image of the South approach
    #[arg(long)]
    pub south: Option<PathBuf>,
    /// Image of the West approach
    #[arg(long)]
    pub west: Option<PathBuf>,
    /// Override service.base_url for this run
    #[arg(long)]
    pub service_url: Option<String>,
    /// Tick as fast as possible instead of once per configured interval
    #[arg(long)]
    pub fast: bool,
}

impl RunArgs {
    fn image(&self, lane: Lane) -> Option<&Path> {
        match lane {
            Lane::North => self.north.as_deref(),
            Lane::East => self.east.as_deref(),
            Lane::South => self.south.as_deref(),
            Lane::West => self.west.as_deref(),
        }
    }
}

pub fn run(root: &Path, args: RunArgs, json: bool) -> Result<()> {
    let mut config = Config::load(root).context("failed to load config")?;
    if let Some(url) = &args.service_url {
        config.service.base_url = url.clone();
    }

    let mut controller = Controller::new(config.timing.notifier());
    for &lane in Lane::all() {
        if let Some(path) = args.image(lane) {
            let evidence = Evidence::from_file(path)
                .with_context(|| format!("failed to read {lane} image {}", path.display()))?;
            controller.upload(lane, evidence);
        }
    }

    // Fails with the list of missing lanes before any network traffic.
    let pending = controller.begin_run()?;
    let service = config
        .density_service()
        .context("failed to configure density service")?;

    if !json {
        println!("Analysing lane images at {} ...", service.upload_url());
    }
    let report = service.analyze(&pending.evidence);
    let started = controller.complete_run(pending.ticket, report, Utc::now())?;
    render::play_run(&mut controller, started, &config, args.fast, json)
}
