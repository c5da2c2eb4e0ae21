use crate::render;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use intersection_core::assignment::DurationAssignment;
use intersection_core::config::Config;
use intersection_core::controller::Controller;
use intersection_core::density::{DensityProvider, FixedDurations};
use intersection_core::evidence::Evidence;
use intersection_core::lane::Lane;
use std::path::Path;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Green time for North, in seconds
    #[arg(long, default_value_t = 0)]
    pub north: u32,
    /// Green time for East, in seconds
    #[arg(long, default_value_t = 0)]
    pub east: u32,
    /// Green time for South, in seconds
    #[arg(long, default_value_t = 0)]
    pub south: u32,
    /// Green time for West, in seconds
    #[arg(long, default_value_t = 0)]
    pub west: u32,
    /// Tick as fast as possible instead of once per configured interval
    #[arg(long)]
    pub fast: bool,
}

pub fn run(root: &Path, args: SimulateArgs, json: bool) -> Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let provider = FixedDurations(DurationAssignment::new(
        args.north, args.east, args.south, args.west,
    ));

    let mut controller = Controller::new(config.timing.notifier());
    for &lane in Lane::all() {
        controller.upload(
            lane,
            Evidence::new(lane.upload_filename(), "image/jpeg", Vec::new()),
        );
    }

    let pending = controller.begin_run()?;
    let report = provider.analyze(&pending.evidence);
    let started = controller.complete_run(pending.ticket, report, Utc::now())?;
    render::play_run(&mut controller, started, &config, args.fast, json)
}
