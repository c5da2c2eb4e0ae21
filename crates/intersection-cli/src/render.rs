use crate::output::{print_json_line, print_table};
use anyhow::Context;
use chrono::Utc;
use intersection_core::assignment::{DurationAssignment, OrderingCheck};
use intersection_core::config::Config;
use intersection_core::controller::{Controller, RunStarted};
use intersection_core::notification::Notification;
use intersection_core::playback::{self, PlaybackOutcome};
use intersection_core::scheduler::SchedulerEvent;
use intersection_core::ticker::{CancelToken, ImmediateTicker, IntervalTicker, Ticker};
use serde::Serialize;

#[derive(Serialize)]
struct EventLine<'a> {
    #[serde(flatten)]
    event: &'a SchedulerEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    tick: u64,
}

/// Print one scheduler transition, as text or as a JSON line.
pub fn print_event(event: &SchedulerEvent, ticks: u64, json: bool) -> anyhow::Result<()> {
    let message = Notification::for_event(event, Utc::now()).map(|n| n.message);
    if json {
        return print_json_line(&EventLine {
            event,
            message,
            tick: ticks,
        });
    }
    match event {
        SchedulerEvent::Activated { lane, duration } => {
            println!("[{ticks:>4}s] {lane} is green for {duration}s");
        }
        _ => {
            if let Some(message) = message {
                println!("[{ticks:>4}s] {message}");
            }
        }
    }
    Ok(())
}

pub fn print_plan(assignment: &DurationAssignment, ordering: &OrderingCheck) {
    let order = assignment.activation_order();
    let rows = assignment
        .iter()
        .map(|(lane, secs)| {
            let position = order
                .iter()
                .position(|l| *l == lane)
                .map(|i| (i + 1).to_string())
                .unwrap_or_else(|| "skipped".to_string());
            vec![lane.to_string(), format!("{secs}s"), position]
        })
        .collect();
    print_table(&["LANE", "DURATION", "ORDER"], rows);

    match ordering {
        OrderingCheck::Absent => {}
        OrderingCheck::Agrees => println!("\nService ordering agrees with durations."),
        OrderingCheck::Disagrees { served, derived } => println!(
            "\nService ordering {} disagrees with durations ({}).",
            join(served),
            join(derived)
        ),
    }
    println!();
}

fn join(lanes: &[intersection_core::lane::Lane]) -> String {
    lanes
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(" > ")
}

/// Print the opening transitions of `started` and play the run to the end.
///
/// `fast` replaces the wall-clock ticker with one that fires immediately.
pub fn play_run(
    controller: &mut Controller,
    started: RunStarted,
    config: &Config,
    fast: bool,
    json: bool,
) -> anyhow::Result<()> {
    if !json {
        if let Some(assignment) = controller.scheduler().assignment() {
            print_plan(assignment, &started.ordering);
        }
    }
    for event in &started.events {
        print_event(event, 0, json)?;
    }

    let mut ticker: Box<dyn Ticker> = if fast {
        Box::new(ImmediateTicker::new())
    } else {
        Box::new(IntervalTicker::new(
            config.timing.tick_interval(),
            CancelToken::new(),
        ))
    };

    let mut failure = None;
    let outcome = playback::play(controller, ticker.as_mut(), |event, c| {
        if failure.is_none() {
            if let Err(e) = print_event(event, c.scheduler().ticks_elapsed(), json) {
                failure = Some(e);
            }
        }
    });
    if let Some(e) = failure {
        return Err(e).context("failed to write playback output");
    }

    if outcome == PlaybackOutcome::Cancelled {
        anyhow::bail!("playback cancelled");
    }
    Ok(())
}
