use std::io::Write;
use std::thread;
use std::time::Duration;

use clap::Subcommand;
use studycycle_core::storage::{Config, Database};
use studycycle_core::{Event, Notifier, NullNotifier, PhaseScheduler, TerminalNotifier};

const SCHEDULER_KEY: &str = "phase_scheduler";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the full study cycle in the foreground
    Run {
        /// Override the configured number of sets
        #[arg(long)]
        sets: Option<u32>,
        /// Suppress notifications
        #[arg(long)]
        quiet: bool,
        /// Discard a run in progress without asking
        #[arg(long)]
        yes: bool,
    },
    /// Start the persisted timer, or resume it if paused
    Start,
    /// Pause the persisted timer
    Pause,
    /// Reset to idle
    Reset {
        /// Discard a run in progress without asking
        #[arg(long)]
        yes: bool,
    },
    /// Print current scheduler state as JSON
    Status,
}

pub fn load_scheduler(db: &Database, config: &Config) -> PhaseScheduler {
    match db.kv_get(SCHEDULER_KEY) {
        Ok(Some(json)) => match serde_json::from_str::<PhaseScheduler>(&json) {
            Ok(scheduler) => return scheduler,
            Err(e) => tracing::warn!("discarding unreadable timer state: {e}"),
        },
        Ok(None) => {}
        Err(e) => tracing::warn!("could not read persisted timer state: {e}"),
    }
    PhaseScheduler::new(config.cycle)
        .map(|s| s.with_settle_ms(config.settle_ms))
        .unwrap_or_default()
}

pub fn save_scheduler(
    db: &Database,
    scheduler: &PhaseScheduler,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(scheduler)?;
    db.kv_set(SCHEDULER_KEY, &json)?;
    Ok(())
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    match action {
        TimerAction::Run { sets, quiet, yes } => {
            let persisted = load_scheduler(&db, &config);
            if persisted.would_discard_progress() && !yes {
                eprintln!("a run is in progress; pass --yes to discard it");
                std::process::exit(1);
            }
            let mut cycle = config.cycle;
            if let Some(sets) = sets {
                cycle.total_sets = sets;
            }
            cycle.validate()?;
            let mut scheduler =
                PhaseScheduler::new(cycle)?.with_settle_ms(config.settle_ms);
            let notifier: Box<dyn Notifier> = if quiet || !config.notifications.enabled {
                Box::new(NullNotifier)
            } else {
                Box::new(TerminalNotifier)
            };
            run_foreground(&db, &mut scheduler, notifier.as_ref())?;
            save_scheduler(&db, &scheduler)?;
        }
        TimerAction::Start => {
            let mut scheduler = load_scheduler(&db, &config);
            match scheduler.start() {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("{}", serde_json::to_string_pretty(&scheduler.snapshot())?),
            }
            save_scheduler(&db, &scheduler)?;
        }
        TimerAction::Pause => {
            let mut scheduler = load_scheduler(&db, &config);
            match scheduler.pause() {
                Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
                None => println!("{}", serde_json::to_string_pretty(&scheduler.snapshot())?),
            }
            save_scheduler(&db, &scheduler)?;
        }
        TimerAction::Reset { yes } => {
            let mut scheduler = load_scheduler(&db, &config);
            if scheduler.would_discard_progress() && !yes {
                eprintln!("a run is in progress; pass --yes to discard it");
                std::process::exit(1);
            }
            let event = scheduler.reset();
            println!("{}", serde_json::to_string_pretty(&event)?);
            save_scheduler(&db, &scheduler)?;
        }
        TimerAction::Status => {
            let scheduler = load_scheduler(&db, &config);
            println!("{}", serde_json::to_string_pretty(&scheduler.snapshot())?);
        }
    }

    Ok(())
}

/// Foreground run loop: the CLI is the clock source, delivering one
/// tick per second until the run completes.
fn run_foreground(
    db: &Database,
    scheduler: &mut PhaseScheduler,
    notifier: &dyn Notifier,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(event) = scheduler.start() {
        announce(&event, notifier);
    }
    render_status(scheduler);
    loop {
        thread::sleep(Duration::from_secs(1));
        let events = scheduler.tick();
        let mut done = false;
        for event in &events {
            match event {
                Event::StudyCompleted { interval } => {
                    db.append(interval)?;
                }
                Event::RunCompleted { .. } => done = true,
                _ => {}
            }
            announce(event, notifier);
        }
        render_status(scheduler);
        if done {
            println!();
            return Ok(());
        }
    }
}

fn announce(event: &Event, notifier: &dyn Notifier) {
    match event {
        Event::PhaseStarted {
            phase,
            set,
            duration_secs,
            ..
        } => {
            notifier.notify(
                phase.label(),
                &format!("set {set}: {} on the clock", format_clock(*duration_secs)),
            );
        }
        Event::StudyCompleted { interval } => {
            notifier.notify(
                "study complete",
                &format!(
                    "set {} done ({})",
                    interval.set_number,
                    format_clock(interval.duration_secs)
                ),
            );
        }
        Event::RunCompleted { sets, .. } => {
            notifier.notify("all done", &format!("{sets} set(s) completed"));
        }
        _ => {}
    }
}

fn render_status(scheduler: &PhaseScheduler) {
    print!(
        "\r{:<8} set {}/{}  {}   ",
        scheduler.phase().label(),
        scheduler.current_set(),
        scheduler.config().total_sets,
        format_clock(scheduler.remaining_units()),
    );
    let _ = std::io::stdout().flush();
}

/// mm:ss, or h:mm:ss past the hour.
pub fn format_clock(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}
