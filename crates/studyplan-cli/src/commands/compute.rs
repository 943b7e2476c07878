//! Schedule computation command for CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use studyplan_core::{
    spawn_debounced, CacheEntry, Config, DailySchedule, InMemoryBlockSetStore, JsonFileSink,
    LabelTable, Locale, ScheduleCache, ScheduleParams, ScheduleRequest, ScheduleSummary,
    SnapshotSink,
};
use tracing::{debug, warn};

/// How often `--watch` checks the request file for changes.
const WATCH_POLL: Duration = Duration::from_millis(250);

#[derive(Args)]
pub struct ComputeArgs {
    /// Path to a JSON schedule request
    pub request: PathBuf,
    /// JSON file with an array of block sets to resolve `block_set_id` against
    #[arg(long)]
    pub block_sets: Option<PathBuf>,
    /// Output the full result as JSON
    #[arg(long)]
    pub json: bool,
    /// Directory to store the result snapshot in
    #[arg(long, requires = "plan_id")]
    pub snapshot: Option<PathBuf>,
    /// Plan id the snapshot is stored under
    #[arg(long, requires = "snapshot")]
    pub plan_id: Option<String>,
    /// Display locale, overriding the configured one
    #[arg(long)]
    pub locale: Option<Locale>,
    /// Keep running and recompute whenever the request file changes
    #[arg(long)]
    pub watch: bool,
    /// Exit after this many recomputations in watch mode
    #[arg(long, requires = "watch")]
    pub max_updates: Option<u64>,
}

pub async fn run(args: ComputeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let cache = ScheduleCache::standard(config.cache.policy());

    if args.watch {
        return watch(&args, &config, cache).await;
    }

    let text = std::fs::read_to_string(&args.request)?;
    let params = parse_params(&text, &args, &config)?;
    let entry = cache.compute(params).await?;
    debug!(fingerprint = %entry.fingerprint, "computed");
    report(&entry, &args, &config)
}

/// Parse a request and resolve it into engine parameters. Requests without
/// scheduler options take the configured defaults.
fn parse_params(
    text: &str,
    args: &ComputeArgs,
    config: &Config,
) -> Result<ScheduleParams, Box<dyn std::error::Error>> {
    let mut raw: serde_json::Value = serde_json::from_str(text)?;
    if let Some(obj) = raw.as_object_mut() {
        if !obj.contains_key("scheduler_options") {
            obj.insert(
                "scheduler_options".to_string(),
                serde_json::to_value(&config.scheduler)?,
            );
        }
    }
    let request: ScheduleRequest = serde_json::from_value(raw)?;

    let store = match &args.block_sets {
        Some(path) => InMemoryBlockSetStore::from_json(&std::fs::read_to_string(path)?)?,
        None => InMemoryBlockSetStore::new(),
    };
    Ok(request.resolve(&store)?)
}

/// Poll the request file and feed every change through the debouncer,
/// printing each published outcome.
async fn watch(
    args: &ComputeArgs,
    config: &Config,
    cache: ScheduleCache,
) -> Result<(), Box<dyn std::error::Error>> {
    let debouncer = spawn_debounced(cache, config.debounce.quiet_period());
    let mut outcomes = debouncer.subscribe();
    let mut poll = tokio::time::interval(WATCH_POLL);
    let mut last_seen: Option<String> = None;
    let mut published = 0u64;

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let text = match std::fs::read_to_string(&args.request) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, path = %args.request.display(), "request unreadable");
                        continue;
                    }
                };
                if last_seen.as_deref() == Some(text.as_str()) {
                    continue;
                }
                match parse_params(&text, args, config) {
                    Ok(params) => {
                        if !debouncer.submit(params) {
                            break;
                        }
                    }
                    Err(e) => eprintln!("error: {e}"),
                }
                last_seen = Some(text);
            }
            changed = outcomes.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = outcomes.borrow_and_update().clone();
                let Some(outcome) = latest else {
                    continue;
                };
                println!("== generation {} ({} updates) ==", outcome.generation, outcome.updates);
                match outcome.outcome {
                    Ok(entry) => report(&entry, args, config)?,
                    Err(e) => eprintln!("error: {e}"),
                }
                published += 1;
                if args.max_updates.is_some_and(|max| published >= max) {
                    break;
                }
            }
        }
    }

    debouncer.close().await;
    Ok(())
}

/// Write the snapshot if requested, then print the result.
fn report(
    entry: &CacheEntry,
    args: &ComputeArgs,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(dir), Some(plan_id)) = (&args.snapshot, &args.plan_id) {
        let sink = JsonFileSink::new(dir);
        sink.store(plan_id, &entry.result)?;
        eprintln!("snapshot written to {}", sink.path_for(plan_id).display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry.result)?);
        return Ok(());
    }

    let labels = LabelTable::for_locale(args.locale.unwrap_or(config.display.locale));
    print_days(&entry.result.daily_schedule, &labels);
    println!();
    print_summary(&entry.result.summary, &labels);
    Ok(())
}

fn print_days(days: &[DailySchedule], labels: &LabelTable) {
    println!("{:<10}  {:<3}  {:<18}  {:>5}  Slots", "Date", "Day", "Type", "Hours");
    for day in days {
        let slots: Vec<String> = day
            .time_slots
            .iter()
            .map(|slot| {
                let kind = labels.slot_type(slot.slot_type);
                match &slot.label {
                    Some(label) => format!("{} {kind} ({label})", slot.range()),
                    None => format!("{} {kind}", slot.range()),
                }
            })
            .collect();
        println!(
            "{:<10}  {:<3}  {:<18}  {:>5.2}  {}",
            day.date,
            day.date.format("%a"),
            labels.day_type(day.day_type),
            day.study_hours,
            if slots.is_empty() { "-".to_string() } else { slots.join(", ") }
        );
    }
}

fn print_summary(summary: &ScheduleSummary, labels: &LabelTable) {
    use studyplan_core::DayType;

    println!(
        "Period: {} .. {} ({} days)",
        summary.period.start_date(),
        summary.period.end_date(),
        summary.total_days
    );
    let counts = [
        (DayType::Study, summary.total_study_days),
        (DayType::Review, summary.total_review_days),
        (DayType::NonStudy, summary.total_non_study_days),
        (DayType::Vacation, summary.total_exclusion_days.vacation),
        (DayType::Personal, summary.total_exclusion_days.personal),
        (DayType::DesignatedHoliday, summary.total_exclusion_days.designated_holiday),
    ];
    for (day_type, count) in counts {
        println!("  {:<18} {count}", labels.day_type(day_type));
    }
    println!(
        "Study hours: {:.2} (study days {:.2}, review days {:.2}, self-study {:.2})",
        summary.total_study_hours,
        summary.study_day_hours,
        summary.review_day_hours,
        summary.total_self_study_hours
    );
    if summary.academy.total_sessions > 0 {
        println!(
            "Academy: {} sessions at {} academies, {:.2} h, travel {:.2} h ({:.0} min per session)",
            summary.academy.total_sessions,
            summary.academy.unique_academies,
            summary.academy.total_academy_hours,
            summary.academy.total_travel_hours,
            summary.academy.average_travel_minutes
        );
        for group in &summary.academy.groups {
            println!(
                "  {:<18} {} sessions, {:.2} h, travel {:.2} h",
                group.label, group.sessions, group.academy_hours, group.travel_hours
            );
        }
    }
}
