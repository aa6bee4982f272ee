//! `taskbeat schedule`: print the persisted schedule.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use taskbeat_beat::{FileScheduleStore, ScheduleEntry, ScheduleStore};
use taskbeat_config::Config;
use taskbeat_core::TaskRegistry;
use taskbeat_protocols::registry::JobRegistry;

use crate::jobs::register_jobs;

pub(crate) async fn run_schedule(config: &Config) -> anyhow::Result<()> {
    let registry = TaskRegistry::new();
    register_jobs(&registry, &config.jobs)?;

    let path = config.beat.schedule_path();
    let store = FileScheduleStore::open(&path).await?;
    let entries = store.entries().await;
    store.close().await?;

    println!("Schedule: {}", path.display());
    for line in render_schedule(&entries?, &registry, Utc::now()) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per persisted entry, plus periodic jobs not yet persisted.
pub(crate) fn render_schedule(
    entries: &[ScheduleEntry],
    registry: &TaskRegistry,
    now: DateTime<Utc>,
) -> Vec<String> {
    let periodic = registry.get_all_periodic();
    let mut lines = BTreeMap::new();

    for entry in entries {
        let next = match periodic.get(&entry.name).and_then(|job| job.run_every()) {
            Some(every) => format!("due in {}s", entry.remaining_at(every, now).as_secs()),
            None => "not scheduled".to_string(),
        };
        let last = if entry.is_fresh() {
            "never".to_string()
        } else {
            entry.last_run_at.to_rfc3339()
        };
        lines.insert(
            entry.name.clone(),
            format!(
                "{:<24} runs={:<6} last={} {}",
                entry.name, entry.total_run_count, last, next
            ),
        );
    }
    for name in periodic.keys() {
        lines
            .entry(name.clone())
            .or_insert_with(|| format!("{:<24} runs=0      last=never pending", name));
    }

    lines.into_values().collect()
}
