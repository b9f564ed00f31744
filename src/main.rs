// src/main.rs

use anyhow::{anyhow, bail, Context};
use chrono::{Datelike, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, error, info};
use spaced_rep_lib::config::Config;
use spaced_rep_lib::database::SqliteStore;
use spaced_rep_lib::dates::{due_status, format_date, next_review_label, parse_date};
use spaced_rep_lib::editor::ScheduleEditor;
use spaced_rep_lib::error::{SchedulerError, SchedulerResult};
use spaced_rep_lib::intake::{canonical_url, on_accepted, ManualEntry};
use spaced_rep_lib::models::{AppState, Difficulty, DueStatus, ProblemDescriptor, SortKey};
use spaced_rep_lib::presets::PresetCatalog;
use spaced_rep_lib::query;
use spaced_rep_lib::repository::{ProblemRepository, ScheduleChange};
use spaced_rep_lib::reschedule::RescheduleSession;
use spaced_rep_lib::view::{month_grid, parse_month, CalendarDay, DayMarker, ViewState};
use std::path::PathBuf;
use std::process::ExitCode;

type State = AppState<SqliteStore>;

#[derive(Debug, Parser)]
#[command(
    name = "leetcode-spaced-rep",
    about = "Spaced repetition schedules for solved LeetCode problems",
    version
)]
struct Cli {
    /// Database file, overriding the configured location
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Default, Args)]
struct EditArgs {
    /// Start from this preset instead of the default
    #[arg(long)]
    preset: Option<String>,

    /// Set repetition N to DAYS from today, e.g. `--set 2=10`
    #[arg(long = "set", value_parser = parse_repetition_days)]
    set: Vec<(usize, i64)>,

    /// Append this many repetitions after the last one
    #[arg(long, default_value_t = 0)]
    extra: usize,

    /// Print the preview and save nothing
    #[arg(long)]
    dry_run: bool,
}

impl EditArgs {
    fn is_empty(&self) -> bool {
        self.preset.is_none() && self.set.is_empty() && self.extra == 0
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    Title,
    Difficulty,
    NextReview,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Title => SortKey::Title,
            SortArg::Difficulty => SortKey::Difficulty,
            SortArg::NextReview => SortKey::NextReview,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Schedule a problem whose submission was just accepted
    Accepted {
        #[arg(long)]
        slug: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "Medium")]
        difficulty: Difficulty,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "topic")]
        topics: Vec<String>,
        #[arg(long)]
        url: Option<String>,
        #[command(flatten)]
        edit: EditArgs,
    },
    /// Add a problem by URL or slug
    Add {
        #[arg(long)]
        url: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "Medium")]
        difficulty: Difficulty,
        #[command(flatten)]
        edit: EditArgs,
    },
    /// Show or change the schedule of a tracked problem
    Reschedule {
        id: String,
        #[command(flatten)]
        edit: EditArgs,
        /// Append a date one week after the last
        #[arg(long)]
        add_date: bool,
        /// Move repetition N to DATE, e.g. `--move 2=2024-03-01`
        #[arg(long = "move", value_parser = parse_repetition_date)]
        moves: Vec<(usize, NaiveDate)>,
        /// Drop a scheduled date
        #[arg(long = "drop")]
        drops: Vec<NaiveDate>,
    },
    /// Problems scheduled on a date (default today)
    Due { date: Option<NaiveDate> },
    /// Repetitions that were missed
    Overdue,
    Stats,
    /// Tracked problems, filtered and sorted
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = SortArg::NextReview)]
        sort: SortArg,
        #[arg(long)]
        desc: bool,
    },
    /// Toggle completion of one repetition
    Complete { id: String, date: NaiveDate },
    RemoveDate { id: String, date: NaiveDate },
    Delete { id: String },
    /// Month view (YYYY-MM, default current month)
    Calendar {
        #[arg(long)]
        month: Option<String>,
    },
    Presets,
    /// Open the problem page in the browser
    Open { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::load();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.filter.as_str()),
    )
    .init();

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let invalidated = err
                .downcast_ref::<SchedulerError>()
                .is_some_and(SchedulerError::is_context_invalidated);
            if invalidated {
                eprintln!("Storage is no longer available. Reload and retry.");
            } else {
                eprintln!("error: {:#}", err);
            }
            error!("command failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let state = open_state(cli.db.or_else(|| config.db_path()), config)?;
    debug!("running {:?} with today={}", cli.command, today);

    match cli.command {
        Command::Accepted {
            slug,
            title,
            difficulty,
            category,
            topics,
            url,
            edit,
        } => {
            let url = url.unwrap_or_else(|| canonical_url(&slug, &slug));
            let descriptor = ProblemDescriptor {
                title,
                slug,
                difficulty,
                category,
                topics,
                url,
            };
            let Some(mut editor) = on_accepted(
                descriptor,
                &state.presets,
                config.schedule.auto_detect,
                today,
            ) else {
                println!("Auto-detect is switched off; nothing scheduled.");
                return Ok(());
            };
            apply_edits(&mut editor, &edit)?;
            finish_editor(&state, editor, edit.dry_run)
        }
        Command::Add {
            url,
            title,
            difficulty,
            edit,
        } => {
            let entry = ManualEntry {
                url,
                title,
                difficulty,
            };
            let mut editor = entry
                .open_editor(&state.presets, today)
                .map_err(SchedulerError::from)?;
            apply_edits(&mut editor, &edit)?;
            finish_editor(&state, editor, edit.dry_run)
        }
        Command::Reschedule {
            id,
            edit,
            add_date,
            moves,
            drops,
        } => {
            let date_edits = add_date || !moves.is_empty() || !drops.is_empty();
            if !edit.is_empty() && date_edits {
                bail!("use either interval edits (--preset/--set/--extra) or date edits, not both");
            }
            if !edit.is_empty() {
                if !state.with_repo(|repo| Ok(repo.contains(&id)))? {
                    println!("No tracked problem `{}`.", id);
                    return Ok(());
                }
                let mut editor = ScheduleEditor::for_existing(&id, state.presets.clone(), today);
                apply_edits(&mut editor, &edit)?;
                return finish_editor(&state, editor, edit.dry_run);
            }
            state.with_repo(|repo| {
                let Some(mut session) = RescheduleSession::open(repo, &id, today) else {
                    println!("No tracked problem `{}`.", id);
                    return Ok(());
                };
                for &(rep, date) in &moves {
                    session.set_date(rep - 1, date)?;
                }
                for date in &drops {
                    session.remove_date(*date)?;
                }
                if add_date {
                    if let Some(date) = session.add_date()? {
                        println!("Added {}.", format_date(date));
                    }
                }
                println!("{}", session.title());
                for (idx, date) in session.dates().iter().enumerate() {
                    let lock = if session.is_locked(idx) { " (done)" } else { "" };
                    println!("  Rep {}: {}{}", idx + 1, format_date(*date), lock);
                }
                if !date_edits || edit.dry_run {
                    session.cancel();
                    return Ok(());
                }
                match session.commit(repo)? {
                    ScheduleChange::Deleted => println!("No dates left; problem removed."),
                    _ => println!("Schedule saved."),
                }
                Ok(())
            })?;
            Ok(())
        }
        Command::Due { date } => {
            let date = date.unwrap_or(today);
            state.with_repo(|repo| {
                let entries = query::problems_due_on(repo, date);
                if entries.is_empty() {
                    println!("Nothing scheduled on {}.", format_date(date));
                }
                for entry in entries {
                    println!(
                        "{:<24} {:<40} {:<6} rep {}/{}  {}",
                        entry.id,
                        entry.problem.title,
                        entry.problem.difficulty.as_str(),
                        entry.repetition_ordinal,
                        entry.total_repetitions,
                        status_label(due_status(date, today, entry.is_completed)),
                    );
                }
                Ok(())
            })?;
            Ok(())
        }
        Command::Overdue => {
            state.with_repo(|repo| {
                let entries = query::overdue(repo, today);
                if entries.is_empty() {
                    println!("Nothing overdue.");
                }
                for entry in entries {
                    println!(
                        "{}  {:<24} {}",
                        format_date(entry.date),
                        entry.id,
                        entry.problem.title
                    );
                }
                Ok(())
            })?;
            Ok(())
        }
        Command::Stats => {
            state.with_repo(|repo| {
                let stats = query::stats(repo, today, config.schedule.upcoming_horizon_days);
                println!("Due today: {}", stats.due_today);
                println!(
                    "Next {} days: {}",
                    config.schedule.upcoming_horizon_days, stats.upcoming
                );
                println!("Tracked: {}", stats.total);
                if let Some(badge) = query::badge_text(repo, today) {
                    println!("Badge: {}", badge);
                }
                Ok(())
            })?;
            Ok(())
        }
        Command::List { search, sort, desc } => {
            let mut view = ViewState::new(today);
            view.set_search(&search);
            let key = SortKey::from(sort);
            if view.sort_key() != key {
                view.toggle_sort(key);
            }
            if desc {
                view.toggle_sort(key);
            }
            state.with_repo(|repo| {
                for row in view.listing(repo, today) {
                    println!(
                        "{:<24} {:<40} {:<6} {:<10} {:?}",
                        row.id,
                        row.problem.title,
                        row.problem.difficulty.as_str(),
                        next_review_label(row.next_review, today),
                        query::problem_status(row.problem, today),
                    );
                }
                Ok(())
            })?;
            Ok(())
        }
        Command::Complete { id, date } => {
            let outcome = state.with_repo(|repo| {
                let outcome = repo.toggle_completion(&id, date);
                repo.persist()?;
                Ok(outcome)
            })?;
            match outcome {
                Some(true) => println!("{} on {} marked done.", id, format_date(date)),
                Some(false) => println!("{} on {} marked not done.", id, format_date(date)),
                None => println!("No tracked problem `{}`.", id),
            }
            Ok(())
        }
        Command::RemoveDate { id, date } => {
            let change = state.with_repo(|repo| {
                let change = repo.remove_scheduled_date(&id, date);
                repo.persist()?;
                Ok(change)
            })?;
            match change {
                ScheduleChange::Updated => println!("Removed {} from {}.", format_date(date), id),
                ScheduleChange::Deleted => println!("No dates left; {} removed.", id),
                ScheduleChange::Missing => println!("No tracked problem `{}`.", id),
            }
            Ok(())
        }
        Command::Delete { id } => {
            let removed = state.with_repo(|repo| {
                let removed = repo.delete(&id);
                repo.persist()?;
                Ok(removed)
            })?;
            if removed {
                println!("Deleted {}.", id);
            } else {
                println!("No tracked problem `{}`.", id);
            }
            Ok(())
        }
        Command::Calendar { month } => {
            let mut view = ViewState::new(today);
            if let Some(month) = month {
                let first = parse_month(&month)
                    .ok_or_else(|| anyhow!("expected YYYY-MM, got `{}`", month))?;
                view.show_month(first);
            }
            state.with_repo(|repo| {
                println!("{}", view.month().format("%B %Y"));
                println!("Su    Mo    Tu    We    Th    Fr    Sa");
                for week in month_grid(&view, repo, today).chunks(7) {
                    let cells: Vec<String> = week.iter().map(calendar_cell).collect();
                    println!("{}", cells.join(""));
                }
                Ok(())
            })?;
            Ok(())
        }
        Command::Presets => {
            for preset in state.presets.presets() {
                let marker = if preset.id == state.presets.default_id() { "*" } else { " " };
                let days: Vec<String> = preset.intervals.iter().map(|d| d.to_string()).collect();
                println!("{} {:<12} {:<12} [{}]", marker, preset.id, preset.name, days.join(", "));
            }
            Ok(())
        }
        Command::Open { id } => {
            let url = state.with_repo(|repo| Ok(repo.get(&id).map(|p| p.url.clone())))?;
            let Some(url) = url else {
                println!("No tracked problem `{}`.", id);
                return Ok(());
            };
            info!("opening {}", url);
            webbrowser::open(&url).with_context(|| format!("could not open {}", url))?;
            Ok(())
        }
    }
}

fn open_state(path: Option<PathBuf>, config: &Config) -> anyhow::Result<State> {
    let path = path.ok_or_else(|| anyhow!("no database location could be resolved"))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("could not create {:?}", parent))?;
    }
    info!("Database path: {:?}", path);
    let store = SqliteStore::open(&path).map_err(SchedulerError::from)?;
    let presets = PresetCatalog::load(&store, &config.schedule.default_preset)?;
    let repo = ProblemRepository::open(store)?;
    Ok(AppState::new(repo, presets))
}

fn apply_edits(editor: &mut ScheduleEditor, edit: &EditArgs) -> SchedulerResult<()> {
    if let Some(preset) = &edit.preset {
        editor.select_preset(preset)?;
    }
    for &(rep, days) in &edit.set {
        editor.set_repetition_days(rep - 1, days)?;
    }
    for _ in 0..edit.extra {
        editor.add_repetition()?;
    }
    Ok(())
}

fn finish_editor(state: &State, mut editor: ScheduleEditor, dry_run: bool) -> anyhow::Result<()> {
    println!("Intervals ({}):", editor.active_preset_id());
    for (idx, entry) in editor.preview().iter().enumerate() {
        println!(
            "  Rep {}: {:>3} days  {}  {}",
            idx + 1,
            entry.days,
            format_date(entry.date),
            entry.label
        );
    }
    if dry_run {
        editor.cancel()?;
        println!("Dry run; nothing saved.");
        return Ok(());
    }
    let dates = state.with_repo(|repo| editor.commit(repo))?;
    println!("Scheduled {} review(s).", dates.len());
    Ok(())
}

fn status_label(status: DueStatus) -> String {
    match status {
        DueStatus::Completed => "done".to_string(),
        DueStatus::Overdue => "overdue".to_string(),
        DueStatus::DueToday => "due today".to_string(),
        DueStatus::Tomorrow => "tomorrow".to_string(),
        DueStatus::InDays(days) => format!("in {} days", days),
        DueStatus::Upcoming => "upcoming".to_string(),
    }
}

fn calendar_cell(day: &CalendarDay) -> String {
    if !day.in_current_month {
        return " ".repeat(6);
    }
    let today = if day.is_today { '>' } else { ' ' };
    let markers: String = day
        .markers
        .iter()
        .map(|m| match m {
            DayMarker::Completed => '+',
            DayMarker::Overdue => '!',
            DayMarker::Pending => '*',
        })
        .collect();
    format!("{}{:>2}{:<3}", today, day.date.day(), markers)
}

fn split_repetition(value: &str) -> Result<(usize, &str), String> {
    let (rep, rest) = value
        .split_once('=')
        .ok_or_else(|| format!("expected N=VALUE, got `{}`", value))?;
    let rep: usize = rep
        .trim()
        .parse()
        .map_err(|_| format!("invalid repetition number `{}`", rep))?;
    if rep == 0 {
        return Err("repetitions are numbered from 1".to_string());
    }
    Ok((rep, rest.trim()))
}

fn parse_repetition_days(value: &str) -> Result<(usize, i64), String> {
    let (rep, days) = split_repetition(value)?;
    let days = days
        .parse()
        .map_err(|_| format!("invalid day count `{}`", days))?;
    Ok((rep, days))
}

fn parse_repetition_date(value: &str) -> Result<(usize, NaiveDate), String> {
    let (rep, date) = split_repetition(value)?;
    let date = parse_date(date).ok_or_else(|| format!("expected YYYY-MM-DD, got `{}`", date))?;
    Ok((rep, date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repetition_arguments_are_one_based() {
        assert_eq!(parse_repetition_days("2=10"), Ok((2, 10)));
        assert!(parse_repetition_days("0=10").is_err());
        assert!(parse_repetition_days("2").is_err());
        assert_eq!(
            parse_repetition_date("1=2024-03-01"),
            Ok((1, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );
        assert!(parse_repetition_date("1=March").is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "leetcode-spaced-rep",
            "--today",
            "2024-01-01",
            "add",
            "--url",
            "two-sum",
            "--title",
            "Two Sum",
            "--set",
            "1=2",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.today, NaiveDate::from_ymd_opt(2024, 1, 1));
        match cli.command {
            Command::Add { url, edit, .. } => {
                assert_eq!(url, "two-sum");
                assert_eq!(edit.set, vec![(1, 2)]);
                assert!(edit.dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn calendar_cell_marks_today_and_reviews() {
        let day = CalendarDay {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            in_current_month: true,
            is_today: true,
            is_selected: false,
            count: 2,
            markers: vec![DayMarker::Completed, DayMarker::Overdue],
        };
        assert_eq!(calendar_cell(&day), "> 2+! ");
    }
}
