//! Command handlers
//!
//! Each handler drives the progress store and prints either the text view
//! or, with `--json`, the serialized result.

use crate::cli::{Cli, Commands, ConfigCommands, Lang};
use crate::display;
use anyhow::{bail, Context, Result};
use forge_common::{
    ForgeConfig, MemoryProgressDb, ProgressDb, ProgressStore, SqliteProgressDb, StorageBackend,
    SystemClock,
};
use forge_shared::{CompletionMetadata, Curriculum, LessonStatus, TaskType};
use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Output settings shared by every handler
#[derive(Debug, Clone, Copy)]
pub struct Ctx {
    pub json: bool,
    pub lang: Lang,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Build and initialize the store over the configured backend
pub async fn open_store(config: &ForgeConfig, memory: bool) -> Result<ProgressStore> {
    let db: Arc<dyn ProgressDb> = if memory || config.storage.backend == StorageBackend::Memory {
        debug!("Using in-memory progress storage");
        Arc::new(MemoryProgressDb::new())
    } else {
        let path = config.storage.db_path();
        let db = SqliteProgressDb::open_at(&path)
            .with_context(|| format!("Failed to open progress database {}", path.display()))?;
        Arc::new(db)
    };

    let mut store =
        ProgressStore::new(db, Arc::new(Curriculum::kids_course()), Arc::new(SystemClock))?;
    store.initialize().await.context("Failed to load learner progress")?;
    Ok(store)
}

/// Dispatch a parsed command line
pub async fn run(cli: Cli, config: ForgeConfig) -> Result<()> {
    let ctx = Ctx {
        json: cli.json,
        lang: cli.lang,
    };

    let command = match cli.command {
        Commands::Config { action } => return config_command(action, config, ctx),
        command => command,
    };

    let mut store = open_store(&config, cli.memory).await?;
    match command {
        Commands::Status => status(&store, ctx),
        Commands::Lessons { unit } => lessons(&store, unit.as_deref(), ctx),
        Commands::Start { lesson } => start(&mut store, &lesson, ctx).await,
        Commands::Complete { lesson, stars, time } => {
            complete(&mut store, &lesson, stars, time, ctx).await
        }
        Commands::Tasks => tasks(&store, ctx),
        Commands::Activity { kind } => activity(&mut store, kind, ctx).await,
        Commands::Quiz {
            lesson,
            correct,
            total,
        } => quiz(&mut store, &lesson, correct, total, ctx).await,
        Commands::Badges => badges(&store, ctx),
        // Handled before the store is opened
        Commands::Config { .. } => Ok(()),
    }
}

pub fn status(store: &ProgressStore, ctx: Ctx) -> Result<()> {
    if ctx.json {
        let achievement = store.achievement();
        return print_json(&json!({
            "level": store.level(),
            "level_info": store.level_info(),
            "total_stars": store.total_stars(),
            "level_progress": store.level_progress(),
            "current_streak": store.current_streak(),
            "longest_streak": achievement.map_or(0, |a| a.longest_streak),
            "completed_lessons": store.completed_lessons_count(),
            "total_lessons": store.total_lessons(),
            "badges": achievement.map(|a| &a.badges),
        }));
    }
    print!("{}", display::render_status(store, ctx.lang));
    Ok(())
}

pub fn lessons(store: &ProgressStore, unit: Option<&str>, ctx: Ctx) -> Result<()> {
    if let Some(unit_id) = unit {
        if store.curriculum().unit(unit_id).is_none() {
            bail!("Unknown unit '{}'", unit_id);
        }
    }

    if ctx.json {
        let rows: Vec<_> = store
            .curriculum()
            .all_lessons()
            .filter(|l| unit.map_or(true, |u| u == l.unit_id))
            .map(|l| {
                json!({
                    "id": l.id,
                    "unit_id": l.unit_id,
                    "title": display::text(&l.title, ctx.lang),
                    "kind": l.kind,
                    "status": store.lesson_status(&l.id),
                    "stars_reward": l.stars_reward,
                    "stars_earned": store.lesson_progress(&l.id).map_or(0, |p| p.stars_earned),
                })
            })
            .collect();
        return print_json(&rows);
    }
    print!("{}", display::render_lessons(store, unit, ctx.lang));
    Ok(())
}

/// The lesson must exist and be reachable from the learner's position
fn ensure_playable(store: &ProgressStore, lesson_id: &str) -> Result<()> {
    let curriculum = store.curriculum();
    if curriculum.lesson(lesson_id).is_none() {
        bail!("Unknown lesson '{}'", lesson_id);
    }
    if !store.lesson_status(lesson_id).is_playable() {
        let hint = curriculum
            .previous_lesson(lesson_id)
            .map(|p| format!(". Finish {} first", p.id))
            .unwrap_or_default();
        bail!("Lesson '{}' is locked{}", lesson_id, hint);
    }
    Ok(())
}

pub async fn start(store: &mut ProgressStore, lesson_id: &str, ctx: Ctx) -> Result<()> {
    ensure_playable(store, lesson_id)?;
    store.start_lesson(lesson_id).await?;

    if ctx.json {
        return print_json(&store.lesson_progress(lesson_id));
    }
    let title = store
        .curriculum()
        .lesson(lesson_id)
        .map(|l| display::text(&l.title, ctx.lang))
        .unwrap_or(lesson_id);
    println!("{} Started {} {}", "[>]".yellow(), lesson_id, title);
    Ok(())
}

pub async fn complete(
    store: &mut ProgressStore,
    lesson_id: &str,
    stars: Option<u32>,
    time_secs: u64,
    ctx: Ctx,
) -> Result<()> {
    ensure_playable(store, lesson_id)?;
    let stars = match stars {
        Some(stars) => stars,
        None => store
            .curriculum()
            .lesson(lesson_id)
            .map_or(0, |l| l.stars_reward),
    };

    let report = store
        .complete_lesson(lesson_id, stars, &CompletionMetadata::timed(time_secs))
        .await?;

    if ctx.json {
        return print_json(&report);
    }
    print!("{}", display::render_completion(&report, store.curriculum(), ctx.lang));
    Ok(())
}

pub fn tasks(store: &ProgressStore, ctx: Ctx) -> Result<()> {
    let set = store.daily_tasks().context("Daily tasks are not loaded")?;
    if ctx.json {
        return print_json(set);
    }
    print!("{}", display::render_tasks(set, ctx.lang));
    Ok(())
}

pub async fn activity(store: &mut ProgressStore, kind: TaskType, ctx: Ctx) -> Result<()> {
    let report = store.record_activity(kind).await?;
    if ctx.json {
        return print_json(&report);
    }
    print!("{}", display::render_activity(&report, store.curriculum(), ctx.lang));
    Ok(())
}

pub async fn quiz(
    store: &mut ProgressStore,
    lesson_id: &str,
    correct: u32,
    total: u32,
    ctx: Ctx,
) -> Result<()> {
    let report = store.record_quiz_result(lesson_id, correct, total).await?;
    if ctx.json {
        return print_json(&report);
    }
    print!("{}", display::render_quiz(&report, store.curriculum(), ctx.lang));
    Ok(())
}

pub fn badges(store: &ProgressStore, ctx: Ctx) -> Result<()> {
    if ctx.json {
        let held = store.achievement().map(|a| &a.badges);
        let rows: Vec<_> = forge_shared::achievements::all_badges()
            .into_iter()
            .map(|b| {
                json!({
                    "id": b.id,
                    "name": b.name,
                    "description": b.description,
                    "earned": held.map_or(false, |h| h.contains(b.id)),
                })
            })
            .collect();
        return print_json(&rows);
    }
    print!("{}", display::render_badges(store.achievement()));
    Ok(())
}

fn config_command(action: ConfigCommands, mut config: ForgeConfig, ctx: Ctx) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            if ctx.json {
                return print_json(&config);
            }
            print!("{}", flat_view(&config)?);
            println!("# database: {}", config.storage.db_path().display());
        }
        ConfigCommands::Path => {
            println!("{}", ForgeConfig::user_config_path()?.display());
        }
        ConfigCommands::SetBackend { backend } => {
            config.set_backend(&backend)?;
            let path = config.save()?;
            println!(
                "{} Storage backend set to {} ({})",
                "[OK]".bright_green(),
                backend,
                path.display()
            );
        }
        ConfigCommands::SetDbPath { path } => {
            config.storage.path = Some(path.clone());
            let saved = config.save()?;
            println!(
                "{} Database path set to {} ({})",
                "[OK]".bright_green(),
                path.display(),
                saved.display()
            );
        }
    }
    Ok(())
}

fn flat_view(config: &ForgeConfig) -> Result<String> {
    serde_json::to_value(config)
        .context("Failed to serialize configuration")
        .map(|v| format_value("", &v))
}

/// Flat `section.key = value` listing
fn format_value(prefix: &str, value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(k, v)| {
                let key = if prefix.is_empty() { k.clone() } else { format!("{}.{}", prefix, k) };
                format_value(&key, v)
            })
            .collect(),
        other => format!("{} = {}\n", prefix, other),
    }
}
