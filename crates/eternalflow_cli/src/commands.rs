//! Subcommand execution against the core service.
//!
//! # Invariants
//! - Every command opens the store, runs one service operation and exits.
//! - Failures surface as errors; the caller maps them to exit status.

use crate::config::{
    AddArgs, Cli, ClearArgs, Command, EditArgs, ExportArgs, ImportArgs, ListArgs, RemoveArgs,
    WatchArgs,
};
use crate::display::{render_card, TerminalSink};
use eternalflow_core::model::event::{clamp_title, needs_past_confirmation, EventId};
use eternalflow_core::{
    EmptyState, EventRepository, EventService, EventUpdate, SystemClock, MAX_TITLE_CHARS,
};
use log::info;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub type CliResult<T> = Result<T, Box<dyn Error>>;

type Service = EventService<Box<dyn EventRepository>>;

/// Opens the configured store and dispatches the subcommand.
pub fn run(cli: &Cli) -> CliResult<()> {
    let repo = cli.open_repository()?;
    let mut service = EventService::open(repo, Arc::new(SystemClock))?;
    if service.check_new_version() {
        eprintln!("eternalflow {} is ready", env!("CARGO_PKG_VERSION"));
    }

    info!(
        "event=cli_command module=cli status=ok command={}",
        command_name(&cli.command)
    );
    match &cli.command {
        Command::Add(args) => add(&mut service, args),
        Command::Edit(args) => edit(&mut service, args),
        Command::Rm(args) => remove(&mut service, args),
        Command::Clear(args) => clear(&mut service, args),
        Command::List(args) => list(&mut service, args),
        Command::Import(args) => import(&mut service, args),
        Command::Export(args) => export(&service, args).map(|_| ()),
        Command::Watch(args) => watch(&mut service, args),
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Add(_) => "add",
        Command::Edit(_) => "edit",
        Command::Rm(_) => "rm",
        Command::Clear(_) => "clear",
        Command::List(_) => "list",
        Command::Import(_) => "import",
        Command::Export(_) => "export",
        Command::Watch(_) => "watch",
    }
}

fn parse_id(raw: &str) -> CliResult<EventId> {
    EventId::parse(raw.trim()).ok_or_else(|| "event id cannot be blank".into())
}

/// Applies the title field limit to typed input, like a `maxlength` input.
fn title_input(raw: &str) -> String {
    let title = clamp_title(raw);
    if title.len() < raw.len() {
        eprintln!("note: title cut to {MAX_TITLE_CHARS} characters");
    }
    title
}

fn add(service: &mut Service, args: &AddArgs) -> CliResult<()> {
    let title = title_input(&args.title);
    let event = service.create_event(&title, &args.date)?;
    let now = service.now_ms();
    if needs_past_confirmation(event.date, now) {
        eprintln!("note: this date is already in the past");
    }
    println!("{}", render_card(&event, now));
    Ok(())
}

fn edit(service: &mut Service, args: &EditArgs) -> CliResult<()> {
    let id = parse_id(&args.id)?;
    service.begin_edit(&id)?;
    let title = args.title.as_deref().map(title_input);
    let result = service.update_event(
        &id,
        EventUpdate {
            title: title.as_deref(),
            date: args.date.as_deref(),
        },
    );
    let event = match result {
        Ok(event) => event,
        Err(err) => {
            service.cancel_edit();
            return Err(err.into());
        }
    };
    let now = service.now_ms();
    if args.date.is_some() && needs_past_confirmation(event.date, now) {
        eprintln!("note: this date is already in the past");
    }
    println!("{}", render_card(&event, now));
    Ok(())
}

fn remove(service: &mut Service, args: &RemoveArgs) -> CliResult<()> {
    let id = parse_id(&args.id)?;
    if service.delete_event(&id)? {
        println!("deleted {id}");
    } else {
        println!("no event {id}");
    }
    Ok(())
}

fn clear(service: &mut Service, args: &ClearArgs) -> CliResult<()> {
    if !args.yes {
        return Err("refusing to delete every event without --yes".into());
    }
    let removed = service.clear_all()?;
    println!("deleted {removed} event(s)");
    Ok(())
}

fn apply_view(service: &mut Service, args: &ListArgs) {
    if let Some(filter) = args.filter {
        service.set_filter(filter);
    }
    if let Some(sort) = args.sort {
        service.set_sort(sort);
    }
    if let Some(search) = &args.search {
        service.set_search(search.clone());
    }
}

fn list(service: &mut Service, args: &ListArgs) -> CliResult<()> {
    apply_view(service, args);
    let now = service.now_ms();
    let visible = service.refresh_visible();
    match visible.empty_state {
        Some(EmptyState::NoEvents) => println!("no events yet; add one with `eternalflow add`"),
        Some(EmptyState::NoMatches) => println!("nothing matches the search"),
        Some(EmptyState::NothingInFilter) => println!("no events in this filter"),
        None => {
            for event in &visible.events {
                println!("{}", render_card(event, now));
            }
        }
    }
    Ok(())
}

fn import(service: &mut Service, args: &ImportArgs) -> CliResult<()> {
    let raw = fs::read_to_string(&args.file)?;
    let report = service.import_json(&raw)?;
    println!(
        "imported {} event(s), skipped {} invalid, {} failed to save",
        report.imported, report.dropped, report.failed
    );
    Ok(())
}

fn export(service: &Service, args: &ExportArgs) -> CliResult<Option<PathBuf>> {
    let snapshot = service.export();
    if snapshot.is_empty() {
        println!("nothing to export");
        return Ok(None);
    }
    fs::create_dir_all(&args.out)?;
    let path = args.out.join(&snapshot.file_name);
    fs::write(&path, snapshot.to_json_pretty()?)?;
    println!(
        "exported {} event(s) to {}",
        snapshot.envelope.events.len(),
        path.display()
    );
    Ok(Some(path))
}

fn watch(service: &mut Service, args: &WatchArgs) -> CliResult<()> {
    apply_view(service, &args.list);
    service.attach_display(Arc::new(TerminalSink::default()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        service.start_timers()?;
        match args.seconds {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => tokio::signal::ctrl_c().await?,
        }
        service.stop_timers();
        Ok::<(), Box<dyn Error>>(())
    })
}

#[cfg(test)]
mod tests {
    use super::{export, run};
    use crate::config::{Cli, ExportArgs};
    use clap::Parser;
    use eternalflow_core::{Event, EventRepository, EventService, SystemClock};
    use std::path::Path;
    use std::sync::Arc;

    fn open_service(db: &Path) -> EventService<Box<dyn EventRepository>> {
        let repo = cli(db, "sqlite", &["list"]).open_repository().unwrap();
        EventService::open(repo, Arc::new(SystemClock)).unwrap()
    }

    fn load(db: &Path, store: &str) -> Vec<Event> {
        cli(db, store, &["list"])
            .open_repository()
            .unwrap()
            .load_all()
            .unwrap()
    }

    fn cli(db: &Path, store: &str, rest: &[&str]) -> Cli {
        let mut argv = vec![
            "eternalflow".to_string(),
            "--db".to_string(),
            db.display().to_string(),
            "--store".to_string(),
            store.to_string(),
        ];
        argv.extend(rest.iter().map(|arg| arg.to_string()));
        Cli::parse_from(argv)
    }

    #[test]
    fn add_edit_and_remove_round_trip_through_both_stores() {
        let dir = tempfile::tempdir().unwrap();
        for (store, file) in [("sqlite", "events.sqlite3"), ("flat", "events.json")] {
            let db = dir.path().join(file);
            run(&cli(&db, store, &["add", "Отпуск", "2031-07-01"])).unwrap();

            let events = load(&db, store);
            assert_eq!(events.len(), 1, "{store}");
            let id = events[0].id.to_string();

            run(&cli(&db, store, &["edit", &id, "--title", "Море"])).unwrap();
            let events = load(&db, store);
            assert_eq!(events[0].title, "Море", "{store}");

            run(&cli(&db, store, &["rm", &id])).unwrap();
            run(&cli(&db, store, &["rm", &id])).unwrap();
            assert!(load(&db, store).is_empty(), "{store}");
        }
    }

    #[test]
    fn overlong_title_is_cut_to_the_field_limit() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("events.json");
        let long = "ж".repeat(60);

        run(&cli(&db, "flat", &["add", &long, "2031-01-01"])).unwrap();
        let events = load(&db, "flat");
        assert_eq!(events[0].title, "ж".repeat(50));

        let id = events[0].id.to_string();
        let longer = "ы".repeat(70);
        run(&cli(&db, "flat", &["edit", &id, "--title", &longer])).unwrap();
        assert_eq!(load(&db, "flat")[0].title, "ы".repeat(50));
    }

    #[test]
    fn invalid_input_and_unconfirmed_clear_fail() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("events.sqlite3");

        assert!(run(&cli(&db, "sqlite", &["add", "  ", "2031-01-01"])).is_err());
        assert!(run(&cli(&db, "sqlite", &["edit", "missing", "--title", "x"])).is_err());
        assert!(run(&cli(&db, "sqlite", &["clear"])).is_err());
        run(&cli(&db, "sqlite", &["clear", "--yes"])).unwrap();
    }

    #[test]
    fn list_flags_are_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("events.json");
        let argv = ["list", "--filter", "past", "--sort", "added-desc"];
        run(&cli(&db, "flat", &argv)).unwrap();

        let repo = cli(&db, "flat", &["list"]).open_repository().unwrap();
        assert_eq!(repo.get_setting("filter").unwrap().as_deref(), Some("past"));
        assert_eq!(repo.get_setting("sort").unwrap().as_deref(), Some("added-desc"));
    }

    #[test]
    fn export_skips_empty_collection_and_writes_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("events.sqlite3");
        let out = dir.path().join("out");
        let args = ExportArgs { out: out.clone() };

        let service = open_service(&db);
        assert!(export(&service, &args).unwrap().is_none());
        drop(service);
        assert!(!out.exists());

        run(&cli(&db, "sqlite", &["add", "Релиз", "2031-01-01"])).unwrap();
        let service = open_service(&db);
        let path = export(&service, &args).unwrap().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("EternalFlow-export-") && name.ends_with(".json"));

        let other = dir.path().join("copy.sqlite3");
        run(&cli(&other, "sqlite", &["import", &path.display().to_string()])).unwrap();
        let events = load(&other, "sqlite");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "Релиз");
    }
}
