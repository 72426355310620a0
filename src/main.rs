mod age;
mod birthday;
mod config;
mod controller;
mod countdown;
mod error;
mod insights;
mod milestones;
mod numerology;
mod report;
mod storage;
mod svg;
mod utils;
mod zodiac;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{NaiveDate, Utc};
use std::fs;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::{Config, LOG_DIRECTIVE};
use crate::controller::{Controller, InsightsState};
use crate::insights::{DisabledInsights, GeminiClient, InsightsGateway};
use crate::storage::{
    BirthdayUpdate, DEFAULT_REMINDER_DAYS, FileStore, PersistenceGateway, REMINDER_DAY_OPTIONS,
};
use crate::svg::Theme;
use crate::utils::parse_iso_date;

const USAGE: &str = "\
usage: nakshatra_path <command>

  show <YYYY-MM-DD> [--json]        age, countdown, zodiac, milestones and insights
  watch <YYYY-MM-DD>                live countdown until Ctrl-C
  card <YYYY-MM-DD> [file.svg]      write a shareable card (default birthday-card.svg)
  save <name> <YYYY-MM-DD> [days]   save a birthday with a reminder lead time
  list                              saved birthdays and active reminders
  remind <id> on|off|<days>         change a saved birthday's reminder
  delete <id>                       remove a saved birthday
  theme [light|dark|starry|glitter] show or change the theme";

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    initialize_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args).await {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// Initialize the logging system
fn initialize_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(LOG_DIRECTIVE.parse().expect("valid log directive")),
        )
        .init();
}

fn insights_gateway(config: &Config) -> Arc<dyn InsightsGateway> {
    match &config.gemini_api_key {
        Some(key) => Arc::new(GeminiClient::new(
            key.clone(),
            config.gemini_model.clone(),
            config.gemini_base_url.clone(),
        )),
        None => Arc::new(DisabledInsights),
    }
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    parse_iso_date(input).ok_or_else(|| anyhow!("invalid date {input:?}, expected YYYY-MM-DD"))
}

async fn run(args: &[String]) -> Result<()> {
    let config = Config::from_env()?;
    let store = PersistenceGateway::new(FileStore::new(&config.data_dir));
    let argv: Vec<&str> = args.iter().map(String::as_str).collect();

    match argv.as_slice() {
        ["show", date] => show(&config, parse_date(date)?, false).await,
        ["show", date, "--json"] => show(&config, parse_date(date)?, true).await,
        ["watch", date] => watch(&config, parse_date(date)?).await,
        ["card", date] => card(&config, &store, parse_date(date)?, "birthday-card.svg").await,
        ["card", date, out] => card(&config, &store, parse_date(date)?, out).await,
        ["save", name, date] => save(&store, name, parse_date(date)?, DEFAULT_REMINDER_DAYS),
        ["save", name, date, days] => {
            let days = days.parse().with_context(|| format!("invalid reminder days {days:?}"))?;
            save(&store, name, parse_date(date)?, days)
        }
        ["list"] => {
            let now = Utc::now();
            println!("{}", report::render_saved(&store.saved_birthdays(), now));
            for due in store.reminders_due(now) {
                println!("Reminder: {}'s birthday is {}", due.name, due.days_away_label(now));
            }
            Ok(())
        }
        ["remind", id, setting] => remind(&store, id, setting),
        ["delete", id] => {
            if !store.delete_birthday(id)? {
                bail!("no saved birthday with id {id}");
            }
            println!("Deleted {id}");
            Ok(())
        }
        ["theme"] => {
            println!("{}", store.theme());
            Ok(())
        }
        ["theme", name] => {
            let theme: Theme = name.parse()?;
            store.save_theme(theme)?;
            println!("Theme set to {theme}");
            Ok(())
        }
        _ => {
            println!("{USAGE}");
            Ok(())
        }
    }
}

/// Select `date` and wait until its insights have either arrived or failed.
async fn settle(controller: &mut Controller, date: NaiveDate) -> Result<InsightsState> {
    let mut insights = controller.subscribe_insights();
    controller.select_date(date);
    let state = insights
        .wait_for(|s| matches!(s, InsightsState::Ready(_) | InsightsState::Failed(_)))
        .await
        .context("insights channel closed")?
        .clone();
    Ok(state)
}

async fn show(config: &Config, date: NaiveDate, as_json: bool) -> Result<()> {
    let mut controller = Controller::new(insights_gateway(config));
    let state = settle(&mut controller, date).await?;

    let info = controller
        .subscribe_info()
        .borrow()
        .clone()
        .context("no birthday information published")?;
    if as_json {
        println!("{}", report::render_json(&info, &state)?);
    } else {
        println!("{}", report::render_dashboard(&info, &state));
    }
    Ok(())
}

async fn watch(config: &Config, date: NaiveDate) -> Result<()> {
    let mut controller = Controller::new(insights_gateway(config));
    let mut info_rx = controller.subscribe_info();
    let mut insights_rx = controller.subscribe_insights();
    controller.select_date(date);

    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            changed = info_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(info) = info_rx.borrow_and_update().as_ref() {
                    write!(stdout, "\rNext birthday in {}   ", report::countdown_line(&info.countdown))?;
                    stdout.flush()?;
                }
            }
            changed = insights_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = insights_rx.borrow_and_update().clone();
                if let InsightsState::Failed(message) = state {
                    writeln!(stdout, "\r{message}")?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                writeln!(stdout)?;
                break;
            }
        }
    }

    debug!(
        selected = ?controller.selected(),
        ticking = controller.is_ticking(),
        "stopping countdown"
    );
    controller.clear();
    Ok(())
}

async fn card<S: storage::KeyValueStore>(
    config: &Config,
    store: &PersistenceGateway<S>,
    date: NaiveDate,
    out: &str,
) -> Result<()> {
    let mut controller = Controller::new(insights_gateway(config));
    let state = settle(&mut controller, date).await?;
    let payload = match &state {
        InsightsState::Ready(payload) => Some(payload),
        InsightsState::Failed(message) => {
            eprintln!("{message}");
            None
        }
        _ => None,
    };

    let info = birthday::calculate_birthday_info(date, Utc::now());
    let svg = svg::generate_card_svg(&info, payload, store.theme());
    fs::write(out, svg).with_context(|| format!("failed to write {out}"))?;
    println!("Generated {out} successfully.");
    Ok(())
}

fn save<S: storage::KeyValueStore>(
    store: &PersistenceGateway<S>,
    name: &str,
    date: NaiveDate,
    reminder_days: u32,
) -> Result<()> {
    if name.trim().is_empty() {
        bail!("name must not be empty");
    }
    check_reminder_days(reminder_days)?;
    let saved = store.add_birthday(name, date, reminder_days)?;
    println!("Saved {} ({}) as {}", saved.name, saved.date, saved.id);
    Ok(())
}

fn remind<S: storage::KeyValueStore>(store: &PersistenceGateway<S>, id: &str, setting: &str) -> Result<()> {
    let update = match setting {
        "on" => BirthdayUpdate {
            reminder_enabled: Some(true),
            ..Default::default()
        },
        "off" => BirthdayUpdate {
            reminder_enabled: Some(false),
            ..Default::default()
        },
        days => BirthdayUpdate {
            reminder_days: Some(
                days.parse()
                    .with_context(|| format!("expected on, off or a number of days, got {days:?}"))?,
            ),
            ..Default::default()
        },
    };

    if let Some(days) = update.reminder_days {
        check_reminder_days(days)?;
    }
    let updated = store.update_birthday(id, update)?;
    println!(
        "{}: reminder {} ({} days before)",
        updated.name,
        if updated.reminder_enabled { "on" } else { "off" },
        updated.reminder_days
    );
    Ok(())
}

fn check_reminder_days(days: u32) -> Result<()> {
    if !REMINDER_DAY_OPTIONS.contains(&days) {
        bail!("reminder days must be one of {REMINDER_DAY_OPTIONS:?}, got {days}");
    }
    Ok(())
}
