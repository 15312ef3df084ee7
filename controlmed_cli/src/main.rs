use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use controlmed_core::*;
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "controlmed")]
#[command(about = "Personal medication reminder tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List active treatments with their next dose (default)
    List,

    /// Show one medication in full, with its upcoming week of doses
    Show { id: Uuid },

    /// Add a new medication
    Add {
        /// Medication name
        #[arg(long)]
        name: String,

        /// Condition being treated
        #[arg(long)]
        condition: String,

        /// First day of treatment (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day of treatment (YYYY-MM-DD)
        #[arg(long)]
        end: String,

        /// Time of the first daily dose (HH:MM)
        #[arg(long, default_value = "08:00")]
        first_dose: String,

        /// Hours between doses
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=24))]
        interval: u32,
    },

    /// Edit an existing medication
    Edit {
        id: Uuid,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        condition: Option<String>,

        /// First day of treatment (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Last day of treatment (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Time of the first daily dose (HH:MM)
        #[arg(long)]
        first_dose: Option<String>,

        /// Hours between doses
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=24))]
        interval: Option<u32>,
    },

    /// Delete a medication
    Delete { id: Uuid },

    /// List finished treatments, most recently finished first
    History,

    /// Show scheduled doses for one day
    Calendar {
        /// Day to show (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Search medications by name or condition
    Search { query: String },
}

type Store = MedicationStore<FileBlobStore>;

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        controlmed_core::logging::init_with_level("debug");
    } else {
        controlmed_core::logging::init();
    }

    let config = Config::load()?;
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    let mut store = MedicationStore::new(FileBlobStore::new(data_dir.join(BLOB_FILE_NAME)));

    match cli.command {
        Some(Commands::List) | None => cmd_list(&mut store),
        Some(Commands::Show { id }) => cmd_show(&mut store, id),
        Some(Commands::Add {
            name,
            condition,
            start,
            end,
            first_dose,
            interval,
        }) => cmd_add(&mut store, name, condition, &start, &end, &first_dose, interval),
        Some(Commands::Edit {
            id,
            name,
            condition,
            start,
            end,
            first_dose,
            interval,
        }) => cmd_edit(&mut store, id, name, condition, start, end, first_dose, interval),
        Some(Commands::Delete { id }) => cmd_delete(&mut store, id),
        Some(Commands::History) => cmd_history(&mut store),
        Some(Commands::Calendar { date }) => cmd_calendar(&mut store, date),
        Some(Commands::Search { query }) => cmd_search(&mut store, &query),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(raw, "%Y-%m-%d")?)
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    Ok(NaiveTime::parse_from_str(raw, "%H:%M")?)
}

fn cmd_list(store: &mut Store) -> Result<()> {
    let now = Local::now().naive_local();
    let medications = store.list_active(now.date())?;

    if medications.is_empty() {
        println!("No active medications. Add one with `controlmed add`.");
        return Ok(());
    }

    println!("Active medications ({}):", medications.len());
    for medication in &medications {
        print_medication(medication, Some(now));
    }

    Ok(())
}

fn cmd_show(store: &mut Store, id: Uuid) -> Result<()> {
    let Some(medication) = store.get_by_id(id) else {
        eprintln!("No medication found with id {}", id);
        return Ok(());
    };

    let now = Local::now().naive_local();
    print_medication(&medication, Some(now));

    // The scheduler replicates the schedule across whatever range it is
    // given, so clip the upcoming week to the treatment dates here.
    let from = now.date().max(medication.start_date);
    let to = (now.date() + Duration::days(6)).min(medication.end_date);
    if from <= to {
        println!("    upcoming doses:");
        let occurrences = occurrences_in_range(&medication, Some(from), Some(to));
        for day in occurrences.chunk_by(|a, b| a.date == b.date) {
            let times: Vec<String> = day
                .iter()
                .map(|o| o.time_of_day.format("%H:%M").to_string())
                .collect();
            println!("      {}  {}", day[0].date, times.join("  "));
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    store: &mut Store,
    name: String,
    condition: String,
    start: &str,
    end: &str,
    first_dose: &str,
    interval: u32,
) -> Result<()> {
    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;
    let first_dose_time = parse_time(first_dose)?;

    if end_date < start_date {
        return Err(Error::Other("end date must not be before start date".into()));
    }

    let medication = store.create(MedicationDraft {
        name,
        condition,
        start_date,
        end_date,
        first_dose_time,
        interval_hours: interval,
    })?;

    println!("✓ Added {} ({})", medication.name, medication.id);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_edit(
    store: &mut Store,
    id: Uuid,
    name: Option<String>,
    condition: Option<String>,
    start: Option<String>,
    end: Option<String>,
    first_dose: Option<String>,
    interval: Option<u32>,
) -> Result<()> {
    let Some(existing) = store.get_by_id(id) else {
        eprintln!("No medication found with id {}", id);
        return Ok(());
    };

    let patch = MedicationPatch {
        name,
        condition,
        start_date: start.as_deref().map(parse_date).transpose()?,
        end_date: end.as_deref().map(parse_date).transpose()?,
        first_dose_time: first_dose.as_deref().map(parse_time).transpose()?,
        interval_hours: interval,
    };

    let effective_start = patch.start_date.unwrap_or(existing.start_date);
    let effective_end = patch.end_date.unwrap_or(existing.end_date);
    if effective_end < effective_start {
        return Err(Error::Other("end date must not be before start date".into()));
    }

    match store.update(id, patch)? {
        Some(updated) => println!("✓ Updated {} ({})", updated.name, updated.id),
        None => eprintln!("No medication found with id {}", id),
    }

    Ok(())
}

fn cmd_delete(store: &mut Store, id: Uuid) -> Result<()> {
    if store.delete(id)? {
        println!("✓ Deleted {}", id);
    } else {
        eprintln!("No medication found with id {}", id);
    }

    Ok(())
}

fn cmd_history(store: &mut Store) -> Result<()> {
    let medications = store.list_historical();

    if medications.is_empty() {
        println!("No finished treatments yet.");
        return Ok(());
    }

    println!("Finished treatments ({}):", medications.len());
    for medication in &medications {
        println!();
        println!("  {}  ({})", medication.name, medication.condition);
        println!(
            "    {} to {}, every {}h",
            medication.start_date, medication.end_date, medication.interval_hours
        );
    }

    Ok(())
}

fn cmd_calendar(store: &mut Store, date: Option<String>) -> Result<()> {
    let date = match date {
        Some(raw) => parse_date(&raw)?,
        None => Local::now().date_naive(),
    };

    // Query the whole visible month, like the calendar view, then narrow to
    // the selected day.
    let month_start = date.with_day(1).unwrap_or(date);
    let month_end = month_start
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(date);

    let medications = store.list_by_date_range(month_start, month_end);
    let on_day: Vec<&Medication> = medications.iter().filter(|m| m.covers(date)).collect();

    println!("Doses for {}:", date);
    if on_day.is_empty() {
        println!("  no medications scheduled");
        return Ok(());
    }

    for medication in on_day {
        let times: Vec<String> = doses_on_date(medication, date)
            .iter()
            .map(|t| t.format("%H:%M").to_string())
            .collect();
        println!(
            "  {}  ({}): {}",
            medication.name,
            medication.condition,
            times.join("  ")
        );
    }

    Ok(())
}

fn cmd_search(store: &mut Store, query: &str) -> Result<()> {
    let results = store.search(query);

    if results.is_empty() {
        println!("No medications match \"{}\"", query);
        return Ok(());
    }

    println!("Matches for \"{}\" ({}):", query, results.len());
    for medication in &results {
        let state = if medication.active { "active" } else { "finished" };
        println!(
            "  [{}] {}  ({})  {} to {}",
            state,
            medication.name,
            medication.condition,
            medication.start_date,
            medication.end_date
        );
    }

    Ok(())
}

fn print_medication(medication: &Medication, now: Option<NaiveDateTime>) {
    println!();
    println!("  {}  ({})", medication.name, medication.condition);
    println!("    id: {}", medication.id);
    println!(
        "    {} to {}, every {}h starting {}",
        medication.start_date,
        medication.end_date,
        medication.interval_hours,
        medication.first_dose_time.format("%H:%M")
    );

    let times: Vec<String> = times_of_day(medication)
        .iter()
        .map(|t| t.format("%H:%M").to_string())
        .collect();
    println!("    doses: {}", times.join("  "));

    if let Some(now) = now {
        match next_dose(medication, now) {
            Some(next) => println!("    next dose: {}", next),
            None => println!("    next dose: treatment finished"),
        }
    }
}
