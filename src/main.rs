use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use understanding_check::config::{self, Config};
use understanding_check::models::{understanding_emoji, ClassName, HelpTopic, LearningGoals};
use understanding_check::store::{FileStore, GoalRegistry, ResponseStore};
use understanding_check::submission::Submission;
use understanding_check::{aggregate, export, report};

#[derive(Parser)]
#[command(name = "understanding-check", version)]
#[command(about = "Lesson understanding checks: set goals, collect responses, report results", long_about = None)]
struct Cli {
    /// Config file (defaults to ./understanding-check.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding goal and response files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Lesson date, YYYY-MM-DD (defaults to today)
    #[arg(long, global = true)]
    date: Option<NaiveDate>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default understanding-check.toml
    InitConfig,
    /// Manage the lesson's learning goals
    Goals {
        #[command(subcommand)]
        action: GoalsCommand,
    },
    /// Submit one student's understanding check
    Submit {
        /// Class, e.g. 3반 or 3
        #[arg(long)]
        class: ClassName,
        /// Student number (1-40)
        #[arg(long)]
        number: u8,
        /// Number of an achieved goal as listed by `goals show`; repeatable
        #[arg(long = "achieved")]
        achieved: Vec<usize>,
        /// Overall understanding, 1 (very hard) to 5 (fully understood)
        #[arg(long, default_value_t = 3)]
        level: u8,
        /// What was difficult (optional)
        #[arg(long, default_value = "")]
        difficult: String,
        /// Help topic: none, concept, problem-solving, practice, advanced, other
        #[arg(long, default_value = "none")]
        help_topic: HelpTopic,
    },
    /// Print aggregated results
    Report {
        /// Print the aggregate as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Write the CSV export and the text report
    Export {
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum GoalsCommand {
    /// Set up to five goals, in order
    Set {
        #[arg(required = true, num_args = 1..=5)]
        goals: Vec<String>,
    },
    /// List the goals for the date
    Show,
    /// Clear all goals for the date
    Reset,
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "understanding_check=debug"
    } else {
        "understanding_check=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_init_config() -> anyhow::Result<()> {
    let path = PathBuf::from(config::DEFAULT_CONFIG_FILE);
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    std::fs::write(&path, Config::default_toml())
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {}.", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::InitConfig = cli.command {
        return handle_init_config();
    }

    let config = Config::load(cli.config.as_deref())?;
    let data_dir = cli.data_dir.unwrap_or(config.storage.data_dir.clone());
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let files = FileStore::new(data_dir);
    debug!(data_dir = %files.dir().display(), %date, "using data directory");

    let mut registry = GoalRegistry::new(files.clone());
    let mut responses = ResponseStore::new(files);

    match cli.command {
        Commands::InitConfig => unreachable!("init-config returns before the config is loaded"),
        Commands::Goals { action } => match action {
            GoalsCommand::Set { goals } => {
                let goals = LearningGoals::from_labels(&goals)?;
                registry
                    .save_goals(date, &goals)
                    .context("failed to save learning goals")?;
                println!("Saved {} learning goals for {date}.", goals.active_count());
            }
            GoalsCommand::Show => {
                let goals = registry.load_goals(date)?;
                if goals.active_count() == 0 {
                    println!("No learning goals set for {date}.");
                } else {
                    println!("Learning goals for {date}:");
                    for (position, (_, label)) in goals.active().enumerate() {
                        println!("{}. {}", position + 1, label);
                    }
                }
            }
            GoalsCommand::Reset => {
                registry.reset_goals(date)?;
                println!("Cleared learning goals for {date}.");
            }
        },
        Commands::Submit {
            class,
            number,
            achieved,
            level,
            difficult,
            help_topic,
        } => {
            let goals = registry.load_goals(date)?;
            let active = goals.active_count();
            if let Some(bad) = achieved.iter().find(|n| **n == 0 || **n > active) {
                bail!("goal {bad} does not exist ({active} goals set for {date})");
            }

            let submission = Submission {
                class,
                student_num: number,
                goal_checks: goals.checks_for(&achieved),
                understanding_level: Some(level),
                difficult_part: difficult,
                help_needed: help_topic,
            };
            let response = submission.into_response(date, &goals, Local::now().naive_local())?;
            let total = responses
                .append(response)
                .context("failed to store response")?;

            println!(
                "Submitted for {class} #{number} {} ({total} responses for {date}).",
                understanding_emoji(level)
            );
        }
        Commands::Report { json } => {
            let goals = registry.load_goals(date)?;
            let collected = responses.load_for_date(date)?;
            let results = aggregate::compute_report(&collected, &goals, config.words.script);

            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                print!(
                    "{}",
                    report::render_summary(&results, date, config.words.max_words)
                );
            }
        }
        Commands::Export { out_dir } => {
            let goals = registry.load_goals(date)?;
            let collected = responses.load_for_date(date)?;
            if collected.is_empty() {
                println!("No responses for {date}; nothing to export.");
                return Ok(());
            }

            let out_dir = out_dir.unwrap_or(config.export.output_dir);
            std::fs::create_dir_all(&out_dir)
                .with_context(|| format!("failed to create {}", out_dir.display()))?;

            let csv_path = out_dir.join(export::csv_file_name(date));
            let file = std::fs::File::create(&csv_path)
                .with_context(|| format!("failed to create {}", csv_path.display()))?;
            export::write_csv(&export::to_tabular_export(&collected), file)?;

            let results = aggregate::compute_report(&collected, &goals, config.words.script);
            let report_path = out_dir.join(export::report_file_name(date));
            std::fs::write(&report_path, report::to_text_report(&results, date, &goals))
                .with_context(|| format!("failed to write {}", report_path.display()))?;

            info!(rows = collected.len(), "export complete");
            println!("CSV written to {}.", csv_path.display());
            println!("Report written to {}.", report_path.display());
        }
    }

    Ok(())
}
