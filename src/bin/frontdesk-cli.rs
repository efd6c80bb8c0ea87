#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use frontdesk::{
    io,
    presets::{ForecastPreset, PresetStore},
    storage::{JsonStorage, PlanningRequest, Storage},
    OccupancyForecast, PlanOutcome, Planner,
};
use std::time::Duration;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification du front office (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de la demande (équipe, prévision, règles)
    #[arg(long, global = true, default_value = "request.json")]
    request: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer une demande à partir de l'équipe de référence
    Init {
        /// Preset de prévision (high, medium, low ou fichier du répertoire de presets)
        #[arg(long, default_value = "medium")]
        preset: String,
        #[arg(long, default_value = "presets")]
        presets_dir: String,
        /// Lundi de la semaine planifiée (YYYY-MM-DD)
        #[arg(long)]
        week_start: Option<String>,
        /// Remplacer l'équipe par un CSV
        #[arg(long)]
        roster_csv: Option<String>,
        /// Remplacer la prévision par un CSV
        #[arg(long)]
        forecast_csv: Option<String>,
        /// Écraser un fichier existant
        #[arg(long)]
        force: bool,
    },

    /// Afficher les besoins par créneau
    Demand {
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Calculer le planning
    Plan {
        #[arg(long)]
        max_nodes: Option<u64>,
        #[arg(long)]
        time_limit_ms: Option<u64>,
        /// Résultat complet (JSON)
        #[arg(long)]
        out_json: Option<String>,
        /// Planning (CSV)
        #[arg(long)]
        out_csv: Option<String>,
        /// Charges par employé (CSV)
        #[arg(long)]
        stats_csv: Option<String>,
    },

    /// Contrôler un planning édité à la main
    Validate {
        /// CSV `employee_id,day,period`
        #[arg(long)]
        assignment: String,
        /// Export CSV des écarts (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Gérer les presets de prévision
    Presets {
        #[arg(long, default_value = "presets")]
        dir: String,
        #[command(subcommand)]
        cmd: PresetCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PresetCommands {
    /// Lister presets intégrés et enregistrés
    List,
    /// Afficher un preset
    Show { id: String },
    /// Enregistrer la prévision de la demande comme preset
    Save {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Remplacer la prévision de la demande par un preset
    Apply {
        id: String,
        #[arg(long)]
        week_start: Option<String>,
    },
}

fn parse_week_start(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date: {s}")))
        .transpose()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.request)?;

    let code = match cli.cmd {
        Commands::Init {
            preset,
            presets_dir,
            week_start,
            roster_csv,
            forecast_csv,
            force,
        } => {
            if storage.path().exists() && !force {
                bail!("{} already exists (use --force)", storage.path().display());
            }
            let week_start = parse_week_start(week_start.as_deref())?;
            let forecast = match forecast_csv {
                Some(path) => {
                    let mut forecast = io::import_forecast_csv(path)?;
                    forecast.week_start = week_start;
                    forecast
                }
                None => PresetStore::new(&presets_dir).load(&preset)?.to_forecast(week_start),
            };
            let mut request = PlanningRequest::reference(forecast);
            if let Some(path) = roster_csv {
                request.roster = io::import_roster_csv(path)?;
            }
            storage.save(&request)?;
            println!(
                "Request written to {} ({} employees)",
                storage.path().display(),
                request.roster.len()
            );
            0
        }
        Commands::Demand { out_json } => {
            let request = storage.load()?;
            let demand = Planner::new(request.rules).demand(&request.forecast)?;
            if let Some(path) = out_json {
                io::export_json(path, &demand)?;
            }
            for req in demand.iter() {
                println!(
                    "{:<14} | load {:>4} | desk >= {} | supervisors >= {} | concierge {}",
                    req.slot.to_string(),
                    req.guest_load,
                    req.receptionist_min,
                    req.supervisor_min,
                    if req.concierge_required { "yes" } else { "no" }
                );
            }
            0
        }
        Commands::Plan {
            max_nodes,
            time_limit_ms,
            out_json,
            out_csv,
            stats_csv,
        } => {
            let request = storage.load()?;
            let mut options = request.options;
            if let Some(n) = max_nodes {
                options.max_nodes = n;
            }
            if let Some(ms) = time_limit_ms {
                options.time_limit = Duration::from_millis(ms);
            }
            let planner = Planner::new(request.rules.clone()).with_options(options);
            let outcome = planner.plan(&request.roster, &request.forecast)?;

            if let Some(path) = out_json {
                io::export_json(path, &outcome)?;
            }
            if let Some(assignment) = outcome.assignment() {
                if let Some(path) = out_csv {
                    io::export_assignment_csv(path, &request.roster, assignment)?;
                }
            }
            if let Some(statistics) = outcome.statistics() {
                if let Some(path) = stats_csv {
                    io::export_statistics_csv(path, statistics)?;
                }
                println!(
                    "{} shifts, {} hours, ratio compliance {:.1}%",
                    statistics.total_shifts, statistics.total_hours, statistics.ratio_compliance
                );
            }

            match &outcome {
                PlanOutcome::Success { report, .. } => {
                    println!("OK: optimal plan (objective {:?})", report.objective);
                    0
                }
                PlanOutcome::PartialSuccess {
                    violations,
                    non_optimal,
                    stop,
                    ..
                } => {
                    if *non_optimal {
                        eprintln!("Best plan found before budget stop ({stop:?}), not proven optimal");
                    }
                    for v in violations {
                        eprintln!("{v}");
                    }
                    // Code 2 = WARNING/INCOMPLETE
                    2
                }
                PlanOutcome::Infeasible(diagnostic) => {
                    eprintln!("{diagnostic}");
                    3
                }
            }
        }
        Commands::Validate { assignment, report } => {
            let request = storage.load()?;
            let assignment = io::import_assignment_csv(assignment)?;
            let violations = Planner::new(request.rules).validate(
                &request.roster,
                &request.forecast,
                &assignment,
            )?;
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                for v in &violations {
                    eprintln!("{v}");
                }
                if let Some(path) = report {
                    io::export_violations_csv(path, &violations)?;
                }
                2
            }
        }
        Commands::Presets { dir, cmd } => {
            let store = PresetStore::new(&dir);
            match cmd {
                PresetCommands::List => {
                    for preset in ForecastPreset::builtins() {
                        println!("{} | {} | builtin", preset.id, preset.name);
                    }
                    for info in store.list()? {
                        println!("{} | {} | {}", info.preset.id, info.preset.name, info.path.display());
                    }
                    0
                }
                PresetCommands::Show { id } => {
                    let preset = store.load(&id)?;
                    println!("{}", serde_json::to_string_pretty(&preset)?);
                    0
                }
                PresetCommands::Save {
                    id,
                    name,
                    description,
                } => {
                    let request = storage.load()?;
                    let preset = ForecastPreset {
                        id,
                        name,
                        description,
                        days: request.forecast.days,
                    };
                    let path = store.save(&preset)?;
                    println!("Preset saved to {}", path.display());
                    0
                }
                PresetCommands::Apply { id, week_start } => {
                    let mut request = storage.load()?;
                    let week_start = parse_week_start(week_start.as_deref())?
                        .or(request.forecast.week_start);
                    let forecast: OccupancyForecast = store.load(&id)?.to_forecast(week_start);
                    request.forecast = forecast;
                    storage.save(&request)?;
                    println!("Forecast replaced by preset {id}");
                    0
                }
            }
        }
    };

    std::process::exit(code);
}
