#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use roulement::{
    calendar, io,
    model::{Eligibility, Role, ShiftType, StaffMember},
    report::{prepare_report, TextSummary},
    storage::{JsonStorage, Storage},
    SavedSchedule, Scheduler,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planning mensuel d'équipe soignante (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de l'unité
    #[arg(long, global = true, default_value = "roster.json")]
    roster: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer le personnel depuis un CSV
    ImportStaff {
        #[arg(long)]
        csv: String,
    },

    /// Ajouter une personne
    AddStaff {
        #[arg(long)]
        name: String,
        /// HN, RN ou AN
        #[arg(long)]
        role: Role,
        /// Types acceptés, ex. "DEN"
        #[arg(long)]
        shifts: Option<String>,
        #[arg(long)]
        night_dedicated: bool,
    },

    /// Modifier une personne (les options absentes sont conservées)
    UpdateStaff {
        #[arg(long)]
        name: String,
        /// Nouveau nom
        #[arg(long)]
        rename: Option<String>,
        #[arg(long)]
        role: Option<Role>,
        #[arg(long)]
        shifts: Option<String>,
        #[arg(long)]
        night_dedicated: Option<bool>,
        #[arg(long)]
        weekend: Option<bool>,
    },

    /// Retirer une personne (et ses lignes des plannings enregistrés)
    RemoveStaff {
        #[arg(long)]
        name: String,
    },

    /// Mettre à jour les compteurs de congés
    SetVacation {
        #[arg(long)]
        name: String,
        #[arg(long)]
        remaining: Option<u32>,
        #[arg(long)]
        used: Option<u32>,
    },

    /// Fixer le besoin quotidien d'un rôle sur un type de poste
    SetStaffing {
        #[arg(long)]
        role: Role,
        /// D, E, N ou M
        #[arg(long)]
        shift: ShiftType,
        #[arg(long)]
        count: u32,
    },

    /// Modifier les contraintes de travail (les options absentes sont conservées)
    SetConstraints {
        #[arg(long)]
        min_days_off: Option<u32>,
        #[arg(long)]
        max_consecutive_days: Option<u32>,
        #[arg(long)]
        max_consecutive_off_days: Option<u32>,
        #[arg(long)]
        max_night_shifts: Option<u32>,
    },

    /// Épingler une case (ou toute une grille CSV) avant génération
    Pin {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long, requires_all = ["day", "shift"], conflicts_with = "csv")]
        name: Option<String>,
        #[arg(long)]
        day: Option<u32>,
        #[arg(long)]
        shift: Option<ShiftType>,
        /// Grille `name,1,2,...`
        #[arg(long)]
        csv: Option<String>,
    },

    /// Générer le planning du mois
    Generate {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// Graine pour un résultat reproductible
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        out_csv: Option<String>,
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Afficher le planning enregistré et son bilan
    Show {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },

    /// Vérifier les règles sur le planning enregistré
    Check {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// Export CSV des violations (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Supprimer le planning enregistré d'un mois
    Reset {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.roster)?;
    let mut roster = storage.load_or_default()?;

    let code = match cli.cmd {
        Commands::ImportStaff { csv } => {
            let staff = io::import_staff_csv(csv)?;
            println!("{} staff member(s) imported", staff.len());
            roster.staff.extend(staff);
            storage.save(&roster)?;
            0
        }
        Commands::AddStaff {
            name,
            role,
            shifts,
            night_dedicated,
        } => {
            if roster.find_staff_by_name(&name).is_some() {
                bail!("staff name already exists: {name}");
            }
            let mut member = StaffMember::new(name, role);
            if let Some(codes) = shifts {
                member = member.with_eligibility(
                    Eligibility::from_codes(&codes).map_err(anyhow::Error::msg)?,
                );
            }
            if night_dedicated {
                member = member.night_dedicated();
            }
            println!("{} added ({})", member.name, member.id);
            roster.staff.push(member);
            storage.save(&roster)?;
            0
        }
        Commands::UpdateStaff {
            name,
            rename,
            role,
            shifts,
            night_dedicated,
            weekend,
        } => {
            if let Some(new_name) = rename.as_deref() {
                if new_name != name && roster.find_staff_by_name(new_name).is_some() {
                    bail!("staff name already exists: {new_name}");
                }
            }
            let member = roster
                .find_staff_mut_by_name(&name)
                .with_context(|| format!("unknown staff name: {name}"))?;
            if let Some(role) = role {
                member.role = role;
            }
            if let Some(codes) = shifts {
                member.eligibility = Eligibility::from_codes(&codes).map_err(anyhow::Error::msg)?;
            }
            if let Some(v) = night_dedicated {
                member.night_dedicated = v;
            }
            if let Some(v) = weekend {
                member.weekend_eligible = v;
            }
            if let Some(new_name) = rename {
                member.name = new_name;
            }
            println!("{} updated", member.name);
            storage.save(&roster)?;
            0
        }
        Commands::RemoveStaff { name } => {
            let id = roster
                .find_staff_by_name(&name)
                .map(|m| m.id.clone())
                .with_context(|| format!("unknown staff name: {name}"))?;
            roster.remove_staff(&id);
            storage.save(&roster)?;
            println!("{name} removed");
            0
        }
        Commands::SetVacation {
            name,
            remaining,
            used,
        } => {
            let member = roster
                .find_staff_mut_by_name(&name)
                .with_context(|| format!("unknown staff name: {name}"))?;
            if let Some(v) = remaining {
                member.remaining_vacation = v;
            }
            if let Some(v) = used {
                member.used_vacation = v;
            }
            println!(
                "{}: {} remaining, {} used",
                member.name, member.remaining_vacation, member.used_vacation
            );
            storage.save(&roster)?;
            0
        }
        Commands::SetStaffing { role, shift, count } => {
            if !shift.is_work() {
                bail!("staffing applies to work shifts only (D, E, N, M)");
            }
            roster.staffing.set(role, shift, count);
            storage.save(&roster)?;
            0
        }
        Commands::SetConstraints {
            min_days_off,
            max_consecutive_days,
            max_consecutive_off_days,
            max_night_shifts,
        } => {
            let mut c = roster.constraints.clone().unwrap_or_default();
            if let Some(v) = min_days_off {
                c.min_days_off = v;
            }
            if let Some(v) = max_consecutive_days {
                c.max_consecutive_days = v;
            }
            if let Some(v) = max_consecutive_off_days {
                c.max_consecutive_off_days = v;
            }
            if let Some(v) = max_night_shifts {
                c.max_night_shifts = v;
            }
            c.validate().map_err(anyhow::Error::msg)?;
            roster.constraints = Some(c);
            storage.save(&roster)?;
            0
        }
        Commands::Pin {
            year,
            month,
            name,
            day,
            shift,
            csv,
        } => {
            let days = calendar::month_length(year, month)
                .with_context(|| format!("invalid month: {year}-{month}"))?;
            let mut pins = Vec::new();
            if let Some(path) = csv {
                for (id, row) in io::import_grid_csv(path, &roster)? {
                    pins.extend(row.into_iter().map(|(d, s)| (id.clone(), d, s)));
                }
            } else if let (Some(name), Some(day), Some(shift)) = (name, day, shift) {
                let member = roster
                    .find_staff_by_name(&name)
                    .with_context(|| format!("unknown staff name: {name}"))?;
                pins.push((member.id.clone(), day, shift));
            } else {
                bail!("either --csv or --name/--day/--shift is required");
            }
            if let Some((_, day, _)) = pins.iter().find(|(_, d, _)| *d == 0 || *d > days) {
                bail!("day {day} is outside {year}-{month:02}");
            }

            let mut saved = roster
                .schedule_for(year, month)
                .cloned()
                .unwrap_or_else(|| SavedSchedule::new(year, month));
            for (id, day, shift) in &pins {
                saved.pin(id, *day, *shift, days);
            }
            roster.upsert_schedule(saved);
            storage.save(&roster)?;
            println!("{} cell(s) pinned", pins.len());
            0
        }
        Commands::Generate {
            year,
            month,
            seed,
            out_csv,
            out_json,
        } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let constraints = roster.constraints_for(year, month);
            let outcome = Scheduler::optimize_from(&roster, year, month, constraints, &mut rng)?;

            if let Some(path) = out_csv {
                io::export_grid_csv(path, &outcome.schedule, &roster.staff)?;
            }
            if let Some(path) = out_json {
                io::export_outcome_json(path, &outcome, &roster.staff)?;
            }
            roster.upsert_schedule(SavedSchedule::from(&outcome.schedule));
            storage.save(&roster)?;

            println!("{}", outcome.message);
            for v in &outcome.violations {
                eprintln!("- {v}");
            }
            // Code 2 = WARNING/INCOMPLETE
            if outcome.success {
                0
            } else {
                2
            }
        }
        Commands::Show { year, month } => {
            let text = prepare_report(&roster, year, month, &TextSummary)?;
            print!("{text}");
            0
        }
        Commands::Check {
            year,
            month,
            report,
        } => {
            let saved = roster
                .schedule_for(year, month)
                .with_context(|| format!("no saved schedule for {year}-{month:02}"))?;
            let map = saved.to_map().map_err(anyhow::Error::msg)?;
            let scheduler =
                Scheduler::new(roster.staff.clone(), roster.constraints_for(year, month));
            let mut grid = scheduler.blank_grid(year, month);
            grid.seed(&map);
            let violations = scheduler.validate(&grid);
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                if let Some(path) = report {
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["kind", "staff", "day", "detail"])?;
                    for v in &violations {
                        let staff = v
                            .staff
                            .as_ref()
                            .and_then(|id| roster.find_staff_by_id(id))
                            .map(|m| m.name.as_str())
                            .unwrap_or("");
                        let kind = format!("{:?}", v.kind);
                        let day = v.day.map(|d| d.to_string()).unwrap_or_default();
                        w.write_record([kind.as_str(), staff, day.as_str(), v.detail.as_str()])?;
                    }
                    w.flush()?;
                }
                2
            }
        }
        Commands::Reset { year, month } => {
            if roster.remove_schedule(year, month) {
                storage.save(&roster)?;
                println!("schedule {year}-{month:02} removed");
            } else {
                println!("no schedule for {year}-{month:02}");
            }
            0
        }
    };

    std::process::exit(code);
}
