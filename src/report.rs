use crate::grid::{self, ScheduleGrid};
use crate::model::{Duty, Roster, ShiftType, StaffMember};
use anyhow::{bail, Context, Result};
use std::fmt::Write as _;

/// Bilan mensuel d'une personne.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffSummary {
    pub name: String,
    pub worked: usize,
    pub off: usize,
    pub nights: usize,
    /// Repos encore à poser pour atteindre le minimum.
    pub remaining_off: usize,
}

/// Effectif d'un jour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySummary {
    pub day: u32,
    pub workers: usize,
    pub shortfall: usize,
}

pub fn summarize_staff(
    grid: &ScheduleGrid,
    staff: &[StaffMember],
    min_days_off: u32,
) -> Vec<StaffSummary> {
    staff
        .iter()
        .filter_map(|m| {
            let slot = grid.slot_of(&m.id)?;
            Some(StaffSummary {
                name: m.name.clone(),
                worked: grid.work_days(slot),
                off: grid.count_in_row(slot, ShiftType::Off),
                nights: grid.count_in_row(slot, ShiftType::Night),
                remaining_off: grid::remaining_off(grid, &m.id, min_days_off),
            })
        })
        .collect()
}

pub fn summarize_days(grid: &ScheduleGrid, required: usize) -> Vec<DaySummary> {
    (1..=grid.days())
        .map(|day| DaySummary {
            day,
            workers: grid::worker_count(grid, day),
            shortfall: grid::shortfall(grid, day, required),
        })
        .collect()
}

/// Tableau d'affichage : une ligne d'en-tête (`Nom`, puis les jours), puis une
/// ligne par personne. Les nuits fixes sont préfixées `N-`.
pub fn grid_rows(grid: &ScheduleGrid, staff: &[StaffMember]) -> Vec<Vec<String>> {
    let mut header = vec!["Nom".to_string()];
    header.extend((1..=grid.days()).map(|d| d.to_string()));
    let mut rows = vec![header];
    for member in staff {
        let Some(slot) = grid.slot_of(&member.id) else { continue };
        let label = if member.duty() == Duty::NightDedicated {
            format!("N-{}", member.name)
        } else {
            member.name.clone()
        };
        let mut row = vec![label];
        row.extend(grid.row(slot).iter().map(ToString::to_string));
        rows.push(row);
    }
    rows
}

/// Permet de customiser le rendu du bilan (texte, mail, etc.).
pub trait SummaryRenderer {
    fn render(&self, rows: &[Vec<String>], staff: &[StaffSummary], days: &[DaySummary]) -> String;
}

/// Rendu texte à colonnes fixes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextSummary;

impl SummaryRenderer for TextSummary {
    fn render(&self, rows: &[Vec<String>], staff: &[StaffSummary], days: &[DaySummary]) -> String {
        let width = rows
            .iter()
            .filter_map(|r| r.first())
            .map(|n| n.chars().count())
            .max()
            .unwrap_or(0);
        let mut out = String::new();
        for row in rows {
            let Some((name, cells)) = row.split_first() else { continue };
            let _ = write!(out, "{name:<width$}");
            for cell in cells {
                let _ = write!(out, " {cell:>2}");
            }
            out.push('\n');
        }
        out.push('\n');
        for s in staff {
            let _ = writeln!(
                out,
                "{:<width$} travail {:>2} | repos {:>2} | nuits {:>2} | repos manquants {}",
                s.name, s.worked, s.off, s.nights, s.remaining_off
            );
        }
        let short: Vec<String> = days
            .iter()
            .filter(|d| d.shortfall > 0)
            .map(|d| format!("{} (-{})", d.day, d.shortfall))
            .collect();
        if !short.is_empty() {
            let _ = writeln!(out, "\nJours en sous-effectif : {}", short.join(", "));
        }
        out
    }
}

/// Prépare le bilan du planning enregistré pour un mois.
pub fn prepare_report(
    roster: &Roster,
    year: i32,
    month: u32,
    renderer: &dyn SummaryRenderer,
) -> Result<String> {
    let saved = roster
        .schedule_for(year, month)
        .with_context(|| format!("no saved schedule for {year}-{month:02}"))?;
    let map = saved.to_map().map_err(anyhow::Error::msg)?;
    if map.is_empty() {
        bail!("saved schedule for {year}-{month:02} is empty");
    }

    let mut staff = roster.staff.clone();
    crate::model::sort_by_duty(&mut staff);
    let mut grid = ScheduleGrid::new(year, month, staff.iter().map(|s| s.id.clone()));
    grid.seed(&map);

    let constraints = roster.constraints_for(year, month);
    let required = roster.staffing.aggregate().total() as usize;
    let rows = grid_rows(&grid, &staff);
    let staff_summary = summarize_staff(&grid, &staff, constraints.min_days_off);
    let days = summarize_days(&grid, required);
    Ok(renderer.render(&rows, &staff_summary, &days))
}
