use crate::grid::{ScheduleGrid, ScheduleMap};
use crate::model::{Eligibility, Roster, ShiftType, StaffMember};
use crate::scheduler::ScheduleOutcome;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Import du personnel depuis CSV : header
/// `name,role[,shifts][,night_dedicated][,weekend][,remaining_vacation][,used_vacation]`.
///
/// `role` : HN/RN/AN ; `shifts` : codes acceptés, ex. `DEN` (défaut selon le rôle).
pub fn import_staff_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<StaffMember>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        let role = rec.get(1).context("missing role")?.trim();
        if name.is_empty() || role.is_empty() {
            bail!("invalid staff row (empty)");
        }
        let role = role
            .parse()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid role for {name}"))?;
        let mut member = StaffMember::new(name, role);

        if let Some(codes) = non_empty(rec.get(2)) {
            member.eligibility = Eligibility::from_codes(codes)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid shifts for {name}"))?;
        }
        if let Some(flag) = non_empty(rec.get(3)) {
            member.night_dedicated = parse_bool(flag)
                .with_context(|| format!("invalid night_dedicated value for {name}"))?;
        }
        if let Some(flag) = non_empty(rec.get(4)) {
            member.weekend_eligible =
                parse_bool(flag).with_context(|| format!("invalid weekend value for {name}"))?;
        }
        if let Some(n) = non_empty(rec.get(5)) {
            member.remaining_vacation = n
                .parse()
                .with_context(|| format!("invalid remaining_vacation for {name}"))?;
        }
        if let Some(n) = non_empty(rec.get(6)) {
            member.used_vacation = n
                .parse()
                .with_context(|| format!("invalid used_vacation for {name}"))?;
        }
        out.push(member);
    }
    Ok(out)
}

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "oui" => Ok(true),
        "false" | "0" | "no" | "n" | "non" => Ok(false),
        _ => bail!("expected boolean"),
    }
}

/// Import d'une grille saisie à la main : header `name,1,2,...` et un code
/// par case (vide ou `-` pour laisser libre). Les noms doivent exister.
pub fn import_grid_csv<P: AsRef<Path>>(path: P, roster: &Roster) -> anyhow::Result<ScheduleMap> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    let days: Vec<u32> = headers
        .iter()
        .skip(1)
        .map(|h| h.trim().parse::<u32>().with_context(|| format!("invalid day column: {h}")))
        .collect::<anyhow::Result<_>>()?;

    let mut out = ScheduleMap::new();
    for rec in rdr.records() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        let member = roster
            .find_staff_by_name(name)
            .with_context(|| format!("unknown staff name: {name}"))?;
        let mut row = BTreeMap::new();
        for (day, raw) in days.iter().zip(rec.iter().skip(1)) {
            let shift: ShiftType = raw
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("{name}, day {day}"))?;
            if shift != ShiftType::Unset {
                row.insert(*day, shift);
            }
        }
        out.insert(member.id.clone(), row);
    }
    Ok(out)
}

/// Export CSV de la grille : header `name,role,1,2,...`.
pub fn export_grid_csv<P: AsRef<Path>>(
    path: P,
    grid: &ScheduleGrid,
    staff: &[StaffMember],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    let mut header = vec!["name".to_string(), "role".to_string()];
    header.extend((1..=grid.days()).map(|d| d.to_string()));
    w.write_record(&header)?;
    for member in staff {
        let Some(slot) = grid.slot_of(&member.id) else { continue };
        let mut record = vec![member.name.clone(), member.role.code().to_string()];
        record.extend(grid.row(slot).iter().map(|s| s.code().to_string()));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct OutcomeDoc<'a> {
    success: bool,
    message: &'a str,
    year: i32,
    month: u32,
    schedule: BTreeMap<&'a str, String>,
    violations: Vec<&'a str>,
}

/// Export JSON du résultat : planning par nom, message et violations.
pub fn export_outcome_json<P: AsRef<Path>>(
    path: P,
    outcome: &ScheduleOutcome,
    staff: &[StaffMember],
) -> anyhow::Result<()> {
    let grid = &outcome.schedule;
    let schedule: BTreeMap<&str, String> = staff
        .iter()
        .filter_map(|m| {
            let slot = grid.slot_of(&m.id)?;
            let codes = grid.row(slot).iter().map(|s| s.code()).collect::<String>();
            Some((m.name.as_str(), codes))
        })
        .collect();
    let doc = OutcomeDoc {
        success: outcome.success,
        message: &outcome.message,
        year: grid.year(),
        month: grid.month(),
        schedule,
        violations: outcome.violations.iter().map(|v| v.detail.as_str()).collect(),
    };
    fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}
