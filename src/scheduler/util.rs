use super::select::filter_feasible;
use super::types::Ward;
use crate::calendar;
use crate::grid::ScheduleGrid;
use crate::model::{Duty, ShiftType, StaffMember};
use crate::rules::MAX_STAFF_NURSE_NIGHTS;

/// Libellé du jour `day` dans une ligne ; hors mois, `Unset`.
pub(super) fn at(row: &[ShiftType], day: u32) -> ShiftType {
    if day == 0 {
        return ShiftType::Unset;
    }
    row.get((day - 1) as usize)
        .copied()
        .unwrap_or(ShiftType::Unset)
}

/// Jours travaillés consécutifs se terminant à `day` inclus.
pub(super) fn work_streak_back(row: &[ShiftType], day: u32) -> u32 {
    let mut n = 0;
    let mut d = day;
    while d >= 1 && at(row, d).is_work() {
        n += 1;
        d -= 1;
    }
    n
}

/// Jours travaillés consécutifs commençant à `day` inclus.
pub(super) fn work_streak_forward(row: &[ShiftType], day: u32) -> u32 {
    let mut n = 0;
    let mut d = day;
    while at(row, d).is_work() {
        n += 1;
        d += 1;
    }
    n
}

/// Off consécutifs se terminant à `day` inclus.
pub(super) fn off_streak_back(row: &[ShiftType], day: u32) -> u32 {
    let mut n = 0;
    let mut d = day;
    while d >= 1 && at(row, d) == ShiftType::Off {
        n += 1;
        d -= 1;
    }
    n
}

/// Longueur du bloc travaillé si `day` devenait travaillé.
pub(super) fn work_block_if_set(row: &[ShiftType], day: u32) -> u32 {
    work_streak_back(row, day.saturating_sub(1)) + 1 + work_streak_forward(row, day + 1)
}

/// Longueur de la série de Off si `day` devenait Off.
pub(super) fn off_streak_if_set(row: &[ShiftType], day: u32) -> u32 {
    let mut n = 1;
    let mut d = day.saturating_sub(1);
    while d >= 1 && at(row, d) == ShiftType::Off {
        n += 1;
        d -= 1;
    }
    let mut d = day + 1;
    while at(row, d) == ShiftType::Off {
        n += 1;
        d += 1;
    }
    n
}

/// Le jour tombe dans les deux jours de repos qui suivent une nuit.
pub(super) fn in_rest_window(row: &[ShiftType], day: u32) -> bool {
    (1..=2).any(|back| day > back && at(row, day - back) == ShiftType::Night)
}

pub(super) fn count(row: &[ShiftType], shift: ShiftType) -> usize {
    row.iter().filter(|&&s| s == shift).count()
}

/// Une nuit reste permise pour cette personne ce jour-là :
/// une seule par mois pour une infirmière, dimanche/lundi/jeudi et une
/// seule aide-soignante à la fois pour les aides-soignantes.
pub(super) fn night_allowed(
    ward: &Ward<'_>,
    grid: &ScheduleGrid,
    slot: usize,
    member: &StaffMember,
    day: u32,
) -> bool {
    match member.duty() {
        Duty::StaffNurse => {
            count(grid.row(slot), ShiftType::Night) < MAX_STAFF_NURSE_NIGHTS
                || grid.get(slot, day) == ShiftType::Night
        }
        Duty::AssistantNurse => {
            calendar::is_assistant_night_day(grid.year(), grid.month(), day)
                && ward
                    .members_on(grid, Duty::AssistantNurse)
                    .iter()
                    .all(|&(other, _)| other == slot || grid.get(other, day) != ShiftType::Night)
        }
        Duty::Supervisor | Duty::NightDedicated => true,
    }
}

/// Types travaillés qu'on peut poser sans casser de règle locale ce jour-là,
/// hors `exclude`. Vide si le jour est un repos de nuit obligatoire.
pub(super) fn work_candidates(
    ward: &Ward<'_>,
    grid: &ScheduleGrid,
    slot: usize,
    member: &StaffMember,
    day: u32,
    exclude: &[ShiftType],
) -> Vec<ShiftType> {
    let row = grid.row(slot);
    if in_rest_window(row, day) {
        return Vec::new();
    }
    let types: Vec<ShiftType> = member
        .work_types()
        .into_iter()
        .filter(|s| !exclude.contains(s))
        .collect();
    let next_is_day = at(row, day + 1) == ShiftType::Day;
    filter_feasible(&types, row, day)
        .into_iter()
        .filter(|&s| !(s == ShiftType::Evening && next_is_day))
        .filter(|&s| s != ShiftType::Night || night_allowed(ward, grid, slot, member, day))
        .collect()
}

/// Type travaillé posable à `day` sans créer de jour après un soir :
/// jour, sinon soir si le lendemain n'est pas un jour.
pub(super) fn cover_label(row: &[ShiftType], day: u32) -> Option<ShiftType> {
    if day <= 1 || at(row, day - 1) != ShiftType::Evening {
        Some(ShiftType::Day)
    } else if at(row, day + 1) != ShiftType::Day {
        Some(ShiftType::Evening)
    } else {
        None
    }
}

/// Affectation possible pour le rééquilibrage : type ouvert à la personne,
/// pas de soir suivi d'un jour (dans les deux sens), pas dans un repos de
/// nuit, bloc travaillé résultant sous le plafond.
pub(super) fn can_assign_at(
    ward: &Ward<'_>,
    grid: &ScheduleGrid,
    slot: usize,
    member: &StaffMember,
    day: u32,
    shift: ShiftType,
) -> bool {
    if !shift.is_work() || !member.can_work(shift) {
        return false;
    }
    let row = grid.row(slot);
    if shift == ShiftType::Day && day > 1 && at(row, day - 1) == ShiftType::Evening {
        return false;
    }
    if shift == ShiftType::Evening && at(row, day + 1) == ShiftType::Day {
        return false;
    }
    if in_rest_window(row, day) {
        return false;
    }
    if shift == ShiftType::Night
        && (filter_feasible(&[shift], row, day).is_empty()
            || !night_allowed(ward, grid, slot, member, day))
    {
        return false;
    }
    work_block_if_set(row, day) <= ward.constraints().max_consecutive_days
}

/// Pose deux jours Off après une nuit. `overwrite` : écrase aussi les
/// cases déjà renseignées.
pub(super) fn rest_after_night(
    grid: &mut ScheduleGrid,
    slot: usize,
    day: u32,
    overwrite: bool,
) -> usize {
    let mut changed = 0;
    for next in [day + 1, day + 2] {
        let done = if overwrite {
            grid.set(slot, next, ShiftType::Off)
        } else {
            grid.fill(slot, next, ShiftType::Off)
        };
        changed += usize::from(done);
    }
    changed
}

/// Libellé attendu d'une nuit fixe : cycle N,N,O,O décalé de deux jours une
/// personne sur deux.
pub(crate) fn night_dedicated_label(day: u32, index: usize) -> ShiftType {
    let phase = (index % 2) as u32 * 2;
    match (day - 1 + phase) % 4 {
        0 | 1 => ShiftType::Night,
        _ => ShiftType::Off,
    }
}

/// Libellé attendu d'un cadre : Off les week-ends et fériés, jour sinon.
pub(crate) fn supervisor_label(year: i32, month: u32, day: u32) -> ShiftType {
    if calendar::is_holiday(year, month, day) {
        ShiftType::Off
    } else {
        ShiftType::Day
    }
}

/// Ordre de visite alterné : 1, N, 2, N-1, ...
pub(super) fn zigzag_days(days: u32) -> Vec<u32> {
    let mut out = Vec::with_capacity(days as usize);
    let (mut lo, mut hi) = (1, days);
    while lo <= hi {
        out.push(lo);
        if lo != hi {
            out.push(hi);
        }
        lo += 1;
        hi = hi.saturating_sub(1);
    }
    out
}
