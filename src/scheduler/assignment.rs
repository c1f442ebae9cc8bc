//! Génération par rôle. Ces passes n'écrivent que dans les cases encore
//! non renseignées : les cases épinglées et déjà posées sont conservées.

use super::select::select_by_preference;
use super::types::Ward;
use super::util::{self, at};
use crate::calendar;
use crate::grid::ScheduleGrid;
use crate::model::{Duty, ShiftType, StaffMember};
use rand::Rng;

/// Motif des aides-soignantes : jour, jour, soir, repos.
const ASSISTANT_PATTERN: [ShiftType; 4] = [
    ShiftType::Day,
    ShiftType::Day,
    ShiftType::Evening,
    ShiftType::Off,
];

/// Répartit les repos à tour de rôle : chaque jour où personne du groupe
/// n'est Off, la prochaine personne (dans l'ordre des Off déjà posés) dont la
/// case est libre reçoit un Off.
pub fn pre_place_alternate_off(grid: &mut ScheduleGrid, slots: &[usize]) -> usize {
    if slots.is_empty() {
        return 0;
    }
    let mut order = slots.to_vec();
    order.sort_by_key(|&slot| grid.count_in_row(slot, ShiftType::Off));

    let mut changed = 0;
    let mut cursor = 0usize;
    for day in 1..=grid.days() {
        if order.iter().any(|&slot| grid.get(slot, day) == ShiftType::Off) {
            continue;
        }
        for step in 0..order.len() {
            let i = (cursor + step) % order.len();
            if grid.fill(order[i], day, ShiftType::Off) {
                changed += 1;
                cursor = i + 1;
                break;
            }
        }
    }
    changed
}

/// Cadre : Off les week-ends et fériés, jour sinon.
pub fn assign_supervisor(grid: &mut ScheduleGrid, slot: usize) -> usize {
    let (year, month) = (grid.year(), grid.month());
    (1..=grid.days())
        .filter(|&day| grid.fill(slot, day, util::supervisor_label(year, month, day)))
        .count()
}

/// Nuits fixes : cycle N,N,O,O, décalé de deux jours une personne sur deux.
/// Sans éligibilité de nuit, la case passe Off.
pub fn assign_night_dedicated(grid: &mut ScheduleGrid, members: &[(usize, &StaffMember)]) -> usize {
    let mut changed = 0;
    for (index, &(slot, member)) in members.iter().enumerate() {
        for day in 1..=grid.days() {
            let label = match util::night_dedicated_label(day, index) {
                ShiftType::Night if !member.eligibility.night => ShiftType::Off,
                label => label,
            };
            changed += usize::from(grid.fill(slot, day, label));
        }
    }
    changed
}

/// Infirmière : remplissage glouton borné par les quotas du mois.
///
/// Les cases déjà posées comptent dans les séries et les totaux. Un jour est
/// Off si la série de repos atteint son plafond, si le quota de travail est
/// atteint, si la série travaillée est au plafond ou si aucun type n'est
/// faisable ; sinon il est travaillé. Après une nuit, les deux jours suivants
/// passent Off. Enfin, complément jusqu'au minimum de jours travaillés.
/// Les séries de repos trop longues ainsi créées sont coupées ensuite par le
/// limiteur de séries.
pub fn assign_staff_nurse<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    slot: usize,
    member: &StaffMember,
    rng: &mut R,
) -> usize {
    let c = ward.constraints();
    let days = grid.days();
    let max_work = c.max_work_days(days);
    let min_work = c.min_work_days(days);

    let mut changed = 0;
    let mut worked = 0u32;
    let mut work_run = 0u32;
    let mut off_run = 0u32;

    for day in 1..=days {
        let current = grid.get(slot, day);
        if current != ShiftType::Unset {
            if current.is_work() {
                worked += 1;
                work_run += 1;
                off_run = 0;
            } else {
                work_run = 0;
                off_run += 1;
            }
            continue;
        }

        let must_rest = off_run >= c.max_consecutive_off_days
            || worked >= max_work
            || work_run >= c.max_consecutive_days;
        let candidates = if must_rest {
            Vec::new()
        } else {
            util::work_candidates(ward, grid, slot, member, day, &[])
        };
        let pick = select_by_preference(&candidates, member, rng);

        changed += usize::from(grid.fill(slot, day, pick));
        if pick.is_work() {
            worked += 1;
            work_run += 1;
            off_run = 0;
            if pick == ShiftType::Night {
                changed += util::rest_after_night(grid, slot, day, false);
            }
        } else {
            work_run = 0;
            off_run += 1;
        }
    }

    changed + top_up_work_days(ward, grid, slot, member, min_work, rng)
}

/// Convertit des jours libres (non renseignés, ou Off non épinglés) en jours
/// travaillés tant que le minimum n'est pas atteint.
fn top_up_work_days<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    slot: usize,
    member: &StaffMember,
    min_work: u32,
    rng: &mut R,
) -> usize {
    let mut worked = grid.work_days(slot) as u32;
    let mut changed = 0;
    for day in 1..=grid.days() {
        if worked >= min_work {
            break;
        }
        let current = grid.get(slot, day);
        let free = current == ShiftType::Unset
            || (current == ShiftType::Off && !grid.is_pinned(slot, day));
        if !free {
            continue;
        }
        let candidates = util::work_candidates(ward, grid, slot, member, day, &[]);
        if candidates.is_empty() {
            continue;
        }
        let pick = select_by_preference(&candidates, member, rng);
        if grid.set(slot, day, pick) {
            changed += 1;
            worked += 1;
            if pick == ShiftType::Night {
                changed += util::rest_after_night(grid, slot, day, false);
            }
        }
    }
    changed
}

/// Aides-soignantes, phase A : une nuit par dimanche, lundi et jeudi.
///
/// Les jours cibles sont partagés équitablement entre les aides-soignantes
/// éligibles à la nuit (reste distribué aux premières). À chaque jour, on
/// retient la personne la moins chargée encore sous son quota, en tournant
/// pour ne pas reprendre deux fois de suite la même.
pub fn assign_assistant_nights(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    members: &[(usize, &StaffMember)],
) -> usize {
    let eligible: Vec<usize> = members
        .iter()
        .filter(|(_, m)| m.can_work(ShiftType::Night))
        .map(|&(slot, _)| slot)
        .collect();
    if eligible.is_empty() {
        return 0;
    }
    let (year, month) = (grid.year(), grid.month());
    let targets: Vec<u32> = (1..=grid.days())
        .filter(|&d| calendar::is_assistant_night_day(year, month, d))
        .collect();

    let n = eligible.len();
    let base = targets.len() / n;
    let extra = targets.len() % n;
    let quota: Vec<usize> = (0..n).map(|i| base + usize::from(i < extra)).collect();
    let mut nights: Vec<usize> = eligible
        .iter()
        .map(|&slot| {
            targets
                .iter()
                .filter(|&&d| grid.get(slot, d) == ShiftType::Night)
                .count()
        })
        .collect();

    let mut changed = 0;
    let mut last: Option<usize> = None;
    for &day in &targets {
        let covered = ward
            .members_on(grid, Duty::AssistantNurse)
            .iter()
            .any(|&(slot, _)| grid.get(slot, day) == ShiftType::Night);
        if covered {
            continue;
        }
        let start = last.map_or(0, |i| i + 1);
        let pick = (0..n)
            .map(|step| (start + step) % n)
            .filter(|&i| nights[i] < quota[i])
            .filter(|&i| grid.get(eligible[i], day) == ShiftType::Unset)
            .filter(|&i| {
                let row = grid.row(eligible[i]);
                !util::in_rest_window(row, day)
                    && [day + 1, day + 2].into_iter().all(|d| !at(row, d).is_work())
            })
            .min_by_key(|&i| nights[i]);
        let Some(i) = pick else { continue };

        let slot = eligible[i];
        if grid.fill(slot, day, ShiftType::Night) {
            changed += 1 + util::rest_after_night(grid, slot, day, false);
            nights[i] += 1;
            last = Some(i);
        }
    }
    changed
}

/// Aides-soignantes, phase B : motif jour, jour, soir, repos décalé selon le
/// rang de la personne, puis complément jusqu'au minimum de jours travaillés.
pub fn assign_assistant_pattern<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    members: &[(usize, &StaffMember)],
    rng: &mut R,
) -> usize {
    let min_work = ward.constraints().min_work_days(grid.days());
    let mut changed = 0;
    for (index, &(slot, member)) in members.iter().enumerate() {
        for day in 1..=grid.days() {
            if grid.get(slot, day) != ShiftType::Unset {
                continue;
            }
            let label = ASSISTANT_PATTERN[(day as usize - 1 + index) % ASSISTANT_PATTERN.len()];
            let pick = if label == ShiftType::Off {
                ShiftType::Off
            } else {
                let candidates =
                    util::work_candidates(ward, grid, slot, member, day, &[ShiftType::Night]);
                if candidates.contains(&label) {
                    label
                } else {
                    select_by_preference(&candidates, member, rng)
                }
            };
            changed += usize::from(grid.fill(slot, day, pick));
        }
        changed += top_up_work_days(ward, grid, slot, member, min_work, rng);
    }
    changed
}
