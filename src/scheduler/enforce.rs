//! Passes d'application des règles dures. Elles peuvent réécrire n'importe
//! quelle case, épinglée ou non, et renvoient le nombre de cases modifiées :
//! un second passage immédiat ne change plus rien.

use super::select::{filter_feasible, select_by_preference};
use super::types::Ward;
use super::util::{self, at};
use crate::grid::ScheduleGrid;
use crate::model::{Duty, Role, ShiftType, StaffMember};
use rand::Rng;
use tracing::trace;

/// Règles appliquées d'abord aux cases saisies à la main : repos après une
/// nuit, pas de jour après un soir, séries de repos trop longues coupées.
/// Les nuits fixes sont laissées à leur motif.
pub fn apply_pinned_constraints<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    rng: &mut R,
) -> usize {
    let mut changed = 0;
    for (slot, member) in ward.members(grid) {
        if member.duty() == Duty::NightDedicated {
            continue;
        }
        changed += night_rest_row(grid, slot, false);
        changed += evening_day_row(ward, grid, slot, member, rng);
        changed += break_off_runs(ward, grid, slot, member, rng);
    }
    changed
}

/// Plafonds de séries, hors nuits fixes.
///
/// 1. au-delà de `max_consecutive_days` jours travaillés, le jour en trop passe Off ;
/// 2. au-delà de `max_consecutive_off_days` repos, un jour de la série devient
///    travaillé (le dernier si possible, jour par défaut).
pub fn enforce_consecutive_limits<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    rng: &mut R,
) -> usize {
    let max_work = ward.constraints().max_consecutive_days;
    let mut changed = 0;
    for (slot, member) in ward.members(grid) {
        if member.duty() == Duty::NightDedicated {
            continue;
        }
        let mut run = 0;
        for day in 1..=grid.days() {
            if !grid.get(slot, day).is_work() {
                run = 0;
                continue;
            }
            run += 1;
            if run > max_work {
                changed += usize::from(grid.set(slot, day, ShiftType::Off));
                run = 0;
            }
        }
        changed += break_off_runs(ward, grid, slot, member, rng);
    }
    changed
}

/// Coupe les séries de Off plus longues que le plafond. Le jour converti est
/// le plus tardif de la série qui reste faisable sans dépasser le plafond de
/// travail ; à défaut, le jour en excès passe en jour.
fn break_off_runs<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    slot: usize,
    member: &StaffMember,
    rng: &mut R,
) -> usize {
    let c = ward.constraints();
    let mut changed = 0;
    let mut run_start = 0;
    let mut run = 0;
    for day in 1..=grid.days() {
        if grid.get(slot, day) != ShiftType::Off {
            run = 0;
            continue;
        }
        if run == 0 {
            run_start = day;
        }
        run += 1;
        if run <= c.max_consecutive_off_days {
            continue;
        }

        let choice = (run_start..=day).rev().find_map(|d| {
            if util::work_block_if_set(grid.row(slot), d) > c.max_consecutive_days {
                return None;
            }
            let candidates = util::work_candidates(ward, grid, slot, member, d, &[]);
            (!candidates.is_empty()).then_some((d, candidates))
        });
        let (target, label) = match choice {
            Some((d, candidates)) => (d, select_by_preference(&candidates, member, rng)),
            None => (day, ShiftType::Day),
        };
        trace!(staff = %member.id, day = target, shift = %label, "breaking off run");
        changed += usize::from(grid.set(slot, target, label));
        if label == ShiftType::Night {
            changed += util::rest_after_night(grid, slot, target, false);
        }
        run = day - target;
        if run > 0 {
            run_start = target + 1;
        }
    }
    changed
}

/// Deux jours Off après chaque nuit. Pour une nuit fixe, le repos suit le
/// dernier jour d'un bloc de nuits consécutives.
pub fn enforce_night_rest(ward: &Ward<'_>, grid: &mut ScheduleGrid) -> usize {
    ward.members(grid)
        .into_iter()
        .map(|(slot, member)| night_rest_row(grid, slot, member.duty() == Duty::NightDedicated))
        .sum()
}

fn night_rest_row(grid: &mut ScheduleGrid, slot: usize, block: bool) -> usize {
    let mut changed = 0;
    for day in 1..=grid.days() {
        if grid.get(slot, day) != ShiftType::Night {
            continue;
        }
        if block && grid.get(slot, day + 1) == ShiftType::Night {
            continue;
        }
        changed += util::rest_after_night(grid, slot, day, true);
    }
    changed
}

/// Pas de jour au lendemain d'un soir : le jour est remplacé par un choix
/// pondéré parmi soir, nuit (et matin pour une aide-soignante), restreint à
/// ce qui ne casse pas d'autre règle ; Off quand rien d'autre ne tient.
pub fn enforce_evening_day<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    rng: &mut R,
) -> usize {
    let mut changed = 0;
    for (slot, member) in ward.members(grid) {
        changed += evening_day_row(ward, grid, slot, member, rng);
    }
    changed
}

fn evening_day_row<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    slot: usize,
    member: &StaffMember,
    rng: &mut R,
) -> usize {
    let nurses = ward.members_on(grid, Duty::StaffNurse);
    let mut changed = 0;
    for day in 2..=grid.days() {
        if grid.get(slot, day - 1) != ShiftType::Evening || grid.get(slot, day) != ShiftType::Day {
            continue;
        }
        let mut alternatives = vec![ShiftType::Evening, ShiftType::Night];
        if member.role == Role::AssistantNurse {
            alternatives.push(ShiftType::Morning);
        }
        let row = grid.row(slot);
        let evening_taken = member.duty() == Duty::StaffNurse
            && nurses
                .iter()
                .any(|&(other, _)| other != slot && grid.get(other, day) == ShiftType::Evening);
        let evening_ok = at(row, day + 1) != ShiftType::Day && !evening_taken;
        let night_ok = !filter_feasible(&[ShiftType::Night], row, day).is_empty()
            && util::night_allowed(ward, grid, slot, member, day);
        alternatives.retain(|&s| match s {
            ShiftType::Evening => evening_ok,
            ShiftType::Night => night_ok,
            other => member.can_work(other),
        });
        let pick = if alternatives.is_empty() {
            ShiftType::Off
        } else {
            select_by_preference(&alternatives, member, rng)
        };
        changed += usize::from(grid.set(slot, day, pick));
        if pick == ShiftType::Night {
            changed += util::rest_after_night(grid, slot, day, false);
        }
    }
    changed
}

/// Une nuit fixe ne tient ni jour, ni soir, ni matin : ces cases passent Off.
pub fn clear_night_dedicated_day_shifts(ward: &Ward<'_>, grid: &mut ScheduleGrid) -> usize {
    let mut changed = 0;
    for (slot, _) in ward.members_on(grid, Duty::NightDedicated) {
        for day in 1..=grid.days() {
            if matches!(
                grid.get(slot, day),
                ShiftType::Day | ShiftType::Evening | ShiftType::Morning
            ) {
                changed += usize::from(grid.set(slot, day, ShiftType::Off));
            }
        }
    }
    changed
}

/// Impose le cycle N,N,O,O aux nuits fixes. Avec `override_pins` à faux, les
/// cases épinglées restent telles quelles.
pub fn enforce_night_dedicated_pattern(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    override_pins: bool,
) -> usize {
    let mut changed = 0;
    for (index, (slot, _)) in ward
        .members_on(grid, Duty::NightDedicated)
        .into_iter()
        .enumerate()
    {
        for day in 1..=grid.days() {
            if !override_pins && grid.is_pinned(slot, day) {
                continue;
            }
            changed += usize::from(grid.set(slot, day, util::night_dedicated_label(day, index)));
        }
    }
    changed
}

/// Cadres : jour en semaine, Off les week-ends et fériés, sans exception.
pub fn enforce_supervisor_pattern(ward: &Ward<'_>, grid: &mut ScheduleGrid) -> usize {
    let (year, month) = (grid.year(), grid.month());
    let mut changed = 0;
    for (slot, _) in ward.members_on(grid, Duty::Supervisor) {
        for day in 1..=grid.days() {
            changed += usize::from(grid.set(slot, day, util::supervisor_label(year, month, day)));
        }
    }
    changed
}

/// Au moins une infirmière au travail chaque jour, et au plus une du soir.
/// Les soirs en trop sont réaffectés à un autre type faisable, sinon Off,
/// et en dernier recours au jour.
pub fn enforce_staff_nurse_coverage<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    rng: &mut R,
) -> usize {
    let nurses = ward.members_on(grid, Duty::StaffNurse);
    if nurses.is_empty() {
        return 0;
    }
    let max_off = ward.constraints().max_consecutive_off_days;
    let mut changed = 0;

    for day in 1..=grid.days() {
        if !nurses.iter().any(|&(slot, _)| grid.get(slot, day).is_work()) {
            changed += cover_day(ward, grid, &nurses, day);
        }

        let evenings: Vec<(usize, &StaffMember)> = nurses
            .iter()
            .copied()
            .filter(|&(slot, _)| grid.get(slot, day) == ShiftType::Evening)
            .collect();
        for &(slot, member) in evenings.iter().skip(1) {
            let candidates =
                util::work_candidates(ward, grid, slot, member, day, &[ShiftType::Evening]);
            let pick = if !candidates.is_empty() {
                select_by_preference(&candidates, member, rng)
            } else if util::off_streak_if_set(grid.row(slot), day) <= max_off {
                ShiftType::Off
            } else {
                ShiftType::Day
            };
            changed += usize::from(grid.set(slot, day, pick));
            if pick == ShiftType::Night {
                changed += util::rest_after_night(grid, slot, day, false);
            }
        }
    }
    changed
}

/// Met une infirmière au travail un jour où aucune ne l'est. Par ordre de
/// préférence :
/// 1. une affectation qui ne casse aucune règle de ligne (jour d'abord, type
///    accepté d'abord) ;
/// 2. une affectation qui allonge trop un bloc travaillé, recoupé par un Off
///    un jour où une autre infirmière travaille ;
/// 3. une infirmière hors repos de nuit ;
/// 4. la première.
///
/// Le type posé est le jour, ou le soir au lendemain d'un soir.
fn cover_day(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    nurses: &[(usize, &StaffMember)],
    day: u32,
) -> usize {
    let Some(&(first, _)) = nurses.first() else {
        return 0;
    };
    let max_work = ward.constraints().max_consecutive_days;

    let clean = nurses
        .iter()
        .filter_map(|&(slot, member)| {
            let row = grid.row(slot);
            if util::in_rest_window(row, day) || util::work_block_if_set(row, day) > max_work {
                return None;
            }
            util::cover_label(row, day).map(|label| (slot, member, label))
        })
        .min_by_key(|&(_, member, label)| (label != ShiftType::Day, !member.can_work(label)));
    if let Some((slot, member, label)) = clean {
        trace!(staff = %member.id, day, shift = %label, "covering day");
        return usize::from(grid.set(slot, day, label));
    }

    for &(slot, member) in nurses {
        let row = grid.row(slot);
        if util::in_rest_window(row, day) {
            continue;
        }
        let Some(label) = util::cover_label(row, day) else {
            continue;
        };
        if let Some(cut) = block_cut(ward, grid, nurses, slot, day, label) {
            trace!(staff = %member.id, day, cut, "covering day, block cut");
            return usize::from(grid.set(slot, day, label))
                + usize::from(grid.set(slot, cut, ShiftType::Off));
        }
    }

    let slot = nurses
        .iter()
        .find(|&&(slot, _)| !util::in_rest_window(grid.row(slot), day))
        .map_or(first, |&(slot, _)| slot);
    let label = util::cover_label(grid.row(slot), day).unwrap_or(ShiftType::Day);
    usize::from(grid.set(slot, day, label))
}

/// Jour où couper le bloc formé en posant `label` à `day` : les deux
/// morceaux restent sous le plafond de travail, la série de repos créée sous
/// le sien, et une autre infirmière travaille ce jour-là.
fn block_cut(
    ward: &Ward<'_>,
    grid: &ScheduleGrid,
    nurses: &[(usize, &StaffMember)],
    slot: usize,
    day: u32,
    label: ShiftType,
) -> Option<u32> {
    let c = ward.constraints();
    let mut row = grid.row(slot).to_vec();
    let cell = row.get_mut((day - 1) as usize)?;
    *cell = label;
    let start = day - util::work_streak_back(&row, day - 1);
    let end = day + util::work_streak_forward(&row, day + 1);
    (start..=end)
        .filter(|&cut| cut != day)
        .filter(|&cut| cut - start <= c.max_consecutive_days && end - cut <= c.max_consecutive_days)
        .filter(|&cut| util::off_streak_if_set(&row, cut) <= c.max_consecutive_off_days)
        .find(|&cut| {
            nurses
                .iter()
                .any(|&(other, _)| other != slot && grid.get(other, cut).is_work())
        })
}

/// Balayage final des lignes tournantes (hors cadres et nuits fixes), de
/// gauche à droite. Chaque case est corrigée au vu des cases déjà balayées,
/// qui ne bougent plus :
/// - dans les deux jours qui suivent une nuit : Off ;
/// - travail au-delà du plafond de série : Off ;
/// - jour au lendemain d'un soir : soir pour une infirmière seule au travail
///   ce jour-là, matin pour une aide-soignante, Off sinon ;
/// - Off ou case vide au-delà du plafond de repos : jour.
///
/// Une ligne balayée respecte ces règles dès qu'elles sont compatibles entre
/// elles ; les jours découverts sont repris ensuite par la couverture.
pub fn enforce_row_rules(ward: &Ward<'_>, grid: &mut ScheduleGrid) -> usize {
    let c = ward.constraints();
    let nurses = ward.members_on(grid, Duty::StaffNurse);
    let mut changed = 0;
    for (slot, member) in ward.rotating_members(grid) {
        for day in 1..=grid.days() {
            let row = grid.row(slot);
            let current = at(row, day);
            let label = if util::in_rest_window(row, day) {
                ShiftType::Off
            } else if current.is_work() {
                if util::work_streak_back(row, day - 1) >= c.max_consecutive_days {
                    ShiftType::Off
                } else if current == ShiftType::Day && at(row, day - 1) == ShiftType::Evening {
                    after_evening(grid, &nurses, slot, member, day)
                } else {
                    current
                }
            } else if util::off_streak_back(row, day - 1) >= c.max_consecutive_off_days {
                ShiftType::Day
            } else {
                ShiftType::Off
            };
            changed += usize::from(grid.set(slot, day, label));
        }
    }
    changed
}

fn after_evening(
    grid: &ScheduleGrid,
    nurses: &[(usize, &StaffMember)],
    slot: usize,
    member: &StaffMember,
    day: u32,
) -> ShiftType {
    match member.duty() {
        Duty::StaffNurse
            if !nurses
                .iter()
                .any(|&(other, _)| other != slot && grid.get(other, day).is_work()) =>
        {
            ShiftType::Evening
        }
        Duty::AssistantNurse if member.can_work(ShiftType::Morning) => ShiftType::Morning,
        _ => ShiftType::Off,
    }
}

/// Ramène le nombre de Off à `cap` au plus (hors cadres et nuits fixes) en
/// convertissant les Off en trop, dans l'ordre des jours. Les repos de nuit
/// et les jours qui dépasseraient le plafond de travail sont sautés.
pub fn limit_off_days<R: Rng + ?Sized>(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    cap: u32,
    rng: &mut R,
) -> usize {
    let max_work = ward.constraints().max_consecutive_days;
    let mut changed = 0;
    for (slot, member) in ward.rotating_members(grid) {
        let mut off = grid.count_in_row(slot, ShiftType::Off) as u32;
        for day in 1..=grid.days() {
            if off <= cap {
                break;
            }
            let row = grid.row(slot);
            if at(row, day) != ShiftType::Off
                || util::in_rest_window(row, day)
                || util::work_block_if_set(row, day) > max_work
            {
                continue;
            }
            let candidates = util::work_candidates(ward, grid, slot, member, day, &[]);
            let pick = if candidates.is_empty() {
                ShiftType::Day
            } else {
                select_by_preference(&candidates, member, rng)
            };
            if grid.set(slot, day, pick) {
                changed += 1;
                off -= 1;
            }
        }
    }
    changed
}
