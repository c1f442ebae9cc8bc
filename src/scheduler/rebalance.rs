//! Rééquilibrage : déplacements de charge et équité. Ces passes ne touchent
//! jamais une case épinglée.

use super::types::Ward;
use super::util::{self, at};
use crate::grid::ScheduleGrid;
use crate::model::{Duty, ShiftType, StaffMember};
use crate::rules::ShiftTargets;
use tracing::debug;

/// Au-delà de cette similarité, deux plannings sont jugés trop proches.
const SIMILARITY_THRESHOLD: f64 = 0.8;
/// Plannings quasi identiques : on alterne un jour sur deux.
const NEAR_IDENTICAL: f64 = 0.99;
const MAX_DIVERSIFY_CHANGES: usize = 3;
/// Écart de score au-delà duquel on rééquilibre les aides-soignantes.
const ASSISTANT_SCORE_SPREAD: f64 = 50.0;

fn is_open(grid: &ScheduleGrid, slot: usize, day: u32) -> bool {
    !grid.is_pinned(slot, day) && grid.get(slot, day).is_free()
}

/// Infirmières : un bloc travaillé trop long dans la première moitié du mois
/// cède un jour (ni nuit ni épinglé) à un jour libre pris en partant de la
/// fin du mois.
pub fn redistribute_to_month_end(ward: &Ward<'_>, grid: &mut ScheduleGrid) -> usize {
    let max_work = ward.constraints().max_consecutive_days;
    let days = grid.days();
    let mut changed = 0;
    for (slot, member) in ward.members_on(grid, Duty::StaffNurse) {
        for day in 1..=days / 2 {
            let current = grid.get(slot, day);
            if !current.is_work() || current == ShiftType::Night || grid.is_pinned(slot, day) {
                continue;
            }
            let row = grid.row(slot);
            let block = util::work_streak_back(row, day) + util::work_streak_forward(row, day + 1);
            if block <= max_work {
                continue;
            }
            let target = (day + 1..=days).rev().find(|&t| {
                is_open(grid, slot, t) && util::can_assign_at(ward, grid, slot, member, t, current)
            });
            if let Some(target) = target {
                grid.set(slot, day, ShiftType::Off);
                grid.set(slot, target, current);
                changed += 2;
            }
        }
    }
    changed
}

/// Infirmières : visite des jours en zigzag (début, fin, début...) et
/// remplissage des jours libres par un jour ou un soir tant que la série
/// travaillée qui précède a de la marge. Un Off n'est converti que si la
/// personne garde plus que son minimum de repos.
pub fn zigzag_distribute(ward: &Ward<'_>, grid: &mut ScheduleGrid) -> usize {
    let c = ward.constraints();
    let order = util::zigzag_days(grid.days());
    let mut changed = 0;
    for (slot, member) in ward.members_on(grid, Duty::StaffNurse) {
        for &day in &order {
            if !is_open(grid, slot, day) {
                continue;
            }
            if grid.get(slot, day) == ShiftType::Off
                && grid.count_in_row(slot, ShiftType::Off) as u32 <= c.min_days_off
            {
                continue;
            }
            let streak = util::work_streak_back(grid.row(slot), day.saturating_sub(1));
            if streak >= c.max_consecutive_days {
                continue;
            }
            let pick = [ShiftType::Day, ShiftType::Evening, ShiftType::Morning]
                .into_iter()
                .find(|&s| util::can_assign_at(ward, grid, slot, member, day, s));
            if let Some(shift) = pick {
                changed += usize::from(grid.set(slot, day, shift));
            }
        }
    }
    changed
}

/// Pour chaque jour et chaque type hors nuit, tant que l'effectif est sous
/// l'objectif, le premier détenteur d'une case libre (hors cadres et nuits
/// fixes) qui peut prendre le poste le prend.
pub fn satisfy_daily_targets(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    targets: &ShiftTargets,
) -> usize {
    let members = ward.rotating_members(grid);
    let mut changed = 0;
    for day in 1..=grid.days() {
        for shift in [ShiftType::Day, ShiftType::Evening, ShiftType::Morning] {
            let need = targets.get(shift) as usize;
            while grid.count_on(day, shift) < need {
                let holder = members.iter().find(|&&(slot, member)| {
                    is_open(grid, slot, day)
                        && util::can_assign_at(ward, grid, slot, member, day, shift)
                });
                let Some(&(slot, _)) = holder else { break };
                grid.set(slot, day, shift);
                changed += 1;
            }
        }
    }
    changed
}

/// Chacun (hors cadres et nuits fixes) atteint son minimum de repos : des
/// jours ou soirs sont convertis en Off, seulement là où l'effectif du type
/// dépasse l'objectif, hors repos de nuit, sans créer de série de repos trop
/// longue, et sans laisser un jour sans infirmière.
pub fn enforce_min_off_fairness(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    targets: &ShiftTargets,
) -> usize {
    let c = ward.constraints();
    let nurses: Vec<usize> = ward
        .members_on(grid, Duty::StaffNurse)
        .into_iter()
        .map(|(slot, _)| slot)
        .collect();
    let mut changed = 0;
    for (slot, member) in ward.rotating_members(grid) {
        let mut off = grid.count_in_row(slot, ShiftType::Off) as u32;
        for day in 1..=grid.days() {
            if off >= c.min_days_off {
                break;
            }
            let current = grid.get(slot, day);
            if !matches!(current, ShiftType::Day | ShiftType::Evening | ShiftType::Unset)
                || grid.is_pinned(slot, day)
            {
                continue;
            }
            let row = grid.row(slot);
            if util::in_rest_window(row, day)
                || util::off_streak_if_set(row, day) > c.max_consecutive_off_days
            {
                continue;
            }
            if current.is_work() {
                if grid.count_on(day, current) <= targets.get(current) as usize {
                    continue;
                }
                let last_nurse = member.duty() == Duty::StaffNurse
                    && nurses
                        .iter()
                        .all(|&other| other == slot || !grid.get(other, day).is_work());
                if last_nurse {
                    continue;
                }
            }
            if grid.set(slot, day, ShiftType::Off) {
                changed += 1;
                off += 1;
            }
        }
    }
    changed
}

/// Part des jours où deux lignes portent le même libellé.
fn similarity(a: &[ShiftType], b: &[ShiftType]) -> f64 {
    if a.is_empty() {
        return 0.0;
    }
    let same = a.iter().zip(b).filter(|(x, y)| x == y).count();
    same as f64 / a.len() as f64
}

fn toggled(shift: ShiftType) -> Option<ShiftType> {
    match shift {
        ShiftType::Day => Some(ShiftType::Evening),
        ShiftType::Evening => Some(ShiftType::Day),
        _ => None,
    }
}

/// Deux plannings trop semblables (hors cadres et nuits fixes) : on bascule
/// jour/soir sur quelques jours communs de la seconde personne. Pour des
/// plannings quasi identiques sans bascule possible, on alterne un jour sur
/// deux.
pub fn diversify_similar(ward: &Ward<'_>, grid: &mut ScheduleGrid) -> usize {
    let members = ward.rotating_members(grid);
    let mut changed = 0;
    for (i, &(a, _)) in members.iter().enumerate() {
        for &(b, member_b) in &members[i + 1..] {
            let sim = similarity(grid.row(a), grid.row(b));
            if sim < SIMILARITY_THRESHOLD {
                continue;
            }
            let mut done = 0;
            for day in 1..=grid.days() {
                if done >= MAX_DIVERSIFY_CHANGES {
                    break;
                }
                let shared = grid.get(a, day);
                if shared != grid.get(b, day) || grid.is_pinned(b, day) {
                    continue;
                }
                let Some(next) = toggled(shared) else { continue };
                if util::can_assign_at(ward, grid, b, member_b, day, next) {
                    grid.set(b, day, next);
                    done += 1;
                }
            }
            if done == 0 && sim >= NEAR_IDENTICAL {
                for day in (1..=grid.days()).step_by(2) {
                    if done >= MAX_DIVERSIFY_CHANGES {
                        break;
                    }
                    if grid.is_pinned(b, day) {
                        continue;
                    }
                    let Some(next) = toggled(grid.get(b, day)) else { continue };
                    if util::can_assign_at(ward, grid, b, member_b, day, next) {
                        grid.set(b, day, next);
                        done += 1;
                    }
                }
            }
            if done > 0 {
                debug!(similarity = sim, changes = done, "diversified schedule");
            }
            changed += done;
        }
    }
    changed
}

/// Score d'équilibre d'une aide-soignante, sur 100 : proximité du nombre de
/// jours travaillés idéal (40), de la plus longue série au plafond (20), du
/// nombre de nuits à la moyenne (20), des repos au minimum (20).
pub fn assistant_score(
    row: &[ShiftType],
    ideal_work: u32,
    max_streak: u32,
    expected_nights: f64,
    min_off: u32,
) -> f64 {
    fn closeness(value: f64, goal: f64) -> f64 {
        let scale = goal.max(1.0);
        (1.0 - (value - goal).abs() / scale).max(0.0)
    }
    let worked = row.iter().filter(|s| s.is_work()).count() as f64;
    let off = util::count(row, ShiftType::Off) as f64;
    let nights = util::count(row, ShiftType::Night) as f64;
    let mut longest = 0u32;
    let mut run = 0u32;
    for s in row {
        run = if s.is_work() { run + 1 } else { 0 };
        longest = longest.max(run);
    }
    40.0 * closeness(worked, f64::from(ideal_work))
        + 20.0 * closeness(f64::from(longest), f64::from(max_streak))
        + 20.0 * closeness(nights, expected_nights)
        + 20.0 * closeness(off, f64::from(min_off))
}

/// Aides-soignantes : si l'écart de score dépasse le seuil, chaque
/// aide-soignante sous la moyenne et encore sous son volume idéal récupère
/// un jour à la place d'un Off (sans descendre sous le minimum de repos).
pub fn equalize_assistants(ward: &Ward<'_>, grid: &mut ScheduleGrid) -> usize {
    let c = ward.constraints();
    let assistants = ward.members_on(grid, Duty::AssistantNurse);
    if assistants.len() < 2 {
        return 0;
    }
    let days = grid.days();
    let ideal_work = c.max_work_days(days);
    let night_days = (1..=days)
        .filter(|&d| crate::calendar::is_assistant_night_day(grid.year(), grid.month(), d))
        .count();
    let night_capable = assistants
        .iter()
        .filter(|(_, m)| m.can_work(ShiftType::Night))
        .count()
        .max(1);
    let expected_nights = night_days as f64 / night_capable as f64;

    let scores: Vec<f64> = assistants
        .iter()
        .map(|&(slot, _)| {
            assistant_score(
                grid.row(slot),
                ideal_work,
                c.max_consecutive_days,
                expected_nights,
                c.min_days_off,
            )
        })
        .collect();
    let max = scores.iter().copied().fold(f64::MIN, f64::max);
    let min = scores.iter().copied().fold(f64::MAX, f64::min);
    if max - min <= ASSISTANT_SCORE_SPREAD {
        return 0;
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    debug!(spread = max - min, mean, "equalizing assistant workload");

    let mut changed = 0;
    for (&(slot, member), &score) in assistants.iter().zip(&scores) {
        if score >= mean || grid.work_days(slot) as u32 >= ideal_work {
            continue;
        }
        if (grid.count_in_row(slot, ShiftType::Off) as u32) <= c.min_days_off {
            continue;
        }
        if let Some(day) = first_convertible_off(ward, grid, slot, member) {
            changed += usize::from(grid.set(slot, day, ShiftType::Day));
        }
    }
    changed
}

fn first_convertible_off(
    ward: &Ward<'_>,
    grid: &ScheduleGrid,
    slot: usize,
    member: &StaffMember,
) -> Option<u32> {
    (1..=grid.days()).find(|&day| {
        !grid.is_pinned(slot, day)
            && at(grid.row(slot), day) == ShiftType::Off
            && util::can_assign_at(ward, grid, slot, member, day, ShiftType::Day)
    })
}
