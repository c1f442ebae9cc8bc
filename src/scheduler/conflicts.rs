use super::types::{Violation, ViolationKind as Kind, Ward};
use super::util::{self, at};
use crate::calendar;
use crate::grid::ScheduleGrid;
use crate::model::{Duty, ShiftType};
use crate::rules::{MAX_STAFF_NURSE_NIGHTS, OFF_CAP_SLACK};

/// Relève toutes les règles non respectées par la grille, sans la modifier.
pub fn detect_violations(ward: &Ward<'_>, grid: &ScheduleGrid) -> Vec<Violation> {
    let mut out = Vec::new();
    staff_nurse_rules(ward, grid, &mut out);
    supervisor_rules(ward, grid, &mut out);
    night_dedicated_rules(ward, grid, &mut out);
    streak_rules(ward, grid, &mut out);
    night_rest_rules(ward, grid, &mut out);
    evening_day_rules(ward, grid, &mut out);
    assistant_night_rules(ward, grid, &mut out);
    monthly_rules(ward, grid, &mut out);
    out
}

fn staff_nurse_rules(ward: &Ward<'_>, grid: &ScheduleGrid, out: &mut Vec<Violation>) {
    let nurses = ward.members_on(grid, Duty::StaffNurse);
    if nurses.is_empty() {
        return;
    }
    for day in 1..=grid.days() {
        if !nurses.iter().any(|&(slot, _)| grid.get(slot, day).is_work()) {
            let detail = format!("day {day}: no staff nurse on duty");
            out.push(Violation::new(Kind::StaffNurseCoverage, detail).on(day));
        }
        let evenings = nurses
            .iter()
            .filter(|&&(slot, _)| grid.get(slot, day) == ShiftType::Evening)
            .count();
        if evenings > 1 {
            out.push(
                Violation::new(
                    Kind::StaffNurseEvening,
                    format!("day {day}: {evenings} staff nurses on evening shift (max 1)"),
                )
                .on(day),
            );
        }
    }
    for (slot, member) in nurses {
        let nights = grid.count_in_row(slot, ShiftType::Night);
        if nights > MAX_STAFF_NURSE_NIGHTS {
            out.push(
                Violation::new(
                    Kind::StaffNurseNights,
                    format!(
                        "{}: {nights} night shifts (max {MAX_STAFF_NURSE_NIGHTS})",
                        member.name
                    ),
                )
                .of(&member.id),
            );
        }
    }
}

fn supervisor_rules(ward: &Ward<'_>, grid: &ScheduleGrid, out: &mut Vec<Violation>) {
    let (year, month) = (grid.year(), grid.month());
    for (slot, member) in ward.members_on(grid, Duty::Supervisor) {
        for day in 1..=grid.days() {
            let expected = util::supervisor_label(year, month, day);
            let actual = grid.get(slot, day);
            if actual != expected {
                out.push(
                    Violation::new(
                        Kind::SupervisorPattern,
                        format!("{}: day {day} is {actual}, expected {expected}", member.name),
                    )
                    .of(&member.id)
                    .on(day),
                );
            }
        }
    }
}

fn night_dedicated_rules(ward: &Ward<'_>, grid: &ScheduleGrid, out: &mut Vec<Violation>) {
    for (index, (slot, member)) in ward
        .members_on(grid, Duty::NightDedicated)
        .into_iter()
        .enumerate()
    {
        for day in 1..=grid.days() {
            let expected = util::night_dedicated_label(day, index);
            let actual = grid.get(slot, day);
            if actual != expected {
                out.push(
                    Violation::new(
                        Kind::NightDedicatedPattern,
                        format!(
                            "{}: day {day} is {actual}, night pattern expects {expected}",
                            member.name
                        ),
                    )
                    .of(&member.id)
                    .on(day),
                );
            }
        }
    }
}

fn streak_rules(ward: &Ward<'_>, grid: &ScheduleGrid, out: &mut Vec<Violation>) {
    let c = ward.constraints();
    for (slot, member) in ward.members(grid) {
        if member.duty() == Duty::NightDedicated {
            continue;
        }
        let (mut work, mut off) = (0u32, 0u32);
        for day in 1..=grid.days() {
            match grid.get(slot, day) {
                s if s.is_work() => {
                    work += 1;
                    off = 0;
                }
                ShiftType::Off => {
                    off += 1;
                    work = 0;
                }
                _ => {
                    work = 0;
                    off = 0;
                }
            }
            if work == c.max_consecutive_days + 1 {
                out.push(
                    Violation::new(
                        Kind::ConsecutiveWork,
                        format!(
                            "{}: more than {} consecutive work days ending day {day}",
                            member.name, c.max_consecutive_days
                        ),
                    )
                    .of(&member.id)
                    .on(day),
                );
            }
            if off == c.max_consecutive_off_days + 1 {
                out.push(
                    Violation::new(
                        Kind::ConsecutiveOff,
                        format!(
                            "{}: more than {} consecutive days off ending day {day}",
                            member.name, c.max_consecutive_off_days
                        ),
                    )
                    .of(&member.id)
                    .on(day),
                );
            }
        }
    }
}

fn night_rest_rules(ward: &Ward<'_>, grid: &ScheduleGrid, out: &mut Vec<Violation>) {
    for (slot, member) in ward.members(grid) {
        let block = member.duty() == Duty::NightDedicated;
        let row = grid.row(slot);
        for day in 1..=grid.days() {
            if at(row, day) != ShiftType::Night {
                continue;
            }
            if block && at(row, day + 1) == ShiftType::Night {
                continue;
            }
            for next in [day + 1, day + 2] {
                if next > grid.days() || at(row, next) == ShiftType::Off {
                    continue;
                }
                out.push(
                    Violation::new(
                        Kind::NightRest,
                        format!(
                            "{}: day {next} is {} but must be off after the night of day {day}",
                            member.name,
                            at(row, next)
                        ),
                    )
                    .of(&member.id)
                    .on(next),
                );
            }
        }
    }
}

fn evening_day_rules(ward: &Ward<'_>, grid: &ScheduleGrid, out: &mut Vec<Violation>) {
    for (slot, member) in ward.members(grid) {
        let row = grid.row(slot);
        for day in 2..=grid.days() {
            if at(row, day - 1) == ShiftType::Evening && at(row, day) == ShiftType::Day {
                out.push(
                    Violation::new(
                        Kind::EveningToDay,
                        format!("{}: day shift on day {day} right after an evening", member.name),
                    )
                    .of(&member.id)
                    .on(day),
                );
            }
        }
    }
}

fn assistant_night_rules(ward: &Ward<'_>, grid: &ScheduleGrid, out: &mut Vec<Violation>) {
    let assistants = ward.members_on(grid, Duty::AssistantNurse);
    let (year, month) = (grid.year(), grid.month());
    for day in 1..=grid.days() {
        let on_night: Vec<_> = assistants
            .iter()
            .filter(|&&(slot, _)| grid.get(slot, day) == ShiftType::Night)
            .collect();
        if on_night.is_empty() {
            continue;
        }
        if !calendar::is_assistant_night_day(year, month, day) {
            for &&(_, member) in &on_night {
                out.push(
                    Violation::new(
                        Kind::AssistantNightDay,
                        format!(
                            "{}: assistant night on day {day}, \
                             only Sunday, Monday and Thursday allowed",
                            member.name
                        ),
                    )
                    .of(&member.id)
                    .on(day),
                );
            }
        }
        if on_night.len() > 1 {
            out.push(
                Violation::new(
                    Kind::AssistantNightOverlap,
                    format!("day {day}: {} assistants on night shift (max 1)", on_night.len()),
                )
                .on(day),
            );
        }
    }
}

fn monthly_rules(ward: &Ward<'_>, grid: &ScheduleGrid, out: &mut Vec<Violation>) {
    let c = ward.constraints();
    let days = grid.days();
    let (min_work, max_work) = (c.min_work_days(days), c.max_work_days(days));
    let max_off = c.min_days_off + OFF_CAP_SLACK;
    for (slot, member) in ward.members(grid) {
        if member.duty() == Duty::NightDedicated {
            continue;
        }
        let worked = grid.work_days(slot) as u32;
        let off = grid.count_in_row(slot, ShiftType::Off) as u32;
        let name = &member.name;
        let mut push = |kind, detail: String| out.push(Violation::new(kind, detail).of(&member.id));
        if worked > max_work {
            push(Kind::TooManyWorkDays, format!("{name}: {worked} work days (max {max_work})"));
        }
        if worked < min_work {
            push(Kind::TooFewWorkDays, format!("{name}: {worked} work days (min {min_work})"));
        }
        if off < c.min_days_off {
            push(Kind::TooFewDaysOff, format!("{name}: {off} days off (min {})", c.min_days_off));
        }
        if off > max_off {
            push(Kind::TooManyDaysOff, format!("{name}: {off} days off (max {max_off})"));
        }
    }
}
