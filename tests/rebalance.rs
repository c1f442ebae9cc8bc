#![forbid(unsafe_code)]
use roulement::scheduler::{rebalance, staffing, Ward};
use roulement::{
    Role, ScheduleConstraints, ScheduleGrid, ScheduleMap, ShiftTargets, ShiftType, StaffMember,
};
use std::collections::BTreeMap;

fn grid_of(staff: &[StaffMember], rows: &[&str]) -> ScheduleGrid {
    let mut grid = ScheduleGrid::new(2026, 2, staff.iter().map(|m| m.id.clone()));
    for (slot, codes) in rows.iter().enumerate() {
        for (i, c) in codes.chars().enumerate() {
            grid.set(slot, i as u32 + 1, ShiftType::from_code(c).unwrap());
        }
    }
    grid
}

fn longest_work_run(row: &[ShiftType]) -> usize {
    let (mut best, mut run) = (0, 0);
    for s in row {
        run = if s.is_work() { run + 1 } else { 0 };
        best = best.max(run);
    }
    best
}

/// Cinq jours, deux repos, sur tout le mois.
fn week_pattern() -> String {
    (1..=28)
        .map(|d| if d % 7 == 6 || d % 7 == 0 { 'O' } else { 'D' })
        .collect()
}

fn nurses(names: &[&str]) -> Vec<StaffMember> {
    names
        .iter()
        .map(|n| StaffMember::new(*n, Role::StaffNurse))
        .collect()
}

fn day_target(n: u32) -> ShiftTargets {
    ShiftTargets {
        day: n,
        ..ShiftTargets::default()
    }
}

#[test]
fn deficits_are_filled_from_the_least_loaded() {
    let staff = nurses(&["Alice", "Bruno"]);
    let constraints = ScheduleConstraints::default();
    let ward = Ward::new(&staff, &constraints);
    let mut grid = ScheduleGrid::new(2026, 2, staff.iter().map(|m| m.id.clone()));

    let changed = staffing::adjust_staffing_deficits(&ward, &mut grid, &day_target(1));
    assert_eq!(changed, 28);
    for day in 1..=28 {
        assert_eq!(grid.count_on(day, ShiftType::Day), 1, "day {day}");
    }
    assert_eq!(grid.work_days(0), 14);
    assert_eq!(grid.work_days(1), 14);
    assert_eq!(staffing::adjust_staffing_deficits(&ward, &mut grid, &day_target(1)), 0);
}

#[test]
fn month_start_streak_moves_to_month_end() {
    let staff = nurses(&["Alice"]);
    let constraints = ScheduleConstraints::default();
    let ward = Ward::new(&staff, &constraints);
    let row = format!("DDDDDDDD{}", "O".repeat(20));
    let mut grid = grid_of(&staff, &[row.as_str()]);

    assert_eq!(rebalance::redistribute_to_month_end(&ward, &mut grid), 6);
    assert_eq!(grid.work_days(0), 8);
    assert!(longest_work_run(grid.row(0)) <= 5);
    assert_eq!(grid.get(0, 28), ShiftType::Day);
}

#[test]
fn zigzag_fills_from_both_ends() {
    let staff = nurses(&["Alice"]);
    let constraints = ScheduleConstraints::default();
    let ward = Ward::new(&staff, &constraints);
    let row = "O".repeat(28);
    let mut grid = grid_of(&staff, &[row.as_str()]);

    assert_eq!(rebalance::zigzag_distribute(&ward, &mut grid), 20);
    assert_eq!(grid.count_in_row(0, ShiftType::Off), 8);
    assert_eq!(grid.get(0, 1), ShiftType::Day);
    assert_eq!(grid.get(0, 28), ShiftType::Day);
    assert!(longest_work_run(grid.row(0)) <= 5);
}

#[test]
fn daily_targets_leave_pinned_cells_alone() {
    let staff = nurses(&["Alice", "Bruno"]);
    let constraints = ScheduleConstraints::default();
    let ward = Ward::new(&staff, &constraints);
    let mut grid = ScheduleGrid::new(2026, 2, staff.iter().map(|m| m.id.clone()));
    let mut initial = ScheduleMap::new();
    for member in &staff {
        initial.insert(member.id.clone(), BTreeMap::from([(1, ShiftType::Off)]));
    }
    grid.seed(&initial);

    rebalance::satisfy_daily_targets(&ward, &mut grid, &day_target(1));
    assert_eq!(grid.count_on(1, ShiftType::Day), 0);
    for day in 2..=28 {
        assert_eq!(grid.count_on(day, ShiftType::Day), 1, "day {day}");
    }
}

#[test]
fn everyone_reaches_minimum_days_off() {
    let staff = nurses(&["Alice", "Bruno"]);
    let constraints = ScheduleConstraints::default();
    let ward = Ward::new(&staff, &constraints);
    let full = "D".repeat(28);
    let mut grid = grid_of(&staff, &[full.as_str(), full.as_str()]);

    rebalance::enforce_min_off_fairness(&ward, &mut grid, &day_target(1));
    for slot in 0..2 {
        assert_eq!(grid.count_in_row(slot, ShiftType::Off), 8);
    }
    for day in 1..=28 {
        assert!((0..2).any(|slot| grid.get(slot, day).is_work()), "day {day}");
    }
}

#[test]
fn fairness_keeps_the_last_nurse_on_duty() {
    let staff = nurses(&["Alice"]);
    let constraints = ScheduleConstraints::default();
    let ward = Ward::new(&staff, &constraints);
    let full = "D".repeat(28);
    let mut grid = grid_of(&staff, &[full.as_str()]);

    assert_eq!(rebalance::enforce_min_off_fairness(&ward, &mut grid, &day_target(0)), 0);
    assert_eq!(grid.work_days(0), 28);
}

#[test]
fn identical_schedules_are_diversified() {
    let staff = nurses(&["Alice", "Bruno"]);
    let constraints = ScheduleConstraints::default();
    let ward = Ward::new(&staff, &constraints);
    let row = week_pattern();
    let mut grid = grid_of(&staff, &[row.as_str(), row.as_str()]);

    assert_eq!(rebalance::diversify_similar(&ward, &mut grid), 3);
    for day in [5, 12, 19] {
        assert_eq!(grid.get(1, day), ShiftType::Evening, "day {day}");
    }
    assert_eq!(grid.count_in_row(0, ShiftType::Evening), 0);
}

#[test]
fn assistant_score_bounds() {
    let balanced: Vec<ShiftType> = week_pattern()
        .chars()
        .map(|c| ShiftType::from_code(c).unwrap())
        .collect();
    let score = rebalance::assistant_score(&balanced, 20, 5, 0.0, 8);
    assert!((score - 100.0).abs() < 1e-9);

    let idle = vec![ShiftType::Off; 28];
    let score = rebalance::assistant_score(&idle, 20, 5, 0.0, 8);
    assert!((score - 20.0).abs() < 1e-9);
}

#[test]
fn assistants_within_spread_are_left_alone() {
    let staff = vec![
        StaffMember::new("Amel", Role::AssistantNurse),
        StaffMember::new("Binta", Role::AssistantNurse),
    ];
    let constraints = ScheduleConstraints::default();
    let ward = Ward::new(&staff, &constraints);
    let row = week_pattern();
    let mut grid = grid_of(&staff, &[row.as_str(), row.as_str()]);

    assert_eq!(rebalance::equalize_assistants(&ward, &mut grid), 0);
}
