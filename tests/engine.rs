#![forbid(unsafe_code)]
use rand::rngs::StdRng;
use rand::SeedableRng;
use roulement::scheduler::{enforce, Ward};
use roulement::{
    calendar, off_count, optimize, shortfall, worker_count, Duty, Role, Roster, SavedSchedule,
    SchedError, ScheduleConstraints, ScheduleGrid, ScheduleMap, ScheduleOutcome, Scheduler,
    ShiftType, StaffId, StaffMember, StaffingRequirement, ViolationKind,
};
use std::collections::BTreeMap;

const YEAR: i32 = 2026;
const MONTH: u32 = 2;

fn feb_weekends() -> Vec<u32> {
    vec![1, 7, 8, 14, 15, 21, 22, 28]
}

fn row_of(outcome: &ScheduleOutcome, member: &StaffMember) -> Vec<ShiftType> {
    let grid = &outcome.schedule;
    let slot = grid.slot_of(&member.id).unwrap();
    grid.row(slot).to_vec()
}

fn full_ward() -> Vec<StaffMember> {
    vec![
        StaffMember::new("Chef", Role::Supervisor),
        StaffMember::new("Alice", Role::StaffNurse),
        StaffMember::new("Bruno", Role::StaffNurse),
        StaffMember::new("Chloé", Role::StaffNurse),
        StaffMember::new("David", Role::StaffNurse),
        StaffMember::new("Nuit", Role::StaffNurse).night_dedicated(),
        StaffMember::new("Amel", Role::AssistantNurse),
        StaffMember::new("Binta", Role::AssistantNurse),
        StaffMember::new("Carla", Role::AssistantNurse),
    ]
}

fn ward_staffing() -> StaffingRequirement {
    StaffingRequirement::new()
        .with(Role::StaffNurse, ShiftType::Day, 2)
        .with(Role::StaffNurse, ShiftType::Evening, 1)
        .with(Role::AssistantNurse, ShiftType::Day, 1)
        .with(Role::AssistantNurse, ShiftType::Morning, 1)
}

#[test]
fn supervisor_follows_calendar_exactly() {
    let staff = vec![
        StaffMember::new("Chef", Role::Supervisor),
        StaffMember::new("Alice", Role::StaffNurse),
        StaffMember::new("Bruno", Role::StaffNurse),
    ];
    let mut rng = StdRng::seed_from_u64(7);
    let outcome = optimize(
        &staff,
        YEAR,
        MONTH,
        &StaffingRequirement::new(),
        &ScheduleConstraints::for_month(YEAR, MONTH),
        None,
        &mut rng,
    );

    let row = row_of(&outcome, &staff[0]);
    assert_eq!(row.len(), 28);
    for day in 1..=28u32 {
        let expected = if feb_weekends().contains(&day) {
            ShiftType::Off
        } else {
            ShiftType::Day
        };
        assert_eq!(row[day as usize - 1], expected, "day {day}");
    }
}

#[test]
fn single_night_staff_gets_nnoo_cycle() {
    let staff = vec![
        StaffMember::new("Alice", Role::StaffNurse),
        StaffMember::new("Nuit", Role::StaffNurse).night_dedicated(),
    ];
    let mut rng = StdRng::seed_from_u64(1);
    let outcome = Scheduler::new(staff.clone(), ScheduleConstraints::default())
        .optimize(YEAR, MONTH, None, &mut rng);

    let row = row_of(&outcome, &staff[1]);
    for (i, shift) in row.iter().enumerate() {
        let expected = if i % 4 < 2 { ShiftType::Night } else { ShiftType::Off };
        assert_eq!(*shift, expected, "day {}", i + 1);
    }
}

#[test]
fn two_night_staff_alternate_phases() {
    let staff = vec![
        StaffMember::new("Nuit A", Role::StaffNurse).night_dedicated(),
        StaffMember::new("Nuit B", Role::StaffNurse).night_dedicated(),
        StaffMember::new("Alice", Role::StaffNurse),
    ];
    let mut rng = StdRng::seed_from_u64(3);
    let outcome = Scheduler::new(staff.clone(), ScheduleConstraints::default())
        .optimize(YEAR, MONTH, None, &mut rng);

    let a = row_of(&outcome, &staff[0]);
    let b = row_of(&outcome, &staff[1]);
    use ShiftType::{Night as N, Off as O};
    assert_eq!(&a[..8], &[N, N, O, O, N, N, O, O]);
    assert_eq!(&b[..8], &[O, O, N, N, O, O, N, N]);
    // une nuit est toujours tenue par l'une des deux
    assert!(a.iter().zip(&b).all(|(x, y)| (*x == N) != (*y == N)));
}

#[test]
fn lone_staff_nurse_still_covers_every_day() {
    let staff = vec![
        StaffMember::new("Chef", Role::Supervisor),
        StaffMember::new("Solo", Role::StaffNurse),
    ];
    let mut rng = StdRng::seed_from_u64(11);
    let outcome = Scheduler::new(staff.clone(), ScheduleConstraints::for_month(YEAR, MONTH))
        .optimize(YEAR, MONTH, None, &mut rng);

    let row = row_of(&outcome, &staff[1]);
    assert!(row.iter().all(|s| s.is_work()));
    assert!(!outcome.success);
    assert_eq!(outcome.message, ScheduleOutcome::PARTIAL_MESSAGE);
    assert!(outcome
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::ConsecutiveWork));
    assert!(!outcome
        .violations
        .iter()
        .any(|v| v.kind == ViolationKind::StaffNurseCoverage));
}

#[test]
fn full_ward_structural_properties() {
    let staff = full_ward();
    let mut rng = StdRng::seed_from_u64(42);
    let outcome = optimize(
        &staff,
        YEAR,
        MONTH,
        &ward_staffing(),
        &ScheduleConstraints::for_month(YEAR, MONTH),
        None,
        &mut rng,
    );
    let grid = &outcome.schedule;
    assert_eq!(grid.len(), staff.len());
    assert_eq!(grid.days(), 28);
    assert_eq!(outcome.success, outcome.violations.is_empty());

    let slots = |duty: Duty| -> Vec<usize> {
        staff
            .iter()
            .filter(|m| m.duty() == duty)
            .map(|m| grid.slot_of(&m.id).unwrap())
            .collect()
    };
    let nurses = slots(Duty::StaffNurse);
    let assistants = slots(Duty::AssistantNurse);

    for slot in 0..grid.len() {
        assert!(grid.row(slot).iter().all(|&s| s != ShiftType::Unset));
    }
    for day in 1..=28u32 {
        assert!(
            nurses.iter().any(|&s| grid.get(s, day).is_work()),
            "no staff nurse on day {day}"
        );
        let evenings = nurses
            .iter()
            .filter(|&&s| grid.get(s, day) == ShiftType::Evening)
            .count();
        assert!(evenings <= 1, "day {day}: {evenings} evenings");

        let nights = assistants
            .iter()
            .filter(|&&s| grid.get(s, day) == ShiftType::Night)
            .count();
        assert!(nights <= 1, "day {day}: {nights} assistant nights");
        if nights == 1 {
            assert!(calendar::is_assistant_night_day(YEAR, MONTH, day));
        }
    }
    for &slot in &nurses {
        assert!(grid.count_in_row(slot, ShiftType::Night) <= 1);
        assert!(grid.count_in_row(slot, ShiftType::Morning) == 0);
    }

    let chef = row_of(&outcome, &staff[0]);
    assert!(feb_weekends()
        .iter()
        .all(|&d| chef[d as usize - 1] == ShiftType::Off));
    let nuit = row_of(&outcome, &staff[5]);
    assert!(nuit
        .iter()
        .all(|s| matches!(s, ShiftType::Night | ShiftType::Off)));
}

#[test]
fn final_grid_keeps_row_rules_across_seeds() {
    let staff = full_ward();
    let constraints = ScheduleConstraints::for_month(YEAR, MONTH);
    let row_rules = [
        ViolationKind::NightRest,
        ViolationKind::EveningToDay,
        ViolationKind::ConsecutiveWork,
        ViolationKind::ConsecutiveOff,
        ViolationKind::StaffNurseCoverage,
        ViolationKind::StaffNurseEvening,
    ];

    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        let outcome = optimize(
            &staff,
            YEAR,
            MONTH,
            &ward_staffing(),
            &constraints,
            None,
            &mut rng,
        );
        let broken: Vec<_> = outcome
            .violations
            .iter()
            .filter(|v| row_rules.contains(&v.kind))
            .map(|v| v.detail.as_str())
            .collect();
        assert!(broken.is_empty(), "seed {seed}: {broken:?}");

        for member in staff.iter().filter(|m| m.duty() != Duty::NightDedicated) {
            let row = row_of(&outcome, member);
            for (i, pair) in row.windows(2).enumerate() {
                assert!(
                    !(pair[0] == ShiftType::Evening && pair[1] == ShiftType::Day),
                    "seed {seed}: {} day {}",
                    member.name,
                    i + 2
                );
            }
        }

        // la ré-application des règles dures ne change plus rien
        let mut sorted = staff.clone();
        roulement::model::sort_by_duty(&mut sorted);
        let ward = Ward::new(&sorted, &constraints);
        let mut grid = outcome.schedule.clone();
        assert_eq!(enforce::enforce_night_rest(&ward, &mut grid), 0, "seed {seed}");
        assert_eq!(enforce::enforce_evening_day(&ward, &mut grid, &mut rng), 0, "seed {seed}");
        assert_eq!(
            enforce::enforce_consecutive_limits(&ward, &mut grid, &mut rng),
            0,
            "seed {seed}"
        );
        assert_eq!(
            enforce::enforce_staff_nurse_coverage(&ward, &mut grid, &mut rng),
            0,
            "seed {seed}"
        );
    }
}

#[test]
fn same_seed_same_schedule() {
    let staff = full_ward();
    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        optimize(
            &staff,
            YEAR,
            MONTH,
            &ward_staffing(),
            &ScheduleConstraints::for_month(YEAR, MONTH),
            None,
            &mut rng,
        )
        .schedule
        .to_map()
    };
    assert_eq!(run(2024), run(2024));
}

#[test]
fn invalid_month_yields_failure_outcome() {
    let staff = vec![StaffMember::new("Alice", Role::StaffNurse)];
    let mut rng = StdRng::seed_from_u64(0);
    let outcome = optimize(
        &staff,
        YEAR,
        13,
        &StaffingRequirement::new(),
        &ScheduleConstraints::default(),
        None,
        &mut rng,
    );
    assert!(!outcome.success);
    assert!(outcome.schedule.is_empty());
    assert!(outcome.message.starts_with("schedule generation failed"));
    assert_eq!(outcome.violations.len(), 1);
    assert_eq!(outcome.violations[0].kind, ViolationKind::Failure);
}

#[test]
fn duplicate_ids_are_rejected() {
    let id = StaffId::new("x");
    let staff = vec![
        StaffMember::new("Alice", Role::StaffNurse).with_id(id.clone()),
        StaffMember::new("Bruno", Role::StaffNurse).with_id(id),
    ];
    let mut rng = StdRng::seed_from_u64(0);
    let err = Scheduler::new(staff, ScheduleConstraints::default())
        .try_optimize(YEAR, MONTH, None, &mut rng)
        .unwrap_err();
    assert!(matches!(err, SchedError::DuplicateStaff(ref s) if s == "x"));
}

#[test]
fn too_many_days_off_is_rejected() {
    let staff = vec![StaffMember::new("Alice", Role::StaffNurse)];
    let constraints = ScheduleConstraints {
        min_days_off: 29,
        ..ScheduleConstraints::default()
    };
    let mut rng = StdRng::seed_from_u64(0);
    let err = Scheduler::new(staff, constraints)
        .try_optimize(YEAR, MONTH, None, &mut rng)
        .unwrap_err();
    assert!(matches!(err, SchedError::InvalidConstraints(_)));
}

#[test]
fn initial_schedule_cells_stay_pinned() {
    let staff = vec![
        StaffMember::new("Alice", Role::StaffNurse),
        StaffMember::new("Bruno", Role::StaffNurse),
    ];
    let mut initial = ScheduleMap::new();
    initial.insert(
        staff[0].id.clone(),
        BTreeMap::from([(10, ShiftType::Off), (11, ShiftType::Day)]),
    );
    initial.insert(StaffId::new("inconnu"), BTreeMap::from([(1, ShiftType::Day)]));

    let mut rng = StdRng::seed_from_u64(5);
    let outcome = Scheduler::new(staff.clone(), ScheduleConstraints::for_month(YEAR, MONTH))
        .optimize(YEAR, MONTH, Some(&initial), &mut rng);

    let grid = &outcome.schedule;
    let slot = grid.slot_of(&staff[0].id).unwrap();
    assert!(grid.is_pinned(slot, 10));
    assert!(grid.is_pinned(slot, 11));
    assert!(!grid.is_pinned(slot, 12));
    assert_eq!(grid.len(), 2);

    let saved = SavedSchedule::from(grid);
    assert_eq!(saved.pinned.get(&staff[0].id), Some(&vec![10, 11]));
}

#[test]
fn optimize_from_roster_reads_saved_pins() {
    let mut roster = Roster::default();
    roster.staff = vec![
        StaffMember::new("Chef", Role::Supervisor),
        StaffMember::new("Alice", Role::StaffNurse),
        StaffMember::new("Bruno", Role::StaffNurse),
    ];
    let alice = roster.staff[1].id.clone();
    let mut saved = SavedSchedule::new(YEAR, MONTH);
    saved.pin(&alice, 3, ShiftType::Off, 28);
    roster.upsert_schedule(saved);

    let mut rng = StdRng::seed_from_u64(9);
    let outcome = Scheduler::optimize_from(
        &roster,
        YEAR,
        MONTH,
        roster.constraints_for(YEAR, MONTH),
        &mut rng,
    )
    .unwrap();
    let grid = &outcome.schedule;
    let slot = grid.slot_of(&alice).unwrap();
    assert!(grid.is_pinned(slot, 3));
    assert_eq!(grid.len(), 3);
}

#[test]
fn query_helpers() {
    let a = StaffId::new("a");
    let b = StaffId::new("b");
    let mut grid = ScheduleGrid::new(YEAR, MONTH, [a.clone(), b.clone()]);
    grid.set(0, 1, ShiftType::Day);
    grid.set(1, 1, ShiftType::Night);
    grid.set(0, 2, ShiftType::Off);
    grid.set(1, 2, ShiftType::Off);
    grid.set(0, 3, ShiftType::Off);

    assert_eq!(off_count(&grid, &a), 2);
    assert_eq!(off_count(&grid, &b), 1);
    assert_eq!(off_count(&grid, &StaffId::new("z")), 0);
    assert_eq!(worker_count(&grid, 1), 2);
    assert_eq!(worker_count(&grid, 2), 0);
    assert_eq!(shortfall(&grid, 1, 3), 1);
    assert_eq!(shortfall(&grid, 1, 2), 0);
    assert_eq!(shortfall(&grid, 2, 2), 2);
}
