#![forbid(unsafe_code)]
use rand::rngs::StdRng;
use rand::SeedableRng;
use roulement::scheduler::select::{filter_feasible, select_by_preference};
use roulement::{Eligibility, Role, ShiftType, StaffMember};

use ShiftType::{Day as D, Evening as E, Night as N, Off as O, Unset as U};

#[test]
fn empty_and_single_candidates() {
    let nurse = StaffMember::new("Alice", Role::StaffNurse);
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(select_by_preference(&[], &nurse, &mut rng), O);
    assert_eq!(select_by_preference(&[N], &nurse, &mut rng), N);
}

#[test]
fn eligible_types_win_over_the_rest() {
    let day_only = StaffMember::new("Alice", Role::StaffNurse)
        .with_eligibility(Eligibility::from_codes("D").unwrap());
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..50 {
        assert_eq!(select_by_preference(&[D, E, N], &day_only, &mut rng), D);
    }
}

#[test]
fn weighted_pick_covers_every_candidate() {
    let nurse = StaffMember::new("Alice", Role::StaffNurse);
    let mut rng = StdRng::seed_from_u64(3);
    let picks: Vec<ShiftType> = (0..500)
        .map(|_| select_by_preference(&[D, E, N], &nurse, &mut rng))
        .collect();
    for shift in [D, E, N] {
        assert!(picks.contains(&shift), "{shift} never picked");
    }
    let days = picks.iter().filter(|&&s| s == D).count();
    let nights = picks.iter().filter(|&&s| s == N).count();
    assert!(days > nights);
}

#[test]
fn feasibility_filter() {
    // nuit impossible si J+1 est travaillé
    let row = [U, U, D, U];
    assert_eq!(filter_feasible(&[D, E, N], &row, 2), vec![D, E]);
    // pas de jour après un soir
    let row = [E, U, U, U];
    assert_eq!(filter_feasible(&[D, E, N], &row, 2), vec![E, N]);
    // fin de mois : les jours hors grille ne bloquent pas la nuit
    let row = [U, U, U, U];
    assert_eq!(filter_feasible(&[N], &row, 4), vec![N]);
}
