//! Choix pondéré d'un type de poste et filtre de faisabilité.

use crate::model::{Role, ShiftType, StaffMember};
use rand::Rng;

/// Poids infirmière : jour 5, soir 3, nuit 2.
const STAFF_NURSE_WEIGHTS: [(ShiftType, u32); 3] = [
    (ShiftType::Day, 5),
    (ShiftType::Evening, 3),
    (ShiftType::Night, 2),
];

/// Poids aide-soignante : jour 3, soir 2, nuit 2, matin 4.
const ASSISTANT_WEIGHTS: [(ShiftType, u32); 4] = [
    (ShiftType::Day, 3),
    (ShiftType::Evening, 2),
    (ShiftType::Night, 2),
    (ShiftType::Morning, 4),
];

fn weight(role: Role, shift: ShiftType) -> u32 {
    let table: &[(ShiftType, u32)] = match role {
        Role::StaffNurse => &STAFF_NURSE_WEIGHTS,
        Role::AssistantNurse => &ASSISTANT_WEIGHTS,
        Role::Supervisor => &[],
    };
    table
        .iter()
        .find(|(s, _)| *s == shift)
        .map_or(1, |(_, w)| *w)
}

/// Choisit un libellé parmi `candidates`.
///
/// - liste vide : `Off` ;
/// - un seul candidat : renvoyé tel quel ;
/// - sinon on se restreint aux types que la personne accepte (s'il en reste)
///   puis tirage pondéré selon le rôle (uniforme pour un cadre).
pub fn select_by_preference<R: Rng + ?Sized>(
    candidates: &[ShiftType],
    staff: &StaffMember,
    rng: &mut R,
) -> ShiftType {
    match candidates {
        [] => ShiftType::Off,
        [only] => *only,
        _ => {
            let preferred: Vec<ShiftType> = candidates
                .iter()
                .copied()
                .filter(|&s| staff.eligibility.allows(s))
                .collect();
            let pool = if preferred.is_empty() {
                candidates
            } else {
                &preferred
            };
            weighted_pick(pool, staff.role, rng)
        }
    }
}

fn weighted_pick<R: Rng + ?Sized>(pool: &[ShiftType], role: Role, rng: &mut R) -> ShiftType {
    if pool.len() == 1 {
        return pool[0];
    }
    if role == Role::Supervisor {
        return pool[rng.random_range(0..pool.len())];
    }
    let total: u32 = pool.iter().map(|&s| weight(role, s)).sum();
    let mut roll = rng.random_range(0..total);
    for &shift in pool {
        let w = weight(role, shift);
        if roll < w {
            return shift;
        }
        roll -= w;
    }
    pool[pool.len() - 1]
}

/// Retire des candidats ce qui casserait une règle locale :
/// - la nuit, si J+1 ou J+2 (dans le mois) porte déjà autre chose que Off / non renseigné ;
/// - le jour, si la veille est un soir.
pub fn filter_feasible(candidates: &[ShiftType], row: &[ShiftType], day: u32) -> Vec<ShiftType> {
    let at = |d: u32| -> ShiftType {
        if d == 0 {
            return ShiftType::Unset;
        }
        row.get((d - 1) as usize)
            .copied()
            .unwrap_or(ShiftType::Unset)
    };
    let night_blocked = [day + 1, day + 2].into_iter().any(|d| at(d).is_work());
    let after_evening = day > 1 && at(day - 1) == ShiftType::Evening;

    candidates
        .iter()
        .copied()
        .filter(|&s| match s {
            ShiftType::Night => !night_blocked,
            ShiftType::Day => !after_evening,
            _ => true,
        })
        .collect()
}
