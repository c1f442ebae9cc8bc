use super::types::Ward;
use super::util;
use crate::grid::ScheduleGrid;
use crate::model::{Duty, ShiftType};
use crate::rules::ShiftTargets;

/// Comble les manques d'effectif jour par jour et type par type (hors nuit).
///
/// Seules les infirmières sont mobilisées. Les candidates sont cherchées par
/// paliers : cases non renseignées, puis Off, puis autre type travaillé.
/// Dans un palier, on retient la personne au plus petit score
/// `3 × jours travaillés + 2 × série en cours + 1 si même poste la veille`.
pub fn adjust_staffing_deficits(
    ward: &Ward<'_>,
    grid: &mut ScheduleGrid,
    targets: &ShiftTargets,
) -> usize {
    let nurses = ward.members_on(grid, Duty::StaffNurse);
    let mut changed = 0;
    for day in 1..=grid.days() {
        for shift in [ShiftType::Day, ShiftType::Evening, ShiftType::Morning] {
            let need = targets.get(shift) as usize;
            let mut have = grid.count_on(day, shift);
            while have < need {
                let tiers: [&dyn Fn(ShiftType) -> bool; 3] = [
                    &|s| s == ShiftType::Unset,
                    &|s| s == ShiftType::Off,
                    &|s| s.is_work() && s != shift,
                ];
                let best = tiers.iter().find_map(|in_tier| {
                    nurses
                        .iter()
                        .filter(|&&(slot, member)| {
                            in_tier(grid.get(slot, day))
                                && !grid.is_pinned(slot, day)
                                && util::can_assign_at(ward, grid, slot, member, day, shift)
                        })
                        .min_by_key(|&&(slot, _)| {
                            let row = grid.row(slot);
                            let worked = row.iter().filter(|s| s.is_work()).count() as u32;
                            let streak = util::work_streak_back(row, day.saturating_sub(1));
                            let same = u32::from(util::at(row, day.saturating_sub(1)) == shift);
                            worked * 3 + streak * 2 + same
                        })
                        .map(|&(slot, _)| slot)
                });
                let Some(slot) = best else { break };
                grid.set(slot, day, shift);
                have += 1;
                changed += 1;
            }
        }
    }
    changed
}
