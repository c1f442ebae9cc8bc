pub mod assignment;
mod conflicts;
pub mod enforce;
pub mod rebalance;
pub mod select;
pub mod staffing;
mod types;
mod util;

pub use conflicts::detect_violations;
pub use types::{SchedError, ScheduleOutcome, Violation, ViolationKind, Ward};

use crate::calendar;
use crate::grid::{ScheduleGrid, ScheduleMap};
use crate::model::{sort_by_duty, Duty, StaffMember};
use crate::rules::{PipelinePolicy, ScheduleConstraints, ShiftTargets, StaffingRequirement};
use crate::storage::RosterSource;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Scheduler : porte le personnel et les règles d'une unité, et produit les
/// plannings mensuels.
#[derive(Debug, Clone)]
pub struct Scheduler {
    staff: Vec<StaffMember>,
    constraints: ScheduleConstraints,
    staffing: StaffingRequirement,
    policy: PipelinePolicy,
}

impl Scheduler {
    /// Le personnel est trié dans l'ordre de planification.
    pub fn new(mut staff: Vec<StaffMember>, constraints: ScheduleConstraints) -> Self {
        sort_by_duty(&mut staff);
        Self {
            staff,
            constraints,
            staffing: StaffingRequirement::default(),
            policy: PipelinePolicy::default(),
        }
    }

    pub fn with_staffing(mut self, staffing: StaffingRequirement) -> Self {
        self.staffing = staffing;
        self
    }

    pub fn with_policy(mut self, policy: PipelinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn staff(&self) -> &[StaffMember] {
        &self.staff
    }
    pub fn constraints(&self) -> &ScheduleConstraints {
        &self.constraints
    }

    /// Contexte de passe sur le personnel et les contraintes.
    pub fn ward(&self) -> Ward<'_> {
        Ward::new(&self.staff, &self.constraints)
    }

    /// Grille vide sur le personnel trié.
    pub fn blank_grid(&self, year: i32, month: u32) -> ScheduleGrid {
        ScheduleGrid::new(year, month, self.staff.iter().map(|s| s.id.clone()))
    }

    /// Valide une grille sans la modifier.
    pub fn validate(&self, grid: &ScheduleGrid) -> Vec<Violation> {
        detect_violations(&self.ward(), grid)
    }

    /// Calcule le planning du mois ; une erreur devient un résultat d'échec.
    pub fn optimize<R: Rng + ?Sized>(
        &self,
        year: i32,
        month: u32,
        initial: Option<&ScheduleMap>,
        rng: &mut R,
    ) -> ScheduleOutcome {
        self.try_optimize(year, month, initial, rng)
            .unwrap_or_else(|err| {
                warn!(%err, "schedule generation failed");
                ScheduleOutcome::failed(year, month, &err)
            })
    }

    pub fn try_optimize<R: Rng + ?Sized>(
        &self,
        year: i32,
        month: u32,
        initial: Option<&ScheduleMap>,
        rng: &mut R,
    ) -> Result<ScheduleOutcome, SchedError> {
        self.check_inputs(year, month)?;
        info!(year, month, staff = self.staff.len(), "generating schedule");

        let mut grid = self.blank_grid(year, month);
        if let Some(initial) = initial {
            for id in grid.seed(initial) {
                warn!(staff = %id, "initial schedule names unknown staff, ignored");
            }
        }
        self.run_pipeline(&mut grid, rng);

        let violations = self.validate(&grid);
        info!(year, month, violations = violations.len(), "schedule generated");
        Ok(ScheduleOutcome::from_grid(grid, violations))
    }

    fn check_inputs(&self, year: i32, month: u32) -> Result<(), SchedError> {
        let days =
            calendar::month_length(year, month).ok_or(SchedError::InvalidMonth { year, month })?;
        self.constraints
            .validate()
            .map_err(SchedError::InvalidConstraints)?;
        if self.constraints.min_days_off > days {
            return Err(SchedError::InvalidConstraints(
                "min_days_off exceeds the number of days in the month",
            ));
        }
        let mut seen = HashSet::new();
        for member in &self.staff {
            if !seen.insert(&member.id) {
                return Err(SchedError::DuplicateStaff(member.id.to_string()));
            }
        }
        Ok(())
    }

    /// Enchaîne les passes dans l'ordre fixe du pipeline.
    fn run_pipeline<R: Rng + ?Sized>(&self, grid: &mut ScheduleGrid, rng: &mut R) {
        let ward = self.ward();
        let targets: ShiftTargets = self.staffing.aggregate();
        let policy = self.policy;
        let slots = |duty: Duty, grid: &ScheduleGrid| -> Vec<usize> {
            ward.members_on(grid, duty).into_iter().map(|(slot, _)| slot).collect()
        };

        // 1-2. cases saisies à la main
        stage("pinned constraints", enforce::apply_pinned_constraints(&ward, grid, rng));

        // 3-5. repos alternés et aides-soignantes
        let nurses = slots(Duty::StaffNurse, grid);
        stage("nurse alternate off", assignment::pre_place_alternate_off(grid, &nurses));
        let assistants = ward.members_on(grid, Duty::AssistantNurse);
        stage("assistant nights", assignment::assign_assistant_nights(&ward, grid, &assistants));
        stage(
            "assistant pattern",
            assignment::assign_assistant_pattern(&ward, grid, &assistants, rng),
        );
        let assistant_slots = slots(Duty::AssistantNurse, grid);
        stage(
            "assistant alternate off",
            assignment::pre_place_alternate_off(grid, &assistant_slots),
        );

        // 6. génération par groupe de priorité
        let mut generated = 0;
        for (slot, _) in ward.members_on(grid, Duty::Supervisor) {
            generated += assignment::assign_supervisor(grid, slot);
        }
        let night_staff = ward.members_on(grid, Duty::NightDedicated);
        generated += assignment::assign_night_dedicated(grid, &night_staff);
        for (slot, member) in ward.members_on(grid, Duty::StaffNurse) {
            generated += assignment::assign_staff_nurse(&ward, grid, slot, member, rng);
        }
        stage("role generation", generated);

        // 7-10
        stage("nurse coverage", enforce::enforce_staff_nurse_coverage(&ward, grid, rng));
        stage("consecutive limits", enforce::enforce_consecutive_limits(&ward, grid, rng));
        stage("night staff cleanup", enforce::clear_night_dedicated_day_shifts(&ward, grid));
        let overrides = policy.night_pattern_overrides_pins;
        stage("night pattern", enforce::enforce_night_dedicated_pattern(&ward, grid, overrides));

        // 11-14
        stage("night rest", enforce::enforce_night_rest(&ward, grid));
        stage("consecutive limits", enforce::enforce_consecutive_limits(&ward, grid, rng));
        stage("evening-day", enforce::enforce_evening_day(&ward, grid, rng));
        let cap = policy.off_cap.limit(self.constraints.min_days_off);
        stage("off-day cap", enforce::limit_off_days(&ward, grid, cap, rng));

        // 15-18
        stage("night rest", enforce::enforce_night_rest(&ward, grid));
        stage("supervisor pattern", enforce::enforce_supervisor_pattern(&ward, grid));
        stage("night pattern", enforce::enforce_night_dedicated_pattern(&ward, grid, overrides));
        stage("nurse coverage", enforce::enforce_staff_nurse_coverage(&ward, grid, rng));

        // 19-24. rééquilibrage
        stage("staffing deficits", staffing::adjust_staffing_deficits(&ward, grid, &targets));
        stage("zigzag", rebalance::zigzag_distribute(&ward, grid));
        stage("month-end", rebalance::redistribute_to_month_end(&ward, grid));
        stage("daily targets", rebalance::satisfy_daily_targets(&ward, grid, &targets));
        stage("min-off fairness", rebalance::enforce_min_off_fairness(&ward, grid, &targets));
        stage("diversify", rebalance::diversify_similar(&ward, grid));
        stage("assistant balance", rebalance::equalize_assistants(&ward, grid));

        // 25. ré-application des règles dures, jusqu'à stabilité
        for round in 0..policy.settle_rounds.max(1) {
            let mut changed = enforce::enforce_night_rest(&ward, grid);
            changed += enforce::enforce_evening_day(&ward, grid, rng);
            changed += enforce::enforce_consecutive_limits(&ward, grid, rng);
            changed += enforce::enforce_supervisor_pattern(&ward, grid);
            changed += enforce::enforce_night_dedicated_pattern(&ward, grid, overrides);
            changed += enforce::enforce_staff_nurse_coverage(&ward, grid, rng);
            debug!(round, changed, "final enforcement round");
            if changed == 0 {
                break;
            }
        }
        // balayage final des lignes, puis reprise des jours découverts
        stage("row rules", enforce::enforce_row_rules(&ward, grid));
        stage("nurse coverage", enforce::enforce_staff_nurse_coverage(&ward, grid, rng));
    }

    /// Calcule à partir d'une source de données (personnel, besoins, planning
    /// déjà saisi pour le mois).
    pub fn optimize_from<S, R>(
        source: &S,
        year: i32,
        month: u32,
        constraints: ScheduleConstraints,
        rng: &mut R,
    ) -> Result<ScheduleOutcome, SchedError>
    where
        S: RosterSource + ?Sized,
        R: Rng + ?Sized,
    {
        let staff = source.staff()?;
        let staffing = source.staffing()?;
        let prior = source.prior_schedule(year, month)?;
        Scheduler::new(staff, constraints)
            .with_staffing(staffing)
            .try_optimize(year, month, prior.as_ref(), rng)
    }
}

fn stage(name: &'static str, changed: usize) {
    debug!(stage = name, changed, "pass applied");
}

/// Point d'entrée direct : calcule le planning du mois pour ce personnel.
pub fn optimize<R: Rng + ?Sized>(
    staff: &[StaffMember],
    year: i32,
    month: u32,
    staffing: &StaffingRequirement,
    constraints: &ScheduleConstraints,
    initial: Option<&ScheduleMap>,
    rng: &mut R,
) -> ScheduleOutcome {
    Scheduler::new(staff.to_vec(), constraints.clone())
        .with_staffing(staffing.clone())
        .optimize(year, month, initial, rng)
}
