use crate::grid::ScheduleGrid;
use crate::model::{Duty, StaffId, StaffMember};
use crate::rules::ScheduleConstraints;
use std::fmt;
use thiserror::Error;

/// Contexte d'une passe : le personnel (dans l'ordre de planification) et
/// les contraintes du mois. La grille est passée à part, en `&mut`.
#[derive(Debug, Clone, Copy)]
pub struct Ward<'a> {
    staff: &'a [StaffMember],
    constraints: &'a ScheduleConstraints,
}

impl<'a> Ward<'a> {
    pub fn new(staff: &'a [StaffMember], constraints: &'a ScheduleConstraints) -> Self {
        Self { staff, constraints }
    }

    pub fn staff(&self) -> &'a [StaffMember] {
        self.staff
    }

    pub fn constraints(&self) -> &'a ScheduleConstraints {
        self.constraints
    }

    /// Couples (ligne, personne) présents dans la grille, dans l'ordre du roster.
    pub fn members(&self, grid: &ScheduleGrid) -> Vec<(usize, &'a StaffMember)> {
        self.staff
            .iter()
            .filter_map(|m| grid.slot_of(&m.id).map(|slot| (slot, m)))
            .collect()
    }

    pub fn members_on(&self, grid: &ScheduleGrid, duty: Duty) -> Vec<(usize, &'a StaffMember)> {
        self.members(grid)
            .into_iter()
            .filter(|(_, m)| m.duty() == duty)
            .collect()
    }

    /// Tout le monde sauf cadres et nuits fixes.
    pub fn rotating_members(&self, grid: &ScheduleGrid) -> Vec<(usize, &'a StaffMember)> {
        self.members(grid)
            .into_iter()
            .filter(|(_, m)| !matches!(m.duty(), Duty::Supervisor | Duty::NightDedicated))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    StaffNurseCoverage,
    SupervisorPattern,
    NightDedicatedPattern,
    ConsecutiveWork,
    ConsecutiveOff,
    NightRest,
    EveningToDay,
    StaffNurseEvening,
    StaffNurseNights,
    AssistantNightDay,
    AssistantNightOverlap,
    TooManyWorkDays,
    TooFewWorkDays,
    TooFewDaysOff,
    TooManyDaysOff,
    /// Échec du calcul lui-même.
    Failure,
}

/// Règle non respectée par la grille finale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub staff: Option<StaffId>,
    pub day: Option<u32>,
    pub detail: String,
}

impl Violation {
    pub(crate) fn new(kind: ViolationKind, detail: String) -> Self {
        Self {
            kind,
            staff: None,
            day: None,
            detail,
        }
    }

    pub(crate) fn of(mut self, staff: &StaffId) -> Self {
        self.staff = Some(staff.clone());
        self
    }

    pub(crate) fn on(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

/// Résultat d'un calcul de planning.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub success: bool,
    pub schedule: ScheduleGrid,
    pub message: String,
    pub violations: Vec<Violation>,
}

impl ScheduleOutcome {
    pub const SUCCESS_MESSAGE: &'static str = "schedule generated successfully";
    pub const PARTIAL_MESSAGE: &'static str = "some constraints are violated";

    pub(crate) fn from_grid(schedule: ScheduleGrid, violations: Vec<Violation>) -> Self {
        let success = violations.is_empty();
        let message = if success {
            Self::SUCCESS_MESSAGE
        } else {
            Self::PARTIAL_MESSAGE
        };
        Self {
            success,
            schedule,
            message: message.to_string(),
            violations,
        }
    }

    /// Résultat d'échec : grille vide, l'erreur comme unique violation.
    pub fn failed(year: i32, month: u32, err: &SchedError) -> Self {
        let detail = err.to_string();
        Self {
            success: false,
            schedule: ScheduleGrid::empty(year, month),
            message: format!("schedule generation failed: {detail}"),
            violations: vec![Violation::new(ViolationKind::Failure, detail)],
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("invalid constraints: {0}")]
    InvalidConstraints(&'static str),
    #[error("duplicate staff id: {0}")]
    DuplicateStaff(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
