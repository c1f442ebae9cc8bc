#![forbid(unsafe_code)]
//! Roulement — génération de plannings mensuels pour une équipe soignante (sans BD).
//!
//! - Stockage fichiers (JSON/CSV).
//! - Motifs fixes pour les cadres et les nuits, tirage pondéré pour les autres.
//! - Règles dures (repos après nuit, soir → jour, séries) ré-appliquées en fin de calcul.
//! - Le hasard est injecté par l'appelant : une graine donne un planning reproductible.

pub mod calendar;
pub mod grid;
pub mod io;
pub mod model;
pub mod report;
pub mod rules;
pub mod scheduler;
pub mod storage;

pub use grid::{off_count, shortfall, worker_count, SavedSchedule, ScheduleGrid, ScheduleMap};
pub use model::{Duty, Eligibility, Role, Roster, ShiftType, StaffId, StaffMember};
pub use report::{prepare_report, DaySummary, StaffSummary, SummaryRenderer, TextSummary};
pub use rules::{OffCap, PipelinePolicy, ScheduleConstraints, ShiftTargets, StaffingRequirement};
pub use scheduler::{
    detect_violations, optimize, SchedError, ScheduleOutcome, Scheduler, Violation, ViolationKind,
};
pub use storage::{JsonStorage, RosterSource, Storage};
