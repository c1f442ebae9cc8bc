//! Règles de travail, besoins en effectif et réglages du pipeline.

use crate::calendar;
use crate::model::{Role, ShiftType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Marge tolérée au-delà du minimum de repos avant de signaler un excès.
pub const OFF_CAP_SLACK: u32 = 2;

/// Une infirmière ne fait qu'une nuit par mois.
pub const MAX_STAFF_NURSE_NIGHTS: usize = 1;

/// Contraintes de travail mensuelles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConstraints {
    pub min_days_off: u32,
    pub max_consecutive_days: u32,
    #[serde(default = "default_max_consecutive_off")]
    pub max_consecutive_off_days: u32,
    /// Déclaré mais seulement indicatif : le plafond effectif est celui du rôle.
    pub max_night_shifts: u32,
    #[serde(default)]
    pub weekend_work_required: bool,
}

fn default_max_consecutive_off() -> u32 {
    3
}

impl Default for ScheduleConstraints {
    fn default() -> Self {
        Self {
            min_days_off: 8,
            max_consecutive_days: 5,
            max_consecutive_off_days: default_max_consecutive_off(),
            max_night_shifts: 6,
            weekend_work_required: false,
        }
    }
}

impl ScheduleConstraints {
    /// Valeurs par défaut, avec un minimum de repos égal au nombre de jours
    /// de week-end et fériés du mois.
    pub fn for_month(year: i32, month: u32) -> Self {
        Self {
            min_days_off: calendar::weekend_holiday_count(year, month),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.max_consecutive_days == 0 {
            return Err("max_consecutive_days must be at least 1");
        }
        if self.max_consecutive_off_days == 0 {
            return Err("max_consecutive_off_days must be at least 1");
        }
        Ok(())
    }

    /// Jours travaillés maximum sur `days` jours.
    pub fn max_work_days(&self, days: u32) -> u32 {
        days.saturating_sub(self.min_days_off)
    }

    /// Jours travaillés minimum sur `days` jours.
    pub fn min_work_days(&self, days: u32) -> u32 {
        days.saturating_sub(self.min_days_off + OFF_CAP_SLACK)
    }
}

/// Besoin quotidien par rôle et par type de poste.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffingRequirement {
    targets: BTreeMap<Role, BTreeMap<ShiftType, u32>>,
}

impl StaffingRequirement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: Role, shift: ShiftType, count: u32) -> Self {
        self.set(role, shift, count);
        self
    }

    pub fn set(&mut self, role: Role, shift: ShiftType, count: u32) {
        self.targets.entry(role).or_default().insert(shift, count);
    }

    pub fn target(&self, role: Role, shift: ShiftType) -> u32 {
        self.targets
            .get(&role)
            .and_then(|by_shift| by_shift.get(&shift))
            .copied()
            .unwrap_or(0)
    }

    /// Somme des besoins de tous les rôles, type par type.
    pub fn aggregate(&self) -> ShiftTargets {
        let mut out = ShiftTargets::default();
        for by_shift in self.targets.values() {
            for (&shift, &count) in by_shift {
                out.add(shift, count);
            }
        }
        out
    }
}

/// Besoin agrégé par type travaillé.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftTargets {
    pub day: u32,
    pub evening: u32,
    pub night: u32,
    pub morning: u32,
}

impl ShiftTargets {
    pub fn get(&self, shift: ShiftType) -> u32 {
        match shift {
            ShiftType::Day => self.day,
            ShiftType::Evening => self.evening,
            ShiftType::Night => self.night,
            ShiftType::Morning => self.morning,
            ShiftType::Off | ShiftType::Unset => 0,
        }
    }

    fn add(&mut self, shift: ShiftType, count: u32) {
        match shift {
            ShiftType::Day => self.day += count,
            ShiftType::Evening => self.evening += count,
            ShiftType::Night => self.night += count,
            ShiftType::Morning => self.morning += count,
            ShiftType::Off | ShiftType::Unset => {}
        }
    }

    /// Effectif total attendu chaque jour.
    pub fn total(&self) -> u32 {
        self.day + self.evening + self.night + self.morning
    }
}

/// Seuil utilisé par le limiteur de repos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffCap {
    /// Exactement `min_days_off`.
    #[default]
    MinDaysOff,
    /// `min_days_off + OFF_CAP_SLACK`, le seuil du validateur.
    WithSlack,
}

impl OffCap {
    pub fn limit(self, min_days_off: u32) -> u32 {
        match self {
            OffCap::MinDaysOff => min_days_off,
            OffCap::WithSlack => min_days_off + OFF_CAP_SLACK,
        }
    }
}

/// Réglages du pipeline d'optimisation.
#[derive(Debug, Clone, Copy)]
pub struct PipelinePolicy {
    /// Le motif N,N,O,O des nuits fixes écrase les cases saisies à la main.
    pub night_pattern_overrides_pins: bool,
    pub off_cap: OffCap,
    /// Nombre maximal de passages de la ré-application finale des règles.
    pub settle_rounds: u8,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            night_pattern_overrides_pins: true,
            off_cap: OffCap::MinDaysOff,
            settle_rounds: 1,
        }
    }
}
