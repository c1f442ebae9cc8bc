use crate::grid::SavedSchedule;
use crate::rules::{ScheduleConstraints, StaffingRequirement};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifiant fort pour un membre du personnel
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StaffId(String);

impl StaffId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StaffId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Poste occupé dans l'équipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Cadre / infirmière en chef
    #[serde(alias = "HN")]
    Supervisor,
    /// Infirmière
    #[serde(alias = "RN")]
    StaffNurse,
    /// Aide-soignante
    #[serde(alias = "AN")]
    AssistantNurse,
}

impl Role {
    pub fn code(self) -> &'static str {
        match self {
            Role::Supervisor => "HN",
            Role::StaffNurse => "RN",
            Role::AssistantNurse => "AN",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hn" | "supervisor" => Ok(Role::Supervisor),
            "rn" | "staff_nurse" | "staffnurse" | "nurse" => Ok(Role::StaffNurse),
            "an" | "assistant_nurse" | "assistantnurse" | "assistant" => Ok(Role::AssistantNurse),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Catégorie de planification, dérivée du rôle et du drapeau « nuit fixe ».
///
/// L'ordre des variantes est l'ordre de tri du roster pour un calcul.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Duty {
    Supervisor,
    StaffNurse,
    NightDedicated,
    AssistantNurse,
}

/// Libellé d'une case du planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ShiftType {
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "E")]
    Evening,
    #[serde(rename = "N")]
    Night,
    #[serde(rename = "M")]
    Morning,
    #[serde(rename = "O")]
    Off,
    #[default]
    #[serde(rename = "-")]
    Unset,
}

impl ShiftType {
    /// Les quatre types travaillés, dans l'ordre canonique.
    pub const WORK: [ShiftType; 4] = [
        ShiftType::Day,
        ShiftType::Evening,
        ShiftType::Night,
        ShiftType::Morning,
    ];

    pub fn code(self) -> char {
        match self {
            ShiftType::Day => 'D',
            ShiftType::Evening => 'E',
            ShiftType::Night => 'N',
            ShiftType::Morning => 'M',
            ShiftType::Off => 'O',
            ShiftType::Unset => '-',
        }
    }

    pub fn from_code(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'D' => Some(ShiftType::Day),
            'E' => Some(ShiftType::Evening),
            'N' => Some(ShiftType::Night),
            'M' => Some(ShiftType::Morning),
            'O' => Some(ShiftType::Off),
            '-' => Some(ShiftType::Unset),
            _ => None,
        }
    }

    pub fn is_work(self) -> bool {
        !matches!(self, ShiftType::Off | ShiftType::Unset)
    }

    /// Off ou non renseigné.
    pub fn is_free(self) -> bool {
        !self.is_work()
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for ShiftType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(ShiftType::Unset),
            (Some(c), None) => {
                ShiftType::from_code(c).ok_or_else(|| format!("unknown shift code: {c}"))
            }
            _ => Err(format!("shift code must be one character: {s}")),
        }
    }
}

/// Types de poste que la personne accepte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub day: bool,
    pub evening: bool,
    pub night: bool,
    #[serde(default)]
    pub morning: bool,
}

impl Eligibility {
    pub const ALL: Eligibility = Eligibility {
        day: true,
        evening: true,
        night: true,
        morning: true,
    };

    /// Lecture compacte, ex. `"DEN"` ou `"DEM"`.
    pub fn from_codes(codes: &str) -> Result<Self, String> {
        let mut out = Eligibility {
            day: false,
            evening: false,
            night: false,
            morning: false,
        };
        for c in codes.chars().filter(|c| !c.is_whitespace()) {
            match ShiftType::from_code(c) {
                Some(ShiftType::Day) => out.day = true,
                Some(ShiftType::Evening) => out.evening = true,
                Some(ShiftType::Night) => out.night = true,
                Some(ShiftType::Morning) => out.morning = true,
                _ => return Err(format!("invalid eligibility code: {c}")),
            }
        }
        Ok(out)
    }

    /// Vrai uniquement pour un type travaillé coché.
    pub fn allows(&self, shift: ShiftType) -> bool {
        match shift {
            ShiftType::Day => self.day,
            ShiftType::Evening => self.evening,
            ShiftType::Night => self.night,
            ShiftType::Morning => self.morning,
            ShiftType::Off | ShiftType::Unset => false,
        }
    }
}

impl Default for Eligibility {
    fn default() -> Self {
        Eligibility {
            day: true,
            evening: true,
            night: true,
            morning: false,
        }
    }
}

/// Membre du personnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: StaffId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub eligibility: Eligibility,
    #[serde(default)]
    pub night_dedicated: bool,
    #[serde(default = "default_true")]
    pub weekend_eligible: bool,
    #[serde(default)]
    pub remaining_vacation: u32,
    #[serde(default)]
    pub used_vacation: u32,
}

fn default_true() -> bool {
    true
}

impl StaffMember {
    pub fn new<N: Into<String>>(name: N, role: Role) -> Self {
        let morning = role == Role::AssistantNurse;
        Self {
            id: StaffId::random(),
            name: name.into(),
            role,
            eligibility: Eligibility {
                morning,
                ..Eligibility::default()
            },
            night_dedicated: false,
            weekend_eligible: true,
            remaining_vacation: 0,
            used_vacation: 0,
        }
    }

    pub fn with_id(mut self, id: StaffId) -> Self {
        self.id = id;
        self
    }

    pub fn with_eligibility(mut self, eligibility: Eligibility) -> Self {
        self.eligibility = eligibility;
        self
    }

    pub fn night_dedicated(mut self) -> Self {
        self.night_dedicated = true;
        self
    }

    pub fn duty(&self) -> Duty {
        match self.role {
            Role::Supervisor => Duty::Supervisor,
            _ if self.night_dedicated => Duty::NightDedicated,
            Role::StaffNurse => Duty::StaffNurse,
            Role::AssistantNurse => Duty::AssistantNurse,
        }
    }

    /// Peut tenir ce type : case cochée, et le matin reste réservé aux aides-soignantes.
    pub fn can_work(&self, shift: ShiftType) -> bool {
        if shift == ShiftType::Morning && self.role != Role::AssistantNurse {
            return false;
        }
        if self.night_dedicated && self.duty() == Duty::NightDedicated {
            return shift == ShiftType::Night;
        }
        self.eligibility.allows(shift)
    }

    /// Types travaillés effectivement ouverts à la personne.
    pub fn work_types(&self) -> Vec<ShiftType> {
        ShiftType::WORK
            .into_iter()
            .filter(|&s| self.can_work(s))
            .collect()
    }
}

/// Trie le roster dans l'ordre de planification : cadres, infirmières,
/// nuits fixes, aides-soignantes ; à catégorie égale, les profils les plus
/// contraints d'abord, puis par nom.
pub fn sort_by_duty(staff: &mut [StaffMember]) {
    staff.sort_by(|a, b| {
        a.duty()
            .cmp(&b.duty())
            .then_with(|| a.work_types().len().cmp(&b.work_types().len()))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Unité de soins complète : personnel, besoins, contraintes et plannings enregistrés.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Roster {
    pub staff: Vec<StaffMember>,
    #[serde(default)]
    pub staffing: StaffingRequirement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<ScheduleConstraints>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schedules: Vec<SavedSchedule>,
}

impl Roster {
    pub fn find_staff_by_name<'a>(&'a self, name: &str) -> Option<&'a StaffMember> {
        self.staff.iter().find(|s| s.name == name)
    }
    pub fn find_staff_by_id<'a>(&'a self, id: &StaffId) -> Option<&'a StaffMember> {
        self.staff.iter().find(|s| &s.id == id)
    }
    pub fn find_staff_mut_by_name(&mut self, name: &str) -> Option<&mut StaffMember> {
        self.staff.iter_mut().find(|s| s.name == name)
    }

    /// Retire une personne et ses lignes des plannings enregistrés.
    pub fn remove_staff(&mut self, id: &StaffId) -> Option<StaffMember> {
        let index = self.staff.iter().position(|s| &s.id == id)?;
        for schedule in &mut self.schedules {
            schedule.rows.remove(id);
            schedule.pinned.remove(id);
        }
        Some(self.staff.remove(index))
    }
    pub fn schedule_for(&self, year: i32, month: u32) -> Option<&SavedSchedule> {
        self.schedules
            .iter()
            .find(|s| s.year == year && s.month == month)
    }
    pub fn schedule_mut(&mut self, year: i32, month: u32) -> Option<&mut SavedSchedule> {
        self.schedules
            .iter_mut()
            .find(|s| s.year == year && s.month == month)
    }

    /// Remplace (ou ajoute) le planning du mois.
    pub fn upsert_schedule(&mut self, schedule: SavedSchedule) {
        match self.schedule_mut(schedule.year, schedule.month) {
            Some(slot) => *slot = schedule,
            None => self.schedules.push(schedule),
        }
    }

    pub fn remove_schedule(&mut self, year: i32, month: u32) -> bool {
        let before = self.schedules.len();
        self.schedules
            .retain(|s| !(s.year == year && s.month == month));
        before != self.schedules.len()
    }

    /// Contraintes enregistrées, sinon valeurs par défaut du mois.
    pub fn constraints_for(&self, year: i32, month: u32) -> ScheduleConstraints {
        self.constraints
            .clone()
            .unwrap_or_else(|| ScheduleConstraints::for_month(year, month))
    }
}
