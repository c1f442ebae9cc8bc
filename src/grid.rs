//! Grille mensuelle (personne × jour) et requêtes dérivées.

use crate::calendar;
use crate::model::{ShiftType, StaffId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Planning sous forme de table associative, tel que fourni par l'appelant.
pub type ScheduleMap = BTreeMap<StaffId, BTreeMap<u32, ShiftType>>;

/// Grille typée : une ligne par personne, une colonne par jour (jours 1..=N).
///
/// Les cases issues du planning initial sont marquées « épinglées » ; les
/// passes de génération ne les réécrivent jamais.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleGrid {
    year: i32,
    month: u32,
    days: u32,
    staff: Vec<StaffId>,
    index: HashMap<StaffId, usize>,
    cells: Vec<ShiftType>,
    pinned: Vec<bool>,
}

impl ScheduleGrid {
    /// Grille vide (toutes cases non renseignées). Un identifiant en double
    /// ne reçoit qu'une ligne.
    pub fn new<I>(year: i32, month: u32, staff: I) -> Self
    where
        I: IntoIterator<Item = StaffId>,
    {
        let days = calendar::month_length(year, month).unwrap_or(0);
        let mut ids = Vec::new();
        let mut index = HashMap::new();
        for id in staff {
            if index.contains_key(&id) {
                continue;
            }
            index.insert(id.clone(), ids.len());
            ids.push(id);
        }
        let size = ids.len() * days as usize;
        Self {
            year,
            month,
            days,
            staff: ids,
            index,
            cells: vec![ShiftType::Unset; size],
            pinned: vec![false; size],
        }
    }

    /// Grille sans personne, renvoyée en cas d'échec.
    pub fn empty(year: i32, month: u32) -> Self {
        Self::new(year, month, std::iter::empty())
    }

    /// Recopie un planning initial et épingle chaque case renseignée.
    ///
    /// Renvoie les identifiants inconnus de la grille, ignorés.
    pub fn seed(&mut self, initial: &ScheduleMap) -> Vec<StaffId> {
        let mut unknown = Vec::new();
        for (id, days) in initial {
            let Some(slot) = self.slot_of(id) else {
                unknown.push(id.clone());
                continue;
            };
            for (&day, &shift) in days {
                if shift == ShiftType::Unset {
                    continue;
                }
                if let Some(i) = self.offset(slot, day) {
                    self.cells[i] = shift;
                    self.pinned[i] = true;
                }
            }
        }
        unknown
    }

    pub fn year(&self) -> i32 {
        self.year
    }
    pub fn month(&self) -> u32 {
        self.month
    }
    pub fn days(&self) -> u32 {
        self.days
    }
    pub fn staff_ids(&self) -> &[StaffId] {
        &self.staff
    }
    pub fn len(&self) -> usize {
        self.staff.len()
    }
    pub fn is_empty(&self) -> bool {
        self.staff.is_empty()
    }

    pub fn slot_of(&self, id: &StaffId) -> Option<usize> {
        self.index.get(id).copied()
    }

    fn offset(&self, slot: usize, day: u32) -> Option<usize> {
        if slot >= self.staff.len() || day == 0 || day > self.days {
            return None;
        }
        Some(slot * self.days as usize + (day - 1) as usize)
    }

    /// Ligne d'une personne ; l'indice `d - 1` porte le jour `d`.
    pub fn row(&self, slot: usize) -> &[ShiftType] {
        let width = self.days as usize;
        if slot >= self.staff.len() {
            return &[];
        }
        &self.cells[slot * width..(slot + 1) * width]
    }

    /// Libellé d'une case ; hors grille, `Unset`.
    pub fn get(&self, slot: usize, day: u32) -> ShiftType {
        self.offset(slot, day)
            .map_or(ShiftType::Unset, |i| self.cells[i])
    }

    pub fn is_pinned(&self, slot: usize, day: u32) -> bool {
        self.offset(slot, day).is_some_and(|i| self.pinned[i])
    }

    /// Écrit sans condition. Renvoie vrai si la case a changé.
    pub fn set(&mut self, slot: usize, day: u32, shift: ShiftType) -> bool {
        match self.offset(slot, day) {
            Some(i) if self.cells[i] != shift => {
                self.cells[i] = shift;
                true
            }
            _ => false,
        }
    }

    /// Écrit seulement dans une case encore non renseignée.
    pub fn fill(&mut self, slot: usize, day: u32, shift: ShiftType) -> bool {
        match self.offset(slot, day) {
            Some(i) if self.cells[i] == ShiftType::Unset => {
                self.cells[i] = shift;
                shift != ShiftType::Unset
            }
            _ => false,
        }
    }

    /// Libellés de tout le monde pour un jour.
    pub fn column(&self, day: u32) -> impl Iterator<Item = ShiftType> + '_ {
        (0..self.staff.len()).map(move |slot| self.get(slot, day))
    }

    /// Nombre de personnes sur ce libellé ce jour-là.
    pub fn count_on(&self, day: u32, shift: ShiftType) -> usize {
        self.column(day).filter(|&s| s == shift).count()
    }

    pub fn count_in_row(&self, slot: usize, shift: ShiftType) -> usize {
        self.row(slot).iter().filter(|&&s| s == shift).count()
    }

    pub fn work_days(&self, slot: usize) -> usize {
        self.row(slot).iter().filter(|s| s.is_work()).count()
    }

    pub fn to_map(&self) -> ScheduleMap {
        self.staff
            .iter()
            .enumerate()
            .map(|(slot, id)| {
                let days = self
                    .row(slot)
                    .iter()
                    .enumerate()
                    .map(|(i, &s)| (i as u32 + 1, s))
                    .collect();
                (id.clone(), days)
            })
            .collect()
    }
}

/// Nombre de jours Off d'une personne ; 0 si elle est absente de la grille.
pub fn off_count(grid: &ScheduleGrid, id: &StaffId) -> usize {
    grid.slot_of(id)
        .map_or(0, |slot| grid.count_in_row(slot, ShiftType::Off))
}

/// Nombre de personnes au travail ce jour-là.
pub fn worker_count(grid: &ScheduleGrid, day: u32) -> usize {
    grid.column(day).filter(|s| s.is_work()).count()
}

/// Manque d'effectif par rapport à `target` (0 si l'objectif est atteint).
pub fn shortfall(grid: &ScheduleGrid, day: u32, target: usize) -> usize {
    target.saturating_sub(worker_count(grid, day))
}

/// Repos encore à poser pour atteindre `min_days_off`.
pub fn remaining_off(grid: &ScheduleGrid, id: &StaffId, min_days_off: u32) -> usize {
    (min_days_off as usize).saturating_sub(off_count(grid, id))
}

/// Planning enregistré d'un mois : une chaîne de codes par personne, plus
/// la liste des jours épinglés.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSchedule {
    pub year: i32,
    pub month: u32,
    pub rows: BTreeMap<StaffId, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub pinned: BTreeMap<StaffId, Vec<u32>>,
}

impl SavedSchedule {
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            rows: BTreeMap::new(),
            pinned: BTreeMap::new(),
        }
    }

    /// Décode les lignes ; un code inconnu est une erreur.
    pub fn to_map(&self) -> Result<ScheduleMap, String> {
        let mut out = ScheduleMap::new();
        for (id, codes) in &self.rows {
            let mut days = BTreeMap::new();
            for (i, c) in codes.chars().enumerate() {
                let shift = ShiftType::from_code(c)
                    .ok_or_else(|| format!("invalid shift code {c:?} for {id}"))?;
                days.insert(i as u32 + 1, shift);
            }
            out.insert(id.clone(), days);
        }
        Ok(out)
    }

    /// Seulement les cases épinglées, à réinjecter comme planning initial.
    pub fn pinned_map(&self) -> Result<ScheduleMap, String> {
        let full = self.to_map()?;
        let mut out = ScheduleMap::new();
        for (id, days) in &self.pinned {
            let Some(row) = full.get(id) else { continue };
            let kept: BTreeMap<u32, ShiftType> = days
                .iter()
                .filter_map(|d| row.get(d).map(|&s| (*d, s)))
                .filter(|(_, s)| *s != ShiftType::Unset)
                .collect();
            if !kept.is_empty() {
                out.insert(id.clone(), kept);
            }
        }
        Ok(out)
    }

    /// Épingle (ou remplace) une case. Un jour hors `1..=days_in_month` est
    /// ignoré et renvoie faux.
    pub fn pin(&mut self, id: &StaffId, day: u32, shift: ShiftType, days_in_month: u32) -> bool {
        if day == 0 || day > days_in_month {
            return false;
        }
        let row = self
            .rows
            .entry(id.clone())
            .or_insert_with(|| "-".repeat(days_in_month as usize));
        let mut codes: Vec<char> = row.chars().collect();
        codes.resize(days_in_month as usize, '-');
        codes[(day - 1) as usize] = shift.code();
        *row = codes.into_iter().collect();
        let pinned = self.pinned.entry(id.clone()).or_default();
        if !pinned.contains(&day) {
            pinned.push(day);
            pinned.sort_unstable();
        }
        true
    }
}

impl From<&ScheduleGrid> for SavedSchedule {
    fn from(grid: &ScheduleGrid) -> Self {
        let mut saved = SavedSchedule::new(grid.year(), grid.month());
        for (slot, id) in grid.staff_ids().iter().enumerate() {
            let codes: String = grid.row(slot).iter().map(|s| s.code()).collect();
            saved.rows.insert(id.clone(), codes);
            let pins: Vec<u32> = (1..=grid.days())
                .filter(|&d| grid.is_pinned(slot, d))
                .collect();
            if !pins.is_empty() {
                saved.pinned.insert(id.clone(), pins);
            }
        }
        saved
    }
}
