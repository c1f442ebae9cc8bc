use crate::grid::ScheduleMap;
use crate::model::{Roster, StaffMember};
use crate::rules::StaffingRequirement;
use anyhow::{anyhow, Context};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge l'unité depuis un support.
    fn load(&self) -> anyhow::Result<Roster>;
    /// Sauvegarde de manière atomique.
    fn save(&self, roster: &Roster) -> anyhow::Result<()>;
}

/// Ce que le calcul lit de l'extérieur : personnel, besoins, planning déjà
/// saisi pour un mois donné.
pub trait RosterSource {
    fn staff(&self) -> anyhow::Result<Vec<StaffMember>>;
    fn staffing(&self) -> anyhow::Result<StaffingRequirement>;
    /// Cases épinglées du mois, s'il existe un planning enregistré.
    fn prior_schedule(&self, year: i32, month: u32) -> anyhow::Result<Option<ScheduleMap>>;
}

impl RosterSource for Roster {
    fn staff(&self) -> anyhow::Result<Vec<StaffMember>> {
        Ok(self.staff.clone())
    }

    fn staffing(&self) -> anyhow::Result<StaffingRequirement> {
        Ok(self.staffing.clone())
    }

    fn prior_schedule(&self, year: i32, month: u32) -> anyhow::Result<Option<ScheduleMap>> {
        self.schedule_for(year, month)
            .map(|saved| saved.pinned_map().map_err(|e| anyhow!(e)))
            .transpose()
            .with_context(|| format!("decoding saved schedule {year}-{month:02}"))
    }
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self { path: path.as_ref().to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Comme `load`, mais une unité vide si le fichier n'existe pas encore.
    pub fn load_or_default(&self) -> anyhow::Result<Roster> {
        match fs::metadata(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Roster::default()),
            _ => self.load(),
        }
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Roster> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let roster: Roster = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(roster)
    }

    fn save(&self, roster: &Roster) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(roster)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
