#![forbid(unsafe_code)]
use roulement::{
    JsonStorage, Role, Roster, RosterSource, SavedSchedule, ShiftType, StaffMember, Storage,
};
use tempfile::tempdir;

#[test]
fn missing_file_loads_as_empty_roster() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::open(dir.path().join("roster.json")).unwrap();
    let roster = storage.load_or_default().unwrap();
    assert!(roster.staff.is_empty());
    assert!(storage.load().is_err());
}

#[test]
fn save_and_load_roundtrip() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::open(dir.path().join("roster.json")).unwrap();

    let mut roster = Roster::default();
    roster.staff.push(StaffMember::new("Chef", Role::Supervisor));
    roster.staff.push(StaffMember::new("Nuit", Role::StaffNurse).night_dedicated());
    roster.staffing.set(Role::StaffNurse, ShiftType::Day, 2);
    let nuit = roster.staff[1].id.clone();
    let mut saved = SavedSchedule::new(2026, 2);
    saved.pin(&nuit, 4, ShiftType::Off, 28);
    saved.pin(&nuit, 2, ShiftType::Night, 28);
    roster.upsert_schedule(saved);
    storage.save(&roster).unwrap();

    let loaded = storage.load().unwrap();
    assert_eq!(loaded.staff, roster.staff);
    assert_eq!(loaded.staffing.target(Role::StaffNurse, ShiftType::Day), 2);
    assert_eq!(loaded.staffing.target(Role::AssistantNurse, ShiftType::Day), 0);

    let schedule = loaded.schedule_for(2026, 2).unwrap();
    assert_eq!(schedule.pinned.get(&nuit), Some(&vec![2, 4]));
    assert_eq!(schedule.rows.get(&nuit).map(|r| r.len()), Some(28));

    let prior = loaded.prior_schedule(2026, 2).unwrap().unwrap();
    let row = prior.get(&nuit).unwrap();
    assert_eq!(row.len(), 2);
    assert_eq!(row.get(&2), Some(&ShiftType::Night));
    assert_eq!(row.get(&4), Some(&ShiftType::Off));
    assert!(loaded.prior_schedule(2026, 3).unwrap().is_none());
}

#[test]
fn upsert_replaces_and_remove_deletes() {
    let mut roster = Roster::default();
    roster.upsert_schedule(SavedSchedule::new(2026, 2));
    let mut again = SavedSchedule::new(2026, 2);
    again.rows.insert(roulement::StaffId::new("x"), "D".into());
    roster.upsert_schedule(again);
    assert_eq!(roster.schedules.len(), 1);
    assert_eq!(roster.schedule_for(2026, 2).unwrap().rows.len(), 1);

    assert!(roster.remove_schedule(2026, 2));
    assert!(!roster.remove_schedule(2026, 2));
}

#[test]
fn corrupted_codes_are_reported() {
    let mut roster = Roster::default();
    let id = roulement::StaffId::new("x");
    let mut saved = SavedSchedule::new(2026, 2);
    saved.rows.insert(id.clone(), "DXO".into());
    saved.pinned.insert(id, vec![1]);
    roster.upsert_schedule(saved);
    assert!(roster.prior_schedule(2026, 2).is_err());
}

#[test]
fn pins_outside_the_month_are_ignored() {
    let id = roulement::StaffId::new("x");
    let mut saved = SavedSchedule::new(2026, 2);
    assert!(!saved.pin(&id, 0, ShiftType::Day, 28));
    assert!(!saved.pin(&id, 29, ShiftType::Day, 28));
    assert!(saved.rows.is_empty());
    assert!(saved.pinned.is_empty());

    assert!(saved.pin(&id, 1, ShiftType::Night, 28));
    assert!(saved.pin(&id, 28, ShiftType::Off, 28));
    let row = saved.rows.get(&id).unwrap();
    assert!(row.starts_with('N'));
    assert!(row.ends_with('O'));
    assert_eq!(saved.pinned.get(&id), Some(&vec![1, 28]));
}

#[test]
fn removing_staff_drops_their_saved_rows() {
    let mut roster = Roster::default();
    roster.staff.push(StaffMember::new("Alice", Role::StaffNurse));
    roster.staff.push(StaffMember::new("Bruno", Role::StaffNurse));
    let (alice, bruno) = (roster.staff[0].id.clone(), roster.staff[1].id.clone());
    let mut saved = SavedSchedule::new(2026, 2);
    saved.pin(&alice, 1, ShiftType::Day, 28);
    saved.pin(&bruno, 1, ShiftType::Off, 28);
    roster.upsert_schedule(saved);

    let removed = roster.remove_staff(&alice).unwrap();
    assert_eq!(removed.name, "Alice");
    assert_eq!(roster.staff.len(), 1);
    let schedule = roster.schedule_for(2026, 2).unwrap();
    assert!(!schedule.rows.contains_key(&alice));
    assert!(!schedule.pinned.contains_key(&alice));
    assert!(schedule.rows.contains_key(&bruno));
    assert!(roster.remove_staff(&alice).is_none());
}
