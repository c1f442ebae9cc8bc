#![forbid(unsafe_code)]
use roulement::{io, Duty, Role, Roster, ScheduleGrid, ShiftType, StaffMember};
use std::fs;
use tempfile::tempdir;

#[test]
fn import_staff_from_csv() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("staff.csv");
    fs::write(
        &path,
        "name,role,shifts,night_dedicated,weekend,remaining_vacation,used_vacation\n\
         Chef,HN,D,,,,\n\
         Alice,RN,DE,no,oui,3,1\n\
         Nuit,RN,N,yes,,,\n\
         Amel,AN,,,,,\n",
    )
    .unwrap();

    let staff = io::import_staff_csv(&path).unwrap();
    assert_eq!(staff.len(), 4);
    assert_eq!(staff[0].role, Role::Supervisor);
    assert!(staff[1].eligibility.evening && !staff[1].eligibility.night);
    assert_eq!(staff[1].remaining_vacation, 3);
    assert_eq!(staff[1].used_vacation, 1);
    assert_eq!(staff[2].duty(), Duty::NightDedicated);
    assert!(staff[3].can_work(ShiftType::Morning));
}

#[test]
fn bad_role_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("staff.csv");
    fs::write(&path, "name,role\nAlice,chirurgien\n").unwrap();
    let err = io::import_staff_csv(&path).unwrap_err();
    assert!(format!("{err:#}").contains("invalid role for Alice"));
}

#[test]
fn grid_csv_roundtrip_by_name() {
    let dir = tempdir().unwrap();
    let mut roster = Roster::default();
    roster.staff.push(StaffMember::new("Alice", Role::StaffNurse));
    roster.staff.push(StaffMember::new("Bruno", Role::StaffNurse));

    let input = dir.path().join("pins.csv");
    fs::write(&input, "name,1,2,3\nAlice,D,,O\nBruno,-,N,\n").unwrap();
    let map = io::import_grid_csv(&input, &roster).unwrap();
    let alice = map.get(&roster.staff[0].id).unwrap();
    assert_eq!(alice.len(), 2);
    assert_eq!(alice.get(&3), Some(&ShiftType::Off));
    assert_eq!(map.get(&roster.staff[1].id).unwrap().len(), 1);

    let mut grid = ScheduleGrid::new(2026, 2, roster.staff.iter().map(|m| m.id.clone()));
    grid.seed(&map);
    let out = dir.path().join("grid.csv");
    io::export_grid_csv(&out, &grid, &roster.staff).unwrap();
    let text = fs::read_to_string(&out).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("name,role,1,2,3,"));
    assert!(lines.next().unwrap().starts_with("Alice,RN,D,-,O,-"));
    assert!(lines.next().unwrap().starts_with("Bruno,RN,-,N,-"));
}

#[test]
fn unknown_name_in_grid_csv() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("pins.csv");
    fs::write(&input, "name,1\nPersonne,D\n").unwrap();
    let err = io::import_grid_csv(&input, &Roster::default()).unwrap_err();
    assert!(err.to_string().contains("unknown staff name"));
}
