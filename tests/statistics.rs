#![forbid(unsafe_code)]
use frontdesk::{
    analyze, estimate_demand, reference_team, Assignment, AssignmentEntry, ContractType,
    EmployeeId, OccupancyForecast, Period, Role, RuleSet, ShiftSlot,
};

fn entry(id: &str, day: u8, period: Period) -> AssignmentEntry {
    AssignmentEntry::new(EmployeeId::new(id), ShiftSlot::new(day, period))
}

fn sample() -> Assignment {
    Assignment::new([
        entry("sup-1", 0, Period::Morning),
        entry("sup-1", 1, Period::Morning),
        entry("rec-1", 0, Period::Morning),
        entry("night-1", 0, Period::Night),
        entry("concierge", 0, Period::Morning),
        entry("ghost", 2, Period::Afternoon),
    ])
}

#[test]
fn hours_and_shifts_per_employee() {
    let rules = RuleSet::default();
    let demand = estimate_demand(&OccupancyForecast::flat(150, 150), &rules).unwrap();
    let stats = analyze(&reference_team(), &demand, &rules, &sample());

    let sup = stats.load_of(&EmployeeId::new("sup-1")).unwrap();
    assert_eq!((sup.shifts, sup.hours, sup.days_worked), (2, 16, 2));
    assert_eq!(sup.contract_days, 5);
    let pt3 = stats.load_of(&EmployeeId::new("rec-pt3")).unwrap();
    assert_eq!((pt3.shifts, pt3.contract_days), (0, 3));

    // l'inconnu n'est pas compté
    assert_eq!(stats.total_shifts, 5);
    assert_eq!(stats.total_hours, 40);
    assert_eq!(stats.active_employees, 4);
    assert_eq!(stats.employees.len(), 15);
}

#[test]
fn slot_coverage_compares_desk_headcount_with_requirement() {
    let rules = RuleSet::default();
    let demand = estimate_demand(&OccupancyForecast::flat(150, 150), &rules).unwrap();
    let stats = analyze(&reference_team(), &demand, &rules, &sample());

    let monday = stats.coverage(ShiftSlot::new(0, Period::Morning)).unwrap();
    assert_eq!(
        (monday.supervisors, monday.receptionists, monday.concierges),
        (1, 1, 1)
    );
    assert_eq!((monday.actual, monday.required, monday.ratio_headcount), (2, 3, 3));
    assert!(!monday.meets_ratio());
    assert!((monday.fill_ratio() - 2.0 / 3.0).abs() < 1e-9);

    let night = stats.coverage(ShiftSlot::new(0, Period::Night)).unwrap();
    assert_eq!((night.actual, night.required), (1, 2));

    // seules les nuits (ratio nul) respectent le ratio
    assert!((stats.ratio_compliance - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn quiet_week_is_fully_ratio_compliant() {
    let rules = RuleSet::default();
    let demand = estimate_demand(&OccupancyForecast::flat(0, 0), &rules).unwrap();
    let stats = analyze(&reference_team(), &demand, &rules, &Assignment::default());
    assert_eq!(stats.ratio_compliance, 100.0);
    assert_eq!(stats.active_employees, 0);
    assert_eq!(stats.dominant_language, None);
}

#[test]
fn role_balance_and_dominant_language() {
    let rules = RuleSet::default();
    let demand = estimate_demand(&OccupancyForecast::flat(150, 150), &rules).unwrap();
    let stats = analyze(&reference_team(), &demand, &rules, &sample());

    let supervisors = stats
        .balance
        .iter()
        .find(|b| b.role == Role::Supervisor && b.contract == ContractType::FullTime)
        .unwrap();
    assert_eq!(supervisors.members, 5);
    assert_eq!((supervisors.min_shifts, supervisors.max_shifts), (0, 2));
    assert_eq!(supervisors.spread(), 2);

    // veilleurs et réceptionnistes de jour forment deux classes distinctes
    let receptionist_classes = stats
        .balance
        .iter()
        .filter(|b| b.role == Role::Receptionist && b.contract == ContractType::FullTime)
        .count();
    assert_eq!(receptionist_classes, 2);

    // Anglais et Français à égalité : ordre alphabétique
    assert_eq!(stats.dominant_language.as_deref(), Some("Anglais"));
}

#[test]
fn hours_follow_the_configured_period_length() {
    let rules = RuleSet {
        hours_per_period: 7,
        ..RuleSet::default()
    };
    let demand = estimate_demand(&OccupancyForecast::flat(0, 0), &rules).unwrap();
    let stats = analyze(&reference_team(), &demand, &rules, &sample());
    assert_eq!(stats.total_hours, 35);
}

#[test]
fn oversized_period_length_saturates_hours() {
    let rules = RuleSet {
        hours_per_period: u32::MAX,
        ..RuleSet::default()
    };
    let demand = estimate_demand(&OccupancyForecast::flat(0, 0), &rules).unwrap();
    let stats = analyze(&reference_team(), &demand, &rules, &sample());
    let sup = stats.load_of(&EmployeeId::new("sup-1")).unwrap();
    assert_eq!(sup.hours, u32::MAX);
    assert_eq!(stats.total_hours, u32::MAX);
}
