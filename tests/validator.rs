#![forbid(unsafe_code)]
use frontdesk::{
    estimate_demand, reference_team, validate_assignment, Assignment, AssignmentEntry,
    ConstraintViolation, EmployeeId, OccupancyForecast, Period, RuleSet, ShiftSlot,
    ViolationKind,
};

fn entry(id: &str, day: u8, period: Period) -> AssignmentEntry {
    AssignmentEntry::new(EmployeeId::new(id), ShiftSlot::new(day, period))
}

fn check(assignment: &Assignment) -> Vec<ConstraintViolation> {
    let rules = RuleSet::default();
    let demand = estimate_demand(&OccupancyForecast::flat(150, 150), &rules).unwrap();
    validate_assignment(&reference_team(), &demand, &rules, assignment)
}

fn of(violations: &[ConstraintViolation], id: &str) -> Vec<ViolationKind> {
    violations
        .iter()
        .filter(|v| v.employee.as_ref().map(EmployeeId::as_str) == Some(id))
        .map(|v| v.kind)
        .collect()
}

#[test]
fn empty_plan_reports_every_slot_shortfall_in_slot_order() {
    let violations = check(&Assignment::default());

    let count = |k: ViolationKind| violations.iter().filter(|v| v.kind == k).count();
    assert_eq!(count(ViolationKind::SlotMinimumUnmet), 14 * 2);
    assert_eq!(count(ViolationKind::NightReceptionistCountWrong), 7);
    assert_eq!(count(ViolationKind::ConciergeRuleViolated), 5);
    assert_eq!(violations.len(), 28 + 7 + 5);

    let monday_morning: Vec<ViolationKind> = violations[..3].iter().map(|v| v.kind).collect();
    assert_eq!(
        monday_morning,
        vec![
            ViolationKind::SlotMinimumUnmet,
            ViolationKind::SlotMinimumUnmet,
            ViolationKind::ConciergeRuleViolated,
        ]
    );
    assert_eq!(violations[0].observed, 0);
    assert_eq!(violations[0].required, 3);
    assert!(violations
        .windows(2)
        .all(|w| w[0].slot.unwrap() <= w[1].slot.unwrap()));
}

#[test]
fn over_capacity_slot_is_reported_once() {
    let plan: Assignment = ["sup-1", "sup-2", "rec-1", "rec-2", "rec-3"]
        .into_iter()
        .map(|id| entry(id, 1, Period::Afternoon))
        .collect();
    let violations = check(&plan);
    let over: Vec<_> = violations
        .iter()
        .filter(|v| v.kind == ViolationKind::SlotCapacityExceeded)
        .collect();
    assert_eq!(over.len(), 1);
    assert_eq!(over[0].slot, Some(ShiftSlot::new(1, Period::Afternoon)));
    assert_eq!((over[0].observed, over[0].required), (5, 4));
}

#[test]
fn seven_day_run_breaks_rest_consecutive_and_contract_rules() {
    let plan: Assignment = (0..7).map(|d| entry("rec-1", d, Period::Morning)).collect();
    let violations = check(&plan);

    assert_eq!(
        of(&violations, "rec-1"),
        vec![
            ViolationKind::RestDaysUnmet,
            ViolationKind::ConsecutiveDaysExceeded,
            ViolationKind::ContractCapExceeded,
        ]
    );
    let run = violations
        .iter()
        .find(|v| v.kind == ViolationKind::ConsecutiveDaysExceeded)
        .unwrap();
    assert_eq!(run.days, Some((0, 6)));
    assert_eq!((run.observed, run.required), (7, 5));
}

#[test]
fn part_time_contract_cap_is_checked() {
    let plan: Assignment = [0, 2, 4, 6]
        .into_iter()
        .map(|d| entry("rec-pt3", d, Period::Afternoon))
        .collect();
    let violations = check(&plan);
    assert_eq!(of(&violations, "rec-pt3"), vec![ViolationKind::ContractCapExceeded]);
}

#[test]
fn absences_lower_the_contract_allowance() {
    let rules = RuleSet::default();
    let demand = estimate_demand(&OccupancyForecast::flat(0, 0), &rules).unwrap();
    let team: Vec<_> = reference_team()
        .into_iter()
        .map(|e| if e.id.as_str() == "rec-1" { e.with_absences([0, 1]) } else { e })
        .collect();
    let plan: Assignment = (2..7).map(|d| entry("rec-1", d, Period::Morning)).collect();

    let violations = validate_assignment(&team, &demand, &rules, &plan);
    assert_eq!(of(&violations, "rec-1"), vec![ViolationKind::ContractCapExceeded]);
    let cap = violations
        .iter()
        .find(|v| v.kind == ViolationKind::ContractCapExceeded)
        .unwrap();
    assert_eq!((cap.observed, cap.required), (5, 3));
    assert!(cap.detail.contains("after 2 absence day(s)"), "{}", cap.detail);
}

#[test]
fn two_periods_on_one_day_are_flagged() {
    let plan = Assignment::new([
        entry("rec-2", 3, Period::Morning),
        entry("rec-2", 3, Period::Afternoon),
    ]);
    let violations = check(&plan);
    assert_eq!(of(&violations, "rec-2"), vec![ViolationKind::MultiplePeriodsPerDay]);
}

#[test]
fn concierge_on_saturday_breaks_role_and_concierge_rules() {
    let plan = Assignment::new([entry("concierge", 5, Period::Morning)]);
    let violations = check(&plan);

    assert_eq!(of(&violations, "concierge"), vec![ViolationKind::RoleIneligible]);
    let slot_issue = violations
        .iter()
        .find(|v| {
            v.kind == ViolationKind::ConciergeRuleViolated
                && v.slot == Some(ShiftSlot::new(5, Period::Morning))
        })
        .unwrap();
    assert_eq!((slot_issue.observed, slot_issue.required), (1, 0));
}

#[test]
fn absent_and_unknown_employees_are_reported() {
    let rules = RuleSet::default();
    let demand = estimate_demand(&OccupancyForecast::flat(0, 0), &rules).unwrap();
    let team: Vec<_> = reference_team()
        .into_iter()
        .map(|e| {
            if e.id.as_str() == "rec-3" {
                e.with_absences([2])
            } else {
                e
            }
        })
        .collect();
    let plan = Assignment::new([entry("rec-3", 2, Period::Morning), entry("ghost", 0, Period::Night)]);

    let violations = validate_assignment(&team, &demand, &rules, &plan);
    assert_eq!(of(&violations, "rec-3"), vec![ViolationKind::EmployeeUnavailable]);
    let last = violations.last().unwrap();
    assert_eq!(last.kind, ViolationKind::UnknownEmployee);
    assert_eq!(last.employee, Some(EmployeeId::new("ghost")));
}

#[test]
fn violation_text_is_actionable() {
    let plan = Assignment::new([entry("sup-1", 0, Period::Night)]);
    let violations = check(&plan);
    let v = violations
        .iter()
        .find(|v| v.kind == ViolationKind::RoleIneligible)
        .unwrap();
    insta::assert_snapshot!(v.to_string(), @"[role_ineligible] sup-1 (supervisor) is not eligible for Mon night");
}
