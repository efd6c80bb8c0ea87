use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Nombre de jours de l'horizon de planification.
pub const DAYS: u8 = 7;

/// Jours de la semaine, lundi = indice 0.
pub const WEEK: [Weekday; DAYS as usize] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Identifiant fort pour Employee
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(String);

impl EmployeeId {
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

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Supervisor,
    Receptionist,
    Concierge,
}

impl Role {
    /// Le rôle autorise-t-il ce créneau ?
    pub fn permits(self, slot: ShiftSlot) -> bool {
        match self {
            Role::Supervisor => slot.period != Period::Night,
            Role::Receptionist => true,
            Role::Concierge => slot.period == Period::Morning && slot.is_weekday(),
        }
    }

    /// Superviseurs et réceptionnistes tiennent le comptoir.
    pub fn staffs_desk(self) -> bool {
        matches!(self, Role::Supervisor | Role::Receptionist)
    }

    pub fn default_periods(self) -> BTreeSet<Period> {
        match self {
            Role::Supervisor | Role::Receptionist => [Period::Morning, Period::Afternoon].into(),
            Role::Concierge => [Period::Morning].into(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Supervisor => "supervisor",
            Role::Receptionist => "receptionist",
            Role::Concierge => "concierge",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    FullTime,
    #[serde(rename = "part_time_4")]
    PartTime4,
    #[serde(rename = "part_time_3")]
    PartTime3,
}

impl ContractType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractType::FullTime => "full_time",
            ContractType::PartTime4 => "part_time_4",
            ContractType::PartTime3 => "part_time_3",
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Morning,
    Afternoon,
    Night,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Morning, Period::Afternoon, Period::Night];

    pub fn index(self) -> usize {
        match self {
            Period::Morning => 0,
            Period::Afternoon => 1,
            Period::Night => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Morning => "morning",
            Period::Afternoon => "afternoon",
            Period::Night => "night",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Créneau (jour, période) de la semaine planifiée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ShiftSlot {
    pub day: u8,
    pub period: Period,
}

impl ShiftSlot {
    pub const COUNT: usize = DAYS as usize * 3;

    pub fn new(day: u8, period: Period) -> Self {
        Self { day, period }
    }

    /// Les 21 créneaux dans l'ordre chronologique.
    pub fn all() -> impl Iterator<Item = ShiftSlot> {
        (0..DAYS).flat_map(|day| Period::ALL.into_iter().map(move |p| ShiftSlot::new(day, p)))
    }

    pub fn index(self) -> usize {
        usize::from(self.day) * 3 + self.period.index()
    }

    pub fn weekday(self) -> Weekday {
        WEEK[usize::from(self.day) % WEEK.len()]
    }

    pub fn is_weekday(self) -> bool {
        self.day < 5
    }

    /// Date du créneau pour une semaine commençant `week_start`.
    pub fn date(self, week_start: NaiveDate) -> Option<NaiveDate> {
        week_start.checked_add_days(chrono::Days::new(u64::from(self.day)))
    }
}

impl fmt::Display for ShiftSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weekday(), self.period)
    }
}

fn default_true() -> bool {
    true
}

/// Membre de l'équipe front office
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub display_name: String,
    pub role: Role,
    pub contract: ContractType,
    #[serde(default)]
    pub languages: BTreeSet<String>,
    pub periods: BTreeSet<Period>,
    #[serde(default = "default_true")]
    pub available: bool,
    /// Jours d'absence (indices 0..6).
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub absences: BTreeSet<u8>,
}

impl Employee {
    pub fn new<D: Into<String>>(display_name: D, role: Role, contract: ContractType) -> Self {
        Self {
            id: EmployeeId::random(),
            display_name: display_name.into(),
            role,
            contract,
            languages: BTreeSet::new(),
            periods: role.default_periods(),
            available: true,
            absences: BTreeSet::new(),
        }
    }

    pub fn with_id<S: AsRef<str>>(mut self, id: S) -> Self {
        self.id = EmployeeId::new(id);
        self
    }

    pub fn with_periods<I: IntoIterator<Item = Period>>(mut self, periods: I) -> Self {
        self.periods = periods.into_iter().collect();
        self
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_absences<I: IntoIterator<Item = u8>>(mut self, days: I) -> Self {
        self.absences = days.into_iter().collect();
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Rôle et périodes déclarées autorisent le créneau.
    pub fn is_eligible(&self, slot: ShiftSlot) -> bool {
        self.role.permits(slot) && self.periods.contains(&slot.period)
    }

    /// Présent ce jour-là (disponible et pas en absence).
    pub fn is_present(&self, day: u8) -> bool {
        self.available && !self.absences.contains(&day)
    }

    pub fn can_work(&self, slot: ShiftSlot) -> bool {
        self.is_eligible(slot) && self.is_present(slot.day)
    }

    pub fn is_night_receptionist(&self) -> bool {
        self.role == Role::Receptionist && self.periods.contains(&Period::Night)
    }

    pub fn present_days(&self) -> u32 {
        (0..DAYS).filter(|d| self.is_present(*d)).count() as u32
    }
}

/// Prévision d'activité d'un jour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DayForecast {
    pub check_ins: i64,
    pub check_outs: i64,
}

impl DayForecast {
    pub fn new(check_ins: i64, check_outs: i64) -> Self {
        Self { check_ins, check_outs }
    }
}

/// Prévision d'occupation pour la semaine (lundi → dimanche).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OccupancyForecast {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<NaiveDate>,
    pub days: Vec<DayForecast>,
}

impl OccupancyForecast {
    pub fn new(days: Vec<DayForecast>) -> Self {
        Self { week_start: None, days }
    }

    /// Même activité tous les jours.
    pub fn flat(check_ins: i64, check_outs: i64) -> Self {
        Self::new(vec![DayForecast::new(check_ins, check_outs); usize::from(DAYS)])
    }

    pub fn starting(mut self, week_start: NaiveDate) -> Self {
        self.week_start = Some(week_start);
        self
    }
}

/// Une affectation (employé, créneau).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub employee: EmployeeId,
    pub slot: ShiftSlot,
}

impl AssignmentEntry {
    pub fn new(employee: EmployeeId, slot: ShiftSlot) -> Self {
        Self { employee, slot }
    }
}

/// Planning : ensemble de couples (employé, créneau). Valeur immuable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignment {
    entries: BTreeSet<AssignmentEntry>,
}

impl Assignment {
    pub fn new<I: IntoIterator<Item = AssignmentEntry>>(entries: I) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Copie augmentée d'une affectation.
    pub fn with_entry(&self, entry: AssignmentEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(entry);
        Self { entries }
    }

    /// Copie sans l'affectation donnée.
    pub fn without_entry(&self, entry: &AssignmentEntry) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(entry);
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssignmentEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, employee: &EmployeeId, slot: ShiftSlot) -> bool {
        self.entries.contains(&AssignmentEntry::new(employee.clone(), slot))
    }

    pub fn staff_in(&self, slot: ShiftSlot) -> impl Iterator<Item = &EmployeeId> {
        self.entries
            .iter()
            .filter(move |e| e.slot == slot)
            .map(|e| &e.employee)
    }

    pub fn slots_of<'a>(&'a self, employee: &'a EmployeeId) -> impl Iterator<Item = ShiftSlot> + 'a {
        self.entries
            .iter()
            .filter(move |e| &e.employee == employee)
            .map(|e| e.slot)
    }

    /// Jours travaillés (au moins une période) d'un employé.
    pub fn working_days(&self, employee: &EmployeeId) -> BTreeSet<u8> {
        self.slots_of(employee).map(|s| s.day).collect()
    }
}

impl FromIterator<AssignmentEntry> for Assignment {
    fn from_iter<I: IntoIterator<Item = AssignmentEntry>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Équipe de référence (15 personnes) du déploiement d'origine.
pub fn reference_team() -> Vec<Employee> {
    let mut team = Vec::with_capacity(15);
    for i in 1..=5 {
        team.push(
            Employee::new(format!("Superviseur {i}"), Role::Supervisor, ContractType::FullTime)
                .with_id(format!("sup-{i}"))
                .with_languages(["Français", "Anglais"]),
        );
    }
    for i in 1..=4 {
        team.push(
            Employee::new(format!("Réceptionniste {i}"), Role::Receptionist, ContractType::FullTime)
                .with_id(format!("rec-{i}"))
                .with_languages(["Français", "Anglais"]),
        );
    }
    team.push(
        Employee::new("Réceptionniste PT4", Role::Receptionist, ContractType::PartTime4)
            .with_id("rec-pt4")
            .with_languages(["Français", "Anglais"]),
    );
    team.push(
        Employee::new("Réceptionniste PT3", Role::Receptionist, ContractType::PartTime3)
            .with_id("rec-pt3")
            .with_languages(["Français", "Espagnol"]),
    );
    for i in 1..=3 {
        team.push(
            Employee::new(format!("Veilleur {i}"), Role::Receptionist, ContractType::FullTime)
                .with_id(format!("night-{i}"))
                .with_periods([Period::Night])
                .with_languages(["Français", "Anglais"]),
        );
    }
    team.push(
        Employee::new("Concierge", Role::Concierge, ContractType::FullTime)
            .with_id("concierge")
            .with_languages(["Français", "Anglais", "Italien"]),
    );
    team
}
