#![forbid(unsafe_code)]
use chrono::NaiveDate;
use frontdesk::{DayForecast, ForecastPreset, PresetStore};
use tempfile::tempdir;

#[test]
fn builtins_are_valid_and_ordered_by_season() {
    let presets = ForecastPreset::builtins();
    let ids: Vec<&str> = presets.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["high", "medium", "low"]);
    for preset in &presets {
        preset.validate().unwrap();
    }
    let total = |p: &ForecastPreset| -> i64 { p.days.iter().map(|d| d.check_ins + d.check_outs).sum() };
    assert!(total(&presets[0]) > total(&presets[1]));
    assert!(total(&presets[1]) > total(&presets[2]));
}

#[test]
fn preset_becomes_a_dated_forecast() {
    let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let forecast = ForecastPreset::low_season().to_forecast(Some(monday));
    assert_eq!(forecast.week_start, Some(monday));
    assert_eq!(forecast.days.len(), 7);
    assert_eq!(forecast.days[0], DayForecast::new(80, 70));
}

#[test]
fn save_list_and_load_roundtrip() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());
    assert!(store.list().unwrap().is_empty());

    let preset = ForecastPreset {
        id: "seminaire".into(),
        name: "Séminaire".into(),
        description: None,
        days: vec![DayForecast::new(40, 10); 7],
    };
    let path = store.save(&preset).unwrap();
    assert!(path.ends_with("seminaire.json"));

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].preset, preset);
    assert_eq!(store.load("seminaire").unwrap(), preset);
}

#[test]
fn saved_preset_shadows_builtin_and_unknown_id_fails() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());
    assert_eq!(store.load("high").unwrap(), ForecastPreset::high_season());

    let mut custom = ForecastPreset::high_season();
    custom.name = "Haute saison (salon)".into();
    store.save(&custom).unwrap();
    assert_eq!(store.load("high").unwrap().name, "Haute saison (salon)");

    assert!(store.load("inconnu").is_err());
}

#[test]
fn invalid_presets_are_rejected() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());

    let short = ForecastPreset {
        id: "court".into(),
        name: "Court".into(),
        description: None,
        days: vec![DayForecast::new(1, 1); 6],
    };
    assert!(store.save(&short).is_err());

    let negative = ForecastPreset {
        days: vec![DayForecast::new(-1, 0); 7],
        ..short
    };
    assert!(negative.validate().is_err());

    std::fs::write(dir.path().join("casse.json"), "{ pas du json").unwrap();
    assert!(store.list().unwrap().is_empty());
    assert!(store.load("casse").is_err());
}

#[test]
fn ids_cannot_leave_the_preset_directory() {
    let root = tempdir().unwrap();
    let store = PresetStore::new(root.path().join("presets"));

    let escaping = ForecastPreset {
        id: "../evade".into(),
        ..ForecastPreset::low_season()
    };
    assert!(escaping.validate().is_err());
    assert!(store.save(&escaping).is_err());
    assert!(!root.path().join("evade.json").exists());

    std::fs::write(root.path().join("dehors.json"), "{}").unwrap();
    assert!(store.load("../dehors").is_err());
    assert!(store.load("a/b").is_err());
}

#[test]
fn save_leaves_no_temporary_files() {
    let dir = tempdir().unwrap();
    let store = PresetStore::new(dir.path());
    store.save(&ForecastPreset::medium_season()).unwrap();
    store.save(&ForecastPreset::medium_season()).unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["medium.json"]);
}
