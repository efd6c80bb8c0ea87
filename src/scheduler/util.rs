use crate::model::DAYS;
use std::collections::BTreeSet;
use std::ops::Range;

/// Fenêtres glissantes de `span` jours dans l'horizon.
pub(crate) fn day_windows(span: u8) -> impl Iterator<Item = Range<u8>> {
    let count = if span == 0 || span > DAYS { 0 } else { DAYS - span + 1 };
    (0..count).map(move |start| start..start + span)
}

/// Séquences maximales de jours travaillés consécutifs (bornes incluses).
pub(crate) fn working_runs(days: &BTreeSet<u8>) -> Vec<(u8, u8)> {
    let mut runs = Vec::new();
    let mut current: Option<(u8, u8)> = None;
    for &day in days {
        current = match current {
            Some((start, end)) if day == end + 1 => Some((start, day)),
            Some(run) => {
                runs.push(run);
                Some((day, day))
            }
            None => Some((day, day)),
        };
    }
    runs.extend(current);
    runs
}
