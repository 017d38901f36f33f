/// Default duration per service, in minutes. A booking created without an
/// explicit duration gets the longest matching entry for its service name
/// (so "Coupe + Brushing" resolves to Coupe's 45, not the fallback).
const SERVICE_DURATIONS: &[(&str, i32)] = &[
    ("Coloration", 120),
    ("Mèches", 180),
    ("Soin", 60),
    ("Kératine", 90),
    ("Mariage", 240),
    ("Maquillage", 60),
    ("Coupe", 45),
    ("Brushing", 30),
];

pub const DEFAULT_DURATION_MINUTES: i32 = 30;
pub const MIN_DURATION_MINUTES: i32 = 15;

pub fn default_duration(service_name: Option<&str>) -> i32 {
    let Some(name) = service_name else {
        return DEFAULT_DURATION_MINUTES;
    };
    SERVICE_DURATIONS
        .iter()
        .filter(|(key, _)| name.contains(key))
        .map(|(_, minutes)| *minutes)
        .max()
        .unwrap_or(DEFAULT_DURATION_MINUTES)
}
