//! Label and section based extraction for daily-report documents.
//!
//! Works on the flattened document text. Scalar fields are read from
//! `Label: value` lines, lists from a heading line followed by one item per
//! line. Anything not found stays `None`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use super::types::ReportExtractor;
use super::StructuringError;
use crate::models::{Activity, Equipment, ImportedReport, Service, StaffEntry, WeatherCondition};

// Label alternatives are tried in order, so longer labels come first.
const SITE_NAME_LABELS: &[&str] = &["Nome da Obra"];
const CONTRACTOR_LABELS: &[&str] = &["Empresa Contratada"];
const LOCATION_LABELS: &[&str] = &["Localização da Obra", "Localização"];
const SHEET_NUMBER_LABELS: &[&str] = &["Número da Folha", "Número", "RDO", "Folha"];
const RAIN_PERIOD_LABELS: &[&str] = &["Período da Chuva", "Período", "Chuva"];

const EQUIPMENT_HEADINGS: &[&str] = &["Equipamentos"];
const STAFF_HEADINGS: &[&str] = &["Corpo Efetivo", "Funcionários", "Colaboradores"];
const ACTIVITY_HEADINGS: &[&str] = &["Atividades Exercidas", "Atividades"];
const SERVICE_HEADINGS: &[&str] = &["Serviços Executados", "Serviços"];
const DESCRIPTION_HEADINGS: &[&str] = &["Descrição", "Observações"];

static SITE_NAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| label_patterns(SITE_NAME_LABELS));
static CONTRACTOR_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| label_patterns(CONTRACTOR_LABELS));
static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| label_patterns(LOCATION_LABELS));
static SHEET_NUMBER_PATTERNS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| label_patterns(SHEET_NUMBER_LABELS));
static RAIN_PERIOD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| label_patterns(RAIN_PERIOD_LABELS));

static EQUIPMENT_HEADING: LazyLock<Regex> = LazyLock::new(|| heading_pattern(EQUIPMENT_HEADINGS));
static STAFF_HEADING: LazyLock<Regex> = LazyLock::new(|| heading_pattern(STAFF_HEADINGS));
static ACTIVITY_HEADING: LazyLock<Regex> = LazyLock::new(|| heading_pattern(ACTIVITY_HEADINGS));
static SERVICE_HEADING: LazyLock<Regex> = LazyLock::new(|| heading_pattern(SERVICE_HEADINGS));
static DESCRIPTION_HEADING: LazyLock<Regex> = LazyLock::new(|| heading_pattern(DESCRIPTION_HEADINGS));

const ALL_HEADINGS: &[&[&str]] = &[
    EQUIPMENT_HEADINGS,
    STAFF_HEADINGS,
    ACTIVITY_HEADINGS,
    SERVICE_HEADINGS,
    DESCRIPTION_HEADINGS,
];

/// Lines kept from the end of the text when no description section exists.
const DESCRIPTION_FALLBACK_LINES: usize = 5;

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)Data[\s:]*(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})").unwrap(),
        Regex::new(r"(\d{1,2}[/-]\d{1,2}[/-]\d{2,4})").unwrap(),
    ]
});

static WEATHER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:Condições do Tempo|Condição|Tempo)[\s:]*([^\n]+)").unwrap());

static EQUIPMENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // "Betoneira - 2", "Betoneira: 2", "Betoneira - 2 - em manutenção"
        Regex::new(r"^(.+?)\s*[-:]\s*(\d+)(?:\s*[-:]\s*(.+))?$").unwrap(),
        // "Betoneira 2"
        Regex::new(r"^(.+?)\s+(\d+)$").unwrap(),
        // "Betoneira (2)", "Betoneira (2) - alugada"
        Regex::new(r"^(.+?)\s*\((\d+)\)(?:\s*[-:]\s*(.+))?$").unwrap(),
    ]
});

static STAFF_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"^(.+?)\s*[-:]\s*(\d+)$").unwrap(),
        Regex::new(r"^(.+?)\s+(\d+)$").unwrap(),
        Regex::new(r"^(.+?)\s*\((\d+)\)$").unwrap(),
    ]
});

/// `label` + optional `(…)` + separators, capturing the rest of the line.
fn label_patterns(labels: &[&str]) -> Vec<Regex> {
    labels
        .iter()
        .map(|label| {
            Regex::new(&format!(
                r"(?i){}(?:\s*\([^)\n]*\))?[\s:]*([^\n]+)",
                regex::escape(label)
            ))
            .unwrap()
        })
        .collect()
}

/// Any of `headings` followed by optional separators and a line break.
fn heading_pattern(headings: &[&str]) -> Regex {
    let alternatives: Vec<String> = headings.iter().map(|h| regex::escape(h)).collect();
    Regex::new(&format!(r"(?i)(?:{})[\s:]*\n", alternatives.join("|"))).unwrap()
}

static FIRST_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());
static NAME_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-:()]").unwrap());

/// Bullet glyphs and enumerations ("1." / "1)") at the start of a list item.
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[•●▪◦\-\*–]+|\d+[.)])\s*").unwrap());

/// Bullet glyphs only, and only when followed by whitespace so that a
/// leading minus in "- Betoneira - 2" goes but "-5" stays.
static ROW_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[•●▪◦\-\*–]+\s+").unwrap());

/// Regex-based extractor. Deterministic and offline.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicExtractor;

impl ReportExtractor for HeuristicExtractor {
    fn extract(&self, raw_text: &str) -> Result<ImportedReport, StructuringError> {
        Ok(parse_report_text(raw_text))
    }
}

/// Extract every recognisable field from document text.
pub fn parse_report_text(text: &str) -> ImportedReport {
    let report = ImportedReport {
        site_name: extract_labeled_value(text, &SITE_NAME_PATTERNS),
        contractor: extract_labeled_value(text, &CONTRACTOR_PATTERNS),
        location: extract_labeled_value(text, &LOCATION_PATTERNS),
        date: extract_date(text),
        sheet_number: extract_labeled_value(text, &SHEET_NUMBER_PATTERNS),
        weather: extract_weather(text),
        rain_period: extract_labeled_value(text, &RAIN_PERIOD_PATTERNS),
        equipment: extract_section(text, &EQUIPMENT_HEADING).map(|s| parse_equipment_lines(&s)),
        staff: extract_section(text, &STAFF_HEADING).map(|s| parse_staff_lines(&s)),
        activities: extract_section(text, &ACTIVITY_HEADING).map(|s| {
            parse_simple_list(&s)
                .into_iter()
                .map(|description| Activity { description })
                .collect()
        }),
        services: extract_section(text, &SERVICE_HEADING).map(|s| {
            parse_simple_list(&s)
                .into_iter()
                .map(|description| Service { description })
                .collect()
        }),
        description: extract_description(text),
    };

    debug!(fields = ?report.present_fields(), "Heuristic extraction finished");
    report
}

/// Value following the first label pattern that yields something usable.
///
/// An optional parenthetical right after the label is skipped, so
/// `Número da Folha (RDO): 014` reads as `014`.
pub fn extract_labeled_value(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        let value = re.captures(text)?.get(1)?.as_str().trim();
        if value.chars().any(char::is_alphanumeric) {
            Some(value.to_string())
        } else {
            None
        }
    })
}

/// First `D/M/Y` date (labelled `Data` preferred). Two-digit years are
/// read as 20YY and the result must exist in the calendar.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    DATE_PATTERNS.iter().find_map(|re| {
        let raw = re.captures(text)?.get(1)?.as_str();
        parse_day_month_year(raw)
    })
}

fn parse_day_month_year(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split(['/', '-']).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    let day: u32 = day.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let year: i32 = match year.len() {
        2 => 2000 + year.parse::<i32>().ok()?,
        4 => year.parse().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn extract_weather(text: &str) -> Option<WeatherCondition> {
    let value = WEATHER_PATTERN.captures(text)?.get(1)?.as_str().trim().to_lowercase();
    if value.contains("bom") {
        Some(WeatherCondition::Bom)
    } else if value.contains("nublado") {
        Some(WeatherCondition::Nublado)
    } else if value.contains("chuvoso") || value.contains("chuva") {
        Some(WeatherCondition::Chuvoso)
    } else {
        None
    }
}

/// Body of the first section whose heading matches `heading`.
///
/// The heading must be followed by a line break. The body ends at a blank
/// line followed by a line starting with a letter, at a line that is itself
/// a known section heading, or at the end of the text. An empty body is
/// `None`.
pub fn extract_section(text: &str, heading: &Regex) -> Option<String> {
    let start = heading.find(text)?.end();

    let lines: Vec<&str> = text[start..].split('\n').collect();
    let mut body = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if is_section_heading(line) {
            break;
        }
        if line.trim().is_empty() {
            let next_starts_with_letter = lines
                .get(i + 1)
                .and_then(|next| next.trim_start().chars().next())
                .is_some_and(char::is_alphabetic);
            if next_starts_with_letter {
                break;
            }
        }
        body.push(*line);
    }

    let body = body.join("\n").trim().to_string();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

fn is_section_heading(line: &str) -> bool {
    let normalized = line.trim().trim_end_matches(':').trim_end().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    ALL_HEADINGS
        .iter()
        .flat_map(|group| group.iter())
        .any(|heading| heading.to_lowercase() == normalized)
}

pub fn parse_equipment_lines(section: &str) -> Vec<Equipment> {
    non_blank_lines(section)
        .filter_map(|line| {
            let line = ROW_BULLET.replace(line, "");
            let line = line.trim();
            for re in EQUIPMENT_PATTERNS.iter() {
                let Some(caps) = re.captures(line) else {
                    continue;
                };
                let name = caps.get(1).map_or("", |m| m.as_str().trim());
                let quantity = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
                if let (false, Some(quantity)) = (name.is_empty(), quantity) {
                    let note = caps
                        .get(3)
                        .map(|m| m.as_str().trim().to_string())
                        .filter(|n| !n.is_empty());
                    return Some(Equipment {
                        name: name.to_string(),
                        quantity,
                        note,
                    });
                }
            }
            let (name, quantity) = fallback_name_and_quantity(line)?;
            Some(Equipment {
                name,
                quantity,
                note: None,
            })
        })
        .collect()
}

pub fn parse_staff_lines(section: &str) -> Vec<StaffEntry> {
    non_blank_lines(section)
        .filter_map(|line| {
            let line = ROW_BULLET.replace(line, "");
            let line = line.trim();
            for re in STAFF_PATTERNS.iter() {
                let Some(caps) = re.captures(line) else {
                    continue;
                };
                let role = caps.get(1).map_or("", |m| m.as_str().trim());
                let quantity = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
                if let (false, Some(quantity)) = (role.is_empty(), quantity) {
                    return Some(StaffEntry {
                        role: role.to_string(),
                        quantity,
                    });
                }
            }
            let (role, quantity) = fallback_name_and_quantity(line)?;
            Some(StaffEntry { role, quantity })
        })
        .collect()
}

/// Last resort for rows like "2 betoneiras": the first number is the
/// quantity, the rest of the line (digits and `-:()` removed) the name.
fn fallback_name_and_quantity(line: &str) -> Option<(String, u32)> {
    let quantity = FIRST_NUMBER.find(line)?.as_str().parse().ok()?;
    let without_digits = FIRST_NUMBER.replace_all(line, "");
    let name = NAME_PUNCTUATION
        .replace_all(without_digits.trim(), "")
        .trim()
        .to_string();
    if name.is_empty() {
        None
    } else {
        Some((name, quantity))
    }
}

/// One item per non-blank line, leading bullet or enumeration removed.
pub fn parse_simple_list(section: &str) -> Vec<String> {
    non_blank_lines(section)
        .map(|line| LIST_MARKER.replace(line, "").trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn extract_description(text: &str) -> Option<String> {
    if let Some(section) = extract_section(text, &DESCRIPTION_HEADING) {
        return Some(section);
    }
    let lines: Vec<&str> = text.split('\n').collect();
    let tail = lines[lines.len().saturating_sub(DESCRIPTION_FALLBACK_LINES)..]
        .join("\n")
        .trim()
        .to_string();
    if tail.is_empty() {
        None
    } else {
        Some(tail)
    }
}

fn non_blank_lines(section: &str) -> impl Iterator<Item = &str> {
    section.lines().map(str::trim).filter(|l| !l.is_empty())
}
