//! Tabular roster ingestion. Each row is coerced field by field: unknown or missing
//! values fall back to safe defaults and only rows that cannot be identified are
//! dropped.

use std::collections::HashSet;
use std::io::Read;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::models::employee::Employee;
use crate::models::patient::{DEFAULT_LANGUAGE, Patient};
use crate::models::service::{Qualification, ServiceType, TransportMode};

const DEFAULT_PRIORITY: i32 = 1;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unreadable header row: {0}")]
    Header(#[from] csv::Error),
}

#[derive(Debug)]
pub struct IngestReport<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct EmployeeRow {
    #[serde(rename = "EmployeeID", default)]
    id: Option<String>,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(rename = "Address", default)]
    address: Option<String>,
    #[serde(rename = "PostCode", default)]
    post_code: Option<String>,
    #[serde(rename = "TransportMode", default)]
    transport: Option<String>,
    #[serde(rename = "Qualification", default)]
    qualification: Option<String>,
    #[serde(rename = "LanguageSpoken", default)]
    languages: Option<String>,
    #[serde(rename = "MaxPatientsPerDay", default)]
    capacity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PatientRow {
    #[serde(rename = "PatientID", default)]
    id: Option<String>,
    #[serde(rename = "PatientName", default)]
    name: Option<String>,
    #[serde(rename = "Address", default)]
    address: Option<String>,
    #[serde(rename = "PostCode", default)]
    post_code: Option<String>,
    #[serde(rename = "RequiredSupport", default)]
    required_support: Option<String>,
    #[serde(rename = "LanguagePreference", default)]
    language: Option<String>,
    #[serde(rename = "Priority", default)]
    priority: Option<String>,
}

pub fn parse_employees<R: Read>(
    reader: R,
    default_capacity: u32,
) -> Result<IngestReport<Employee>, IngestError> {
    parse_rows(reader, "employee", |row: EmployeeRow| {
        let id = non_empty(row.id)?;
        let capacity = non_empty(row.capacity)
            .and_then(|raw| parse_whole_number(&raw))
            .filter(|capacity| *capacity >= 1)
            .unwrap_or(default_capacity);

        Some(Employee {
            name: text(row.name),
            qualification: non_empty(row.qualification)
                .map(|raw| qualification_from(&raw))
                .unwrap_or_default(),
            languages: split_list(&text(row.languages)),
            transport: non_empty(row.transport)
                .map(|raw| transport_from(&raw))
                .unwrap_or_default(),
            home_location: text(row.address),
            post_code: text(row.post_code),
            daily_capacity: capacity,
            id,
        })
    })
}

pub fn parse_patients<R: Read>(reader: R) -> Result<IngestReport<Patient>, IngestError> {
    parse_rows(reader, "patient", |row: PatientRow| {
        let id = non_empty(row.id)?;
        let required_services = split_list(&text(row.required_support))
            .iter()
            .filter_map(|entry| ServiceType::match_keyword(entry))
            .collect();

        Some(Patient {
            name: text(row.name),
            required_services,
            preferred_language: non_empty(row.language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            home_location: text(row.address),
            post_code: text(row.post_code),
            priority: non_empty(row.priority)
                .and_then(|raw| raw.parse().ok())
                .unwrap_or(DEFAULT_PRIORITY),
            id,
        })
    })
}

trait Identified {
    fn identifier(&self) -> &str;
}

impl Identified for Employee {
    fn identifier(&self) -> &str {
        &self.id
    }
}

impl Identified for Patient {
    fn identifier(&self) -> &str {
        &self.id
    }
}

fn parse_rows<R, Row, T, F>(reader: R, entity: &str, convert: F) -> Result<IngestReport<T>, IngestError>
where
    R: Read,
    Row: for<'de> Deserialize<'de>,
    T: Identified,
    F: Fn(Row) -> Option<T>,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    csv_reader.headers()?;

    let mut seen = HashSet::new();
    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, row) in csv_reader.deserialize::<Row>().enumerate() {
        let line = index + 2;
        let record = match row {
            Ok(row) => convert(row),
            Err(err) => {
                warn!(entity, line, error = %err, "skipping undecodable row");
                skipped += 1;
                continue;
            }
        };

        let Some(record) = record else {
            warn!(entity, line, "skipping row without identifier");
            skipped += 1;
            continue;
        };

        if !seen.insert(record.identifier().to_string()) {
            warn!(entity, line, id = record.identifier(), "skipping duplicate identifier");
            skipped += 1;
            continue;
        }

        records.push(record);
    }

    Ok(IngestReport { records, skipped })
}

fn text(value: Option<String>) -> String {
    value.map(|raw| raw.trim().to_string()).unwrap_or_default()
}

fn non_empty(value: Option<String>) -> Option<String> {
    Some(text(value)).filter(|raw| !raw.is_empty())
}

/// Spreadsheet exports often render integers as `8.0`.
fn parse_whole_number(raw: &str) -> Option<u32> {
    raw.parse::<u32>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0 && value.fract() == 0.0)
            .map(|value| value as u32)
    })
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split([',', ';', '/'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn qualification_from(raw: &str) -> Qualification {
    let lowered = raw.to_lowercase();
    let exact = [
        ("nurse", Qualification::Nurse),
        ("senior carer", Qualification::SeniorCarer),
        ("carer", Qualification::Carer),
    ];
    if let Some((_, qualification)) = exact.iter().find(|(label, _)| lowered == *label) {
        return *qualification;
    }

    if lowered.contains("nurse") {
        Qualification::Nurse
    } else if lowered.contains("senior") {
        Qualification::SeniorCarer
    } else {
        Qualification::Carer
    }
}

fn transport_from(raw: &str) -> TransportMode {
    let lowered = raw.to_lowercase();
    if lowered.contains("public") || lowered.contains("transit") || lowered.contains("bus") {
        TransportMode::PublicTransit
    } else if lowered.contains("car") || lowered.contains("driv") {
        TransportMode::Car
    } else if lowered.contains("bicycle") || lowered.contains("bike") || lowered.contains("cycl") {
        TransportMode::Bicycle
    } else if lowered.contains("walk") {
        TransportMode::Walking
    } else if lowered == "none" {
        TransportMode::None
    } else {
        TransportMode::default()
    }
}
