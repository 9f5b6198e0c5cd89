//! Editable report form.
//!
//! Holds the values as the user typed them (the date is still text, rows
//! may be blank) and turns them into a [`DailyReport`] on submit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{
    Activity, DailyReport, Equipment, ImportedReport, ReportImage, Service, StaffEntry,
    WeatherCondition,
};
use crate::pipeline::import::content_hash;

/// Date format of the form's date field (HTML date input).
pub const FORM_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Error, Debug)]
pub enum FormError {
    #[error("Linha {index} não existe em {list} ({len} linhas)")]
    RowOutOfRange {
        list: &'static str,
        index: usize,
        len: usize,
    },

    #[error("A última linha de {0} não pode ser removida")]
    LastRow(&'static str),

    #[error("A imagem {0} já foi adicionada")]
    DuplicateImage(String),

    #[error("Formulário incompleto: {}", join_messages(.0))]
    Validation(Vec<FieldError>),
}

/// One validation failure, keyed by the form field name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Field of an equipment row.
#[derive(Debug, Clone, PartialEq)]
pub enum EquipmentField {
    Name(String),
    Quantity(u32),
    Note(String),
}

/// Field of a staff row.
#[derive(Debug, Clone, PartialEq)]
pub enum StaffField {
    Role(String),
    Quantity(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportForm {
    #[serde(rename = "nomeObra")]
    pub site_name: String,
    #[serde(rename = "empresaContratada")]
    pub contractor: String,
    #[serde(rename = "localizacaoObra")]
    pub location: String,
    /// `YYYY-MM-DD`, as entered.
    #[serde(rename = "data")]
    pub date: String,
    #[serde(rename = "numeroFolha")]
    pub sheet_number: String,
    #[serde(rename = "condicaoTempo")]
    pub weather: WeatherCondition,
    #[serde(rename = "periodoChuva")]
    pub rain_period: String,
    #[serde(rename = "equipamentos")]
    pub equipment: Vec<Equipment>,
    #[serde(rename = "funcionarios")]
    pub staff: Vec<StaffEntry>,
    #[serde(rename = "atividades")]
    pub activities: Vec<Activity>,
    #[serde(rename = "servicos")]
    pub services: Vec<Service>,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "imagens")]
    pub images: Vec<ReportImage>,
}

impl Default for ReportForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportForm {
    /// Empty form: good weather and one blank row per list.
    pub fn new() -> Self {
        Self {
            site_name: String::new(),
            contractor: String::new(),
            location: String::new(),
            date: String::new(),
            sheet_number: String::new(),
            weather: WeatherCondition::Bom,
            rain_period: String::new(),
            equipment: vec![Equipment::default()],
            staff: vec![StaffEntry::default()],
            activities: vec![Activity::default()],
            services: vec![Service::default()],
            description: String::new(),
            images: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // ── Equipment ──────────────────────────────────────────────────────

    pub fn add_equipment(&mut self) {
        self.equipment.push(Equipment::default());
    }

    pub fn remove_equipment(&mut self, index: usize) -> Result<(), FormError> {
        remove_row(&mut self.equipment, "equipamentos", index)
    }

    pub fn update_equipment(&mut self, index: usize, field: EquipmentField) -> Result<(), FormError> {
        let row = row_mut(&mut self.equipment, "equipamentos", index)?;
        match field {
            EquipmentField::Name(name) => row.name = name,
            EquipmentField::Quantity(quantity) => row.quantity = quantity,
            EquipmentField::Note(note) => row.note = Some(note),
        }
        Ok(())
    }

    /// Quantity typed as free text, see [`parse_quantity_text`].
    pub fn set_equipment_quantity_text(&mut self, index: usize, text: &str) -> Result<(), FormError> {
        self.update_equipment(index, EquipmentField::Quantity(parse_quantity_text(text)))
    }

    // ── Staff ──────────────────────────────────────────────────────────

    pub fn add_staff(&mut self) {
        self.staff.push(StaffEntry::default());
    }

    pub fn remove_staff(&mut self, index: usize) -> Result<(), FormError> {
        remove_row(&mut self.staff, "funcionarios", index)
    }

    pub fn update_staff(&mut self, index: usize, field: StaffField) -> Result<(), FormError> {
        let row = row_mut(&mut self.staff, "funcionarios", index)?;
        match field {
            StaffField::Role(role) => row.role = role,
            StaffField::Quantity(quantity) => row.quantity = quantity,
        }
        Ok(())
    }

    pub fn set_staff_quantity_text(&mut self, index: usize, text: &str) -> Result<(), FormError> {
        self.update_staff(index, StaffField::Quantity(parse_quantity_text(text)))
    }

    // ── Activities and services ────────────────────────────────────────

    pub fn add_activity(&mut self) {
        self.activities.push(Activity::default());
    }

    pub fn remove_activity(&mut self, index: usize) -> Result<(), FormError> {
        remove_row(&mut self.activities, "atividades", index)
    }

    pub fn update_activity(&mut self, index: usize, description: &str) -> Result<(), FormError> {
        row_mut(&mut self.activities, "atividades", index)?.description = description.to_string();
        Ok(())
    }

    pub fn add_service(&mut self) {
        self.services.push(Service::default());
    }

    pub fn remove_service(&mut self, index: usize) -> Result<(), FormError> {
        remove_row(&mut self.services, "servicos", index)
    }

    pub fn update_service(&mut self, index: usize, description: &str) -> Result<(), FormError> {
        row_mut(&mut self.services, "servicos", index)?.description = description.to_string();
        Ok(())
    }

    // ── Images ─────────────────────────────────────────────────────────

    /// Attach an image. The same content cannot be attached twice.
    pub fn add_image(&mut self, image: ReportImage) -> Result<(), FormError> {
        let hash = content_hash(&image.bytes);
        if self.images.iter().any(|i| content_hash(&i.bytes) == hash) {
            return Err(FormError::DuplicateImage(image.name));
        }
        debug!(count = self.images.len() + 1, "Image attached to form");
        self.images.push(image);
        Ok(())
    }

    pub fn remove_image(&mut self, index: usize) -> Result<ReportImage, FormError> {
        let len = self.images.len();
        if index >= len {
            return Err(FormError::RowOutOfRange {
                list: "imagens",
                index,
                len,
            });
        }
        Ok(self.images.remove(index))
    }

    // ── Import, validation, submit ─────────────────────────────────────

    /// Pre-fill from an imported document. Present scalars overwrite the
    /// field; present, non-empty lists replace the rows.
    pub fn apply_import(&mut self, imported: &ImportedReport) {
        fn set(field: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *field = v.clone();
            }
        }

        set(&mut self.site_name, &imported.site_name);
        set(&mut self.contractor, &imported.contractor);
        set(&mut self.location, &imported.location);
        if let Some(date) = imported.date {
            self.date = date.format(FORM_DATE_FORMAT).to_string();
        }
        set(&mut self.sheet_number, &imported.sheet_number);
        if let Some(weather) = imported.weather {
            self.weather = weather;
        }
        set(&mut self.rain_period, &imported.rain_period);
        set(&mut self.description, &imported.description);

        replace_rows(&mut self.equipment, &imported.equipment);
        replace_rows(&mut self.staff, &imported.staff);
        replace_rows(&mut self.activities, &imported.activities);
        replace_rows(&mut self.services, &imported.services);

        info!(fields = ?imported.present_fields(), "Applied imported data to form");
    }

    /// Every missing or malformed required field.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        let mut require = |field: &'static str, value: &str, label: &str| {
            if value.trim().is_empty() {
                errors.push(FieldError {
                    field,
                    message: format!("{label} é obrigatório"),
                });
            }
        };

        require("nomeObra", &self.site_name, "Nome da Obra");
        require("empresaContratada", &self.contractor, "Empresa Contratada");
        require("localizacaoObra", &self.location, "Localização da Obra");
        require("data", &self.date, "Data");
        require("numeroFolha", &self.sheet_number, "Número da Folha (RDO)");
        if self.weather.is_rainy() {
            require("periodoChuva", &self.rain_period, "Período da Chuva");
        }

        if !self.date.trim().is_empty() && self.parsed_date().is_none() {
            errors.push(FieldError {
                field: "data",
                message: format!("Data inválida: {} (use AAAA-MM-DD)", self.date.trim()),
            });
        }
        errors
    }

    /// Validate and build the report. Rows without a name, role or
    /// description are left out; the rain period only survives rainy days.
    pub fn submit(&self) -> Result<DailyReport, FormError> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(FormError::Validation(errors));
        }
        let date = self.parsed_date().ok_or_else(|| {
            FormError::Validation(vec![FieldError {
                field: "data",
                message: "Data inválida".into(),
            }])
        })?;

        let rain_period = if self.weather.is_rainy() {
            Some(self.rain_period.trim().to_string()).filter(|p| !p.is_empty())
        } else {
            None
        };

        let report = DailyReport {
            site_name: self.site_name.trim().to_string(),
            contractor: self.contractor.trim().to_string(),
            location: self.location.trim().to_string(),
            date,
            sheet_number: self.sheet_number.trim().to_string(),
            weather: self.weather,
            rain_period,
            equipment: self
                .equipment
                .iter()
                .filter(|e| !e.name.trim().is_empty())
                .map(|e| Equipment {
                    name: e.name.trim().to_string(),
                    quantity: e.quantity,
                    note: e
                        .note
                        .as_deref()
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .map(str::to_string),
                })
                .collect(),
            staff: self
                .staff
                .iter()
                .filter(|s| !s.role.trim().is_empty())
                .map(|s| StaffEntry {
                    role: s.role.trim().to_string(),
                    quantity: s.quantity,
                })
                .collect(),
            activities: self
                .activities
                .iter()
                .map(|a| a.description.trim())
                .filter(|d| !d.is_empty())
                .map(|d| Activity {
                    description: d.to_string(),
                })
                .collect(),
            services: self
                .services
                .iter()
                .map(|s| s.description.trim())
                .filter(|d| !d.is_empty())
                .map(|d| Service {
                    description: d.to_string(),
                })
                .collect(),
            description: self.description.trim().to_string(),
            images: self.images.clone(),
        };

        info!(
            equipment = report.equipment.len(),
            staff = report.staff.len(),
            activities = report.activities.len(),
            services = report.services.len(),
            images = report.images.len(),
            "Form submitted"
        );
        Ok(report)
    }

    fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), FORM_DATE_FORMAT).ok()
    }
}

/// Leading-integer parse of a typed quantity: leading whitespace and an
/// optional sign, then digits; trailing text is ignored. Anything without
/// digits, and negative numbers, give 0.
pub fn parse_quantity_text(text: &str) -> u32 {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if negative || digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u32::MAX)
}

fn row_mut<'a, T>(rows: &'a mut [T], list: &'static str, index: usize) -> Result<&'a mut T, FormError> {
    let len = rows.len();
    rows.get_mut(index)
        .ok_or(FormError::RowOutOfRange { list, index, len })
}

fn remove_row<T>(rows: &mut Vec<T>, list: &'static str, index: usize) -> Result<(), FormError> {
    let len = rows.len();
    if index >= len {
        return Err(FormError::RowOutOfRange { list, index, len });
    }
    if len == 1 {
        return Err(FormError::LastRow(list));
    }
    rows.remove(index);
    Ok(())
}

fn replace_rows<T: Clone>(rows: &mut Vec<T>, imported: &Option<Vec<T>>) {
    if let Some(items) = imported {
        if !items.is_empty() {
            *rows = items.clone();
        }
    }
}
