use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::WeatherCondition;
use super::image::ReportImage;

/// Equipment used on site during the day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "quantidade", default)]
    pub quantity: u32,
    #[serde(rename = "observacao", default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Equipment {
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// Headcount for one role of the contractor's staff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffEntry {
    #[serde(rename = "cargo")]
    pub role: String,
    #[serde(rename = "quantidade", default)]
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "descricao")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "descricao")]
    pub description: String,
}

/// A validated daily report, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    #[serde(rename = "nomeObra")]
    pub site_name: String,
    #[serde(rename = "empresaContratada")]
    pub contractor: String,
    #[serde(rename = "localizacaoObra")]
    pub location: String,
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "numeroFolha")]
    pub sheet_number: String,
    #[serde(rename = "condicaoTempo")]
    pub weather: WeatherCondition,
    #[serde(rename = "periodoChuva", default, skip_serializing_if = "Option::is_none")]
    pub rain_period: Option<String>,
    #[serde(rename = "equipamentos", default)]
    pub equipment: Vec<Equipment>,
    #[serde(rename = "funcionarios", default)]
    pub staff: Vec<StaffEntry>,
    #[serde(rename = "atividades", default)]
    pub activities: Vec<Activity>,
    #[serde(rename = "servicos", default)]
    pub services: Vec<Service>,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "imagens", default)]
    pub images: Vec<ReportImage>,
}

impl DailyReport {
    /// Rain period to print: only when it rained and a period was given.
    pub fn printable_rain_period(&self) -> Option<&str> {
        if !self.weather.is_rainy() {
            return None;
        }
        self.rain_period
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Date as printed on the document (DD/MM/YYYY).
    pub fn formatted_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }
}
