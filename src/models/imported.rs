use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::WeatherCondition;
use super::report::{Activity, Equipment, Service, StaffEntry};

/// Fields recovered from an uploaded Word document.
///
/// Produced by both extraction engines. A field the source did not mention
/// stays `None`; callers decide how to merge it into a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedReport {
    #[serde(rename = "nomeObra", default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(rename = "empresaContratada", default, skip_serializing_if = "Option::is_none")]
    pub contractor: Option<String>,
    #[serde(rename = "localizacaoObra", default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "numeroFolha", default, skip_serializing_if = "Option::is_none")]
    pub sheet_number: Option<String>,
    #[serde(rename = "condicaoTempo", default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<WeatherCondition>,
    #[serde(rename = "periodoChuva", default, skip_serializing_if = "Option::is_none")]
    pub rain_period: Option<String>,
    #[serde(rename = "equipamentos", default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<Equipment>>,
    #[serde(rename = "funcionarios", default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<Vec<StaffEntry>>,
    #[serde(rename = "atividades", default, skip_serializing_if = "Option::is_none")]
    pub activities: Option<Vec<Activity>>,
    #[serde(rename = "servicos", default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    #[serde(rename = "descricao", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ImportedReport {
    /// Names (form keys) of the fields that were found, for logging.
    pub fn present_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut note = |present: bool, key: &'static str| {
            if present {
                fields.push(key);
            }
        };
        note(self.site_name.is_some(), "nomeObra");
        note(self.contractor.is_some(), "empresaContratada");
        note(self.location.is_some(), "localizacaoObra");
        note(self.date.is_some(), "data");
        note(self.sheet_number.is_some(), "numeroFolha");
        note(self.weather.is_some(), "condicaoTempo");
        note(self.rain_period.is_some(), "periodoChuva");
        note(self.equipment.is_some(), "equipamentos");
        note(self.staff.is_some(), "funcionarios");
        note(self.activities.is_some(), "atividades");
        note(self.services.is_some(), "servicos");
        note(self.description.is_some(), "descricao");
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.present_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_not_serialized() {
        let imported = ImportedReport {
            site_name: Some("Obra X".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&imported).unwrap();
        assert_eq!(json, r#"{"nomeObra":"Obra X"}"#);
    }

    #[test]
    fn present_fields_lists_form_keys() {
        let imported = ImportedReport {
            date: NaiveDate::from_ymd_opt(2024, 1, 2),
            staff: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(imported.present_fields(), vec!["data", "funcionarios"]);
        assert!(!imported.is_empty());
        assert!(ImportedReport::default().is_empty());
    }
}
