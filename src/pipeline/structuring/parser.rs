use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::StructuringError;
use crate::models::{Activity, Equipment, ImportedReport, Service, StaffEntry, WeatherCondition};

/// Parse the model's reply into report fields.
///
/// Tolerates Markdown fences and chatter around the JSON object. Values are
/// coerced leniently: a malformed field or list item is dropped, never
/// fatal.
pub fn parse_extraction_response(reply: &str) -> Result<ImportedReport, StructuringError> {
    if reply.trim().is_empty() {
        return Err(StructuringError::EmptyResponse);
    }

    let json_str = extract_json_object(reply);
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| StructuringError::JsonParsing(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(StructuringError::JsonParsing(
            "expected a JSON object at the top level".into(),
        ));
    };

    Ok(ImportedReport {
        site_name: string_field(&obj, "nomeObra"),
        contractor: string_field(&obj, "empresaContratada"),
        location: string_field(&obj, "localizacaoObra"),
        date: string_field(&obj, "data").and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        sheet_number: string_field(&obj, "numeroFolha"),
        weather: string_field(&obj, "condicaoTempo").and_then(|w| w.parse::<WeatherCondition>().ok()),
        rain_period: string_field(&obj, "periodoChuva"),
        equipment: array_field(&obj, "equipamentos", |item| {
            Some(Equipment {
                name: string_field(item, "nome")?,
                quantity: quantity_field(item)?,
                note: string_field(item, "observacao"),
            })
        }),
        staff: array_field(&obj, "funcionarios", |item| {
            Some(StaffEntry {
                role: string_field(item, "cargo")?,
                quantity: quantity_field(item)?,
            })
        }),
        activities: array_field(&obj, "atividades", |item| {
            Some(Activity {
                description: string_field(item, "descricao")?,
            })
        }),
        services: array_field(&obj, "servicos", |item| {
            Some(Service {
                description: string_field(item, "descricao")?,
            })
        }),
        description: string_field(&obj, "descricao"),
    })
}

/// Strip code fences and keep the span from the first `{` to the last `}`.
fn extract_json_object(reply: &str) -> &str {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let unfenced = unfenced.strip_suffix("```").unwrap_or(unfenced).trim();

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if end > start => &unfenced[start..=end],
        _ => unfenced,
    }
}

/// Trimmed text of a scalar field. Numbers and booleans are stringified;
/// blank strings, null and structured values count as absent.
fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match obj.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// `quantidade` must be present; its value is coerced the way a lenient
/// numeric cast would: numeric strings parse, fractions truncate, anything
/// unusable or negative becomes 0.
fn quantity_field(obj: &Map<String, Value>) -> Option<u32> {
    let value = obj.get("quantidade")?;
    let number = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    Some(coerce_quantity(number))
}

fn coerce_quantity(number: f64) -> u32 {
    if !number.is_finite() || number <= 0.0 {
        0
    } else if number >= u32::MAX as f64 {
        u32::MAX
    } else {
        number.trunc() as u32
    }
}

/// Parse an array leniently: skip items that are not objects or that the
/// mapper rejects. A non-array value leaves the field absent.
fn array_field<T>(
    obj: &Map<String, Value>,
    key: &str,
    map: impl Fn(&Map<String, Value>) -> Option<T>,
) -> Option<Vec<T>> {
    let items = obj.get(key)?.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(map)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> String {
        r#"```json
{
  "nomeObra": "  Edifício Residencial XYZ ",
  "empresaContratada": "Construtora ABC",
  "localizacaoObra": "Rua das Flores, 123",
  "data": "2024-12-05",
  "numeroFolha": 14,
  "condicaoTempo": "Chuvoso",
  "periodoChuva": "08:00 às 12:00",
  "equipamentos": [
    {"nome": "Betoneira", "quantidade": 2},
    {"nome": "Andaime", "quantidade": "10", "observacao": "metálico"},
    {"nome": "Grua"},
    {"quantidade": 3}
  ],
  "funcionarios": [
    {"cargo": "Pedreiro", "quantidade": 4.7},
    {"cargo": "Servente", "quantidade": null}
  ],
  "atividades": [{"descricao": "Concretagem"}, {"descricao": "   "}, "solto"],
  "servicos": [{"descricao": "Alvenaria"}],
  "descricao": "Dia produtivo."
}
```"#
            .to_string()
    }

    #[test]
    fn parse_full_response() {
        let report = parse_extraction_response(&sample_response()).unwrap();
        assert_eq!(report.site_name.as_deref(), Some("Edifício Residencial XYZ"));
        assert_eq!(report.date, NaiveDate::from_ymd_opt(2024, 12, 5));
        assert_eq!(report.sheet_number.as_deref(), Some("14"));
        assert_eq!(report.weather, Some(WeatherCondition::Chuvoso));
        assert_eq!(report.rain_period.as_deref(), Some("08:00 às 12:00"));
        assert_eq!(report.description.as_deref(), Some("Dia produtivo."));
    }

    #[test]
    fn equipment_requires_name_and_quantity_key() {
        let report = parse_extraction_response(&sample_response()).unwrap();
        let equipment = report.equipment.unwrap();
        assert_eq!(equipment.len(), 2);
        assert_eq!(equipment[1].quantity, 10);
        assert_eq!(equipment[1].note.as_deref(), Some("metálico"));
        assert_eq!(equipment[0].note, None);
    }

    #[test]
    fn staff_quantities_are_coerced() {
        let report = parse_extraction_response(&sample_response()).unwrap();
        let staff = report.staff.unwrap();
        assert_eq!(staff[0].quantity, 4);
        assert_eq!(staff[1].quantity, 0);
    }

    #[test]
    fn blank_and_non_object_list_items_dropped() {
        let report = parse_extraction_response(&sample_response()).unwrap();
        assert_eq!(report.activities.unwrap().len(), 1);
        assert_eq!(report.services.unwrap()[0].description, "Alvenaria");
    }

    #[test]
    fn json_surrounded_by_chatter() {
        let reply = "Aqui está o resultado:\n{\"nomeObra\": \"Ponte\"}\nEspero ter ajudado.";
        let report = parse_extraction_response(reply).unwrap();
        assert_eq!(report.site_name.as_deref(), Some("Ponte"));
    }

    #[test]
    fn invalid_weather_and_date_dropped() {
        let reply = r#"{"condicaoTempo": "ensolarado", "data": "05/12/2024"}"#;
        let report = parse_extraction_response(reply).unwrap();
        assert!(report.weather.is_none());
        assert!(report.date.is_none());
        assert!(report.is_empty());
    }

    #[test]
    fn empty_reply_is_error() {
        assert!(matches!(
            parse_extraction_response("  \n"),
            Err(StructuringError::EmptyResponse)
        ));
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(matches!(
            parse_extraction_response("{\"nomeObra\": }"),
            Err(StructuringError::JsonParsing(_))
        ));
        assert!(matches!(
            parse_extraction_response("não encontrei dados"),
            Err(StructuringError::JsonParsing(_))
        ));
    }

    #[test]
    fn non_array_list_is_absent() {
        let report = parse_extraction_response(r#"{"equipamentos": "Betoneira"}"#).unwrap();
        assert!(report.equipment.is_none());
    }

    #[test]
    fn quantity_coercion_edges() {
        assert_eq!(coerce_quantity(-3.0), 0);
        assert_eq!(coerce_quantity(f64::NAN), 0);
        assert_eq!(coerce_quantity(2.9), 2);
        assert_eq!(coerce_quantity(1e12), u32::MAX);
    }
}
