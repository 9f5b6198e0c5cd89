/// Characters of document text embedded in the prompt.
pub const MAX_PROMPT_TEXT_CHARS: usize = 30_000;

/// Appended when the document text was cut at `MAX_PROMPT_TEXT_CHARS`.
pub const TRUNCATION_MARKER: &str = "\n\n[... texto truncado ...]";

/// Build the extraction prompt for a daily-report document.
///
/// The reply is expected to be a single JSON object using the form's keys,
/// with absent information omitted rather than set to null.
pub fn build_extraction_prompt(document_text: &str) -> String {
    let (text, truncated) = truncate_chars(document_text, MAX_PROMPT_TEXT_CHARS);
    let marker = if truncated { TRUNCATION_MARKER } else { "" };

    format!(
        r#"Você é um assistente especializado em extrair dados de relatórios de diário de obra.

Analise o texto extraído de um documento Word e extraia APENAS as informações estruturadas em formato JSON válido.

TEXTO DO DOCUMENTO:
{text}{marker}

INSTRUÇÕES IMPORTANTES:
1. Identifique e extraia as seguintes informações (quando disponíveis):
   - nomeObra: Nome da obra/projeto
   - empresaContratada: Nome da empresa contratada/responsável
   - localizacaoObra: Localização/endereço completo da obra
   - data: Data do diário no formato YYYY-MM-DD (ex: 2024-12-15)
   - numeroFolha: Número da folha/RDO/registro
   - condicaoTempo: Apenas "bom", "nublado" ou "chuvoso" (em minúsculas)
   - periodoChuva: Período da chuva (ex: "08:00 às 12:00") - apenas se condicaoTempo for "chuvoso"
   - equipamentos: Array de objetos {{nome: string, quantidade: number, observacao?: string}}
   - funcionarios: Array de objetos {{cargo: string, quantidade: number}}
   - atividades: Array de objetos {{descricao: string}} - cada atividade em um objeto separado
   - servicos: Array de objetos {{descricao: string}} - cada serviço em um objeto separado
   - descricao: Texto livre com descrição geral/observações

2. Para equipamentos e funcionários, identifique quantidades mencionadas (números).
3. Para atividades e serviços, extraia cada item da lista como um objeto separado no array.
4. Se uma informação não estiver presente, NÃO inclua o campo no JSON (não use null ou undefined).
5. Retorne APENAS um JSON válido, sem markdown, sem explicações, sem texto adicional antes ou depois.

IMPORTANTE: Retorne somente o JSON, sem markdown code blocks, sem explicações.

EXEMPLO DE RESPOSTA:
{{"nomeObra":"Edifício Residencial XYZ","empresaContratada":"Construtora ABC","equipamentos":[{{"nome":"Betoneira","quantidade":2}}]}}"#
    )
}

/// Cut `text` to at most `max_chars` characters (not bytes).
fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_document_text_and_schema() {
        let prompt = build_extraction_prompt("Nome da Obra: Edifício XYZ");
        assert!(prompt.contains("TEXTO DO DOCUMENTO:\nNome da Obra: Edifício XYZ\n"));
        for key in [
            "nomeObra",
            "empresaContratada",
            "localizacaoObra",
            "numeroFolha",
            "condicaoTempo",
            "periodoChuva",
            "equipamentos",
            "funcionarios",
            "atividades",
            "servicos",
            "descricao",
        ] {
            assert!(prompt.contains(key), "missing {key}");
        }
        assert!(prompt.contains("YYYY-MM-DD"));
        assert!(!prompt.contains("texto truncado"));
    }

    #[test]
    fn example_json_braces_are_literal() {
        let prompt = build_extraction_prompt("x");
        assert!(prompt.ends_with(r#"[{"nome":"Betoneira","quantidade":2}]}"#));
    }

    #[test]
    fn long_text_is_truncated_with_marker() {
        let text = "€".repeat(MAX_PROMPT_TEXT_CHARS + 10);
        let prompt = build_extraction_prompt(&text);
        assert!(prompt.contains(TRUNCATION_MARKER));
        let embedded = prompt.matches('€').count();
        assert_eq!(embedded, MAX_PROMPT_TEXT_CHARS);
    }

    #[test]
    fn text_at_limit_is_not_truncated() {
        let text = "a".repeat(MAX_PROMPT_TEXT_CHARS);
        assert!(!build_extraction_prompt(&text).contains("texto truncado"));
    }
}
