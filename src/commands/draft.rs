//! `draft`: save, list, show, delete and render stored forms.

use std::path::Path;

use uuid::Uuid;

use super::render::render_form;
use super::{read_form, write_json, DraftAction};
use crate::drafts::{Draft, DraftStore, DraftSummary};

pub fn save_draft(store: &DraftStore, form_path: &Path, id: Option<Uuid>) -> Result<Draft, String> {
    let form = read_form(form_path)?;
    store
        .save(&form, id)
        .map_err(|e| format!("Erro ao salvar rascunho: {e}"))
}

pub fn list_drafts(store: &DraftStore) -> Result<Vec<DraftSummary>, String> {
    store
        .list()
        .map_err(|e| format!("Erro ao listar rascunhos: {e}"))
}

pub fn load_draft(store: &DraftStore, id: &Uuid) -> Result<Draft, String> {
    store.load(id).map_err(|e| e.to_string())
}

pub fn delete_draft(store: &DraftStore, id: &Uuid) -> Result<(), String> {
    store.delete(id).map_err(|e| e.to_string())
}

pub fn draft_command(store: &DraftStore, action: DraftAction) -> Result<(), String> {
    match action {
        DraftAction::Save { form, id } => {
            let draft = save_draft(store, &form, id)?;
            println!("{}", draft.id);
        }
        DraftAction::List => {
            let drafts = list_drafts(store)?;
            if drafts.is_empty() {
                println!("Nenhum rascunho salvo.");
            }
            for d in drafts {
                println!(
                    "{}  {}  folha {}  {}",
                    d.id,
                    d.saved_at.format("%d/%m/%Y %H:%M"),
                    if d.sheet_number.is_empty() { "-" } else { d.sheet_number.as_str() },
                    d.site_name
                );
            }
        }
        DraftAction::Show { id } => {
            let draft = load_draft(store, &id)?;
            write_json(&draft.form, None)?;
        }
        DraftAction::Delete { id } => delete_draft(store, &id)?,
        DraftAction::Render { id, options } => {
            let draft = load_draft(store, &id)?;
            let path = render_form(draft.form, &options)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::RenderArgs;
    use crate::form::ReportForm;

    fn setup() -> (tempfile::TempDir, DraftStore, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let store = DraftStore::new(dir.path().join("drafts"));
        let mut form = ReportForm::new();
        form.site_name = "Ponte do Rio Azul".into();
        form.contractor = "Construtora ABC".into();
        form.location = "BR-010, km 12".into();
        form.date = "2025-03-10".into();
        form.sheet_number = "014".into();
        let form_path = dir.path().join("form.json");
        std::fs::write(&form_path, serde_json::to_vec(&form).unwrap()).unwrap();
        (dir, store, form_path)
    }

    #[test]
    fn save_list_delete() {
        let (_dir, store, form_path) = setup();
        let draft = save_draft(&store, &form_path, None).unwrap();

        let list = list_drafts(&store).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].site_name, "Ponte do Rio Azul");
        assert_eq!(list[0].sheet_number, "014");

        delete_draft(&store, &draft.id).unwrap();
        assert!(list_drafts(&store).unwrap().is_empty());
        assert!(load_draft(&store, &draft.id).unwrap_err().contains("não encontrado"));
    }

    #[test]
    fn render_from_draft() {
        let (dir, store, form_path) = setup();
        let draft = save_draft(&store, &form_path, None).unwrap();
        let out = dir.path().join("draft.pdf");
        draft_command(
            &store,
            DraftAction::Render {
                id: draft.id,
                options: RenderArgs {
                    output: Some(out.clone()),
                    no_stamp: true,
                    ..Default::default()
                },
            },
        )
        .unwrap();
        assert!(std::fs::read(out).unwrap().starts_with(b"%PDF"));
    }
}
