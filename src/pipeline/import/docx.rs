//! Raw text extraction from `.docx` packages.
//!
//! Reads `word/document.xml` and flattens it to plain text: one line per
//! paragraph, table rows on a single line with cells separated by tabs, so a
//! `Pedreiro | 3` row reads like a typed `Pedreiro\t3` line. Only visible
//! run content (`w:t`, and `w:tab`/`w:br` inside a run) is kept, so deleted
//! revisions, field codes and tab-stop definitions do not leak into the
//! output.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use super::ImportError;

/// Extract the plain text of a `.docx` file.
pub fn extract_raw_text(bytes: &[u8]) -> Result<String, ImportError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ImportError::InvalidDocx(format!("não é um pacote ZIP: {e}")))?;

    let mut xml = String::new();
    {
        let mut part = archive
            .by_name("word/document.xml")
            .map_err(|_| ImportError::InvalidDocx("word/document.xml não encontrado".into()))?;
        part.read_to_string(&mut xml)
            .map_err(|e| ImportError::InvalidDocx(e.to_string()))?;
    }

    let text = document_xml_to_text(&xml)?;
    if text.trim().is_empty() {
        return Err(ImportError::NoText);
    }

    debug!(chars = text.chars().count(), "Extracted raw text from docx");
    Ok(text)
}

/// Flatten WordprocessingML body XML into text.
fn document_xml_to_text(xml: &str) -> Result<String, ImportError> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = String::with_capacity(xml.len() / 4);
    let mut in_text = false;
    let mut run_depth = 0usize;
    let mut cell_depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"r" => run_depth += 1,
                b"tc" => cell_depth += 1,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if run_depth > 0 => out.push('\t'),
                b"br" | b"cr" if run_depth > 0 => out.push('\n'),
                b"p" => end_paragraph(&mut out, cell_depth),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"p" => end_paragraph(&mut out, cell_depth),
                b"tc" => {
                    trim_trailing(&mut out, &[' ']);
                    out.push('\t');
                    cell_depth = cell_depth.saturating_sub(1);
                }
                b"tr" => {
                    trim_trailing(&mut out, &[' ', '\t']);
                    out.push('\n');
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    out.push_str(&String::from_utf8_lossy(&e).replace('\u{a0}', " "));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    if let Some(c) = resolve_entity(&String::from_utf8_lossy(&e)) {
                        out.push(c);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ImportError::InvalidDocx(format!("XML inválido: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

/// Paragraphs end a line, except inside table cells where they are joined
/// with a space so a row stays on one line.
fn end_paragraph(out: &mut String, cell_depth: usize) {
    if cell_depth > 0 {
        if !out.is_empty() && !out.ends_with([' ', '\t', '\n']) {
            out.push(' ');
        }
    } else {
        out.push('\n');
    }
}

fn trim_trailing(out: &mut String, chars: &[char]) {
    let trimmed = out.trim_end_matches(chars).len();
    out.truncate(trimmed);
}

/// Resolve a predefined or numeric XML entity reference (without `&`/`;`).
fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
