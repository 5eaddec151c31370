//! HTML page for a CRQ batch.
//!
//! The page opens with a processing summary, followed by one card per
//! extracted change request and one alert per file that failed. Every piece
//! of spreadsheet text is escaped before it reaches the markup.

use std::path::Path;

use report_core::error::Result;
use report_runtime::batch::{CrqBatch, CrqCard, FileFailure};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;margin:2rem;background:#f5f6f8;color:#212529}\
.card{background:#fff;border:1px solid #dee2e6;border-radius:6px;margin-bottom:1rem}\
.card-header{padding:.6rem 1rem;border-bottom:1px solid #dee2e6;background:#f8f9fa}\
.card-title{margin:0;font-size:1.1rem}\
.card-body{padding:.6rem 1rem}\
.alert{padding:.75rem 1rem;border-radius:6px;margin-bottom:1rem}\
.alert-info{background:#cff4fc;border:1px solid #b6effb}\
.alert-danger{background:#f8d7da;border:1px solid #f5c2c7}";

/// Escape the five characters that are significant in HTML text and
/// attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn field(label: &str, value: &str) -> String {
    format!(
        "<p><strong>{}:</strong> {}</p>\n",
        label,
        escape_html(value)
    )
}

/// One card titled `CRQ: <file stem>`.
pub fn render_card(card: &CrqCard) -> String {
    let r = &card.record;
    let mut html = String::new();
    html.push_str("<div class=\"card\">\n<div class=\"card-header\">\n");
    html.push_str(&format!(
        "<h5 class=\"card-title\">CRQ: {}</h5>\n",
        escape_html(&card.file_stem)
    ));
    html.push_str("</div>\n<div class=\"card-body\">\n");
    html.push_str(&field("Hora de Início", &r.start_time));
    html.push_str(&field("Data de Início", &r.start_date));
    html.push_str(&field("Hora de Término", &r.end_time));
    html.push_str(&field("Data de Término", &r.end_date));
    html.push_str(&field("Descrição da atividade", &r.scope_description));
    html.push_str(&field("Área Afetada", &r.affected_area));
    html.push_str(&field("Impactos", &r.impact));
    html.push_str(&field("Responsável", &r.responsible_party));
    html.push_str("</div>\n</div>\n");
    html
}

/// Alert for a file that could not be processed.
pub fn render_failure(failure: &FileFailure) -> String {
    format!(
        "<div class=\"alert alert-danger\" role=\"alert\">Erro ao processar {}: {}</div>\n",
        escape_html(&failure.file_name),
        escape_html(&failure.message)
    )
}

/// Success and error counts of the batch.
pub fn render_summary(batch: &CrqBatch) -> String {
    format!(
        "<div class=\"alert alert-info\">\n<h4>Resumo do Processamento</h4>\n\
         <p>Arquivos processados com sucesso: {}</p>\n\
         <p>Arquivos com erro: {}</p>\n</div>\n",
        batch.success_count(),
        batch.error_count()
    )
}

/// A complete standalone page.
pub fn render_page(batch: &CrqBatch) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>Relatório de CRQs</title>\n");
    html.push_str(&format!("<style>{STYLE}</style>\n"));
    html.push_str("</head>\n<body>\n<div id=\"results\">\n");
    html.push_str(&render_summary(batch));
    for card in &batch.cards {
        html.push_str(&render_card(card));
    }
    for failure in &batch.failures {
        html.push_str(&render_failure(failure));
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// Render the page and write it to `path`, creating parent directories.
pub fn write_report(path: &Path, batch: &CrqBatch) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_page(batch))?;
    tracing::info!(
        path = %path.display(),
        cards = batch.success_count(),
        failures = batch.error_count(),
        "CRQ report written"
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
