use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};

use super::types::FormatConverter;
use super::ExtractionError;

/// Word (.docx) text extractor using docx-rs.
///
/// Emits one line per paragraph. Table cells are included (course schedules
/// are usually tables), cells of a row separated by a tab.
pub struct DocxTextConverter;

impl FormatConverter for DocxTextConverter {
    fn to_text(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let docx =
            docx_rs::read_docx(bytes).map_err(|e| ExtractionError::DocxParsing(e.to_string()))?;

        let mut out = String::new();
        for child in docx.document.children {
            match child {
                DocumentChild::Paragraph(p) => push_paragraph(&mut out, &p),
                DocumentChild::Table(t) => push_table(&mut out, &t),
                _ => {}
            }
        }
        Ok(out)
    }
}

fn push_paragraph(out: &mut String, paragraph: &Paragraph) {
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for rc in &run.children {
                match rc {
                    RunChild::Text(t) => out.push_str(&t.text),
                    RunChild::Tab(_) => out.push('\t'),
                    RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
    }
    out.push('\n');
}

fn push_table(out: &mut String, table: &Table) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for (i, cell) in row.cells.iter().enumerate() {
            let TableRowChild::TableCell(cell) = cell;
            if i > 0 {
                out.push('\t');
            }
            let mut cell_text = String::new();
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(p) => push_paragraph(&mut cell_text, p),
                    TableCellContent::Table(t) => push_table(&mut cell_text, t),
                    _ => {}
                }
            }
            out.push_str(cell_text.trim_end());
        }
        out.push('\n');
    }
}
