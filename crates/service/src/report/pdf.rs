use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::{ReportError, ReportTable};

const MARGIN: f32 = 15.0;
const LINE: f32 = 6.0;
const TITLE_SIZE: f32 = 16.0;
const TEXT_SIZE: f32 = 9.0;

/// A4 pages; a list is laid out landscape as a grid, a single record portrait
/// as label/value pairs.
pub(super) fn render(table: &ReportTable) -> Result<Vec<u8>, ReportError> {
    let (width, height) = if table.is_single() { (210.0, 297.0) } else { (297.0, 210.0) };
    let (doc, page, layer) = PdfDocument::new(&table.title, Mm(width), Mm(height), "Layer 1");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| ReportError::Pdf(e.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(e.to_string()))?;

    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        width,
        height,
        y: height - MARGIN,
    };
    writer.layer.use_text(table.title.as_str(), TITLE_SIZE, Mm(MARGIN), Mm(writer.y), &bold);
    writer.y -= LINE * 2.0;

    if table.is_single() {
        for (label, cell) in table.columns.iter().zip(&table.rows[0]) {
            writer.ensure_room();
            writer.layer.use_text(label.as_str(), TEXT_SIZE, Mm(MARGIN), Mm(writer.y), &bold);
            writer.layer.use_text(cell.to_string(), TEXT_SIZE, Mm(MARGIN + 55.0), Mm(writer.y), &regular);
            writer.y -= LINE;
        }
    } else {
        let cols = table.columns.len().max(1);
        let col_width = (width - 2.0 * MARGIN) / cols as f32;
        let fit = |s: &str| clip(s, (col_width / 1.9) as usize);
        writer.row(table.columns.iter().map(|c| fit(c)), col_width, &bold);
        for row in &table.rows {
            writer.ensure_room();
            writer.row(row.iter().map(|c| fit(&c.to_string())), col_width, &regular);
        }
    }

    doc.save_to_bytes().map_err(|e| ReportError::Pdf(e.to_string()))
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    width: f32,
    height: f32,
    y: f32,
}

impl PageWriter<'_> {
    fn ensure_room(&mut self) {
        if self.y < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(self.width), Mm(self.height), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = self.height - MARGIN;
        }
    }

    fn row(&mut self, cells: impl Iterator<Item = String>, col_width: f32, font: &IndirectFontRef) {
        for (i, text) in cells.enumerate() {
            let x = MARGIN + col_width * i as f32;
            self.layer.use_text(text, TEXT_SIZE, Mm(x), Mm(self.y), font);
        }
        self.y -= LINE;
    }
}

fn clip(s: &str, max: usize) -> String {
    let max = max.max(4);
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('~');
    out
}

#[cfg(test)]
mod tests {
    use super::clip;

    #[test]
    fn clip_keeps_short_text() {
        assert_eq!(clip("abc", 10), "abc");
        assert_eq!(clip("abcdefghij", 5), "abcd~");
    }
}
