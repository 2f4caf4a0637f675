use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::{Cell, ReportError, ReportTable};

fn xlsx_err(e: XlsxError) -> ReportError {
    ReportError::Xlsx(e.to_string())
}

/// Sheet names are limited to 31 characters and a restricted alphabet.
fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Report".into()
    } else {
        cleaned
    }
}

pub(super) fn render(table: &ReportTable) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name(&table.title)).map_err(xlsx_err)?;

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &header).map_err(xlsx_err)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let row_num = r as u32 + 1;
        for (c, cell) in row.iter().enumerate() {
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(row_num, c as u16, s).map_err(xlsx_err)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row_num, c as u16, *n).map_err(xlsx_err)?;
                }
            }
        }
    }

    workbook.save_to_buffer().map_err(xlsx_err)
}
