#![allow(dead_code)]
use umya_spreadsheet::{
    Border, HorizontalAlignmentValues, NumberingFormat, PatternValues, Spreadsheet, Worksheet,
};

use super::REPORT_SHEET;

pub const HEADERS: [&str; 5] = ["开始时间", "结束时间", "入住旅客数", "15分上传不及时数", "完成率"];
pub const TOTALS_LABEL: &str = "合计";

#[derive(Clone, Debug)]
pub enum CellVal {
    Text(String),
    Num(f64),
    Formula(String),
    Empty,
}

impl From<&str> for CellVal {
    fn from(s: &str) -> Self {
        CellVal::Text(s.to_string())
    }
}

impl From<i32> for CellVal {
    fn from(n: i32) -> Self {
        CellVal::Num(n as f64)
    }
}

pub fn formula(text: &str) -> CellVal {
    CellVal::Formula(text.to_string())
}

fn set_cell(sheet: &mut Worksheet, col: u32, row: u32, val: &CellVal) {
    match val {
        CellVal::Text(s) => {
            sheet.get_cell_mut((col, row)).set_value_string(s.clone());
        }
        CellVal::Num(n) => {
            sheet.get_cell_mut((col, row)).set_value_number(*n);
        }
        CellVal::Formula(f) => {
            sheet.get_cell_mut((col, row)).set_formula(f.clone());
        }
        CellVal::Empty => {}
    }
}

pub fn fill_row(sheet: &mut Worksheet, row: u32, values: &[CellVal]) {
    for (idx, val) in values.iter().enumerate() {
        set_cell(sheet, idx as u32 + 1, row, val);
    }
}

pub fn report_sheet(book: &mut Spreadsheet) -> &mut Worksheet {
    book.get_sheet_by_name_mut(REPORT_SHEET).unwrap()
}

/// Header row, one row per `(start, end, guests, late)` with its ratio
/// formula, and a totals row summing the data rows.
pub fn standard_report(sheet: &mut Worksheet, rows: &[(&str, &str, i32, i32)]) {
    let header: Vec<CellVal> = HEADERS.iter().map(|h| CellVal::from(*h)).collect();
    fill_row(sheet, 1, &header);
    for col in 1..=HEADERS.len() as u32 {
        sheet.get_style_mut((col, 1)).get_font_mut().set_bold(true);
    }

    for (idx, (start, end, guests, late)) in rows.iter().enumerate() {
        let row = idx as u32 + 2;
        fill_row(
            sheet,
            row,
            &[
                (*start).into(),
                (*end).into(),
                (*guests).into(),
                (*late).into(),
                formula(&format!("C{row}/(C{row}+D{row})")),
            ],
        );
    }

    let totals = rows.len() as u32 + 2;
    let last = if rows.is_empty() { 2 } else { totals - 1 };
    fill_row(
        sheet,
        totals,
        &[
            TOTALS_LABEL.into(),
            CellVal::Empty,
            formula(&format!("SUM(C2:C{last})")),
            formula(&format!("SUM(D2:D{last})")),
            formula(&format!("C{totals}/(C{totals}+D{totals})")),
        ],
    );
}

/// Font, border, fill, alignment and number format on one cell.
pub fn decorate(sheet: &mut Worksheet, cell: (u32, u32), format_code: &str) {
    let style = sheet.get_style_mut(cell);
    style.get_font_mut().set_bold(true).set_size(12.0);
    style
        .get_borders_mut()
        .get_bottom_mut()
        .set_border_style(Border::BORDER_THIN);
    style
        .get_fill_mut()
        .get_pattern_fill_mut()
        .set_pattern_type(PatternValues::Solid)
        .get_foreground_color_mut()
        .set_argb("FFFFFF00");
    style
        .get_alignment_mut()
        .set_horizontal(HorizontalAlignmentValues::Center);
    style.get_number_format_mut().set_format_code(format_code);
}

pub fn set_width(sheet: &mut Worksheet, col: u32, width: f64) {
    sheet.get_column_dimension_by_number_mut(&col).set_width(width);
}

pub fn percent_format() -> &'static str {
    NumberingFormat::FORMAT_PERCENTAGE_00
}
