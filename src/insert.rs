use crate::errors::ReportError;
use crate::formula::{CompletionRate, ReportFormula, mentions_sum, rewrite_ratio, rewrite_sum};
use crate::model::{HeaderMap, ReportColumn, RowValues, UpdateWarning};
use crate::styles::{ColumnWidth, copy_cell_style};
use umya_spreadsheet::Worksheet;
use umya_spreadsheet::helper::coordinate::{coordinate_from_index, string_from_column_index};

pub const TEXT_FORMAT: &str = "@";
pub const INTEGER_FORMAT: &str = "0";
pub const PERCENT_FORMAT: &str = "0.00%";

/// Where the new row landed and what was recovered along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertedRow {
    pub new_row: u32,
    pub totals_row: u32,
    pub warnings: Vec<UpdateWarning>,
}

/// Insert `values` as a data row directly above the totals row (the last row
/// of `sheet`), carrying over the previous data row's styles and keeping the
/// completion-rate and totals formulas pointed at the right rows.
///
/// On `Err` the sheet may be partially modified and must not be saved.
pub fn insert_and_populate(
    sheet: &mut Worksheet,
    headers: &HeaderMap,
    values: &RowValues,
    default_width: f64,
) -> Result<InsertedRow, ReportError> {
    let totals_row = sheet.get_highest_row();
    if totals_row < 2 {
        return Err(ReportError::TooFewRows {
            sheet: sheet.get_name().to_string(),
            rows: totals_row,
        });
    }
    let last_data_row = totals_row - 1;
    let new_row = totals_row;
    let new_totals_row = totals_row + 1;
    let width = sheet.get_highest_column();
    let rate_columns = match headers.get(ReportColumn::CompletionRate) {
        Some(rate_col) => Some(RateColumns {
            rate: rate_col,
            guest: headers.require(sheet.get_name(), ReportColumn::GuestCount)?,
            late: headers.require(sheet.get_name(), ReportColumn::LateUpload)?,
        }),
        None => None,
    };
    // Row 1 is the header; with no data rows there is nothing to model on.
    let source_row = (last_data_row >= 2).then_some(last_data_row);

    let totals_formulas = capture_formulas(sheet, totals_row, width)?;
    let completion_rate = match (rate_columns, source_row) {
        (Some(columns), Some(row)) => CompletionRate::classify(
            sheet
                .get_cell((columns.rate, row))
                .filter(|cell| cell.is_formula())
                .map(|cell| cell.get_formula()),
        )?,
        _ => CompletionRate::NoFormula,
    };

    let mut warnings = Vec::new();

    sheet.insert_new_row(&new_row, &1);
    tracing::debug!(
        sheet = sheet.get_name(),
        row = new_row,
        "inserted data row above totals"
    );

    if let Some(source_row) = source_row {
        for col in 1..=width {
            let Some(copy) = copy_cell_style(sheet, (col, source_row), (col, new_row), default_width)
            else {
                continue;
            };
            tracing::debug!(
                cell = %coordinate_from_index(&col, &new_row),
                style = %copy.style_id,
                "copied style from previous data row"
            );
            if let ColumnWidth::Defaulted(width) = copy.width {
                let column = string_from_column_index(&col);
                tracing::warn!(
                    column = %column,
                    width,
                    "column width undefined, using default"
                );
                warnings.push(UpdateWarning::ColumnWidthDefaulted { column, width });
            }
        }
    }

    write_row_values(sheet, headers, values, new_row);

    if let Some(columns) = rate_columns {
        let address = coordinate_from_index(&columns.rate, &new_row);
        let (ratio, synthesized) = completion_rate.for_new_row(
            columns.guest,
            columns.late,
            last_data_row,
            new_row,
            &address,
        )?;
        set_formula(sheet, columns.rate, new_row, &ReportFormula::Ratio(ratio));
        if synthesized {
            set_number_format(sheet, columns.rate, new_row, PERCENT_FORMAT);
        }
        tracing::debug!(cell = %address, formula = %ratio, synthesized, "completion rate set");
    }

    repair_totals(
        sheet,
        rate_columns,
        totals_formulas,
        source_row,
        new_totals_row,
        &mut warnings,
    );

    Ok(InsertedRow {
        new_row,
        totals_row: new_totals_row,
        warnings,
    })
}

fn capture_formulas(
    sheet: &Worksheet,
    row: u32,
    width: u32,
) -> Result<Vec<(u32, ReportFormula)>, ReportError> {
    let mut formulas = Vec::new();
    for col in 1..=width {
        let Some(cell) = sheet.get_cell((col, row)) else {
            continue;
        };
        if !cell.is_formula() || cell.get_formula().trim().is_empty() {
            continue;
        }
        let formula = match ReportFormula::parse(cell.get_formula()) {
            Ok(formula) => formula,
            // Unreadable totals formulas are reported and left as they are.
            Err(ReportError::FormulaTokenize { formula, message }) => {
                tracing::debug!(
                    cell = %coordinate_from_index(&col, &row),
                    formula = %formula,
                    message = %message,
                    "totals formula did not tokenize"
                );
                ReportFormula::Other(formula)
            }
            Err(other) => return Err(other),
        };
        formulas.push((col, formula));
    }
    Ok(formulas)
}

fn write_row_values(sheet: &mut Worksheet, headers: &HeaderMap, values: &RowValues, row: u32) {
    let texts = [
        (ReportColumn::StartTime, &values.start_time),
        (ReportColumn::EndTime, &values.end_time),
    ];
    for (column, text) in texts {
        if let Some(col) = headers.get(column) {
            // Stored as text so viewers never turn it into a date.
            sheet.get_cell_mut((col, row)).set_value_string(text.clone());
            set_number_format(sheet, col, row, TEXT_FORMAT);
        }
    }

    let counts = [
        (ReportColumn::GuestCount, values.guest_count),
        (ReportColumn::LateUpload, values.late_upload_count),
    ];
    for (column, count) in counts {
        if let Some(col) = headers.get(column) {
            sheet.get_cell_mut((col, row)).set_value_number(count as f64);
            set_number_format(sheet, col, row, INTEGER_FORMAT);
        }
    }
}

fn repair_totals(
    sheet: &mut Worksheet,
    rate_columns: Option<RateColumns>,
    formulas: Vec<(u32, ReportFormula)>,
    last_data_row: Option<u32>,
    totals_row: u32,
    warnings: &mut Vec<UpdateWarning>,
) {
    for (col, formula) in formulas {
        let address = coordinate_from_index(&col, &totals_row);
        let rate = rate_columns.filter(|columns| columns.rate == col);
        match (formula, rate) {
            (ReportFormula::Sum(sum), _) => {
                if let Some(expected) = last_data_row
                    && sum.end.row != expected
                {
                    tracing::warn!(
                        cell = %address,
                        previous_end_row = sum.end.row,
                        expected_end_row = expected,
                        "repairing stale SUM range"
                    );
                    warnings.push(UpdateWarning::StaleSumRange {
                        address: address.clone(),
                        previous_end_row: sum.end.row,
                        expected_end_row: expected,
                    });
                }
                let rewritten = rewrite_sum(&sum, totals_row - 1, col);
                tracing::debug!(cell = %address, formula = %rewritten, "totals SUM rewritten");
                set_formula(sheet, col, totals_row, &ReportFormula::Sum(rewritten));
            }
            (_, Some(columns)) => {
                let ratio = rewrite_ratio(columns.guest, columns.late, totals_row);
                tracing::debug!(cell = %address, formula = %ratio, "totals completion rate rewritten");
                set_formula(sheet, col, totals_row, &ReportFormula::Ratio(ratio));
                set_number_format(sheet, col, totals_row, PERCENT_FORMAT);
            }
            (ReportFormula::Ratio(_), None) => {}
            (ReportFormula::Other(text), None) => {
                tracing::warn!(
                    cell = %address,
                    formula = %text,
                    sum_like = mentions_sum(&text),
                    "totals formula has an unexpected shape, left unchanged"
                );
                warnings.push(UpdateWarning::FormulaLeftUnchanged {
                    address,
                    formula: text,
                });
            }
        }
    }
}

/// Completion-rate column with the two count columns its ratio reads.
/// Positions come from the header row, never from column arithmetic.
#[derive(Debug, Clone, Copy)]
struct RateColumns {
    rate: u32,
    guest: u32,
    late: u32,
}

fn set_formula(sheet: &mut Worksheet, col: u32, row: u32, formula: &ReportFormula) {
    let cell = sheet.get_cell_mut((col, row));
    cell.set_formula(formula.to_cell_formula());
    cell.set_formula_result_default("");
}

fn set_number_format(sheet: &mut Worksheet, col: u32, row: u32, code: &str) {
    sheet
        .get_style_mut((col, row))
        .get_number_format_mut()
        .set_format_code(code);
}
