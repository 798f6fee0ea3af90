use crate::errors::ReportError;
use formualizer_parse::TokenSubType;
use formualizer_parse::tokenizer::Tokenizer;
use std::fmt;
use umya_spreadsheet::helper::coordinate::{coordinate_from_index_with_lock, index_from_coordinate};

/// One end of an A1 range, keeping any `$` locks it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBound {
    pub col: u32,
    pub row: u32,
    pub col_abs: bool,
    pub row_abs: bool,
}

impl RangeBound {
    pub fn relative(col: u32, row: u32) -> Self {
        Self {
            col,
            row,
            col_abs: false,
            row_abs: false,
        }
    }

    /// Parses a single cell reference such as `C2` or `$C$2`. Whole-row,
    /// whole-column and sheet-qualified references are not bounds.
    pub fn parse(segment: &str) -> Option<Self> {
        if segment.is_empty() || segment.contains('!') {
            return None;
        }
        match index_from_coordinate(segment) {
            (Some(col), Some(row), col_lock, row_lock) if col > 0 && row > 0 => Some(Self {
                col,
                row,
                col_abs: col_lock.unwrap_or(false),
                row_abs: row_lock.unwrap_or(false),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&coordinate_from_index_with_lock(
            &self.col,
            &self.row,
            &self.col_abs,
            &self.row_abs,
        ))
    }
}

/// `=SUM(start:end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SumFormula {
    pub start: RangeBound,
    pub end: RangeBound,
}

impl fmt::Display for SumFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "=SUM({}:{})", self.start, self.end)
    }
}

/// `=G{row}/(G{row}+L{row})`: guest count over guest count plus late uploads.
/// Both operands sit on the same row; `$` locks are kept per operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioFormula {
    pub guest: RangeBound,
    pub late: RangeBound,
}

impl RatioFormula {
    pub fn row(&self) -> u32 {
        self.guest.row
    }

    /// Same operands and locks, pointed at `row`.
    pub fn on_row(&self, row: u32) -> Self {
        Self {
            guest: RangeBound { row, ..self.guest },
            late: RangeBound { row, ..self.late },
        }
    }
}

impl fmt::Display for RatioFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "={}/({}+{})", self.guest, self.guest, self.late)
    }
}

/// A cell formula classified into the shapes a report sheet uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFormula {
    Sum(SumFormula),
    Ratio(RatioFormula),
    /// Anything else, kept verbatim (with a leading `=`).
    Other(String),
}

impl ReportFormula {
    /// Accepts formulas with or without the leading `=`, since the workbook
    /// stores them without it.
    pub fn parse(formula: &str) -> Result<Self, ReportError> {
        let trimmed = formula.trim();
        let with_equals = if trimmed.starts_with('=') {
            trimmed.to_string()
        } else {
            format!("={trimmed}")
        };

        let tokenizer = Tokenizer::new(&with_equals).map_err(|e| ReportError::FormulaTokenize {
            formula: with_equals.clone(),
            message: e.message,
        })?;
        let refs: Vec<String> = tokenizer
            .items
            .iter()
            .filter(|token| token.subtype == TokenSubType::Range)
            .map(|token| token.value.to_ascii_uppercase())
            .collect();
        let compact: String = with_equals
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        if let Some(sum) = match_sum(&compact, &refs) {
            return Ok(Self::Sum(sum));
        }
        if let Some(ratio) = match_ratio(&compact, &refs) {
            return Ok(Self::Ratio(ratio));
        }
        Ok(Self::Other(with_equals))
    }

    /// Formula text as umya stores it, without the leading `=`.
    pub fn to_cell_formula(&self) -> String {
        let text = self.to_string();
        text.strip_prefix('=').unwrap_or(&text).to_string()
    }
}

impl fmt::Display for ReportFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormula::Sum(sum) => fmt::Display::fmt(sum, f),
            ReportFormula::Ratio(ratio) => fmt::Display::fmt(ratio, f),
            ReportFormula::Other(text) => f.write_str(text),
        }
    }
}

/// Case-insensitive `SUM` probe, used to tell apart aggregates that drifted
/// from the plain `=SUM(a:b)` shape.
pub fn mentions_sum(formula: &str) -> bool {
    formula.to_ascii_uppercase().contains("SUM")
}

fn match_sum(compact: &str, refs: &[String]) -> Option<SumFormula> {
    let [range] = refs else {
        return None;
    };
    if compact != format!("=SUM({range})") {
        return None;
    }
    let (start, end) = range.split_once(':')?;
    Some(SumFormula {
        start: RangeBound::parse(start)?,
        end: RangeBound::parse(end)?,
    })
}

fn match_ratio(compact: &str, refs: &[String]) -> Option<RatioFormula> {
    let [numerator, guest, late] = refs else {
        return None;
    };
    if numerator != guest || compact != format!("={numerator}/({guest}+{late})") {
        return None;
    }
    let guest = RangeBound::parse(guest)?;
    let late = RangeBound::parse(late)?;
    if guest.row != late.row {
        return None;
    }
    Some(RatioFormula { guest, late })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sum_with_locks() {
        let parsed = ReportFormula::parse("SUM($C$2:C9)").unwrap();
        let ReportFormula::Sum(sum) = &parsed else {
            panic!("expected sum, got {parsed:?}");
        };
        assert!(sum.start.col_abs && sum.start.row_abs);
        assert_eq!(sum.end, RangeBound::relative(3, 9));
        assert_eq!(parsed.to_string(), "=SUM($C$2:C9)");
    }

    #[test]
    fn ratio_needs_matching_numerator_and_row() {
        assert_eq!(
            ReportFormula::parse("=C3/(C3+D3)").unwrap(),
            ReportFormula::Ratio(RatioFormula {
                guest: RangeBound::relative(3, 3),
                late: RangeBound::relative(4, 3),
            })
        );
        assert!(matches!(
            ReportFormula::parse("=C3/(E3+D3)").unwrap(),
            ReportFormula::Other(_)
        ));
        assert!(matches!(
            ReportFormula::parse("=C3/(C3+D4)").unwrap(),
            ReportFormula::Other(_)
        ));
    }

    #[test]
    fn sumif_is_not_a_plain_sum() {
        let parsed = ReportFormula::parse("=SUMIF(C2:C9,\">0\")").unwrap();
        assert!(matches!(parsed, ReportFormula::Other(_)));
        assert!(mentions_sum(&parsed.to_string()));
    }

    #[test]
    fn ratio_keeps_column_locks() {
        let parsed = ReportFormula::parse("$C2/($C2+$D2)").unwrap();
        let ReportFormula::Ratio(ratio) = &parsed else {
            panic!("expected ratio, got {parsed:?}");
        };
        assert!(ratio.guest.col_abs && !ratio.guest.row_abs);
        assert_eq!(ratio.on_row(3).to_string(), "=$C3/($C3+$D3)");
    }
}
