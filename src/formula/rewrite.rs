use super::pattern::{RangeBound, RatioFormula, ReportFormula, SumFormula};
use crate::errors::ReportError;

/// Keep the start boundary and move the end to `column{new_last_row}`.
pub fn rewrite_sum(formula: &SumFormula, new_last_row: u32, column: u32) -> SumFormula {
    SumFormula {
        start: formula.start,
        end: RangeBound {
            col: column,
            row: new_last_row,
            ..formula.end
        },
    }
}

pub fn rewrite_ratio(guest_col: u32, late_col: u32, row: u32) -> RatioFormula {
    RatioFormula {
        guest: RangeBound::relative(guest_col, row),
        late: RangeBound::relative(late_col, row),
    }
}

/// Move a ratio that points at `old_row` so it points at `new_row`. A ratio
/// built on any other row is refused instead of being half-shifted.
pub fn relocate(formula: &RatioFormula, old_row: u32, new_row: u32) -> Result<RatioFormula, String> {
    if formula.row() != old_row {
        return Err(format!(
            "ratio references row {} but was expected on row {old_row}",
            formula.row()
        ));
    }
    Ok(formula.on_row(new_row))
}

/// Completion-rate state of the row a new data row is modelled on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionRate {
    Existing(ReportFormula),
    NoFormula,
}

impl CompletionRate {
    /// `cell_formula` is the raw formula text of the source cell, if any.
    pub fn classify(cell_formula: Option<&str>) -> Result<Self, ReportError> {
        match cell_formula.map(str::trim).filter(|f| !f.is_empty()) {
            Some(text) => Ok(Self::Existing(ReportFormula::parse(text)?)),
            None => Ok(Self::NoFormula),
        }
    }

    /// Ratio for the new row: the source formula moved down, or a fresh one
    /// built from the header columns. The flag is true when synthesized.
    pub fn for_new_row(
        &self,
        guest_col: u32,
        late_col: u32,
        source_row: u32,
        new_row: u32,
        address: &str,
    ) -> Result<(RatioFormula, bool), ReportError> {
        match self {
            CompletionRate::NoFormula => Ok((rewrite_ratio(guest_col, late_col, new_row), true)),
            CompletionRate::Existing(ReportFormula::Ratio(ratio)) => relocate(ratio, source_row, new_row)
                .map(|moved| (moved, false))
                .map_err(|reason| ReportError::UnsupportedFormula {
                    address: address.to_string(),
                    formula: ratio.to_string(),
                    reason,
                }),
            CompletionRate::Existing(other) => Err(ReportError::UnsupportedFormula {
                address: address.to_string(),
                formula: other.to_string(),
                reason: "completion rate is not a guest/(guest+late) ratio".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn rewrite_sum_keeps_start_and_end_locks() {
        let ReportFormula::Sum(sum) = ReportFormula::parse("=SUM(C$2:C$7)").unwrap() else {
            panic!("expected sum");
        };
        let rewritten = rewrite_sum(&sum, 9, 3);
        assert_eq!(rewritten.to_string(), "=SUM(C$2:C$9)");
    }

    #[test]
    fn relocate_refuses_foreign_row() {
        let ratio = rewrite_ratio(3, 4, 5);
        assert_eq!(relocate(&ratio, 5, 6).unwrap().to_string(), "=C6/(C6+D6)");
        assert!(relocate(&ratio, 4, 5).is_err());
    }

    #[test]
    fn relocate_keeps_locks() {
        let ReportFormula::Ratio(ratio) = ReportFormula::parse("=$C$2/($C$2+D2)").unwrap() else {
            panic!("expected ratio");
        };
        assert_eq!(relocate(&ratio, 2, 3).unwrap().to_string(), "=$C$3/($C$3+D3)");
    }

    #[test]
    fn existing_non_ratio_is_rejected() {
        let rate = CompletionRate::classify(Some("IFERROR(C2/(C2+D2),0)")).unwrap();
        assert_matches!(
            rate.for_new_row(3, 4, 2, 3, "E3"),
            Err(ReportError::UnsupportedFormula { .. })
        );
    }

    #[test]
    fn missing_formula_is_synthesized() {
        let (ratio, synthesized) = CompletionRate::classify(None)
            .unwrap()
            .for_new_row(3, 4, 1, 2, "E2")
            .unwrap();
        assert!(synthesized);
        assert_eq!(ratio.to_string(), "=C2/(C2+D2)");
    }
}
