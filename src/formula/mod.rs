pub mod pattern;
pub mod rewrite;

pub use pattern::{RangeBound, RatioFormula, ReportFormula, SumFormula, mentions_sum};
pub use rewrite::{CompletionRate, relocate, rewrite_ratio, rewrite_sum};
