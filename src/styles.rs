use crate::model::{
    AlignmentDescriptor, BorderDescriptor, FillDescriptor, FontDescriptor, StyleDescriptor,
};
use sha2::{Digest, Sha256};
use umya_spreadsheet::helper::coordinate::string_from_column_index;
use umya_spreadsheet::structs::EnumTrait;
use umya_spreadsheet::{Alignment, Border, Column, Fill, Font, Style, Worksheet};

pub const DEFAULT_COLUMN_WIDTH: f64 = 15.0;

/// How the target column's width was settled while copying a style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnWidth {
    Inherited(f64),
    Defaulted(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleCopy {
    pub style_id: String,
    pub width: ColumnWidth,
}

pub fn descriptor_from_style(style: &Style) -> StyleDescriptor {
    StyleDescriptor {
        font: style.get_font().map(font_descriptor),
        border: style.get_borders().and_then(|borders| {
            border_descriptor(
                borders.get_left_border(),
                borders.get_right_border(),
                borders.get_top_border(),
                borders.get_bottom_border(),
            )
        }),
        fill: style.get_fill().and_then(fill_descriptor),
        alignment: style.get_alignment().map(alignment_descriptor),
        number_format: style
            .get_number_format()
            .map(|fmt| fmt.get_format_code().to_string())
            .filter(|code| !code.eq_ignore_ascii_case("general")),
    }
}

/// A cell style differs from what a freshly created cell would carry.
pub fn has_explicit_style(style: &Style) -> bool {
    descriptor_from_style(style) != descriptor_from_style(&Style::default())
}

/// Short fingerprint of a style, used to correlate copies in logs.
pub fn stable_style_id(descriptor: &StyleDescriptor) -> String {
    let bytes = serde_json::to_vec(descriptor).unwrap_or_default();
    let digest = Sha256::digest(bytes);
    format!("{digest:x}").chars().take(12).collect()
}

/// Copy font, border, fill, alignment and number format from `source` to
/// `target` (both `(col, row)`), then carry the source column's width over to
/// the target column.
///
/// Returns `None` and leaves the target untouched when the source cell is
/// missing or unstyled.
pub fn copy_cell_style(
    sheet: &mut Worksheet,
    source: (u32, u32),
    target: (u32, u32),
    default_width: f64,
) -> Option<StyleCopy> {
    let style = sheet.get_cell(source)?.get_style().clone();
    if !has_explicit_style(&style) {
        return None;
    }
    let style_id = stable_style_id(&descriptor_from_style(&style));
    sheet.get_cell_mut(target).set_style(style);
    let width = copy_column_width(sheet, source.0, target.0, default_width);
    Some(StyleCopy { style_id, width })
}

/// Width set on `col`, if any. umya materializes a column dimension for every
/// column holding a cell, so one left at its default width counts as unset.
pub fn explicit_column_width(sheet: &Worksheet, col: u32) -> Option<f64> {
    let unset = *Column::default().get_width();
    sheet
        .get_column_dimension(&string_from_column_index(&col))
        .map(|column| *column.get_width())
        .filter(|width| *width > 0.0 && (width - unset).abs() > f64::EPSILON)
}

/// Missing source width is not an error: the default is written instead.
pub fn copy_column_width(
    sheet: &mut Worksheet,
    source_col: u32,
    target_col: u32,
    default_width: f64,
) -> ColumnWidth {
    let width = match explicit_column_width(sheet, source_col) {
        Some(width) => ColumnWidth::Inherited(width),
        None => ColumnWidth::Defaulted(default_width),
    };
    let value = match width {
        ColumnWidth::Inherited(w) | ColumnWidth::Defaulted(w) => w,
    };
    sheet
        .get_column_dimension_by_number_mut(&target_col)
        .set_width(value);
    width
}

fn font_descriptor(font: &Font) -> FontDescriptor {
    FontDescriptor {
        name: font.get_name().to_string(),
        size: *font.get_size(),
        bold: *font.get_bold(),
        italic: *font.get_italic(),
        underline: font.get_underline().to_string(),
        color: font.get_color().get_argb().to_string(),
    }
}

fn border_descriptor(
    left: &Border,
    right: &Border,
    top: &Border,
    bottom: &Border,
) -> Option<BorderDescriptor> {
    let edge = |border: &Border| {
        (
            border.get_border_style().to_string(),
            border.get_color().get_argb().to_string(),
        )
    };
    let edges = [
        edge(left),
        edge(right),
        edge(top),
        edge(bottom),
    ];
    if edges
        .iter()
        .all(|(style, _)| style.is_empty() || style.eq_ignore_ascii_case("none"))
    {
        return None;
    }
    Some(BorderDescriptor { edges })
}

fn fill_descriptor(fill: &Fill) -> Option<FillDescriptor> {
    if let Some(pattern) = fill.get_pattern_fill() {
        let kind = pattern.get_pattern_type().get_value_string().to_string();
        let foreground = pattern
            .get_foreground_color()
            .map(|c| c.get_argb().to_string());
        let background = pattern
            .get_background_color()
            .map(|c| c.get_argb().to_string());
        if kind.eq_ignore_ascii_case("none") && foreground.is_none() && background.is_none() {
            return None;
        }
        return Some(FillDescriptor::Pattern {
            pattern: kind,
            foreground,
            background,
        });
    }

    fill.get_gradient_fill().map(|gradient| FillDescriptor::Gradient {
        degree: *gradient.get_degree(),
        stops: gradient
            .get_gradient_stop()
            .iter()
            .map(|stop| (*stop.get_position(), stop.get_color().get_argb().to_string()))
            .collect(),
    })
}

fn alignment_descriptor(alignment: &Alignment) -> AlignmentDescriptor {
    AlignmentDescriptor {
        horizontal: alignment.get_horizontal().get_value_string().to_string(),
        vertical: alignment.get_vertical().get_value_string().to_string(),
        wrap_text: *alignment.get_wrap_text(),
        text_rotation: *alignment.get_text_rotation(),
    }
}
