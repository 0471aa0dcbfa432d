//! Output file naming for fill variants.
//!
//! Every produced variant gets a name that spells out the operation, its
//! target size and the focus position, so two requests that differ in any
//! of them never collide on disk:
//!
//! - `dawn` + FocusFill 400x300 at the center → `dawn.FocusFill400x300-50-50`
//! - `dawn` + FocusCropWidth 400 at (1, 1) → `dawn.FocusCropWidth400-100-0`
//!
//! The trailing `PX-PY` pair is the [focus hash](focus_hash): the focus
//! position as whole percentages from the left and top edges.

use crate::focus::FocusPoint;
use crate::imaging::FillMode;

/// Focus position as `"{percent_x}-{percent_y}"`.
pub fn focus_hash(focus: &FocusPoint) -> String {
    format!("{}-{}", focus.percentage_x(), focus.percentage_y())
}

/// Name of the variant of `stem` produced by `mode` at `focus`, without an
/// extension.
pub fn variant_name(stem: &str, mode: &FillMode, focus: &FocusPoint) -> String {
    let px = |v: f64| v.round() as i64;
    let size = match *mode {
        FillMode::Fill { width, height } | FillMode::FillMax { width, height } => {
            format!("{}x{}", px(width), px(height))
        }
        FillMode::CropWidth { width } => px(width).to_string(),
        FillMode::CropHeight { height } => px(height).to_string(),
    };
    format!("{}.{}{}-{}", stem, mode.label(), size, focus_hash(focus))
}
