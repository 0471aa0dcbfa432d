//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every entity leads with what it *is* (positional index, image name,
//! geometry) and shows file paths as indented context lines.
//!
//! # Output Format
//!
//! ## Plan
//!
//! ```text
//! 1000x500 → 200x200
//!     Crop: x, offset 200 of 400
//!     Focus: 1,0 → 1,0
//! ```
//!
//! ## Describe
//!
//! ```text
//! Focus: 0.5,-0.2
//!     Offset: 75% from left, 60% from top
//!     Area: focus-right-center
//! ```
//!
//! ## Process
//!
//! ```text
//! Processing 2 images
//!     001 dawn.jpg (1000x500)
//!         Source: landscapes/dawn.jpg
//!         Focus: 1,0 (focus-right-center)
//!         landscapes/dawn.FocusFill200x200-100-50.jpg: cached
//!         landscapes/dawn.FocusCropHeight100-100-50.jpg: rendered
//! ```
//!
//! # Architecture
//!
//! Each `format_*` function returns `Vec<String>` and is pure, so tests can
//! check output line by line. `print_*` wrappers write to stdout.

use crate::focus::FocusPoint;
use crate::imaging::{CropAxis, CropPlan, Dimensions, FillResult};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn size(width: u32, height: u32) -> String {
    format!("{}x{}", width, height)
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn crop_line(plan: &CropPlan) -> String {
    match plan.axis {
        CropAxis::None => "Crop: none, resize only".to_string(),
        CropAxis::X => format!("Crop: x, offset {} of {}", plan.offset, plan.scaled_length),
        CropAxis::Y => format!("Crop: y, offset {} of {}", plan.offset, plan.scaled_length),
    }
}

// ============================================================================
// plan / fill
// ============================================================================

/// Format a crop plan for `original`. `None` means no plan was possible.
pub fn format_plan(
    original: Dimensions,
    focus: &FocusPoint,
    plan: Option<&CropPlan>,
) -> Vec<String> {
    let Some(plan) = plan else {
        return vec![
            size(original.width, original.height),
            format!("{}Nothing to plan: the original has a zero dimension", indent(1)),
        ];
    };
    vec![
        format!(
            "{} \u{2192} {}",
            size(original.width, original.height),
            size(plan.width, plan.height)
        ),
        format!("{}{}", indent(1), crop_line(plan)),
        format!("{}Focus: {} \u{2192} {}", indent(1), focus, plan.focus),
    ]
}

pub fn print_plan(original: Dimensions, focus: &FocusPoint, plan: Option<&CropPlan>) {
    for line in format_plan(original, focus, plan) {
        println!("{}", line);
    }
}

/// Format the result of a single fill command.
pub fn format_fill_result(output: &Path, result: &FillResult) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({})",
        output.display(),
        size(result.width, result.height)
    )];
    match &result.plan {
        Some(plan) => lines.push(format!("{}{}", indent(1), crop_line(plan))),
        None => lines.push(format!("{}Unchanged, re-encoded at source size", indent(1))),
    }
    lines.push(format!("{}Focus: {}", indent(1), result.focus));
    lines
}

pub fn print_fill_result(output: &Path, result: &FillResult) {
    for line in format_fill_result(output, result) {
        println!("{}", line);
    }
}

// ============================================================================
// describe
// ============================================================================

/// Format the presentation helpers for a focus point.
pub fn format_description(focus: &FocusPoint) -> Vec<String> {
    vec![
        format!("Focus: {}", focus),
        format!(
            "{}Offset: {}% from left, {}% from top",
            indent(1),
            focus.percentage_x(),
            focus.percentage_y()
        ),
        format!("{}Area: {}", indent(1), focus.area()),
    ]
}

pub fn print_description(focus: &FocusPoint) {
    for line in format_description(focus) {
        println!("{}", line);
    }
}

// ============================================================================
// process
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &crate::process::ProcessEvent) -> Vec<String> {
    use crate::process::{ProcessEvent, VariantStatus};
    match event {
        ProcessEvent::Started { image_count } => {
            let noun = if *image_count == 1 { "image" } else { "images" };
            vec![format!("Processing {} {}", image_count, noun)]
        }
        ProcessEvent::ImageProcessed {
            index,
            source,
            dimensions,
            focus,
            variants,
        } => {
            let mut lines = vec![
                format!(
                    "{}{} {} ({})",
                    indent(1),
                    format_index(*index),
                    file_name(source),
                    size(dimensions.width, dimensions.height)
                ),
                format!("{}Source: {}", indent(2), source),
                format!("{}Focus: {} ({})", indent(2), focus, focus.area()),
            ];

            for variant in variants {
                let status_str = match variant.status {
                    VariantStatus::Cached => "cached",
                    VariantStatus::Copied => "copied",
                    VariantStatus::Rendered => "rendered",
                };
                lines.push(format!("{}{}: {}", indent(2), variant.label, status_str));
            }
            lines
        }
    }
}
