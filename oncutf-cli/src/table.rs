//! Human-readable preview table.

use comfy_table::{Cell, Color, Table};
use oncutf_core::preview::PreviewResult;
use oncutf_core::validation::ValidationResult;

/// Render preview pairs with their validation status.
pub fn render_preview(preview: &PreviewResult, validation: &ValidationResult) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Old name").fg(Color::Cyan),
        Cell::new("New name").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
    ]);

    for item in &validation.items {
        let status = if !item.is_valid {
            format!("invalid: {}", item.error_message)
        } else if item.is_duplicate {
            "duplicate".to_string()
        } else if item.is_unchanged {
            "unchanged".to_string()
        } else {
            "ok".to_string()
        };

        table.add_row(vec![&item.old_name, &item.new_name, &status]);
    }

    let mut output = table.to_string();
    output.push('\n');
    output.push_str(&format!(
        "{} file(s): {} to rename, {} unchanged, {} invalid, {} duplicate",
        preview.name_pairs.len(),
        validation.valid_count,
        validation.unchanged_count,
        validation.invalid_count,
        validation.duplicate_count
    ));
    output
}
