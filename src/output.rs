use crate::change::{ActionKind, LogicalChangeSet};
use crate::cli::OutputFormat;

/// Order in which compact output lists categories.
const CATEGORY_ORDER: [ActionKind; 4] = [
    ActionKind::Modified,
    ActionKind::Added,
    ActionKind::Removed,
    ActionKind::InvalidFilePath,
];

/// Render a change set.
///
/// - `Compact`: one `<action> <path>` line per path, categories in a fixed order.
/// - `Json`: a single-line JSON object, so a stream of batches is valid JSON Lines.
pub fn format_changes(changes: &LogicalChangeSet, format: &OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(changes)?),
        OutputFormat::Compact => {
            let lines: Vec<String> = CATEGORY_ORDER
                .iter()
                .flat_map(|&kind| {
                    changes
                        .paths(kind)
                        .iter()
                        .map(move |path| format!("{} {}", kind.as_str(), path))
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

/// Print a change set to stdout. Nothing is printed for an empty compact set.
pub fn print_changes(changes: &LogicalChangeSet, format: &OutputFormat) -> anyhow::Result<()> {
    let rendered = format_changes(changes, format)?;
    if !rendered.is_empty() {
        println!("{rendered}");
    }
    Ok(())
}
