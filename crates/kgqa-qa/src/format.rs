use kgqa_store::Row;

pub const FACT_SEPARATOR: &str = " - ";
pub const NO_FACTS: &str = "No facts found.";

/// One display line per row: each value's text joined with `" - "`.
pub fn format_row(row: &Row) -> String {
    row.values()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(FACT_SEPARATOR)
}

pub fn format_rows(rows: &[Row]) -> Vec<String> {
    rows.iter().map(format_row).collect()
}

/// Facts as a block of text, or [`NO_FACTS`] when there are none.
pub fn render_facts(facts: &[String]) -> String {
    if facts.is_empty() {
        NO_FACTS.to_string()
    } else {
        facts.join("\n")
    }
}
