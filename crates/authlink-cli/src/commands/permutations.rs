use anyhow::{Context, Result};
use authlink_core::{name_heading_permutations, Record};
use authlink_sqlite::parse_records;
use std::path::Path;

pub fn execute(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records = parse_records(&text).with_context(|| format!("Failed to parse {}", file.display()))?;

    for line in render(&records) {
        println!("{}", line);
    }
    Ok(())
}

/// One header line per record followed by its terms, one per line
pub fn render(records: &[Record]) -> Vec<String> {
    let mut lines = Vec::new();
    for record in records {
        let id = record.control_number().unwrap_or("?");
        match name_heading_permutations(record) {
            Ok(terms) => {
                lines.push(format!("{}:", id));
                lines.extend(terms.iter().map(|term| format!("  {}", term)));
            }
            Err(e) => lines.push(format!("{}: {}", id, e)),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_terms_under_record_id() {
        let records = parse_records("001    7\n100 1  ‡aAakkula, Immo,‡d1974-").unwrap();
        let lines = render(&records);

        assert_eq!(lines[0], "7:");
        assert!(lines[1].contains("AAKKULA IMMO"));
        assert!(lines.len() > 2);
    }
}
