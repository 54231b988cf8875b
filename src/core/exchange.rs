use std::io::Read;

use serde::Serialize;
use tracing::debug;

use super::types::BudgetCategory;
use crate::error::{PlannerError, Result};

const HEADERS: [&str; 4] = ["Category", "Subcategory", "Monthly Cost", "Annual Cost"];

/// Column positions resolved from the header row; a column may be absent.
struct Columns {
    category: usize,
    subcategory: usize,
    monthly: Option<usize>,
    annual: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let required = |name: &str| {
            find(name).ok_or_else(|| PlannerError::InvalidInput(format!("missing {name} column")))
        };
        Ok(Self {
            category: required(HEADERS[0])?,
            subcategory: required(HEADERS[1])?,
            monthly: find(HEADERS[2]),
            annual: find(HEADERS[3]),
        })
    }
}

fn field(record: &csv::StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

pub fn export_categories(categories: &[BudgetCategory]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    // Serializing an empty set still has to emit the header row.
    writer.write_record(HEADERS)?;

    for category in categories {
        for (name, monthly) in &category.subcategories {
            let monthly_cost = format_amount(*monthly);
            let annual_cost = format_amount(monthly * 12.0);
            writer.write_record([
                category.label.as_str(),
                name.as_str(),
                monthly_cost.as_str(),
                annual_cost.as_str(),
            ])?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Merges CSV rows into `categories`, matching labels case-insensitively.
/// Rows naming an unknown category, or too short to name a subcategory, are
/// skipped. Missing or non-numeric costs import as 0.
pub fn import_categories<R: Read>(
    reader: R,
    categories: &mut [BudgetCategory],
) -> Result<ImportSummary> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut summary = ImportSummary::default();
    if rdr.headers()?.is_empty() {
        return Ok(summary);
    }
    let columns = Columns::resolve(rdr.headers()?)?;
    for record in rdr.records() {
        // Short rows are tolerated; malformed CSV still aborts.
        let record = record?;
        let label = field(&record, Some(columns.category));
        let subcategory = field(&record, Some(columns.subcategory));
        if subcategory.is_empty() {
            debug!(category = %label, "skipping row without subcategory");
            summary.skipped += 1;
            continue;
        }
        let Some(category) = categories
            .iter_mut()
            .find(|c| c.label.eq_ignore_ascii_case(label))
        else {
            debug!(category = %label, "skipping row for unknown category");
            summary.skipped += 1;
            continue;
        };

        let monthly = match parse_amount(field(&record, columns.monthly)) {
            Some(value) => value,
            None => parse_amount(field(&record, columns.annual))
                .map(|a| a / 12.0)
                .unwrap_or(0.0),
        };
        category.subcategories.insert(subcategory.to_string(), monthly);
        summary.imported += 1;
    }

    Ok(summary)
}

fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(['$', ','], "");
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// Shortest representation that parses back to the same f64.
fn format_amount(value: f64) -> String {
    format!("{value}")
}
