//! Table-based extraction
//!
//! Uses the scraper crate to read the first `<table>` of a page. The first
//! row is always treated as a header; every other row needs at least three
//! `<td>` cells to become a record.

use scraper::{ElementRef, Html, Selector};

use super::{LookupFallback, Record, RecordSource, ViewMode, KEYED_STATUS};

/// Minimum number of cells for a row to count as a node.
pub const MIN_CELLS: usize = 3;

/// Attribute some node-list pages put on each row.
pub const NODE_ATTR: &str = "data-node";

struct Selectors {
    table: Selector,
    row: Selector,
    cell: Selector,
}

impl Selectors {
    fn parse() -> Option<Self> {
        Some(Self {
            table: Selector::parse("table").ok()?,
            row: Selector::parse("tr").ok()?,
            cell: Selector::parse("td").ok()?,
        })
    }
}

/// [`RecordSource`] reading positional columns from the first table.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableExtractor;

impl RecordSource for TableExtractor {
    fn records(&self, markup: &str, mode: ViewMode) -> Vec<Record> {
        extract_records(markup, mode)
    }

    fn lookup(&self, markup: &str, id: &str, fallback: LookupFallback) -> Option<Record> {
        lookup_record(markup, id, fallback)
    }
}

/// Extract every data row of the first table.
/// Returns an empty list when the page has no table.
pub fn extract_records(html: &str, mode: ViewMode) -> Vec<Record> {
    let document = Html::parse_document(html);

    let Some(selectors) = Selectors::parse() else {
        return vec![];
    };
    let Some(table) = document.select(&selectors.table).next() else {
        return vec![];
    };

    table
        .select(&selectors.row)
        .skip(1)
        .filter_map(|row| row_to_record(row, &selectors.cell))
        .map(|mut record| {
            if mode == ViewMode::Keyed {
                record.status = Some(KEYED_STATUS.to_string());
            }
            record
        })
        .collect()
}

/// Find the row for node `id` in the first table.
///
/// Rows are matched on their `data-node` attribute. When none matches,
/// `fallback` decides between giving up and taking the second row.
pub fn lookup_record(html: &str, id: &str, fallback: LookupFallback) -> Option<Record> {
    let document = Html::parse_document(html);

    let selectors = Selectors::parse()?;
    let table = document.select(&selectors.table).next()?;

    let matched = table
        .select(&selectors.row)
        .find(|row| row.value().attr(NODE_ATTR) == Some(id));

    let row = match (matched, fallback) {
        (Some(row), _) => row,
        (None, LookupFallback::SecondRow) => table.select(&selectors.row).nth(1)?,
        (None, LookupFallback::NotFound) => return None,
    };

    row_to_record(row, &selectors.cell)
}

fn row_to_record(row: ElementRef<'_>, cell: &Selector) -> Option<Record> {
    let cells: Vec<String> = row
        .select(cell)
        .take(4)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect();

    if cells.len() < MIN_CELLS {
        return None;
    }

    let mut cells = cells.into_iter();
    Some(Record {
        id: cells.next().unwrap_or_default(),
        label: cells.next().unwrap_or_default(),
        location: cells.next().unwrap_or_default(),
        description: cells.next().unwrap_or_default(),
        status: None,
    })
}
