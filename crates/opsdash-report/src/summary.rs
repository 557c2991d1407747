//! Revenue and tonnage totals over a sales listing.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::sales::SalesReportRow;

/// Label for lines without an item description.
pub const UNSPECIFIED_ITEM: &str = "(Not Specified)";

/// Lines whose description contains one of these count towards revenue but
/// not towards tons sold.
pub const NON_PRODUCT_KEYWORDS: [&str; 10] = [
    "freight",
    "pallet",
    "lease",
    "dunnage",
    "shipping",
    "charge",
    "fee",
    "misc",
    "covers",
    "shrinkwrap",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
    pub description: String,
    pub revenue: f64,
    pub tons_sold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub revenue: f64,
    pub tons_sold: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesSummary {
    /// Highest revenue first.
    pub by_item: Vec<ItemSummary>,
    /// Oldest year first.
    pub by_year: Vec<YearSummary>,
}

fn is_product(description: &str) -> bool {
    let lower = description.to_lowercase();
    !NON_PRODUCT_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Calendar day of a stored order date; a time part is ignored.
fn order_day(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok()
}

/// Totals the listing by item description and by order year.
///
/// Shipped quantity is used when known, ordered quantity otherwise. Lines
/// with an unreadable order date still count in the item totals.
pub fn summarize(rows: &[SalesReportRow]) -> SalesSummary {
    let mut by_item: Vec<ItemSummary> = Vec::new();
    let mut item_index: HashMap<String, usize> = HashMap::new();
    let mut by_year: BTreeMap<i32, (f64, f64)> = BTreeMap::new();

    for row in rows {
        let revenue = row.extension_amt.unwrap_or(0.0);
        let quantity = row
            .quantity_shipped
            .or(row.quantity_ordered)
            .unwrap_or(0.0);
        let description = match row.item_code_desc.as_deref() {
            Some(desc) if !desc.trim().is_empty() => desc,
            _ => UNSPECIFIED_ITEM,
        };
        let tons = if is_product(description) { quantity } else { 0.0 };

        let index = *item_index
            .entry(description.to_string())
            .or_insert_with(|| {
                by_item.push(ItemSummary {
                    description: description.to_string(),
                    revenue: 0.0,
                    tons_sold: 0.0,
                });
                by_item.len() - 1
            });
        by_item[index].revenue += revenue;
        by_item[index].tons_sold += tons;

        let Some(date) = row.order_date.as_deref().and_then(order_day) else {
            continue;
        };
        let totals = by_year.entry(date.year()).or_default();
        totals.0 += revenue;
        totals.1 += tons;
    }

    by_item.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    SalesSummary {
        by_item,
        by_year: by_year
            .into_iter()
            .map(|(year, (revenue, tons_sold))| YearSummary {
                year,
                revenue,
                tons_sold,
            })
            .collect(),
    }
}
