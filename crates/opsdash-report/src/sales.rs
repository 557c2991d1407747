//! Invoice line listing for a date range.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use opsdash_model::LocalValue;
use opsdash_store::LocalStore;

use crate::error::ReportError;

const SALES_REPORT_SQL: &str = "
SELECT h.SalesOrderNo, h.OrderDate, h.CustomerNo, c.CustomerName, h.CustomerPONo,
       h.ShipToName, h.ShipToCity, h.ShipToState, h.ShipVia,
       d.LineKey, d.ItemCode, d.ItemCodeDesc, d.QuantityOrdered, d.QuantityShipped,
       d.UnitPrice, d.ExtensionAmt, d.CommentText,
       i.ProductLine, i.ProductType, i.SalesUnitOfMeasure
FROM SalesOrderHeader AS h
INNER JOIN SalesOrderDetail AS d ON h.SalesOrderNo = d.SalesOrderNo
LEFT JOIN Customer AS c ON h.CustomerNo = c.CustomerNo
LEFT JOIN CI_Item AS i ON d.ItemCode = i.ItemCode
WHERE substr(h.OrderDate, 1, 10) BETWEEN ?1 AND ?2
ORDER BY h.OrderDate DESC, h.SalesOrderNo DESC, d.LineKey
";

/// One invoice line with its header, customer and item details.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SalesReportRow {
    pub sales_order_no: String,
    pub order_date: Option<String>,
    pub customer_no: Option<String>,
    pub customer_name: Option<String>,
    #[serde(rename = "CustomerPONo")]
    pub customer_po_no: Option<String>,
    pub ship_to_name: Option<String>,
    pub ship_to_city: Option<String>,
    pub ship_to_state: Option<String>,
    pub ship_via: Option<String>,
    pub line_key: Option<String>,
    pub item_code: Option<String>,
    pub item_code_desc: Option<String>,
    pub quantity_ordered: Option<f64>,
    pub quantity_shipped: Option<f64>,
    pub unit_price: Option<f64>,
    pub extension_amt: Option<f64>,
    pub detail_comment: Option<String>,
    pub product_line: Option<String>,
    pub product_type: Option<String>,
    pub sales_unit_of_measure: Option<String>,
}

/// Lines of every order dated between `start` and `end` inclusive, newest
/// order first.
pub fn sales_report_rows(
    store: &LocalStore,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<SalesReportRow>, ReportError> {
    let params = [
        LocalValue::Text(start.format("%Y-%m-%d").to_string()),
        LocalValue::Text(end.format("%Y-%m-%d").to_string()),
    ];
    let rows = store
        .query(SALES_REPORT_SQL, &params)?
        .iter()
        .map(|row| report_row(row))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(%start, %end, lines = rows.len(), "sales report loaded");
    Ok(rows)
}

fn report_row(row: &[LocalValue]) -> Result<SalesReportRow, ReportError> {
    Ok(SalesReportRow {
        sales_order_no: text(&row[0]).unwrap_or_default(),
        order_date: text(&row[1]),
        customer_no: text(&row[2]),
        customer_name: text(&row[3]),
        customer_po_no: text(&row[4]),
        ship_to_name: text(&row[5]),
        ship_to_city: text(&row[6]),
        ship_to_state: text(&row[7]),
        ship_via: text(&row[8]),
        line_key: text(&row[9]),
        item_code: text(&row[10]),
        item_code_desc: text(&row[11]),
        quantity_ordered: number(&row[12], "QuantityOrdered")?,
        quantity_shipped: number(&row[13], "QuantityShipped")?,
        unit_price: number(&row[14], "UnitPrice")?,
        extension_amt: number(&row[15], "ExtensionAmt")?,
        detail_comment: text(&row[16]),
        product_line: text(&row[17]),
        product_type: text(&row[18]),
        sales_unit_of_measure: text(&row[19]),
    })
}

fn text(value: &LocalValue) -> Option<String> {
    (!value.is_null()).then(|| value.display_string())
}

fn number(value: &LocalValue, column: &'static str) -> Result<Option<f64>, ReportError> {
    match value {
        LocalValue::Null => Ok(None),
        LocalValue::Text(text) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ReportError::Column { column }),
        other => Ok(other.as_f64()),
    }
}
