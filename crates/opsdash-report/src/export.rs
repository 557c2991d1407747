//! CSV export of the sales listing.

use std::io::Write;

use crate::error::ReportError;
use crate::sales::SalesReportRow;

/// Writes a header row and one record per line. Nothing is written for an
/// empty listing.
pub fn write_sales_csv<W: Write>(rows: &[SalesReportRow], writer: W) -> Result<(), ReportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}
