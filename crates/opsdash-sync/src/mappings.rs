//! The Sage 100 tables pulled into the dashboard.
//!
//! Invoice history is the source of the local sales order tables: the ERP's
//! `InvoiceNo` becomes the local `SalesOrderNo`.

use opsdash_model::{ColumnPair, MappingError, MappingSet, SyncMapping};

fn keys(columns: &[&str]) -> Vec<String> {
    columns.iter().map(ToString::to_string).collect()
}

fn same(columns: &[&str]) -> impl Iterator<Item = ColumnPair> {
    columns.iter().map(|column| ColumnPair::same(*column))
}

/// Customers, invoice headers, invoice lines and items, in sync order.
///
/// # Errors
///
/// Only if one of the declarations below is invalid.
pub fn sage_mappings() -> Result<MappingSet, MappingError> {
    let customer = SyncMapping::new(
        "AR_Customer",
        "Customer",
        same(&["CustomerNo", "CustomerName"]).collect(),
        keys(&["CustomerNo"]),
    )?;

    let header = SyncMapping::new(
        "AR_InvoiceHistoryHeader",
        "SalesOrderHeader",
        std::iter::once(ColumnPair::new("InvoiceNo", "SalesOrderNo"))
            .chain(same(&[
                "OrderDate",
                "ShipToName",
                "ShipToAddress1",
                "ShipToCity",
                "ShipToState",
                "ShipToZipCode",
                "CustomerPONo",
                "ShipVia",
                "CustomerNo",
            ]))
            .collect(),
        keys(&["SalesOrderNo"]),
    )?;

    let detail = SyncMapping::new(
        "AR_InvoiceHistoryDetail",
        "SalesOrderDetail",
        [
            ColumnPair::new("InvoiceNo", "SalesOrderNo"),
            ColumnPair::new("DetailSeqNo", "LineKey"),
        ]
        .into_iter()
        .chain(same(&[
            "ItemCode",
            "ItemCodeDesc",
            "QuantityOrdered",
            "UnitPrice",
            "ExtensionAmt",
        ]))
        .collect(),
        keys(&["SalesOrderNo", "LineKey"]),
    )?;

    let item = SyncMapping::new(
        "CI_Item",
        "CI_Item",
        same(&[
            "ItemCode",
            "ItemCodeDesc",
            "ProductLine",
            "ProductType",
            "SalesUnitOfMeasure",
        ])
        .collect(),
        keys(&["ItemCode"]),
    )?;

    MappingSet::new(vec![customer, header, detail, item])
}
