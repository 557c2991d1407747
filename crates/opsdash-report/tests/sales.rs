//! Sales listing, summary and export over a populated in-memory store.

use chrono::NaiveDate;
use opsdash_report::{sales_report_rows, summarize, write_sales_csv};
use opsdash_store::LocalStore;

fn populated_store() -> LocalStore {
    let store = LocalStore::open_in_memory().unwrap();
    for sql in [
        "INSERT INTO Customer (CustomerNo, CustomerName) VALUES ('C1', 'Acme Foundry')",
        "INSERT INTO CI_Item (ItemCode, ItemCodeDesc, ProductLine, ProductType, SalesUnitOfMeasure)
         VALUES ('S4070', 'Silica 40/70', 'SAND', 'F', 'TON')",
        "INSERT INTO SalesOrderHeader (SalesOrderNo, OrderDate, CustomerNo, CustomerPONo, ShipToName, ShipToCity, ShipToState, ShipVia)
         VALUES ('0100001', '2024-03-01', 'C1', 'PO-77', 'Acme Plant 2', 'Peoria', 'IL', 'TRUCK')",
        "INSERT INTO SalesOrderHeader (SalesOrderNo, OrderDate, CustomerNo)
         VALUES ('0100002', '2024-03-04', 'C9')",
        "INSERT INTO SalesOrderHeader (SalesOrderNo, OrderDate, CustomerNo)
         VALUES ('0099999', '2023-12-31', 'C1')",
        "INSERT INTO SalesOrderDetail (SalesOrderNo, LineKey, ItemCode, ItemCodeDesc, QuantityOrdered, QuantityShipped, UnitPrice, ExtensionAmt)
         VALUES ('0100001', '000001', 'S4070', 'Silica 40/70', 22.5, 22.0, 41.25, 907.5)",
        "INSERT INTO SalesOrderDetail (SalesOrderNo, LineKey, ItemCode, ItemCodeDesc, QuantityOrdered, UnitPrice, ExtensionAmt, CommentText)
         VALUES ('0100001', '000002', '/FRT', 'Freight, flat rate', 1, 150, 150, 'Deliver before noon')",
        "INSERT INTO SalesOrderDetail (SalesOrderNo, LineKey, ItemCode, ItemCodeDesc, QuantityOrdered, UnitPrice, ExtensionAmt)
         VALUES ('0100002', '000001', 'S4070', 'Silica 40/70', 10, 40, 400)",
        "INSERT INTO SalesOrderDetail (SalesOrderNo, LineKey, ItemCode, ItemCodeDesc, QuantityOrdered, UnitPrice, ExtensionAmt)
         VALUES ('0099999', '000001', 'S4070', 'Silica 40/70', 5, 40, 200)",
    ] {
        store.execute(sql, &[]).unwrap();
    }
    store
}

fn march() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
    )
}

#[test]
fn listing_is_newest_first_within_range() {
    let store = populated_store();
    let (start, end) = march();
    let rows = sales_report_rows(&store, start, end).unwrap();

    let keys: Vec<(&str, Option<&str>)> = rows
        .iter()
        .map(|row| (row.sales_order_no.as_str(), row.line_key.as_deref()))
        .collect();
    assert_eq!(
        keys,
        [
            ("0100002", Some("000001")),
            ("0100001", Some("000001")),
            ("0100001", Some("000002")),
        ]
    );
    // Unknown customer and known item are both joined leniently.
    assert_eq!(rows[0].customer_name, None);
    assert_eq!(rows[1].customer_name.as_deref(), Some("Acme Foundry"));
    assert_eq!(rows[1].product_line.as_deref(), Some("SAND"));
    assert_eq!(rows[2].product_line, None);
}

#[test]
fn range_bounds_are_inclusive() {
    let store = populated_store();
    let day = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    let rows = sales_report_rows(&store, day, day).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].sales_order_no, "0099999");
}

#[test]
fn summary_over_listing() {
    let store = populated_store();
    let (start, end) = march();
    let summary = summarize(&sales_report_rows(&store, start, end).unwrap());

    assert_eq!(summary.by_item.len(), 2);
    assert_eq!(summary.by_item[0].description, "Silica 40/70");
    assert_eq!(summary.by_item[0].revenue, 1307.5);
    assert_eq!(summary.by_item[0].tons_sold, 32.0);
    assert_eq!(summary.by_item[1].description, "Freight, flat rate");
    assert_eq!(summary.by_item[1].tons_sold, 0.0);
    assert_eq!(summary.by_year.len(), 1);
    assert_eq!(summary.by_year[0].year, 2024);
    assert_eq!(summary.by_year[0].revenue, 1457.5);
}

#[test]
fn csv_export() {
    let store = populated_store();
    let (start, end) = march();
    let rows = sales_report_rows(&store, start, end).unwrap();
    let mut out = Vec::new();
    write_sales_csv(&rows[1..], &mut out).unwrap();
    let csv = String::from_utf8(out).unwrap();

    insta::assert_snapshot!(csv.trim_end(), @r#"
    SalesOrderNo,OrderDate,CustomerNo,CustomerName,CustomerPONo,ShipToName,ShipToCity,ShipToState,ShipVia,LineKey,ItemCode,ItemCodeDesc,QuantityOrdered,QuantityShipped,UnitPrice,ExtensionAmt,DetailComment,ProductLine,ProductType,SalesUnitOfMeasure
    0100001,2024-03-01,C1,Acme Foundry,PO-77,Acme Plant 2,Peoria,IL,TRUCK,000001,S4070,Silica 40/70,22.5,22.0,41.25,907.5,,SAND,F,TON
    0100001,2024-03-01,C1,Acme Foundry,PO-77,Acme Plant 2,Peoria,IL,TRUCK,000002,/FRT,"Freight, flat rate",1.0,,150.0,150.0,Deliver before noon,,,
    "#);
}

#[test]
fn timestamped_order_dates_fall_on_their_day() {
    let store = populated_store();
    for sql in [
        "INSERT INTO SalesOrderHeader (SalesOrderNo, OrderDate, CustomerNo)
         VALUES ('0100003', '2024-03-31T08:15:00', 'C1')",
        "INSERT INTO SalesOrderDetail (SalesOrderNo, LineKey, ItemCode, ItemCodeDesc, QuantityOrdered, UnitPrice, ExtensionAmt)
         VALUES ('0100003', '000001', 'S4070', 'Silica 40/70', 3, 40, 120)",
    ] {
        store.execute(sql, &[]).unwrap();
    }
    let (start, end) = march();
    let rows = sales_report_rows(&store, start, end).unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].sales_order_no, "0100003");

    let summary = summarize(&rows);
    assert_eq!(summary.by_year.len(), 1);
    assert_eq!(summary.by_year[0].revenue, 1577.5);
}

#[test]
fn empty_listing_writes_nothing() {
    let mut out = Vec::new();
    write_sales_csv(&[], &mut out).unwrap();
    assert!(out.is_empty());
}
