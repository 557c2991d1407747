//! Table definitions of the local store.

/// Current layout version, stored in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Site configuration and scheduler tables.
pub const SYSTEM_TABLES: &str = "
CREATE TABLE IF NOT EXISTS config (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS credentials (
    system TEXT PRIMARY KEY,
    server TEXT,
    database TEXT,
    username TEXT,
    password TEXT
);
CREATE TABLE IF NOT EXISTS scheduler_jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_name TEXT NOT NULL UNIQUE,
    job_kind TEXT NOT NULL,
    interval_minutes INTEGER NOT NULL CHECK (interval_minutes > 0),
    enabled BOOLEAN NOT NULL CHECK (enabled IN (0, 1)),
    last_run TEXT,
    last_status TEXT,
    last_run_log TEXT
);
";

/// Tables filled by the Sage sync.
pub const SALES_TABLES: &str = "
CREATE TABLE IF NOT EXISTS Customer (
    CustomerNo TEXT PRIMARY KEY,
    CustomerName TEXT
);
CREATE TABLE IF NOT EXISTS SalesOrderHeader (
    SalesOrderNo TEXT PRIMARY KEY, OrderDate TEXT, OrderStatus TEXT, CustomerNo TEXT,
    CustomerPONo TEXT, ShipToName TEXT, ShipToAddress1 TEXT, ShipToCity TEXT,
    ShipToState TEXT, ShipToZipCode TEXT, ShipVia TEXT,
    BillToName TEXT, BillToAddress1 TEXT, BillToCity TEXT, BillToState TEXT, BillToZipCode TEXT,
    FOREIGN KEY (CustomerNo) REFERENCES Customer (CustomerNo)
);
CREATE TABLE IF NOT EXISTS SalesOrderDetail (
    SalesOrderNo TEXT, LineKey TEXT, ItemCode TEXT, ItemCodeDesc TEXT,
    QuantityOrdered REAL, QuantityShipped REAL, UnitPrice REAL, ExtensionAmt REAL, CommentText TEXT,
    PRIMARY KEY (SalesOrderNo, LineKey),
    FOREIGN KEY (SalesOrderNo) REFERENCES SalesOrderHeader (SalesOrderNo)
);
CREATE TABLE IF NOT EXISTS CI_Item (
    ItemCode TEXT PRIMARY KEY,
    ItemCodeDesc TEXT,
    ProductLine TEXT,
    ProductType TEXT,
    SalesUnitOfMeasure TEXT
);
";

/// Quality-control and operations tables maintained from the dashboard.
pub const OPERATIONS_TABLES: &str = "
CREATE TABLE IF NOT EXISTS Sample (
    SampleID INTEGER PRIMARY KEY AUTOINCREMENT,
    Name TEXT UNIQUE NOT NULL
);
CREATE TABLE IF NOT EXISTS SieveTest (
    SieveTestID INTEGER PRIMARY KEY AUTOINCREMENT, SieveTestDate TEXT NOT NULL,
    CarorTruckNumber TEXT, BillofLading TEXT, SampleID INTEGER,
    InternalTest INTEGER DEFAULT 0, Selected4Avg INTEGER DEFAULT 1, StoredAFS REAL,
    FOREIGN KEY (SampleID) REFERENCES Sample (SampleID)
);
CREATE TABLE IF NOT EXISTS SieveTestDetail (
    SieveTestID INTEGER, USSieve INTEGER, Weight REAL, SpecLow REAL, SpecHigh REAL,
    PRIMARY KEY (SieveTestID, USSieve),
    FOREIGN KEY (SieveTestID) REFERENCES SieveTest (SieveTestID)
);
CREATE TABLE IF NOT EXISTS SieveDefaults (
    USSieve INTEGER PRIMARY KEY NOT NULL
);
CREATE TABLE IF NOT EXISTS OPEvent (
    OpEventID INTEGER PRIMARY KEY AUTOINCREMENT, OPEventItemID INTEGER,
    OpEventItemOperationID INTEGER NOT NULL, OPEventTime TEXT NOT NULL,
    OpEventNumber REAL NOT NULL, OPEventDesc TEXT, OPEventCodeID INTEGER NOT NULL,
    OpEventPlantUpTime TEXT, EmployeeID INTEGER
);
";

/// Name and interval of the job registered on setup.
pub const DEFAULT_SYNC_JOB_NAME: &str = "Sync Sage 100 Data";
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 1440;
