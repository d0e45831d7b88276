//! DDL, appends, scans and interruption through a connection.

use strata_common::config::DatabaseConfig;
use strata_common::{ErrorCode, StrataError};
use strata_exec::catalog::TableDescription;
use strata_exec::chunk::DataChunk;
use strata_exec::connection::{Connection, Database};
use strata_exec::expression::parsed::{col, func, lit};
use strata_exec::logical::{
    ColumnDefinition, CreateIndexInfo, CreateInfo, CreateSequenceInfo, CreateTableInfo,
    CreateViewInfo, LogicalPlanBuilder,
};
use strata_exec::types::{LogicalType, Value};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("k", LogicalType::Integer),
        ColumnDefinition::new("l", LogicalType::list(LogicalType::Integer)),
    ]
}

fn ints(values: &[i32]) -> Value {
    Value::list(values.iter().map(|v| Value::Integer(*v)))
}

fn run_ddl(conn: &Connection, info: CreateInfo) {
    let result = conn.query(&LogicalPlanBuilder::create(info).build());
    assert!(result.is_success(), "{result}");
    assert_eq!(result.row_count(), 0);
}

fn setup() -> (Database, Connection) {
    init_tracing();
    let db = Database::open(DatabaseConfig::for_testing()).unwrap();
    let conn = db.connect();
    run_ddl(&conn, CreateInfo::Table(CreateTableInfo::new("t", columns())));
    (db, conn)
}

#[test]
fn test_append_insert_and_scan() {
    let (_db, conn) = setup();
    let description = conn.table_info("main", "t").unwrap();
    assert_eq!(description, TableDescription::new("main", "t", columns()));

    let chunk = DataChunk::from_rows(
        &description.types(),
        &[
            vec![Value::Integer(1), ints(&[1, 2])],
            vec![Value::Integer(2), Value::Null],
        ],
    )
    .unwrap();
    conn.append(&description, &chunk).unwrap();

    let insert = LogicalPlanBuilder::values(&["k", "l"], vec![vec![lit(3), lit(ints(&[6]))]])
        .unwrap()
        .insert_into("main", "t", &description.columns)
        .unwrap()
        .build();
    let inserted = conn.query(&insert);
    assert_eq!(inserted.column_values(0), vec![Value::BigInt(1)]);

    let plan = conn
        .table("t")
        .unwrap()
        .select(vec![col("k"), func("unnest", vec![col("l")])])
        .unwrap()
        .build();
    assert_eq!(
        conn.query(&plan).rows(),
        vec![
            vec![Value::Integer(1), Value::Integer(1)],
            vec![Value::Integer(1), Value::Integer(2)],
            vec![Value::Integer(2), Value::Null],
            vec![Value::Integer(3), Value::Integer(6)],
        ]
    );
}

#[test]
fn test_view_and_sequence() {
    let (_db, conn) = setup();
    let description = conn.table_info("main", "t").unwrap();
    let chunk = DataChunk::from_rows(
        &description.types(),
        &[
            vec![Value::Integer(1), ints(&[1])],
            vec![Value::Integer(1), ints(&[2])],
        ],
    )
    .unwrap();
    conn.append(&description, &chunk).unwrap();

    let body = conn
        .table("t")
        .unwrap()
        .aggregate(vec![col("k")], vec![func("count", vec![col("l")]).alias("n")])
        .unwrap()
        .build();
    run_ddl(
        &conn,
        CreateInfo::View(CreateViewInfo {
            schema: "main".to_string(),
            name: "v".to_string(),
            query: body,
        }),
    );
    let view = conn.view("v").unwrap().build();
    assert_eq!(
        conn.query(&view).rows(),
        vec![vec![Value::Integer(1), Value::BigInt(2)]]
    );

    let mut sequence = CreateSequenceInfo::new("seq");
    sequence.start = 10;
    sequence.increment = 5;
    run_ddl(&conn, CreateInfo::Sequence(sequence));
    assert_eq!(conn.next_sequence_value("seq").unwrap(), 10);
    assert_eq!(conn.next_sequence_value("seq").unwrap(), 15);
}

#[test]
fn test_catalog_errors() {
    let (_db, conn) = setup();
    let again = conn.query(
        &LogicalPlanBuilder::create(CreateInfo::Table(CreateTableInfo::new("T", columns()))).build(),
    );
    assert!(!again.is_success());
    assert!(again.error().unwrap().contains("already exists"));

    let index = CreateIndexInfo {
        schema: "main".to_string(),
        table: "t".to_string(),
        name: "t_missing".to_string(),
        columns: vec!["missing".to_string()],
        unique: false,
    };
    let failed = conn.query(&LogicalPlanBuilder::create(CreateInfo::Index(index)).build());
    assert!(!failed.is_success());

    assert!(matches!(
        conn.table("nope"),
        Err(StrataError::CatalogEntryNotFound { .. })
    ));
}

#[test]
fn test_append_rejects_wrong_chunk() {
    let (_db, conn) = setup();
    let description = conn.table_info("main", "t").unwrap();
    let chunk =
        DataChunk::from_rows(&[LogicalType::Varchar], &[vec![Value::varchar("x")]]).unwrap();
    let err = conn.append(&description, &chunk).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn test_interrupt_from_another_thread() {
    let (db, conn) = setup();
    let description = conn.table_info("main", "t").unwrap();
    let rows: Vec<Vec<Value>> = (0..4).map(|i| vec![Value::Integer(i), ints(&[i])]).collect();
    let chunk = DataChunk::from_rows(&description.types(), &rows).unwrap();
    for _ in 0..3 {
        conn.append(&description, &chunk).unwrap();
    }

    let plan = conn.table("t").unwrap().build();
    let mut stream = conn.send_query(&plan).unwrap();
    assert!(stream.fetch().unwrap().is_some());

    let handle = conn.interrupt_handle();
    std::thread::spawn(move || handle.interrupt())
        .join()
        .unwrap();
    assert!(matches!(stream.fetch(), Err(StrataError::Interrupted)));

    // A second connection has its own interrupt flag.
    let other = db.connect();
    assert_eq!(other.query(&plan).row_count(), 12);
}
