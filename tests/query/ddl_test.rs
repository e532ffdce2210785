//! CREATE TABLE and DROP statements through the public builder API.

use insta::assert_snapshot;
use querycraft::prelude::*;
use querycraft::sql::ddl::ReferenceOption;

#[test]
fn test_create_table_with_constraints() {
    let stmt = Dialect::Postgres
        .create_table(Table::new("users").in_schema(["app"]))
        .if_not_exists()
        .columns([
            Column::new("id").data_type(DataType::Int64).nullable(false),
            Column::new("email").data_type(DataType::Varchar(Some(255))).nullable(false),
            Column::new("status").data_type(DataType::String).default("active"),
            Column::new("org_id").data_type(DataType::Int64),
        ])
        .unwrap()
        .primary_key(["id"])
        .unwrap()
        .unique(["email"])
        .foreign_key(
            ["org_id"],
            Table::new("orgs").in_schema(["app"]),
            ["id"],
            Some(ReferenceOption::Cascade),
            None,
        )
        .unwrap();

    assert_snapshot!(
        stmt.get_sql().unwrap(),
        @r#"CREATE TABLE IF NOT EXISTS "app"."users" ("id" BIGINT NOT NULL,"email" VARCHAR(255) NOT NULL,"status" TEXT DEFAULT 'active',"org_id" BIGINT,UNIQUE ("email"),PRIMARY KEY ("id"),FOREIGN KEY ("org_id") REFERENCES "app"."orgs" ("id") ON DELETE CASCADE)"#
    );
}

#[test]
fn test_column_types_follow_dialect() {
    let columns = [
        ("id", DataType::Uuid),
        ("flag", DataType::Bool),
        ("body", DataType::String),
    ];

    let mssql = Dialect::MsSql.create_table("docs").columns(columns.clone()).unwrap();
    assert_eq!(
        mssql.get_sql().unwrap(),
        "CREATE TABLE \"docs\" (\"id\" UNIQUEIDENTIFIER,\"flag\" BIT,\"body\" NVARCHAR(MAX))"
    );

    let mysql = Dialect::MySql.create_table("docs").columns(columns.clone()).unwrap();
    assert_eq!(
        mysql.get_sql().unwrap(),
        "CREATE TABLE `docs` (`id` CHAR(36),`flag` TINYINT(1),`body` TEXT)"
    );

    let sqlite = Dialect::Sqlite.create_table("docs").columns(columns).unwrap();
    assert_eq!(
        sqlite.get_sql().unwrap(),
        "CREATE TABLE \"docs\" (\"id\" TEXT,\"flag\" INTEGER,\"body\" TEXT)"
    );
}

#[test]
fn test_create_table_as_select() {
    let recent = Query::from_("orders")
        .select(["id", "amount"])
        .unwrap()
        .where_(Term::field("amount").gt(100));
    let stmt = Query::create_table("big_orders").temporary().as_select(recent).unwrap();
    assert_eq!(
        stmt.get_sql().unwrap(),
        "CREATE TEMPORARY TABLE \"big_orders\" AS (SELECT \"id\",\"amount\" FROM \"orders\" WHERE \"amount\">100)"
    );
}

#[test]
fn test_create_table_rejects_conflicting_parts() {
    let err = Query::create_table("t")
        .columns(["a"])
        .unwrap()
        .foreign_key(["a"], "u", ["id"], None, None)
        .unwrap()
        .foreign_key(["a"], "v", ["id"], None, None)
        .unwrap_err();
    assert!(matches!(err, QueryError::Configuration(_)));

    let err = Query::create_table("t")
        .as_select(Query::from_("u").select(["a"]).unwrap())
        .unwrap()
        .columns(["a"])
        .unwrap_err();
    assert!(matches!(err, QueryError::Configuration(_)));
}

#[test]
fn test_drop_statements() {
    assert_eq!(
        Dialect::Postgres.drop_table("old").if_exists().get_sql().unwrap(),
        "DROP TABLE IF EXISTS \"old\""
    );
    assert_eq!(
        Query::drop_view("report_v").if_exists().get_sql().unwrap(),
        "DROP VIEW IF EXISTS \"report_v\""
    );
    assert_eq!(
        Query::drop_table(Table::new("t").in_schema(["s"])).get_sql().unwrap(),
        "DROP TABLE \"s\".\"t\""
    );

    let opts = RenderOptions::new().dialect(Dialect::MySql);
    assert_eq!(
        Query::drop_database("shop").get_sql_with(&opts).unwrap(),
        "DROP DATABASE `shop`"
    );
}
