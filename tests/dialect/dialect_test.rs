//! One builder rendered for every dialect.

use chrono::NaiveDate;
use querycraft::config::Settings;
use querycraft::prelude::*;

fn users_page() -> QueryBuilder {
    Query::from_("users")
        .select(["id", "name"])
        .unwrap()
        .where_(Term::field("active").eq(true))
        .orderby(["name"], Order::Asc)
        .limit(10)
        .offset(20)
}

fn render(q: &QueryBuilder, dialect: Dialect) -> String {
    q.get_sql_with(&RenderOptions::new().dialect(dialect)).unwrap()
}

#[test]
fn test_paginated_select_per_dialect() {
    let q = users_page();
    let cases = [
        (
            Dialect::Ansi,
            "SELECT \"id\",\"name\" FROM \"users\" WHERE \"active\"=true ORDER BY \"name\" ASC LIMIT 10 OFFSET 20",
        ),
        (
            Dialect::Postgres,
            "SELECT \"id\",\"name\" FROM \"users\" WHERE \"active\"=true ORDER BY \"name\" ASC LIMIT 10 OFFSET 20",
        ),
        (
            Dialect::Redshift,
            "SELECT \"id\",\"name\" FROM \"users\" WHERE \"active\"=true ORDER BY \"name\" ASC LIMIT 10 OFFSET 20",
        ),
        (
            Dialect::MySql,
            "SELECT `id`,`name` FROM `users` WHERE `active`=true ORDER BY `name` ASC LIMIT 10 OFFSET 20",
        ),
        (
            Dialect::Sqlite,
            "SELECT \"id\",\"name\" FROM \"users\" WHERE \"active\"=1 ORDER BY \"name\" ASC LIMIT 10 OFFSET 20",
        ),
        (
            Dialect::MsSql,
            "SELECT \"id\",\"name\" FROM \"users\" WHERE \"active\"=1 ORDER BY \"name\" ASC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY",
        ),
        (
            Dialect::Oracle,
            "SELECT id,name FROM users WHERE active=1 ORDER BY name ASC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY",
        ),
    ];

    for (dialect, expected) in cases {
        assert_eq!(render(&q, dialect), expected, "dialect {}", dialect);
    }
}

#[test]
fn test_offset_without_limit() {
    let q = Query::from_("t").select(["a"]).unwrap().offset(5);
    assert_eq!(
        render(&q, Dialect::MySql),
        "SELECT `a` FROM `t` LIMIT 18446744073709551615 OFFSET 5"
    );
    assert_eq!(
        render(&q, Dialect::Sqlite),
        "SELECT \"a\" FROM \"t\" LIMIT -1 OFFSET 5"
    );
    assert_eq!(render(&q, Dialect::Postgres), "SELECT \"a\" FROM \"t\" OFFSET 5");
}

#[test]
fn test_builder_dialect_is_the_default() {
    let q = Dialect::MySql.query().from_("t").select(["a"]).unwrap();
    assert_eq!(q.dialect(), Dialect::MySql);
    assert_eq!(q.get_sql().unwrap(), "SELECT `a` FROM `t`");

    // Explicit options win over the builder's own dialect
    assert_eq!(render(&q, Dialect::Postgres), "SELECT \"a\" FROM \"t\"");
}

#[test]
fn test_set_operations_wrap_per_dialect() {
    let a = Query::from_("a").select(["x"]).unwrap();
    let b = Query::from_("b").select(["x"]).unwrap();
    let union = a.union(b);

    let pg = union
        .get_sql_with(&RenderOptions::new().dialect(Dialect::Postgres))
        .unwrap();
    assert_eq!(pg, "(SELECT \"x\" FROM \"a\") UNION (SELECT \"x\" FROM \"b\")");

    let sqlite = union
        .get_sql_with(&RenderOptions::new().dialect(Dialect::Sqlite))
        .unwrap();
    assert_eq!(sqlite, "SELECT \"x\" FROM \"a\" UNION SELECT \"x\" FROM \"b\"");
}

#[test]
fn test_case_insensitive_match() {
    let c = Term::field("name").ilike("a%");
    assert_eq!(
        c.get_sql_with(&RenderOptions::new().dialect(Dialect::Postgres)).unwrap(),
        "\"name\" ILIKE 'a%'"
    );
    assert_eq!(
        c.get_sql_with(&RenderOptions::new().dialect(Dialect::MySql)).unwrap(),
        "UPPER(CAST(`name` AS CHAR)) LIKE UPPER('a%')"
    );
}

#[test]
fn test_regex_support_differs() {
    let c = Term::field("code").regexp("^A");
    assert_eq!(
        c.get_sql_with(&RenderOptions::new().dialect(Dialect::Oracle)).unwrap(),
        "REGEXP_LIKE(code,'^A')"
    );
    let err = c
        .get_sql_with(&RenderOptions::new().dialect(Dialect::MsSql))
        .unwrap_err();
    assert!(matches!(err, QueryError::Unsupported { .. }));
}

#[test]
fn test_literal_encoding() {
    let q = Query::from_("t")
        .select(["a"])
        .unwrap()
        .where_(Term::field("city").eq("café"))
        .where_(Term::field("day").eq(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));

    assert_eq!(
        render(&q, Dialect::MsSql),
        "SELECT \"a\" FROM \"t\" WHERE \"city\"=N'café' AND \"day\"='2024-03-01'"
    );
    assert_eq!(
        render(&q, Dialect::Postgres),
        "SELECT \"a\" FROM \"t\" WHERE \"city\"='café' AND \"day\"='2024-03-01'"
    );
}

#[test]
fn test_function_names_follow_dialect() {
    let t = functions::length(Term::field("name"));
    let mssql = RenderOptions::new().dialect(Dialect::MsSql);
    assert_eq!(t.get_sql_with(&mssql).unwrap(), "LEN(\"name\")");
    assert_eq!(t.get_sql().unwrap(), "LENGTH(\"name\")");
}

#[test]
fn test_dialect_names_parse() {
    assert_eq!("pg".parse::<Dialect>().unwrap(), Dialect::Postgres);
    assert_eq!("TSQL".parse::<Dialect>().unwrap(), Dialect::MsSql);
    assert_eq!("mariadb".parse::<Dialect>().unwrap(), Dialect::MySql);
    assert!("cobol".parse::<Dialect>().is_err());

    for dialect in Dialect::all() {
        assert_eq!(dialect.to_string().parse::<Dialect>().unwrap(), dialect);
    }
}

#[test]
fn test_settings_drive_rendering() {
    let settings = Settings::from_toml_str(
        r#"
[render]
dialect = "postgres"
as_keyword = true
with_namespace = true
"#,
    )
    .unwrap();

    let users = Table::new("users");
    let q = settings
        .query()
        .unwrap()
        .from_(users.clone())
        .select([users.field("name").as_("n")])
        .unwrap();
    let sql = q.get_sql_with(&settings.render_options().unwrap()).unwrap();
    assert_eq!(sql, "SELECT \"users\".\"name\" AS \"n\" FROM \"users\"");
}
