//! Placeholder styles and bound values.

use chrono::NaiveDate;
use querycraft::prelude::*;
use querycraft::sql::param::Parameterizer;

fn filtered() -> QueryBuilder {
    Query::from_("users")
        .select(["id"])
        .unwrap()
        .where_(Term::field("age").gt(18))
        .where_(Term::field("role").isin(["admin", "staff"]))
        .limit(5)
}

fn filtered_values() -> Vec<Value> {
    vec![
        Value::Int(18),
        Value::Str("admin".into()),
        Value::Str("staff".into()),
    ]
}

#[test]
fn test_positional_styles() {
    let cases = [
        (
            ParamStyle::Qmark,
            "SELECT \"id\" FROM \"users\" WHERE \"age\">? AND \"role\" IN (?,?) LIMIT 5",
        ),
        (
            ParamStyle::Numeric,
            "SELECT \"id\" FROM \"users\" WHERE \"age\">:1 AND \"role\" IN (:2,:3) LIMIT 5",
        ),
        (
            ParamStyle::Dollar,
            "SELECT \"id\" FROM \"users\" WHERE \"age\">$1 AND \"role\" IN ($2,$3) LIMIT 5",
        ),
        (
            ParamStyle::Format,
            "SELECT \"id\" FROM \"users\" WHERE \"age\">%s AND \"role\" IN (%s,%s) LIMIT 5",
        ),
    ];

    for (style, expected) in cases {
        let (sql, params) = filtered().to_parameterized(style).unwrap();
        assert_eq!(sql, expected, "style {}", style);
        assert_eq!(params, BoundParams::Positional(filtered_values()));
    }
}

#[test]
fn test_named_styles() {
    let (sql, params) = filtered().to_parameterized(ParamStyle::Named).unwrap();
    assert_eq!(
        sql,
        "SELECT \"id\" FROM \"users\" WHERE \"age\">:param1 AND \"role\" IN (:param2,:param3) LIMIT 5"
    );
    assert_eq!(params.get("param1"), Some(&Value::Int(18)));
    assert_eq!(params.get("param3"), Some(&Value::Str("staff".into())));

    let (sql, params) = filtered().to_parameterized(ParamStyle::Pyformat).unwrap();
    assert_eq!(
        sql,
        "SELECT \"id\" FROM \"users\" WHERE \"age\">%(param1)s AND \"role\" IN (%(param2)s,%(param3)s) LIMIT 5"
    );
    assert_eq!(params.values(), filtered_values().iter().collect::<Vec<_>>());
}

#[test]
fn test_bound_names_are_reused() {
    let window = Term::field("starts").gte(Term::bind("day", "2024-01-01"))
        | Term::field("ends").gte(Term::bind("day", "2024-01-01"));
    let q = Query::from_("events").select(["id"]).unwrap().where_(window);

    let (sql, params) = q.to_parameterized(ParamStyle::Named).unwrap();
    assert_eq!(
        sql,
        "SELECT \"id\" FROM \"events\" WHERE \"starts\">=:day OR \"ends\">=:day"
    );
    assert_eq!(
        params,
        BoundParams::Named(vec![("day".into(), Value::Str("2024-01-01".into()))])
    );

    // Positional styles bind once per occurrence
    let (sql, params) = q.to_parameterized(ParamStyle::Qmark).unwrap();
    assert_eq!(
        sql,
        "SELECT \"id\" FROM \"events\" WHERE \"starts\">=? OR \"ends\">=?"
    );
    assert_eq!(params.len(), 2);
}

#[test]
fn test_generated_names_avoid_bound_names() {
    let q = Query::from_("t")
        .select(["id"])
        .unwrap()
        .where_(Term::field("a").eq(Term::bind("param2", 100)))
        .where_(Term::field("b").eq(5));

    let (sql, params) = q.to_parameterized(ParamStyle::Named).unwrap();
    assert_eq!(
        sql,
        "SELECT \"id\" FROM \"t\" WHERE \"a\"=:param2 AND \"b\"=:param3"
    );
    assert_eq!(
        params,
        BoundParams::Named(vec![
            ("param2".into(), Value::Int(100)),
            ("param3".into(), Value::Int(5)),
        ])
    );
}

#[test]
fn test_conflicting_bound_values_are_rejected() {
    let q = Query::from_("t")
        .select(["id"])
        .unwrap()
        .where_(Term::field("a").eq(Term::bind("id", 1)))
        .where_(Term::field("b").eq(Term::bind("id", 2)));

    for style in [ParamStyle::Named, ParamStyle::Pyformat] {
        let err = q.to_parameterized(style).unwrap_err();
        assert!(matches!(err, QueryError::Configuration(_)), "style {}", style);
    }

    let (sql, params) = q.to_parameterized(ParamStyle::Dollar).unwrap();
    assert_eq!(sql, "SELECT \"id\" FROM \"t\" WHERE \"a\"=$1 AND \"b\"=$2");
    assert_eq!(params, BoundParams::Positional(vec![Value::Int(1), Value::Int(2)]));
}

#[test]
fn test_bind_renders_inline_without_parameterizer() {
    let c = Term::field("id").eq(Term::bind("id", 7));
    assert_eq!(c.get_sql().unwrap(), "\"id\"=7");
}

#[test]
fn test_numbering_continues_into_subqueries() {
    let recent = Query::from_("orders")
        .select(["customer_id"])
        .unwrap()
        .where_(Term::field("placed").gt(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
    let q = Dialect::Postgres
        .query()
        .from_("customers")
        .select(["name"])
        .unwrap()
        .where_(Term::field("country").eq("NZ"))
        .where_(Term::field("id").isin(recent));

    let mut params = Parameterizer::new(ParamStyle::Dollar);
    let sql = q
        .get_parameterized_sql(&RenderOptions::new(), &mut params)
        .unwrap();
    assert_eq!(
        sql,
        "SELECT \"name\" FROM \"customers\" WHERE \"country\"=$1 AND \"id\" IN (SELECT \"customer_id\" FROM \"orders\" WHERE \"placed\">$2)"
    );
    assert_eq!(
        params.into_params(),
        BoundParams::Positional(vec![
            Value::Str("NZ".into()),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
        ])
    );
}

#[test]
fn test_numbering_continues_through_joined_subqueries() {
    let low = Query::from_("a").select(["x"]).unwrap().where_(Term::field("x").gt(1));
    let high = Query::from_("b").select(["x"]).unwrap().where_(Term::field("x").gt(2));
    let q = Query::from_(low.clone())
        .join(high.clone())
        .on(low.field("x").eq(high.field("x")))
        .unwrap()
        .select([low.field("x"), Term::from(9).as_("nine")])
        .unwrap()
        .where_(high.field("x").lt(3));

    let (sql, params) = q.to_parameterized(ParamStyle::Dollar).unwrap();
    assert_eq!(
        sql,
        "SELECT \"sq0\".\"x\",$1 \"nine\" FROM (SELECT \"x\" FROM \"a\" WHERE \"x\">$2) \"sq0\" JOIN (SELECT \"x\" FROM \"b\" WHERE \"x\">$3) \"sq1\" ON \"sq0\".\"x\"=\"sq1\".\"x\" WHERE \"sq1\".\"x\"<$4"
    );
    assert_eq!(
        params,
        BoundParams::Positional(vec![Value::Int(9), Value::Int(1), Value::Int(2), Value::Int(3)])
    );
}

#[test]
fn test_update_and_explicit_placeholders() {
    let q = Query::update("accounts")
        .set("balance", Term::param("%(amount)s"))
        .set("active", true)
        .where_(Term::field("id").eq(3));
    let (sql, params) = q.to_parameterized(ParamStyle::Pyformat).unwrap();
    assert_eq!(
        sql,
        "UPDATE \"accounts\" SET \"balance\"=%(amount)s,\"active\"=%(param1)s WHERE \"id\"=%(param2)s"
    );
    assert_eq!(params.get("param1"), Some(&Value::Bool(true)));
    assert_eq!(params.get("param2"), Some(&Value::Int(3)));
}

#[test]
fn test_style_names_parse() {
    assert_eq!("qmark".parse::<ParamStyle>().unwrap(), ParamStyle::Qmark);
    assert_eq!("pyformat".parse::<ParamStyle>().unwrap(), ParamStyle::Pyformat);
    assert!(ParamStyle::Named.is_named());
    assert!(!ParamStyle::Dollar.is_named());
}
