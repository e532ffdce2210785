//! Expressions, criteria and functions rendered on their own.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use querycraft::prelude::*;
use querycraft::sql::functions::{avg, coalesce, count, date_add, extract, lag, sum, upper};

fn f(name: &str) -> Term {
    Term::field(name)
}

fn sql(t: impl Into<Term>) -> String {
    t.into().get_sql().unwrap()
}

fn pg(c: impl Render) -> String {
    c.get_sql_with(&RenderOptions::new().dialect(Dialect::Postgres)).unwrap()
}

#[test]
fn test_arithmetic_keeps_needed_parens() {
    let net = (f("price") - f("discount")) * f("qty");
    assert_eq!(sql(net), "(\"price\"-\"discount\")*\"qty\"");

    let ratio = f("a") / (f("b") + 1);
    assert_eq!(sql(ratio), "\"a\"/(\"b\"+1)");

    assert_eq!(sql(100 - f("pct")), "100-\"pct\"");
    assert_eq!(sql(f("n") % 7), "MOD(\"n\",7)");
}

#[test]
fn test_criteria_combine() {
    let adult = f("age").gte(18);
    let local = f("country").isin(["NZ", "AU"]);
    let banned = f("banned").eq(true);

    assert_eq!(
        sql(adult.clone() & (local.clone() | !banned.clone())),
        "\"age\">=18 AND (\"country\" IN ('NZ','AU') OR NOT \"banned\"=true)"
    );
    assert_eq!(
        sql(Criterion::all([adult, local, banned])),
        "\"age\">=18 AND \"country\" IN ('NZ','AU') AND \"banned\"=true"
    );
}

#[test]
fn test_null_handling() {
    assert_eq!(sql(f("deleted_at").is_null()), "\"deleted_at\" IS NULL");
    assert_eq!(sql(f("status").ne("x")), "\"status\"<>'x' OR \"status\" IS NULL");
    assert_eq!(sql(f("status").ne_strict("x")), "\"status\"<>'x'");

    let err = f("status").eq(Term::null()).get_sql().unwrap_err();
    assert!(matches!(err, QueryError::Usage(_)));

    // The check also runs when the comparison sits inside a statement
    let q = Query::from_("t")
        .select(["id"])
        .unwrap()
        .where_(f("a").gt(1) & f("status").ne(Term::null()));
    assert!(matches!(q.get_sql().unwrap_err(), QueryError::Usage(_)));
    assert!(matches!(
        q.to_parameterized(ParamStyle::Qmark).unwrap_err(),
        QueryError::Usage(_)
    ));
}

#[test]
fn test_ranges_and_patterns() {
    assert_eq!(sql(f("score").between(1, 5)), "\"score\" BETWEEN 1 AND 5");
    assert_eq!(sql(f("score").get_item(1..5).unwrap()), "\"score\" BETWEEN 1 AND 5");
    assert_eq!(sql(f("name").like("J%")), "\"name\" LIKE 'J%'");
    assert_eq!(sql(f("tags").isin(Vec::<&str>::new())), "1=0");
}

#[test]
fn test_functions() {
    assert_eq!(sql(count("*").as_("n")), "COUNT(*)");
    assert_eq!(sql(count(f("user_id")).distinct().unwrap()), "COUNT(DISTINCT \"user_id\")");
    assert_eq!(sql(upper(coalesce([f("nick"), f("name")]))), "UPPER(COALESCE(\"nick\",\"name\"))");
    assert_eq!(sql(avg(f("a")) + 1), "AVG(\"a\")+1");
    assert_eq!(
        sql(functions::cast(f("price"), DataType::Decimal(10, 2))),
        "CAST(\"price\" AS DECIMAL(10,2))"
    );
}

#[test]
fn test_custom_and_registry_functions() {
    let distance = CustomFunction::new("DISTANCE", ["a", "b"]);
    let t = distance.call(vec![f("from_pt"), f("to_pt")]).unwrap();
    assert_eq!(sql(t), "DISTANCE(\"from_pt\",\"to_pt\")");
    assert!(distance.call(vec![f("x")]).is_err());

    let t = functions::call("max", vec![f("v")]).unwrap();
    assert_eq!(sql(t), "MAX(\"v\")");
    assert!(matches!(
        functions::call("frobnicate", vec![]).unwrap_err(),
        QueryError::UnknownFunction(_)
    ));
}

#[test]
fn test_conditional_aggregate() {
    let paid = sum(
        Case::new()
            .when(f("status").eq("paid"), f("amount"))
            .else_(0),
    );
    assert_eq!(
        sql(paid.clone()),
        "SUM(CASE WHEN \"status\"='paid' THEN \"amount\" ELSE 0 END)"
    );
    assert_eq!(paid.is_aggregate(), Some(true));

    let filtered = sum(f("amount")).filter_where(f("status").eq("paid")).unwrap();
    assert_eq!(sql(filtered), "SUM(\"amount\") FILTER(WHERE \"status\"='paid')");
}

#[test]
fn test_windows() {
    let running = sum(f("amount"))
        .over()
        .partition_by([f("account")])
        .orderby(f("ts"), None)
        .rows(FrameBound::UnboundedPreceding, FrameBound::CurrentRow)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(
        sql(running),
        "SUM(\"amount\") OVER(PARTITION BY \"account\" ORDER BY \"ts\" ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW)"
    );

    let previous = lag(f("price"), Some(1), Some(Term::from(0)))
        .over()
        .orderby(f("day"), Order::Asc)
        .build()
        .unwrap();
    assert_eq!(sql(previous), "LAG(\"price\",1,0) OVER(ORDER BY \"day\" ASC)");
}

#[test]
fn test_dates_and_intervals() {
    let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(sql(f("d").eq(day)), "\"d\"='2024-02-29'");

    let moment: NaiveDateTime = day.and_hms_opt(13, 5, 0).unwrap();
    assert_eq!(sql(f("ts").lt(moment)), "\"ts\"<'2024-02-29T13:05:00'");

    let utc = Utc.with_ymd_and_hms(2024, 2, 29, 13, 5, 0).unwrap();
    assert_eq!(sql(f("ts").gte(utc)), "\"ts\">='2024-02-29T13:05:00+00:00'");

    assert_eq!(
        sql(f("created") + Interval::new().days(7)),
        "\"created\"+INTERVAL '7 DAY'"
    );
    assert_eq!(sql(date_add(DatePart::Month, 1, f("d"))), "DATE_ADD(MONTH,1,\"d\")");
    assert_eq!(sql(extract(DatePart::Year, f("d"))), "EXTRACT(YEAR FROM \"d\")");
}

#[test]
fn test_json_operators_on_postgres() {
    let doc = f("doc");
    assert_eq!(pg(doc.clone().get_text_value("name").eq("ann")), "\"doc\"->>'name'='ann'");
    assert_eq!(pg(doc.clone().has_any_keys(["a", "b"])), "\"doc\"?|ARRAY['a','b']");
    assert_eq!(
        pg(doc.clone().contains(serde_json::json!({"tier": "gold"}))),
        "\"doc\"@>'{\"tier\":\"gold\"}'"
    );

    let err = doc
        .has_key("a")
        .get_sql_with(&RenderOptions::new().dialect(Dialect::Sqlite))
        .unwrap_err();
    assert!(matches!(err, QueryError::Unsupported { .. }));
}

#[test]
fn test_named_filters() {
    let c = f("body").filter("search", "rust").unwrap();
    assert_eq!(pg(c), "TO_TSVECTOR(\"body\") @@ PLAINTO_TSQUERY('rust')");
    assert!(matches!(
        f("a").filter("fuzzy", 1).unwrap_err(),
        QueryError::UnknownFilter(_)
    ));
}
