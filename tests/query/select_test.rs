//! SELECT statements through the public builder API.

use insta::assert_snapshot;
use querycraft::prelude::*;
use querycraft::sql::query::LockWait;

fn sql(q: &QueryBuilder) -> String {
    q.get_sql().unwrap()
}

#[test]
fn test_select_filter_order_page() {
    let customers = Table::new("customers");
    let q = Query::from_(customers.clone())
        .select([customers.field("id"), customers.field("fname"), customers.field("lname")])
        .unwrap()
        .where_(customers.field("age").gte(18))
        .where_(customers.field("lname").like("Mc%"))
        .orderby(["lname"], Order::Asc)
        .limit(20)
        .offset(40);

    assert_snapshot!(
        sql(&q),
        @r#"SELECT "id","fname","lname" FROM "customers" WHERE "age">=18 AND "lname" LIKE 'Mc%' ORDER BY "lname" ASC LIMIT 20 OFFSET 40"#
    );
}

#[test]
fn test_table_shortcut_and_schema() {
    let t = Table::new("orders").in_schema(["sales"]);
    let q = t.select(["id"]).unwrap();
    assert_eq!(sql(&q), "SELECT \"id\" FROM \"sales\".\"orders\"");
}

#[test]
fn test_aliased_table_qualifies_fields() {
    let t = Table::new("customers").as_("c");
    let q = Query::from_(t.clone()).select([t.field("id")]).unwrap();
    assert_eq!(sql(&q), "SELECT \"c\".\"id\" FROM \"customers\" \"c\"");
}

#[test]
fn test_aggregate_report() {
    let orders = Table::new("orders");
    let total = functions::sum(orders.field("amount")).as_("total");
    let q = Query::from_(orders.clone())
        .select([orders.field("customer_id"), total.clone(), functions::count("*").as_("n")])
        .unwrap()
        .groupby([orders.field("customer_id")])
        .having(functions::sum(orders.field("amount")).gt(100))
        .orderby([total], Order::Desc);

    assert_snapshot!(
        sql(&q),
        @r#"SELECT "customer_id",SUM("amount") "total",COUNT(*) "n" FROM "orders" GROUP BY "customer_id" HAVING SUM("amount")>100 ORDER BY "total" DESC"#
    );
}

#[test]
fn test_orderby_alias_can_be_disabled() {
    let total = functions::sum(Term::field("amount")).as_("total");
    let q = Query::from_("orders")
        .select([total.clone()])
        .unwrap()
        .orderby([total], Order::Desc);
    let opts = RenderOptions::new().orderby_alias(false);
    assert_eq!(
        q.get_sql_with(&opts).unwrap(),
        "SELECT SUM(\"amount\") \"total\" FROM \"orders\" ORDER BY SUM(\"amount\") DESC"
    );
}

#[test]
fn test_as_keyword_option() {
    let q = Query::from_("abc")
        .select([Term::field("foo").as_("f")])
        .unwrap();
    let opts = RenderOptions::new().as_keyword(true);
    assert_eq!(
        q.get_sql_with(&opts).unwrap(),
        "SELECT \"foo\" AS \"f\" FROM \"abc\""
    );
}

#[test]
fn test_nested_subqueries() {
    let inner = Query::from_("events").select(["user_id"]).unwrap().distinct();
    let middle = Query::from_(inner.clone())
        .select([inner.field("user_id")])
        .unwrap();
    let outer = Query::from_("users")
        .select(["name"])
        .unwrap()
        .where_(Term::field("id").isin(middle));

    assert_snapshot!(
        sql(&outer),
        @r#"SELECT "name" FROM "users" WHERE "id" IN (SELECT "sq0"."user_id" FROM (SELECT DISTINCT "user_id" FROM "events") "sq0")"#
    );
}

#[test]
fn test_case_in_select() {
    let tier = Term::from(
        Case::new()
            .when(Term::field("total").gt(1000), "gold")
            .when(Term::field("total").gt(100), "silver")
            .else_("bronze"),
    )
    .as_("tier");
    let q = Query::from_("customers").select(["id"]).unwrap().select([tier]).unwrap();
    assert_eq!(
        sql(&q),
        "SELECT \"id\",CASE WHEN \"total\">1000 THEN 'gold' WHEN \"total\">100 THEN 'silver' ELSE 'bronze' END \"tier\" FROM \"customers\""
    );
}

#[test]
fn test_window_function_in_select() {
    let rank = functions::rank()
        .over()
        .partition_by([Term::field("dept")])
        .orderby(Term::field("salary"), Order::Desc)
        .build()
        .unwrap()
        .as_("r");
    let q = Query::from_("employees").select(["name"]).unwrap().select([rank]).unwrap();
    assert_eq!(
        sql(&q),
        "SELECT \"name\",RANK() OVER(PARTITION BY \"dept\" ORDER BY \"salary\" DESC) \"r\" FROM \"employees\""
    );
}

#[test]
fn test_union_as_subquery_and_ordered() {
    let a = Query::from_("a").select(["x"]).unwrap();
    let b = Query::from_("b").select(["x"]).unwrap();
    let all = a.union_all(b).orderby(["x"], Order::Asc).limit(5);
    assert_eq!(
        all.get_sql().unwrap(),
        "(SELECT \"x\" FROM \"a\") UNION ALL (SELECT \"x\" FROM \"b\") ORDER BY \"x\" ASC LIMIT 5"
    );
}

#[test]
fn test_cte_select_star() {
    let seed = Query::from_("staff").select(["id", "boss"]).unwrap();
    let tree = Table::new("tree");
    let q = Query::with_(seed, "tree")
        .from_(tree.clone())
        .select([tree.star()])
        .unwrap();
    assert_eq!(
        sql(&q),
        "WITH \"tree\" AS (SELECT \"id\",\"boss\" FROM \"staff\") SELECT * FROM \"tree\""
    );
}

#[test]
fn test_locking_reads() {
    let q = Dialect::Postgres
        .query()
        .from_("jobs")
        .select(["id"])
        .unwrap()
        .limit(1)
        .for_update_with(Vec::<Table>::new(), LockWait::SkipLocked);
    assert_eq!(
        sql(&q),
        "SELECT \"id\" FROM \"jobs\" LIMIT 1 FOR UPDATE SKIP LOCKED"
    );
}

#[test]
fn test_builders_are_values() {
    let base = Query::from_("abc").select(["a"]).unwrap();
    let filtered = base.clone().where_(Term::field("a").eq(1));

    assert_eq!(sql(&base), "SELECT \"a\" FROM \"abc\"");
    assert_eq!(sql(&filtered), "SELECT \"a\" FROM \"abc\" WHERE \"a\"=1");
    assert_ne!(base, filtered);
}

#[test]
fn test_generated_sql_parses() {
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    let orders = Table::new("orders");
    let customers = Table::new("customers");
    let q = Query::from_(orders.clone())
        .join(customers.clone())
        .on(orders.field("customer_id").eq(customers.field("id")))
        .unwrap()
        .select([customers.field("name"), functions::count("*").as_("n")])
        .unwrap()
        .groupby([customers.field("name")])
        .orderby(["name"], None)
        .limit(10);

    Parser::parse_sql(&GenericDialect {}, &sql(&q)).unwrap();
}
