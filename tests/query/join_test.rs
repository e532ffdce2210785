//! JOIN clauses through the public builder API.

use insta::assert_snapshot;
use querycraft::prelude::*;

fn sql(q: &QueryBuilder) -> String {
    q.get_sql().unwrap()
}

#[test]
fn test_three_way_join() {
    let orders = Table::new("orders");
    let customers = Table::new("customers");
    let items = Table::new("items");

    let q = Query::from_(orders.clone())
        .join(customers.clone())
        .on(orders.field("customer_id").eq(customers.field("id")))
        .unwrap()
        .left_join(items.clone())
        .on(items.field("order_id").eq(orders.field("id")))
        .unwrap()
        .select([orders.field("id"), customers.field("name"), items.field("sku")])
        .unwrap()
        .where_(customers.field("country").eq("NZ"));

    assert_snapshot!(
        sql(&q),
        @r#"SELECT "orders"."id","customers"."name","items"."sku" FROM "orders" JOIN "customers" ON "orders"."customer_id"="customers"."id" LEFT JOIN "items" ON "items"."order_id"="orders"."id" WHERE "customers"."country"='NZ'"#
    );
}

#[test]
fn test_join_with_compound_criterion() {
    let a = Table::new("a");
    let b = Table::new("b");
    let q = Query::from_(a.clone())
        .join(b.clone())
        .on(a.field("id").eq(b.field("a_id")) & b.field("active").eq(true))
        .unwrap()
        .select([a.star()])
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT \"a\".* FROM \"a\" JOIN \"b\" ON \"a\".\"id\"=\"b\".\"a_id\" AND \"b\".\"active\"=true"
    );
}

#[test]
fn test_right_and_full_outer() {
    let a = Table::new("a");
    let b = Table::new("b");
    let right = Query::from_(a.clone())
        .right_join(b.clone())
        .on(a.field("id").eq(b.field("id")))
        .unwrap()
        .select([b.field("id")])
        .unwrap();
    assert_eq!(
        sql(&right),
        "SELECT \"b\".\"id\" FROM \"a\" RIGHT JOIN \"b\" ON \"a\".\"id\"=\"b\".\"id\""
    );

    let full = Query::from_(a.clone())
        .outer_join(b.clone())
        .on(a.field("id").eq(b.field("id")))
        .unwrap()
        .select([b.field("id")])
        .unwrap();
    assert_eq!(
        sql(&full),
        "SELECT \"b\".\"id\" FROM \"a\" FULL OUTER JOIN \"b\" ON \"a\".\"id\"=\"b\".\"id\""
    );
}

#[test]
fn test_aliased_tables() {
    let e = Table::new("employees").as_("e");
    let m = Table::new("employees").as_("m");
    let q = Query::from_(e.clone())
        .left_join(m.clone())
        .on(e.field("manager_id").eq(m.field("id")))
        .unwrap()
        .select([e.field("name"), m.field("name").as_("manager")])
        .unwrap();
    assert_eq!(
        sql(&q),
        "SELECT \"e\".\"name\",\"m\".\"name\" \"manager\" FROM \"employees\" \"e\" LEFT JOIN \"employees\" \"m\" ON \"e\".\"manager_id\"=\"m\".\"id\""
    );
}

#[test]
fn test_join_using_on_mysql() {
    let q = Dialect::MySql
        .query()
        .from_("a")
        .join("b")
        .using(["id"])
        .unwrap()
        .select(["*"])
        .unwrap();
    assert_eq!(sql(&q), "SELECT * FROM `a` JOIN `b` USING (`id`)");
}

#[test]
fn test_criterion_outside_query_is_rejected() {
    let a = Table::new("a");
    let b = Table::new("b");
    let c = Table::new("c");
    let err = Query::from_(a.clone())
        .join(b.clone())
        .on(b.field("x").eq(c.field("x")))
        .unwrap_err();
    assert!(matches!(err, QueryError::Join(_)));
}

#[test]
fn test_join_subquery_with_alias() {
    let totals = Query::from_("orders")
        .select([Term::field("customer_id"), functions::sum(Term::field("amount")).as_("total")])
        .unwrap()
        .groupby(["customer_id"])
        .as_("t");
    let customers = Table::new("customers");
    let q = Query::from_(customers.clone())
        .join(totals.clone())
        .on(customers.field("id").eq(totals.field("customer_id")))
        .unwrap()
        .select([customers.field("name"), totals.field("total")])
        .unwrap();

    assert_snapshot!(
        sql(&q),
        @r#"SELECT "customers"."name","t"."total" FROM "customers" JOIN (SELECT "customer_id",SUM("amount") "total" FROM "orders" GROUP BY "customer_id") "t" ON "customers"."id"="t"."customer_id""#
    );
}

#[test]
fn test_unaliased_subqueries_numbered_in_order() {
    let low = Query::from_("a").select(["x"]).unwrap().where_(Term::field("x").gt(1));
    let high = Query::from_("b").select(["x"]).unwrap().where_(Term::field("x").gt(2));
    let q = Query::from_(low.clone())
        .join(high.clone())
        .on(low.field("x").eq(high.field("x")))
        .unwrap()
        .select([low.field("x")])
        .unwrap();

    assert_eq!(
        sql(&q),
        "SELECT \"sq0\".\"x\" FROM (SELECT \"x\" FROM \"a\" WHERE \"x\">1) \"sq0\" JOIN (SELECT \"x\" FROM \"b\" WHERE \"x\">2) \"sq1\" ON \"sq0\".\"x\"=\"sq1\".\"x\""
    );
}
