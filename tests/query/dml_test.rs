//! INSERT, UPDATE and DELETE through the public builder API.

use insta::assert_snapshot;
use querycraft::prelude::*;
use querycraft::row;
use querycraft::Result;

fn sql(q: &QueryBuilder) -> String {
    q.get_sql().unwrap()
}

#[test]
fn test_insert_with_columns() {
    let users = Table::new("users");
    let q = Query::into_table(users)
        .columns(["id", "name", "active"])
        .unwrap()
        .insert(row![1, "ann", true])
        .unwrap()
        .insert(row![2, "bob", false])
        .unwrap();
    assert_eq!(
        sql(&q),
        "INSERT INTO \"users\" (\"id\",\"name\",\"active\") VALUES (1,'ann',true),(2,'bob',false)"
    );
}

#[test]
fn test_table_insert_shortcut() {
    let q = Table::new("abc").insert(row![1, Term::null()]).unwrap();
    assert_eq!(sql(&q), "INSERT INTO \"abc\" VALUES (1,NULL)");
}

#[test]
fn test_insert_from_select() {
    let q = Dialect::Postgres
        .query()
        .into_table("archive")
        .unwrap()
        .columns(["id"])
        .unwrap()
        .from_("events")
        .select(["id"])
        .unwrap()
        .where_(Term::field("ts").lt("2020-01-01"));
    assert_eq!(
        sql(&q),
        "INSERT INTO \"archive\" (\"id\") SELECT \"id\" FROM \"events\" WHERE \"ts\"<'2020-01-01'"
    );
}

#[test]
fn test_postgres_upsert() {
    let q = Dialect::Postgres
        .query()
        .into_table("counters")
        .unwrap()
        .columns(["key", "hits"])
        .unwrap()
        .insert(row!["home", 1])
        .unwrap()
        .on_conflict(["key"])
        .unwrap()
        .do_update_value("hits", Table::new("counters").field("hits") + Term::excluded("hits"))
        .unwrap()
        .returning(["hits"])
        .unwrap();

    assert_snapshot!(
        sql(&q),
        @r#"INSERT INTO "counters" ("key","hits") VALUES ('home',1) ON CONFLICT ("key") DO UPDATE SET "hits"="counters"."hits"+EXCLUDED."hits" RETURNING "hits""#
    );
}

#[test]
fn test_sqlite_upsert_do_nothing() {
    let q = Dialect::Sqlite
        .query()
        .into_table("t")
        .unwrap()
        .insert(row![1])
        .unwrap()
        .on_conflict(["id"])
        .unwrap()
        .do_nothing()
        .unwrap();
    assert_eq!(
        sql(&q),
        "INSERT INTO \"t\" VALUES (1) ON CONFLICT (\"id\") DO NOTHING"
    );
}

#[test]
fn test_upsert_unsupported_on_mssql() {
    let err = Dialect::MsSql
        .query()
        .into_table("t")
        .unwrap()
        .insert(row![1])
        .unwrap()
        .on_conflict(["id"])
        .and_then(|q| q.do_nothing())
        .and_then(|q| q.get_sql());
    assert!(matches!(err, Err(QueryError::Unsupported { .. })));
}

#[test]
fn test_mysql_duplicate_key() {
    let q = Dialect::MySql
        .query()
        .into_table("stock")
        .unwrap()
        .columns(["sku", "qty"])
        .unwrap()
        .insert(row!["a1", 5])
        .unwrap()
        .on_duplicate_key_update("qty", Term::field("qty") + Term::values("qty"))
        .unwrap();
    assert_eq!(
        sql(&q),
        "INSERT INTO `stock` (`sku`,`qty`) VALUES ('a1',5) ON DUPLICATE KEY UPDATE `qty`=`qty`+VALUES(`qty`)"
    );
}

#[test]
fn test_update_arithmetic() {
    let accounts = Table::new("accounts");
    let q = accounts
        .update()
        .set("balance", accounts.field("balance") - 10)
        .set("updated", true)
        .where_(accounts.field("id").isin([1, 2, 3]));
    assert_eq!(
        sql(&q),
        "UPDATE \"accounts\" SET \"balance\"=\"balance\"-10,\"updated\"=true WHERE \"id\" IN (1,2,3)"
    );
}

#[test]
fn test_delete_variants() {
    let q = Query::from_("sessions")
        .delete()
        .unwrap()
        .where_(Term::field("expires").lt(Term::raw("NOW()")));
    assert_eq!(
        sql(&q),
        "DELETE FROM \"sessions\" WHERE \"expires\"<NOW()"
    );

    let q = Dialect::Postgres
        .query()
        .from_("sessions")
        .delete()
        .unwrap()
        .where_(Term::field("user_id").eq(7))
        .returning(["id"])
        .unwrap();
    assert_eq!(
        sql(&q),
        "DELETE FROM \"sessions\" WHERE \"user_id\"=7 RETURNING \"id\""
    );
}

#[test]
fn test_update_from_other_table() {
    let items = Table::new("items");
    let prices = Table::new("prices");
    let q = Query::from_(prices.clone())
        .update(items.clone())
        .unwrap()
        .set(items.field("cost"), prices.field("cost"))
        .where_(items.field("sku").eq(prices.field("sku")));
    assert_eq!(
        sql(&q),
        "UPDATE \"items\" SET \"cost\"=\"prices\".\"cost\" FROM \"prices\" WHERE \"items\".\"sku\"=\"prices\".\"sku\""
    );
}

#[test]
fn test_statement_kind_is_fixed_once_chosen() {
    let is_config = |r: Result<QueryBuilder>| matches!(r, Err(QueryError::Configuration(_)));

    // SELECT and DELETE cannot turn into an UPDATE
    let selecting = Query::from_("t").select(["a"]).unwrap();
    assert!(is_config(selecting.clone().update("u")));
    assert!(is_config(selecting.delete()));
    let deleting = Query::from_("t").delete().unwrap();
    assert!(is_config(deleting.clone().update("u")));
    assert!(is_config(Query::into_table("t").update("u")));
    assert!(is_config(Query::update("t").update("u")));

    // UPDATE and DELETE take no select list and no INTO target
    let updating = Query::update("t").set("x", 1);
    assert!(is_config(updating.clone().select([1])));
    assert!(is_config(updating.clone().into_table("other")));
    assert!(is_config(deleting.clone().select(["a"])));
    assert!(is_config(deleting.into_table("other")));

    // The rejected calls left the UPDATE intact
    assert_eq!(sql(&updating), "UPDATE \"t\" SET \"x\"=1");
}

#[test]
fn test_parameterized_insert() {
    let q = Query::into_table("abc")
        .insert(row![1, "a"])
        .unwrap();
    let (sql, params) = q.to_parameterized(ParamStyle::Qmark).unwrap();
    assert_eq!(sql, "INSERT INTO \"abc\" VALUES (?,?)");
    assert_eq!(
        params,
        BoundParams::Positional(vec![Value::Int(1), Value::Str("a".into())])
    );
}
