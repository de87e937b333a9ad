pub mod connection;
pub mod error;
pub mod macros;
pub mod model;
pub mod query;
pub mod record;

pub use connection::Database;
pub use error::{DbError, Result};
pub use model::{FromRecord, Model};
pub use query::{Operation, Page, QueryBuilder};
pub use record::Record;
pub use rusqlite::types::Value;

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        {
            let handle = db.handle();
            let conn = handle.lock().unwrap();
            conn.execute(
                "CREATE TABLE products (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    price REAL NOT NULL DEFAULT 0,
                    stock INTEGER NOT NULL DEFAULT 0,
                    tags TEXT,
                    discontinued_at TEXT
                )",
                [],
            )
            .unwrap();
        }
        db
    }

    fn seed(db: &Database, name: &str, price: f64, stock: i64) {
        assert!(db
            .to("products")
            .insert([
                ("name", Value::from(name.to_string())),
                ("price", Value::from(price)),
                ("stock", Value::from(stock)),
            ])
            .unwrap());
    }

    #[test]
    fn insert_then_get_round_trip() {
        let db = setup_db();
        seed(&db, "lamp", 12.5, 3);

        let rows = db.from("products").get().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_string("name").unwrap(), "lamp");
        assert_eq!(rows[0].get_f64("price").unwrap(), 12.5);
        assert_eq!(rows[0].get_i64("stock").unwrap(), 3);
    }

    #[test]
    fn select_restricts_columns_in_order() {
        let db = setup_db();
        seed(&db, "lamp", 12.5, 3);

        let rows = db.from("products").select(["stock", "name"]).get().unwrap();
        let columns: Vec<&str> = rows[0].columns().collect();
        assert_eq!(columns, vec!["stock", "name"]);
    }

    #[test]
    fn first_returns_empty_record_when_nothing_matches() {
        let db = setup_db();

        let record = db
            .from("products")
            .where_eq("name", "missing".to_string())
            .first()
            .unwrap();

        assert!(record.is_empty());
    }

    #[test]
    fn where_values_are_bound_not_interpolated() {
        let db = setup_db();
        seed(&db, "O'Brien's lamp; DROP TABLE products; --", 1.0, 1);

        let rows = db
            .from("products")
            .where_eq("name", "O'Brien's lamp; DROP TABLE products; --".to_string())
            .get()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(db.from("products").count().unwrap(), 1);
    }

    #[test]
    fn update_with_self_referential_where() {
        let db = setup_db();
        seed(&db, "old", 5.0, 1);
        seed(&db, "other", 5.0, 1);

        let updated = db
            .from("products")
            .where_eq("name", "old".to_string())
            .update([("name", "old (archived)".to_string())])
            .unwrap();
        assert!(updated);

        let names: Vec<String> = db
            .from("products")
            .select(["name"])
            .order_by(["id"])
            .asc()
            .get()
            .unwrap()
            .iter()
            .map(|row| row.get_string("name").unwrap())
            .collect();

        assert_eq!(names, vec!["old (archived)".to_string(), "other".to_string()]);
    }

    #[test]
    fn delete_removes_only_matching_rows() {
        let db = setup_db();
        seed(&db, "keep", 1.0, 1);
        seed(&db, "drop", 1.0, 1);

        assert!(db
            .from("products")
            .where_eq("name", "drop".to_string())
            .delete()
            .unwrap());

        let rows = db.from("products").get().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_string("name").unwrap(), "keep");
    }

    #[test]
    fn batch_insert_is_atomic() {
        let db = setup_db();

        let inserted = db
            .to("products")
            .insert_many(vec![
                [("name", "a".to_string())],
                [("name", "b".to_string())],
                [("name", "c".to_string())],
            ])
            .unwrap();

        assert!(inserted);
        assert_eq!(db.from("products").count().unwrap(), 3);
    }

    #[test]
    fn batch_insert_rolls_back_on_failure() {
        let db = setup_db();

        // Second row violates NOT NULL on name.
        let result = db.to("products").insert_many(vec![
            vec![("name", Value::from("a".to_string()))],
            vec![("name", Value::Null)],
        ]);

        assert!(result.is_err());
        assert_eq!(db.from("products").count().unwrap(), 0);
    }

    #[test]
    fn where_in_fetches_listed_rows() {
        let db = setup_db();
        seed(&db, "a", 1.0, 1);
        seed(&db, "b", 2.0, 2);
        seed(&db, "c", 3.0, 3);

        let rows = db
            .from("products")
            .where_in("name", ["a".to_string(), "c".to_string()])
            .unwrap()
            .get()
            .unwrap();

        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn nullity_conditions_match_storage() {
        let db = setup_db();
        seed(&db, "live", 1.0, 1);
        {
            let handle = db.handle();
            let conn = handle.lock().unwrap();
            conn.execute(
                "INSERT INTO products (name, discontinued_at) VALUES ('gone', '2024-01-01')",
                [],
            )
            .unwrap();
        }

        let live = db.from("products").where_null("discontinued_at").get().unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].get_string("name").unwrap(), "live");

        let gone = db
            .from("products")
            .field_is_null("discontinued_at")
            .get()
            .unwrap();
        assert_eq!(gone.len(), 1);

        let discontinued = db
            .from("products")
            .where_not_null("discontinued_at")
            .get()
            .unwrap();
        assert_eq!(discontinued[0].get_string("name").unwrap(), "gone");
    }

    #[test]
    fn aggregates_run_against_data() {
        let db = setup_db();
        seed(&db, "a", 10.0, 5);
        seed(&db, "b", 30.0, 2);

        let max = db.from("products").max("price").unwrap();
        assert_eq!(max.get_f64("price").unwrap(), 30.0);

        let min = db.from("products").min("price").unwrap();
        assert_eq!(min.get_f64("price").unwrap(), 10.0);

        let last = db.from("products").last("id").unwrap();
        assert_eq!(last.get_string("name").unwrap(), "b");

        assert_eq!(db.from("products").count().unwrap(), 2);
        assert_eq!(
            db.from("products")
                .where_op("stock", ">", 3_i64)
                .count()
                .unwrap(),
            1
        );
    }

    #[test]
    fn group_by_with_having_filters_groups() {
        let db = setup_db();
        seed(&db, "a", 1.0, 1);
        seed(&db, "a", 2.0, 1);
        seed(&db, "b", 3.0, 1);

        let rows = db
            .from("products")
            .select(["name", "COUNT(*) AS total"])
            .group_by(["name"])
            .having_op("total", ">", 1_i64)
            .get()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_string("name").unwrap(), "a");
        assert_eq!(rows[0].get_i64("total").unwrap(), 2);
    }

    #[test]
    fn raw_query_binds_named_parameters() {
        let db = setup_db();
        seed(&db, "lamp", 12.5, 3);
        seed(&db, "desk", 80.0, 1);

        let rows = db
            .raw("SELECT name FROM products WHERE price > :price ORDER BY name")
            .bind("price", 50.0)
            .get()
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_string("name").unwrap(), "desk");
    }

    #[test]
    fn builders_are_single_shot() {
        let db = setup_db();
        seed(&db, "lamp", 12.5, 3);

        // Each statement starts from a fresh seed; nothing leaks between
        // the two chains.
        let filtered = db
            .from("products")
            .where_eq("name", "missing".to_string())
            .get()
            .unwrap();
        assert!(filtered.is_empty());

        let all = db.from("products").get().unwrap();
        assert_eq!(all.len(), 1);
    }
}
