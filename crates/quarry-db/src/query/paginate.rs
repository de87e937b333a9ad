//! Bounded result pages on top of the executor.

use serde::Serialize;

use crate::{
    error::{DbError, Result},
    record::Record,
};

use super::{builder::QueryBuilder, state::Limit};

/// One page of results.
///
/// `pagination` is the `"<page> de <pages>"` summary label; its shape is a
/// stable contract for consumers rendering page indicators.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T = Record> {
    pub pages: u64,
    pub page: u64,
    pub pagination: String,
    pub rows: u64,
    pub total: u64,
    pub register: Vec<T>,
}

impl<T> Page<T> {
    /// The canonical descriptor for a page over zero rows.
    pub(crate) fn empty() -> Self {
        Self {
            pages: 1,
            page: 1,
            pagination: "1 de 1".to_string(),
            rows: 0,
            total: 0,
            register: vec![],
        }
    }
}

impl Page<Record> {
    /// Converts every record of the page into a typed model.
    pub fn into_models<T: crate::model::FromRecord>(self) -> Result<Page<T>> {
        let register = self
            .register
            .iter()
            .map(T::from_record)
            .collect::<Result<Vec<T>>>()?;

        Ok(Page {
            pages: self.pages,
            page: self.page,
            pagination: self.pagination,
            rows: self.rows,
            total: self.total,
            register,
        })
    }
}

impl QueryBuilder {
    /// Fetches page `page` with `rows_per_page` rows per page.
    ///
    /// The page count comes from a COUNT over the current table and WHERE
    /// state; the slice is fetched with `LIMIT start, rows` where
    /// `start = rows_per_page * (page - 1)`.
    pub fn paginate(mut self, page: u64, rows_per_page: u64) -> Result<Page> {
        if page < 1 {
            return Err(DbError::InvalidPage);
        }

        if rows_per_page < 1 {
            return Err(DbError::InvalidRowsPerPage);
        }

        let count_query = self.state.count_statement("*")?;
        let total = self.run_count(&count_query)?;

        if total < 1 {
            return Ok(Page::empty());
        }

        let pages = total.div_ceil(rows_per_page);
        let start = rows_per_page * (page - 1);

        self.state.limit = Some(Limit::Range(start, rows_per_page));
        let register = self.get()?;

        Ok(Page {
            pages,
            page,
            pagination: format!("{page} de {pages}"),
            rows: rows_per_page,
            total,
            register,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    fn seeded_db(rows: usize) -> Database {
        let db = Database::open_in_memory().unwrap();
        {
            let handle = db.handle();
            let conn = handle.lock().unwrap();
            conn.execute(
                "CREATE TABLE products (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    stock INTEGER NOT NULL DEFAULT 0
                )",
                [],
            )
            .unwrap();

            for index in 0..rows {
                conn.execute(
                    "INSERT INTO products (name, stock) VALUES (?1, ?2)",
                    rusqlite::params![format!("product-{index}"), index as i64],
                )
                .unwrap();
            }
        }
        db
    }

    #[test]
    fn empty_table_yields_canonical_page() {
        let db = seeded_db(0);
        let page = db.from("products").paginate(1, 50).unwrap();

        assert_eq!(page, Page::empty());
        assert_eq!(page.pagination, "1 de 1");
    }

    #[test]
    fn page_count_is_ceiling_of_total_over_rows() {
        let db = seeded_db(7);
        let page = db.from("products").paginate(1, 3).unwrap();

        assert_eq!(page.pages, 3);
        assert_eq!(page.total, 7);
        assert_eq!(page.rows, 3);
        assert_eq!(page.register.len(), 3);
    }

    #[test]
    fn later_pages_are_offset_slices() {
        let db = seeded_db(7);
        let page = db.from("products").paginate(3, 3).unwrap();

        assert_eq!(page.page, 3);
        assert_eq!(page.pagination, "3 de 3");
        assert_eq!(page.register.len(), 1);
        assert_eq!(page.register[0].get_string("name").unwrap(), "product-6");
    }

    #[test]
    fn pagination_honors_where_state() {
        let db = seeded_db(10);
        let page = db
            .from("products")
            .where_op("stock", ">=", 5_i64)
            .paginate(1, 2)
            .unwrap();

        assert_eq!(page.total, 5);
        assert_eq!(page.pages, 3);
        assert_eq!(page.register.len(), 2);
    }

    #[test]
    fn invalid_inputs_fail_fast() {
        let db = seeded_db(3);

        assert!(matches!(
            db.from("products").paginate(0, 10).unwrap_err(),
            DbError::InvalidPage
        ));
        assert!(matches!(
            db.from("products").paginate(1, 0).unwrap_err(),
            DbError::InvalidRowsPerPage
        ));
    }

    #[test]
    fn page_serializes_with_register_objects() {
        let db = seeded_db(1);
        let page = db.from("products").select(["name"]).paginate(1, 10).unwrap();

        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"], "1 de 1");
        assert_eq!(json["register"][0]["name"], "product-0");
    }
}
