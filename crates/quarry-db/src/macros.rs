//! Macros for declaring table schemas.

/// Defines a module with the table name and column-name constants for a
/// database table.
///
/// # Syntax
///
/// ```
/// use quarry_db::define_model;
///
/// define_model!(users {
///     table: "users",
///     columns: {
///         ID => "id",
///         NAME => "name",
///     }
/// });
///
/// assert_eq!(users::TABLE, "users");
/// assert_eq!(users::NAME, "name");
/// ```
///
/// The generated constants keep queries free of stray column-name strings:
///
/// ```ignore
/// let rows = db
///     .from(users::TABLE)
///     .where_eq(users::NAME, "Ada".to_string())
///     .get()?;
/// ```
#[macro_export]
macro_rules! define_model {
    (
        $model:ident {
            table: $table:literal,
            columns: {
                $($name:ident => $column:literal),* $(,)?
            }
        }
    ) => {
        pub mod $model {
            pub const TABLE: &str = $table;

            $(
                pub const $name: &str = $column;
            )*
        }
    };
}
