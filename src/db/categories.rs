use crate::db::DbPool;
use crate::errors::{Error, Result};
use crate::models::Category;
use rusqlite::{OptionalExtension, params};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Lists all categories, ordered by name.
///
/// Also serves the bulk export path - the categories table carries no
/// denormalized fields, so the export shape equals the list shape.
///
/// # Errors
///
/// Returns `Error::Database` if there's an issue acquiring the database
/// lock, preparing the SQL statement, or mapping query results.
#[instrument(skip(pool))]
pub async fn list_categories(pool: &DbPool) -> Result<Vec<Category>> {
    let conn = pool.lock().map_err(|_| {
        Error::Database("Failed to acquire DB lock for listing categories".to_string())
    })?;
    let mut stmt =
        conn.prepare_cached("SELECT id, name, icon, color FROM categories ORDER BY name ASC")?;
    let category_iter = stmt.query_map([], |row| {
        Ok(Category {
            id: row.get(0)?,
            name: row.get(1)?,
            icon: row.get(2)?,
            color: row.get(3)?,
        })
    })?;

    let mut categories = Vec::new();
    for category_result in category_iter {
        categories.push(
            category_result
                .map_err(|e| Error::Database(format!("Failed to map category row: {}", e)))?,
        );
    }
    debug!("Fetched {} categories.", categories.len());
    Ok(categories)
}

/// Fetches a single category by its identifier.
#[instrument(skip(pool))]
pub async fn get_category_by_id(pool: &DbPool, id: &str) -> Result<Option<Category>> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
    let mut stmt =
        conn.prepare_cached("SELECT id, name, icon, color FROM categories WHERE id = ?1")?;
    let category_result = stmt
        .query_row(params![id], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                icon: row.get(2)?,
                color: row.get(3)?,
            })
        })
        .optional()?;
    Ok(category_result)
}

/// Creates a new category with a generated identifier.
///
/// # Errors
///
/// Returns `Error::Validation` if `name` is empty.
/// Returns `Error::Database` if there's an issue acquiring the database
/// lock or executing the insert statement.
#[instrument(skip(pool))]
pub async fn add_category(
    pool: &DbPool,
    name: &str,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<Category> {
    if name.trim().is_empty() {
        return Err(Error::Validation(
            "Category name must not be empty.".to_string(),
        ));
    }
    let new_id = Uuid::new_v4().to_string();
    let conn = pool.lock().map_err(|_| {
        Error::Database("Failed to acquire DB lock for adding category".to_string())
    })?;
    let mut stmt = conn
        .prepare_cached("INSERT INTO categories (id, name, icon, color) VALUES (?1, ?2, ?3, ?4)")?;
    stmt.execute(params![new_id, name, icon, color])?;
    info!("Added new category '{}' (ID: {})", name, new_id);
    Ok(Category {
        id: new_id,
        name: name.to_string(),
        icon: icon.map(str::to_string),
        color: color.map(str::to_string),
    })
}

/// Updates an existing category's name and display attributes.
///
/// # Returns
///
/// Returns `Ok(Some(Category))` with the updated record, or `Ok(None)`
/// if no category with that identifier exists.
#[instrument(skip(pool))]
pub async fn update_category(
    pool: &DbPool,
    id: &str,
    name: &str,
    icon: Option<&str>,
    color: Option<&str>,
) -> Result<Option<Category>> {
    if name.trim().is_empty() {
        return Err(Error::Validation(
            "Category name must not be empty.".to_string(),
        ));
    }
    let rows_affected = {
        let conn = pool
            .lock()
            .map_err(|_| Error::Database("Failed to acquire DB lock".to_string()))?;
        conn.execute(
            "UPDATE categories SET name = ?1, icon = ?2, color = ?3 WHERE id = ?4",
            params![name, icon, color, id],
        )?
    };
    if rows_affected == 0 {
        debug!("No category with id {} to update.", id);
        return Ok(None);
    }
    info!("Updated category {} to name '{}'", id, name);
    Ok(Some(Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.map(str::to_string),
        color: color.map(str::to_string),
    }))
}

/// Deletes a category. The foreign keys on `transactions` and `budgets`
/// cascade, so every record referencing the category goes with it.
///
/// # Returns
///
/// Returns `Ok(usize)` with the number of category rows removed (0 if
/// the identifier was unknown).
#[instrument(skip(pool))]
pub async fn delete_category(pool: &DbPool, id: &str) -> Result<usize> {
    let conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for delete".to_string()))?;
    let rows_affected = conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    info!(
        "Deleted category {} (rows affected: {}), cascading to transactions and budgets",
        id, rows_affected
    );
    Ok(rows_affected)
}

/// Replaces the entire categories table with the given records.
///
/// Clearing the table cascades to transactions and budgets, so a
/// category import is expected to be followed by transaction and budget
/// imports from the same document. Records without an identifier get a
/// generated one; records with an empty name are skipped with a warning.
///
/// # Returns
///
/// Returns `Ok(usize)` with the number of records actually inserted.
#[instrument(skip(pool, categories))]
pub async fn import_categories(pool: &DbPool, categories: &[Category]) -> Result<usize> {
    let mut conn = pool
        .lock()
        .map_err(|_| Error::Database("Failed to acquire DB lock for import".to_string()))?;
    let tx = conn
        .transaction()
        .map_err(|e| Error::Database(format!("Failed to start transaction for import: {}", e)))?;

    tx.execute("DELETE FROM categories", [])?;
    let mut imported_count = 0;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO categories (id, name, icon, color) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for category in categories {
            if category.name.trim().is_empty() {
                warn!(
                    "Skipping category import for id '{}' due to empty name",
                    category.id
                );
                continue;
            }
            let id = if category.id.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                category.id.clone()
            };
            stmt.execute(params![id, category.name, category.icon, category.color])?;
            imported_count += 1;
        }
    }
    tx.commit().map_err(|e| {
        Error::Database(format!("Failed to commit category import: {}", e))
    })?;
    info!("Imported {} categories (full replace).", imported_count);
    Ok(imported_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::{count_rows, direct_insert_category, init_test_tracing, setup_test_db};
    use crate::errors::Result;

    #[tokio::test]
    async fn test_add_and_get_category() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let created = add_category(
            &db_pool,
            "Food",
            Some("Utensils"),
            Some("hsl(10, 70%, 60%)"),
        )
        .await?;
        assert!(!created.id.is_empty());

        let fetched = get_category_by_id(&db_pool, &created.id)
            .await?
            .expect("Category not found after creation");
        assert_eq!(fetched.name, "Food");
        assert_eq!(fetched.icon.as_deref(), Some("Utensils"));
        assert_eq!(fetched.color.as_deref(), Some("hsl(10, 70%, 60%)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_add_category_rejects_empty_name() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;

        let result = add_category(&db_pool, "   ", None, None).await;
        assert!(matches!(result, Err(crate::errors::Error::Validation(_))));

        let conn = db_pool.lock().unwrap();
        assert_eq!(count_rows(&conn, "categories")?, 0, "No partial write");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_categories_ordered_by_name() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;
        {
            let conn = db_pool.lock().unwrap();
            direct_insert_category(&conn, "cat-1", "Transport", None, None)?;
            direct_insert_category(&conn, "cat-2", "Food", Some("Utensils"), None)?;
            direct_insert_category(&conn, "cat-3", "Housing", None, None)?;
        }

        let categories = list_categories(&db_pool).await?;
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Food", "Housing", "Transport"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_category() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;
        {
            let conn = db_pool.lock().unwrap();
            direct_insert_category(&conn, "cat-1", "Food", None, None)?;
        }

        let updated = update_category(&db_pool, "cat-1", "Groceries", Some("Cart"), None)
            .await?
            .expect("Category should exist");
        assert_eq!(updated.name, "Groceries");
        assert_eq!(updated.icon.as_deref(), Some("Cart"));

        let missing = update_category(&db_pool, "no-such-id", "X", None, None).await?;
        assert!(missing.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_cascades() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;
        {
            let conn = db_pool.lock().unwrap();
            direct_insert_category(&conn, "cat-1", "Food", None, None)?;
            direct_insert_category(&conn, "cat-2", "Housing", None, None)?;
            crate::db::test_utils::direct_insert_transaction(
                &conn,
                "txn-1",
                chrono::Utc::now(),
                "Groceries",
                42.0,
                "expense",
                "cat-1",
            )?;
            crate::db::test_utils::direct_insert_budget(&conn, "bud-1", "cat-1", 400.0, "monthly")?;
            crate::db::test_utils::direct_insert_budget(&conn, "bud-2", "cat-2", 900.0, "monthly")?;
        }

        let deleted = delete_category(&db_pool, "cat-1").await?;
        assert_eq!(deleted, 1);

        let conn = db_pool.lock().unwrap();
        assert_eq!(count_rows(&conn, "categories")?, 1);
        assert_eq!(
            count_rows(&conn, "transactions")?,
            0,
            "Transactions referencing the category must be removed"
        );
        assert_eq!(
            count_rows(&conn, "budgets")?,
            1,
            "Only the budget of the deleted category is removed"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_import_categories_full_replace() -> Result<()> {
        init_test_tracing();
        let db_pool = setup_test_db().await?;
        {
            let conn = db_pool.lock().unwrap();
            direct_insert_category(&conn, "old-1", "Old", None, None)?;
        }

        let incoming = vec![
            crate::models::Category {
                id: "cat-1".to_string(),
                name: "Food".to_string(),
                icon: None,
                color: None,
            },
            crate::models::Category {
                id: String::new(), // identifier generated on import
                name: "Housing".to_string(),
                icon: None,
                color: None,
            },
            crate::models::Category {
                id: "cat-3".to_string(),
                name: "".to_string(), // skipped
                icon: None,
                color: None,
            },
        ];
        let count = import_categories(&db_pool, &incoming).await?;
        assert_eq!(count, 2);

        let categories = list_categories(&db_pool).await?;
        assert_eq!(categories.len(), 2);
        assert!(categories.iter().all(|c| c.name != "Old"));
        assert!(categories.iter().all(|c| !c.id.is_empty()));
        Ok(())
    }
}
