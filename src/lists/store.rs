use anyhow::Result;
use libsql::Connection;

use crate::db::Database;
use crate::model::{Item, List, ListSummary};

pub struct ListStore<'a> {
    db: &'a Database,
    conn: &'a Connection,
}

impl<'a> ListStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            conn: db.connection(),
        }
    }

    fn conn(&self) -> &Connection {
        self.conn
    }

    pub async fn create_list(&self, owner: Option<&str>) -> Result<List> {
        let query = "INSERT INTO lists (owner) VALUES (?) RETURNING id, owner";
        let mut rows = self.conn().query(query, libsql::params![owner]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_list(&row)?)
        } else {
            anyhow::bail!("Failed to create list")
        }
    }

    /// Creates a list and its first item atomically, so a rejected item
    /// never leaves an empty list behind.
    pub async fn create_list_with_item(&self, owner: Option<&str>, text: &str) -> Result<(List, Item)> {
        let db = self.db;
        db.transaction(move |conn| async move {
            let store = ListStore { db, conn: &conn };
            let list = store.create_list(owner).await?;
            let item = store.create_item(list.id, text).await?;
            Ok((list, item))
        })
        .await
    }

    pub async fn get_list(&self, id: i64) -> Result<Option<List>> {
        let mut rows = self
            .conn()
            .query("SELECT id, owner FROM lists WHERE id = ?", libsql::params![id])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(Self::row_to_list(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Deletes a list; its items go with it.
    pub async fn delete_list(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM lists WHERE id = ?", libsql::params![id])
            .await?;
        Ok(deleted > 0)
    }

    pub async fn lists_for_owner(&self, email: &str) -> Result<Vec<ListSummary>> {
        let query = r#"
SELECT
    lists.id,
    lists.owner,
    (SELECT items.text FROM items WHERE items.list_id = lists.id ORDER BY items.id LIMIT 1) AS name
FROM lists
WHERE lists.owner = ?
ORDER BY lists.id
"#;

        let mut rows = self.conn().query(query, libsql::params![email]).await?;
        let mut lists = Vec::new();

        while let Some(row) = rows.next().await? {
            lists.push(ListSummary {
                list: Self::row_to_list(&row)?,
                name: row.get::<Option<String>>(2)?.unwrap_or_default(),
            });
        }

        Ok(lists)
    }

    pub async fn create_item(&self, list_id: i64, text: &str) -> Result<Item> {
        let query = r#"
            INSERT INTO items (list_id, text)
            VALUES (?, ?)
            RETURNING id, list_id, text
        "#;

        let mut rows = self.conn().query(query, libsql::params![list_id, text]).await?;

        if let Some(row) = rows.next().await? {
            Ok(Self::row_to_item(&row)?)
        } else {
            anyhow::bail!("Failed to create item")
        }
    }

    pub async fn items_for_list(&self, list_id: i64) -> Result<Vec<Item>> {
        let query = r#"
            SELECT id, list_id, text
            FROM items
            WHERE list_id = ?
            ORDER BY id ASC
        "#;

        let mut rows = self.conn().query(query, libsql::params![list_id]).await?;
        let mut items = Vec::new();

        while let Some(row) = rows.next().await? {
            items.push(Self::row_to_item(&row)?);
        }

        Ok(items)
    }

    pub async fn count_items(&self, list_id: i64) -> Result<i64> {
        let mut rows = self
            .conn()
            .query("SELECT COUNT(*) FROM items WHERE list_id = ?", libsql::params![list_id])
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(0),
        }
    }

    fn row_to_list(row: &libsql::Row) -> Result<List> {
        Ok(List {
            id: row.get(0)?,
            owner: row.get(1)?,
        })
    }

    fn row_to_item(row: &libsql::Row) -> Result<Item> {
        Ok(Item {
            id: row.get(0)?,
            list_id: row.get(1)?,
            text: row.get(2)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountStore;
    use crate::db::is_unique_violation;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn items_come_back_in_insertion_order() {
        let db = Database::scratch().await.unwrap();
        let store = ListStore::new(&db);

        let list = store.create_list(None).await.unwrap();
        store.create_item(list.id, "Buy peacock feathers").await.unwrap();
        store.create_item(list.id, "Make a fly").await.unwrap();

        let texts: Vec<_> = store
            .items_for_list(list.id)
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.text)
            .collect();
        assert_eq!(texts, ["Buy peacock feathers", "Make a fly"]);
    }

    #[tokio::test]
    async fn duplicate_text_in_same_list_violates_constraint() {
        let db = Database::scratch().await.unwrap();
        let store = ListStore::new(&db);

        let list = store.create_list(None).await.unwrap();
        store.create_item(list.id, "bla").await.unwrap();

        let err = store.create_item(list.id, "bla").await.unwrap_err();
        assert!(is_unique_violation(&err));
        assert_eq!(store.count_items(list.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn same_text_is_allowed_in_different_lists() {
        let db = Database::scratch().await.unwrap();
        let store = ListStore::new(&db);

        let first = store.create_list(None).await.unwrap();
        let second = store.create_list(None).await.unwrap();
        store.create_item(first.id, "bla").await.unwrap();
        store.create_item(second.id, "bla").await.unwrap();

        assert_eq!(store.count_items(second.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn deleting_list_removes_its_items() {
        let db = Database::scratch().await.unwrap();
        let store = ListStore::new(&db);

        let list = store.create_list(None).await.unwrap();
        store.create_item(list.id, "one").await.unwrap();
        store.create_item(list.id, "two").await.unwrap();

        assert!(store.delete_list(list.id).await.unwrap());
        assert!(store.get_list(list.id).await.unwrap().is_none());
        assert_eq!(store.count_items(list.id).await.unwrap(), 0);
        assert!(!store.delete_list(list.id).await.unwrap());
    }

    #[tokio::test]
    async fn failed_first_item_rolls_back_list() {
        let db = Database::scratch().await.unwrap();
        let store = ListStore::new(&db);

        // the items table rejects empty text
        assert!(store.create_list_with_item(None, "").await.is_err());
        assert!(store.get_list(1).await.unwrap().is_none());

        let (list, item) = store.create_list_with_item(None, "first").await.unwrap();
        assert_eq!(item.list_id, list.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn rolled_back_transaction_keeps_concurrent_writes() {
        let db = Arc::new(Database::scratch().await.unwrap());
        let other = ListStore::new(&db).create_list(None).await.unwrap();

        let tx_db = Arc::clone(&db);
        let abandoned = tokio::spawn(async move {
            tx_db
                .transaction(|conn| async move {
                    conn.execute("INSERT INTO lists (owner) VALUES (NULL)", ()).await?;
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err::<(), _>(anyhow::anyhow!("abandoned"))
                })
                .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        ListStore::new(&db).create_item(other.id, "unrelated").await.unwrap();

        assert!(abandoned.await.unwrap().is_err());
        assert_eq!(ListStore::new(&db).count_items(other.id).await.unwrap(), 1);
        assert!(ListStore::new(&db).get_list(other.id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn transaction_does_not_block_later_writes() {
        let db = Database::scratch().await.unwrap();
        let store = ListStore::new(&db);

        let list = store.create_list(None).await.unwrap();
        store.create_item(list.id, "taken").await.unwrap();
        assert!(store.create_list_with_item(None, "").await.is_err());

        let (second, _) = store.create_list_with_item(None, "second").await.unwrap();
        store.create_item(second.id, "more").await.unwrap();
        assert_eq!(store.count_items(second.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn owner_lists_are_named_after_first_item() {
        let db = Database::scratch().await.unwrap();
        let user = AccountStore::new(db.connection()).create_user("a@b.com").await.unwrap();
        let store = ListStore::new(&db);

        let (list, _) = store.create_list_with_item(Some(&user.email), "reticulate splines").await.unwrap();
        store.create_item(list.id, "second thing").await.unwrap();
        store.create_list_with_item(None, "someone else's").await.unwrap();

        let owned = store.lists_for_owner("a@b.com").await.unwrap();
        assert_eq!(owned.len(), 1);
        assert_eq!(owned[0].list, list);
        assert_eq!(owned[0].name, "reticulate splines");
    }

    #[tokio::test]
    async fn list_owner_must_be_a_known_user() {
        let db = Database::scratch().await.unwrap();
        let store = ListStore::new(&db);

        assert!(store.create_list(Some("ghost@example.com")).await.is_err());
    }
}
