use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use tokio::sync::RwLock;

use super::{DeleteOutcome, DocumentStore, Page, StoreError, StoreResult};

/// In-process [`DocumentStore`] used for development and tests.
///
/// Documents keep insertion order within a collection. `$text` matches when
/// any search term equals, case-insensitively, a whole word of one of the
/// document's string fields. Unlike a MongoDB text index there is no stemming
/// or stop-word handling, so "chairs" does not find "chair".
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(doc: &Document, filter: &Document) -> StoreResult<bool> {
    for (key, expected) in filter {
        let hit = match key.as_str() {
            "$text" => text_matches(doc, expected)?,
            op if op.starts_with('$') => return Err(StoreError::UnsupportedQuery(op.to_string())),
            field => doc.get(field) == Some(expected),
        };
        if !hit {
            return Ok(false);
        }
    }
    Ok(true)
}

fn text_matches(doc: &Document, query: &Bson) -> StoreResult<bool> {
    let search = query
        .as_document()
        .and_then(|query| query.get_str("$search").ok())
        .ok_or_else(|| StoreError::UnsupportedQuery("$text without $search".into()))?;

    let terms: Vec<String> = words(search).collect();
    Ok(doc
        .values()
        .filter_map(Bson::as_str)
        .flat_map(words)
        .any(|word| terms.contains(&word)))
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}

fn position(docs: &[Document], filter: &Document) -> StoreResult<Option<usize>> {
    for (index, doc) in docs.iter().enumerate() {
        if matches(doc, filter)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, mut doc: Document) -> StoreResult<ObjectId> {
        let id = match doc.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            _ => ObjectId::new(),
        };
        doc.insert("_id", id);

        let mut collections = self.collections.write().await;
        collections.entry(collection.to_string()).or_default().push(doc);
        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        page: Option<Page>,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        for doc in docs {
            if matches(doc, &filter)? {
                found.push(doc.clone());
            }
        }

        Ok(match page {
            Some(page) => found
                .into_iter()
                .skip(page.skip as usize)
                .take(page.limit.max(0) as usize)
                .collect(),
            None => found,
        })
    }

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(None);
        };
        Ok(position(docs, &filter)?.map(|index| docs[index].clone()))
    }

    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: Document,
        mut replacement: Document,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = position(docs, &filter)? else {
            return Ok(None);
        };

        let mut replaced = Document::new();
        if let Some(id) = docs[index].get("_id") {
            replaced.insert("_id", id.clone());
        }
        replacement.remove("_id");
        for (key, value) in replacement {
            replaced.insert(key, value);
        }

        docs[index] = replaced.clone();
        Ok(Some(replaced))
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Document,
        mut fields: Document,
    ) -> StoreResult<Option<Document>> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = position(docs, &filter)? else {
            return Ok(None);
        };

        fields.remove("_id");
        for (key, value) in fields {
            docs[index].insert(key, value);
        }
        Ok(Some(docs[index].clone()))
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<DeleteOutcome> {
        let mut collections = self.collections.write().await;
        let removed = match collections.get_mut(collection) {
            Some(docs) => match position(docs, &filter)? {
                Some(index) => {
                    docs.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: removed,
        })
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        let collections = self.collections.read().await;
        let mut count = 0;
        if let Some(docs) = collections.get(collection) {
            for doc in docs {
                if matches(doc, &filter)? {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;

    #[actix_rt::test]
    async fn test_insert_assigns_id_and_find_one_by_id() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("products", doc! { "name": "Lamp", "stock": 3_i64 })
            .await
            .unwrap();

        let found = store
            .find_one("products", doc! { "_id": id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.get_object_id("_id").unwrap(), id);
        assert_eq!(found.get_str("name").unwrap(), "Lamp");
    }

    #[actix_rt::test]
    async fn test_text_search_and_paging() {
        let store = MemoryStore::new();
        for name in ["Red Chair", "Blue Chair", "Green Table", "red lamp"] {
            store
                .insert_one("products", doc! { "name": name, "description": "" })
                .await
                .unwrap();
        }

        let filter = doc! { "$text": { "$search": "red" } };
        let hits = store.find("products", filter.clone(), None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(store.count_documents("products", filter).await.unwrap(), 2);

        let page = Page { skip: 1, limit: 2 };
        let paged = store.find("products", doc! {}, Some(page)).await.unwrap();
        let names: Vec<&str> = paged.iter().map(|d| d.get_str("name").unwrap()).collect();
        assert_eq!(names, vec!["Blue Chair", "Green Table"]);
    }

    #[actix_rt::test]
    async fn test_text_search_matches_whole_words_only() {
        let store = MemoryStore::new();
        store
            .insert_one("products", doc! { "name": "Armchair", "description": "Leather, deep-seated" })
            .await
            .unwrap();
        store
            .insert_one("products", doc! { "name": "Kitchen chair", "description": "Oak" })
            .await
            .unwrap();

        let search = |terms: &str| doc! { "$text": { "$search": terms } };
        assert_eq!(store.count_documents("products", search("chair")).await.unwrap(), 1);
        assert_eq!(store.count_documents("products", search("CHAIR")).await.unwrap(), 1);
        assert_eq!(store.count_documents("products", search("deep")).await.unwrap(), 1);
        assert_eq!(store.count_documents("products", search("leath")).await.unwrap(), 0);
        assert_eq!(store.count_documents("products", search("oak armchair")).await.unwrap(), 2);
    }

    #[actix_rt::test]
    async fn test_replace_keeps_id_and_drops_missing_fields() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("products", doc! { "name": "Old", "note": "gone soon" })
            .await
            .unwrap();

        let replaced = store
            .find_one_and_replace("products", doc! { "_id": id }, doc! { "name": "New" })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced, doc! { "_id": id, "name": "New" });
    }

    #[actix_rt::test]
    async fn test_update_merges_fields() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("products", doc! { "name": "Desk", "stock": 1_i64 })
            .await
            .unwrap();

        let updated = store
            .find_one_and_update("products", doc! { "_id": id }, doc! { "stock": 9_i64 })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.get_str("name").unwrap(), "Desk");
        assert_eq!(updated.get_i64("stock").unwrap(), 9);
    }

    #[actix_rt::test]
    async fn test_mutations_on_missing_document_return_none() {
        let store = MemoryStore::new();
        let filter = doc! { "_id": ObjectId::new() };

        assert!(store
            .find_one_and_update("products", filter.clone(), doc! { "a": 1 })
            .await
            .unwrap()
            .is_none());
        assert!(store
            .find_one_and_replace("products", filter.clone(), doc! { "a": 1 })
            .await
            .unwrap()
            .is_none());

        let outcome = store.delete_one("products", filter).await.unwrap();
        assert_eq!(
            outcome,
            DeleteOutcome {
                acknowledged: true,
                deleted_count: 0
            }
        );
    }

    #[actix_rt::test]
    async fn test_unknown_operator_is_rejected() {
        let store = MemoryStore::new();
        store.insert_one("products", doc! { "price": 5 }).await.unwrap();

        let result = store
            .find("products", doc! { "$where": "this.price > 1" }, None)
            .await;
        assert!(matches!(result, Err(StoreError::UnsupportedQuery(op)) if op == "$where"));
    }
}
