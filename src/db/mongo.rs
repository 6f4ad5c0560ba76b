use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use log::info;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{
        ClientOptions, FindOneAndReplaceOptions, FindOneAndUpdateOptions, FindOptions,
        IndexOptions, ReturnDocument,
    },
    Client, Collection, Database, IndexModel,
};
use tokio::sync::OnceCell;

use super::{DeleteOutcome, DocumentStore, Page, StoreError, StoreResult};

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Name of the full-text index backing product search.
pub const PRODUCT_SEARCH_INDEX: &str = "product_search_index";

impl From<mongodb::error::Error> for StoreError {
    fn from(error: mongodb::error::Error) -> Self {
        match error.kind.as_ref() {
            ErrorKind::Write(WriteFailure::WriteError(write_error))
                if write_error.code == DUPLICATE_KEY_CODE =>
            {
                StoreError::DuplicateKey(write_error.message.clone())
            }
            ErrorKind::ServerSelection { .. } | ErrorKind::DnsResolve { .. } => {
                StoreError::Connection(error.to_string())
            }
            _ => StoreError::Database(error.to_string()),
        }
    }
}

/// MongoDB-backed [`DocumentStore`].
///
/// The client is built on first use and the database handle is shared by
/// every later call; the driver pools connections internally.
pub struct MongoStore {
    uri: String,
    database_name: String,
    database: OnceCell<Database>,
}

impl MongoStore {
    pub fn new(uri: impl Into<String>, database_name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database_name: database_name.into(),
            database: OnceCell::new(),
        }
    }

    async fn database(&self) -> StoreResult<&Database> {
        self.database
            .get_or_try_init(|| async {
                info!("Connecting to MongoDB database '{}'", self.database_name);
                let mut options = ClientOptions::parse(&self.uri)
                    .await
                    .map_err(|e| StoreError::Connection(e.to_string()))?;
                options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

                let client = Client::with_options(options)
                    .map_err(|e| StoreError::Connection(e.to_string()))?;
                Ok(client.database(&self.database_name))
            })
            .await
    }

    async fn collection(&self, name: &str) -> StoreResult<Collection<Document>> {
        Ok(self.database().await?.collection::<Document>(name))
    }

    /// Creates the product text index and the unique index on user emails.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let products = self.collection("products").await?;
        products
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "name": "text", "description": "text" })
                    .options(
                        IndexOptions::builder()
                            .name(PRODUCT_SEARCH_INDEX.to_string())
                            .build(),
                    )
                    .build(),
            )
            .await?;

        let users = self.collection("users").await?;
        users
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "email": 1 })
                    .options(
                        IndexOptions::builder()
                            .name("user_email_unique".to_string())
                            .unique(true)
                            .build(),
                    )
                    .build(),
            )
            .await?;

        info!("MongoDB indexes are in place");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<ObjectId> {
        let result = self.collection(collection).await?.insert_one(doc).await?;
        result
            .inserted_id
            .as_object_id()
            .ok_or(StoreError::Unacknowledged)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        page: Option<Page>,
    ) -> StoreResult<Vec<Document>> {
        let options = page.map(|page| {
            FindOptions::builder()
                .skip(page.skip)
                .limit(page.limit)
                .build()
        });

        let cursor = self
            .collection(collection)
            .await?
            .find(filter)
            .with_options(options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        Ok(self.collection(collection).await?.find_one(filter).await?)
    }

    async fn find_one_and_replace(
        &self,
        collection: &str,
        filter: Document,
        mut replacement: Document,
    ) -> StoreResult<Option<Document>> {
        replacement.remove("_id");
        let options = FindOneAndReplaceOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection(collection)
            .await?
            .find_one_and_replace(filter, replacement)
            .with_options(options)
            .await?)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: Document,
        mut fields: Document,
    ) -> StoreResult<Option<Document>> {
        fields.remove("_id");
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .collection(collection)
            .await?
            .find_one_and_update(filter, doc! { "$set": fields })
            .with_options(options)
            .await?)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> StoreResult<DeleteOutcome> {
        let result = self.collection(collection).await?.delete_one(filter).await?;
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        Ok(self
            .collection(collection)
            .await?
            .count_documents(filter)
            .await?)
    }
}
