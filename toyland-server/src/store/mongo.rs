//! MongoDB backend
//!
//! One client for the life of the process. The client is never shut down;
//! its connections are dropped with the process.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion};
use mongodb::{Client, Collection, IndexModel};

use super::{
    DeleteAck, InsertAck, StoreError, StoreResult, ToyQuery, ToyStore, UpdateAck, NAME_INDEX,
};
use crate::config::StoreConfig;

/// Toy collection backed by MongoDB
#[derive(Clone)]
pub struct MongoToyStore {
    client: Client,
    toys: Collection<Document>,
}

impl MongoToyStore {
    /// Build the client for the configured deployment.
    ///
    /// Pins Stable API v1 in strict mode with deprecation errors.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(config.connection_uri()).await?;
        options.server_api = Some(
            ServerApi::builder()
                .version(ServerApiVersion::V1)
                .strict(true)
                .deprecation_errors(true)
                .build(),
        );

        let client = Client::with_options(options)?;
        let toys = client
            .database(&config.database)
            .collection::<Document>(&config.collection);

        tracing::debug!(
            database = %config.database,
            collection = %config.collection,
            "mongodb client ready"
        );

        Ok(Self { client, toys })
    }
}

#[async_trait]
impl ToyStore for MongoToyStore {
    async fn ensure_name_index(&self) -> StoreResult<String> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(IndexOptions::builder().name(NAME_INDEX.to_string()).build())
            .build();

        let created = self.toys.create_index(index).await?;
        Ok(created.index_name)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn find(&self, query: ToyQuery) -> StoreResult<Vec<Document>> {
        let skip = u64::try_from(query.skip).map_err(|_| StoreError::NegativeSkip(query.skip))?;

        let mut find = self.toys.find(query.filter.to_document()).skip(skip);
        if query.newest_first {
            find = find.sort(doc! { "createdAt": -1 });
        }
        if let Some(limit) = query.limit {
            find = find.limit(limit);
        }

        let cursor = find.await?;
        let toys: Vec<Document> = cursor.try_collect().await?;
        Ok(toys)
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>> {
        Ok(self.toys.find_one(doc! { "_id": id }).await?)
    }

    async fn insert_one(&self, toy: Document) -> StoreResult<InsertAck> {
        let result = self.toys.insert_one(toy).await?;
        Ok(InsertAck {
            acknowledged: true,
            inserted_id: result.inserted_id,
        })
    }

    async fn update_one(&self, id: ObjectId, fields: Document) -> StoreResult<UpdateAck> {
        let result = self
            .toys
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await?;

        Ok(UpdateAck {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(result.upserted_id.is_some()),
            upserted_id: result.upserted_id.unwrap_or(bson::Bson::Null),
        })
    }

    async fn delete_one(&self, id: ObjectId) -> StoreResult<DeleteAck> {
        let result = self.toys.delete_one(doc! { "_id": id }).await?;
        Ok(DeleteAck {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn estimated_count(&self) -> StoreResult<u64> {
        Ok(self.toys.estimated_document_count().await?)
    }
}
