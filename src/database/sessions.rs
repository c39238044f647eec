//! Server-side session storage.
//!
//! # Responsibilities
//! - Persist session records in the `sessions` collection
//! - Ignore expired records on load; let the TTL index purge them
//! - Bound every round-trip by the socket timeout
//!
//! # Record Layout
//! ```text
//! { _id: <session id>, expires: <BSON date>, session: <JSON text> }
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{self, doc};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::{Deserialize, Serialize};
use tower_sessions::cookie::time::OffsetDateTime;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, SessionStore};

use crate::database::DatabaseError;
use crate::resilience::timeouts::with_timeout;

/// Collection holding session records.
pub const SESSION_COLLECTION: &str = "sessions";

/// Lifetime of a session record and its cookie, in seconds (one day).
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24;

/// Type-erased session store handed to the session layer.
///
/// Lets the pipeline stay the same type whether sessions live in MongoDB
/// or, in tests, in memory.
#[derive(Debug, Clone)]
pub struct SessionBackend(Arc<dyn SessionStore>);

impl SessionBackend {
    pub fn new<S: SessionStore>(store: S) -> Self {
        Self(Arc::new(store))
    }
}

#[async_trait]
impl SessionStore for SessionBackend {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        self.0.create(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.0.save(record).await
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        self.0.load(session_id).await
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.0.delete(session_id).await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(rename = "_id")]
    id: String,
    expires: bson::DateTime,
    session: String,
}

impl SessionDocument {
    fn from_record(record: &Record) -> session_store::Result<Self> {
        let session = serde_json::to_string(&record.data)
            .map_err(|e| session_store::Error::Encode(e.to_string()))?;
        Ok(Self {
            id: record.id.to_string(),
            expires: to_bson(record.expiry_date),
            session,
        })
    }

    fn into_record(self, id: Id) -> session_store::Result<Record> {
        let data = serde_json::from_str(&self.session)
            .map_err(|e| session_store::Error::Decode(e.to_string()))?;
        Ok(Record {
            id,
            data,
            expiry_date: from_bson(self.expires)?,
        })
    }
}

fn to_bson(at: OffsetDateTime) -> bson::DateTime {
    bson::DateTime::from_millis((at.unix_timestamp_nanos() / 1_000_000) as i64)
}

fn from_bson(at: bson::DateTime) -> session_store::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(at.timestamp_millis()) * 1_000_000)
        .map_err(|e| session_store::Error::Decode(e.to_string()))
}

/// A server-side session store using MongoDB as its backend.
#[derive(Clone)]
pub struct MongoSessionStore {
    collection: Collection<SessionDocument>,
    operation_timeout: Duration,
}

impl fmt::Debug for MongoSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoSessionStore")
            .field("collection", &self.collection.name())
            .field("operation_timeout", &self.operation_timeout)
            .finish()
    }
}

impl MongoSessionStore {
    pub fn new(database: &Database, operation_timeout: Duration) -> Self {
        Self {
            collection: database.collection(SESSION_COLLECTION),
            operation_timeout,
        }
    }

    /// Create the TTL index on `expires`. Idempotent.
    pub async fn ensure_indexes(&self) -> Result<(), DatabaseError> {
        let index = IndexModel::builder()
            .keys(doc! { "expires": 1 })
            .options(
                IndexOptions::builder()
                    .expire_after(Duration::from_secs(0))
                    .build(),
            )
            .build();
        with_timeout(self.operation_timeout, async {
            self.collection.create_index(index).await
        })
        .await?;
        Ok(())
    }

    async fn bounded<T, F>(&self, operation: F) -> session_store::Result<T>
    where
        F: Future<Output = mongodb::error::Result<T>>,
    {
        with_timeout(self.operation_timeout, operation)
            .await
            .map_err(|e| session_store::Error::Backend(e.to_string()))
    }

    async fn exists(&self, session_id: &Id) -> session_store::Result<bool> {
        let filter = doc! { "_id": session_id.to_string() };
        let found = self
            .bounded(async { self.collection.find_one(filter).await })
            .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    #[tracing::instrument(name = "Create server-side session record", level = "debug", skip_all)]
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        while self.exists(&record.id).await? {
            record.id = Id::default();
        }
        self.save(record).await
    }

    #[tracing::instrument(name = "Save server-side session record", level = "debug", skip_all)]
    async fn save(&self, record: &Record) -> session_store::Result<()> {
        let document = SessionDocument::from_record(record)?;
        let filter = doc! { "_id": document.id.as_str() };
        self.bounded(async {
            self.collection
                .replace_one(filter, &document)
                .upsert(true)
                .await
        })
        .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Load server-side session record", level = "debug", skip_all)]
    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        let filter = doc! {
            "_id": session_id.to_string(),
            "expires": { "$gt": bson::DateTime::now() },
        };
        let document = self
            .bounded(async { self.collection.find_one(filter).await })
            .await?;
        document
            .map(|document| document.into_record(*session_id))
            .transpose()
    }

    #[tracing::instrument(name = "Delete server-side session record", level = "debug", skip_all)]
    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        let filter = doc! { "_id": session_id.to_string() };
        self.bounded(async { self.collection.delete_one(filter).await })
            .await?;
        Ok(())
    }
}
