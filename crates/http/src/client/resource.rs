//! Typed remote resources
//!
//! A [`Resource`] binds a route and an entity key to a payload type and
//! exposes the usual read and write operations over it. Reads go through the
//! client's [`QueryCache`](super::cache::QueryCache); writes invalidate the
//! entity's cached reads.

use super::cache::QueryKey;
use super::{ApiClient, ClientError};
use crate::types::ApiEnvelope;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt::Display;
use std::marker::PhantomData;
use tracing::debug;

/// Characters escaped in an id before it becomes a path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Remote collection of `T` reachable under one route
pub struct Resource<T = JsonValue> {
    client: ApiClient,
    entity: String,
    path: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            entity: self.entity.clone(),
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Resource<T> {
    /// Bind `path` to `entity`; the entity key groups cache entries
    pub fn new(client: ApiClient, entity: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            client,
            entity: entity.into(),
            path: path.into().trim_end_matches('/').to_string(),
            _marker: PhantomData,
        }
    }

    /// Entity key of this resource
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Route of this resource
    pub fn path(&self) -> &str {
        &self.path
    }

    /// List entries matching `query`, served from cache while fresh
    pub async fn list<Q>(&self, query: &Q) -> Result<Vec<T>, ClientError>
    where
        Q: Serialize + ?Sized,
    {
        let key = self.list_key(query)?;
        if let Some(cached) = self.client.cache().get(&key) {
            return Ok(serde_json::from_value(cached)?);
        }
        self.fetch_list(key, query).await
    }

    /// List every entry
    pub async fn list_all(&self) -> Result<Vec<T>, ClientError> {
        self.list(&[] as &[(&str, &str)]).await
    }

    /// List entries matching `query`, always hitting the server
    pub async fn refetch_list<Q>(&self, query: &Q) -> Result<Vec<T>, ClientError>
    where
        Q: Serialize + ?Sized,
    {
        let key = self.list_key(query)?;
        self.fetch_list(key, query).await
    }

    /// Fetch one entry by id, served from cache while fresh
    pub async fn get(&self, id: impl Display) -> Result<T, ClientError> {
        let key = QueryKey::new(&self.entity, format!("id:{id}"));
        if let Some(cached) = self.client.cache().get(&key) {
            return Ok(serde_json::from_value(cached)?);
        }

        let path = self.item_path(&id);
        debug!(entity = %self.entity, path = %path, "Fetching entry");
        let data = self
            .client
            .execute_authorized::<ApiEnvelope<JsonValue>, _>(|| {
                self.client.authorized(Method::GET, &path)
            })
            .await?
            .data;

        self.client.cache().insert(key, data.clone());
        Ok(serde_json::from_value(data)?)
    }

    /// Create an entry
    pub async fn create<B>(&self, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let response: ApiEnvelope<T> = self
            .client
            .execute_authorized(|| Ok(self.client.authorized(Method::POST, &self.path)?.json(body)))
            .await?;
        self.client.cache().invalidate_entity(&self.entity);
        Ok(response.data)
    }

    /// Replace an entry
    pub async fn update<B>(&self, id: impl Display, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let path = self.item_path(&id);
        let response: ApiEnvelope<T> = self
            .client
            .execute_authorized(|| Ok(self.client.authorized(Method::PUT, &path)?.json(body)))
            .await?;
        self.client.cache().invalidate_entity(&self.entity);
        Ok(response.data)
    }

    /// Delete an entry
    pub async fn delete(&self, id: impl Display) -> Result<(), ClientError> {
        let path = self.item_path(&id);
        self.client
            .execute_authorized_unit(|| self.client.authorized(Method::DELETE, &path))
            .await?;
        self.client.cache().invalidate_entity(&self.entity);
        Ok(())
    }

    async fn fetch_list<Q>(&self, key: QueryKey, query: &Q) -> Result<Vec<T>, ClientError>
    where
        Q: Serialize + ?Sized,
    {
        debug!(entity = %self.entity, query = %key.discriminator, "Fetching list");
        let data = self
            .client
            .execute_authorized::<ApiEnvelope<JsonValue>, _>(|| {
                Ok(self.client.authorized(Method::GET, &self.path)?.query(query))
            })
            .await?
            .data;

        self.client.cache().insert(key, data.clone());
        Ok(serde_json::from_value(data)?)
    }

    fn list_key<Q>(&self, query: &Q) -> Result<QueryKey, ClientError>
    where
        Q: Serialize + ?Sized,
    {
        Ok(QueryKey::new(
            &self.entity,
            format!("list:{}", serde_json::to_string(query)?),
        ))
    }

    fn item_path(&self, id: &impl Display) -> String {
        item_path(&self.path, id)
    }
}

fn item_path(base: &str, id: &impl Display) -> String {
    format!("{base}/{}", utf8_percent_encode(&id.to_string(), PATH_SEGMENT))
}

/// Master-data lookups
impl ApiClient {
    /// Bind an arbitrary route as a typed resource
    pub fn resource<T: DeserializeOwned>(
        &self,
        entity: impl Into<String>,
        path: impl Into<String>,
    ) -> Resource<T> {
        Resource::new(self.clone(), entity, path)
    }

    /// School grades
    pub fn grades<T: DeserializeOwned>(&self) -> Resource<T> {
        self.resource("grades", &self.routes().grades)
    }

    /// Subjects
    pub fn subjects<T: DeserializeOwned>(&self) -> Resource<T> {
        self.resource("subjects", &self.routes().subjects)
    }

    /// Chapters
    pub fn chapters<T: DeserializeOwned>(&self) -> Resource<T> {
        self.resource("chapters", &self.routes().chapters)
    }

    /// Lessons
    pub fn lessons<T: DeserializeOwned>(&self) -> Resource<T> {
        self.resource("lessons", &self.routes().lessons)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_path_escapes_id() {
        assert_eq!(item_path("/master/grades", &7), "/master/grades/7");
        assert_eq!(item_path("/master/grades", &"a/b"), "/master/grades/a%2Fb");
        assert_eq!(item_path("/master/grades", &"1?x=1"), "/master/grades/1%3Fx=1");
        assert_eq!(item_path("/master/grades", &"50%"), "/master/grades/50%25");
    }
}
