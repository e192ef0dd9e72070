//! Exam generation client methods

use super::resource::Resource;
use super::{ApiClient, ClientError};
use crate::types::ApiEnvelope;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

impl ApiClient {
    /// Ask the server to generate an exam from `params`
    pub async fn generate_exam<B, T>(&self, params: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("Requesting exam generation");
        let response: ApiEnvelope<T> = self
            .execute_authorized(|| {
                Ok(self
                    .authorized(Method::POST, &self.routes().exam_generate)?
                    .json(params))
            })
            .await?;

        // A new exam makes cached exam listings stale
        self.cache().invalidate_entity("exams");
        Ok(response.data)
    }

    /// Previously generated exams
    pub fn exams<T: DeserializeOwned>(&self) -> Resource<T> {
        self.resource("exams", &self.routes().exams)
    }
}
