//! Document upload client methods

use super::{ApiClient, ClientError};
use crate::types::{ApiEnvelope, UploadedDocument};
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

/// Multipart field the document is sent under
pub const UPLOAD_FIELD: &str = "file";

impl ApiClient {
    /// Upload a document as `multipart/form-data`
    pub async fn upload_document(
        &self,
        file_name: impl Into<String>,
        contents: impl Into<Vec<u8>>,
        mime: &str,
    ) -> Result<UploadedDocument, ClientError> {
        let file_name = file_name.into();
        let contents = contents.into();

        if contents.is_empty() {
            return Err(ClientError::BadRequest(format!(
                "refusing to upload empty document {file_name:?}"
            )));
        }

        Part::bytes(Vec::new())
            .mime_str(mime)
            .map_err(|e| ClientError::Configuration(format!("invalid mime type {mime:?}: {e}")))?;

        debug!(file = %file_name, bytes = contents.len(), "Uploading document");

        let response: ApiEnvelope<UploadedDocument> = self
            .execute_authorized(|| {
                let part = Part::bytes(contents.clone())
                    .file_name(file_name.clone())
                    .mime_str(mime)?;
                Ok(self
                    .authorized(Method::POST, &self.routes().upload_document)?
                    .multipart(Form::new().part(UPLOAD_FIELD, part)))
            })
            .await?;

        info!(file = %file_name, url = %response.data.url, "Document uploaded");
        Ok(response.data)
    }
}
