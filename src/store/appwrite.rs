use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE},
    Client, Response,
};
use serde_derive::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{DocumentStore, StoreError};
use crate::config::AppwriteConfig;
use crate::model::{validate_document_id, Document, DocumentPatch};

/// Asks the server to generate the document id.
const UNIQUE_ID: &str = "unique()";

const PROJECT_HEADER: &str = "x-appwrite-project";
const KEY_HEADER: &str = "x-appwrite-key";

/// Client of the Appwrite Databases REST API, bound to one collection.
pub struct AppwriteStore {
    client: Client,
    documents_url: Url,
}

#[derive(Deserialize)]
struct DocumentList {
    #[allow(dead_code)]
    total: u64,
    documents: Vec<Document>,
}

#[derive(Serialize)]
struct CreateDocument<'a> {
    #[serde(rename = "documentId")]
    document_id: &'a str,
    data: DocumentData<'a>,
}

#[derive(Serialize)]
struct DocumentData<'a> {
    title: &'a str,
    #[serde(rename = "isCompleted")]
    completed: bool,
}

#[derive(Serialize)]
struct UpdateDocument<'a> {
    data: &'a DocumentPatch,
}

#[derive(Deserialize)]
struct RemoteErrorBody {
    message: String,
}

impl AppwriteStore {
    pub fn new(config: &AppwriteConfig) -> Result<Self, StoreError> {
        let mut documents_url = Url::parse(&config.endpoint)
            .map_err(|err| StoreError::Configuration(format!("endpoint: {}", err)))?;
        documents_url
            .path_segments_mut()
            .map_err(|_| StoreError::Configuration("endpoint cannot be a base url".to_string()))?
            .pop_if_empty()
            .extend(&[
                "databases",
                config.database_id.as_str(),
                "collections",
                config.collection_id.as_str(),
                "documents",
            ]);

        let mut rheaders = HeaderMap::new();
        rheaders.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        rheaders.insert(
            HeaderName::from_static(PROJECT_HEADER),
            header_value(&config.project_id)?,
        );
        if let Some(api_key) = &config.api_key {
            rheaders.insert(HeaderName::from_static(KEY_HEADER), header_value(api_key)?);
        }

        let mut builder = Client::builder().default_headers(rheaders);
        if let Some(timeout) = config.timeout_millis {
            builder = builder.timeout(Duration::from_millis(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            documents_url,
        })
    }

    fn document_url(&self, id: &str) -> Result<Url, StoreError> {
        validate_document_id(id)?;
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Configuration("endpoint cannot be a base url".to_string()))?
            .push(id);
        Ok(url)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, StoreError> {
    HeaderValue::from_str(value)
        .map_err(|err| StoreError::Configuration(format!("header value: {}", err)))
}

/// Turns a non-success response into an error carrying the server's message.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    let message = serde_json::from_str::<RemoteErrorBody>(&body)
        .map(|err| err.message)
        .unwrap_or(body);
    Err(StoreError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DocumentStore for AppwriteStore {
    async fn list(&self) -> Result<Vec<Document>, StoreError> {
        debug!(url = %self.documents_url, "listing documents");
        let response = self
            .client
            .get(self.documents_url.clone())
            .send()
            .await?;
        let list: DocumentList = check(response).await?.json().await?;
        Ok(list.documents)
    }

    async fn create(&self, title: &str, completed: bool) -> Result<Document, StoreError> {
        debug!(url = %self.documents_url, "creating document");
        let body = CreateDocument {
            document_id: UNIQUE_ID,
            data: DocumentData { title, completed },
        };
        let response = self
            .client
            .post(self.documents_url.clone())
            .json(&body)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn update(&self, id: &str, patch: &DocumentPatch) -> Result<Document, StoreError> {
        let url = self.document_url(id)?;
        debug!(url = %url, "updating document");
        let response = self
            .client
            .patch(url)
            .json(&UpdateDocument { data: patch })
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(id)?;
        debug!(url = %url, "deleting document");
        let response = self.client.delete(url).send().await?;
        check(response).await?;
        Ok(())
    }
}
