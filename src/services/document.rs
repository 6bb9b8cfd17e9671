//! Document service implementation
//!
//! Members upload supporting documents (ID, proof of address, and so on)
//! which admins then approve or reject. The record lives in the database;
//! the bytes live in [`FileStorage`].

use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::database::repositories::DocumentRepository;
use crate::models::document::{CreateDocumentRequest, Document, DocumentStatus};
use crate::models::pagination::{Page, PageQuery};
use crate::services::auth::AuthContext;
use crate::services::storage::FileStorage;
use crate::utils::errors::{AscesaError, Result};
use crate::utils::helpers::{format_bytes, normalize_whitespace, sanitize_filename};

/// A file received from a multipart upload
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub title: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Check an upload against the size limit and MIME allow-list
pub fn validate_upload(upload: &DocumentUpload, config: &UploadConfig) -> Result<()> {
    if upload.bytes.is_empty() {
        return Err(AscesaError::InvalidInput("Uploaded file is empty".to_string()));
    }

    let size = upload.bytes.len() as u64;
    if size > config.max_file_size_bytes {
        return Err(AscesaError::PayloadTooLarge(format!(
            "File is {} but the limit is {}",
            format_bytes(size),
            format_bytes(config.max_file_size_bytes)
        )));
    }

    let mime = upload.mime_type.to_ascii_lowercase();
    if !config.allowed_mime_types.iter().any(|allowed| allowed.eq_ignore_ascii_case(&mime)) {
        return Err(AscesaError::InvalidInput(format!(
            "File type {} is not allowed",
            upload.mime_type
        )));
    }

    Ok(())
}

#[derive(Clone)]
pub struct DocumentService {
    document_repository: DocumentRepository,
    storage: FileStorage,
    config: UploadConfig,
}

impl DocumentService {
    pub fn new(document_repository: DocumentRepository, storage: FileStorage, config: UploadConfig) -> Self {
        Self {
            document_repository,
            storage,
            config,
        }
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.config.max_file_size_bytes
    }

    /// Store an upload for `owner_id` and record it as pending review
    pub async fn upload(&self, owner_id: i64, upload: DocumentUpload) -> Result<Document> {
        validate_upload(&upload, &self.config)?;

        let file_name = sanitize_filename(&upload.file_name);
        let title = upload
            .title
            .map(|t| normalize_whitespace(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| file_name.clone());

        let stored_name = self.storage.save(&file_name, &upload.bytes).await?;

        let created = self
            .document_repository
            .create(CreateDocumentRequest {
                user_id: owner_id,
                title,
                file_name,
                stored_name: stored_name.clone(),
                mime_type: upload.mime_type.to_ascii_lowercase(),
                size_bytes: upload.bytes.len() as i64,
            })
            .await;

        match created {
            Ok(document) => {
                info!(
                    document_id = document.id,
                    user_id = owner_id,
                    size = %format_bytes(upload.bytes.len() as u64),
                    "Document uploaded"
                );
                Ok(document)
            }
            Err(e) => {
                // Don't leave orphaned files behind
                self.storage.discard(&stored_name).await;
                Err(e)
            }
        }
    }

    /// Get a document visible to the caller
    pub async fn get(&self, id: i64, caller: &AuthContext) -> Result<Document> {
        let document = self
            .document_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AscesaError::NotFound("Document".to_string()))?;

        caller.require_owner_or_admin(document.user_id)?;
        Ok(document)
    }

    /// Load the record and the stored bytes
    pub async fn download(&self, id: i64, caller: &AuthContext) -> Result<(Document, Vec<u8>)> {
        let document = self.get(id, caller).await?;
        let bytes = self.storage.read(&document.stored_name).await?;
        debug!(document_id = id, user_id = caller.user_id, "Document downloaded");
        Ok((document, bytes))
    }

    /// Approve or reject a document
    pub async fn set_status(&self, id: i64, status: DocumentStatus) -> Result<Document> {
        let document = self
            .document_repository
            .set_status(id, status)
            .await?
            .ok_or_else(|| AscesaError::NotFound("Document".to_string()))?;

        info!(document_id = id, status = ?status, "Document reviewed");
        Ok(document)
    }

    /// Remove a document; owners may remove their own while still pending
    pub async fn delete(&self, id: i64, caller: &AuthContext) -> Result<()> {
        let document = self.get(id, caller).await?;

        if !caller.is_admin() && document.status != DocumentStatus::Pending {
            warn!(document_id = id, user_id = caller.user_id, "Attempt to delete reviewed document");
            return Err(AscesaError::PermissionDenied(
                "Reviewed documents can only be removed by an administrator".to_string(),
            ));
        }

        if !self.document_repository.delete(id).await? {
            return Err(AscesaError::NotFound("Document".to_string()));
        }
        // The record is gone; a leftover file must not fail the request
        if !self.storage.discard(&document.stored_name).await {
            warn!(document_id = id, "Document deleted but its file was left behind");
        }

        info!(document_id = id, "Document deleted");
        Ok(())
    }

    /// Members see their own documents, admins see all of them
    pub async fn list(&self, query: &PageQuery, caller: &AuthContext) -> Result<Page<Document>> {
        let owner = caller.owner_filter();
        debug!(owner = ?owner, "Listing documents");

        let documents = self
            .document_repository
            .list(owner, query.limit(), query.offset())
            .await?;
        let total = self.document_repository.count(owner).await?;

        Ok(Page::new(documents, total, query))
    }
}
