// libs/document-cell/src/services/document.rs
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DbError, SupabaseClient};
use shared_models::auth::AuthUser;

use crate::models::{
    AttachDocumentRequest, Document, DocumentError, DocumentFilter, DocumentStatistics,
    DocumentType, DocumentTypeStat, Page, Pagination,
};

pub struct DocumentService {
    supabase: SupabaseClient,
    bucket: String,
}

impl DocumentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            bucket: config.document_bucket.clone(),
        }
    }

    /// Store the decoded payload under the owning patient's folder and insert
    /// the record. The appointment must exist and belong to the caller.
    pub async fn attach_document(
        &self,
        caller: &AuthUser,
        appointment_id: Uuid,
        request: AttachDocumentRequest,
        auth_token: &str,
    ) -> Result<Document, DocumentError> {
        debug!("Attaching document to appointment: {}", appointment_id);

        if request.title.trim().is_empty() {
            return Err(DocumentError::Validation(
                "El título del documento es requerido".to_string(),
            ));
        }

        let patient_id = self
            .appointment_owner(appointment_id, caller, auth_token)
            .await?;

        let base64_data = match request.file.split_once(";base64,") {
            Some((_, data)) => data,
            None => request.file.as_str(),
        };
        let file_data = BASE64
            .decode(base64_data)
            .map_err(|e| DocumentError::Validation(format!("Archivo base64 inválido: {}", e)))?;
        if file_data.is_empty() {
            return Err(DocumentError::Validation("Archivo requerido".to_string()));
        }

        let file_id = Uuid::new_v4();
        let extension = extension_for(&request.content_type);
        let stored_filename = format!("{}.{}", file_id, extension);
        let object_path = format!("{}/{}", patient_id, stored_filename);

        let upload_path = format!("/storage/v1/object/{}/{}", self.bucket, object_path);
        let size_bytes = file_data.len() as i64;
        self.supabase
            .upload_bytes(&upload_path, Some(auth_token), file_data, &request.content_type)
            .await?;

        let url = self.supabase.get_public_url(&format!(
            "/storage/v1/object/public/{}/{}",
            self.bucket, object_path
        ));

        let doc_data = json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "appointment_id": appointment_id,
            "stored_filename": stored_filename,
            "title": request.title,
            "url": url,
            "document_type": request.document_type.to_string(),
            "size_bytes": size_bytes,
            "uploaded_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Document> = self
            .supabase
            .insert_returning("/rest/v1/documents", Some(auth_token), doc_data)
            .await?;

        let document = result
            .into_iter()
            .next()
            .ok_or_else(|| DocumentError::Database("insert returned no row".to_string()))?;

        info!(
            "Document {} attached to appointment {}",
            document.id, appointment_id
        );
        Ok(document)
    }

    /// Documents belonging to one appointment, newest upload first.
    pub async fn appointment_documents(
        &self,
        caller: &AuthUser,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Document>, DocumentError> {
        self.appointment_owner(appointment_id, caller, auth_token)
            .await?;

        let path = format!(
            "/rest/v1/documents?appointment_id=eq.{}&order=uploaded_at.desc",
            appointment_id
        );
        let documents = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;
        Ok(documents)
    }

    /// The calling patient's own documents across all appointments, newest
    /// upload first, with an exact total for the pagination envelope.
    pub async fn patient_documents(
        &self,
        patient_id: Uuid,
        filter: &DocumentFilter,
        auth_token: &str,
    ) -> Result<Page<Document>, DocumentError> {
        let limit = filter.effective_limit();
        let offset = filter.effective_offset();

        let mut path = format!("/rest/v1/documents?patient_id=eq.{}", patient_id);
        if let Some(document_type) = filter.document_type {
            path.push_str(&format!("&document_type=eq.{}", document_type));
        }
        path.push_str(&format!(
            "&order=uploaded_at.desc&limit={}&offset={}",
            limit, offset
        ));

        let (rows, total) = self
            .supabase
            .request_with_count::<Document>(&path, Some(auth_token))
            .await?;

        Ok(Page {
            data: rows,
            pagination: Pagination::new(total, limit, offset),
        })
    }

    /// Per-type counts and byte totals over the calling patient's documents.
    pub async fn document_statistics(
        &self,
        patient_id: Uuid,
        auth_token: &str,
    ) -> Result<DocumentStatistics, DocumentError> {
        #[derive(serde::Deserialize)]
        struct StatRow {
            document_type: DocumentType,
            size_bytes: i64,
        }

        let path = format!(
            "/rest/v1/documents?patient_id=eq.{}&select=document_type,size_bytes",
            patient_id
        );
        let rows: Vec<StatRow> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        const ALL_TYPES: [DocumentType; 5] = [
            DocumentType::Analysis,
            DocumentType::MealPlan,
            DocumentType::MedicalReport,
            DocumentType::Photo,
            DocumentType::Other,
        ];

        let mut by_type = Vec::new();
        for document_type in ALL_TYPES {
            let matching: Vec<&StatRow> = rows
                .iter()
                .filter(|row| row.document_type == document_type)
                .collect();
            if matching.is_empty() {
                continue;
            }
            by_type.push(DocumentTypeStat {
                document_type,
                count: matching.len() as i64,
                total_bytes: matching.iter().map(|row| row.size_bytes).sum(),
            });
        }

        Ok(DocumentStatistics {
            total_documents: rows.len() as i64,
            total_bytes: rows.iter().map(|row| row.size_bytes).sum(),
            by_type,
        })
    }

    /// Fetch the blob for download. A record whose blob is gone reads as
    /// `FileMissing`, not as an internal error.
    pub async fn download_document(
        &self,
        caller: &AuthUser,
        document_id: Uuid,
        auth_token: &str,
    ) -> Result<(Document, Vec<u8>, String), DocumentError> {
        let document = self.fetch_record(document_id, caller, auth_token).await?;

        let blob_path = format!(
            "/storage/v1/object/{}/{}/{}",
            self.bucket, document.patient_id, document.stored_filename
        );
        let (bytes, content_type) = self
            .supabase
            .fetch_bytes(&blob_path, Some(auth_token))
            .await
            .map_err(|e| match e {
                DbError::NotFound(_) => DocumentError::FileMissing,
                other => DocumentError::Database(other.to_string()),
            })?;

        let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
        Ok((document, bytes, content_type))
    }

    /// Remove the record; the blob delete is attempted first and a failure
    /// there only logs.
    pub async fn delete_document(
        &self,
        caller: &AuthUser,
        document_id: Uuid,
        auth_token: &str,
    ) -> Result<(), DocumentError> {
        let document = self.fetch_record(document_id, caller, auth_token).await?;

        let blob_path = format!(
            "/storage/v1/object/{}/{}/{}",
            self.bucket, document.patient_id, document.stored_filename
        );
        if let Err(e) = self.supabase.delete(&blob_path, Some(auth_token)).await {
            warn!("Failed to delete blob for document {}: {}", document_id, e);
        }

        let record_path = format!("/rest/v1/documents?id=eq.{}", document_id);
        self.supabase
            .delete(&record_path, Some(auth_token))
            .await?;

        info!("Document {} deleted", document_id);
        Ok(())
    }

    async fn fetch_record(
        &self,
        document_id: Uuid,
        caller: &AuthUser,
        auth_token: &str,
    ) -> Result<Document, DocumentError> {
        let path = format!("/rest/v1/documents?id=eq.{}", document_id);
        let result: Vec<Document> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let document = result.into_iter().next().ok_or(DocumentError::NotFound)?;
        if !caller.can_access(&document.patient_id.to_string()) {
            warn!(
                "User {} denied access to document {}",
                caller.id, document_id
            );
            return Err(DocumentError::AccessDenied);
        }
        Ok(document)
    }

    /// Resolves the owning patient of an appointment, enforcing the
    /// owner-or-admin rule on the way.
    async fn appointment_owner(
        &self,
        appointment_id: Uuid,
        caller: &AuthUser,
        auth_token: &str,
    ) -> Result<Uuid, DocumentError> {
        let path = format!(
            "/rest/v1/appointments?id=eq.{}&select=id,patient_id",
            appointment_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await?;

        let row = result
            .into_iter()
            .next()
            .ok_or(DocumentError::AppointmentNotFound)?;
        let patient_id = row["patient_id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| DocumentError::Database("malformed appointment row".to_string()))?;

        if !caller.can_access(&patient_id.to_string()) {
            warn!(
                "User {} denied access to appointment {} documents",
                caller.id, appointment_id
            );
            return Err(DocumentError::AccessDenied);
        }
        Ok(patient_id)
    }
}

fn extension_for(content_type: &str) -> &str {
    match content_type {
        "application/pdf" => "pdf",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "text/plain" => "txt",
        other => other.rsplit('/').next().unwrap_or("bin"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_content_types_map_to_extensions() {
        assert_eq!(extension_for("application/pdf"), "pdf");
        assert_eq!(extension_for("image/jpeg"), "jpg");
    }

    #[test]
    fn unknown_content_type_falls_back_to_subtype() {
        assert_eq!(extension_for("application/zip"), "zip");
    }
}
