use crate::store::{ObjectStore, StoreError};
use crate::types::IngestFile;

/// Key prefix shared with the external redaction pipeline. Together with
/// [`redacted_key`](crate::redacted_key) this naming convention is the entire
/// protocol between the two systems.
pub const KEY_PREFIX: &str = "text/";

/// Content type recorded when the browser did not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Key the original file is written under.
pub fn ingest_key(file_name: &str) -> String {
    format!("{KEY_PREFIX}{file_name}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub file_name: String,
    pub key: String,
}

/// Write the file's bytes unmodified into the ingest bucket. The object is
/// written once and never touched again from this side; the external
/// pipeline picks it up by key.
pub async fn upload_to_ingest(
    store: &dyn ObjectStore,
    file: &IngestFile,
) -> Result<UploadReceipt, StoreError> {
    let key = ingest_key(&file.name);
    let content_type = file.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
    store.put(&key, file.bytes.clone(), content_type).await?;
    Ok(UploadReceipt {
        file_name: file.name.clone(),
        key,
    })
}
