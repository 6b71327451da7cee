use crate::storage::schema::FieldKind;
use validator::Validate;

entity! {
    /// Metadata of a binary object kept in the object store.
    pub struct FileObject {
        table: "file_object",
        entity: "fileObject",
        resource: "file-objects",
        fields: {
            #[validate(length(max = 80))]
            bucket: String => ("bucket", "bucket", FieldKind::Text),
            #[validate(length(max = 255))]
            object_key: String => ("objectKey", "object_key", FieldKind::Text),
            #[serde(default)]
            #[validate(length(max = 120))]
            content_type: Option<String> => ("contentType", "content_type", FieldKind::Text),
            #[serde(default)]
            file_size: Option<i64> => ("fileSize", "file_size", FieldKind::Long),
            #[serde(default)]
            #[validate(length(max = 64))]
            checksum: Option<String> => ("checksum", "checksum", FieldKind::Text),
            #[serde(default)]
            duration_seconds: Option<i32> => ("durationSeconds", "duration_seconds", FieldKind::Integer),
        },
        links: {},
    }
}

impl FileObject {
    /// Public URL serving this object's bytes.
    pub fn content_url(id: i64) -> String {
        format!("/api/file-objects/{id}/content")
    }
}
