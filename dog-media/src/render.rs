use serde_json::{json, Value};
use tracing::warn;

use crate::{
    codec, MediaConfig, MediaId, MediaInfo, MediaRendering, MediaResult, MediaStorage,
    ResourceSchema, StoredDocument,
};

/// Turn a stored document into its response form.
///
/// Media references are materialized according to `config.rendering`;
/// ordinary fields pass through unchanged.
pub async fn render_document(
    storage: &dyn MediaStorage,
    schema: &ResourceSchema,
    config: &MediaConfig,
    doc: &StoredDocument,
) -> MediaResult<Value> {
    let mut out = doc.to_json();

    for field in schema.media_fields() {
        let Some(id) = doc.fields.get(field).and_then(MediaId::from_field) else {
            continue;
        };
        let rendered = render_media(storage, config, &id).await?;
        if rendered.is_null() {
            warn!(document = %doc.id, field, media_id = %id, "document references missing media");
        }
        out[field] = rendered;
    }

    Ok(out)
}

async fn render_media(
    storage: &dyn MediaStorage,
    config: &MediaConfig,
    id: &MediaId,
) -> MediaResult<Value> {
    match config.rendering {
        MediaRendering::Reference if !config.extended_info => Ok(id.to_field()),
        // Metadata only; the payload is never read.
        MediaRendering::Reference => Ok(match storage.info(id).await? {
            Some(info) => extended(id.to_field(), &info),
            None => Value::Null,
        }),
        MediaRendering::Base64 => {
            let Some(blob) = storage.get(id).await? else {
                return Ok(Value::Null);
            };
            let file = Value::String(codec::encode(&blob.data));
            if config.extended_info {
                Ok(extended(file, &blob.info))
            } else {
                Ok(file)
            }
        }
    }
}

fn extended(file: Value, info: &MediaInfo) -> Value {
    json!({
        "file": file,
        "name": info.filename,
        "content_type": info.content_type,
        "length": info.length,
    })
}
