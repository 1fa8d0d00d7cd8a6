use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dog_core::{DogConfig, DogError, ErrorKind};
use dog_media::prelude::*;
use dog_media::MediaBlob;
use serde_json::{json, Value};

const CONTENTS: &str = "bXkgZmlsZSBjb250ZW50cw==";
const REF: &str = "1234567890123456789054321";

fn contacts_resource(config: MediaConfig) -> MediaResource {
    let storage = ChunkedMediaStorage::new(MemoryRecordStore::new(), &config);
    resource_over(Arc::new(storage), config)
}

fn resource_over(storage: Arc<dyn MediaStorage>, config: MediaConfig) -> MediaResource {
    let schema = ResourceSchema::new("contacts")
        .required_value("ref")
        .media("media");
    MediaResource::new(MediaOrchestrator::new(
        storage,
        Arc::new(MemoryDocumentStore::new()),
        schema,
        config,
    ))
}

fn dog(err: &anyhow::Error) -> &DogError {
    DogError::from_anyhow(err).expect("resource errors carry a DogError")
}

fn text(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn post_base64_media_and_read_it_back() {
    let contacts = contacts_resource(MediaConfig::default());

    let body = WriteBody::from_value(json!({"ref": REF, "media": CONTENTS})).unwrap();
    let created = contacts.create(body).await.unwrap();
    assert_eq!(created["media"], json!(CONTENTS));

    let fetched = contacts.get(&text(&created, "_id")).await.unwrap();
    assert_eq!(fetched["media"], json!(CONTENTS));
    assert_eq!(fetched["ref"], json!(REF));
}

#[tokio::test]
async fn multipart_upload_renders_as_base64() {
    let contacts = contacts_resource(MediaConfig::default());

    let body = WriteBody::multipart()
        .with_field("ref", REF)
        .with_file("media", MediaUpload::new(&b"my file contents"[..], "test.txt"));
    let created = contacts.create(body).await.unwrap();

    assert_eq!(created["media"], json!(CONTENTS));
}

#[tokio::test]
async fn put_with_current_etag_replaces_media() {
    let contacts = contacts_resource(MediaConfig::default());
    let created = contacts
        .create(WriteBody::from_value(json!({"ref": REF, "media": CONTENTS})).unwrap())
        .await
        .unwrap();
    let id = text(&created, "_id");

    let body = WriteBody::from_value(json!({"ref": REF, "media": "bmV3IGNvbnRlbnRz"})).unwrap();
    let updated = contacts
        .update(&id, body, &text(&created, "_etag"))
        .await
        .unwrap();

    assert_eq!(updated["media"], json!("bmV3IGNvbnRlbnRz"));
    assert_ne!(updated["_etag"], created["_etag"]);
    assert_eq!(contacts.get(&id).await.unwrap()["media"], json!("bmV3IGNvbnRlbnRz"));
}

#[tokio::test]
async fn plain_text_for_media_is_unprocessable() {
    let contacts = contacts_resource(MediaConfig::default());

    let body = WriteBody::multipart().with_field("media", "not a file");
    let err = contacts.create(body).await.unwrap_err();

    let dog = dog(&err);
    assert_eq!(dog.code(), 422);
    let payload = dog.to_json();
    assert_eq!(payload["className"], json!("unprocessable"));
    assert!(payload["errors"]["media"][0]
        .as_str()
        .unwrap()
        .contains("file was expected"));
    assert_eq!(payload["errors"]["ref"], json!(["is required"]));
}

#[tokio::test]
async fn deleted_document_is_not_found() {
    let contacts = contacts_resource(MediaConfig::default());
    let created = contacts
        .create(WriteBody::from_value(json!({"ref": REF, "media": CONTENTS})).unwrap())
        .await
        .unwrap();
    let id = text(&created, "_id");

    let removed = contacts.remove(&id, &text(&created, "_etag")).await.unwrap();
    assert_eq!(removed, json!({"_id": id}));

    let err = contacts.get(&id).await.unwrap_err();
    assert_eq!(dog(&err).kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn stale_etag_is_a_conflict() {
    let contacts = contacts_resource(MediaConfig::default());
    let created = contacts
        .create(WriteBody::from_value(json!({"ref": REF, "media": CONTENTS})).unwrap())
        .await
        .unwrap();
    let id = text(&created, "_id");

    let err = contacts
        .patch(&id, WriteBody::from_value(json!({"ref": "y"})).unwrap(), "stale")
        .await
        .unwrap_err();
    assert_eq!(dog(&err).code(), 409);

    let err = contacts.remove(&id, "stale").await.unwrap_err();
    assert_eq!(dog(&err).code(), 409);
    assert_eq!(contacts.get(&id).await.unwrap()["media"], json!(CONTENTS));
}

#[tokio::test]
async fn reference_rendering_comes_from_config() {
    let mut app = DogConfig::new();
    app.set("media.return_base64", "false");
    let config = MediaConfig::from_snapshot(&app.snapshot()).unwrap();
    let contacts = contacts_resource(config);

    let created = contacts
        .create(WriteBody::from_value(json!({"ref": REF, "media": CONTENTS})).unwrap())
        .await
        .unwrap();

    let reference = text(&created, "media");
    assert!(!reference.is_empty());
    assert_ne!(reference, CONTENTS);
}

struct UnreachableStorage;

#[async_trait]
impl MediaStorage for UnreachableStorage {
    async fn put(&self, _: Bytes, _: &str, _: Option<&str>) -> MediaResult<MediaId> {
        Err(MediaError::backend(std::io::Error::other("10.0.0.7:27017 refused connection")))
    }

    async fn get(&self, _: &MediaId) -> MediaResult<Option<MediaBlob>> {
        Ok(None)
    }

    async fn delete(&self, _: &MediaId) -> MediaResult<()> {
        Ok(())
    }

    async fn exists(&self, _: &MediaId) -> MediaResult<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn backend_failure_is_a_sanitized_general_error() {
    let contacts = resource_over(Arc::new(UnreachableStorage), MediaConfig::default());

    let body = WriteBody::from_value(json!({"ref": REF, "media": CONTENTS})).unwrap();
    let err = contacts.create(body).await.unwrap_err();

    let dog = dog(&err);
    assert_eq!(dog.code(), 500);
    let client = dog.sanitize_for_client().to_json();
    assert_eq!(client["message"], json!("Media storage error"));
    assert!(!client.to_string().contains("10.0.0.7"));
}
