use std::sync::Arc;

use bytes::Bytes;
use dog_media::prelude::*;
use dog_media::{ChunkRecord, ChunkRecordStore, FileRecord};
use futures_util::{stream, StreamExt};
use proptest::prelude::*;

fn storage_with_chunk(chunk_size: usize) -> (ChunkedMediaStorage, MemoryRecordStore) {
    let records = MemoryRecordStore::new();
    let config = MediaConfig::default().with_chunk_size(chunk_size);
    (ChunkedMediaStorage::new(records.clone(), &config), records)
}

#[tokio::test]
async fn put_then_get_returns_same_bytes_and_metadata() {
    let (storage, _) = storage_with_chunk(4);
    let payload = Bytes::from_static(b"my file contents");

    let id = storage
        .put(payload.clone(), "test.txt", Some("text/plain"))
        .await
        .unwrap();

    assert!(storage.exists(&id).await.unwrap());
    let blob = storage.get(&id).await.unwrap().expect("blob stored");
    assert_eq!(blob.data, payload);
    assert_eq!(blob.filename(), "test.txt");
    assert_eq!(blob.content_type(), Some("text/plain"));
    assert_eq!(blob.info.length, payload.len() as u64);
}

#[tokio::test]
async fn every_put_issues_a_fresh_reference() {
    let (storage, _) = storage_with_chunk(8);
    let a = storage.put(Bytes::from_static(b"same"), "a", None).await.unwrap();
    let b = storage.put(Bytes::from_static(b"same"), "a", None).await.unwrap();
    assert_ne!(a, b);
}

#[tokio::test]
async fn payload_is_split_into_ceil_length_over_chunk_size_records() {
    let (storage, records) = storage_with_chunk(4);

    let exact = storage.put(Bytes::from(vec![1u8; 8]), "exact", None).await.unwrap();
    let ragged = storage.put(Bytes::from(vec![2u8; 9]), "ragged", None).await.unwrap();
    let small = storage.put(Bytes::from(vec![3u8; 1]), "small", None).await.unwrap();

    assert_eq!(records.chunk_count(&exact), 2);
    assert_eq!(records.chunk_count(&ragged), 3);
    assert_eq!(records.chunk_count(&small), 1);
    assert_eq!(records.file_count(), 3);
}

#[tokio::test]
async fn empty_payload_has_parent_but_no_chunks() {
    let (storage, records) = storage_with_chunk(4);

    let id = storage.put(Bytes::new(), "empty.bin", None).await.unwrap();

    assert_eq!(records.chunk_count(&id), 0);
    let blob = storage.get(&id).await.unwrap().expect("empty blob exists");
    assert!(blob.data.is_empty());
    assert_eq!(blob.info.length, 0);
}

#[tokio::test]
async fn delete_removes_parent_and_chunks_and_is_idempotent() {
    let (storage, records) = storage_with_chunk(4);
    let id = storage
        .put(Bytes::from_static(b"0123456789"), "digits", None)
        .await
        .unwrap();

    storage.delete(&id).await.unwrap();

    assert!(!storage.exists(&id).await.unwrap());
    assert_eq!(storage.get(&id).await.unwrap(), None);
    assert_eq!(records.file_count(), 0);
    assert_eq!(records.total_chunks(), 0);

    storage.delete(&id).await.unwrap();
}

#[tokio::test]
async fn unknown_reference_is_absent_not_an_error() {
    let (storage, _) = storage_with_chunk(4);
    let id = MediaId::from("never-issued");

    assert_eq!(storage.get(&id).await.unwrap(), None);
    assert!(!storage.exists(&id).await.unwrap());
    storage.delete(&id).await.unwrap();
}

#[tokio::test]
async fn open_streams_chunks_in_order() {
    let (storage, _) = storage_with_chunk(3);
    let id = storage
        .put(Bytes::from_static(b"abcdefgh"), "letters", None)
        .await
        .unwrap();

    let (info, body) = storage.open(&id).await.unwrap().expect("blob exists");
    assert_eq!(info.length, 8);

    let pieces: Vec<Bytes> = body.map(|piece| piece.unwrap()).collect().await;
    assert_eq!(
        pieces,
        vec![
            Bytes::from_static(b"abc"),
            Bytes::from_static(b"def"),
            Bytes::from_static(b"gh"),
        ]
    );
    assert!(storage.open(&MediaId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn put_stream_rechunks_irregular_pieces() {
    let (storage, records) = storage_with_chunk(4);
    let pieces: Vec<std::io::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"a")),
        Ok(Bytes::from_static(b"bcdefg")),
        Ok(Bytes::new()),
        Ok(Bytes::from_static(b"hij")),
    ];

    let id = storage
        .put_stream(Box::pin(stream::iter(pieces)), "pieces.txt", None)
        .await
        .unwrap();

    assert_eq!(records.chunk_count(&id), 3);
    let blob = storage.get(&id).await.unwrap().unwrap();
    assert_eq!(&blob.data[..], b"abcdefghij");
    assert_eq!(
        storage.info(&id).await.unwrap().map(|info| info.length),
        Some(10)
    );
}

#[tokio::test]
async fn oversized_payload_is_rejected_without_leftovers() {
    let records = MemoryRecordStore::new();
    let config = MediaConfig::default()
        .with_chunk_size(2)
        .with_max_media_bytes(5);
    let storage = ChunkedMediaStorage::new(records.clone(), &config);

    let err = storage
        .put(Bytes::from(vec![0u8; 6]), "big.bin", None)
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::TooLarge { size: 6, max: 5 }));
    assert_eq!(records.file_count(), 0);
    assert_eq!(records.total_chunks(), 0);
}

#[tokio::test]
async fn failing_stream_discards_written_chunks() {
    let (storage, records) = storage_with_chunk(2);
    let pieces: Vec<std::io::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"abcd")),
        Err(std::io::Error::other("client went away")),
    ];

    let err = storage
        .put_stream(Box::pin(stream::iter(pieces)), "partial", None)
        .await
        .unwrap_err();

    assert!(matches!(err, MediaError::Io { .. }));
    assert_eq!(records.total_chunks(), 0);
    assert_eq!(records.file_count(), 0);
}

#[tokio::test]
async fn missing_chunk_under_live_parent_is_corruption() {
    let records = MemoryRecordStore::new();
    let storage =
        ChunkedMediaStorage::new(records.clone(), &MediaConfig::default().with_chunk_size(2));
    let id = MediaId::new();

    records
        .insert_chunk(ChunkRecord {
            files_id: id.clone(),
            n: 0,
            data: Bytes::from_static(b"ab"),
        })
        .await
        .unwrap();
    records
        .insert_file(FileRecord {
            id: id.clone(),
            filename: "broken".to_string(),
            content_type: None,
            length: 4,
            chunk_size: 2,
            uploaded_at: chrono::Utc::now(),
        })
        .await
        .unwrap();

    let err = storage.get(&id).await.unwrap_err();
    assert!(matches!(err, MediaError::Corrupt { .. }));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn blobs_are_read_with_their_recorded_chunk_size() {
    let records = MemoryRecordStore::new();
    let writer = ChunkedMediaStorage::new(records.clone(), &MediaConfig::default().with_chunk_size(3));
    let id = writer
        .put(Bytes::from_static(b"0123456"), "digits", None)
        .await
        .unwrap();

    let shared: Arc<dyn ChunkRecordStore> = Arc::new(records);
    let reader = ChunkedMediaStorage::with_records(shared, &MediaConfig::default().with_chunk_size(5));

    let blob = reader.get(&id).await.unwrap().unwrap();
    assert_eq!(&blob.data[..], b"0123456");
}

#[test]
#[should_panic(expected = "chunk size must be positive")]
fn zero_chunk_size_is_refused() {
    let _ = ChunkedMediaStorage::new(
        MemoryRecordStore::new(),
        &MediaConfig::default().with_chunk_size(0),
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn stored_bytes_round_trip_for_any_chunk_size(
        data in proptest::collection::vec(any::<u8>(), 0..2048),
        chunk_size in 1usize..300,
    ) {
        let (storage, records) = storage_with_chunk(chunk_size);
        let expected = Bytes::from(data);

        let (blob, chunks) = tokio_test::block_on(async {
            let id = storage.put(expected.clone(), "prop.bin", None).await.unwrap();
            let blob = storage.get(&id).await.unwrap().unwrap();
            (blob, records.chunk_count(&id))
        });

        prop_assert_eq!(blob.data, expected.clone());
        prop_assert_eq!(chunks, expected.len().div_ceil(chunk_size));
    }
}
