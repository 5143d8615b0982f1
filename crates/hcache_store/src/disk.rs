//! Disk-backed store.
//!
//! Each entry is a single `<hash>.entry` file named after the key
//! fingerprint: one line of JSON metadata, a newline, then the raw body.
//! Files are replaced whole through a rename, so readers and concurrent
//! writers only ever see one complete entry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::{CacheKey, CacheStore, CachedEntry, StoreError};

const ORIGIN: &str = "DISK";
const ENTRY_EXT: &str = "entry";
const TMP_MARKER: &str = ".tmp.";

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    /// Full key, checked on read to rule out fingerprint collisions.
    key: String,
    status: u16,
    headers: Vec<(String, Vec<u8>)>,
    stored_at_secs: u64,
    stored_at_nanos: u32,
    body_len: u64,
}

#[derive(Debug)]
pub struct DiskStore {
    dir: PathBuf,
    tmp_seq: AtomicU64,
}

impl DiskStore {
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tmp_seq: AtomicU64::new(0),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &CacheKey) -> PathBuf {
        self.dir
            .join(format!("{:016x}.{ENTRY_EXT}", key.fingerprint()))
    }

    /// Write through a uniquely named temporary file, then rename over the
    /// target. Dropping the future before the rename leaves the old entry.
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(format!("{TMP_MARKER}{}.{seq}", std::process::id()));
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, contents).await?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &CacheKey) -> Result<CachedEntry, StoreError> {
        let raw = match fs::read(self.path(key)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };

        let (meta, body) = split_record(&raw)?;

        if meta.key != key.to_string() {
            debug!(
                target: "hcache::store",
                cache_key = %key,
                stored_key = %meta.key,
                "Fingerprint collision, treating as miss"
            );
            return Err(StoreError::NotFound);
        }

        let entry = decode_entry(meta, body)?;
        debug!(target: "hcache::store", cache_key = %key, layer = "disk", "Loaded entry");
        Ok(entry)
    }

    async fn set(&self, key: &CacheKey, entry: CachedEntry) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).await?;

        let record = encode_record(key, &entry)?;
        self.write_atomic(&self.path(key), &record).await?;

        debug!(
            target: "hcache::store",
            cache_key = %key,
            layer = "disk",
            bytes = entry.body.len(),
            "Stored entry"
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), StoreError> {
        remove_if_exists(&self.path(key)).await
    }

    async fn flush(&self) -> Result<(), StoreError> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            // Leftover temp files from cancelled writes go too.
            let ours = name.ends_with(&format!(".{ENTRY_EXT}"))
                || name.contains(&format!(".{ENTRY_EXT}{TMP_MARKER}"));
            if ours {
                remove_if_exists(&item.path()).await?;
            }
        }
        Ok(())
    }

    fn origin(&self) -> &str {
        ORIGIN
    }
}

/// `<meta json>\n<body>`. serde_json escapes newlines inside strings, so the
/// first newline always ends the metadata.
fn encode_record(key: &CacheKey, entry: &CachedEntry) -> Result<Vec<u8>, StoreError> {
    let since_epoch = entry
        .stored_at
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);

    let meta = EntryMeta {
        key: key.to_string(),
        status: entry.status.as_u16(),
        headers: entry
            .headers
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.as_bytes().to_vec()))
            .collect(),
        stored_at_secs: since_epoch.as_secs(),
        stored_at_nanos: since_epoch.subsec_nanos(),
        body_len: entry.body.len() as u64,
    };

    let mut record = serde_json::to_vec(&meta).map_err(|e| StoreError::Backend(e.to_string()))?;
    record.reserve(entry.body.len() + 1);
    record.push(b'\n');
    record.extend_from_slice(&entry.body);
    Ok(record)
}

fn split_record(raw: &[u8]) -> Result<(EntryMeta, &[u8]), StoreError> {
    let newline = raw
        .iter()
        .position(|b| *b == b'\n')
        .ok_or_else(|| StoreError::InvalidEntry("missing metadata terminator".into()))?;

    let meta: EntryMeta = serde_json::from_slice(&raw[..newline])
        .map_err(|e| StoreError::InvalidEntry(format!("metadata: {e}")))?;

    let body = &raw[newline + 1..];
    if body.len() as u64 != meta.body_len {
        return Err(StoreError::InvalidEntry(format!(
            "body is {} bytes, metadata says {}",
            body.len(),
            meta.body_len
        )));
    }
    Ok((meta, body))
}

fn decode_entry(meta: EntryMeta, body: &[u8]) -> Result<CachedEntry, StoreError> {
    let status = StatusCode::from_u16(meta.status)
        .map_err(|_| StoreError::InvalidEntry(format!("status {}", meta.status)))?;

    let mut headers = HeaderMap::with_capacity(meta.headers.len());
    for (name, value) in meta.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| StoreError::InvalidEntry(format!("header name {name:?}")))?;
        let value = HeaderValue::from_bytes(&value)
            .map_err(|_| StoreError::InvalidEntry(format!("header value for {name}")))?;
        headers.append(name, value);
    }

    let stored_at = UNIX_EPOCH + Duration::new(meta.stored_at_secs, meta.stored_at_nanos);
    Ok(CachedEntry::stored_at(
        status,
        headers,
        Bytes::copy_from_slice(body),
        stored_at,
    ))
}

async fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::DiskStore;
    use crate::{CacheKey, CacheStore, CachedEntry, StoreError};
    use bytes::Bytes;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn sample_entry() -> CachedEntry {
        let mut headers = HeaderMap::new();
        headers.insert("cache-control", HeaderValue::from_static("max-age=60"));
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        CachedEntry::stored_at(
            StatusCode::OK,
            headers,
            Bytes::from_static(b"{\"message\":\"hi\"}\nsecond line"),
            UNIX_EPOCH + Duration::new(1_700_000_000, 123),
        )
    }

    /// Entry whose tag header and content-length both describe its body.
    fn tagged_entry(tag: &'static str, body: &'static [u8]) -> CachedEntry {
        let mut headers = HeaderMap::new();
        headers.insert("x-tag", HeaderValue::from_static(tag));
        headers.insert("content-length", HeaderValue::from(body.len()));
        CachedEntry::stored_at(StatusCode::OK, headers, Bytes::from_static(body), SystemTime::now())
    }

    fn assert_consistent(entry: &CachedEntry) {
        let tag = entry.headers["x-tag"].to_str().expect("tag");
        let len: usize = entry.headers["content-length"]
            .to_str()
            .expect("length")
            .parse()
            .expect("number");
        assert_eq!(len, entry.body.len(), "headers and body come from different writes");
        let expected = if tag == "A" { b'a' } else { b'B' };
        assert!(entry.body.iter().all(|b| *b == expected), "body does not match tag {tag}");
    }

    #[tokio::test]
    async fn stored_entry_is_read_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DiskStore::new(dir.path().join("cache"));
        let key = CacheKey::new("GET", "http://example.com/hello");

        store.set(&key, sample_entry()).await.expect("set");
        let got = store.get(&key).await.expect("get");

        assert_eq!(got.status, StatusCode::OK);
        assert_eq!(got.body.as_ref(), b"{\"message\":\"hi\"}\nsecond line");
        assert_eq!(got.headers.get_all("set-cookie").iter().count(), 2);
        assert_eq!(got.stored_at, UNIX_EPOCH + Duration::new(1_700_000_000, 123));
    }

    #[tokio::test]
    async fn missing_directory_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DiskStore::new(dir.path().join("nope"));
        let err = store
            .get(&CacheKey::new("GET", "http://example.com/"))
            .await
            .expect_err("expected miss");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn corrupt_metadata_is_invalid_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DiskStore::new(dir.path());
        let key = CacheKey::new("GET", "http://example.com/");
        store.set(&key, sample_entry()).await.expect("set");

        tokio::fs::write(store.path(&key), b"{not json\nbody")
            .await
            .expect("overwrite");

        let err = store.get(&key).await.expect_err("expected decode failure");
        assert!(matches!(err, StoreError::InvalidEntry(_)));
    }

    #[tokio::test]
    async fn truncated_body_is_invalid_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DiskStore::new(dir.path());
        let key = CacheKey::new("GET", "http://example.com/");
        store.set(&key, sample_entry()).await.expect("set");

        let path = store.path(&key);
        let raw = tokio::fs::read(&path).await.expect("read");
        tokio::fs::write(&path, &raw[..raw.len() - 3]).await.expect("truncate");

        let err = store.get(&key).await.expect_err("expected decode failure");
        assert!(matches!(err, StoreError::InvalidEntry(_)));
    }

    #[tokio::test]
    async fn overwrite_never_mixes_headers_and_body() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DiskStore::new(dir.path());
        let key = CacheKey::new("GET", "http://example.com/");

        store.set(&key, tagged_entry("A", b"aaaa")).await.expect("set A");
        store.set(&key, tagged_entry("B", b"BBBBBBBBBBBB")).await.expect("set B");

        let got = store.get(&key).await.expect("get");
        assert_eq!(got.headers["x-tag"], "B");
        assert_consistent(&got);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_leave_one_whole_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(DiskStore::new(dir.path()));
        let key = CacheKey::new("GET", "http://example.com/race");

        for _ in 0..100 {
            let a = {
                let (store, key) = (store.clone(), key.clone());
                tokio::spawn(async move { store.set(&key, tagged_entry("A", b"aaaa")).await })
            };
            let b = {
                let (store, key) = (store.clone(), key.clone());
                tokio::spawn(async move {
                    store.set(&key, tagged_entry("B", b"BBBBBBBBBBBB")).await
                })
            };
            let reader = {
                let (store, key) = (store.clone(), key.clone());
                tokio::spawn(async move { store.get(&key).await })
            };

            a.await.expect("join").expect("set A");
            b.await.expect("join").expect("set B");
            match reader.await.expect("join") {
                Ok(entry) => assert_consistent(&entry),
                Err(err) => assert!(err.is_not_found(), "unexpected error {err}"),
            }
            assert_consistent(&store.get(&key).await.expect("get"));
        }
    }

    #[tokio::test]
    async fn cancelled_write_keeps_previous_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DiskStore::new(dir.path());
        let key = CacheKey::new("GET", "http://example.com/");
        store.set(&key, tagged_entry("A", b"aaaa")).await.expect("set A");

        // Polled once, then dropped long before the rename.
        let cut_short =
            tokio::time::timeout(Duration::ZERO, store.set(&key, tagged_entry("B", b"BBBBBBBBBBBB")))
                .await;
        assert!(cut_short.is_err());

        let got = store.get(&key).await.expect("get");
        assert_eq!(got.headers["x-tag"], "A");
        assert_consistent(&got);
    }

    #[tokio::test]
    async fn delete_and_flush() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DiskStore::new(dir.path());
        let a = CacheKey::new("GET", "http://example.com/a");
        let b = CacheKey::new("GET", "http://example.com/b");
        store.set(&a, sample_entry()).await.expect("set");
        store.set(&b, sample_entry()).await.expect("set");
        tokio::fs::write(dir.path().join("keep.txt"), b"unrelated")
            .await
            .expect("write");

        store.delete(&a).await.expect("delete");
        assert!(store.get(&a).await.expect_err("deleted").is_not_found());
        assert!(store.get(&b).await.is_ok());

        store.flush().await.expect("flush");
        assert!(store.get(&b).await.expect_err("flushed").is_not_found());
        assert!(dir.path().join("keep.txt").exists());
    }
}
