//! Append-only record log file.
//!
//! `RecordLog<T>` stores any serializable type in a length-prefixed
//! append-only file. The file ledger keeps one log per generation.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::repository::{Result, StorageError};
use crate::types::ByteOffset;

/// Generic file-based append-only log.
///
/// Stores items of type `T` using the format:
/// ```text
/// [u32 length][bincode serialized T]
/// [u32 length][bincode serialized T]
/// ...
/// ```
pub struct RecordLog<T> {
    /// Full path to the log file
    path: PathBuf,
    /// Log file, opened in append mode
    file: File,
    /// Current byte offset for next write
    current_offset: ByteOffset,
    _phantom: PhantomData<T>,
}

impl<T> RecordLog<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create a new, empty log. Replaces any leftover file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        match std::fs::remove_file(&path) {
            Ok(()) => tracing::debug!("Removed leftover log: {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)?;

        tracing::debug!("Created record log: {}", path.display());

        Ok(Self {
            path,
            file,
            current_offset: 0,
            _phantom: PhantomData,
        })
    }

    /// Open a log for appending, creating it if missing.
    ///
    /// Returns the log together with every complete record in it. A torn
    /// record at the tail (crash mid-append) is cut off.
    pub fn open_or_create(path: impl AsRef<Path>) -> Result<(Self, Vec<T>)> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .read(true)
            .open(&path)?;

        let file_size = file.metadata()?.len();
        let (items, valid_len) = read_records::<T>(&path)?;

        if valid_len < file_size {
            tracing::warn!(
                "Truncating torn tail of {}: {} -> {} bytes",
                path.display(),
                file_size,
                valid_len
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        tracing::debug!(
            "Opened record log: {} with {} records at offset {}",
            path.display(),
            items.len(),
            valid_len
        );

        Ok((
            Self {
                path,
                file,
                current_offset: valid_len,
                _phantom: PhantomData,
            },
            items,
        ))
    }

    /// Append an item and make it durable.
    ///
    /// Returns the byte offset where the item was written. On failure the
    /// file is cut back to its previous length.
    pub fn append(&mut self, item: &T) -> Result<ByteOffset> {
        let offset = self.current_offset;

        let frame = encode_frame(item)?;

        if let Err(error) = self.write_durable(&frame) {
            self.rollback_to(offset);
            return Err(error);
        }

        self.current_offset += frame.len() as u64;
        Ok(offset)
    }

    /// Append many items and make them durable with a single sync.
    pub fn append_all<'a>(&mut self, items: impl IntoIterator<Item = &'a T>) -> Result<()>
    where
        T: 'a,
    {
        let mut buffer = Vec::new();
        for item in items {
            buffer.extend_from_slice(&encode_frame(item)?);
        }

        let offset = self.current_offset;
        if let Err(error) = self.write_durable(&buffer) {
            self.rollback_to(offset);
            return Err(error);
        }

        self.current_offset += buffer.len() as u64;
        Ok(())
    }

    fn write_durable(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        self.file.sync_data()?;
        Ok(())
    }

    fn rollback_to(&mut self, offset: ByteOffset) {
        if let Err(e) = self.file.set_len(offset) {
            tracing::warn!(
                "Failed to roll back {} to offset {}: {}",
                self.path.display(),
                offset,
                e
            );
        }
    }

    /// Get the current size of the log in bytes.
    pub fn size(&self) -> ByteOffset {
        self.current_offset
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn encode_frame<T: Serialize>(item: &T) -> Result<Vec<u8>> {
    let bytes = bincode::serialize(item).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let len = u32::try_from(bytes.len())
        .map_err(|_| StorageError::Serialization("record exceeds u32 length".into()))?;

    let mut frame = Vec::with_capacity(4 + bytes.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&bytes);
    Ok(frame)
}

/// Reads every complete record from a log file.
///
/// Returns the records and the byte length they cover. Anything after that
/// length is an incomplete trailing frame.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, ByteOffset)> {
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let mut items = Vec::new();
    let mut offset: ByteOffset = 0;

    loop {
        let mut len_bytes = [0u8; 4];
        match reader.read_exact(&mut len_bytes) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let len = u32::from_le_bytes(len_bytes) as usize;
        if offset + 4 + len as u64 > file_size {
            break;
        }

        let mut data = vec![0u8; len];
        match reader.read_exact(&mut data) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }

        let item = bincode::deserialize(&data).map_err(|e| {
            StorageError::CorruptedData(format!(
                "{} at offset {}: {}",
                path.display(),
                offset,
                e
            ))
        })?;
        items.push(item);
        offset += 4 + len as u64;
    }

    Ok((items, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestItem {
        id: u64,
        name: String,
    }

    fn item(id: u64, name: &str) -> TestItem {
        TestItem {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_append_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.log");

        {
            let (mut log, items) = RecordLog::<TestItem>::open_or_create(&path).unwrap();
            assert!(items.is_empty());
            assert_eq!(log.append(&item(1, "first")).unwrap(), 0);
            assert!(log.append(&item(2, "second")).unwrap() > 0);
        }

        let (log, items) = RecordLog::<TestItem>::open_or_create(&path).unwrap();
        assert_eq!(items, vec![item(1, "first"), item(2, "second")]);
        assert_eq!(log.size(), std::fs::metadata(&path).unwrap().len());
    }

    #[test]
    fn test_torn_tail_is_truncated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.log");

        let intact_len = {
            let (mut log, _) = RecordLog::<TestItem>::open_or_create(&path).unwrap();
            log.append(&item(1, "first")).unwrap();
            log.size()
        };

        // Simulate a crash halfway through the second frame.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&100u32.to_le_bytes()).unwrap();
            file.write_all(&[1, 2, 3]).unwrap();
        }

        let (mut log, items) = RecordLog::<TestItem>::open_or_create(&path).unwrap();
        assert_eq!(items, vec![item(1, "first")]);
        assert_eq!(log.size(), intact_len);

        log.append(&item(2, "second")).unwrap();
        drop(log);
        let (items, _) = read_records::<TestItem>(&path).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_create_replaces_leftover() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test.log");
        std::fs::write(&path, b"garbage").unwrap();

        let mut log = RecordLog::<TestItem>::create(&path).unwrap();
        log.append_all([&item(1, "a"), &item(2, "b")]).unwrap();
        drop(log);

        let (items, _) = read_records::<TestItem>(&path).unwrap();
        assert_eq!(items, vec![item(1, "a"), item(2, "b")]);
    }
}
