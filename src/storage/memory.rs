//! In-memory storage implementation for testing and temporary indices.

use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::storage::{
    Storage, StorageConfig, StorageError, StorageInput, StorageLock, StorageOutput,
};

/// In-memory storage that keeps all files in a shared map.
///
/// Cloning the storage shares the underlying files, so a writer and a
/// reader created from clones see the same data.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    /// File name to content.
    files: Arc<Mutex<HashMap<String, Arc<[u8]>>>>,

    /// Names of currently held locks.
    locks: Arc<Mutex<HashSet<String>>>,

    /// Storage configuration.
    #[allow(dead_code)]
    config: StorageConfig,
}

impl MemoryStorage {
    /// Create a new empty in-memory storage.
    pub fn new(config: StorageConfig) -> Self {
        MemoryStorage {
            files: Arc::new(Mutex::new(HashMap::new())),
            locks: Arc::new(Mutex::new(HashSet::new())),
            config,
        }
    }

    /// Get the total size of all stored files in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.lock().values().map(|data| data.len() as u64).sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        MemoryStorage::new(StorageConfig::default())
    }
}

impl Storage for MemoryStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let files = self.files.lock();
        let data = files
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;
        Ok(Box::new(MemoryInput { data, pos: 0 }))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        Ok(Box::new(MemoryOutput {
            name: name.to_string(),
            buffer: Vec::new(),
            files: Arc::clone(&self.files),
        }))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.lock().contains_key(name)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.files.lock().remove(name);
        Ok(())
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        let files = self.files.lock();
        let data = files
            .get(name)
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;
        Ok(data.len() as u64)
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut files = self.files.lock();
        let data = files
            .remove(old_name)
            .ok_or_else(|| StorageError::FileNotFound(old_name.to_string()))?;
        files.insert(new_name.to_string(), data);
        Ok(())
    }

    fn try_acquire_lock(&self, name: &str) -> Result<Option<Box<dyn StorageLock>>> {
        let mut locks = self.locks.lock();
        if locks.contains(name) {
            return Ok(None);
        }
        locks.insert(name.to_string());
        Ok(Some(Box::new(MemoryLock {
            name: name.to_string(),
            locks: Arc::clone(&self.locks),
            released: false,
        })))
    }

    fn sync(&self) -> Result<()> {
        Ok(())
    }
}

/// Read cursor over a snapshot of a file's content.
#[derive(Debug)]
struct MemoryInput {
    data: Arc<[u8]>,
    pos: usize,
}

impl Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = &self.data[self.pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.pos += n;
        Ok(n)
    }
}

impl StorageInput for MemoryInput {
    fn size(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }
}

/// Buffered writer that publishes the file content on flush.
#[derive(Debug)]
struct MemoryOutput {
    name: String,
    buffer: Vec<u8>,
    files: Arc<Mutex<HashMap<String, Arc<[u8]>>>>,
}

impl MemoryOutput {
    fn publish(&mut self) {
        self.files
            .lock()
            .insert(self.name.clone(), Arc::from(self.buffer.as_slice()));
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.publish();
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.publish();
        Ok(())
    }
}

impl Drop for MemoryOutput {
    fn drop(&mut self) {
        self.publish();
    }
}

/// Lock entry in the shared lock set.
#[derive(Debug)]
struct MemoryLock {
    name: String,
    locks: Arc<Mutex<HashSet<String>>>,
    released: bool,
}

impl StorageLock for MemoryLock {
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&mut self) -> Result<()> {
        if !self.released {
            self.locks.lock().remove(&self.name);
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for MemoryLock {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_back() {
        let storage = MemoryStorage::default();

        let mut output = storage.create_output("test.bin").unwrap();
        output.write_all(b"hello world").unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        assert!(storage.file_exists("test.bin"));
        assert_eq!(storage.file_size("test.bin").unwrap(), 11);

        let mut input = storage.open_input("test.bin").unwrap();
        let mut content = Vec::new();
        input.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"hello world");
    }

    #[test]
    fn test_missing_file() {
        let storage = MemoryStorage::default();

        assert!(!storage.file_exists("missing.bin"));
        assert!(storage.open_input("missing.bin").is_err());
        assert!(storage.file_size("missing.bin").is_err());

        // Deleting a missing file is fine.
        storage.delete_file("missing.bin").unwrap();
    }

    #[test]
    fn test_list_files_sorted() {
        let storage = MemoryStorage::default();

        for name in ["b.bin", "a.bin", "c.bin"] {
            let mut output = storage.create_output(name).unwrap();
            output.write_all(b"x").unwrap();
            output.flush_and_sync().unwrap();
        }

        assert_eq!(storage.list_files().unwrap(), vec!["a.bin", "b.bin", "c.bin"]);
    }

    #[test]
    fn test_rename_file() {
        let storage = MemoryStorage::default();

        let mut output = storage.create_output("meta.json.tmp").unwrap();
        output.write_all(b"{}").unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        storage.rename_file("meta.json.tmp", "meta.json").unwrap();
        assert!(!storage.file_exists("meta.json.tmp"));
        assert!(storage.file_exists("meta.json"));
    }

    #[test]
    fn test_exclusive_lock() {
        let storage = MemoryStorage::default();

        let lock = storage.try_acquire_lock("write.lock").unwrap();
        assert!(lock.is_some());

        // Second acquisition fails while the first is held.
        assert!(storage.try_acquire_lock("write.lock").unwrap().is_none());

        drop(lock);
        assert!(storage.try_acquire_lock("write.lock").unwrap().is_some());
    }

    #[test]
    fn test_clone_shares_files() {
        let storage = MemoryStorage::default();
        let clone = storage.clone();

        let mut output = storage.create_output("shared.bin").unwrap();
        output.write_all(b"data").unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        assert!(clone.file_exists("shared.bin"));
    }

    #[test]
    fn test_input_is_snapshot() {
        let storage = MemoryStorage::default();

        let mut output = storage.create_output("doc.bin").unwrap();
        output.write_all(b"first").unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        let mut input = storage.open_input("doc.bin").unwrap();

        // Overwrite after the input was opened.
        let mut output = storage.create_output("doc.bin").unwrap();
        output.write_all(b"second").unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        let mut content = Vec::new();
        input.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"first");
    }
}
