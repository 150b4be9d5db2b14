//! Memoization of intermediate mosaics between pipeline runs.
//!
//! Entries are keyed by a hash of the stage name and its inputs. The memory
//! tier is a byte-bounded LRU; the optional disk tier stores each mosaic as
//! raw native-endian `.f32`/`.u32` arrays next to a small JSON header.

use std::fs::{self, File};
use std::hash::{Hash, Hasher};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::composite::Mosaic;
use crate::error::{GridProcessorError, Result};
use crate::types::CacheStats;

/// Key for a cached stage output.
pub type StageKey = u64;

/// Hash a stage name and the parts that determine its output.
pub fn stage_key<P: Hash>(stage: &str, parts: &[P]) -> StageKey {
    use std::collections::hash_map::DefaultHasher;

    let mut hasher = DefaultHasher::new();
    stage.hash(&mut hasher);
    parts.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Serialize, Deserialize)]
struct DiskHeader {
    band: String,
    width: usize,
    height: usize,
}

/// Two-tier cache of composited mosaics.
pub struct StageCache {
    cache: LruCache<StageKey, Mosaic>,
    memory_limit: usize,
    current_memory: usize,
    disk_dir: Option<PathBuf>,
    hits: AtomicU64,
    disk_hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl StageCache {
    /// Memory-only cache bounded to `memory_limit` bytes.
    pub fn new(memory_limit: usize) -> Self {
        Self {
            cache: LruCache::unbounded(),
            memory_limit,
            current_memory: 0,
            disk_dir: None,
            hits: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Also persist entries under `dir`, creating it if needed.
    pub fn with_disk_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        self.disk_dir = Some(dir);
        Ok(self)
    }

    pub fn disk_dir(&self) -> Option<&Path> {
        self.disk_dir.as_deref()
    }

    /// Look up a mosaic, falling back to the disk tier.
    pub fn get(&mut self, key: StageKey) -> Option<Mosaic> {
        if let Some(m) = self.cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(m.clone());
        }

        let on_disk = self.disk_dir.as_deref().map(|dir| read_disk_entry(dir, key));
        match on_disk {
            Some(Ok(Some(m))) => {
                self.disk_hits.fetch_add(1, Ordering::Relaxed);
                self.insert_memory(key, m.clone());
                return Some(m);
            }
            Some(Err(e)) => {
                warn!(key = %format!("{key:016x}"), error = %e, "Unreadable stage cache entry")
            }
            Some(Ok(None)) | None => {}
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a mosaic in memory and, when configured, on disk.
    pub fn insert(&mut self, key: StageKey, mosaic: Mosaic) -> Result<()> {
        if let Some(dir) = &self.disk_dir {
            write_disk_entry(dir, key, &mosaic)?;
        }
        self.insert_memory(key, mosaic);
        Ok(())
    }

    /// Return the cached mosaic for `key` or compute and store it.
    pub fn get_or_compute<F>(&mut self, key: StageKey, compute: F) -> Result<Mosaic>
    where
        F: FnOnce() -> Result<Mosaic>,
    {
        if let Some(m) = self.get(key) {
            debug!(key = %format!("{key:016x}"), band = %m.band, "Stage cache hit");
            return Ok(m);
        }
        let mosaic = compute()?;
        self.insert(key, mosaic.clone())?;
        Ok(mosaic)
    }

    fn insert_memory(&mut self, key: StageKey, mosaic: Mosaic) {
        let size = mosaic.size_bytes();
        if size > self.memory_limit {
            return;
        }

        if let Some(old) = self.cache.pop(&key) {
            self.current_memory = self.current_memory.saturating_sub(old.size_bytes());
        }
        while self.current_memory + size > self.memory_limit && !self.cache.is_empty() {
            if let Some((_, evicted)) = self.cache.pop_lru() {
                self.current_memory = self.current_memory.saturating_sub(evicted.size_bytes());
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }

        if let Some((_, evicted)) = self.cache.push(key, mosaic) {
            self.current_memory = self.current_memory.saturating_sub(evicted.size_bytes());
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.current_memory += size;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            entries: self.cache.len(),
            memory_bytes: self.current_memory as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Drop all in-memory entries. Disk entries are kept.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.current_memory = 0;
    }

    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn entry_paths(dir: &Path, key: StageKey) -> (PathBuf, PathBuf, PathBuf) {
    let stem = format!("{key:016x}");
    (
        dir.join(format!("{stem}.json")),
        dir.join(format!("{stem}.f32")),
        dir.join(format!("{stem}.u32")),
    )
}

fn write_disk_entry(dir: &Path, key: StageKey, mosaic: &Mosaic) -> Result<()> {
    let (header_path, data_path, coverage_path) = entry_paths(dir, key);

    File::create(&data_path)?.write_all(bytemuck::cast_slice(&mosaic.data))?;
    File::create(&coverage_path)?.write_all(bytemuck::cast_slice(&mosaic.coverage))?;

    // Header last: its presence marks a complete entry
    let header = DiskHeader {
        band: mosaic.band.clone(),
        width: mosaic.width,
        height: mosaic.height,
    };
    fs::write(&header_path, serde_json::to_vec(&header)?)?;
    Ok(())
}

fn read_disk_entry(dir: &Path, key: StageKey) -> Result<Option<Mosaic>> {
    let (header_path, data_path, coverage_path) = entry_paths(dir, key);
    if !header_path.exists() {
        return Ok(None);
    }

    let header: DiskHeader = serde_json::from_slice(&fs::read(&header_path)?)?;
    let len = header.width * header.height;

    let mut data = vec![0f32; len];
    read_exact_pod(&data_path, bytemuck::cast_slice_mut(&mut data))?;
    let mut coverage = vec![0u32; len];
    read_exact_pod(&coverage_path, bytemuck::cast_slice_mut(&mut coverage))?;

    Ok(Some(Mosaic {
        band: header.band,
        width: header.width,
        height: header.height,
        data,
        coverage,
    }))
}

fn read_exact_pod(path: &Path, buf: &mut [u8]) -> Result<()> {
    let mut file = File::open(path)?;
    let expected = buf.len() as u64;
    let actual = file.metadata()?.len();
    if actual != expected {
        return Err(GridProcessorError::CacheError(format!(
            "{}: expected {} bytes, found {}",
            path.display(),
            expected,
            actual
        )));
    }
    file.read_exact(buf)?;
    Ok(())
}
