use bincode::{Decode, Encode};
use chrono::{DateTime, Utc};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// 落盘格式。没有版本号：解码不干净的一律当作不存在
#[derive(Debug, Clone, Copy, PartialEq, Default, Encode, Decode)]
pub struct PersistedRecord {
    pub last_price: f64,
    pub last_change_percent: f64,
    /// Unix 毫秒，0 = 从未更新
    pub last_update_millis: i64,
    pub sensitivity_factor: f64,
    pub abbreviated: bool,
}

impl PersistedRecord {
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        if self.last_update_millis == 0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.last_update_millis)
    }

    fn is_sane(&self) -> bool {
        self.last_price.is_finite()
            && self.last_price >= 0.0
            && self.last_change_percent.is_finite()
            && self.sensitivity_factor.is_finite()
            && self.last_update_millis >= 0
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("data file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("decoding error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("data file is corrupt: {0}")]
    Corrupt(String),
}

/// 单文件存储，每次整体重写
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, record: &PersistedRecord) -> Result<(), StoreError> {
        let bytes = bincode::encode_to_vec(*record, bincode::config::standard())?;
        fs::write(&self.path, bytes)?;
        debug!("💾 Saved state to {}", self.path.display());
        Ok(())
    }

    pub fn try_load(&self) -> Result<Option<PersistedRecord>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let (record, used): (PersistedRecord, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard())?;
        if used != bytes.len() {
            return Err(StoreError::Corrupt(format!("{} trailing bytes", bytes.len() - used)));
        }
        if !record.is_sane() {
            return Err(StoreError::Corrupt(format!("implausible values {:?}", record)));
        }
        Ok(Some(record))
    }

    /// 不会失败：文件缺失、截断或格式不符时返回默认记录
    pub fn load(&self) -> PersistedRecord {
        match self.try_load() {
            Ok(Some(record)) => record,
            Ok(None) => PersistedRecord::default(),
            Err(e) => {
                warn!("Error loading data file {}: {}", self.path.display(), e);
                PersistedRecord::default()
            }
        }
    }
}
