mod model;

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use model::ScheduleStorageModel;
use pillminder_models::schedule::Schedule;
use serde::Serialize;

use crate::{ScheduleStore, StoreError};

/// Stores the whole schedule set as one pretty-printed JSON array.
///
/// Every save rewrites the file: the new content goes to a sibling
/// temporary file which is then renamed over the original.
pub struct JsonScheduleStore {
    path: PathBuf,
}

impl JsonScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ScheduleStore for JsonScheduleStore {
    async fn load_all(&self) -> Result<Vec<Schedule>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!(
                    "Schedule store does not exist yet, starting empty. [path = {:?}]",
                    self.path
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let records: Vec<ScheduleStorageModel> =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        records.into_iter().map(Schedule::try_from).collect()
    }

    async fn save_all(&self, schedules: &[Schedule]) -> Result<(), StoreError> {
        let records: Vec<ScheduleStorageModel> = schedules.iter().map(Into::into).collect();
        let json = to_json(&records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        log::debug!(
            "Saved {} schedules. [path = {:?}]",
            schedules.len(),
            self.path
        );
        Ok(())
    }
}

fn to_json(records: &[ScheduleStorageModel]) -> Result<Vec<u8>, StoreError> {
    let mut json = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut json, formatter);
    records
        .serialize(&mut serializer)
        .map_err(StoreError::Serialize)?;

    Ok(json)
}
