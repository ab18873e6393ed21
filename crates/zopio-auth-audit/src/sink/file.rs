// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![cfg(feature = "sink-file")]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use zopio_auth_config::{FileSinkConfig, OutcomeFilter};

use crate::error::{AuditError, AuditResult, AuditSinkError};
use crate::record::AuditRecord;
use crate::sink::AuditSink;

struct FileHandle {
	path: String,
	file: tokio::fs::File,
}

/// Appends records as JSON lines. The path is re-expanded on every write, so
/// a dated path such as `decisions-%Y%m%d.jsonl` rolls over at midnight UTC.
pub struct FileAuditSink {
	config: FileSinkConfig,
	handle: Mutex<Option<FileHandle>>,
}

impl FileAuditSink {
	pub fn create(config: FileSinkConfig) -> AuditResult<Self> {
		if config.path.trim().is_empty() {
			return Err(AuditError::SinkError {
				sink: "file".to_string(),
				source: AuditSinkError::Permanent("file sink path is empty".to_string()),
			});
		}

		Ok(Self {
			config,
			handle: Mutex::new(None),
		})
	}

	async fn write_line(&self, expanded_path: &str, line: &str) -> Result<(), AuditSinkError> {
		let mut guard = self.handle.lock().await;

		let needs_reopen = match &*guard {
			Some(handle) => handle.path != expanded_path,
			None => true,
		};

		if needs_reopen {
			if let Some(parent) = Path::new(expanded_path).parent() {
				if !parent.as_os_str().is_empty() {
					tokio::fs::create_dir_all(parent).await.map_err(|e| {
						AuditSinkError::Transient(format!("failed to create directory: {e}"))
					})?;
				}
			}

			let file = OpenOptions::new()
				.create(true)
				.append(true)
				.open(expanded_path)
				.await
				.map_err(|e| AuditSinkError::Transient(format!("failed to open file: {e}")))?;

			*guard = Some(FileHandle {
				path: expanded_path.to_string(),
				file,
			});
		}

		let handle = guard
			.as_mut()
			.ok_or_else(|| AuditSinkError::Permanent("file handle not initialized".to_string()))?;

		handle
			.file
			.write_all(line.as_bytes())
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to write to file: {e}")))?;

		handle
			.file
			.flush()
			.await
			.map_err(|e| AuditSinkError::Transient(format!("failed to flush file: {e}")))?;

		Ok(())
	}
}

#[async_trait]
impl AuditSink for FileAuditSink {
	fn name(&self) -> &str {
		"file"
	}

	fn filter(&self) -> &OutcomeFilter {
		&self.config.outcomes
	}

	async fn write(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError> {
		let expanded_path = expand_path(&self.config.path);
		let line = format_json_line(&record)?;
		self.write_line(&expanded_path, &line).await
	}
}

pub fn format_json_line(record: &AuditRecord) -> Result<String, AuditSinkError> {
	let json = serde_json::to_string(record)
		.map_err(|e| AuditSinkError::Permanent(format!("JSON serialization failed: {e}")))?;
	Ok(format!("{json}\n"))
}

/// Expands `%Y`, `%m` and `%d` to the current UTC date.
pub fn expand_path(path: &str) -> String {
	let now = Utc::now();

	path
		.replace("%Y", &format!("{:04}", now.year()))
		.replace("%m", &format!("{:02}", now.month()))
		.replace("%d", &format!("{:02}", now.day()))
}
