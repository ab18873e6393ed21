// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process sink for tests and for callers that inspect recent decisions.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use zopio_auth_config::OutcomeFilter;

use crate::error::AuditSinkError;
use crate::record::AuditRecord;
use crate::sink::AuditSink;

const DEFAULT_MAX_RECORDS: usize = 1024;

/// Keeps the most recent records, discarding the oldest beyond `max_records`.
pub struct MemoryAuditSink {
	filter: OutcomeFilter,
	max_records: usize,
	records: Mutex<VecDeque<Arc<AuditRecord>>>,
}

impl MemoryAuditSink {
	pub fn new() -> Self {
		Self::with_capacity(DEFAULT_MAX_RECORDS)
	}

	pub fn with_capacity(max_records: usize) -> Self {
		Self {
			filter: OutcomeFilter::All,
			max_records,
			records: Mutex::new(VecDeque::new()),
		}
	}

	/// Builder: only keep decisions matching `filter`.
	pub fn with_filter(mut self, filter: OutcomeFilter) -> Self {
		self.filter = filter;
		self
	}

	pub async fn records(&self) -> Vec<Arc<AuditRecord>> {
		self.records.lock().await.iter().cloned().collect()
	}

	pub async fn len(&self) -> usize {
		self.records.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.records.lock().await.is_empty()
	}

	pub async fn clear(&self) {
		self.records.lock().await.clear();
	}
}

impl Default for MemoryAuditSink {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
	fn name(&self) -> &str {
		"memory"
	}

	fn filter(&self) -> &OutcomeFilter {
		&self.filter
	}

	async fn write(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError> {
		let mut records = self.records.lock().await;
		if self.max_records == 0 {
			return Ok(());
		}
		while records.len() >= self.max_records {
			records.pop_front();
		}
		records.push_back(record);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use zopio_auth_rbac::{Action, UserContext};
	use zopio_auth_runner::{EvaluationInput, EvaluationResult};

	fn record(resource: &str) -> Arc<AuditRecord> {
		let ctx = UserContext::new("1", "viewer");
		let input = EvaluationInput::new(&[], &ctx, Action::Read, resource);
		Arc::new(AuditRecord::from_evaluation(&input, &EvaluationResult::allowed()))
	}

	#[tokio::test]
	async fn keeps_records_in_order() {
		let sink = MemoryAuditSink::new();
		sink.write(record("a")).await.unwrap();
		sink.write(record("b")).await.unwrap();

		let resources: Vec<_> = sink
			.records()
			.await
			.iter()
			.map(|r| r.resource.clone())
			.collect();
		assert_eq!(resources, vec!["a", "b"]);
	}

	#[tokio::test]
	async fn discards_oldest_beyond_capacity() {
		let sink = MemoryAuditSink::with_capacity(2);
		for resource in ["a", "b", "c"] {
			sink.write(record(resource)).await.unwrap();
		}
		let records = sink.records().await;
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].resource, "b");
	}

	#[tokio::test]
	async fn clear_empties_buffer() {
		let sink = MemoryAuditSink::new();
		sink.write(record("a")).await.unwrap();
		sink.clear().await;
		assert!(sink.is_empty().await);
	}
}
