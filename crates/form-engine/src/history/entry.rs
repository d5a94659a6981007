// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A submitted request, as remembered for a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Milliseconds since the Unix epoch; unique among the entries of a method.
    pub date_time: i64,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<Value>,
}

impl HistoryEntry {
    /// Whether both entries describe the same request.
    pub fn same_request(&self, other: &HistoryEntry) -> bool {
        self.payload == other.payload && self.query_string == other.query_string
    }

    /// One-line description for history pickers: `<date time>: <payload>?<query>`, cut to
    /// `max_len` characters plus `...` (0 means no limit).
    pub fn summary(&self, max_len: usize) -> String {
        let when = DateTime::from_timestamp_millis(self.date_time)
            .map(|date_time| date_time.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.date_time.to_string());

        let mut summary = format!("{when}: {}", self.payload);
        if let Some(query_string) = &self.query_string {
            summary.push('?');
            summary.push_str(&query_string.to_string());
        }

        if max_len > 0 && summary.chars().count() > max_len {
            let mut truncated: String = summary.chars().take(max_len).collect();
            truncated.push_str("...");
            truncated
        } else {
            summary
        }
    }
}

/// A history entry together with the method it was submitted to.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodHistoryEntry {
    pub method_path: String,
    pub entry: HistoryEntry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    #[multiplatform_test]
    fn wire_format() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "dateTime": 1709285400000i64,
            "payload": {"Name": "Ana"}
        }))
        .unwrap();

        assert_eq!(entry.query_string, None);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"dateTime": 1709285400000i64, "payload": {"Name": "Ana"}})
        );
    }

    #[multiplatform_test]
    fn summaries() {
        let entry = HistoryEntry {
            date_time: 1709285400000,
            payload: json!({"Name": "Ana"}),
            query_string: Some(json!({"dry": "1"})),
        };

        assert_eq!(
            entry.summary(0),
            "2024-03-01 09:30:00: {\"Name\":\"Ana\"}?{\"dry\":\"1\"}"
        );
        assert_eq!(entry.summary(10), "2024-03-01...");
        assert_eq!(entry.summary(1000), entry.summary(0));
    }
}
