//! Category grouping view
//!
//! Partitions a flat record list into named buckets using a fixed
//! category enumeration. Records whose category matches none of the
//! declared values are not silently dropped; they are surfaced in an
//! explicit "Uncategorized" bucket. Grouping is pure view logic with
//! no network calls.

use serde::Serialize;

/// Bucket label used for records matching no declared category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One category bucket with its ordered records
#[derive(Debug, Clone, Serialize)]
pub struct CategoryBucket<R> {
    pub category: String,
    pub records: Vec<R>,
}

/// Result of grouping a record list
#[derive(Debug, Clone, Serialize)]
pub struct GroupedRecords<R> {
    /// One bucket per declared category, in declaration order,
    /// including empty ones
    pub buckets: Vec<CategoryBucket<R>>,
    /// Records whose category matched no declared value
    pub uncategorized: Vec<R>,
}

impl<R> GroupedRecords<R> {
    /// Records in one declared category, if it exists
    pub fn bucket(&self, category: &str) -> Option<&[R]> {
        self.buckets
            .iter()
            .find(|b| b.category == category)
            .map(|b| b.records.as_slice())
    }
}

/// Group records into the declared categories, preserving input order
/// within each bucket
pub fn group_by<R: Clone>(
    records: &[R],
    categories: &[&str],
    category_of: impl Fn(&R) -> &str,
) -> GroupedRecords<R> {
    let mut buckets: Vec<CategoryBucket<R>> = categories
        .iter()
        .map(|c| CategoryBucket {
            category: (*c).to_string(),
            records: Vec::new(),
        })
        .collect();
    let mut uncategorized = Vec::new();

    for record in records {
        let category = category_of(record);
        match buckets.iter_mut().find(|b| b.category == category) {
            Some(bucket) => bucket.records.push(record.clone()),
            None => uncategorized.push(record.clone()),
        }
    }

    GroupedRecords {
        buckets,
        uncategorized,
    }
}
