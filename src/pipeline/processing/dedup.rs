use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants;
use crate::types::{EnrichedRecord, RejectionReason};

/// Which part of an enriched record decides whether it is a repeat.
///
/// Keys are taken after enrichment, so rows that only differed in something
/// the enricher normalizes away (status casing, text past a truncation
/// limit) collapse into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Every output column and value
    #[default]
    FullRecord,
    /// Only `(ORDERNUMBER, ORDERLINENUMBER)`
    OrderLine,
}

/// Canonical, column-order independent digest of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digest of `(column, value)` pairs. Pairs are sorted by column and
    /// length-prefixed so no value can imitate a separator.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let mut pairs: Vec<(&str, String)> = pairs.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));

        let mut hasher = Sha256::new();
        for (name, value) in &pairs {
            hasher.update(format!("{}:{}{}:{}", name.len(), name, value.len(), value).as_bytes());
        }
        Fingerprint(hex::encode(hasher.finalize()))
    }

    pub fn of(record: &EnrichedRecord, policy: DedupPolicy) -> Self {
        match policy {
            DedupPolicy::FullRecord => {
                let row = record.to_row();
                Self::from_pairs(row.iter().map(|(name, value)| (name.as_str(), value.canonical())))
            }
            DedupPolicy::OrderLine => Self::from_pairs([
                (constants::ORDER_NUMBER, record.order_number.clone()),
                (constants::ORDER_LINE_NUMBER, record.order_line_number.clone()),
            ]),
        }
    }
}

/// Seen-set for one pipeline run
#[derive(Debug, Default)]
pub struct Deduplicator {
    policy: DedupPolicy,
    seen: HashSet<Fingerprint>,
}

impl Deduplicator {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            seen: HashSet::new(),
        }
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Admit the record if its fingerprint is new this run
    pub fn admit(&mut self, record: &EnrichedRecord) -> Result<(), RejectionReason> {
        if self.seen.insert(Fingerprint::of(record, self.policy)) {
            Ok(())
        } else {
            Err(RejectionReason::DuplicateRecord)
        }
    }

    /// Number of distinct records admitted so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
