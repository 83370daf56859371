//! Record matching
//!
//! A challenge owns exactly one record: TXT, its record name, its key as the
//! value. Matching on the value as well as the name is what lets several
//! validations under the same `_acme-challenge` label run side by side:
//! each one only ever sees, and deletes, its own record.

use crate::traits::{DnsRecord, RecordType};

/// Find the TXT record with exactly this name and value
///
/// Returns the first match in provider order. Records with the same name
/// but a different value are never returned. Comparison is exact.
pub fn find_match<'a>(
    records: &'a [DnsRecord],
    name: &str,
    value: &str,
) -> Option<&'a DnsRecord> {
    records.iter().find(|record| {
        record.record_type == RecordType::TXT && record.name == name && record.value == value
    })
}
