// tests/ledger_properties.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use mirrorwatch::fs::mock::MockFileSystem;
use mirrorwatch::ledger::{FileLedger, LedgerStore};

fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.-]{1,12}".prop_filter("no dot-only segments", |s| s != "." && s != "..")
}

proptest! {
    #[test]
    fn repeated_records_leave_one_entry_per_source(
        names in proptest::collection::vec(segment(), 1..6),
        stamps in proptest::collection::vec(timestamp_strategy(), 1..6),
    ) {
        let fs = MockFileSystem::new();
        let mut ledger = FileLedger::new("/state/PathControl.txt", Arc::new(fs));

        let mut expected = std::collections::BTreeMap::new();
        for (i, ts) in stamps.iter().enumerate() {
            let name = &names[i % names.len()];
            let source = PathBuf::from("/src").join(name);
            let destination = PathBuf::from("/dst/src").join(name);
            ledger.record_or_update(&source, &destination, *ts).unwrap();
            expected.insert(source, *ts);
        }

        let entries = ledger.entries().unwrap();
        prop_assert_eq!(entries.len(), expected.len());
        for (source, ts) in &expected {
            let entry = ledger.lookup(source).unwrap().unwrap();
            prop_assert_eq!(entry.last_backup, *ts);
            prop_assert_eq!(entries.iter().filter(|e| &e.source == source).count(), 1);
        }
    }

    #[test]
    fn destination_is_fixed_by_first_record(ts1 in timestamp_strategy(), ts2 in timestamp_strategy()) {
        let fs = MockFileSystem::new();
        let mut ledger = FileLedger::new("/state/PathControl.txt", Arc::new(fs));
        let source = Path::new("/src/f.txt");

        ledger.record_or_update(source, Path::new("/dst/first"), ts1).unwrap();
        ledger.record_or_update(source, Path::new("/dst/second"), ts2).unwrap();

        let entry = ledger.lookup(source).unwrap().unwrap();
        prop_assert_eq!(entry.destination, PathBuf::from("/dst/first"));
        prop_assert_eq!(entry.last_backup, ts2);
    }
}
