use seizure_watch::inference::{InferenceOutcome, Label};
use seizure_watch::ledger::ResultLedger;
use std::sync::Arc;
use std::thread;

fn outcome(position: u64) -> InferenceOutcome {
    let label = if position % 2 == 0 { Label::Seizure } else { Label::NoSeizure };
    InferenceOutcome {
        label,
        rendered_message: label.message().to_string(),
        sequence_position: position,
    }
}

fn writer_done(ledger: &ResultLedger) -> bool {
    ledger.total_appended() >= 50_000
}

#[test]
fn test_ledger_keeps_arrival_order() {
    let ledger = ResultLedger::new(10);
    for i in 0..4 {
        ledger.append(outcome(i));
    }

    let positions: Vec<u64> = ledger.snapshot().iter().map(|o| o.sequence_position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3]);
    assert_eq!(ledger.latest().unwrap().sequence_position, 3);

    let recent: Vec<u64> = ledger.recent(2).iter().map(|o| o.sequence_position).collect();
    assert_eq!(recent, vec![3, 2]);
}

#[test]
fn test_ledger_evicts_oldest_when_full() {
    let ledger = ResultLedger::new(3);
    for i in 0..7 {
        ledger.append(outcome(i));
    }

    let positions: Vec<u64> = ledger.snapshot().iter().map(|o| o.sequence_position).collect();
    assert_eq!(positions, vec![4, 5, 6]);
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.total_appended(), 7);
    assert_eq!(ledger.evicted(), 4);
}

#[test]
fn test_snapshot_is_a_copy() {
    let ledger = ResultLedger::new(5);
    ledger.append(outcome(0));

    let snapshot = ledger.snapshot();
    ledger.append(outcome(1));

    assert_eq!(snapshot.len(), 1);
    assert_eq!(ledger.len(), 2);
}

#[test]
fn test_readers_see_ordered_prefixes_while_writer_appends() {
    let ledger = Arc::new(ResultLedger::new(1000));

    let writer = {
        let ledger = ledger.clone();
        thread::spawn(move || {
            for i in 0..500 {
                ledger.append(outcome(i));
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let snapshot = ledger.snapshot();
                    for (expected, entry) in snapshot.iter().enumerate() {
                        assert_eq!(entry.sequence_position, expected as u64);
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(ledger.len(), 500);
}

#[test]
fn test_eviction_count_stays_consistent_while_writer_appends() {
    let ledger = Arc::new(ResultLedger::new(100));

    let writer = {
        let ledger = ledger.clone();
        thread::spawn(move || {
            for i in 0..50_000 {
                ledger.append(outcome(i));
            }
        })
    };

    let reader = {
        let ledger = ledger.clone();
        thread::spawn(move || {
            let mut last = 0;
            while !writer_done(&ledger) {
                let evicted = ledger.evicted();
                assert!(evicted >= last);
                assert!(evicted <= ledger.total_appended());
                last = evicted;
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(ledger.evicted(), 50_000 - 100);
    assert_eq!(ledger.len(), 100);
}

#[test]
fn test_eviction_count_under_large_capacity() {
    let ledger = Arc::new(ResultLedger::new(1_000_000));

    let writer = {
        let ledger = ledger.clone();
        thread::spawn(move || {
            for i in 0..100_000 {
                ledger.append(outcome(i));
            }
        })
    };

    while !writer.is_finished() {
        assert_eq!(ledger.evicted(), 0);
    }
    writer.join().unwrap();
    assert_eq!(ledger.evicted(), 0);
}
