//! Property tests for the step series and staged prefixes
//!
//! Uses proptest over initial step, stride and source length.

use lenbench::{FastaRecord, SourceSequence, StepSchedule};
use proptest::prelude::*;

fn arb_schedule() -> impl Strategy<Value = (usize, usize, usize)> {
    (1usize..500, 1usize..200, 1usize..3000)
}

proptest! {
    #[test]
    fn lengths_strictly_increase((initial, stride, total) in arb_schedule()) {
        let lengths: Vec<usize> = StepSchedule::new(initial, stride, total).unwrap().lengths().collect();
        prop_assert!(!lengths.is_empty());
        for pair in lengths.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn lengths_follow_capped_steps((initial, stride, total) in arb_schedule()) {
        let schedule = StepSchedule::new(initial, stride, total).unwrap();
        for (k, length) in schedule.lengths().enumerate() {
            prop_assert_eq!(length, (initial + k * stride).min(total));
        }
    }

    #[test]
    fn final_length_is_source_length((initial, stride, total) in arb_schedule()) {
        let schedule = StepSchedule::new(initial, stride, total).unwrap();
        let lengths: Vec<usize> = schedule.lengths().collect();
        prop_assert_eq!(lengths.last().copied(), Some(total));
        prop_assert_eq!(lengths.iter().filter(|&&l| l == total).count(), 1);
        prop_assert_eq!(lengths.len(), schedule.point_count());
    }

    #[test]
    fn short_source_runs_once(total in 1usize..100, extra in 0usize..500, stride in 1usize..100) {
        let initial = total + extra;
        let lengths: Vec<usize> = StepSchedule::new(initial, stride, total).unwrap().lengths().collect();
        prop_assert_eq!(lengths, vec![total]);
    }

    #[test]
    fn staged_body_is_exact_prefix(residues in "[ACGU]{1,400}", length in 1usize..500) {
        let source = SourceSequence::new("prop", residues.clone()).unwrap();
        let record = FastaRecord::for_prefix("prop", source.prefix(length));
        let expected = &residues[..length.min(residues.len())];
        prop_assert_eq!(record.sequence(), expected);

        let text = record.to_string();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        prop_assert!(header.starts_with('>'));
        let range = format!("0-{}", expected.len());
        prop_assert!(header.ends_with(&range));
        prop_assert_eq!(lines.next(), Some(expected));
        prop_assert_eq!(lines.next(), None);
    }
}
