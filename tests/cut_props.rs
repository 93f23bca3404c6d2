use proptest::prelude::*;

use reelcut::{Frame, FrameSequence, cut_window};

fn indexed(n: usize) -> FrameSequence {
    (0..n)
        .map(|i| Frame::solid_gray(1, 1, (i % 251) as u8))
        .collect()
}

fn expected_len(n: i64, start: i64, count: i64) -> i64 {
    let tail = 0.max(n - start);
    n - (n.min(tail) - 0.max(tail - count))
}

proptest! {
    #[test]
    fn cut_length_matches_formula(n in 0usize..120, start in 0i64..400, count in 0i64..400) {
        let out = indexed(n).cut(start, count).unwrap();
        prop_assert_eq!(out.len() as i64, expected_len(n as i64, start, count));
    }

    #[test]
    fn cut_never_fails_for_huge_arguments(n in 0usize..40, start in 0i64..i64::MAX, count in 0i64..i64::MAX) {
        prop_assert!(indexed(n).cut(start, count).is_ok());
    }

    #[test]
    fn cut_keeps_head_and_tail_in_order(n in 0usize..120, start in 0usize..150, count in 0usize..150) {
        let seq = indexed(n);
        let window = cut_window(n, start, count);
        let out = seq.clone().cut(start as i64, count as i64).unwrap();

        let mut expected = seq.frames()[..window.start].to_vec();
        expected.extend_from_slice(&seq.frames()[window.end..]);
        prop_assert_eq!(out.frames(), expected.as_slice());
    }

    #[test]
    fn append_adds_lengths(a in 0usize..50, b in 0usize..50) {
        let tail = indexed(b);
        let out = indexed(a).append(tail.clone());
        prop_assert_eq!(out.len(), a + b);
        prop_assert_eq!(&out.frames()[a..], tail.frames());
    }
}

#[test]
fn identities() {
    let s = indexed(17);
    assert_eq!(s.clone().cut(0, 0).unwrap(), s);
    assert_eq!(s.clone().append(Vec::new()), s);
}
