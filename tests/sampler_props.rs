use std::path::PathBuf;

use proptest::prelude::*;

use screeneval::frames::{sample_frames, Frame};

fn make_frames(n: usize) -> Vec<Frame> {
    (0..n)
        .map(|i| Frame {
            source_path: PathBuf::from(format!("/tmp/frame_{i:05}.jpg")),
            timestamp_seconds: i as f64 * 0.5,
            frame_index: i as u32,
        })
        .collect()
}

proptest! {
    #[test]
    fn output_length_is_min_of_n_and_m(n in 0usize..400, m in 2usize..64) {
        let frames = make_frames(n);
        let sampled = sample_frames(&frames, m);
        prop_assert_eq!(sampled.len(), n.min(m));
    }

    #[test]
    fn truncation_includes_both_endpoints(n in 3usize..400, m in 2usize..64) {
        prop_assume!(m < n);
        let frames = make_frames(n);
        let sampled = sample_frames(&frames, m);
        prop_assert_eq!(sampled.first().unwrap().frame_index, 0);
        prop_assert_eq!(sampled.last().unwrap().frame_index, (n - 1) as u32);
    }

    #[test]
    fn output_is_strictly_ordered(n in 0usize..400, m in 2usize..64) {
        let frames = make_frames(n);
        let sampled = sample_frames(&frames, m);
        for pair in sampled.windows(2) {
            prop_assert!(pair[0].frame_index < pair[1].frame_index);
        }
    }

    #[test]
    fn under_cap_is_identity(n in 0usize..64, extra in 0usize..64) {
        let frames = make_frames(n);
        let sampled = sample_frames(&frames, n + extra);
        prop_assert_eq!(sampled.len(), n);
        for (a, b) in frames.iter().zip(sampled.iter()) {
            prop_assert_eq!(a.frame_index, b.frame_index);
        }
    }

    #[test]
    fn sampling_is_idempotent(n in 0usize..400, m in 2usize..64) {
        let frames = make_frames(n);
        let once = sample_frames(&frames, m);
        let twice = sample_frames(&once, m);
        prop_assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            prop_assert_eq!(a.frame_index, b.frame_index);
        }
    }
}
