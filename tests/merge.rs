use legendary::classify::classify;
use legendary::ingest::{Aggregator, LineBase};
use legendary::model::{Block, CoverMode, FileProfile};
use legendary::paths::Roots;
use proptest::prelude::*;

fn file_profile(name: &str, blocks: &[(u32, u32, u64)]) -> FileProfile {
    let mut p = FileProfile::new(name, CoverMode::Count);
    p.blocks = blocks
        .iter()
        .map(|&(s, e, c)| Block::lines(s, e, c))
        .collect();
    p
}

/// Longer than any block the tests generate.
const LINES: u32 = 64;

fn roots() -> Roots {
    Roots::new("/go/src", "/go/src/example.com/app")
}

#[test]
fn merge_sums_counts_across_profiles() {
    let mut agg = Aggregator::new(roots(), LineBase::Zero);
    agg.ingest_profiles(&[file_profile("example.com/app/b.go", &[(0, 0, 2)])])
        .unwrap();
    agg.ingest_profiles(&[file_profile("example.com/app/b.go", &[(0, 0, 3)])])
        .unwrap();

    let tally = &agg.tallies()["b.go"];
    assert_eq!(tally.line_counts(1), vec![Some(5)]);
    assert_eq!(classify(tally, 1).hits, vec![0]);
}

#[test]
fn merge_same_profile_twice_doubles() {
    let profile = vec![
        file_profile("example.com/app/a.go", &[(1, 4, 3), (3, 6, 1)]),
        file_profile("example.com/app/pkg/c.go", &[(2, 2, 7)]),
    ];

    let mut once = Aggregator::new(roots(), LineBase::One);
    once.ingest_profiles(&profile).unwrap();

    let mut twice = Aggregator::new(roots(), LineBase::One);
    twice.ingest_profiles(&profile).unwrap();
    twice.ingest_profiles(&profile).unwrap();

    for (name, tally) in once.tallies() {
        let doubled = twice.tallies()[name].line_counts(LINES);
        for (line, count) in tally.line_counts(LINES).into_iter().enumerate() {
            assert_eq!(doubled[line], count.map(|c| c * 2), "{name}:{line}");
        }
    }
}

#[test]
fn merge_keys_canonical_paths_from_different_spellings() {
    let mut agg = Aggregator::new(roots(), LineBase::One);
    agg.ingest_profiles(&[file_profile("example.com/app/./x/../a.go", &[(1, 1, 1)])])
        .unwrap();
    agg.ingest_profiles(&[file_profile("example.com/app/a.go", &[(1, 1, 1)])])
        .unwrap();

    assert_eq!(agg.tallies().len(), 1);
    assert_eq!(agg.tallies()["a.go"].line_counts(1), vec![Some(2)]);
}

fn arb_profile() -> impl Strategy<Value = Vec<FileProfile>> {
    let block = (1u32..40, 0u32..10, 0u64..5);
    let file = (
        prop::sample::select(vec!["a.go", "b.go", "pkg/c.go"]),
        prop::collection::vec(block, 0..6),
    );
    prop::collection::vec(file, 0..4).prop_map(|files| {
        files
            .into_iter()
            .map(|(name, blocks)| {
                let blocks: Vec<(u32, u32, u64)> =
                    blocks.into_iter().map(|(s, len, c)| (s, s + len, c)).collect();
                file_profile(&format!("example.com/app/{name}"), &blocks)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_is_order_independent(profiles in prop::collection::vec(arb_profile(), 1..5)) {
        let mut forward = Aggregator::new(roots(), LineBase::One);
        for p in &profiles {
            forward.ingest_profiles(p).unwrap();
        }

        let mut backward = Aggregator::new(roots(), LineBase::One);
        for p in profiles.iter().rev() {
            backward.ingest_profiles(p).unwrap();
        }

        prop_assert_eq!(forward.tallies(), backward.tallies());
    }

    #[test]
    fn merge_twice_doubles_every_count(profile in arb_profile()) {
        let mut once = Aggregator::new(roots(), LineBase::One);
        once.ingest_profiles(&profile).unwrap();

        let mut twice = Aggregator::new(roots(), LineBase::One);
        twice.ingest_profiles(&profile).unwrap();
        twice.ingest_profiles(&profile).unwrap();

        for (name, tally) in once.tallies() {
            let doubled = twice.tallies()[name].line_counts(LINES);
            for (line, count) in tally.line_counts(LINES).into_iter().enumerate() {
                prop_assert_eq!(doubled[line], count.map(|c| c * 2));
            }
        }
        prop_assert_eq!(once.tallies().len(), twice.tallies().len());
    }
}
