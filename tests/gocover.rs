mod common;

use legendary::error::LegendaryError;
use legendary::ingest::{Aggregator, LineBase};
use legendary::parsers::gocover::GocoverParser;
use legendary::parsers::parse_profile_file;

#[test]
fn parse_fixture_from_disk() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.gocov");
    let profiles = parse_profile_file(&GocoverParser, &path).unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].blocks.len(), 2);
}

#[test]
fn missing_profile_is_a_parse_error_naming_the_file() {
    let project = common::Project::new();
    let path = project.path().join("nope.out");
    let err = parse_profile_file(&GocoverParser, &path).unwrap_err();
    match err {
        LegendaryError::ProfileParse { path: p, .. } => assert_eq!(p, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ingest_and_tally() {
    let project = common::Project::new();
    let profile = project.profile(
        "c.out",
        "mode: count\n\
         example.com/app/main.go:1.1,3.10 2 5\n\
         example.com/app/main.go:5.1,6.10 1 0\n",
    );

    let mut agg = Aggregator::new(project.roots(), LineBase::One);
    let stats = agg.ingest_file(&profile).unwrap();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.blocks, 2);

    let counts = agg.tallies()["main.go"].line_counts(7);
    assert_eq!(counts.iter().flatten().count(), 5);
    assert_eq!(counts[0], Some(5));
    assert_eq!(counts[2], Some(5));
    assert_eq!(counts[3], None); // line 4 not instrumented
    assert_eq!(counts[4], Some(0)); // line 5
}
