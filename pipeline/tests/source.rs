use analysis::event::{BombEventKind, Side};
use analysis::{EventSource, SourceError};
use pipeline::source::CsvTableSource;
use pretty_assertions::assert_eq;

fn events_dir() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../testfiles/events")
}

#[test]
fn lists_match_folders() {
    let source = CsvTableSource::new(events_dir());

    assert_eq!(
        vec!["bad_value", "missing_deaths", "no_rounds", "nuke_sample"],
        source.matches().unwrap()
    );
}

#[test]
fn nuke_sample() {
    let source = CsvTableSource::new(events_dir());

    let events = source.load("nuke_sample").unwrap();

    assert_eq!("nuke_sample", events.match_id);
    assert_eq!("de_nuke", events.map_name);
    assert_eq!(4, events.round_ends.len());
    assert_eq!(7, events.deaths.len());
    assert_eq!(4, events.bombs.len());

    let first = &events.deaths[0];
    assert_eq!("bob", first.victim_name);
    assert_eq!("76561198000000002", first.victim_steamid);
    assert_eq!(Some(Side::CT), first.victim_side);
    assert!(first.headshot);
    assert_eq!(12.5, first.distance);

    let assisted = &events.deaths[5];
    assert_eq!("dave", assisted.assister_name);
    assert!(assisted.assistedflash);
    assert!(assisted.attackerinair);

    let exploded: Vec<_> = events
        .bombs
        .iter()
        .filter(|b| b.kind == BombEventKind::Exploded)
        .map(|b| b.tick)
        .collect();
    assert_eq!(vec![3990], exploded);
}

#[test]
fn missing_death_table() {
    let source = CsvTableSource::new(events_dir());

    let result = source.load("missing_deaths");

    assert!(matches!(
        result,
        Err(SourceError::MissingTable {
            table: "player_death",
            ..
        })
    ));
}

#[test]
fn invalid_cell() {
    let source = CsvTableSource::new(events_dir());

    match source.load("bad_value") {
        Err(SourceError::InvalidValue { column, row, value, .. }) => {
            assert_eq!("headshot", column);
            assert_eq!(2, row);
            assert_eq!("sometimes", value);
        }
        other => panic!("expected an invalid value, got {:?}", other),
    }
}

#[test]
fn missing_header_means_unknown_map() {
    let source = CsvTableSource::new(events_dir());

    let events = source.load("no_rounds").unwrap();

    assert_eq!("unknown", events.map_name);
    assert!(events.round_ends.is_empty());
    assert!(events.bombs.is_empty());
}
