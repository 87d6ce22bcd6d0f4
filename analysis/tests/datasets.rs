use analysis::aggregate;
use analysis::datasets::{self, MatchAnalysis};
use analysis::event::{Death, MatchEvents, RoundEnd, Side};
use analysis::features::{self, FeatureConfig};
use analysis::segment;
use analysis::weapons::WeaponTaxonomy;
use pretty_assertions::assert_eq;

fn kill(tick: u32, attacker: (&str, &str), victim: (&str, &str), weapon: &str, headshot: bool) -> Death {
    Death {
        tick,
        attacker_name: attacker.0.to_owned(),
        attacker_steamid: attacker.1.to_owned(),
        victim_name: victim.0.to_owned(),
        victim_steamid: victim.1.to_owned(),
        weapon: weapon.to_owned(),
        headshot,
        distance: 10.0,
        dmg_health: 100,
        ..Default::default()
    }
}

fn analyse(match_id: &str, map_name: &str, winners: &[Side], deaths: Vec<Death>) -> MatchAnalysis {
    let round_ends = winners
        .iter()
        .enumerate()
        .map(|(i, winner)| RoundEnd {
            tick: (i as u32 + 1) * 1000,
            winner: Some(*winner),
            reason: if *winner == Side::T { "ct_killed" } else { "bomb_defused" }.to_owned(),
        })
        .collect();

    let segmented = segment::segment(MatchEvents {
        match_id: match_id.to_owned(),
        map_name: map_name.to_owned(),
        round_ends,
        deaths,
        bombs: Vec::new(),
    })
    .unwrap();
    let taxonomy = WeaponTaxonomy::default();

    let stats = aggregate::round_stats(&segmented, &taxonomy);
    MatchAnalysis {
        match_id: segmented.match_id.clone(),
        map_name: segmented.map_name.clone(),
        rounds: features::match_features(&segmented, stats, &FeatureConfig::default()),
        players: aggregate::player_match_stats(&segmented, &taxonomy),
    }
}

const ALICE: (&str, &str) = ("alice", "1");
const BOB: (&str, &str) = ("bob", "2");

fn corpus() -> Vec<MatchAnalysis> {
    vec![
        analyse(
            "a",
            "de_inferno",
            &[Side::T, Side::CT, Side::T],
            vec![
                kill(100, ALICE, BOB, "ak47", true),
                kill(200, BOB, ALICE, "awp", false),
                kill(2100, ALICE, BOB, "glock", true),
            ],
        ),
        analyse(
            "b",
            "de_mirage",
            &[Side::CT, Side::CT],
            vec![kill(1500, BOB, ALICE, "m4a1", false)],
        ),
    ]
}

fn rows(corpus: &[MatchAnalysis]) -> Vec<features::MatchFeatureRow> {
    corpus.iter().flat_map(|m| m.rounds.iter().cloned()).collect()
}

#[test]
fn round_features_keep_every_round() {
    let table = datasets::round_features(&rows(&corpus()));

    assert_eq!(5, table.len());
    assert_eq!(Some(vec![2.0, 0.0, 1.0, 0.0, 1.0]), table.column("total_kills"));
    assert_eq!(Some(vec![1.0, 0.0, 1.0, 0.0, 0.0]), table.column("t_win"));
    assert_eq!(Some(vec![0.0, 1.0, 1.0, 0.0, 0.0]), table.column("t_score"));
}

#[test]
fn match_summary() {
    let table = datasets::match_features(&corpus());

    assert_eq!(
        vec![vec!["a".to_owned(), "de_inferno".to_owned()], vec!["b".to_owned(), "de_mirage".to_owned()]],
        table.rows.iter().map(|r| r.keys.clone()).collect::<Vec<_>>()
    );
    assert_eq!(Some(vec![3.0, 2.0]), table.column("total_rounds"));
    assert_eq!(Some(vec![2.0, 0.0]), table.column("t_rounds_won"));
    assert_eq!(Some(vec![3.0, 1.0]), table.column("total_kills"));
    assert_eq!(Some(vec![2.0, 1.0]), table.column("unique_players"));
}

#[test]
fn players_across_matches() {
    let table = datasets::player_features(&corpus());

    assert_eq!(2, table.len());
    assert_eq!(vec!["1".to_owned(), "alice".to_owned()], table.rows[0].keys);
    assert_eq!(Some(vec![2.0, 2.0]), table.column("matches_played"));
    assert_eq!(Some(vec![2.0, 2.0]), table.column("total_kills"));
    assert_eq!(Some(vec![1.0, 1.0]), table.column("overall_kd"));
}

#[test]
fn player_roles() {
    let table = datasets::player_features(&corpus());

    assert_eq!(Some(vec![5.0, 5.0]), table.column("rounds_played"));
    assert_eq!(Some(vec![2.0, 1.0]), table.column("opening_kills"));
    assert_eq!(Some(vec![0.4, 0.2]), table.column("opening_kill_rate"));
    assert_eq!(Some(vec![0.4, 0.4]), table.column("kills_per_round"));
    assert_eq!(Some(vec![0.0, 0.0]), table.column("multi_kill_rate"));
}

#[test]
fn player_clustering_needs_two_matches() {
    let mut corpus = corpus();
    corpus.push(analyse(
        "c",
        "de_nuke",
        &[Side::T],
        vec![kill(500, ("carol", "3"), ALICE, "awp", true)],
    ));

    let (players, normalized) = datasets::player_clustering(&corpus);

    assert_eq!("clustering_players", players.name);
    assert_eq!("clustering_players_normalized", normalized.name);
    assert_eq!(
        vec!["alice", "bob"],
        players.rows.iter().map(|r| r.keys[1].as_str()).collect::<Vec<_>>()
    );
    assert!(players.column_index("opening_kill_rate").is_some());
    assert!(players.column_index("total_kills").is_none());

    assert_eq!(Some(vec![3.0, 2.0]), players.column("matches_played"));
    assert_eq!(Some(vec![1.0, 0.0]), normalized.column("matches_played"));
    assert_eq!(Some(vec![1.0, 0.0]), normalized.column("opening_kill_rate"));
    assert_eq!(Some(vec![0.0, 0.0]), normalized.column("multi_kill_rate"));
}

#[test]
fn classification_skips_rounds_without_kills() {
    let (raw, scaled) = datasets::classification(&rows(&corpus()));

    assert_eq!(3, raw.len());
    assert_eq!(raw.value_columns, scaled.value_columns);
    assert_eq!(raw.column("t_win"), scaled.column("t_win"));
    assert_eq!(raw.column("round_num"), scaled.column("round_num"));
    assert!(raw.column_index("bomb_exploded").is_none());
    assert!(raw.column_index("bomb_defused").is_none());
    assert_eq!(Some(vec![1.0, 1.0, 0.0]), raw.column("map_de_inferno"));

    let scaled_kills = scaled.column("total_kills").unwrap();
    let mean = scaled_kills.iter().sum::<f64>() / scaled_kills.len() as f64;
    assert!(mean.abs() < 1e-9);
}

#[test]
fn pattern_items() {
    let (items, transactions) = datasets::frequent_patterns(&rows(&corpus()));

    assert_eq!(5, items.len());
    assert_eq!(items.len(), transactions.len());
    assert_eq!(vec!["round_id".to_owned(), "items".to_owned()], transactions.key_columns);
    assert_eq!("a_1", transactions.rows[0].keys[0]);

    let first = &transactions.rows[0].keys[1];
    for item in ["rifle_used", "awp_used", "t_win", "elimination", "map_inferno"] {
        assert!(first.split(',').any(|i| i == item), "missing {} in {}", item, first);
    }
    assert_eq!(Some(vec![1.0, 0.0, 0.0, 0.0, 0.0]), items.column("item_awp_used"));
    assert_eq!(Some(vec![0.0, 1.0, 0.0, 1.0, 1.0]), items.column("item_bomb_defused"));
}

#[test]
fn clustering_scales() {
    let (normalized, standardized) = datasets::clustering(&rows(&corpus()));

    assert_eq!(5, normalized.len());
    for column in normalized.value_columns.iter() {
        for value in normalized.column(column).unwrap() {
            assert!((0.0..=1.0).contains(&value), "{} out of range: {}", column, value);
        }
    }
    assert_eq!(normalized.value_columns, standardized.value_columns);
}
