use analysis::aggregate;
use analysis::event::{Death, MatchEvents, RoundEnd, Side};
use analysis::segment;
use analysis::weapons::{WeaponCategory, WeaponTaxonomy};
use pretty_assertions::assert_eq;

fn round_end(tick: u32, winner: Side) -> RoundEnd {
    RoundEnd {
        tick,
        winner: Some(winner),
        reason: "ct_killed".to_owned(),
    }
}

fn kill(tick: u32, attacker: (&str, &str), victim: (&str, &str), weapon: &str, headshot: bool) -> Death {
    Death {
        tick,
        attacker_name: attacker.0.to_owned(),
        attacker_steamid: attacker.1.to_owned(),
        attacker_side: Some(Side::T),
        victim_name: victim.0.to_owned(),
        victim_steamid: victim.1.to_owned(),
        victim_side: Some(Side::CT),
        weapon: weapon.to_owned(),
        headshot,
        distance: tick as f64 / 100.0,
        dmg_health: 100,
        ..Default::default()
    }
}

const ALICE: (&str, &str) = ("alice", "1");
const BOB: (&str, &str) = ("bob", "2");
const CAROL: (&str, &str) = ("carol", "3");

fn rounds() -> Vec<RoundEnd> {
    vec![round_end(1000, Side::T), round_end(2000, Side::CT), round_end(3000, Side::T)]
}

#[test]
fn no_deaths_gives_zero_rounds() {
    let segmented = segment::segment(MatchEvents {
        match_id: "quiet".to_owned(),
        round_ends: rounds(),
        ..Default::default()
    })
    .unwrap();

    let stats = aggregate::round_stats(&segmented, &WeaponTaxonomy::default());

    assert_eq!(3, stats.len());
    for (i, stat) in stats.iter().enumerate() {
        assert_eq!(i as u32 + 1, stat.round_num);
        assert_eq!(0, stat.kills.count);
        assert_eq!(0.0, stat.kills.headshot_rate());
        assert_eq!(0.0, stat.kills.avg_distance());
        assert_eq!(0.0, stat.kills.max_distance());
        assert_eq!(None, stat.first_kill);
    }

    assert!(aggregate::player_round_stats(&segmented, &WeaponTaxonomy::default()).is_empty());
}

#[test]
fn self_and_world_kills_are_ignored() {
    let mut suicide = kill(500, ALICE, ALICE, "hegrenade", false);
    suicide.victim_side = Some(Side::T);
    let world = kill(600, ("", ""), BOB, "world", false);
    let same_id = kill(700, ("alice_alt", "1"), ALICE, "ak47", false);

    let segmented = segment::segment(MatchEvents {
        match_id: "self".to_owned(),
        round_ends: rounds(),
        deaths: vec![suicide, world, same_id, kill(800, ALICE, BOB, "ak47", true)],
        ..Default::default()
    })
    .unwrap();
    let taxonomy = WeaponTaxonomy::default();

    let players = aggregate::player_match_stats(&segmented, &taxonomy);
    let summary: Vec<_> = players
        .iter()
        .map(|p| (p.steamid.as_str(), p.kills.count, p.deaths))
        .collect();
    assert_eq!(vec![("1", 1, 0), ("2", 0, 1)], summary);

    let round = &aggregate::round_stats(&segmented, &taxonomy)[0];
    assert_eq!(1, round.kills.count);
    assert_eq!(0, round.kills.weapons.get(WeaponCategory::Grenade));
}

#[test]
fn player_rounds() {
    let deaths = vec![
        kill(100, ALICE, BOB, "ak47", true),
        kill(200, ALICE, CAROL, "awp", false),
        kill(1500, CAROL, ALICE, "usp_silencer", true),
    ];
    let segmented = segment::segment(MatchEvents {
        match_id: "m".to_owned(),
        round_ends: rounds(),
        deaths,
        ..Default::default()
    })
    .unwrap();
    let taxonomy = WeaponTaxonomy::default();

    let stats = aggregate::player_round_stats(&segmented, &taxonomy);

    // every player seen, for every round
    assert_eq!(9, stats.len());

    let rows: Vec<_> = stats
        .iter()
        .map(|s| (s.name.as_str(), s.round_num, s.kills.count, s.deaths))
        .collect();
    assert_eq!(
        vec![
            ("alice", 1, 2, 0),
            ("alice", 2, 0, 1),
            ("alice", 3, 0, 0),
            ("bob", 1, 0, 1),
            ("bob", 2, 0, 0),
            ("bob", 3, 0, 0),
            ("carol", 1, 0, 1),
            ("carol", 2, 1, 0),
            ("carol", 3, 0, 0),
        ],
        rows
    );

    let alice = &stats[0];
    assert_eq!(0.5, alice.kills.headshot_rate());
    assert_eq!(1.5, alice.kills.avg_distance());
    assert_eq!(1.0, alice.kills.min_distance());
    assert_eq!(2.0, alice.kills.max_distance());
    assert_eq!(1, alice.kills.weapons.get(WeaponCategory::Rifle));
    assert_eq!(1, alice.kills.weapons.get(WeaponCategory::Awp));
}

#[test]
fn aggregation_is_idempotent() {
    let events = MatchEvents {
        match_id: "m".to_owned(),
        round_ends: rounds(),
        deaths: vec![
            kill(2500, BOB, CAROL, "m4a1", false),
            kill(100, ALICE, BOB, "ak47", true),
            kill(1500, CAROL, ALICE, "glock", true),
        ],
        ..Default::default()
    };
    let taxonomy = WeaponTaxonomy::default();

    let first = segment::segment(events.clone()).unwrap();
    let second = segment::segment(events).unwrap();

    assert_eq!(
        aggregate::player_round_stats(&first, &taxonomy),
        aggregate::player_round_stats(&second, &taxonomy)
    );
    assert_eq!(
        aggregate::round_stats(&first, &taxonomy),
        aggregate::round_stats(&second, &taxonomy)
    );
}

#[test]
fn round_stat_details() {
    let mut wallbang = kill(400, BOB, ALICE, "ak47", false);
    wallbang.penetrated = 1;
    wallbang.hitgroup = "left_leg".to_owned();
    let mut opening = kill(100, ALICE, BOB, "awp", true);
    opening.hitgroup = "head".to_owned();
    opening.thrusmoke = true;

    let segmented = segment::segment(MatchEvents {
        match_id: "m".to_owned(),
        round_ends: rounds(),
        deaths: vec![wallbang, opening, kill(300, CAROL, BOB, "awp", false)],
        ..Default::default()
    })
    .unwrap();

    let stat = &aggregate::round_stats(&segmented, &WeaponTaxonomy::default())[0];

    assert_eq!(3, stat.kills.count);
    assert_eq!(100, stat.first_kill_tick);
    assert_eq!(400, stat.last_kill_tick);
    assert_eq!(300, stat.kill_spread);
    assert_eq!(10.0, stat.kill_tempo);
    assert_eq!(1, stat.kills.situational.wallbang);
    assert_eq!(1, stat.kills.situational.smoke);
    assert_eq!(1, stat.hitgroups.head);
    assert_eq!(1, stat.hitgroups.limbs);
    assert_eq!(3, stat.unique_killers);
    assert_eq!(2, stat.unique_victims);
    assert_eq!(Some("awp".to_owned()), stat.most_common_weapon);
    assert_eq!(Some("alice"), stat.first_kill.as_ref().map(|f| f.attacker.as_str()));
}

#[test]
fn assists_and_ratios() {
    let mut assisted = kill(100, ALICE, BOB, "ak47", true);
    assisted.assister_name = "carol".to_owned();
    assisted.assister_steamid = "3".to_owned();
    let mut self_assist = kill(1100, ALICE, CAROL, "ak47", false);
    self_assist.assister_name = "carol".to_owned();
    self_assist.assister_steamid = "3".to_owned();

    let segmented = segment::segment(MatchEvents {
        match_id: "m".to_owned(),
        round_ends: rounds(),
        deaths: vec![assisted, self_assist, kill(2100, ALICE, BOB, "deagle", true)],
        ..Default::default()
    })
    .unwrap();

    let players = aggregate::player_match_stats(&segmented, &WeaponTaxonomy::default());
    let alice = &players[0];
    let carol = &players[2];

    assert_eq!(3.0, alice.kd_ratio());
    assert_eq!(66.7, alice.headshot_pct());
    assert_eq!(Some(Side::T), alice.side);
    assert_eq!(1, carol.assists);
    assert_eq!(1, carol.deaths);
}

#[test]
fn opening_and_multi_kills() {
    let segmented = segment::segment(MatchEvents {
        match_id: "multi".to_owned(),
        round_ends: rounds(),
        deaths: vec![
            kill(100, BOB, CAROL, "ak47", false),
            kill(200, ALICE, BOB, "ak47", false),
            kill(300, ALICE, CAROL, "ak47", false),
            kill(400, ALICE, BOB, "ak47", false),
            kill(1100, ALICE, BOB, "ak47", false),
            kill(1200, ALICE, CAROL, "ak47", false),
            kill(2500, CAROL, ALICE, "awp", false),
        ],
        ..Default::default()
    })
    .unwrap();

    let players = aggregate::player_match_stats(&segmented, &WeaponTaxonomy::default());

    assert_eq!(
        vec![("alice", 3, 1, 2, 1), ("bob", 3, 1, 0, 0), ("carol", 3, 1, 0, 0)],
        players
            .iter()
            .map(|p| (p.name.as_str(), p.rounds_played, p.opening_kills, p.rounds_with_2k, p.rounds_with_3k))
            .collect::<Vec<_>>()
    );
}

#[test]
fn damage_totals_saturate() {
    let mut first = kill(100, ALICE, BOB, "ak47", false);
    first.dmg_health = u32::MAX;
    first.dmg_armor = u32::MAX;
    let second = Death {
        tick: 200,
        dmg_armor: 10,
        ..first.clone()
    };

    let segmented = segment::segment(MatchEvents {
        match_id: "overflow".to_owned(),
        round_ends: rounds(),
        deaths: vec![first, second],
        ..Default::default()
    })
    .unwrap();
    let taxonomy = WeaponTaxonomy::default();

    let stats = aggregate::round_stats(&segmented, &taxonomy);
    assert_eq!(u32::MAX, stats[0].kills.damage);
    assert_eq!(u32::MAX, stats[0].kills.armor_damage);

    let players = aggregate::player_match_stats(&segmented, &taxonomy);
    assert_eq!(u32::MAX, players[0].kills.damage);
}
