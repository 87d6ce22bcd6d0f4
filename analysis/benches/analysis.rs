use analysis::event::{Death, MatchEvents, RoundEnd, Side};
use analysis::weapons::WeaponTaxonomy;

fn main() {
    divan::main();
}

const WEAPONS: [&str; 6] = ["ak47", "awp", "m4a1_silencer", "glock", "mp9", "knife"];

/// A match with the given number of rounds and 7 kills per round, in shuffled tick order.
fn synthetic(rounds: u32) -> MatchEvents {
    let round_ends = (1..=rounds)
        .map(|i| RoundEnd {
            tick: i * 6400,
            winner: Some(if i % 3 == 0 { Side::CT } else { Side::T }),
            reason: "9".to_owned(),
        })
        .collect();

    let mut deaths: Vec<Death> = (0..rounds * 7)
        .map(|k| {
            let attacker = k % 10;
            let victim = (k + 3) % 10;
            Death {
                tick: (k / 7) * 6400 + (k % 7) * 800 + 100,
                attacker_name: format!("player{}", attacker),
                attacker_steamid: format!("7656119800000000{}", attacker),
                victim_name: format!("player{}", victim),
                victim_steamid: format!("7656119800000000{}", victim),
                weapon: WEAPONS[k as usize % WEAPONS.len()].to_owned(),
                headshot: k % 3 == 0,
                distance: (k % 40) as f64,
                dmg_health: 100,
                ..Default::default()
            }
        })
        .collect();
    deaths.reverse();

    MatchEvents {
        match_id: format!("synthetic_{}", rounds),
        map_name: "de_dust2".to_owned(),
        round_ends,
        deaths,
        bombs: Vec::new(),
    }
}

#[divan::bench(args = [12, 24, 36])]
fn segment(bencher: divan::Bencher, rounds: u32) {
    let events = synthetic(rounds);

    bencher.bench(|| analysis::segment(divan::black_box(events.clone())));
}

#[divan::bench(args = [12, 24, 36])]
fn aggregate(bencher: divan::Bencher, rounds: u32) {
    let segmented = analysis::segment(synthetic(rounds)).unwrap();
    let taxonomy = WeaponTaxonomy::default();

    bencher.bench(|| {
        (
            analysis::aggregate::player_round_stats(divan::black_box(&segmented), &taxonomy),
            analysis::aggregate::round_stats(divan::black_box(&segmented), &taxonomy),
        )
    });
}

#[divan::bench(args = [12, 24, 36])]
fn features(bencher: divan::Bencher, rounds: u32) {
    let segmented = analysis::segment(synthetic(rounds)).unwrap();
    let stats = analysis::aggregate::round_stats(&segmented, &WeaponTaxonomy::default());
    let config = analysis::features::FeatureConfig::default();

    bencher.bench(|| {
        analysis::features::match_features(divan::black_box(&segmented), stats.clone(), &config)
    });
}
