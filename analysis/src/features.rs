//! Match-relative features, computed in one ordered pass over the rounds of a match.
//!
//! The features of round `i` only ever look at rounds `< i`, the targets (`t_win`,
//! `ct_win`) are the only values describing round `i` itself.

use std::collections::VecDeque;

use crate::aggregate::RoundStat;
use crate::event::Side;
use crate::segment::{Round, SegmentedMatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeatureConfig {
    /// Number of previous rounds averaged by the rolling features.
    pub rolling_window: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self { rolling_window: 3 }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchContext {
    pub prev_t_win: bool,
    pub prev_ct_win: bool,
    pub t_score: u32,
    pub ct_score: u32,
    pub score_diff: i32,
    /// Consecutive repeats of the same winner: 0 after a change of winner.
    pub win_streak: u32,
    pub t_win_streak: u32,
    pub ct_win_streak: u32,
    pub prev_round_kills: u32,
    pub cumulative_kills: u32,
    pub rolling_kills_avg: f64,
    pub rolling_damage_avg: f64,
    pub rolling_headshot_avg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchFeatureRow {
    pub match_id: String,
    pub map_name: String,
    pub round: Round,
    pub bomb_planted: bool,
    pub bomb_defused: bool,
    pub bomb_exploded: bool,
    pub stats: RoundStat,
    pub context: MatchContext,
}

impl MatchFeatureRow {
    pub fn t_win(&self) -> bool {
        self.round.winner == Some(Side::T)
    }

    pub fn ct_win(&self) -> bool {
        self.round.winner == Some(Side::CT)
    }

    /// The features a round-outcome classifier may see.
    ///
    /// `bomb_defused`, `bomb_exploded` and the end reason are left out, each of them
    /// decides the winner of the round on its own.
    pub fn predictors(&self) -> Vec<(&'static str, f64)> {
        let stats = &self.stats;
        let context = &self.context;

        vec![
            ("round_num", self.round.index as f64),
            ("bomb_planted", flag(self.bomb_planted)),
            ("total_kills", stats.kills.count as f64),
            ("headshot_kills", stats.kills.headshots as f64),
            ("headshot_rate", stats.kills.headshot_rate()),
            ("avg_kill_distance", stats.kills.avg_distance()),
            ("kill_distance_std", stats.distance_std),
            ("max_kill_distance", stats.kills.max_distance()),
            ("total_damage", stats.kills.damage as f64),
            ("kill_spread", stats.kill_spread as f64),
            ("kill_tempo", stats.kill_tempo),
            ("smoke_kills", stats.kills.situational.smoke as f64),
            ("wallbang_kills", stats.kills.situational.wallbang as f64),
            ("noscope_kills", stats.kills.situational.noscope as f64),
            ("blind_kills", stats.kills.situational.blind as f64),
            (
                "first_kill_headshot",
                flag(stats.first_kill.as_ref().map(|f| f.headshot).unwrap_or(false)),
            ),
            ("prev_t_win", flag(context.prev_t_win)),
            ("prev_ct_win", flag(context.prev_ct_win)),
            ("win_streak", context.win_streak as f64),
            ("t_win_streak", context.t_win_streak as f64),
            ("ct_win_streak", context.ct_win_streak as f64),
            ("t_score", context.t_score as f64),
            ("ct_score", context.ct_score as f64),
            ("score_diff", context.score_diff as f64),
            ("prev_round_kills", context.prev_round_kills as f64),
            ("cumulative_kills", context.cumulative_kills as f64),
            ("rolling_kills_avg", context.rolling_kills_avg),
            ("rolling_damage_avg", context.rolling_damage_avg),
            ("rolling_headshot_avg", context.rolling_headshot_avg),
        ]
    }
}

pub(crate) fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Match-relative context for each round, in the given order.
///
/// `rounds` must be ordered by round; only the winners and stats of earlier
/// entries contribute to an entry's context.
pub fn match_context(rounds: &[(Option<Side>, &RoundStat)], config: &FeatureConfig) -> Vec<MatchContext> {
    let window_size = config.rolling_window.max(1);

    let mut contexts = Vec::with_capacity(rounds.len());

    let mut previous_winner: Option<Side> = None;
    let mut t_score = 0;
    let mut ct_score = 0;
    let mut win_streak = 0;
    let mut t_win_streak = 0;
    let mut ct_win_streak = 0;
    let mut cumulative_kills = 0;
    let mut prev_round_kills = 0;
    let mut window: VecDeque<(f64, f64, f64)> = VecDeque::with_capacity(window_size);

    for (winner, stats) in rounds.iter().copied() {
        let rolling = |select: fn(&(f64, f64, f64)) -> f64| {
            if window.is_empty() {
                0.0
            } else {
                window.iter().map(select).sum::<f64>() / window.len() as f64
            }
        };

        contexts.push(MatchContext {
            prev_t_win: previous_winner == Some(Side::T),
            prev_ct_win: previous_winner == Some(Side::CT),
            t_score,
            ct_score,
            score_diff: t_score as i32 - ct_score as i32,
            win_streak,
            t_win_streak,
            ct_win_streak,
            prev_round_kills,
            cumulative_kills,
            rolling_kills_avg: rolling(|w| w.0),
            rolling_damage_avg: rolling(|w| w.1),
            rolling_headshot_avg: rolling(|w| w.2),
        });

        // Only now does this round's outcome become visible to the following rounds
        win_streak = match (previous_winner, winner) {
            (Some(previous), Some(current)) if previous == current => win_streak + 1,
            _ => 0,
        };
        match winner {
            Some(Side::T) => {
                t_score += 1;
                t_win_streak += 1;
                ct_win_streak = 0;
            }
            Some(Side::CT) => {
                ct_score += 1;
                ct_win_streak += 1;
                t_win_streak = 0;
            }
            None => {
                t_win_streak = 0;
                ct_win_streak = 0;
            }
        }
        previous_winner = winner;

        prev_round_kills = stats.kills.count;
        cumulative_kills += stats.kills.count;

        if window.len() == window_size {
            window.pop_front();
        }
        window.push_back((
            stats.kills.count as f64,
            stats.kills.damage as f64,
            stats.kills.headshot_rate(),
        ));
    }

    contexts
}

/// Combines the segmented match with its per-round stats into one feature row per round.
///
/// `stats` has to contain one entry per round of the match, as produced by
/// [`crate::aggregate::round_stats`].
#[tracing::instrument(skip_all, fields(match_id = %segmented.match_id))]
pub fn match_features(
    segmented: &SegmentedMatch,
    stats: Vec<RoundStat>,
    config: &FeatureConfig,
) -> Vec<MatchFeatureRow> {
    let mut ordered: Vec<_> = segmented
        .rounds
        .iter()
        .filter_map(|record| {
            let stat = stats.iter().find(|s| s.round_num == record.round.index)?;
            Some((record, stat.clone()))
        })
        .collect();
    ordered.sort_by_key(|(record, _)| record.round.index);

    if ordered.len() != segmented.rounds.len() {
        tracing::warn!(
            rounds = segmented.rounds.len(),
            stats = ordered.len(),
            "Missing round stats for some rounds"
        );
    }

    let inputs: Vec<(Option<Side>, &RoundStat)> = ordered
        .iter()
        .map(|(record, stat)| (record.round.winner, stat))
        .collect();
    let contexts = match_context(&inputs, config);

    ordered
        .into_iter()
        .zip(contexts)
        .map(|((record, stats), context)| MatchFeatureRow {
            match_id: segmented.match_id.clone(),
            map_name: segmented.map_name.clone(),
            round: record.round.clone(),
            bomb_planted: record.bomb_planted,
            bomb_defused: record.bomb_defused,
            bomb_exploded: record.bomb_exploded,
            stats,
            context,
        })
        .collect()
}
