//! Splits the events of a match into its rounds.
//!
//! Round `i` covers the ticks `(end_tick[i-1], end_tick[i]]` with `end_tick[0] = 0`.
//! Events that fall outside every interval (tick 0, or after the final round end)
//! are assigned to the round whose end tick is closest, preferring the earlier
//! round when two are equally close. Such events are flagged as `fallback`.

use crate::event::{BombEventKind, Death, MatchEvents, RoundEnd, Side, Tick, Ticked, WinReason};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SegmentError {
    #[error("match '{match_id}' has no rounds")]
    NoRounds { match_id: String },
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Round {
    pub index: u32,
    pub start_tick: Tick,
    pub end_tick: Tick,
    pub winner: Option<Side>,
    pub reason: String,
}

impl Round {
    pub fn contains(&self, tick: Tick) -> bool {
        self.start_tick < tick && tick <= self.end_tick
    }

    pub fn win_reason(&self) -> Option<WinReason> {
        WinReason::parse(&self.reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub round: u32,
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Assigned<E> {
    pub event: E,
    pub fallback: bool,
}

/// The round boundaries of one match, ordered by end tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Rounds {
    rounds: Vec<Round>,
}

impl Rounds {
    pub fn from_round_ends(round_ends: &[RoundEnd]) -> Option<Self> {
        if round_ends.is_empty() {
            return None;
        }

        let mut sorted: Vec<&RoundEnd> = round_ends.iter().collect();
        sorted.sort_by_key(|r| r.tick);

        let mut previous_end = 0;
        let rounds = sorted
            .into_iter()
            .enumerate()
            .map(|(i, end)| {
                let round = Round {
                    index: i as u32 + 1,
                    start_tick: previous_end,
                    end_tick: end.tick,
                    winner: end.winner,
                    reason: end.reason.clone(),
                };
                previous_end = end.tick;
                round
            })
            .collect();

        Some(Self { rounds })
    }

    /// Rebuilds the boundaries from already numbered rounds, e.g. a previously written table.
    pub fn from_rounds(mut rounds: Vec<Round>) -> Option<Self> {
        if rounds.is_empty() {
            return None;
        }
        rounds.sort_by_key(|r| (r.end_tick, r.index));
        Some(Self { rounds })
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Round> {
        self.rounds.iter()
    }

    pub fn into_inner(self) -> Vec<Round> {
        self.rounds
    }

    pub fn locate(&self, tick: Tick) -> Assignment {
        let position = self.rounds.partition_point(|r| r.end_tick < tick);
        if let Some(round) = self.rounds.get(position) {
            if round.start_tick < tick {
                return Assignment {
                    round: round.index,
                    fallback: false,
                };
            }
        }

        Assignment {
            round: self.nearest(tick),
            fallback: true,
        }
    }

    fn nearest(&self, tick: Tick) -> u32 {
        // min_by_key keeps the first of several equal candidates, i.e. the earlier round
        self.rounds
            .iter()
            .min_by_key(|r| r.end_tick.abs_diff(tick))
            .map(|r| r.index)
            .unwrap_or(1)
    }

    fn slot(&self, index: u32) -> Option<usize> {
        self.rounds.iter().position(|r| r.index == index)
    }

    /// Assigns every event to exactly one round. Within a round, events are ordered by tick.
    pub fn partition<E, I>(&self, events: I) -> Partition<E>
    where
        E: Ticked,
        I: IntoIterator<Item = E>,
    {
        let mut slots: Vec<Vec<Assigned<E>>> = self.rounds.iter().map(|_| Vec::new()).collect();
        let mut fallback = 0;

        for event in events {
            let tick = event.tick();
            let assignment = self.locate(tick);
            if assignment.fallback {
                tracing::debug!(tick, round = assignment.round, "Event outside of every round, using nearest round");
                fallback += 1;
            }

            let slot = match self.slot(assignment.round) {
                Some(s) => s,
                None => continue,
            };
            slots[slot].push(Assigned {
                event,
                fallback: assignment.fallback,
            });
        }

        for slot in slots.iter_mut() {
            slot.sort_by_key(|e| e.event.tick());
        }

        Partition { slots, fallback }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partition<E> {
    slots: Vec<Vec<Assigned<E>>>,
    fallback: usize,
}

impl<E> Partition<E> {
    /// Number of events that were placed through the nearest-round fallback.
    pub fn fallback_count(&self) -> usize {
        self.fallback
    }

    pub fn total(&self) -> usize {
        self.slots.iter().map(|s| s.len()).sum()
    }

    /// The slots in round order, one per round.
    pub fn into_slots(self) -> Vec<Vec<Assigned<E>>> {
        self.slots
    }

    pub fn slots(&self) -> &[Vec<Assigned<E>>] {
        &self.slots
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    pub round: Round,
    pub deaths: Vec<Assigned<Death>>,
    pub bomb_planted: bool,
    pub bomb_defused: bool,
    pub bomb_exploded: bool,
}

impl RoundRecord {
    pub fn valid_deaths(&self) -> impl Iterator<Item = &Death> {
        self.deaths.iter().map(|d| &d.event).filter(|d| d.is_valid())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentedMatch {
    pub match_id: String,
    pub map_name: String,
    pub rounds: Vec<RoundRecord>,
    pub fallback_events: usize,
}

impl SegmentedMatch {
    pub fn deaths(&self) -> impl Iterator<Item = (&Round, &Assigned<Death>)> {
        self.rounds
            .iter()
            .flat_map(|r| r.deaths.iter().map(move |d| (&r.round, d)))
    }

    pub fn valid_deaths(&self) -> impl Iterator<Item = (&Round, &Death)> {
        self.rounds
            .iter()
            .flat_map(|r| r.valid_deaths().map(move |d| (&r.round, d)))
    }

    /// Reassembles a segmented match from tables where every death already carries its round.
    ///
    /// Deaths that reference a round which does not exist are placed by their tick instead.
    pub fn from_tables<I>(
        match_id: String,
        map_name: String,
        rounds: Vec<RoundRecord>,
        deaths: I,
    ) -> Result<Self, SegmentError>
    where
        I: IntoIterator<Item = (u32, Assigned<Death>)>,
    {
        let boundaries = Rounds::from_rounds(rounds.iter().map(|r| r.round.clone()).collect())
            .ok_or_else(|| SegmentError::NoRounds {
                match_id: match_id.clone(),
            })?;

        let mut rounds = rounds;
        rounds.sort_by_key(|r| (r.round.end_tick, r.round.index));

        let mut fallback_events = 0;
        for (round_num, death) in deaths {
            let target = match rounds.iter().position(|r| r.round.index == round_num) {
                Some(p) => p,
                None => {
                    let assignment = boundaries.locate(death.event.tick);
                    tracing::warn!(round_num, tick = death.event.tick, relocated = assignment.round, "Death references unknown round");
                    match rounds.iter().position(|r| r.round.index == assignment.round) {
                        Some(p) => p,
                        None => continue,
                    }
                }
            };
            if death.fallback {
                fallback_events += 1;
            }
            rounds[target].deaths.push(death);
        }

        for round in rounds.iter_mut() {
            round.deaths.sort_by_key(|d| d.event.tick);
        }

        Ok(Self {
            match_id,
            map_name,
            rounds,
            fallback_events,
        })
    }
}

#[tracing::instrument(skip(events), fields(match_id = %events.match_id))]
pub fn segment(events: MatchEvents) -> Result<SegmentedMatch, SegmentError> {
    let MatchEvents {
        match_id,
        map_name,
        round_ends,
        deaths,
        bombs,
    } = events;

    let rounds = match Rounds::from_round_ends(&round_ends) {
        Some(r) => r,
        None => return Err(SegmentError::NoRounds { match_id }),
    };

    let deaths = rounds.partition(deaths);
    let bombs = rounds.partition(bombs);
    let fallback_events = deaths.fallback_count() + bombs.fallback_count();

    tracing::debug!(
        rounds = rounds.len(),
        deaths = deaths.total(),
        bombs = bombs.total(),
        fallback_events,
        "Segmented match"
    );

    let records = rounds
        .into_inner()
        .into_iter()
        .zip(deaths.into_slots())
        .zip(bombs.into_slots())
        .map(|((round, deaths), bombs)| {
            let has = |kind: BombEventKind| bombs.iter().any(|b| b.event.kind == kind);

            RoundRecord {
                bomb_planted: has(BombEventKind::Planted),
                bomb_defused: has(BombEventKind::Defused),
                bomb_exploded: has(BombEventKind::Exploded),
                round,
                deaths,
            }
        })
        .collect();

    Ok(SegmentedMatch {
        match_id,
        map_name,
        rounds: records,
        fallback_events,
    })
}
