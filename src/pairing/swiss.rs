//! Dutch Swiss pairing (§4.3.1): the hard case. Score groups, split-and-match,
//! transposition search on conflicts, float selection for odd groups, and
//! FIDE-style color assignment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::dto::{PairingWarning, SectionPairingResult, WarningKind};
use crate::domain::model::{ByeType, Pairing};
use crate::error::{EngineError, EngineResult};
use crate::identifiers::{PlayerId, TournamentId};
use crate::player_registry::Color;

/// Swiss-specific tournament configuration (§9 "Configuration" in
/// SPEC_FULL.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwissSettings {
    /// Upper bound on transposition attempts searched before falling back to
    /// the repeat-pairing relaxation, expressed as a multiple of the score
    /// group's size. Mirrors the "2x group size" default from §4.3.1 step 5,
    /// capped in practice to keep worst-case groups tractable.
    pub transposition_factor: u32,
    /// Pairs rounds 1 and 2 by splitting the field in half by rating and
    /// cross-pairing top against bottom, a common large-Swiss opening
    /// (grok-rs-pawn's `apply_accelerated_pairings`). Off by default so a
    /// plain Dutch pairing is produced unless a tournament opts in.
    pub accelerated: bool,
}

impl Default for SwissSettings {
    fn default() -> Self {
        Self {
            transposition_factor: 2,
            accelerated: false,
        }
    }
}

/// One pairable player as seen by the Swiss engine, assembled by the caller
/// from the Player Registry (§4.3.1 "Input").
#[derive(Debug, Clone)]
pub struct SwissPlayer {
    pub id: PlayerId,
    pub name: String,
    pub rating: i32,
    pub score: f64,
    /// Oldest-first color history, byes excluded.
    pub color_history: Vec<Color>,
    pub opponents: HashSet<PlayerId>,
    /// True if this player already received an automatic half-point bye this
    /// tournament.
    pub has_had_automatic_bye: bool,
    /// True if this player floated down in either of the last two rounds.
    pub recently_floated_down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorPreference {
    Absolute(Color),
    Strong(Color),
    None,
}

fn opposite(color: Color) -> Color {
    match color {
        Color::White => Color::Black,
        Color::Black => Color::White,
    }
}

fn color_preference(history: &[Color]) -> ColorPreference {
    if history.len() >= 2 {
        let last = history[history.len() - 1];
        let prev = history[history.len() - 2];
        if last == prev {
            return ColorPreference::Absolute(opposite(last));
        }
    }
    let white = history.iter().filter(|c| **c == Color::White).count() as i32;
    let black = history.iter().filter(|c| **c == Color::Black).count() as i32;
    match white - black {
        1 => ColorPreference::Strong(Color::Black),
        -1 => ColorPreference::Strong(Color::White),
        _ => ColorPreference::None,
    }
}

impl SwissPlayer {
    fn preference(&self) -> ColorPreference {
        color_preference(&self.color_history)
    }
}

/// True if pairing `a` against `b` is legal under hard constraints: no repeat
/// opponent, and not forcing a color on a player with an absolute preference
/// for the other color (§4.3.1 step 4).
fn pair_is_legal(a: &SwissPlayer, b: &SwissPlayer, allow_repeat: bool) -> bool {
    if !allow_repeat && a.opponents.contains(&b.id) {
        return false;
    }
    if let (ColorPreference::Absolute(ca), ColorPreference::Absolute(cb)) =
        (a.preference(), b.preference())
    {
        if ca == cb {
            return false;
        }
    }
    true
}

/// Assigns colors to an already-legal pair, `higher` having the higher rating
/// (§4.3.1 step 8).
fn assign_colors(higher: &SwissPlayer, lower: &SwissPlayer, relax_preference: bool) -> (Color, Color) {
    if relax_preference {
        return match higher.color_history.last() {
            Some(c) => (opposite(*c), *c),
            None => (Color::White, Color::Black),
        };
    }
    let pref_h = higher.preference();
    let pref_l = lower.preference();
    match (pref_h, pref_l) {
        (ColorPreference::Absolute(ch), _) => (ch, opposite(ch)),
        (_, ColorPreference::Absolute(cl)) => (opposite(cl), cl),
        (ColorPreference::Strong(ch), ColorPreference::Strong(cl)) if opposite(ch) == cl => {
            (ch, cl)
        }
        (ColorPreference::Strong(ch), _) => (ch, opposite(ch)),
        (_, ColorPreference::Strong(cl)) => (opposite(cl), cl),
        (ColorPreference::None, ColorPreference::None) => match higher.color_history.last() {
            Some(c) => (opposite(*c), *c),
            None => (Color::White, Color::Black),
        },
    }
}

/// A candidate pair within a score group before colors are assigned.
struct Matched {
    higher: usize,
    lower: usize,
}

/// Finds a perfect matching between `s1` and `s2` (same length) respecting
/// `pair_is_legal`, searching s1 in order and s2 candidates in original-index
/// order first so the result favors minimal rating-difference pairings
/// (§4.3.1 step 5 "prefer the matching with minimum sum of rating deltas").
/// Gives up once `attempt_cap` candidate matchings have been explored (§4.3.1
/// step 5 "limit transpositions to a configurable cap"), returning `None`
/// either because the search space is exhausted or the cap was hit first —
/// both fall through to the next relaxation in `pair_group`.
fn find_matching(s1: &[SwissPlayer], s2: &[SwissPlayer], allow_repeat: bool, attempt_cap: usize) -> Option<Vec<Matched>> {
    fn backtrack(
        s1: &[SwissPlayer],
        s2: &[SwissPlayer],
        used: &mut Vec<bool>,
        i: usize,
        allow_repeat: bool,
        acc: &mut Vec<Matched>,
        attempts: &mut usize,
        attempt_cap: usize,
    ) -> bool {
        if i == s1.len() {
            return true;
        }
        for (j, candidate) in s2.iter().enumerate() {
            if used[j] {
                continue;
            }
            if !pair_is_legal(&s1[i], candidate, allow_repeat) {
                continue;
            }
            *attempts += 1;
            if *attempts > attempt_cap {
                return false;
            }
            used[j] = true;
            acc.push(Matched { higher: i, lower: j });
            if backtrack(s1, s2, used, i + 1, allow_repeat, acc, attempts, attempt_cap) {
                return true;
            }
            acc.pop();
            used[j] = false;
        }
        false
    }

    let mut used = vec![false; s2.len()];
    let mut acc = Vec::with_capacity(s1.len());
    let mut attempts = 0usize;
    if backtrack(s1, s2, &mut used, 0, allow_repeat, &mut acc, &mut attempts, attempt_cap) {
        Some(acc)
    } else {
        None
    }
}

/// Pairs one score group (already even-sized), returning pairings with colors
/// assigned and any relaxation warnings incurred.
fn pair_group(group: &[SwissPlayer], settings: &SwissSettings) -> (Vec<(PlayerId, PlayerId)>, Vec<PairingWarning>) {
    let half = group.len() / 2;
    let s1 = &group[..half];
    let s2 = &group[half..];
    let attempt_cap = (settings.transposition_factor as usize) * group.len().max(1);

    let mut warnings = Vec::new();
    let (matching, relax_preference) = if let Some(m) = find_matching(s1, s2, false, attempt_cap) {
        (m, false)
    } else if let Some(m) = find_matching(s1, s2, true, attempt_cap) {
        warnings.push(PairingWarning {
            kind: WarningKind::RepeatPairing,
            detail: "no legal pairing avoided all repeats; least-disruptive repeat used".into(),
        });
        (m, false)
    } else {
        // Relax color preference, keep no-repeat as a hard constraint still
        // impossible only if absolute-vs-absolute conflicts remain; pair
        // everyone positionally as a last resort.
        warnings.push(PairingWarning {
            kind: WarningKind::ColorPreferenceViolated,
            detail: "color preference relaxed to complete the round".into(),
        });
        let fallback: Vec<Matched> = (0..s1.len()).map(|i| Matched { higher: i, lower: i }).collect();
        (fallback, true)
    };

    let mut pairs = Vec::with_capacity(matching.len());
    for m in matching {
        let higher = &s1[m.higher];
        let lower = &s2[m.lower];
        let higher_color = if higher.rating >= lower.rating {
            assign_colors(higher, lower, relax_preference).0
        } else {
            assign_colors(lower, higher, relax_preference).1
        };
        let (white_player, black_player) = match higher_color {
            Color::White => (higher.id, lower.id),
            Color::Black => (lower.id, higher.id),
        };
        pairs.push((white_player, black_player));
    }
    (pairs, warnings)
}

fn sort_key(p: &SwissPlayer) -> (i32, String) {
    (-p.rating, p.name.clone())
}

/// Groups players by descending score, each group internally ordered by
/// (rating desc, name asc) as the stable tiebreak (§4.3.1 steps 1-2).
fn form_score_groups(mut players: Vec<SwissPlayer>) -> Vec<Vec<SwissPlayer>> {
    players.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap()
            .then_with(|| sort_key(a).cmp(&sort_key(b)))
    });

    let mut groups: Vec<Vec<SwissPlayer>> = Vec::new();
    for player in players {
        match groups.last_mut() {
            Some(group) if (group[0].score - player.score).abs() < f64::EPSILON => {
                group.push(player);
            }
            _ => groups.push(vec![player]),
        }
    }
    groups
}

/// Picks the float-down candidate from an odd group: lowest-rated player
/// without an absolute color preference who did not recently float down
/// (§4.3.1 step 6), falling back to the lowest-rated player overall if every
/// candidate is disqualified.
fn pick_floater(group: &[SwissPlayer]) -> usize {
    group
        .iter()
        .enumerate()
        .rev()
        .find(|(_, p)| !matches!(p.preference(), ColorPreference::Absolute(_)) && !p.recently_floated_down)
        .map(|(i, _)| i)
        .unwrap_or(group.len() - 1)
}

/// Picks the automatic-bye candidate from the lowest score group: the
/// lowest-rated player who has not already received one (§4.3.1 step 7).
fn pick_bye_candidate(group: &[SwissPlayer]) -> usize {
    group
        .iter()
        .enumerate()
        .rev()
        .find(|(_, p)| !p.has_had_automatic_bye)
        .map(|(i, _)| i)
        .unwrap_or(group.len() - 1)
}

/// Boosts the top half of a large field by one virtual point ahead of
/// grouping, for the first two rounds of a section that opts in (§9
/// SPEC_FULL "Accelerated pairings"). The boost only shapes this round's
/// score groups — `players` is consumed by `pair_section` and never read
/// back, so callers' own standings are untouched.
fn apply_acceleration(mut players: Vec<SwissPlayer>, round: u32, settings: &SwissSettings) -> Vec<SwissPlayer> {
    if !settings.accelerated || round > 2 || players.len() < 16 {
        return players;
    }
    let mut order: Vec<usize> = (0..players.len()).collect();
    order.sort_by(|&a, &b| players[b].rating.cmp(&players[a].rating).then_with(|| players[a].name.cmp(&players[b].name)));
    let half = players.len() / 2;
    for &i in &order[..half] {
        players[i].score += 1.0;
    }
    players
}

/// Soft float budget for a section/round: one cross-group float per score
/// group boundary is routine; more than that is reported, not blocked (§9
/// SPEC_FULL "FIDE float-limit... post-validation").
fn validate_float_limit(float_count: usize, group_count: usize) -> Option<PairingWarning> {
    let budget = group_count.saturating_sub(1).max(1);
    if float_count > budget {
        Some(PairingWarning {
            kind: WarningKind::FloatLimitExceeded,
            detail: format!("{float_count} floats this round exceeds the soft budget of {budget} for {group_count} score groups"),
        })
    } else {
        None
    }
}

/// Scans the final board assignment for any player whose color history,
/// extended by this round's assigned color, would show three of the same
/// color in a row — the concrete case the Dutch engine's absolute-preference
/// rule exists to prevent, kept as telemetry in case a relaxation let one
/// through (§9 SPEC_FULL "color-sequence post-validation").
fn validate_color_sequences(pairings: &[Pairing], histories: &std::collections::HashMap<PlayerId, Vec<Color>>) -> Vec<PairingWarning> {
    let mut warnings = Vec::new();
    for pairing in pairings {
        if pairing.is_bye() {
            continue;
        }
        let Some(white) = pairing.white_id else { continue };
        let Some(black) = pairing.black_id else { continue };
        for (player_id, color) in [(white, Color::White), (black, Color::Black)] {
            let mut seq = histories.get(&player_id).cloned().unwrap_or_default();
            seq.push(color);
            if seq.len() >= 3 && seq[seq.len() - 3..].iter().all(|c| *c == color) {
                warnings.push(PairingWarning {
                    kind: WarningKind::ColorPreferenceViolated,
                    detail: format!("player {player_id} would play three consecutive {color:?} games"),
                });
            }
        }
    }
    warnings
}

/// Generates Dutch Swiss pairings for one section for one round (§4.3.1).
pub fn pair_section(
    tournament_id: TournamentId,
    section: &str,
    round: u32,
    players: Vec<SwissPlayer>,
    settings: &SwissSettings,
) -> EngineResult<SectionPairingResult> {
    if players.is_empty() {
        return Ok(SectionPairingResult::default());
    }

    let histories: std::collections::HashMap<PlayerId, Vec<Color>> =
        players.iter().map(|p| (p.id, p.color_history.clone())).collect();

    let players = apply_acceleration(players, round, settings);
    let groups = form_score_groups(players);
    let group_count = groups.len();
    let mut carry: Vec<SwissPlayer> = Vec::new();
    let mut warnings = Vec::new();
    let mut board_pairs: Vec<(PlayerId, PlayerId)> = Vec::new();
    let mut bye: Option<PlayerId> = None;
    let mut float_count = 0usize;

    for (index, mut group) in groups.into_iter().enumerate() {
        group.extend(carry.drain(..));
        group.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        let is_last_group = index == group_count - 1;

        if group.len() % 2 == 1 {
            if is_last_group {
                let i = pick_bye_candidate(&group);
                bye = Some(group.remove(i).id);
            } else {
                let i = pick_floater(&group);
                carry.push(group.remove(i));
                float_count += 1;
            }
        }

        if group.is_empty() {
            continue;
        }
        let (pairs, mut group_warnings) = pair_group(&group, settings);
        board_pairs.extend(pairs);
        warnings.append(&mut group_warnings);
    }

    // A float carried out of the last group with nobody left to join (every
    // remaining group was already fully paired) becomes the bye.
    if let Some(mut leftover) = carry.pop() {
        if bye.is_none() {
            leftover.has_had_automatic_bye = false;
            bye = Some(leftover.id);
        } else {
            return Err(EngineError::Pairing(
                "could not place floated player: more than one unresolved odd player".into(),
            ));
        }
    }

    let mut pairings = Vec::with_capacity(board_pairs.len() + 1);
    let mut board = 1;
    for (white, black) in board_pairs {
        pairings.push(Pairing::game(tournament_id, round, section, board, white, black));
        board += 1;
    }
    if let Some(player_id) = bye {
        pairings.push(Pairing::bye(tournament_id, round, section, board, player_id, ByeType::Bye));
    }

    warnings.extend(validate_float_limit(float_count, group_count));
    warnings.extend(validate_color_sequences(&pairings, &histories));

    Ok(SectionPairingResult { pairings, warnings })
}
