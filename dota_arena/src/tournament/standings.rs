//! Standings table derived from participant records.

use super::models::{Participant, Standing};

/// Percentage of games won, 0 when nothing has been played
pub fn winrate(wins: u32, losses: u32) -> f64 {
    let games = wins + losses;
    if games == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(games) * 100.0
    }
}

/// Rank participants by points, then wins
///
/// `participants` must be in join order; the sort is stable so remaining
/// ties keep that order.
pub fn rank(participants: &[Participant]) -> Vec<Standing> {
    let mut ordered: Vec<&Participant> = participants.iter().collect();
    ordered.sort_by(|a, b| b.points.cmp(&a.points).then(b.wins.cmp(&a.wins)));

    ordered
        .into_iter()
        .map(|p| Standing {
            participant_id: p.id,
            display_name: p.display_name.clone(),
            wins: p.wins,
            losses: p.losses,
            points: p.points,
            winrate: winrate(p.wins, p.losses),
        })
        .collect()
}
