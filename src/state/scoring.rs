//! Score computation from raw ball counters and penalties.

use crate::state::{match_state::TeamRecord, penalty::PenaltyCatalog};

/// Points for each orange ball on the opponent's half.
pub const ORANGE_VALUE: i64 = 1;
/// Points for each purple ball on the opponent's half.
pub const PURPLE_VALUE: i64 = -2;

/// Compute the score of `team`, clamped at zero.
///
/// Every penalty code must already belong to `catalog`; entry points reject unknown codes
/// before they reach a [`TeamRecord`].
pub fn compute_score(team: &TeamRecord, catalog: &PenaltyCatalog) -> u32 {
    debug_assert!(catalog.validate(&team.penalties).is_ok());

    let penalties: i64 = team
        .penalties
        .iter()
        .filter_map(|code| catalog.delta(code).ok())
        .map(i64::from)
        .sum();

    let raw = i64::from(team.orange_count) * ORANGE_VALUE
        + i64::from(team.purple_count) * PURPLE_VALUE
        + penalties;

    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::penalty::PenaltyCode;

    fn team(orange: u32, purple: u32, penalties: &[&str]) -> TeamRecord {
        TeamRecord {
            orange_count: orange,
            purple_count: purple,
            penalties: penalties.iter().map(|code| PenaltyCode::new(*code)).collect(),
            ..TeamRecord::default()
        }
    }

    #[test]
    fn heavy_penalty_clamps_to_zero() {
        let catalog = PenaltyCatalog::default();
        // 5 - 2 - 30 = -27
        assert_eq!(compute_score(&team(5, 1, &["touching_robot"]), &catalog), 0);
    }

    #[test]
    fn orange_and_purple_balls_are_weighted() {
        let catalog = PenaltyCatalog::default();
        assert_eq!(compute_score(&team(12, 3, &[]), &catalog), 6);
        assert_eq!(compute_score(&team(0, 4, &[]), &catalog), 0);
    }

    #[test]
    fn duplicate_penalties_count_each_time() {
        let catalog = PenaltyCatalog::default();
        assert_eq!(
            compute_score(&team(40, 0, &["wrong_start", "wrong_start"]), &catalog),
            20
        );
    }

    #[test]
    fn score_matches_formula_over_a_grid() {
        let catalog = PenaltyCatalog::default();
        let sequences: [&[&str]; 3] = [&[], &["ball_outside"], &["late_start", "ball_thrown"]];
        for orange in 0..40 {
            for purple in 0..10 {
                for penalties in sequences {
                    let record = team(orange, purple, penalties);
                    let sum: i64 = penalties
                        .iter()
                        .map(|code| i64::from(catalog.delta(&(*code).into()).unwrap()))
                        .sum();
                    let expected = (i64::from(orange) - 2 * i64::from(purple) + sum).max(0);
                    assert_eq!(i64::from(compute_score(&record, &catalog)), expected);
                }
            }
        }
    }

    #[test]
    fn custom_catalog_bonus_is_applied() {
        let catalog = PenaltyCatalog::from_entries([("bonus", "Bonus", 15)]).unwrap();
        assert_eq!(compute_score(&team(0, 0, &["bonus"]), &catalog), 15);
    }
}
