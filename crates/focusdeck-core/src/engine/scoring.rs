//! Heuristic candidate scoring.
//!
//! This module provides the base score for focus candidates, considering
//! priority, due-date proximity, energy matching, unlock potential, and
//! the context-switch penalty. The resulting order is the fallback when
//! the ranking service is unavailable, so every function here must be
//! deterministic for identical inputs.

use chrono::{DateTime, Utc};

use crate::graph::DependencyAnnotation;
use crate::model::{EnergyLevel, Task};

/// Neutral starting score.
pub const BASE_SCORE: f64 = 50.0;

/// Per-step priority weight (+5 per priority level, 0..=25 for the
/// store's 0..=5 scale).
const PRIORITY_WEIGHT: f64 = 5.0;

/// Per-dependent unlock bonus and its cap.
const UNLOCK_BONUS_PER_TASK: f64 = 5.0;
const UNLOCK_BONUS_CAP: f64 = 15.0;

/// Weight applied to the context-switch cost (cost is roughly 0..=1.5).
const SWITCH_COST_WEIGHT: f64 = 20.0;

/// Priority adjustment (0..=25).
///
/// Direct weight on the store's ordinal priority; values outside 0..=5
/// are clamped.
pub fn priority_score(task: &Task) -> f64 {
    f64::from(task.priority.clamp(0, 5)) * PRIORITY_WEIGHT
}

/// Due-date proximity score (0..=20).
///
/// - overdue = +20
/// - due within a day = +15
/// - due within three days = +10
/// - due within a week = +5
/// - later or no due date = 0
pub fn due_date_score(task: &Task, now: DateTime<Utc>) -> f64 {
    let Some(due) = task.due_date else {
        return 0.0;
    };
    let hours_left = (due - now).num_hours();
    if hours_left < 0 {
        20.0
    } else if hours_left <= 24 {
        15.0
    } else if hours_left <= 72 {
        10.0
    } else if hours_left <= 168 {
        5.0
    } else {
        0.0
    }
}

/// Energy matching score (-8..=+10).
///
/// Exact match beats adjacent, adjacent beats a two-step mismatch:
/// - exact = +10
/// - adjacent level = +4
/// - low vs high = -8
pub fn energy_match_score(task_energy: EnergyLevel, requested: EnergyLevel) -> f64 {
    match task_energy.distance(requested) {
        0 => 10.0,
        1 => 4.0,
        _ => -8.0,
    }
}

/// Unlock bonus (0..=15).
///
/// Tasks whose completion unblocks others score higher, +5 per dependent
/// up to the cap, encouraging chain progress.
pub fn unlock_bonus(annotation: &DependencyAnnotation) -> f64 {
    if !annotation.unlocks_tasks {
        return 0.0;
    }
    (annotation.blocking_ids.len() as f64 * UNLOCK_BONUS_PER_TASK).min(UNLOCK_BONUS_CAP)
}

/// Context-switch penalty (>= 0, subtracted from the score).
pub fn switch_penalty(switch_cost: f64) -> f64 {
    switch_cost.max(0.0) * SWITCH_COST_WEIGHT
}

/// Combined heuristic score for one candidate.
///
/// Base 50, plus priority, due proximity, energy match and unlock bonus,
/// minus the switch penalty. Clamped to [0, 100].
pub fn heuristic_score(
    task: &Task,
    annotation: &DependencyAnnotation,
    switch_cost: f64,
    requested_energy: EnergyLevel,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = BASE_SCORE;
    score += priority_score(task);
    score += due_date_score(task, now);
    score += energy_match_score(task.energy, requested_energy);
    score += unlock_bonus(annotation);
    score -= switch_penalty(switch_cost);
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn make_task(priority: i32, energy: EnergyLevel, due_in_hours: Option<i64>) -> Task {
        let now = fixed_now();
        Task {
            id: 1,
            title: "Test Task".to_string(),
            done: false,
            priority,
            due_date: due_in_hours.map(|h| now + Duration::hours(h)),
            project_id: 1,
            energy,
            estimated_minutes: 25,
            relations: Vec::new(),
        }
    }

    fn make_annotation(blocking_ids: Vec<i64>) -> DependencyAnnotation {
        DependencyAnnotation {
            is_blocked: false,
            blocked_by_ids: Vec::new(),
            unlocks_tasks: !blocking_ids.is_empty(),
            blocking_ids,
            on_cycle: false,
            chain: None,
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
    }

    #[test]
    fn priority_is_clamped() {
        assert_eq!(priority_score(&make_task(3, EnergyLevel::Medium, None)), 15.0);
        assert_eq!(priority_score(&make_task(99, EnergyLevel::Medium, None)), 25.0);
        assert_eq!(priority_score(&make_task(-1, EnergyLevel::Medium, None)), 0.0);
    }

    #[test]
    fn overdue_beats_near_due() {
        let now = fixed_now();
        let overdue = due_date_score(&make_task(0, EnergyLevel::Medium, Some(-5)), now);
        let today = due_date_score(&make_task(0, EnergyLevel::Medium, Some(10)), now);
        let this_week = due_date_score(&make_task(0, EnergyLevel::Medium, Some(100)), now);
        let far = due_date_score(&make_task(0, EnergyLevel::Medium, Some(1000)), now);
        assert!(overdue > today);
        assert!(today > this_week);
        assert!(this_week > far);
        assert_eq!(far, 0.0);
    }

    #[test]
    fn exact_energy_match_beats_adjacent() {
        let exact = energy_match_score(EnergyLevel::High, EnergyLevel::High);
        let adjacent = energy_match_score(EnergyLevel::Medium, EnergyLevel::High);
        let mismatch = energy_match_score(EnergyLevel::Low, EnergyLevel::High);
        assert!(exact > adjacent);
        assert!(adjacent > mismatch);
        assert!(mismatch < 0.0);
    }

    #[test]
    fn unlock_bonus_scales_and_caps() {
        assert_eq!(unlock_bonus(&make_annotation(vec![])), 0.0);
        assert_eq!(unlock_bonus(&make_annotation(vec![2])), 5.0);
        assert_eq!(unlock_bonus(&make_annotation(vec![2, 3])), 10.0);
        assert_eq!(unlock_bonus(&make_annotation(vec![2, 3, 4, 5, 6])), 15.0);
    }

    #[test]
    fn done_tasks_earn_no_unlock_bonus() {
        let mut annotation = make_annotation(vec![2, 3]);
        annotation.unlocks_tasks = false; // done upstream
        assert_eq!(unlock_bonus(&annotation), 0.0);
    }

    #[test]
    fn switch_cost_lowers_score() {
        let task = make_task(3, EnergyLevel::Medium, None);
        let annotation = make_annotation(vec![]);
        let now = fixed_now();
        let at_home =
            heuristic_score(&task, &annotation, 0.0, EnergyLevel::Medium, now);
        let across =
            heuristic_score(&task, &annotation, 0.5, EnergyLevel::Medium, now);
        assert!(at_home > across);
        assert_eq!(at_home - across, 10.0);
    }

    #[test]
    fn base_case_adds_up() {
        // base 50 + priority 15 + due 0 + energy exact 10 + unlock 0 - switch 0
        let task = make_task(3, EnergyLevel::Medium, None);
        let annotation = make_annotation(vec![]);
        let score =
            heuristic_score(&task, &annotation, 0.0, EnergyLevel::Medium, fixed_now());
        assert_eq!(score, 75.0);
    }

    proptest! {
        #[test]
        fn score_stays_in_bounds(
            priority in -10i32..20,
            due_in_hours in proptest::option::of(-1000i64..1000),
            dependents in 0usize..10,
            switch_cost in 0.0f64..5.0,
        ) {
            let energy = EnergyLevel::Medium;
            let task = make_task(priority, energy, due_in_hours);
            let blocking: Vec<i64> = (0..dependents as i64).map(|i| i + 2).collect();
            let annotation = make_annotation(blocking);
            let score = heuristic_score(&task, &annotation, switch_cost, energy, fixed_now());
            prop_assert!((0.0..=100.0).contains(&score));
        }

        #[test]
        fn score_is_deterministic(
            priority in 0i32..6,
            switch_cost in 0.0f64..2.0,
        ) {
            let task = make_task(priority, EnergyLevel::High, Some(48));
            let annotation = make_annotation(vec![2]);
            let now = fixed_now();
            let a = heuristic_score(&task, &annotation, switch_cost, EnergyLevel::High, now);
            let b = heuristic_score(&task, &annotation, switch_cost, EnergyLevel::High, now);
            prop_assert_eq!(a, b);
        }
    }
}
