use super::domain::{DrawPick, DrawPlan, RankedRow};

/// Greedily covers `target_amount` from the ranked lines in order.
///
/// Returns `None` when the target is not positive. Lines without a usable
/// amount are skipped; the walk stops once the target is met, so any
/// shortfall stays visible as the last pick's remaining target.
pub fn plan_draws(ranked: &[RankedRow], target_amount: f64) -> Option<DrawPlan> {
    if target_amount.is_nan() || target_amount <= 0.0 {
        return None;
    }

    let mut remaining = target_amount;
    let mut picks = Vec::new();

    for (position, row) in ranked.iter().enumerate() {
        let available = row.canonical.draw_amount;
        if available.is_nan() || available <= 0.0 {
            continue;
        }

        let picked = available.min(remaining);
        remaining = (remaining - picked).max(0.0);
        picks.push(DrawPick {
            rank: position + 1,
            source_index: row.source_index,
            available_amount: available,
            picked_amount: picked,
            remaining_target: remaining,
        });

        if remaining <= 0.0 {
            break;
        }
    }

    Some(DrawPlan {
        target_amount,
        picks,
    })
}
