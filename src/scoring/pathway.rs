use crate::scoring::{DvaTier, MarginTier, Pathway};

/// Picks the lower-effort route to flip a race. A race that looks hard by
/// DVA can still be an easy vote-gap target, and the reverse. Equal effort
/// goes to mobilization.
pub fn choose_pathway(margin_tier: MarginTier, dva_tier: DvaTier) -> Pathway {
    if margin_tier.effort_rank() < dva_tier.effort_rank() {
        Pathway::VoteGap
    } else {
        Pathway::Mobilization
    }
}
