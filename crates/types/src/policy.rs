//! Upgrade/downgrade decision for plan changes.

use crate::catalog::PlanType;

/// Outcome of requesting a plan while another may be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChange {
    /// No active plan, or a renewal of the same tier. Renewals add days.
    Allowed,
    /// Higher tier than the active plan. Switching resets remaining days
    /// to the new plan's fresh term instead of adding to them.
    AllowedAsUpgrade,
    /// Lower tier than the active plan. Downgrades are forbidden; the
    /// current plan has to lapse first.
    Blocked,
}

/// Decide whether `requested` may be purchased given the active plan.
pub fn decide(current: Option<PlanType>, requested: PlanType) -> PlanChange {
    let Some(current) = current else {
        return PlanChange::Allowed;
    };

    match requested.rank().cmp(&current.rank()) {
        std::cmp::Ordering::Less => PlanChange::Blocked,
        std::cmp::Ordering::Equal => PlanChange::Allowed,
        std::cmp::Ordering::Greater => PlanChange::AllowedAsUpgrade,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_active_plan_allows_anything() {
        assert_eq!(decide(None, PlanType::Personal), PlanChange::Allowed);
        assert_eq!(decide(None, PlanType::Family), PlanChange::Allowed);
    }

    #[test]
    fn upgrades_are_flagged() {
        assert_eq!(
            decide(Some(PlanType::Personal), PlanType::Family),
            PlanChange::AllowedAsUpgrade
        );
        assert_eq!(
            decide(Some(PlanType::Personal), PlanType::Premium),
            PlanChange::AllowedAsUpgrade
        );
        assert_eq!(
            decide(Some(PlanType::Premium), PlanType::Family),
            PlanChange::AllowedAsUpgrade
        );
    }

    #[test]
    fn downgrades_are_blocked() {
        assert_eq!(
            decide(Some(PlanType::Family), PlanType::Personal),
            PlanChange::Blocked
        );
        assert_eq!(
            decide(Some(PlanType::Family), PlanType::Premium),
            PlanChange::Blocked
        );
        assert_eq!(
            decide(Some(PlanType::Premium), PlanType::Personal),
            PlanChange::Blocked
        );
    }

    #[test]
    fn same_tier_is_a_renewal() {
        assert_eq!(
            decide(Some(PlanType::Premium), PlanType::Premium),
            PlanChange::Allowed
        );
    }
}
