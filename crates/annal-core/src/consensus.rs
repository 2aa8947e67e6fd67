//! The consensus engine: tally in, score and timeline out.
//!
//! Everything here is a pure function of the tally. Re-running it on the same
//! counters always gives the same answer, which is what lets anyone audit why
//! an event sits in the bucket it does.

use serde::{Deserialize, Serialize};

use crate::{event::Timeline, vote::Tally};

/// Scores at or above this are [`Timeline::Canonical`].
pub const CANONICAL_THRESHOLD: u8 = 75;

/// Scores at or below this are [`Timeline::Alternative`].
pub const ALTERNATIVE_THRESHOLD: u8 = 25;

/// The derived classification of a tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consensus {
  pub score:    u8,
  pub timeline: Timeline,
}

/// Percentage of support among all votes, truncated towards zero.
/// `0` when there are no votes.
pub fn score(tally: Tally) -> u8 {
  let total = u128::from(tally.support) + u128::from(tally.challenge);
  if total == 0 {
    return 0;
  }
  // support <= total, so the quotient is at most 100.
  (u128::from(tally.support) * 100 / total) as u8
}

/// Bucket a score: `>= 75` canonical, `<= 25` alternative, otherwise disputed.
pub fn classify(score: u8) -> Timeline {
  if score >= CANONICAL_THRESHOLD {
    Timeline::Canonical
  } else if score <= ALTERNATIVE_THRESHOLD {
    Timeline::Alternative
  } else {
    Timeline::Disputed
  }
}

/// Score and bucket a tally. A tally with no votes is disputed with score 0;
/// it is never classified from its (undefined) ratio.
pub fn evaluate(tally: Tally) -> Consensus {
  if tally.support == 0 && tally.challenge == 0 {
    return Consensus { score: 0, timeline: Timeline::Disputed };
  }
  let score = score(tally);
  Consensus { score, timeline: classify(score) }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn eval(support: u64, challenge: u64) -> Consensus {
    evaluate(Tally { support, challenge })
  }

  #[test]
  fn no_votes_is_disputed() {
    assert_eq!(eval(0, 0), Consensus { score: 0, timeline: Timeline::Disputed });
  }

  #[test]
  fn boundary_tallies() {
    assert_eq!(eval(3, 1), Consensus { score: 75, timeline: Timeline::Canonical });
    assert_eq!(eval(1, 3), Consensus { score: 25, timeline: Timeline::Alternative });
    assert_eq!(eval(1, 1), Consensus { score: 50, timeline: Timeline::Disputed });
    assert_eq!(eval(1, 0).timeline, Timeline::Canonical);
    assert_eq!(eval(0, 1).timeline, Timeline::Alternative);
  }

  #[test]
  fn score_truncates_rather_than_rounds() {
    // 2 of 3 is 66.67%, 3 of 8 is 37.5%.
    assert_eq!(score(Tally { support: 2, challenge: 1 }), 66);
    assert_eq!(score(Tally { support: 3, challenge: 5 }), 37);
    // 74.9...% must not round up into the canonical bucket.
    assert_eq!(eval(749, 251), Consensus { score: 74, timeline: Timeline::Disputed });
    // 25.9% truncates to 25 and lands in the alternative bucket.
    assert_eq!(eval(259, 741), Consensus { score: 25, timeline: Timeline::Alternative });
    assert_eq!(eval(26, 74).timeline, Timeline::Disputed);
  }

  #[test]
  fn classify_is_inclusive_at_both_thresholds() {
    assert_eq!(classify(100), Timeline::Canonical);
    assert_eq!(classify(75), Timeline::Canonical);
    assert_eq!(classify(74), Timeline::Disputed);
    assert_eq!(classify(26), Timeline::Disputed);
    assert_eq!(classify(25), Timeline::Alternative);
    assert_eq!(classify(0), Timeline::Alternative);
  }

  #[test]
  fn evaluate_is_deterministic_and_bounded() {
    for support in 0..40 {
      for challenge in 0..40 {
        let first = eval(support, challenge);
        assert_eq!(first, eval(support, challenge));
        assert!(first.score <= 100);
      }
    }
  }

  #[test]
  fn extreme_counters_do_not_overflow() {
    assert_eq!(eval(u64::MAX, 0).score, 100);
    assert_eq!(eval(0, u64::MAX).score, 0);
    assert_eq!(eval(u64::MAX, u64::MAX).score, 50);
  }
}
