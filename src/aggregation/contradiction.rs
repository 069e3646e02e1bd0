//! Contradiction scanning: flags pairs of tier members whose scores diverge
//! sharply enough that "aggregate and move on" would hide a real
//! disagreement (a plan that scores high on stated objectives but low on
//! matching resourcing, say).

/// A member score the scanner can compare against its peers.
#[derive(Debug, Clone, Copy)]
pub struct ScoredMember<'a> {
    /// Identifier reported in contradiction findings.
    pub id: &'a str,
    /// The member's score, in `[0, 1]`.
    pub score: f64,
}

/// Minimum absolute score gap between two members before it is reported as
/// a contradiction.
pub const CONTRADICTION_THRESHOLD: f64 = 0.5;

/// Scans all pairs of `members` and returns one finding string per pair
/// whose score gap exceeds [`CONTRADICTION_THRESHOLD`].
#[must_use]
pub fn scan(members: &[ScoredMember<'_>]) -> Vec<String> {
    let mut findings = Vec::new();
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let gap = (members[i].score - members[j].score).abs();
            if gap > CONTRADICTION_THRESHOLD {
                findings.push(format!(
                    "{} ({:.2}) contradicts {} ({:.2}): gap {:.2}",
                    members[i].id, members[i].score, members[j].id, members[j].score, gap
                ));
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_contradiction_when_close() {
        let members = [ScoredMember { id: "a", score: 0.5 }, ScoredMember { id: "b", score: 0.6 }];
        assert!(scan(&members).is_empty());
    }

    #[test]
    fn test_contradiction_when_far_apart() {
        let members = [ScoredMember { id: "a", score: 0.1 }, ScoredMember { id: "b", score: 0.9 }];
        let findings = scan(&members);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].contains('a'));
        assert!(findings[0].contains('b'));
    }

    #[test]
    fn test_scans_all_pairs() {
        let members = [
            ScoredMember { id: "a", score: 0.0 },
            ScoredMember { id: "b", score: 0.6 },
            ScoredMember { id: "c", score: 1.0 },
        ];
        let findings = scan(&members);
        assert_eq!(findings.len(), 2);
    }

    #[test]
    fn test_empty_input_has_no_findings() {
        assert!(scan(&[]).is_empty());
    }
}
