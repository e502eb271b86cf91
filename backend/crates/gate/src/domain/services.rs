//! Domain Services
//!
//! Pure domain logic: code generation and weighted site selection.

use crate::domain::entities::Site;
use platform::crypto::random_string;

/// Verification code alphabet; visually ambiguous characters (0, O, 1, I)
/// are excluded. 32 characters, so byte sampling stays unbiased.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Floor weight so zero-priority sites are never starved out of selection
pub const MIN_SELECTION_WEIGHT: f64 = 1e-3;

/// Generate a random uppercase verification code
pub fn generate_code(len: usize) -> String {
    random_string(CODE_ALPHABET, len)
}

/// Effective selection weight of a site
pub fn selection_weight(priority: i32) -> f64 {
    if priority <= 0 {
        MIN_SELECTION_WEIGHT
    } else {
        priority as f64
    }
}

/// Weighted random pick by cumulative scan
///
/// `roll` must be uniform in `[0, 1)`. Returns the first site whose
/// cumulative weight exceeds `roll * total`; falls back to the last site
/// when floating accumulation lands on the boundary.
pub fn pick_weighted(sites: &[Site], roll: f64) -> Option<&Site> {
    if sites.is_empty() {
        return None;
    }
    let total: f64 = sites.iter().map(|s| selection_weight(s.priority)).sum();
    let target = roll * total;

    let mut acc = 0.0;
    for site in sites {
        acc += selection_weight(site.priority);
        if acc > target {
            return Some(site);
        }
    }
    sites.last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel::id::SiteId;

    fn site(key: &str, priority: i32) -> Site {
        Site {
            id: SiteId::new(),
            site_key: key.to_string(),
            name: key.to_string(),
            domain: format!("{key}.example"),
            url: None,
            search_hint: None,
            instruction: None,
            is_active: true,
            priority,
            quota: 0,
            remaining_quota: 0,
            total_visits: 0,
            total_completed: 0,
        }
    }

    #[test]
    fn test_code_length_and_alphabet() {
        let code = generate_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_code_excludes_ambiguous_chars() {
        for _ in 0..50 {
            let code = generate_code(6);
            assert!(!code.contains(['0', 'O', '1', 'I']));
        }
    }

    #[test]
    fn test_selection_weight_floor() {
        assert_eq!(selection_weight(0), MIN_SELECTION_WEIGHT);
        assert_eq!(selection_weight(-5), MIN_SELECTION_WEIGHT);
        assert_eq!(selection_weight(10), 10.0);
    }

    #[test]
    fn test_pick_weighted_empty() {
        assert!(pick_weighted(&[], 0.5).is_none());
    }

    #[test]
    fn test_pick_weighted_cumulative_scan() {
        // a: weight 10 covers [0, 10); b: weight 30 covers [10, 40)
        let sites = vec![site("a", 10), site("b", 30)];

        assert_eq!(pick_weighted(&sites, 0.0).unwrap().site_key, "a");
        assert_eq!(pick_weighted(&sites, 0.2).unwrap().site_key, "a"); // target 8
        assert_eq!(pick_weighted(&sites, 0.25).unwrap().site_key, "b"); // target 10
        assert_eq!(pick_weighted(&sites, 0.99).unwrap().site_key, "b");
    }

    #[test]
    fn test_pick_weighted_single_zero_priority() {
        let sites = vec![site("only", 0)];
        assert_eq!(pick_weighted(&sites, 0.7).unwrap().site_key, "only");
    }

    #[test]
    fn test_pick_weighted_zero_priority_reachable() {
        // the zero-priority site owns the tail of the range
        let sites = vec![site("big", 1), site("zero", 0)];
        let total = 1.0 + MIN_SELECTION_WEIGHT;
        let roll = (1.0 + MIN_SELECTION_WEIGHT / 2.0) / total;
        assert_eq!(pick_weighted(&sites, roll).unwrap().site_key, "zero");
    }
}
