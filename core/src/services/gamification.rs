//! Level and XP curve
//!
//! Levels are derived from cumulative XP through a fixed threshold table.
//! XP only ever grows.

/// XP needed to reach level `i + 1`
pub const LEVEL_THRESHOLDS: [u64; 11] = [0, 100, 300, 600, 1000, 1500, 2100, 2800, 3600, 4500, 10000];

/// Level for a cumulative XP total. Never below 1, never above the table length.
pub fn calculate_level(xp: u64) -> u32 {
    LEVEL_THRESHOLDS
        .iter()
        .take_while(|&&threshold| xp >= threshold)
        .count()
        .max(1) as u32
}

/// XP threshold for reaching the level after `level`
pub fn next_level_xp(level: u32) -> u64 {
    let last = LEVEL_THRESHOLDS[LEVEL_THRESHOLDS.len() - 1];
    LEVEL_THRESHOLDS.get(level as usize).copied().unwrap_or(last)
}

/// Result of adding XP to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct XpAward {
    pub xp: u64,
    pub level: u32,
    pub previous_level: u32,
}

impl XpAward {
    pub fn leveled_up(&self) -> bool {
        self.level > self.previous_level
    }
}

/// Add `amount` to `current_xp` and recompute the level
pub fn apply_xp(current_xp: u64, current_level: u32, amount: u64) -> XpAward {
    let xp = current_xp.saturating_add(amount);
    XpAward {
        xp,
        level: calculate_level(xp),
        previous_level: current_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(calculate_level(0), 1);
        assert_eq!(calculate_level(99), 1);
        assert_eq!(calculate_level(100), 2);
        assert_eq!(calculate_level(299), 2);
        assert_eq!(calculate_level(300), 3);
        assert_eq!(calculate_level(4500), 10);
        assert_eq!(calculate_level(9999), 10);
        assert_eq!(calculate_level(10000), 11);
        assert_eq!(calculate_level(999_999), 11);
    }

    #[test]
    fn test_next_level_xp_clamps() {
        assert_eq!(next_level_xp(1), 100);
        assert_eq!(next_level_xp(5), 1500);
        assert_eq!(next_level_xp(10), 10000);
        assert_eq!(next_level_xp(11), 10000);
        assert_eq!(next_level_xp(40), 10000);
    }

    #[test]
    fn test_apply_xp_signals_level_up_only_on_crossing() {
        let award = apply_xp(50, 1, 50);
        assert_eq!(award.xp, 100);
        assert_eq!(award.level, 2);
        assert!(award.leveled_up());

        let award = apply_xp(100, 2, 50);
        assert_eq!(award.level, 2);
        assert!(!award.leveled_up());
    }

    #[test]
    fn test_apply_xp_repairs_stale_level() {
        let award = apply_xp(1250, 3, 50);
        assert_eq!(award.level, 5);
        assert!(award.leveled_up());
    }
}
