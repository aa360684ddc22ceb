//! 等级计算 - 由积分推导等级，纯函数

/// Brain Points 等级
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    /// Johnny Just Come
    Jjc,
    Aspirant,
    Efiko,
    Scholar,
    Idan,
    Ancestor,
}

/// 每个等级的积分上限（不含），按升序排列
const THRESHOLDS: [(u64, Rank); 5] = [
    (50, Rank::Jjc),
    (100, Rank::Aspirant),
    (500, Rank::Efiko),
    (1000, Rank::Scholar),
    (5000, Rank::Idan),
];

impl Rank {
    /// 根据积分计算等级
    pub fn from_points(points: u64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(upper, _)| points < *upper)
            .map(|(_, rank)| *rank)
            .unwrap_or(Rank::Ancestor)
    }

    /// 等级序号（1-6）
    pub fn tier(self) -> u8 {
        match self {
            Rank::Jjc => 1,
            Rank::Aspirant => 2,
            Rank::Efiko => 3,
            Rank::Scholar => 4,
            Rank::Idan => 5,
            Rank::Ancestor => 6,
        }
    }

    /// 展示名称
    pub fn label(self) -> &'static str {
        match self {
            Rank::Jjc => "JJC (Johnny Just Come) 👶",
            Rank::Aspirant => "Aspirant 📝",
            Rank::Efiko => "Efiko (Bookworm) 🤓",
            Rank::Scholar => "Scholar 🎓",
            Rank::Idan => "Idan (The Boss) 🕶️",
            Rank::Ancestor => "Ancestor 👑",
        }
    }
}

impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(Rank::from_points(0).tier(), 1);
        assert_eq!(Rank::from_points(49).tier(), 1);
        assert_eq!(Rank::from_points(50).tier(), 2);
        assert_eq!(Rank::from_points(99), Rank::Aspirant);
        assert_eq!(Rank::from_points(100), Rank::Efiko);
        assert_eq!(Rank::from_points(999), Rank::Scholar);
        assert_eq!(Rank::from_points(4999), Rank::Idan);
        assert_eq!(Rank::from_points(5000), Rank::Ancestor);
        assert_eq!(Rank::from_points(u64::MAX), Rank::Ancestor);
    }

    #[test]
    fn test_monotonic() {
        let mut previous = Rank::from_points(0);
        for points in 1..=6000 {
            let current = Rank::from_points(points);
            assert!(current >= previous, "等级在 {} 分时下降", points);
            previous = current;
        }
    }
}
