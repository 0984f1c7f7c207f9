/// Result of scoring a single answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub points: u32,
    pub streak_after: u32,
    pub bonus: u32,
}

/// Extra points for reaching a streak length; lower bounds are inclusive.
pub fn streak_bonus(streak: u32) -> u32 {
    match streak {
        10.. => 5,
        7..=9 => 3,
        5..=6 => 2,
        3..=4 => 1,
        _ => 0,
    }
}

pub fn award(is_correct: bool, streak_before: u32) -> Award {
    if !is_correct {
        return Award {
            points: 0,
            streak_after: 0,
            bonus: 0,
        };
    }

    let streak_after = streak_before.saturating_add(1);
    let bonus = streak_bonus(streak_after);
    Award {
        points: 1 + bonus,
        streak_after,
        bonus,
    }
}
