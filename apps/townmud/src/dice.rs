use parking_lot::Mutex;

/// Source of uniform rolls for combat and respawn.
pub trait Dice {
    /// Uniform integer in `lo..=hi_inclusive`.
    fn roll_range(&mut self, lo: i32, hi_inclusive: i32) -> i32;

    /// True with probability `pct` percent.
    fn chance(&mut self, pct: u32) -> bool {
        pct > 0 && self.roll_range(0, 99) < pct.min(100) as i32
    }
}

#[derive(Debug, Clone)]
pub struct Rng64 {
    state: u64,
}

impl Rng64 {
    pub fn from_seed(seed: u64) -> Self {
        let mut s = seed;
        if s == 0 {
            s = 0x9e3779b97f4a7c15;
        }
        Self { state: s }
    }

    pub fn from_clock() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Self::from_seed((nanos as u64) ^ ((nanos >> 64) as u64))
    }

    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

impl Dice for Rng64 {
    fn roll_range(&mut self, lo: i32, hi_inclusive: i32) -> i32 {
        debug_assert!(lo <= hi_inclusive);
        if hi_inclusive <= lo {
            return lo;
        }
        let span = (hi_inclusive as i64 - lo as i64 + 1) as u64;
        lo + (self.next_u64() % span) as i32
    }
}

/// Per-roll access to a shared generator. The lock is held only for a single roll, so
/// callers may hold room or player locks while rolling.
pub struct SharedDice<'a>(pub &'a Mutex<Rng64>);

impl Dice for SharedDice<'_> {
    fn roll_range(&mut self, lo: i32, hi_inclusive: i32) -> i32 {
        self.0.lock().roll_range(lo, hi_inclusive)
    }
}

/// Replays fixed rolls, clamped into the requested range. Falls back to `lo` when exhausted.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedDice {
    rolls: std::collections::VecDeque<i32>,
}

#[cfg(test)]
impl ScriptedDice {
    pub(crate) fn new(rolls: &[i32]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl Dice for ScriptedDice {
    fn roll_range(&mut self, lo: i32, hi_inclusive: i32) -> i32 {
        self.rolls
            .pop_front()
            .map(|r| r.clamp(lo, hi_inclusive))
            .unwrap_or(lo)
    }
}
