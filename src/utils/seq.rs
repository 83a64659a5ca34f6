/// Size of the sequence space. One more than the largest window the ring can hold.
pub const MOD_N: u8 = 61;

/// Largest value the 6-bit wire field can carry.
pub const SEQ_WIRE_MAX: u8 = 0x3f;

/// A sequence number on the ring `[0, MOD_N)`.
///
/// Values decoded from the wire may lie in `[MOD_N, 63]`. Those are kept as-is
/// so they can be logged, but they are never equal to a valid sequence number
/// and never fall inside a window.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Seq {
    n: u8,
}

impl Seq {
    #[must_use]
    pub fn zero() -> Self {
        Seq { n: 0 }
    }

    /// Takes the low 6 bits of `n`.
    #[must_use]
    pub fn from_wire(n: u8) -> Self {
        Seq {
            n: n & SEQ_WIRE_MAX,
        }
    }

    /// Reduces `n` onto the ring.
    #[must_use]
    pub fn from_u8(n: u8) -> Self {
        Seq { n: n % MOD_N }
    }

    #[must_use]
    #[inline]
    pub fn to_u8(&self) -> u8 {
        self.n
    }

    #[must_use]
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.n < MOD_N
    }

    #[must_use]
    pub fn add_u8(&self, n: u8) -> Seq {
        let s = (self.n as u16 + n as u16) % MOD_N as u16;
        Seq { n: s as u8 }
    }

    #[must_use]
    pub fn prev(&self) -> Seq {
        match self.n {
            0 => Seq { n: MOD_N - 1 },
            n => Seq { n: (n - 1) % MOD_N },
        }
    }

    /// Distance from `other` forward to `self` on the ring.
    #[must_use]
    pub fn sub_seq(&self, other: Seq) -> u8 {
        let s = (self.n as u16 + MOD_N as u16 - (other.n % MOD_N) as u16) % MOD_N as u16;
        s as u8
    }

    pub fn increment(&mut self) {
        *self = self.add_u8(1);
    }
}

impl std::fmt::Display for Seq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.n)
    }
}

/// `x` lies in the half-open circular interval `[lo, hi)`.
///
/// `lo == hi` is the empty interval. Any operand outside `[0, MOD_N)` makes the
/// result `false`.
#[must_use]
pub fn between(lo: Seq, x: Seq, hi: Seq) -> bool {
    if !(lo.is_valid() && x.is_valid() && hi.is_valid()) {
        return false;
    }
    x.sub_seq(lo) < hi.sub_seq(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraparound() {
        let a = Seq::from_u8(MOD_N - 1);
        let b = a.add_u8(1);
        assert_eq!(b.to_u8(), 0);
    }

    #[test]
    fn add_wo_wraparound() {
        let a = Seq::from_u8(0);
        let b = a.add_u8(1);
        assert_eq!(b.to_u8(), 1);
    }

    #[test]
    fn increment_wraparound() {
        let mut a = Seq::from_u8(58);
        let mut seen = Vec::new();
        for _ in 0..5 {
            seen.push(a.to_u8());
            a.increment();
        }
        assert_eq!(seen, vec![58, 59, 60, 0, 1]);
    }

    #[test]
    fn prev_wraparound() {
        assert_eq!(Seq::zero().prev().to_u8(), MOD_N - 1);
        assert_eq!(Seq::from_u8(7).prev().to_u8(), 6);
    }

    #[test]
    fn sub_wraparound() {
        let a = Seq::from_u8(1);
        let b = Seq::from_u8(MOD_N - 2);
        assert_eq!(a.sub_seq(b), 3);
        assert_eq!(b.sub_seq(b), 0);
    }

    #[test]
    fn from_wire_keeps_unreachable_values() {
        let s = Seq::from_wire(0xff);
        assert_eq!(s.to_u8(), 63);
        assert!(!s.is_valid());
        assert_ne!(s, Seq::from_u8(2));
    }

    #[test]
    fn between_plain() {
        let lo = Seq::from_u8(3);
        let hi = Seq::from_u8(8);
        assert!(between(lo, Seq::from_u8(3), hi));
        assert!(between(lo, Seq::from_u8(7), hi));
        assert!(!between(lo, Seq::from_u8(8), hi));
        assert!(!between(lo, Seq::from_u8(2), hi));
    }

    #[test]
    fn between_wraparound() {
        let lo = Seq::from_u8(58);
        let hi = Seq::from_u8(2);
        for n in [58, 59, 60, 0, 1] {
            assert!(between(lo, Seq::from_u8(n), hi), "{}", n);
        }
        for n in [2, 3, 30, 57] {
            assert!(!between(lo, Seq::from_u8(n), hi), "{}", n);
        }
    }

    #[test]
    fn between_empty() {
        let s = Seq::from_u8(10);
        for n in 0..MOD_N {
            assert!(!between(s, Seq::from_u8(n), s));
        }
    }

    #[test]
    fn between_full_window() {
        let lo = Seq::from_u8(10);
        let hi = Seq::from_u8(9);
        for n in 0..MOD_N {
            assert_eq!(between(lo, Seq::from_u8(n), hi), n != 9, "{}", n);
        }
    }

    #[test]
    fn between_rejects_unreachable() {
        let lo = Seq::from_u8(58);
        let hi = Seq::from_u8(2);
        for n in MOD_N..=SEQ_WIRE_MAX {
            assert!(!between(lo, Seq::from_wire(n), hi));
        }
    }
}
