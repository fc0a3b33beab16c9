use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};

///
/// Randomness
///
/// Seeded generator. Every variant draws from its own stream so that adding
/// a variant never perturbs the instances generated for another.
///

#[derive(Clone, Debug)]
pub struct Randomness {
    rng: ChaCha8Rng,
}

impl Randomness {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Stream for one variant, seeded from `seed ^ hash(type_id)`.
    #[must_use]
    pub fn for_variant(seed: u64, type_id: &str) -> Self {
        Self::new(seed ^ xxhash_rust::xxh3::xxh3_64(type_id.as_bytes()))
    }

    pub fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    /// Uniform integer in `lo..=hi`; the bounds are swapped if reversed.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss
    )]
    pub fn between(&mut self, lo: i64, hi: i64) -> i64 {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let span = (i128::from(hi) - i128::from(lo) + 1) as u128;
        let offset = u128::from(self.next_u64()) % span;

        (i128::from(lo) + offset as i128) as i64
    }

    /// Uniform length in `lo..=hi`.
    pub fn len_between(&mut self, lo: usize, hi: usize) -> usize {
        let lo = i64::try_from(lo).unwrap_or(i64::MAX);
        let hi = i64::try_from(hi).unwrap_or(i64::MAX);

        usize::try_from(self.between(lo, hi)).unwrap_or(0)
    }

    pub fn bool(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }

    /// True with probability `1 / n`.
    pub fn one_in(&mut self, n: u64) -> bool {
        n <= 1 || self.next_u64() % n == 0
    }

    /// Uniform in `[0, 1)`.
    #[expect(clippy::cast_precision_loss)]
    pub fn float(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Any finite `f64`, drawn from the full bit space. An all-ones exponent
    /// has its top bit cleared.
    pub fn finite_double(&mut self) -> f64 {
        let bits = self.next_u64();
        let value = f64::from_bits(bits);
        if value.is_finite() {
            value
        } else {
            f64::from_bits(bits & !(1 << 62))
        }
    }

    /// Lowercase ASCII letters, `len_lo..=len_hi` long.
    pub fn ascii(&mut self, len_lo: usize, len_hi: usize) -> String {
        const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

        let len = self.len_between(len_lo, len_hi);
        (0..len)
            .filter_map(|_| self.pick(ALPHABET).map(|b| char::from(*b)))
            .collect()
    }

    /// Arbitrary scalar values, `len` characters long.
    pub fn unicode(&mut self, len: usize) -> String {
        (0..len).map(|_| self.char()).collect()
    }

    fn char(&mut self) -> char {
        // mostly BMP, occasionally astral; surrogates are skipped
        let hi = if self.one_in(8) { 0x10_FFFF } else { 0xFFFF };
        loop {
            let code = u32::try_from(self.between(0x20, hi)).unwrap_or(0x20);
            if let Some(c) = char::from_u32(code) {
                return c;
            }
        }
    }

    /// Uniform element of `items`; `None` when empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let index = self.len_between(0, items.len() - 1);

        items.get(index)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Randomness::new(9);
        let mut b = Randomness::new(9);

        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn variants_draw_from_distinct_streams() {
        let mut term = Randomness::for_variant(9, "term");
        let mut range = Randomness::for_variant(9, "range");

        assert_ne!(term.next_u64(), range.next_u64());
    }

    #[test]
    fn between_stays_in_bounds() {
        let mut rng = Randomness::new(1);

        for _ in 0..256 {
            let v = rng.between(-3, 3);
            assert!((-3..=3).contains(&v));
        }
        assert_eq!(rng.between(5, 5), 5);
        let extreme = rng.between(i64::MIN, i64::MAX);
        assert!((i64::MIN..=i64::MAX).contains(&extreme));
    }

    #[test]
    fn strings_respect_length_bounds() {
        let mut rng = Randomness::new(2);

        for _ in 0..64 {
            let s = rng.ascii(1, 10);
            assert!((1..=10).contains(&s.len()));
            assert!(s.bytes().all(|b| b.is_ascii_lowercase()));
            assert_eq!(rng.unicode(4).chars().count(), 4);
        }
    }

    #[test]
    fn floats_are_unit_interval() {
        let mut rng = Randomness::new(3);

        for _ in 0..256 {
            let f = rng.float();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn finite_doubles_cover_large_exponents() {
        let mut rng = Randomness::new(5);
        let draws: Vec<f64> = (0..512).map(|_| rng.finite_double()).collect();

        assert!(draws.iter().all(|d| d.is_finite()));
        assert!(draws.iter().any(|d| d.abs() > 1.0e100));
    }

    #[test]
    fn pick_handles_empty_slices() {
        let mut rng = Randomness::new(4);

        assert_eq!(rng.pick::<u8>(&[]), None);
        assert_eq!(rng.pick(&[7]), Some(&7));
    }
}
