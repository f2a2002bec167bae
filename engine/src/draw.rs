//! Uniform draws from small fixed option sets.
//!
//! Every draw takes the random source as a parameter so callers can pass a
//! seeded generator and replay a match or a spin exactly.

use rand::Rng;

/// Pick one element uniformly.
///
/// # Panics
///
/// Panics if `options` is empty. Every option set in the game is a fixed,
/// non-empty enumeration or an eleven-player squad.
pub fn pick<'a, T, R>(options: &'a [T], rng: &mut R) -> &'a T
where
    R: Rng + ?Sized,
{
    assert!(!options.is_empty(), "pick from an empty option set");
    &options[rng.gen_range(0..options.len())]
}

/// `true` with probability `p`, compared against a fresh uniform draw in `[0, 1)`.
pub fn chance<R>(p: f64, rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    rng.r#gen::<f64>() < p
}

/// Uniform integer in `[min, max]`.
pub fn int_between<R>(min: i32, max: i32, rng: &mut R) -> i32
where
    R: Rng + ?Sized,
{
    rng.gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn singleton_is_always_returned() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(*pick(&["only"], &mut rng), "only");
        }
    }

    #[test]
    #[should_panic(expected = "empty option set")]
    fn empty_options_violate_the_precondition() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let empty: [u8; 0] = [];
        pick(&empty, &mut rng);
    }

    #[test]
    fn every_option_is_reachable() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let options = [1, 2, 3, 4, 5];
        let mut seen = [false; 5];
        for _ in 0..500 {
            seen[*pick(&options, &mut rng) as usize - 1] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn same_seed_same_sequence() {
        let options = ["a", "b", "c", "d"];
        let mut first = ChaCha8Rng::seed_from_u64(99);
        let mut second = ChaCha8Rng::seed_from_u64(99);
        let a: Vec<_> = (0..20).map(|_| *pick(&options, &mut first)).collect();
        let b: Vec<_> = (0..20).map(|_| *pick(&options, &mut second)).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn chance_extremes() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!((0..100).all(|_| !chance(0.0, &mut rng)));
        assert!((0..100).all(|_| chance(1.0, &mut rng)));
    }

    #[test]
    fn int_between_is_inclusive() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let draws: Vec<i32> = (0..500).map(|_| int_between(-2, 2, &mut rng)).collect();
        assert!(draws.iter().all(|d| (-2..=2).contains(d)));
        assert!(draws.contains(&-2) && draws.contains(&2));
    }
}
