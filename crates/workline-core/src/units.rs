use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
///
/// Used for reporting ratios deterministically. Scheduling arithmetic itself
/// is exact integer math; see [`crate::rationing`].
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert Fixed64 to f64. Use only for display, never in sim logic.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_determinism() {
        let a = Fixed64::from_num(1) / Fixed64::from_num(3);
        let b = Fixed64::from_num(1) / Fixed64::from_num(3);
        assert_eq!(a, b);
    }

    #[test]
    fn ticks_type() {
        let t: Ticks = 16;
        assert_eq!(t, 16u64);
    }
}
