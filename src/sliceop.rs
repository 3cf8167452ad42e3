//! Slice kernels used by the CFR engine's regret-matching inner loop.
//! Kept close to the teacher's `sliceop.rs`; the algorithms here don't change
//! under this crate's spec, only their callers do.

use crate::utility::*;

#[inline]
pub(crate) fn div_slice(lhs: &mut [f32], rhs: &[f32], default: f32) {
    lhs.iter_mut()
        .zip(rhs)
        .for_each(|(l, r)| *l = if is_zero(*r) { default } else { *l / *r });
}

/// Regret matching: projects a regret vector onto the probability simplex,
/// writing `max(0, r) / sum(max(0, r))` into `dst`, or the uniform
/// distribution if that sum is (numerically) zero.
#[inline]
pub(crate) fn regret_matching(dst: &mut [f32], regrets: &[f32]) {
    let n = regrets.len();
    for (d, &r) in dst.iter_mut().zip(regrets) {
        *d = max(r, 0.0);
    }
    let sum: f32 = dst.iter().sum();
    if is_zero(sum) {
        let uniform = 1.0 / n as f32;
        dst.iter_mut().for_each(|d| *d = uniform);
    } else {
        div_slice(dst, &vec![sum; n], 1.0 / n as f32);
    }
}

/// Normalizes a cumulative-strategy vector into an average strategy,
/// uniform if the sum is zero (spec §3 "Strategy").
#[inline]
pub(crate) fn normalize_strategy(dst: &mut [f32], cumulative: &[f32]) {
    let n = cumulative.len();
    dst.copy_from_slice(cumulative);
    let sum: f32 = dst.iter().sum();
    if is_zero(sum) {
        let uniform = 1.0 / n as f32;
        dst.iter_mut().for_each(|d| *d = uniform);
    } else {
        div_slice(dst, &vec![sum; n], 1.0 / n as f32);
    }
}

#[inline]
pub(crate) fn inner_product(src1: &[f32], src2: &[f32]) -> f32 {
    src1.iter().zip(src2).map(|(a, b)| a * b).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regret_matching_sums_to_one() {
        let mut dst = vec![0.0f32; 3];
        regret_matching(&mut dst, &[1.0, 2.0, -1.0]);
        let sum: f32 = dst.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(dst.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn regret_matching_uniform_when_all_nonpositive() {
        let mut dst = vec![0.0f32; 4];
        regret_matching(&mut dst, &[-1.0, -2.0, 0.0, -0.5]);
        for x in dst {
            assert!((x - 0.25).abs() < 1e-6);
        }
    }
}
