//! Table-driven approximations of `acos` and `atan`.
//!
//! The projector evaluates both functions for every sub-sample, so it trades
//! a bounded interpolation error (less than one table step) for a binary
//! search and a lerp.

use std::f64::consts::{FRAC_PI_2, PI};

/// A monotonic lookup table of forward-function values sampled at
/// `resolution` equal angular steps over a span of `PI`.
#[derive(Debug, Clone)]
pub struct FastInverseTrig {
    lookup: Vec<f64>,
    step: f64,
}

impl FastInverseTrig {
    /// Builds a table of `resolution + 1` entries, `entry(i)` giving the
    /// forward-function value at step `i`.
    ///
    /// `resolution` is raised to 1 if zero. The entries must be
    /// non-decreasing.
    pub fn from_fn(resolution: usize, entry: impl Fn(usize, f64) -> f64) -> Self {
        let resolution = resolution.max(1);
        let step = PI / resolution as f64;
        let lookup = (0..=resolution).map(|i| entry(i, step)).collect();
        Self { lookup, step }
    }

    /// Angular width of one table cell, in radians.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of angular steps in the table.
    pub fn resolution(&self) -> usize {
        self.lookup.len() - 1
    }

    /// Returns the table angle in `[0, PI]` whose forward value is `v`.
    ///
    /// Exact hits return `index * step`; otherwise the position between the
    /// two bracketing entries is linearly interpolated. Values outside the
    /// table clamp to the extreme angles.
    pub fn f(&self, v: f64) -> f64 {
        let index = self.lookup.partition_point(|&entry| entry < v);
        if index < self.lookup.len() && self.lookup[index] == v {
            return index as f64 * self.step;
        }
        if index == 0 {
            return 0.0;
        }
        if index == self.lookup.len() {
            return self.resolution() as f64 * self.step;
        }
        let a = self.lookup[index - 1];
        let b = self.lookup[index];
        let n = (v - a) / (b - a);
        (index as f64 - 1.0 + n) * self.step
    }
}

/// Fast `acos` over `[-1, 1]`.
#[derive(Debug, Clone)]
pub struct FastAcos {
    table: FastInverseTrig,
}

impl FastAcos {
    pub fn new(resolution: usize) -> Self {
        let resolution = resolution.max(1);
        let table = FastInverseTrig::from_fn(resolution, |i, step| {
            if i == resolution {
                1.0
            } else {
                -(step * i as f64).cos()
            }
        });
        Self { table }
    }

    pub fn step(&self) -> f64 {
        self.table.step()
    }

    /// Approximates `acos(v)` in `[0, PI]`.
    #[inline]
    pub fn f(&self, v: f64) -> f64 {
        self.table.f(-v)
    }
}

/// Fast `atan` over the whole real line.
#[derive(Debug, Clone)]
pub struct FastAtan {
    table: FastInverseTrig,
}

impl FastAtan {
    pub fn new(resolution: usize) -> Self {
        let resolution = resolution.max(1);
        // The end entries sit half a step inside +-PI/2 to stay finite.
        let table = FastInverseTrig::from_fn(resolution, |i, step| {
            if i == 0 {
                (step / 2.0 - FRAC_PI_2).tan()
            } else if i == resolution {
                (FRAC_PI_2 - step / 2.0).tan()
            } else {
                (step * i as f64 - FRAC_PI_2).tan()
            }
        });
        Self { table }
    }

    pub fn step(&self) -> f64 {
        self.table.step()
    }

    /// Approximates `atan(v)` in `[-PI/2, PI/2]`.
    #[inline]
    pub fn f(&self, v: f64) -> f64 {
        self.table.f(v) - FRAC_PI_2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_from_fn_identity() {
        let table = FastInverseTrig::from_fn(100, |i, step| i as f64 * step);
        assert_eq!(table.resolution(), 100);
        assert!((table.f(1.0) - 1.0).abs() < 1e-12);
        assert_eq!(table.f(-1.0), 0.0);
        assert!((table.f(10.0) - PI).abs() < 1e-12);
        assert_eq!(FastInverseTrig::from_fn(0, |i, step| i as f64 * step).resolution(), 1);
    }

    #[test]
    fn test_acos_endpoints() {
        let acos = FastAcos::new(1024);
        assert!(acos.f(1.0).abs() < 1e-12, "acos(1) = {}", acos.f(1.0));
        assert!((acos.f(-1.0) - PI).abs() < 1e-12, "acos(-1) = {}", acos.f(-1.0));
        assert!((acos.f(0.0) - FRAC_PI_2).abs() < acos.step());
    }

    #[test]
    fn test_atan_zero_and_limits() {
        let atan = FastAtan::new(1024);
        assert!(atan.f(0.0).abs() < 1e-9, "atan(0) = {}", atan.f(0.0));
        assert!((atan.f(1e12) - FRAC_PI_2).abs() < atan.step());
        assert!((atan.f(-1e12) + FRAC_PI_2).abs() < atan.step());
    }

    #[test]
    fn test_acos_error_below_one_step() {
        for &res in &[16usize, 256, 4096] {
            let acos = FastAcos::new(res);
            for i in 0..=2000 {
                let v = -1.0 + 2.0 * i as f64 / 2000.0;
                let err = (acos.f(v) - v.acos()).abs();
                assert!(err < acos.step(), "res {} v {} err {}", res, v, err);
            }
        }
    }

    #[test]
    fn test_atan_error_below_one_step() {
        for &res in &[16usize, 256, 4096] {
            let atan = FastAtan::new(res);
            for i in 0..=2000 {
                let v = -50.0 + 100.0 * i as f64 / 2000.0;
                let err = (atan.f(v) - v.atan()).abs();
                assert!(err < atan.step(), "res {} v {} err {}", res, v, err);
            }
        }
    }

    #[test]
    fn test_monotonic() {
        let acos = FastAcos::new(300);
        let atan = FastAtan::new(300);
        let mut prev_acos = f64::INFINITY;
        let mut prev_atan = f64::NEG_INFINITY;
        for i in 0..=1000 {
            let v = -1.0 + 2.0 * i as f64 / 1000.0;
            let a = acos.f(v);
            assert!(a <= prev_acos, "acos not decreasing at {}", v);
            prev_acos = a;

            let t = atan.f(v * 20.0);
            assert!(t >= prev_atan, "atan not increasing at {}", v);
            prev_atan = t;
        }
    }

    #[test]
    fn test_zero_resolution_is_usable() {
        let acos = FastAcos::new(0);
        assert!((acos.f(-1.0) - PI).abs() < 1e-12);
    }
}
