use std::f64::consts::PI;

/// A source of uniform draws strictly inside (0, 1).
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;

    /// Box–Muller: two fresh uniforms per normal draw.
    fn standard_normal(&mut self) -> f64 {
        let u1 = self.next_uniform().max(1e-12);
        let u2 = self.next_uniform();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }
}

/// xorshift64* stream; deterministic for a given seed.
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        let state = splitmix64(seed);
        Self {
            state: if state == 0 {
                0xA5A5_A5A5_A5A5_A5A5
            } else {
                state
            },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

impl UniformSource for SeededRng {
    fn next_uniform(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }
}

/// Annual return as a fraction: `(expected + z * variance / 2) / 100`.
pub fn sample_annual_return<R: UniformSource + ?Sized>(
    source: &mut R,
    expected_percent: f64,
    variance_percent: f64,
) -> f64 {
    let z = source.standard_normal();
    (expected_percent + z * (variance_percent / 2.0)) / 100.0
}

pub fn derive_seed(base_seed: u64, run_id: u32) -> u64 {
    splitmix64(base_seed ^ ((run_id as u64) << 32) ^ run_id as u64)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
