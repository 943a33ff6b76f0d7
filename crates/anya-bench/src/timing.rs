use std::time::{Duration, Instant};

/// Smallest batch a micro-benchmark measurement is averaged over.
pub const MIN_BATCH: Duration = Duration::from_millis(1);

/// Upper bound on repetitions per measurement.
pub const MAX_REPS: u32 = 1 << 16;

/// Timings for one query.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Timing {
    /// Wall time of the first, cold run in microseconds.
    pub wall_us: f64,
    /// Mean time per run over the final batch in microseconds.
    pub avg_us: f64,
    /// Size of the final batch.
    pub reps: u32,
}

/// Time `run`: once cold, then in batches doubling in size until a batch
/// takes at least [`MIN_BATCH`] or reaches [`MAX_REPS`] repetitions.
pub fn measure(mut run: impl FnMut()) -> Timing {
    let t0 = Instant::now();
    run();
    let wall_us = micros(t0.elapsed());

    let mut reps = 1u32;
    loop {
        let t0 = Instant::now();
        for _ in 0..reps {
            run();
        }
        let elapsed = t0.elapsed();
        if elapsed >= MIN_BATCH || reps >= MAX_REPS {
            return Timing {
                wall_us,
                avg_us: micros(elapsed) / f64::from(reps),
                reps,
            };
        }
        reps *= 2;
    }
}

#[inline]
fn micros(d: Duration) -> f64 {
    d.as_secs_f64() * 1e6
}
