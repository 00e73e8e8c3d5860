use crate::error::{Result, StatError};
use crate::testing::{Alternative, Direction, TestResult};
use single_utilities::traits::FloatOps;
use statrs::distribution::{ContinuousCDF, Normal};
use std::cmp::Ordering;

/// Mann-Whitney U test with the normal approximation and a 0.5 continuity correction.
///
/// The statistic is `U` of the second sample; direction follows its mean rank.
/// `Greater` tests whether the second sample tends to be larger than the first.
pub fn mann_whitney<T>(x: &[T], y: &[T], alternative: Alternative) -> Result<TestResult<f64>>
where
    T: FloatOps,
{
    let nx = x.len();
    let ny = y.len();

    if nx == 0 || ny == 0 {
        return Err(StatError::InsufficientData {
            found: 0,
            required: 1,
        });
    }

    // Combine samples and assign group labels (0 for x, 1 for y)
    let mut combined: Vec<(f64, usize)> = Vec::with_capacity(nx + ny);
    combined.extend(x.iter().map(|&v| (v.to_f64().unwrap_or(f64::NAN), 0)));
    combined.extend(y.iter().map(|&v| (v.to_f64().unwrap_or(f64::NAN), 1)));

    combined.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    // Assign ranks (with ties averaged)
    let mut ranks = vec![0.0; nx + ny];
    let mut i = 0;
    while i < combined.len() {
        let val = combined[i].0;
        let mut j = i + 1;

        while j < combined.len() && combined[j].0 == val {
            j += 1;
        }

        let rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for r in ranks.iter_mut().take(j).skip(i) {
            *r = rank;
        }

        i = j;
    }

    let rank_sum_y: f64 = combined
        .iter()
        .zip(ranks.iter())
        .filter(|((_, group), _)| *group == 1)
        .map(|(_, &r)| r)
        .sum();

    let (nx_f, ny_f) = (nx as f64, ny as f64);
    let u_y = rank_sum_y - ny_f * (ny_f + 1.0) / 2.0;
    let u_x = nx_f * ny_f - u_y;

    let mean_u = nx_f * ny_f / 2.0;
    let sd_u = (nx_f * ny_f * (nx_f + ny_f + 1.0) / 12.0).sqrt();
    let correction = 0.5;

    let z = match alternative {
        Alternative::TwoSided => ((u_y - mean_u).abs() - correction).max(0.0) / sd_u,
        Alternative::Greater => (u_y - mean_u - correction) / sd_u,
        Alternative::Less => (u_y - mean_u + correction) / sd_u,
    };

    let normal = Normal::new(0.0, 1.0).map_err(|e| StatError::InvalidParameter(e.to_string()))?;
    let p_value = match alternative {
        Alternative::TwoSided => (2.0 * normal.sf(z)).min(1.0),
        Alternative::Greater => normal.sf(z),
        Alternative::Less => normal.cdf(z),
    };

    let direction = Direction::from_difference(u_x, u_y);

    Ok(TestResult::new(u_y, p_value)
        .with_direction(direction)
        .with_effect_size(z / (nx_f + ny_f).sqrt())
        .with_standard_error(sd_u)
        .with_metadata("z_score", z)
        .with_metadata("mean_u", mean_u)
        .with_metadata("nx", nx_f)
        .with_metadata("ny", ny_f))
}
