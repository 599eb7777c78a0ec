//! Keyframe sampling for scene descriptions

use glam::{DQuat, DVec3};

/// Locate the key pair around `t`
///
/// Returns the lower index and the blend factor towards the next key. Times
/// outside the keyed range clamp to the first or last key.
fn bracket(times: &[f64], t: f64) -> (usize, f64) {
    let mut i = 0;
    while i < times.len() - 1 && times[i + 1] < t {
        i += 1;
    }

    if i >= times.len() - 1 {
        return (times.len() - 1, 0.0);
    }

    let t0 = times[i];
    let t1 = times[i + 1];
    let factor = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
    (i, factor.clamp(0.0, 1.0))
}

pub(super) fn interpolate_vec3(times: &[f64], values: &[DVec3], t: f64, rest: DVec3) -> DVec3 {
    if times.is_empty() || values.len() != times.len() {
        return rest;
    }

    let (i, factor) = bracket(times, t);
    match values.get(i + 1) {
        Some(next) => values[i].lerp(*next, factor),
        None => values[i],
    }
}

pub(super) fn interpolate_quat(times: &[f64], values: &[DQuat], t: f64, rest: DQuat) -> DQuat {
    if times.is_empty() || values.len() != times.len() {
        return rest;
    }

    let (i, factor) = bracket(times, t);
    match values.get(i + 1) {
        // slerp takes the shortest arc
        Some(next) => values[i].slerp(*next, factor).normalize(),
        None => values[i],
    }
}
