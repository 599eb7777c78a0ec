//! Animation baking
//!
//! Samples every bone once per integer frame over the keyed range and stores
//! its transform relative to its parent at that same frame. Tracks end with a
//! terminal key holding only the clip length.

use glam::DMat4;
use jsmodel_shared::{
    ANIMATION_NAME, DECIMALS_POS, DECIMALS_ROT, DECIMALS_TIME, FrameRate, NO_BONE, round_array,
    round_to,
};
use tracing::{debug, info};

use crate::document::{Animation, AnimationKey, AnimationTrack};
use crate::error::{ExportError, Result, SourceError, SourceResult};
use crate::scene::SceneSource;
use crate::skeleton::relative_to;

/// Scale marker carried by the first key of every track
const UNIT_SCALE: [u32; 3] = [1, 1, 1];

/// Key frames must lie within `[-MAX_KEY_FRAME, MAX_KEY_FRAME]`
pub const MAX_KEY_FRAME: f64 = 1.0e9;

/// Longest clip that will be sampled, in frames
pub const MAX_FRAME_SPAN: i64 = 1_000_000;

/// Whole-frame range `[start, end]` covering the given key times
///
/// `None` when there are no keys. Non-finite or out-of-range frames and
/// spans longer than [`MAX_FRAME_SPAN`] are invalid.
pub fn frame_range(times: &[f64]) -> SourceResult<Option<(i64, i64)>> {
    if let Some(bad) = times
        .iter()
        .find(|t| !t.is_finite() || t.abs() > MAX_KEY_FRAME)
    {
        return Err(SourceError::invalid(
            "keyframes",
            format!("key frame {} is outside +/-{}", bad, MAX_KEY_FRAME),
        ));
    }

    let (Some(first), Some(last)) = (
        times.iter().copied().reduce(f64::min),
        times.iter().copied().reduce(f64::max),
    ) else {
        return Ok(None);
    };
    let (start, end) = (first.floor() as i64, last.ceil() as i64);
    check_span(start, end)?;
    Ok(Some((start, end)))
}

/// Frame count of `[start, end)`
fn check_span(start: i64, end: i64) -> SourceResult<i64> {
    match end.checked_sub(start) {
        Some(span) if span <= MAX_FRAME_SPAN => Ok(span.max(0)),
        _ => Err(SourceError::invalid(
            "keyframes",
            format!(
                "frames {}..{} span more than {} frames",
                start, end, MAX_FRAME_SPAN
            ),
        )),
    }
}

/// A bone to sample: its scene joint and its parent's index in the bone list
#[derive(Debug, Clone, Copy)]
pub struct BakeTarget<'a> {
    pub joint: &'a str,
    pub parent: i32,
}

/// Bake sampled tracks for `targets` over frames `[start, end)`
///
/// `targets[i].parent` indexes into `targets`.
pub fn bake<S: SceneSource + ?Sized>(
    source: &S,
    targets: &[BakeTarget<'_>],
    start: i64,
    end: i64,
    rate: FrameRate,
) -> SourceResult<Animation> {
    let frames = check_span(start, end)?;
    let length = round_to(rate.seconds(frames as f64), DECIMALS_TIME);

    let hierarchy = targets
        .iter()
        .map(|target| -> SourceResult<AnimationTrack> {
            let parent_joint = usize::try_from(target.parent)
                .ok()
                .and_then(|p| targets.get(p))
                .map(|p| p.joint);

            let mut keys = Vec::new();
            for frame in 0..frames {
                let at = (start + frame) as f64;
                let world = source.joint_world_matrix(target.joint, Some(at))?;
                let local = match parent_joint {
                    Some(parent) => relative_to(source.joint_world_matrix(parent, Some(at))?, world),
                    None => world,
                };
                keys.push(sample_key(local, rate.seconds(frame as f64), frame == 0));
            }
            keys.push(AnimationKey {
                time: length,
                ..Default::default()
            });

            Ok(AnimationTrack {
                parent: target.parent,
                keys,
            })
        })
        .collect::<SourceResult<Vec<_>>>()?;

    Ok(Animation {
        name: ANIMATION_NAME.to_string(),
        fps: rate.fps(),
        length,
        hierarchy,
    })
}

fn sample_key(local: DMat4, seconds: f64, first: bool) -> AnimationKey {
    let (_, rotation, translation) = local.to_scale_rotation_translation();
    AnimationKey {
        time: round_to(seconds, DECIMALS_TIME),
        pos: Some(round_array(translation.to_array(), DECIMALS_POS)),
        rot: Some(round_array(rotation.to_array(), DECIMALS_ROT)),
        scl: first.then_some(UNIT_SCALE),
    }
}

/// Bake the animation of a bone list, if any of its joints is keyed
///
/// `joints[i]` is the scene joint behind bone `i`, `parents[i]` its parent
/// bone index.
pub fn bake_animation<S: SceneSource + ?Sized>(
    source: &S,
    joints: &[String],
    parents: &[i32],
) -> Result<Option<Animation>> {
    let times = source.keyframe_times(joints).map_err(ExportError::Animation)?;
    let Some((start, end)) = frame_range(&times).map_err(ExportError::Animation)? else {
        debug!("No keyframes on {} bones, skipping animation", joints.len());
        return Ok(None);
    };

    let rate = source.frame_rate().map_err(ExportError::Animation)?;
    let targets: Vec<BakeTarget<'_>> = joints
        .iter()
        .zip(parents)
        .map(|(joint, &parent)| BakeTarget {
            joint,
            parent: if parent < 0 { NO_BONE } else { parent },
        })
        .collect();

    let animation = bake(source, &targets, start, end, rate).map_err(ExportError::Animation)?;
    info!(
        "Baked animation: {} bones, frames {}..{} at {}, {}s",
        targets.len(),
        start,
        end,
        rate,
        animation.length
    );
    Ok(Some(animation))
}
