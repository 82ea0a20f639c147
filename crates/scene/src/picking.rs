use std::cmp::Reverse;

use foundation::math::Vec2;
use foundation::math::precision::StableF64;

/// A marker's screen position, `None` when it is on the occluded side.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenMarker {
    pub index: usize,
    pub position: Option<Vec2>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub index: usize,
    pub distance: f64,
}

/// Deterministic screen-space picking.
///
/// Ordering contract:
/// - Occluded markers are never hit.
/// - The closest marker within `radius` wins.
/// - Ties go to the higher index, which is drawn last and therefore on top.
pub fn pick_screen(
    markers: impl IntoIterator<Item = ScreenMarker>,
    point: Vec2,
    radius: f64,
) -> Option<PickHit> {
    markers
        .into_iter()
        .filter_map(|m| {
            let distance = m.position?.distance(point);
            (distance <= radius).then_some(PickHit {
                index: m.index,
                distance,
            })
        })
        .min_by_key(|hit| (StableF64(hit.distance), Reverse(hit.index)))
}
