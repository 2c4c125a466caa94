//! Per-feature facial landmark regions.
//!
//! Each region is an ordered list of face-local normalized points. Points
//! use swapped axes relative to the face rectangle (see
//! `mapping::domain::landmark_mapper`).

use crate::shared::normalized_rect::NormalizedPoint;

/// The facial features a detector may report, in drawing order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LandmarkFeature {
    LeftEye,
    LeftEyebrow,
    RightEye,
    RightEyebrow,
    Nose,
    OuterLips,
    InnerLips,
    LeftPupil,
    RightPupil,
}

impl LandmarkFeature {
    pub const ALL: [LandmarkFeature; 9] = [
        LandmarkFeature::LeftEye,
        LandmarkFeature::LeftEyebrow,
        LandmarkFeature::RightEye,
        LandmarkFeature::RightEyebrow,
        LandmarkFeature::Nose,
        LandmarkFeature::OuterLips,
        LandmarkFeature::InnerLips,
        LandmarkFeature::LeftPupil,
        LandmarkFeature::RightPupil,
    ];
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LandmarkRegion {
    points: Vec<NormalizedPoint>,
}

impl LandmarkRegion {
    pub fn new(points: Vec<NormalizedPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[NormalizedPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The optional landmark regions of one face.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FaceLandmarks {
    pub left_eye: Option<LandmarkRegion>,
    pub left_eyebrow: Option<LandmarkRegion>,
    pub right_eye: Option<LandmarkRegion>,
    pub right_eyebrow: Option<LandmarkRegion>,
    pub nose: Option<LandmarkRegion>,
    pub outer_lips: Option<LandmarkRegion>,
    pub inner_lips: Option<LandmarkRegion>,
    pub left_pupil: Option<LandmarkRegion>,
    pub right_pupil: Option<LandmarkRegion>,
}

impl FaceLandmarks {
    pub fn region(&self, feature: LandmarkFeature) -> Option<&LandmarkRegion> {
        match feature {
            LandmarkFeature::LeftEye => self.left_eye.as_ref(),
            LandmarkFeature::LeftEyebrow => self.left_eyebrow.as_ref(),
            LandmarkFeature::RightEye => self.right_eye.as_ref(),
            LandmarkFeature::RightEyebrow => self.right_eyebrow.as_ref(),
            LandmarkFeature::Nose => self.nose.as_ref(),
            LandmarkFeature::OuterLips => self.outer_lips.as_ref(),
            LandmarkFeature::InnerLips => self.inner_lips.as_ref(),
            LandmarkFeature::LeftPupil => self.left_pupil.as_ref(),
            LandmarkFeature::RightPupil => self.right_pupil.as_ref(),
        }
    }

    pub fn set_region(&mut self, feature: LandmarkFeature, region: LandmarkRegion) {
        let slot = match feature {
            LandmarkFeature::LeftEye => &mut self.left_eye,
            LandmarkFeature::LeftEyebrow => &mut self.left_eyebrow,
            LandmarkFeature::RightEye => &mut self.right_eye,
            LandmarkFeature::RightEyebrow => &mut self.right_eyebrow,
            LandmarkFeature::Nose => &mut self.nose,
            LandmarkFeature::OuterLips => &mut self.outer_lips,
            LandmarkFeature::InnerLips => &mut self.inner_lips,
            LandmarkFeature::LeftPupil => &mut self.left_pupil,
            LandmarkFeature::RightPupil => &mut self.right_pupil,
        };
        *slot = Some(region);
    }

    /// Present regions in drawing order. Absent features are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (LandmarkFeature, &LandmarkRegion)> + '_ {
        LandmarkFeature::ALL
            .iter()
            .filter_map(move |&f| self.region(f).map(|r| (f, r)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(n: usize) -> LandmarkRegion {
        LandmarkRegion::new(
            (0..n)
                .map(|i| NormalizedPoint::new(i as f64 * 0.1, 0.5))
                .collect(),
        )
    }

    #[test]
    fn test_default_has_no_regions() {
        let lm = FaceLandmarks::default();
        assert!(lm.is_empty());
        assert_eq!(lm.iter().count(), 0);
    }

    #[test]
    fn test_iter_skips_absent_and_keeps_order() {
        let mut lm = FaceLandmarks::default();
        lm.set_region(LandmarkFeature::RightPupil, region(1));
        lm.set_region(LandmarkFeature::Nose, region(3));
        lm.set_region(LandmarkFeature::LeftEye, region(6));

        let features: Vec<LandmarkFeature> = lm.iter().map(|(f, _)| f).collect();
        assert_eq!(
            features,
            vec![
                LandmarkFeature::LeftEye,
                LandmarkFeature::Nose,
                LandmarkFeature::RightPupil
            ]
        );
    }

    #[test]
    fn test_set_region_replaces() {
        let mut lm = FaceLandmarks::default();
        lm.set_region(LandmarkFeature::OuterLips, region(2));
        lm.set_region(LandmarkFeature::OuterLips, region(4));
        assert_eq!(
            lm.region(LandmarkFeature::OuterLips).map(|r| r.points().len()),
            Some(4)
        );
    }

    #[test]
    fn test_every_feature_round_trips_through_its_slot() {
        for &f in &LandmarkFeature::ALL {
            let mut lm = FaceLandmarks::default();
            lm.set_region(f, region(2));
            assert!(lm.region(f).is_some(), "{f:?}");
            assert_eq!(lm.iter().count(), 1);
        }
    }

    #[test]
    fn test_empty_region_is_still_present() {
        let mut lm = FaceLandmarks::default();
        lm.set_region(LandmarkFeature::InnerLips, LandmarkRegion::default());
        assert!(!lm.is_empty());
        assert!(lm.inner_lips.as_ref().is_some_and(|r| r.is_empty()));
    }
}
