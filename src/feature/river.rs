use serde::{Deserialize, Serialize};

use crate::{
    error::GenerationError,
    feature::FeatureId,
    grid::Direction,
    spatial::{FeatureArea, Position},
};

/// The local character of one stretch of river.
#[derive(PartialEq, Eq, Clone, Copy, Serialize, Deserialize, Debug)]
pub enum RiverSegmentType {
    Source,
    Straight,
    Curve,
    Meander,
    Rapids,
    Confluence,
    Delta,
    Mouth,
}

/// One sampled point along a river path.
#[derive(PartialEq, Clone, Copy, Serialize, Deserialize, Debug)]
pub struct RiverPoint {
    pub position: Position,
    /// Channel width in meters, growing with flow accumulation.
    pub width: f64,
    /// Channel depth in meters.
    pub depth: f64,
    pub flow_direction: Direction,
    pub segment_type: RiverSegmentType,
}

/// A river: an ordered downhill path of [`RiverPoint`]s plus the tributary
/// rivers attached to it.
///
/// Tributaries are stored as registry ids, never as owned sub-objects, so
/// river networks cannot form ownership cycles. Invariant: every path point
/// lies within the river's declared area, and a confluence point exists
/// wherever a tributary is attached.
#[derive(PartialEq, Clone, Serialize, Deserialize, Debug)]
pub struct River {
    pub name: String,
    area: FeatureArea,
    path: Vec<RiverPoint>,
    tributaries: Vec<FeatureId>,
}

impl River {
    /// Creates a river from a traced path.
    ///
    /// The declared area is the bounding box of the path, so the containment
    /// invariant holds by construction.
    ///
    /// # Panics
    ///
    /// Panics if the path is empty; the tracer always records at least the
    /// source point.
    pub fn from_path(name: String, path: Vec<RiverPoint>) -> Self {
        assert!(!path.is_empty(), "a river path has at least a source point");
        let area = path
            .iter()
            .map(|point| FeatureArea::new(point.position, crate::spatial::Dimensions::unit()))
            .reduce(|a, b| a.union(&b))
            .unwrap();
        Self {
            name,
            area,
            path,
            tributaries: Vec::new(),
        }
    }

    #[inline]
    pub fn area(&self) -> &FeatureArea {
        &self.area
    }

    pub fn path(&self) -> &[RiverPoint] {
        &self.path
    }

    pub fn tributaries(&self) -> &[FeatureId] {
        &self.tributaries
    }

    pub fn source(&self) -> &RiverPoint {
        &self.path[0]
    }

    pub fn terminus(&self) -> &RiverPoint {
        self.path.last().unwrap()
    }

    /// Attaches a tributary river.
    ///
    /// The tributary's area must intersect this river's area; a confluence
    /// without spatial contact is a domain-rule violation. On success the
    /// path point nearest to the junction becomes a
    /// [`RiverSegmentType::Confluence`] point.
    pub fn attach_tributary(
        &mut self,
        tributary: FeatureId,
        tributary_area: &FeatureArea,
        junction: Position,
    ) -> Result<(), GenerationError> {
        if !self.area.intersects(tributary_area) {
            return Err(GenerationError::domain_rule(
                "CONFLUENCE_OUTSIDE_AREA",
                "hydrology",
                format!(
                    "tributary joining {} at ({}, {}) does not touch the river area",
                    self.name,
                    junction.x(),
                    junction.y()
                ),
            ));
        }

        let nearest = self
            .path
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_to(&junction)
                    .total_cmp(&b.position.distance_to(&junction))
            })
            .map(|(index, _)| index)
            .unwrap();
        self.path[nearest].segment_type = RiverSegmentType::Confluence;
        self.tributaries.push(tributary);
        Ok(())
    }

    /// Checks the containment invariant over the whole path.
    pub fn contains_all_points(&self) -> bool {
        self.path
            .iter()
            .all(|point| self.area.contains(&point.position))
    }
}

#[cfg(test)]
mod tests {
    use super::{River, RiverPoint, RiverSegmentType};
    use crate::{
        feature::FeatureId,
        grid::Direction,
        spatial::Position,
    };

    fn point(x: f64, y: f64) -> RiverPoint {
        RiverPoint {
            position: Position::new(x, y).unwrap(),
            width: 2.0,
            depth: 0.5,
            flow_direction: Direction::East,
            segment_type: RiverSegmentType::Straight,
        }
    }

    #[test]
    fn path_points_stay_inside_the_declared_area() {
        let river = River::from_path(
            "test river".to_owned(),
            vec![point(1.0, 1.0), point(2.0, 1.0), point(3.0, 2.0)],
        );
        assert!(river.contains_all_points());
    }

    #[test]
    fn tributary_attachment_requires_contact() {
        let mut river = River::from_path(
            "main".to_owned(),
            vec![point(0.0, 0.0), point(4.0, 0.0)],
        );

        let touching = River::from_path(
            "brook".to_owned(),
            vec![point(2.0, 3.0), point(2.0, 0.5)],
        );
        river
            .attach_tributary(
                FeatureId::new(1),
                touching.area(),
                Position::new(2.0, 0.5).unwrap(),
            )
            .unwrap();
        assert_eq!(river.tributaries().len(), 1);
        assert!(
            river
                .path()
                .iter()
                .any(|p| p.segment_type == RiverSegmentType::Confluence)
        );

        let distant = River::from_path(
            "far brook".to_owned(),
            vec![point(40.0, 40.0), point(41.0, 40.0)],
        );
        let error = river
            .attach_tributary(
                FeatureId::new(2),
                distant.area(),
                Position::new(40.0, 40.0).unwrap(),
            )
            .unwrap_err();
        assert_eq!(error.code(), "CONFLUENCE_OUTSIDE_AREA");
    }
}
