use std::collections::BTreeMap;

use crate::feed::ShapePoint;
use crate::ids::ShapeId;

/// Shape id to its points, ordered by `shape_pt_sequence`.
pub type ShapeGroups = BTreeMap<ShapeId, Vec<ShapePoint>>;

pub fn group_shapes(points: &[ShapePoint]) -> ShapeGroups {
    let mut groups: ShapeGroups = BTreeMap::new();
    for point in points {
        groups
            .entry(point.shape_id)
            .or_insert_with(Vec::new)
            .push(point.clone());
    }
    // Sort by sequence, in case the file isn't in order. The sort is stable, so
    // duplicate sequence numbers keep their file order.
    for points in groups.values_mut() {
        points.sort_by_key(|point| point.sequence);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(shape: &str, sequence: u32, latitude: f64) -> ShapePoint {
        ShapePoint {
            shape_id: ShapeId::new(shape),
            latitude,
            longitude: 73.8,
            sequence,
        }
    }

    #[test]
    fn groups_and_sorts_by_sequence() {
        let points = vec![point("S1", 3, 15.3), point("S1", 1, 15.1), point("S1", 2, 15.2)];
        let groups = group_shapes(&points);
        let s1 = &groups[&ShapeId::new("S1")];
        let sequences: Vec<u32> = s1.iter().map(|p| p.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(s1[0].latitude, 15.1);
    }

    #[test]
    fn every_point_lands_in_its_group() {
        let points = vec![
            point("A", 10, 1.0),
            point("B", 2, 2.0),
            point("A", 5, 3.0),
            point("B", 1, 4.0),
            point("A", 7, 5.0),
        ];
        let groups = group_shapes(&points);
        assert_eq!(groups.len(), 2);
        for (shape_id, group) in &groups {
            let expected = points.iter().filter(|p| p.shape_id == *shape_id).count();
            assert_eq!(group.len(), expected);
            assert!(group.windows(2).all(|w| w[0].sequence <= w[1].sequence));
        }
    }

    #[test]
    fn equal_sequences_keep_input_order() {
        let points = vec![point("S", 1, 1.0), point("S", 0, 0.0), point("S", 1, 2.0)];
        let groups = group_shapes(&points);
        let latitudes: Vec<f64> = groups[&ShapeId::new("S")]
            .iter()
            .map(|p| p.latitude)
            .collect();
        assert_eq!(latitudes, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn empty_input() {
        assert!(group_shapes(&[]).is_empty());
    }
}
