//! Overlay merge precedence
//!
//! Layers are merged in precedence order; where a later layer covers a parcel
//! its attributes replace the earlier ones, elsewhere the earlier values stay.
//! Merging is a left fold of [`merge_pair`], so any grouping of a layer list
//! gives the same result.

use crate::families::CoverLayer;

/// Overlay `later` onto `earlier`.
pub fn merge_pair(mut earlier: CoverLayer, later: &CoverLayer) -> CoverLayer {
    for (parcel, attributes) in &later.cells {
        earlier.cells.insert(parcel.clone(), attributes.clone());
    }
    earlier
}

/// Merge layers given lowest precedence first.
pub fn merge_layers<'a>(layers: impl IntoIterator<Item = &'a CoverLayer>) -> CoverLayer {
    layers
        .into_iter()
        .fold(CoverLayer::new("merged"), |acc, layer| merge_pair(acc, layer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::{CoverCondition, LayerKind};

    fn layer(kind: LayerKind, cells: &[(&str, &str)]) -> CoverLayer {
        let mut layer = CoverLayer::new(kind.name());
        for (parcel, surface) in cells {
            layer.assign(kind, &[parcel.to_string()], &CoverCondition::new(*surface, "cover"));
        }
        layer
    }

    #[test]
    fn test_later_layer_overwrites() {
        let brmp = layer(LayerKind::Brmp, &[("p1", "Mature"), ("p2", "Mature")]);
        let sites = layer(LayerKind::WasteSites, &[("p2", "Bare")]);

        let merged = merge_layers([&brmp, &sites]);
        assert_eq!(merged.get("p1").unwrap().source, "BRMP_2011");
        assert_eq!(merged.get("p2").unwrap().source, "ehsit");
        assert_eq!(merged.get("p2").unwrap().condition.surface_condition, "Bare");
    }

    #[test]
    fn test_merge_is_associative() {
        let a = layer(LayerKind::Brmp, &[("p1", "Mature"), ("p2", "Mature"), ("p3", "Mature")]);
        let b = layer(LayerKind::CleanupPackages, &[("p2", "Developing"), ("p3", "Developing")]);
        let c = layer(LayerKind::WasteSites, &[("p3", "Bare"), ("p4", "Bare")]);

        let all_at_once = merge_layers([&a, &b, &c]);
        let left_first = merge_pair(merge_pair(a.clone(), &b), &c);
        let right_first = merge_pair(a.clone(), &merge_pair(b.clone(), &c));

        assert_eq!(all_at_once.cells, left_first.cells);
        assert_eq!(all_at_once.cells, right_first.cells);
        assert_eq!(all_at_once.len(), 4);
    }

    #[test]
    fn test_empty_later_layer_keeps_earlier() {
        let a = layer(LayerKind::Brmp, &[("p1", "Mature")]);
        let merged = merge_layers([&a, &CoverLayer::new("empty")]);
        assert_eq!(merged.cells, a.cells);
    }
}
