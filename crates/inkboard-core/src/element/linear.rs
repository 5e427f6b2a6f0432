//! Line and arrow payloads.

use super::ElementId;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Attachment of an arrow endpoint to a bindable element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowBinding {
    /// The element the endpoint is attached to.
    pub element_id: ElementId,
    /// Normalized position in the target's local frame; both axes in `[0, 1]`.
    pub fixed_point: Point,
}

impl ArrowBinding {
    pub fn new(element_id: ElementId, fixed_point: Point) -> Self {
        Self {
            element_id,
            fixed_point,
        }
    }
}

/// Arrowhead decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Arrowhead {
    #[default]
    Arrow,
    Triangle,
    Bar,
    Dot,
}

/// Which end of a linear element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

/// Points and bindings of a line or arrow.
///
/// Points are relative to the element origin. After every edit they are
/// re-origined so the minimum x and y are zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LinearData {
    pub points: Vec<Point>,
    #[serde(default)]
    pub start_binding: Option<ArrowBinding>,
    #[serde(default)]
    pub end_binding: Option<ArrowBinding>,
    /// Constrained to an orthogonal path.
    #[serde(default)]
    pub elbowed: bool,
    #[serde(default)]
    pub start_arrowhead: Option<Arrowhead>,
    #[serde(default)]
    pub end_arrowhead: Option<Arrowhead>,
}

impl LinearData {
    /// Binding at one end.
    pub fn binding(&self, end: Endpoint) -> Option<&ArrowBinding> {
        match end {
            Endpoint::Start => self.start_binding.as_ref(),
            Endpoint::End => self.end_binding.as_ref(),
        }
    }

    /// Replace the binding at one end.
    pub fn set_binding(&mut self, end: Endpoint, binding: Option<ArrowBinding>) {
        match end {
            Endpoint::Start => self.start_binding = binding,
            Endpoint::End => self.end_binding = binding,
        }
    }

    /// Whether either end is attached to `target`.
    pub fn is_bound_to(&self, target: ElementId) -> bool {
        self.start_binding.is_some_and(|b| b.element_id == target)
            || self.end_binding.is_some_and(|b| b.element_id == target)
    }

    /// Endpoint addressed by a vertex index, if the index is first or last.
    pub fn endpoint_at(&self, index: usize) -> Option<Endpoint> {
        if index == 0 {
            Some(Endpoint::Start)
        } else if index + 1 == self.points.len() {
            Some(Endpoint::End)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_binding_accessors() {
        let target = Uuid::new_v4();
        let mut data = LinearData {
            points: vec![Point::ZERO, Point::new(10.0, 0.0)],
            ..Default::default()
        };
        assert!(!data.is_bound_to(target));
        data.set_binding(Endpoint::End, Some(ArrowBinding::new(target, Point::new(0.0, 0.5))));
        assert!(data.is_bound_to(target));
        assert!(data.binding(Endpoint::Start).is_none());
        assert_eq!(data.binding(Endpoint::End).map(|b| b.element_id), Some(target));
    }

    #[test]
    fn test_endpoint_at() {
        let data = LinearData {
            points: vec![Point::ZERO, Point::new(5.0, 5.0), Point::new(10.0, 0.0)],
            ..Default::default()
        };
        assert_eq!(data.endpoint_at(0), Some(Endpoint::Start));
        assert_eq!(data.endpoint_at(1), None);
        assert_eq!(data.endpoint_at(2), Some(Endpoint::End));
    }
}
