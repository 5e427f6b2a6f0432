//! Arrow endpoint binding.
//!
//! A binding stores a normalized point in the target's unrotated frame. The
//! world position is re-resolved whenever the arrow is refreshed, so a bound
//! endpoint follows its target as the target moves or rotates. Fixed points
//! are never recomputed when the target changes.

use crate::elbow::{heading_from_fixed_point, route};
use crate::element::{ArrowBinding, Element, ElementId, ElementType, Endpoint};
use crate::geometry::{to_local, to_world};
use crate::scene::Scene;
use kurbo::Point;

/// Whether arrows can attach to `element`.
pub fn is_bindable(element: &Element) -> bool {
    element.is_active() && element.element_type().is_bindable()
}

/// Distance from `point` to the element's box, measured in its local frame.
/// Zero inside.
fn distance_to_box(element: &Element, point: Point) -> f64 {
    let local = to_local(point, element.center(), element.angle);
    let bounds = element.bounds();
    let dx = (bounds.x0 - local.x).max(0.0).max(local.x - bounds.x1);
    let dy = (bounds.y0 - local.y).max(0.0).max(local.y - bounds.y1);
    dx.hypot(dy)
}

/// Nearest bindable element that contains `point` or lies within
/// `snap_radius` of it. Ties go to the topmost element.
pub fn find_bind_target<'a>(
    scene: &'a Scene,
    point: Point,
    snap_radius: f64,
    exclude: &[ElementId],
) -> Option<&'a Element> {
    let mut best: Option<(&Element, f64)> = None;
    for element in scene.active_elements().into_iter().rev() {
        if !is_bindable(element) || exclude.contains(&element.id()) {
            continue;
        }
        let distance = distance_to_box(element, point);
        if distance > snap_radius {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((element, distance));
        }
    }
    best.map(|(element, _)| element)
}

/// Normalized position of `point` relative to `target`.
///
/// Inside points keep their exact interior coordinate. Outside points are
/// projected onto the nearest edge, pinning the overshooting axis to 0 or 1.
pub fn compute_fixed_point(target: &Element, point: Point) -> Point {
    let local = to_local(point, target.center(), target.angle);
    let bounds = target.bounds();
    let nx = if bounds.width() > 0.0 {
        (local.x - bounds.x0) / bounds.width()
    } else {
        0.5
    };
    let ny = if bounds.height() > 0.0 {
        (local.y - bounds.y0) / bounds.height()
    } else {
        0.5
    };
    Point::new(nx.clamp(0.0, 1.0), ny.clamp(0.0, 1.0))
}

/// World position of a binding on the target's current geometry.
pub fn resolve_binding_point(target: &Element, binding: &ArrowBinding) -> Point {
    let bounds = target.bounds();
    let local = Point::new(
        bounds.x0 + binding.fixed_point.x * bounds.width(),
        bounds.y0 + binding.fixed_point.y * bounds.height(),
    );
    to_world(local, target.center(), target.angle)
}

/// Recompute the bound endpoints of `arrow` from the targets in `scene`.
///
/// Elbowed arrows are re-routed from scratch; other arrows keep their
/// interior points. The result is re-origined.
pub fn update_bound_arrow_endpoints(arrow: &Element, scene: &Scene) -> Element {
    let Some(data) = arrow.linear() else {
        return arrow.clone();
    };
    let mut points = arrow.absolute_points();
    if points.len() < 2 {
        return arrow.clone();
    }

    let bound = |binding: Option<&ArrowBinding>| {
        binding.and_then(|b| scene.get_active(b.element_id).map(|target| (target, *b)))
    };
    let start = bound(data.start_binding.as_ref());
    let end = bound(data.end_binding.as_ref());
    if start.is_none() && end.is_none() {
        return arrow.clone();
    }

    let last = points.len() - 1;
    if let Some((target, binding)) = &start {
        points[0] = resolve_binding_point(target, binding);
    }
    if let Some((target, binding)) = &end {
        points[last] = resolve_binding_point(target, binding);
    }

    if data.elbowed {
        let start_heading = start.and_then(|(_, b)| heading_from_fixed_point(b.fixed_point));
        let end_heading = end.and_then(|(_, b)| heading_from_fixed_point(b.fixed_point));
        points = route(points[0], points[last], start_heading, end_heading);
    }

    let mut updated = arrow.clone();
    updated.set_absolute_points(points);
    updated
}

/// Mark an arrow elbowed and route it between its current endpoints, with
/// headings taken from its bindings.
pub fn route_elbowed(arrow: &mut Element) {
    let points = arrow.absolute_points();
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return;
    };
    let Some(data) = arrow.linear_mut() else {
        return;
    };
    data.elbowed = true;
    let heading = |end| data.binding(end).and_then(|b| heading_from_fixed_point(b.fixed_point));
    let routed = route(first, last, heading(Endpoint::Start), heading(Endpoint::End));
    arrow.set_absolute_points(routed);
}

/// Attach one end of `arrow` to `target` at world `point`.
///
/// The endpoint snaps to the resolved point and `target` gains a
/// back-reference to the arrow.
pub fn bind_arrow_endpoint(arrow: &mut Element, end: Endpoint, target: &mut Element, point: Point) {
    let arrow_id = arrow.id();
    let binding = ArrowBinding::new(target.id(), compute_fixed_point(target, point));
    let resolved = resolve_binding_point(target, &binding);

    let mut points = arrow.absolute_points();
    let Some(data) = arrow.linear_mut() else {
        return;
    };
    data.set_binding(end, Some(binding));
    match end {
        Endpoint::Start => {
            if let Some(first) = points.first_mut() {
                *first = resolved;
            }
        }
        Endpoint::End => {
            if let Some(last) = points.last_mut() {
                *last = resolved;
            }
        }
    }
    arrow.set_absolute_points(points);
    target.add_bound_element(arrow_id, ElementType::Arrow);
}

/// Clear the binding at one end. Returns the id it was attached to.
pub fn unbind_arrow_endpoint(arrow: &mut Element, end: Endpoint) -> Option<ElementId> {
    let data = arrow.linear_mut()?;
    let previous = data.binding(end).map(|b| b.element_id);
    data.set_binding(end, None);
    previous
}

/// Clear the binding at one end and drop the arrow from the old target's
/// back-references when no other end still points there. Returns the updated
/// old target, if it changed.
pub fn detach_endpoint(scene: &Scene, arrow: &mut Element, end: Endpoint) -> Option<Element> {
    let old = unbind_arrow_endpoint(arrow, end)?;
    if arrow.linear().is_some_and(|l| l.is_bound_to(old)) {
        return None;
    }
    let mut target = scene.get_by_id(old)?.clone();
    target.remove_bound_element(arrow.id()).then_some(target)
}

/// Rebind one end of `arrow` to whatever bindable element is under `point`,
/// or leave it unbound. Returns every changed element, arrow first.
pub fn rebind_endpoint(
    scene: &Scene,
    arrow: &Element,
    end: Endpoint,
    point: Point,
    snap_radius: f64,
) -> Vec<Element> {
    let mut arrow = arrow.clone();
    let mut targets: Vec<Element> = Vec::new();

    if let Some(old_target) = detach_endpoint(scene, &mut arrow, end) {
        targets.push(old_target);
    }

    if let Some(found) = find_bind_target(scene, point, snap_radius, &[arrow.id()]) {
        let found_id = found.id();
        let mut target = match targets.iter().position(|t| t.id() == found_id) {
            Some(i) => targets.remove(i),
            None => found.clone(),
        };
        let had_ref = target.has_bound_element(arrow.id());
        bind_arrow_endpoint(&mut arrow, end, &mut target, point);
        if !had_ref {
            targets.push(target);
        }
        log::debug!("arrow {} {:?} bound to {}", arrow.id(), end, found_id);
    }

    let mut changed = vec![arrow];
    changed.extend(targets);
    changed
}

/// Refreshed copies of every live arrow bound to any of `shape_ids`.
pub fn refresh_arrows_for(scene: &Scene, shape_ids: &[ElementId]) -> Vec<Element> {
    let mut seen: Vec<ElementId> = Vec::new();
    let mut refreshed = Vec::new();
    for &shape_id in shape_ids {
        for arrow in scene.bound_arrows(shape_id) {
            if seen.contains(&arrow.id()) {
                continue;
            }
            seen.push(arrow.id());
            refreshed.push(update_bound_arrow_endpoints(arrow, scene));
        }
    }
    refreshed
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Vec2};
    use std::f64::consts::FRAC_PI_3;

    fn target() -> Element {
        Element::rectangle(Rect::new(100.0, 100.0, 200.0, 150.0))
    }

    #[test]
    fn test_boundary_roundtrip() {
        let shape = target();
        let boundary = [
            Point::new(100.0, 120.0),
            Point::new(200.0, 140.0),
            Point::new(150.0, 100.0),
            Point::new(130.0, 150.0),
            Point::new(200.0, 150.0),
        ];
        for p in boundary {
            let binding = ArrowBinding::new(shape.id(), compute_fixed_point(&shape, p));
            let back = resolve_binding_point(&shape, &binding);
            assert!((back - p).hypot() < 1e-9, "{:?} -> {:?}", p, back);
        }
    }

    #[test]
    fn test_outside_point_is_projected() {
        let shape = target();
        let fixed = compute_fixed_point(&shape, Point::new(90.0, 125.0));
        assert!((fixed.x - 0.0).abs() < f64::EPSILON);
        assert!((fixed.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_inside_point_keeps_interior_coordinate() {
        let shape = target();
        let fixed = compute_fixed_point(&shape, Point::new(125.0, 140.0));
        assert!((fixed.x - 0.25).abs() < 1e-9);
        assert!((fixed.y - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_moves_resolved_point() {
        let mut shape = target();
        let p = Point::new(200.0, 125.0);
        let binding = ArrowBinding::new(shape.id(), compute_fixed_point(&shape, p));
        let before = resolve_binding_point(&shape, &binding);

        shape.angle = FRAC_PI_3;
        let after = resolve_binding_point(&shape, &binding);
        let expected = to_world(before, shape.center(), FRAC_PI_3);
        assert!((after - expected).hypot() < 1e-9);
    }

    #[test]
    fn test_find_bind_target_snap_radius() {
        let mut scene = Scene::new();
        let id = scene.add_element(target());
        scene.add_element(Element::line(vec![Point::new(0.0, 0.0), Point::new(90.0, 90.0)]));

        assert_eq!(
            find_bind_target(&scene, Point::new(150.0, 125.0), 10.0, &[]).map(|e| e.id()),
            Some(id)
        );
        assert_eq!(
            find_bind_target(&scene, Point::new(95.0, 125.0), 10.0, &[]).map(|e| e.id()),
            Some(id)
        );
        assert!(find_bind_target(&scene, Point::new(50.0, 125.0), 10.0, &[]).is_none());
        assert!(find_bind_target(&scene, Point::new(150.0, 125.0), 10.0, &[id]).is_none());
    }

    #[test]
    fn test_find_bind_target_prefers_nearest() {
        let mut scene = Scene::new();
        let left = scene.add_element(Element::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let _right = scene.add_element(Element::rectangle(Rect::new(70.0, 0.0, 120.0, 50.0)));
        assert_eq!(
            find_bind_target(&scene, Point::new(55.0, 25.0), 20.0, &[]).map(|e| e.id()),
            Some(left)
        );
    }

    #[test]
    fn test_bind_then_follow_moving_target() {
        let mut scene = Scene::new();
        let mut shape = target();
        let mut arrow = Element::arrow(vec![Point::new(0.0, 125.0), Point::new(95.0, 125.0)]);
        bind_arrow_endpoint(&mut arrow, Endpoint::End, &mut shape, Point::new(95.0, 125.0));
        assert!(shape.has_bound_element(arrow.id()));
        assert_eq!(arrow.absolute_points()[1], Point::new(100.0, 125.0));

        let shape_id = scene.add_element(shape);
        scene.add_element(arrow);

        let moved = scene.get_by_id(shape_id).unwrap().translated(Vec2::new(50.0, 20.0));
        scene.update_element(moved);

        let refreshed = refresh_arrows_for(&scene, &[shape_id]);
        assert_eq!(refreshed.len(), 1);
        let points = refreshed[0].absolute_points();
        assert!((points[0] - Point::new(0.0, 125.0)).hypot() < 1e-9);
        assert!((points[1] - Point::new(150.0, 145.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_elbowed_arrow_is_rerouted() {
        let mut scene = Scene::new();
        let mut a = Element::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0));
        let mut b = Element::rectangle(Rect::new(200.0, 200.0, 250.0, 250.0));
        let mut arrow = Element::arrow(vec![Point::new(50.0, 25.0), Point::new(225.0, 200.0)]);
        if let Some(data) = arrow.linear_mut() {
            data.elbowed = true;
        }
        bind_arrow_endpoint(&mut arrow, Endpoint::Start, &mut a, Point::new(50.0, 25.0));
        bind_arrow_endpoint(&mut arrow, Endpoint::End, &mut b, Point::new(225.0, 200.0));
        scene.add_element(a);
        scene.add_element(b);

        let routed = update_bound_arrow_endpoints(&arrow, &scene);
        assert_eq!(
            routed.absolute_points(),
            vec![Point::new(50.0, 25.0), Point::new(225.0, 25.0), Point::new(225.0, 200.0)]
        );
    }

    #[test]
    fn test_rebind_and_detach_keep_backrefs_consistent() {
        let mut scene = Scene::new();
        let first = scene.add_element(Element::rectangle(Rect::new(0.0, 0.0, 50.0, 50.0)));
        let second = scene.add_element(Element::rectangle(Rect::new(200.0, 0.0, 250.0, 50.0)));
        let arrow = Element::arrow(vec![Point::new(-100.0, 25.0), Point::new(-10.0, 25.0)]);
        let arrow_id = scene.add_element(arrow);

        let arrow = scene.get_by_id(arrow_id).unwrap().clone();
        let changed = rebind_endpoint(&scene, &arrow, Endpoint::End, Point::new(-5.0, 25.0), 10.0);
        assert_eq!(changed.len(), 2);
        for element in changed {
            scene.update_element(element);
        }
        assert!(scene.get_by_id(first).unwrap().has_bound_element(arrow_id));

        let arrow = scene.get_by_id(arrow_id).unwrap().clone();
        let changed = rebind_endpoint(&scene, &arrow, Endpoint::End, Point::new(205.0, 25.0), 10.0);
        assert_eq!(changed.len(), 3);
        for element in changed {
            scene.update_element(element);
        }
        assert!(!scene.get_by_id(first).unwrap().has_bound_element(arrow_id));
        assert!(scene.get_by_id(second).unwrap().has_bound_element(arrow_id));
        assert_eq!(
            scene.get_by_id(arrow_id).unwrap().linear().unwrap().end_binding.map(|b| b.element_id),
            Some(second)
        );
    }
}
