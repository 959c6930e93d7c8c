use super::{LiveResource, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{NavigationBlocker, Shared};
use crate::error::Result;
use crate::gamedef::{GdNavigationBlocker, NavigationBlockerProperty};
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

/// Navigation blocker sub-object. Contributes its blocking box to the
/// wrapper extents.
#[derive(Debug)]
pub struct NavigationBlockerSubObject {
    base: SubObjectBase,
    descriptor: GdNavigationBlocker,
    blocker: LiveResource<NavigationBlocker>,
    enabled: bool,
}

impl NavigationBlockerSubObject {
    pub(crate) fn new(
        ctx: &mut WrapperContext,
        descriptor: &GdNavigationBlocker,
        prefix: &str,
    ) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            blocker: LiveResource::default(),
            enabled: descriptor.enabled,
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdNavigationBlocker {
        &self.descriptor
    }

    pub fn navigation_blocker(&self) -> Option<&Shared<NavigationBlocker>> {
        self.blocker.get()
    }

    fn create_blocker(&mut self, ctx: &mut WrapperContext) {
        let d = &self.descriptor;
        let props = self.base.props(ctx);
        self.enabled = props.boolean(d.property_name(NavigationBlockerProperty::Enabled), d.enabled);
        let half_extents = props.vector(
            d.property_name(NavigationBlockerProperty::HalfExtents),
            d.half_extents,
        );
        let center = props.vector(
            d.property_name(NavigationBlockerProperty::AttachPosition),
            d.placement.position,
        );

        let blocker = self.blocker.get_or_create(NavigationBlocker::default);
        {
            let mut blocker = blocker.borrow_mut();
            blocker.layer = props.int(d.property_name(NavigationBlockerProperty::Layer), d.layer);
            blocker.space_type =
                props.named_enum(d.property_name(NavigationBlockerProperty::Type), d.space_type);
            blocker.blocking_priority = props.int(
                d.property_name(NavigationBlockerProperty::BlockingPriority),
                d.blocking_priority,
            );
            blocker.half_extents = half_extents;
            blocker.scaling = d.scaling * ctx.scaling();
        }

        let half_extents = half_extents * d.scaling;
        self.base
            .set_box_extents(ctx, center - half_extents, center + half_extents);

        self.update_visibility(ctx);
        self.update_geometry(ctx);
        self.blocker.add_to_world(ctx);
        self.attach_to_collider(ctx);
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.blocker.attach(
            ctx,
            &mut self.base,
            &d.placement,
            d.property_name(NavigationBlockerProperty::AttachPosition),
            d.property_name(NavigationBlockerProperty::AttachRotation),
        );
    }
}

impl SubObject for NavigationBlockerSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::NavigationBlocker
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        self.create_blocker(ctx);
        ctx.finish_sub_object_load(true);
        Ok(())
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        if let Some(blocker) = self.blocker.get() {
            blocker.borrow_mut().enabled = self.enabled && ctx.is_visible_with(false);
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        self.blocker.place(ctx, &self.base, &self.descriptor.placement);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        self.attach_to_collider(ctx);
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.blocker.destroy(ctx, &mut self.base);
        self.base.clear_box_extents(ctx);
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_navigation_blocker(self);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::gamedef::{GdClass, GdPlacement};
    use crate::triggers::TriggerTargetList;
    use crate::wrapper::test_support;

    #[test]
    fn test_blocking_box_extents_and_enabled() {
        let (_backend, env) = test_support::environment();
        let table = Rc::new(TriggerTargetList::new());

        let mut descriptor = GdNavigationBlocker {
            half_extents: Vec3::new(1.0, 2.0, 3.0),
            scaling: Vec3::splat(2.0),
            placement: GdPlacement {
                position: Vec3::new(0.0, 1.0, 0.0),
                ..GdPlacement::default()
            },
            ..GdNavigationBlocker::default()
        };
        descriptor
            .property_names
            .insert(NavigationBlockerProperty::Enabled, "blocker.enabled".into());
        let mut class = GdClass::new("Wall");
        class.navigation_blockers.push(descriptor);

        let (mut wrapper, world) =
            test_support::placed_wrapper(&env, class, &[("blocker.enabled", "0")], &table);

        assert_eq!(wrapper.box_min_extend(), Vec3::new(-2.0, -3.0, -6.0));
        assert_eq!(wrapper.box_max_extend(), Vec3::new(2.0, 5.0, 6.0));

        let blocker = world
            .borrow()
            .navigation_blockers
            .iter()
            .next()
            .cloned()
            .unwrap();
        assert!(!blocker.borrow().enabled);
        assert_eq!(blocker.borrow().scaling, Vec3::splat(2.0));
    }
}
