use super::{LiveResource, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{NavigationSpace, Shared};
use crate::error::Result;
use crate::gamedef::{GdNavigationSpace, NavigationSpaceProperty};
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

/// Navigation space sub-object. The space file is handed to the engine by
/// path, nothing is loaded here.
#[derive(Debug)]
pub struct NavigationSpaceSubObject {
    base: SubObjectBase,
    descriptor: GdNavigationSpace,
    space: LiveResource<NavigationSpace>,
}

impl NavigationSpaceSubObject {
    pub(crate) fn new(
        ctx: &mut WrapperContext,
        descriptor: &GdNavigationSpace,
        prefix: &str,
    ) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            space: LiveResource::default(),
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdNavigationSpace {
        &self.descriptor
    }

    pub fn navigation_space(&self) -> Option<&Shared<NavigationSpace>> {
        self.space.get()
    }

    fn create_space(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        let props = self.base.props(ctx);
        let space = self.space.get_or_create(NavigationSpace::default);
        {
            let mut space = space.borrow_mut();
            space.path = props.string(d.property_name(NavigationSpaceProperty::Path), &d.path);
            space.layer = props.int(d.property_name(NavigationSpaceProperty::Layer), d.layer);
            space.space_type =
                props.named_enum(d.property_name(NavigationSpaceProperty::Type), d.space_type);
            space.blocking_priority = props.int(
                d.property_name(NavigationSpaceProperty::BlockingPriority),
                d.blocking_priority,
            );
            space.snap_distance = props.float(
                d.property_name(NavigationSpaceProperty::SnapDistance),
                d.snap_distance,
            );
            space.snap_angle =
                props.float(d.property_name(NavigationSpaceProperty::SnapAngle), d.snap_angle);
        }

        self.update_visibility(ctx);
        self.update_geometry(ctx);
        self.space.add_to_world(ctx);
        self.attach_to_collider(ctx);
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.space.attach(
            ctx,
            &mut self.base,
            &d.placement,
            d.property_name(NavigationSpaceProperty::AttachPosition),
            d.property_name(NavigationSpaceProperty::AttachRotation),
        );
    }
}

impl SubObject for NavigationSpaceSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::NavigationSpace
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        self.create_space(ctx);
        ctx.finish_sub_object_load(true);
        Ok(())
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        if let Some(space) = self.space.get() {
            space.borrow_mut().enabled = ctx.is_visible_with(false);
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        self.space.place(ctx, &self.base, &self.descriptor.placement);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        self.attach_to_collider(ctx);
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.space.destroy(ctx, &mut self.base);
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_navigation_space(self);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::gamedef::GdClass;
    use crate::triggers::TriggerTargetList;
    use crate::wrapper::test_support;

    #[test]
    fn test_space_path_and_visibility() {
        let (_backend, env) = test_support::environment();
        let table = Rc::new(TriggerTargetList::new());

        let mut descriptor = GdNavigationSpace {
            path: "/nav/floor.denavspace".into(),
            ..GdNavigationSpace::default()
        };
        descriptor
            .property_names
            .insert(NavigationSpaceProperty::Path, "nav.path".into());
        let mut class = GdClass::new("Floor");
        class.navigation_spaces.push(descriptor);

        let (mut wrapper, world) = test_support::placed_wrapper(
            &env,
            class,
            &[("nav.path", "/nav/stairs.denavspace")],
            &table,
        );
        let space = world
            .borrow()
            .navigation_spaces
            .iter()
            .next()
            .cloned()
            .unwrap();
        assert_eq!(space.borrow().path, "/nav/stairs.denavspace");
        assert!(space.borrow().enabled);

        wrapper.set_visible(false);
        assert!(!space.borrow().enabled);
    }
}
