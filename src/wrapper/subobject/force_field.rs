use super::{trigger_state, LiveResource, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{ForceField, Shared};
use crate::error::Result;
use crate::gamedef::{ForceFieldProperty, GdForceField};
use crate::triggers::TriggerExpression;
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

/// Force field sub-object. Enabled by a trigger expression while the
/// wrapper is visible.
#[derive(Debug)]
pub struct ForceFieldSubObject {
    base: SubObjectBase,
    descriptor: GdForceField,
    field: LiveResource<ForceField>,
    trigger_enabled: TriggerExpression,
    enabled: bool,
}

impl ForceFieldSubObject {
    pub(crate) fn new(
        ctx: &mut WrapperContext,
        descriptor: &GdForceField,
        prefix: &str,
    ) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            field: LiveResource::default(),
            trigger_enabled: TriggerExpression::new(),
            enabled: descriptor.enabled,
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdForceField {
        &self.descriptor
    }

    pub fn force_field(&self) -> Option<&Shared<ForceField>> {
        self.field.get()
    }

    fn create_field(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        let props = self.base.props(ctx);
        let field = self.field.get_or_create(ForceField::default);
        {
            let mut field = field.borrow_mut();
            field.field_type =
                props.named_enum(d.property_name(ForceFieldProperty::FieldType), d.field_type);
            field.application = props.named_enum(
                d.property_name(ForceFieldProperty::ApplicationType),
                d.application_type,
            );
            field.direction =
                props.vector(d.property_name(ForceFieldProperty::Direction), d.direction);
            field.force = props.float(d.property_name(ForceFieldProperty::Force), d.force);
            field.radius = props.float(d.property_name(ForceFieldProperty::Radius), d.radius);
            field.exponent = props.float(d.property_name(ForceFieldProperty::Exponent), d.exponent);
            field.fluctuation_direction = props.float(
                d.property_name(ForceFieldProperty::FluctuationDirection),
                d.fluctuation_direction,
            );
            field.fluctuation_force = props.float(
                d.property_name(ForceFieldProperty::FluctuationForce),
                d.fluctuation_force,
            );
        }

        self.update_collision_filter(ctx);
        self.update_visibility(ctx);
        self.update_geometry(ctx);
        self.field.add_to_world(ctx);
        self.attach_to_collider(ctx);
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.field.attach(
            ctx,
            &mut self.base,
            &d.placement,
            d.property_name(ForceFieldProperty::AttachPosition),
            d.property_name(ForceFieldProperty::AttachRotation),
        );
    }
}

impl SubObject for ForceFieldSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::ForceField
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        self.create_field(ctx);
        ctx.finish_sub_object_load(true);
        Ok(())
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        if let Some(field) = self.field.get() {
            field.borrow_mut().enabled = self.enabled && ctx.is_visible_with(false);
        }
    }

    fn update_collision_filter(&mut self, ctx: &WrapperContext) {
        if let Some(field) = self.field.get() {
            field.borrow_mut().collision_filter = ctx.collision_filter_force_field();
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        self.field.place(ctx, &self.base, &self.descriptor.placement);
    }

    fn init_triggers(&mut self, ctx: &WrapperContext) {
        let name = self.descriptor.property_name(ForceFieldProperty::Enabled);
        self.base.bind_trigger(ctx, &mut self.trigger_enabled, name);
    }

    fn update_triggers(&mut self, ctx: &WrapperContext) {
        self.enabled = trigger_state(&mut self.trigger_enabled, self.descriptor.enabled);
        self.update_visibility(ctx);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        self.attach_to_collider(ctx);
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.trigger_enabled.unlink_targets();
        self.field.destroy(ctx, &mut self.base);
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_force_field(self);
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
    fn test_enabled_follows_negated_trigger() {
        let (_backend, env) = test_support::environment();
        let table = Rc::new(TriggerTargetList::new());

        let mut descriptor = GdForceField::default();
        descriptor
            .property_names
            .insert(ForceFieldProperty::Enabled, "wind.enabled".into());
        let mut class = GdClass::new("Fan");
        class.force_fields.push(descriptor);

        let (mut wrapper, world) = test_support::placed_wrapper(
            &env,
            class,
            &[("wind.enabled", "!@calm")],
            &table,
        );
        let field = world.borrow().force_fields.iter().next().cloned().unwrap();
        assert!(field.borrow().enabled);

        table.get_named("calm").unwrap().fire();
        wrapper.update(0.0);
        assert!(!field.borrow().enabled);

        table.get_named("calm").unwrap().reset();
        wrapper.update(0.0);
        assert!(field.borrow().enabled);

        wrapper.set_visible(false);
        assert!(!field.borrow().enabled);
    }
}
