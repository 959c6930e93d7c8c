use super::{LiveResource, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{EnvMapProbe, Shared};
use crate::error::Result;
use crate::gamedef::{EnvMapProbeProperty, GdEnvMapProbe};
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

/// Environment map probe sub-object. Loads nothing.
#[derive(Debug)]
pub struct EnvMapProbeSubObject {
    base: SubObjectBase,
    descriptor: GdEnvMapProbe,
    probe: LiveResource<EnvMapProbe>,
}

impl EnvMapProbeSubObject {
    pub(crate) fn new(
        ctx: &mut WrapperContext,
        descriptor: &GdEnvMapProbe,
        prefix: &str,
    ) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            probe: LiveResource::default(),
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdEnvMapProbe {
        &self.descriptor
    }

    pub fn probe(&self) -> Option<&Shared<EnvMapProbe>> {
        self.probe.get()
    }

    fn create_probe(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        let props = self.base.props(ctx);
        let probe = self.probe.get_or_create(EnvMapProbe::default);
        {
            let mut probe = probe.borrow_mut();
            probe.influence_area = props.vector(
                d.property_name(EnvMapProbeProperty::InfluenceArea),
                d.influence_area,
            );
            probe.influence_border_size = props.float(
                d.property_name(EnvMapProbeProperty::InfluenceBorderSize),
                d.influence_border_size,
            );
            probe.influence_priority = props.int(
                d.property_name(EnvMapProbeProperty::InfluencePriority),
                d.influence_priority,
            );
            probe.scaling = d.scaling * ctx.scaling();
        }

        self.update_layer_masks(ctx);
        self.update_geometry(ctx);
        self.probe.add_to_world(ctx);
        self.attach_to_collider(ctx);
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.probe.attach(
            ctx,
            &mut self.base,
            &d.placement,
            d.property_name(EnvMapProbeProperty::AttachPosition),
            d.property_name(EnvMapProbeProperty::AttachRotation),
        );
    }
}

impl SubObject for EnvMapProbeSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::EnvMapProbe
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        self.create_probe(ctx);
        ctx.finish_sub_object_load(true);
        Ok(())
    }

    fn update_layer_masks(&mut self, ctx: &WrapperContext) {
        if let Some(probe) = self.probe.get() {
            probe.borrow_mut().layer_mask = ctx.render_env_map_mask();
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        self.probe.place(ctx, &self.base, &self.descriptor.placement);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        self.attach_to_collider(ctx);
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.probe.destroy(ctx, &mut self.base);
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_env_map_probe(self);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use glam::{DVec3, Vec3};

    use super::*;
    use crate::gamedef::{GdClass, GdPlacement};
    use crate::triggers::TriggerTargetList;
    use crate::wrapper::test_support;

    #[test]
    fn test_env_map_placement_and_layer_mask() {
        let (_backend, env) = test_support::environment();
        let table = Rc::new(TriggerTargetList::new());

        let mut class = GdClass::new("Room");
        class.env_map_probes.push(GdEnvMapProbe {
            placement: GdPlacement {
                position: Vec3::new(0.0, 2.0, 0.0),
                ..GdPlacement::default()
            },
            ..GdEnvMapProbe::default()
        });

        let (mut wrapper, world) = test_support::placed_wrapper(&env, class, &[], &table);
        let probe = world.borrow().env_map_probes.iter().next().cloned().unwrap();
        assert_eq!(probe.borrow().layer_mask, env.config().render_env_map_mask);
        assert!(probe.borrow().position.abs_diff_eq(DVec3::new(0.0, 2.0, 0.0), 1e-9));

        wrapper.set_render_env_map_mask(0x10);
        assert_eq!(probe.borrow().layer_mask, 0x10);

        // without a component the probe rides on the fallback collider
        let target = crate::engine::AttachTarget::EnvMapProbe(probe.clone());
        assert!(wrapper.fallback_collider().borrow().has_attachment(&target));
    }
}
