use super::{trigger_state, LiveResource, LoadRound, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{Light, Shared};
use crate::error::Result;
use crate::gamedef::{GdLight, LightProperty};
use crate::loader::ResourceType;
use crate::triggers::TriggerExpression;
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

/// Light sub-object. Loads the optional light skin, activation follows a
/// trigger expression.
#[derive(Debug)]
pub struct LightSubObject {
    base: SubObjectBase,
    descriptor: GdLight,
    load: LoadRound,
    light_skin_path: String,
    light: LiveResource<Light>,
    trigger_activated: TriggerExpression,
    activated: bool,
}

impl LightSubObject {
    pub(crate) fn new(ctx: &mut WrapperContext, descriptor: &GdLight, prefix: &str) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            load: LoadRound::default(),
            light_skin_path: String::new(),
            light: LiveResource::default(),
            trigger_activated: TriggerExpression::new(),
            activated: descriptor.activated,
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdLight {
        &self.descriptor
    }

    pub fn light(&self) -> Option<&Shared<Light>> {
        self.light.get()
    }

    fn create_light(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        let props = self.base.props(ctx);
        let light_skin = self.load.get(&self.light_skin_path, ResourceType::Skin);
        let light = self.light.get_or_create(Light::default);
        {
            let mut light = light.borrow_mut();
            light.light_type = props.named_enum(d.property_name(LightProperty::Type), d.light_type);
            light.color = props.color3(d.property_name(LightProperty::Color), d.color);
            light.intensity = props.float(d.property_name(LightProperty::Intensity), d.intensity);
            light.range = props.float(d.property_name(LightProperty::Range), d.range);
            light.ambient_ratio =
                props.float(d.property_name(LightProperty::AmbientRatio), d.ambient_ratio);
            light.half_intensity_distance = props.float(
                d.property_name(LightProperty::HalfIntensityDistance),
                d.half_intensity_distance,
            );
            light.spot_angle = props.float(d.property_name(LightProperty::SpotAngle), d.spot_angle);
            light.spot_ratio = props.float(d.property_name(LightProperty::SpotRatio), d.spot_ratio);
            light.cast_shadows =
                props.boolean(d.property_name(LightProperty::CastShadows), d.cast_shadows);
            light.light_skin = light_skin;
        }

        self.update_layer_masks(ctx);
        self.update_visibility(ctx);
        self.update_geometry(ctx);
        self.light.add_to_world(ctx);
        self.attach_to_collider(ctx);
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.light.attach(
            ctx,
            &mut self.base,
            &d.placement,
            d.property_name(LightProperty::AttachPosition),
            d.property_name(LightProperty::AttachRotation),
        );
    }
}

impl SubObject for LightSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::Light
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        let d = &self.descriptor;
        self.light_skin_path = self
            .base
            .props(ctx)
            .string(d.property_name(LightProperty::LightSkin), &d.light_skin_path);

        let load = self.load.start(&self.base, ctx);
        load.request(ctx.environment(), &self.light_skin_path, ResourceType::Skin);
        self.async_load_finished(ctx);
        Ok(())
    }

    fn async_load_finished(&mut self, ctx: &mut WrapperContext) {
        let Some(success) = self.load.take_completion() else {
            return;
        };
        self.create_light(ctx);
        ctx.finish_sub_object_load(success);
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        if let Some(light) = self.light.get() {
            light.borrow_mut().activated =
                self.activated && ctx.is_visible_with(self.descriptor.partial_hide);
        }
    }

    fn update_layer_masks(&mut self, ctx: &WrapperContext) {
        if let Some(light) = self.light.get() {
            light.borrow_mut().layer_mask = ctx.render_layer_mask();
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        self.light.place(ctx, &self.base, &self.descriptor.placement);
    }

    fn init_triggers(&mut self, ctx: &WrapperContext) {
        let name = self.descriptor.property_name(LightProperty::Activated);
        self.base.bind_trigger(ctx, &mut self.trigger_activated, name);
    }

    fn update_triggers(&mut self, ctx: &WrapperContext) {
        self.activated = trigger_state(&mut self.trigger_activated, self.descriptor.activated);
        self.update_visibility(ctx);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        self.attach_to_collider(ctx);
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.load.cancel();
        self.trigger_activated.unlink_targets();
        self.light.destroy(ctx, &mut self.base);
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_light(self);
    }
}
