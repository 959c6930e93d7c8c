use super::{trigger_state, LiveResource, LoadRound, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{ParticleEmitter, Shared};
use crate::error::Result;
use crate::gamedef::{GdParticleEmitter, ParticleEmitterProperty};
use crate::loader::ResourceType;
use crate::triggers::TriggerExpression;
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

/// Particle emitter instance sub-object. Casting follows a trigger
/// expression while the wrapper is visible.
#[derive(Debug)]
pub struct ParticleEmitterSubObject {
    base: SubObjectBase,
    descriptor: GdParticleEmitter,
    load: LoadRound,
    path: String,
    instance: LiveResource<ParticleEmitter>,
    trigger_casting: TriggerExpression,
    casting: bool,
}

impl ParticleEmitterSubObject {
    pub(crate) fn new(
        ctx: &mut WrapperContext,
        descriptor: &GdParticleEmitter,
        prefix: &str,
    ) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            load: LoadRound::default(),
            path: String::new(),
            instance: LiveResource::default(),
            trigger_casting: TriggerExpression::new(),
            casting: descriptor.casting,
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdParticleEmitter {
        &self.descriptor
    }

    pub fn instance(&self) -> Option<&Shared<ParticleEmitter>> {
        self.instance.get()
    }

    fn create_instance(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        let props = self.base.props(ctx);
        let emitter = self.load.get(&self.path, ResourceType::ParticleEmitter);
        let instance = self.instance.get_or_create(ParticleEmitter::default);
        {
            let mut instance = instance.borrow_mut();
            instance.emitter = emitter;
            instance.warmup_time = props.float(
                d.property_name(ParticleEmitterProperty::WarmupTime),
                d.warmup_time,
            );
        }

        self.update_layer_masks(ctx);
        self.update_collision_filter(ctx);
        self.update_visibility(ctx);
        self.update_geometry(ctx);
        self.instance.add_to_world(ctx);
        self.attach_to_collider(ctx);
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        let d = &self.descriptor;
        self.instance.attach(
            ctx,
            &mut self.base,
            &d.placement,
            d.property_name(ParticleEmitterProperty::AttachPosition),
            d.property_name(ParticleEmitterProperty::AttachRotation),
        );
    }
}

impl SubObject for ParticleEmitterSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::ParticleEmitter
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        let d = &self.descriptor;
        self.path = self
            .base
            .props(ctx)
            .string(d.property_name(ParticleEmitterProperty::Path), &d.path);

        let load = self.load.start(&self.base, ctx);
        load.request(ctx.environment(), &self.path, ResourceType::ParticleEmitter);
        self.async_load_finished(ctx);
        Ok(())
    }

    fn async_load_finished(&mut self, ctx: &mut WrapperContext) {
        let Some(success) = self.load.take_completion() else {
            return;
        };
        self.create_instance(ctx);
        ctx.finish_sub_object_load(success);
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        if let Some(instance) = self.instance.get() {
            instance.borrow_mut().casting = self.casting && ctx.is_visible_with(false);
        }
    }

    fn update_layer_masks(&mut self, ctx: &WrapperContext) {
        if let Some(instance) = self.instance.get() {
            instance.borrow_mut().layer_mask = ctx.render_layer_mask();
        }
    }

    fn update_collision_filter(&mut self, ctx: &WrapperContext) {
        if let Some(instance) = self.instance.get() {
            instance.borrow_mut().collision_filter = ctx.collision_filter_particles();
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        self.instance.place(ctx, &self.base, &self.descriptor.placement);
    }

    fn init_triggers(&mut self, ctx: &WrapperContext) {
        let name = self.descriptor.property_name(ParticleEmitterProperty::Casting);
        self.base.bind_trigger(ctx, &mut self.trigger_casting, name);
    }

    fn update_triggers(&mut self, ctx: &WrapperContext) {
        self.casting = trigger_state(&mut self.trigger_casting, self.descriptor.casting);
        self.update_visibility(ctx);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        self.attach_to_collider(ctx);
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.load.cancel();
        self.trigger_casting.unlink_targets();
        self.instance.destroy(ctx, &mut self.base);
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_particle_emitter(self);
    }
}
