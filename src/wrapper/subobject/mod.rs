//! Sub-objects of an object wrapper
//!
//! Every sub-object descriptor of the wrapper's class (and of inherited
//! classes) becomes one sub-object owning a live engine resource. All kinds
//! follow the same life cycle:
//!
//! 1. creation issues resource loads through an [`AsyncLoad`](super::async_load)
//!    round, or finishes immediately if there is nothing to load
//! 2. a finished round reports to the wrapper's load latch
//! 3. the resource is created or updated from properties, added to the world
//!    once and attached to the wrapper's collider
//! 4. destruction detaches the resource and removes it from the world

mod billboard;
mod component;
mod env_map_probe;
mod force_field;
mod light;
mod navigation_blocker;
mod navigation_space;
mod particle_emitter;
mod speaker;
mod world;

use std::fmt;
use std::rc::Rc;

use glam::{DVec3, Quat, Vec3};

pub use billboard::BillboardSubObject;
pub use component::ComponentSubObject;
pub use env_map_probe::EnvMapProbeSubObject;
pub use force_field::ForceFieldSubObject;
pub use light::LightSubObject;
pub use navigation_blocker::NavigationBlockerSubObject;
pub use navigation_space::NavigationSpaceSubObject;
pub use particle_emitter::ParticleEmitterSubObject;
pub use speaker::SpeakerSubObject;
pub use world::WorldSubObject;

use super::async_load::{AsyncLoad, SubObjectId};
use super::context::{Properties, WrapperContext};
use super::visitor::SubObjectVisitor;
use crate::codec;
use crate::engine::{
    AttachTarget, Billboard, Collider, ColliderAttachment, EnvMapProbe, ForceField, Light,
    NavigationBlocker, NavigationSpace, ParticleEmitter, ResourceSet, Shared, Speaker, World,
};
use crate::error::Result;
use crate::gamedef::GdPlacement;
use crate::loader::{Resource, ResourceType};
use crate::triggers::TriggerExpression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubObjectKind {
    Component,
    Billboard,
    Light,
    Speaker,
    ParticleEmitter,
    ForceField,
    EnvMapProbe,
    NavigationSpace,
    NavigationBlocker,
    World,
}

/// Life cycle hooks the wrapper calls on its sub-objects
pub trait SubObject: fmt::Debug {
    fn base(&self) -> &SubObjectBase;

    fn kind(&self) -> SubObjectKind;

    /// Re-derive the resource from the current properties, possibly
    /// starting a new load round
    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()>;

    /// The current load round delivered all results
    fn async_load_finished(&mut self, _ctx: &mut WrapperContext) {}

    /// Every sub-object of the wrapper finished loading
    fn on_all_sub_objects_finished_loading(&mut self, _ctx: &mut WrapperContext) {}

    fn update_visibility(&mut self, _ctx: &WrapperContext) {}

    fn update_layer_masks(&mut self, _ctx: &WrapperContext) {}

    fn update_collision_filter(&mut self, _ctx: &WrapperContext) {}

    fn update_geometry(&mut self, _ctx: &WrapperContext) {}

    fn update_collider_response_type(&mut self, _ctx: &WrapperContext) {}

    fn update(&mut self, _ctx: &mut WrapperContext, _elapsed: f32) {}

    fn reset_physics(&mut self, _ctx: &WrapperContext) {}

    fn reset_component_textures(&mut self, _ctx: &WrapperContext) {}

    fn outline_skin_changed(&mut self, _ctx: &WrapperContext) {}

    fn collider_user_pointer_changed(&mut self, _ctx: &WrapperContext) {}

    /// Parse and bind trigger expressions from properties
    fn init_triggers(&mut self, _ctx: &WrapperContext) {}

    /// Evaluate trigger expressions and apply the results
    fn update_triggers(&mut self, _ctx: &WrapperContext) {}

    fn reattach_to_colliders(&mut self, _ctx: &WrapperContext) {}

    /// True if the sub-object shows anything
    fn is_content_visible(&self) -> bool {
        false
    }

    /// False while nested content is still loading
    fn all_sub_objects_finished_loading(&self) -> bool {
        true
    }

    /// Release the resource and remove it from the world
    fn destroy(&mut self, ctx: &mut WrapperContext);

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor);

    fn id(&self) -> SubObjectId {
        self.base().id()
    }

    fn box_extents(&self) -> Option<(Vec3, Vec3)> {
        self.base().box_extents()
    }
}

/// Attachment of a sub-object resource to a wrapper collider
pub(crate) struct Attachment<'a> {
    pub target: AttachTarget,
    pub position: Vec3,
    pub orientation: Quat,
    pub bone: &'a str,
    pub no_scaling: bool,
}

/// State common to all sub-object kinds
#[derive(Debug)]
pub struct SubObjectBase {
    id: SubObjectId,
    prefix: String,
    extents: Option<(Vec3, Vec3)>,
    attached: Option<(Shared<Collider>, AttachTarget)>,
}

impl SubObjectBase {
    pub(crate) fn new(ctx: &mut WrapperContext, prefix: &str) -> Self {
        Self {
            id: ctx.next_sub_object_id(),
            prefix: prefix.to_string(),
            extents: None,
            attached: None,
        }
    }

    pub fn id(&self) -> SubObjectId {
        self.id
    }

    /// Prefix of all property names, set by inheritance
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn props<'a>(&'a self, ctx: &'a WrapperContext) -> Properties<'a> {
        ctx.properties(&self.prefix)
    }

    pub fn box_extents(&self) -> Option<(Vec3, Vec3)> {
        self.extents
    }

    pub(crate) fn set_box_extents(&mut self, ctx: &mut WrapperContext, min: Vec3, max: Vec3) {
        if self.extents == Some((min, max)) {
            return;
        }
        self.extents = Some((min, max));
        ctx.sub_object_extents_dirty();
    }

    pub(crate) fn clear_box_extents(&mut self, ctx: &mut WrapperContext) {
        if self.extents.take().is_some() {
            ctx.sub_object_extents_dirty();
        }
    }

    /// Collider the resource is attached to
    pub fn attached_collider(&self) -> Option<&Shared<Collider>> {
        self.attached.as_ref().map(|(collider, _)| collider)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    /// Attach to the wrapper's collider component, or to the fallback
    /// collider if there is none. Bones are only tracked on component
    /// colliders.
    pub(crate) fn attach(
        &mut self,
        ctx: &WrapperContext,
        attachment: Attachment<'_>,
        exclude: Option<&Shared<Collider>>,
    ) {
        self.detach();

        let (parent, record) = match ctx.attachable_collider_component(exclude) {
            Some(component) => (
                component.clone(),
                ColliderAttachment::static_or_bone(attachment.target.clone(), attachment.bone),
            ),
            None => (
                ctx.fallback_collider().clone(),
                ColliderAttachment::static_or_bone(attachment.target.clone(), ""),
            ),
        };

        parent.borrow_mut().add_attachment(
            record
                .with_transform(attachment.position, attachment.orientation)
                .with_no_scaling(attachment.no_scaling),
        );
        self.attached = Some((parent, attachment.target));
    }

    /// Attach using the placement of a descriptor, overridable by the
    /// attach position and rotation properties
    pub(crate) fn attach_placed(
        &mut self,
        ctx: &WrapperContext,
        target: AttachTarget,
        placement: &GdPlacement,
        position_property: &str,
        rotation_property: &str,
    ) {
        let (position, orientation) = {
            let props = self.props(ctx);
            (
                props.vector(position_property, placement.position),
                props.rotation(rotation_property, placement.rotation),
            )
        };

        self.attach(
            ctx,
            Attachment {
                target,
                position,
                orientation,
                bone: &placement.bone_name,
                no_scaling: false,
            },
            None,
        );
    }

    /// World transform of a placement relative to the wrapper
    pub fn placed_transform(ctx: &WrapperContext, placement: &GdPlacement) -> (DVec3, Quat) {
        (
            ctx.matrix().transform_point3(placement.position.as_dvec3()),
            ctx.orientation() * codec::euler_to_quat(placement.rotation),
        )
    }

    /// Replace `slot` with the expression stored in `property`. The old
    /// expression is unlinked first.
    pub(crate) fn bind_trigger(
        &self,
        ctx: &WrapperContext,
        slot: &mut TriggerExpression,
        property: &str,
    ) {
        let expression = self.props(ctx).trigger_expression(property);
        slot.unlink_targets();
        *slot = expression;
    }

    pub(crate) fn detach(&mut self) {
        if let Some((collider, target)) = self.attached.take() {
            collider.borrow_mut().remove_attachment(&target);
        }
    }
}

/// Result of an optional trigger expression, `default` if it is empty
pub(crate) fn trigger_state(expression: &mut TriggerExpression, default: bool) -> bool {
    if expression.is_empty() {
        default
    } else {
        expression.evaluate()
    }
}

/// Current resource load round of a sub-object
#[derive(Debug, Default)]
pub(crate) struct LoadRound {
    load: Option<Rc<AsyncLoad>>,
}

impl LoadRound {
    /// Begin a new round. Callbacks of the previous round are ignored.
    pub fn start(&mut self, base: &SubObjectBase, ctx: &WrapperContext) -> Rc<AsyncLoad> {
        self.cancel();
        let load = AsyncLoad::new(base.id(), ctx.mailbox.clone());
        self.load = Some(load.clone());
        load
    }

    /// Outcome of the round, handed out once after all results arrived
    pub fn take_completion(&self) -> Option<bool> {
        self.load.as_ref()?.take_completion()
    }

    pub fn get(&self, path: &str, resource_type: ResourceType) -> Option<Resource> {
        self.load.as_ref()?.get(path, resource_type)
    }

    pub fn cancel(&mut self) {
        if let Some(load) = self.load.take() {
            load.drop_owner();
        }
    }
}

/// Engine resources a sub-object places into the world
pub(crate) trait WorldResource: Sized {
    fn world_set(world: &mut World) -> &mut ResourceSet<Self>;

    fn attach_target(resource: &Shared<Self>) -> AttachTarget;

    fn set_transform(&mut self, position: DVec3, orientation: Quat);
}

macro_rules! world_resource {
    ($ty:ident, $set:ident) => {
        world_resource!($ty, $set, |this, position, orientation| {
            this.position = position;
            this.orientation = orientation;
        });
    };
    ($ty:ident, $set:ident, |$this:ident, $position:ident, $orientation:ident| $body:block) => {
        impl WorldResource for $ty {
            fn world_set(world: &mut World) -> &mut ResourceSet<Self> {
                &mut world.$set
            }

            fn attach_target(resource: &Shared<Self>) -> AttachTarget {
                AttachTarget::$ty(resource.clone())
            }

            fn set_transform(&mut self, $position: DVec3, $orientation: Quat) {
                let $this = self;
                $body
            }
        }
    };
}

// billboards face the camera
world_resource!(Billboard, billboards, |this, position, _orientation| {
    this.position = position;
});
world_resource!(Light, lights);
world_resource!(Speaker, speakers);
world_resource!(ParticleEmitter, particle_emitters);
world_resource!(ForceField, force_fields);
world_resource!(EnvMapProbe, env_map_probes);
world_resource!(NavigationSpace, navigation_spaces);
world_resource!(NavigationBlocker, navigation_blockers);

/// Lazily created resource tracking its world membership
#[derive(Debug)]
pub(crate) struct LiveResource<T> {
    resource: Option<Shared<T>>,
    added_to_world: bool,
}

impl<T> Default for LiveResource<T> {
    fn default() -> Self {
        Self {
            resource: None,
            added_to_world: false,
        }
    }
}

impl<T: WorldResource> LiveResource<T> {
    pub fn get(&self) -> Option<&Shared<T>> {
        self.resource.as_ref()
    }

    /// Existing resource, or a new one made by `create`
    pub fn get_or_create(&mut self, create: impl FnOnce() -> T) -> Shared<T> {
        self.resource
            .get_or_insert_with(|| Shared::new(create()))
            .clone()
    }

    pub fn add_to_world(&mut self, ctx: &WrapperContext) {
        if self.added_to_world {
            return;
        }
        if let (Some(resource), Some(world)) = (&self.resource, ctx.world()) {
            T::world_set(&mut world.borrow_mut()).add(resource);
            self.added_to_world = true;
        }
    }

    /// Move the resource to `placement` unless it follows a collider
    pub fn place(&self, ctx: &WrapperContext, base: &SubObjectBase, placement: &GdPlacement) {
        if base.is_attached() {
            return;
        }
        if let Some(resource) = &self.resource {
            let (position, orientation) = SubObjectBase::placed_transform(ctx, placement);
            resource.borrow_mut().set_transform(position, orientation);
        }
    }

    /// Attach to the wrapper collider, see [`SubObjectBase::attach_placed`]
    pub fn attach(
        &self,
        ctx: &WrapperContext,
        base: &mut SubObjectBase,
        placement: &GdPlacement,
        position_property: &str,
        rotation_property: &str,
    ) {
        if let Some(resource) = &self.resource {
            base.attach_placed(
                ctx,
                T::attach_target(resource),
                placement,
                position_property,
                rotation_property,
            );
        }
    }

    /// Detach, leave the world and drop the resource
    pub fn destroy(&mut self, ctx: &WrapperContext, base: &mut SubObjectBase) {
        base.detach();
        if let Some(resource) = self.resource.take() {
            if self.added_to_world {
                if let Some(world) = ctx.world() {
                    T::world_set(&mut world.borrow_mut()).remove(&resource);
                }
            }
        }
        self.added_to_world = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapper::test_support;

    #[test]
    fn test_attach_prefers_collider_component() {
        let env = test_support::environment().1;
        let mut ctx = WrapperContext::new(env);
        let mut base = SubObjectBase::new(&mut ctx, "");
        let light = Shared::new(Light::default());
        let placement = GdPlacement {
            bone_name: "head".into(),
            ..GdPlacement::default()
        };

        base.attach_placed(&ctx, AttachTarget::Light(light.clone()), &placement, "", "");
        let fallback = ctx.fallback_collider().clone();
        let target = AttachTarget::Light(light.clone());
        assert!(fallback.borrow().has_attachment(&target));
        assert!(fallback.borrow().attachment_for(&target).unwrap().track_bone.is_empty());

        let component = Shared::new(Collider::new_component());
        ctx.set_interact_collider(Some(component.clone()));
        base.attach_placed(&ctx, target.clone(), &placement, "", "");

        assert!(!fallback.borrow().has_attachment(&target));
        assert_eq!(
            component.borrow().attachment_for(&target).unwrap().track_bone,
            "head"
        );

        base.detach();
        assert!(!component.borrow().has_attachment(&target));
        assert!(!base.is_attached());
    }

    #[test]
    fn test_extents_mark_wrapper_dirty() {
        let env = test_support::environment().1;
        let mut ctx = WrapperContext::new(env);
        let mut base = SubObjectBase::new(&mut ctx, "");
        ctx.dirty_extents = false;

        base.set_box_extents(&mut ctx, Vec3::ZERO, Vec3::ONE);
        assert!(ctx.dirty_extents);

        ctx.dirty_extents = false;
        base.set_box_extents(&mut ctx, Vec3::ZERO, Vec3::ONE);
        assert!(!ctx.dirty_extents);

        base.clear_box_extents(&mut ctx);
        assert!(ctx.dirty_extents);
        assert!(base.box_extents().is_none());
    }

    #[test]
    fn test_live_resource_world_membership() {
        let env = test_support::environment().1;
        let mut ctx = WrapperContext::new(env);
        let world = World::new_shared();
        ctx.world = Some(world.clone());
        let mut base = SubObjectBase::new(&mut ctx, "");

        let mut live: LiveResource<Light> = LiveResource::default();
        let light = live.get_or_create(Light::default);
        live.add_to_world(&ctx);
        live.add_to_world(&ctx);
        assert_eq!(world.borrow().lights.len(), 1);
        assert!(live.get_or_create(Light::default).ptr_eq(&light));

        live.destroy(&ctx, &mut base);
        assert!(world.borrow().lights.is_empty());
        assert!(live.get().is_none());
    }
}
