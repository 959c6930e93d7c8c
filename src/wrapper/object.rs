//! Object wrapper placing a game definition class into a world

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use glam::{DMat4, DVec3, Quat, Vec3};

use super::context::WrapperContext;
use super::events::{WrapperCallback, WrapperEvent};
use super::subobject::{
    BillboardSubObject, ComponentSubObject, EnvMapProbeSubObject, ForceFieldSubObject,
    LightSubObject, NavigationBlockerSubObject, NavigationSpaceSubObject,
    ParticleEmitterSubObject, SpeakerSubObject, SubObject, WorldSubObject,
};
use super::visitor::SubObjectVisitor;
use crate::codec::Color;
use crate::engine::{
    AttachTarget, AttachmentMode, BoxShape, Collider, ColliderAttachment, ColliderKind,
    ColliderResponseType, CollisionFilter, Component, ComponentTexture, Shared, World,
};
use crate::environment::Environment;
use crate::error::{IgdeError, Result};
use crate::gamedef::{GdClass, PropertyType};
use crate::loader::Resource;
use crate::triggers::TriggerTargetList;

/// Places the sub-objects of a game definition class into a world
///
/// The wrapper creates one sub-object per descriptor of its class and of
/// inherited classes once both a world and a class are set. Sub-objects load
/// their resources asynchronously; [`update`](Self::update) delivers finished
/// loads and emits [`WrapperEvent`]s through the callback set with
/// [`set_async_load_finished`](Self::set_async_load_finished).
///
/// A fallback box collider represents the object while no component provides
/// a collider. Its shape follows the box extents of the sub-objects.
pub struct ObjectWrapper {
    ctx: WrapperContext,
    sub_objects: Vec<Box<dyn SubObject>>,
    extents: Option<(Vec3, Vec3)>,
}

impl ObjectWrapper {
    pub fn new(env: Rc<Environment>) -> Self {
        Self {
            ctx: WrapperContext::new(env),
            sub_objects: Vec::new(),
            extents: None,
        }
    }

    /// State shared with the sub-objects
    pub fn context(&self) -> &WrapperContext {
        &self.ctx
    }

    pub fn environment(&self) -> &Rc<Environment> {
        &self.ctx.env
    }

    /// Token identifying this object in collider delegates
    pub fn token(&self) -> u64 {
        self.ctx.token
    }

    pub fn world(&self) -> Option<&Shared<World>> {
        self.ctx.world.as_ref()
    }

    pub fn set_world(&mut self, world: Option<Shared<World>>) {
        if same_world(self.ctx.world.as_ref(), world.as_ref()) {
            return;
        }

        self.destroy_sub_objects();
        self.detach_collider();
        if let Some(old) = self.ctx.world.take() {
            old.borrow_mut().colliders.remove(&self.ctx.fallback_collider);
        }

        self.ctx.world = world;

        if let Some(world) = &self.ctx.world {
            world.borrow_mut().colliders.add(&self.ctx.fallback_collider);
        }

        self.update_visibility();

        if self.ctx.world.is_some() {
            self.create_sub_objects();
        }
    }

    pub fn gd_class(&self) -> Option<&Arc<GdClass>> {
        self.ctx.gd_class.as_ref()
    }

    pub fn set_gd_class(&mut self, gd_class: Option<Arc<GdClass>>) {
        let unchanged = match (&self.ctx.gd_class, &gd_class) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.destroy_sub_objects();

        self.ctx.gd_class = gd_class;
        self.ctx.dirty_extents = true;
        self.ctx.dirty_fallback_shape = true;

        self.update_visibility();
        self.update_collider_response_type();
        self.update_collider_shapes();
        self.update_trigger_targets();

        if self.ctx.world.is_some() {
            self.create_sub_objects();
            self.update_sub_object_triggers();
        }
    }

    /// Set the class by name from the current game definition. Unknown names
    /// clear the class.
    pub fn set_gd_class_name(&mut self, name: &str) {
        let class = self.ctx.env.game_definition().class_named(name);
        if class.is_none() && !name.is_empty() {
            log::warn!("Object {}: unknown class '{}'", self.ctx.token, name);
        }
        self.set_gd_class(class);
    }

    /// Look the class up again after the game definition changed
    pub fn on_game_definition_changed(&mut self) {
        if let Some(name) = self.ctx.gd_class.as_ref().map(|c| c.name.clone()) {
            self.set_gd_class_name(&name);
        }
    }

    pub fn trigger_table(&self) -> Option<&Rc<TriggerTargetList>> {
        self.ctx.trigger_table.as_ref()
    }

    pub fn set_trigger_table(&mut self, table: Option<Rc<TriggerTargetList>>) {
        let unchanged = match (&self.ctx.trigger_table, &table) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return;
        }

        self.ctx.trigger_table = table;
        self.update_trigger_targets();
        self.init_sub_object_triggers();
        self.update_sub_object_triggers();
    }

    pub fn position(&self) -> DVec3 {
        self.ctx.position
    }

    pub fn set_position(&mut self, position: DVec3) {
        if position == self.ctx.position {
            return;
        }

        self.ctx.position = position;
        self.ctx.update_matrices();
        self.ctx.fallback_collider.borrow_mut().position = position;
        self.update_sub_object_geometry();
    }

    pub fn orientation(&self) -> Quat {
        self.ctx.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        if orientation == self.ctx.orientation {
            return;
        }

        self.ctx.orientation = orientation;
        self.ctx.update_matrices();
        self.ctx.fallback_collider.borrow_mut().orientation = orientation;
        self.update_sub_object_geometry();
    }

    pub fn scaling(&self) -> Vec3 {
        self.ctx.scaling
    }

    /// Set the scaling. Components closer to zero than the configured minimum
    /// are clamped to it, keeping their sign; exact zero becomes negative.
    pub fn set_scaling(&mut self, scaling: Vec3) {
        if scaling == self.ctx.scaling {
            return;
        }

        let min = self.ctx.env.config().min_scaling;
        let clamp = |value: f32| {
            if value.abs() > min {
                value
            } else if value > 0.0 {
                min
            } else {
                -min
            }
        };
        self.ctx.scaling = Vec3::new(clamp(scaling.x), clamp(scaling.y), clamp(scaling.z));
        self.ctx.dirty_fallback_shape = true;
        self.ctx.update_matrices();

        self.update_sub_object_geometry();
        self.update_collider_shapes();
    }

    pub fn matrix(&self) -> &DMat4 {
        &self.ctx.matrix
    }

    pub fn inverse_matrix(&self) -> &DMat4 {
        &self.ctx.inverse_matrix
    }

    pub fn visible(&self) -> bool {
        self.ctx.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        if visible != self.ctx.visible {
            self.ctx.visible = visible;
            self.update_visibility();
        }
    }

    pub fn partially_hidden(&self) -> bool {
        self.ctx.partially_hidden
    }

    pub fn set_partially_hidden(&mut self, partially_hidden: bool) {
        if partially_hidden != self.ctx.partially_hidden {
            self.ctx.partially_hidden = partially_hidden;
            self.update_visibility();
        }
    }

    pub fn dynamic_collider(&self) -> bool {
        self.ctx.dynamic_collider
    }

    pub fn set_dynamic_collider(&mut self, dynamic: bool) {
        if dynamic != self.ctx.dynamic_collider {
            self.ctx.dynamic_collider = dynamic;
            self.update_collider_response_type();
        }
    }

    pub fn set_render_layer_mask(&mut self, mask: u32) {
        if mask != self.ctx.render_layer_mask {
            self.ctx.render_layer_mask = mask;
            self.update_sub_object_layer_masks();
        }
    }

    pub fn set_render_env_map_mask(&mut self, mask: u32) {
        if mask != self.ctx.render_env_map_mask {
            self.ctx.render_env_map_mask = mask;
            self.update_sub_object_layer_masks();
        }
    }

    pub fn set_audio_layer_mask(&mut self, mask: u32) {
        if mask != self.ctx.audio_layer_mask {
            self.ctx.audio_layer_mask = mask;
            self.update_sub_object_layer_masks();
        }
    }

    pub fn set_collision_filter(&mut self, filter: CollisionFilter) {
        if filter != self.ctx.collision_filter {
            self.ctx.collision_filter = filter;
            self.update_sub_object_collision_filters();
        }
    }

    pub fn set_collision_filter_particles(&mut self, filter: CollisionFilter) {
        if filter != self.ctx.collision_filter_particles {
            self.ctx.collision_filter_particles = filter;
            self.update_sub_object_collision_filters();
        }
    }

    pub fn set_collision_filter_force_fields(&mut self, filter: CollisionFilter) {
        if filter != self.ctx.collision_filter_force_field {
            self.ctx.collision_filter_force_field = filter;
            self.update_sub_object_collision_filters();
        }
    }

    pub fn set_collision_filter_fallback(&mut self, filter: CollisionFilter) {
        if filter != self.ctx.collision_filter_fallback {
            self.ctx.collision_filter_fallback = filter;
            self.ctx.fallback_collider.borrow_mut().collision_filter = filter;
            self.update_sub_object_collision_filters();
        }
    }

    pub fn set_collision_filter_interact(&mut self, filter: CollisionFilter) {
        if filter != self.ctx.collision_filter_interact {
            self.ctx.collision_filter_interact = filter;
            self.update_sub_object_collision_filters();
        }
    }

    // Properties

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.ctx.properties
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.ctx.properties.insert(key.into(), value.into());
        self.update_properties();
    }

    pub fn set_properties_from(&mut self, properties: BTreeMap<String, String>) {
        self.ctx.properties = properties;
        self.update_properties();
    }

    pub fn remove_property(&mut self, key: &str) {
        if self.ctx.properties.remove(key).is_some() {
            self.update_properties();
        }
    }

    pub fn remove_all_properties(&mut self) {
        if !self.ctx.properties.is_empty() {
            self.ctx.properties.clear();
            self.update_properties();
        }
    }

    /// Texture replacements applied to all components on top of the class
    /// and descriptor textures
    pub fn set_texture_overrides(&mut self, textures: Vec<ComponentTexture>) {
        if textures == self.ctx.texture_overrides {
            return;
        }
        self.ctx.texture_overrides = textures;
        self.reset_component_textures();
    }

    // Extents

    /// Smallest corner of the union of all sub-object box extents
    pub fn box_min_extend(&mut self) -> Vec3 {
        self.box_extents().map_or(Vec3::ZERO, |(min, _)| min)
    }

    /// Largest corner of the union of all sub-object box extents
    pub fn box_max_extend(&mut self) -> Vec3 {
        self.box_extents().map_or(Vec3::ZERO, |(_, max)| max)
    }

    pub fn has_box_extends(&mut self) -> bool {
        self.box_extents().is_some()
    }

    /// Union of all sub-object box extents in object space. Axes thinner
    /// than the degenerate threshold are padded on both sides.
    pub fn box_extents(&mut self) -> Option<(Vec3, Vec3)> {
        if self.ctx.dirty_extents {
            self.ctx.dirty_extents = false;
            self.extents = self.prepare_extents();
        }
        self.extents
    }

    fn prepare_extents(&self) -> Option<(Vec3, Vec3)> {
        let (mut min, mut max) = self
            .sub_objects
            .iter()
            .filter_map(|s| s.box_extents())
            .reduce(|(min_a, max_a), (min_b, max_b)| (min_a.min(min_b), max_a.max(max_b)))?;

        let config = self.ctx.env.config();
        let size = max - min;
        for axis in 0..3 {
            if size[axis] < config.degenerate_extent {
                min[axis] -= config.extent_padding;
                max[axis] += config.extent_padding;
            }
        }
        Some((min, max))
    }

    // Colliders

    /// Interact collider if a component installed one, fallback collider otherwise
    pub fn collider(&self) -> Shared<Collider> {
        self.ctx
            .collider_component
            .clone()
            .unwrap_or_else(|| self.ctx.fallback_collider.clone())
    }

    pub fn fallback_collider(&self) -> &Shared<Collider> {
        &self.ctx.fallback_collider
    }

    /// Component of the interact collider
    pub fn component(&self) -> Option<Shared<Component>> {
        self.ctx.collider_component.as_ref()?.borrow().component.clone()
    }

    pub fn interaction_colliders(&self) -> &[Shared<Collider>] {
        &self.ctx.interaction_colliders
    }

    pub fn is_attached_collider(&self) -> bool {
        self.ctx.parent_collider.is_some()
    }

    pub fn parent_collider(&self) -> Option<&Shared<Collider>> {
        self.ctx.parent_collider.as_ref()
    }

    /// Attach to a component collider copying its rig state
    pub fn attach_collider_rig(&mut self, parent: &Shared<Collider>) -> Result<()> {
        self.check_parent_collider(parent)?;
        self.detach_collider();

        {
            let mut parent = parent.borrow_mut();
            if let Some(component) = &self.ctx.collider_component {
                parent.add_attachment(ColliderAttachment::new(
                    AttachTarget::Collider(component.clone()),
                    AttachmentMode::Rig,
                ));
            }
            parent.add_attachment(ColliderAttachment::new(
                AttachTarget::Collider(self.ctx.fallback_collider.clone()),
                AttachmentMode::Static,
            ));
        }

        self.ctx.parent_collider = Some(parent.clone());
        Ok(())
    }

    /// Attach to a bone of a component collider. An empty bone name marks
    /// the wrapper attached without adding attachments.
    pub fn attach_collider_bone(
        &mut self,
        parent: &Shared<Collider>,
        bone: &str,
        position: Vec3,
        orientation: Quat,
    ) -> Result<()> {
        self.check_parent_collider(parent)?;
        self.detach_collider();

        if !bone.is_empty() {
            let mut parent = parent.borrow_mut();
            let mut targets = Vec::with_capacity(2);
            if let Some(component) = &self.ctx.collider_component {
                targets.push(AttachTarget::Collider(component.clone()));
            }
            targets.push(AttachTarget::Collider(self.ctx.fallback_collider.clone()));

            for target in targets {
                parent.add_attachment(
                    ColliderAttachment::new(target, AttachmentMode::Bone)
                        .with_bone(bone)
                        .with_transform(position, orientation),
                );
            }
            self.ctx.attach_to_bone = bone.to_string();
        }

        self.ctx.parent_collider = Some(parent.clone());
        Ok(())
    }

    fn check_parent_collider(&self, parent: &Shared<Collider>) -> Result<()> {
        if parent.borrow().kind != ColliderKind::Component {
            return Err(IgdeError::invalid_param("parent collider has to be a component collider"));
        }
        let own = parent.ptr_eq(&self.ctx.fallback_collider)
            || self
                .ctx
                .collider_component
                .as_ref()
                .is_some_and(|c| c.ptr_eq(parent));
        if own {
            return Err(IgdeError::invalid_param("object can not attach to its own collider"));
        }
        Ok(())
    }

    /// Detach from the parent collider and restore the collider transform
    pub fn detach_collider(&mut self) {
        let Some(parent) = self.ctx.parent_collider.take() else {
            return;
        };

        {
            let mut parent = parent.borrow_mut();
            parent.remove_attachment(&AttachTarget::Collider(self.ctx.fallback_collider.clone()));
            if let Some(component) = &self.ctx.collider_component {
                parent.remove_attachment(&AttachTarget::Collider(component.clone()));
            }
        }
        self.ctx.attach_to_bone.clear();

        {
            let mut fallback = self.ctx.fallback_collider.borrow_mut();
            fallback.position = self.ctx.position;
            fallback.orientation = self.ctx.orientation;
        }
        self.update_sub_object_geometry();
    }

    /// Install a component collider as interact collider, or restore the
    /// fallback collider with `None`
    pub fn set_interact_collider(&mut self, collider: Option<Shared<Collider>>) {
        self.ctx.set_interact_collider(collider);
    }

    pub fn add_interaction_collider(&mut self, collider: Shared<Collider>) {
        self.ctx.add_interaction_collider(collider);
    }

    pub fn remove_interaction_collider(&mut self, collider: &Shared<Collider>) {
        self.ctx.remove_interaction_collider(collider);
    }

    pub fn collider_user_pointer(&self) -> Option<u64> {
        self.ctx.collider_user_pointer
    }

    /// Opaque value stored in all colliders of this object
    pub fn set_collider_user_pointer(&mut self, user_pointer: Option<u64>) {
        if user_pointer == self.ctx.collider_user_pointer {
            return;
        }

        self.ctx.collider_user_pointer = user_pointer;
        let colliders = self
            .ctx
            .collider_component
            .iter()
            .chain(std::iter::once(&self.ctx.fallback_collider))
            .chain(self.ctx.interaction_colliders.iter());
        for collider in colliders {
            collider.borrow_mut().user_pointer = user_pointer;
        }

        for sub_object in &mut self.sub_objects {
            sub_object.collider_user_pointer_changed(&self.ctx);
        }
    }

    // Outline

    pub fn outline_skin(&self) -> Option<&Resource> {
        self.ctx.outline_skin.as_ref()
    }

    pub fn set_outline_skin(&mut self, skin: Option<Resource>) {
        if skin == self.ctx.outline_skin {
            return;
        }

        self.ctx.outline_skin = skin;
        for sub_object in &mut self.sub_objects {
            sub_object.outline_skin_changed(&self.ctx);
        }
    }

    /// Use the outline skin shared by all editors
    pub fn set_outline_skin_shared_editing(&mut self) {
        let skin = self.ctx.env.outline_skin();
        self.set_outline_skin(Some(skin));
    }

    pub fn outline_color(&self) -> Color {
        self.ctx.outline_color
    }

    pub fn set_outline_color(&mut self, color: Color) {
        self.ctx.outline_color = color;
    }

    // Triggers

    /// Register the values of trigger target properties in the trigger table
    pub fn update_trigger_targets(&mut self) {
        self.ctx.trigger_targets.clear();
        let (Some(table), Some(class)) = (&self.ctx.trigger_table, &self.ctx.gd_class) else {
            return;
        };

        let targets = self
            .ctx
            .properties
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .filter(|(key, _)| {
                class
                    .property_named(key)
                    .is_some_and(|p| p.property_type == PropertyType::TriggerTarget)
            })
            .map(|(_, value)| table.get_named_add_if_missing(value))
            .collect();
        self.ctx.trigger_targets = targets;
    }

    /// Trigger targets named by trigger target properties
    pub fn trigger_targets(&self) -> &[Rc<crate::triggers::TriggerTarget>] {
        &self.ctx.trigger_targets
    }

    /// Re-evaluate the trigger expressions of all sub-objects
    pub fn update_triggerable_properties(&mut self) {
        self.update_sub_object_triggers();
    }

    // Loading

    /// Register the callback receiving load and extent events
    pub fn set_async_load_finished(&mut self, callback: Option<WrapperCallback>) {
        self.ctx.callback = callback;
    }

    /// True once all sub-objects, and objects nested in them, finished loading
    pub fn all_sub_objects_finished_loading(&self) -> bool {
        self.ctx.latch.is_released()
            && self
                .sub_objects
                .iter()
                .all(|s| s.all_sub_objects_finished_loading())
    }

    /// True if any sub-object shows content
    pub fn any_content_visible(&self) -> bool {
        self.ctx.any_content_visible
    }

    /// Deliver finished loads, re-evaluate changed triggers, advance
    /// sub-objects by `elapsed` seconds and refresh the fallback collider
    pub fn update(&mut self, elapsed: f32) {
        self.deliver_finished_loads();

        if self.ctx.trigger_flag.take() {
            self.update_sub_object_triggers();
        }

        for sub_object in &mut self.sub_objects {
            sub_object.update(&mut self.ctx, elapsed);
        }
        self.deliver_finished_loads();

        self.update_collider_shapes();
    }

    // Sub-objects

    pub fn sub_object_count(&self) -> usize {
        self.sub_objects.len()
    }

    pub fn sub_objects(&self) -> impl Iterator<Item = &dyn SubObject> {
        self.sub_objects.iter().map(|s| s.as_ref())
    }

    pub fn visit_sub_objects(&mut self, visitor: &mut dyn SubObjectVisitor) {
        for sub_object in &mut self.sub_objects {
            sub_object.visit(visitor);
        }
    }

    pub fn reset_component_textures(&mut self) {
        for sub_object in &mut self.sub_objects {
            sub_object.reset_component_textures(&self.ctx);
        }
    }

    pub fn reset_physics(&mut self) {
        for sub_object in &mut self.sub_objects {
            sub_object.reset_physics(&self.ctx);
        }
    }

    fn create_sub_objects(&mut self) {
        self.ctx.latch.arm();
        self.ctx.load_succeeded = true;
        self.ctx.load_finished_pending = false;

        if self.ctx.world.is_some() {
            if let Some(class) = self.ctx.gd_class.clone() {
                self.create_sub_objects_of(&class, "", GdClass::FILTER_ALL);
            }
        }
        self.init_sub_object_triggers();

        self.count_down_sentinel();
        self.check_async_load_finished();
    }

    fn create_sub_objects_of(&mut self, class: &GdClass, prefix: &str, filter: u32) {
        if filter & GdClass::FILTER_COMPONENTS != 0 {
            for descriptor in &class.components {
                self.add_sub_object(|ctx| ComponentSubObject::new(ctx, descriptor, prefix));
            }
        }
        if filter & GdClass::FILTER_BILLBOARDS != 0 {
            for descriptor in &class.billboards {
                self.add_sub_object(|ctx| BillboardSubObject::new(ctx, descriptor, prefix));
            }
        }
        if filter & GdClass::FILTER_LIGHTS != 0 {
            for descriptor in &class.lights {
                self.add_sub_object(|ctx| LightSubObject::new(ctx, descriptor, prefix));
            }
        }
        if filter & GdClass::FILTER_SPEAKERS != 0 {
            for descriptor in &class.speakers {
                self.add_sub_object(|ctx| SpeakerSubObject::new(ctx, descriptor, prefix));
            }
        }
        if filter & GdClass::FILTER_PARTICLE_EMITTERS != 0 {
            for descriptor in &class.particle_emitters {
                self.add_sub_object(|ctx| ParticleEmitterSubObject::new(ctx, descriptor, prefix));
            }
        }
        if filter & GdClass::FILTER_FORCE_FIELDS != 0 {
            for descriptor in &class.force_fields {
                self.add_sub_object(|ctx| ForceFieldSubObject::new(ctx, descriptor, prefix));
            }
        }
        if filter & GdClass::FILTER_ENV_MAP_PROBES != 0 {
            for descriptor in &class.env_map_probes {
                self.add_sub_object(|ctx| EnvMapProbeSubObject::new(ctx, descriptor, prefix));
            }
        }
        if filter & GdClass::FILTER_NAVIGATION_SPACES != 0 {
            for descriptor in &class.navigation_spaces {
                self.add_sub_object(|ctx| NavigationSpaceSubObject::new(ctx, descriptor, prefix));
            }
        }
        if filter & GdClass::FILTER_NAVIGATION_BLOCKERS != 0 {
            for descriptor in &class.navigation_blockers {
                self.add_sub_object(|ctx| {
                    NavigationBlockerSubObject::new(ctx, descriptor, prefix)
                });
            }
        }
        if filter & GdClass::FILTER_WORLDS != 0 {
            for descriptor in &class.worlds {
                self.add_sub_object(|ctx| WorldSubObject::new(ctx, descriptor, prefix));
            }
        }

        let filter = filter & class.inherit_sub_objects;
        for inherit in &class.inherits {
            if let Some(inherited) = &inherit.class {
                let prefix = format!("{}{}", prefix, inherit.property_prefix);
                self.create_sub_objects_of(inherited, &prefix, filter);
            }
        }
    }

    fn add_sub_object<S, F>(&mut self, create: F)
    where
        S: SubObject + 'static,
        F: FnOnce(&mut WrapperContext) -> Result<S>,
    {
        self.ctx.latch.add();
        match create(&mut self.ctx) {
            Ok(sub_object) => self.sub_objects.push(Box::new(sub_object)),
            Err(e) => {
                log::error!("Object {}: failed creating sub-object: {}", self.ctx.token, e);
                self.ctx.finish_sub_object_load(false);
            }
        }
    }

    fn destroy_sub_objects(&mut self) {
        for mut sub_object in std::mem::take(&mut self.sub_objects) {
            sub_object.destroy(&mut self.ctx);
        }
        self.ctx.mailbox.borrow_mut().clear();
        self.ctx.load_finished_pending = false;
        self.ctx.dirty_extents = true;
        self.ctx.dirty_fallback_shape = true;
    }

    fn update_properties(&mut self) {
        self.update_trigger_targets();

        if self.ctx.world.is_none() {
            return;
        }

        self.ctx.latch.arm();
        self.ctx.load_succeeded = true;
        self.ctx.load_finished_pending = false;

        for sub_object in &mut self.sub_objects {
            self.ctx.latch.add();
            if let Err(e) = sub_object.update_parameters(&mut self.ctx) {
                log::error!("Object {}: failed updating sub-object: {}", self.ctx.token, e);
                self.ctx.finish_sub_object_load(false);
            }
        }

        self.count_down_sentinel();
        self.check_async_load_finished();

        self.init_sub_object_triggers();
        self.update_sub_object_triggers();
    }

    fn count_down_sentinel(&mut self) {
        if self.ctx.latch.count_down() {
            self.ctx.load_finished_pending = true;
        }
    }

    fn deliver_finished_loads(&mut self) {
        loop {
            let Some(id) = self.ctx.mailbox.borrow_mut().pop_front() else {
                break;
            };
            if let Some(sub_object) = self.sub_objects.iter_mut().find(|s| s.id() == id) {
                sub_object.async_load_finished(&mut self.ctx);
            }
        }
        self.check_async_load_finished();
    }

    fn check_async_load_finished(&mut self) {
        if !self.ctx.load_finished_pending {
            return;
        }
        self.ctx.load_finished_pending = false;

        for sub_object in &mut self.sub_objects {
            sub_object.on_all_sub_objects_finished_loading(&mut self.ctx);
        }
        self.update_sub_object_triggers();
        for sub_object in &mut self.sub_objects {
            sub_object.reattach_to_colliders(&self.ctx);
        }
        self.update_any_content_visible();

        log::debug!("Object {}: all sub-objects finished loading", self.ctx.token);
        self.ctx
            .emit(WrapperEvent::load_finished(self.ctx.token, self.ctx.load_succeeded));
    }

    fn update_any_content_visible(&mut self) {
        let visible = self.sub_objects.iter().any(|s| s.is_content_visible());
        if visible != self.ctx.any_content_visible {
            self.ctx.any_content_visible = visible;
            self.ctx
                .emit(WrapperEvent::any_content_visible_changed(self.ctx.token, visible));
        }
    }

    fn update_visibility(&mut self) {
        let visible = self.ctx.visible && !self.ctx.partially_hidden;
        self.ctx.fallback_collider.borrow_mut().enabled =
            self.ctx.collider_component.is_none() && visible;

        for sub_object in &mut self.sub_objects {
            sub_object.update_visibility(&self.ctx);
        }
    }

    fn update_collider_response_type(&mut self) {
        for sub_object in &mut self.sub_objects {
            sub_object.update_collider_response_type(&self.ctx);
        }

        let response_type = match &self.ctx.collider_component {
            Some(component) => component.borrow().response_type,
            None if self.ctx.dynamic_collider => ColliderResponseType::Dynamic,
            None => ColliderResponseType::Kinematic,
        };

        let mut fallback = self.ctx.fallback_collider.borrow_mut();
        fallback.response_type = response_type;
        fallback.use_local_gravity = response_type != ColliderResponseType::Dynamic;
    }

    /// Rebuild the fallback collider shapes from the scaled sub-object
    /// extents, or the fixed box if there are none
    fn update_collider_shapes(&mut self) {
        if !self.ctx.dirty_fallback_shape {
            return;
        }
        self.ctx.dirty_fallback_shape = false;

        let scaling = self.ctx.scaling;
        let mut shapes: Vec<BoxShape> = self
            .sub_objects
            .iter()
            .filter_map(|s| s.box_extents())
            .map(|(min, max)| {
                BoxShape::new((min + max) * 0.5 * scaling, (max - min) * 0.5 * scaling)
            })
            .collect();

        if shapes.is_empty() {
            let half_extents = self.ctx.env.config().fallback_half_extents;
            shapes.push(BoxShape::new(Vec3::ZERO, Vec3::splat(half_extents)));
        }

        self.ctx.fallback_collider.borrow_mut().shapes = shapes;
    }

    fn update_sub_object_geometry(&mut self) {
        for sub_object in &mut self.sub_objects {
            sub_object.update_geometry(&self.ctx);
        }
    }

    fn update_sub_object_layer_masks(&mut self) {
        for sub_object in &mut self.sub_objects {
            sub_object.update_layer_masks(&self.ctx);
        }
    }

    fn update_sub_object_collision_filters(&mut self) {
        for sub_object in &mut self.sub_objects {
            sub_object.update_collision_filter(&self.ctx);
        }
    }

    fn init_sub_object_triggers(&mut self) {
        for sub_object in &mut self.sub_objects {
            sub_object.init_triggers(&self.ctx);
        }
    }

    fn update_sub_object_triggers(&mut self) {
        for sub_object in &mut self.sub_objects {
            sub_object.update_triggers(&self.ctx);
        }
    }
}

impl Drop for ObjectWrapper {
    fn drop(&mut self) {
        self.detach_collider();
        self.destroy_sub_objects();
        if let Some(world) = self.ctx.world.take() {
            world.borrow_mut().colliders.remove(&self.ctx.fallback_collider);
        }

        for collider in &self.ctx.interaction_colliders {
            collider.borrow_mut().user_pointer = None;
        }
        self.ctx.fallback_collider.borrow_mut().delegate = None;
    }
}

impl std::fmt::Debug for ObjectWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectWrapper")
            .field("ctx", &self.ctx)
            .field("sub_objects", &self.sub_objects.len())
            .finish()
    }
}

fn same_world(a: Option<&Shared<World>>, b: Option<&Shared<World>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.ptr_eq(b),
        (None, None) => true,
        _ => false,
    }
}
