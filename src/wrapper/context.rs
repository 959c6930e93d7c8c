//! Wrapper state shared with sub-objects
//!
//! [`WrapperContext`] holds everything of an object wrapper that sub-objects
//! read or change: transform, visibility, masks, filters, colliders, the
//! property dictionary and the load latch. The wrapper owns the context next
//! to its sub-objects and lends it to them on every call.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use glam::{DMat4, DVec3, Quat, Vec2, Vec3};

use super::async_load::{Mailbox, SubObjectId};
use super::events::{WrapperCallback, WrapperEvent};
use super::latch::LoadLatch;
use crate::codec::{self, Color};
use crate::engine::{
    BoxShape, Collider, ComponentTexture, CollisionFilter, NamedEnum, Shared, World,
};
use crate::environment::Environment;
use crate::gamedef::GdClass;
use crate::loader::Resource;
use crate::triggers::{
    TriggerExpression, TriggerExpressionParser, TriggerListener, TriggerTarget, TriggerTargetList,
};

/// Marks the wrapper for trigger re-evaluation when a bound target changes
#[derive(Debug, Default)]
pub(crate) struct TriggerDirtyFlag {
    dirty: Cell<bool>,
}

impl TriggerDirtyFlag {
    pub fn take(&self) -> bool {
        self.dirty.replace(false)
    }
}

impl TriggerListener for TriggerDirtyFlag {
    fn trigger_target_changed(&self, _target: &TriggerTarget) {
        self.dirty.set(true);
    }
}

pub struct WrapperContext {
    pub(crate) env: Rc<Environment>,
    pub(crate) token: u64,
    pub(crate) world: Option<Shared<World>>,
    pub(crate) gd_class: Option<Arc<GdClass>>,
    pub(crate) properties: BTreeMap<String, String>,

    pub(crate) position: DVec3,
    pub(crate) orientation: Quat,
    pub(crate) scaling: Vec3,
    pub(crate) matrix: DMat4,
    pub(crate) inverse_matrix: DMat4,

    pub(crate) visible: bool,
    pub(crate) partially_hidden: bool,
    pub(crate) dynamic_collider: bool,

    pub(crate) render_layer_mask: u32,
    pub(crate) render_env_map_mask: u32,
    pub(crate) audio_layer_mask: u32,

    pub(crate) collision_filter: CollisionFilter,
    pub(crate) collision_filter_particles: CollisionFilter,
    pub(crate) collision_filter_force_field: CollisionFilter,
    pub(crate) collision_filter_fallback: CollisionFilter,
    pub(crate) collision_filter_interact: CollisionFilter,

    pub(crate) fallback_collider: Shared<Collider>,
    pub(crate) collider_component: Option<Shared<Collider>>,
    pub(crate) interaction_colliders: Vec<Shared<Collider>>,
    pub(crate) collider_user_pointer: Option<u64>,
    pub(crate) parent_collider: Option<Shared<Collider>>,
    pub(crate) attach_to_bone: String,

    pub(crate) trigger_table: Option<Rc<TriggerTargetList>>,
    pub(crate) trigger_targets: Vec<Rc<TriggerTarget>>,
    pub(crate) trigger_flag: Rc<TriggerDirtyFlag>,

    pub(crate) outline_skin: Option<Resource>,
    pub(crate) outline_color: Color,
    /// Texture replacements applied on top of class and descriptor textures
    pub(crate) texture_overrides: Vec<ComponentTexture>,

    pub(crate) latch: LoadLatch,
    pub(crate) load_finished_pending: bool,
    /// False once any sub-object of the current round failed loading
    pub(crate) load_succeeded: bool,
    pub(crate) mailbox: Mailbox,
    next_sub_object_id: u64,

    pub(crate) dirty_extents: bool,
    pub(crate) dirty_fallback_shape: bool,
    pub(crate) any_content_visible: bool,
    pub(crate) callback: Option<WrapperCallback>,
}

impl WrapperContext {
    pub(crate) fn new(env: Rc<Environment>) -> Self {
        let config = env.config().clone();
        let token = env.next_object_token();

        let mut fallback = Collider::new_volume();
        fallback.enabled = true;
        fallback.use_local_gravity = true;
        fallback.mass = config.fallback_mass;
        fallback.shapes = vec![BoxShape::new(
            Vec3::ZERO,
            Vec3::splat(config.fallback_half_extents),
        )];
        fallback.delegate = Some(token);

        Self {
            env,
            token,
            world: None,
            gd_class: None,
            properties: BTreeMap::new(),
            position: DVec3::ZERO,
            orientation: Quat::IDENTITY,
            scaling: Vec3::ONE,
            matrix: DMat4::IDENTITY,
            inverse_matrix: DMat4::IDENTITY,
            visible: true,
            partially_hidden: false,
            dynamic_collider: false,
            render_layer_mask: config.render_layer_mask,
            render_env_map_mask: config.render_env_map_mask,
            audio_layer_mask: config.audio_layer_mask,
            collision_filter: CollisionFilter::default(),
            collision_filter_particles: CollisionFilter::default(),
            collision_filter_force_field: CollisionFilter::default(),
            collision_filter_fallback: CollisionFilter::default(),
            collision_filter_interact: CollisionFilter::default(),
            fallback_collider: Shared::new(fallback),
            collider_component: None,
            interaction_colliders: Vec::new(),
            collider_user_pointer: None,
            parent_collider: None,
            attach_to_bone: String::new(),
            trigger_table: None,
            trigger_targets: Vec::new(),
            trigger_flag: Rc::new(TriggerDirtyFlag::default()),
            outline_skin: None,
            outline_color: config.outline_color,
            texture_overrides: Vec::new(),
            latch: LoadLatch::new(),
            load_finished_pending: false,
            load_succeeded: true,
            mailbox: Mailbox::default(),
            next_sub_object_id: 1,
            dirty_extents: true,
            dirty_fallback_shape: true,
            any_content_visible: false,
            callback: None,
        }
    }

    pub fn environment(&self) -> &Rc<Environment> {
        &self.env
    }

    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn world(&self) -> Option<&Shared<World>> {
        self.world.as_ref()
    }

    pub fn gd_class(&self) -> Option<&Arc<GdClass>> {
        self.gd_class.as_ref()
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn scaling(&self) -> Vec3 {
        self.scaling
    }

    /// Object to world matrix
    pub fn matrix(&self) -> &DMat4 {
        &self.matrix
    }

    pub fn inverse_matrix(&self) -> &DMat4 {
        &self.inverse_matrix
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn partially_hidden(&self) -> bool {
        self.partially_hidden
    }

    pub fn dynamic_collider(&self) -> bool {
        self.dynamic_collider
    }

    /// Visibility of a sub-object honoring its partial hide flag
    pub fn is_visible_with(&self, partial_hide: bool) -> bool {
        if partial_hide {
            self.visible && !self.partially_hidden
        } else {
            self.visible
        }
    }

    pub fn render_layer_mask(&self) -> u32 {
        self.render_layer_mask
    }

    pub fn render_env_map_mask(&self) -> u32 {
        self.render_env_map_mask
    }

    pub fn audio_layer_mask(&self) -> u32 {
        self.audio_layer_mask
    }

    pub fn collision_filter(&self) -> CollisionFilter {
        self.collision_filter
    }

    pub fn collision_filter_particles(&self) -> CollisionFilter {
        self.collision_filter_particles
    }

    pub fn collision_filter_force_field(&self) -> CollisionFilter {
        self.collision_filter_force_field
    }

    pub fn collision_filter_interact(&self) -> CollisionFilter {
        self.collision_filter_interact
    }

    pub fn fallback_collider(&self) -> &Shared<Collider> {
        &self.fallback_collider
    }

    /// Interact collider installed by a component sub-object
    pub fn collider_component(&self) -> Option<&Shared<Collider>> {
        self.collider_component.as_ref()
    }

    /// Collider component sub-objects attach to, unless it is `exclude`
    pub fn attachable_collider_component(
        &self,
        exclude: Option<&Shared<Collider>>,
    ) -> Option<&Shared<Collider>> {
        self.collider_component
            .as_ref()
            .filter(|collider| exclude.map_or(true, |e| !e.ptr_eq(collider)))
    }

    pub fn trigger_table(&self) -> Option<&Rc<TriggerTargetList>> {
        self.trigger_table.as_ref()
    }

    pub fn outline_skin(&self) -> Option<&Resource> {
        self.outline_skin.as_ref()
    }

    pub fn outline_color(&self) -> Color {
        self.outline_color
    }

    /// Texture override of the given model texture
    pub fn texture_override(&self, name: &str) -> Option<&ComponentTexture> {
        self.texture_overrides.iter().find(|t| t.name == name)
    }

    /// Property value from the dictionary, falling back to the class default
    pub fn property_value(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.properties.get(name) {
            return Some(value);
        }
        self.gd_class.as_ref()?.default_property_value(name)
    }

    /// Typed property access for names relative to `prefix`
    pub fn properties<'a>(&'a self, prefix: &'a str) -> Properties<'a> {
        Properties { ctx: self, prefix }
    }

    pub(crate) fn next_sub_object_id(&mut self) -> SubObjectId {
        let id = SubObjectId(self.next_sub_object_id);
        self.next_sub_object_id += 1;
        id
    }

    /// Count a finished sub-object load down
    pub(crate) fn finish_sub_object_load(&mut self, success: bool) {
        if !success {
            log::debug!("Object {}: a sub-object failed loading resources", self.token);
            self.load_succeeded = false;
        }
        if self.latch.count_down() {
            self.load_finished_pending = true;
        }
    }

    pub(crate) fn sub_object_extents_dirty(&mut self) {
        self.dirty_extents = true;
        self.dirty_fallback_shape = true;
        self.emit(WrapperEvent::extends_changed(self.token));
    }

    pub(crate) fn emit(&self, event: WrapperEvent) {
        if let Some(callback) = &self.callback {
            callback(&event);
        }
    }

    pub(crate) fn update_matrices(&mut self) {
        self.matrix = DMat4::from_scale_rotation_translation(
            self.scaling.as_dvec3(),
            self.orientation.as_dquat(),
            self.position,
        );
        self.inverse_matrix = self.matrix.inverse();
    }

    /// Install `collider` as interact collider, handing over user pointer
    /// and delegate from the previous one
    pub(crate) fn set_interact_collider(&mut self, collider: Option<Shared<Collider>>) {
        if let Some(current) = self.collider_component.take() {
            let mut current = current.borrow_mut();
            current.delegate = None;
            current.user_pointer = None;
            self.fallback_collider.borrow_mut().enabled = self.visible && !self.partially_hidden;
        }

        for interaction in &self.interaction_colliders {
            let mut interaction = interaction.borrow_mut();
            interaction.delegate = None;
            interaction.user_pointer = None;
        }

        let Some(collider) = collider else {
            return;
        };

        let user_pointer = {
            let mut fallback = self.fallback_collider.borrow_mut();
            fallback.enabled = false;
            fallback.user_pointer
        };

        {
            let mut installed = collider.borrow_mut();
            installed.delegate = Some(self.token);
            installed.user_pointer = user_pointer;
        }

        for interaction in &self.interaction_colliders {
            let mut interaction = interaction.borrow_mut();
            interaction.delegate = Some(self.token);
            interaction.user_pointer = user_pointer;
        }

        self.collider_component = Some(collider);
    }

    pub(crate) fn add_interaction_collider(&mut self, collider: Shared<Collider>) {
        let user_pointer = self.fallback_collider.borrow().user_pointer;
        {
            let mut added = collider.borrow_mut();
            added.delegate = Some(self.token);
            added.user_pointer = user_pointer;
        }
        self.interaction_colliders.push(collider);
    }

    pub(crate) fn remove_interaction_collider(&mut self, collider: &Shared<Collider>) {
        {
            let mut removed = collider.borrow_mut();
            removed.delegate = None;
            removed.user_pointer = None;
        }
        self.interaction_colliders.retain(|c| !c.ptr_eq(collider));
    }

    /// Parse the trigger expression stored in property `name` and bind it to
    /// the trigger table. Empty without a table or value.
    pub(crate) fn create_trigger_expression(&self, name: &str) -> TriggerExpression {
        let Some(table) = &self.trigger_table else {
            return TriggerExpression::new();
        };
        let Some(text) = self.property_value(name).filter(|t| !t.trim().is_empty()) else {
            return TriggerExpression::new();
        };

        let mut expression = match TriggerExpressionParser::lenient().string_to_expression(text) {
            Ok(expression) => expression,
            Err(e) => {
                log::warn!("Trigger expression of property '{}' ignored: {}", name, e);
                return TriggerExpression::new();
            }
        };

        let listener: Rc<dyn TriggerListener> = self.trigger_flag.clone();
        expression.link_targets(table, &listener);
        expression
    }
}

impl std::fmt::Debug for WrapperContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrapperContext")
            .field("token", &self.token)
            .field("class", &self.gd_class.as_ref().map(|c| c.name.as_str()))
            .field("position", &self.position)
            .field("visible", &self.visible)
            .field("pending_loads", &self.latch.pending())
            .finish()
    }
}

/// Typed view on wrapper properties below a prefix
///
/// Empty property names yield the default. Malformed values are logged and
/// yield the default too.
#[derive(Clone, Copy)]
pub struct Properties<'a> {
    ctx: &'a WrapperContext,
    prefix: &'a str,
}

impl<'a> Properties<'a> {
    pub fn full_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub fn raw(&self, name: &str) -> Option<&'a str> {
        if name.is_empty() {
            return None;
        }
        self.ctx.property_value(&self.full_name(name))
    }

    fn decode<T>(&self, name: &str, default: T, decoder: fn(&str) -> Option<T>) -> T {
        let Some(value) = self.raw(name) else {
            return default;
        };
        match decoder(value) {
            Some(decoded) => decoded,
            None => {
                log::warn!(
                    "Malformed value '{}' of property '{}', using default",
                    value,
                    self.full_name(name)
                );
                default
            }
        }
    }

    pub fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or(default).to_string()
    }

    pub fn vector(&self, name: &str, default: Vec3) -> Vec3 {
        self.decode(name, default, codec::decode_vector)
    }

    pub fn vector2(&self, name: &str, default: Vec2) -> Vec2 {
        self.decode(name, default, codec::decode_vector2)
    }

    pub fn color3(&self, name: &str, default: Color) -> Color {
        self.decode(name, default, codec::decode_color3)
    }

    pub fn color4(&self, name: &str, default: Color) -> Color {
        self.decode(name, default, codec::decode_color4)
    }

    pub fn boolean(&self, name: &str, default: bool) -> bool {
        self.decode(name, default, codec::decode_bool)
    }

    pub fn float(&self, name: &str, default: f32) -> f32 {
        self.decode(name, default, codec::decode_float)
    }

    pub fn int(&self, name: &str, default: i32) -> i32 {
        self.decode(name, default, codec::decode_int)
    }

    /// Orientation from Euler angles in degrees
    pub fn rotation(&self, name: &str, default_degrees: Vec3) -> Quat {
        codec::euler_to_quat(self.vector(name, default_degrees))
    }

    /// Enumeration by name. Unknown names fall back to the default.
    pub fn named_enum<T: NamedEnum>(&self, name: &str, default: T) -> T {
        self.decode(name, default, T::from_name)
    }

    /// Trigger expression stored in a property, bound to the trigger table
    pub fn trigger_expression(&self, name: &str) -> TriggerExpression {
        if name.is_empty() {
            return TriggerExpression::new();
        }
        self.ctx.create_trigger_expression(&self.full_name(name))
    }
}
