use std::collections::BTreeMap;

use glam::{Vec2, Vec3};

use super::{Attachment, LoadRound, SubObject, SubObjectBase, SubObjectKind};
use crate::engine::{
    Animator, AnimatorController, AttachTarget, AttachmentMode, Collider, ColliderAttachment,
    ColliderResponseType, Component, ComponentTexture, MovementHint, Shared, TexCoordTransform,
};
use crate::error::Result;
use crate::gamedef::{ComponentProperty, GdComponent, GdTexture};
use crate::loader::{ModelInfo, Resource, ResourceType, RigInfo};
use crate::wrapper::animator_file;
use crate::wrapper::context::WrapperContext;
use crate::wrapper::visitor::SubObjectVisitor;

#[derive(Debug, Default)]
struct ResourcePaths {
    model: String,
    skin: String,
    rig: String,
    occlusion_mesh: String,
    audio_model: String,
    animation: String,
}

/// Results of a finished load round, consumed once all sub-objects loaded
#[derive(Debug, Default)]
struct LoadedResources {
    model: Option<Resource>,
    skin: Option<Resource>,
    skin_path_given: bool,
    rig: Option<Resource>,
    occlusion_mesh: Option<Resource>,
    audio_model: Option<Resource>,
    animation: Option<Resource>,
}

/// Component sub-object
///
/// Owns two colliders. The primary collider carries the component and
/// becomes the wrapper's interact collider if none is installed yet. The
/// kinematic interaction collider is rig-attached to it and carries an
/// invisible component using the model collision rig, so physics queries hit
/// the model even if the authored rig has no shapes.
///
/// Unlike the other kinds the component is only built once every sub-object
/// of the wrapper finished loading.
#[derive(Debug)]
pub struct ComponentSubObject {
    base: SubObjectBase,
    descriptor: GdComponent,
    load: LoadRound,
    paths: ResourcePaths,
    texture_skin_paths: Vec<String>,
    loaded: Option<LoadedResources>,
    texture_skins: BTreeMap<String, Resource>,

    collider: Shared<Collider>,
    collider_interaction: Shared<Collider>,
    colliders_added_to_world: bool,
    component: Option<Shared<Component>>,
    component_interaction: Option<Shared<Component>>,
    outline_component: Option<Shared<Component>>,
    added_to_world: bool,

    animator_path: String,
    move_name: String,
    playback_controller: Option<usize>,
    render_env_map: bool,
    affects_audio: bool,
    light_shadow_ignore: bool,
    can_interact: bool,
}

impl ComponentSubObject {
    pub(crate) fn new(
        ctx: &mut WrapperContext,
        descriptor: &GdComponent,
        prefix: &str,
    ) -> Result<Self> {
        let mut collider = Collider::new_component();
        collider.enabled = false;
        collider.mass = ctx.fallback_collider().borrow().mass;
        let collider = Shared::new(collider);

        let mut interaction = Collider::new_component();
        interaction.enabled = false;
        interaction.response_type = ColliderResponseType::Kinematic;
        interaction.use_local_gravity = true;
        let interaction = Shared::new(interaction);

        collider.borrow_mut().add_attachment(
            ColliderAttachment::new(
                AttachTarget::Collider(interaction.clone()),
                AttachmentMode::Rig,
            )
            .with_no_scaling(true),
        );

        let mut colliders_added_to_world = false;
        if let Some(world) = ctx.world() {
            let mut world = world.borrow_mut();
            world.colliders.add(&collider);
            world.colliders.add(&interaction);
            colliders_added_to_world = true;
        }

        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            load: LoadRound::default(),
            paths: ResourcePaths::default(),
            texture_skin_paths: Vec::new(),
            loaded: None,
            texture_skins: BTreeMap::new(),
            collider,
            collider_interaction: interaction,
            colliders_added_to_world,
            component: None,
            component_interaction: None,
            outline_component: None,
            added_to_world: false,
            animator_path: String::new(),
            move_name: String::new(),
            playback_controller: None,
            render_env_map: false,
            affects_audio: false,
            light_shadow_ignore: false,
            can_interact: false,
        };

        sub_object.update_collision_filter(ctx);
        sub_object.update_geometry(ctx);
        sub_object.update_collider_response_type(ctx);
        sub_object.load_resources(ctx);
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdComponent {
        &self.descriptor
    }

    pub fn component(&self) -> Option<&Shared<Component>> {
        self.component.as_ref()
    }

    /// Invisible component of the interaction collider
    pub fn interaction_component(&self) -> Option<&Shared<Component>> {
        self.component_interaction.as_ref()
    }

    pub fn outline_component(&self) -> Option<&Shared<Component>> {
        self.outline_component.as_ref()
    }

    pub fn collider(&self) -> &Shared<Collider> {
        &self.collider
    }

    pub fn interaction_collider(&self) -> &Shared<Collider> {
        &self.collider_interaction
    }

    /// Index of the animator controller advanced by [`SubObject::update`]
    pub fn playback_controller(&self) -> Option<usize> {
        self.playback_controller
    }

    /// True if the collider can hit model geometry or rig shapes
    pub fn can_interact(&self) -> bool {
        self.can_interact
    }

    pub fn render_env_map(&self) -> bool {
        self.render_env_map
    }

    pub fn affects_audio(&self) -> bool {
        self.affects_audio
    }

    pub fn light_shadow_ignore(&self) -> bool {
        self.light_shadow_ignore
    }

    fn load_resources(&mut self, ctx: &mut WrapperContext) {
        let d = &self.descriptor;
        {
            let props = self.base.props(ctx);
            self.paths = ResourcePaths {
                model: props.string(d.property_name(ComponentProperty::Model), &d.model_path),
                skin: props.string(d.property_name(ComponentProperty::Skin), &d.skin_path),
                rig: props.string(d.property_name(ComponentProperty::Rig), &d.rig_path),
                occlusion_mesh: props.string(
                    d.property_name(ComponentProperty::OcclusionMesh),
                    &d.occlusion_mesh_path,
                ),
                audio_model: props.string(
                    d.property_name(ComponentProperty::AudioModel),
                    &d.audio_model_path,
                ),
                animation: props.string(
                    d.property_name(ComponentProperty::Animation),
                    &d.animation_path,
                ),
            };
        }

        let mut texture_skin_paths: Vec<String> =
            d.textures.iter().map(|t| t.skin_path.clone()).collect();
        if let Some(class) = ctx.gd_class() {
            texture_skin_paths.extend(
                class
                    .deep_component_textures()
                    .into_iter()
                    .map(|t| t.skin_path),
            );
        }
        texture_skin_paths.retain(|path| !path.is_empty());
        texture_skin_paths.sort();
        texture_skin_paths.dedup();
        self.texture_skin_paths = texture_skin_paths;

        let load = self.load.start(&self.base, ctx);
        let env = ctx.environment();
        let p = &self.paths;
        load.request(env, &p.model, ResourceType::Model);
        load.request(env, &p.skin, ResourceType::Skin);
        load.request(env, &p.rig, ResourceType::Rig);
        load.request(env, &p.occlusion_mesh, ResourceType::OcclusionMesh);
        load.request(env, &p.audio_model, ResourceType::AudioModel);
        load.request(env, &p.animation, ResourceType::Animation);
        for path in &self.texture_skin_paths {
            load.request(env, path, ResourceType::Skin);
        }

        self.async_load_finished(ctx);
    }

    /// Shown once any component of the wrapper installed an interact
    /// collider, not necessarily this one. Partial hiding applies regardless
    /// of the descriptor.
    fn is_visible(&self, ctx: &WrapperContext) -> bool {
        ctx.collider_component().is_some() && ctx.visible() && !ctx.partially_hidden()
    }

    fn scaling(&self, ctx: &WrapperContext) -> Vec3 {
        if self.descriptor.do_not_scale {
            Vec3::ONE
        } else {
            ctx.scaling()
        }
    }

    fn update_component(&mut self, ctx: &mut WrapperContext, loaded: LoadedResources) {
        let env = ctx.environment().clone();

        let model = loaded
            .model
            .or_else(|| ctx.gd_class().and_then(|_| env.default_model()));
        let face_count = model
            .as_ref()
            .and_then(Resource::as_model)
            .map_or(0, |info| info.face_count);
        let Some(model) = model.filter(|_| face_count > 0) else {
            self.release_outline_component(ctx);
            self.destroy_component(ctx);
            return;
        };

        let use_error_skin = loaded.skin_path_given && ctx.gd_class().is_some();
        let skin = loaded
            .skin
            .or_else(|| use_error_skin.then(|| env.error_skin()));

        let (rig, can_interact) = match loaded
            .rig
            .filter(|rig| rig.as_rig().is_some_and(RigInfo::has_collision_shapes))
        {
            Some(rig) => (rig, true),
            None => (env.model_collision_rig(), face_count > 0),
        };
        self.can_interact = can_interact;

        if can_interact && ctx.collider_component().is_none() {
            ctx.set_interact_collider(Some(self.collider.clone()));
            ctx.add_interaction_collider(self.collider_interaction.clone());
            let visible = self.is_visible(ctx);
            self.collider.borrow_mut().enabled = visible;
            self.collider_interaction.borrow_mut().enabled = visible;
        }

        let d = &self.descriptor;
        let (animator_path, move_name, controller_name) = {
            let props = self.base.props(ctx);
            self.render_env_map = props.boolean(
                d.property_name(ComponentProperty::RenderEnvMap),
                d.render_env_map,
            );
            self.affects_audio = props.boolean(
                d.property_name(ComponentProperty::AffectsAudio),
                d.affects_audio,
            );
            self.light_shadow_ignore = props.boolean(
                d.property_name(ComponentProperty::LightShadowIgnore),
                d.light_shadow_ignore,
            );
            (
                props.string(d.property_name(ComponentProperty::Animator), &d.animator_path),
                props.string(d.property_name(ComponentProperty::Move), &d.move_name),
                props.string(
                    d.property_name(ComponentProperty::PlaybackController),
                    &d.playback_controller,
                ),
            )
        };

        let component = match &self.component {
            Some(component) => component.clone(),
            None => {
                let mut component = Component::new();
                component.movement_hint = if self.descriptor.is_static {
                    MovementHint::Stationary
                } else {
                    MovementHint::Dynamic
                };
                let component = Shared::new(component);
                self.component = Some(component.clone());
                self.update_geometry(ctx);
                self.update_visibility(ctx);
                component
            }
        };

        let interaction = match &self.component_interaction {
            Some(interaction) => interaction.clone(),
            None => {
                let mut interaction = Component::new();
                interaction.movement_hint = component.borrow().movement_hint;
                interaction.rig = Some(env.model_collision_rig());
                interaction.visible = false;
                let interaction = Shared::new(interaction);
                self.component_interaction = Some(interaction.clone());
                interaction
            }
        };

        let (model_changed, skin_changed, rig_changed, animation_changed) = {
            let current = component.borrow();
            let current_animation = current.animator.as_ref().and_then(|a| a.animation.clone());
            (
                current.model.as_ref() != Some(&model),
                current.skin != skin,
                current.rig.as_ref() != Some(&rig),
                current_animation != loaded.animation,
            )
        };

        {
            let scaling = self.scaling(ctx);
            let mut current = component.borrow_mut();
            current.model = Some(model.clone());
            current.skin = skin.clone();
            current.rig = Some(rig.clone());
            current.occlusion_mesh = loaded.occlusion_mesh;
            current.audio_model = loaded.audio_model;
            current.light_shadow_ignore = self.light_shadow_ignore;
            current.scaling = scaling;
        }
        {
            let mut interaction = interaction.borrow_mut();
            interaction.model = Some(model.clone());
            interaction.skin = skin;
        }

        self.update_layer_masks(ctx);

        if model_changed || skin_changed {
            self.update_textures(ctx);
        }

        if model_changed || skin_changed || rig_changed {
            {
                let mut collider = self.collider.borrow_mut();
                collider.component = Some(component.clone());
                collider.rig = Some(rig.clone());
            }
            self.collider_interaction.borrow_mut().component = Some(interaction);
        }

        if model_changed {
            let extents = model.as_model().and_then(ModelInfo::extents);
            match extents {
                Some((min, max)) if !self.descriptor.do_not_scale && self.is_content_visible() => {
                    self.base.set_box_extents(ctx, min, max);
                }
                _ => self.base.clear_box_extents(ctx),
            }
        }

        if animator_path != self.animator_path || animation_changed || move_name != self.move_name
        {
            let animator = self.create_animator(
                ctx,
                &animator_path,
                &move_name,
                &controller_name,
                loaded.animation.as_ref(),
                &rig,
            );
            self.playback_controller = animator
                .as_ref()
                .and_then(|a| a.controller_index(&controller_name));
            self.animator_path = animator_path;
            self.move_name = move_name;
            component.borrow_mut().animator = animator;
        }

        if model_changed || rig_changed {
            component.borrow_mut().reset_bones();
        }

        if let Some(animator) = component.borrow_mut().animator.as_mut() {
            animator.apply();
        }

        if !self.added_to_world {
            if let Some(world) = ctx.world() {
                world.borrow_mut().components.add(&component);
                self.added_to_world = true;
            }
        }
        if self.added_to_world && !self.base.is_attached() {
            self.attach_to_collider(ctx);
        }
    }

    /// Animator loaded from `path`, or a single controller animator playing
    /// `move_name` of the animation if no path is set
    fn create_animator(
        &self,
        ctx: &WrapperContext,
        path: &str,
        move_name: &str,
        controller_name: &str,
        animation: Option<&Resource>,
        rig: &Resource,
    ) -> Option<Animator> {
        if !path.is_empty() {
            let vfs = ctx.environment().vfs();
            if !vfs.exists(path) {
                return None;
            }
            return match vfs
                .read_to_string(path)
                .and_then(|text| animator_file::parse_animator(path, &text))
            {
                Ok(mut animator) => {
                    animator.animation = animation.cloned();
                    Some(animator)
                }
                Err(e) => {
                    log::error!("Failed loading animator '{}': {}", path, e);
                    None
                }
            };
        }

        let animation = animation?;
        let playtime = animation.as_animation()?.move_named(move_name)?.playtime;
        Some(Animator {
            path: String::new(),
            animation: Some(animation.clone()),
            rig: Some(rig.clone()),
            move_name: move_name.to_string(),
            controllers: vec![AnimatorController {
                name: controller_name.to_string(),
                minimum: 0.0,
                maximum: playtime,
                value: 0.0,
                clamp: false,
            }],
            apply_count: 0,
        })
    }

    /// Assign per-texture skins, tints and transforms. Wrapper overrides win
    /// over class textures, class textures over descriptor textures.
    fn update_textures(&self, ctx: &WrapperContext) {
        let Some(component) = &self.component else {
            return;
        };
        let mut component = component.borrow_mut();
        let Some(model) = component.model.clone() else {
            return;
        };
        let Some(info) = model.as_model() else {
            return;
        };

        let class_textures = ctx
            .gd_class()
            .map(|class| class.deep_component_textures())
            .unwrap_or_default();

        component.textures = info
            .textures
            .iter()
            .map(|name| {
                if let Some(texture) = ctx.texture_override(name) {
                    return texture.clone();
                }

                let mut texture = ComponentTexture::new(name.clone());
                let gd_texture = class_textures
                    .iter()
                    .find(|t| &t.name == name)
                    .or_else(|| self.descriptor.texture_named(name));
                if let Some(gd_texture) = gd_texture {
                    texture.skin = self.texture_skins.get(&gd_texture.skin_path).cloned();
                    texture.tint = gd_texture.tint;
                    texture.transform = tex_coord_transform(gd_texture);
                }
                texture
            })
            .collect();
    }

    fn update_outline_component(&mut self, ctx: &WrapperContext) {
        self.release_outline_component(ctx);

        let (Some(outline_skin), Some(component), Some(world)) =
            (ctx.outline_skin(), &self.component, ctx.world())
        else {
            return;
        };

        let outline = {
            let component = component.borrow();
            let Some(model) = component.model.clone() else {
                return;
            };

            let mut outline = Component::new();
            outline.rig = component.rig.clone();
            outline.movement_hint = MovementHint::Dynamic;
            outline.textures = model
                .as_model()
                .map(|info| {
                    info.textures
                        .iter()
                        .map(|name| {
                            let mut texture = ComponentTexture::new(name.clone());
                            if texture_has_skin(&component, name) {
                                texture.skin = Some(outline_skin.clone());
                            }
                            texture
                        })
                        .collect()
                })
                .unwrap_or_default();
            outline.model = Some(model);
            outline.scaling = self.scaling(ctx);
            outline.visible = component.visible;
            outline.layer_mask = component.layer_mask;
            Shared::new(outline)
        };

        world.borrow_mut().components.add(&outline);
        self.collider.borrow_mut().add_attachment(ColliderAttachment::new(
            AttachTarget::Component(outline.clone()),
            AttachmentMode::Rig,
        ));
        self.outline_component = Some(outline);
    }

    fn release_outline_component(&mut self, ctx: &WrapperContext) {
        let Some(outline) = self.outline_component.take() else {
            return;
        };
        self.collider
            .borrow_mut()
            .remove_attachment(&AttachTarget::Component(outline.clone()));
        if let Some(world) = ctx.world() {
            world.borrow_mut().components.remove(&outline);
        }
    }

    fn destroy_component(&mut self, ctx: &mut WrapperContext) {
        if let Some(component) = self.component.take() {
            let is_interact_collider = ctx
                .collider_component()
                .is_some_and(|collider| collider.ptr_eq(&self.collider));
            if is_interact_collider {
                ctx.set_interact_collider(None);
                ctx.remove_interaction_collider(&self.collider_interaction);
                self.collider.borrow_mut().enabled = false;
                self.collider_interaction.borrow_mut().enabled = false;
            }
            self.can_interact = false;

            self.base.clear_box_extents(ctx);
            self.base.detach();
            self.playback_controller = None;
            self.animator_path.clear();
            self.move_name.clear();

            if self.added_to_world {
                if let Some(world) = ctx.world() {
                    world.borrow_mut().components.remove(&component);
                }
                self.added_to_world = false;
            }
            self.collider.borrow_mut().component = None;
        }

        if self.component_interaction.take().is_some() {
            self.collider_interaction.borrow_mut().component = None;
        }
    }

    fn attach_to_collider(&mut self, ctx: &WrapperContext) {
        self.base.detach();
        if self.descriptor.attach_target {
            return;
        }

        let d = &self.descriptor;
        let (position, orientation) = {
            let props = self.base.props(ctx);
            (
                props.vector(
                    d.property_name(ComponentProperty::AttachPosition),
                    d.placement.position,
                ),
                props.rotation(
                    d.property_name(ComponentProperty::AttachRotation),
                    d.placement.rotation,
                ),
            )
        };

        self.base.attach(
            ctx,
            Attachment {
                target: AttachTarget::Collider(self.collider.clone()),
                position,
                orientation,
                bone: &d.placement.bone_name,
                no_scaling: true,
            },
            Some(&self.collider),
        );
    }
}

impl SubObject for ComponentSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::Component
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        self.load_resources(ctx);
        Ok(())
    }

    fn async_load_finished(&mut self, ctx: &mut WrapperContext) {
        let Some(success) = self.load.take_completion() else {
            return;
        };

        let load = &self.load;
        let p = &self.paths;
        self.loaded = Some(LoadedResources {
            model: load.get(&p.model, ResourceType::Model),
            skin: load.get(&p.skin, ResourceType::Skin),
            skin_path_given: !p.skin.is_empty(),
            rig: load.get(&p.rig, ResourceType::Rig),
            occlusion_mesh: load.get(&p.occlusion_mesh, ResourceType::OcclusionMesh),
            audio_model: load.get(&p.audio_model, ResourceType::AudioModel),
            animation: load.get(&p.animation, ResourceType::Animation),
        });
        self.texture_skins = self
            .texture_skin_paths
            .iter()
            .filter_map(|path| {
                load.get(path, ResourceType::Skin)
                    .map(|skin| (path.clone(), skin))
            })
            .collect();
        self.load.cancel();

        ctx.finish_sub_object_load(success);
    }

    fn on_all_sub_objects_finished_loading(&mut self, ctx: &mut WrapperContext) {
        if let Some(loaded) = self.loaded.take() {
            self.update_component(ctx, loaded);
        }
        self.update_visibility(ctx);
        self.update_outline_component(ctx);
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        let visible = self.is_visible(ctx);
        self.collider.borrow_mut().enabled = visible;
        self.collider_interaction.borrow_mut().enabled = visible;
        if let Some(component) = &self.component {
            component.borrow_mut().visible = visible;
        }
        if let Some(outline) = &self.outline_component {
            outline.borrow_mut().visible = visible;
        }
    }

    fn update_layer_masks(&mut self, ctx: &WrapperContext) {
        let mut mask = ctx.render_layer_mask();
        if self.render_env_map {
            mask |= ctx.render_env_map_mask();
        }
        if self.affects_audio {
            mask |= ctx.audio_layer_mask();
        }

        for component in [&self.component, &self.outline_component].into_iter().flatten() {
            component.borrow_mut().layer_mask = mask;
        }
    }

    fn update_collision_filter(&mut self, ctx: &WrapperContext) {
        self.collider.borrow_mut().collision_filter = ctx.collision_filter();
        self.collider_interaction.borrow_mut().collision_filter = ctx.collision_filter_interact();
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        let scaling = self.scaling(ctx);
        {
            let mut collider = self.collider.borrow_mut();
            if !self.base.is_attached() {
                collider.position = ctx.position();
                collider.orientation = ctx.orientation();
            }
            collider.scale = scaling;
        }

        for component in [&self.component, &self.outline_component].into_iter().flatten() {
            component.borrow_mut().scaling = scaling;
        }
    }

    fn update_collider_response_type(&mut self, ctx: &WrapperContext) {
        let mut response_type = self.descriptor.collider_response_type;
        if !ctx.dynamic_collider() && response_type == ColliderResponseType::Dynamic {
            response_type = ColliderResponseType::Kinematic;
        }

        let mut collider = self.collider.borrow_mut();
        collider.response_type = response_type;
        collider.use_local_gravity = response_type != ColliderResponseType::Dynamic;
    }

    fn update(&mut self, _ctx: &mut WrapperContext, elapsed: f32) {
        let Some(component) = &self.component else {
            return;
        };
        let mut component = component.borrow_mut();
        let Some(animator) = component.animator.as_mut() else {
            return;
        };

        if let Some(controller) = self
            .playback_controller
            .and_then(|index| animator.controllers.get_mut(index))
        {
            controller.value += elapsed;
        }
        animator.apply();
    }

    fn reset_physics(&mut self, _ctx: &WrapperContext) {
        let Some(component) = &self.component else {
            return;
        };
        let mut component = component.borrow_mut();
        component.reset_bones();

        if let Some(animator) = component.animator.as_mut() {
            if let Some(controller) = self
                .playback_controller
                .and_then(|index| animator.controllers.get_mut(index))
            {
                controller.value = controller.minimum;
            }
            animator.apply();
        }
    }

    fn reset_component_textures(&mut self, ctx: &WrapperContext) {
        self.update_textures(ctx);
    }

    fn outline_skin_changed(&mut self, ctx: &WrapperContext) {
        self.update_outline_component(ctx);
    }

    fn reattach_to_colliders(&mut self, ctx: &WrapperContext) {
        if self.added_to_world {
            self.attach_to_collider(ctx);
        }
    }

    fn is_content_visible(&self) -> bool {
        let Some(component) = &self.component else {
            return false;
        };
        let component = component.borrow();
        let Some(info) = component.model.as_ref().and_then(Resource::as_model) else {
            return false;
        };
        info.textures
            .iter()
            .any(|name| texture_has_skin(&component, name))
    }

    fn destroy(&mut self, ctx: &mut WrapperContext) {
        self.load.cancel();
        self.loaded = None;
        self.release_outline_component(ctx);
        self.destroy_component(ctx);

        if self.colliders_added_to_world {
            if let Some(world) = ctx.world() {
                let mut world = world.borrow_mut();
                world.colliders.remove(&self.collider_interaction);
                world.colliders.remove(&self.collider);
            }
            self.colliders_added_to_world = false;
        }
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_component(self);
    }
}

/// True if the model texture `name` shows anything, either through a
/// texture skin or the component skin
fn texture_has_skin(component: &Component, name: &str) -> bool {
    let texture_skin = component
        .texture_named(name)
        .and_then(|t| t.skin.as_ref())
        .and_then(Resource::as_skin)
        .is_some_and(|skin| !skin.textures.is_empty());

    texture_skin
        || component
            .skin
            .as_ref()
            .and_then(Resource::as_skin)
            .is_some_and(|skin| skin.has_texture(name))
}

/// Zero scale components count as 1
fn tex_coord_transform(texture: &GdTexture) -> TexCoordTransform {
    let scale = |v: f32| if v == 0.0 { 1.0 } else { v };
    TexCoordTransform {
        translation: texture.offset,
        scaling: Vec2::new(scale(texture.scale.x), scale(texture.scale.y)),
        rotation: texture.rotation,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::engine::World;
    use crate::gamedef::GdClass;
    use crate::loader::{AnimationInfo, AnimationMove, MemoryBackend, SkinInfo};
    use crate::wrapper::test_support;
    use crate::wrapper::ObjectWrapper;

    /// Component state captured from a wrapper
    #[derive(Default)]
    struct Captured {
        component: Option<Shared<Component>>,
        outline: Option<Shared<Component>>,
        collider: Option<Shared<Collider>>,
        playback_controller: Option<usize>,
        can_interact: bool,
    }

    impl SubObjectVisitor for Captured {
        fn visit_component(&mut self, sub_object: &mut ComponentSubObject) {
            self.component = sub_object.component().cloned();
            self.outline = sub_object.outline_component().cloned();
            self.collider = Some(sub_object.collider().clone());
            self.playback_controller = sub_object.playback_controller();
            self.can_interact = sub_object.can_interact();
        }
    }

    fn insert_model(backend: &MemoryBackend) {
        backend.insert(Resource::model(
            "/box.demodel",
            ModelInfo {
                vertices: vec![Vec3::splat(-1.0), Vec3::ONE],
                textures: vec!["diffuse".into()],
                face_count: 4,
            },
        ));
        backend.insert(Resource::skin(
            "/wood.deskin",
            SkinInfo {
                textures: vec!["diffuse".into()],
            },
        ));
    }

    fn loaded_wrapper(descriptor: GdComponent) -> (ObjectWrapper, Shared<World>) {
        let (backend, env) = test_support::environment();
        insert_model(&backend);
        backend.insert(Resource::animation(
            "/a.deanim",
            AnimationInfo {
                moves: vec![AnimationMove {
                    name: "idle".into(),
                    playtime: 2.5,
                }],
            },
        ));
        backend.insert(Resource::rig("/empty.derig", RigInfo::default()));

        let mut class = GdClass::new("Thing");
        class.components.push(descriptor);

        let world = World::new_shared();
        let mut wrapper = ObjectWrapper::new(env.clone());
        wrapper.set_gd_class(Some(Arc::new(class)));
        wrapper.set_world(Some(world.clone()));
        env.update();
        wrapper.update(0.0);
        (wrapper, world)
    }

    fn capture(wrapper: &mut ObjectWrapper) -> Captured {
        let mut captured = Captured::default();
        wrapper.visit_sub_objects(&mut captured);
        captured
    }

    #[test]
    fn test_procedural_animator_plays_move() {
        let (mut wrapper, _world) = loaded_wrapper(GdComponent {
            model_path: "/box.demodel".into(),
            skin_path: "/wood.deskin".into(),
            animation_path: "/a.deanim".into(),
            move_name: "idle".into(),
            playback_controller: "playback".into(),
            ..GdComponent::default()
        });

        let captured = capture(&mut wrapper);
        assert_eq!(captured.playback_controller, Some(0));
        let component = captured.component.unwrap();
        {
            let component = component.borrow();
            let animator = component.animator.as_ref().unwrap();
            assert!(animator.path.is_empty());
            assert_eq!(animator.move_name, "idle");
            assert_eq!(animator.controllers.len(), 1);
            assert_eq!(animator.controllers[0].name, "playback");
            assert_eq!(animator.controllers[0].maximum, 2.5);
            assert_eq!(animator.controllers[0].value, 0.0);
        }

        wrapper.update(1.0);
        assert_eq!(
            component.borrow().animator.as_ref().unwrap().controllers[0].value,
            1.0
        );

        wrapper.reset_physics();
        assert_eq!(
            component.borrow().animator.as_ref().unwrap().controllers[0].value,
            0.0
        );
    }

    #[test]
    fn test_unknown_move_has_no_animator() {
        let (mut wrapper, _world) = loaded_wrapper(GdComponent {
            model_path: "/box.demodel".into(),
            animation_path: "/a.deanim".into(),
            move_name: "run".into(),
            ..GdComponent::default()
        });

        let captured = capture(&mut wrapper);
        assert!(captured.component.unwrap().borrow().animator.is_none());
        assert_eq!(captured.playback_controller, None);
    }

    #[test]
    fn test_missing_skin_uses_error_skin() {
        let (mut wrapper, _world) = loaded_wrapper(GdComponent {
            model_path: "/box.demodel".into(),
            skin_path: "/missing.deskin".into(),
            ..GdComponent::default()
        });

        let error_skin = wrapper.environment().error_skin();
        let component = capture(&mut wrapper).component.unwrap();
        assert_eq!(component.borrow().skin.as_ref(), Some(&error_skin));

        // without a skin path there is nothing to replace
        let (mut wrapper, _world) = loaded_wrapper(GdComponent {
            model_path: "/box.demodel".into(),
            ..GdComponent::default()
        });
        let component = capture(&mut wrapper).component.unwrap();
        assert!(component.borrow().skin.is_none());
    }

    #[test]
    fn test_rig_without_shapes_uses_model_collision_rig() {
        let (mut wrapper, _world) = loaded_wrapper(GdComponent {
            model_path: "/box.demodel".into(),
            skin_path: "/wood.deskin".into(),
            rig_path: "/empty.derig".into(),
            ..GdComponent::default()
        });

        let collision_rig = wrapper.environment().model_collision_rig();
        let captured = capture(&mut wrapper);
        assert!(captured.can_interact);

        let component = captured.component.unwrap();
        assert_eq!(component.borrow().rig.as_ref(), Some(&collision_rig));

        // the loaded model makes this component the interact collider
        let collider = captured.collider.unwrap();
        assert!(wrapper.collider().ptr_eq(&collider));
        assert_eq!(collider.borrow().rig.as_ref(), Some(&collision_rig));
    }

    #[test]
    fn test_outline_component_follows_outline_skin() {
        let (mut wrapper, world) = loaded_wrapper(GdComponent {
            model_path: "/box.demodel".into(),
            skin_path: "/wood.deskin".into(),
            ..GdComponent::default()
        });
        assert!(capture(&mut wrapper).outline.is_none());
        assert_eq!(world.borrow().components.len(), 1);

        wrapper.set_outline_skin_shared_editing();
        let outline_skin = wrapper.environment().outline_skin();
        let captured = capture(&mut wrapper);
        let outline = captured.outline.unwrap();
        {
            let outline = outline.borrow();
            assert_eq!(outline.textures.len(), 1);
            assert_eq!(outline.textures[0].skin.as_ref(), Some(&outline_skin));
            assert!(outline.visible);
        }
        assert_eq!(world.borrow().components.len(), 2);
        assert!(captured
            .collider
            .unwrap()
            .borrow()
            .has_attachment(&AttachTarget::Component(outline.clone())));

        wrapper.set_visible(false);
        assert!(!outline.borrow().visible);

        wrapper.set_outline_skin(None);
        assert!(capture(&mut wrapper).outline.is_none());
        assert_eq!(world.borrow().components.len(), 1);
    }
}
