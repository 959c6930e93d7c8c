use glam::{DMat4, DVec3, Quat, Vec3};

use super::{LoadRound, SubObject, SubObjectBase, SubObjectKind};
use crate::codec;
use crate::engine::{ComponentTexture, TexCoordTransform};
use crate::error::Result;
use crate::gamedef::{GdWorld, WorldProperty};
use crate::loader::ResourceType;
use crate::wrapper::context::WrapperContext;
use crate::wrapper::object::ObjectWrapper;
use crate::wrapper::visitor::SubObjectVisitor;
use crate::wrapper::world_file::{parse_world, WorldFile, WorldFileObject};

/// Places the objects of a world file as nested object wrappers
///
/// Texture skins of all placed objects load in one round, shared by path.
/// The children are created once the round finished and load their own
/// resources afterwards.
#[derive(Debug)]
pub struct WorldSubObject {
    base: SubObjectBase,
    descriptor: GdWorld,
    load: LoadRound,
    path: String,
    world_file: Option<WorldFile>,
    children: Vec<ObjectWrapper>,
}

impl WorldSubObject {
    pub(crate) fn new(ctx: &mut WrapperContext, descriptor: &GdWorld, prefix: &str) -> Result<Self> {
        let mut sub_object = Self {
            base: SubObjectBase::new(ctx, prefix),
            descriptor: descriptor.clone(),
            load: LoadRound::default(),
            path: String::new(),
            world_file: None,
            children: Vec::new(),
        };
        sub_object.update_parameters(ctx)?;
        Ok(sub_object)
    }

    pub fn descriptor(&self) -> &GdWorld {
        &self.descriptor
    }

    /// Path of the placed world file
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> &[ObjectWrapper] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [ObjectWrapper] {
        &mut self.children
    }

    /// Transform of the world file origin relative to the wrapper
    fn world_offset(&self, ctx: &WrapperContext) -> DMat4 {
        let d = &self.descriptor;
        let props = self.base.props(ctx);
        let position = props.vector(d.property_name(WorldProperty::Position), d.position);
        let orientation = props.rotation(d.property_name(WorldProperty::Rotation), d.rotation);
        DMat4::from_rotation_translation(orientation.as_dquat(), position.as_dvec3())
    }

    fn child_transform(
        ctx: &WrapperContext,
        offset: &DMat4,
        object: &WorldFileObject,
    ) -> (DVec3, Quat, Vec3) {
        let local = DMat4::from_scale_rotation_translation(
            object.scaling.as_dvec3(),
            codec::euler_to_quat(object.rotation).as_dquat(),
            object.position,
        );
        let (scaling, orientation, position) =
            (*ctx.matrix() * *offset * local).to_scale_rotation_translation();
        (position, orientation.as_quat(), scaling.as_vec3())
    }

    fn create_children(&mut self, ctx: &WrapperContext) {
        self.children.clear();
        let Some(world_file) = &self.world_file else {
            return;
        };

        let offset = self.world_offset(ctx);
        for object in &world_file.objects {
            let mut child = ObjectWrapper::new(ctx.environment().clone());
            child.set_trigger_table(ctx.trigger_table().cloned());
            child.set_properties_from(object.properties.clone());
            child.set_texture_overrides(
                object
                    .textures
                    .iter()
                    .map(|texture| ComponentTexture {
                        name: texture.name.clone(),
                        skin: self.load.get(&texture.skin_path, ResourceType::Skin),
                        transform: TexCoordTransform {
                            translation: texture.translation,
                            scaling: texture.scaling,
                            rotation: texture.rotation,
                        },
                        tint: texture.tint,
                    })
                    .collect(),
            );
            child.set_gd_class_name(&object.class_name);

            let (position, orientation, scaling) = Self::child_transform(ctx, &offset, object);
            child.set_position(position);
            child.set_orientation(orientation);
            child.set_scaling(scaling);

            Self::sync_child(ctx, &mut child);
            child.set_world(ctx.world().cloned());
            self.children.push(child);
        }

        log::debug!(
            "World '{}': placed {} objects",
            self.path,
            self.children.len()
        );
    }

    /// Copy wrapper state the children inherit
    fn sync_child(ctx: &WrapperContext, child: &mut ObjectWrapper) {
        child.set_visible(ctx.visible());
        child.set_partially_hidden(ctx.partially_hidden());
        child.set_dynamic_collider(ctx.dynamic_collider());
        child.set_render_layer_mask(ctx.render_layer_mask());
        child.set_render_env_map_mask(ctx.render_env_map_mask());
        child.set_audio_layer_mask(ctx.audio_layer_mask());
        child.set_collision_filter(ctx.collision_filter());
        child.set_collision_filter_particles(ctx.collision_filter_particles());
        child.set_collision_filter_force_fields(ctx.collision_filter_force_field());
        child.set_collision_filter_interact(ctx.collision_filter_interact());
        child.set_outline_skin(ctx.outline_skin().cloned());
        child.set_outline_color(ctx.outline_color());
    }
}

impl SubObject for WorldSubObject {
    fn base(&self) -> &SubObjectBase {
        &self.base
    }

    fn kind(&self) -> SubObjectKind {
        SubObjectKind::World
    }

    fn update_parameters(&mut self, ctx: &mut WrapperContext) -> Result<()> {
        self.load.cancel();
        self.children.clear();
        self.world_file = None;

        let d = &self.descriptor;
        self.path = self
            .base
            .props(ctx)
            .string(d.property_name(WorldProperty::Path), &d.path);

        if !self.path.is_empty() {
            let text = ctx.environment().vfs().read_to_string(&self.path)?;
            self.world_file = Some(parse_world(&self.path, &text)?);
        }

        let load = self.load.start(&self.base, ctx);
        if let Some(world_file) = &self.world_file {
            for path in world_file.texture_skin_paths() {
                load.request(ctx.environment(), &path, ResourceType::Skin);
            }
        }
        self.async_load_finished(ctx);
        Ok(())
    }

    fn async_load_finished(&mut self, ctx: &mut WrapperContext) {
        let Some(success) = self.load.take_completion() else {
            return;
        };
        self.create_children(ctx);
        ctx.finish_sub_object_load(success);
    }

    fn update_visibility(&mut self, ctx: &WrapperContext) {
        for child in &mut self.children {
            child.set_visible(ctx.visible());
            child.set_partially_hidden(ctx.partially_hidden());
        }
    }

    fn update_layer_masks(&mut self, ctx: &WrapperContext) {
        for child in &mut self.children {
            child.set_render_layer_mask(ctx.render_layer_mask());
            child.set_render_env_map_mask(ctx.render_env_map_mask());
            child.set_audio_layer_mask(ctx.audio_layer_mask());
        }
    }

    fn update_collision_filter(&mut self, ctx: &WrapperContext) {
        for child in &mut self.children {
            child.set_collision_filter(ctx.collision_filter());
            child.set_collision_filter_particles(ctx.collision_filter_particles());
            child.set_collision_filter_force_fields(ctx.collision_filter_force_field());
            child.set_collision_filter_interact(ctx.collision_filter_interact());
        }
    }

    fn update_geometry(&mut self, ctx: &WrapperContext) {
        let Some(world_file) = &self.world_file else {
            return;
        };
        let offset = self.world_offset(ctx);
        for (child, object) in self.children.iter_mut().zip(&world_file.objects) {
            let (position, orientation, scaling) = Self::child_transform(ctx, &offset, object);
            child.set_position(position);
            child.set_orientation(orientation);
            child.set_scaling(scaling);
        }
    }

    fn update_collider_response_type(&mut self, ctx: &WrapperContext) {
        for child in &mut self.children {
            child.set_dynamic_collider(ctx.dynamic_collider());
        }
    }

    fn update(&mut self, _ctx: &mut WrapperContext, elapsed: f32) {
        for child in &mut self.children {
            child.update(elapsed);
        }
    }

    fn reset_physics(&mut self, _ctx: &WrapperContext) {
        for child in &mut self.children {
            child.reset_physics();
        }
    }

    fn reset_component_textures(&mut self, _ctx: &WrapperContext) {
        for child in &mut self.children {
            child.reset_component_textures();
        }
    }

    fn outline_skin_changed(&mut self, ctx: &WrapperContext) {
        for child in &mut self.children {
            child.set_outline_skin(ctx.outline_skin().cloned());
            child.set_outline_color(ctx.outline_color());
        }
    }

    fn init_triggers(&mut self, ctx: &WrapperContext) {
        for child in &mut self.children {
            child.set_trigger_table(ctx.trigger_table().cloned());
        }
    }

    fn update_triggers(&mut self, _ctx: &WrapperContext) {
        for child in &mut self.children {
            child.update_triggerable_properties();
        }
    }

    fn is_content_visible(&self) -> bool {
        self.children.iter().any(ObjectWrapper::any_content_visible)
    }

    fn all_sub_objects_finished_loading(&self) -> bool {
        self.children
            .iter()
            .all(ObjectWrapper::all_sub_objects_finished_loading)
    }

    fn destroy(&mut self, _ctx: &mut WrapperContext) {
        self.load.cancel();
        self.children.clear();
        self.world_file = None;
    }

    fn visit(&mut self, visitor: &mut dyn SubObjectVisitor) {
        visitor.visit_world(self);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;
    use std::sync::Arc;

    use super::*;
    use crate::engine::World;
    use crate::environment::{Environment, MemoryFileSystem};
    use crate::gamedef::{GameDefinition, GdClass, GdComponent};
    use crate::loader::{MemoryBackend, ModelInfo, Resource, ResourceLoader, SkinInfo};

    const WORLD: &str = r#"
        <world>
            <object>
                <classname>Crate</classname>
                <position x="2" y="0" z="0"/>
                <texture name="wood"><skin>/skins/oak.deskin</skin></texture>
            </object>
            <object>
                <classname>Crate</classname>
                <position x="-2" y="0" z="0"/>
                <texture name="wood"><skin>/skins/oak.deskin</skin></texture>
            </object>
        </world>"#;

    fn environment() -> (Arc<MemoryBackend>, Rc<Environment>) {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert(Resource::model(
            "/models/crate.demodel",
            ModelInfo {
                vertices: vec![Vec3::splat(-0.5), Vec3::splat(0.5)],
                textures: vec!["wood".into()],
                face_count: 12,
            },
        ));
        backend.insert(Resource::skin(
            "/skins/oak.deskin",
            SkinInfo {
                textures: vec!["color".into()],
            },
        ));

        let vfs = MemoryFileSystem::new();
        vfs.add_file("/worlds/yard.deworld", WORLD);

        let mut crate_class = GdClass::new("Crate");
        crate_class.components.push(GdComponent {
            model_path: "/models/crate.demodel".into(),
            ..GdComponent::default()
        });
        let mut yard = GdClass::new("Yard");
        yard.worlds.push(GdWorld {
            path: "/worlds/yard.deworld".into(),
            position: Vec3::new(0.0, 0.0, 10.0),
            ..GdWorld::default()
        });

        let definition = GameDefinition::from_classes(vec![crate_class, yard]);
        let env = Environment::new(ResourceLoader::new(backend.clone()), vfs)
            .with_game_definition(definition);
        (backend, Rc::new(env))
    }

    #[test]
    fn test_places_world_objects() {
        let (_backend, env) = environment();
        let world = World::new_shared();
        let mut wrapper = ObjectWrapper::new(env.clone());
        wrapper.set_gd_class_name("Yard");
        wrapper.set_world(Some(world.clone()));

        env.update();
        wrapper.update(0.0);
        env.update();
        wrapper.update(0.0);

        assert_eq!(wrapper.sub_object_count(), 1);

        struct Positions(Vec<DVec3>, Vec<bool>);
        impl SubObjectVisitor for Positions {
            fn visit_world(&mut self, sub_object: &mut WorldSubObject) {
                for child in sub_object.children() {
                    self.0.push(child.position());
                    let wood = child.context().texture_override("wood");
                    self.1.push(wood.is_some_and(|t| t.skin.is_some()));
                }
            }
        }
        let mut positions = Positions(Vec::new(), Vec::new());
        wrapper.visit_sub_objects(&mut positions);

        assert_eq!(positions.0.len(), 2);
        assert!(positions.0[0].abs_diff_eq(DVec3::new(2.0, 0.0, 10.0), 1e-9));
        assert!(positions.0[1].abs_diff_eq(DVec3::new(-2.0, 0.0, 10.0), 1e-9));
        assert_eq!(positions.1, vec![true, true]);

        // both crates placed their component
        assert_eq!(world.borrow().components.len(), 2);
        assert!(wrapper.all_sub_objects_finished_loading());
    }

    #[test]
    fn test_missing_world_file_fails_sub_object() {
        let (_backend, env) = environment();
        let world = World::new_shared();
        let mut wrapper = ObjectWrapper::new(env.clone());
        wrapper.set_property("unused", "1");
        wrapper.set_gd_class(Some(Arc::new({
            let mut class = GdClass::new("Broken");
            class.worlds.push(GdWorld {
                path: "/worlds/missing.deworld".into(),
                ..GdWorld::default()
            });
            class
        })));

        let events = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = events.clone();
        wrapper.set_async_load_finished(Some(Box::new(move |e| sink.borrow_mut().push(*e))));
        wrapper.set_world(Some(world));

        assert_eq!(wrapper.sub_object_count(), 0);
        assert_eq!(
            events.borrow().last().map(|e| e.kind),
            Some(crate::wrapper::WrapperEventKind::LoadFinished { success: false })
        );
    }
}
