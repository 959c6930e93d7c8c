//! Object wrapper behavior against an in-memory loader

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use glam::Vec3;
use igde_shared::engine::Shared;
use igde_shared::gamedef::{
    ComponentProperty, GdClass, GdComponent, GdEnvMapProbe, GdLight, LightProperty,
};
use igde_shared::loader::{ModelInfo, SkinInfo};
use igde_shared::wrapper::{ComponentSubObject, SubObjectVisitor};
use igde_shared::{
    Environment, MemoryBackend, MemoryFileSystem, ObjectWrapper, Resource, ResourceLoader,
    ResourceType, SubObjectKind, TriggerTargetList, World, WrapperEvent, WrapperEventKind,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn environment() -> (Arc<MemoryBackend>, Rc<Environment>) {
    init_logging();
    let backend = Arc::new(MemoryBackend::new());
    let env = Environment::new(ResourceLoader::new(backend.clone()), MemoryFileSystem::new());
    (backend, Rc::new(env))
}

/// Model spanning `min..max` with one skinned texture
fn insert_box_model(backend: &MemoryBackend, path: &str, min: Vec3, max: Vec3) {
    backend.insert(Resource::model(
        path,
        ModelInfo {
            vertices: vec![min, max],
            textures: vec!["diffuse".into()],
            face_count: 12,
        },
    ));
}

fn insert_skin(backend: &MemoryBackend, path: &str) {
    backend.insert(Resource::skin(
        path,
        SkinInfo {
            textures: vec!["diffuse".into()],
        },
    ));
}

fn component(model: &str, skin: &str) -> GdComponent {
    GdComponent {
        model_path: model.into(),
        skin_path: skin.into(),
        ..GdComponent::default()
    }
}

fn record_events(wrapper: &mut ObjectWrapper) -> Rc<RefCell<Vec<WrapperEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    wrapper.set_async_load_finished(Some(Box::new(move |e| sink.borrow_mut().push(*e))));
    events
}

fn load_results(events: &RefCell<Vec<WrapperEvent>>) -> Vec<bool> {
    events
        .borrow()
        .iter()
        .filter_map(|e| match e.kind {
            WrapperEventKind::LoadFinished { success } => Some(success),
            _ => None,
        })
        .collect()
}

fn pump(env: &Environment, wrapper: &mut ObjectWrapper) {
    env.update();
    wrapper.update(0.0);
}

#[derive(Default)]
struct Components(Vec<(Shared<igde_shared::engine::Collider>, bool)>);

impl SubObjectVisitor for Components {
    fn visit_component(&mut self, sub_object: &mut ComponentSubObject) {
        let visible = sub_object
            .component()
            .is_some_and(|component| component.borrow().visible);
        self.0.push((sub_object.collider().clone(), visible));
    }
}

#[test]
fn test_rebuild_is_deterministic() {
    let (_backend, env) = environment();

    let mut base = GdClass::new("Base");
    base.lights.push(GdLight::default());
    base.env_map_probes.push(GdEnvMapProbe::default());

    let mut class = GdClass::new("Lamp");
    class.env_map_probes.push(GdEnvMapProbe::default());
    class.lights.push(GdLight::default());
    class.components.push(component("", ""));
    let mut inherit = igde_shared::gamedef::GdClassInherit::new("Base", "base.");
    inherit.class = Some(Arc::new(base));
    class.inherits.push(inherit);
    let class = Arc::new(class);

    let mut wrapper = ObjectWrapper::new(env.clone());
    wrapper.set_property("base.light.color", "1 0 0");

    let mut rebuild = || {
        wrapper.set_world(Some(World::new_shared()));
        wrapper.set_gd_class(Some(class.clone()));
        let kinds: Vec<SubObjectKind> = wrapper.sub_objects().map(|s| s.kind()).collect();
        wrapper.set_gd_class(None);
        kinds
    };

    let first = rebuild();
    let second = rebuild();
    assert_eq!(
        first,
        vec![
            SubObjectKind::Component,
            SubObjectKind::Light,
            SubObjectKind::EnvMapProbe,
            SubObjectKind::Light,
            SubObjectKind::EnvMapProbe,
        ]
    );
    assert_eq!(first, second);
}

#[test]
fn test_extents_union_sub_objects() {
    let (backend, env) = environment();
    insert_box_model(&backend, "/a.demodel", Vec3::splat(-1.0), Vec3::splat(1.0));
    insert_box_model(&backend, "/b.demodel", Vec3::ZERO, Vec3::splat(2.0));
    insert_skin(&backend, "/wood.deskin");

    let mut class = GdClass::new("Pair");
    class.components.push(component("/a.demodel", "/wood.deskin"));
    class.components.push(component("/b.demodel", "/wood.deskin"));

    let mut wrapper = ObjectWrapper::new(env.clone());
    let events = record_events(&mut wrapper);
    wrapper.set_gd_class(Some(Arc::new(class)));
    wrapper.set_world(Some(World::new_shared()));
    assert!(!wrapper.has_box_extends());

    pump(&env, &mut wrapper);

    assert_eq!(load_results(&events), vec![true]);
    assert!(events
        .borrow()
        .iter()
        .any(|e| e.kind == WrapperEventKind::ExtendsChanged));
    assert!(wrapper.has_box_extends());
    assert_eq!(wrapper.box_min_extend(), Vec3::splat(-1.0));
    assert_eq!(wrapper.box_max_extend(), Vec3::splat(2.0));

    // one fallback shape per sub-object, scaled with the object
    wrapper.set_scaling(Vec3::splat(2.0));
    wrapper.update(0.0);
    let fallback = wrapper.fallback_collider().borrow();
    assert_eq!(fallback.shapes.len(), 2);
    assert_eq!(fallback.shapes[1].center, Vec3::splat(2.0));
    assert_eq!(fallback.shapes[1].half_extents, Vec3::splat(2.0));
}

#[test]
fn test_degenerate_extent_is_padded() {
    let (backend, env) = environment();
    insert_box_model(
        &backend,
        "/plane.demodel",
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
    );
    insert_skin(&backend, "/wood.deskin");

    let mut class = GdClass::new("Plane");
    class
        .components
        .push(component("/plane.demodel", "/wood.deskin"));

    let mut wrapper = ObjectWrapper::new(env.clone());
    wrapper.set_gd_class(Some(Arc::new(class)));
    wrapper.set_world(Some(World::new_shared()));
    pump(&env, &mut wrapper);

    let padding = env.config().extent_padding;
    assert_eq!(wrapper.box_min_extend(), Vec3::new(-1.0, -1.0, -padding));
    assert_eq!(wrapper.box_max_extend(), Vec3::new(1.0, 1.0, padding));
}

#[test]
fn test_load_finishes_after_all_requests() {
    let (backend, env) = environment();
    insert_box_model(&backend, "/a.demodel", Vec3::splat(-1.0), Vec3::ONE);
    insert_box_model(&backend, "/b.demodel", Vec3::splat(-1.0), Vec3::ONE);
    insert_skin(&backend, "/wood.deskin");
    backend.set_deferred(true);

    let mut class = GdClass::new("Pair");
    class.components.push(component("/a.demodel", "/wood.deskin"));
    class.components.push(component("/b.demodel", "/missing.deskin"));

    let mut wrapper = ObjectWrapper::new(env.clone());
    let events = record_events(&mut wrapper);
    wrapper.set_gd_class(Some(Arc::new(class)));
    wrapper.set_world(Some(World::new_shared()));

    let requests = backend.held_count();
    assert_eq!(requests, 4);

    // complete in reverse request order, one at a time
    let mut started = backend.started();
    started.reverse();
    for (index, task) in started.iter().enumerate() {
        assert!(load_results(&events).is_empty());
        assert!(!wrapper.all_sub_objects_finished_loading());
        assert!(backend.release(&task.path, task.resource_type));
        pump(&env, &mut wrapper);
        assert_eq!(load_results(&events).len(), usize::from(index + 1 == requests));
    }

    // the missing skin fails the aggregate
    assert_eq!(load_results(&events), vec![false]);
    assert!(wrapper.all_sub_objects_finished_loading());

    pump(&env, &mut wrapper);
    assert_eq!(load_results(&events).len(), 1);
}

#[test]
fn test_load_finishes_without_requests() {
    let (backend, env) = environment();
    backend.set_deferred(true);

    let mut class = GdClass::new("Probe");
    class.env_map_probes.push(GdEnvMapProbe::default());
    class.lights.push(GdLight::default());

    let mut wrapper = ObjectWrapper::new(env.clone());
    let events = record_events(&mut wrapper);
    wrapper.set_gd_class(Some(Arc::new(class)));
    wrapper.set_world(Some(World::new_shared()));

    assert_eq!(backend.held_count(), 0);
    assert_eq!(load_results(&events), vec![true]);

    pump(&env, &mut wrapper);
    assert_eq!(load_results(&events), vec![true]);
}

#[test]
fn test_stale_loads_are_ignored() {
    let (backend, env) = environment();
    insert_box_model(&backend, "/old.demodel", Vec3::splat(-1.0), Vec3::ONE);
    insert_box_model(&backend, "/new.demodel", Vec3::splat(-2.0), Vec3::splat(2.0));
    insert_skin(&backend, "/wood.deskin");
    backend.set_deferred(true);

    let mut descriptor = component("/old.demodel", "/wood.deskin");
    descriptor
        .property_names
        .insert(ComponentProperty::Model, "model".into());
    let mut class = GdClass::new("Swap");
    class.components.push(descriptor);

    let mut wrapper = ObjectWrapper::new(env.clone());
    let events = record_events(&mut wrapper);
    wrapper.set_gd_class(Some(Arc::new(class)));
    wrapper.set_world(Some(World::new_shared()));

    // replace the model while the first round is still in flight
    wrapper.set_property("model", "/new.demodel");
    assert!(backend
        .started()
        .iter()
        .any(|t| t.path == "/new.demodel" && t.resource_type == ResourceType::Model));

    backend.release_all();
    pump(&env, &mut wrapper);

    assert_eq!(load_results(&events), vec![true]);
    assert_eq!(wrapper.box_min_extend(), Vec3::splat(-2.0));
    assert_eq!(wrapper.box_max_extend(), Vec3::splat(2.0));

    // a wrapper dropped with loads in flight leaves nothing to notify
    let mut doomed = ObjectWrapper::new(env.clone());
    let mut class = GdClass::new("Doomed");
    class.components.push(component("/old.demodel", ""));
    doomed.set_gd_class(Some(Arc::new(class)));
    doomed.set_world(Some(World::new_shared()));
    drop(doomed);

    backend.release_all();
    env.update();
}

#[test]
fn test_component_visibility_follows_any_interact_collider() {
    let (backend, env) = environment();
    insert_box_model(&backend, "/a.demodel", Vec3::splat(-1.0), Vec3::ONE);
    insert_box_model(&backend, "/b.demodel", Vec3::splat(-1.0), Vec3::ONE);
    insert_skin(&backend, "/wood.deskin");

    let mut class = GdClass::new("Pair");
    class.components.push(component("/a.demodel", "/wood.deskin"));
    class.components.push(component("/b.demodel", "/wood.deskin"));

    let mut wrapper = ObjectWrapper::new(env.clone());
    wrapper.set_gd_class(Some(Arc::new(class)));
    wrapper.set_world(Some(World::new_shared()));
    pump(&env, &mut wrapper);

    let mut components = Components::default();
    wrapper.visit_sub_objects(&mut components);
    assert_eq!(components.0.len(), 2);

    // only one component holds the interact collider slot
    let interact = wrapper.collider();
    let holders = components
        .0
        .iter()
        .filter(|(collider, _)| collider.ptr_eq(&interact))
        .count();
    assert_eq!(holders, 1);

    // yet both report visible, since visibility only checks that some
    // component holds the slot
    assert!(components.0.iter().all(|(_, visible)| *visible));

    wrapper.set_partially_hidden(true);
    let mut hidden = Components::default();
    wrapper.visit_sub_objects(&mut hidden);
    assert!(hidden.0.iter().all(|(_, visible)| !*visible));
}

#[test]
fn test_trigger_expression_activates_light() {
    let (_backend, env) = environment();
    let table = Rc::new(TriggerTargetList::new());

    let mut light = GdLight::default();
    light
        .property_names
        .insert(LightProperty::Activated, "light.on".into());
    let mut class = GdClass::new("Lamp");
    class.lights.push(light);

    let world = World::new_shared();
    let mut wrapper = ObjectWrapper::new(env.clone());
    wrapper.set_trigger_table(Some(table.clone()));
    wrapper.set_property("light.on", "switch");
    wrapper.set_gd_class(Some(Arc::new(class)));
    wrapper.set_world(Some(world.clone()));

    let light = world.borrow().lights.iter().next().cloned().unwrap();
    assert!(!light.borrow().activated);

    table.get_named("switch").unwrap().fire();
    wrapper.update(0.0);
    assert!(light.borrow().activated);

    wrapper.set_visible(false);
    assert!(!light.borrow().activated);
}
