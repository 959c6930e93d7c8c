//! Live engine resources created by sub-objects
//!
//! These are plain state holders. The editor only needs to create them,
//! configure them and put them into a world; simulating them is left to the
//! engine.

use glam::{DVec3, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::CollisionFilter;
use crate::codec::Color;
use crate::loader::Resource;

/// Enumerations selectable by name in property values
pub trait NamedEnum: Sized + Copy + 'static {
    const NAMES: &'static [(&'static str, Self)];

    /// Look up a value by its name, ignoring case
    fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightType {
    #[default]
    Point,
    Spot,
    Projector,
}

impl NamedEnum for LightType {
    const NAMES: &'static [(&'static str, Self)] = &[
        ("point", LightType::Point),
        ("spot", LightType::Spot),
        ("projector", LightType::Projector),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceFieldType {
    #[default]
    Radial,
    Linear,
    Vortex,
}

impl NamedEnum for ForceFieldType {
    const NAMES: &'static [(&'static str, Self)] = &[
        ("radial", ForceFieldType::Radial),
        ("linear", ForceFieldType::Linear),
        ("vortex", ForceFieldType::Vortex),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceApplication {
    #[default]
    Direct,
    Surface,
    Mass,
    Speed,
}

impl NamedEnum for ForceApplication {
    const NAMES: &'static [(&'static str, Self)] = &[
        ("direct", ForceApplication::Direct),
        ("surface", ForceApplication::Surface),
        ("mass", ForceApplication::Mass),
        ("speed", ForceApplication::Speed),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationSpaceType {
    Grid,
    #[default]
    Mesh,
    Volume,
}

impl NamedEnum for NavigationSpaceType {
    const NAMES: &'static [(&'static str, Self)] = &[
        ("grid", NavigationSpaceType::Grid),
        ("mesh", NavigationSpaceType::Mesh),
        ("volume", NavigationSpaceType::Volume),
    ];
}

/// Movement hint of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementHint {
    Stationary,
    #[default]
    Dynamic,
}

/// Texture coordinate transform of a replaced texture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexCoordTransform {
    pub translation: Vec2,
    pub scaling: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
}

impl Default for TexCoordTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scaling: Vec2::ONE,
            rotation: 0.0,
        }
    }
}

/// Per-texture replacement of a component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTexture {
    /// Name of the model texture
    pub name: String,
    /// Skin replacing the texture, `None` to use the component skin
    pub skin: Option<Resource>,
    pub transform: TexCoordTransform,
    pub tint: Color,
}

impl ComponentTexture {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skin: None,
            transform: TexCoordTransform::default(),
            tint: Color::WHITE,
        }
    }
}

/// Animator controller with a value range
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatorController {
    pub name: String,
    pub minimum: f32,
    pub maximum: f32,
    pub value: f32,
    pub clamp: bool,
}

/// Animator driving a component
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    /// Path of the animator file, empty for procedural animators
    pub path: String,
    pub animation: Option<Resource>,
    pub rig: Option<Resource>,
    /// Move played by a procedural animator
    pub move_name: String,
    pub controllers: Vec<AnimatorController>,
    pub apply_count: usize,
}

impl Animator {
    pub fn controller_index(&self, name: &str) -> Option<usize> {
        self.controllers.iter().position(|c| c.name == name)
    }

    /// Apply the animation state to the bound component
    pub fn apply(&mut self) {
        self.apply_count += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Component {
    pub model: Option<Resource>,
    pub skin: Option<Resource>,
    pub rig: Option<Resource>,
    pub occlusion_mesh: Option<Resource>,
    pub audio_model: Option<Resource>,
    pub animator: Option<Animator>,
    pub textures: Vec<ComponentTexture>,
    pub visible: bool,
    pub layer_mask: u32,
    pub light_shadow_ignore: bool,
    pub movement_hint: MovementHint,
    pub position: DVec3,
    pub orientation: Quat,
    pub scaling: Vec3,
    /// Number of times the bone states got reset
    pub bone_resets: usize,
}

impl Component {
    pub fn new() -> Self {
        Self {
            visible: true,
            scaling: Vec3::ONE,
            ..Self::default()
        }
    }

    pub fn texture_named(&self, name: &str) -> Option<&ComponentTexture> {
        self.textures.iter().find(|t| t.name == name)
    }

    pub fn texture_named_mut(&mut self, name: &str) -> Option<&mut ComponentTexture> {
        self.textures.iter_mut().find(|t| t.name == name)
    }

    /// Reset all bones to their rest state
    pub fn reset_bones(&mut self) {
        self.bone_resets += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct Billboard {
    pub skin: Option<Resource>,
    pub axis: Vec3,
    pub size: Vec2,
    pub offset: Vec2,
    pub locked: bool,
    pub spherical: bool,
    pub size_fixed_to_screen: bool,
    pub visible: bool,
    pub layer_mask: u32,
    pub position: DVec3,
}

#[derive(Debug, Clone, Default)]
pub struct Light {
    pub light_type: LightType,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
    pub ambient_ratio: f32,
    pub half_intensity_distance: f32,
    pub spot_angle: f32,
    pub spot_ratio: f32,
    pub cast_shadows: bool,
    pub light_skin: Option<Resource>,
    pub activated: bool,
    pub layer_mask: u32,
    pub position: DVec3,
    pub orientation: Quat,
}

#[derive(Debug, Clone, Default)]
pub struct Speaker {
    pub sound: Option<Resource>,
    pub looping: bool,
    pub playing: bool,
    pub muted: bool,
    pub volume: f32,
    pub range: f32,
    pub roll_off: f32,
    pub play_speed: f32,
    pub layer_mask: u32,
    pub position: DVec3,
    pub orientation: Quat,
}

#[derive(Debug, Clone, Default)]
pub struct ParticleEmitter {
    pub emitter: Option<Resource>,
    pub casting: bool,
    pub warmup_time: f32,
    pub collision_filter: CollisionFilter,
    pub layer_mask: u32,
    pub position: DVec3,
    pub orientation: Quat,
}

#[derive(Debug, Clone, Default)]
pub struct ForceField {
    pub field_type: ForceFieldType,
    pub application: ForceApplication,
    pub direction: Vec3,
    pub force: f32,
    pub radius: f32,
    pub exponent: f32,
    pub fluctuation_direction: f32,
    pub fluctuation_force: f32,
    pub enabled: bool,
    pub collision_filter: CollisionFilter,
    pub position: DVec3,
    pub orientation: Quat,
}

#[derive(Debug, Clone, Default)]
pub struct EnvMapProbe {
    /// Half extents of the influence box
    pub influence_area: Vec3,
    pub influence_border_size: f32,
    pub influence_priority: i32,
    pub layer_mask: u32,
    pub position: DVec3,
    pub orientation: Quat,
    pub scaling: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationSpace {
    pub path: String,
    pub layer: i32,
    pub space_type: NavigationSpaceType,
    pub blocking_priority: i32,
    pub snap_distance: f32,
    pub snap_angle: f32,
    pub enabled: bool,
    pub position: DVec3,
    pub orientation: Quat,
}

#[derive(Debug, Clone, Default)]
pub struct NavigationBlocker {
    pub enabled: bool,
    pub layer: i32,
    pub space_type: NavigationSpaceType,
    pub blocking_priority: i32,
    pub half_extents: Vec3,
    pub position: DVec3,
    pub orientation: Quat,
    pub scaling: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_enum() {
        assert_eq!(LightType::from_name("Spot"), Some(LightType::Spot));
        assert_eq!(ForceFieldType::from_name(" vortex "), Some(ForceFieldType::Vortex));
        assert_eq!(NavigationSpaceType::from_name("blob"), None);
    }

    #[test]
    fn test_component_textures() {
        let mut component = Component::new();
        component.textures.push(ComponentTexture::new("bark"));
        component.texture_named_mut("bark").unwrap().tint = Color::BLACK;
        assert_eq!(component.texture_named("bark").unwrap().tint, Color::BLACK);
        assert!(component.texture_named("leaf").is_none());
    }
}
