//! Sub-object descriptors of a class
//!
//! Every descriptor holds the default values of one sub-object and a map
//! linking its parameters to class property names. A linked parameter takes
//! its value from the object's properties, falling back to the descriptor
//! default.

use std::collections::BTreeMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::codec::Color;
use crate::engine::{
    ColliderResponseType, ForceApplication, ForceFieldType, LightType, NavigationSpaceType,
};

fn linked_name<K: Ord>(names: &BTreeMap<K, String>, key: K) -> &str {
    names.get(&key).map(String::as_str).unwrap_or("")
}

/// Where a sub-object sits relative to its object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GdPlacement {
    pub position: Vec3,
    /// Euler angles in degrees
    pub rotation: Vec3,
    /// Bone to attach to, empty for a static attachment
    pub bone_name: String,
}

/// Texture replacement of a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdTexture {
    pub name: String,
    pub skin_path: String,
    pub offset: Vec2,
    pub scale: Vec2,
    /// Rotation in degrees
    pub rotation: f32,
    pub tint: Color,
}

impl Default for GdTexture {
    fn default() -> Self {
        Self {
            name: String::new(),
            skin_path: String::new(),
            offset: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            tint: Color::WHITE,
        }
    }
}

impl GdTexture {
    pub fn new(name: impl Into<String>, skin_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            skin_path: skin_path.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentProperty {
    Model,
    Skin,
    Rig,
    Animator,
    Animation,
    Move,
    PlaybackController,
    OcclusionMesh,
    AudioModel,
    RenderEnvMap,
    AffectsAudio,
    LightShadowIgnore,
    AttachPosition,
    AttachRotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdComponent {
    pub model_path: String,
    pub skin_path: String,
    pub rig_path: String,
    pub animator_path: String,
    pub animation_path: String,
    #[serde(rename = "move")]
    pub move_name: String,
    pub playback_controller: String,
    pub occlusion_mesh_path: String,
    pub audio_model_path: String,
    pub render_env_map: bool,
    pub affects_audio: bool,
    pub light_shadow_ignore: bool,
    /// Extents and scaling ignore the object scale
    pub do_not_scale: bool,
    /// Hint the component never moves
    pub is_static: bool,
    pub partial_hide: bool,
    /// Attach the object's parent to this component's collider
    pub attach_target: bool,
    pub collider_response_type: ColliderResponseType,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub textures: Vec<GdTexture>,
    pub property_names: BTreeMap<ComponentProperty, String>,
}

impl Default for GdComponent {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            skin_path: String::new(),
            rig_path: String::new(),
            animator_path: String::new(),
            animation_path: String::new(),
            move_name: String::new(),
            playback_controller: String::new(),
            occlusion_mesh_path: String::new(),
            audio_model_path: String::new(),
            render_env_map: true,
            affects_audio: true,
            light_shadow_ignore: false,
            do_not_scale: false,
            is_static: true,
            partial_hide: false,
            attach_target: true,
            collider_response_type: ColliderResponseType::Static,
            placement: GdPlacement::default(),
            textures: Vec::new(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdComponent {
    pub fn property_name(&self, property: ComponentProperty) -> &str {
        linked_name(&self.property_names, property)
    }

    pub fn texture_named(&self, name: &str) -> Option<&GdTexture> {
        self.textures.iter().find(|t| t.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillboardProperty {
    Skin,
    Axis,
    Size,
    Offset,
    Locked,
    Spherical,
    SizeFixedToScreen,
    RenderEnvMap,
    AttachPosition,
    /// Trigger expression controlling visibility
    Visible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdBillboard {
    pub skin_path: String,
    pub axis: Vec3,
    pub size: Vec2,
    pub offset: Vec2,
    pub locked: bool,
    pub spherical: bool,
    pub size_fixed_to_screen: bool,
    pub render_env_map: bool,
    pub do_not_scale: bool,
    pub partial_hide: bool,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub property_names: BTreeMap<BillboardProperty, String>,
}

impl Default for GdBillboard {
    fn default() -> Self {
        Self {
            skin_path: String::new(),
            axis: Vec3::Y,
            size: Vec2::ONE,
            offset: Vec2::ZERO,
            locked: true,
            spherical: true,
            size_fixed_to_screen: false,
            render_env_map: true,
            do_not_scale: false,
            partial_hide: false,
            placement: GdPlacement::default(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdBillboard {
    pub fn property_name(&self, property: BillboardProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightProperty {
    Type,
    Color,
    Intensity,
    Range,
    AmbientRatio,
    HalfIntensityDistance,
    SpotAngle,
    SpotRatio,
    CastShadows,
    LightSkin,
    AttachPosition,
    AttachRotation,
    /// Trigger expression controlling activation
    Activated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdLight {
    pub light_type: LightType,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
    pub ambient_ratio: f32,
    pub half_intensity_distance: f32,
    pub spot_angle: f32,
    pub spot_ratio: f32,
    pub cast_shadows: bool,
    pub light_skin_path: String,
    pub activated: bool,
    pub partial_hide: bool,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub property_names: BTreeMap<LightProperty, String>,
}

impl Default for GdLight {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Color::WHITE,
            intensity: 1.0,
            range: 10.0,
            ambient_ratio: 0.0,
            half_intensity_distance: 0.1,
            spot_angle: 30.0,
            spot_ratio: 1.0,
            cast_shadows: true,
            light_skin_path: String::new(),
            activated: true,
            partial_hide: false,
            placement: GdPlacement::default(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdLight {
    pub fn property_name(&self, property: LightProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerProperty {
    Sound,
    Looping,
    Volume,
    Range,
    RollOff,
    PlaySpeed,
    AttachPosition,
    AttachRotation,
    /// Trigger expression controlling playback
    Playing,
    /// Trigger expression muting the speaker
    Muted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdSpeaker {
    pub sound_path: String,
    pub looping: bool,
    pub playing: bool,
    pub muted: bool,
    pub volume: f32,
    pub range: f32,
    pub roll_off: f32,
    pub play_speed: f32,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub property_names: BTreeMap<SpeakerProperty, String>,
}

impl Default for GdSpeaker {
    fn default() -> Self {
        Self {
            sound_path: String::new(),
            looping: true,
            playing: true,
            muted: false,
            volume: 1.0,
            range: 30.0,
            roll_off: 1.0,
            play_speed: 1.0,
            placement: GdPlacement::default(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdSpeaker {
    pub fn property_name(&self, property: SpeakerProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleEmitterProperty {
    Path,
    WarmupTime,
    AttachPosition,
    AttachRotation,
    /// Trigger expression controlling casting
    Casting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdParticleEmitter {
    pub path: String,
    pub casting: bool,
    pub warmup_time: f32,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub property_names: BTreeMap<ParticleEmitterProperty, String>,
}

impl Default for GdParticleEmitter {
    fn default() -> Self {
        Self {
            path: String::new(),
            casting: true,
            warmup_time: 0.0,
            placement: GdPlacement::default(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdParticleEmitter {
    pub fn property_name(&self, property: ParticleEmitterProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceFieldProperty {
    FieldType,
    ApplicationType,
    Direction,
    Force,
    Radius,
    Exponent,
    FluctuationDirection,
    FluctuationForce,
    AttachPosition,
    AttachRotation,
    /// Trigger expression enabling the field
    Enabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdForceField {
    pub field_type: ForceFieldType,
    pub application_type: ForceApplication,
    pub direction: Vec3,
    pub force: f32,
    pub radius: f32,
    pub exponent: f32,
    pub fluctuation_direction: f32,
    pub fluctuation_force: f32,
    pub enabled: bool,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub property_names: BTreeMap<ForceFieldProperty, String>,
}

impl Default for GdForceField {
    fn default() -> Self {
        Self {
            field_type: ForceFieldType::Radial,
            application_type: ForceApplication::Direct,
            direction: Vec3::Z,
            force: 1.0,
            radius: 1.0,
            exponent: 1.0,
            fluctuation_direction: 0.0,
            fluctuation_force: 0.0,
            enabled: true,
            placement: GdPlacement::default(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdForceField {
    pub fn property_name(&self, property: ForceFieldProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvMapProbeProperty {
    InfluenceArea,
    InfluenceBorderSize,
    InfluencePriority,
    AttachPosition,
    AttachRotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdEnvMapProbe {
    pub influence_area: Vec3,
    pub influence_border_size: f32,
    pub influence_priority: i32,
    pub scaling: Vec3,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub property_names: BTreeMap<EnvMapProbeProperty, String>,
}

impl Default for GdEnvMapProbe {
    fn default() -> Self {
        Self {
            influence_area: Vec3::ONE,
            influence_border_size: 0.1,
            influence_priority: 0,
            scaling: Vec3::ONE,
            placement: GdPlacement::default(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdEnvMapProbe {
    pub fn property_name(&self, property: EnvMapProbeProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationSpaceProperty {
    Path,
    Layer,
    Type,
    BlockingPriority,
    SnapDistance,
    SnapAngle,
    AttachPosition,
    AttachRotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdNavigationSpace {
    pub path: String,
    pub layer: i32,
    pub space_type: NavigationSpaceType,
    pub blocking_priority: i32,
    pub snap_distance: f32,
    pub snap_angle: f32,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub property_names: BTreeMap<NavigationSpaceProperty, String>,
}

impl Default for GdNavigationSpace {
    fn default() -> Self {
        Self {
            path: String::new(),
            layer: 0,
            space_type: NavigationSpaceType::Mesh,
            blocking_priority: 0,
            snap_distance: 0.001,
            snap_angle: 180.0,
            placement: GdPlacement::default(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdNavigationSpace {
    pub fn property_name(&self, property: NavigationSpaceProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationBlockerProperty {
    Enabled,
    Layer,
    Type,
    BlockingPriority,
    HalfExtents,
    AttachPosition,
    AttachRotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GdNavigationBlocker {
    pub enabled: bool,
    pub layer: i32,
    pub space_type: NavigationSpaceType,
    pub blocking_priority: i32,
    pub half_extents: Vec3,
    pub scaling: Vec3,
    #[serde(flatten)]
    pub placement: GdPlacement,
    pub property_names: BTreeMap<NavigationBlockerProperty, String>,
}

impl Default for GdNavigationBlocker {
    fn default() -> Self {
        Self {
            enabled: true,
            layer: 0,
            space_type: NavigationSpaceType::Mesh,
            blocking_priority: 0,
            half_extents: Vec3::splat(0.5),
            scaling: Vec3::ONE,
            placement: GdPlacement::default(),
            property_names: BTreeMap::new(),
        }
    }
}

impl GdNavigationBlocker {
    pub fn property_name(&self, property: NavigationBlockerProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldProperty {
    Path,
    Position,
    Rotation,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GdWorld {
    pub path: String,
    /// Offset of the nested world
    pub position: Vec3,
    /// Euler angles in degrees
    pub rotation: Vec3,
    pub property_names: BTreeMap<WorldProperty, String>,
}

impl GdWorld {
    pub fn property_name(&self, property: WorldProperty) -> &str {
        linked_name(&self.property_names, property)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_names() {
        let mut light = GdLight::default();
        light
            .property_names
            .insert(LightProperty::Color, "light.color".to_string());

        assert_eq!(light.property_name(LightProperty::Color), "light.color");
        assert_eq!(light.property_name(LightProperty::Range), "");
    }

    #[test]
    fn test_component_from_toml() {
        let component: GdComponent = toml::from_str(
            r#"
            model_path = "/models/tree.demodel"
            move = "idle"
            position = [0.0, 1.0, 0.0]
            bone_name = "root"

            [property_names]
            model = "model"
            skin = "skin"

            [[textures]]
            name = "bark"
            skin_path = "/skins/bark.deskin"
        "#,
        )
        .unwrap();

        assert_eq!(component.model_path, "/models/tree.demodel");
        assert_eq!(component.move_name, "idle");
        assert_eq!(component.placement.position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(component.placement.bone_name, "root");
        assert_eq!(component.property_name(ComponentProperty::Skin), "skin");
        assert_eq!(component.texture_named("bark").unwrap().scale, Vec2::ONE);
        assert!(component.render_env_map);
    }
}
