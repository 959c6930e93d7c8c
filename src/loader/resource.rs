//! Loaded resources

use std::fmt;
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Kind of a file backed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Model,
    Skin,
    Rig,
    Animation,
    OcclusionMesh,
    Sound,
    ParticleEmitter,
    Image,
    /// Model used for audio occlusion. Shares the model format.
    AudioModel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelInfo {
    /// Vertex positions of the highest detail level
    pub vertices: Vec<Vec3>,
    /// Texture names in model order
    pub textures: Vec<String>,
    pub face_count: usize,
}

impl ModelInfo {
    /// Bounding box of all vertices, `None` without vertices
    pub fn extents(&self) -> Option<(Vec3, Vec3)> {
        let (first, rest) = self.vertices.split_first()?;
        Some(rest.iter().fold((*first, *first), |(min, max), v| {
            (min.min(*v), max.max(*v))
        }))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinInfo {
    pub textures: Vec<String>,
}

impl SkinInfo {
    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.iter().any(|t| t == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RigBone {
    pub name: String,
    pub shape_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RigInfo {
    pub bones: Vec<RigBone>,
    /// Shapes of the whole rig
    pub shape_count: usize,
}

impl RigInfo {
    /// Whether the rig can be used for collision. Rigs without bones need
    /// rig shapes, rigs with bones need at least one bone with shapes.
    pub fn has_collision_shapes(&self) -> bool {
        if self.bones.is_empty() {
            self.shape_count > 0
        } else {
            self.bones.iter().any(|b| b.shape_count > 0)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationMove {
    pub name: String,
    /// Play time in seconds
    pub playtime: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationInfo {
    pub moves: Vec<AnimationMove>,
}

impl AnimationInfo {
    pub fn move_named(&self, name: &str) -> Option<&AnimationMove> {
        self.moves.iter().find(|m| m.name == name)
    }
}

/// Kind specific content of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceKind {
    Model(ModelInfo),
    Skin(SkinInfo),
    Rig(RigInfo),
    Animation(AnimationInfo),
    OcclusionMesh,
    Sound { play_time: f32 },
    ParticleEmitter,
    Image { width: u32, height: u32 },
    AudioModel,
}

impl ResourceKind {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceKind::Model(_) => ResourceType::Model,
            ResourceKind::Skin(_) => ResourceType::Skin,
            ResourceKind::Rig(_) => ResourceType::Rig,
            ResourceKind::Animation(_) => ResourceType::Animation,
            ResourceKind::OcclusionMesh => ResourceType::OcclusionMesh,
            ResourceKind::Sound { .. } => ResourceType::Sound,
            ResourceKind::ParticleEmitter => ResourceType::ParticleEmitter,
            ResourceKind::Image { .. } => ResourceType::Image,
            ResourceKind::AudioModel => ResourceType::AudioModel,
        }
    }
}

#[derive(Debug)]
pub struct ResourceData {
    pub path: String,
    pub kind: ResourceKind,
}

/// Immutable loaded resource, cheap to clone and safe to send between threads
///
/// Resources compare by identity.
#[derive(Clone)]
pub struct Resource(Arc<ResourceData>);

impl Resource {
    pub fn new(path: impl Into<String>, kind: ResourceKind) -> Self {
        Self(Arc::new(ResourceData {
            path: path.into(),
            kind,
        }))
    }

    pub fn model(path: impl Into<String>, info: ModelInfo) -> Self {
        Self::new(path, ResourceKind::Model(info))
    }

    pub fn skin(path: impl Into<String>, info: SkinInfo) -> Self {
        Self::new(path, ResourceKind::Skin(info))
    }

    pub fn rig(path: impl Into<String>, info: RigInfo) -> Self {
        Self::new(path, ResourceKind::Rig(info))
    }

    pub fn animation(path: impl Into<String>, info: AnimationInfo) -> Self {
        Self::new(path, ResourceKind::Animation(info))
    }

    pub fn path(&self) -> &str {
        &self.0.path
    }

    pub fn kind(&self) -> &ResourceKind {
        &self.0.kind
    }

    pub fn resource_type(&self) -> ResourceType {
        self.0.kind.resource_type()
    }

    pub fn as_model(&self) -> Option<&ModelInfo> {
        match &self.0.kind {
            ResourceKind::Model(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_skin(&self) -> Option<&SkinInfo> {
        match &self.0.kind {
            ResourceKind::Skin(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_rig(&self) -> Option<&RigInfo> {
        match &self.0.kind {
            ResourceKind::Rig(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_animation(&self) -> Option<&AnimationInfo> {
        match &self.0.kind {
            ResourceKind::Animation(info) => Some(info),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Resource) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("path", &self.0.path)
            .field("type", &self.resource_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_extents() {
        let info = ModelInfo {
            vertices: vec![
                Vec3::new(1.0, -2.0, 0.5),
                Vec3::new(-1.0, 3.0, 0.0),
                Vec3::new(0.0, 0.0, 2.0),
            ],
            ..ModelInfo::default()
        };
        assert_eq!(
            info.extents(),
            Some((Vec3::new(-1.0, -2.0, 0.0), Vec3::new(1.0, 3.0, 2.0)))
        );
        assert_eq!(ModelInfo::default().extents(), None);
    }

    #[test]
    fn test_rig_collision_shapes() {
        assert!(!RigInfo::default().has_collision_shapes());
        assert!(RigInfo { bones: vec![], shape_count: 1 }.has_collision_shapes());

        let bones_without_shapes = RigInfo {
            bones: vec![RigBone { name: "root".into(), shape_count: 0 }],
            shape_count: 3,
        };
        assert!(!bones_without_shapes.has_collision_shapes());
    }

    #[test]
    fn test_identity() {
        let a = Resource::skin("/a.deskin", SkinInfo::default());
        let b = Resource::skin("/a.deskin", SkinInfo::default());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.resource_type(), ResourceType::Skin);
    }
}
