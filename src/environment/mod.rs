//! Editor environment shared by all object wrappers
//!
//! Bundles the resource loader, the virtual file system, the current game
//! definition, the wrapper configuration and a few stock resources.

mod vfs;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

pub use vfs::{DiskFileSystem, MemoryFileSystem, VirtualFileSystem};

use crate::config::WrapperConfig;
use crate::gamedef::GameDefinition;
use crate::loader::{
    LoadTask, Resource, ResourceLoader, ResourceLoaderListener, ResourceType, RigInfo, SkinInfo,
};

const STOCK_ERROR_SKIN: &str = "/igde/stock/error.deskin";
const STOCK_OUTLINE_SKIN: &str = "/igde/stock/outline.deskin";
const STOCK_MODEL_COLLISION_RIG: &str = "/igde/stock/model_collision.derig";

/// Receives a stock resource named by the game definition
#[derive(Default)]
struct StockSlot {
    resource: RefCell<Option<Resource>>,
}

impl ResourceLoaderListener for StockSlot {
    fn loading_finished(&self, _task: &LoadTask, resource: &Resource) {
        *self.resource.borrow_mut() = Some(resource.clone());
    }

    fn loading_failed(&self, task: &LoadTask) {
        log::warn!("Failed loading stock resource '{}'", task.path);
    }
}

pub struct Environment {
    loader: ResourceLoader,
    vfs: Box<dyn VirtualFileSystem>,
    game_definition: RefCell<Arc<GameDefinition>>,
    config: WrapperConfig,
    stock_error_skin: Resource,
    outline_skin: Resource,
    model_collision_rig: Resource,
    default_model: RefCell<Rc<StockSlot>>,
    error_skin: RefCell<Rc<StockSlot>>,
    next_token: Cell<u64>,
}

impl Environment {
    pub fn new(loader: ResourceLoader, vfs: impl VirtualFileSystem + 'static) -> Self {
        Self {
            loader,
            vfs: Box::new(vfs),
            game_definition: RefCell::new(Arc::new(GameDefinition::new())),
            config: WrapperConfig::default(),
            stock_error_skin: Resource::skin(STOCK_ERROR_SKIN, SkinInfo::default()),
            outline_skin: Resource::skin(STOCK_OUTLINE_SKIN, SkinInfo::default()),
            model_collision_rig: Resource::rig(STOCK_MODEL_COLLISION_RIG, RigInfo::default()),
            default_model: RefCell::new(Rc::new(StockSlot::default())),
            error_skin: RefCell::new(Rc::new(StockSlot::default())),
            next_token: Cell::new(1),
        }
    }

    pub fn with_config(mut self, config: WrapperConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_game_definition(self, definition: GameDefinition) -> Self {
        self.set_game_definition(Arc::new(definition));
        self
    }

    pub fn loader(&self) -> &ResourceLoader {
        &self.loader
    }

    pub fn vfs(&self) -> &dyn VirtualFileSystem {
        self.vfs.as_ref()
    }

    pub fn config(&self) -> &WrapperConfig {
        &self.config
    }

    pub fn game_definition(&self) -> Arc<GameDefinition> {
        self.game_definition.borrow().clone()
    }

    /// Replace the game definition and request its stock resources. Wrappers
    /// pick up the change in `on_game_definition_changed`.
    pub fn set_game_definition(&self, definition: Arc<GameDefinition>) {
        *self.default_model.borrow_mut() =
            self.request_stock(definition.default_model_path(), ResourceType::Model);
        *self.error_skin.borrow_mut() =
            self.request_stock(definition.error_skin_path(), ResourceType::Skin);
        *self.game_definition.borrow_mut() = definition;
    }

    fn request_stock(&self, path: &str, resource_type: ResourceType) -> Rc<StockSlot> {
        let slot = Rc::new(StockSlot::default());
        if !path.is_empty() {
            let listener: Rc<dyn ResourceLoaderListener> = slot.clone();
            self.loader.request(path, resource_type, &listener);
        }
        slot
    }

    /// Model of the game definition used when a component has none
    pub fn default_model(&self) -> Option<Resource> {
        self.default_model.borrow().resource.borrow().clone()
    }

    /// Skin shown when a skin failed to load
    pub fn error_skin(&self) -> Resource {
        self.error_skin
            .borrow()
            .resource
            .borrow()
            .clone()
            .unwrap_or_else(|| self.stock_error_skin.clone())
    }

    /// Skin used for selection outlines
    pub fn outline_skin(&self) -> Resource {
        self.outline_skin.clone()
    }

    /// Rig colliding against the model geometry
    pub fn model_collision_rig(&self) -> Resource {
        self.model_collision_rig.clone()
    }

    /// Allocate a token identifying an object in collider user pointers
    pub fn next_object_token(&self) -> u64 {
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        token
    }

    /// Dispatch finished resource loads
    pub fn update(&self) -> usize {
        self.loader.update()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("loader", &self.loader)
            .field("classes", &self.game_definition.borrow().classes().len())
            .finish()
    }
}
