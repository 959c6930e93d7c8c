//! Events emitted by object wrappers

/// What happened to a wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperEventKind {
    /// All sub-objects finished loading
    LoadFinished { success: bool },
    /// Box extents of a sub-object changed
    ExtendsChanged,
    /// Whether any sub-object shows content changed
    AnyContentVisibleChanged { visible: bool },
}

/// Event emitted by an [`ObjectWrapper`](super::ObjectWrapper)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapperEvent {
    /// Object token of the emitting wrapper
    pub token: u64,
    pub kind: WrapperEventKind,
}

impl WrapperEvent {
    pub fn load_finished(token: u64, success: bool) -> Self {
        Self {
            token,
            kind: WrapperEventKind::LoadFinished { success },
        }
    }

    pub fn extends_changed(token: u64) -> Self {
        Self {
            token,
            kind: WrapperEventKind::ExtendsChanged,
        }
    }

    pub fn any_content_visible_changed(token: u64, visible: bool) -> Self {
        Self {
            token,
            kind: WrapperEventKind::AnyContentVisibleChanged { visible },
        }
    }
}

/// Callback type for wrapper events
pub type WrapperCallback = Box<dyn Fn(&WrapperEvent)>;
