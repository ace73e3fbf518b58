use crate::ids::{TabId, WindowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabEvent {
    Created { tab_id: TabId, window_id: WindowId },
    Removed { tab_id: TabId, window_id: WindowId },
}

impl TabEvent {
    pub fn tab_id(&self) -> TabId {
        match self {
            Self::Created { tab_id, .. } | Self::Removed { tab_id, .. } => *tab_id,
        }
    }

    pub fn window_id(&self) -> WindowId {
        match self {
            Self::Created { window_id, .. } | Self::Removed { window_id, .. } => *window_id,
        }
    }
}
