use crate::container::ContainerHandle;
use crate::manager::{SceneLifecycleManager, SessionHandle};
use crate::scheduler::FrameScheduler;
use backdrop_content::{BackdropConfig, ContentSpec};
use backdrop_input::ViewportState;
use backdrop_render::RenderBackend;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Page sections of the site. Only some carry a 3D background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Home,
    Projects,
    Skills,
    About,
}

impl Section {
    pub const ALL: [Section; 4] = [Self::Home, Self::Projects, Self::Skills, Self::About];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Projects => "projects",
            Self::Skills => "skills",
            Self::About => "about",
        }
    }

    /// Zero-based position in [`Section::ALL`].
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Keyboard shortcut: `'1'` through `'4'`.
    pub fn from_key(key: char) -> Option<Self> {
        let digit = key.to_digit(10)? as usize;
        digit.checked_sub(1).and_then(Self::from_index)
    }

    /// Background scene for this section, if any.
    pub fn scene(&self, config: &BackdropConfig) -> Option<ContentSpec> {
        match self {
            Self::Home => Some(ContentSpec::Particles(config.hero.clone())),
            Self::Projects => Some(ContentSpec::Cubes(config.projects.clone())),
            Self::Skills | Self::About => None,
        }
    }
}

/// Keeps exactly one background mounted for the visible section.
///
/// Switching sections stops the old session before the new one starts, so
/// the container never holds two surfaces.
pub struct SectionHost {
    active: Option<Section>,
    session: Option<SessionHandle>,
    container: ContainerHandle,
    config: BackdropConfig,
}

impl SectionHost {
    pub fn new(container: ContainerHandle, config: BackdropConfig) -> Self {
        Self {
            active: None,
            session: None,
            container,
            config,
        }
    }

    pub fn active(&self) -> Option<Section> {
        self.active
    }

    pub fn session(&self) -> Option<SessionHandle> {
        self.session
    }

    pub fn config(&self) -> &BackdropConfig {
        &self.config
    }

    /// Show `section`. A section without a scene, or whose scene fails to
    /// start, is shown with a blank background. Returns the new session.
    pub fn show<B: RenderBackend, S: FrameScheduler>(
        &mut self,
        manager: &mut SceneLifecycleManager<B, S>,
        section: Section,
        viewport: ViewportState,
        now: Instant,
    ) -> Option<SessionHandle> {
        if self.active == Some(section) && self.session.is_some_and(|h| manager.is_running(h)) {
            return self.session;
        }
        self.hide(manager);
        self.active = Some(section);

        let spec = section.scene(&self.config)?;
        match manager.start(self.container.clone(), &spec, viewport, now) {
            Ok(handle) => {
                tracing::info!(section = section.name(), content = spec.name(), "section shown");
                self.session = Some(handle);
            }
            Err(e) => {
                tracing::warn!(section = section.name(), "background unavailable: {e}");
            }
        }
        self.session
    }

    /// Stop the current background, if any.
    pub fn hide<B: RenderBackend, S: FrameScheduler>(
        &mut self,
        manager: &mut SceneLifecycleManager<B, S>,
    ) {
        if let Some(handle) = self.session.take() {
            manager.stop(handle);
        }
        self.active = None;
    }
}
