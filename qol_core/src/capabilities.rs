use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::config::RenderConfig;

bitflags! {
    /// Output paths available to the front end, resolved once at startup.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RenderCapabilities: u8 {
        /// Full-screen terminal UI.
        const INTERACTIVE = 1 << 0;
        /// SVG map and diagram export.
        const SVG_EXPORT = 1 << 1;
        /// ANSI colour in plain text output.
        const COLOR = 1 << 2;
    }
}

impl Default for RenderCapabilities {
    fn default() -> Self {
        RenderCapabilities::SVG_EXPORT
    }
}

impl RenderCapabilities {
    /// Combine configuration switches with what the attached terminal supports.
    pub fn resolve(render: &RenderConfig, stdout_is_terminal: bool) -> Self {
        let mut flags = RenderCapabilities::empty();
        if render.interactive && stdout_is_terminal {
            flags.insert(RenderCapabilities::INTERACTIVE);
        }
        if render.svg_export {
            flags.insert(RenderCapabilities::SVG_EXPORT);
        }
        if render.color && stdout_is_terminal {
            flags.insert(RenderCapabilities::COLOR);
        }
        tracing::debug!(target: "qol::config", flags = ?flags, "render_capabilities.resolved");
        flags
    }
}
