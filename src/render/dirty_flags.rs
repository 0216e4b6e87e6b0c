use bevy_ecs::prelude::Resource;
use bitflags::bitflags;

use crate::app::{AppState, Popup};

bitflags! {
    /// Screen regions that need to be drawn again
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DirtyFlags: u32 {
        const NONE = 0;
        /// Market list, favorites and picks
        const MARKET = 0b0000_0001;
        /// Stock view: quote, fundamentals, chart
        const STOCK = 0b0000_0010;
        /// Wallet, holdings and trade history
        const PORTFOLIO = 0b0000_0100;
        const POPUP = 0b0000_1000;
        /// Navbar and footer
        const STATUS_BAR = 0b0001_0000;
        const LOADING = 0b0010_0000;
        const ERROR = 0b0100_0000;
        const ALL = 0xFFFF_FFFF;
    }
}

impl DirtyFlags {
    #[inline]
    pub fn needs_render(self) -> bool {
        !self.is_empty()
    }

    /// Regions backed by dashboard data; a fetch result for `state` touches these
    #[must_use]
    pub fn for_state(state: AppState) -> Self {
        match state {
            AppState::Loading => Self::LOADING,
            AppState::Error => Self::ERROR,
            AppState::Market => Self::MARKET | Self::STATUS_BAR,
            AppState::Stock => Self::STOCK | Self::STATUS_BAR,
            AppState::Portfolio => Self::PORTFOLIO | Self::STATUS_BAR,
        }
    }

    #[inline]
    #[must_use]
    pub fn mark_state_change(mut self) -> Self {
        self.insert(Self::ALL);
        self
    }

    /// Closing a popup uncovers the view below it, so both are redrawn
    #[must_use]
    pub fn mark_popup_change(mut self, popup: Popup) -> Self {
        self.insert(Self::POPUP);
        if popup == Popup::None {
            self.insert(Self::MARKET | Self::STOCK | Self::PORTFOLIO);
        }
        self
    }
}

/// Tracks what needs drawing and how many frames were skipped
#[derive(Debug, Resource)]
pub struct RenderState {
    dirty: DirtyFlags,
    render_count: u64,
    skip_count: u64,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            dirty: DirtyFlags::NONE,
            render_count: 0,
            skip_count: 0,
        }
    }

    #[inline]
    pub fn needs_render(&self) -> bool {
        self.dirty.needs_render()
    }

    #[inline]
    pub fn mark_dirty(&mut self, flags: DirtyFlags) {
        self.dirty.insert(flags);
    }

    #[inline]
    pub fn mark_all_dirty(&mut self) {
        self.dirty = DirtyFlags::ALL;
    }

    /// Reset after a frame has been drawn
    #[inline]
    pub fn clear(&mut self) {
        self.dirty = DirtyFlags::NONE;
        self.render_count += 1;
    }

    #[inline]
    pub fn skip(&mut self) {
        self.skip_count += 1;
    }

    #[inline]
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// Percentage of ticks that skipped drawing
    #[allow(clippy::cast_precision_loss)]
    pub fn efficiency(&self) -> f64 {
        let total = self.render_count + self.skip_count;
        if total == 0 {
            0.0
        } else {
            (self.skip_count as f64 / total as f64) * 100.0
        }
    }

    pub fn stats(&self) -> String {
        format!(
            "renders: {}, skipped: {}, skip rate: {:.1}%",
            self.render_count,
            self.skip_count,
            self.efficiency()
        )
    }
}
