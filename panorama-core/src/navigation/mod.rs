//! Navigation composition
//!
//! - `slot`: per-plugin mount records shared with the shell
//! - `menu`: presentation-neutral menu model and rendering sinks
//! - `composer`: the signal-driven state machine that builds the menu

pub mod composer;
pub mod menu;
pub mod slot;

pub use composer::{ComposerConfig, NavigationComposer};
pub use menu::{
    ActivateFn, Activated, LinkActivation, LinkMode, Menu, MenuEntry, MenuSink, NavLink,
    TextMenuSink, Trailing,
};
pub use slot::{MountRecord, SlotState, SlotTable};
