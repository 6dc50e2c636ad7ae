//! CDN purge engine.
//!
//! Decides what to invalidate when content changes:
//!
//! - **classifier**: navigation-affecting change or local change
//! - **variant**: stage (draft) URL derivation
//! - **planner**: decision + object URLs → purge request
//! - **lifecycle**: pre-publish / post-write / post-delete decision table
//! - **trigger**: collaborator orchestration and failure containment
//!
//! ## Configuration
//!
//! ```toml
//! [purge]
//! enabled = true
//! sensitive_fields = ["ShowInMenus", "Sort", "ParentID", "URLSegment", "MenuTitle"]
//! delete_menu_flag = "ShowInMenu"
//! stage_param = "stage"
//! stage_value = "Stage"
//! # base_url = "https://example.com"
//! ```

mod classifier;
mod config;
mod events;
mod lifecycle;
mod planner;
mod trigger;
mod variant;

pub use classifier::classify;
pub use self::config::PurgeConfig;
pub use events::PurgeEvent;
pub use lifecycle::{EventKind, LifecycleEvent, ObjectState, decide};
pub use planner::PurgePlan;
pub use trigger::{Collaborators, PreparedPurge, PurgeOutcome, PurgeTrigger, SkipReason};
pub use variant::{StageVariant, to_stage_variant};

pub(crate) use self::config::DEFAULT_DELETE_MENU_FLAG;
pub(crate) use trigger::{
    METRIC_DISPATCH_MS, METRIC_PURGE_TOTAL, METRIC_PURGE_URLS_TOTAL, METRIC_TRANSPORT_FAILURE_TOTAL,
};
pub(crate) use variant::{DEFAULT_STAGE_PARAM, DEFAULT_STAGE_VALUE};
