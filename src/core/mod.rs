pub mod engine;
pub mod icon;
pub mod procedure;
pub mod readiness;
pub mod scripts;

pub use crate::domain::model::{RenderJob, RenderSettings, Theme};
pub use crate::domain::ports::{BrowserLauncher, IconSource, PageSession, Storage};
pub use crate::utils::error::Result;
