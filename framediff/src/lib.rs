//! # Frame Differencing Library
//!
//! This library provides the building blocks for turning a live video feed into
//! debounced motion alerts. Consecutive luminance frames are compared pixel by pixel,
//! the number of changed pixels decides whether the pair counts as motion, and a
//! cooldown-gated dispatcher forwards motion events to an alert publisher.
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use framediff::prelude::v1::*;
//! ```
//!
//! Frame acquisition and alert delivery are left behind the [`source::FrameSource`] and
//! [`dispatch::Publisher`] traits, so the pipeline runs the same against a camera and a
//! broker as it does against scripted fixtures in tests.

pub mod detect;
pub mod dispatch;
pub mod frame;
pub mod pipeline;
pub mod source;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            detect::PixelDiffDetection,
            dispatch::{AlertDispatcher, DispatchOutcome, Publisher},
            frame::{DiffMap, DimensionMismatch, LumaFrame},
            source::FrameSource,
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
