// SPDX-License-Identifier: GPL-3.0-only

//! Backends the capture pipelines run against
//!
//! - [`host`]: scene, render target, frame read-back and preview sources

pub mod host;
